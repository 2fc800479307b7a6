//! Steering Integrator
//!
//! Combines the neighbor, target, predator and boundary terms into one
//! steering vector per agent and advances the agent by one step under either
//! integration policy.

use super::aggregate::NeighborVectors;
use super::seeker::Nearest;
pub use crate::core::agent::look_rotation;
use crate::core::agent::{AgentSnapshot, AgentUpdate};
use crate::core::config::{FlockProfile, IntegrationPolicy};
use glam::Vec3;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Magnitudes below this are treated as "no direction".
pub const NORMALIZE_EPSILON: f32 = 1e-6;

/// Per-agent inputs gathered by the read-only phases.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SteeringInputs {
    pub neighbors: NeighborVectors,
    pub target: Nearest,
    pub predator: Nearest,
    /// Boundary force folded into steering; zero when the boundary is applied
    /// as a physical force or disabled.
    pub boundary: Vec3,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Steering {
    pub vector: Vec3,
    pub predator_override: bool,
}

#[inline]
pub fn predator_triggered(profile: &FlockProfile, predator: &Nearest) -> bool {
    predator.is_present() && predator.distance_sq <= profile.min_predator_distance * profile.min_predator_distance
}

/// Weighted sum of the behavior terms, replaced wholesale by the flee
/// direction when a predator is within `min_predator_distance`.
pub fn steering_vector(profile: &FlockProfile, inputs: &SteeringInputs) -> Steering {
    if predator_triggered(profile, &inputs.predator) {
        return Steering {
            vector: inputs.predator.direction,
            predator_override: true,
        };
    }
    let n = &inputs.neighbors;
    let vector = profile.alignment_weight * n.alignment
        + profile.cohesion_weight * n.cohesion
        + profile.separation_weight * n.separation
        + profile.target_weight * inputs.target.direction
        + inputs.boundary;
    Steering {
        vector,
        predator_override: false,
    }
}

/// Unit vector along `v`, or `fallback` when `v` is too short to carry a
/// direction.
#[inline]
pub fn normalize_or_keep(v: Vec3, fallback: Vec3) -> Vec3 {
    let len_sq = v.length_squared();
    if len_sq > NORMALIZE_EPSILON * NORMALIZE_EPSILON && len_sq.is_finite() {
        v / len_sq.sqrt()
    } else {
        fallback
    }
}

/// Per-agent speed offset in `[-amplitude, amplitude)`.  Seeded from the
/// agent and tick so the value does not depend on which worker runs it.
pub fn speed_jitter(seed: u64, tick: u64, agent: u32, amplitude: f32) -> f32 {
    if amplitude <= 0.0 {
        return 0.0;
    }
    let mixed = seed
        ^ tick.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (agent as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    StdRng::seed_from_u64(mixed).gen_range(-amplitude..amplitude)
}

/// Advance one agent.
///
/// `acceleration` is the boundary force when it is applied physically; it is
/// scaled by `dt` and is not subject to the predator override.
pub fn integrate(
    policy: IntegrationPolicy,
    profile: &FlockProfile,
    agent: &AgentSnapshot,
    steer: Vec3,
    acceleration: Vec3,
    jitter: f32,
    dt: f32,
) -> AgentUpdate {
    let (velocity, heading) = match policy {
        IntegrationPolicy::HeadingDriven => {
            let heading = normalize_or_keep(agent.heading + steer + acceleration * dt, agent.heading);
            let speed = (profile.max_speed + jitter).max(0.0);
            (heading * speed, heading)
        }
        IntegrationPolicy::VelocityDriven => {
            let velocity = (agent.velocity + steer + acceleration * dt).clamp_length_max(profile.max_speed);
            (velocity, normalize_or_keep(velocity, agent.heading))
        }
    };

    AgentUpdate {
        slot: agent.slot,
        position: agent.position + velocity * dt,
        velocity,
        heading,
        orientation: look_rotation(heading, Vec3::Y).unwrap_or(agent.orientation),
    }
}
