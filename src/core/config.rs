use super::error::{FlockError, Result};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Index of a profile inside `SimulationConfig::profiles`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProfileId(pub usize);

/// Shared behavior parameters for one class of agents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlockProfile {
    #[serde(default)]
    pub name: String,
    pub max_speed: f32,
    pub neighbor_radius: f32,
    #[serde(default)]
    pub alignment_weight: f32,
    #[serde(default)]
    pub cohesion_weight: f32,
    #[serde(default)]
    pub separation_weight: f32,
    #[serde(default)]
    pub target_weight: f32,
    #[serde(default)]
    pub min_predator_distance: f32,
    /// Upper bound on contributing neighbors per agent. `None` means unbounded.
    #[serde(default)]
    pub max_neighbor_count: Option<usize>,
}

impl FlockProfile {
    pub fn validate(&self) -> Result<()> {
        let scalars = [
            ("max_speed", self.max_speed),
            ("neighbor_radius", self.neighbor_radius),
            ("alignment_weight", self.alignment_weight),
            ("cohesion_weight", self.cohesion_weight),
            ("separation_weight", self.separation_weight),
            ("target_weight", self.target_weight),
            ("min_predator_distance", self.min_predator_distance),
        ];
        for (field, value) in scalars {
            if !value.is_finite() {
                return Err(FlockError::NonFiniteParameter {
                    profile: self.name.clone(),
                    field,
                });
            }
            if value < 0.0 {
                return Err(FlockError::NegativeParameter {
                    profile: self.name.clone(),
                    field,
                    value,
                });
            }
        }
        if self.neighbor_radius <= 0.0 {
            return Err(FlockError::NonPositiveRadius {
                profile: self.name.clone(),
                value: self.neighbor_radius,
            });
        }
        if self.max_neighbor_count == Some(0) {
            return Err(FlockError::ZeroNeighborCap {
                profile: self.name.clone(),
            });
        }
        Ok(())
    }
}

impl Default for FlockProfile {
    fn default() -> Self {
        FlockProfile {
            name: "default".to_string(),
            max_speed: 10.0,
            neighbor_radius: 2.0,
            alignment_weight: 1.0,
            cohesion_weight: 0.0,
            separation_weight: 2.0,
            target_weight: 0.0,
            min_predator_distance: 0.0,
            max_neighbor_count: None,
        }
    }
}

/// How steering is turned into motion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationPolicy {
    /// Constant speed along a continuously steered unit heading. No inertia.
    #[default]
    HeadingDriven,
    /// Steering accumulates into a velocity clamped to `max_speed`.
    VelocityDriven,
}

/// Which agents count as neighbors for aggregation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborPolicy {
    /// Every agent sharing a cell key is a neighbor; no distance check.
    #[default]
    SameCell,
    /// Agents in the surrounding 27 cells within `neighbor_radius`.
    WithinRadius,
}

/// Where the boundary force enters the integrator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryApplication {
    /// Added into the steering vector before the predator override.
    #[default]
    Steering,
    /// Applied after the override as an acceleration scaled by delta time.
    Force,
}

/// Per-wall enable flags for `BoundaryShape::Walls`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallMask {
    pub x_positive: bool,
    pub x_negative: bool,
    pub y_positive: bool,
    pub y_negative: bool,
    pub z_positive: bool,
    pub z_negative: bool,
}

impl Default for WallMask {
    fn default() -> Self {
        WallMask {
            x_positive: true,
            x_negative: true,
            y_positive: true,
            y_negative: true,
            z_positive: true,
            z_negative: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoundaryShape {
    /// Concentric cubes; the combined force is normalized before scaling.
    Cube {
        center: Vec3,
        outer_size: f32,
        inner_size: f32,
    },
    /// Six independent planes; each active wall adds its own unnormalized term.
    Walls {
        min: Vec3,
        max: Vec3,
        threshold: f32,
        #[serde(default)]
        walls: WallMask,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundaryConfig {
    pub shape: BoundaryShape,
    pub force_magnitude: f32,
    #[serde(default)]
    pub application: BoundaryApplication,
}

impl BoundaryConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.force_magnitude.is_finite() || self.force_magnitude < 0.0 {
            return Err(FlockError::InvalidBoundary(format!(
                "force_magnitude must be finite and non-negative, got {}",
                self.force_magnitude
            )));
        }
        match self.shape {
            BoundaryShape::Cube {
                center,
                outer_size,
                inner_size,
            } => {
                if !center.is_finite() {
                    return Err(FlockError::InvalidBoundary("cube center is not finite".into()));
                }
                if !(inner_size > 0.0 && inner_size < outer_size && outer_size.is_finite()) {
                    return Err(FlockError::InvalidBoundary(format!(
                        "cube needs 0 < inner_size < outer_size, got inner {} outer {}",
                        inner_size, outer_size
                    )));
                }
            }
            BoundaryShape::Walls {
                min, max, threshold, ..
            } => {
                if !min.is_finite() || !max.is_finite() || !min.cmplt(max).all() {
                    return Err(FlockError::InvalidBoundary(format!(
                        "walls need min < max on every axis, got {} .. {}",
                        min, max
                    )));
                }
                let half_extent = ((max - min) * 0.5).min_element();
                if !(threshold >= 0.0 && threshold < half_extent) {
                    return Err(FlockError::InvalidBoundary(format!(
                        "wall threshold must lie in [0, {}), got {}",
                        half_extent, threshold
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Top-level simulation parameters, passed explicitly into the pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub profiles: Vec<FlockProfile>,
    #[serde(default)]
    pub integration: IntegrationPolicy,
    #[serde(default)]
    pub neighbor_policy: NeighborPolicy,
    #[serde(default)]
    pub boundary: Option<BoundaryConfig>,
    /// Half-width of the per-agent speed jitter under `HeadingDriven`.
    #[serde(default = "default_speed_jitter")]
    pub speed_jitter: f32,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Worker threads for the step pool. 0 lets rayon decide.
    #[serde(default)]
    pub worker_threads: usize,
}

fn default_speed_jitter() -> f32 {
    0.1
}

fn default_seed() -> u64 {
    13_517_039
}

impl SimulationConfig {
    pub fn new(profiles: Vec<FlockProfile>) -> Self {
        SimulationConfig {
            profiles,
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SimulationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&raw)?;
        info!(
            "Loaded simulation config from {} ({} profiles)",
            path.display(),
            config.profiles.len()
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.profiles.is_empty() {
            return Err(FlockError::NoProfiles);
        }
        for profile in &self.profiles {
            profile.validate()?;
        }
        if let Some(boundary) = &self.boundary {
            boundary.validate()?;
        }
        if !self.speed_jitter.is_finite() || self.speed_jitter < 0.0 {
            return Err(FlockError::NegativeParameter {
                profile: "<simulation>".to_string(),
                field: "speed_jitter",
                value: self.speed_jitter,
            });
        }
        Ok(())
    }

    pub fn profile_ids(&self) -> impl Iterator<Item = ProfileId> {
        (0..self.profiles.len()).map(ProfileId)
    }

    pub fn profile(&self, id: ProfileId) -> Option<&FlockProfile> {
        self.profiles.get(id.0)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            profiles: vec![FlockProfile::default()],
            integration: IntegrationPolicy::default(),
            neighbor_policy: NeighborPolicy::default(),
            boundary: None,
            speed_jitter: default_speed_jitter(),
            seed: default_seed(),
            worker_threads: 0,
        }
    }
}
