use super::aggregate::{aggregate, NeighborVectors};
use super::boundary::boundary_force;
use super::grid::SpatialHashIndex;
use super::seeker::{seek_partition, Nearest, SeekMode, TaggedSnapshot};
use super::steering::{integrate, speed_jitter, steering_vector, SteeringInputs};
use crate::core::agent::{AgentSnapshot, AgentStore, AgentUpdate, Tag};
use crate::core::config::{BoundaryApplication, IntegrationPolicy, ProfileId, SimulationConfig};
use crate::core::error::{FlockError, Result};
use glam::Vec3;
use rayon::prelude::*;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// What one profile's pass did during a step.
#[derive(Clone, Debug, PartialEq)]
pub struct PartitionReport {
    pub profile: ProfileId,
    pub agents: usize,
    pub occupied_cells: usize,
    pub predator_overrides: usize,
    pub elapsed: Duration,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StepReport {
    pub tick: u64,
    pub partitions: Vec<PartitionReport>,
    pub elapsed: Duration,
}

impl StepReport {
    pub fn agents(&self) -> usize {
        self.partitions.iter().map(|p| p.agents).sum()
    }

    pub fn predator_overrides(&self) -> usize {
        self.partitions.iter().map(|p| p.predator_overrides).sum()
    }
}

/// Runs the per-step flocking pipeline over an `AgentStore`.
///
/// Per profile: index build → (aggregation ‖ target/predator seek) →
/// integration → write-back.  Profiles run one after another and share
/// nothing but the tagged snapshots taken at step start.
pub struct FlockPipeline {
    config: SimulationConfig,
    pool: rayon::ThreadPool,
    tick: u64,
}

impl FlockPipeline {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let mut builder = rayon::ThreadPoolBuilder::new();
        if config.worker_threads > 0 {
            builder = builder.num_threads(config.worker_threads);
        }
        let pool = builder.build()?;

        info!(
            "[Flock] Pipeline ready: {} profiles, {:?} / {:?}, {} workers",
            config.profiles.len(),
            config.integration,
            config.neighbor_policy,
            pool.current_num_threads()
        );

        Ok(FlockPipeline {
            config,
            pool,
            tick: 0,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Number of completed steps.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn worker_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Advance every partition by `dt`.  Nothing is written if `dt` is
    /// rejected or if any agent in the store belongs to no configured
    /// profile.
    pub fn step<S: AgentStore + ?Sized>(&mut self, store: &mut S, dt: f32) -> Result<StepReport> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(FlockError::InvalidDeltaTime(dt));
        }
        let start = Instant::now();

        let snapshots: Vec<(ProfileId, Vec<AgentSnapshot>)> = self
            .config
            .profile_ids()
            .map(|profile| (profile, store.partition(profile)))
            .filter(|(_, agents)| !agents.is_empty())
            .collect();
        let assigned: usize = snapshots.iter().map(|(_, agents)| agents.len()).sum();
        let total = store.agent_count();
        if assigned != total {
            warn!(
                "[Flock] refusing step: {} of {} agents belong to no configured profile",
                total.saturating_sub(assigned),
                total
            );
            return Err(FlockError::UnassignedAgents {
                unassigned: total.saturating_sub(assigned),
                total,
            });
        }

        self.tick += 1;
        let targets = store.tagged_positions(Tag::Target);
        let predators = store.tagged_positions(Tag::Predator);

        let mut partitions = Vec::with_capacity(snapshots.len());
        for (profile, agents) in &snapshots {
            let (updates, report) = self
                .pool
                .install(|| self.step_partition(*profile, agents, &targets, &predators, dt))?;
            store.write_back(&updates);

            debug!(
                "[Flock] tick {} profile {}: {} agents, {} cells, {} predator overrides in {:?}",
                self.tick,
                profile.0,
                report.agents,
                report.occupied_cells,
                report.predator_overrides,
                report.elapsed
            );
            partitions.push(report);
        }

        Ok(StepReport {
            tick: self.tick,
            partitions,
            elapsed: start.elapsed(),
        })
    }

    /// All read-only phases for one profile, then integration.  Returns the
    /// updates without applying them.
    pub fn step_partition(
        &self,
        profile_id: ProfileId,
        agents: &[AgentSnapshot],
        targets: &TaggedSnapshot,
        predators: &TaggedSnapshot,
        dt: f32,
    ) -> Result<(Vec<AgentUpdate>, PartitionReport)> {
        let start = Instant::now();
        let profile = self
            .config
            .profile(profile_id)
            .ok_or(FlockError::UnknownProfile(profile_id.0))?;
        let policy = self.config.integration;

        let positions: Vec<Vec3> = agents.par_iter().map(|a| a.position).collect();
        let motions: Vec<Vec3> = agents
            .par_iter()
            .map(|a| match policy {
                IntegrationPolicy::HeadingDriven => a.heading,
                IntegrationPolicy::VelocityDriven => a.velocity,
            })
            .collect();

        // ── Aggregation ‖ seeking ────────────────────────────────────────────
        let ((occupied_cells, neighbors), (nearest_targets, nearest_predators)) = rayon::join(
            || {
                let index = SpatialHashIndex::build(&positions, &motions, profile.neighbor_radius);
                let neighbors: Vec<NeighborVectors> = aggregate(
                    &index,
                    self.config.neighbor_policy,
                    profile.neighbor_radius,
                    profile.max_neighbor_count,
                );
                (index.occupied_cells(), neighbors)
            },
            || {
                rayon::join(
                    || {
                        if profile.target_weight > 0.0 {
                            seek_partition(agents, targets, SeekMode::Toward)
                        } else {
                            vec![Nearest::NONE; agents.len()]
                        }
                    },
                    || seek_partition(agents, predators, SeekMode::Away),
                )
            },
        );

        // ── Integration ──────────────────────────────────────────────────────
        let boundary = self.config.boundary.as_ref();
        let (seed, tick, jitter) = (self.config.seed, self.tick, self.config.speed_jitter);
        let (updates, overrides): (Vec<AgentUpdate>, Vec<bool>) = agents
            .par_iter()
            .enumerate()
            .map(|(i, agent)| {
                let (folded, acceleration) = match boundary {
                    Some(b) => {
                        let force = boundary_force(agent.position, b);
                        match b.application {
                            BoundaryApplication::Steering => (force, Vec3::ZERO),
                            BoundaryApplication::Force => (Vec3::ZERO, force),
                        }
                    }
                    None => (Vec3::ZERO, Vec3::ZERO),
                };
                let steering = steering_vector(
                    profile,
                    &SteeringInputs {
                        neighbors: neighbors[i],
                        target: nearest_targets[i],
                        predator: nearest_predators[i],
                        boundary: folded,
                    },
                );
                let offset = match policy {
                    IntegrationPolicy::HeadingDriven => speed_jitter(seed, tick, agent.id.0, jitter),
                    IntegrationPolicy::VelocityDriven => 0.0,
                };
                let update = integrate(policy, profile, agent, steering.vector, acceleration, offset, dt);
                (update, steering.predator_override)
            })
            .unzip();

        let report = PartitionReport {
            profile: profile_id,
            agents: agents.len(),
            occupied_cells,
            predator_overrides: overrides.iter().filter(|&&o| o).count(),
            elapsed: start.elapsed(),
        };
        Ok((updates, report))
    }
}
