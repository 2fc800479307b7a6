//! Flocksim Core - Parallel Boids Simulation Kernel
//!
//! This library advances large populations of 3D boids one step at a time:
//! a spatial hash index groups agents into cells, neighbor vectors are
//! aggregated per cell, nearest targets and predators are sought, and a
//! steering integrator moves every agent under one of two integration
//! policies. Every phase runs on a rayon pool and results do not depend on
//! the number of workers.

pub mod core;
pub mod swarm;
pub mod utils;

// Re-export key types
pub use crate::core::agent::{Agent, AgentId, AgentSnapshot, AgentStore, AgentUpdate, Flock, Tag};
pub use crate::core::config::{
    BoundaryApplication, BoundaryConfig, BoundaryShape, FlockProfile, IntegrationPolicy,
    NeighborPolicy, ProfileId, SimulationConfig, WallMask,
};
pub use crate::core::error::{FlockError, Result};
pub use crate::swarm::{FlockPipeline, NeighborVectors, SpatialHashIndex, StepReport};
pub use crate::utils::benchmark::{BenchmarkSummary, FlockBenchmark};

/// Initialize the global tracing subscriber.
///
/// `level` is an `EnvFilter` directive such as `"debug"` or
/// `"flocksim_core=trace"`; it defaults to `info`. Calling this more than once
/// is harmless.
pub fn setup_logging(level: Option<String>) {
    let filter = level.unwrap_or_else(|| "info".to_string());
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
