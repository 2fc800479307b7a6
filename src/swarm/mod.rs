//! Flocking Engine
//!
//! Per-step pipeline for large boid populations: spatial hash index,
//! leave-one-out neighbor aggregation, nearest target/predator search,
//! boundary repulsion and steering integration.

pub mod aggregate;
pub mod boundary;
pub mod grid;
pub mod master_pipeline;
pub mod oracle;
pub mod seeker;
pub mod steering;

pub use aggregate::NeighborVectors;
pub use grid::{CellEntry, CellKey, SpatialHashIndex};
pub use master_pipeline::{FlockPipeline, PartitionReport, StepReport};
pub use seeker::{Nearest, SeekMode, TaggedSnapshot};
pub use steering::{Steering, SteeringInputs};
