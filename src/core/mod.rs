//! Core Types
//!
//! Agent records, the store boundary, configuration and errors.

pub mod agent;
pub mod config;
pub mod error;

pub use agent::{
    look_rotation, Agent, AgentId, AgentSnapshot, AgentStore, AgentUpdate, Flock, Tag, TaggedSnapshot,
};
pub use config::{
    BoundaryApplication, BoundaryConfig, BoundaryShape, FlockProfile, IntegrationPolicy,
    NeighborPolicy, ProfileId, SimulationConfig, WallMask,
};
pub use error::{FlockError, Result};
