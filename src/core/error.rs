use thiserror::Error;

/// Errors surfaced by configuration loading and step validation.
///
/// Degenerate geometry (empty cells, empty snapshots, zero-length vectors) is
/// never an error; those cases have defined values inside the pipeline.
#[derive(Debug, Error)]
pub enum FlockError {
    #[error("profile '{profile}': {field} must be non-negative, got {value}")]
    NegativeParameter {
        profile: String,
        field: &'static str,
        value: f32,
    },

    #[error("profile '{profile}': neighbor_radius must be positive, got {value}")]
    NonPositiveRadius { profile: String, value: f32 },

    #[error("profile '{profile}': max_neighbor_count must be at least 1")]
    ZeroNeighborCap { profile: String },

    #[error("profile '{profile}': {field} is not finite")]
    NonFiniteParameter {
        profile: String,
        field: &'static str,
    },

    #[error("simulation config declares no flock profiles")]
    NoProfiles,

    #[error("invalid boundary: {0}")]
    InvalidBoundary(String),

    #[error("delta time must be finite and non-negative, got {0}")]
    InvalidDeltaTime(f32),

    #[error("profile id {0} is not configured")]
    UnknownProfile(usize),

    #[error("{unassigned} of {total} agents belong to no configured profile")]
    UnassignedAgents { unassigned: usize, total: usize },

    #[error("agent id space exhausted")]
    IdsExhausted,

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FlockError>;
