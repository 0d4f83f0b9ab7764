use thiserror::Error;

/// Rejections at the planning boundary. Everything below the boundary is
/// total numeric computation and cannot fail.
#[derive(Debug, Error)]
pub enum PlanError {
    /// A cell arrived with an unusable biomass value. Raised before any
    /// optimization starts; no partial results are produced.
    #[error("invalid input for cell {cell}: {reason}")]
    InvalidInput { cell: u64, reason: String },

    /// The optimizer configuration is out of range.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

/// Failures while loading or validating a scenario file.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("scenario parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("scenario validation error: {0}")]
    Validation(String),
}
