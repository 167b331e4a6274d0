use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    #[error("max_average_speed must be a finite value above zero, got {0}")]
    InvalidMaxAverageSpeed(f64),

    #[error("min_time must be a finite value of zero or more, got {0}")]
    InvalidMinTime(f64),

    #[error("max_fix_gap must be a finite value above zero, got {0}")]
    InvalidMaxFixGap(f64),
}

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum DetectError {
    #[error("invalid stop configuration: {0}")]
    Config(#[from] ConfigError),

    /// The distance between fix `index` and its predecessor was NaN or infinite,
    /// which only happens with malformed coordinates.
    #[error("non-finite distance to fix {index} from its predecessor, coordinates are malformed")]
    NonFiniteDistance { index: usize },
}
