use thiserror::Error;

/// Rejected configuration values.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("probability `{name}` must lie in [0, 1], got {value}")]
    Probability { name: &'static str, value: f32 },
    #[error("`{name}` must be at least 1")]
    Zero { name: &'static str },
    #[error("evaluator weight `{name}` is not finite")]
    Weight { name: &'static str },
    #[error("could not start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
