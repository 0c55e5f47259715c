use thiserror::Error;

/// `SimulationError` enumerates all possible errors returned by qsim
#[derive(Error, Debug)]
pub enum SimulationError {
    /// Represents an invalid run configuration (rates, server count, horizon, seed)
    #[error("Invalid simulation configuration: {0}")]
    InvalidConfiguration(String),

    /// Represents a queueing system whose utilization makes it unstable
    #[error("The queueing system is unstable, with utilization rho = {rho} >= 1")]
    UnstableSystem { rho: f64 },

    /// Represents a random variate requested with parameters outside the distribution's domain
    #[error("Invalid {distribution} distribution parameters: {reason}")]
    InvalidDistributionParameter {
        distribution: &'static str,
        reason: String,
    },

    /// Represents a uniform source that collapsed onto zero
    #[error("The uniform source produced {draws} consecutive zero draws")]
    DegenerateStream { draws: usize },

    /// Represents an event scheduled before the current simulation time
    #[error("An event cannot be scheduled at time {time} when the clock reads {now}")]
    InvalidTime { time: f64, now: f64 },

    /// Represents a dispatch request against an empty event queue
    #[error("The event queue is empty")]
    EmptyQueue,

    /// Represents an invalid model state
    #[error("An invalid model state was encountered: {0}")]
    InvalidModelState(String),

    /// Represents a statistical procedure applied to too few observations
    #[error("The sample holds {actual} values, but at least {required} are required")]
    InsufficientSample { required: usize, actual: usize },

    /// Represents a sample value outside of the unit interval [0, 1)
    #[error("The sample value {value} lies outside of [0, 1)")]
    SampleOutOfRange { value: f64 },

    /// Represents a significance level without tabulated critical values
    #[error("No critical values are tabulated for significance level {alpha}")]
    UnsupportedSignificance { alpha: f64 },

    /// Represents an internal logic error, where prerequisite calculations were not executed
    #[error("An internal logic error occured, where prerequisite calculations were not executed")]
    PrerequisiteCalcError,

    /// Represents a failed conversion to num-traits Float
    #[error("Failed to convert to a Float value")]
    FloatConvError,

    /// Transparent serde_json errors
    #[error(transparent)]
    JSONError(#[from] serde_json::error::Error),

    /// Transparent serde_yaml errors
    #[error(transparent)]
    YAMLError(#[from] serde_yaml::Error),

    /// Transparent rayon thread pool construction errors
    #[error(transparent)]
    ThreadPoolError(#[from] rayon::ThreadPoolBuildError),

    /// Transparent Gamma distribution errors
    #[error(transparent)]
    GammaError(#[from] rand_distr::GammaError),

    /// Transparent Beta distribution errors
    #[error(transparent)]
    BetaError(#[from] rand_distr::BetaError),
}

impl SimulationError {
    pub(crate) fn domain(distribution: &'static str, reason: impl Into<String>) -> Self {
        SimulationError::InvalidDistributionParameter {
            distribution,
            reason: reason.into(),
        }
    }
}
