use serde::{Deserialize, Serialize};

use crate::input_modeling::uniform_stream::{LcgParameters, UniformStream};
use crate::utils::errors::SimulationError;

/// The configuration of a single queueing simulation run: Poisson arrivals
/// at `arrival_rate`, exponential service at `service_rate` on each of
/// `server_count` identical servers, observed over `[0, horizon]`.  The
/// uniform stream of the run is built from `seed` and `generator`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueConfig {
    pub arrival_rate: f64,
    pub service_rate: f64,
    pub server_count: usize,
    pub horizon: f64,
    pub seed: u64,
    #[serde(default)]
    pub generator: LcgParameters,
}

impl QueueConfig {
    /// A configuration over the default generator.  The result is
    /// validated.
    pub fn new(
        arrival_rate: f64,
        service_rate: f64,
        server_count: usize,
        horizon: f64,
        seed: u64,
    ) -> Result<Self, SimulationError> {
        let config = Self {
            arrival_rate,
            service_rate,
            server_count,
            horizon,
            seed,
            generator: LcgParameters::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(config: &str) -> Result<Self, SimulationError> {
        let config: Self = serde_json::from_str(config)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(config: &str) -> Result<Self, SimulationError> {
        let config: Self = serde_yaml::from_str(config)?;
        config.validate()?;
        Ok(config)
    }

    /// Rates and horizon must be positive and finite, with at least one
    /// server and a usable generator.  Stability is checked separately, by
    /// the queueing system.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if !(self.arrival_rate.is_finite() && self.arrival_rate > 0.0) {
            return Err(SimulationError::InvalidConfiguration(format!(
                "arrival rate must be positive and finite, found {}",
                self.arrival_rate
            )));
        }
        if !(self.service_rate.is_finite() && self.service_rate > 0.0) {
            return Err(SimulationError::InvalidConfiguration(format!(
                "service rate must be positive and finite, found {}",
                self.service_rate
            )));
        }
        if self.server_count < 1 {
            return Err(SimulationError::InvalidConfiguration(String::from(
                "at least one server is required",
            )));
        }
        if !(self.horizon.is_finite() && self.horizon > 0.0) {
            return Err(SimulationError::InvalidConfiguration(format!(
                "horizon must be positive and finite, found {}",
                self.horizon
            )));
        }
        self.stream().map(|_| ())
    }

    /// `rho = lambda / (c mu)`
    pub fn utilization(&self) -> f64 {
        self.arrival_rate / (self.server_count as f64 * self.service_rate)
    }

    /// The same configuration under a different seed.
    pub fn with_seed(&self, seed: u64) -> Self {
        Self {
            seed,
            ..self.clone()
        }
    }

    /// A fresh uniform stream for a run of this configuration.
    pub fn stream(&self) -> Result<UniformStream, SimulationError> {
        UniformStream::with_parameters(self.seed, self.generator)
    }
}
