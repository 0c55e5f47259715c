//! Random variables drive arrival and service behaviors, and any other
//! stochastic input of a model.  Common distributions, with their common
//! parameterizations, are wrapped in enums `ContinuousRandomVariable`,
//! `BooleanRandomVariable`, and `DiscreteRandomVariable`, which deserialize
//! from configuration such as `{"exp": {"lambda": 3.0}}`.
//!
//! Every variate is produced from the caller's `UniformSource`, so replays
//! are exact.  Beta and gamma variates come from `rand_distr`, driven by the
//! same source through `SourceRng`.

use rand::distributions::Distribution;
use rand_distr::{Beta, Gamma};
use serde::{Deserialize, Serialize};

use super::uniform_stream::{SourceRng, UniformSource};
use super::variates;
use crate::utils::errors::SimulationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContinuousRandomVariable {
    Beta { alpha: f64, beta: f64 },
    Erlang { shape: u32, rate: f64 },
    Exp { lambda: f64 },
    Gamma { shape: f64, scale: f64 },
    LogNormal { mu: f64, sigma: f64 },
    Normal { mean: f64, std_dev: f64 },
    Triangular { min: f64, max: f64, mode: f64 },
    Uniform { min: f64, max: f64 },
    Weibull { scale: f64, shape: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BooleanRandomVariable {
    Bernoulli { p: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiscreteRandomVariable {
    Binomial {
        trials: u64,
        p: f64,
    },
    /// Number of trials up to and including the first success
    Geometric {
        p: f64,
    },
    Poisson {
        lambda: f64,
    },
    /// Range is inclusive of both min and max: [min, max]
    Uniform {
        min: u64,
        max: u64,
    },
}

impl ContinuousRandomVariable {
    /// The generation of random variates drives stochastic behaviors during
    /// simulation execution.  This function requires the uniform stream of
    /// the simulation, and produces a f64 random variate.
    pub fn random_variate<S: UniformSource + ?Sized>(
        &self,
        stream: &mut S,
    ) -> Result<f64, SimulationError> {
        match self {
            ContinuousRandomVariable::Beta { alpha, beta } => {
                Ok(Beta::new(*alpha, *beta)?.sample(&mut SourceRng(stream)))
            }
            ContinuousRandomVariable::Erlang { shape, rate } => {
                variates::erlang(stream, *shape, *rate)
            }
            ContinuousRandomVariable::Exp { lambda } => variates::exponential(stream, *lambda),
            ContinuousRandomVariable::Gamma { shape, scale } => {
                Ok(Gamma::new(*shape, *scale)?.sample(&mut SourceRng(stream)))
            }
            ContinuousRandomVariable::LogNormal { mu, sigma } => {
                variates::lognormal(stream, *mu, *sigma)
            }
            ContinuousRandomVariable::Normal { mean, std_dev } => {
                variates::normal(stream, *mean, *std_dev)
            }
            ContinuousRandomVariable::Triangular { min, max, mode } => {
                variates::triangular(stream, *min, *max, *mode)
            }
            ContinuousRandomVariable::Uniform { min, max } => {
                variates::uniform(stream, *min, *max)
            }
            ContinuousRandomVariable::Weibull { scale, shape } => {
                variates::weibull(stream, *scale, *shape)
            }
        }
    }
}

impl BooleanRandomVariable {
    /// The generation of random variates drives stochastic behaviors during
    /// simulation execution.  This function requires the uniform stream of
    /// the simulation, and produces a boolean random variate.
    pub fn random_variate<S: UniformSource + ?Sized>(
        &self,
        stream: &mut S,
    ) -> Result<bool, SimulationError> {
        match self {
            BooleanRandomVariable::Bernoulli { p } => variates::bernoulli(stream, *p),
        }
    }
}

impl DiscreteRandomVariable {
    /// The generation of random variates drives stochastic behaviors during
    /// simulation execution.  This function requires the uniform stream of
    /// the simulation, and produces a u64 random variate.
    pub fn random_variate<S: UniformSource + ?Sized>(
        &self,
        stream: &mut S,
    ) -> Result<u64, SimulationError> {
        match self {
            DiscreteRandomVariable::Binomial { trials, p } => {
                variates::binomial(stream, *trials, *p)
            }
            DiscreteRandomVariable::Geometric { p } => variates::geometric(stream, *p),
            DiscreteRandomVariable::Poisson { lambda } => variates::poisson(stream, *lambda),
            DiscreteRandomVariable::Uniform { min, max } => {
                variates::discrete_uniform(stream, *min, *max)
            }
        }
    }
}
