//! Monte Carlo estimation over a uniform source: the hit-or-miss estimate
//! of pi, and the sample-mean estimate of a definite integral.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::input_modeling::uniform_stream::UniformSource;
use crate::input_modeling::variates;
use crate::utils::errors::SimulationError;

/// A Monte Carlo estimate with its standard error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonteCarloEstimate {
    pub estimate: f64,
    pub standard_error: f64,
    pub samples: usize,
}

impl MonteCarloEstimate {
    pub fn absolute_error(&self, exact: f64) -> f64 {
        (self.estimate - exact).abs()
    }
}

fn require_samples(samples: usize) -> Result<(), SimulationError> {
    if samples == 0 {
        return Err(SimulationError::InsufficientSample {
            required: 1,
            actual: 0,
        });
    }
    Ok(())
}

/// Estimate pi from `points` uniform points in the unit square, as four
/// times the fraction landing inside the quarter circle `x^2 + y^2 <= 1`.
/// Each point takes two draws, x then y.
pub fn estimate_pi<S: UniformSource + ?Sized>(
    stream: &mut S,
    points: usize,
) -> Result<MonteCarloEstimate, SimulationError> {
    require_samples(points)?;
    let mut hits = 0_usize;
    for _ in 0..points {
        let x = stream.next_uniform();
        let y = stream.next_uniform();
        if x * x + y * y <= 1.0 {
            hits += 1;
        }
    }
    let n = points as f64;
    let ratio = hits as f64 / n;
    let estimate = MonteCarloEstimate {
        estimate: 4.0 * ratio,
        standard_error: 4.0 * (ratio * (1.0 - ratio) / n).sqrt(),
        samples: points,
    };
    debug!(points, hits, estimate = estimate.estimate, "estimated pi");
    Ok(estimate)
}

/// Estimate the integral of `f` over `[a, b]` as `(b - a)` times the mean
/// of `f` at `samples` uniform points of the interval.
pub fn integrate<S, F>(
    stream: &mut S,
    f: F,
    a: f64,
    b: f64,
    samples: usize,
) -> Result<MonteCarloEstimate, SimulationError>
where
    S: UniformSource + ?Sized,
    F: Fn(f64) -> f64,
{
    require_samples(samples)?;
    if !(a.is_finite() && b.is_finite() && a < b) {
        return Err(SimulationError::InvalidConfiguration(format!(
            "integration bounds must be finite with a < b, found [{}, {}]",
            a, b
        )));
    }
    let mut sum = 0.0;
    let mut sum_of_squares = 0.0;
    for _ in 0..samples {
        let value = f(variates::uniform(stream, a, b)?);
        sum += value;
        sum_of_squares += value * value;
    }
    let n = samples as f64;
    let mean = sum / n;
    let variance = (sum_of_squares / n - mean * mean).max(0.0);
    let width = b - a;
    Ok(MonteCarloEstimate {
        estimate: width * mean,
        standard_error: width * (variance / n).sqrt(),
        samples,
    })
}
