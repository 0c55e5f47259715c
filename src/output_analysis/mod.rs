//! The output analysis module provides standard statistical analysis tools
//! for analyzing simulation outputs.  Independent, identically-distributed
//! (IID) samples, such as one measure across independent replications, are
//! analyzed with the `IndependentSample`.  Time series with initialization
//! bias and autocorrelation, such as the successive waits of one long run,
//! can be analyzed with `SteadyStateOutput`.

use num_traits::{Float, NumAssign};
use serde::{Deserialize, Serialize};

pub mod replications;
pub mod t_scores;

use crate::utils::errors::SimulationError;
use crate::utils::usize_sqrt;

/// Upper bound on the number of batches of a steady-state analysis
const MAX_BATCHES: usize = 30;

fn sum<T: Float>(points: &[T]) -> T
where
    f64: Into<T>,
{
    points.iter().fold(0.0.into(), |sum, point| sum + *point)
}

/// This function calculates the sample mean from a set of points - a simple
/// arithmetic mean.
fn sample_mean<T: Float>(points: &[T]) -> Result<T, SimulationError>
where
    f64: Into<T>,
{
    if points.is_empty() {
        return Err(SimulationError::InsufficientSample {
            required: 1,
            actual: 0,
        });
    }
    Ok(sum(points) / usize_to_float(points.len())?)
}

/// This function calculates the unbiased sample variance, given a set of
/// points and the sample mean.  A single point has zero variance.
fn sample_variance<T: Float>(points: &[T], mean: &T) -> Result<T, SimulationError>
where
    f64: Into<T>,
{
    if points.len() < 2 {
        return Ok(0.0.into());
    }
    Ok(points
        .iter()
        .fold(0.0.into(), |acc, point| acc + (*point - *mean).powi(2))
        / usize_to_float(points.len() - 1)?)
}

/// This function converts a usize to a Float, with an associated
/// `SimulationError` returned for failed conversions
fn usize_to_float<T: Float>(unconv: usize) -> Result<T, SimulationError> {
    T::from(unconv).ok_or(SimulationError::FloatConvError)
}

/// `mean +- t(alpha, n - 1) sqrt(variance / n)`, collapsing to the mean
/// for a single point.
fn interval_about<T: Float>(
    mean: T,
    variance: T,
    count: usize,
    alpha: T,
) -> Result<ConfidenceInterval<T>, SimulationError>
where
    f64: Into<T>,
{
    if count == 1 {
        return Ok(ConfidenceInterval {
            lower: mean,
            upper: mean,
        });
    }
    let half_width =
        t_scores::t_score(alpha, count - 1)? * (variance / usize_to_float(count)?).sqrt();
    Ok(ConfidenceInterval {
        lower: mean - half_width,
        upper: mean + half_width,
    })
}

/// The confidence interval provides an upper and lower estimate on a given
/// output, whether that output is an independent, identically-distributed
/// sample or time series data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval<T: Float> {
    lower: T,
    upper: T,
}

impl<T: Float> ConfidenceInterval<T>
where
    f64: Into<T>,
{
    pub fn lower(&self) -> T {
        self.lower
    }

    pub fn upper(&self) -> T {
        self.upper
    }

    pub fn half_width(&self) -> T {
        (self.upper - self.lower) / 2.0.into()
    }

    pub fn contains(&self, value: T) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// The independent sample is for independent, identically-distributed (IID)
/// samples, or where treating the data as an IID sample is determined to be
/// reasonable.  Typically, this will be non-time series data - no
/// autocorrelation.  Confidence intervals assume approximately normal
/// sample means, as from the averages of independent replications.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct IndependentSample<T> {
    points: Vec<T>,
    mean: T,
    variance: T,
}

impl<T: Float> IndependentSample<T>
where
    f64: Into<T>,
{
    /// This constructor method creates an `IndependentSample` from a vector
    /// of floating point values.
    pub fn post(points: Vec<T>) -> Result<IndependentSample<T>, SimulationError> {
        let mean = sample_mean(&points)?;
        let variance = sample_variance(&points, &mean)?;
        Ok(IndependentSample {
            points,
            mean,
            variance,
        })
    }

    /// Calculate the two-sided confidence interval of the mean, at
    /// significance level alpha.
    pub fn confidence_interval_mean(
        &self,
        alpha: T,
    ) -> Result<ConfidenceInterval<T>, SimulationError> {
        interval_about(self.mean, self.variance, self.points.len(), alpha)
    }

    /// Return the sample mean.
    pub fn point_estimate_mean(&self) -> T {
        self.mean
    }

    /// Return the sample variance.
    pub fn variance(&self) -> T {
        self.variance
    }

    pub fn points(&self) -> &[T] {
        &self.points
    }
}

/// Steady-state simulations are useful when the initial conditions of a
/// simulation are not of interest, only its long-run behavior.  A queue
/// starting empty underestimates waits early in the run (initialization
/// bias), and successive waits are strongly correlated (autocorrelation).
/// MSER deletion trims the biased prefix, and batch means over the
/// remainder yield approximately independent observations from a single
/// long run.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SteadyStateOutput<T> {
    time_series: Vec<T>,
    /// Points are removed from the beginning of the sample for initialization
    /// bias reduction.
    deletion_point: Option<usize>,
    /// Batching is used to combat autocorrelation in the time series.
    batch_size: Option<usize>,
    batch_count: Option<usize>,
    batch_means: Vec<T>,
    batches_mean: Option<T>,
    batches_variance: Option<T>,
}

impl<T: Float + NumAssign> SteadyStateOutput<T>
where
    f64: Into<T>,
{
    /// This `SteadyStateOutput` constructor method takes the simulation
    /// output time series, as a vector of floating point values.
    pub fn post(time_series: Vec<T>) -> SteadyStateOutput<T> {
        SteadyStateOutput {
            time_series,
            deletion_point: None,
            batch_size: None,
            batch_count: None,
            batch_means: Vec::new(),
            batches_mean: None,
            batches_variance: None,
        }
    }

    /// The steady-state output analysis in `set_to_fixed_budget` analyzes
    /// the time series to determine the appropriate initialization data
    /// deletion and batching strategies.  The deletion point minimizes the
    /// marginal standard error, `MSER(d) = sum((x - mean)^2) / (n - d)^2`
    /// over the points from `d` on, searched within the first half of the
    /// series.
    fn set_to_fixed_budget(&mut self) -> Result<(), SimulationError> {
        let length = self.time_series.len();
        if length < 2 {
            return Err(SimulationError::InsufficientSample {
                required: 2,
                actual: length,
            });
        }
        let mut s: T = 0.0.into();
        let mut q: T = 0.0.into();
        let mut mser: Vec<T> = vec![0.0.into(); length];
        for d in (0..length).rev() {
            s += self.time_series[d];
            q += self.time_series[d].powi(2);
            let remaining: T = usize_to_float(length - d)?;
            mser[d] = (q - s.powi(2) / remaining) / remaining.powi(2);
        }
        // Find the minimum MSER in the first half of the time series
        let deletion_point = (0..length / 2)
            .fold(None, |best: Option<usize>, index| match best {
                Some(best_index) if mser[best_index] <= mser[index] => Some(best_index),
                _ => Some(index),
            })
            .ok_or(SimulationError::PrerequisiteCalcError)?;
        // Schmeiser [1982] found that, for a fixed total sample size, there
        // is little benefit from dividing it into more than k = 30 batches,
        // even if we could do so and still retain independence between the
        // batch means.
        let batch_count = usize::min(usize_sqrt(length - deletion_point), MAX_BATCHES);
        let batch_size = (length - deletion_point) / batch_count;
        // if data are left over, eliminate from the beginning
        self.deletion_point = Some(length - batch_count * batch_size);
        self.batch_count = Some(batch_count);
        self.batch_size = Some(batch_size);
        Ok(())
    }

    /// After the `set_to_fixed_budget` method analyzes the time series to
    /// determine the appropriate initialization data deletion and batching
    /// configuration, this method uses that configuration for calculation
    /// and processing.
    fn calculate_batch_statistics(&mut self) -> Result<(), SimulationError> {
        if self.batch_count.is_none() {
            self.set_to_fixed_budget()?;
        }
        let deletion_point = self
            .deletion_point
            .ok_or(SimulationError::PrerequisiteCalcError)?;
        let batch_size = self
            .batch_size
            .ok_or(SimulationError::PrerequisiteCalcError)?;
        let batch_count = self
            .batch_count
            .ok_or(SimulationError::PrerequisiteCalcError)?;
        let batch_means: Result<Vec<T>, SimulationError> = (0..batch_count)
            .map(|batch_index| {
                let batch_start_index = deletion_point + batch_size * batch_index;
                sample_mean(&self.time_series[batch_start_index..batch_start_index + batch_size])
            })
            .collect();
        self.batch_means = batch_means?;
        let batches_mean = sample_mean(&self.batch_means)?;
        self.batches_variance = Some(sample_variance(&self.batch_means, &batches_mean)?);
        self.batches_mean = Some(batches_mean);
        Ok(())
    }

    /// The method provides a confidence interval on the mean, for the
    /// simuation output.  If not already processed, the raw data will first
    /// use standard approaches for initialization bias reduction and
    /// autocorrelation management.
    pub fn confidence_interval_mean(
        &mut self,
        alpha: T,
    ) -> Result<ConfidenceInterval<T>, SimulationError> {
        if self.batches_mean.is_none() {
            self.calculate_batch_statistics()?;
        }
        let batches_mean = self
            .batches_mean
            .ok_or(SimulationError::PrerequisiteCalcError)?;
        let batches_variance = self
            .batches_variance
            .ok_or(SimulationError::PrerequisiteCalcError)?;
        let batch_count = self
            .batch_count
            .ok_or(SimulationError::PrerequisiteCalcError)?;
        interval_about(batches_mean, batches_variance, batch_count, alpha)
    }

    /// The method provides a point estimate on the mean, for the simulation
    /// output.  If not already processed, the raw data will first use
    /// standard approaches for initialization bias reduction and
    /// autocorrelation management.
    pub fn point_estimate_mean(&mut self) -> Result<T, SimulationError> {
        if self.batches_mean.is_none() {
            self.calculate_batch_statistics()?;
        }
        self.batches_mean
            .ok_or(SimulationError::PrerequisiteCalcError)
    }

    /// The number of initial points deleted, once computed.
    pub fn deletion_point(&self) -> Option<usize> {
        self.deletion_point
    }

    pub fn batch_means(&self) -> &[T] {
        &self.batch_means
    }
}
