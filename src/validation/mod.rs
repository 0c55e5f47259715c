//! Statistical tests of uniform random number samples.  Uniformity is
//! tested with the chi-square and Kolmogorov-Smirnov goodness of fit
//! tests, and independence with the runs up and down, poker, and lag
//! autocorrelation tests.  Each test is a pure function of the sample,
//! returning a `Verdict` at the 0.05 significance level.
//!
//! Samples must lie in [0, 1).

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::utils::errors::SimulationError;

pub mod critical_values;

/// Significance level of every verdict
pub const SIGNIFICANCE: f64 = 0.05;

/// Bins of the chi-square test in `run_all`
pub const DEFAULT_BINS: usize = 10;

/// Hand size of the poker test in `run_all`
pub const DEFAULT_POKER_DIGITS: u32 = 3;

/// Minimum expected count of a chi-square category
const MIN_EXPECTED_COUNT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HypothesisTest {
    ChiSquare,
    KolmogorovSmirnov,
    Runs,
    Poker,
    Autocorrelation,
}

impl HypothesisTest {
    pub fn name(&self) -> &'static str {
        match self {
            HypothesisTest::ChiSquare => "chi-square",
            HypothesisTest::KolmogorovSmirnov => "Kolmogorov-Smirnov",
            HypothesisTest::Runs => "runs up and down",
            HypothesisTest::Poker => "poker",
            HypothesisTest::Autocorrelation => "autocorrelation",
        }
    }
}

impl fmt::Display for HypothesisTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The outcome of one hypothesis test.  For the runs and autocorrelation
/// tests the statistic is a standard normal Z, accepted when `|Z|` is
/// below the critical value; otherwise the statistic is accepted when
/// below the critical value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub test: HypothesisTest,
    pub statistic: f64,
    pub critical_value: f64,
    pub significance: f64,
    pub degrees_of_freedom: Option<usize>,
    /// Whether the null hypothesis is accepted
    pub accepted: bool,
}

impl Verdict {
    fn upper_tail(
        test: HypothesisTest,
        statistic: f64,
        critical_value: f64,
        degrees_of_freedom: Option<usize>,
    ) -> Self {
        let verdict = Self {
            test,
            statistic,
            critical_value,
            significance: SIGNIFICANCE,
            degrees_of_freedom,
            accepted: statistic < critical_value,
        };
        verdict.log();
        verdict
    }

    fn two_sided(test: HypothesisTest, z: f64) -> Self {
        let verdict = Self {
            test,
            statistic: z,
            critical_value: critical_values::Z_TWO_SIDED,
            significance: SIGNIFICANCE,
            degrees_of_freedom: None,
            accepted: z.abs() < critical_values::Z_TWO_SIDED,
        };
        verdict.log();
        verdict
    }

    fn log(&self) {
        debug!(
            test = %self.test,
            statistic = self.statistic,
            critical_value = self.critical_value,
            accepted = self.accepted,
            "hypothesis test"
        );
    }
}

/// The verdicts of the chi-square, Kolmogorov-Smirnov, runs, and poker
/// tests over one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    verdicts: BTreeMap<HypothesisTest, Verdict>,
}

impl ValidationReport {
    pub fn get(&self, test: HypothesisTest) -> Option<&Verdict> {
        self.verdicts.get(&test)
    }

    pub fn verdicts(&self) -> impl Iterator<Item = &Verdict> {
        self.verdicts.values()
    }

    pub fn all_accepted(&self) -> bool {
        self.verdicts.values().all(|verdict| verdict.accepted)
    }

    pub fn len(&self) -> usize {
        self.verdicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verdicts.is_empty()
    }
}

/// Descriptive statistics of a sample.  The variance is the population
/// variance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleSummary {
    pub count: usize,
    pub mean: f64,
    pub variance: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

fn check_sample(sample: &[f64], required: usize) -> Result<(), SimulationError> {
    if sample.len() < required {
        return Err(SimulationError::InsufficientSample {
            required,
            actual: sample.len(),
        });
    }
    match sample
        .iter()
        .find(|value| !(**value >= 0.0 && **value < 1.0))
    {
        Some(value) => Err(SimulationError::SampleOutOfRange { value: *value }),
        None => Ok(()),
    }
}

fn chi_square_statistic(observed: &[f64], expected: &[f64]) -> f64 {
    observed
        .iter()
        .zip(expected.iter())
        .map(|(observed, expected)| (observed - expected).powi(2) / expected)
        .sum()
}

/// Chi-square test of uniformity over `bins` equal-width classes, with
/// `bins - 1` degrees of freedom.
pub fn chi_square(sample: &[f64], bins: usize) -> Result<Verdict, SimulationError> {
    if bins < 2 {
        return Err(SimulationError::InvalidConfiguration(format!(
            "the chi-square test needs at least 2 bins, found {}",
            bins
        )));
    }
    check_sample(sample, 1)?;
    let mut observed = vec![0.0; bins];
    sample.iter().for_each(|value| {
        let bin = ((value * bins as f64) as usize).min(bins - 1);
        observed[bin] += 1.0;
    });
    let expected = vec![sample.len() as f64 / bins as f64; bins];
    let degrees_of_freedom = bins - 1;
    Ok(Verdict::upper_tail(
        HypothesisTest::ChiSquare,
        chi_square_statistic(&observed, &expected),
        critical_values::chi_square(degrees_of_freedom)?,
        Some(degrees_of_freedom),
    ))
}

/// Kolmogorov-Smirnov test of uniformity: the largest distance between
/// the empirical distribution function and the identity.
pub fn kolmogorov_smirnov(sample: &[f64]) -> Result<Verdict, SimulationError> {
    check_sample(sample, 1)?;
    let mut sorted = sample.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len() as f64;
    let d = sorted
        .iter()
        .enumerate()
        .map(|(index, value)| {
            let above = (index + 1) as f64 / n - value;
            let below = value - index as f64 / n;
            above.max(below)
        })
        .fold(0.0, f64::max);
    Ok(Verdict::upper_tail(
        HypothesisTest::KolmogorovSmirnov,
        d,
        critical_values::kolmogorov_smirnov(sorted.len())?,
        None,
    ))
}

/// Runs up and down test of independence.  A run is a maximal sequence of
/// successive increases, or of successive non-increases; the count of runs
/// in `n` values has mean `(2n - 1) / 3` and variance `(16n - 29) / 90`.
pub fn runs_up_down(sample: &[f64]) -> Result<Verdict, SimulationError> {
    check_sample(sample, 3)?;
    let directions: Vec<bool> = sample.windows(2).map(|pair| pair[1] > pair[0]).collect();
    let runs = 1 + directions
        .windows(2)
        .filter(|pair| pair[0] != pair[1])
        .count();
    let n = sample.len() as f64;
    let mean = (2.0 * n - 1.0) / 3.0;
    let variance = (16.0 * n - 29.0) / 90.0;
    Ok(Verdict::two_sided(
        HypothesisTest::Runs,
        (runs as f64 - mean) / variance.sqrt(),
    ))
}

/// The repetition pattern of a poker hand: the multiplicity of each
/// distinct digit, largest first.  `[2, 1]` is one pair in a hand of 3.
pub type HandPattern = Vec<usize>;

fn factorial(n: usize) -> f64 {
    (1..=n).map(|k| k as f64).product()
}

fn partitions(
    remaining: usize,
    largest_part: usize,
    prefix: &mut Vec<usize>,
    all: &mut Vec<HandPattern>,
) {
    if remaining == 0 {
        all.push(prefix.clone());
        return;
    }
    for part in (1..=remaining.min(largest_part)).rev() {
        prefix.push(part);
        partitions(remaining - part, part, prefix, all);
        prefix.pop();
    }
}

/// Every hand pattern of `digits` decimal digits with its probability,
/// most probable first.
pub fn poker_hands(digits: u32) -> Vec<(HandPattern, f64)> {
    let hand_size = digits as usize;
    let mut patterns = Vec::new();
    partitions(hand_size, hand_size, &mut Vec::new(), &mut patterns);
    let mut hands: Vec<(HandPattern, f64)> = patterns
        .into_iter()
        .filter(|pattern| pattern.len() <= 10)
        .map(|pattern| {
            let distinct = pattern.len();
            // ordered choices of the distinct digits, unordered among equal multiplicities
            let digit_choices = factorial(10) / factorial(10 - distinct)
                / (1..=hand_size)
                    .map(|size| factorial(pattern.iter().filter(|part| **part == size).count()))
                    .product::<f64>();
            let arrangements = factorial(hand_size)
                / pattern.iter().map(|part| factorial(*part)).product::<f64>();
            let probability = digit_choices * arrangements / 10f64.powi(digits as i32);
            (pattern, probability)
        })
        .collect();
    hands.sort_by(|a, b| b.1.total_cmp(&a.1));
    hands
}

fn hand_pattern(value: f64, digits: u32) -> HandPattern {
    let mut hand = (value * 10f64.powi(digits as i32)).floor() as u64;
    let mut counts = [0usize; 10];
    for _ in 0..digits {
        counts[(hand % 10) as usize] += 1;
        hand /= 10;
    }
    let mut pattern: HandPattern = counts.iter().copied().filter(|count| *count > 0).collect();
    pattern.sort_unstable_by(|a, b| b.cmp(a));
    pattern
}

/// Poker test of independence over the leading `digits` digits (3 to 5)
/// of each value.  Observed hand patterns are compared with their
/// probabilities by chi-square; the rarest patterns are pooled until every
/// expected count is at least 5.
pub fn poker(sample: &[f64], digits: u32) -> Result<Verdict, SimulationError> {
    if !(3..=5).contains(&digits) {
        return Err(SimulationError::InvalidConfiguration(format!(
            "the poker test takes hands of 3 to 5 digits, found {}",
            digits
        )));
    }
    let hands = poker_hands(digits);
    let required = (MIN_EXPECTED_COUNT / hands[1].1).ceil() as usize;
    check_sample(sample, required)?;
    let n = sample.len() as f64;
    let mut observed = vec![0.0; hands.len()];
    for value in sample {
        let pattern = hand_pattern(*value, digits);
        let index = hands
            .iter()
            .position(|(hand, _)| *hand == pattern)
            .ok_or(SimulationError::PrerequisiteCalcError)?;
        observed[index] += 1.0;
    }
    let mut expected: Vec<f64> = hands.iter().map(|(_, probability)| n * probability).collect();
    while expected.len() > 2 && expected[expected.len() - 1] < MIN_EXPECTED_COUNT {
        let rarest = expected.len() - 1;
        observed[rarest - 1] += observed[rarest];
        expected[rarest - 1] += expected[rarest];
        observed.truncate(rarest);
        expected.truncate(rarest);
    }
    let degrees_of_freedom = expected.len() - 1;
    Ok(Verdict::upper_tail(
        HypothesisTest::Poker,
        chi_square_statistic(&observed, &expected),
        critical_values::chi_square(degrees_of_freedom)?,
        Some(degrees_of_freedom),
    ))
}

/// Lag-`lag` autocorrelation test of independence, over the values at
/// indices `start`, `start + lag`, `start + 2 lag`, ...
pub fn autocorrelation(sample: &[f64], start: usize, lag: usize) -> Result<Verdict, SimulationError> {
    if lag < 1 {
        return Err(SimulationError::InvalidConfiguration(String::from(
            "the autocorrelation lag must be at least 1",
        )));
    }
    check_sample(sample, start + lag + 1)?;
    // M is the largest integer with start + (M + 1) lag <= n - 1
    let m = (sample.len() - 1 - start) / lag - 1;
    let pairs = (m + 1) as f64;
    let products: f64 = (0..=m)
        .map(|k| sample[start + k * lag] * sample[start + (k + 1) * lag])
        .sum();
    let rho = products / pairs - 0.25;
    let sigma = (13.0 * m as f64 + 7.0).sqrt() / (12.0 * pairs);
    Ok(Verdict::two_sided(HypothesisTest::Autocorrelation, rho / sigma))
}

/// The chi-square (10 bins), Kolmogorov-Smirnov, runs up and down, and
/// 3-digit poker tests, keyed by test.
pub fn run_all(sample: &[f64]) -> Result<ValidationReport, SimulationError> {
    let verdicts = vec![
        chi_square(sample, DEFAULT_BINS)?,
        kolmogorov_smirnov(sample)?,
        runs_up_down(sample)?,
        poker(sample, DEFAULT_POKER_DIGITS)?,
    ];
    Ok(ValidationReport {
        verdicts: verdicts
            .into_iter()
            .map(|verdict| (verdict.test, verdict))
            .collect(),
    })
}

pub fn summarize(sample: &[f64]) -> Result<SampleSummary, SimulationError> {
    if sample.is_empty() {
        return Err(SimulationError::InsufficientSample {
            required: 1,
            actual: 0,
        });
    }
    let count = sample.len();
    let mean = sample.iter().sum::<f64>() / count as f64;
    let variance = sample.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / count as f64;
    Ok(SampleSummary {
        count,
        mean,
        variance,
        std_dev: variance.sqrt(),
        min: sample.iter().copied().fold(f64::INFINITY, f64::min),
        max: sample.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input_modeling::uniform_stream::{UniformSource, UniformStream};

    fn good_sample() -> Vec<f64> {
        UniformStream::new(42).next_uniforms(10000)
    }

    #[test]
    fn sample_range_is_checked() {
        assert!(matches!(
            chi_square(&[0.5, 1.0], 2),
            Err(SimulationError::SampleOutOfRange { .. })
        ));
        assert!(matches!(
            kolmogorov_smirnov(&[-0.1]),
            Err(SimulationError::SampleOutOfRange { .. })
        ));
        assert!(matches!(
            runs_up_down(&[0.1, f64::NAN, 0.3]),
            Err(SimulationError::SampleOutOfRange { .. })
        ));
        assert!(matches!(
            kolmogorov_smirnov(&[]),
            Err(SimulationError::InsufficientSample { .. })
        ));
        assert!(matches!(
            runs_up_down(&[0.1, 0.2]),
            Err(SimulationError::InsufficientSample { .. })
        ));
        assert!(chi_square(&[0.5], 1).is_err());
    }

    #[test]
    fn chi_square_counts_bins() {
        // 2 per bin in 4 bins: perfectly uniform
        let sample = [0.1, 0.2, 0.3, 0.4, 0.6, 0.7, 0.8, 0.9];
        let verdict = chi_square(&sample, 4).unwrap();
        assert_eq!(verdict.statistic, 0.0);
        assert_eq!(verdict.degrees_of_freedom, Some(3));
        assert_eq!(verdict.critical_value, 7.815);
        assert!(verdict.accepted);
        // everything in one of 4 bins: (8 - 2)^2 / 2 + 3 * 2 = 24
        let verdict = chi_square(&[0.1; 8], 4).unwrap();
        assert!((verdict.statistic - 24.0).abs() < 1e-12);
        assert!(!verdict.accepted);
    }

    #[test]
    fn kolmogorov_smirnov_statistic() {
        let verdict = kolmogorov_smirnov(&[0.44, 0.81, 0.14, 0.05, 0.93]).unwrap();
        // sorted: 0.05 0.14 0.44 0.81 0.93, largest gap 0.26 above 0.14
        assert!((verdict.statistic - 0.26).abs() < 1e-12);
        assert_eq!(verdict.critical_value, 0.565);
        assert!(verdict.accepted);
    }

    #[test]
    fn runs_are_counted_by_direction_changes() {
        // directions + + - + -: three changes, four runs
        let sample = [0.1, 0.2, 0.3, 0.25, 0.5, 0.4];
        let verdict = runs_up_down(&sample).unwrap();
        let mean = 11.0 / 3.0;
        let sigma = (67.0f64 / 90.0).sqrt();
        assert!((verdict.statistic - (4.0 - mean) / sigma).abs() < 1e-12);
        // ties count as decreases, so a constant sample is a single run
        let verdict = runs_up_down(&[0.5; 100]).unwrap();
        assert!(verdict.statistic < -1.96);
        assert!(!verdict.accepted);
    }

    #[test]
    fn poker_hand_probabilities() {
        let hands = poker_hands(3);
        assert_eq!(hands.len(), 3);
        assert_eq!(hands[0].0, vec![1, 1, 1]);
        assert!((hands[0].1 - 0.72).abs() < 1e-12);
        assert_eq!(hands[1].0, vec![2, 1]);
        assert!((hands[1].1 - 0.27).abs() < 1e-12);
        assert!((hands[2].1 - 0.01).abs() < 1e-12);
        for digits in 3..=5 {
            let total: f64 = poker_hands(digits).iter().map(|(_, p)| p).sum();
            assert!((total - 1.0).abs() < 1e-12);
        }
        let five = poker_hands(5);
        assert_eq!(five.len(), 7);
        assert!((five[0].1 - 0.504).abs() < 1e-12);
        assert!((five[1].1 - 0.3024).abs() < 1e-12);
    }

    #[test]
    fn hand_patterns_use_truncated_digits() {
        assert_eq!(hand_pattern(0.5, 3), vec![2, 1]);
        assert_eq!(hand_pattern(0.1235, 3), vec![1, 1, 1]);
        assert_eq!(hand_pattern(0.7779, 3), vec![3]);
        assert_eq!(hand_pattern(0.0, 4), vec![4]);
        assert_eq!(hand_pattern(0.12125, 4), vec![2, 2]);
    }

    #[test]
    fn poker_pools_rare_hands() {
        // 100 hands of 4 digits: the two rarest patterns expect 0.1 and 2.7
        let sample = UniformStream::new(3).next_uniforms(100);
        let verdict = poker(&sample, 4).unwrap();
        assert_eq!(verdict.degrees_of_freedom, Some(2));
        assert!(matches!(
            poker(&sample[..10], 3),
            Err(SimulationError::InsufficientSample { .. })
        ));
        assert!(poker(&sample, 6).is_err());
    }

    #[test]
    fn autocorrelation_of_constant_sample() {
        // 20 values, lag 3 from index 2: M = (19 - 2) / 3 - 1 = 4
        let sample = [0.5; 20];
        let verdict = autocorrelation(&sample, 2, 3).unwrap();
        let sigma = (13.0f64 * 4.0 + 7.0).sqrt() / (12.0 * 5.0);
        assert!(verdict.statistic.abs() < 1e-12 / sigma);
        assert!(verdict.accepted);
        let verdict = autocorrelation(&[0.9; 20], 0, 1).unwrap();
        assert!(!verdict.accepted);
        assert!(autocorrelation(&sample, 0, 0).is_err());
        assert!(autocorrelation(&sample, 18, 2).is_err());
    }

    #[test]
    fn good_sample_is_accepted() {
        let sample = good_sample();
        let report = run_all(&sample).unwrap();
        assert_eq!(report.len(), 4);
        assert!(report.all_accepted());
        assert!(autocorrelation(&sample, 0, 5).unwrap().accepted);
    }

    #[test]
    fn summary_statistics() {
        let summary = summarize(&[0.2, 0.4, 0.6, 0.8]).unwrap();
        assert_eq!(summary.count, 4);
        assert!((summary.mean - 0.5).abs() < 1e-12);
        assert!((summary.variance - 0.05).abs() < 1e-12);
        assert_eq!(summary.min, 0.2);
        assert_eq!(summary.max, 0.8);
        assert!(summarize(&[]).is_err());
    }
}
