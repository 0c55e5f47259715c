//! Random variate generation by the inverse-transform and composition
//! methods.  Each sampler is a pure function of the draws it takes from the
//! supplied `UniformSource`, and it consumes a fixed, documented number of
//! draws (apart from the redraw of an exact zero under a logarithm, and the
//! sequential-search Poisson sampler), so identical seeds and call sequences
//! replay identical variates.

use std::f64::consts::PI;

use super::uniform_stream::UniformSource;
use crate::utils::errors::SimulationError;

/// Upper bound on consecutive zero draws before a source is declared degenerate.
const MAX_ZERO_REDRAWS: usize = 64;

fn require(
    condition: bool,
    distribution: &'static str,
    reason: &str,
) -> Result<(), SimulationError> {
    if condition {
        Ok(())
    } else {
        Err(SimulationError::domain(distribution, reason))
    }
}

/// A uniform draw on (0, 1), re-drawing exact zeros.
fn nonzero_uniform<S: UniformSource + ?Sized>(stream: &mut S) -> Result<f64, SimulationError> {
    for _ in 0..MAX_ZERO_REDRAWS {
        let uniform = stream.next_uniform();
        if uniform > 0.0 {
            return Ok(uniform);
        }
    }
    Err(SimulationError::DegenerateStream {
        draws: MAX_ZERO_REDRAWS,
    })
}

/// Continuous uniform on [min, max): `min + (max - min) u`.  One draw.
pub fn uniform<S: UniformSource + ?Sized>(
    stream: &mut S,
    min: f64,
    max: f64,
) -> Result<f64, SimulationError> {
    require(
        min.is_finite() && max.is_finite() && min < max,
        "uniform",
        "bounds must be finite with min < max",
    )?;
    Ok(min + (max - min) * stream.next_uniform())
}

/// Discrete uniform on the inclusive range [min, max]:
/// `min + floor((max - min + 1) u)`.  One draw.
pub fn discrete_uniform<S: UniformSource + ?Sized>(
    stream: &mut S,
    min: u64,
    max: u64,
) -> Result<u64, SimulationError> {
    require(min <= max, "discrete uniform", "min must not exceed max")?;
    let span = (max - min) as f64 + 1.0;
    let offset = (span * stream.next_uniform()).floor() as u64;
    Ok(min + offset.min(max - min))
}

/// Exponential with rate `lambda`: `-ln(u) / lambda`.  One draw.
pub fn exponential<S: UniformSource + ?Sized>(
    stream: &mut S,
    rate: f64,
) -> Result<f64, SimulationError> {
    require(
        rate.is_finite() && rate > 0.0,
        "exponential",
        "rate must be positive and finite",
    )?;
    Ok(-nonzero_uniform(stream)?.ln() / rate)
}

/// Box-Muller pair: both normals share the same two draws `u1, u2`.
pub fn normal_pair<S: UniformSource + ?Sized>(
    stream: &mut S,
    mean: f64,
    std_dev: f64,
) -> Result<(f64, f64), SimulationError> {
    require(
        mean.is_finite() && std_dev.is_finite() && std_dev >= 0.0,
        "normal",
        "mean must be finite and standard deviation non-negative",
    )?;
    let u1 = nonzero_uniform(stream)?;
    let u2 = stream.next_uniform();
    let radius = (-2.0 * u1.ln()).sqrt();
    let angle = 2.0 * PI * u2;
    Ok((
        mean + std_dev * radius * angle.cos(),
        mean + std_dev * radius * angle.sin(),
    ))
}

/// Normal by Box-Muller, keeping the cosine variate.  Two draws.
pub fn normal<S: UniformSource + ?Sized>(
    stream: &mut S,
    mean: f64,
    std_dev: f64,
) -> Result<f64, SimulationError> {
    normal_pair(stream, mean, std_dev).map(|(variate, _)| variate)
}

/// Triangular on [min, max] with the given mode.  One draw.
pub fn triangular<S: UniformSource + ?Sized>(
    stream: &mut S,
    min: f64,
    max: f64,
    mode: f64,
) -> Result<f64, SimulationError> {
    require(
        min.is_finite() && max.is_finite() && mode.is_finite(),
        "triangular",
        "bounds and mode must be finite",
    )?;
    require(
        min < max && min <= mode && mode <= max,
        "triangular",
        "requires min <= mode <= max with min < max",
    )?;
    let u = stream.next_uniform();
    let range = max - min;
    if u < (mode - min) / range {
        Ok(min + (u * range * (mode - min)).sqrt())
    } else {
        Ok(max - ((1.0 - u) * range * (max - mode)).sqrt())
    }
}

/// Poisson by sequential search: multiply uniforms until the running product
/// drops below `e^-lambda`; the variate is the number of factors minus one.
/// Consumes `variate + 1` draws.
pub fn poisson<S: UniformSource + ?Sized>(
    stream: &mut S,
    lambda: f64,
) -> Result<u64, SimulationError> {
    require(
        lambda.is_finite() && lambda > 0.0,
        "Poisson",
        "lambda must be positive and finite",
    )?;
    let threshold = (-lambda).exp();
    require(
        threshold > 0.0,
        "Poisson",
        "lambda is too large for the sequential search method",
    )?;
    let mut product = 1.0;
    let mut factors: u64 = 0;
    while product >= threshold {
        product *= stream.next_uniform();
        factors += 1;
    }
    Ok(factors - 1)
}

/// Erlang with `shape` phases of rate `rate`: `-ln(u1 ... uk) / rate`.
/// Consumes `shape` draws.
pub fn erlang<S: UniformSource + ?Sized>(
    stream: &mut S,
    shape: u32,
    rate: f64,
) -> Result<f64, SimulationError> {
    require(shape >= 1, "Erlang", "shape must be at least 1")?;
    require(
        rate.is_finite() && rate > 0.0,
        "Erlang",
        "rate must be positive and finite",
    )?;
    let mut product = 1.0;
    let mut log_sum = 0.0;
    for _ in 0..shape {
        let u = nonzero_uniform(stream)?;
        product *= u;
        log_sum += u.ln();
    }
    if product > 0.0 {
        Ok(-product.ln() / rate)
    } else {
        // the product underflowed
        Ok(-log_sum / rate)
    }
}

/// Weibull with scale `alpha` and shape `beta`: `alpha (-ln u)^(1/beta)`.
/// One draw.
pub fn weibull<S: UniformSource + ?Sized>(
    stream: &mut S,
    scale: f64,
    shape: f64,
) -> Result<f64, SimulationError> {
    require(
        scale.is_finite() && shape.is_finite() && scale > 0.0 && shape > 0.0,
        "Weibull",
        "scale and shape must be positive and finite",
    )?;
    Ok(scale * (-nonzero_uniform(stream)?.ln()).powf(1.0 / shape))
}

/// Lognormal: `exp(N(mu, sigma))`, with the normal from Box-Muller.  Two draws.
pub fn lognormal<S: UniformSource + ?Sized>(
    stream: &mut S,
    mu: f64,
    sigma: f64,
) -> Result<f64, SimulationError> {
    require(
        mu.is_finite() && sigma.is_finite() && sigma >= 0.0,
        "lognormal",
        "mu must be finite and sigma non-negative",
    )?;
    Ok(normal(stream, mu, sigma)?.exp())
}

/// Bernoulli trial, a success when `u < p`.  One draw.
pub fn bernoulli<S: UniformSource + ?Sized>(
    stream: &mut S,
    p: f64,
) -> Result<bool, SimulationError> {
    require(
        (0.0..=1.0).contains(&p),
        "Bernoulli",
        "p must lie in [0, 1]",
    )?;
    Ok(stream.next_uniform() < p)
}

/// Binomial as the number of successes in `trials` Bernoulli trials.
/// Consumes `trials` draws.
pub fn binomial<S: UniformSource + ?Sized>(
    stream: &mut S,
    trials: u64,
    p: f64,
) -> Result<u64, SimulationError> {
    require(
        (0.0..=1.0).contains(&p),
        "binomial",
        "p must lie in [0, 1]",
    )?;
    Ok((0..trials).filter(|_| stream.next_uniform() < p).count() as u64)
}

/// Geometric number of trials up to and including the first success:
/// `floor(ln(1 - u) / ln(1 - p)) + 1`.  One draw.
pub fn geometric<S: UniformSource + ?Sized>(
    stream: &mut S,
    p: f64,
) -> Result<u64, SimulationError> {
    require(p > 0.0 && p <= 1.0, "geometric", "p must lie in (0, 1]")?;
    let u = stream.next_uniform();
    if p == 1.0 {
        return Ok(1);
    }
    Ok(((1.0 - u).ln() / (1.0 - p).ln()).floor() as u64 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input_modeling::uniform_stream::{MiddleSquare, UniformStream};

    fn sample_mean<F: FnMut(&mut UniformStream) -> f64>(sample_size: usize, mut draw: F) -> f64 {
        let mut stream = UniformStream::new(42);
        (0..sample_size).map(|_| draw(&mut stream)).sum::<f64>() / sample_size as f64
    }

    /// A fixed-sequence source for hand-checked variates.
    #[derive(Debug)]
    struct Scripted {
        values: Vec<f64>,
        index: usize,
    }

    impl Scripted {
        fn new(values: &[f64]) -> Self {
            Self {
                values: values.to_vec(),
                index: 0,
            }
        }
    }

    impl UniformSource for Scripted {
        fn next_uniform(&mut self) -> f64 {
            let value = self.values[self.index % self.values.len()];
            self.index += 1;
            value
        }
    }

    #[test]
    fn exponential_is_inverse_transform() {
        let mut source = Scripted::new(&[0.5]);
        let variate = exponential(&mut source, 2.0).unwrap();
        assert!((variate - 2.0f64.ln() / 2.0).abs() < 1e-12);
    }

    #[test]
    fn exponential_redraws_exact_zero() {
        let mut source = Scripted::new(&[0.0, 0.25]);
        let variate = exponential(&mut source, 1.0).unwrap();
        assert!((variate - 4.0f64.ln()).abs() < 1e-12);
        assert_eq!(source.index, 2);
    }

    #[test]
    fn collapsed_source_is_reported() {
        // 0001^2 = 00000001, whose middle digits are 0000
        let mut generator = MiddleSquare::new(1, 4).unwrap();
        assert!(matches!(
            exponential(&mut generator, 1.0),
            Err(SimulationError::DegenerateStream { .. })
        ));
    }

    #[test]
    fn non_positive_rates_are_domain_errors() {
        let mut stream = UniformStream::new(1);
        assert!(matches!(
            exponential(&mut stream, 0.0),
            Err(SimulationError::InvalidDistributionParameter { .. })
        ));
        assert!(exponential(&mut stream, -1.0).is_err());
        assert!(exponential(&mut stream, f64::NAN).is_err());
        assert!(erlang(&mut stream, 0, 1.0).is_err());
        assert!(weibull(&mut stream, 1.0, 0.0).is_err());
        assert!(poisson(&mut stream, 0.0).is_err());
        assert!(poisson(&mut stream, 1000.0).is_err());
        assert!(bernoulli(&mut stream, 1.5).is_err());
        assert!(geometric(&mut stream, 0.0).is_err());
        assert!(triangular(&mut stream, 1.0, 0.0, 0.5).is_err());
        assert!(normal(&mut stream, 0.0, -1.0).is_err());
        // rejected calls draw nothing
        let mut fresh = UniformStream::new(1);
        assert_eq!(stream.next_uniform(), fresh.next_uniform());
    }

    #[test]
    fn exponential_samples_are_non_negative_and_match_expectation() {
        let mut stream = UniformStream::new(42);
        let samples: Vec<f64> = (0..10_000)
            .map(|_| exponential(&mut stream, 4.0).unwrap())
            .collect();
        assert!(samples.iter().all(|sample| *sample >= 0.0));
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        assert!((mean - 0.25).abs() / 0.25 < 0.05);
    }

    #[test]
    fn box_muller_pair_shares_its_draws() {
        let mut source = Scripted::new(&[0.5, 0.125]);
        let (cosine, sine) = normal_pair(&mut source, 0.0, 1.0).unwrap();
        let radius = (-2.0 * 0.5f64.ln()).sqrt();
        assert!((cosine - radius * (PI / 4.0).cos()).abs() < 1e-12);
        assert!((sine - radius * (PI / 4.0).sin()).abs() < 1e-12);
        assert_eq!(source.index, 2);
    }

    #[test]
    fn normal_samples_match_expectation() {
        let mut stream = UniformStream::new(42);
        let samples: Vec<f64> = (0..10_000)
            .map(|_| normal(&mut stream, 100.0, 15.0).unwrap())
            .collect();
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let variance =
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (samples.len() - 1) as f64;
        assert!((mean - 100.0).abs() < 1.0);
        assert!((variance.sqrt() - 15.0).abs() / 15.0 < 0.05);
    }

    #[test]
    fn triangular_branches() {
        let mut source = Scripted::new(&[0.1, 0.9]);
        // F(mode) = 0.7 for (0, 10, 7)
        let low = triangular(&mut source, 0.0, 10.0, 7.0).unwrap();
        let high = triangular(&mut source, 0.0, 10.0, 7.0).unwrap();
        assert!((low - (0.1f64 * 10.0 * 7.0).sqrt()).abs() < 1e-12);
        assert!((high - (10.0 - (0.1f64 * 10.0 * 3.0).sqrt())).abs() < 1e-12);
        let mean = sample_mean(10_000, |stream| triangular(stream, 0.0, 10.0, 7.0).unwrap());
        assert!((mean - 17.0 / 3.0).abs() / (17.0 / 3.0) < 0.05);
    }

    #[test]
    fn poisson_sequential_search() {
        // e^-1 = 0.3679: 0.9 * 0.5 = 0.45 >= threshold, * 0.5 = 0.225 < threshold
        let mut source = Scripted::new(&[0.9, 0.5, 0.5]);
        assert_eq!(poisson(&mut source, 1.0).unwrap(), 2);
        assert_eq!(source.index, 3);
        let mean = sample_mean(10_000, |stream| poisson(stream, 7.0).unwrap() as f64);
        assert!((mean - 7.0).abs() / 7.0 < 0.05);
    }

    #[test]
    fn erlang_samples_match_expectation() {
        let mut source = Scripted::new(&[0.5, 0.5]);
        let variate = erlang(&mut source, 2, 1.0).unwrap();
        assert!((variate - 4.0f64.ln()).abs() < 1e-12);
        let mean = sample_mean(10_000, |stream| erlang(stream, 3, 2.0).unwrap());
        assert!((mean - 1.5).abs() / 1.5 < 0.05);
    }

    #[test]
    fn erlang_survives_product_underflow() {
        let mut source = Scripted::new(&[1e-10]);
        let variate = erlang(&mut source, 40, 1.0).unwrap();
        assert!((variate - 40.0 * 1e10f64.ln()).abs() < 1e-6);
    }

    #[test]
    fn weibull_samples_match_expectation() {
        // scale * Gamma(1 + 1/2) for shape 2
        let expected = 2.0 * 0.886_226_925_452_758;
        let mean = sample_mean(10_000, |stream| weibull(stream, 2.0, 2.0).unwrap());
        assert!((mean - expected).abs() / expected < 0.05);
    }

    #[test]
    fn lognormal_samples_match_expectation() {
        let expected = (1.0f64 + 0.5f64.powi(2) / 2.0).exp();
        let mean = sample_mean(10_000, |stream| lognormal(stream, 1.0, 0.5).unwrap());
        assert!((mean - expected).abs() / expected < 0.05);
    }

    #[test]
    fn bernoulli_edges_and_frequency() {
        let mut stream = UniformStream::new(5);
        assert!((0..1000).all(|_| !bernoulli(&mut stream, 0.0).unwrap()));
        assert!((0..1000).all(|_| bernoulli(&mut stream, 1.0).unwrap()));
        let mean = sample_mean(10_000, |stream| bernoulli(stream, 0.3).unwrap() as u8 as f64);
        assert!((mean - 0.3).abs() / 0.3 < 0.05);
    }

    #[test]
    fn binomial_and_geometric_match_expectation() {
        let binomial_mean = sample_mean(10_000, |stream| binomial(stream, 10, 0.3).unwrap() as f64);
        assert!((binomial_mean - 3.0).abs() / 3.0 < 0.05);
        let geometric_mean = sample_mean(10_000, |stream| geometric(stream, 0.2).unwrap() as f64);
        assert!((geometric_mean - 5.0).abs() / 5.0 < 0.05);
        let mut stream = UniformStream::new(3);
        assert!((0..1000).all(|_| geometric(&mut stream, 0.4).unwrap() >= 1));
        assert_eq!(geometric(&mut stream, 1.0).unwrap(), 1);
    }

    #[test]
    fn discrete_uniform_covers_inclusive_range() {
        let mut stream = UniformStream::new(11);
        let mut counts = [0usize; 6];
        (0..6000).for_each(|_| {
            let face = discrete_uniform(&mut stream, 1, 6).unwrap();
            counts[(face - 1) as usize] += 1;
        });
        assert!(counts.iter().all(|count| *count > 850 && *count < 1150));
        assert_eq!(discrete_uniform(&mut stream, 4, 4).unwrap(), 4);
        assert!(discrete_uniform(&mut stream, 5, 4).is_err());
    }

    #[test]
    fn continuous_uniform_scales_draw() {
        let mut source = Scripted::new(&[0.25]);
        assert!((uniform(&mut source, 2.0, 6.0).unwrap() - 3.0).abs() < 1e-12);
        assert!(uniform(&mut source, 6.0, 2.0).is_err());
    }

    #[test]
    fn samplers_replay_bit_for_bit() {
        fn draw_all(stream: &mut UniformStream) -> Vec<f64> {
            vec![
                exponential(stream, 3.0).unwrap(),
                normal(stream, 0.0, 1.0).unwrap(),
                triangular(stream, 0.0, 10.0, 7.0).unwrap(),
                poisson(stream, 4.0).unwrap() as f64,
                erlang(stream, 3, 1.0).unwrap(),
                weibull(stream, 2.0, 1.5).unwrap(),
                lognormal(stream, 0.0, 1.0).unwrap(),
                binomial(stream, 10, 0.5).unwrap() as f64,
                geometric(stream, 0.3).unwrap() as f64,
            ]
        }
        let mut first = UniformStream::new(2718);
        let mut second = UniformStream::new(2718);
        for _ in 0..100 {
            let first_draws = draw_all(&mut first);
            let second_draws = draw_all(&mut second);
            assert!(first_draws
                .iter()
                .zip(second_draws.iter())
                .all(|(a, b)| a.to_bits() == b.to_bits()));
        }
    }
}
