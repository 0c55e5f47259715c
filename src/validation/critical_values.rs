//! Critical values at the 0.05 significance level.

use crate::utils::errors::SimulationError;

/// Upper 5% points of the chi-square distribution, for 1 through 30
/// degrees of freedom.
const CHI_SQUARE: [f64; 30] = [
    3.841, 5.991, 7.815, 9.488, 11.070, 12.592, 14.067, 15.507, 16.919, 18.307, 19.675, 21.026,
    22.362, 23.685, 24.996, 26.296, 27.587, 28.869, 30.144, 31.410, 32.671, 33.924, 35.172, 36.415,
    37.652, 38.885, 40.113, 41.337, 42.557, 43.773,
];

/// One-sample Kolmogorov-Smirnov critical values, for sample sizes 1
/// through 20.
const KOLMOGOROV_SMIRNOV: [f64; 20] = [
    0.975, 0.842, 0.708, 0.624, 0.565, 0.521, 0.486, 0.457, 0.432, 0.410, 0.391, 0.375, 0.361,
    0.349, 0.338, 0.328, 0.318, 0.309, 0.301, 0.294,
];

/// Kolmogorov-Smirnov critical values at coarser sample sizes.
const KOLMOGOROV_SMIRNOV_COARSE: [(usize, f64); 7] = [
    (20, 0.294),
    (25, 0.264),
    (30, 0.242),
    (35, 0.224),
    (40, 0.210),
    (45, 0.198),
    (50, 0.188),
];

/// Upper 5% point of the standard normal distribution
const Z_UPPER_FIVE_PERCENT: f64 = 1.644_854;

/// Two-sided 5% point of the standard normal distribution
pub const Z_TWO_SIDED: f64 = 1.96;

/// The chi-square critical value, tabulated through 30 degrees of freedom
/// and from the Wilson-Hilferty approximation beyond.
pub fn chi_square(degrees_of_freedom: usize) -> Result<f64, SimulationError> {
    match degrees_of_freedom {
        0 => Err(SimulationError::InvalidConfiguration(String::from(
            "the chi-square distribution needs at least one degree of freedom",
        ))),
        1..=30 => Ok(CHI_SQUARE[degrees_of_freedom - 1]),
        _ => {
            let k = degrees_of_freedom as f64;
            let spread = 2.0 / (9.0 * k);
            Ok(k * (1.0 - spread + Z_UPPER_FIVE_PERCENT * spread.sqrt()).powi(3))
        }
    }
}

/// The Kolmogorov-Smirnov critical value for a sample of `n` values:
/// tabulated through 20, interpolated through 50, and `1.36 / sqrt(n)`
/// beyond.
pub fn kolmogorov_smirnov(n: usize) -> Result<f64, SimulationError> {
    match n {
        0 => Err(SimulationError::InsufficientSample {
            required: 1,
            actual: 0,
        }),
        1..=20 => Ok(KOLMOGOROV_SMIRNOV[n - 1]),
        21..=50 => {
            let upper = KOLMOGOROV_SMIRNOV_COARSE
                .iter()
                .position(|(size, _)| *size >= n)
                .ok_or(SimulationError::PrerequisiteCalcError)?;
            let (high_n, high_value) = KOLMOGOROV_SMIRNOV_COARSE[upper];
            let (low_n, low_value) = KOLMOGOROV_SMIRNOV_COARSE[upper - 1];
            let fraction = (n - low_n) as f64 / (high_n - low_n) as f64;
            Ok(low_value + fraction * (high_value - low_value))
        }
        _ => Ok(1.36 / (n as f64).sqrt()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chi_square_table_and_approximation() {
        assert_eq!(chi_square(1).unwrap(), 3.841);
        assert_eq!(chi_square(9).unwrap(), 16.919);
        assert_eq!(chi_square(30).unwrap(), 43.773);
        // 40 degrees of freedom: 55.758
        assert!((chi_square(40).unwrap() - 55.758).abs() < 0.05);
        // 99 degrees of freedom: 123.225
        assert!((chi_square(99).unwrap() - 123.225).abs() < 0.1);
        assert!(chi_square(0).is_err());
    }

    #[test]
    fn kolmogorov_smirnov_table_interpolation_and_asymptote() {
        assert_eq!(kolmogorov_smirnov(5).unwrap(), 0.565);
        assert_eq!(kolmogorov_smirnov(20).unwrap(), 0.294);
        assert!((kolmogorov_smirnov(25).unwrap() - 0.264).abs() < 1e-9);
        assert!((kolmogorov_smirnov(27).unwrap() - 0.2552).abs() < 1e-9);
        assert!((kolmogorov_smirnov(50).unwrap() - 0.188).abs() < 1e-9);
        assert!((kolmogorov_smirnov(10000).unwrap() - 0.0136).abs() < 1e-12);
        assert!(kolmogorov_smirnov(0).is_err());
    }
}
