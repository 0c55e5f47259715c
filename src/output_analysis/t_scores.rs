//! Two-sided critical values of Student's t distribution.

use num_traits::Float;

use crate::utils::errors::SimulationError;

/// Two-sided significance levels of the table columns
const ALPHAS: [f64; 5] = [0.20, 0.10, 0.05, 0.02, 0.01];

const T_TABLE: [[f64; 5]; 34] = [
    [3.078, 6.314, 12.706, 31.821, 63.657],
    [1.886, 2.920, 4.303, 6.965, 9.925],
    [1.638, 2.353, 3.182, 4.541, 5.841],
    [1.533, 2.132, 2.776, 3.747, 4.604],
    [1.476, 2.015, 2.571, 3.365, 4.032],
    [1.440, 1.943, 2.447, 3.143, 3.707],
    [1.415, 1.895, 2.365, 2.998, 3.499],
    [1.397, 1.860, 2.306, 2.896, 3.355],
    [1.383, 1.833, 2.262, 2.821, 3.250],
    [1.372, 1.812, 2.228, 2.764, 3.169],
    [1.363, 1.796, 2.201, 2.718, 3.106],
    [1.356, 1.782, 2.179, 2.681, 3.055],
    [1.350, 1.771, 2.160, 2.650, 3.012],
    [1.345, 1.761, 2.145, 2.624, 2.977],
    [1.341, 1.753, 2.131, 2.602, 2.947],
    [1.337, 1.746, 2.120, 2.583, 2.921],
    [1.333, 1.740, 2.110, 2.567, 2.898],
    [1.330, 1.734, 2.101, 2.552, 2.878],
    [1.328, 1.729, 2.093, 2.539, 2.861],
    [1.325, 1.725, 2.086, 2.528, 2.845],
    [1.323, 1.721, 2.080, 2.518, 2.831],
    [1.321, 1.717, 2.074, 2.508, 2.819],
    [1.319, 1.714, 2.069, 2.500, 2.807],
    [1.318, 1.711, 2.064, 2.492, 2.797],
    [1.316, 1.708, 2.060, 2.485, 2.787],
    [1.315, 1.706, 2.056, 2.479, 2.779],
    [1.314, 1.703, 2.052, 2.473, 2.771],
    [1.313, 1.701, 2.048, 2.467, 2.763],
    [1.311, 1.699, 2.045, 2.462, 2.756],
    [1.310, 1.697, 2.042, 2.457, 2.750],
    // 40, 60, 120
    [1.303, 1.684, 2.021, 2.423, 2.704],
    [1.296, 1.671, 2.000, 2.390, 2.660],
    [1.289, 1.658, 1.980, 2.358, 2.617],
    // infinite degrees of freedom
    [1.282, 1.645, 1.960, 2.326, 2.576],
];

/// The t score leaving `alpha / 2` in each tail.  Between tabulated rows
/// the next smaller tabulated degrees of freedom is used; the normal row
/// applies from 1000 degrees of freedom.
pub fn t_score<T: Float>(alpha: T, degrees_of_freedom: usize) -> Result<T, SimulationError> {
    let alpha_value = alpha.to_f64().ok_or(SimulationError::FloatConvError)?;
    let column = ALPHAS
        .iter()
        .position(|tabulated| (tabulated - alpha_value).abs() < 1e-9)
        .ok_or(SimulationError::UnsupportedSignificance { alpha: alpha_value })?;
    let row = match degrees_of_freedom {
        0 => {
            return Err(SimulationError::InsufficientSample {
                required: 2,
                actual: 1,
            })
        }
        1..=30 => degrees_of_freedom - 1,
        31..=39 => 29,
        40..=59 => 30,
        60..=119 => 31,
        120..=999 => 32,
        _ => 33,
    };
    T::from(T_TABLE[row][column]).ok_or(SimulationError::FloatConvError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tabulated_values() {
        assert_eq!(t_score(0.05, 1).unwrap(), 12.706);
        assert_eq!(t_score(0.10, 9).unwrap(), 1.833);
        assert_eq!(t_score(0.01, 30).unwrap(), 2.750);
        assert_eq!(t_score(0.05f32, 4).unwrap(), 2.776f32);
    }

    #[test]
    fn untabulated_degrees_round_down() {
        assert_eq!(t_score(0.05, 35).unwrap(), 2.042);
        assert_eq!(t_score(0.05, 40).unwrap(), 2.021);
        assert_eq!(t_score(0.05, 99).unwrap(), 2.000);
        assert_eq!(t_score(0.05, 500).unwrap(), 1.980);
        assert_eq!(t_score(0.05, 100_000).unwrap(), 1.960);
    }

    #[test]
    fn unsupported_inputs() {
        assert!(matches!(
            t_score(0.07, 10),
            Err(SimulationError::UnsupportedSignificance { .. })
        ));
        assert!(t_score(0.05, 0).is_err());
    }
}
