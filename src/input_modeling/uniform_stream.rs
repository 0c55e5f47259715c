//! Uniform pseudorandom streams on [0, 1).  The `UniformStream` is a linear
//! congruential generator, `x(n+1) = (a x(n) + c) mod m`, emitting
//! `x(n+1) / m`.  Every derived random variate in this crate is a pure
//! function of draws from a `UniformSource`, so a stream re-seeded with the
//! same value replays the exact same variates.

use rand::{Error as RandError, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::utils::errors::SimulationError;
use crate::utils::{gcd, prime_factors};

/// A source of uniform random numbers on [0, 1).
pub trait UniformSource: std::fmt::Debug {
    /// Draw the next value, advancing the source state.
    fn next_uniform(&mut self) -> f64;

    /// Draw `count` values in order.
    fn next_uniforms(&mut self, count: usize) -> Vec<f64> {
        (0..count).map(|_| self.next_uniform()).collect()
    }
}

/// Multiplier, increment and modulus of a linear congruential generator.
/// A zero increment makes the generator multiplicative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawLcgParameters")]
pub struct LcgParameters {
    multiplier: u64,
    increment: u64,
    modulus: u64,
}

impl LcgParameters {
    /// The `rand()` example generator of the ANSI C standard.
    pub const ANSI_C: LcgParameters = LcgParameters {
        multiplier: 1_103_515_245,
        increment: 12_345,
        modulus: 1 << 31,
    };

    /// The "quick and dirty" generator of Numerical Recipes.
    pub const NUMERICAL_RECIPES: LcgParameters = LcgParameters {
        multiplier: 1_664_525,
        increment: 1_013_904_223,
        modulus: 1 << 32,
    };

    /// Park and Miller's multiplicative "minimal standard" generator.
    pub const MINIMAL_STANDARD: LcgParameters = LcgParameters {
        multiplier: 16_807,
        increment: 0,
        modulus: 2_147_483_647,
    };

    pub fn new(multiplier: u64, increment: u64, modulus: u64) -> Result<Self, SimulationError> {
        let parameters = Self {
            multiplier,
            increment,
            modulus,
        };
        parameters.validate()?;
        Ok(parameters)
    }

    /// Checks `m >= 2`, `0 < a < m` and `c < m`.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.modulus < 2 {
            return Err(SimulationError::InvalidConfiguration(format!(
                "LCG modulus must be at least 2, found {}",
                self.modulus
            )));
        }
        if self.multiplier == 0 || self.multiplier >= self.modulus {
            return Err(SimulationError::InvalidConfiguration(format!(
                "LCG multiplier must lie in (0, {}), found {}",
                self.modulus, self.multiplier
            )));
        }
        if self.increment >= self.modulus {
            return Err(SimulationError::InvalidConfiguration(format!(
                "LCG increment must lie in [0, {}), found {}",
                self.modulus, self.increment
            )));
        }
        Ok(())
    }

    pub fn multiplier(&self) -> u64 {
        self.multiplier
    }

    pub fn increment(&self) -> u64 {
        self.increment
    }

    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    pub fn is_multiplicative(&self) -> bool {
        self.increment == 0
    }

    /// The Hull-Dobell theorem: a mixed generator has period `m` exactly
    /// when `c` and `m` are coprime, `a - 1` is divisible by every prime
    /// factor of `m`, and `a - 1` is divisible by 4 whenever `m` is.
    /// Multiplicative generators never reach period `m`, since 0 is a fixed
    /// point.
    pub fn has_full_period(&self) -> bool {
        if self.is_multiplicative() {
            return false;
        }
        let a_minus_one = self.multiplier - 1;
        gcd(self.increment, self.modulus) == 1
            && prime_factors(self.modulus)
                .iter()
                .all(|factor| a_minus_one % factor == 0)
            && (self.modulus % 4 != 0 || a_minus_one % 4 == 0)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLcgParameters {
    multiplier: u64,
    increment: u64,
    modulus: u64,
}

impl TryFrom<RawLcgParameters> for LcgParameters {
    type Error = SimulationError;

    fn try_from(raw: RawLcgParameters) -> Result<Self, Self::Error> {
        Self::new(raw.multiplier, raw.increment, raw.modulus)
    }
}

impl Default for LcgParameters {
    fn default() -> Self {
        Self::ANSI_C
    }
}

/// The linear congruential uniform stream.  The stream is exclusively owned
/// by whoever draws from it; independent replications each own a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawUniformStream")]
pub struct UniformStream {
    parameters: LcgParameters,
    seed: u64,
    state: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUniformStream {
    parameters: LcgParameters,
    seed: u64,
    state: u64,
}

/// A saved stream resumes from its state, which must lie below the modulus.
impl TryFrom<RawUniformStream> for UniformStream {
    type Error = SimulationError;

    fn try_from(raw: RawUniformStream) -> Result<Self, Self::Error> {
        let mut stream = Self::with_parameters(raw.seed, raw.parameters)?;
        if raw.state >= raw.parameters.modulus {
            return Err(SimulationError::InvalidConfiguration(format!(
                "stream state {} is not below modulus {}",
                raw.state, raw.parameters.modulus
            )));
        }
        stream.state = raw.state;
        Ok(stream)
    }
}

impl UniformStream {
    /// A stream over the ANSI C parameters.
    pub fn new(seed: u64) -> Self {
        let parameters = LcgParameters::ANSI_C;
        Self {
            parameters,
            seed,
            state: seed % parameters.modulus,
        }
    }

    pub fn with_parameters(seed: u64, parameters: LcgParameters) -> Result<Self, SimulationError> {
        parameters.validate()?;
        Self::check_seed(seed, &parameters)?;
        Ok(Self {
            parameters,
            seed,
            state: seed % parameters.modulus,
        })
    }

    fn check_seed(seed: u64, parameters: &LcgParameters) -> Result<(), SimulationError> {
        if parameters.is_multiplicative() && seed % parameters.modulus == 0 {
            return Err(SimulationError::InvalidConfiguration(format!(
                "seed {} is congruent to 0 modulo {}, which a multiplicative generator never leaves",
                seed, parameters.modulus
            )));
        }
        Ok(())
    }

    /// Advance the recurrence and return the raw integer state.
    pub fn next_integer(&mut self) -> u64 {
        let LcgParameters {
            multiplier,
            increment,
            modulus,
        } = self.parameters;
        self.state = ((u128::from(multiplier) * u128::from(self.state) + u128::from(increment))
            % u128::from(modulus)) as u64;
        self.state
    }

    /// Return to the original seed; the stream then replays its sequence.
    pub fn reset(&mut self) {
        self.state = self.seed % self.parameters.modulus;
    }

    pub fn reseed(&mut self, seed: u64) -> Result<(), SimulationError> {
        Self::check_seed(seed, &self.parameters)?;
        self.seed = seed;
        self.reset();
        Ok(())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn state(&self) -> u64 {
        self.state
    }

    pub fn parameters(&self) -> &LcgParameters {
        &self.parameters
    }
}

impl Default for UniformStream {
    fn default() -> Self {
        Self::new(42)
    }
}

impl UniformSource for UniformStream {
    fn next_uniform(&mut self) -> f64 {
        self.next_integer() as f64 / self.parameters.modulus as f64
    }
}

/// Von Neumann's middle-square method: square the state and keep its middle
/// `digits` digits.  Short cycles and collapse onto zero are common, which
/// makes it a useful negative control for the validation suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawMiddleSquare")]
pub struct MiddleSquare {
    digits: u32,
    seed: u64,
    state: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMiddleSquare {
    digits: u32,
    seed: u64,
    state: u64,
}

impl TryFrom<RawMiddleSquare> for MiddleSquare {
    type Error = SimulationError;

    fn try_from(raw: RawMiddleSquare) -> Result<Self, Self::Error> {
        let mut generator = Self::new(raw.seed, raw.digits)?;
        if raw.state >= 10u64.pow(raw.digits) {
            return Err(SimulationError::InvalidConfiguration(format!(
                "middle-square state {} has more than {} digits",
                raw.state, raw.digits
            )));
        }
        generator.state = raw.state;
        Ok(generator)
    }
}

impl MiddleSquare {
    pub fn new(seed: u64, digits: u32) -> Result<Self, SimulationError> {
        if digits < 2 || digits > 8 || digits % 2 != 0 {
            return Err(SimulationError::InvalidConfiguration(format!(
                "middle-square digit count must be one of 2, 4, 6 or 8, found {}",
                digits
            )));
        }
        if seed >= 10u64.pow(digits) {
            return Err(SimulationError::InvalidConfiguration(format!(
                "middle-square seed {} has more than {} digits",
                seed, digits
            )));
        }
        Ok(Self {
            digits,
            seed,
            state: seed,
        })
    }

    pub fn next_integer(&mut self) -> u64 {
        let square = self.state * self.state;
        self.state = (square / 10u64.pow(self.digits / 2)) % 10u64.pow(self.digits);
        self.state
    }

    pub fn reset(&mut self) {
        self.state = self.seed;
    }

    pub fn state(&self) -> u64 {
        self.state
    }
}

impl UniformSource for MiddleSquare {
    fn next_uniform(&mut self) -> f64 {
        self.next_integer() as f64 / 10u64.pow(self.digits) as f64
    }
}

fn uniform_to_u32(uniform: f64) -> u32 {
    (uniform * 4_294_967_296.0) as u32
}

fn fill_from_u32<F: FnMut() -> u32>(dest: &mut [u8], mut next_u32: F) {
    for chunk in dest.chunks_mut(4) {
        let bytes = next_u32().to_le_bytes();
        chunk.copy_from_slice(&bytes[..chunk.len()]);
    }
}

/// The stream doubles as a `rand` generator, so that `rand_distr`
/// distributions can be driven by the same deterministic sequence.
impl RngCore for UniformStream {
    fn next_u32(&mut self) -> u32 {
        uniform_to_u32(self.next_uniform())
    }

    fn next_u64(&mut self) -> u64 {
        let high = u64::from(self.next_u32());
        let low = u64::from(self.next_u32());
        (high << 32) | low
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        fill_from_u32(dest, || self.next_u32())
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), RandError> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// Seeds are read as a little-endian `u64` over the ANSI C parameters.
impl SeedableRng for UniformStream {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u64::from_le_bytes(seed))
    }
}

/// Borrows any `UniformSource` as a `rand` generator.
#[derive(Debug)]
pub struct SourceRng<'a, S: UniformSource + ?Sized>(pub &'a mut S);

impl<'a, S: UniformSource + ?Sized> RngCore for SourceRng<'a, S> {
    fn next_u32(&mut self) -> u32 {
        uniform_to_u32(self.0.next_uniform())
    }

    fn next_u64(&mut self) -> u64 {
        let high = u64::from(self.next_u32());
        let low = u64::from(self.next_u32());
        (high << 32) | low
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        fill_from_u32(dest, || self.next_u32())
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), RandError> {
        self.fill_bytes(dest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ansi_c_sequence_matches_recurrence() {
        let mut stream = UniformStream::new(42);
        let expected_first = (1_103_515_245u64 * 42 + 12_345) % (1 << 31);
        assert_eq!(stream.next_integer(), expected_first);
        let expected_second = (1_103_515_245u128 * u128::from(expected_first) + 12_345) % (1 << 31);
        assert_eq!(u128::from(stream.next_integer()), expected_second);
    }

    #[test]
    fn identical_seeds_replay_identical_sequences() {
        let mut first = UniformStream::new(2024);
        let mut second = UniformStream::new(2024);
        let first_draws = first.next_uniforms(5000);
        let second_draws = second.next_uniforms(5000);
        assert_eq!(first_draws, second_draws);
    }

    #[test]
    fn reset_replays_the_original_sequence() {
        let mut stream = UniformStream::new(7);
        let before = stream.next_uniforms(100);
        stream.reset();
        let after = stream.next_uniforms(100);
        assert_eq!(before, after);
        stream.reseed(8).unwrap();
        assert_ne!(stream.next_uniforms(100), before);
    }

    #[test]
    fn draws_stay_in_unit_interval() {
        let mut stream = UniformStream::with_parameters(1, LcgParameters::NUMERICAL_RECIPES).unwrap();
        assert!(stream
            .next_uniforms(10_000)
            .iter()
            .all(|u| (0.0..1.0).contains(u)));
        assert!(stream.state() < LcgParameters::NUMERICAL_RECIPES.modulus());
    }

    #[test]
    fn seed_is_reduced_modulo_m() {
        let stream = UniformStream::new((1 << 31) + 5);
        assert_eq!(stream.state(), 5);
    }

    #[test]
    fn multiplicative_generator_rejects_zero_seed() {
        assert!(UniformStream::with_parameters(0, LcgParameters::MINIMAL_STANDARD).is_err());
        let mut stream = UniformStream::with_parameters(1, LcgParameters::MINIMAL_STANDARD).unwrap();
        assert_eq!(stream.next_integer(), 16_807);
        assert_eq!(stream.next_integer(), 282_475_249);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(LcgParameters::new(5, 1, 1).is_err());
        assert!(LcgParameters::new(0, 1, 16).is_err());
        assert!(LcgParameters::new(16, 1, 16).is_err());
        assert!(LcgParameters::new(5, 16, 16).is_err());
        assert!(LcgParameters::new(5, 3, 16).is_ok());
    }

    #[test]
    fn hull_dobell_full_period() {
        assert!(LcgParameters::ANSI_C.has_full_period());
        assert!(LcgParameters::NUMERICAL_RECIPES.has_full_period());
        assert!(!LcgParameters::MINIMAL_STANDARD.has_full_period());
        // a - 1 = 2 is not divisible by 4 while m = 16 is
        assert!(!LcgParameters::new(3, 1, 16).unwrap().has_full_period());

        let parameters = LcgParameters::new(5, 3, 16).unwrap();
        assert!(parameters.has_full_period());
        let mut stream = UniformStream::with_parameters(0, parameters).unwrap();
        let mut visited: Vec<u64> = (0..16).map(|_| stream.next_integer()).collect();
        visited.sort_unstable();
        assert_eq!(visited, (0..16).collect::<Vec<u64>>());
    }

    #[test]
    fn middle_square_matches_hand_computation() {
        let mut generator = MiddleSquare::new(5735, 4).unwrap();
        // 5735^2 = 32890225
        assert_eq!(generator.next_integer(), 8902);
        // 8902^2 = 79245604
        assert_eq!(generator.next_integer(), 2456);
        generator.reset();
        assert!((generator.next_uniform() - 0.8902).abs() < 1e-12);
        assert!(MiddleSquare::new(5735, 3).is_err());
        assert!(MiddleSquare::new(57350, 4).is_err());
    }

    #[test]
    fn rng_core_is_deterministic() {
        let mut first = UniformStream::new(99);
        let mut second = UniformStream::new(99);
        assert_eq!(first.next_u64(), second.next_u64());
        let mut first_bytes = [0u8; 13];
        let mut second_bytes = [0u8; 13];
        first.fill_bytes(&mut first_bytes);
        SourceRng(&mut second).fill_bytes(&mut second_bytes);
        assert_eq!(first_bytes, second_bytes);
        assert_eq!(UniformStream::from_seed(99u64.to_le_bytes()), UniformStream::new(99));
    }

    #[test]
    fn saved_streams_resume_where_they_stopped() {
        let mut stream = UniformStream::new(42);
        stream.next_uniforms(10);
        let saved = serde_json::to_string(&stream).unwrap();
        let mut restored: UniformStream = serde_json::from_str(&saved).unwrap();
        assert_eq!(restored.next_uniforms(10), stream.next_uniforms(10));

        let mut generator = MiddleSquare::new(5735, 4).unwrap();
        generator.next_integer();
        let saved = serde_json::to_string(&generator).unwrap();
        let restored: MiddleSquare = serde_json::from_str(&saved).unwrap();
        assert_eq!(restored, generator);
    }

    #[test]
    fn invalid_saved_generators_are_rejected() {
        assert!(serde_json::from_str::<LcgParameters>(
            r#"{"multiplier": 5, "increment": 3, "modulus": 0}"#
        )
        .is_err());
        assert!(serde_json::from_str::<UniformStream>(
            r#"{"parameters": {"multiplier": 5, "increment": 3, "modulus": 0}, "seed": 1, "state": 1}"#
        )
        .is_err());
        assert!(serde_json::from_str::<UniformStream>(
            r#"{"parameters": {"multiplier": 5, "increment": 3, "modulus": 16}, "seed": 1, "state": 16}"#
        )
        .is_err());
        assert!(serde_json::from_str::<MiddleSquare>(r#"{"digits": 20, "seed": 1, "state": 1}"#).is_err());
        assert!(serde_json::from_str::<MiddleSquare>(r#"{"digits": 4, "seed": 1, "state": 10000}"#).is_err());
        let parameters: LcgParameters =
            serde_json::from_str(r#"{"multiplier": 5, "increment": 3, "modulus": 16}"#).unwrap();
        assert!(parameters.has_full_period());
    }
}
