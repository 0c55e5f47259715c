//! The utilies module provides general capabilities, that may span the
//! input modeling, models, validation, output analysis, and simulator
//! modules.  The utilities are centered around error reporting, logging,
//! and common arithmetic.

pub mod errors;
pub mod logging;

/// Integer square root calculation, using the Babylonian square-root
/// algorithm.
pub fn usize_sqrt(n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let mut x = n;
    let mut y = 1;
    while x > y {
        x = (x + y) / 2;
        y = n / x;
    }
    x
}

/// Greatest common divisor, by the Euclidean algorithm.
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let remainder = a % b;
        a = b;
        b = remainder;
    }
    a
}

/// The distinct prime factors of `n`, in ascending order, by trial division.
pub fn prime_factors(mut n: u64) -> Vec<u64> {
    let mut factors = Vec::new();
    let mut divisor = 2;
    while divisor <= n / divisor {
        if n % divisor == 0 {
            factors.push(divisor);
            while n % divisor == 0 {
                n /= divisor;
            }
        }
        divisor += 1;
    }
    if n > 1 {
        factors.push(n);
    }
    factors
}
