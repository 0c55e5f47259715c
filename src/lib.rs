//! # Overview
//! "qsim" provides a small discrete event simulation kernel for queueing
//! studies, with the statistical tooling needed to trust its results.
//!
//! This repository contains:
//!
//! * Variate engine, a seedable linear congruential generator (and a
//! middle-square generator for contrast) with inverse-transform samplers
//! for common distributions.
//! * Event clock and queue, for ordering and dispatching time-stamped
//! events.
//! * Queueing models, for M/M/1 and M/M/c systems with closed-form
//! steady-state results to compare against.
//! * Validation suite, with chi-square, Kolmogorov-Smirnov, runs, poker and
//! autocorrelation tests of uniform samples.
//! * Output analysis framework, for confidence intervals over parallel
//! replications and batch means over single long runs.
//! * Monte Carlo estimation of pi and of definite integrals.
//!
//! Every run owns its uniform stream, so identical seeds replay identical
//! runs and independent replications may run on separate threads.
pub mod input_modeling;
pub mod models;
pub mod monte_carlo;
pub mod output_analysis;
pub mod simulator;
pub mod utils;
pub mod validation;
