//! Input modeling is the generation of the random inputs of a simulation.
//! Uniform streams provide deterministic, replayable sequences on [0, 1),
//! and the variate samplers and random variable enums transform those
//! sequences into arrivals, service times, and other stochastic inputs.

pub mod random_variable;
pub mod uniform_stream;
pub mod variates;

pub use random_variable::{BooleanRandomVariable, ContinuousRandomVariable, DiscreteRandomVariable};
pub use uniform_stream::{LcgParameters, MiddleSquare, SourceRng, UniformSource, UniformStream};
