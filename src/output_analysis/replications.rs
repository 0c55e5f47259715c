//! Independent replications of a queueing configuration, run in parallel.
//!
//! Each replication owns its own `QueueingSystem` and uniform stream, so
//! replications share nothing until their results are collected.  The
//! per-replication averages of L, Lq, W and Wq form independent samples,
//! summarized with Student t confidence intervals.

use std::collections::HashSet;

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::IndependentSample;
use crate::models::{QueueConfig, QueueingSystem, SimulationResults};
use crate::utils::errors::SimulationError;

/// `count` distinct replication seeds, derived from the master seed.  Seeds
/// are reduced modulo the generator modulus; values congruent to zero and
/// repeats are skipped, so every replication draws a different sequence.
/// A generator offers `m - 1` such seeds, and asking for more fails.
pub fn replication_seeds(config: &QueueConfig, count: usize) -> Result<Vec<u64>, SimulationError> {
    config.generator.validate()?;
    let modulus = config.generator.modulus();
    let available = modulus - 1;
    if count as u64 > available {
        return Err(SimulationError::InvalidConfiguration(format!(
            "{} replications need distinct seeds, but modulus {} offers only {}",
            count, modulus, available
        )));
    }
    let mut source = Pcg64Mcg::seed_from_u64(config.seed);
    let mut seen = HashSet::with_capacity(count);
    let mut seeds = Vec::with_capacity(count);
    while seeds.len() < count {
        let seed = source.next_u64() % modulus;
        if seed != 0 && seen.insert(seed) {
            seeds.push(seed);
        }
    }
    Ok(seeds)
}

/// The results of a batch of replications, in seed order, with the
/// across-replication samples of each performance measure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicationSummary {
    pub seeds: Vec<u64>,
    pub results: Vec<SimulationResults>,
    pub l: IndependentSample<f64>,
    pub lq: IndependentSample<f64>,
    pub w: IndependentSample<f64>,
    pub wq: IndependentSample<f64>,
}

impl ReplicationSummary {
    fn collect(seeds: Vec<u64>, results: Vec<SimulationResults>) -> Result<Self, SimulationError> {
        let measure = |select: fn(&SimulationResults) -> f64| {
            IndependentSample::post(results.iter().map(select).collect())
        };
        Ok(Self {
            l: measure(|result| result.simulated.l)?,
            lq: measure(|result| result.simulated.lq)?,
            w: measure(|result| result.simulated.w)?,
            wq: measure(|result| result.simulated.wq)?,
            seeds,
            results,
        })
    }

    pub fn replication_count(&self) -> usize {
        self.results.len()
    }
}

/// Run `count` replications of `config`, each under its own derived seed,
/// on a rayon pool of `threads` workers (rayon's default when `None`).
/// The first failing replication aborts the batch with its error.
pub fn run_replications(
    config: &QueueConfig,
    count: usize,
    threads: Option<usize>,
) -> Result<ReplicationSummary, SimulationError> {
    config.validate()?;
    let rho = config.utilization();
    if rho >= 1.0 {
        return Err(SimulationError::UnstableSystem { rho });
    }
    if count < 1 {
        return Err(SimulationError::InsufficientSample {
            required: 1,
            actual: 0,
        });
    }
    let seeds = replication_seeds(config, count)?;
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = threads {
        builder = builder.num_threads(threads);
    }
    let pool = builder.build()?;
    info!(
        replications = count,
        threads = pool.current_num_threads(),
        servers = config.server_count,
        rho,
        "starting replications"
    );
    let results = pool.install(|| {
        seeds
            .par_iter()
            .map(|seed| -> Result<SimulationResults, SimulationError> {
                let result = QueueingSystem::new(config.with_seed(*seed))?.run()?;
                debug!(seed, served = result.customers_served, "replication finished");
                Ok(result)
            })
            .collect::<Result<Vec<SimulationResults>, SimulationError>>()
    })?;
    let summary = ReplicationSummary::collect(seeds, results)?;
    info!(
        replications = count,
        mean_wq = summary.wq.point_estimate_mean(),
        theoretical_wq = summary
            .results
            .first()
            .map_or(f64::NAN, |result| result.theoretical.wq),
        "replications finished"
    );
    Ok(summary)
}
