//! Closed-form steady-state results for M/M/1 and M/M/c queues.  These are
//! pure functions of the rates and server count, computed independently of
//! any simulated data.

use serde::{Deserialize, Serialize};

use crate::utils::errors::SimulationError;

/// Steady-state measures of an M/M/c queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TheoreticalMetrics {
    pub servers: usize,
    /// Utilization, `lambda / (c mu)`
    pub rho: f64,
    /// Probability of an empty system
    pub p0: f64,
    pub l: f64,
    pub lq: f64,
    pub w: f64,
    pub wq: f64,
    /// Erlang C, the probability that an arrival waits
    pub probability_of_waiting: f64,
}

fn check_rates(arrival_rate: f64, service_rate: f64) -> Result<(), SimulationError> {
    if !(arrival_rate.is_finite() && arrival_rate > 0.0)
        || !(service_rate.is_finite() && service_rate > 0.0)
    {
        return Err(SimulationError::InvalidConfiguration(format!(
            "rates must be positive and finite, found lambda = {} and mu = {}",
            arrival_rate, service_rate
        )));
    }
    Ok(())
}

impl TheoreticalMetrics {
    /// The single-server queue, in its simpler closed form.
    pub fn mm1(arrival_rate: f64, service_rate: f64) -> Result<Self, SimulationError> {
        check_rates(arrival_rate, service_rate)?;
        let rho = arrival_rate / service_rate;
        if rho >= 1.0 {
            return Err(SimulationError::UnstableSystem { rho });
        }
        Ok(Self {
            servers: 1,
            rho,
            p0: 1.0 - rho,
            l: rho / (1.0 - rho),
            lq: rho.powi(2) / (1.0 - rho),
            w: 1.0 / (service_rate - arrival_rate),
            wq: rho / (service_rate - arrival_rate),
            probability_of_waiting: rho,
        })
    }

    /// The multi-server queue, with offered load `a = lambda / mu`:
    ///
    /// `P0 = 1 / (sum_{n<c} a^n / n! + a^c / (c! (1 - rho)))`
    ///
    /// `Lq = P0 a^c rho / (c! (1 - rho)^2)`, `L = Lq + a`, `Wq = Lq / lambda`,
    /// `W = Wq + 1 / mu`
    pub fn mmc(
        arrival_rate: f64,
        service_rate: f64,
        servers: usize,
    ) -> Result<Self, SimulationError> {
        check_rates(arrival_rate, service_rate)?;
        if servers < 1 {
            return Err(SimulationError::InvalidConfiguration(String::from(
                "at least one server is required",
            )));
        }
        let offered_load = arrival_rate / service_rate;
        let rho = offered_load / servers as f64;
        if rho >= 1.0 {
            return Err(SimulationError::UnstableSystem { rho });
        }
        // a^n / n!, built up term by term
        let mut term = 1.0;
        let mut partial_sum = 0.0;
        for n in 0..servers {
            partial_sum += term;
            term *= offered_load / (n + 1) as f64;
        }
        let saturated = term / (1.0 - rho);
        let p0 = 1.0 / (partial_sum + saturated);
        let probability_of_waiting = saturated * p0;
        let lq = probability_of_waiting * rho / (1.0 - rho);
        let wq = lq / arrival_rate;
        Ok(Self {
            servers,
            rho,
            p0,
            l: lq + offered_load,
            lq,
            w: wq + 1.0 / service_rate,
            wq,
            probability_of_waiting,
        })
    }

    /// M/M/1 for a single server, M/M/c otherwise.
    pub fn for_servers(
        arrival_rate: f64,
        service_rate: f64,
        servers: usize,
    ) -> Result<Self, SimulationError> {
        if servers == 1 {
            Self::mm1(arrival_rate, service_rate)
        } else {
            Self::mmc(arrival_rate, service_rate, servers)
        }
    }
}

/// The smallest stable server count, up to `max_servers`, whose expected
/// wait in queue is at most `target_wq`.
pub fn minimum_servers(
    arrival_rate: f64,
    service_rate: f64,
    target_wq: f64,
    max_servers: usize,
) -> Result<Option<TheoreticalMetrics>, SimulationError> {
    check_rates(arrival_rate, service_rate)?;
    if !(target_wq >= 0.0) {
        return Err(SimulationError::InvalidConfiguration(format!(
            "target wait must be non-negative, found {}",
            target_wq
        )));
    }
    let fewest_stable = (arrival_rate / service_rate).floor() as usize + 1;
    for servers in fewest_stable..=max_servers {
        let metrics = TheoreticalMetrics::for_servers(arrival_rate, service_rate, servers)?;
        if metrics.wq <= target_wq {
            return Ok(Some(metrics));
        }
    }
    Ok(None)
}
