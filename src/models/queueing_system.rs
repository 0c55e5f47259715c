use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::config::QueueConfig;
use super::customer::Customer;
use super::server_pool::ServerPool;
use super::theoretical::TheoreticalMetrics;
use crate::input_modeling::random_variable::ContinuousRandomVariable;
use crate::input_modeling::uniform_stream::UniformStream;
use crate::simulator::{Event, EventQueue};
use crate::utils::errors::SimulationError;

/// The event kinds of a queueing run.  A service completion carries the
/// customer leaving service.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueEvent {
    Arrival,
    ServiceCompletion(Customer),
}

/// L, Lq, W and Wq, simulated or as relative errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub l: f64,
    pub lq: f64,
    pub w: f64,
    pub wq: f64,
}

/// The outcome of a queueing run.  Records hold the customers that
/// departed by the horizon, in arrival order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResults {
    pub customers_arrived: u64,
    pub customers_served: usize,
    /// Customers still waiting or in service at the horizon
    pub customers_in_system: usize,
    pub records: Vec<Customer>,
    pub simulated: PerformanceMetrics,
    pub theoretical: TheoreticalMetrics,
    /// `lambda / (c mu)`
    pub utilization: f64,
    /// Time-averaged fraction of busy servers
    pub observed_utilization: f64,
}

impl SimulationResults {
    /// `|simulated - theoretical| / theoretical` for each measure.
    pub fn relative_errors(&self) -> PerformanceMetrics {
        let relative = |simulated: f64, theoretical: f64| {
            (simulated - theoretical).abs() / theoretical.abs()
        };
        PerformanceMetrics {
            l: relative(self.simulated.l, self.theoretical.l),
            lq: relative(self.simulated.lq, self.theoretical.lq),
            w: relative(self.simulated.w, self.theoretical.w),
            wq: relative(self.simulated.wq, self.theoretical.wq),
        }
    }

    /// The wait in queue of each served customer, in arrival order.
    pub fn wait_times(&self) -> Vec<f64> {
        self.records
            .iter()
            .filter_map(|customer| customer.wait_time())
            .collect()
    }
}

/// Areas under the number-in-system, number-in-queue, and busy-server
/// sample paths.
#[derive(Debug, Clone, Default)]
struct TimeWeightedAreas {
    last_update: f64,
    in_system: f64,
    in_queue: f64,
    busy_servers: f64,
}

impl TimeWeightedAreas {
    fn advance(&mut self, time: f64, pool: &ServerPool) {
        let elapsed = time - self.last_update;
        self.in_system += elapsed * pool.in_system() as f64;
        self.in_queue += elapsed * pool.queue_len() as f64;
        self.busy_servers += elapsed * pool.busy_count() as f64;
        self.last_update = time;
    }
}

/// An M/M/c queue: Poisson arrivals, exponential service, `c` identical
/// servers and one FIFO waiting line.  With a single server this is the
/// M/M/1 queue.
#[derive(Debug)]
pub struct QueueingSystem {
    config: QueueConfig,
    theoretical: TheoreticalMetrics,
    stream: UniformStream,
    interarrival_time: ContinuousRandomVariable,
    service_time: ContinuousRandomVariable,
    pool: ServerPool,
    next_customer_id: u64,
    departed: Vec<Customer>,
    areas: TimeWeightedAreas,
}

impl QueueingSystem {
    /// Validates the configuration and refuses unstable systems, whose
    /// waiting line grows without bound.
    pub fn new(config: QueueConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let rho = config.utilization();
        if rho >= 1.0 {
            return Err(SimulationError::UnstableSystem { rho });
        }
        let theoretical = TheoreticalMetrics::for_servers(
            config.arrival_rate,
            config.service_rate,
            config.server_count,
        )?;
        Ok(Self {
            theoretical,
            stream: config.stream()?,
            interarrival_time: ContinuousRandomVariable::Exp {
                lambda: config.arrival_rate,
            },
            service_time: ContinuousRandomVariable::Exp {
                lambda: config.service_rate,
            },
            pool: ServerPool::new(config.server_count)?,
            next_customer_id: 0,
            departed: Vec::new(),
            areas: TimeWeightedAreas::default(),
            config,
        })
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn theoretical(&self) -> &TheoreticalMetrics {
        &self.theoretical
    }

    /// Simulate over `[0, horizon]`.  Service completing exactly at the
    /// horizon counts; customers still present at the horizon are excluded
    /// from W and Wq but contribute to L and Lq up to the horizon.
    pub fn run(mut self) -> Result<SimulationResults, SimulationError> {
        let horizon = self.config.horizon;
        debug!(
            arrival_rate = self.config.arrival_rate,
            service_rate = self.config.service_rate,
            servers = self.config.server_count,
            horizon,
            seed = self.config.seed,
            "queueing run started"
        );
        let mut events = EventQueue::new();
        let first_arrival = self.interarrival_time.random_variate(&mut self.stream)?;
        events.schedule(first_arrival, QueueEvent::Arrival)?;
        events.run(horizon, |events, event| self.dispatch(events, event))?;
        self.areas.advance(horizon, &self.pool);
        let results = self.into_results();
        debug!(
            served = results.customers_served,
            in_system = results.customers_in_system,
            l = results.simulated.l,
            wq = results.simulated.wq,
            "queueing run finished"
        );
        Ok(results)
    }

    fn dispatch(
        &mut self,
        events: &mut EventQueue<QueueEvent>,
        event: Event<QueueEvent>,
    ) -> Result<(), SimulationError> {
        self.areas.advance(event.time(), &self.pool);
        match event.into_kind() {
            QueueEvent::Arrival => self.handle_arrival(events)?,
            QueueEvent::ServiceCompletion(customer) => self.handle_completion(events, customer)?,
        }
        self.pool.check_invariants()
    }

    fn handle_arrival(&mut self, events: &mut EventQueue<QueueEvent>) -> Result<(), SimulationError> {
        let now = events.now();
        let customer = Customer::new(self.next_customer_id, now);
        self.next_customer_id += 1;
        // arrivals continue regardless of server state
        let interarrival = self.interarrival_time.random_variate(&mut self.stream)?;
        events.schedule(now + interarrival, QueueEvent::Arrival)?;
        if self.pool.has_idle_server() {
            self.pool.seize()?;
            self.start_service(events, customer)
        } else {
            self.pool.enqueue(customer)
        }
    }

    fn handle_completion(
        &mut self,
        events: &mut EventQueue<QueueEvent>,
        mut customer: Customer,
    ) -> Result<(), SimulationError> {
        customer.depart(events.now())?;
        self.departed.push(customer);
        self.pool.release()?;
        if let Some(next) = self.pool.dequeue() {
            self.pool.seize()?;
            self.start_service(events, next)?;
        }
        Ok(())
    }

    fn start_service(
        &mut self,
        events: &mut EventQueue<QueueEvent>,
        mut customer: Customer,
    ) -> Result<(), SimulationError> {
        let now = events.now();
        customer.begin_service(now)?;
        let service = self.service_time.random_variate(&mut self.stream)?;
        events.schedule(now + service, QueueEvent::ServiceCompletion(customer))?;
        Ok(())
    }

    fn into_results(mut self) -> SimulationResults {
        let horizon = self.config.horizon;
        self.departed.sort_by_key(|customer| customer.id());
        let served = self.departed.len();
        let (w, wq) = if served == 0 {
            warn!(
                horizon,
                "no customer departed before the horizon; W and Wq are undefined"
            );
            (f64::NAN, f64::NAN)
        } else {
            let total_system: f64 = self.departed.iter().filter_map(Customer::system_time).sum();
            let total_wait: f64 = self.departed.iter().filter_map(Customer::wait_time).sum();
            (total_system / served as f64, total_wait / served as f64)
        };
        SimulationResults {
            customers_arrived: self.next_customer_id,
            customers_served: served,
            customers_in_system: self.pool.in_system(),
            records: self.departed,
            simulated: PerformanceMetrics {
                l: self.areas.in_system / horizon,
                lq: self.areas.in_queue / horizon,
                w,
                wq,
            },
            utilization: self.config.utilization(),
            observed_utilization: self.areas.busy_servers
                / (horizon * self.config.server_count as f64),
            theoretical: self.theoretical,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unstable_configuration_is_refused() {
        let config = QueueConfig::new(2.0, 1.0, 1, 100.0, 42).unwrap();
        assert!(matches!(
            QueueingSystem::new(config),
            Err(SimulationError::UnstableSystem { .. })
        ));
        let config = QueueConfig::new(3.0, 1.0, 3, 100.0, 42).unwrap();
        assert!(matches!(
            QueueingSystem::new(config),
            Err(SimulationError::UnstableSystem { .. })
        ));
    }

    #[test]
    fn records_respect_timing_order() {
        let config = QueueConfig::new(2.4, 1.0, 3, 500.0, 11).unwrap();
        let results = QueueingSystem::new(config).unwrap().run().unwrap();
        assert!(results.customers_served > 0);
        assert_eq!(results.records.len(), results.customers_served);
        assert_eq!(
            results.customers_arrived,
            (results.customers_served + results.customers_in_system) as u64
        );
        assert!(results.records.iter().all(|customer| {
            let start = customer.service_start_time().unwrap();
            let departure = customer.departure_time().unwrap();
            customer.arrival_time() <= start && start <= departure && departure <= 500.0
        }));
        assert!(results
            .records
            .windows(2)
            .all(|pair| pair[0].id() < pair[1].id()));
    }

    #[test]
    fn single_server_serves_in_arrival_order() {
        let config = QueueConfig::new(3.0, 4.0, 1, 200.0, 5).unwrap();
        let results = QueueingSystem::new(config).unwrap().run().unwrap();
        // FIFO with one server: service starts follow arrival order and never overlap
        assert!(results.records.windows(2).all(|pair| {
            pair[0].departure_time().unwrap() <= pair[1].service_start_time().unwrap()
        }));
    }

    #[test]
    fn tiny_horizon_yields_undefined_waits() {
        // the first arrival lands after the horizon
        let config = QueueConfig::new(0.001, 1.0, 1, 1e-9, 42).unwrap();
        let results = QueueingSystem::new(config).unwrap().run().unwrap();
        assert_eq!(results.customers_served, 0);
        assert!(results.simulated.w.is_nan());
        assert!(results.simulated.wq.is_nan());
        assert_eq!(results.simulated.l, 0.0);
    }

    #[test]
    fn observed_utilization_tracks_rho() {
        let config = QueueConfig::new(2.4, 1.0, 3, 5000.0, 42).unwrap();
        let results = QueueingSystem::new(config).unwrap().run().unwrap();
        assert!((results.observed_utilization - 0.8).abs() < 0.05);
        assert!((results.utilization - 0.8).abs() < 1e-12);
    }
}
