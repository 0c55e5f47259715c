//! The models module provides the queueing resource model: customers, a
//! pool of identical servers with a FIFO waiting line, and the M/M/1 and
//! M/M/c queueing system that drives them through the event queue.
//! Closed-form steady-state results are available in `theoretical`, for
//! comparison against simulated results.

pub mod config;
pub mod customer;
pub mod queueing_system;
pub mod server_pool;
pub mod theoretical;

pub use self::config::QueueConfig;
pub use self::customer::Customer;
pub use self::queueing_system::{PerformanceMetrics, QueueEvent, QueueingSystem, SimulationResults};
pub use self::server_pool::ServerPool;
pub use self::theoretical::{minimum_servers, TheoreticalMetrics};
