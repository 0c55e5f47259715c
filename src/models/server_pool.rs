use std::collections::VecDeque;

use super::customer::Customer;
use crate::utils::errors::SimulationError;

/// Identical servers sharing one FIFO waiting line.  A customer only waits
/// when every server is busy.
#[derive(Debug, Clone)]
pub struct ServerPool {
    capacity: usize,
    busy_count: usize,
    waiting_line: VecDeque<Customer>,
}

impl ServerPool {
    pub fn new(capacity: usize) -> Result<Self, SimulationError> {
        if capacity < 1 {
            return Err(SimulationError::InvalidConfiguration(String::from(
                "a server pool requires at least one server",
            )));
        }
        Ok(Self {
            capacity,
            busy_count: 0,
            waiting_line: VecDeque::new(),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn busy_count(&self) -> usize {
        self.busy_count
    }

    pub fn has_idle_server(&self) -> bool {
        self.busy_count < self.capacity
    }

    /// Occupy an idle server.
    pub fn seize(&mut self) -> Result<(), SimulationError> {
        if !self.has_idle_server() {
            return Err(SimulationError::InvalidModelState(format!(
                "all {} servers are already busy",
                self.capacity
            )));
        }
        self.busy_count += 1;
        Ok(())
    }

    /// Free a busy server.
    pub fn release(&mut self) -> Result<(), SimulationError> {
        if self.busy_count == 0 {
            return Err(SimulationError::InvalidModelState(String::from(
                "no busy server to release",
            )));
        }
        self.busy_count -= 1;
        Ok(())
    }

    /// Append a customer to the back of the waiting line.  Joining the line
    /// while a server is idle is refused.
    pub fn enqueue(&mut self, customer: Customer) -> Result<(), SimulationError> {
        if self.has_idle_server() {
            return Err(SimulationError::InvalidModelState(format!(
                "customer {} cannot wait while a server is idle",
                customer.id()
            )));
        }
        self.waiting_line.push_back(customer);
        Ok(())
    }

    /// Take the customer at the front of the waiting line.
    pub fn dequeue(&mut self) -> Option<Customer> {
        self.waiting_line.pop_front()
    }

    pub fn queue_len(&self) -> usize {
        self.waiting_line.len()
    }

    /// Customers waiting or in service
    pub fn in_system(&self) -> usize {
        self.busy_count + self.waiting_line.len()
    }

    pub fn waiting_customers(&self) -> impl Iterator<Item = &Customer> {
        self.waiting_line.iter()
    }

    pub fn check_invariants(&self) -> Result<(), SimulationError> {
        if self.busy_count > self.capacity {
            return Err(SimulationError::InvalidModelState(format!(
                "{} busy servers exceed the capacity of {}",
                self.busy_count, self.capacity
            )));
        }
        if !self.waiting_line.is_empty() && self.has_idle_server() {
            return Err(SimulationError::InvalidModelState(format!(
                "{} customers wait while {} of {} servers are busy",
                self.waiting_line.len(),
                self.busy_count,
                self.capacity
            )));
        }
        Ok(())
    }
}
