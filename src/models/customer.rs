use serde::{Deserialize, Serialize};

use crate::utils::errors::SimulationError;

/// The timing record of one customer.  Service start and departure remain
/// unset until the corresponding events occur, and
/// `arrival_time <= service_start_time <= departure_time` holds throughout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    id: u64,
    arrival_time: f64,
    service_start_time: Option<f64>,
    departure_time: Option<f64>,
}

impl Customer {
    pub fn new(id: u64, arrival_time: f64) -> Self {
        Self {
            id,
            arrival_time,
            service_start_time: None,
            departure_time: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn arrival_time(&self) -> f64 {
        self.arrival_time
    }

    pub fn service_start_time(&self) -> Option<f64> {
        self.service_start_time
    }

    pub fn departure_time(&self) -> Option<f64> {
        self.departure_time
    }

    pub fn begin_service(&mut self, time: f64) -> Result<(), SimulationError> {
        if self.service_start_time.is_some() || time < self.arrival_time {
            return Err(SimulationError::InvalidModelState(format!(
                "customer {} cannot begin service at {}",
                self.id, time
            )));
        }
        self.service_start_time = Some(time);
        Ok(())
    }

    pub fn depart(&mut self, time: f64) -> Result<(), SimulationError> {
        match (self.service_start_time, self.departure_time) {
            (Some(start), None) if time >= start => {
                self.departure_time = Some(time);
                Ok(())
            }
            _ => Err(SimulationError::InvalidModelState(format!(
                "customer {} cannot depart at {}",
                self.id, time
            ))),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.departure_time.is_some()
    }

    /// Time spent in the waiting line
    pub fn wait_time(&self) -> Option<f64> {
        self.service_start_time
            .map(|start| start - self.arrival_time)
    }

    /// Time spent in the system, waiting and in service
    pub fn system_time(&self) -> Option<f64> {
        self.departure_time
            .map(|departure| departure - self.arrival_time)
    }

    pub fn service_duration(&self) -> Option<f64> {
        self.service_start_time
            .zip(self.departure_time)
            .map(|(start, departure)| departure - start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_times() {
        let mut customer = Customer::new(7, 1.5);
        assert_eq!(customer.wait_time(), None);
        customer.begin_service(2.0).unwrap();
        assert_eq!(customer.wait_time(), Some(0.5));
        assert_eq!(customer.system_time(), None);
        customer.depart(4.5).unwrap();
        assert_eq!(customer.system_time(), Some(3.0));
        assert_eq!(customer.service_duration(), Some(2.5));
        assert!(customer.is_complete());
    }

    #[test]
    fn out_of_order_transitions_fail() {
        let mut customer = Customer::new(1, 3.0);
        assert!(customer.depart(4.0).is_err());
        assert!(customer.begin_service(2.0).is_err());
        customer.begin_service(3.0).unwrap();
        assert!(customer.begin_service(3.5).is_err());
        assert!(customer.depart(2.5).is_err());
        customer.depart(3.0).unwrap();
        assert!(customer.depart(5.0).is_err());
    }
}
