use std::collections::HashMap;

use serde::Serialize;
use surety_core::{Flight, FlightKey, FlightStatus, Identity, LedgerError};
use tracing::{debug, info};

use crate::airlines::AirlineRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlightRegistration {
    Registered,
    AlreadyRegistered,
}

#[derive(Debug, Clone, Default)]
pub struct FlightRegistry {
    flights: HashMap<FlightKey, Flight>,
}

impl FlightRegistry {
    /// Registers a flight under the requesting airline. Re-registering the same
    /// key is accepted and leaves the existing flight untouched.
    pub fn register(
        &mut self,
        airlines: &AirlineRegistry,
        requester: &Identity,
        flight: &str,
        timestamp: u64,
        origin: &str,
        destination: &str,
    ) -> Result<FlightRegistration, LedgerError> {
        if !airlines.is_airline(requester) {
            return Err(LedgerError::NotRegisteredAirline(requester.clone()));
        }

        let key = FlightKey::new(requester.clone(), flight, timestamp);
        if self.flights.contains_key(&key) {
            debug!(flight = %key, "flight already registered");
            return Ok(FlightRegistration::AlreadyRegistered);
        }

        info!(flight = %key, origin, destination, "flight registered");
        self.flights.insert(
            key.clone(),
            Flight {
                key,
                origin: origin.to_string(),
                destination: destination.to_string(),
                status: FlightStatus::Unknown,
                is_finalized: false,
            },
        );
        Ok(FlightRegistration::Registered)
    }

    pub fn is_flight(&self, key: &FlightKey) -> bool {
        self.flights.contains_key(key)
    }

    pub fn status(&self, key: &FlightKey) -> FlightStatus {
        self.flights
            .get(key)
            .map(|flight| flight.status)
            .unwrap_or_default()
    }

    pub fn is_finalized(&self, key: &FlightKey) -> bool {
        self.flights.get(key).is_some_and(|flight| flight.is_finalized)
    }

    pub fn get(&self, key: &FlightKey) -> Option<&Flight> {
        self.flights.get(key)
    }

    pub fn require(&self, key: &FlightKey) -> Result<&Flight, LedgerError> {
        self.flights
            .get(key)
            .ok_or_else(|| LedgerError::FlightNotRegistered(key.clone()))
    }

    /// Writes the quorum's verdict. Only the oracle quorum calls this.
    pub(crate) fn finalize(&mut self, key: &FlightKey, status: FlightStatus) -> Result<(), LedgerError> {
        let flight = self
            .flights
            .get_mut(key)
            .ok_or_else(|| LedgerError::FlightNotRegistered(key.clone()))?;
        if flight.is_finalized {
            return Err(LedgerError::AlreadyFinalized(key.clone()));
        }

        flight.status = status;
        flight.is_finalized = true;
        info!(flight = %key, status = %status, "flight status finalized");
        Ok(())
    }
}
