use serde::{Deserialize, Serialize};

use crate::{Amount, FlightStatus, Identity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStream {
    Airlines,
    Flights,
    Insurance,
    Oracles,
}

impl EventStream {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Airlines => "airlines",
            Self::Flights => "flights",
            Self::Insurance => "insurance",
            Self::Oracles => "oracles",
        }
    }
}

/// Record emitted by a successful mutating operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum LedgerEvent {
    AirlineRegistered {
        candidate: Identity,
        name: String,
    },
    AirlineFunded {
        airline: Identity,
        amount: Amount,
    },
    FlightRegistered {
        airline: Identity,
        flight: String,
        timestamp: u64,
        origin: String,
        destination: String,
    },
    InsuranceBought {
        insuree: Identity,
        airline: Identity,
        flight: String,
        timestamp: u64,
        paid: Amount,
    },
    InsuranceCredited {
        insuree: Identity,
        amount: Amount,
    },
    PayoutWithdrawn {
        insuree: Identity,
        amount: Amount,
    },
    OracleRegistered {
        operator: Identity,
        indices: [u8; 3],
    },
    OracleRequest {
        index: u8,
        airline: Identity,
        flight: String,
        timestamp: u64,
    },
    OracleReport {
        index: u8,
        airline: Identity,
        flight: String,
        timestamp: u64,
        status: FlightStatus,
    },
    FlightStatusFinalized {
        airline: Identity,
        flight: String,
        timestamp: u64,
        status: FlightStatus,
    },
}

impl LedgerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AirlineRegistered { .. } => "AirlineRegistered",
            Self::AirlineFunded { .. } => "AirlineFunded",
            Self::FlightRegistered { .. } => "FlightRegistered",
            Self::InsuranceBought { .. } => "InsuranceBought",
            Self::InsuranceCredited { .. } => "InsuranceCredited",
            Self::PayoutWithdrawn { .. } => "PayoutWithdrawn",
            Self::OracleRegistered { .. } => "OracleRegistered",
            Self::OracleRequest { .. } => "OracleRequest",
            Self::OracleReport { .. } => "OracleReport",
            Self::FlightStatusFinalized { .. } => "FlightStatusFinalized",
        }
    }

    pub fn stream(&self) -> EventStream {
        match self {
            Self::AirlineRegistered { .. } | Self::AirlineFunded { .. } => EventStream::Airlines,
            Self::FlightRegistered { .. } | Self::FlightStatusFinalized { .. } => {
                EventStream::Flights
            }
            Self::InsuranceBought { .. }
            | Self::InsuranceCredited { .. }
            | Self::PayoutWithdrawn { .. } => EventStream::Insurance,
            Self::OracleRegistered { .. } | Self::OracleRequest { .. } | Self::OracleReport { .. } => {
                EventStream::Oracles
            }
        }
    }
}
