use serde::Serialize;
use thiserror::Error;

use crate::{Amount, FlightKey, Identity};

/// Broad class of a ledger failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Access,
    State,
    Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("caller {0} is not the ledger owner")]
    NotOwner(Identity),
    #[error("caller {0} is not authorized to mutate the ledger")]
    NotAuthorized(Identity),
    #[error("ledger operations are suspended")]
    OperationsSuspended,

    #[error("airline {0} is not a funded, registered airline")]
    NotFunded(Identity),
    #[error("{0} is not a registered airline")]
    NotRegisteredAirline(Identity),
    #[error("airline {0} was never registered")]
    UnknownAirline(Identity),
    #[error("{0} is already registered")]
    AlreadyRegistered(Identity),
    #[error("flight {0} status is already finalized")]
    AlreadyFinalized(FlightKey),
    #[error("no open status request for index {index} on flight {flight}")]
    NoMatchingRequest { index: u8, flight: FlightKey },
    #[error("index {index} is not assigned to oracle {operator}")]
    IndexNotAssigned { index: u8, operator: Identity },
    #[error("flight {0} is not registered")]
    FlightNotRegistered(FlightKey),
    #[error("flight {0} is not late due to the airline")]
    FlightNotLate(FlightKey),
    #[error("{insuree} already holds an active policy for flight {flight}")]
    DuplicatePolicy { insuree: Identity, flight: FlightKey },
    #[error("{0} has no credit to withdraw")]
    NothingToWithdraw(Identity),

    #[error("premium {amount} exceeds the insurance cap of {cap}")]
    ExceedsInsuranceCap { amount: Amount, cap: Amount },
    #[error("oracle fee {fee} is below the required {required}")]
    InsufficientFee { fee: Amount, required: Amount },
    #[error("airline {airline} holds {available}, cannot cover {required}")]
    InsufficientAirlineFunds {
        airline: Identity,
        required: Amount,
        available: Amount,
    },
    #[error("amount must be greater than zero")]
    InvalidAmount,
    #[error("status code {0} cannot be reported")]
    InvalidStatusCode(u8),
    #[error("amount arithmetic overflowed")]
    AmountOverflow,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotOwner(_) | Self::NotAuthorized(_) | Self::OperationsSuspended => {
                ErrorKind::Access
            }
            Self::NotFunded(_)
            | Self::NotRegisteredAirline(_)
            | Self::UnknownAirline(_)
            | Self::AlreadyRegistered(_)
            | Self::AlreadyFinalized(_)
            | Self::NoMatchingRequest { .. }
            | Self::IndexNotAssigned { .. }
            | Self::FlightNotRegistered(_)
            | Self::FlightNotLate(_)
            | Self::DuplicatePolicy { .. }
            | Self::NothingToWithdraw(_) => ErrorKind::State,
            Self::ExceedsInsuranceCap { .. }
            | Self::InsufficientFee { .. }
            | Self::InsufficientAirlineFunds { .. }
            | Self::InvalidAmount
            | Self::InvalidStatusCode(_)
            | Self::AmountOverflow => ErrorKind::Value,
        }
    }
}
