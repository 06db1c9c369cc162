pub mod amount;
pub mod errors;
pub mod events;
pub mod identity;
pub mod models;
pub mod storage;

pub use amount::{Amount, ELEMENTARY_PER_UNIT};
pub use errors::{ErrorKind, LedgerError};
pub use events::{EventStream, LedgerEvent};
pub use identity::{Identity, InvalidIdentity};
pub use models::{
    Airline, Flight, FlightKey, FlightStatus, InsurancePolicy, InsureeAccount, Oracle,
    PolicyKey, RegistrationBallot, RequestKey, RequestState, StatusRequest,
};
pub use storage::{EventEnvelope, EventStore};
