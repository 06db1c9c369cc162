//! Flight delay insurance settlement ledger.
//!
//! Airlines are admitted by vote and fund a reserve, passengers insure
//! registered flights, and an oracle quorum decides each flight's status.
//! Flights delayed by the airline pay insurees 1.5x their premium as credit
//! that they withdraw separately.

pub mod access;
pub mod airlines;
pub mod entropy;
pub mod flights;
pub mod insurance;
pub mod ledger;
pub mod oracles;

pub use access::AccessGate;
pub use airlines::{
    AIRLINE_FUNDING_MINIMUM, AirlineRegistry, CONSENSUS_THRESHOLD, RegistrationOutcome,
};
pub use entropy::{EntropySource, HashChainEntropy};
pub use flights::{FlightRegistration, FlightRegistry};
pub use insurance::{INSURANCE_CAP, InsuranceLedger, PayoutReport, Settlement};
pub use ledger::{CallContext, Genesis, Ledger, Outcome};
pub use oracles::{
    INDEX_RANGE, MIN_RESPONSES, ORACLE_REGISTRATION_FEE, OracleQuorum, SubmissionOutcome,
};
