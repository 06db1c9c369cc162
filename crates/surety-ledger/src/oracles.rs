use std::collections::HashMap;

use serde::Serialize;
use surety_core::{
    Amount, FlightKey, FlightStatus, Identity, LedgerError, Oracle, RequestKey, RequestState,
    StatusRequest,
};
use tracing::{debug, info};

use crate::{
    entropy::{EntropySource, draw_index},
    flights::FlightRegistry,
};

pub const ORACLE_REGISTRATION_FEE: Amount = Amount::units(1);

/// Matching responses needed to finalize a flight status.
pub const MIN_RESPONSES: u32 = 3;

/// Indices are drawn from `0..INDEX_RANGE`.
pub const INDEX_RANGE: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Counted { status: FlightStatus, count: u32 },
    Finalized { status: FlightStatus },
    Duplicate,
}

/// Oracle registry and per-request response aggregation.
#[derive(Debug, Clone, Default)]
pub struct OracleQuorum {
    oracles: HashMap<Identity, Oracle>,
    requests: HashMap<RequestKey, StatusRequest>,
    nonce: u64,
    fees: Amount,
}

impl OracleQuorum {
    pub fn register(
        &mut self,
        requester: &Identity,
        fee: Amount,
        entropy: &mut dyn EntropySource,
    ) -> Result<[u8; 3], LedgerError> {
        if fee < ORACLE_REGISTRATION_FEE {
            return Err(LedgerError::InsufficientFee {
                fee,
                required: ORACLE_REGISTRATION_FEE,
            });
        }
        if self.oracles.contains_key(requester) {
            return Err(LedgerError::AlreadyRegistered(requester.clone()));
        }
        let fees = self.fees.checked_add(fee).ok_or(LedgerError::AmountOverflow)?;

        let seed = entropy.next_seed();
        let first = self.draw(&seed, requester);
        let mut second = self.draw(&seed, requester);
        while second == first {
            second = self.draw(&seed, requester);
        }
        let mut third = self.draw(&seed, requester);
        while third == first || third == second {
            third = self.draw(&seed, requester);
        }

        let indices = [first, second, third];
        self.fees = fees;
        self.oracles.insert(
            requester.clone(),
            Oracle {
                operator: requester.clone(),
                indices,
            },
        );
        info!(operator = %requester, ?indices, "oracle registered");
        Ok(indices)
    }

    /// Opens a status request under a freshly drawn index and returns the index.
    /// An already open request for the same key keeps its collected responses.
    pub fn fetch(
        &mut self,
        flights: &FlightRegistry,
        requester: &Identity,
        flight: FlightKey,
        entropy: &mut dyn EntropySource,
    ) -> Result<u8, LedgerError> {
        let record = flights.require(&flight)?;
        if record.is_finalized {
            return Err(LedgerError::AlreadyFinalized(flight));
        }

        let seed = entropy.next_seed();
        let index = self.draw(&seed, requester);
        let key = RequestKey { index, flight };

        info!(index, flight = %key.flight, requester = %requester, "flight status requested");
        self.requests
            .entry(key.clone())
            .or_insert_with(|| StatusRequest::open(key, requester.clone()));
        Ok(index)
    }

    pub fn submit(
        &mut self,
        flights: &mut FlightRegistry,
        requester: &Identity,
        index: u8,
        flight: FlightKey,
        status: FlightStatus,
    ) -> Result<SubmissionOutcome, LedgerError> {
        if !self
            .oracles
            .get(requester)
            .is_some_and(|oracle| oracle.holds(index))
        {
            return Err(LedgerError::IndexNotAssigned {
                index,
                operator: requester.clone(),
            });
        }
        if status == FlightStatus::Unknown {
            return Err(LedgerError::InvalidStatusCode(status.code()));
        }
        if flights.is_finalized(&flight) {
            return Err(LedgerError::AlreadyFinalized(flight));
        }

        let key = RequestKey { index, flight };
        let Some(request) = self.requests.get_mut(&key) else {
            return Err(LedgerError::NoMatchingRequest {
                index,
                flight: key.flight,
            });
        };
        if !request.is_open() {
            return Err(LedgerError::AlreadyFinalized(key.flight));
        }
        if request.responders.contains(requester) {
            debug!(oracle = %requester, index, flight = %key.flight, "duplicate oracle response ignored");
            return Ok(SubmissionOutcome::Duplicate);
        }

        let count = request.count(status) + 1;
        if count >= MIN_RESPONSES {
            flights.finalize(&key.flight, status)?;
            request.state = RequestState::Finalized(status);
        }
        request.responders.insert(requester.clone());
        request.responses.insert(status, count);

        debug!(oracle = %requester, index, flight = %key.flight, %status, count, "oracle response counted");
        if count >= MIN_RESPONSES {
            return Ok(SubmissionOutcome::Finalized { status });
        }
        Ok(SubmissionOutcome::Counted { status, count })
    }

    pub fn indexes(&self, operator: &Identity) -> Option<[u8; 3]> {
        self.oracles.get(operator).map(|oracle| oracle.indices)
    }

    pub fn is_oracle(&self, operator: &Identity) -> bool {
        self.oracles.contains_key(operator)
    }

    /// Request lifecycle as observers see it; a request whose flight was
    /// finalized through another index reads as finalized too.
    pub fn request_state(&self, flights: &FlightRegistry, key: &RequestKey) -> RequestState {
        match self.requests.get(key) {
            None => RequestState::NoRequest,
            Some(request) if flights.is_finalized(&key.flight) => match request.state {
                RequestState::Finalized(status) => RequestState::Finalized(status),
                _ => RequestState::Finalized(flights.status(&key.flight)),
            },
            Some(request) => request.state,
        }
    }

    pub fn request(&self, key: &RequestKey) -> Option<&StatusRequest> {
        self.requests.get(key)
    }

    pub fn fees_collected(&self) -> Amount {
        self.fees
    }

    fn draw(&mut self, seed: &[u8; 32], account: &Identity) -> u8 {
        let index = draw_index(seed, account.as_bytes(), self.nonce, INDEX_RANGE);
        self.nonce += 1;
        index
    }
}
