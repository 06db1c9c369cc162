use serde::Serialize;
use surety_core::{
    Airline, Amount, Flight, FlightKey, FlightStatus, Identity, InsurancePolicy, LedgerError,
    LedgerEvent, RequestKey, RequestState,
};
use tracing::debug;

use crate::{
    access::AccessGate,
    airlines::{AirlineRegistry, RegistrationOutcome},
    entropy::EntropySource,
    flights::{FlightRegistration, FlightRegistry},
    insurance::{InsuranceLedger, PayoutReport},
    oracles::{OracleQuorum, SubmissionOutcome},
};

/// State installed when the ledger is created.
#[derive(Debug, Clone)]
pub struct Genesis {
    pub owner: Identity,
    pub airline: Identity,
    pub airline_name: String,
}

/// Who is calling: the authorized entry point and the end identity it acts for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    pub entry_point: Identity,
    pub requester: Identity,
}

impl CallContext {
    pub fn new(entry_point: Identity, requester: Identity) -> Self {
        Self {
            entry_point,
            requester,
        }
    }
}

/// Result of a mutating operation with the events it emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome<T> {
    pub value: T,
    pub events: Vec<LedgerEvent>,
}

/// The single state container. Operations run one at a time through `&mut self`;
/// each validates before mutating, so an error leaves the ledger untouched.
pub struct Ledger {
    gate: AccessGate,
    airlines: AirlineRegistry,
    flights: FlightRegistry,
    insurance: InsuranceLedger,
    oracles: OracleQuorum,
    entropy: Box<dyn EntropySource>,
    journal: Vec<LedgerEvent>,
}

impl Ledger {
    pub fn new(genesis: Genesis, entropy: impl EntropySource + 'static) -> Self {
        Self {
            gate: AccessGate::new(genesis.owner),
            airlines: AirlineRegistry::with_genesis(genesis.airline, genesis.airline_name),
            flights: FlightRegistry::default(),
            insurance: InsuranceLedger::default(),
            oracles: OracleQuorum::default(),
            entropy: Box::new(entropy),
            journal: Vec::new(),
        }
    }

    pub fn set_operational(&mut self, caller: &Identity, operational: bool) -> Result<(), LedgerError> {
        self.gate.set_operational(caller, operational)
    }

    pub fn authorize_caller(&mut self, caller: &Identity, entry_point: Identity) -> Result<bool, LedgerError> {
        self.gate.authorize(caller, entry_point)
    }

    pub fn revoke_caller(&mut self, caller: &Identity, entry_point: &Identity) -> Result<bool, LedgerError> {
        self.gate.revoke(caller, entry_point)
    }

    pub fn register_airline(
        &mut self,
        call: &CallContext,
        candidate: Identity,
        name: &str,
    ) -> Result<Outcome<RegistrationOutcome>, LedgerError> {
        self.gate.check(&call.entry_point)?;
        let outcome = self
            .airlines
            .register(candidate.clone(), name, &call.requester)?;

        let events = match &outcome {
            RegistrationOutcome::Registered { name, .. } => vec![LedgerEvent::AirlineRegistered {
                candidate,
                name: name.clone(),
            }],
            _ => Vec::new(),
        };
        Ok(self.commit(outcome, events))
    }

    /// Returns the airline's new reserve balance.
    pub fn fund(&mut self, call: &CallContext, amount: Amount) -> Result<Outcome<Amount>, LedgerError> {
        self.gate.check(&call.entry_point)?;
        self.ensure_custody_room(amount)?;
        let balance = self.airlines.fund(&call.requester, amount)?;
        let event = LedgerEvent::AirlineFunded {
            airline: call.requester.clone(),
            amount,
        };
        Ok(self.commit(balance, vec![event]))
    }

    pub fn register_flight(
        &mut self,
        call: &CallContext,
        flight: &str,
        timestamp: u64,
        origin: &str,
        destination: &str,
    ) -> Result<Outcome<FlightRegistration>, LedgerError> {
        self.gate.check(&call.entry_point)?;
        let registration = self.flights.register(
            &self.airlines,
            &call.requester,
            flight,
            timestamp,
            origin,
            destination,
        )?;

        let events = match registration {
            FlightRegistration::Registered => vec![LedgerEvent::FlightRegistered {
                airline: call.requester.clone(),
                flight: flight.to_string(),
                timestamp,
                origin: origin.to_string(),
                destination: destination.to_string(),
            }],
            FlightRegistration::AlreadyRegistered => Vec::new(),
        };
        Ok(self.commit(registration, events))
    }

    pub fn buy_insurance(
        &mut self,
        call: &CallContext,
        passenger_name: &str,
        flight: FlightKey,
        amount: Amount,
    ) -> Result<Outcome<InsurancePolicy>, LedgerError> {
        self.gate.check(&call.entry_point)?;
        self.ensure_custody_room(amount)?;
        let policy = self.insurance.buy(
            &mut self.airlines,
            &self.flights,
            &call.requester,
            passenger_name,
            flight,
            amount,
        )?;

        let event = LedgerEvent::InsuranceBought {
            insuree: policy.key.insuree.clone(),
            airline: policy.key.flight.airline.clone(),
            flight: policy.key.flight.flight.clone(),
            timestamp: policy.key.flight.timestamp,
            paid: policy.paid,
        };
        Ok(self.commit(policy, vec![event]))
    }

    pub fn payout_insurance(
        &mut self,
        call: &CallContext,
        flight: &FlightKey,
    ) -> Result<Outcome<PayoutReport>, LedgerError> {
        self.gate.check(&call.entry_point)?;
        let report = self
            .insurance
            .payout(&mut self.airlines, &self.flights, flight)?;

        let events = report
            .settled
            .iter()
            .map(|settlement| LedgerEvent::InsuranceCredited {
                insuree: settlement.insuree.clone(),
                amount: settlement.credited,
            })
            .collect();
        Ok(self.commit(report, events))
    }

    /// Returns the amount released to the requester.
    pub fn withdraw_payout(&mut self, call: &CallContext) -> Result<Outcome<Amount>, LedgerError> {
        self.gate.check(&call.entry_point)?;
        let amount = self.insurance.withdraw(&call.requester)?;
        let event = LedgerEvent::PayoutWithdrawn {
            insuree: call.requester.clone(),
            amount,
        };
        Ok(self.commit(amount, vec![event]))
    }

    pub fn register_oracle(&mut self, call: &CallContext, fee: Amount) -> Result<Outcome<[u8; 3]>, LedgerError> {
        self.gate.check(&call.entry_point)?;
        self.ensure_custody_room(fee)?;
        let indices = self
            .oracles
            .register(&call.requester, fee, self.entropy.as_mut())?;
        let event = LedgerEvent::OracleRegistered {
            operator: call.requester.clone(),
            indices,
        };
        Ok(self.commit(indices, vec![event]))
    }

    /// Returns the index oracles must hold to answer the request.
    pub fn fetch_flight_status(&mut self, call: &CallContext, flight: FlightKey) -> Result<Outcome<u8>, LedgerError> {
        self.gate.check(&call.entry_point)?;
        let index = self.oracles.fetch(
            &self.flights,
            &call.requester,
            flight.clone(),
            self.entropy.as_mut(),
        )?;
        let event = LedgerEvent::OracleRequest {
            index,
            airline: flight.airline,
            flight: flight.flight,
            timestamp: flight.timestamp,
        };
        Ok(self.commit(index, vec![event]))
    }

    pub fn submit_oracle_response(
        &mut self,
        call: &CallContext,
        index: u8,
        flight: FlightKey,
        status: FlightStatus,
    ) -> Result<Outcome<SubmissionOutcome>, LedgerError> {
        self.gate.check(&call.entry_point)?;
        let outcome = self.oracles.submit(
            &mut self.flights,
            &call.requester,
            index,
            flight.clone(),
            status,
        )?;

        let mut events = Vec::new();
        if outcome != SubmissionOutcome::Duplicate {
            events.push(LedgerEvent::OracleReport {
                index,
                airline: flight.airline.clone(),
                flight: flight.flight.clone(),
                timestamp: flight.timestamp,
                status,
            });
        }
        if let SubmissionOutcome::Finalized { status } = outcome {
            events.push(LedgerEvent::FlightStatusFinalized {
                airline: flight.airline,
                flight: flight.flight,
                timestamp: flight.timestamp,
                status,
            });
        }
        Ok(self.commit(outcome, events))
    }

    pub fn is_operational(&self) -> bool {
        self.gate.is_operational()
    }

    pub fn is_authorized(&self, entry_point: &Identity) -> bool {
        self.gate.is_authorized(entry_point)
    }

    pub fn owner(&self) -> &Identity {
        self.gate.owner()
    }

    pub fn is_airline(&self, identity: &Identity) -> bool {
        self.airlines.is_airline(identity)
    }

    pub fn airline_funds(&self, identity: &Identity) -> Amount {
        self.airlines.funds(identity)
    }

    pub fn airlines_count(&self) -> usize {
        self.airlines.count()
    }

    pub fn airline(&self, identity: &Identity) -> Option<&Airline> {
        self.airlines.get(identity)
    }

    pub fn approvals_for(&self, candidate: &Identity) -> usize {
        self.airlines.approvals(candidate)
    }

    pub fn is_flight(&self, flight: &FlightKey) -> bool {
        self.flights.is_flight(flight)
    }

    pub fn flight_status(&self, flight: &FlightKey) -> FlightStatus {
        self.flights.status(flight)
    }

    pub fn flight(&self, flight: &FlightKey) -> Option<&Flight> {
        self.flights.get(flight)
    }

    pub fn is_insurance_bought(&self, insuree: &Identity, flight: &FlightKey) -> bool {
        self.insurance.is_insurance_bought(insuree, flight)
    }

    pub fn policy(&self, insuree: &Identity, flight: &FlightKey) -> Option<&InsurancePolicy> {
        self.insurance.policy(insuree, flight)
    }

    pub fn insuree_payout(&self, insuree: &Identity) -> Amount {
        self.insurance.payout_balance(insuree)
    }

    pub fn is_insuree(&self, identity: &Identity) -> bool {
        self.insurance.is_insuree(identity)
    }

    pub fn my_indexes(&self, operator: &Identity) -> Option<[u8; 3]> {
        self.oracles.indexes(operator)
    }

    pub fn request_state(&self, key: &RequestKey) -> RequestState {
        self.oracles.request_state(&self.flights, key)
    }

    /// Native asset held by the ledger: airline reserves, unwithdrawn insuree
    /// credit and collected oracle fees.
    pub fn ledger_balance(&self) -> Result<Amount, LedgerError> {
        let reserves = self.airlines.total_funds().ok_or(LedgerError::AmountOverflow)?;
        let credit = self.insurance.total_credit().ok_or(LedgerError::AmountOverflow)?;
        reserves
            .checked_add(credit)
            .and_then(|total| total.checked_add(self.oracles.fees_collected()))
            .ok_or(LedgerError::AmountOverflow)
    }

    pub fn journal(&self) -> &[LedgerEvent] {
        &self.journal
    }

    /// Journal entries after the first `after` events.
    pub fn events_since(&self, after: usize) -> &[LedgerEvent] {
        &self.journal[after.min(self.journal.len())..]
    }

    /// Deposits are refused once custody would no longer render in display
    /// units. Payouts only move value between balances, so every balance stays
    /// within the same bound.
    fn ensure_custody_room(&self, incoming: Amount) -> Result<(), LedgerError> {
        self.ledger_balance()?
            .checked_add(incoming)
            .filter(|total| *total <= Amount::MAX_DISPLAYABLE)
            .map(|_| ())
            .ok_or(LedgerError::AmountOverflow)
    }

    fn commit<T>(&mut self, value: T, events: Vec<LedgerEvent>) -> Outcome<T> {
        for event in &events {
            self.journal.push(event.clone());
            debug!(event = event.name(), sequence = self.journal.len(), "ledger event");
        }
        Outcome { value, events }
    }
}
