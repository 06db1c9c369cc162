use std::collections::HashMap;

use serde::Serialize;
use surety_core::{Airline, Amount, Identity, LedgerError, RegistrationBallot};
use tracing::{debug, info};

/// Reserve an airline must hold before it may vote or register others.
pub const AIRLINE_FUNDING_MINIMUM: Amount = Amount::units(10);

/// Registered-airline count from which admissions need a vote.
pub const CONSENSUS_THRESHOLD: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RegistrationOutcome {
    Registered { name: String, approvals: usize },
    VoteRecorded { approvals: usize, registered_count: usize },
    DuplicateVote { approvals: usize },
}

/// Membership, funding and the admission vote.
#[derive(Debug, Clone, Default)]
pub struct AirlineRegistry {
    airlines: HashMap<Identity, Airline>,
    ballots: HashMap<Identity, RegistrationBallot>,
    registered_count: usize,
}

impl AirlineRegistry {
    /// Registry holding only the genesis airline, registered and unfunded.
    pub fn with_genesis(identity: Identity, name: impl Into<String>) -> Self {
        let mut registry = Self::default();
        registry.admit(identity, name.into());
        registry
    }

    pub fn register(
        &mut self,
        candidate: Identity,
        name: &str,
        requester: &Identity,
    ) -> Result<RegistrationOutcome, LedgerError> {
        if !self.is_funded(requester) {
            return Err(LedgerError::NotFunded(requester.clone()));
        }
        if self.is_airline(&candidate) {
            return Err(LedgerError::AlreadyRegistered(candidate));
        }

        if self.registered_count < CONSENSUS_THRESHOLD {
            self.admit(candidate, name.to_string());
            return Ok(RegistrationOutcome::Registered {
                name: name.to_string(),
                approvals: 1,
            });
        }

        let ballot = self
            .ballots
            .entry(candidate.clone())
            .or_insert_with(|| RegistrationBallot::new(candidate.clone(), name));

        if !ballot.approve(requester.clone()) {
            debug!(candidate = %candidate, voter = %requester, "duplicate admission vote ignored");
            return Ok(RegistrationOutcome::DuplicateVote {
                approvals: ballot.approvals(),
            });
        }

        let approvals = ballot.approvals();
        if approvals * 2 >= self.registered_count {
            let ballot = self.ballots.remove(&candidate);
            let name = ballot.map_or_else(|| name.to_string(), |b| b.candidate_name);
            self.admit(candidate, name.clone());
            return Ok(RegistrationOutcome::Registered { name, approvals });
        }

        debug!(
            candidate = %candidate,
            approvals,
            registered = self.registered_count,
            "admission vote recorded"
        );
        Ok(RegistrationOutcome::VoteRecorded {
            approvals,
            registered_count: self.registered_count,
        })
    }

    /// Adds to the requester's reserve and returns the new balance.
    pub fn fund(&mut self, requester: &Identity, amount: Amount) -> Result<Amount, LedgerError> {
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }
        self.deposit(requester, amount)
    }

    pub(crate) fn deposit(&mut self, airline: &Identity, amount: Amount) -> Result<Amount, LedgerError> {
        let record = self
            .airlines
            .get_mut(airline)
            .ok_or_else(|| LedgerError::UnknownAirline(airline.clone()))?;

        let funds = record
            .funds
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;
        record.funds = funds;

        if !record.is_funded && funds >= AIRLINE_FUNDING_MINIMUM {
            record.is_funded = true;
            info!(airline = %airline, funds = %funds, "airline reached funding minimum");
        }
        Ok(funds)
    }

    pub(crate) fn withdraw(&mut self, airline: &Identity, amount: Amount) -> Result<Amount, LedgerError> {
        let record = self
            .airlines
            .get_mut(airline)
            .ok_or_else(|| LedgerError::UnknownAirline(airline.clone()))?;

        let funds = record
            .funds
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::InsufficientAirlineFunds {
                airline: airline.clone(),
                required: amount,
                available: record.funds,
            })?;
        record.funds = funds;
        Ok(funds)
    }

    pub fn is_airline(&self, identity: &Identity) -> bool {
        self.airlines
            .get(identity)
            .is_some_and(|airline| airline.is_registered)
    }

    pub fn is_funded(&self, identity: &Identity) -> bool {
        self.airlines
            .get(identity)
            .is_some_and(|airline| airline.is_registered && airline.is_funded)
    }

    pub fn funds(&self, identity: &Identity) -> Amount {
        self.airlines
            .get(identity)
            .map(|airline| airline.funds)
            .unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.registered_count
    }

    pub fn get(&self, identity: &Identity) -> Option<&Airline> {
        self.airlines.get(identity)
    }

    /// Approvals collected so far for a pending candidate.
    pub fn approvals(&self, candidate: &Identity) -> usize {
        self.ballots
            .get(candidate)
            .map(RegistrationBallot::approvals)
            .unwrap_or_default()
    }

    pub(crate) fn total_funds(&self) -> Option<Amount> {
        self.airlines
            .values()
            .try_fold(Amount::ZERO, |total, airline| total.checked_add(airline.funds))
    }

    fn admit(&mut self, identity: Identity, name: String) {
        info!(airline = %identity, name = %name, "airline registered");
        self.airlines
            .insert(identity.clone(), Airline::registered(identity, name));
        self.registered_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn id(raw: &str) -> Identity {
        Identity::parse(raw).unwrap()
    }

    fn funded_registry(members: usize) -> AirlineRegistry {
        let mut registry = AirlineRegistry::with_genesis(id("airline-0"), "Airline 0");
        registry.fund(&id("airline-0"), AIRLINE_FUNDING_MINIMUM).unwrap();
        for n in 1..members {
            let member = id(&format!("airline-{n}"));
            if registry.count() < CONSENSUS_THRESHOLD {
                registry
                    .register(member.clone(), &format!("Airline {n}"), &id("airline-0"))
                    .unwrap();
            } else {
                let voters: Vec<Identity> = (0..n).map(|v| id(&format!("airline-{v}"))).collect();
                for voter in voters {
                    if registry.is_airline(&member) {
                        break;
                    }
                    registry.register(member.clone(), &format!("Airline {n}"), &voter).unwrap();
                }
            }
            registry.fund(&member, AIRLINE_FUNDING_MINIMUM).unwrap();
        }
        registry
    }

    #[test]
    fn genesis_airline_is_registered_but_unfunded() {
        let registry = AirlineRegistry::with_genesis(id("first"), "First Airline");
        assert!(registry.is_airline(&id("first")));
        assert!(!registry.is_funded(&id("first")));
        assert_eq!(registry.count(), 1);
        assert_eq!(registry.funds(&id("first")), Amount::ZERO);
    }

    #[test]
    fn unfunded_airline_cannot_register_others() {
        let mut registry = AirlineRegistry::with_genesis(id("first"), "First Airline");
        registry.fund(&id("first"), Amount::units(1)).unwrap();

        let err = registry
            .register(id("second"), "Second Airline", &id("first"))
            .unwrap_err();
        assert_eq!(err, LedgerError::NotFunded(id("first")));
        assert!(!registry.is_airline(&id("second")));
    }

    #[test]
    fn unregistered_requester_is_not_funded() {
        let mut registry = AirlineRegistry::with_genesis(id("first"), "First Airline");
        let err = registry
            .register(id("third"), "Third Airline", &id("tenth"))
            .unwrap_err();
        assert_eq!(err, LedgerError::NotFunded(id("tenth")));
    }

    #[test]
    fn fast_path_admits_until_four_members() {
        let mut registry = funded_registry(1);
        for n in 1..4 {
            let outcome = registry
                .register(id(&format!("airline-{n}")), "x", &id("airline-0"))
                .unwrap();
            assert!(matches!(outcome, RegistrationOutcome::Registered { .. }));
            assert_eq!(registry.count(), n + 1);
        }

        // Fifth airline is the first one that needs a vote.
        let outcome = registry
            .register(id("airline-4"), "Fifth", &id("airline-0"))
            .unwrap();
        assert_eq!(
            outcome,
            RegistrationOutcome::VoteRecorded {
                approvals: 1,
                registered_count: 4
            }
        );
        assert!(!registry.is_airline(&id("airline-4")));
    }

    #[test]
    fn duplicate_votes_do_not_count() {
        let mut registry = funded_registry(4);
        let candidate = id("candidate");

        registry.register(candidate.clone(), "Candidate", &id("airline-0")).unwrap();
        let outcome = registry
            .register(candidate.clone(), "Candidate", &id("airline-0"))
            .unwrap();

        assert_eq!(outcome, RegistrationOutcome::DuplicateVote { approvals: 1 });
        assert_eq!(registry.approvals(&candidate), 1);
        assert!(!registry.is_airline(&candidate));
    }

    #[test]
    fn half_of_four_members_admits() {
        let mut registry = funded_registry(4);
        let candidate = id("candidate");

        registry.register(candidate.clone(), "Candidate Air", &id("airline-0")).unwrap();
        let outcome = registry
            .register(candidate.clone(), "ignored name", &id("airline-1"))
            .unwrap();

        assert_eq!(
            outcome,
            RegistrationOutcome::Registered {
                name: "Candidate Air".to_string(),
                approvals: 2
            }
        );
        assert_eq!(registry.count(), 5);
        assert_eq!(registry.approvals(&candidate), 0);
        assert_eq!(registry.get(&candidate).unwrap().name, "Candidate Air");
    }

    #[test]
    fn five_members_need_three_approvals() {
        let mut registry = funded_registry(5);
        assert_eq!(registry.count(), 5);
        let candidate = id("sixth");

        registry.register(candidate.clone(), "Sixth", &id("airline-0")).unwrap();
        registry.register(candidate.clone(), "Sixth", &id("airline-1")).unwrap();
        assert!(!registry.is_airline(&candidate));

        registry.register(candidate.clone(), "Sixth", &id("airline-2")).unwrap();
        assert!(registry.is_airline(&candidate));
        assert_eq!(registry.count(), 6);
    }

    #[test]
    fn registered_candidate_is_rejected() {
        let mut registry = funded_registry(2);
        let err = registry
            .register(id("airline-1"), "again", &id("airline-0"))
            .unwrap_err();
        assert_eq!(err, LedgerError::AlreadyRegistered(id("airline-1")));
    }

    #[test]
    fn fund_requires_known_airline() {
        let mut registry = AirlineRegistry::with_genesis(id("first"), "First Airline");
        assert_eq!(
            registry.fund(&id("ghost"), Amount::units(10)),
            Err(LedgerError::UnknownAirline(id("ghost")))
        );
        assert_eq!(
            registry.fund(&id("first"), Amount::ZERO),
            Err(LedgerError::InvalidAmount)
        );
    }

    #[test]
    fn funded_flag_survives_withdrawal() {
        let mut registry = AirlineRegistry::with_genesis(id("first"), "First Airline");
        registry.fund(&id("first"), Amount::units(10)).unwrap();
        registry.withdraw(&id("first"), Amount::units(5)).unwrap();
        assert!(registry.is_funded(&id("first")));
        assert_eq!(registry.funds(&id("first")), Amount::units(5));
    }

    #[test]
    fn withdraw_cannot_go_negative() {
        let mut registry = AirlineRegistry::with_genesis(id("first"), "First Airline");
        registry.fund(&id("first"), Amount::units(1)).unwrap();
        let err = registry.withdraw(&id("first"), Amount::units(2)).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientAirlineFunds { .. }));
        assert_eq!(registry.funds(&id("first")), Amount::units(1));
    }

    proptest! {
        #[test]
        fn funding_is_additive(x in 1u64..u64::MAX, y in 1u64..u64::MAX) {
            let mut registry = AirlineRegistry::with_genesis(id("first"), "First Airline");
            let x = Amount::from_elementary(u128::from(x));
            let y = Amount::from_elementary(u128::from(y));

            registry.fund(&id("first"), x).unwrap();
            registry.fund(&id("first"), y).unwrap();

            prop_assert_eq!(registry.funds(&id("first")), x.checked_add(y).unwrap());
        }

        #[test]
        fn funded_exactly_at_minimum(steps in proptest::collection::vec(1u128..4_000_000_000_000_000_000, 1..12)) {
            let mut registry = AirlineRegistry::with_genesis(id("first"), "First Airline");
            for step in steps {
                let before = registry.funds(&id("first"));
                registry.fund(&id("first"), Amount::from_elementary(step)).unwrap();
                let after = registry.funds(&id("first"));
                prop_assert_eq!(registry.is_funded(&id("first")), after >= AIRLINE_FUNDING_MINIMUM);
                if before >= AIRLINE_FUNDING_MINIMUM {
                    prop_assert!(registry.is_funded(&id("first")));
                }
            }
        }
    }
}
