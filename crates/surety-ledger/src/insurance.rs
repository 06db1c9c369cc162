use std::collections::HashMap;

use serde::Serialize;
use surety_core::{
    Amount, FlightKey, FlightStatus, Identity, InsurancePolicy, InsureeAccount, LedgerError,
    PolicyKey,
};
use tracing::{debug, info, warn};

use crate::{airlines::AirlineRegistry, flights::FlightRegistry};

/// Largest premium a passenger may pay for one policy.
pub const INSURANCE_CAP: Amount = Amount::units(1);

/// Payout is `paid * PAYOUT_NUMERATOR / PAYOUT_DENOMINATOR` (1.5x).
pub const PAYOUT_NUMERATOR: u128 = 3;
pub const PAYOUT_DENOMINATOR: u128 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settlement {
    pub insuree: Identity,
    pub paid: Amount,
    pub credited: Amount,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PayoutReport {
    pub settled: Vec<Settlement>,
    /// Policies the airline could not cover; they stay active for a later payout.
    pub skipped: Vec<Settlement>,
}

/// Policies, insuree credit balances and the payout/withdrawal flow.
#[derive(Debug, Clone, Default)]
pub struct InsuranceLedger {
    policies: HashMap<PolicyKey, InsurancePolicy>,
    insurees_by_flight: HashMap<FlightKey, Vec<Identity>>,
    accounts: HashMap<Identity, InsureeAccount>,
}

impl InsuranceLedger {
    pub fn buy(
        &mut self,
        airlines: &mut AirlineRegistry,
        flights: &FlightRegistry,
        requester: &Identity,
        passenger_name: &str,
        flight: FlightKey,
        amount: Amount,
    ) -> Result<InsurancePolicy, LedgerError> {
        let record = flights.require(&flight)?;
        if amount.is_zero() {
            return Err(LedgerError::InvalidAmount);
        }
        if amount > INSURANCE_CAP {
            return Err(LedgerError::ExceedsInsuranceCap {
                amount,
                cap: INSURANCE_CAP,
            });
        }
        if record.is_finalized {
            return Err(LedgerError::AlreadyFinalized(flight));
        }

        let key = PolicyKey {
            insuree: requester.clone(),
            flight,
        };
        if self.policies.get(&key).is_some_and(|policy| policy.is_active) {
            return Err(LedgerError::DuplicatePolicy {
                insuree: key.insuree,
                flight: key.flight,
            });
        }

        // The premium joins the airline's reserve.
        airlines.deposit(&key.flight.airline, amount)?;

        let insurees = self.insurees_by_flight.entry(key.flight.clone()).or_default();
        if !insurees.contains(requester) {
            insurees.push(requester.clone());
        }

        let account = self
            .accounts
            .entry(requester.clone())
            .or_insert_with(|| InsureeAccount {
                identity: requester.clone(),
                name: String::new(),
                credit: Amount::ZERO,
            });
        account.name = passenger_name.to_string();

        let policy = InsurancePolicy {
            key: key.clone(),
            paid: amount,
            is_active: true,
        };
        info!(insuree = %requester, flight = %key.flight, paid = %amount, "insurance bought");
        self.policies.insert(key, policy.clone());
        Ok(policy)
    }

    /// Credits every active policy on a flight delayed by the airline.
    ///
    /// Policies are settled in purchase order against the airline's reserve.
    /// One the reserve cannot cover is skipped; if every eligible policy is
    /// skipped the call fails and nothing changes.
    pub fn payout(
        &mut self,
        airlines: &mut AirlineRegistry,
        flights: &FlightRegistry,
        flight: &FlightKey,
    ) -> Result<PayoutReport, LedgerError> {
        let record = flights.require(flight)?;
        if record.status != FlightStatus::LateAirline {
            return Err(LedgerError::FlightNotLate(flight.clone()));
        }

        let mut available = airlines.funds(&flight.airline);
        let mut report = PayoutReport::default();

        for insuree in self.insurees_by_flight.get(flight).into_iter().flatten() {
            let key = PolicyKey {
                insuree: insuree.clone(),
                flight: flight.clone(),
            };
            let Some(policy) = self.policies.get(&key).filter(|policy| policy.is_active) else {
                continue;
            };

            let credited = policy
                .paid
                .scale(PAYOUT_NUMERATOR, PAYOUT_DENOMINATOR)
                .ok_or(LedgerError::AmountOverflow)?;
            let settlement = Settlement {
                insuree: insuree.clone(),
                paid: policy.paid,
                credited,
            };

            match available.checked_sub(credited) {
                Some(rest) => {
                    self.payout_balance(insuree)
                        .checked_add(credited)
                        .ok_or(LedgerError::AmountOverflow)?;
                    available = rest;
                    report.settled.push(settlement);
                }
                None => {
                    warn!(
                        insuree = %insuree,
                        flight = %flight,
                        required = %credited,
                        available = %available,
                        "airline reserve cannot cover payout, policy left active"
                    );
                    report.skipped.push(settlement);
                }
            }
        }

        if report.settled.is_empty() {
            if let Some(first) = report.skipped.first() {
                return Err(LedgerError::InsufficientAirlineFunds {
                    airline: flight.airline.clone(),
                    required: first.credited,
                    available,
                });
            }
            debug!(flight = %flight, "no active policies to pay out");
            return Ok(report);
        }

        for settlement in &report.settled {
            airlines.withdraw(&flight.airline, settlement.credited)?;

            let key = PolicyKey {
                insuree: settlement.insuree.clone(),
                flight: flight.clone(),
            };
            if let Some(policy) = self.policies.get_mut(&key) {
                policy.is_active = false;
            }
            if let Some(account) = self.accounts.get_mut(&settlement.insuree) {
                account.credit = account
                    .credit
                    .checked_add(settlement.credited)
                    .ok_or(LedgerError::AmountOverflow)?;
            }
            info!(
                insuree = %settlement.insuree,
                flight = %flight,
                credited = %settlement.credited,
                "insurance credited"
            );
        }

        Ok(report)
    }

    /// Zeroes the requester's credit and returns the amount released to them.
    pub fn withdraw(&mut self, requester: &Identity) -> Result<Amount, LedgerError> {
        let account = self
            .accounts
            .get_mut(requester)
            .filter(|account| !account.credit.is_zero())
            .ok_or_else(|| LedgerError::NothingToWithdraw(requester.clone()))?;

        let amount = account.credit;
        account.credit = Amount::ZERO;
        info!(insuree = %requester, amount = %amount, "payout withdrawn");
        Ok(amount)
    }

    pub fn is_insurance_bought(&self, insuree: &Identity, flight: &FlightKey) -> bool {
        self.policies.contains_key(&PolicyKey {
            insuree: insuree.clone(),
            flight: flight.clone(),
        })
    }

    pub fn policy(&self, insuree: &Identity, flight: &FlightKey) -> Option<&InsurancePolicy> {
        self.policies.get(&PolicyKey {
            insuree: insuree.clone(),
            flight: flight.clone(),
        })
    }

    pub fn payout_balance(&self, insuree: &Identity) -> Amount {
        self.accounts
            .get(insuree)
            .map(|account| account.credit)
            .unwrap_or_default()
    }

    pub fn is_insuree(&self, identity: &Identity) -> bool {
        self.accounts.contains_key(identity)
    }

    pub fn account(&self, identity: &Identity) -> Option<&InsureeAccount> {
        self.accounts.get(identity)
    }

    pub(crate) fn total_credit(&self) -> Option<Amount> {
        self.accounts
            .values()
            .try_fold(Amount::ZERO, |total, account| total.checked_add(account.credit))
    }
}
