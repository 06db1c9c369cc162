use std::collections::HashSet;

use surety_core::{Identity, LedgerError};
use tracing::info;

/// Operational switch plus the set of entry points allowed to mutate the ledger.
#[derive(Debug, Clone)]
pub struct AccessGate {
    owner: Identity,
    operational: bool,
    authorized: HashSet<Identity>,
}

impl AccessGate {
    pub fn new(owner: Identity) -> Self {
        Self {
            owner,
            operational: true,
            authorized: HashSet::new(),
        }
    }

    pub fn owner(&self) -> &Identity {
        &self.owner
    }

    pub fn is_operational(&self) -> bool {
        self.operational
    }

    pub fn is_authorized(&self, caller: &Identity) -> bool {
        self.authorized.contains(caller)
    }

    pub fn set_operational(&mut self, caller: &Identity, operational: bool) -> Result<(), LedgerError> {
        self.require_owner(caller)?;
        if self.operational != operational {
            info!(operational, "ledger operating status changed");
        }
        self.operational = operational;
        Ok(())
    }

    /// Returns `true` when the entry point was not authorized before.
    pub fn authorize(&mut self, caller: &Identity, entry_point: Identity) -> Result<bool, LedgerError> {
        self.require_owner(caller)?;
        info!(entry_point = %entry_point, "entry point authorized");
        Ok(self.authorized.insert(entry_point))
    }

    /// Returns `true` when the entry point was authorized before.
    pub fn revoke(&mut self, caller: &Identity, entry_point: &Identity) -> Result<bool, LedgerError> {
        self.require_owner(caller)?;
        info!(entry_point = %entry_point, "entry point revoked");
        Ok(self.authorized.remove(entry_point))
    }

    /// Gate for every mutating operation.
    pub fn check(&self, entry_point: &Identity) -> Result<(), LedgerError> {
        if !self.operational {
            return Err(LedgerError::OperationsSuspended);
        }
        if !self.authorized.contains(entry_point) {
            return Err(LedgerError::NotAuthorized(entry_point.clone()));
        }
        Ok(())
    }

    fn require_owner(&self, caller: &Identity) -> Result<(), LedgerError> {
        if caller != &self.owner {
            return Err(LedgerError::NotOwner(caller.clone()));
        }
        Ok(())
    }
}
