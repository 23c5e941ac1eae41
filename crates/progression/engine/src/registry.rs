use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use progression_types::{ProgressionError, TierTable};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ledger::{BalanceLedger, DEFAULT_HISTORY_LIMIT};

/// Member account identifier, as issued by the host.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    /// Wrap a host-issued id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One ledger per member.
///
/// The registry lock only guards the map; each returned ledger carries its
/// own lock, so members never contend with each other on balance changes.
pub struct LedgerRegistry {
    table: Arc<TierTable>,
    history_limit: usize,
    ledgers: RwLock<HashMap<UserId, Arc<BalanceLedger>>>,
}

impl LedgerRegistry {
    /// Create an empty registry.
    pub fn new(table: Arc<TierTable>) -> Self {
        Self {
            table,
            history_limit: DEFAULT_HISTORY_LIMIT,
            ledgers: RwLock::new(HashMap::new()),
        }
    }

    /// History cap applied to every ledger this registry opens.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// The member's ledger, opened at zero if it does not exist yet.
    pub fn ledger_for(&self, user: &UserId) -> Result<Arc<BalanceLedger>, ProgressionError> {
        {
            let ledgers = self
                .ledgers
                .read()
                .map_err(|_| ProgressionError::LockPoisoned)?;
            if let Some(ledger) = ledgers.get(user) {
                return Ok(Arc::clone(ledger));
            }
        }

        let mut ledgers = self
            .ledgers
            .write()
            .map_err(|_| ProgressionError::LockPoisoned)?;
        let ledger = ledgers.entry(user.clone()).or_insert_with(|| {
            debug!(user = %user, "Opening ledger");
            let ledger = BalanceLedger::new(Arc::clone(&self.table));
            Arc::new(ledger.with_history_limit(self.history_limit))
        });
        Ok(Arc::clone(ledger))
    }

    /// Install a ledger from a persisted balance.
    ///
    /// Returns `None` without touching anything if the member already has an
    /// open ledger.
    pub fn open(
        &self,
        user: UserId,
        opening_balance: u64,
    ) -> Result<Option<Arc<BalanceLedger>>, ProgressionError> {
        let mut ledgers = self
            .ledgers
            .write()
            .map_err(|_| ProgressionError::LockPoisoned)?;
        if ledgers.contains_key(&user) {
            return Ok(None);
        }
        debug!(user = %user, opening_balance, "Opening ledger from persisted balance");
        let ledger = Arc::new(
            BalanceLedger::with_balance(Arc::clone(&self.table), opening_balance)
                .with_history_limit(self.history_limit),
        );
        ledgers.insert(user, Arc::clone(&ledger));
        Ok(Some(ledger))
    }

    /// Drop a member's ledger, e.g. when their session ends.
    pub fn close(&self, user: &UserId) -> Result<Option<Arc<BalanceLedger>>, ProgressionError> {
        let mut ledgers = self
            .ledgers
            .write()
            .map_err(|_| ProgressionError::LockPoisoned)?;
        Ok(ledgers.remove(user))
    }

    /// Number of open ledgers.
    pub fn len(&self) -> Result<usize, ProgressionError> {
        Ok(self
            .ledgers
            .read()
            .map_err(|_| ProgressionError::LockPoisoned)?
            .len())
    }

    /// Whether no ledger is open.
    pub fn is_empty(&self) -> Result<bool, ProgressionError> {
        Ok(self.len()? == 0)
    }
}
