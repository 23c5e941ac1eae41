use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use progression_types::{ProgressionError, TierId, TierTable};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::reward::calculate_reward;

/// Entries a ledger keeps unless told otherwise.
pub const DEFAULT_HISTORY_LIMIT: usize = 1_000;

/// Unique id of a committed ledger entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub Uuid);

impl EntryId {
    /// Fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raised exactly when a committed delta changes the resolved tier.
///
/// Delivered synchronously to the caller of [`BalanceLedger::apply_delta`];
/// what to do with it (a level-up toast, say) is the caller's business.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTransition {
    pub from_tier: TierId,
    pub to_tier: TierId,
    pub balance_at_transition: u64,
}

impl TierTransition {
    /// True when the member moved up.
    pub fn is_promotion(&self) -> bool {
        self.to_tier > self.from_tier
    }
}

/// Result of a committed delta.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaOutcome {
    pub new_balance: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<TierTransition>,
}

/// Result of [`BalanceLedger::reward`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardOutcome {
    /// Tier whose multiplier was applied
    pub tier: TierId,
    pub credited: u64,
    pub outcome: DeltaOutcome,
}

/// One committed delta. Rejected deltas are never recorded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    /// 1-based position in this ledger's history
    pub sequence: u64,
    pub delta: i64,
    pub balance_after: u64,
    pub tier_after: TierId,
    pub recorded_at: DateTime<Utc>,
}

/// Balance and tier read under a single lock acquisition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub balance: u64,
    pub tier: TierId,
}

struct LedgerState {
    balance: u64,
    tier: TierId,
    /// Most recent entries, oldest first, at most `history_limit` long
    history: VecDeque<LedgerEntry>,
    history_limit: usize,
    next_sequence: u64,
}

/// One member's point balance: the sole mutator of that balance and tier.
///
/// Every mutation runs under this ledger's own mutex, so concurrent callers
/// are serialized per member and never across members.
///
/// History is a ring buffer of the last [`DEFAULT_HISTORY_LIMIT`] entries
/// (see [`BalanceLedger::with_history_limit`]); durable audit trails are the
/// host's to persist.
pub struct BalanceLedger {
    table: Arc<TierTable>,
    state: Mutex<LedgerState>,
}

impl BalanceLedger {
    /// Open an empty ledger at balance 0.
    pub fn new(table: Arc<TierTable>) -> Self {
        Self::with_balance(table, 0)
    }

    /// Open a ledger from a balance the host persisted earlier.
    pub fn with_balance(table: Arc<TierTable>, opening_balance: u64) -> Self {
        let tier = table.tier_for_balance(opening_balance).id;
        Self {
            table,
            state: Mutex::new(LedgerState {
                balance: opening_balance,
                tier,
                history: VecDeque::new(),
                history_limit: DEFAULT_HISTORY_LIMIT,
                next_sequence: 1,
            }),
        }
    }

    /// Keep at most `limit` history entries, dropping the oldest first.
    /// A limit of 0 disables history.
    pub fn with_history_limit(self, limit: usize) -> Self {
        let mut state = self
            .state
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state.history_limit = limit;
        trim_history(&mut state);
        Self {
            table: self.table,
            state: Mutex::new(state),
        }
    }

    /// The tier table balances resolve against.
    pub fn table(&self) -> &Arc<TierTable> {
        &self.table
    }

    fn lock(&self) -> Result<MutexGuard<'_, LedgerState>, ProgressionError> {
        self.state.lock().map_err(|_| ProgressionError::LockPoisoned)
    }

    /// Current balance.
    pub fn balance(&self) -> Result<u64, ProgressionError> {
        Ok(self.lock()?.balance)
    }

    /// Current tier.
    pub fn tier(&self) -> Result<TierId, ProgressionError> {
        Ok(self.lock()?.tier)
    }

    /// Balance and tier, read together.
    pub fn snapshot(&self) -> Result<LedgerSnapshot, ProgressionError> {
        let state = self.lock()?;
        Ok(LedgerSnapshot {
            balance: state.balance,
            tier: state.tier,
        })
    }

    /// Retained entries, oldest first. Sequence numbers keep counting
    /// after old entries are dropped.
    pub fn history(&self) -> Result<Vec<LedgerEntry>, ProgressionError> {
        Ok(self.lock()?.history.iter().cloned().collect())
    }

    /// Retention cap on [`Self::history`].
    pub fn history_limit(&self) -> Result<usize, ProgressionError> {
        Ok(self.lock()?.history_limit)
    }

    /// Apply a signed delta and re-resolve the tier.
    ///
    /// A debit larger than the balance fails with `InsufficientBalance` and
    /// leaves the ledger untouched. Not idempotent: the same delta applied
    /// twice counts twice.
    pub fn apply_delta(&self, delta: i64) -> Result<DeltaOutcome, ProgressionError> {
        let mut state = self.lock()?;
        commit(&self.table, &mut state, delta)
    }

    /// Credit a rewarded action at the ledger's current tier.
    ///
    /// Calculation and credit happen under one lock, so the multiplier is
    /// always the one in force when the credit lands.
    pub fn reward(&self, base_amount: i64) -> Result<RewardOutcome, ProgressionError> {
        let mut state = self.lock()?;
        let tier = state.tier;
        let credited = calculate_reward(&self.table, base_amount, tier)?;
        let delta = i64::try_from(credited).map_err(|_| ProgressionError::BalanceOverflow {
            balance: state.balance,
            delta: i64::MAX,
        })?;
        let outcome = commit(&self.table, &mut state, delta)?;
        Ok(RewardOutcome {
            tier,
            credited,
            outcome,
        })
    }

    /// Spend points, e.g. converting them to an external reward.
    pub fn redeem(&self, cost: u64) -> Result<DeltaOutcome, ProgressionError> {
        let mut state = self.lock()?;
        let delta = match i64::try_from(cost) {
            Ok(cost) => -cost,
            Err(_) => {
                return Err(ProgressionError::InsufficientBalance {
                    balance: state.balance,
                    requested: cost,
                })
            }
        };
        commit(&self.table, &mut state, delta)
    }
}

fn commit(
    table: &TierTable,
    state: &mut LedgerState,
    delta: i64,
) -> Result<DeltaOutcome, ProgressionError> {
    let new_balance = if delta >= 0 {
        state
            .balance
            .checked_add(delta.unsigned_abs())
            .ok_or(ProgressionError::BalanceOverflow {
                balance: state.balance,
                delta,
            })?
    } else {
        let debit = delta.unsigned_abs();
        if debit > state.balance {
            warn!(
                balance = state.balance,
                requested = debit,
                "Debit rejected: insufficient balance"
            );
            return Err(ProgressionError::InsufficientBalance {
                balance: state.balance,
                requested: debit,
            });
        }
        state.balance - debit
    };

    if delta == 0 {
        debug!(balance = state.balance, "Zero delta, nothing to commit");
        return Ok(DeltaOutcome {
            new_balance,
            transition: None,
        });
    }

    let new_tier = table.tier_for_balance(new_balance).id;
    let transition = (new_tier != state.tier).then(|| TierTransition {
        from_tier: state.tier,
        to_tier: new_tier,
        balance_at_transition: new_balance,
    });

    state.balance = new_balance;
    state.tier = new_tier;
    let sequence = state.next_sequence;
    state.next_sequence += 1;
    state.history.push_back(LedgerEntry {
        id: EntryId::generate(),
        sequence,
        delta,
        balance_after: new_balance,
        tier_after: new_tier,
        recorded_at: Utc::now(),
    });
    trim_history(state);

    info!(delta, balance = new_balance, tier = %new_tier, "Applied balance delta");
    if let Some(t) = &transition {
        info!(
            from_tier = %t.from_tier,
            to_tier = %t.to_tier,
            balance = new_balance,
            "Tier transition"
        );
    }

    Ok(DeltaOutcome {
        new_balance,
        transition,
    })
}

fn trim_history(state: &mut LedgerState) {
    while state.history.len() > state.history_limit {
        state.history.pop_front();
    }
}
