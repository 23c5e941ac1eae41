//! # progression-engine
//!
//! Turns a point balance into a tier, a tier into permissions and an
//! earning multiplier, and guards sensitive actions behind a minimum level.
//!
//! ## Flow
//!
//! 1. A rewarded action's base amount goes through [`calculate_reward`]
//!    at the member's current tier (floor of base x multiplier).
//! 2. [`BalanceLedger::apply_delta`] commits the credit and re-resolves the
//!    tier. A changed tier is returned as a [`TierTransition`]; nothing is
//!    recomputed as an ambient side effect.
//! 3. Gated actions (direct editing, moderation, publishing, commenting)
//!    ask [`ActionGate::can_perform`] first.
//!
//! ## Invariants
//!
//! - Resolution is total and monotonic over balances >= 0.
//! - A ledger balance never goes negative; a rejected debit leaves balance,
//!   tier and history untouched.
//! - Each ledger has its own lock. No lock is shared between members.

#![deny(unsafe_code)]

pub mod engine;
pub mod gate;
pub mod ledger;
pub mod registry;
pub mod resolver;
pub mod reward;

pub use engine::{ProgressionEngine, TierProgress};
pub use gate::{ActionGate, GateRules};
pub use ledger::{
    BalanceLedger, DeltaOutcome, EntryId, LedgerEntry, LedgerSnapshot, RewardOutcome,
    TierTransition, DEFAULT_HISTORY_LIMIT,
};
pub use registry::{LedgerRegistry, UserId};
pub use resolver::{resolve_permissions, resolve_tier};
pub use reward::{calculate_reward, reward_for};

pub use progression_types::{
    Action, CommentQuota, ConfigError, GateDecision, GateRule, LedgerConfig, Multiplier,
    PermissionFlag, PermissionSet, ProgressionConfig, ProgressionError, PublicationConfig,
    RewardKind, RewardSchedule, Tier, TierId, TierTable,
};
