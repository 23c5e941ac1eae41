use std::path::PathBuf;

use thiserror::Error;

use crate::action::Action;
use crate::tier::TierId;

/// Errors from tier resolution, reward math, the balance ledger and the gate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProgressionError {
    // --- Caller input ---
    #[error("invalid balance: {0} (balances are non-negative)")]
    InvalidBalance(i64),

    #[error("invalid reward base: {0} (base amounts must be positive)")]
    InvalidRewardBase(i64),

    // --- Table / enum mismatch ---
    #[error("unknown tier: {0}")]
    UnknownTier(TierId),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("invalid tier table: {0}")]
    InvalidTable(String),

    // --- Ledger ---
    #[error("insufficient balance: debit of {requested} exceeds balance {balance}")]
    InsufficientBalance { balance: u64, requested: u64 },

    #[error("balance overflow: applying {delta} to {balance} exceeds the representable range")]
    BalanceOverflow { balance: u64, delta: i64 },

    #[error("ledger lock poisoned")]
    LockPoisoned,

    // --- Gate ---
    #[error("permission denied for {action}: {reason}")]
    PermissionDenied {
        action: Action,
        reason: String,
        required_tier: Option<TierId>,
    },
}

impl ProgressionError {
    /// Table/enum mismatches and broken locks. Never expected with a
    /// correctly constructed table; callers should treat them as fatal.
    pub fn is_programming_error(&self) -> bool {
        matches!(
            self,
            ProgressionError::UnknownTier(_)
                | ProgressionError::UnknownAction(_)
                | ProgressionError::InvalidTable(_)
                | ProgressionError::LockPoisoned
        )
    }

    /// Expected, user-facing failures the caller should turn into a
    /// corrective message.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ProgressionError::InsufficientBalance { .. }
                | ProgressionError::PermissionDenied { .. }
        )
    }
}

/// Errors raised while loading a [`crate::ProgressionConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(#[from] ProgressionError),
}
