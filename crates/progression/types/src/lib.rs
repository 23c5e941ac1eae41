//! # progression-types
//!
//! Core data for the Role & Reward Progression Engine.
//!
//! A member's point balance maps onto exactly one [`Tier`] of a
//! [`TierTable`]. Each tier carries the capabilities granted at that level
//! (direct editing, moderation, daily comment quota, exclusive events) and
//! the earning [`Multiplier`] applied to rewarded actions.
//!
//! ## Table Invariants
//!
//! - Tier ids strictly increase down the table.
//! - Minimum balances strictly increase, and the first tier starts at 0, so
//!   every non-negative balance resolves to exactly one tier.
//! - Multipliers are positive and stored exactly in basis points.
//!
//! Everything in this crate is plain data: resolution, reward math, the
//! balance ledger and the action gate live in `progression-engine`.

#![deny(unsafe_code)]

pub mod action;
pub mod config;
pub mod error;
pub mod permissions;
pub mod reward;
pub mod tier;

pub use action::{Action, GateDecision, GateRule};
pub use config::{
    default_gate_rules, merge_gate_rules, LedgerConfig, ProgressionConfig, PublicationConfig,
};
pub use error::{ConfigError, ProgressionError};
pub use permissions::{PermissionFlag, PermissionSet};
pub use reward::{RewardKind, RewardSchedule};
pub use tier::{CommentQuota, Multiplier, Tier, TierId, TierTable};
