use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tier::{CommentQuota, Multiplier, Tier};

/// Capabilities derived from a tier. Computed on demand, never stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    pub can_edit_directly: bool,
    pub can_moderate: bool,
    pub daily_comment_limit: CommentQuota,
    pub multiplier: Multiplier,
    pub can_access_exclusive_events: bool,
}

impl PermissionSet {
    pub fn grants(&self, flag: PermissionFlag) -> bool {
        match flag {
            PermissionFlag::EditDirectly => self.can_edit_directly,
            PermissionFlag::Moderate => self.can_moderate,
            PermissionFlag::ExclusiveEvents => self.can_access_exclusive_events,
        }
    }
}

impl From<&Tier> for PermissionSet {
    fn from(tier: &Tier) -> Self {
        Self {
            can_edit_directly: tier.can_edit_directly,
            can_moderate: tier.can_moderate,
            daily_comment_limit: tier.daily_comment_limit,
            multiplier: tier.multiplier,
            can_access_exclusive_events: tier.can_access_exclusive_events,
        }
    }
}

/// A boolean capability of a [`PermissionSet`], usable as a gate rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionFlag {
    EditDirectly,
    Moderate,
    ExclusiveEvents,
}

impl PermissionFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionFlag::EditDirectly => "edit_directly",
            PermissionFlag::Moderate => "moderate",
            PermissionFlag::ExclusiveEvents => "exclusive_events",
        }
    }

    pub fn granted_by(&self, tier: &Tier) -> bool {
        PermissionSet::from(tier).grants(*self)
    }
}

impl fmt::Display for PermissionFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
