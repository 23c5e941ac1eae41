use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProgressionError;
use crate::permissions::PermissionFlag;
use crate::tier::TierId;

/// Something a member wants to do that the gate must approve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    EditDirect,
    Moderate,
    Publish,
    Comment,
}

impl Action {
    pub const ALL: [Action; 4] = [
        Action::EditDirect,
        Action::Moderate,
        Action::Publish,
        Action::Comment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::EditDirect => "edit_direct",
            Action::Moderate => "moderate",
            Action::Publish => "publish",
            Action::Comment => "comment",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ProgressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| ProgressionError::UnknownAction(s.to_string()))
    }
}

/// How the gate decides an action.
///
/// In TOML: `{ min_tier = 2 }` or `{ permission = "moderate" }`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateRule {
    /// Allowed at or above this tier
    MinTier(TierId),
    /// Allowed when the tier's permission set grants the flag
    Permission(PermissionFlag),
}

/// Outcome of asking the gate about an action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateDecision {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Lowest tier that would be allowed, when the action is denied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_tier: Option<TierId>,
}

impl GateDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
            required_tier: None,
        }
    }

    pub fn deny(reason: impl Into<String>, required_tier: Option<TierId>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            required_tier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_action_name() {
        for action in Action::ALL {
            assert_eq!(action.as_str().parse::<Action>().unwrap(), action);
        }
    }

    #[test]
    fn unknown_action_name_is_rejected() {
        let err = "delete_everything".parse::<Action>().unwrap_err();
        assert_eq!(err, ProgressionError::UnknownAction("delete_everything".into()));
    }

    #[test]
    fn gate_rule_serde_shape() {
        let rule: GateRule = serde_json::from_str(r#"{"min_tier":2}"#).unwrap();
        assert_eq!(rule, GateRule::MinTier(TierId(2)));
        let rule: GateRule = serde_json::from_str(r#"{"permission":"moderate"}"#).unwrap();
        assert_eq!(rule, GateRule::Permission(PermissionFlag::Moderate));
    }

    #[test]
    fn allowed_decision_omits_reason() {
        let json = serde_json::to_string(&GateDecision::allow()).unwrap();
        assert_eq!(json, r#"{"allowed":true}"#);
    }
}
