//! Engine configuration, read from TOML.
//!
//! ```toml
//! [[tiers]]
//! id = 1
//! label = "Newcomer"
//! min_balance = 0
//! multiplier = 1.0
//! daily_comment_limit = 10
//!
//! [gate]
//! publish = { min_tier = 1 }
//! moderate = { permission = "moderate" }
//!
//! [rewards]
//! publish_article = 30
//!
//! [publication]
//! max_links = 2
//!
//! [ledger]
//! history_limit = 200
//! ```
//!
//! Every section is optional; missing sections take their defaults.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::action::{Action, GateRule};
use crate::error::{ConfigError, ProgressionError};
use crate::permissions::PermissionFlag;
use crate::reward::RewardSchedule;
use crate::tier::{TierId, TierTable};

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    pub tiers: TierTable,
    /// Gate rules keyed by action name
    pub gate: BTreeMap<String, GateRule>,
    pub rewards: RewardSchedule,
    pub publication: PublicationConfig,
    pub ledger: LedgerConfig,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            tiers: TierTable::canonical(),
            gate: default_gate_rules()
                .into_iter()
                .map(|(action, rule)| (action.as_str().to_string(), rule))
                .collect(),
            rewards: RewardSchedule::default(),
            publication: PublicationConfig::default(),
            ledger: LedgerConfig::default(),
        }
    }
}

impl ProgressionConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: ProgressionConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Load from `path` when given and present, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) if p.exists() => Self::load(p),
            _ => Ok(Self::default()),
        }
    }

    /// Gate rules in force: the `[gate]` entries layered over
    /// [`default_gate_rules`].
    pub fn gate_rules(&self) -> Result<BTreeMap<Action, GateRule>, ProgressionError> {
        merge_gate_rules(&self.gate)
    }

    /// Cross-section checks the deserializer cannot express.
    pub fn validate(&self) -> Result<(), ProgressionError> {
        self.rewards.validate()?;
        for rule in self.gate_rules()?.values() {
            if let GateRule::MinTier(id) = rule {
                if self.tiers.get(*id).is_none() {
                    return Err(ProgressionError::UnknownTier(*id));
                }
            }
        }
        Ok(())
    }
}

/// Layer rules keyed by action name over [`default_gate_rules`], so every
/// [`Action`] keeps a rule. Unknown names are `UnknownAction`.
pub fn merge_gate_rules(
    overrides: &BTreeMap<String, GateRule>,
) -> Result<BTreeMap<Action, GateRule>, ProgressionError> {
    let mut rules = default_gate_rules();
    for (name, rule) in overrides {
        rules.insert(name.parse::<Action>()?, *rule);
    }
    Ok(rules)
}

/// Default gate: anyone may comment, publishing starts at tier 2, editing
/// and moderation follow the permission set.
pub fn default_gate_rules() -> BTreeMap<Action, GateRule> {
    BTreeMap::from([
        (Action::Comment, GateRule::MinTier(TierId(1))),
        (Action::Publish, GateRule::MinTier(TierId(2))),
        (
            Action::EditDirect,
            GateRule::Permission(PermissionFlag::EditDirectly),
        ),
        (Action::Moderate, GateRule::Permission(PermissionFlag::Moderate)),
    ])
}

/// Thresholds for the built-in publication checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicationConfig {
    pub max_title_chars: usize,
    pub min_body_chars: usize,
    pub max_tags: usize,
    pub max_links: usize,
    /// Longest run of one repeated character before it counts as spam
    pub max_repeated_run: usize,
    /// Matched case-insensitively
    pub banned_phrases: Vec<String>,
}

impl Default for PublicationConfig {
    fn default() -> Self {
        Self {
            max_title_chars: 120,
            min_body_chars: 20,
            max_tags: 5,
            max_links: 3,
            max_repeated_run: 12,
            banned_phrases: vec!["buy now".into(), "free money".into(), "click here".into()],
        }
    }
}

/// Per-ledger settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Committed entries kept in memory per ledger; 0 keeps none
    pub history_limit: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            history_limit: 1_000,
        }
    }
}
