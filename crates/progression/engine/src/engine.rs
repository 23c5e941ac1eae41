use std::sync::Arc;

use progression_types::{
    Action, GateDecision, PermissionSet, ProgressionConfig, ProgressionError, RewardKind,
    RewardSchedule, TierId, TierTable,
};
use serde::{Deserialize, Serialize};

use crate::gate::{ActionGate, GateRules};
use crate::ledger::{BalanceLedger, DEFAULT_HISTORY_LIMIT};
use crate::registry::LedgerRegistry;
use crate::resolver::{resolve_permissions, resolve_tier};
use crate::reward::{calculate_reward, reward_for};

/// Where a balance sits relative to the next tier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierProgress {
    pub balance: u64,
    pub tier: TierId,
    pub label: String,
    /// `None` at the top tier
    pub next_tier: Option<TierId>,
    pub points_to_next: Option<u64>,
}

/// The tier table, gate and reward schedule behind one handle.
#[derive(Clone, Debug)]
pub struct ProgressionEngine {
    table: Arc<TierTable>,
    gate: ActionGate,
    rewards: RewardSchedule,
    history_limit: usize,
}

impl ProgressionEngine {
    /// Engine over `table` with the given gate rules and reward schedule.
    pub fn new(table: TierTable, rules: GateRules, rewards: RewardSchedule) -> Self {
        let table = Arc::new(table);
        Self {
            gate: ActionGate::new(Arc::clone(&table), rules),
            table,
            rewards,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// History cap for ledgers this engine opens.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Build from a validated configuration.
    pub fn from_config(config: &ProgressionConfig) -> Result<Self, ProgressionError> {
        config.validate()?;
        let rules = GateRules::from_config(&config.gate)?;
        Ok(Self::new(config.tiers.clone(), rules, config.rewards.clone())
            .with_history_limit(config.ledger.history_limit))
    }

    /// The shared tier table.
    pub fn table(&self) -> &Arc<TierTable> {
        &self.table
    }

    /// The action gate.
    pub fn gate(&self) -> &ActionGate {
        &self.gate
    }

    /// Base amounts per rewarded action.
    pub fn rewards(&self) -> &RewardSchedule {
        &self.rewards
    }

    /// See [`resolve_tier`].
    pub fn resolve_tier(&self, balance: i64) -> Result<TierId, ProgressionError> {
        resolve_tier(&self.table, balance)
    }

    /// See [`resolve_permissions`].
    pub fn resolve_permissions(&self, tier: TierId) -> Result<PermissionSet, ProgressionError> {
        resolve_permissions(&self.table, tier)
    }

    /// See [`calculate_reward`].
    pub fn calculate_reward(&self, base_amount: i64, tier: TierId) -> Result<u64, ProgressionError> {
        calculate_reward(&self.table, base_amount, tier)
    }

    /// Reward for `kind` at `tier`, using this engine's schedule.
    pub fn reward_for(&self, kind: RewardKind, tier: TierId) -> Result<u64, ProgressionError> {
        reward_for(&self.table, &self.rewards, kind, tier)
    }

    /// See [`ActionGate::can_perform`].
    pub fn can_perform(&self, action: Action, tier: TierId) -> Result<GateDecision, ProgressionError> {
        self.gate.can_perform(action, tier)
    }

    /// Tier of `balance` and how far it is from the next one.
    pub fn progress(&self, balance: i64) -> Result<TierProgress, ProgressionError> {
        let tier_id = resolve_tier(&self.table, balance)?;
        let balance = balance as u64;
        let tier = self
            .table
            .get(tier_id)
            .ok_or(ProgressionError::UnknownTier(tier_id))?;
        let next = self.table.next_after(tier_id);
        Ok(TierProgress {
            balance,
            tier: tier_id,
            label: tier.label.clone(),
            next_tier: next.map(|t| t.id),
            points_to_next: next.map(|t| t.min_balance - balance),
        })
    }

    /// A new ledger over this engine's table.
    pub fn open_ledger(&self, opening_balance: u64) -> BalanceLedger {
        BalanceLedger::with_balance(Arc::clone(&self.table), opening_balance)
            .with_history_limit(self.history_limit)
    }

    /// An empty per-member ledger registry over this engine's table.
    pub fn registry(&self) -> LedgerRegistry {
        LedgerRegistry::new(Arc::clone(&self.table)).with_history_limit(self.history_limit)
    }
}

impl Default for ProgressionEngine {
    fn default() -> Self {
        Self::new(
            TierTable::canonical(),
            GateRules::default(),
            RewardSchedule::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::UserId;

    #[test]
    fn progress_reports_points_to_next_tier() {
        let engine = ProgressionEngine::default();
        let progress = engine.progress(420).unwrap();
        assert_eq!(progress.tier, TierId(2));
        assert_eq!(progress.label, "Contributor");
        assert_eq!(progress.next_tier, Some(TierId(3)));
        assert_eq!(progress.points_to_next, Some(80));
    }

    #[test]
    fn progress_at_top_tier_has_no_next() {
        let progress = ProgressionEngine::default().progress(9_000).unwrap();
        assert_eq!(progress.tier, TierId(5));
        assert_eq!(progress.next_tier, None);
        assert_eq!(progress.points_to_next, None);
    }

    #[test]
    fn progress_rejects_negative_balance() {
        assert_eq!(
            ProgressionEngine::default().progress(-3),
            Err(ProgressionError::InvalidBalance(-3))
        );
    }

    #[test]
    fn from_config_overrides_only_listed_rules() {
        let config = ProgressionConfig::from_toml_str(
            r#"
            [gate]
            publish = { min_tier = 1 }
            "#,
        )
        .unwrap();
        let engine = ProgressionEngine::from_config(&config).unwrap();
        assert!(engine.can_perform(Action::Publish, TierId(1)).unwrap().allowed);

        // Unlisted actions keep answering with a decision
        let moderate = engine.can_perform(Action::Moderate, TierId(1)).unwrap();
        assert!(!moderate.allowed);
        assert_eq!(moderate.required_tier, Some(TierId(4)));
        assert!(engine.can_perform(Action::Moderate, TierId(4)).unwrap().allowed);
        for action in Action::ALL {
            assert!(engine.can_perform(action, TierId(5)).is_ok());
        }
    }

    #[test]
    fn config_history_limit_reaches_ledgers() {
        let config = ProgressionConfig::from_toml_str("[ledger]\nhistory_limit = 4\n").unwrap();
        let engine = ProgressionEngine::from_config(&config).unwrap();
        assert_eq!(engine.open_ledger(0).history_limit().unwrap(), 4);

        let registry = engine.registry();
        let ledger = registry.ledger_for(&UserId::new("gina")).unwrap();
        assert_eq!(ledger.history_limit().unwrap(), 4);
    }

    #[test]
    fn opened_ledger_shares_table() {
        let engine = ProgressionEngine::default();
        let ledger = engine.open_ledger(90);
        let credit = engine
            .reward_for(RewardKind::DailyCheckIn, TierId(1))
            .unwrap();
        let outcome = ledger.apply_delta(credit as i64).unwrap();
        assert_eq!(outcome.new_balance, 100);
        assert_eq!(outcome.transition.unwrap().to_tier, TierId(2));
    }
}
