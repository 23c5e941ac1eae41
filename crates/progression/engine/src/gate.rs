use std::collections::BTreeMap;
use std::sync::Arc;

use progression_types::{
    default_gate_rules, merge_gate_rules, Action, GateDecision, GateRule, PermissionFlag,
    ProgressionError, Tier, TierId, TierTable,
};
use tracing::{debug, warn};

/// Action -> rule table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GateRules {
    rules: BTreeMap<Action, GateRule>,
}

impl GateRules {
    /// A table with no rules; every action is `UnknownAction` until added.
    pub fn empty() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    /// Add or replace the rule for `action`.
    pub fn with_rule(mut self, action: Action, rule: GateRule) -> Self {
        self.rules.insert(action, rule);
        self
    }

    /// Rule for `action`, if one is set.
    pub fn get(&self, action: Action) -> Option<&GateRule> {
        self.rules.get(&action)
    }

    /// Rules in action order.
    pub fn iter(&self) -> impl Iterator<Item = (&Action, &GateRule)> {
        self.rules.iter()
    }

    /// Build from config keys (action names), layered over
    /// [`default_gate_rules`]. Actions the config leaves out keep their
    /// default rule, so every [`Action`] always has one.
    pub fn from_config(rules: &BTreeMap<String, GateRule>) -> Result<Self, ProgressionError> {
        Ok(Self {
            rules: merge_gate_rules(rules)?,
        })
    }
}

impl Default for GateRules {
    fn default() -> Self {
        Self {
            rules: default_gate_rules(),
        }
    }
}

/// Decides whether a tier may perform an action.
///
/// Always answers with a [`GateDecision`] for a known tier and a ruled
/// action; `UnknownTier` / `UnknownAction` mean the table and rules are out
/// of step with the caller.
#[derive(Clone, Debug)]
pub struct ActionGate {
    table: Arc<TierTable>,
    rules: GateRules,
}

impl ActionGate {
    /// Gate over `table` using `rules`.
    pub fn new(table: Arc<TierTable>, rules: GateRules) -> Self {
        Self { table, rules }
    }

    /// The tier table decisions are made against.
    pub fn table(&self) -> &Arc<TierTable> {
        &self.table
    }

    /// The rule set in force.
    pub fn rules(&self) -> &GateRules {
        &self.rules
    }

    /// Allow or deny `action` at `tier`, with a reason and the lowest
    /// allowed tier on denial.
    pub fn can_perform(&self, action: Action, tier: TierId) -> Result<GateDecision, ProgressionError> {
        let current = self
            .table
            .get(tier)
            .ok_or(ProgressionError::UnknownTier(tier))?;
        let rule = self
            .rules
            .get(action)
            .ok_or_else(|| ProgressionError::UnknownAction(action.as_str().to_string()))?;

        let decision = match rule {
            GateRule::MinTier(min) if tier >= *min => GateDecision::allow(),
            GateRule::MinTier(min) => GateDecision::deny(
                format!(
                    "tier too low: {action} requires {}, current tier is {}",
                    self.describe(*min),
                    self.describe(tier)
                ),
                Some(*min),
            ),
            GateRule::Permission(flag) if flag.granted_by(current) => GateDecision::allow(),
            GateRule::Permission(flag) => self.deny_permission(action, *flag, current),
        };

        if decision.allowed {
            debug!(action = %action, tier = %tier, "Gate allowed action");
        } else {
            warn!(
                action = %action,
                tier = %tier,
                required_tier = ?decision.required_tier,
                "Gate denied action"
            );
        }
        Ok(decision)
    }

    /// [`Self::can_perform`], with a denial turned into `PermissionDenied`.
    pub fn require(&self, action: Action, tier: TierId) -> Result<(), ProgressionError> {
        let decision = self.can_perform(action, tier)?;
        if decision.allowed {
            return Ok(());
        }
        Err(ProgressionError::PermissionDenied {
            action,
            reason: decision.reason.unwrap_or_default(),
            required_tier: decision.required_tier,
        })
    }

    /// Gate a comment, then enforce the tier's daily comment limit.
    pub fn can_comment(&self, tier: TierId, used_today: u32) -> Result<GateDecision, ProgressionError> {
        let decision = self.can_perform(Action::Comment, tier)?;
        if !decision.allowed {
            return Ok(decision);
        }

        let quota = self
            .table
            .get(tier)
            .ok_or(ProgressionError::UnknownTier(tier))?
            .daily_comment_limit;
        if quota.allows(used_today) {
            return Ok(decision);
        }

        let next = self
            .table
            .tiers()
            .iter()
            .find(|t| t.id > tier && t.daily_comment_limit.allows(used_today));
        debug!(tier = %tier, used_today, %quota, "Daily comment limit reached");
        Ok(GateDecision::deny(
            format!("daily comment limit reached: {used_today} of {quota} used"),
            next.map(|t| t.id),
        ))
    }

    fn deny_permission(&self, action: Action, flag: PermissionFlag, current: &Tier) -> GateDecision {
        match self.table.lowest_granting(|t| flag.granted_by(t)) {
            Some(lowest) => GateDecision::deny(
                format!(
                    "tier too low: {action} requires the {flag} permission, first granted at {}, current tier is {}",
                    self.describe(lowest.id),
                    self.describe(current.id)
                ),
                Some(lowest.id),
            ),
            None => GateDecision::deny(
                format!("{action} requires the {flag} permission, which no tier grants"),
                None,
            ),
        }
    }

    fn describe(&self, id: TierId) -> String {
        match self.table.get(id) {
            Some(tier) => format!("{id} ({})", tier.label),
            None => id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> ActionGate {
        ActionGate::new(Arc::new(TierTable::canonical()), GateRules::default())
    }

    #[test]
    fn moderation_below_required_tier_is_denied() {
        let decision = gate().can_perform(Action::Moderate, TierId(2)).unwrap();
        assert!(!decision.allowed);
        assert!(decision.reason.unwrap().starts_with("tier too low"));
        assert_eq!(decision.required_tier, Some(TierId(4)));
    }

    #[test]
    fn moderation_at_required_tier_is_allowed() {
        let gate = gate();
        assert!(gate.can_perform(Action::Moderate, TierId(4)).unwrap().allowed);
        assert!(gate.can_perform(Action::Moderate, TierId(5)).unwrap().allowed);
    }

    #[test]
    fn publish_follows_min_tier() {
        let gate = gate();
        let denied = gate.can_perform(Action::Publish, TierId(1)).unwrap();
        assert!(!denied.allowed);
        assert_eq!(denied.required_tier, Some(TierId(2)));
        assert!(denied.reason.unwrap().contains("Contributor"));
        assert!(gate.can_perform(Action::Publish, TierId(2)).unwrap().allowed);
    }

    #[test]
    fn direct_edit_follows_permission_set() {
        let gate = gate();
        assert!(!gate.can_perform(Action::EditDirect, TierId(2)).unwrap().allowed);
        assert!(gate.can_perform(Action::EditDirect, TierId(3)).unwrap().allowed);
    }

    #[test]
    fn unknown_tier_is_an_error() {
        assert_eq!(
            gate().can_perform(Action::Comment, TierId(7)),
            Err(ProgressionError::UnknownTier(TierId(7)))
        );
    }

    #[test]
    fn action_without_rule_is_unknown() {
        let gate = ActionGate::new(
            Arc::new(TierTable::canonical()),
            GateRules::empty().with_rule(Action::Comment, GateRule::MinTier(TierId(1))),
        );
        assert_eq!(
            gate.can_perform(Action::Publish, TierId(5)),
            Err(ProgressionError::UnknownAction("publish".into()))
        );
    }

    #[test]
    fn require_surfaces_permission_denied() {
        let err = gate().require(Action::EditDirect, TierId(1)).unwrap_err();
        match err {
            ProgressionError::PermissionDenied {
                action,
                reason,
                required_tier,
            } => {
                assert_eq!(action, Action::EditDirect);
                assert!(reason.starts_with("tier too low"));
                assert_eq!(required_tier, Some(TierId(3)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        gate().require(Action::EditDirect, TierId(3)).unwrap();
    }

    #[test]
    fn permission_no_tier_grants() {
        let mut tiers = TierTable::canonical().tiers().to_vec();
        for tier in &mut tiers {
            tier.can_moderate = false;
        }
        let gate = ActionGate::new(Arc::new(TierTable::new(tiers).unwrap()), GateRules::default());
        let decision = gate.can_perform(Action::Moderate, TierId(5)).unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.required_tier, None);
    }

    #[test]
    fn comment_quota_is_enforced() {
        let gate = gate();
        assert!(gate.can_comment(TierId(1), 9).unwrap().allowed);

        let denied = gate.can_comment(TierId(1), 10).unwrap();
        assert!(!denied.allowed);
        assert!(denied.reason.unwrap().contains("daily comment limit"));
        assert_eq!(denied.required_tier, Some(TierId(2)));

        assert!(gate.can_comment(TierId(4), 10_000).unwrap().allowed);
    }

    #[test]
    fn partial_config_keeps_default_rules() {
        let mut config = BTreeMap::new();
        config.insert("publish".to_string(), GateRule::MinTier(TierId(1)));
        let rules = GateRules::from_config(&config).unwrap();

        assert_eq!(rules.get(Action::Publish), Some(&GateRule::MinTier(TierId(1))));
        for action in Action::ALL {
            assert!(rules.get(action).is_some(), "no rule for {action}");
        }
        assert_eq!(
            rules.get(Action::Moderate),
            Some(&GateRule::Permission(PermissionFlag::Moderate))
        );
    }

    #[test]
    fn rules_from_config_reject_unknown_names() {
        let mut config = BTreeMap::new();
        config.insert("publish".to_string(), GateRule::MinTier(TierId(1)));
        assert!(GateRules::from_config(&config).is_ok());

        config.insert("levitate".to_string(), GateRule::MinTier(TierId(1)));
        assert_eq!(
            GateRules::from_config(&config),
            Err(ProgressionError::UnknownAction("levitate".into()))
        );
    }
}
