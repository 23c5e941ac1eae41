//! Output formatting for the `progression` binary.

use colored::*;
use progression_engine::{DeltaOutcome, LedgerSnapshot, TierProgress};
use progression_publish::{PipelineState, PublishReceipt};
use progression_types::{Action, GateDecision, PermissionSet, ProgressionError, Tier, TierId};
use serde::Serialize;
use serde_json::json;
use tabled::{Table, Tabled};

/// `resolve` result: where a balance sits and what it unlocks.
#[derive(Debug, Serialize)]
pub struct ResolveView {
    pub progress: TierProgress,
    pub permissions: PermissionSet,
}

/// One replayed delta in `simulate`.
#[derive(Debug, Serialize)]
pub struct SimulationStep {
    pub delta: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<DeltaOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SimulationStep {
    pub fn applied(delta: i64, outcome: DeltaOutcome) -> Self {
        Self {
            delta,
            outcome: Some(outcome),
            error: None,
        }
    }

    pub fn rejected(delta: i64, err: &ProgressionError) -> Self {
        Self {
            delta,
            outcome: None,
            error: Some(err.to_string()),
        }
    }
}

#[derive(Tabled)]
struct TierRow {
    #[tabled(rename = "Tier")]
    id: TierId,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Min balance")]
    min_balance: u64,
    #[tabled(rename = "Multiplier")]
    multiplier: String,
    #[tabled(rename = "Edit")]
    edit: String,
    #[tabled(rename = "Moderate")]
    moderate: String,
    #[tabled(rename = "Comments")]
    comments: String,
    #[tabled(rename = "Events")]
    events: String,
}

impl From<&Tier> for TierRow {
    fn from(tier: &Tier) -> Self {
        Self {
            id: tier.id,
            label: tier.label.clone(),
            min_balance: tier.min_balance,
            multiplier: tier.multiplier.to_string(),
            edit: yes_no(tier.can_edit_directly),
            moderate: yes_no(tier.can_moderate),
            comments: tier.daily_comment_limit.to_string(),
            events: yes_no(tier.can_access_exclusive_events),
        }
    }
}

#[derive(Tabled)]
struct StepRow {
    #[tabled(rename = "Delta")]
    delta: String,
    #[tabled(rename = "Balance")]
    balance: String,
    #[tabled(rename = "Result")]
    result: String,
}

impl From<&SimulationStep> for StepRow {
    fn from(step: &SimulationStep) -> Self {
        let (balance, result) = match (&step.outcome, &step.error) {
            (Some(outcome), _) => {
                let result = match &outcome.transition {
                    Some(t) if t.is_promotion() => format!("promoted {} -> {}", t.from_tier, t.to_tier),
                    Some(t) => format!("demoted {} -> {}", t.from_tier, t.to_tier),
                    None => "ok".to_string(),
                };
                (outcome.new_balance.to_string(), result)
            }
            (None, Some(err)) => ("-".to_string(), format!("rejected: {err}")),
            (None, None) => ("-".to_string(), String::new()),
        };
        Self {
            delta: format!("{:+}", step.delta),
            balance,
            result,
        }
    }
}

fn yes_no(flag: bool) -> String {
    let word = if flag { "yes" } else { "no" };
    word.to_string()
}

/// Text or JSON, chosen once per invocation.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    pub fn tiers(&self, tiers: &[Tier]) -> anyhow::Result<()> {
        if self.json {
            return self.print_json(tiers);
        }
        let rows: Vec<TierRow> = tiers.iter().map(TierRow::from).collect();
        println!("{}", Table::new(rows));
        Ok(())
    }

    pub fn resolve(&self, view: &ResolveView) -> anyhow::Result<()> {
        if self.json {
            return self.print_json(view);
        }
        let progress = &view.progress;
        let permissions = &view.permissions;
        println!("{} {} ({})", "Tier:".bold(), progress.tier, progress.label);
        println!("  Balance: {}", progress.balance);
        match (progress.next_tier, progress.points_to_next) {
            (Some(next), Some(points)) => println!("  Next: {next} in {points} points"),
            _ => println!("  Next: {}", "top tier".dimmed()),
        }
        println!("  Multiplier: {}", permissions.multiplier);
        println!("  Edit directly: {}", yes_no(permissions.can_edit_directly));
        println!("  Moderate: {}", yes_no(permissions.can_moderate));
        println!("  Comments: {}", permissions.daily_comment_limit);
        println!(
            "  Exclusive events: {}",
            yes_no(permissions.can_access_exclusive_events)
        );
        Ok(())
    }

    pub fn reward(&self, base: i64, tier: TierId, credited: u64) -> anyhow::Result<()> {
        if self.json {
            return self.print_json(&json!({
                "base": base,
                "tier": tier,
                "credited": credited,
            }));
        }
        println!("{base} at {tier} credits {credited}");
        Ok(())
    }

    pub fn decision(
        &self,
        action: Action,
        tier: TierId,
        decision: &GateDecision,
    ) -> anyhow::Result<()> {
        if self.json {
            return self.print_json(&json!({
                "action": action,
                "tier": tier,
                "decision": decision,
            }));
        }
        if decision.allowed {
            println!("{} {action} allowed at {tier}", "✓".green());
        } else {
            let reason = decision.reason.as_deref().unwrap_or("denied");
            println!("{} {action} denied at {tier}: {reason}", "✗".red());
            if let Some(required) = decision.required_tier {
                println!("  Requires: {required}");
            }
        }
        Ok(())
    }

    pub fn simulation(
        &self,
        start: u64,
        steps: &[SimulationStep],
        end: &LedgerSnapshot,
    ) -> anyhow::Result<()> {
        if self.json {
            return self.print_json(&json!({
                "start": start,
                "steps": steps,
                "end": end,
            }));
        }
        println!("Start: {start}");
        let rows: Vec<StepRow> = steps.iter().map(StepRow::from).collect();
        println!("{}", Table::new(rows));
        println!("{} {} at {}", "End:".bold(), end.balance, end.tier);
        Ok(())
    }

    pub fn publication(&self, receipt: &PublishReceipt) -> anyhow::Result<()> {
        if self.json {
            return self.print_json(receipt);
        }
        let report = &receipt.report;
        match &report.state {
            PipelineState::Passed => {
                println!(
                    "{} published after {} checks",
                    "✓".green(),
                    report.checks_run.len()
                );
            }
            PipelineState::Failed { check } => {
                let detail = report.failure_detail.as_deref().unwrap_or("rejected");
                println!("{} failed {check}: {detail}", "✗".red());
            }
            PipelineState::PermissionDenied {
                reason,
                required_tier,
            } => {
                println!("{} permission denied: {reason}", "✗".red());
                if let Some(required) = required_tier {
                    println!("  Requires: {required}");
                }
            }
            other => println!("{} unfinished run: {other:?}", "⚠".yellow()),
        }
        if let Some(reward) = &receipt.reward {
            println!(
                "  Credited {} at {} (balance {})",
                reward.credited, reward.tier, reward.outcome.new_balance
            );
            if let Some(t) = &reward.outcome.transition {
                println!("  {} {} -> {}", "Tier changed:".bold(), t.from_tier, t.to_tier);
            }
        }
        Ok(())
    }
}
