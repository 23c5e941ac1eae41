use progression_engine::ActionGate;
use progression_types::{Action, ProgressionError, PublicationConfig, TierId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::check::{CheckVerdict, PublicationCheck};
use crate::checks::{EmptyFieldCheck, LengthCheck, SpamCheck, TagLimitCheck};
use crate::draft::ContentDraft;

/// Lifecycle of one pipeline run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineState {
    NotStarted,
    Running,
    Passed,
    /// The named check was the first to fail
    Failed { check: String },
    /// The gate refused `publish`; no check ran
    PermissionDenied {
        reason: String,
        required_tier: Option<TierId>,
    },
}

impl PipelineState {
    /// Whether the run has finished.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PipelineState::NotStarted | PipelineState::Running)
    }
}

/// What a finished run reports back to the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationReport {
    pub state: PipelineState,
    /// Names of the checks that were evaluated, in order
    pub checks_run: Vec<String>,
    /// Why the failing check rejected the draft
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_detail: Option<String>,
}

impl PublicationReport {
    /// True when every check passed.
    pub fn is_passed(&self) -> bool {
        self.state == PipelineState::Passed
    }

    /// Name of the first failing check, if any.
    pub fn failed_check(&self) -> Option<&str> {
        match &self.state {
            PipelineState::Failed { check } => Some(check),
            _ => None,
        }
    }
}

/// Progress of a run in flight. Only ever moves forward.
struct PipelineRun {
    state: PipelineState,
    checks_run: Vec<String>,
    failure_detail: Option<String>,
}

impl PipelineRun {
    fn new() -> Self {
        Self {
            state: PipelineState::NotStarted,
            checks_run: Vec::new(),
            failure_detail: None,
        }
    }

    fn transition(&mut self, next: PipelineState) {
        debug_assert!(
            !self.state.is_terminal(),
            "pipeline run already finished as {:?}",
            self.state
        );
        self.state = next;
    }

    fn finish(self) -> PublicationReport {
        PublicationReport {
            state: self.state,
            checks_run: self.checks_run,
            failure_detail: self.failure_detail,
        }
    }
}

/// Gate, then ordered checks, stopping at the first failure.
pub struct PublicationPipeline {
    gate: ActionGate,
    checks: Vec<Box<dyn PublicationCheck>>,
}

impl PublicationPipeline {
    /// A pipeline with no checks; it passes whatever the gate admits.
    pub fn new(gate: ActionGate) -> Self {
        Self {
            gate,
            checks: Vec::new(),
        }
    }

    /// Built-in checks: empty field, length, tag limit, spam.
    pub fn standard(gate: ActionGate, config: &PublicationConfig) -> Self {
        Self::new(gate)
            .with_check(EmptyFieldCheck)
            .with_check(LengthCheck::from_config(config))
            .with_check(TagLimitCheck {
                max_tags: config.max_tags,
            })
            .with_check(SpamCheck::from_config(config))
    }

    /// Append a check. Checks run in the order they were added.
    pub fn add_check(&mut self, check: Box<dyn PublicationCheck>) {
        self.checks.push(check);
    }

    pub fn with_check(mut self, check: impl PublicationCheck + 'static) -> Self {
        self.add_check(Box::new(check));
        self
    }

    /// Check names in run order.
    pub fn check_names(&self) -> Vec<&str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    /// The gate asked before any check.
    pub fn gate(&self) -> &ActionGate {
        &self.gate
    }

    /// Run a fresh pass over `draft` for an author at `tier`.
    ///
    /// `Err` only for table/rule mismatches; gate refusals and check
    /// failures are reported in the returned [`PublicationReport`].
    pub fn run(
        &self,
        draft: &ContentDraft,
        tier: TierId,
    ) -> Result<PublicationReport, ProgressionError> {
        let mut run = PipelineRun::new();

        let decision = self.gate.can_perform(Action::Publish, tier)?;
        if !decision.allowed {
            let reason = decision.reason.unwrap_or_default();
            warn!(tier = %tier, reason = %reason, "Publication refused by gate");
            run.transition(PipelineState::PermissionDenied {
                reason,
                required_tier: decision.required_tier,
            });
            return Ok(run.finish());
        }

        run.transition(PipelineState::Running);

        for check in &self.checks {
            let name = check.name();
            debug!(check = name, "Evaluating publication check");
            run.checks_run.push(name.to_string());

            match check.evaluate(draft) {
                CheckVerdict::Pass => {
                    debug!(check = name, "Check passed");
                }
                CheckVerdict::Fail { detail } => {
                    warn!(check = name, detail = %detail, "Check failed");
                    run.failure_detail = Some(detail);
                    run.transition(PipelineState::Failed {
                        check: name.to_string(),
                    });
                    return Ok(run.finish());
                }
            }
        }

        run.transition(PipelineState::Passed);
        info!(
            tier = %tier,
            checks = run.checks_run.len(),
            "Draft passed publication checks"
        );
        Ok(run.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::check_fn;
    use progression_engine::GateRules;
    use progression_types::TierTable;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn gate() -> ActionGate {
        ActionGate::new(Arc::new(TierTable::canonical()), GateRules::default())
    }

    fn counting_check(name: &'static str, result: bool, counter: Arc<AtomicUsize>) -> impl PublicationCheck {
        check_fn(name, move |_: &ContentDraft| {
            counter.fetch_add(1, Ordering::SeqCst);
            result
        })
    }

    fn good_draft() -> ContentDraft {
        ContentDraft::new(
            "Community garden update",
            "Tomatoes are in, and the new compost bins arrive on Friday.",
        )
        .with_tag("garden")
    }

    #[test]
    fn first_failure_short_circuits() {
        let second = Arc::new(AtomicUsize::new(0));
        let pipeline = PublicationPipeline::new(gate())
            .with_check(check_fn("first", |_: &ContentDraft| false))
            .with_check(counting_check("second", true, Arc::clone(&second)));

        let report = pipeline.run(&good_draft(), TierId(2)).unwrap();
        assert_eq!(report.failed_check(), Some("first"));
        assert_eq!(report.checks_run, vec!["first".to_string()]);
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn gate_denial_runs_no_checks() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pipeline = PublicationPipeline::new(gate())
            .with_check(counting_check("any", true, Arc::clone(&counter)));

        let report = pipeline.run(&good_draft(), TierId(1)).unwrap();
        match &report.state {
            PipelineState::PermissionDenied {
                reason,
                required_tier,
            } => {
                assert!(reason.starts_with("tier too low"));
                assert_eq!(*required_tier, Some(TierId(2)));
            }
            other => panic!("unexpected state: {other:?}"),
        }
        assert!(report.checks_run.is_empty());
        assert!(report.failed_check().is_none());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn all_checks_pass() {
        let counter = Arc::new(AtomicUsize::new(0));
        let pipeline = PublicationPipeline::new(gate())
            .with_check(counting_check("one", true, Arc::clone(&counter)))
            .with_check(counting_check("two", true, Arc::clone(&counter)));

        let report = pipeline.run(&good_draft(), TierId(3)).unwrap();
        assert!(report.is_passed());
        assert_eq!(report.checks_run.len(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert!(report.state.is_terminal());
    }

    #[test]
    fn empty_field_reported_before_spam() {
        let pipeline = PublicationPipeline::standard(gate(), &PublicationConfig::default());
        let draft = ContentDraft::new("", "buy now buy now buy now buy now");

        let report = pipeline.run(&draft, TierId(2)).unwrap();
        assert_eq!(report.failed_check(), Some("empty field check"));
        assert_eq!(report.failure_detail.as_deref(), Some("title is empty"));
    }

    #[test]
    fn standard_check_order() {
        let pipeline = PublicationPipeline::standard(gate(), &PublicationConfig::default());
        assert_eq!(
            pipeline.check_names(),
            vec!["empty field check", "length check", "tag limit check", "spam check"]
        );
    }

    #[test]
    fn standard_pipeline_passes_clean_draft() {
        let pipeline = PublicationPipeline::standard(gate(), &PublicationConfig::default());
        assert!(pipeline.run(&good_draft(), TierId(2)).unwrap().is_passed());
    }

    #[test]
    fn rerun_after_edit_starts_fresh() {
        let pipeline = PublicationPipeline::standard(gate(), &PublicationConfig::default());
        let mut draft = good_draft();
        draft.body = "Free money for everyone who signs up today!".into();

        let first = pipeline.run(&draft, TierId(2)).unwrap();
        assert_eq!(first.failed_check(), Some("spam check"));

        draft.body = "Plot sign-ups open today for everyone in the building.".into();
        let second = pipeline.run(&draft, TierId(2)).unwrap();
        assert!(second.is_passed());
        assert_eq!(second.checks_run.len(), 4);
    }

    #[test]
    fn unknown_tier_is_an_error() {
        let pipeline = PublicationPipeline::new(gate());
        assert_eq!(
            pipeline.run(&good_draft(), TierId(99)),
            Err(ProgressionError::UnknownTier(TierId(99)))
        );
    }

    #[test]
    fn report_serializes_with_status_tag() {
        let report = PublicationReport {
            state: PipelineState::Failed {
                check: "spam check".into(),
            },
            checks_run: vec!["spam check".into()],
            failure_detail: Some("2 links".into()),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["state"]["status"], "failed");
        assert_eq!(json["state"]["check"], "spam check");
    }
}
