use progression_engine::{BalanceLedger, ProgressionEngine, RewardOutcome};
use progression_types::{ProgressionError, PublicationConfig, RewardKind, RewardSchedule};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::draft::ContentDraft;
use crate::pipeline::{PublicationPipeline, PublicationReport};

/// Outcome of a publish attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub report: PublicationReport,
    /// Present only when the draft passed and the author was credited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward: Option<RewardOutcome>,
}

/// Runs the publication pipeline and credits the author on success.
pub struct Publisher {
    pipeline: PublicationPipeline,
    rewards: RewardSchedule,
}

impl Publisher {
    /// Publisher over a prepared pipeline and schedule.
    pub fn new(pipeline: PublicationPipeline, rewards: RewardSchedule) -> Self {
        Self { pipeline, rewards }
    }

    /// Standard pipeline over the engine's gate and reward schedule.
    pub fn from_engine(engine: &ProgressionEngine, config: &PublicationConfig) -> Self {
        Self::new(
            PublicationPipeline::standard(engine.gate().clone(), config),
            engine.rewards().clone(),
        )
    }

    /// The pipeline drafts go through.
    pub fn pipeline(&self) -> &PublicationPipeline {
        &self.pipeline
    }

    /// Run the pipeline at the author's current tier; on `Passed`, credit
    /// the `publish_article` reward to `ledger`.
    ///
    /// Publishing the content itself is the caller's side effect.
    pub fn publish(
        &self,
        draft: &ContentDraft,
        ledger: &BalanceLedger,
    ) -> Result<PublishReceipt, ProgressionError> {
        let tier = ledger.tier()?;
        let report = self.pipeline.run(draft, tier)?;
        if !report.is_passed() {
            return Ok(PublishReceipt {
                report,
                reward: None,
            });
        }

        let base = self.rewards.base_for(RewardKind::PublishArticle);
        let base = i64::try_from(base).map_err(|_| ProgressionError::InvalidRewardBase(i64::MAX))?;
        let reward = ledger.reward(base)?;
        info!(
            tier = %reward.tier,
            credited = reward.credited,
            balance = reward.outcome.new_balance,
            "Publication rewarded"
        );

        Ok(PublishReceipt {
            report,
            reward: Some(reward),
        })
    }
}
