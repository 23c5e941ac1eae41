use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProgressionError;

/// User actions that earn points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    PublishArticle,
    PostComment,
    DailyCheckIn,
    AnswerAccepted,
}

impl RewardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardKind::PublishArticle => "publish_article",
            RewardKind::PostComment => "post_comment",
            RewardKind::DailyCheckIn => "daily_check_in",
            RewardKind::AnswerAccepted => "answer_accepted",
        }
    }
}

impl fmt::Display for RewardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base amount credited for each rewarded action, before the tier multiplier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardSchedule {
    pub publish_article: u64,
    pub post_comment: u64,
    pub daily_check_in: u64,
    pub answer_accepted: u64,
}

impl RewardSchedule {
    pub fn base_for(&self, kind: RewardKind) -> u64 {
        match kind {
            RewardKind::PublishArticle => self.publish_article,
            RewardKind::PostComment => self.post_comment,
            RewardKind::DailyCheckIn => self.daily_check_in,
            RewardKind::AnswerAccepted => self.answer_accepted,
        }
    }

    /// Every base amount must be positive.
    pub fn validate(&self) -> Result<(), ProgressionError> {
        if self.publish_article == 0
            || self.post_comment == 0
            || self.daily_check_in == 0
            || self.answer_accepted == 0
        {
            return Err(ProgressionError::InvalidRewardBase(0));
        }
        Ok(())
    }
}

impl Default for RewardSchedule {
    fn default() -> Self {
        Self {
            publish_article: 30,
            post_comment: 5,
            daily_check_in: 10,
            answer_accepted: 15,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_is_valid() {
        let schedule = RewardSchedule::default();
        schedule.validate().unwrap();
        assert_eq!(schedule.base_for(RewardKind::PublishArticle), 30);
        assert_eq!(schedule.base_for(RewardKind::PostComment), 5);
    }

    #[test]
    fn zero_base_is_rejected() {
        let schedule = RewardSchedule {
            daily_check_in: 0,
            ..RewardSchedule::default()
        };
        assert_eq!(
            schedule.validate(),
            Err(ProgressionError::InvalidRewardBase(0))
        );
    }
}
