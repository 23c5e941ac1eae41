use progression_types::{ProgressionError, RewardKind, RewardSchedule, TierId, TierTable};
use tracing::debug;

/// Points credited for a rewarded action at `tier`:
/// `floor(base_amount * multiplier(tier))`.
///
/// Flooring never awards fractional points and rounds every payout down,
/// so 15 at 1.2x is 18 and 7 at 1.5x is 10.
pub fn calculate_reward(
    table: &TierTable,
    base_amount: i64,
    tier: TierId,
) -> Result<u64, ProgressionError> {
    if base_amount <= 0 {
        return Err(ProgressionError::InvalidRewardBase(base_amount));
    }
    let multiplier = table
        .get(tier)
        .ok_or(ProgressionError::UnknownTier(tier))?
        .multiplier;

    let credited = multiplier.apply_floor(base_amount as u64);
    debug!(base_amount, tier = %tier, %multiplier, credited, "Calculated reward");
    Ok(credited)
}

/// [`calculate_reward`] for a scheduled action kind.
pub fn reward_for(
    table: &TierTable,
    schedule: &RewardSchedule,
    kind: RewardKind,
    tier: TierId,
) -> Result<u64, ProgressionError> {
    let base = schedule.base_for(kind);
    let base = i64::try_from(base).map_err(|_| ProgressionError::InvalidRewardBase(i64::MAX))?;
    calculate_reward(table, base, tier)
}
