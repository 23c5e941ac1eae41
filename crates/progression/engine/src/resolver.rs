use progression_types::{PermissionSet, ProgressionError, TierId, TierTable};
use tracing::debug;

/// Id of the highest tier whose minimum balance is <= `balance`.
///
/// Balances above the top threshold map to the top tier. A negative balance
/// is a caller bug and fails with `InvalidBalance`.
pub fn resolve_tier(table: &TierTable, balance: i64) -> Result<TierId, ProgressionError> {
    let balance = u64::try_from(balance).map_err(|_| ProgressionError::InvalidBalance(balance))?;
    let tier = table.tier_for_balance(balance);
    debug!(balance, tier = %tier.id, "Resolved tier");
    Ok(tier.id)
}

/// Permission set of a tier, read straight from the table.
pub fn resolve_permissions(
    table: &TierTable,
    tier: TierId,
) -> Result<PermissionSet, ProgressionError> {
    table
        .get(tier)
        .map(PermissionSet::from)
        .ok_or(ProgressionError::UnknownTier(tier))
}
