use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ProgressionError;

/// Tier identifier. Higher ids are higher tiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierId(pub u32);

impl fmt::Display for TierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tier{}", self.0)
    }
}

/// Earning multiplier, held exactly in basis points (10 000 = 1.0x).
///
/// Config files and serialized output use the decimal form (`1.5`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Multiplier {
    basis_points: u32,
}

impl Multiplier {
    /// Basis points per 1.0x.
    pub const SCALE: u32 = 10_000;

    pub const ONE: Multiplier = Multiplier {
        basis_points: Self::SCALE,
    };

    pub fn from_basis_points(basis_points: u32) -> Result<Self, ProgressionError> {
        if basis_points == 0 {
            return Err(ProgressionError::InvalidTable(
                "multiplier must be positive".into(),
            ));
        }
        Ok(Self { basis_points })
    }

    /// Convert a decimal multiplier, rounding to the nearest basis point.
    pub fn from_f64(value: f64) -> Result<Self, ProgressionError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(ProgressionError::InvalidTable(format!(
                "multiplier must be a positive number, got {value}"
            )));
        }
        let scaled = (value * Self::SCALE as f64).round();
        if scaled < 1.0 || scaled > u32::MAX as f64 {
            return Err(ProgressionError::InvalidTable(format!(
                "multiplier {value} is out of range"
            )));
        }
        Self::from_basis_points(scaled as u32)
    }

    /// Exact value in basis points.
    pub fn basis_points(&self) -> u32 {
        self.basis_points
    }

    pub fn as_f64(&self) -> f64 {
        self.basis_points as f64 / Self::SCALE as f64
    }

    /// `floor(amount * self)`, saturating at `u64::MAX`.
    pub fn apply_floor(&self, amount: u64) -> u64 {
        let scaled = amount as u128 * self.basis_points as u128 / Self::SCALE as u128;
        u64::try_from(scaled).unwrap_or(u64::MAX)
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.basis_points / Self::SCALE;
        let frac = self.basis_points % Self::SCALE;
        if frac == 0 {
            write!(f, "{whole}.0x")
        } else {
            let digits = format!("{frac:04}");
            write!(f, "{whole}.{}x", digits.trim_end_matches('0'))
        }
    }
}

impl Serialize for Multiplier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Multiplier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Multiplier::from_f64(value).map_err(serde::de::Error::custom)
    }
}

/// Daily comment allowance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuotaRepr", into = "QuotaRepr")]
pub enum CommentQuota {
    Limited(u32),
    Unlimited,
}

impl CommentQuota {
    /// Whether one more comment fits after `used_today` comments.
    pub fn allows(&self, used_today: u32) -> bool {
        match self {
            CommentQuota::Limited(limit) => used_today < *limit,
            CommentQuota::Unlimited => true,
        }
    }
}

impl fmt::Display for CommentQuota {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommentQuota::Limited(limit) => write!(f, "{limit}/day"),
            CommentQuota::Unlimited => write!(f, "unlimited"),
        }
    }
}

/// Wire form of [`CommentQuota`]: a count, or the word `"unlimited"`.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum QuotaRepr {
    Count(u32),
    Word(String),
}

impl From<CommentQuota> for QuotaRepr {
    fn from(quota: CommentQuota) -> Self {
        match quota {
            CommentQuota::Limited(limit) => QuotaRepr::Count(limit),
            CommentQuota::Unlimited => QuotaRepr::Word("unlimited".into()),
        }
    }
}

impl TryFrom<QuotaRepr> for CommentQuota {
    type Error = String;

    fn try_from(repr: QuotaRepr) -> Result<Self, Self::Error> {
        match repr {
            QuotaRepr::Count(limit) => Ok(CommentQuota::Limited(limit)),
            QuotaRepr::Word(word) if word.eq_ignore_ascii_case("unlimited") => {
                Ok(CommentQuota::Unlimited)
            }
            QuotaRepr::Word(word) => Err(format!(
                "comment limit must be a count or \"unlimited\", got {word:?}"
            )),
        }
    }
}

/// One membership level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    pub id: TierId,
    pub label: String,
    /// Smallest balance that unlocks this tier
    pub min_balance: u64,
    pub multiplier: Multiplier,
    #[serde(default)]
    pub can_edit_directly: bool,
    #[serde(default)]
    pub can_moderate: bool,
    pub daily_comment_limit: CommentQuota,
    #[serde(default)]
    pub can_access_exclusive_events: bool,
}

/// Ordered, gap-free list of tiers.
///
/// Construction through [`TierTable::new`] (or deserialization) validates
/// the table, so every balance >= 0 maps to exactly one tier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Tier>", into = "Vec<Tier>")]
pub struct TierTable {
    tiers: Vec<Tier>,
}

impl TierTable {
    /// Validate and wrap `tiers`, lowest first.
    pub fn new(tiers: Vec<Tier>) -> Result<Self, ProgressionError> {
        let first = tiers
            .first()
            .ok_or_else(|| ProgressionError::InvalidTable("table has no tiers".into()))?;

        if first.id == TierId(0) {
            return Err(ProgressionError::InvalidTable(
                "tier ids must be positive, first tier is tier0".into(),
            ));
        }

        if first.min_balance != 0 {
            return Err(ProgressionError::InvalidTable(format!(
                "first tier {} must start at balance 0, starts at {}",
                first.id, first.min_balance
            )));
        }

        for pair in tiers.windows(2) {
            let (lower, upper) = (&pair[0], &pair[1]);
            if upper.id <= lower.id {
                return Err(ProgressionError::InvalidTable(format!(
                    "tier ids must strictly increase: {} follows {}",
                    upper.id, lower.id
                )));
            }
            if upper.min_balance <= lower.min_balance {
                return Err(ProgressionError::InvalidTable(format!(
                    "minimum balances must strictly increase: {} ({}) follows {} ({})",
                    upper.id, upper.min_balance, lower.id, lower.min_balance
                )));
            }
        }

        Ok(Self { tiers })
    }

    /// The canonical 100 / 500 / 1500 / 5000 table.
    pub fn canonical() -> Self {
        let tier = |id: u32,
                    label: &str,
                    min_balance: u64,
                    basis_points: u32,
                    caps: (bool, bool, bool),
                    comments: CommentQuota| Tier {
            id: TierId(id),
            label: label.into(),
            min_balance,
            multiplier: Multiplier { basis_points },
            can_edit_directly: caps.0,
            can_moderate: caps.1,
            daily_comment_limit: comments,
            can_access_exclusive_events: caps.2,
        };

        Self {
            tiers: vec![
                tier(1, "Newcomer", 0, 10_000, (false, false, false), CommentQuota::Limited(10)),
                tier(2, "Contributor", 100, 12_000, (false, false, false), CommentQuota::Limited(30)),
                tier(3, "Editor", 500, 15_000, (true, false, false), CommentQuota::Limited(100)),
                tier(4, "Moderator", 1_500, 20_000, (true, true, true), CommentQuota::Unlimited),
                tier(5, "Ambassador", 5_000, 30_000, (true, true, true), CommentQuota::Unlimited),
            ],
        }
    }

    /// All tiers, lowest first.
    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    /// Number of tiers.
    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    /// Always false for a constructed table.
    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Look up a tier by id.
    pub fn get(&self, id: TierId) -> Option<&Tier> {
        self.tiers
            .binary_search_by_key(&id, |t| t.id)
            .ok()
            .map(|idx| &self.tiers[idx])
    }

    /// Highest tier whose minimum balance is <= `balance`.
    pub fn tier_for_balance(&self, balance: u64) -> &Tier {
        let above = self.tiers.partition_point(|t| t.min_balance <= balance);
        // The first tier starts at 0, so `above` is at least 1.
        &self.tiers[above.saturating_sub(1)]
    }

    /// The entry tier, starting at balance 0.
    pub fn base(&self) -> &Tier {
        &self.tiers[0]
    }

    /// The highest tier.
    pub fn top(&self) -> &Tier {
        &self.tiers[self.tiers.len() - 1]
    }

    /// The tier directly above `id`, if any.
    pub fn next_after(&self, id: TierId) -> Option<&Tier> {
        self.tiers.iter().find(|t| t.id > id)
    }

    /// Lowest tier satisfying `grants`.
    pub fn lowest_granting(&self, grants: impl Fn(&Tier) -> bool) -> Option<&Tier> {
        self.tiers.iter().find(|t| grants(t))
    }
}

impl Default for TierTable {
    fn default() -> Self {
        Self::canonical()
    }
}

impl TryFrom<Vec<Tier>> for TierTable {
    type Error = ProgressionError;

    fn try_from(tiers: Vec<Tier>) -> Result<Self, Self::Error> {
        Self::new(tiers)
    }
}

impl From<TierTable> for Vec<Tier> {
    fn from(table: TierTable) -> Self {
        table.tiers
    }
}
