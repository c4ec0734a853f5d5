//! Configuration types for a ballot run.

use serde::{Deserialize, Serialize};

use crate::{BallotError, Result, constants};

/// Top-level configuration for one ballot run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallotConfig {
    /// Hard cap on the number of rooms handed out.
    pub max_rooms: Option<usize>,
    /// Room-name prefixes marking the desirable category (e.g. hostels).
    pub desirable_prefixes: Vec<String>,
    /// Width names are padded to before anonymisation.
    pub name_width: usize,
    pub cost: CostConfig,
    pub collusion: CollusionConfig,
}

impl Default for BallotConfig {
    fn default() -> Self {
        Self {
            max_rooms: None,
            desirable_prefixes: Vec::new(),
            name_width: constants::NAME_WIDTH,
            cost: CostConfig::default(),
            collusion: CollusionConfig::default(),
        }
    }
}

impl BallotConfig {
    /// Check every section.
    ///
    /// # Errors
    /// Returns `InvalidConfig` describing the first bad value.
    pub fn validate(&self) -> Result<()> {
        if self.name_width == 0 {
            return Err(invalid("name_width must be positive"));
        }
        if self.max_rooms == Some(0) {
            return Err(invalid("max_rooms must be positive when set"));
        }
        if self.desirable_prefixes.iter().any(String::is_empty) {
            return Err(invalid("desirable prefixes must be non-empty"));
        }
        self.cost.validate()?;
        self.collusion.validate()
    }
}

/// The part of a [`BallotConfig`] that decides the allocation. Published
/// alongside the results so anyone can replay the matching.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationParams {
    pub max_rooms: Option<usize>,
    pub desirable_prefixes: Vec<String>,
    pub cost: CostConfig,
}

impl From<&BallotConfig> for AllocationParams {
    fn from(config: &BallotConfig) -> Self {
        Self {
            max_rooms: config.max_rooms,
            desirable_prefixes: config.desirable_prefixes.clone(),
            cost: config.cost,
        }
    }
}

impl AllocationParams {
    /// A configuration that allocates exactly as the one these came from.
    #[must_use]
    pub fn to_config(&self) -> BallotConfig {
        BallotConfig {
            max_rooms: self.max_rooms,
            desirable_prefixes: self.desirable_prefixes.clone(),
            cost: self.cost,
            ..BallotConfig::default()
        }
    }
}

/// Cost model constants. The ordering between them is what matters:
///
/// ```text
/// 0 <= wanted room <= cut < kick_cost <= kick < kick_cost + weight < unwanted_cost
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    pub cut: f64,
    pub unwanted_cost: f64,
    pub kick_cost: f64,
    pub kick_priority_weight: f64,
    pub category_bias: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            cut: constants::DEFAULT_CUT,
            unwanted_cost: constants::DEFAULT_UNWANTED_COST,
            kick_cost: constants::DEFAULT_KICK_COST,
            kick_priority_weight: constants::DEFAULT_KICK_PRIORITY_WEIGHT,
            category_bias: constants::DEFAULT_CATEGORY_BIAS,
        }
    }
}

impl CostConfig {
    /// # Errors
    /// Returns `InvalidConfig` if the values break the cost ordering.
    pub fn validate(&self) -> Result<()> {
        let values = [
            self.cut,
            self.unwanted_cost,
            self.kick_cost,
            self.kick_priority_weight,
            self.category_bias,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(invalid("cost constants must be finite"));
        }
        // atanh(cut) must exist
        if !(self.cut > 0.0 && self.cut < 1.0) {
            return Err(invalid(format!("cut {} must lie in (0, 1)", self.cut)));
        }
        if self.kick_cost <= self.cut {
            return Err(invalid(format!(
                "kick_cost {} must exceed cut {}",
                self.kick_cost, self.cut
            )));
        }
        if self.kick_priority_weight < 0.0 || self.category_bias < 0.0 {
            return Err(invalid("kick_priority_weight and category_bias must be >= 0"));
        }
        if self.kick_cost + self.kick_priority_weight >= self.unwanted_cost {
            return Err(invalid(format!(
                "unwanted_cost {} must exceed the largest kick cost {}",
                self.unwanted_cost,
                self.kick_cost + self.kick_priority_weight
            )));
        }
        Ok(())
    }
}

/// How a preference prefix is compared when grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrefixPolicy {
    /// First `k` choices compared as an unordered set.
    #[default]
    PrefixSet,
    /// First `k` choices compared in order.
    PrefixSequence,
}

/// Collusion scan settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CollusionConfig {
    /// Prefix lengths to scan. Empty disables the prefix scan.
    pub prefix_lengths: Vec<usize>,
    pub policy: PrefixPolicy,
    /// Minimum shared rooms for the pairwise overlap scan. `None` disables it.
    pub overlap_threshold: Option<usize>,
}

impl CollusionConfig {
    /// # Errors
    /// Returns `InvalidConfig` for a zero prefix length or threshold.
    pub fn validate(&self) -> Result<()> {
        if self.prefix_lengths.contains(&0) {
            return Err(invalid("collusion prefix lengths must be positive"));
        }
        if self.overlap_threshold == Some(0) {
            return Err(invalid("overlap_threshold must be positive"));
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> BallotError {
    BallotError::InvalidConfig {
        reason: reason.into(),
    }
}
