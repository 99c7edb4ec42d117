//! Category scoring engine.
//!
//! Scores a [`RatingVector`] against every known category rule and picks one
//! primary category plus up to two close runners-up.

use crate::rating::RatingVector;
use crate::rules::{BuiltinCategory, CategoryId, CategoryRule, CategoryRuleSet};
use log::trace;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Added to the tolerance when converting distance to score, so a match on the
/// edge of a range still scores below a match in its center.
pub const SCORE_PADDING: f64 = 1.0;
/// Runner-up categories need at least this fraction of the primary score.
pub const SECONDARY_THRESHOLD: f64 = 0.65;
pub const MAX_SECONDARY: usize = 2;

/// Tolerance mode for rule matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Only the `min..=max` range counts.
    #[default]
    Precise,
    /// Each constraint's gradient widens the accepted range.
    Ballpark,
}

impl FilterMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            FilterMode::Precise => "precise",
            FilterMode::Ballpark => "ballpark",
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for FilterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "precise" => Ok(FilterMode::Precise),
            "ballpark" => Ok(FilterMode::Ballpark),
            other => Err(format!("unknown filter mode \"{other}\" (expected precise or ballpark)")),
        }
    }
}

/// Score of one candidate category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScore {
    pub category_id: CategoryId,
    pub score: f64,
}

/// Result of [`derive_categories`].
///
/// `primary` never appears in `secondary`; `secondary` is ordered by
/// descending score and holds at most [`MAX_SECONDARY`] entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedCategories {
    pub primary: CategoryId,
    pub secondary: Vec<CategoryId>,
    /// Every category that scored above zero, best first.
    pub scores: Vec<CategoryScore>,
}

impl DerivedCategories {
    #[must_use]
    pub fn unmatched() -> Self {
        Self { primary: CategoryId::UNMATCHED, secondary: Vec::new(), scores: Vec::new() }
    }

    #[must_use]
    pub fn is_unmatched(&self) -> bool {
        self.primary.is_unmatched()
    }

    /// Score recorded for `id`, or 0 when it did not match.
    #[must_use]
    pub fn score_of(&self, id: &CategoryId) -> f64 {
        self.scores.iter().find(|s| &s.category_id == id).map_or(0.0, |s| s.score)
    }
}

/// Score a single rule against a vector, in `[0, 1]`.
///
/// ```text
/// mid      = (min + max) / 2
/// maxDist  = (max - min) / 2 (+ gradient in ballpark mode)
/// dist     = |value - mid|
/// dimScore = 1 - dist / (maxDist + 1)     (0 for the whole rule if dist > maxDist)
/// score    = mean(dimScore)
/// ```
///
/// A rule with no constraints scores 0.
///
/// # Examples
///
/// ```
/// use soundsig::algorithm::{score_rule, FilterMode};
/// use soundsig::rating::{Dimension, RatingVector};
/// use soundsig::rules::{CategoryRule, Constraint};
///
/// let vector = RatingVector::from_values([5, 3, 3, 3, 3, 3]).unwrap();
/// let rule = CategoryRule::new().with(Dimension::BassPresence, Constraint::exact(5).unwrap());
/// assert_eq!(score_rule(&vector, &rule, FilterMode::Precise), 1.0);
/// ```
#[must_use]
pub fn score_rule(vector: &RatingVector, rule: &CategoryRule, mode: FilterMode) -> f64 {
    if rule.is_empty() {
        return 0.0;
    }

    let mut total = 0.0;
    for (dimension, constraint) in rule.iter() {
        let value = f64::from(vector.value(dimension));
        let min = f64::from(constraint.min());
        let max = f64::from(constraint.max());

        let mid = (min + max) / 2.0;
        let half_width = (max - min) / 2.0;
        let max_dist = match mode {
            FilterMode::Precise => half_width,
            FilterMode::Ballpark => half_width + f64::from(constraint.gradient()),
        };
        let dist = (value - mid).abs();

        if dist > max_dist {
            return 0.0;
        }

        total += if max_dist == 0.0 { 1.0 } else { 1.0 - dist / (max_dist + SCORE_PADDING) };
    }

    #[allow(clippy::cast_precision_loss)]
    let count = rule.len() as f64;
    total / count
}

/// Candidate order: built-in priority list, then custom ids as given. Each
/// category appears once; built-in ids passed as custom are ignored.
fn candidates(custom_ids: &[CategoryId]) -> impl Iterator<Item = CategoryId> + '_ {
    let mut seen: Vec<&CategoryId> = Vec::new();
    let customs = custom_ids.iter().filter(move |id| {
        if id.builtin().is_some() || seen.contains(id) {
            return false;
        }
        seen.push(*id);
        true
    });
    BuiltinCategory::PRIORITY.into_iter().map(CategoryId::from).chain(customs.cloned())
}

/// Derive primary and secondary categories for a vector.
///
/// Candidates are scored in priority order and stably sorted by score, so ties
/// go to the built-in that appears first in [`BuiltinCategory::PRIORITY`] and
/// then to custom ids in caller order. Candidates without a rule in `rules`
/// are skipped.
///
/// # Examples
///
/// ```
/// use soundsig::algorithm::{derive_categories, FilterMode};
/// use soundsig::rating::RatingVector;
/// use soundsig::rules::{default_rules, BuiltinCategory};
///
/// let vector: RatingVector = "5,2,5,3,3,3".parse().unwrap();
/// let derived = derive_categories(&vector, &default_rules(), FilterMode::Precise, &[]);
/// assert_eq!(derived.primary, BuiltinCategory::VShaped.into());
/// ```
#[must_use]
pub fn derive_categories(
    vector: &RatingVector,
    rules: &CategoryRuleSet,
    mode: FilterMode,
    custom_ids: &[CategoryId],
) -> DerivedCategories {
    let mut scores: Vec<CategoryScore> = candidates(custom_ids)
        .filter_map(|id| {
            let rule = rules.get(&id)?;
            let score = score_rule(vector, rule, mode);
            (score > 0.0).then_some(CategoryScore { category_id: id, score })
        })
        .collect();

    // Stable: equal scores keep candidate order.
    scores.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let Some(top) = scores.first() else {
        trace!("{vector} matched no category ({mode})");
        return DerivedCategories::unmatched();
    };

    let primary = top.category_id.clone();
    let threshold = top.score * SECONDARY_THRESHOLD;
    let secondary: Vec<CategoryId> = scores
        .iter()
        .skip(1)
        .filter(|s| s.score >= threshold)
        .take(MAX_SECONDARY)
        .map(|s| s.category_id.clone())
        .collect();

    trace!("{vector} -> {primary} (secondary: {secondary:?}, {mode})");
    DerivedCategories { primary, secondary, scores }
}

/// Primary category only.
#[must_use]
pub fn derive_category(
    vector: &RatingVector,
    rules: &CategoryRuleSet,
    mode: FilterMode,
    custom_ids: &[CategoryId],
) -> CategoryId {
    derive_categories(vector, rules, mode, custom_ids).primary
}

/// Everything the engine needs besides the vector itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringContext {
    pub rules: CategoryRuleSet,
    pub mode: FilterMode,
    pub custom_ids: Vec<CategoryId>,
}

impl Default for ScoringContext {
    fn default() -> Self {
        Self { rules: CategoryRuleSet::default(), mode: FilterMode::Precise, custom_ids: Vec::new() }
    }
}

impl ScoringContext {
    #[must_use]
    pub fn new(rules: CategoryRuleSet, mode: FilterMode, custom_ids: Vec<CategoryId>) -> Self {
        Self { rules, mode, custom_ids }
    }

    #[must_use]
    pub fn with_mode(self, mode: FilterMode) -> Self {
        Self { mode, ..self }
    }

    #[must_use]
    pub fn derive(&self, vector: &RatingVector) -> DerivedCategories {
        derive_categories(vector, &self.rules, self.mode, &self.custom_ids)
    }
}

/// Derive categories for many vectors with the same rules.
#[must_use = "Iterator should be consumed to derive categories"]
pub fn batch_derive_categories<'a, K, I>(
    items: I,
    rules: &'a CategoryRuleSet,
    mode: FilterMode,
    custom_ids: &'a [CategoryId],
) -> impl Iterator<Item = (K, DerivedCategories)> + 'a
where
    K: 'a,
    I: IntoIterator<Item = (K, &'a RatingVector)>,
    I::IntoIter: 'a,
{
    items
        .into_iter()
        .map(move |(key, vector)| (key, derive_categories(vector, rules, mode, custom_ids)))
}
