//! # Category Rules
//!
//! Category identifiers, per-dimension constraints and the rule sets the
//! scoring engine matches against. Rule sets combine the built-in defaults with
//! any user-created custom categories.
//!
//! Constraints are validated when they are authored or loaded, so the scoring
//! engine can assume `1 <= min <= max <= 5` and `gradient <= 2`.

use crate::rating::Dimension;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Built-in category names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuiltinCategory {
    Dark,
    Bright,
    Balanced,
    Unmatched,
    VShaped,
    Warm,
    Analytical,
    Intimate,
}

impl BuiltinCategory {
    /// Every built-in, including the `unmatched` fallback.
    pub const ALL: [BuiltinCategory; 8] = [
        BuiltinCategory::Dark,
        BuiltinCategory::Bright,
        BuiltinCategory::Balanced,
        BuiltinCategory::Unmatched,
        BuiltinCategory::VShaped,
        BuiltinCategory::Warm,
        BuiltinCategory::Analytical,
        BuiltinCategory::Intimate,
    ];

    /// Scoring order. Ties between equal scores resolve to the earlier entry.
    pub const PRIORITY: [BuiltinCategory; 7] = [
        BuiltinCategory::VShaped,
        BuiltinCategory::Analytical,
        BuiltinCategory::Dark,
        BuiltinCategory::Bright,
        BuiltinCategory::Intimate,
        BuiltinCategory::Warm,
        BuiltinCategory::Balanced,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            BuiltinCategory::Dark => "dark",
            BuiltinCategory::Bright => "bright",
            BuiltinCategory::Balanced => "balanced",
            BuiltinCategory::Unmatched => "unmatched",
            BuiltinCategory::VShaped => "v-shaped",
            BuiltinCategory::Warm => "warm",
            BuiltinCategory::Analytical => "analytical",
            BuiltinCategory::Intimate => "intimate",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|cat| cat.as_str() == name)
    }
}

impl fmt::Display for BuiltinCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Opaque category identifier: a built-in or a user-defined id.
///
/// Serialized as a plain string; any string that is not a built-in name is a
/// custom id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategoryId {
    Builtin(BuiltinCategory),
    Custom(String),
}

impl CategoryId {
    pub const UNMATCHED: CategoryId = CategoryId::Builtin(BuiltinCategory::Unmatched);

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            CategoryId::Builtin(cat) => cat.as_str(),
            CategoryId::Custom(id) => id,
        }
    }

    #[must_use]
    pub fn is_unmatched(&self) -> bool {
        *self == Self::UNMATCHED
    }

    #[must_use]
    pub fn builtin(&self) -> Option<BuiltinCategory> {
        match self {
            CategoryId::Builtin(cat) => Some(*cat),
            CategoryId::Custom(_) => None,
        }
    }
}

impl From<BuiltinCategory> for CategoryId {
    fn from(cat: BuiltinCategory) -> Self {
        CategoryId::Builtin(cat)
    }
}

impl From<String> for CategoryId {
    fn from(id: String) -> Self {
        match BuiltinCategory::from_name(&id) {
            Some(cat) => CategoryId::Builtin(cat),
            None => CategoryId::Custom(id),
        }
    }
}

impl From<&str> for CategoryId {
    fn from(id: &str) -> Self {
        CategoryId::from(id.to_string())
    }
}

impl From<CategoryId> for String {
    fn from(id: CategoryId) -> Self {
        match id {
            CategoryId::Builtin(cat) => cat.as_str().to_string(),
            CategoryId::Custom(id) => id,
        }
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Rule authoring failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("constraint bounds must be between 1 and 5 (got min {min}, max {max})")]
    OutOfRange { min: u8, max: u8 },
    #[error("constraint min {min} is greater than max {max}")]
    InvertedRange { min: u8, max: u8 },
    #[error("gradient must be 0, 1 or 2 (got {0})")]
    GradientTooWide(u8),
    #[error("\"{0}\" is a built-in category and cannot be redefined as custom")]
    ReservedId(String),
    #[error("custom category \"{0}\" already exists")]
    DuplicateCustom(String),
    #[error("custom category id must not be empty")]
    EmptyId,
    #[error("unknown custom category \"{0}\"")]
    UnknownCustom(String),
}

/// Accepted range for one dimension.
///
/// `gradient` widens the range by that many levels on each side, but only in
/// ballpark mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawConstraint")]
pub struct Constraint {
    min: u8,
    max: u8,
    gradient: u8,
}

#[derive(Deserialize)]
struct RawConstraint {
    min: u8,
    max: u8,
    gradient: u8,
}

impl TryFrom<RawConstraint> for Constraint {
    type Error = RuleError;

    fn try_from(raw: RawConstraint) -> Result<Self, Self::Error> {
        Constraint::new(raw.min, raw.max, raw.gradient)
    }
}

impl Constraint {
    pub const MAX_GRADIENT: u8 = 2;

    pub fn new(min: u8, max: u8, gradient: u8) -> Result<Self, RuleError> {
        if !(1..=5).contains(&min) || !(1..=5).contains(&max) {
            return Err(RuleError::OutOfRange { min, max });
        }
        if min > max {
            return Err(RuleError::InvertedRange { min, max });
        }
        if gradient > Self::MAX_GRADIENT {
            return Err(RuleError::GradientTooWide(gradient));
        }
        Ok(Self { min, max, gradient })
    }

    /// Exact single level with no tolerance.
    pub fn exact(level: u8) -> Result<Self, RuleError> {
        Self::new(level, level, 0)
    }

    #[must_use]
    pub const fn min(&self) -> u8 {
        self.min
    }

    #[must_use]
    pub const fn max(&self) -> u8 {
        self.max
    }

    #[must_use]
    pub const fn gradient(&self) -> u8 {
        self.gradient
    }

    /// Built-in table constants; never called with invalid bounds.
    const fn preset(min: u8, max: u8, gradient: u8) -> Self {
        Self { min, max, gradient }
    }
}

/// Constraints for one category, keyed by dimension. Dimensions absent from
/// the map do not affect the score.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryRule {
    constraints: BTreeMap<Dimension, Constraint>,
}

impl CategoryRule {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert; replaces an existing constraint on the same dimension.
    #[must_use]
    pub fn with(mut self, dimension: Dimension, constraint: Constraint) -> Self {
        self.constraints.insert(dimension, constraint);
        self
    }

    #[must_use]
    pub fn get(&self, dimension: Dimension) -> Option<&Constraint> {
        self.constraints.get(&dimension)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Dimension, &Constraint)> + '_ {
        self.constraints.iter().map(|(dim, c)| (*dim, c))
    }
}

impl FromIterator<(Dimension, Constraint)> for CategoryRule {
    fn from_iter<I: IntoIterator<Item = (Dimension, Constraint)>>(iter: I) -> Self {
        Self { constraints: iter.into_iter().collect() }
    }
}

/// Category id to rule mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryRuleSet {
    rules: BTreeMap<CategoryId, CategoryRule>,
}

impl Default for CategoryRuleSet {
    fn default() -> Self {
        default_rules()
    }
}

impl CategoryRuleSet {
    /// A rule set with no rules at all (not even the defaults).
    #[must_use]
    pub fn empty() -> Self {
        Self { rules: BTreeMap::new() }
    }

    #[must_use]
    pub fn get(&self, id: &CategoryId) -> Option<&CategoryRule> {
        self.rules.get(id)
    }

    /// Returns a copy with `id`'s rule replaced.
    #[must_use]
    pub fn with_rule(&self, id: impl Into<CategoryId>, rule: CategoryRule) -> Self {
        let mut rules = self.rules.clone();
        rules.insert(id.into(), rule);
        Self { rules }
    }

    /// Returns a copy without `id`'s rule.
    #[must_use]
    pub fn without_rule(&self, id: &CategoryId) -> Self {
        let mut rules = self.rules.clone();
        rules.remove(id);
        Self { rules }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CategoryId, &CategoryRule)> + '_ {
        self.rules.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FromIterator<(CategoryId, CategoryRule)> for CategoryRuleSet {
    fn from_iter<I: IntoIterator<Item = (CategoryId, CategoryRule)>>(iter: I) -> Self {
        Self { rules: iter.into_iter().collect() }
    }
}

/// Built-in rule table.
#[must_use]
pub fn default_rules() -> CategoryRuleSet {
    use BuiltinCategory as C;
    use Dimension as D;

    let high = Constraint::preset(4, 5, 1);
    let rule = |entries: &[(Dimension, Constraint)]| entries.iter().copied().collect::<CategoryRule>();

    [
        (C::VShaped, rule(&[(D::BassPresence, high), (D::TrebleDetail, high), (D::VocalFocus, Constraint::preset(1, 3, 1))])),
        (C::Analytical, rule(&[(D::DynamicRange, high), (D::TrebleDetail, high), (D::Soundstage, high)])),
        (C::Dark, rule(&[(D::BassPresence, high), (D::Warmth, high), (D::TrebleDetail, Constraint::preset(1, 3, 1))])),
        (C::Bright, rule(&[(D::TrebleDetail, high), (D::BassPresence, Constraint::preset(1, 3, 1)), (D::Warmth, Constraint::preset(1, 2, 1))])),
        (C::Intimate, rule(&[(D::VocalFocus, high), (D::Soundstage, Constraint::preset(1, 3, 1)), (D::Warmth, Constraint::preset(3, 5, 1))])),
        (C::Warm, rule(&[(D::Warmth, high), (D::BassPresence, Constraint::preset(3, 5, 1)), (D::VocalFocus, Constraint::preset(3, 5, 1))])),
        (
            C::Balanced,
            rule(&[
                (D::BassPresence, Constraint::preset(3, 4, 1)),
                (D::VocalFocus, Constraint::preset(3, 4, 1)),
                (D::TrebleDetail, Constraint::preset(3, 4, 1)),
                (D::Warmth, Constraint::preset(3, 4, 1)),
            ]),
        ),
        (C::Unmatched, CategoryRule::new()),
    ]
    .into_iter()
    .map(|(cat, rule)| (CategoryId::from(cat), rule))
    .collect()
}

/// Metadata for a user-created category. Matching behavior lives in the rule
/// set entry with the same id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomCategoryDef {
    pub id: String,
    pub name: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Ids of `defs` in stored order, ready for the scoring engine.
#[must_use]
pub fn custom_ids(defs: &[CustomCategoryDef]) -> Vec<CategoryId> {
    defs.iter().map(|def| CategoryId::Custom(def.id.clone())).collect()
}

/// Appends a new custom category and its rule. Ids must be non-empty, unique,
/// and must not shadow a built-in.
pub fn add_custom_category(
    defs: &[CustomCategoryDef],
    rules: &CategoryRuleSet,
    def: CustomCategoryDef,
    rule: CategoryRule,
) -> Result<(Vec<CustomCategoryDef>, CategoryRuleSet), RuleError> {
    let id = def.id.trim();
    if id.is_empty() {
        return Err(RuleError::EmptyId);
    }
    if BuiltinCategory::from_name(id).is_some() {
        return Err(RuleError::ReservedId(id.to_string()));
    }
    if defs.iter().any(|existing| existing.id == id) {
        return Err(RuleError::DuplicateCustom(id.to_string()));
    }

    let def = CustomCategoryDef { id: id.to_string(), ..def };
    let rules = rules.with_rule(CategoryId::Custom(def.id.clone()), rule);
    let mut defs = defs.to_vec();
    defs.push(def);
    Ok((defs, rules))
}

/// Removes a custom category together with its rule.
pub fn remove_custom_category(
    defs: &[CustomCategoryDef],
    rules: &CategoryRuleSet,
    id: &str,
) -> Result<(Vec<CustomCategoryDef>, CategoryRuleSet), RuleError> {
    if !defs.iter().any(|def| def.id == id) {
        return Err(RuleError::UnknownCustom(id.to_string()));
    }
    let defs = defs.iter().filter(|def| def.id != id).cloned().collect();
    let rules = rules.without_rule(&CategoryId::Custom(id.to_string()));
    Ok((defs, rules))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_validation() {
        assert!(Constraint::new(1, 5, 2).is_ok());
        assert_eq!(Constraint::new(4, 2, 0), Err(RuleError::InvertedRange { min: 4, max: 2 }));
        assert_eq!(Constraint::new(0, 2, 0), Err(RuleError::OutOfRange { min: 0, max: 2 }));
        assert_eq!(Constraint::new(2, 6, 0), Err(RuleError::OutOfRange { min: 2, max: 6 }));
        assert_eq!(Constraint::new(2, 3, 3), Err(RuleError::GradientTooWide(3)));
    }

    #[test]
    fn test_category_id_string_mapping() {
        assert_eq!(CategoryId::from("v-shaped"), CategoryId::Builtin(BuiltinCategory::VShaped));
        assert_eq!(CategoryId::from("studio"), CategoryId::Custom("studio".to_string()));
        assert_eq!(String::from(CategoryId::from(BuiltinCategory::Analytical)), "analytical");
        assert!(CategoryId::from("unmatched").is_unmatched());
    }

    #[test]
    fn test_default_rules_cover_every_builtin() {
        let rules = default_rules();
        for cat in BuiltinCategory::ALL {
            assert!(rules.get(&cat.into()).is_some(), "missing rule for {cat}");
        }
        assert!(rules.get(&CategoryId::UNMATCHED).unwrap().is_empty());
        assert_eq!(rules.get(&BuiltinCategory::Balanced.into()).unwrap().len(), 4);

        let v = rules.get(&BuiltinCategory::VShaped.into()).unwrap();
        let vocal = v.get(Dimension::VocalFocus).unwrap();
        assert_eq!((vocal.min(), vocal.max(), vocal.gradient()), (1, 3, 1));
    }

    #[test]
    fn test_rule_set_json_shape() {
        let json = serde_json::to_value(default_rules()).unwrap();
        assert_eq!(json["dark"]["Warmth"]["min"], 4);
        assert_eq!(json["bright"]["Warmth"]["max"], 2);
        assert_eq!(json["unmatched"], serde_json::json!({}));

        let back: CategoryRuleSet = serde_json::from_value(json).unwrap();
        assert_eq!(back, default_rules());
    }

    #[test]
    fn test_inverted_rule_rejected_on_load() {
        let json = r#"{"custom": {"Warmth": {"min": 5, "max": 1, "gradient": 0}}}"#;
        let err = serde_json::from_str::<CategoryRuleSet>(json).unwrap_err();
        assert!(err.to_string().contains("greater than max"));
    }

    #[test]
    fn test_unknown_dimension_rejected_on_load() {
        let json = r#"{"custom": {"Loudness": {"min": 1, "max": 2, "gradient": 0}}}"#;
        assert!(serde_json::from_str::<CategoryRuleSet>(json).is_err());
    }

    #[test]
    fn test_add_and_remove_custom_category() {
        let def = CustomCategoryDef {
            id: "studio".to_string(),
            name: "Studio".to_string(),
            color: "#336699".to_string(),
            description: None,
        };
        let rule = CategoryRule::new().with(Dimension::Soundstage, Constraint::exact(3).unwrap());
        let (defs, rules) = add_custom_category(&[], &default_rules(), def.clone(), rule.clone()).unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(rules.get(&"studio".into()), Some(&rule));

        assert_eq!(
            add_custom_category(&defs, &rules, def, rule.clone()),
            Err(RuleError::DuplicateCustom("studio".to_string()))
        );

        let warm = CustomCategoryDef { id: "warm".to_string(), ..defs[0].clone() };
        assert_eq!(
            add_custom_category(&defs, &rules, warm, rule),
            Err(RuleError::ReservedId("warm".to_string()))
        );

        let (defs, rules) = remove_custom_category(&defs, &rules, "studio").unwrap();
        assert!(defs.is_empty());
        assert!(rules.get(&"studio".into()).is_none());
        assert_eq!(
            remove_custom_category(&defs, &rules, "studio"),
            Err(RuleError::UnknownCustom("studio".to_string()))
        );
    }
}
