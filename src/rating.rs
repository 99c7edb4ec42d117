//! # Rating Vectors
//!
//! The six-dimension ordinal rating shared by songs and headphones. Every
//! vector carries all six dimensions exactly once, so the rest of the crate
//! never has to deal with a missing value.
//!
//! On the wire a vector is a list of `{label, level}` bars:
//!
//! ```json
//! [{"label": "Bass Presence", "level": "high"}, ...]
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One rated dimension of sound character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Dimension {
    #[serde(rename = "Bass Presence")]
    BassPresence,
    #[serde(rename = "Vocal Focus")]
    VocalFocus,
    #[serde(rename = "Treble Detail")]
    TrebleDetail,
    #[serde(rename = "Soundstage")]
    Soundstage,
    #[serde(rename = "Dynamic Range")]
    DynamicRange,
    #[serde(rename = "Warmth")]
    Warmth,
}

impl Dimension {
    /// All dimensions in canonical order.
    pub const ALL: [Dimension; 6] = [
        Dimension::BassPresence,
        Dimension::VocalFocus,
        Dimension::TrebleDetail,
        Dimension::Soundstage,
        Dimension::DynamicRange,
        Dimension::Warmth,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Dimension::BassPresence => "Bass Presence",
            Dimension::VocalFocus => "Vocal Focus",
            Dimension::TrebleDetail => "Treble Detail",
            Dimension::Soundstage => "Soundstage",
            Dimension::DynamicRange => "Dynamic Range",
            Dimension::Warmth => "Warmth",
        }
    }

    /// Lowercase trait word used in experience taglines ("emphasized bass").
    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Dimension::BassPresence => "bass",
            Dimension::VocalFocus => "vocal",
            Dimension::TrebleDetail => "treble",
            Dimension::Soundstage => "soundstage",
            Dimension::DynamicRange => "dynamic",
            Dimension::Warmth => "warmth",
        }
    }

    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|dim| dim.label() == label)
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Five-point ordinal level. The discriminant is the numeric value used by
/// the scoring engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Level {
    Low = 1,
    MidLow = 2,
    Mid = 3,
    MidHigh = 4,
    High = 5,
}

impl Level {
    pub const ALL: [Level; 5] = [Level::Low, Level::MidLow, Level::Mid, Level::MidHigh, Level::High];

    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn from_value(value: u8) -> Option<Self> {
        match value {
            1 => Some(Level::Low),
            2 => Some(Level::MidLow),
            3 => Some(Level::Mid),
            4 => Some(Level::MidHigh),
            5 => Some(Level::High),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Low => "low",
            Level::MidLow => "mid-low",
            Level::Mid => "mid",
            Level::MidHigh => "mid-high",
            Level::High => "high",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.as_str() == name)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A single `{label, level}` pair as it appears in persisted records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrengthBar {
    pub label: Dimension,
    pub level: Level,
}

/// Why a list of bars could not become a [`RatingVector`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VectorError {
    #[error("bars must be an array of exactly 6 items (got {0})")]
    WrongCount(usize),
    #[error("All 6 bar labels must be unique (\"{0}\" appears twice)")]
    DuplicateLabel(Dimension),
    #[error("Invalid level {0}, expected a number from 1 to 5")]
    LevelOutOfRange(u8),
    #[error("Invalid level \"{0}\". Expected one of: low, mid-low, mid, mid-high, high")]
    UnknownLevel(String),
}

/// Complete six-dimension rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<StrengthBar>", into = "Vec<StrengthBar>")]
pub struct RatingVector {
    levels: [Level; 6],
}

impl RatingVector {
    /// Levels given in [`Dimension::ALL`] order.
    #[must_use]
    pub const fn new(levels: [Level; 6]) -> Self {
        Self { levels }
    }

    /// Numeric levels (1-5) in [`Dimension::ALL`] order.
    pub fn from_values(values: [u8; 6]) -> Result<Self, VectorError> {
        let mut levels = [Level::Mid; 6];
        for (slot, value) in levels.iter_mut().zip(values) {
            *slot = Level::from_value(value).ok_or(VectorError::LevelOutOfRange(value))?;
        }
        Ok(Self { levels })
    }

    #[must_use]
    pub const fn level(&self, dimension: Dimension) -> Level {
        self.levels[dimension.index()]
    }

    #[must_use]
    pub const fn value(&self, dimension: Dimension) -> u8 {
        self.level(dimension).value()
    }

    /// Returns a copy with one dimension changed.
    #[must_use]
    pub fn with_level(mut self, dimension: Dimension, level: Level) -> Self {
        self.levels[dimension.index()] = level;
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (Dimension, Level)> + '_ {
        Dimension::ALL.into_iter().zip(self.levels.iter().copied())
    }

    #[must_use]
    pub fn bars(&self) -> Vec<StrengthBar> {
        self.iter().map(|(label, level)| StrengthBar { label, level }).collect()
    }
}

impl TryFrom<Vec<StrengthBar>> for RatingVector {
    type Error = VectorError;

    fn try_from(bars: Vec<StrengthBar>) -> Result<Self, Self::Error> {
        if bars.len() != Dimension::ALL.len() {
            return Err(VectorError::WrongCount(bars.len()));
        }

        let mut slots: [Option<Level>; 6] = [None; 6];
        for bar in &bars {
            let slot = &mut slots[bar.label.index()];
            if slot.is_some() {
                return Err(VectorError::DuplicateLabel(bar.label));
            }
            *slot = Some(bar.level);
        }

        // Six bars without duplicates cover every dimension.
        let mut levels = [Level::Mid; 6];
        for (level, slot) in levels.iter_mut().zip(slots) {
            *level = slot.unwrap_or(Level::Mid);
        }
        Ok(Self { levels })
    }
}

impl From<RatingVector> for Vec<StrengthBar> {
    fn from(vector: RatingVector) -> Self {
        vector.bars()
    }
}

/// Parses `"5,2,5,3,3,3"` or `"high,mid-low,high,mid,mid,mid"` in canonical
/// dimension order.
impl FromStr for RatingVector {
    type Err = VectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).filter(|p| !p.is_empty()).collect();
        if parts.len() != Dimension::ALL.len() {
            return Err(VectorError::WrongCount(parts.len()));
        }

        let mut levels = [Level::Mid; 6];
        for (slot, part) in levels.iter_mut().zip(parts) {
            *slot = match part.parse::<u8>() {
                Ok(value) => Level::from_value(value).ok_or(VectorError::LevelOutOfRange(value))?,
                Err(_) => Level::from_name(part)
                    .ok_or_else(|| VectorError::UnknownLevel(part.to_string()))?,
            };
        }
        Ok(Self { levels })
    }
}

impl fmt::Display for RatingVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: Vec<String> = self.levels.iter().map(|l| l.value().to_string()).collect();
        write!(f, "[{}]", values.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bars_round_trip_through_json() {
        let vector = RatingVector::from_values([5, 2, 5, 3, 3, 3]).unwrap();
        let json = serde_json::to_string(&vector).unwrap();
        assert!(json.contains(r#"{"label":"Bass Presence","level":"high"}"#));
        assert!(json.contains(r#"{"label":"Vocal Focus","level":"mid-low"}"#));

        let back: RatingVector = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vector);
    }

    #[test]
    fn test_bars_in_any_order_are_accepted() {
        let json = r#"[
            {"label": "Warmth", "level": "low"},
            {"label": "Dynamic Range", "level": "mid"},
            {"label": "Soundstage", "level": "mid-high"},
            {"label": "Treble Detail", "level": "high"},
            {"label": "Vocal Focus", "level": "mid-low"},
            {"label": "Bass Presence", "level": "high"}
        ]"#;
        let vector: RatingVector = serde_json::from_str(json).unwrap();
        assert_eq!(vector.level(Dimension::Warmth), Level::Low);
        assert_eq!(vector.value(Dimension::Soundstage), 4);
        assert_eq!(vector.value(Dimension::BassPresence), 5);
    }

    #[test]
    fn test_duplicate_and_missing_labels_rejected() {
        let mut bars = RatingVector::from_values([3; 6]).unwrap().bars();
        bars[5].label = Dimension::BassPresence;
        assert_eq!(
            RatingVector::try_from(bars.clone()),
            Err(VectorError::DuplicateLabel(Dimension::BassPresence))
        );

        bars.pop();
        assert_eq!(RatingVector::try_from(bars), Err(VectorError::WrongCount(5)));
    }

    #[test]
    fn test_from_str_accepts_numbers_and_names() {
        let numeric: RatingVector = "5, 2, 5, 3, 3, 3".parse().unwrap();
        let named: RatingVector = "high,mid-low,high,mid,mid,mid".parse().unwrap();
        assert_eq!(numeric, named);

        assert_eq!("1,2,3".parse::<RatingVector>(), Err(VectorError::WrongCount(3)));
        assert_eq!("1,2,3,4,5,6".parse::<RatingVector>(), Err(VectorError::LevelOutOfRange(6)));
        assert!(matches!("1,2,3,4,5,loud".parse::<RatingVector>(), Err(VectorError::UnknownLevel(_))));
    }

    #[test]
    fn test_with_level_leaves_original_untouched() {
        let base = RatingVector::from_values([3; 6]).unwrap();
        let louder = base.with_level(Dimension::BassPresence, Level::High);
        assert_eq!(base.value(Dimension::BassPresence), 3);
        assert_eq!(louder.value(Dimension::BassPresence), 5);
    }
}
