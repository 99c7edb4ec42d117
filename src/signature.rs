//! # Signatures
//!
//! A signature is everything the user (or an LLM) has said about how one song
//! or one headphone sounds. It is a [`PerspectiveSet`] of
//! [`SignaturePerspective`]s; the tags, bars and category shown for the entity
//! are always read from the active perspective rather than stored separately.
//!
//! ## Persisted shape
//!
//! ```json
//! {
//!   "tags": ["warm"], "bars": [...], "category": "warm",
//!   "perspectives": [...], "defaultPerspectiveId": "llm-1700000000000"
//! }
//! ```
//!
//! The top-level `tags`/`bars`/`category` mirror the default perspective and
//! are rewritten on every save. They are ignored when loading, except for old
//! records that predate perspectives.

use crate::algorithm::{DerivedCategories, ScoringContext};
use crate::perspective::{Perspective, PerspectiveError, PerspectiveSet};
use crate::rating::RatingVector;
use crate::rules::CategoryId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a perspective's rating came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerspectiveSource {
    Preset,
    Llm,
    Manual,
    Auto,
}

impl fmt::Display for PerspectiveSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            PerspectiveSource::Preset => "preset",
            PerspectiveSource::Llm => "llm",
            PerspectiveSource::Manual => "manual",
            PerspectiveSource::Auto => "auto",
        })
    }
}

/// Which assistant produced an LLM-sourced perspective or note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmTag {
    Chatgpt,
    Gemini,
    Claude,
    Other,
}

impl LlmTag {
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            LlmTag::Chatgpt => "ChatGPT",
            LlmTag::Gemini => "Gemini",
            LlmTag::Claude => "Claude",
            LlmTag::Other => "Other",
        }
    }
}

/// A timed section of a song, e.g. `0:00-0:32 Intro`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongSection {
    pub time: String,
    pub label: String,
    pub description: String,
}

/// One independently sourced rating of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignaturePerspective {
    pub perspective_id: String,
    pub label: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub bars: RatingVector,
    /// Category stored when the perspective was created or edited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_categories: Option<Vec<CategoryId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<SongSection>>,
    pub source: PerspectiveSource,
    /// Perspective this one was refined from. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refined_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_tag: Option<LlmTag>,
}

impl Perspective for SignaturePerspective {
    fn perspective_id(&self) -> &str {
        &self.perspective_id
    }
}

impl SignaturePerspective {
    /// Bare perspective with no stored category.
    #[must_use]
    pub fn new(
        perspective_id: impl Into<String>,
        label: impl Into<String>,
        source: PerspectiveSource,
        tags: Vec<String>,
        bars: RatingVector,
    ) -> Self {
        Self {
            perspective_id: perspective_id.into(),
            label: label.into(),
            tags,
            bars,
            category: None,
            secondary_categories: None,
            sections: None,
            source,
            refined_from: None,
            llm_tag: None,
        }
    }

    /// Store categories derived from this perspective's bars.
    #[must_use]
    pub fn categorized(self, context: &ScoringContext) -> Self {
        let derived = context.derive(&self.bars);
        self.with_categories(&derived)
    }

    #[must_use]
    pub fn with_categories(self, derived: &DerivedCategories) -> Self {
        Self {
            category: Some(derived.primary.clone()),
            secondary_categories: Some(derived.secondary.clone()),
            ..self
        }
    }

    #[must_use]
    pub fn refined_from(self, base: &str) -> Self {
        Self { refined_from: Some(base.to_string()), ..self }
    }

    #[must_use]
    pub fn with_llm_tag(self, tag: LlmTag) -> Self {
        Self { llm_tag: Some(tag), ..self }
    }
}

/// Categories shown for an entity: stored on the perspective, or derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveCategories {
    pub primary: CategoryId,
    pub secondary: Vec<CategoryId>,
}

/// All perspectives recorded for one song or headphone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "SignatureRecord", try_from = "SignatureRecord")]
pub struct Signature {
    perspectives: PerspectiveSet<SignaturePerspective>,
}

impl Signature {
    #[must_use]
    pub fn new(first: SignaturePerspective) -> Self {
        Self { perspectives: PerspectiveSet::new(first) }
    }

    #[must_use]
    pub fn from_set(perspectives: PerspectiveSet<SignaturePerspective>) -> Self {
        Self { perspectives }
    }

    #[must_use]
    pub fn perspectives(&self) -> &PerspectiveSet<SignaturePerspective> {
        &self.perspectives
    }

    #[must_use]
    pub fn default_perspective_id(&self) -> &str {
        self.perspectives.default_id()
    }

    /// The perspective whose values the entity currently shows.
    #[must_use]
    pub fn resolve_active(&self) -> &SignaturePerspective {
        self.perspectives.active()
    }

    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.resolve_active().tags
    }

    #[must_use]
    pub fn bars(&self) -> &RatingVector {
        &self.resolve_active().bars
    }

    /// Active categories. A category stored on the active perspective wins;
    /// otherwise the bars are scored with `context`.
    #[must_use]
    pub fn categories(&self, context: &ScoringContext) -> ActiveCategories {
        let active = self.resolve_active();
        match &active.category {
            Some(primary) => ActiveCategories {
                primary: primary.clone(),
                secondary: active.secondary_categories.clone().unwrap_or_default(),
            },
            None => {
                let derived = context.derive(&active.bars);
                ActiveCategories { primary: derived.primary, secondary: derived.secondary }
            }
        }
    }

    /// Category stored on the active perspective, if any.
    #[must_use]
    pub fn stored_category(&self) -> Option<&CategoryId> {
        self.resolve_active().category.as_ref()
    }

    pub fn set_default(&self, perspective_id: &str) -> Result<Self, PerspectiveError> {
        Ok(Self { perspectives: self.perspectives.set_default(perspective_id)? })
    }

    #[must_use]
    pub fn upsert_perspective(&self, perspective: SignaturePerspective) -> Self {
        Self { perspectives: self.perspectives.upsert(perspective) }
    }

    /// Upsert and select the perspective as default, as happens when a fresh
    /// LLM analysis is saved.
    #[must_use]
    pub fn upsert_default_perspective(&self, perspective: SignaturePerspective) -> Self {
        Self { perspectives: self.perspectives.upsert_as_default(perspective) }
    }

    pub fn delete_perspective(&self, perspective_id: &str) -> Result<Self, PerspectiveError> {
        Ok(Self { perspectives: self.perspectives.delete(perspective_id)? })
    }

    /// First perspective from `source`, used to pick a `refined_from` base.
    #[must_use]
    pub fn find_by_source(&self, source: PerspectiveSource) -> Option<&SignaturePerspective> {
        self.perspectives.perspectives().iter().find(|p| p.source == source)
    }

    /// Re-score every perspective's stored category, e.g. after the rules
    /// or filter mode changed.
    #[must_use]
    pub fn recategorized(&self, context: &ScoringContext) -> Self {
        let mut set = self.perspectives.clone();
        for perspective in self.perspectives.perspectives() {
            set = set.upsert(perspective.clone().categorized(context));
        }
        Self { perspectives: set }
    }
}

/// Wire form of [`Signature`], including the mirrored fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignatureRecord {
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bars: Option<RatingVector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<CategoryId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    secondary_categories: Option<Vec<CategoryId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sections: Option<Vec<SongSection>>,
    #[serde(default)]
    perspectives: Vec<SignaturePerspective>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_perspective_id: Option<String>,
}

/// Id given to the perspective synthesized for records written before
/// perspectives existed.
pub const LEGACY_PERSPECTIVE_ID: &str = "legacy";

impl From<Signature> for SignatureRecord {
    fn from(signature: Signature) -> Self {
        let active = signature.resolve_active().clone();
        let (perspectives, default_id) = signature.perspectives.into_parts();
        Self {
            tags: active.tags,
            bars: Some(active.bars),
            category: active.category,
            secondary_categories: active.secondary_categories,
            sections: active.sections,
            perspectives,
            default_perspective_id: Some(default_id),
        }
    }
}

impl TryFrom<SignatureRecord> for Signature {
    type Error = PerspectiveError;

    fn try_from(record: SignatureRecord) -> Result<Self, Self::Error> {
        if record.perspectives.is_empty() {
            let bars = record.bars.ok_or(PerspectiveError::Empty)?;
            let legacy = SignaturePerspective {
                category: record.category,
                secondary_categories: record.secondary_categories,
                sections: record.sections,
                ..SignaturePerspective::new(LEGACY_PERSPECTIVE_ID, "Manual", PerspectiveSource::Manual, record.tags, bars)
            };
            return Ok(Self::new(legacy));
        }

        let perspectives = PerspectiveSet::from_parts(record.perspectives, record.default_perspective_id)?;
        Ok(Self { perspectives })
    }
}
