//! Validation of JSON pasted back from an LLM.
//!
//! Assistants wrap their answers in Markdown fences and occasionally get the
//! shape wrong, so parsing is lenient about the wrapper and strict about the
//! content. Every failure is a [`ParseError`] whose message can be shown to
//! the user as-is.

use crate::algorithm::ScoringContext;
use crate::experience::{ExperienceNote, NoteSource};
use crate::rating::{Dimension, Level, RatingVector, StrengthBar};
use crate::signature::{LlmTag, PerspectiveSource, SignaturePerspective, SongSection};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

const LABELS: &str = "Bass Presence, Vocal Focus, Treble Detail, Soundstage, Dynamic Range, Warmth";
const LEVELS: &str = "low, mid-low, mid, mid-high, high";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
    #[error("tags must be an array of strings")]
    Tags,
    #[error("bars must be an array of exactly 6 items")]
    BarCount,
    #[error("Invalid bar label: \"{0}\". Expected one of: {LABELS}")]
    InvalidLabel(String),
    #[error("Invalid level \"{level}\" for \"{label}\". Expected one of: {LEVELS}")]
    InvalidLevel { level: String, label: String },
    #[error("All 6 bar labels must be unique")]
    DuplicateLabels,
    #[error("tagline must be a non-empty string")]
    Tagline,
    #[error("description must be a non-empty string")]
    Description,
}

/// Strip surrounding whitespace and an optional ```` ```json ```` fence.
#[must_use]
pub fn extract_json(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        let rest = match rest.get(..4) {
            Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
            _ => rest,
        };
        text = rest.trim_start();
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest.trim_end();
    }
    text
}

fn parse_value(raw: &str) -> Result<Value, ParseError> {
    serde_json::from_str(extract_json(raw)).map_err(|e| ParseError::InvalidJson(e.to_string()))
}

/// Text of a JSON value as it would appear in a message.
fn display(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "undefined".to_string(),
    }
}

/// A validated signature payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSignature {
    pub tags: Vec<String>,
    pub bars: RatingVector,
    pub sections: Option<Vec<SongSection>>,
}

impl ParsedSignature {
    /// Turn the payload into an LLM perspective. Headphone perspectives pass a
    /// scoring context so the category is stored with them.
    #[must_use]
    pub fn into_perspective(
        self,
        perspective_id: String,
        llm_tag: Option<LlmTag>,
        context: Option<&ScoringContext>,
    ) -> SignaturePerspective {
        let perspective = SignaturePerspective {
            sections: self.sections,
            llm_tag,
            ..SignaturePerspective::new(perspective_id, "LLM", PerspectiveSource::Llm, self.tags, self.bars)
        };
        match context {
            Some(context) => perspective.categorized(context),
            None => perspective,
        }
    }
}

/// Validate an LLM signature answer: `{"tags": [...], "bars": [...], "sections"?: [...]}`.
pub fn parse_signature_json(raw: &str) -> Result<ParsedSignature, ParseError> {
    let value = parse_value(raw)?;

    let tags: Vec<String> = value
        .get("tags")
        .and_then(Value::as_array)
        .ok_or(ParseError::Tags)?
        .iter()
        .map(|tag| tag.as_str().map(str::to_string).ok_or(ParseError::Tags))
        .collect::<Result<_, _>>()?;

    let raw_bars = value
        .get("bars")
        .and_then(Value::as_array)
        .filter(|bars| bars.len() == Dimension::ALL.len())
        .ok_or(ParseError::BarCount)?;

    let mut bars = Vec::with_capacity(raw_bars.len());
    for bar in raw_bars {
        let label = bar.get("label");
        let dimension = label
            .and_then(Value::as_str)
            .and_then(Dimension::from_label)
            .ok_or_else(|| ParseError::InvalidLabel(display(label)))?;
        let level = bar.get("level");
        let level = level.and_then(Value::as_str).and_then(Level::from_name).ok_or_else(|| {
            ParseError::InvalidLevel { level: display(level), label: dimension.label().to_string() }
        })?;
        bars.push(StrengthBar { label: dimension, level });
    }
    let bars = RatingVector::try_from(bars).map_err(|_| ParseError::DuplicateLabels)?;

    let sections = value.get("sections").and_then(Value::as_array).map(|entries| {
        entries
            .iter()
            .filter_map(|entry| {
                Some(SongSection {
                    time: entry.get("time")?.as_str()?.to_string(),
                    label: entry.get("label")?.as_str()?.to_string(),
                    description: entry.get("description")?.as_str()?.to_string(),
                })
            })
            .collect::<Vec<_>>()
    });
    let sections = sections.filter(|s| !s.is_empty());

    Ok(ParsedSignature { tags, bars, sections })
}

/// A validated experience note answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedExperience {
    pub note: ExperienceNote,
    pub video_review_url: Option<String>,
}

/// Validate `{"tagline": "...", "description": "...", "videoReviewUrl"?: "..."}`.
pub fn parse_experience_note_json(raw: &str) -> Result<ParsedExperience, ParseError> {
    let value = parse_value(raw)?;
    let text = |key: &str| {
        value.get(key).and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
    };

    let tagline = text("tagline").ok_or(ParseError::Tagline)?;
    let description = text("description").ok_or(ParseError::Description)?;
    Ok(ParsedExperience {
        note: ExperienceNote { tagline, description, source: NoteSource::Llm },
        video_review_url: text("videoReviewUrl"),
    })
}

/// `llm-<unix millis>`, the id given to freshly imported LLM perspectives.
#[must_use]
pub fn llm_perspective_id(now: SystemTime) -> String {
    let millis = now.duration_since(UNIX_EPOCH).map_or(0, |d| d.as_millis());
    format!("llm-{millis}")
}
