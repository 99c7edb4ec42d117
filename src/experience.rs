//! # Listening experience
//!
//! Describes how a song will feel on a given headphone by comparing the two
//! rating vectors dimension by dimension. The automatic note is pure text
//! templating over the deltas; richer notes come from LLM voices and are
//! stored per song/headphone pair as an [`ExperienceRecord`].

use crate::perspective::{Perspective, PerspectiveError, PerspectiveSet};
use crate::rating::{Dimension, RatingVector};
use crate::signature::LlmTag;
use serde::{Deserialize, Serialize};

pub const FAITHFUL_TAGLINE: &str = "This headphone reproduces the song faithfully; what you hear is what was intended";
pub const CLOSE_MATCH_DESCRIPTION: &str = "This is a close match: the headphone's signature aligns with what this song asks for. \
     You'll hear it largely as the artist intended.";

/// Headphone level minus song level for one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarDelta {
    pub dimension: Dimension,
    pub headphone: u8,
    pub song: u8,
    pub delta: i8,
}

/// Per-dimension deltas in [`Dimension::ALL`] order, each in `-4..=4`.
#[must_use]
pub fn compute_deltas(headphone: &RatingVector, song: &RatingVector) -> Vec<BarDelta> {
    Dimension::ALL
        .into_iter()
        .map(|dimension| {
            let hp = headphone.value(dimension);
            let sg = song.value(dimension);
            #[allow(clippy::cast_possible_wrap)]
            let delta = hp as i8 - sg as i8;
            BarDelta { dimension, headphone: hp, song: sg, delta }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    Up2,
    Up1,
    Even,
    Down1,
    Down2,
}

impl Bucket {
    const fn of(delta: i8) -> Self {
        match delta {
            d if d >= 2 => Bucket::Up2,
            1 => Bucket::Up1,
            0 => Bucket::Even,
            -1 => Bucket::Down1,
            _ => Bucket::Down2,
        }
    }
}

fn phrase(dimension: Dimension, bucket: Bucket) -> &'static str {
    use Bucket::{Down1, Down2, Even, Up1, Up2};
    use Dimension::{BassPresence, DynamicRange, Soundstage, TrebleDetail, VocalFocus, Warmth};

    match (dimension, bucket) {
        (BassPresence, Up2) => "The low-end hits harder than the mix calls for, so expect a thicker, more physical bass",
        (BassPresence, Up1) => "Bass feels slightly fuller, adding weight to the low-end",
        (BassPresence, Even) => "Bass reproduced faithfully to the mix",
        (BassPresence, Down1) => "Bass sits a touch lighter than intended and the low-end feels leaner",
        (BassPresence, Down2) => "The low-end is noticeably pulled back; bass-heavy moments lose their punch",

        (VocalFocus, Up2) => "Vocals push forward and dominate, giving an intimate, in-your-face midrange",
        (VocalFocus, Up1) => "Vocals come through slightly more present and upfront",
        (VocalFocus, Even) => "Vocals land exactly where the mix places them",
        (VocalFocus, Down1) => "Vocals sit a step back in the mix; they're there but not leading",
        (VocalFocus, Down2) => "Vocals recede behind instruments and the midrange takes a back seat",

        (TrebleDetail, Up2) => "Cymbals, hi-hats and sibilance are sharp and forward, bright and revealing",
        (TrebleDetail, Up1) => "Treble has a slight sparkle, revealing more high-frequency detail",
        (TrebleDetail, Even) => "Treble detail matches what the recording intended",
        (TrebleDetail, Down1) => "High-end is slightly smoothed over for a more relaxed, less fatiguing listen",
        (TrebleDetail, Down2) => "Treble is noticeably rolled off and high-frequency textures get lost",

        (Soundstage, Up2) => "The sound opens up wider than the recording, spreading instruments out with extra space",
        (Soundstage, Up1) => "Slight extra width gives the mix a bit more room to breathe",
        (Soundstage, Even) => "Spatial presentation matches the recording's intent",
        (Soundstage, Down1) => "The image feels a touch narrower and elements sit closer together",
        (Soundstage, Down2) => "Everything feels compressed inward; wide-panned elements lose their separation",

        (DynamicRange, Up2) => "Quiet-to-loud contrasts feel exaggerated and dynamic moments hit harder",
        (DynamicRange, Up1) => "Dynamics are slightly more pronounced, adding drama to swells",
        (DynamicRange, Even) => "Dynamic contrasts come through naturally",
        (DynamicRange, Down1) => "Dynamic swings feel slightly evened out into a more consistent volume",
        (DynamicRange, Down2) => "Loud and quiet passages blend together and the drama is flattened",

        (Warmth, Up2) => "A rich, full-bodied coloration wraps the sound in extra warmth",
        (Warmth, Up1) => "A touch of added warmth gives the lower-mids more body",
        (Warmth, Even) => "Warmth and body match the recording faithfully",
        (Warmth, Down1) => "The sound leans slightly cooler and thinner",
        (Warmth, Down2) => "The lower-mids feel stripped back and the sound comes across lean and clinical",
    }
}

fn trait_word(delta: &BarDelta) -> String {
    let short = delta.dimension.short_name();
    match Bucket::of(delta.delta) {
        Bucket::Up2 => format!("emphasized {short}"),
        Bucket::Up1 => format!("slightly fuller {short}"),
        Bucket::Down1 => format!("leaner {short}"),
        Bucket::Down2 | Bucket::Even => format!("recessed {short}"),
    }
}

/// Who wrote an experience note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteSource {
    Auto,
    Llm,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceNote {
    pub tagline: String,
    pub description: String,
    pub source: NoteSource,
}

/// Rule-based note for a headphone/song pair. Deterministic for equal inputs.
///
/// Non-zero deltas are ordered by magnitude, largest first, keeping dimension
/// order among equals. The two largest shape the tagline; every non-zero delta
/// contributes one sentence to the description.
#[must_use]
pub fn derive_experience_note(headphone: &RatingVector, song: &RatingVector) -> ExperienceNote {
    let mut significant: Vec<BarDelta> = compute_deltas(headphone, song).into_iter().filter(|d| d.delta != 0).collect();
    significant.sort_by_key(|d| std::cmp::Reverse(d.delta.unsigned_abs()));

    if significant.is_empty() {
        return ExperienceNote {
            tagline: FAITHFUL_TAGLINE.to_string(),
            description: CLOSE_MATCH_DESCRIPTION.to_string(),
            source: NoteSource::Auto,
        };
    }

    let traits: Vec<String> = significant.iter().take(2).map(trait_word).collect();
    let tagline = format!("Expect {} compared to the original mix", traits.join(" and "));

    let sentences: Vec<&str> = significant.iter().map(|d| phrase(d.dimension, Bucket::of(d.delta))).collect();
    let description = format!("{}.", sentences.join(". "));

    ExperienceNote { tagline, description, source: NoteSource::Auto }
}

fn delta_label(delta: i8) -> &'static str {
    match delta {
        d if d >= 3 => "strongly emphasized",
        2 => "noticeably forward",
        1 => "slightly forward",
        0 => "matched",
        -1 => "slightly recessed",
        -2 => "noticeably recessed",
        _ => "strongly recessed",
    }
}

/// One line per dimension describing the delta, for pasting into an LLM
/// prompt:
///
/// ```text
/// - Bass Presence: HP 5/5 vs Song 3/5 (+2) noticeably forward
/// ```
#[must_use]
pub fn format_deltas_for_prompt(headphone: &RatingVector, song: &RatingVector) -> String {
    compute_deltas(headphone, song)
        .iter()
        .map(|d| {
            let sign = match d.delta {
                0 => "=",
                x if x > 0 => "+",
                _ => "",
            };
            format!(
                "- {}: HP {}/5 vs Song {}/5 ({sign}{}) {}",
                d.dimension.label(),
                d.headphone,
                d.song,
                d.delta,
                delta_label(d.delta)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A reviewer persona notes can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Voice {
    pub id: &'static str,
    pub name: &'static str,
    pub handle: &'static str,
    pub style: &'static str,
}

pub const NEUTRAL_VOICE: &str = "neutral";

pub static VOICES: &[Voice] = &[
    Voice { id: NEUTRAL_VOICE, name: "Neutral", handle: "", style: "No personality, straightforward description" },
    Voice { id: "zeos", name: "Z Reviews / Zeos Pantera", handle: "@ZeosReviews", style: "Chaotic, hyperbolic, stream-of-consciousness energy" },
    Voice { id: "dms", name: "DMS", handle: "@DMS3TV", style: "Analytical, structured, technical but accessible" },
    Voice { id: "crinacle", name: "Crinacle", handle: "@Crinacle", style: "Data-driven, deadpan, measurement-focused" },
    Voice { id: "dankpods", name: "DankPods", handle: "@DankPods", style: "Comedy-first, irreverent, brutally honest" },
    Voice { id: "joshua-valour", name: "Joshua Valour", handle: "@JoshuaValour", style: "Cinematic, emotive, poetic descriptions" },
    Voice { id: "resolve", name: "Resolve / The Headphone Show", handle: "@TheHeadphoneShow", style: "Methodical, measurement-backed listening notes" },
    Voice { id: "badguy", name: "BadGuy Good Audio", handle: "@BadGuyGoodAudio", style: "Casual, conversational, community-focused" },
    Voice { id: "super-review", name: "Super* Review", handle: "@SuperReview", style: "Calm, understated, dry wit" },
];

#[must_use]
pub fn voice_by_id(id: &str) -> Option<&'static Voice> {
    VOICES.iter().find(|voice| voice.id == id)
}

/// One voice's note about a song/headphone pair. Custom voice ids are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceVoice {
    pub perspective_id: String,
    pub voice_id: String,
    pub note: ExperienceNote,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_tag: Option<LlmTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_review_url: Option<String>,
}

impl Perspective for ExperienceVoice {
    fn perspective_id(&self) -> &str {
        &self.perspective_id
    }

    /// A newer note from the same voice replaces the older one.
    fn same_identity(&self, other: &Self) -> bool {
        self.voice_id == other.voice_id
    }
}

/// All stored voices for one song/headphone pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "RecordWire", try_from = "RecordWire")]
pub struct ExperienceRecord {
    voices: PerspectiveSet<ExperienceVoice>,
}

impl ExperienceRecord {
    #[must_use]
    pub fn new(first: ExperienceVoice) -> Self {
        Self { voices: PerspectiveSet::new(first) }
    }

    #[must_use]
    pub fn voices(&self) -> &[ExperienceVoice] {
        self.voices.perspectives()
    }

    #[must_use]
    pub fn default_voice(&self) -> &ExperienceVoice {
        self.voices.active()
    }

    /// Store a voice's note and show it.
    #[must_use]
    pub fn upsert_voice(&self, voice: ExperienceVoice) -> Self {
        Self { voices: self.voices.upsert_as_default(voice) }
    }

    pub fn set_default(&self, perspective_id: &str) -> Result<Self, PerspectiveError> {
        Ok(Self { voices: self.voices.set_default(perspective_id)? })
    }

    pub fn delete_voice(&self, perspective_id: &str) -> Result<Self, PerspectiveError> {
        Ok(Self { voices: self.voices.delete(perspective_id)? })
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RecordWire {
    #[serde(rename_all = "camelCase")]
    Voices { voices: Vec<ExperienceVoice>, default_voice_id: Option<String> },
    /// A bare note, as stored before voices existed.
    Note(ExperienceNote),
}

impl From<ExperienceRecord> for RecordWire {
    fn from(record: ExperienceRecord) -> Self {
        let (voices, default_id) = record.voices.into_parts();
        RecordWire::Voices { voices, default_voice_id: Some(default_id) }
    }
}

impl TryFrom<RecordWire> for ExperienceRecord {
    type Error = PerspectiveError;

    fn try_from(wire: RecordWire) -> Result<Self, Self::Error> {
        match wire {
            RecordWire::Voices { voices, default_voice_id } => {
                Ok(Self { voices: PerspectiveSet::from_parts(voices, default_voice_id)? })
            }
            RecordWire::Note(note) => Ok(Self::new(ExperienceVoice {
                perspective_id: NEUTRAL_VOICE.to_string(),
                voice_id: NEUTRAL_VOICE.to_string(),
                note,
                llm_tag: None,
                video_review_url: None,
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(values: [u8; 6]) -> RatingVector {
        RatingVector::from_values(values).unwrap()
    }

    fn voice(id: &str, voice_id: &str, tagline: &str) -> ExperienceVoice {
        ExperienceVoice {
            perspective_id: id.to_string(),
            voice_id: voice_id.to_string(),
            note: ExperienceNote { tagline: tagline.to_string(), description: "d".to_string(), source: NoteSource::Llm },
            llm_tag: Some(LlmTag::Claude),
            video_review_url: None,
        }
    }

    #[test]
    fn test_compute_deltas() {
        let deltas = compute_deltas(&v([5, 1, 3, 3, 3, 3]), &v([1, 5, 3, 3, 3, 4]));
        let values: Vec<i8> = deltas.iter().map(|d| d.delta).collect();
        assert_eq!(values, [4, -4, 0, 0, 0, -1]);
        assert_eq!(deltas[0].dimension, Dimension::BassPresence);
    }

    #[test]
    fn test_identical_vectors_are_faithful() {
        let note = derive_experience_note(&v([4, 2, 3, 5, 1, 3]), &v([4, 2, 3, 5, 1, 3]));
        assert_eq!(note.tagline, FAITHFUL_TAGLINE);
        assert_eq!(note.description, CLOSE_MATCH_DESCRIPTION);
        assert_eq!(note.source, NoteSource::Auto);
    }

    #[test]
    fn test_bass_only_difference() {
        let note = derive_experience_note(&v([5, 3, 3, 3, 3, 3]), &v([3, 3, 3, 3, 3, 3]));
        assert_eq!(note.tagline, "Expect emphasized bass compared to the original mix");
        assert_eq!(note.description, format!("{}.", phrase(Dimension::BassPresence, Bucket::Up2)));
    }

    #[test]
    fn test_largest_deltas_lead_with_stable_ties() {
        // treble -1, soundstage +2, warmth +1, dynamic -2
        let note = derive_experience_note(&v([3, 3, 2, 5, 1, 4]), &v([3, 3, 3, 3, 3, 3]));
        assert_eq!(note.tagline, "Expect emphasized soundstage and recessed dynamic compared to the original mix");

        let expected = [
            phrase(Dimension::Soundstage, Bucket::Up2),
            phrase(Dimension::DynamicRange, Bucket::Down2),
            phrase(Dimension::TrebleDetail, Bucket::Down1),
            phrase(Dimension::Warmth, Bucket::Up1),
        ]
        .join(". ");
        assert_eq!(note.description, format!("{expected}."));
    }

    #[test]
    fn test_one_level_trait_words() {
        let note = derive_experience_note(&v([4, 2, 3, 3, 3, 3]), &v([3, 3, 3, 3, 3, 3]));
        assert_eq!(note.tagline, "Expect slightly fuller bass and leaner vocal compared to the original mix");
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let hp = v([5, 2, 5, 3, 4, 3]);
        let song = v([2, 4, 3, 2, 2, 3]);
        assert_eq!(derive_experience_note(&hp, &song), derive_experience_note(&hp, &song));
    }

    #[test]
    fn test_format_deltas_for_prompt() {
        let text = format_deltas_for_prompt(&v([5, 1, 3, 4, 2, 3]), &v([2, 3, 3, 3, 5, 3]));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "- Bass Presence: HP 5/5 vs Song 2/5 (+3) strongly emphasized");
        assert_eq!(lines[1], "- Vocal Focus: HP 1/5 vs Song 3/5 (-2) noticeably recessed");
        assert_eq!(lines[2], "- Treble Detail: HP 3/5 vs Song 3/5 (=0) matched");
        assert_eq!(lines[3], "- Soundstage: HP 4/5 vs Song 3/5 (+1) slightly forward");
        assert_eq!(lines[4], "- Dynamic Range: HP 2/5 vs Song 5/5 (-3) strongly recessed");
    }

    #[test]
    fn test_voice_upsert_replaces_same_voice() {
        let record = ExperienceRecord::new(voice("llm-1", "crinacle", "first"))
            .upsert_voice(voice("llm-2", "dms", "second"))
            .upsert_voice(voice("llm-3", "crinacle", "third"));

        let ids: Vec<&str> = record.voices().iter().map(|v| v.perspective_id.as_str()).collect();
        assert_eq!(ids, ["llm-3", "llm-2"]);
        assert_eq!(record.default_voice().note.tagline, "third");
    }

    #[test]
    fn test_voices_sharing_an_id_never_empty_the_record() {
        let record = ExperienceRecord::new(voice("llm-5", "dms", "a")).upsert_voice(voice("llm-5", "zeos", "b"));
        assert_eq!(record.voices().len(), 1);
        assert_eq!(record.default_voice().voice_id, "zeos");
        assert_eq!(record.delete_voice("llm-5"), Err(PerspectiveError::LastPerspective));
        assert_eq!(record.default_voice().note.tagline, "b");
    }

    #[test]
    fn test_record_json_and_legacy_note() {
        let record = ExperienceRecord::new(voice("llm-1", "zeos", "loud"));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["defaultVoiceId"], "llm-1");
        assert_eq!(json["voices"][0]["voiceId"], "zeos");
        assert_eq!(serde_json::from_value::<ExperienceRecord>(json).unwrap(), record);

        let legacy = serde_json::json!({"tagline": "t", "description": "d", "source": "manual"});
        let upgraded: ExperienceRecord = serde_json::from_value(legacy).unwrap();
        assert_eq!(upgraded.default_voice().voice_id, NEUTRAL_VOICE);
        assert_eq!(upgraded.default_voice().note.source, NoteSource::Manual);
    }

    #[test]
    fn test_known_voices() {
        assert!(voice_by_id("crinacle").is_some());
        assert!(voice_by_id(NEUTRAL_VOICE).unwrap().handle.is_empty());
        assert!(voice_by_id("unknown").is_none());
    }
}
