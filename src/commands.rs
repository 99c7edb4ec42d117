//! Command implementations behind the CLI.
//!
//! Every command works against an injected [`Catalog`] and writes its report
//! to `out`, so the whole surface can be exercised with a [`MemoryStore`]
//! in tests.
//!
//! [`MemoryStore`]: crate::db::MemoryStore

use crate::algorithm::{FilterMode, ScoringContext};
use crate::db::{Catalog, KeyValueStore};
use crate::experience::{derive_experience_note, format_deltas_for_prompt, voice_by_id, ExperienceRecord, ExperienceVoice};
use crate::parse::{llm_perspective_id, parse_experience_note_json, parse_signature_json};
use crate::presets::{preset_by_id, HeadphonePreset, PRESETS};
use crate::rating::{Dimension, RatingVector};
use crate::rules::{add_custom_category, remove_custom_category, BuiltinCategory, CategoryRule, Constraint, CustomCategoryDef};
use crate::signature::{LlmTag, PerspectiveSource, Signature, SignaturePerspective};
use crate::spectrum::{build_spectrum, preset_to_signature, reroll, SlotSource};
use anyhow::{anyhow, Context, Result};
use log::info;
use rand::Rng;
use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};

/// Song or headphone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Song,
    Headphone,
}

impl EntityKind {
    const fn noun(self) -> &'static str {
        match self {
            EntityKind::Song => "song",
            EntityKind::Headphone => "headphone",
        }
    }
}

/// Saved signature. Headphones without one fall back to their preset
/// baseline, scored with the current rules and not saved until something
/// changes.
pub fn load_signature<S: KeyValueStore>(catalog: &Catalog<S>, kind: EntityKind, id: &str) -> Result<Option<Signature>> {
    match kind {
        EntityKind::Song => catalog.song_signature(id),
        EntityKind::Headphone => match (catalog.headphone_signature(id)?, preset_by_id(id)) {
            (Some(signature), _) => Ok(Some(signature)),
            (None, Some(preset)) => Ok(Some(preset_signature(catalog, preset)?)),
            (None, None) => Ok(None),
        },
    }
}

fn preset_signature<S: KeyValueStore>(catalog: &Catalog<S>, preset: &HeadphonePreset) -> Result<Signature> {
    Ok(preset_to_signature(preset).recategorized(&catalog.scoring_context()?))
}

fn require_signature<S: KeyValueStore>(catalog: &Catalog<S>, kind: EntityKind, id: &str) -> Result<Signature> {
    load_signature(catalog, kind, id)?.ok_or_else(|| anyhow!("No signature for {} `{id}`", kind.noun()))
}

fn save_signature<S: KeyValueStore>(catalog: &mut Catalog<S>, kind: EntityKind, id: &str, signature: &Signature) -> Result<()> {
    match kind {
        EntityKind::Song => catalog.save_song_signature(id, signature),
        EntityKind::Headphone => catalog.save_headphone_signature(id, signature),
    }
}

/// Headphone perspectives store their category; song perspectives derive it
/// on demand.
fn categorize<S: KeyValueStore>(
    catalog: &Catalog<S>,
    kind: EntityKind,
    perspective: SignaturePerspective,
) -> Result<SignaturePerspective> {
    Ok(match kind {
        EntityKind::Song => perspective,
        EntityKind::Headphone => perspective.categorized(&catalog.scoring_context()?),
    })
}

fn bars_line(bars: &RatingVector) -> String {
    bars.iter().map(|(dim, level)| format!("{}={}", dim.short_name(), level.value())).collect::<Vec<_>>().join(" ")
}

fn write_signature(out: &mut dyn Write, signature: &Signature, context: &ScoringContext) -> Result<()> {
    let active = signature.resolve_active();
    let categories = signature.categories(context);
    writeln!(out, "Perspective: {} ({}, {})", active.label, active.perspective_id, active.source)?;
    if !active.tags.is_empty() {
        writeln!(out, "Tags: {}", active.tags.join(", "))?;
    }
    writeln!(out, "Category: {}", categories.primary)?;
    if !categories.secondary.is_empty() {
        let secondary: Vec<&str> = categories.secondary.iter().map(|c| c.as_str()).collect();
        writeln!(out, "Also: {}", secondary.join(", "))?;
    }
    for (dimension, level) in active.bars.iter() {
        writeln!(out, "  {:<14} {:<9} {}", dimension.label(), level.as_str(), "#".repeat(usize::from(level.value())))?;
    }
    for section in active.sections.iter().flatten() {
        writeln!(out, "  [{}] {}: {}", section.time, section.label, section.description)?;
    }
    Ok(())
}

/// Import an LLM signature answer and make it the default perspective.
pub fn rate<S: KeyValueStore>(
    catalog: &mut Catalog<S>,
    kind: EntityKind,
    id: &str,
    raw: &str,
    llm_tag: Option<LlmTag>,
    now: SystemTime,
    out: &mut dyn Write,
) -> Result<()> {
    let parsed = parse_signature_json(raw).context("Could not use the LLM answer")?;
    let headphone_context = match kind {
        EntityKind::Song => None,
        EntityKind::Headphone => Some(catalog.scoring_context()?),
    };
    let perspective = parsed.into_perspective(llm_perspective_id(now), llm_tag, headphone_context.as_ref());
    let perspective_id = perspective.perspective_id.clone();

    let signature = match load_signature(catalog, kind, id)? {
        Some(existing) => existing.upsert_default_perspective(perspective),
        None => Signature::new(perspective),
    };
    save_signature(catalog, kind, id, &signature)?;
    info!("Saved LLM perspective {perspective_id} for {} {id}", kind.noun());

    writeln!(out, "Saved {perspective_id} for {} `{id}`", kind.noun())?;
    write_signature(out, &signature, &catalog.scoring_context()?)
}

/// Arguments for [`refine`].
#[derive(Debug, Clone)]
pub struct Refinement {
    pub bars: RatingVector,
    pub tags: Vec<String>,
    pub label: String,
    pub make_default: bool,
}

/// Add a manual perspective, refined from the current default if there is one.
pub fn refine<S: KeyValueStore>(
    catalog: &mut Catalog<S>,
    kind: EntityKind,
    id: &str,
    refinement: Refinement,
    now: SystemTime,
    out: &mut dyn Write,
) -> Result<()> {
    let millis = now.duration_since(UNIX_EPOCH).map_or(0, |d| d.as_millis());
    let existing = load_signature(catalog, kind, id)?;

    let mut perspective = SignaturePerspective::new(
        format!("manual-{millis}"),
        refinement.label,
        PerspectiveSource::Manual,
        refinement.tags,
        refinement.bars,
    );
    if let Some(base) = &existing {
        perspective = perspective.refined_from(base.default_perspective_id());
    }
    let perspective = categorize(catalog, kind, perspective)?;
    let perspective_id = perspective.perspective_id.clone();

    let signature = match existing {
        Some(existing) if refinement.make_default => existing.upsert_default_perspective(perspective),
        Some(existing) => existing.upsert_perspective(perspective),
        None => Signature::new(perspective),
    };
    save_signature(catalog, kind, id, &signature)?;

    writeln!(out, "Saved {perspective_id} for {} `{id}`", kind.noun())?;
    write_signature(out, &signature, &catalog.scoring_context()?)
}

/// Categorize raw levels with the stored rules.
pub fn classify<S: KeyValueStore>(
    catalog: &Catalog<S>,
    bars: &RatingVector,
    mode: Option<FilterMode>,
    verbose: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let mut context = catalog.scoring_context()?;
    if let Some(mode) = mode {
        context = context.with_mode(mode);
    }
    let derived = context.derive(bars);

    writeln!(out, "{} ({})", derived.primary, context.mode)?;
    if !derived.secondary.is_empty() {
        let secondary: Vec<&str> = derived.secondary.iter().map(|c| c.as_str()).collect();
        writeln!(out, "Also: {}", secondary.join(", "))?;
    }
    if verbose {
        for score in &derived.scores {
            writeln!(out, "  {:<12} {:.3}", score.category_id, score.score)?;
        }
    }
    Ok(())
}

pub fn show<S: KeyValueStore>(catalog: &Catalog<S>, kind: EntityKind, id: &str, out: &mut dyn Write) -> Result<()> {
    let signature = require_signature(catalog, kind, id)?;
    write_signature(out, &signature, &catalog.scoring_context()?)
}

pub fn perspectives<S: KeyValueStore>(catalog: &Catalog<S>, kind: EntityKind, id: &str, out: &mut dyn Write) -> Result<()> {
    let signature = require_signature(catalog, kind, id)?;
    let default_id = signature.default_perspective_id();
    for perspective in signature.perspectives().perspectives() {
        let marker = if perspective.perspective_id == default_id { "*" } else { " " };
        let llm = perspective.llm_tag.map(|tag| format!(" [{}]", tag.display_name())).unwrap_or_default();
        writeln!(
            out,
            "{marker} {:<20} {:<8} {:<10} {}{llm}",
            perspective.perspective_id,
            perspective.source,
            perspective.label,
            bars_line(&perspective.bars)
        )?;
    }
    Ok(())
}

pub fn set_default<S: KeyValueStore>(
    catalog: &mut Catalog<S>,
    kind: EntityKind,
    id: &str,
    perspective_id: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let signature = require_signature(catalog, kind, id)?.set_default(perspective_id)?;
    save_signature(catalog, kind, id, &signature)?;
    writeln!(out, "{} `{id}` now shows {perspective_id}", kind.noun())?;
    Ok(())
}

pub fn delete_perspective<S: KeyValueStore>(
    catalog: &mut Catalog<S>,
    kind: EntityKind,
    id: &str,
    perspective_id: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let signature = require_signature(catalog, kind, id)?
        .delete_perspective(perspective_id)
        .with_context(|| format!("Cannot delete {perspective_id} from {} `{id}`", kind.noun()))?;
    save_signature(catalog, kind, id, &signature)?;
    writeln!(out, "Deleted {perspective_id}; {} `{id}` now shows {}", kind.noun(), signature.default_perspective_id())?;
    Ok(())
}

pub fn collection_add<S: KeyValueStore>(catalog: &mut Catalog<S>, id: &str, out: &mut dyn Write) -> Result<()> {
    let ids = catalog.add_to_collection(id)?;
    if catalog.headphone_signature(id)?.is_none() {
        if let Some(preset) = preset_by_id(id) {
            let signature = preset_signature(catalog, preset)?;
            catalog.save_headphone_signature(id, &signature)?;
        }
    }
    writeln!(out, "Collection: {} headphones", ids.len())?;
    Ok(())
}

pub fn collection_remove<S: KeyValueStore>(catalog: &mut Catalog<S>, id: &str, out: &mut dyn Write) -> Result<()> {
    let ids = catalog.remove_from_collection(id)?;
    writeln!(out, "Collection: {} headphones", ids.len())?;
    Ok(())
}

pub fn collection_list<S: KeyValueStore>(catalog: &Catalog<S>, out: &mut dyn Write) -> Result<()> {
    let context = catalog.scoring_context()?;
    for id in catalog.collection()? {
        let name = preset_by_id(&id).map_or(id.as_str(), |preset| preset.name);
        let category = catalog
            .headphone_signature(&id)?
            .map_or_else(|| "unrated".to_string(), |sig| sig.categories(&context).primary.to_string());
        writeln!(out, "{id:<20} {name:<24} {category}")?;
    }
    Ok(())
}

pub fn spectrum<S: KeyValueStore, R: Rng + ?Sized>(catalog: &Catalog<S>, rng: &mut R, out: &mut dyn Write) -> Result<()> {
    let ids = catalog.collection()?;
    let signatures = catalog.headphone_signatures(&ids)?;
    let slots = build_spectrum(PRESETS, &ids, &signatures, &catalog.spectrum_pins()?, &catalog.scoring_context()?, rng);

    for slot in &slots {
        let chosen = slot.preset_id.as_deref().unwrap_or("-");
        let source = match slot.source {
            SlotSource::Collection => "owned",
            SlotSource::Preset => "preset",
            SlotSource::None => "",
        };
        writeln!(out, "{:<11} {chosen:<20} {source:<7} +{} more", slot.category, slot.alternatives.len())?;
    }
    Ok(())
}

pub fn reroll_slot<S: KeyValueStore, R: Rng + ?Sized>(
    catalog: &mut Catalog<S>,
    category: &str,
    rng: &mut R,
    out: &mut dyn Write,
) -> Result<()> {
    let category = BuiltinCategory::from_name(category)
        .filter(|c| BuiltinCategory::PRIORITY.contains(c))
        .ok_or_else(|| anyhow!("`{category}` is not a spectrum category"))?;

    let ids = catalog.collection()?;
    let signatures = catalog.headphone_signatures(&ids)?;
    let pins = catalog.spectrum_pins()?;
    let slots = build_spectrum(PRESETS, &ids, &signatures, &pins, &catalog.scoring_context()?, rng);
    let slot = slots
        .iter()
        .find(|slot| slot.category == category)
        .ok_or_else(|| anyhow!("No spectrum slot for {category}"))?;

    match reroll(slot, &pins, rng) {
        Some((choice, pins)) => {
            catalog.save_spectrum_pins(&pins)?;
            writeln!(out, "{category}: {choice}")?;
        }
        None => writeln!(out, "{category}: nothing else to choose from")?,
    }
    Ok(())
}

/// Print the automatic note and every stored voice for a pair.
pub fn experience<S: KeyValueStore>(
    catalog: &Catalog<S>,
    song_id: &str,
    headphone_id: &str,
    prompt: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let song = require_signature(catalog, EntityKind::Song, song_id)?;
    let headphone = require_signature(catalog, EntityKind::Headphone, headphone_id)?;

    if prompt {
        writeln!(out, "{}", format_deltas_for_prompt(headphone.bars(), song.bars()))?;
        return Ok(());
    }

    let note = derive_experience_note(headphone.bars(), song.bars());
    writeln!(out, "{}", note.tagline)?;
    writeln!(out, "{}", note.description)?;

    if let Some(record) = catalog.experience(song_id, headphone_id)? {
        let default_id = &record.default_voice().perspective_id;
        for voice in record.voices() {
            let name = voice_by_id(&voice.voice_id).map_or(voice.voice_id.as_str(), |v| v.name);
            let marker = if &voice.perspective_id == default_id { "*" } else { " " };
            writeln!(out)?;
            writeln!(out, "{marker} {name}: {}", voice.note.tagline)?;
            writeln!(out, "  {}", voice.note.description)?;
            if let Some(url) = &voice.video_review_url {
                writeln!(out, "  {url}")?;
            }
        }
    }
    Ok(())
}

/// Store an LLM-written note for a pair under `voice_id`.
#[allow(clippy::too_many_arguments)]
pub fn import_experience<S: KeyValueStore>(
    catalog: &mut Catalog<S>,
    song_id: &str,
    headphone_id: &str,
    raw: &str,
    voice_id: &str,
    llm_tag: Option<LlmTag>,
    now: SystemTime,
    out: &mut dyn Write,
) -> Result<()> {
    let parsed = parse_experience_note_json(raw).context("Could not use the LLM answer")?;
    let voice = ExperienceVoice {
        perspective_id: llm_perspective_id(now),
        voice_id: voice_id.to_string(),
        note: parsed.note,
        llm_tag,
        video_review_url: parsed.video_review_url,
    };

    let record = match catalog.experience(song_id, headphone_id)? {
        Some(record) => record.upsert_voice(voice),
        None => ExperienceRecord::new(voice),
    };
    catalog.save_experience(song_id, headphone_id, &record)?;
    writeln!(out, "Saved {voice_id} note for `{song_id}` on `{headphone_id}`")?;
    Ok(())
}

/// Re-score the stored categories of every saved headphone after a rule
/// change. Rated headphones outside the collection are included.
fn recategorize_headphones<S: KeyValueStore>(catalog: &mut Catalog<S>) -> Result<()> {
    let context = catalog.scoring_context()?;
    for id in catalog.headphone_signature_ids()? {
        if let Some(signature) = catalog.headphone_signature(&id)? {
            catalog.save_headphone_signature(&id, &signature.recategorized(&context))?;
        }
    }
    Ok(())
}

pub fn rules_show<S: KeyValueStore>(catalog: &Catalog<S>, out: &mut dyn Write) -> Result<()> {
    let context = catalog.scoring_context()?;
    writeln!(out, "Filter mode: {}", context.mode)?;
    let defs = catalog.custom_categories()?;
    for (id, rule) in context.rules.iter() {
        let constraints: Vec<String> = rule
            .iter()
            .map(|(dim, c)| format!("{} {}-{} ±{}", dim.short_name(), c.min(), c.max(), c.gradient()))
            .collect();
        let name = defs.iter().find(|def| def.id == id.as_str()).map(|def| format!(" ({})", def.name)).unwrap_or_default();
        writeln!(out, "{id}{name}: {}", if constraints.is_empty() { "-".to_string() } else { constraints.join(", ") })?;
    }
    Ok(())
}

pub fn rules_mode<S: KeyValueStore>(catalog: &mut Catalog<S>, mode: FilterMode, out: &mut dyn Write) -> Result<()> {
    catalog.set_filter_mode(mode)?;
    recategorize_headphones(catalog)?;
    writeln!(out, "Filter mode: {mode}")?;
    Ok(())
}

pub fn rules_add_custom<S: KeyValueStore>(
    catalog: &mut Catalog<S>,
    def: CustomCategoryDef,
    constraints: &[(Dimension, Constraint)],
    out: &mut dyn Write,
) -> Result<()> {
    let rule: CategoryRule = constraints.iter().copied().collect();
    let id = def.id.clone();
    let (defs, rules) = add_custom_category(&catalog.custom_categories()?, &catalog.rules()?, def, rule)?;
    catalog.save_rules(&rules)?;
    catalog.save_custom_categories(&defs)?;
    recategorize_headphones(catalog)?;
    writeln!(out, "Added custom category `{}`", id.trim())?;
    Ok(())
}

pub fn rules_remove_custom<S: KeyValueStore>(catalog: &mut Catalog<S>, id: &str, out: &mut dyn Write) -> Result<()> {
    let (defs, rules) = remove_custom_category(&catalog.custom_categories()?, &catalog.rules()?, id)?;
    catalog.save_rules(&rules)?;
    catalog.save_custom_categories(&defs)?;
    recategorize_headphones(catalog)?;
    writeln!(out, "Removed custom category `{id}`")?;
    Ok(())
}

pub fn rules_reset<S: KeyValueStore>(catalog: &mut Catalog<S>, out: &mut dyn Write) -> Result<()> {
    catalog.reset_rules()?;
    recategorize_headphones(catalog)?;
    writeln!(out, "Restored default rules")?;
    Ok(())
}

pub fn presets(out: &mut dyn Write) -> Result<()> {
    let context = ScoringContext::default();
    for preset in PRESETS {
        let category = context.derive(&preset.baseline.bars).primary;
        writeln!(
            out,
            "{:<18} {:<20} {:<13} {:<9} {category}",
            preset.id,
            preset.name,
            preset.brand,
            preset.form_factor.as_str()
        )?;
    }
    Ok(())
}
