//! # Spectrum
//!
//! One representative headphone per built-in category, from the most
//! characteristic signature to the most neutral. Headphones the user owns take
//! precedence; presets fill the remaining gaps so the spectrum stays complete
//! for new users.
//!
//! Only the user's reroll picks are persisted (as [`SpectrumPins`]); the slots
//! themselves are rebuilt on demand.

use crate::algorithm::ScoringContext;
use crate::presets::HeadphonePreset;
use crate::rules::{BuiltinCategory, CategoryId};
use crate::signature::{PerspectiveSource, Signature, SignaturePerspective};
use log::{debug, trace};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Pinned headphone id per category name.
pub type SpectrumPins = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotSource {
    Collection,
    Preset,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpectrumSlot {
    pub category: BuiltinCategory,
    /// Chosen headphone: a collection id or a preset id.
    pub preset_id: Option<String>,
    pub source: SlotSource,
    pub alternatives: Vec<String>,
}

/// Group ids by category, keeping input order inside each group.
fn bucket<'a>(entries: impl Iterator<Item = (&'a str, CategoryId)>) -> HashMap<CategoryId, Vec<String>> {
    let mut buckets: HashMap<CategoryId, Vec<String>> = HashMap::new();
    for (id, category) in entries {
        buckets.entry(category).or_default().push(id.to_string());
    }
    buckets
}

/// Build the spectrum: exactly one slot per category in
/// [`BuiltinCategory::PRIORITY`].
///
/// Presets are bucketed by the default rules in precise mode so the spectrum
/// does not shift when the user edits rules. Collection headphones use their
/// active category under `context`; ids without a saved signature are skipped.
/// A pin is honored only if it is still one of the slot's options.
pub fn build_spectrum<R: Rng + ?Sized>(
    presets: &[HeadphonePreset],
    collection_ids: &[String],
    signatures: &HashMap<String, Signature>,
    pins: &SpectrumPins,
    context: &ScoringContext,
    rng: &mut R,
) -> Vec<SpectrumSlot> {
    let preset_context = ScoringContext::default();
    let preset_buckets = bucket(presets.iter().map(|p| (p.id, preset_context.derive(&p.baseline.bars).primary)));
    let collection_buckets = bucket(collection_ids.iter().filter_map(|id| {
        let signature = signatures.get(id)?;
        Some((id.as_str(), signature.categories(context).primary))
    }));

    let slots: Vec<SpectrumSlot> = BuiltinCategory::PRIORITY
        .into_iter()
        .map(|category| {
            let key = CategoryId::from(category);
            let owned = collection_buckets.get(&key).map_or(&[][..], Vec::as_slice);
            let preset_ids = preset_buckets.get(&key).map_or(&[][..], Vec::as_slice);
            let pinned = pins.get(category.as_str());

            if let Some(first) = owned.first() {
                let mut options: Vec<String> = owned.to_vec();
                for id in preset_ids {
                    if !options.contains(id) {
                        options.push(id.clone());
                    }
                }
                let chosen = pinned.filter(|p| options.contains(*p)).unwrap_or(first).clone();
                let alternatives = options.into_iter().filter(|id| *id != chosen).collect();
                SpectrumSlot { category, preset_id: Some(chosen), source: SlotSource::Collection, alternatives }
            } else if !preset_ids.is_empty() {
                let chosen = match pinned.filter(|p| preset_ids.contains(*p)) {
                    Some(pin) => pin.clone(),
                    None => preset_ids[rng.gen_range(0..preset_ids.len())].clone(),
                };
                let alternatives = preset_ids.iter().filter(|id| **id != chosen).cloned().collect();
                SpectrumSlot { category, preset_id: Some(chosen), source: SlotSource::Preset, alternatives }
            } else {
                trace!("No headphone for {category}");
                SpectrumSlot { category, preset_id: None, source: SlotSource::None, alternatives: Vec::new() }
            }
        })
        .collect();

    debug!(
        "Built spectrum: {} collection slots, {} preset slots",
        slots.iter().filter(|s| s.source == SlotSource::Collection).count(),
        slots.iter().filter(|s| s.source == SlotSource::Preset).count()
    );
    slots
}

/// Pick a random alternative for `slot` and pin it.
///
/// Returns the new choice and updated pins, or `None` when the slot has no
/// alternatives.
pub fn reroll<R: Rng + ?Sized>(slot: &SpectrumSlot, pins: &SpectrumPins, rng: &mut R) -> Option<(String, SpectrumPins)> {
    if slot.alternatives.is_empty() {
        return None;
    }
    let choice = slot.alternatives[rng.gen_range(0..slot.alternatives.len())].clone();
    let mut pins = pins.clone();
    pins.insert(slot.category.as_str().to_string(), choice.clone());
    debug!("Rerolled {} to {choice}", slot.category);
    Some((choice, pins))
}

/// Id of the perspective created from a preset's baseline.
#[must_use]
pub fn preset_perspective_id(preset_id: &str) -> String {
    format!("preset-{preset_id}")
}

/// One-perspective signature built from a preset's baseline, categorized
/// with the default rules.
#[must_use]
pub fn preset_to_signature(preset: &HeadphonePreset) -> Signature {
    let perspective = SignaturePerspective::new(
        preset_perspective_id(preset.id),
        preset.name,
        PerspectiveSource::Preset,
        preset.baseline.tags.iter().map(|tag| (*tag).to_string()).collect(),
        preset.baseline.bars,
    )
    .categorized(&ScoringContext::default());
    Signature::new(perspective)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::{preset_by_id, PRESETS};
    use crate::rating::RatingVector;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn slot(slots: &[SpectrumSlot], category: BuiltinCategory) -> &SpectrumSlot {
        slots.iter().find(|s| s.category == category).unwrap()
    }

    fn manual(values: [u8; 6]) -> Signature {
        let perspective = SignaturePerspective::new(
            "manual",
            "Manual",
            PerspectiveSource::Manual,
            Vec::new(),
            RatingVector::from_values(values).unwrap(),
        );
        Signature::new(perspective)
    }

    #[test]
    fn test_always_seven_slots_in_priority_order() {
        let context = ScoringContext::default();
        let empty: &[HeadphonePreset] = &[];
        for presets in [PRESETS, empty] {
            let slots = build_spectrum(presets, &[], &HashMap::new(), &SpectrumPins::new(), &context, &mut rng());
            let categories: Vec<BuiltinCategory> = slots.iter().map(|s| s.category).collect();
            assert_eq!(categories, BuiltinCategory::PRIORITY);
        }
    }

    #[test]
    fn test_presets_fill_empty_collection() {
        let slots = build_spectrum(PRESETS, &[], &HashMap::new(), &SpectrumPins::new(), &ScoringContext::default(), &mut rng());

        let v_shaped = slot(&slots, BuiltinCategory::VShaped);
        assert_eq!(v_shaped.source, SlotSource::Preset);
        assert_eq!(v_shaped.preset_id.as_deref(), Some("dt-770-pro"));
        assert!(v_shaped.alternatives.is_empty());

        let bright = slot(&slots, BuiltinCategory::Bright);
        assert_eq!(bright.source, SlotSource::None);
        assert_eq!(bright.preset_id, None);

        let warm = slot(&slots, BuiltinCategory::Warm);
        assert_eq!(warm.alternatives.len(), 3);
        assert!(!warm.alternatives.contains(warm.preset_id.as_ref().unwrap()));
    }

    #[test]
    fn test_collection_takes_precedence() {
        let ids = vec!["my-dark".to_string(), "unrated".to_string()];
        let signatures = HashMap::from([("my-dark".to_string(), manual([5, 3, 3, 3, 3, 5]))]);
        let slots = build_spectrum(PRESETS, &ids, &signatures, &SpectrumPins::new(), &ScoringContext::default(), &mut rng());

        let dark = slot(&slots, BuiltinCategory::Dark);
        assert_eq!(dark.source, SlotSource::Collection);
        assert_eq!(dark.preset_id.as_deref(), Some("my-dark"));
        assert_eq!(dark.alternatives, vec!["wh-1000xm5".to_string()]);
    }

    #[test]
    fn test_pins_honored_only_when_valid() {
        let pins = SpectrumPins::from([
            ("warm".to_string(), "lcd-x".to_string()),
            ("analytical".to_string(), "not-a-headphone".to_string()),
        ]);
        for seed in 0..10 {
            let slots = build_spectrum(
                PRESETS,
                &[],
                &HashMap::new(),
                &pins,
                &ScoringContext::default(),
                &mut StdRng::seed_from_u64(seed),
            );
            assert_eq!(slot(&slots, BuiltinCategory::Warm).preset_id.as_deref(), Some("lcd-x"));
            let analytical = slot(&slots, BuiltinCategory::Analytical).preset_id.clone().unwrap();
            assert!(analytical == "hd800s" || analytical == "arya-stealth");
        }
    }

    #[test]
    fn test_same_seed_same_spectrum() {
        let build = |seed| {
            build_spectrum(
                PRESETS,
                &[],
                &HashMap::new(),
                &SpectrumPins::new(),
                &ScoringContext::default(),
                &mut StdRng::seed_from_u64(seed),
            )
        };
        assert_eq!(build(42), build(42));
    }

    #[test]
    fn test_reroll_pins_an_alternative() {
        let slots = build_spectrum(PRESETS, &[], &HashMap::new(), &SpectrumPins::new(), &ScoringContext::default(), &mut rng());
        let warm = slot(&slots, BuiltinCategory::Warm);

        let (choice, pins) = reroll(warm, &SpectrumPins::new(), &mut rng()).unwrap();
        assert!(warm.alternatives.contains(&choice));
        assert_eq!(pins.get("warm"), Some(&choice));

        let rebuilt = build_spectrum(PRESETS, &[], &HashMap::new(), &pins, &ScoringContext::default(), &mut rng());
        assert_eq!(slot(&rebuilt, BuiltinCategory::Warm).preset_id.as_ref(), Some(&choice));

        let v_shaped = slot(&slots, BuiltinCategory::VShaped);
        assert!(reroll(v_shaped, &pins, &mut rng()).is_none());
    }

    #[test]
    fn test_preset_to_signature() {
        let signature = preset_to_signature(preset_by_id("hd800s").unwrap());
        assert_eq!(signature.default_perspective_id(), "preset-hd800s");
        let active = signature.resolve_active();
        assert_eq!(active.source, PerspectiveSource::Preset);
        assert_eq!(active.label, "HD 800 S");
        assert_eq!(active.category, Some(BuiltinCategory::Analytical.into()));
        assert_eq!(active.secondary_categories, Some(vec![BuiltinCategory::Bright.into()]));
    }
}
