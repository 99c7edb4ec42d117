//! Built-in headphone presets.
//!
//! Every preset ships a baseline rating so a headphone can be categorized, and
//! placed on the spectrum, before the user has rated it. Bars are listed in
//! dimension order: bass, vocal, treble, soundstage, dynamic range, warmth.

use crate::rating::{Level, RatingVector};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Brand {
    Apple,
    Sony,
    Sennheiser,
    Beyerdynamic,
    Hifiman,
    Audeze,
}

impl Brand {
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Brand::Apple => "Apple",
            Brand::Sony => "Sony",
            Brand::Sennheiser => "Sennheiser",
            Brand::Beyerdynamic => "Beyerdynamic",
            Brand::Hifiman => "HiFiMAN",
            Brand::Audeze => "Audeze",
        }
    }
}

impl fmt::Display for Brand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormFactor {
    OverEar,
    OnEar,
    Iem,
    Tws,
    Earbud,
}

impl FormFactor {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            FormFactor::OverEar => "over-ear",
            FormFactor::OnEar => "on-ear",
            FormFactor::Iem => "iem",
            FormFactor::Tws => "tws",
            FormFactor::Earbud => "earbud",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    Wired,
    Wireless,
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    Anc,
    Transparency,
    SpatialAudio,
    Ldac,
    OpenBack,
}

/// Baseline rating shipped with a preset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Baseline {
    pub bars: RatingVector,
    pub tags: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadphonePreset {
    pub id: &'static str,
    pub name: &'static str,
    pub brand: Brand,
    pub form_factor: FormFactor,
    pub connectivity: Connectivity,
    pub features: &'static [Feature],
    pub specs: &'static str,
    pub baseline: Baseline,
}

const fn level(value: u8) -> Level {
    match Level::from_value(value) {
        Some(level) => level,
        None => Level::Mid,
    }
}

const fn bars(bass: u8, vocal: u8, treble: u8, stage: u8, dynamic: u8, warmth: u8) -> RatingVector {
    RatingVector::new([level(bass), level(vocal), level(treble), level(stage), level(dynamic), level(warmth)])
}

const APPLE_ANC: &[Feature] = &[Feature::Anc, Feature::Transparency, Feature::SpatialAudio];

pub static PRESETS: &[HeadphonePreset] = &[
    HeadphonePreset {
        id: "airpods-pro-3",
        name: "AirPods Pro 3",
        brand: Brand::Apple,
        form_factor: FormFactor::Tws,
        connectivity: Connectivity::Wireless,
        features: APPLE_ANC,
        specs: "tws · ANC · H2 chip",
        baseline: Baseline { bars: bars(4, 3, 4, 3, 3, 3), tags: &["v-shaped", "punchy", "modern"] },
    },
    HeadphonePreset {
        id: "airpods-pro-2",
        name: "AirPods Pro 2",
        brand: Brand::Apple,
        form_factor: FormFactor::Tws,
        connectivity: Connectivity::Wireless,
        features: APPLE_ANC,
        specs: "tws · ANC · H2 chip",
        baseline: Baseline { bars: bars(4, 4, 4, 3, 4, 4), tags: &["balanced", "clean", "versatile"] },
    },
    HeadphonePreset {
        id: "airpods-4-anc",
        name: "AirPods 4 (ANC)",
        brand: Brand::Apple,
        form_factor: FormFactor::Tws,
        connectivity: Connectivity::Wireless,
        features: APPLE_ANC,
        specs: "tws · ANC · H2 chip",
        baseline: Baseline { bars: bars(3, 4, 4, 3, 3, 3), tags: &["intimate", "vocal-forward", "casual"] },
    },
    HeadphonePreset {
        id: "airpods-4",
        name: "AirPods 4",
        brand: Brand::Apple,
        form_factor: FormFactor::Earbud,
        connectivity: Connectivity::Wireless,
        features: &[Feature::SpatialAudio],
        specs: "earbud · open-fit · H2 chip",
        baseline: Baseline { bars: bars(3, 4, 3, 3, 3, 3), tags: &["balanced", "light", "everyday"] },
    },
    HeadphonePreset {
        id: "airpods-max-usbc",
        name: "AirPods Max (USB-C)",
        brand: Brand::Apple,
        form_factor: FormFactor::OverEar,
        connectivity: Connectivity::Wireless,
        features: APPLE_ANC,
        specs: "over-ear · ANC · H1 chip",
        baseline: Baseline { bars: bars(4, 4, 4, 4, 4, 4), tags: &["warm", "spacious", "premium"] },
    },
    HeadphonePreset {
        id: "earpods-usbc",
        name: "EarPods (USB-C)",
        brand: Brand::Apple,
        form_factor: FormFactor::Earbud,
        connectivity: Connectivity::Wired,
        features: &[],
        specs: "earbud · wired · USB-C",
        baseline: Baseline { bars: bars(2, 4, 3, 2, 2, 3), tags: &["intimate", "mid-forward", "basic"] },
    },
    HeadphonePreset {
        id: "wh-1000xm5",
        name: "WH-1000XM5",
        brand: Brand::Sony,
        form_factor: FormFactor::OverEar,
        connectivity: Connectivity::Hybrid,
        features: &[Feature::Anc, Feature::Transparency, Feature::Ldac],
        specs: "over-ear · ANC · LDAC",
        baseline: Baseline { bars: bars(5, 3, 3, 3, 3, 5), tags: &["dark", "bassy", "commuter"] },
    },
    HeadphonePreset {
        id: "wf-1000xm5",
        name: "WF-1000XM5",
        brand: Brand::Sony,
        form_factor: FormFactor::Tws,
        connectivity: Connectivity::Wireless,
        features: &[Feature::Anc, Feature::Transparency, Feature::Ldac],
        specs: "tws · ANC · LDAC",
        baseline: Baseline { bars: bars(4, 3, 3, 3, 3, 4), tags: &["warm", "smooth", "compact"] },
    },
    HeadphonePreset {
        id: "hd600",
        name: "HD 600",
        brand: Brand::Sennheiser,
        form_factor: FormFactor::OverEar,
        connectivity: Connectivity::Wired,
        features: &[Feature::OpenBack],
        specs: "over-ear · open-back · 300 Ω",
        baseline: Baseline { bars: bars(3, 4, 3, 3, 4, 4), tags: &["natural", "mid-forward", "reference"] },
    },
    HeadphonePreset {
        id: "hd800s",
        name: "HD 800 S",
        brand: Brand::Sennheiser,
        form_factor: FormFactor::OverEar,
        connectivity: Connectivity::Wired,
        features: &[Feature::OpenBack],
        specs: "over-ear · open-back · 300 Ω",
        baseline: Baseline { bars: bars(3, 3, 5, 5, 5, 2), tags: &["analytical", "wide", "detailed"] },
    },
    HeadphonePreset {
        id: "dt-770-pro",
        name: "DT 770 Pro",
        brand: Brand::Beyerdynamic,
        form_factor: FormFactor::OverEar,
        connectivity: Connectivity::Wired,
        features: &[],
        specs: "over-ear · closed-back · 80 Ω",
        baseline: Baseline { bars: bars(5, 2, 5, 3, 4, 3), tags: &["v-shaped", "studio", "sparkly"] },
    },
    HeadphonePreset {
        id: "arya-stealth",
        name: "Arya Stealth",
        brand: Brand::Hifiman,
        form_factor: FormFactor::OverEar,
        connectivity: Connectivity::Wired,
        features: &[Feature::OpenBack],
        specs: "over-ear · planar · open-back",
        baseline: Baseline { bars: bars(3, 3, 4, 5, 5, 2), tags: &["airy", "spacious", "planar"] },
    },
    HeadphonePreset {
        id: "lcd-x",
        name: "LCD-X",
        brand: Brand::Audeze,
        form_factor: FormFactor::OverEar,
        connectivity: Connectivity::Wired,
        features: &[Feature::OpenBack],
        specs: "over-ear · planar · open-back",
        baseline: Baseline { bars: bars(5, 4, 3, 4, 5, 5), tags: &["lush", "weighty", "planar"] },
    },
];

#[must_use]
pub fn preset_by_id(id: &str) -> Option<&'static HeadphonePreset> {
    PRESETS.iter().find(|preset| preset.id == id)
}

pub fn presets_by_brand(brand: Brand) -> impl Iterator<Item = &'static HeadphonePreset> {
    PRESETS.iter().filter(move |preset| preset.brand == brand)
}

pub fn presets_by_form_factor(form_factor: FormFactor) -> impl Iterator<Item = &'static HeadphonePreset> {
    PRESETS.iter().filter(move |preset| preset.form_factor == form_factor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::ScoringContext;
    use crate::rules::BuiltinCategory;
    use std::collections::HashSet;

    #[test]
    fn test_preset_ids_are_unique() {
        let ids: HashSet<&str> = PRESETS.iter().map(|p| p.id).collect();
        assert_eq!(ids.len(), PRESETS.len());
    }

    #[test]
    fn test_lookup() {
        let preset = preset_by_id("hd800s").unwrap();
        assert_eq!(preset.brand, Brand::Sennheiser);
        assert!(preset_by_id("nope").is_none());
        assert_eq!(presets_by_brand(Brand::Apple).count(), 6);
        assert_eq!(presets_by_form_factor(FormFactor::Tws).count(), 4);
    }

    #[test]
    fn test_baseline_categories() {
        let context = ScoringContext::default();
        let primary = |id: &str| context.derive(&preset_by_id(id).unwrap().baseline.bars).primary;

        assert_eq!(primary("dt-770-pro"), BuiltinCategory::VShaped.into());
        assert_eq!(primary("hd800s"), BuiltinCategory::Analytical.into());
        assert_eq!(primary("wh-1000xm5"), BuiltinCategory::Dark.into());
        assert_eq!(primary("earpods-usbc"), BuiltinCategory::Intimate.into());
        assert_eq!(primary("lcd-x"), BuiltinCategory::Warm.into());
        assert_eq!(primary("airpods-4"), BuiltinCategory::Balanced.into());
    }

    #[test]
    fn test_preset_json_shape() {
        let json = serde_json::to_value(preset_by_id("airpods-4").unwrap()).unwrap();
        assert_eq!(json["formFactor"], "earbud");
        assert_eq!(json["features"][0], "spatial-audio");
        assert_eq!(json["baseline"]["bars"][1]["level"], "mid-high");
    }
}
