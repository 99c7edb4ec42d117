//! # Soundsig Performance Benchmarks
//!
//! Benchmarks for the hot paths: category scoring, spectrum building,
//! experience notes and catalog storage.
//!
//! ```bash
//! cargo bench
//! cargo bench scoring
//! ```

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use soundsig::algorithm::{batch_derive_categories, derive_categories, FilterMode, ScoringContext};
use soundsig::commands::{self, EntityKind};
use soundsig::db::{Catalog, MemoryStore, SqliteStore};
use soundsig::experience::{derive_experience_note, format_deltas_for_prompt};
use soundsig::presets::PRESETS;
use soundsig::rating::RatingVector;
use soundsig::rules::default_rules;
use soundsig::spectrum::{build_spectrum, preset_to_signature, SpectrumPins};
use std::collections::HashMap;
use std::hint::black_box;
use tempfile::TempDir;

/// Every possible vector, 5^6 of them.
fn all_vectors() -> Vec<RatingVector> {
    let mut vectors = Vec::with_capacity(15_625);
    for n in 0..15_625u32 {
        let mut values = [0u8; 6];
        let mut rest = n;
        for value in &mut values {
            *value = (rest % 5) as u8 + 1;
            rest /= 5;
        }
        vectors.push(RatingVector::from_values(values).expect("values are 1-5"));
    }
    vectors
}

fn benchmark_scoring(c: &mut Criterion) {
    let mut group = c.benchmark_group("scoring");
    let rules = default_rules();
    let vector: RatingVector = "5,2,5,3,3,3".parse().expect("valid vector");

    for mode in [FilterMode::Precise, FilterMode::Ballpark] {
        group.bench_with_input(BenchmarkId::new("single_vector", mode), &mode, |b, mode| {
            b.iter(|| derive_categories(black_box(&vector), black_box(&rules), *mode, &[]))
        });
    }

    let vectors = all_vectors();
    group.bench_function("every_vector", |b| {
        b.iter(|| {
            batch_derive_categories(vectors.iter().enumerate(), black_box(&rules), FilterMode::Precise, &[])
                .filter(|(_, derived)| derived.is_unmatched())
                .count()
        })
    });

    group.finish();
}

fn benchmark_spectrum(c: &mut Criterion) {
    let mut group = c.benchmark_group("spectrum");
    let context = ScoringContext::default();
    let ids: Vec<String> = PRESETS.iter().take(5).map(|p| p.id.to_string()).collect();
    let signatures: HashMap<String, _> = PRESETS.iter().take(5).map(|p| (p.id.to_string(), preset_to_signature(p))).collect();
    let pins = SpectrumPins::new();

    group.bench_function("presets_only", |b| {
        b.iter_batched(
            || StdRng::seed_from_u64(1),
            |mut rng| build_spectrum(PRESETS, &[], &HashMap::new(), &pins, &context, &mut rng),
            BatchSize::SmallInput,
        )
    });

    group.bench_function("with_collection", |b| {
        b.iter_batched(
            || StdRng::seed_from_u64(1),
            |mut rng| build_spectrum(PRESETS, black_box(&ids), &signatures, &pins, &context, &mut rng),
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn benchmark_experience(c: &mut Criterion) {
    let mut group = c.benchmark_group("experience");
    let song: RatingVector = "5,2,5,3,3,3".parse().expect("valid vector");

    group.bench_function("note_for_every_preset", |b| {
        b.iter(|| {
            PRESETS
                .iter()
                .map(|preset| derive_experience_note(&preset.baseline.bars, black_box(&song)))
                .collect::<Vec<_>>()
        })
    });

    group.bench_function("prompt_deltas", |b| {
        b.iter(|| format_deltas_for_prompt(&PRESETS[0].baseline.bars, black_box(&song)))
    });

    group.finish();
}

fn benchmark_catalog(c: &mut Criterion) {
    let mut group = c.benchmark_group("catalog");

    group.bench_function("memory_collection_add", |b| {
        b.iter_batched(
            || Catalog::new(MemoryStore::new()),
            |mut catalog| {
                for preset in PRESETS {
                    commands::collection_add(&mut catalog, preset.id, &mut std::io::sink()).expect("add");
                }
                catalog
            },
            BatchSize::SmallInput,
        )
    });

    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let mut catalog = Catalog::new(SqliteStore::open(&temp_dir.path().join("bench.db")).expect("open catalog"));
    for preset in PRESETS {
        commands::collection_add(&mut catalog, preset.id, &mut std::io::sink()).expect("add");
    }

    group.bench_function("sqlite_show_headphone", |b| {
        b.iter(|| commands::show(&catalog, EntityKind::Headphone, black_box("hd600"), &mut std::io::sink()))
    });

    group.bench_function("sqlite_load_collection", |b| {
        b.iter(|| {
            let ids = catalog.collection().expect("collection");
            catalog.headphone_signatures(&ids).expect("signatures")
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_scoring, benchmark_spectrum, benchmark_experience, benchmark_catalog);

criterion_main!(benches);
