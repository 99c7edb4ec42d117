//! # Integration Tests for Soundsig
//!
//! End-to-end checks against a real SQLite catalog: the library surface
//! through [`Catalog`], and the binary through its command line.

use anyhow::Result;
use soundsig::algorithm::{FilterMode, ScoringContext};
use soundsig::commands::{self, EntityKind};
use soundsig::db::{Catalog, KeyValueStore, SqliteStore};
use soundsig::presets::PRESETS;
use soundsig::rules::BuiltinCategory;
use soundsig::signature::{PerspectiveSource, Signature};
use soundsig::spectrum::{build_spectrum, SlotSource};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tempfile::TempDir;

const SONG_ANSWER: &str = r#"```json
{
  "tags": ["synthwave", "punchy"],
  "bars": [
    {"label": "Bass Presence", "level": "high"},
    {"label": "Vocal Focus", "level": "mid-low"},
    {"label": "Treble Detail", "level": "high"},
    {"label": "Soundstage", "level": "mid"},
    {"label": "Dynamic Range", "level": "mid"},
    {"label": "Warmth", "level": "mid"}
  ],
  "sections": [{"time": "0:00", "label": "Intro", "description": "Arpeggiated synths"}]
}
```"#;

/// Test helper to create an empty catalog file in a temporary directory
fn create_test_catalog() -> Result<(TempDir, PathBuf)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("catalog.db");
    Ok((temp_dir, db_path))
}

fn at(millis: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_millis(millis)
}

fn soundsig(db: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_soundsig"))
        .arg("--db")
        .arg(db)
        .args(args)
        .env_remove("SOUNDSIG_DB")
        .output()
        .expect("Failed to run soundsig")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[cfg(test)]
mod catalog_tests {
    use super::*;

    #[test]
    fn test_sqlite_store_roundtrip_and_upsert() -> Result<()> {
        let (_dir, db_path) = create_test_catalog()?;
        let mut store = SqliteStore::open(&db_path)?;
        store.put("a", "1")?;
        store.put("a", "2")?;
        assert_eq!(store.get("a")?.as_deref(), Some("2"));
        store.remove("a")?;
        assert_eq!(store.get("a")?, None);
        Ok(())
    }

    #[test]
    fn test_catalog_survives_reopen() -> Result<()> {
        let (_dir, db_path) = create_test_catalog()?;
        {
            let mut catalog = Catalog::new(SqliteStore::open(&db_path)?);
            let mut sink = Vec::new();
            commands::rate(&mut catalog, EntityKind::Song, "blinding-lights", SONG_ANSWER, None, at(10), &mut sink)?;
            commands::collection_add(&mut catalog, "hd800s", &mut sink)?;
            catalog.set_filter_mode(FilterMode::Ballpark)?;
        }

        let catalog = Catalog::new(SqliteStore::open(&db_path)?);
        let song = catalog.song_signature("blinding-lights")?.expect("song saved");
        assert_eq!(song.default_perspective_id(), "llm-10");
        assert_eq!(song.resolve_active().source, PerspectiveSource::Llm);
        assert_eq!(song.tags(), ["synthwave", "punchy"]);
        assert_eq!(catalog.collection()?, ["hd800s"]);
        assert_eq!(catalog.filter_mode()?, FilterMode::Ballpark);
        Ok(())
    }

    #[test]
    fn test_song_category_uses_current_rules() -> Result<()> {
        let (_dir, db_path) = create_test_catalog()?;
        let mut catalog = Catalog::new(SqliteStore::open(&db_path)?);
        commands::rate(&mut catalog, EntityKind::Song, "s", SONG_ANSWER, None, at(1), &mut Vec::new())?;

        let song = catalog.song_signature("s")?.expect("song saved");
        assert_eq!(song.stored_category(), None);
        let categories = song.categories(&catalog.scoring_context()?);
        assert_eq!(categories.primary, BuiltinCategory::VShaped.into());
        Ok(())
    }

    #[test]
    fn test_spectrum_prefers_owned_headphones() -> Result<()> {
        let (_dir, db_path) = create_test_catalog()?;
        let mut catalog = Catalog::new(SqliteStore::open(&db_path)?);
        commands::collection_add(&mut catalog, "hd600", &mut Vec::new())?;

        let ids = catalog.collection()?;
        let signatures = catalog.headphone_signatures(&ids)?;
        let mut rng = <rand::rngs::StdRng as rand::SeedableRng>::seed_from_u64(3);
        let slots = build_spectrum(PRESETS, &ids, &signatures, &catalog.spectrum_pins()?, &ScoringContext::default(), &mut rng);

        assert_eq!(slots.len(), BuiltinCategory::PRIORITY.len());
        let intimate = slots.iter().find(|s| s.category == BuiltinCategory::Intimate).expect("intimate slot");
        assert_eq!(intimate.source, SlotSource::Collection);
        assert_eq!(intimate.preset_id.as_deref(), Some("hd600"));
        let bright = slots.iter().find(|s| s.category == BuiltinCategory::Bright).expect("bright slot");
        assert_eq!(bright.source, SlotSource::None);
        Ok(())
    }

    #[test]
    fn test_corrupt_record_reads_as_missing() -> Result<()> {
        let (_dir, db_path) = create_test_catalog()?;
        let mut catalog = Catalog::new(SqliteStore::open(&db_path)?);
        catalog.store_mut().put(&soundsig::db::song_signature_key("s"), "{not json")?;
        assert!(catalog.song_signature("s")?.is_none());
        Ok(())
    }

    #[test]
    fn test_signature_json_shape() -> Result<()> {
        let (_dir, db_path) = create_test_catalog()?;
        let mut catalog = Catalog::new(SqliteStore::open(&db_path)?);
        commands::rate(&mut catalog, EntityKind::Song, "s", SONG_ANSWER, None, at(1), &mut Vec::new())?;

        let raw = catalog.store().get(&soundsig::db::song_signature_key("s"))?.expect("stored");
        let value: serde_json::Value = serde_json::from_str(&raw)?;
        assert_eq!(value["defaultPerspectiveId"], "llm-1");
        assert_eq!(value["bars"][0]["label"], "Bass Presence");
        assert_eq!(value["perspectives"][0]["sections"][0]["label"], "Intro");

        let decoded: Signature = serde_json::from_str(&raw)?;
        assert_eq!(decoded.perspectives().len(), 1);
        Ok(())
    }
}

#[cfg(test)]
mod cli_tests {
    use super::*;

    #[test]
    fn test_cli_help_displays_correctly() {
        let output = Command::new(env!("CARGO_BIN_EXE_soundsig")).arg("--help").output().expect("Failed to run help");
        let text = stdout(&output);
        assert!(output.status.success());
        assert!(text.contains("soundsig"));
        assert!(text.contains("spectrum"));
    }

    #[test]
    fn test_classify_command() -> Result<()> {
        let (_dir, db_path) = create_test_catalog()?;
        let output = soundsig(&db_path, &["classify", "5,2,5,3,3,3"]);
        assert!(output.status.success());
        assert!(stdout(&output).starts_with("v-shaped (precise)"));

        let output = soundsig(&db_path, &["classify", "1,2,3"]);
        assert!(!output.status.success());
        Ok(())
    }

    #[test]
    fn test_rate_then_experience() -> Result<()> {
        let (dir, db_path) = create_test_catalog()?;
        let answer = dir.path().join("answer.json");
        std::fs::write(&answer, SONG_ANSWER)?;

        let output = soundsig(&db_path, &["rate", "song", "blinding-lights", answer.to_str().unwrap(), "--llm", "claude"]);
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
        assert!(stdout(&output).contains("Category: v-shaped"));

        let output = soundsig(&db_path, &["experience", "blinding-lights", "hd600"]);
        assert!(output.status.success());
        assert!(stdout(&output).starts_with("Expect "));

        let output = soundsig(&db_path, &["experience", "unknown-song", "hd600"]);
        assert!(!output.status.success());
        Ok(())
    }

    #[test]
    fn test_completion_generation() -> Result<()> {
        let (_dir, db_path) = create_test_catalog()?;
        let output = soundsig(&db_path, &["completion", "bash"]);
        assert!(output.status.success());
        assert!(stdout(&output).contains("soundsig"));

        let output = soundsig(&db_path, &["complete-headphones"]);
        assert_eq!(stdout(&output).lines().count(), PRESETS.len());
        Ok(())
    }
}
