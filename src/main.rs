//! # Soundsig
//!
//! Command-line front end for the soundsig catalog: import LLM ratings for
//! songs and headphones, curate perspectives, categorize sound signatures,
//! build the headphone spectrum and read listening notes.
//!
//! ## Usage
//!
//! ```bash
//! # Import an LLM answer for a song
//! soundsig rate song blinding-lights answer.json --llm claude
//!
//! # Own a headphone and see where it lands
//! soundsig collection add hd600
//! soundsig spectrum
//!
//! # How does the song feel on it?
//! soundsig experience blinding-lights hd600
//! ```

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use soundsig::cli::{Args, CollectionAction, Command, RulesAction, Target};
use soundsig::commands::{self, Refinement};
use soundsig::completion;
use soundsig::config::RuntimeConfig;
use soundsig::db::{Catalog, SqliteStore};
use soundsig::rules::CustomCategoryDef;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::SystemTime;

/// Read an LLM answer from `path`, or stdin when no path or `-` is given.
fn read_answer(path: Option<&Path>) -> Result<String> {
    match path.filter(|p| *p != Path::new("-")) {
        Some(path) => fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf).context("Failed to read answer from stdin")?;
            Ok(buf)
        }
    }
}

fn rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Main entry point for soundsig.
///
/// Logging is controlled via `RUST_LOG`:
/// - `RUST_LOG=debug soundsig spectrum` - Enable debug logging
/// - `RUST_LOG=soundsig::algorithm=trace soundsig classify 5,2,5,3,3,3` - Scoring trace
fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    // Commands that never touch the catalog.
    match &args.command {
        Command::Completion { shell } => {
            let mut cmd = Args::command();
            completion::generate_completions(completion::shell_to_completion_shell(*shell), &mut cmd, &mut out);
            return Ok(());
        }
        Command::Presets => return commands::presets(&mut out),
        _ => {}
    }

    let config = RuntimeConfig::resolve(args.db)?;
    debug!("Using catalog {}", config.db_path.display());
    let mut catalog = Catalog::new(SqliteStore::open(&config.db_path)?);

    match args.command {
        Command::Rate { target: Target { kind, id }, file, llm } => {
            let raw = read_answer(file.as_deref())?;
            info!("Importing LLM answer for {id}");
            commands::rate(&mut catalog, kind.into(), &id, &raw, llm.map(Into::into), SystemTime::now(), &mut out)?;
        }
        Command::Refine { target: Target { kind, id }, bars, tags, label, keep_default } => {
            let refinement = Refinement { bars, tags, label, make_default: !keep_default };
            commands::refine(&mut catalog, kind.into(), &id, refinement, SystemTime::now(), &mut out)?;
        }
        Command::Classify { bars, mode, verbose } => {
            commands::classify(&catalog, &bars, mode.map(Into::into), verbose, &mut out)?;
        }
        Command::Show { target: Target { kind, id } } => {
            commands::show(&catalog, kind.into(), &id, &mut out)?;
        }
        Command::Perspectives { target: Target { kind, id } } => {
            commands::perspectives(&catalog, kind.into(), &id, &mut out)?;
        }
        Command::SetDefault { target: Target { kind, id }, perspective } => {
            commands::set_default(&mut catalog, kind.into(), &id, &perspective, &mut out)?;
        }
        Command::DeletePerspective { target: Target { kind, id }, perspective } => {
            commands::delete_perspective(&mut catalog, kind.into(), &id, &perspective, &mut out)?;
        }
        Command::Collection { action } => match action {
            CollectionAction::Add { id } => commands::collection_add(&mut catalog, &id, &mut out)?,
            CollectionAction::Remove { id } => commands::collection_remove(&mut catalog, &id, &mut out)?,
            CollectionAction::List => commands::collection_list(&catalog, &mut out)?,
        },
        Command::Spectrum { seed } => {
            commands::spectrum(&catalog, &mut rng(seed), &mut out)?;
        }
        Command::Reroll { category, seed } => {
            commands::reroll_slot(&mut catalog, &category, &mut rng(seed), &mut out)?;
        }
        Command::Experience { song, headphone, import, voice, llm, prompt } => {
            if let Some(path) = import {
                let raw = read_answer(Some(path.as_path()))?;
                commands::import_experience(
                    &mut catalog,
                    &song,
                    &headphone,
                    &raw,
                    &voice,
                    llm.map(Into::into),
                    SystemTime::now(),
                    &mut out,
                )?;
            } else {
                commands::experience(&catalog, &song, &headphone, prompt, &mut out)?;
            }
        }
        Command::Rules { action } => match action {
            RulesAction::Show => commands::rules_show(&catalog, &mut out)?,
            RulesAction::Mode { mode } => commands::rules_mode(&mut catalog, mode.into(), &mut out)?,
            RulesAction::AddCustom { id, name, color, description, constraints } => {
                let name = name.unwrap_or_else(|| id.clone());
                let def = CustomCategoryDef { id, name, color, description };
                commands::rules_add_custom(&mut catalog, def, &constraints, &mut out)?;
            }
            RulesAction::RemoveCustom { id } => commands::rules_remove_custom(&mut catalog, &id, &mut out)?,
            RulesAction::Reset => commands::rules_reset(&mut catalog, &mut out)?,
        },
        Command::CompleteHeadphones => {
            // Used by shell completion functions
            for id in completion::headphone_completions(&catalog)? {
                writeln!(out, "{id}")?;
            }
        }
        Command::Completion { .. } | Command::Presets => {}
    }

    Ok(())
}
