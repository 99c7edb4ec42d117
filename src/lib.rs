//! Sound signature catalog for songs and headphones.
//!
//! Songs and headphones are both described by six 1-5 levels (a
//! [`rating::RatingVector`]). A configurable rule table sorts those vectors
//! into listening categories, a spectrum picks one headphone per category,
//! and comparing a headphone to a song yields a short listening note.
//!
//! Core modules:
//! - [`rating`] - Dimensions, levels and rating vectors
//! - [`rules`] - Category rules, constraints and custom categories
//! - [`algorithm`] - Category scoring engine
//! - [`perspective`] - Generic multi-perspective container
//! - [`signature`] - Song and headphone signatures built on perspectives
//! - [`spectrum`] - One representative headphone per category
//! - [`experience`] - Headphone/song comparison notes and reviewer voices
//!
//! ### Supporting Modules
//!
//! - [`parse`] - Validation of LLM JSON answers
//! - [`presets`] - Built-in headphone catalog
//! - [`db`] - Key-value catalog store (SQLite or in-memory)
//! - [`config`] - Data directory and database location
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`commands`] - Command implementations used by the binary
//! - [`completion`] - Shell completion generation
//!
//! ## Quick Start Example
//!
//! ```
//! use soundsig::algorithm::ScoringContext;
//! use soundsig::experience::derive_experience_note;
//! use soundsig::presets::preset_by_id;
//! use soundsig::rating::RatingVector;
//! use soundsig::rules::BuiltinCategory;
//!
//! let song: RatingVector = "5,2,5,3,3,3".parse()?;
//! let context = ScoringContext::default();
//! assert_eq!(context.derive(&song).primary, BuiltinCategory::VShaped.into());
//!
//! let hd600 = preset_by_id("hd600").unwrap();
//! let note = derive_experience_note(&hd600.baseline.bars, &song);
//! println!("{}", note.tagline);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Error Handling
//!
//! Domain validation returns typed errors ([`rating::VectorError`],
//! [`rules::RuleError`], [`parse::ParseError`],
//! [`perspective::PerspectiveError`]). Storage and command code returns
//! `anyhow::Result` with context attached.

pub mod algorithm;
pub mod cli;
pub mod commands;
pub mod completion;
pub mod config;
pub mod db;
pub mod experience;
pub mod parse;
pub mod perspective;
pub mod presets;
pub mod rating;
pub mod rules;
pub mod signature;
pub mod spectrum;
