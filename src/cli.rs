//! # Command-Line Interface Module
//!
//! Clap derive definitions for the `soundsig` binary. Parsing only; the
//! commands themselves live in [`crate::commands`].
//!
//! ## Commands
//!
//! - `rate`: Import an LLM signature for a song or headphone
//! - `refine`: Add a hand-tuned perspective
//! - `classify`: Categorize raw levels without saving anything
//! - `show` / `perspectives` / `set-default` / `delete-perspective`: Inspect and curate signatures
//! - `collection`: Manage owned headphones
//! - `spectrum` / `reroll`: One headphone per category
//! - `experience`: How a song feels on a headphone
//! - `rules`: Category rules, filter mode and custom categories
//! - `presets`: List built-in headphones
//!
//! ## Examples
//!
//! ```bash
//! soundsig rate song blinding-lights answer.json --llm claude
//! soundsig classify 5,2,5,3,3,3
//! soundsig experience blinding-lights hd600
//! soundsig rules mode ballpark
//! ```

use crate::algorithm::FilterMode;
use crate::commands::EntityKind;
use crate::rating::{Dimension, RatingVector};
use crate::rules::Constraint;
use crate::signature::LlmTag;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// Which kind of entity a signature belongs to.
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum Kind {
    Song,
    Headphone,
}

impl From<Kind> for EntityKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Song => EntityKind::Song,
            Kind::Headphone => EntityKind::Headphone,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum Mode {
    /// Only the exact ranges count
    Precise,
    /// Gradients widen every range
    Ballpark,
}

impl From<Mode> for FilterMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Precise => FilterMode::Precise,
            Mode::Ballpark => FilterMode::Ballpark,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum Assistant {
    Chatgpt,
    Gemini,
    Claude,
    Other,
}

impl From<Assistant> for LlmTag {
    fn from(assistant: Assistant) -> Self {
        match assistant {
            Assistant::Chatgpt => LlmTag::Chatgpt,
            Assistant::Gemini => LlmTag::Gemini,
            Assistant::Claude => LlmTag::Claude,
            Assistant::Other => LlmTag::Other,
        }
    }
}

/// Main application arguments structure.
#[derive(Parser, Debug)]
#[command(name = "soundsig")]
#[command(about = "Soundsig: pair songs with headphones and classify their sound signatures")]
#[command(version)]
pub struct Args {
    /// Catalog database to use instead of the platform default
    #[arg(long, env = "SOUNDSIG_DB", global = true)]
    pub db: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// An entity addressed by kind and id.
#[derive(ClapArgs, Debug, Clone)]
pub struct Target {
    /// song or headphone
    #[arg(value_enum)]
    pub kind: Kind,

    /// Song id or headphone id (preset ids work for headphones)
    pub id: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import a signature answer from an LLM
    ///
    /// Reads `{"tags": [...], "bars": [...]}` JSON (Markdown fences are fine)
    /// from FILE, or from stdin when FILE is omitted or `-`. The new
    /// perspective becomes the default.
    Rate {
        #[command(flatten)]
        target: Target,

        /// JSON file with the LLM answer
        file: Option<PathBuf>,

        /// Assistant that produced the answer
        #[arg(long, value_enum)]
        llm: Option<Assistant>,
    },

    /// Add a hand-tuned perspective
    ///
    /// Levels are given in dimension order (bass, vocal, treble, soundstage,
    /// dynamic range, warmth) as numbers 1-5 or level names.
    Refine {
        #[command(flatten)]
        target: Target,

        /// Six levels, e.g. `5,2,5,3,3,3`
        #[arg(value_parser = parse_vector)]
        bars: RatingVector,

        /// Tags for the perspective
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,

        /// Display label
        #[arg(long, default_value = "Manual")]
        label: String,

        /// Store this perspective without making it the default
        #[arg(long)]
        keep_default: bool,
    },

    /// Categorize six levels using the current rules
    Classify {
        /// Six levels, e.g. `5,2,5,3,3,3`
        #[arg(value_parser = parse_vector)]
        bars: RatingVector,

        /// Override the stored filter mode
        #[arg(long, value_enum)]
        mode: Option<Mode>,

        /// Print every matching category with its score
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show the active perspective of a signature
    Show {
        #[command(flatten)]
        target: Target,
    },

    /// List every perspective of a signature
    Perspectives {
        #[command(flatten)]
        target: Target,
    },

    /// Choose which perspective a signature shows
    SetDefault {
        #[command(flatten)]
        target: Target,

        /// Perspective id (see `perspectives`)
        perspective: String,
    },

    /// Delete one perspective; the last one cannot be deleted
    DeletePerspective {
        #[command(flatten)]
        target: Target,

        /// Perspective id (see `perspectives`)
        perspective: String,
    },

    /// Manage the headphones you own
    Collection {
        #[command(subcommand)]
        action: CollectionAction,
    },

    /// One representative headphone per category
    Spectrum {
        /// Seed for the random preset picks
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Pick a different headphone for one spectrum category and remember it
    Reroll {
        /// Built-in category, e.g. `warm`
        category: String,

        /// Seed for the random pick
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Describe how a song will feel on a headphone
    Experience {
        /// Song id
        song: String,

        /// Headphone id
        headphone: String,

        /// Import an LLM-written note from FILE (`-` for stdin)
        #[arg(long, value_name = "FILE")]
        import: Option<PathBuf>,

        /// Reviewer voice of the imported note
        #[arg(long, default_value = "neutral")]
        voice: String,

        /// Assistant that wrote the imported note
        #[arg(long, value_enum)]
        llm: Option<Assistant>,

        /// Print the per-dimension comparison used in LLM prompts
        #[arg(long)]
        prompt: bool,
    },

    /// Inspect and edit category rules
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },

    /// List built-in headphone presets with their baseline category
    Presets,

    /// Generate shell completions
    ///
    /// Usage: soundsig completion bash > ~/.local/share/bash-completion/completions/soundsig
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },

    /// List headphone ids for completion (hidden command)
    #[command(hide = true)]
    CompleteHeadphones,
}

#[derive(Subcommand, Debug)]
pub enum CollectionAction {
    /// Add a headphone id
    Add { id: String },
    /// Remove a headphone id
    Remove { id: String },
    /// List owned headphones with their categories
    List,
}

#[derive(Subcommand, Debug)]
pub enum RulesAction {
    /// Print the rule set and filter mode
    Show,

    /// Set the filter mode used for categorization
    Mode {
        #[arg(value_enum)]
        mode: Mode,
    },

    /// Create a custom category
    AddCustom {
        /// Category id; must not clash with a built-in
        id: String,

        /// Display name
        #[arg(long)]
        name: Option<String>,

        /// Badge color
        #[arg(long, default_value = "#888888")]
        color: String,

        #[arg(long)]
        description: Option<String>,

        /// Constraint as `DIMENSION=MIN:MAX[:GRADIENT]`, e.g. `soundstage=4:5:1`
        #[arg(short, long = "constraint", value_parser = parse_constraint, required = true)]
        constraints: Vec<(Dimension, Constraint)>,
    },

    /// Delete a custom category and its rule
    RemoveCustom { id: String },

    /// Restore the default rules and drop custom categories
    Reset,
}

fn parse_vector(s: &str) -> Result<RatingVector, String> {
    s.parse().map_err(|e| format!("{e}"))
}

fn parse_dimension(name: &str) -> Option<Dimension> {
    let name = name.trim();
    Dimension::ALL
        .into_iter()
        .find(|dim| dim.label().eq_ignore_ascii_case(name) || dim.short_name().eq_ignore_ascii_case(name))
}

/// `soundstage=4:5:1` or `Dynamic Range=3:4`.
fn parse_constraint(s: &str) -> Result<(Dimension, Constraint), String> {
    let (name, range) = s.split_once('=').ok_or_else(|| format!("expected DIMENSION=MIN:MAX[:GRADIENT], got `{s}`"))?;
    let dimension = parse_dimension(name).ok_or_else(|| format!("unknown dimension `{name}`"))?;

    let numbers: Vec<u8> = range
        .split(':')
        .map(|part| part.trim().parse::<u8>().map_err(|e| format!("`{part}`: {e}")))
        .collect::<Result<_, _>>()?;
    let constraint = match numbers[..] {
        [min, max] => Constraint::new(min, max, 0),
        [min, max, gradient] => Constraint::new(min, max, gradient),
        _ => return Err(format!("expected MIN:MAX or MIN:MAX:GRADIENT, got `{range}`")),
    }
    .map_err(|e| e.to_string())?;

    Ok((dimension, constraint))
}
