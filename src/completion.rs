//! # Shell Completion Module
//!
//! Static completion scripts come from `clap_complete`. Headphone ids are
//! dynamic (presets plus whatever the user owns), so the hidden
//! `complete-headphones` command prints them one per line for shell
//! functions to consume.
//!
//! ```bash
//! soundsig completion bash > ~/.local/share/bash-completion/completions/soundsig
//! soundsig completion zsh > ~/.config/zsh/completions/_soundsig
//! ```

use crate::cli::Shell;
use crate::db::{Catalog, KeyValueStore};
use crate::presets::PRESETS;
use anyhow::Result;
use clap::Command;
use clap_complete::{generate, Generator, Shell as CompletionShell};
use std::io::Write;

/// Write the completion script for `gen` to `out`.
pub fn generate_completions<G: Generator>(gen: G, cmd: &mut Command, out: &mut dyn Write) {
    let name = cmd.get_name().to_string();
    generate(gen, cmd, name, out);
}

pub fn shell_to_completion_shell(shell: Shell) -> CompletionShell {
    match shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    }
}

/// Owned headphone ids first, then presets not already listed.
pub fn headphone_completions<S: KeyValueStore>(catalog: &Catalog<S>) -> Result<Vec<String>> {
    let mut ids = catalog.collection()?;
    for preset in PRESETS {
        if !ids.iter().any(|id| id == preset.id) {
            ids.push(preset.id.to_string());
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Args;
    use crate::db::MemoryStore;
    use clap::CommandFactory;

    #[test]
    fn test_bash_script_mentions_subcommands() {
        let mut out = Vec::new();
        generate_completions(shell_to_completion_shell(Shell::Bash), &mut Args::command(), &mut out);
        let script = String::from_utf8(out).unwrap();
        assert!(script.contains("soundsig"));
        assert!(script.contains("spectrum"));
        assert!(script.contains("set-default"));
    }

    #[test]
    fn test_headphone_completions_put_owned_first() {
        let mut catalog = Catalog::new(MemoryStore::new());
        catalog.add_to_collection("my-custom-iem").unwrap();
        catalog.add_to_collection("hd600").unwrap();

        let ids = headphone_completions(&catalog).unwrap();
        assert_eq!(&ids[..2], ["my-custom-iem", "hd600"]);
        assert_eq!(ids.len(), PRESETS.len() + 1);
        assert_eq!(ids.iter().filter(|id| *id == "hd600").count(), 1);
    }
}
