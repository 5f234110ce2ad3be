//! Development tasks for the slopwatch workspace.
//!
//! Run with `cargo xtask <task>`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation")]
struct Xtask {
    #[command(subcommand)]
    task: Task,
}

#[derive(Subcommand)]
enum Task {
    /// Generate man pages for the CLI and its subcommands
    Man {
        /// Output directory
        #[arg(long, default_value = "target/dist/man")]
        out: PathBuf,
    },
    /// Generate shell completion scripts
    Completions {
        /// Output directory
        #[arg(long, default_value = "target/dist/completions")]
        out: PathBuf,
        /// Shells to generate for (all when omitted)
        #[arg(long, value_enum)]
        shell: Vec<CompletionShell>,
    },
    /// Generate both man pages and completions under target/dist
    Dist,
}

#[derive(Clone, Copy, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    Elvish,
    Powershell,
}

impl From<CompletionShell> for Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => Self::Bash,
            CompletionShell::Zsh => Self::Zsh,
            CompletionShell::Fish => Self::Fish,
            CompletionShell::Elvish => Self::Elvish,
            CompletionShell::Powershell => Self::PowerShell,
        }
    }
}

const ALL_SHELLS: &[CompletionShell] = &[
    CompletionShell::Bash,
    CompletionShell::Zsh,
    CompletionShell::Fish,
    CompletionShell::Elvish,
    CompletionShell::Powershell,
];

fn main() -> anyhow::Result<()> {
    match Xtask::parse().task {
        Task::Man { out } => gen_man(&out),
        Task::Completions { out, shell } => gen_completions(&out, &shell),
        Task::Dist => {
            gen_man(Path::new("target/dist/man"))?;
            gen_completions(Path::new("target/dist/completions"), &[])
        }
    }
}

fn gen_man(out: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(out).with_context(|| format!("failed to create {}", out.display()))?;
    let cmd = slopwatch::command();
    clap_mangen::generate_to(cmd, out)
        .with_context(|| format!("failed to write man pages to {}", out.display()))?;
    println!("man pages written to {}", out.display());
    Ok(())
}

fn gen_completions(out: &Path, shells: &[CompletionShell]) -> anyhow::Result<()> {
    fs::create_dir_all(out).with_context(|| format!("failed to create {}", out.display()))?;
    let shells = if shells.is_empty() { ALL_SHELLS } else { shells };
    let mut cmd = slopwatch::command();
    for &shell in shells {
        let path = clap_complete::generate_to(Shell::from(shell), &mut cmd, "slopwatch", out)
            .with_context(|| format!("failed to write completions to {}", out.display()))?;
        println!("{}", path.display());
    }
    Ok(())
}
