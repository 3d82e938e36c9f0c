pub mod ai;
pub mod auth;
pub mod config;
pub mod init;
pub mod notify;
pub mod project;
pub mod search;
pub mod task;
pub mod team;
pub mod theme;
pub mod watch;

use anyhow::Context;
use clap::Args;
use nexus_core::app::{App, Outcome};
use nexus_core::clock::SystemClock;
use nexus_core::config::Config;
use nexus_core::store::FileStore;
use serde::Serialize;
use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;

/// Open the coordinator over the file store under `root`.
pub fn open_app(root: &Path) -> anyhow::Result<App> {
    let config = Config::load(root)
        .with_context(|| format!("failed to load config under {}", root.display()))?;
    Ok(App::open(
        Arc::new(FileStore::new(root)),
        Arc::new(SystemClock),
        config,
    ))
}

/// Resolve `--project` (id or name), falling back to the selected project.
pub fn project_id(app: &mut App, explicit: Option<&str>) -> anyhow::Result<String> {
    if let Some(key) = explicit {
        return Ok(app.find_project(key)?.id.clone());
    }
    app.selected_project()
        .map(|p| p.id.clone())
        .context("no project selected: pass --project or run 'nexus project select'")
}

// ---------------------------------------------------------------------------
// Completion gate
// ---------------------------------------------------------------------------

/// Answer to the "mark project as completed?" question, given up front.
#[derive(Args, Debug, Clone, Default)]
pub struct GateArgs {
    /// Confirm project completion without asking
    #[arg(long, conflicts_with = "no")]
    pub yes: bool,

    /// Decline project completion without asking
    #[arg(long)]
    pub no: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Settled {
    Committed,
    ProjectCompleted,
    CompletionDeclined,
    Unchanged,
}

impl Settled {
    pub fn message(self) -> &'static str {
        match self {
            Settled::Committed => "saved",
            Settled::ProjectCompleted => "saved; project marked as completed",
            Settled::CompletionDeclined => "project completion declined; change discarded",
            Settled::Unchanged => "nothing changed",
        }
    }
}

fn ask(question: &str) -> anyhow::Result<bool> {
    eprint!("{question} [y/N] ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    let read = std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read answer from stdin")?;
    if read == 0 {
        eprintln!();
        return Ok(false);
    }
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Resolve a staged completion, if any, from the flags or an interactive
/// answer. EOF on stdin declines.
pub fn settle(app: &mut App, outcome: Outcome, gate: &GateArgs) -> anyhow::Result<Settled> {
    match outcome {
        Outcome::Committed => return Ok(Settled::Committed),
        Outcome::Unchanged => return Ok(Settled::Unchanged),
        Outcome::AwaitingConfirmation => {}
    }
    let name = app
        .pending_completion()
        .map(|p| p.name.clone())
        .unwrap_or_default();
    let confirmed = if gate.yes {
        true
    } else if gate.no {
        false
    } else {
        ask(&format!(
            "All tasks in '{name}' are done. Mark the project as completed?"
        ))?
    };
    if confirmed {
        app.confirm_completion()?;
        Ok(Settled::ProjectCompleted)
    } else {
        app.decline_completion()?;
        Ok(Settled::CompletionDeclined)
    }
}
