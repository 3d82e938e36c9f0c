use super::open_app;
use crate::output::{print_json, print_table};
use chrono::Local;
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum NotifySubcommand {
    /// Show notifications, newest first
    List {
        /// Only unread notifications
        #[arg(long)]
        unread: bool,
    },
    /// Delete every notification
    Clear,
    /// Mark every notification as read
    Read,
}

pub fn run(root: &Path, subcmd: NotifySubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        NotifySubcommand::List { unread } => list(root, unread, json),
        NotifySubcommand::Clear => clear(root, json),
        NotifySubcommand::Read => read(root, json),
    }
}

fn list(root: &Path, unread: bool, json: bool) -> anyhow::Result<()> {
    let app = open_app(root)?;
    let log = app.notifications();
    let items: Vec<_> = log
        .items()
        .iter()
        .filter(|n| !unread || !n.read)
        .collect();

    if json {
        return print_json(&serde_json::json!({
            "unread": log.unread_count(),
            "items": items,
        }));
    }
    if items.is_empty() {
        println!("No notifications.");
        return Ok(());
    }
    let rows = items
        .iter()
        .map(|n| {
            vec![
                if n.read { "" } else { "*" }.to_string(),
                n.time.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
                n.kind.to_string(),
                n.title.clone(),
                n.message.clone(),
            ]
        })
        .collect();
    print_table(&["", "WHEN", "TYPE", "TITLE", "MESSAGE"], rows);
    println!("\n{} unread", log.unread_count());
    Ok(())
}

fn clear(root: &Path, json: bool) -> anyhow::Result<()> {
    let mut app = open_app(root)?;
    app.require_user()?;
    let count = app.notifications().len();
    app.clear_notifications();
    if json {
        print_json(&serde_json::json!({ "cleared": count }))?;
    } else {
        println!("Cleared {count} notification(s)");
    }
    Ok(())
}

fn read(root: &Path, json: bool) -> anyhow::Result<()> {
    let mut app = open_app(root)?;
    app.require_user()?;
    let flipped = app.mark_notifications_read();
    if json {
        print_json(&serde_json::json!({ "marked_read": flipped }))?;
    } else {
        println!("Marked {flipped} notification(s) as read");
    }
    Ok(())
}
