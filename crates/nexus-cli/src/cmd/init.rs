use super::open_app;
use crate::output::print_json;
use anyhow::Context;
use nexus_core::config::Config;
use nexus_core::{io, paths};
use std::path::Path;

pub fn run(root: &Path, demo: bool, json: bool) -> anyhow::Result<()> {
    for dir in [paths::nexus_dir(root), paths::store_dir(root)] {
        io::ensure_dir(&dir).with_context(|| format!("failed to create {}", dir.display()))?;
    }

    let config_path = paths::config_path(root);
    let created_config = !config_path.exists();
    if created_config {
        Config::default()
            .save(root)
            .context("failed to write config.yaml")?;
    }

    let mut seeded = false;
    if demo {
        let mut app = open_app(root)?;
        if !app.projects().is_empty() || !app.team().is_empty() {
            anyhow::bail!("refusing to seed demo data over existing projects or team");
        }
        app.seed_demo();
        seeded = true;
    }

    if json {
        print_json(&serde_json::json!({
            "root": root.display().to_string(),
            "config_created": created_config,
            "demo_seeded": seeded,
        }))?;
    } else {
        println!("Initialized nexus in: {}", root.display());
        let verb = if created_config { "created" } else { "exists: " };
        println!("  {verb} {}", paths::CONFIG_FILE);
        if seeded {
            println!("  seeded demo team and sample project");
        }
        println!("\nNext: nexus register --name <NAME> --email <EMAIL>");
    }
    Ok(())
}
