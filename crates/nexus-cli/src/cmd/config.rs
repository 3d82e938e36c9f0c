use crate::output::{print_fields, print_json};
use anyhow::Context;
use clap::Subcommand;
use nexus_core::config::{Config, WarnLevel};
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the effective configuration
    Show,
    /// Validate the config for common mistakes
    Validate,
}

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    match subcmd {
        ConfigSubcommand::Show => show(&config, json),
        ConfigSubcommand::Validate => validate(&config, json),
    }
}

fn show(config: &Config, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(config);
    }
    let key_state = match std::env::var(&config.ai.api_key_env) {
        Ok(v) if !v.trim().is_empty() => "set",
        _ => "not set",
    };
    print_fields(&[
        ("ai.base_url", config.ai.base_url.clone()),
        (
            "ai.api_key_env",
            format!("{} ({key_state})", config.ai.api_key_env),
        ),
        ("ai.fast_model", config.ai.fast_model.clone()),
        ("ai.pro_model", config.ai.pro_model.clone()),
        ("ai.thinking_budget", config.ai.thinking_budget.to_string()),
        (
            "reminders.interval_secs",
            config.reminders.interval_secs.to_string(),
        ),
        (
            "tasks.default_estimated_hours",
            config.tasks.default_estimated_hours.to_string(),
        ),
        (
            "plan.default_duration_days",
            config.plan.default_duration_days.to_string(),
        ),
    ]);
    Ok(())
}

fn validate(config: &Config, json: bool) -> anyhow::Result<()> {
    let warnings = config.validate();

    if json {
        print_json(&serde_json::json!({ "warnings": warnings }))?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}
