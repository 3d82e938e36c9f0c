use super::ai::{self, audio_mime, block_on, read_audio};
use super::{open_app, project_id};
use crate::output::{print_fields, print_json, print_table, truncate};
use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::Subcommand;
use gemini_agent::PlanInput;
use nexus_core::app::App;
use nexus_core::deadline;
use nexus_core::draft::DraftKey;
use nexus_core::project::{NewProject, Project, ProjectPatch};
use nexus_core::team::{self, parse_skills};
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum ProjectSubcommand {
    /// Create a project by hand
    Create {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Start date (YYYY-MM-DD, default today)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// End date (YYYY-MM-DD, default start + plan.default_duration_days)
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long)]
        budget: Option<f64>,
        /// Comma-separated technologies
        #[arg(long)]
        tech: Option<String>,
    },
    /// List projects (active by default)
    List {
        /// Show completed projects instead
        #[arg(long, conflicts_with = "all")]
        completed: bool,
        /// Show every project
        #[arg(long)]
        all: bool,
    },
    /// Show a project with its tasks and risks
    Show {
        /// Project id or name (default: selected project)
        project: Option<String>,
    },
    /// Make a project the default for task commands
    Select { project: String },
    /// Edit project fields
    Update {
        project: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long)]
        budget: Option<f64>,
        /// Comma-separated technologies, replacing the current list
        #[arg(long)]
        tech: Option<String>,
    },
    /// Delete a project and everything in it
    Delete { project: String },
    /// Generate a project from a description or an audio recording
    Plan {
        /// What to build (default: the saved draft)
        prompt: Vec<String>,
        /// Plan from an audio recording instead of text
        #[arg(long, conflicts_with = "prompt")]
        audio: Option<PathBuf>,
        #[arg(long, requires = "audio")]
        mime: Option<String>,
        /// Clean up the description before planning
        #[arg(long)]
        refine: bool,
        /// Select the new project
        #[arg(long)]
        select: bool,
    },
    /// Ask the model for risks and add them to the project
    Risks { project: Option<String> },
    /// Generate a markdown status report
    Report {
        project: Option<String>,
        /// Write the report to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Portfolio dashboard numbers
    Stats,
}

pub fn run(root: &Path, subcmd: ProjectSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ProjectSubcommand::Create {
            name,
            description,
            start,
            end,
            budget,
            tech,
        } => create(
            root,
            NewProject {
                name,
                description,
                start_date: start,
                end_date: end,
                budget,
                tech_stack: tech.as_deref().map(parse_skills).unwrap_or_default(),
            },
            json,
        ),
        ProjectSubcommand::List { completed, all } => list(root, completed, all, json),
        ProjectSubcommand::Show { project } => show(root, project.as_deref(), json),
        ProjectSubcommand::Select { project } => select(root, &project, json),
        ProjectSubcommand::Update {
            project,
            name,
            description,
            start,
            end,
            budget,
            tech,
        } => update(
            root,
            &project,
            ProjectPatch {
                name,
                description,
                start_date: start,
                end_date: end,
                budget,
                tech_stack: tech.as_deref().map(parse_skills),
            },
            json,
        ),
        ProjectSubcommand::Delete { project } => delete(root, &project, json),
        ProjectSubcommand::Plan {
            prompt,
            audio,
            mime,
            refine,
            select,
        } => plan(root, prompt.join(" "), audio, mime, refine, select, json),
        ProjectSubcommand::Risks { project } => risks(root, project.as_deref(), json),
        ProjectSubcommand::Report { project, out } => {
            report(root, project.as_deref(), out.as_deref(), json)
        }
        ProjectSubcommand::Stats => stats(root, json),
    }
}

fn summary(project: &Project) -> serde_json::Value {
    serde_json::json!({
        "id": project.id,
        "name": project.name,
        "progress": project.progress,
        "tasks": project.tasks.len(),
    })
}

// ---------------------------------------------------------------------------
// create / list / show / select
// ---------------------------------------------------------------------------

fn create(root: &Path, input: NewProject, json: bool) -> anyhow::Result<()> {
    let mut app = open_app(root)?;
    let project = app.create_project(input)?;
    if json {
        print_json(&project)?;
    } else {
        println!(
            "Created project '{}' [{}] ({} to {})",
            project.name, project.id, project.start_date, project.end_date
        );
    }
    Ok(())
}

fn list(root: &Path, completed: bool, all: bool, json: bool) -> anyhow::Result<()> {
    let mut app = open_app(root)?;
    let selected = app.selected_project().map(|p| p.id.clone());
    let projects: Vec<&Project> = if all {
        app.projects().iter().collect()
    } else if completed {
        app.completed_projects().collect()
    } else {
        app.active_projects().collect()
    };

    if json {
        let items: Vec<serde_json::Value> = projects.iter().map(|p| summary(p)).collect();
        return print_json(&items);
    }
    if projects.is_empty() {
        println!("No projects.");
        return Ok(());
    }
    let rows = projects
        .iter()
        .map(|p| {
            let marker = if selected.as_deref() == Some(p.id.as_str()) { "*" } else { "" };
            vec![
                marker.to_string(),
                p.id.clone(),
                truncate(&p.name, 40),
                format!("{}%", p.progress),
                format!("{}/{}", p.completed_count(), p.tasks.len()),
                p.end_date.to_string(),
            ]
        })
        .collect();
    print_table(&["", "ID", "NAME", "PROGRESS", "DONE", "ENDS"], rows);
    Ok(())
}

fn resolve(app: &mut App, key: Option<&str>) -> anyhow::Result<Project> {
    let id = project_id(app, key)?;
    Ok(app.project(&id)?.clone())
}

fn show(root: &Path, key: Option<&str>, json: bool) -> anyhow::Result<()> {
    let mut app = open_app(root)?;
    let project = resolve(&mut app, key)?;
    if json {
        return print_json(&project);
    }

    let team_names: Vec<&str> = project.team.iter().map(|m| m.name.as_str()).collect();
    print_fields(&[
        ("Name", project.name.clone()),
        ("Id", project.id.clone()),
        ("Description", project.description.clone()),
        ("Timeline", format!("{} to {}", project.start_date, project.end_date)),
        ("Budget", format!("{:.2}", project.budget)),
        ("Tech stack", project.tech_stack.join(", ")),
        ("Team", team_names.join(", ")),
        ("Progress", format!("{}%", project.progress)),
    ]);

    println!("\nTasks");
    if project.tasks.is_empty() {
        println!("  (none)");
    } else {
        let now = Local::now().naive_local();
        let roster: Vec<_> = project
            .team
            .iter()
            .chain(app.team().iter())
            .cloned()
            .collect();
        let rows = project
            .tasks
            .iter()
            .map(|t| {
                vec![
                    super::task::short_id(&t.id),
                    truncate(&t.title, 36),
                    t.status.to_string(),
                    t.priority.to_string(),
                    team::display_name(&roster, t.assignee_id.as_deref()),
                    deadline::classify_task(t, now).label(),
                ]
            })
            .collect();
        print_table(&["ID", "TITLE", "STATUS", "PRIORITY", "ASSIGNEE", "DEADLINE"], rows);
    }

    if !project.risks.is_empty() {
        println!("\nRisks");
        let rows = project
            .risks
            .iter()
            .map(|r| {
                vec![
                    r.severity.to_string(),
                    truncate(&r.description, 50),
                    truncate(&r.mitigation_strategy, 50),
                ]
            })
            .collect();
        print_table(&["SEVERITY", "RISK", "MITIGATION"], rows);
    }
    Ok(())
}

fn select(root: &Path, key: &str, json: bool) -> anyhow::Result<()> {
    let mut app = open_app(root)?;
    let project = app.select_project(key)?;
    if json {
        print_json(&summary(&project))?;
    } else {
        println!("Selected '{}' [{}]", project.name, project.id);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// update / delete
// ---------------------------------------------------------------------------

fn update(root: &Path, key: &str, patch: ProjectPatch, json: bool) -> anyhow::Result<()> {
    if patch.is_empty() {
        anyhow::bail!("nothing to update: pass at least one field flag");
    }
    let mut app = open_app(root)?;
    let id = app.find_project(key)?.id.clone();
    let project = app.update_project(&id, patch)?;
    if json {
        print_json(&project)?;
    } else {
        println!("Updated project '{}'", project.name);
    }
    Ok(())
}

fn delete(root: &Path, key: &str, json: bool) -> anyhow::Result<()> {
    let mut app = open_app(root)?;
    let project = app.find_project(key)?.clone();
    app.delete_project(&project.id)?;
    if json {
        print_json(&serde_json::json!({ "deleted": project.id }))?;
    } else {
        println!("Deleted project '{}'", project.name);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// AI: plan / risks / report
// ---------------------------------------------------------------------------

fn plan(
    root: &Path,
    prompt: String,
    audio: Option<PathBuf>,
    mime: Option<String>,
    refine: bool,
    select: bool,
    json: bool,
) -> anyhow::Result<()> {
    let mut app = open_app(root)?;
    app.require_user()?;
    let client = ai::client(&app)?;
    let today = Local::now().date_naive();
    let team = app.team().to_vec();

    let input = match audio {
        Some(path) => PlanInput::Audio {
            data: read_audio(&path)?,
            mime_type: Some(mime.unwrap_or_else(|| audio_mime(&path).to_string())),
        },
        None => {
            let text = if prompt.trim().is_empty() {
                app.drafts()
                    .load::<String>(&DraftKey::ProjectPrompt)
                    .unwrap_or_default()
            } else {
                prompt
            };
            if text.trim().is_empty() {
                anyhow::bail!("describe the project to plan, or pass --audio");
            }
            let text = if refine {
                block_on(client.refine_text(&text))?
            } else {
                text
            };
            // Kept until the plan is imported, so a failed call loses nothing.
            app.drafts()
                .save(&DraftKey::ProjectPrompt, &text)
                .context("failed to save the project description draft")?;
            PlanInput::Text(text)
        }
    };

    let response = block_on(client.parse_plan(input, &team, today))?
        .context("plan generation failed")?;
    let project = app.import_plan(response)?;
    if select {
        app.select_project(&project.id)?;
    }

    if json {
        print_json(&project)?;
    } else {
        println!(
            "Planned '{}' [{}] with {} tasks ({} to {})",
            project.name,
            project.id,
            project.tasks.len(),
            project.start_date,
            project.end_date
        );
    }
    Ok(())
}

fn risks(root: &Path, key: Option<&str>, json: bool) -> anyhow::Result<()> {
    let mut app = open_app(root)?;
    app.require_user()?;
    let project = resolve(&mut app, key)?;
    let client = ai::client(&app)?;
    let found = block_on(client.analyze_risks(&project))?.context("risk analysis failed")?;
    let added = app.add_risks(&project.id, found)?;
    let project = app.project(&project.id)?;

    if json {
        return print_json(&serde_json::json!({
            "project": project.id,
            "added": added,
            "risks": project.risks,
        }));
    }
    println!("Added {added} risk(s) to '{}'", project.name);
    let rows = project
        .risks
        .iter()
        .map(|r| {
            vec![
                r.severity.to_string(),
                truncate(&r.description, 50),
                truncate(&r.mitigation_strategy, 60),
            ]
        })
        .collect();
    print_table(&["SEVERITY", "RISK", "MITIGATION"], rows);
    Ok(())
}

fn report(root: &Path, key: Option<&str>, out: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let mut app = open_app(root)?;
    app.require_user()?;
    let project = resolve(&mut app, key)?;
    let client = ai::client(&app)?;
    let markdown =
        block_on(client.generate_report(&project))?.context("report generation failed")?;

    if let Some(path) = out {
        nexus_core::io::atomic_write(path, markdown.as_bytes())
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    if json {
        print_json(&serde_json::json!({ "project": project.id, "report": markdown }))?;
    } else if let Some(path) = out {
        println!("Report written to {}", path.display());
    } else {
        println!("{markdown}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// stats
// ---------------------------------------------------------------------------

fn stats(root: &Path, json: bool) -> anyhow::Result<()> {
    let app = open_app(root)?;
    let stats = app.stats();
    if json {
        return print_json(&stats);
    }
    print_fields(&[
        ("Projects", stats.total_projects.to_string()),
        ("Active", stats.active_projects.to_string()),
        ("Tasks", stats.total_tasks.to_string()),
        ("Completed", stats.completed_tasks.to_string()),
        ("Progress", format!("{}%", stats.overall_progress)),
        ("Budget", format!("{:.2}", stats.total_budget)),
    ]);
    if !stats.by_status.is_empty() {
        println!();
        let rows = stats
            .by_status
            .iter()
            .map(|c| vec![c.status.to_string(), c.count.to_string()])
            .collect();
        print_table(&["STATUS", "TASKS"], rows);
    }
    Ok(())
}
