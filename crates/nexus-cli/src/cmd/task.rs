use super::{open_app, project_id, settle, GateArgs, Settled};
use crate::output::{print_json, print_table, truncate};
use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Args, Subcommand};
use nexus_core::app::App;
use nexus_core::deadline;
use nexus_core::draft::DraftKey;
use nexus_core::project::Project;
use nexus_core::reminder::parse_reminder;
use nexus_core::task::{NewTask, Task};
use nexus_core::team;
use nexus_core::types::{Priority, TaskStatus};
use std::path::Path;

const SHORT_ID_LEN: usize = 8;

#[derive(Args, Default)]
pub struct TaskFields {
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub priority: Option<Priority>,
    /// Estimated effort in hours
    #[arg(long)]
    pub hours: Option<f64>,
    /// Member id or name; an empty value unassigns
    #[arg(long)]
    pub assignee: Option<String>,
    /// Due date (YYYY-MM-DD); an empty value clears it
    #[arg(long)]
    pub deadline: Option<String>,
    /// Reminder time, e.g. "2026-03-10 09:30"; an empty value clears it
    #[arg(long)]
    pub reminder: Option<String>,
}

#[derive(Subcommand)]
pub enum TaskSubcommand {
    /// Add a task (starts Pending)
    Add {
        /// Task title (default: the saved draft's title)
        title: Vec<String>,
        /// Project id or name (default: selected project)
        #[arg(long)]
        project: Option<String>,
        #[command(flatten)]
        fields: TaskFields,
        /// Save the task as a draft instead of creating it
        #[arg(long)]
        save_draft: bool,
    },
    /// Edit task fields; status changes go through `move`
    Edit {
        task: String,
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        fields: TaskFields,
        /// Start from the saved edit draft rather than the stored task
        #[arg(long)]
        resume: bool,
        /// Save the edits as a draft instead of applying them
        #[arg(long, conflicts_with = "resume")]
        save_draft: bool,
    },
    /// Move a task to another status column
    Move {
        task: String,
        /// pending, in-progress, completed, or blocked
        status: TaskStatus,
        #[arg(long)]
        project: Option<String>,
        #[command(flatten)]
        gate: GateArgs,
    },
    /// Delete a task
    Delete {
        task: String,
        #[arg(long)]
        project: Option<String>,
        #[command(flatten)]
        gate: GateArgs,
    },
    /// Show a task's change history, newest first
    History {
        task: String,
        #[arg(long)]
        project: Option<String>,
    },
    /// List a project's tasks
    List {
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        status: Option<TaskStatus>,
    },
}

pub fn run(root: &Path, subcmd: TaskSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        TaskSubcommand::Add {
            title,
            project,
            fields,
            save_draft,
        } => add(root, project.as_deref(), title.join(" "), fields, save_draft, json),
        TaskSubcommand::Edit {
            task,
            project,
            title,
            fields,
            resume,
            save_draft,
        } => edit(
            root,
            project.as_deref(),
            &task,
            title,
            fields,
            resume,
            save_draft,
            json,
        ),
        TaskSubcommand::Move {
            task,
            status,
            project,
            gate,
        } => move_to(root, project.as_deref(), &task, status, &gate, json),
        TaskSubcommand::Delete {
            task,
            project,
            gate,
        } => delete(root, project.as_deref(), &task, &gate, json),
        TaskSubcommand::History { task, project } => history(root, project.as_deref(), &task, json),
        TaskSubcommand::List { project, status } => list(root, project.as_deref(), status, json),
    }
}

// ---------------------------------------------------------------------------
// Lookup helpers
// ---------------------------------------------------------------------------

pub fn short_id(id: &str) -> String {
    id.chars().take(SHORT_ID_LEN).collect()
}

/// Find a task by id, title, or unambiguous id prefix.
fn resolve_task<'a>(project: &'a Project, key: &str) -> anyhow::Result<&'a Task> {
    if let Ok(task) = project.find_task(key) {
        return Ok(task);
    }
    let mut hits = project.tasks.iter().filter(|t| t.id.starts_with(key));
    match (hits.next(), hits.next()) {
        (Some(task), None) => Ok(task),
        (Some(_), Some(_)) => anyhow::bail!("task id prefix '{key}' is ambiguous"),
        _ => Err(nexus_core::NexusError::TaskNotFound(key.to_string()).into()),
    }
}

fn load_project(app: &mut App, key: Option<&str>) -> anyhow::Result<Project> {
    let id = project_id(app, key)?;
    Ok(app.project(&id)?.clone())
}

/// Member id for `key`, looked up in the project snapshot and then the
/// global roster. An empty key means "unassigned".
fn resolve_assignee(app: &App, project: &Project, key: &str) -> anyhow::Result<Option<String>> {
    if key.trim().is_empty() {
        return Ok(None);
    }
    let in_project = team::find(&project.team, key)
        .or_else(|| project.team.iter().find(|m| m.name.eq_ignore_ascii_case(key)));
    match in_project {
        Some(m) => Ok(Some(m.id.clone())),
        None => Ok(Some(app.member(key)?.id.clone())),
    }
}

fn parse_deadline(raw: &str) -> anyhow::Result<Option<NaiveDate>> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map(Some)
        .with_context(|| format!("invalid deadline '{raw}': expected YYYY-MM-DD"))
}

fn check_reminder(raw: &str) -> anyhow::Result<Option<String>> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    parse_reminder(raw.trim())
        .with_context(|| format!("unrecognized reminder time '{raw}'"))?;
    Ok(Some(raw.trim().to_string()))
}

fn print_settled(settled: Settled, what: &str, json: bool, extra: serde_json::Value) -> anyhow::Result<()> {
    if json {
        let mut body = serde_json::json!({ "result": settled });
        if let (Some(obj), serde_json::Value::Object(more)) = (body.as_object_mut(), extra) {
            obj.extend(more);
        }
        print_json(&body)
    } else {
        match settled {
            Settled::Committed => println!("{what}"),
            other => println!("{what}: {}", other.message()),
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// add / edit
// ---------------------------------------------------------------------------

fn add(
    root: &Path,
    project: Option<&str>,
    title: String,
    fields: TaskFields,
    save_draft: bool,
    json: bool,
) -> anyhow::Result<()> {
    let mut app = open_app(root)?;
    let project = load_project(&mut app, project)?;
    let draft_key = DraftKey::NewTask {
        project_id: project.id.clone(),
    };

    let mut draft: NewTask = app.drafts().load(&draft_key).unwrap_or_default();
    if !title.trim().is_empty() {
        draft.title = title;
    }
    if let Some(d) = fields.description {
        draft.description = d;
    }
    if let Some(p) = fields.priority {
        draft.priority = Some(p);
    }
    if let Some(h) = fields.hours {
        draft.estimated_hours = Some(h);
    }
    if let Some(a) = fields.assignee {
        draft.assignee_id = resolve_assignee(&app, &project, &a)?;
    }
    if let Some(d) = fields.deadline {
        draft.deadline = parse_deadline(&d)?;
    }
    if let Some(r) = fields.reminder {
        draft.reminder_at = check_reminder(&r)?;
    }

    if save_draft {
        app.drafts()
            .save(&draft_key, &draft)
            .context("failed to save task draft")?;
        if json {
            print_json(&serde_json::json!({ "draft": draft }))?;
        } else {
            println!("Saved task draft for '{}'", project.name);
        }
        return Ok(());
    }

    let title = draft.title.clone();
    let outcome = app.create_task(&project.id, draft)?;
    let settled = settle(&mut app, outcome, &GateArgs::default())?;
    print_settled(
        settled,
        &format!("Added task '{title}' to '{}'", project.name),
        json,
        serde_json::json!({ "project": project.id, "title": title }),
    )
}

#[allow(clippy::too_many_arguments)]
fn edit(
    root: &Path,
    project: Option<&str>,
    key: &str,
    title: Option<String>,
    fields: TaskFields,
    resume: bool,
    save_draft: bool,
    json: bool,
) -> anyhow::Result<()> {
    let mut app = open_app(root)?;
    let project = load_project(&mut app, project)?;
    let stored = resolve_task(&project, key)?.clone();
    let draft_key = DraftKey::EditTask {
        project_id: project.id.clone(),
        task_id: stored.id.clone(),
    };

    let mut edited = if resume {
        app.drafts()
            .load::<Task>(&draft_key)
            .with_context(|| format!("no saved edit draft for task '{}'", stored.title))?
    } else {
        stored.clone()
    };
    if let Some(t) = title {
        edited.title = t;
    }
    if let Some(d) = fields.description {
        edited.description = d;
    }
    if let Some(p) = fields.priority {
        edited.priority = p;
    }
    if let Some(h) = fields.hours {
        edited.estimated_hours = h;
    }
    if let Some(a) = fields.assignee {
        edited.assignee_id = resolve_assignee(&app, &project, &a)?;
    }
    if let Some(d) = fields.deadline {
        edited.deadline = parse_deadline(&d)?;
    }
    if let Some(r) = fields.reminder {
        edited.reminder_at = check_reminder(&r)?;
    }

    if save_draft {
        app.drafts()
            .save(&draft_key, &edited)
            .context("failed to save edit draft")?;
        if !json {
            println!("Saved edit draft for '{}'", stored.title);
            return Ok(());
        }
        return print_json(&serde_json::json!({ "draft": edited }));
    }

    let outcome = app.update_task(&project.id, edited)?;
    let settled = settle(&mut app, outcome, &GateArgs::default())?;
    let changes = app
        .project(&project.id)
        .ok()
        .and_then(|p| p.task(&stored.id))
        .map(|t| t.history.len().saturating_sub(stored.history.len()))
        .unwrap_or(0);
    print_settled(
        settled,
        &format!("Updated task '{}' ({changes} change(s))", stored.title),
        json,
        serde_json::json!({ "task": stored.id, "changes": changes }),
    )
}

// ---------------------------------------------------------------------------
// move / delete
// ---------------------------------------------------------------------------

fn move_to(
    root: &Path,
    project: Option<&str>,
    key: &str,
    status: TaskStatus,
    gate: &GateArgs,
    json: bool,
) -> anyhow::Result<()> {
    let mut app = open_app(root)?;
    let project = load_project(&mut app, project)?;
    let task = resolve_task(&project, key)?.clone();
    let outcome = app.move_task(&project.id, &task.id, status)?;
    let settled = settle(&mut app, outcome, gate)?;

    let progress = app.project(&project.id).map(|p| p.progress).unwrap_or(0);
    print_settled(
        settled,
        &format!("Moved '{}' to {status} (project {progress}%)", task.title),
        json,
        serde_json::json!({
            "project": project.id,
            "task": task.id,
            "status": status,
            "progress": progress,
        }),
    )
}

fn delete(
    root: &Path,
    project: Option<&str>,
    key: &str,
    gate: &GateArgs,
    json: bool,
) -> anyhow::Result<()> {
    let mut app = open_app(root)?;
    let project = load_project(&mut app, project)?;
    let task = resolve_task(&project, key)?.clone();
    let outcome = app.delete_task(&project.id, &task.id)?;
    let settled = settle(&mut app, outcome, gate)?;
    print_settled(
        settled,
        &format!("Deleted task '{}'", task.title),
        json,
        serde_json::json!({ "project": project.id, "task": task.id }),
    )
}

// ---------------------------------------------------------------------------
// history / list
// ---------------------------------------------------------------------------

fn history(root: &Path, project: Option<&str>, key: &str, json: bool) -> anyhow::Result<()> {
    let mut app = open_app(root)?;
    let project = load_project(&mut app, project)?;
    let task = resolve_task(&project, key)?;
    if json {
        return print_json(&task.history);
    }
    println!("{}", task.title);
    let rows = task
        .history
        .iter()
        .map(|h| {
            vec![
                h.timestamp
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M")
                    .to_string(),
                h.change_type.to_string(),
                h.actor_name.clone(),
                h.description.clone(),
            ]
        })
        .collect();
    print_table(&["WHEN", "TYPE", "BY", "CHANGE"], rows);
    Ok(())
}

fn list(
    root: &Path,
    project: Option<&str>,
    status: Option<TaskStatus>,
    json: bool,
) -> anyhow::Result<()> {
    let mut app = open_app(root)?;
    let project = load_project(&mut app, project)?;
    let tasks: Vec<&Task> = project
        .tasks
        .iter()
        .filter(|t| status.map_or(true, |s| t.status == s))
        .collect();
    let now = Local::now().naive_local();

    if json {
        let items: Vec<serde_json::Value> = tasks
            .iter()
            .map(|t| {
                serde_json::json!({
                    "id": t.id,
                    "title": t.title,
                    "status": t.status,
                    "priority": t.priority,
                    "assignee_id": t.assignee_id,
                    "deadline": t.deadline,
                    "deadline_status": deadline::classify_task(t, now),
                })
            })
            .collect();
        return print_json(&items);
    }

    if tasks.is_empty() {
        println!("No tasks in '{}'.", project.name);
        return Ok(());
    }
    let roster: Vec<_> = project
        .team
        .iter()
        .chain(app.team().iter())
        .cloned()
        .collect();
    let rows = tasks
        .iter()
        .map(|t| {
            let due = deadline::classify_task(t, now);
            let mut label = due.label();
            if due.is_flagged() {
                label = format!("! {label}");
            }
            vec![
                short_id(&t.id),
                truncate(&t.title, 40),
                t.status.to_string(),
                t.priority.to_string(),
                team::display_name(&roster, t.assignee_id.as_deref()),
                format!("{}h", t.estimated_hours),
                label,
            ]
        })
        .collect();
    print_table(
        &["ID", "TITLE", "STATUS", "PRIORITY", "ASSIGNEE", "EST", "DEADLINE"],
        rows,
    );
    Ok(())
}
