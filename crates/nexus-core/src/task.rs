use crate::error::{NexusError, Result};
use crate::reminder;
use crate::team::{self, TeamMember};
use crate::types::{ChangeType, Priority, TaskStatus};
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const ACTOR_USER: &str = "You";
pub const ACTOR_SYSTEM: &str = "System";
pub const ACTOR_AI: &str = "AI Agent";

pub const DEFAULT_ESTIMATED_HOURS: f64 = 4.0;

fn system_actor() -> String {
    ACTOR_SYSTEM.to_string()
}

fn default_hours() -> f64 {
    DEFAULT_ESTIMATED_HOURS
}

// ---------------------------------------------------------------------------
// TaskHistory
// ---------------------------------------------------------------------------

/// One audit entry. Entries are only ever prepended, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskHistory {
    pub id: String,
    pub change_type: ChangeType,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default = "system_actor")]
    pub actor_name: String,
}

impl TaskHistory {
    pub fn new(
        change_type: ChangeType,
        description: impl Into<String>,
        actor: &str,
        timestamp: DateTime<Utc>,
    ) -> Self {
        TaskHistory {
            id: uuid::Uuid::new_v4().to_string(),
            change_type,
            description: description.into(),
            timestamp,
            actor_name: actor.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    /// Wall-clock reminder time as entered. Parsed lazily by the reminder
    /// scan, which skips values it cannot read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_at: Option<String>,
    #[serde(default = "default_hours")]
    pub estimated_hours: f64,
    /// Newest first.
    #[serde(default)]
    pub history: Vec<TaskHistory>,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Put `entry` at the front of the history.
    pub fn record(&mut self, entry: TaskHistory) {
        self.history.insert(0, entry);
    }
}

/// Treat empty strings as absent.
pub fn normalized(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

fn validate_hours(hours: f64) -> Result<f64> {
    if !hours.is_finite() || hours <= 0.0 {
        return Err(NexusError::validation(
            "Estimated hours must be a positive number.",
        ));
    }
    Ok(hours)
}

// ---------------------------------------------------------------------------
// NewTask
// ---------------------------------------------------------------------------

/// A task as composed by the user before it exists. There is deliberately no
/// status field: every task starts Pending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub estimated_hours: Option<f64>,
    #[serde(default)]
    pub assignee_id: Option<String>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub reminder_at: Option<String>,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        NewTask {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn into_task(self, default_hours: f64, at: DateTime<Utc>) -> Result<Task> {
        if self.title.trim().is_empty() {
            return Err(NexusError::validation("Task title is required."));
        }
        let estimated_hours = validate_hours(self.estimated_hours.unwrap_or(default_hours))?;
        Ok(Task {
            id: uuid::Uuid::new_v4().to_string(),
            title: self.title,
            description: self.description,
            assignee_id: normalized(self.assignee_id.as_deref()).map(str::to_string),
            status: TaskStatus::Pending,
            priority: self.priority.unwrap_or_default(),
            deadline: self.deadline,
            reminder_at: normalized(self.reminder_at.as_deref()).map(str::to_string),
            estimated_hours,
            history: vec![TaskHistory::new(
                ChangeType::Created,
                "Task created",
                ACTOR_USER,
                at,
            )],
        })
    }
}

// ---------------------------------------------------------------------------
// Edit diff
// ---------------------------------------------------------------------------

fn format_reminder(raw: &str) -> String {
    match reminder::parse_reminder(raw) {
        Some(at) => at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
        None => raw.to_string(),
    }
}

/// History entries describing how `edited` differs from `original`, in field
/// order (title, description, priority, assignee, deadline, reminder). All
/// entries share `at`. Optional fields are compared in normalized form.
pub fn change_log(
    original: &Task,
    edited: &Task,
    team: &[TeamMember],
    at: DateTime<Utc>,
) -> Vec<TaskHistory> {
    let mut changes = Vec::new();
    let mut push = |kind: ChangeType, desc: String| {
        changes.push(TaskHistory::new(kind, desc, ACTOR_USER, at));
    };

    if original.title != edited.title {
        push(ChangeType::Info, format!("Title updated to \"{}\"", edited.title));
    }
    if original.description != edited.description {
        push(ChangeType::Info, "Description updated".to_string());
    }
    if original.priority != edited.priority {
        push(
            ChangeType::Priority,
            format!(
                "Priority changed from {} to {}",
                original.priority, edited.priority
            ),
        );
    }

    let old_assignee = normalized(original.assignee_id.as_deref());
    let new_assignee = normalized(edited.assignee_id.as_deref());
    if old_assignee != new_assignee {
        push(
            ChangeType::Assignee,
            format!(
                "Assignee changed from {} to {}",
                team::display_name(team, old_assignee),
                team::display_name(team, new_assignee)
            ),
        );
    }

    match (original.deadline, edited.deadline) {
        (old, Some(new)) if old != Some(new) => {
            push(ChangeType::Deadline, format!("Deadline updated to {new}"));
        }
        (Some(old), None) => {
            push(ChangeType::Deadline, format!("Deadline removed (was {old})"));
        }
        _ => {}
    }

    let old_reminder = normalized(original.reminder_at.as_deref());
    let new_reminder = normalized(edited.reminder_at.as_deref());
    if old_reminder != new_reminder {
        let desc = match new_reminder {
            Some(r) => format!("Reminder set for {}", format_reminder(r)),
            None => "Reminder removed".to_string(),
        };
        push(ChangeType::Info, desc);
    }

    changes
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn task(id: &str, status: TaskStatus) -> Task {
        Task {
            id: id.into(),
            title: format!("Task {id}"),
            description: String::new(),
            assignee_id: None,
            status,
            priority: Priority::Medium,
            deadline: None,
            reminder_at: None,
            estimated_hours: 4.0,
            history: Vec::new(),
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap()
    }

    fn team() -> Vec<TeamMember> {
        ["Alice", "Bob"]
            .iter()
            .enumerate()
            .map(|(i, n)| TeamMember {
                id: format!("u{}", i + 1),
                name: n.to_string(),
                role: "Dev".into(),
                skills: vec![],
                avatar: String::new(),
            })
            .collect()
    }

    #[test]
    fn new_task_starts_pending_with_created_entry() {
        let t = NewTask::titled("Write docs").into_task(4.0, at()).unwrap();
        assert_eq!(t.status, TaskStatus::Pending);
        assert_eq!(t.priority, Priority::Medium);
        assert_eq!(t.estimated_hours, 4.0);
        assert_eq!(t.history.len(), 1);
        assert_eq!(t.history[0].change_type, ChangeType::Created);
        assert_eq!(t.history[0].actor_name, "You");
    }

    #[test]
    fn new_task_requires_title() {
        let err = NewTask::titled("   ").into_task(4.0, at());
        assert!(matches!(err, Err(NexusError::Validation(_))));
    }

    #[test]
    fn new_task_rejects_non_positive_hours() {
        let mut draft = NewTask::titled("x");
        draft.estimated_hours = Some(0.0);
        assert!(draft.into_task(4.0, at()).is_err());
    }

    #[test]
    fn new_task_treats_empty_optionals_as_absent() {
        let mut draft = NewTask::titled("x");
        draft.assignee_id = Some(String::new());
        draft.reminder_at = Some(String::new());
        let t = draft.into_task(4.0, at()).unwrap();
        assert!(t.assignee_id.is_none());
        assert!(t.reminder_at.is_none());
    }

    #[test]
    fn history_actor_defaults_to_system() {
        let json = r#"{"id":"h","change_type":"info","description":"d","timestamp":"2026-03-10T09:00:00Z"}"#;
        let entry: TaskHistory = serde_json::from_str(json).unwrap();
        assert_eq!(entry.actor_name, "System");
    }

    #[test]
    fn unchanged_edit_produces_no_entries() {
        let original = task("t1", TaskStatus::Pending);
        assert!(change_log(&original, &original.clone(), &team(), at()).is_empty());
    }

    #[test]
    fn assignee_change_names_both_sides() {
        let mut original = task("t1", TaskStatus::Pending);
        original.assignee_id = Some("u1".into());
        let mut edited = original.clone();
        edited.assignee_id = Some("u2".into());

        let log = change_log(&original, &edited, &team(), at());
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].change_type, ChangeType::Assignee);
        assert_eq!(log[0].description, "Assignee changed from Alice to Bob");
    }

    #[test]
    fn unassigning_reads_unassigned() {
        let mut original = task("t1", TaskStatus::Pending);
        original.assignee_id = Some("u1".into());
        let mut edited = original.clone();
        edited.assignee_id = Some(String::new());

        let log = change_log(&original, &edited, &team(), at());
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].description, "Assignee changed from Alice to Unassigned");
    }

    #[test]
    fn deadline_removal_is_worded_distinctly() {
        let mut original = task("t1", TaskStatus::Pending);
        original.deadline = NaiveDate::from_ymd_opt(2026, 4, 1);
        let mut edited = original.clone();
        edited.deadline = None;

        let log = change_log(&original, &edited, &team(), at());
        assert_eq!(log[0].change_type, ChangeType::Deadline);
        assert_eq!(log[0].description, "Deadline removed (was 2026-04-01)");

        let log = change_log(&edited, &original, &team(), at());
        assert_eq!(log[0].description, "Deadline updated to 2026-04-01");
    }

    #[test]
    fn multi_field_edit_keeps_field_order_and_one_timestamp() {
        let original = task("t1", TaskStatus::Pending);
        let mut edited = original.clone();
        edited.title = "Renamed".into();
        edited.priority = Priority::Critical;
        edited.reminder_at = Some("2026-03-11T08:30:00Z".into());

        let log = change_log(&original, &edited, &team(), at());
        let kinds: Vec<_> = log.iter().map(|e| e.change_type).collect();
        assert_eq!(
            kinds,
            vec![ChangeType::Info, ChangeType::Priority, ChangeType::Info]
        );
        assert_eq!(log[0].description, "Title updated to \"Renamed\"");
        assert_eq!(log[1].description, "Priority changed from Medium to Critical");
        assert!(log[2].description.starts_with("Reminder set for 2026-03-1"));
        assert!(log.iter().all(|e| e.timestamp == at()));
    }
}
