//! Validation of AI-generated plans and risk lists.
//!
//! The generator's output is decoded into the loose `*Response` types below,
//! where every field is optional, and only then converted into domain values.
//! Conversion never fails on bad AI data: unreadable values fall back to
//! defaults or are dropped.

use crate::error::Result;
use crate::project::{NewProject, Project, Risk};
use crate::task::{Task, TaskHistory, ACTOR_AI};
use crate::team::TeamMember;
use crate::types::{ChangeType, Priority, Severity, TaskStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const UNTITLED_PROJECT: &str = "Untitled Project";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanResponse {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub budget: Option<f64>,
    pub tech_stack: Vec<String>,
    pub tasks: Vec<PlannedTask>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlannedTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub estimated_hours: Option<f64>,
    pub deadline: Option<String>,
    pub assignee_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RiskResponse {
    pub description: Option<String>,
    pub severity: Option<String>,
    pub mitigation_strategy: Option<String>,
}

/// Fallbacks applied while converting a plan.
#[derive(Debug, Clone, Copy)]
pub struct PlanDefaults {
    pub today: NaiveDate,
    pub duration_days: u32,
    pub estimated_hours: f64,
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|d| d.date_naive()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl PlannedTask {
    /// `None` when the task has no title.
    pub fn into_task(self, team: &[TeamMember], default_hours: f64, at: DateTime<Utc>) -> Option<Task> {
        let title = non_empty(self.title)?;
        let deadline = self.deadline.as_deref().and_then(|d| {
            let parsed = parse_date(d);
            if parsed.is_none() {
                tracing::warn!("dropping unreadable deadline '{d}' on planned task '{title}'");
            }
            parsed
        });
        let assignee_id = non_empty(self.assignee_id).filter(|id| {
            let known = team.iter().any(|m| &m.id == id);
            if !known {
                tracing::warn!("dropping unknown assignee '{id}' on planned task '{title}'");
            }
            known
        });
        let estimated_hours = self
            .estimated_hours
            .filter(|h| h.is_finite() && *h > 0.0)
            .unwrap_or(default_hours);
        let priority = self
            .priority
            .and_then(|p| p.parse::<Priority>().ok())
            .unwrap_or_default();

        Some(Task {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            description: self.description.unwrap_or_default(),
            assignee_id,
            status: TaskStatus::Pending,
            priority,
            deadline,
            reminder_at: None,
            estimated_hours,
            history: vec![TaskHistory::new(
                ChangeType::Created,
                "Task created via AI",
                ACTOR_AI,
                at,
            )],
        })
    }
}

impl PlanResponse {
    /// Build a new project from the plan, snapshotting `team` into it.
    pub fn into_project(
        self,
        team: Vec<TeamMember>,
        defaults: PlanDefaults,
        at: DateTime<Utc>,
    ) -> Result<Project> {
        let start_date = self.start_date.as_deref().and_then(parse_date);
        let mut end_date = self.end_date.as_deref().and_then(parse_date);
        if let (Some(start), Some(end)) = (start_date.or(Some(defaults.today)), end_date) {
            if end < start {
                tracing::warn!("plan end date {end} precedes start {start}; using default duration");
                end_date = None;
            }
        }
        let budget = self.budget.filter(|b| b.is_finite() && *b >= 0.0);

        let tasks: Vec<Task> = self
            .tasks
            .into_iter()
            .filter_map(|t| t.into_task(&team, defaults.estimated_hours, at))
            .collect();

        let mut project = NewProject {
            name: non_empty(self.name).unwrap_or_else(|| UNTITLED_PROJECT.to_string()),
            description: self.description.unwrap_or_default(),
            start_date,
            end_date,
            budget,
            tech_stack: self.tech_stack,
        }
        .into_project(team, defaults.today, defaults.duration_days)?;
        project.progress = crate::project::progress_of(&tasks);
        project.tasks = tasks;
        Ok(project)
    }
}

/// Convert generated risks, giving each a fresh id. Entries without a
/// description are dropped.
pub fn into_risks(responses: Vec<RiskResponse>) -> Vec<Risk> {
    responses
        .into_iter()
        .filter_map(|r| {
            let description = non_empty(r.description)?;
            Some(Risk {
                id: uuid::Uuid::new_v4().to_string(),
                description,
                severity: r
                    .severity
                    .and_then(|s| s.parse::<Severity>().ok())
                    .unwrap_or_default(),
                mitigation_strategy: r.mitigation_strategy.unwrap_or_default(),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn defaults() -> PlanDefaults {
        PlanDefaults {
            today: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            duration_days: 30,
            estimated_hours: 4.0,
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn team() -> Vec<TeamMember> {
        vec![TeamMember {
            id: "u1".into(),
            name: "Alice".into(),
            role: "Dev".into(),
            skills: vec![],
            avatar: String::new(),
        }]
    }

    #[test]
    fn decodes_camel_case_with_missing_fields() {
        let json = r#"{
            "name": "Shop",
            "techStack": ["Rust"],
            "tasks": [{"title": "Schema", "estimatedHours": 6, "assigneeId": "u1"}]
        }"#;
        let plan: PlanResponse = serde_json::from_str(json).unwrap();
        assert_eq!(plan.name.as_deref(), Some("Shop"));
        assert_eq!(plan.tasks[0].estimated_hours, Some(6.0));
        assert!(plan.start_date.is_none());
    }

    #[test]
    fn project_defaults() {
        let plan = PlanResponse {
            name: Some("Shop".into()),
            ..Default::default()
        };
        let p = plan.into_project(team(), defaults(), at()).unwrap();
        assert_eq!(p.start_date, defaults().today);
        assert_eq!(p.end_date, NaiveDate::from_ymd_opt(2026, 3, 31).unwrap());
        assert_eq!(p.budget, 0.0);
        assert!(p.tech_stack.is_empty());
        assert_eq!(p.team.len(), 1);
        assert_eq!(p.progress, 0);
    }

    #[test]
    fn end_defaults_relative_to_given_start() {
        let plan = PlanResponse {
            name: Some("Shop".into()),
            start_date: Some("2026-05-01".into()),
            end_date: Some("not a date".into()),
            ..Default::default()
        };
        let p = plan.into_project(vec![], defaults(), at()).unwrap();
        assert_eq!(p.end_date, NaiveDate::from_ymd_opt(2026, 5, 31).unwrap());
    }

    #[test]
    fn tasks_are_sanitized() {
        let plan = PlanResponse {
            name: None,
            tasks: vec![
                PlannedTask {
                    title: Some("Design".into()),
                    priority: Some("bogus".into()),
                    estimated_hours: Some(-2.0),
                    deadline: Some("31/02/2026".into()),
                    assignee_id: Some("ghost".into()),
                    ..Default::default()
                },
                PlannedTask {
                    title: Some("Build".into()),
                    priority: Some("High".into()),
                    deadline: Some("2026-03-20".into()),
                    assignee_id: Some("u1".into()),
                    ..Default::default()
                },
                PlannedTask {
                    title: Some("  ".into()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let p = plan.into_project(team(), defaults(), at()).unwrap();
        assert_eq!(p.name, UNTITLED_PROJECT);
        assert_eq!(p.tasks.len(), 2);

        let design = &p.tasks[0];
        assert_eq!(design.priority, Priority::Medium);
        assert_eq!(design.estimated_hours, 4.0);
        assert!(design.deadline.is_none());
        assert!(design.assignee_id.is_none());
        assert_eq!(design.status, TaskStatus::Pending);
        assert_eq!(design.history[0].description, "Task created via AI");
        assert_eq!(design.history[0].actor_name, "AI Agent");

        let build = &p.tasks[1];
        assert_eq!(build.priority, Priority::High);
        assert_eq!(build.deadline, NaiveDate::from_ymd_opt(2026, 3, 20));
        assert_eq!(build.assignee_id.as_deref(), Some("u1"));
    }

    #[test]
    fn risks_get_ids_and_defaults() {
        let risks = into_risks(vec![
            RiskResponse {
                description: Some("Scope creep".into()),
                severity: Some("HIGH".into()),
                mitigation_strategy: Some("Freeze scope".into()),
            },
            RiskResponse {
                description: Some("Vendor lock-in".into()),
                severity: None,
                mitigation_strategy: None,
            },
            RiskResponse::default(),
        ]);
        assert_eq!(risks.len(), 2);
        assert_eq!(risks[0].severity, Severity::High);
        assert_eq!(risks[1].severity, Severity::Medium);
        assert_ne!(risks[0].id, risks[1].id);
    }
}
