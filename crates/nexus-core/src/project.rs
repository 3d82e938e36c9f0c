use crate::error::{NexusError, Result};
use crate::task::Task;
use crate::team::TeamMember;
use crate::types::{Severity, TaskStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    pub id: String,
    pub description: String,
    pub severity: Severity,
    pub mitigation_strategy: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub budget: f64,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    /// Snapshot of the roster taken at creation; resynchronized only by
    /// explicit member edits and deletions.
    #[serde(default)]
    pub team: Vec<TeamMember>,
    #[serde(default)]
    pub risks: Vec<Risk>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    /// Cached `progress_of(&tasks)`; never set independently.
    #[serde(default)]
    pub progress: u8,
}

impl Project {
    pub fn is_complete(&self) -> bool {
        self.progress == 100
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Look a task up by id, falling back to a case-insensitive title match.
    pub fn find_task(&self, key: &str) -> Result<&Task> {
        self.task(key)
            .or_else(|| {
                self.tasks
                    .iter()
                    .find(|t| t.title.eq_ignore_ascii_case(key))
            })
            .ok_or_else(|| NexusError::TaskNotFound(key.to_string()))
    }

    pub fn completed_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .count()
    }
}

/// `round(100 * completed / total)`, 0 for an empty list.
pub fn progress_of(tasks: &[Task]) -> u8 {
    let total = tasks.len();
    if total == 0 {
        return 0;
    }
    let completed = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .count();
    // Integer half-up rounding of 100 * completed / total.
    ((200 * completed + total) / (2 * total)) as u8
}

// ---------------------------------------------------------------------------
// NewProject
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub budget: Option<f64>,
    pub tech_stack: Vec<String>,
}

impl NewProject {
    /// Build the project. Missing dates default to `today` and
    /// `start + default_days`.
    pub fn into_project(
        self,
        team: Vec<TeamMember>,
        today: NaiveDate,
        default_days: u32,
    ) -> Result<Project> {
        if self.name.trim().is_empty() {
            return Err(NexusError::validation("Project name is required."));
        }
        let budget = self.budget.unwrap_or(0.0);
        if !budget.is_finite() || budget < 0.0 {
            return Err(NexusError::validation("Budget must be a non-negative number."));
        }
        let start_date = self.start_date.unwrap_or(today);
        let end_date = self.end_date.unwrap_or_else(|| {
            start_date
                .checked_add_days(chrono::Days::new(default_days.into()))
                .unwrap_or(start_date)
        });
        if end_date < start_date {
            return Err(NexusError::validation("End date must not precede start date."));
        }
        Ok(Project {
            id: uuid::Uuid::new_v4().to_string(),
            name: self.name.trim().to_string(),
            description: self.description,
            start_date,
            end_date,
            budget,
            tech_stack: self.tech_stack,
            team,
            risks: Vec::new(),
            tasks: Vec::new(),
            progress: 0,
        })
    }
}

// ---------------------------------------------------------------------------
// ProjectPatch
// ---------------------------------------------------------------------------

/// Field edits to an existing project. `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub budget: Option<f64>,
    pub tech_stack: Option<Vec<String>>,
}

impl ProjectPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.budget.is_none()
            && self.tech_stack.is_none()
    }

    /// Apply to a copy of `project`, validating the result.
    pub fn apply(self, project: &Project) -> Result<Project> {
        let mut next = project.clone();
        if let Some(name) = self.name {
            if name.trim().is_empty() {
                return Err(NexusError::validation("Project name is required."));
            }
            next.name = name.trim().to_string();
        }
        if let Some(description) = self.description {
            next.description = description;
        }
        if let Some(budget) = self.budget {
            if !budget.is_finite() || budget < 0.0 {
                return Err(NexusError::validation("Budget must be a non-negative number."));
            }
            next.budget = budget;
        }
        next.start_date = self.start_date.unwrap_or(next.start_date);
        next.end_date = self.end_date.unwrap_or(next.end_date);
        if next.end_date < next.start_date {
            return Err(NexusError::validation("End date must not precede start date."));
        }
        if let Some(stack) = self.tech_stack {
            next.tech_stack = stack;
        }
        Ok(next)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::task::tests::task;

    pub(crate) fn sample_project(id: &str) -> Project {
        Project {
            id: id.into(),
            name: format!("Project {id}"),
            description: String::new(),
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
            budget: 1000.0,
            tech_stack: vec![],
            team: vec![],
            risks: vec![],
            tasks: vec![],
            progress: 0,
        }
    }

    #[test]
    fn progress_of_empty_is_zero() {
        assert_eq!(progress_of(&[]), 0);
    }

    #[test]
    fn progress_rounds_half_up() {
        let tasks = vec![
            task("a", TaskStatus::Completed),
            task("b", TaskStatus::Pending),
            task("c", TaskStatus::Pending),
        ];
        assert_eq!(progress_of(&tasks), 33);

        let tasks = vec![
            task("a", TaskStatus::Completed),
            task("b", TaskStatus::Completed),
            task("c", TaskStatus::Blocked),
        ];
        assert_eq!(progress_of(&tasks), 67);

        let mut eight: Vec<Task> = (0..8).map(|i| task(&i.to_string(), TaskStatus::Pending)).collect();
        for t in eight.iter_mut().take(1) {
            t.status = TaskStatus::Completed;
        }
        // 12.5 rounds up
        assert_eq!(progress_of(&eight), 13);
    }

    #[test]
    fn progress_all_completed_is_100() {
        let tasks = vec![task("a", TaskStatus::Completed)];
        assert_eq!(progress_of(&tasks), 100);
    }

    #[test]
    fn new_project_defaults_end_date() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let p = NewProject {
            name: "Shop".into(),
            ..Default::default()
        }
        .into_project(vec![], today, 30)
        .unwrap();
        assert_eq!(p.start_date, today);
        assert_eq!(p.end_date, NaiveDate::from_ymd_opt(2026, 3, 31).unwrap());
        assert_eq!(p.progress, 0);
    }

    #[test]
    fn new_project_rejects_negative_budget() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let err = NewProject {
            name: "Shop".into(),
            budget: Some(-1.0),
            ..Default::default()
        }
        .into_project(vec![], today, 30);
        assert!(matches!(err, Err(NexusError::Validation(_))));
    }

    #[test]
    fn patch_validates_dates() {
        let p = sample_project("p");
        let renamed = ProjectPatch {
            name: Some(" Renamed ".into()),
            budget: Some(5.0),
            ..Default::default()
        }
        .apply(&p)
        .unwrap();
        assert_eq!(renamed.name, "Renamed");
        assert_eq!(renamed.budget, 5.0);
        assert_eq!(renamed.tasks, p.tasks);

        let err = ProjectPatch {
            end_date: NaiveDate::from_ymd_opt(2025, 1, 1),
            ..Default::default()
        }
        .apply(&p);
        assert!(matches!(err, Err(NexusError::Validation(_))));
        assert!(ProjectPatch::default().is_empty());
    }

    #[test]
    fn find_task_by_title() {
        let mut p = sample_project("p");
        p.tasks.push(task("t1", TaskStatus::Pending));
        assert_eq!(p.find_task("task T1").unwrap().id, "t1");
        assert!(p.find_task("missing").is_err());
    }
}
