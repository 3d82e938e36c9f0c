//! Task lifecycle engine.
//!
//! Every task-list mutation (create, edit, delete, move) builds the new task
//! list and hands it to [`recompute`], which recalculates progress and decides
//! whether the result may be committed straight away or must wait behind the
//! completion gate. Functions here never touch storage; they take the current
//! project by reference and return the candidate next state.

use crate::deadline;
use crate::error::{NexusError, Result};
use crate::project::{progress_of, Project};
use crate::task::{self, NewTask, Task, TaskHistory, ACTOR_SYSTEM, ACTOR_USER};
use crate::team::TeamMember;
use crate::types::{ChangeType, TaskStatus};
use chrono::{DateTime, Local, Utc};

pub const AUTO_START_DESCRIPTION: &str = "Auto-started: Previous task completed on time";

/// Candidate project state produced by a mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Commit {
    /// Safe to persist immediately.
    Apply(Project),
    /// Progress reached 100% for the first time; needs explicit confirmation.
    Stage(Project),
}

impl Commit {
    pub fn project(&self) -> &Project {
        match self {
            Commit::Apply(p) | Commit::Stage(p) => p,
        }
    }

    pub fn into_project(self) -> Project {
        match self {
            Commit::Apply(p) | Commit::Stage(p) => p,
        }
    }

    pub fn is_staged(&self) -> bool {
        matches!(self, Commit::Stage(_))
    }
}

/// Replace `project`'s tasks, recompute progress and apply the completion gate.
pub fn recompute(project: &Project, tasks: Vec<Task>) -> Commit {
    let progress = progress_of(&tasks);
    let next = Project {
        tasks,
        progress,
        ..project.clone()
    };
    if progress == 100 && project.progress < 100 {
        tracing::debug!("project {} reached 100%, staging for confirmation", project.id);
        Commit::Stage(next)
    } else {
        Commit::Apply(next)
    }
}

/// Move a task to `status`. Returns `None` when no task has `task_id`.
///
/// Completing a task that was not late starts the first Pending task in list
/// order.
pub fn move_task(
    project: &Project,
    task_id: &str,
    status: TaskStatus,
    now: DateTime<Utc>,
) -> Option<Commit> {
    let index = project.tasks.iter().position(|t| t.id == task_id)?;
    let mut tasks = project.tasks.clone();

    let moved = &mut tasks[index];
    let old = moved.status;
    moved.status = status;
    moved.record(TaskHistory::new(
        ChangeType::Status,
        format!("Status changed from {} to {}", old.label(), status.label()),
        ACTOR_USER,
        now,
    ));

    if status == TaskStatus::Completed {
        let local_now = now.with_timezone(&Local).naive_local();
        if deadline::is_late(tasks[index].deadline, local_now) {
            tracing::debug!("task {task_id} completed late, no auto-advance");
        } else if let Some(next) = tasks.iter_mut().find(|t| t.status == TaskStatus::Pending) {
            next.status = TaskStatus::InProgress;
            next.record(TaskHistory::new(
                ChangeType::Status,
                AUTO_START_DESCRIPTION,
                ACTOR_SYSTEM,
                now,
            ));
            tracing::debug!("auto-started task {}", next.id);
        }
    }

    Some(recompute(project, tasks))
}

/// Append a new task built from `draft` to the end of the list.
pub fn create_task(
    project: &Project,
    draft: NewTask,
    default_hours: f64,
    now: DateTime<Utc>,
) -> Result<Commit> {
    let created = draft.into_task(default_hours, now)?;
    let mut tasks = project.tasks.clone();
    tasks.push(created);
    Ok(recompute(project, tasks))
}

/// Replace the task with `edited.id` by `edited`, recording one history entry
/// per changed field ahead of the existing history.
///
/// Status is not editable here; it only changes through [`move_task`]. The
/// history carried on `edited` is ignored in favour of the stored one.
pub fn update_task(
    project: &Project,
    mut edited: Task,
    team: &[TeamMember],
    now: DateTime<Utc>,
) -> Result<Commit> {
    let index = project
        .tasks
        .iter()
        .position(|t| t.id == edited.id)
        .ok_or_else(|| NexusError::TaskNotFound(edited.id.clone()))?;
    let original = &project.tasks[index];

    if edited.title.trim().is_empty() {
        return Err(NexusError::validation("Task title is required."));
    }
    if !edited.estimated_hours.is_finite() || edited.estimated_hours <= 0.0 {
        return Err(NexusError::validation(
            "Estimated hours must be a positive number.",
        ));
    }
    edited.assignee_id = task::normalized(edited.assignee_id.as_deref()).map(str::to_string);
    edited.reminder_at = task::normalized(edited.reminder_at.as_deref()).map(str::to_string);
    edited.status = original.status;

    let mut history = task::change_log(original, &edited, team, now);
    history.extend(original.history.iter().cloned());
    edited.history = history;

    let mut tasks = project.tasks.clone();
    tasks[index] = edited;
    Ok(recompute(project, tasks))
}

/// Remove a task. Removing an unknown id still recomputes.
pub fn delete_task(project: &Project, task_id: &str) -> Commit {
    let tasks = project
        .tasks
        .iter()
        .filter(|t| t.id != task_id)
        .cloned()
        .collect();
    recompute(project, tasks)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::tests::sample_project;
    use crate::task::tests::task;
    use chrono::{Days, NaiveDate};

    fn today() -> NaiveDate {
        Utc::now().with_timezone(&Local).date_naive()
    }

    fn project(tasks: Vec<Task>) -> Project {
        let mut p = sample_project("p");
        p.progress = progress_of(&tasks);
        p.tasks = tasks;
        p
    }

    #[test]
    fn missing_task_is_silent_noop() {
        let p = project(vec![task("a", TaskStatus::Pending)]);
        assert!(move_task(&p, "ghost", TaskStatus::Completed, Utc::now()).is_none());
    }

    #[test]
    fn move_records_status_entry() {
        let p = project(vec![task("a", TaskStatus::Pending)]);
        let commit = move_task(&p, "a", TaskStatus::Blocked, Utc::now()).unwrap();
        let a = commit.project().task("a").unwrap();
        assert_eq!(a.status, TaskStatus::Blocked);
        assert_eq!(a.history[0].change_type, ChangeType::Status);
        assert_eq!(a.history[0].description, "Status changed from Pending to Blocked");
        assert_eq!(a.history[0].actor_name, "You");
        assert!(!commit.is_staged());
    }

    #[test]
    fn late_completion_does_not_auto_advance() {
        let mut a = task("a", TaskStatus::Pending);
        a.deadline = today().checked_sub_days(Days::new(2));
        let b = task("b", TaskStatus::Pending);
        let p = project(vec![a, b]);

        let commit = move_task(&p, "a", TaskStatus::Completed, Utc::now()).unwrap();
        assert!(!commit.is_staged());
        let next = commit.project();
        assert_eq!(next.task("a").unwrap().status, TaskStatus::Completed);
        assert_eq!(next.task("b").unwrap().status, TaskStatus::Pending);
        assert!(next.task("b").unwrap().history.is_empty());
        assert_eq!(next.progress, 50);
    }

    #[test]
    fn on_time_completion_starts_first_pending_only() {
        let mut a = task("a", TaskStatus::Pending);
        a.deadline = today().checked_add_days(Days::new(5));
        let p = project(vec![
            a,
            task("x", TaskStatus::Blocked),
            task("b", TaskStatus::Pending),
            task("c", TaskStatus::Pending),
        ]);

        let commit = move_task(&p, "a", TaskStatus::Completed, Utc::now()).unwrap();
        let next = commit.project();
        let b = next.task("b").unwrap();
        assert_eq!(b.status, TaskStatus::InProgress);
        assert_eq!(b.history.len(), 1);
        assert_eq!(b.history[0].actor_name, "System");
        assert_eq!(b.history[0].description, AUTO_START_DESCRIPTION);
        assert_eq!(next.task("c").unwrap().status, TaskStatus::Pending);
        assert_eq!(next.task("x").unwrap().status, TaskStatus::Blocked);
    }

    #[test]
    fn deadline_today_is_not_late() {
        let mut a = task("a", TaskStatus::InProgress);
        a.deadline = Some(today());
        let p = project(vec![a, task("b", TaskStatus::Pending)]);
        let commit = move_task(&p, "a", TaskStatus::Completed, Utc::now()).unwrap();
        assert_eq!(commit.project().task("b").unwrap().status, TaskStatus::InProgress);
    }

    #[test]
    fn first_time_full_completion_is_staged() {
        let mut a = task("a", TaskStatus::Pending);
        a.deadline = today().checked_add_days(Days::new(5));
        let p = project(vec![a, task("b", TaskStatus::Completed)]);
        assert_eq!(p.progress, 50);

        let commit = move_task(&p, "a", TaskStatus::Completed, Utc::now()).unwrap();
        assert!(commit.is_staged());
        assert_eq!(commit.project().progress, 100);
        // The source project is untouched until someone confirms.
        assert_eq!(p.progress, 50);
    }

    #[test]
    fn staying_at_full_completion_commits_directly() {
        let p = project(vec![task("a", TaskStatus::Completed)]);
        assert_eq!(p.progress, 100);
        let commit = create_task(&p, NewTask::titled("more"), 4.0, Utc::now()).unwrap();
        assert!(!commit.is_staged());
        assert_eq!(commit.project().progress, 50);

        let back = delete_task(commit.project(), &commit.project().tasks[1].id);
        // Coming back up to 100 from 50 is a fresh crossing.
        assert!(back.is_staged());
    }

    #[test]
    fn create_appends_pending_task() {
        let p = project(vec![task("a", TaskStatus::Completed)]);
        let mut draft = NewTask::titled("new");
        draft.estimated_hours = Some(2.0);
        let next = create_task(&p, draft, 4.0, Utc::now()).unwrap().into_project();
        assert_eq!(next.tasks.len(), 2);
        assert_eq!(next.tasks[1].title, "new");
        assert_eq!(next.tasks[1].status, TaskStatus::Pending);
        assert_eq!(next.tasks[1].estimated_hours, 2.0);
    }

    #[test]
    fn create_rejects_blank_title() {
        let p = project(vec![]);
        assert!(create_task(&p, NewTask::titled(""), 4.0, Utc::now()).is_err());
    }

    #[test]
    fn update_prepends_changes_and_keeps_status() {
        let mut a = task("a", TaskStatus::InProgress);
        a.history.push(TaskHistory::new(ChangeType::Created, "Task created", ACTOR_USER, Utc::now()));
        let p = project(vec![a.clone()]);

        let mut edited = a.clone();
        edited.title = "Renamed".into();
        edited.status = TaskStatus::Completed;
        edited.history.clear();

        let next = update_task(&p, edited, &[], Utc::now()).unwrap().into_project();
        let t = next.task("a").unwrap();
        assert_eq!(t.status, TaskStatus::InProgress);
        assert_eq!(t.history.len(), 2);
        assert_eq!(t.history[0].description, "Title updated to \"Renamed\"");
        assert_eq!(t.history[1].change_type, ChangeType::Created);
    }

    #[test]
    fn update_unknown_task_fails() {
        let p = project(vec![]);
        let err = update_task(&p, task("ghost", TaskStatus::Pending), &[], Utc::now());
        assert!(matches!(err, Err(NexusError::TaskNotFound(_))));
    }

    #[test]
    fn delete_recomputes_progress() {
        let p = project(vec![task("a", TaskStatus::Completed), task("b", TaskStatus::Pending)]);
        let next = delete_task(&p, "b");
        assert!(next.is_staged());
        let next = delete_task(&p, "a").into_project();
        assert_eq!(next.progress, 0);
        assert_eq!(next.tasks.len(), 1);
    }
}
