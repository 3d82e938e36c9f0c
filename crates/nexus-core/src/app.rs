//! Application coordinator.
//!
//! [`App`] owns the in-memory state (projects, roster, notifications, theme,
//! the staged completion) and is the only place that writes it back to the
//! injected [`KeyValueStore`]. Writes are best-effort: a failed write is logged
//! and the in-memory change stands.

use crate::auth::{self, Registration, User};
use crate::clock::Clock;
use crate::config::Config;
use crate::draft::{DraftKey, Drafts};
use crate::error::{NexusError, Result};
use crate::lifecycle::{self, Commit};
use crate::notification::{AppNotification, NotificationLog};
use crate::plan::{self, PlanDefaults, PlanResponse, RiskResponse};
use crate::project::{NewProject, Project, ProjectPatch};
use crate::reminder::{self, DesktopNotifier};
use crate::stats::{self, DashboardStats, SearchResults};
use crate::store::{load_json, save_json, KeyValueStore, StoreKey};
use crate::task::{NewTask, Task};
use crate::team::{self, MemberInput, TeamMember};
use crate::types::{TaskStatus, Theme};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// What a task-list mutation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Committed,
    /// Held behind the completion gate; see [`App::confirm_completion`].
    AwaitingConfirmation,
    /// Nothing matched, nothing changed.
    Unchanged,
}

pub struct App {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    config: Config,
    projects: Vec<Project>,
    team: Vec<TeamMember>,
    notifications: NotificationLog,
    theme: Theme,
    selected: Option<String>,
    pending_completion: Option<Project>,
}

fn load_or_default<T: DeserializeOwned + Default>(store: &dyn KeyValueStore, key: &StoreKey) -> T {
    match load_json(store, key) {
        Ok(Some(v)) => v,
        Ok(None) => T::default(),
        Err(e) => {
            tracing::warn!("could not read {}: {e}; starting empty", key.as_string());
            T::default()
        }
    }
}

impl App {
    pub fn open(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, config: Config) -> Self {
        let mut app = App {
            store,
            clock,
            config,
            projects: Vec::new(),
            team: Vec::new(),
            notifications: NotificationLog::new(),
            theme: Theme::default(),
            selected: None,
            pending_completion: None,
        };
        app.reload();
        app
    }

    /// Re-read everything from the store. Drops any staged completion.
    pub fn reload(&mut self) {
        let store = self.store.as_ref();
        self.projects = load_or_default(store, &StoreKey::Projects);
        self.team = load_or_default(store, &StoreKey::Team);
        self.notifications = NotificationLog::from_vec(load_or_default(store, &StoreKey::Notifications));
        self.theme = load_or_default(store, &StoreKey::Theme);
        self.selected = load_or_default(store, &StoreKey::SelectedProject);
        self.pending_completion = None;
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn drafts(&self) -> Drafts<'_> {
        Drafts::new(self.store.as_ref())
    }

    fn persist<T: Serialize + ?Sized>(&self, key: StoreKey, value: &T) {
        if let Err(e) = save_json(self.store.as_ref(), &key, value) {
            tracing::error!("failed to persist {}: {e}", key.as_string());
        }
    }

    fn save_projects(&self) {
        self.persist(StoreKey::Projects, &self.projects);
    }

    fn save_team(&self) {
        self.persist(StoreKey::Team, &self.team);
    }

    fn save_notifications(&self) {
        self.persist(StoreKey::Notifications, self.notifications.items());
    }

    fn clear_draft(&self, key: &DraftKey) {
        if let Err(e) = self.drafts().clear(key) {
            tracing::warn!("failed to clear draft {}: {e}", key.storage_key());
        }
    }

    // -----------------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------------

    pub fn register(&mut self, reg: Registration) -> Result<User> {
        let user = auth::register(self.store.as_ref(), reg)?;
        self.team = load_or_default(self.store.as_ref(), &StoreKey::Team);
        Ok(user)
    }

    pub fn login(&mut self, email: &str, password: &str) -> Result<User> {
        let user = auth::login(self.store.as_ref(), email, password)?;
        self.team = load_or_default(self.store.as_ref(), &StoreKey::Team);
        Ok(user)
    }

    pub fn logout(&mut self) -> Result<()> {
        self.pending_completion = None;
        auth::logout(self.store.as_ref())
    }

    pub fn current_user(&self) -> Option<User> {
        auth::current_user(self.store.as_ref())
    }

    pub fn require_user(&self) -> Result<User> {
        auth::require_user(self.store.as_ref())
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn active_projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.iter().filter(|p| !p.is_complete())
    }

    pub fn completed_projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.iter().filter(|p| p.is_complete())
    }

    pub fn project(&self, id: &str) -> Result<&Project> {
        self.projects
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| NexusError::ProjectNotFound(id.to_string()))
    }

    /// Look a project up by id or case-insensitive name.
    pub fn find_project(&self, key: &str) -> Result<&Project> {
        self.project(key).or_else(|_| {
            self.projects
                .iter()
                .find(|p| p.name.eq_ignore_ascii_case(key))
                .ok_or_else(|| NexusError::ProjectNotFound(key.to_string()))
        })
    }

    fn project_index(&self, id: &str) -> Result<usize> {
        self.projects
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| NexusError::ProjectNotFound(id.to_string()))
    }

    /// New projects snapshot the whole roster and go to the front.
    pub fn create_project(&mut self, input: NewProject) -> Result<Project> {
        self.require_user()?;
        let today = self.clock.local_now().date();
        let project = input.into_project(
            self.team.clone(),
            today,
            self.config.plan.default_duration_days,
        )?;
        self.projects.insert(0, project.clone());
        self.save_projects();
        tracing::debug!("created project {}", project.id);
        Ok(project)
    }

    pub fn update_project(&mut self, id: &str, patch: ProjectPatch) -> Result<Project> {
        self.require_user()?;
        let index = self.project_index(id)?;
        let next = patch.apply(&self.projects[index])?;
        self.projects[index] = next.clone();
        self.save_projects();
        self.drop_stage_for(id);
        Ok(next)
    }

    pub fn delete_project(&mut self, id: &str) -> Result<()> {
        self.require_user()?;
        let index = self.project_index(id)?;
        self.projects.remove(index);
        self.save_projects();
        if self.selected.as_deref() == Some(id) {
            self.set_selected(None);
        }
        self.drop_stage_for(id);
        Ok(())
    }

    /// A staged completion is a snapshot; any other change to the same project
    /// makes it stale.
    fn drop_stage_for(&mut self, project_id: &str) {
        if self.pending_completion.as_ref().is_some_and(|p| p.id == project_id) {
            tracing::info!("project {project_id} changed; dropping staged completion");
            self.pending_completion = None;
        }
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    fn set_selected(&mut self, id: Option<String>) {
        self.selected = id;
        match &self.selected {
            Some(id) => self.persist(StoreKey::SelectedProject, id),
            None => {
                if let Err(e) = self.store.remove(&StoreKey::SelectedProject) {
                    tracing::error!("failed to clear selected project: {e}");
                }
            }
        }
    }

    pub fn select_project(&mut self, key: &str) -> Result<Project> {
        let project = self.find_project(key)?.clone();
        self.set_selected(Some(project.id.clone()));
        Ok(project)
    }

    /// The selected project. A selection that no longer resolves is dropped
    /// and `None` returned.
    pub fn selected_project(&mut self) -> Option<&Project> {
        let id = self.selected.clone()?;
        if self.project(&id).is_err() {
            tracing::warn!("selected project {id} no longer exists; clearing selection");
            self.set_selected(None);
            return None;
        }
        self.project(&id).ok()
    }

    // -----------------------------------------------------------------------
    // AI results
    // -----------------------------------------------------------------------

    /// Turn a generated plan into a new project, then drop the prompt draft.
    pub fn import_plan(&mut self, plan: PlanResponse) -> Result<Project> {
        self.require_user()?;
        let defaults = PlanDefaults {
            today: self.clock.local_now().date(),
            duration_days: self.config.plan.default_duration_days,
            estimated_hours: self.config.tasks.default_estimated_hours,
        };
        let project = plan.into_project(self.team.clone(), defaults, self.clock.now())?;
        self.projects.insert(0, project.clone());
        self.save_projects();
        self.clear_draft(&DraftKey::ProjectPrompt);
        tracing::info!("imported plan '{}' with {} tasks", project.name, project.tasks.len());
        Ok(project)
    }

    /// Append generated risks. Returns how many were added.
    pub fn add_risks(&mut self, project_id: &str, risks: Vec<RiskResponse>) -> Result<usize> {
        self.require_user()?;
        let index = self.project_index(project_id)?;
        let risks = plan::into_risks(risks);
        let added = risks.len();
        self.projects[index].risks.extend(risks);
        self.save_projects();
        self.drop_stage_for(project_id);
        Ok(added)
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    fn apply(&mut self, commit: Commit) -> Outcome {
        match commit {
            Commit::Apply(next) => {
                self.drop_stage_for(&next.id);
                if let Some(slot) = self.projects.iter_mut().find(|p| p.id == next.id) {
                    *slot = next;
                }
                self.save_projects();
                Outcome::Committed
            }
            Commit::Stage(next) => {
                self.pending_completion = Some(next);
                Outcome::AwaitingConfirmation
            }
        }
    }

    /// Roster used to name assignees: the project snapshot first, then the
    /// global roster.
    fn naming_roster(&self, project: &Project) -> Vec<TeamMember> {
        project
            .team
            .iter()
            .chain(self.team.iter().filter(|m| team::find(&project.team, &m.id).is_none()))
            .cloned()
            .collect()
    }

    pub fn move_task(&mut self, project_id: &str, task_id: &str, status: TaskStatus) -> Result<Outcome> {
        self.require_user()?;
        let project = self.project(project_id)?;
        match lifecycle::move_task(project, task_id, status, self.clock.now()) {
            Some(commit) => Ok(self.apply(commit)),
            None => Ok(Outcome::Unchanged),
        }
    }

    pub fn create_task(&mut self, project_id: &str, draft: NewTask) -> Result<Outcome> {
        self.require_user()?;
        let project = self.project(project_id)?;
        let commit = lifecycle::create_task(
            project,
            draft,
            self.config.tasks.default_estimated_hours,
            self.clock.now(),
        )?;
        let outcome = self.apply(commit);
        self.clear_draft(&DraftKey::NewTask {
            project_id: project_id.to_string(),
        });
        Ok(outcome)
    }

    pub fn update_task(&mut self, project_id: &str, edited: Task) -> Result<Outcome> {
        self.require_user()?;
        let project = self.project(project_id)?;
        let roster = self.naming_roster(project);
        let task_id = edited.id.clone();
        let commit = lifecycle::update_task(project, edited, &roster, self.clock.now())?;
        let outcome = self.apply(commit);
        self.clear_draft(&DraftKey::EditTask {
            project_id: project_id.to_string(),
            task_id,
        });
        Ok(outcome)
    }

    pub fn delete_task(&mut self, project_id: &str, task_id: &str) -> Result<Outcome> {
        self.require_user()?;
        let project = self.project(project_id)?;
        if project.task(task_id).is_none() {
            return Err(NexusError::TaskNotFound(task_id.to_string()));
        }
        let commit = lifecycle::delete_task(project, task_id);
        Ok(self.apply(commit))
    }

    pub fn pending_completion(&self) -> Option<&Project> {
        self.pending_completion.as_ref()
    }

    /// Commit the staged project.
    pub fn confirm_completion(&mut self) -> Result<Project> {
        let staged = self.pending_completion.take().ok_or(NexusError::NothingStaged)?;
        let index = self.project_index(&staged.id)?;
        self.projects[index] = staged.clone();
        self.save_projects();
        tracing::info!("project '{}' marked complete", staged.name);
        Ok(staged)
    }

    /// Discard the staged project; stored state is left as it was.
    pub fn decline_completion(&mut self) -> Result<()> {
        self.pending_completion
            .take()
            .map(|_| ())
            .ok_or(NexusError::NothingStaged)
    }

    // -----------------------------------------------------------------------
    // Team
    // -----------------------------------------------------------------------

    pub fn team(&self) -> &[TeamMember] {
        &self.team
    }

    pub fn member(&self, key: &str) -> Result<&TeamMember> {
        team::find(&self.team, key)
            .or_else(|| self.team.iter().find(|m| m.name.eq_ignore_ascii_case(key)))
            .ok_or_else(|| NexusError::MemberNotFound(key.to_string()))
    }

    pub fn add_member(&mut self, input: MemberInput) -> Result<TeamMember> {
        self.require_user()?;
        let member = input.into_member(uuid::Uuid::new_v4().to_string())?;
        self.team.push(member.clone());
        self.save_team();
        Ok(member)
    }

    /// Replace a roster entry and every project snapshot of it.
    pub fn update_member(&mut self, id: &str, input: MemberInput) -> Result<TeamMember> {
        self.require_user()?;
        let index = self
            .team
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| NexusError::MemberNotFound(id.to_string()))?;
        let member = input.into_member(id.to_string())?;
        self.team[index] = member.clone();
        self.save_team();
        if team::propagate_update(&mut self.projects, &member) > 0 {
            self.save_projects();
        }
        if let Some(staged) = self.pending_completion.as_mut() {
            team::propagate_update(std::slice::from_mut(staged), &member);
        }
        Ok(member)
    }

    pub fn delete_member(&mut self, id: &str) -> Result<()> {
        self.require_user()?;
        let before = self.team.len();
        self.team.retain(|m| m.id != id);
        if self.team.len() == before {
            return Err(NexusError::MemberNotFound(id.to_string()));
        }
        self.save_team();
        if team::propagate_delete(&mut self.projects, id) > 0 {
            self.save_projects();
        }
        if let Some(staged) = self.pending_completion.as_mut() {
            team::propagate_delete(std::slice::from_mut(staged), id);
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Notifications
    // -----------------------------------------------------------------------

    pub fn notifications(&self) -> &NotificationLog {
        &self.notifications
    }

    /// One reminder pass. Returns the notifications actually added; the
    /// desktop side channel sees each of them and its failures are ignored.
    pub fn run_reminder_scan(&mut self, notifier: &dyn DesktopNotifier) -> Vec<AppNotification> {
        let due = reminder::scan(&self.projects, self.clock.now());
        let mut added = Vec::new();
        for notification in due {
            if self.notifications.push(notification.clone()) {
                reminder::notify_desktop(notifier, &notification);
                added.push(notification);
            }
        }
        if !added.is_empty() {
            self.save_notifications();
        }
        tracing::debug!("reminder scan added {} notification(s)", added.len());
        added
    }

    pub fn clear_notifications(&mut self) {
        self.notifications.clear();
        self.save_notifications();
    }

    pub fn mark_notifications_read(&mut self) -> usize {
        let flipped = self.notifications.mark_all_read();
        if flipped > 0 {
            self.save_notifications();
        }
        flipped
    }

    // -----------------------------------------------------------------------
    // Misc
    // -----------------------------------------------------------------------

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.persist(StoreKey::Theme, &theme);
    }

    pub fn stats(&self) -> DashboardStats {
        stats::dashboard(&self.projects)
    }

    pub fn search(&self, query: &str) -> SearchResults<'_> {
        stats::search(&self.projects, &self.team, query)
    }

    /// Replace roster and projects with the demo data.
    pub fn seed_demo(&mut self) {
        self.team = crate::seed::demo_team();
        self.projects = crate::seed::demo_projects(self.clock.local_now().date());
        self.save_team();
        self.save_projects();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
