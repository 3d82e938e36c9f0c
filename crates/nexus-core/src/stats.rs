use crate::project::Project;
use crate::team::TeamMember;
use crate::types::TaskStatus;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCount {
    pub status: TaskStatus,
    pub count: usize,
}

/// Portfolio-wide numbers for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_projects: usize,
    pub active_projects: usize,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub overall_progress: u8,
    pub total_budget: f64,
    /// Only statuses with at least one task.
    pub by_status: Vec<StatusCount>,
}

pub fn dashboard(projects: &[Project]) -> DashboardStats {
    let tasks = || projects.iter().flat_map(|p| p.tasks.iter());
    let total_tasks = tasks().count();
    let completed_tasks = tasks().filter(|t| t.is_completed()).count();
    let overall_progress = if total_tasks == 0 {
        0
    } else {
        ((200 * completed_tasks + total_tasks) / (2 * total_tasks)) as u8
    };
    let by_status = TaskStatus::all()
        .iter()
        .map(|&status| StatusCount {
            status,
            count: tasks().filter(|t| t.status == status).count(),
        })
        .filter(|c| c.count > 0)
        .collect();

    DashboardStats {
        total_projects: projects.len(),
        active_projects: projects.iter().filter(|p| !p.is_complete()).count(),
        total_tasks,
        completed_tasks,
        overall_progress,
        total_budget: projects.iter().map(|p| p.budget).sum(),
        by_status,
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct SearchResults<'a> {
    pub projects: Vec<&'a Project>,
    pub members: Vec<&'a TeamMember>,
}

impl SearchResults<'_> {
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty() && self.members.is_empty()
    }
}

/// Case-insensitive substring match over project name/description and member
/// name/role. A blank query matches nothing.
pub fn search<'a>(projects: &'a [Project], team: &'a [TeamMember], query: &str) -> SearchResults<'a> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return SearchResults {
            projects: Vec::new(),
            members: Vec::new(),
        };
    }
    let hit = |s: &str| s.to_lowercase().contains(&needle);
    SearchResults {
        projects: projects
            .iter()
            .filter(|p| hit(&p.name) || hit(&p.description))
            .collect(),
        members: team.iter().filter(|m| hit(&m.name) || hit(&m.role)).collect(),
    }
}
