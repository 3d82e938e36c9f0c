use crate::error::{NexusError, Result};
use crate::project::Project;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SKILL: &str = "General";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: String,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub avatar: String,
}

/// Generated avatar URL seeded by display name.
pub fn default_avatar(name: &str) -> String {
    let seed: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    format!("https://api.dicebear.com/7.x/avataaars/svg?seed={seed}")
}

/// Split a comma-separated skill list, dropping blanks.
pub fn parse_skills(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Fields a user supplies when adding or editing a roster entry.
#[derive(Debug, Clone, Default)]
pub struct MemberInput {
    pub name: String,
    pub role: String,
    pub skills: Vec<String>,
    pub avatar: Option<String>,
}

impl MemberInput {
    pub fn into_member(self, id: String) -> Result<TeamMember> {
        if self.name.trim().is_empty() || self.role.trim().is_empty() {
            return Err(NexusError::validation("Name and role are required."));
        }
        let avatar = match self.avatar {
            Some(a) if !a.trim().is_empty() => a,
            _ => default_avatar(&self.name),
        };
        Ok(TeamMember {
            id,
            name: self.name.trim().to_string(),
            role: self.role.trim().to_string(),
            skills: self.skills,
            avatar,
        })
    }
}

pub fn find<'a>(team: &'a [TeamMember], id: &str) -> Option<&'a TeamMember> {
    team.iter().find(|m| m.id == id)
}

/// Display name for an optional assignee id; unknown or absent ids read as
/// "Unassigned".
pub fn display_name(team: &[TeamMember], id: Option<&str>) -> String {
    id.and_then(|id| find(team, id))
        .map(|m| m.name.clone())
        .unwrap_or_else(|| "Unassigned".to_string())
}

// ---------------------------------------------------------------------------
// Snapshot propagation
// ---------------------------------------------------------------------------

/// Replace every embedded snapshot of `member` across all projects.
/// Returns how many projects were touched.
pub fn propagate_update(projects: &mut [Project], member: &TeamMember) -> usize {
    let mut touched = 0;
    for project in projects.iter_mut() {
        let mut hit = false;
        for slot in project.team.iter_mut().filter(|m| m.id == member.id) {
            *slot = member.clone();
            hit = true;
        }
        if hit {
            touched += 1;
        }
    }
    touched
}

/// Drop the member with `id` from every project's embedded team.
pub fn propagate_delete(projects: &mut [Project], id: &str) -> usize {
    let mut touched = 0;
    for project in projects.iter_mut() {
        let before = project.team.len();
        project.team.retain(|m| m.id != id);
        if project.team.len() != before {
            touched += 1;
        }
    }
    touched
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
