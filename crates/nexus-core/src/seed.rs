//! Starter data for `nexus init --demo`.

use crate::project::{progress_of, Project, Risk};
use crate::task::{Task, TaskHistory, ACTOR_SYSTEM};
use crate::team::TeamMember;
use crate::types::{ChangeType, Priority, Severity, TaskStatus};
use chrono::{DateTime, Days, NaiveDate, Utc};

fn member(id: &str, name: &str, role: &str, skills: &[&str], seed: &str) -> TeamMember {
    TeamMember {
        id: id.to_string(),
        name: name.to_string(),
        role: role.to_string(),
        skills: skills.iter().map(|s| s.to_string()).collect(),
        avatar: format!("https://api.dicebear.com/7.x/avataaars/svg?seed={seed}"),
    }
}

pub fn demo_team() -> Vec<TeamMember> {
    vec![
        member("u1", "Alice Chen", "Frontend Lead", &["React", "TypeScript", "Tailwind"], "Alice"),
        member("u2", "Bob Smith", "Backend Engineer", &["Node.js", "PostgreSQL", "Redis"], "Bob"),
        member("u3", "Charlie Kim", "UI/UX Designer", &["Figma", "CSS", "User Research"], "Charlie"),
        member("u4", "Diana Prince", "Product Manager", &["Agile", "Strategy", "Roadmapping"], "Diana"),
    ]
}

fn shift(today: NaiveDate, offset: i64) -> NaiveDate {
    let days = Days::new(offset.unsigned_abs());
    let shifted = if offset >= 0 {
        today.checked_add_days(days)
    } else {
        today.checked_sub_days(days)
    };
    shifted.unwrap_or(today)
}

fn stamp(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_opt(0, 0, 0)
        .map(|d| d.and_utc())
        .unwrap_or_default()
}

fn entry(id: &str, kind: ChangeType, description: &str, actor: &str, day: NaiveDate) -> TaskHistory {
    TaskHistory {
        id: id.to_string(),
        change_type: kind,
        description: description.to_string(),
        timestamp: stamp(day),
        actor_name: actor.to_string(),
    }
}

#[allow(clippy::too_many_arguments)]
fn seeded_task(
    id: &str,
    title: &str,
    description: &str,
    status: TaskStatus,
    priority: Priority,
    hours: f64,
    assignee: &str,
    deadline: NaiveDate,
    history: Vec<TaskHistory>,
) -> Task {
    Task {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        assignee_id: Some(assignee.to_string()),
        status,
        priority,
        deadline: Some(deadline),
        reminder_at: None,
        estimated_hours: hours,
        history,
    }
}

/// One in-flight project with dates relative to `today`.
pub fn demo_projects(today: NaiveDate) -> Vec<Project> {
    let d = |offset| shift(today, offset);
    let tasks = vec![
        seeded_task(
            "t1",
            "Setup Repo & CI/CD",
            "Initialize project structure and GitHub Actions.",
            TaskStatus::Completed,
            Priority::High,
            8.0,
            "u2",
            d(-5),
            vec![
                entry("h2", ChangeType::Status, "Moved to Completed", "Bob Smith", d(-5)),
                entry("h1", ChangeType::Created, "Task created", ACTOR_SYSTEM, d(-10)),
            ],
        ),
        seeded_task(
            "t2",
            "Design Checkout Flow",
            "Create high-fidelity mockups for checkout.",
            TaskStatus::InProgress,
            Priority::Critical,
            16.0,
            "u3",
            d(5),
            vec![entry("h3", ChangeType::Created, "Task created", ACTOR_SYSTEM, d(-9))],
        ),
        seeded_task(
            "t3",
            "Stripe Integration",
            "Implement payment intent and webhooks.",
            TaskStatus::Pending,
            Priority::High,
            24.0,
            "u1",
            d(15),
            vec![entry("h4", ChangeType::Created, "Task created", ACTOR_SYSTEM, d(-9))],
        ),
    ];

    vec![Project {
        id: "p1".to_string(),
        name: "E-Commerce Revamp".to_string(),
        description: "Modernizing the legacy shopping cart experience with Next.js and Stripe integration."
            .to_string(),
        start_date: d(-10),
        end_date: d(45),
        budget: 45000.0,
        tech_stack: vec!["React".into(), "Node.js".into(), "Stripe".into()],
        team: demo_team(),
        risks: vec![Risk {
            id: "r1".to_string(),
            description: "Third-party API limits".to_string(),
            severity: Severity::Medium,
            mitigation_strategy: "Implement caching layer".to_string(),
        }],
        progress: progress_of(&tasks),
        tasks,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_project_is_consistent() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let projects = demo_projects(today);
        let p = &projects[0];
        assert_eq!(p.progress, 33);
        assert_eq!(p.start_date, NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
        assert_eq!(p.team.len(), 4);
        for t in &p.tasks {
            let assignee = t.assignee_id.as_deref().unwrap();
            assert!(p.team.iter().any(|m| m.id == assignee));
        }
        // Newest history first.
        assert!(p.tasks[0].history[0].timestamp > p.tasks[0].history[1].timestamp);
    }
}
