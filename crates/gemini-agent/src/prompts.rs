//! Prompt text and response schemas.

use chrono::{Datelike, NaiveDate};
use nexus_core::project::Project;
use nexus_core::team::TeamMember;
use serde_json::{json, Value};

pub fn transcribe(language: &str) -> String {
    format!(
        "Transcribe the audio exactly as spoken in {language}. If the audio is unclear, \
         return \"[Unclear Speech]\". Do not add any other commentary."
    )
}

pub fn refine(text: &str) -> String {
    format!(
        "Fix grammar, improve clarity, and fix potential typos in the following text.\n\
         Do not remove key details or change the original intent.\n\
         Keep it professional but natural.\n\n\
         Text: \"{text}\""
    )
}

pub const PLAN_FROM_AUDIO: &str = "Create a detailed project plan based on this audio recording.";

fn team_context(team: &[TeamMember]) -> String {
    if team.is_empty() {
        return "No specific team members provided.".to_string();
    }
    let lines: Vec<String> = team
        .iter()
        .map(|m| {
            format!(
                "- Name: {}, ID: {}, Role: {}, Skills: {}",
                m.name,
                m.id,
                m.role,
                m.skills.join(", ")
            )
        })
        .collect();
    format!(
        "Available Team Members for assignment (use their exact IDs). \
         Prioritize assigning based on skills match:\n{}",
        lines.join("\n")
    )
}

/// System instruction for plan generation. `today` is the user's local date.
pub fn plan_system(today: NaiveDate, team: &[TeamMember]) -> String {
    let date = today.format("%Y-%m-%d");
    let year = today.year();
    format!(
        "You are a senior project manager. Analyze the request and create a structured project plan.\n\n\
         CRITICAL RULES:\n\
         1. Current Date: {date}. Current Year: {year}.\n\
         2. All deadlines MUST be in the future relative to {date}. Do not use dates from {prev} or earlier.\n\
         3. If a deadline is not explicitly mentioned, generate a reasonable one within the project duration.\n\
         4. Assign tasks to the available team members provided in the context if their role and skills \
         match the task requirements. Use the 'assigneeId' field.\n\n\
         Context:\n{context}",
        prev = year - 1,
        context = team_context(team),
    )
}

pub fn risks(project: &Project) -> String {
    let titles: Vec<&str> = project.tasks.iter().map(|t| t.title.as_str()).collect();
    format!(
        "Analyze this project plan for potential risks:\n\
         Project: {}\n\
         Description: {}\n\
         Tech Stack: {}\n\
         Budget: {}\n\
         Timeline: {} to {}\n\
         Tasks: {}\n\n\
         Identify top 3-5 risks with severity and mitigation strategies.",
        project.name,
        project.description,
        project.tech_stack.join(", "),
        project.budget,
        project.start_date,
        project.end_date,
        titles.join(", "),
    )
}

pub fn report(project: &Project) -> String {
    format!(
        "Generate a professional status report for:\n\
         Project: {}\n\
         Progress: {}%\n\
         Budget: {}\n\
         Completed Tasks: {} / {}\n\n\
         Format as a clean, professional markdown report with Executive Summary, Progress Details, \
         and Recommendations. Use bolding and lists for readability.",
        project.name,
        project.progress,
        project.budget,
        project.completed_count(),
        project.tasks.len(),
    )
}

pub fn plan_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "name": { "type": "STRING" },
            "description": { "type": "STRING" },
            "startDate": { "type": "STRING", "description": "YYYY-MM-DD format" },
            "endDate": { "type": "STRING", "description": "YYYY-MM-DD format" },
            "budget": { "type": "NUMBER" },
            "techStack": { "type": "ARRAY", "items": { "type": "STRING" } },
            "tasks": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": { "type": "STRING" },
                        "description": { "type": "STRING" },
                        "priority": { "type": "STRING", "enum": ["Low", "Medium", "High", "Critical"] },
                        "estimatedHours": { "type": "NUMBER" },
                        "deadline": {
                            "type": "STRING",
                            "description": "YYYY-MM-DD format. Must be in the future relative to today."
                        },
                        "assigneeId": {
                            "type": "STRING",
                            "description": "The ID of the team member assigned to this task, if applicable."
                        }
                    },
                    "required": ["title", "priority", "estimatedHours"]
                }
            },
            "suggestedTeamRoles": { "type": "ARRAY", "items": { "type": "STRING" } }
        },
        "required": ["name", "description", "tasks"]
    })
}

pub fn risk_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "description": { "type": "STRING" },
                "severity": { "type": "STRING", "enum": ["Low", "Medium", "High"] },
                "mitigationStrategy": { "type": "STRING" }
            },
            "required": ["description", "severity", "mitigationStrategy"]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_system_mentions_date_and_ids() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let team = vec![TeamMember {
            id: "u1".into(),
            name: "Alice".into(),
            role: "Dev".into(),
            skills: vec!["Rust".into(), "SQL".into()],
            avatar: String::new(),
        }];
        let s = plan_system(today, &team);
        assert!(s.contains("Current Date: 2026-03-10. Current Year: 2026."));
        assert!(s.contains("dates from 2025 or earlier"));
        assert!(s.contains("- Name: Alice, ID: u1, Role: Dev, Skills: Rust, SQL"));

        assert!(plan_system(today, &[]).contains("No specific team members provided."));
    }

    #[test]
    fn schemas_require_core_fields() {
        assert_eq!(plan_schema()["required"][2], "tasks");
        assert_eq!(risk_schema()["items"]["properties"]["severity"]["enum"][2], "High");
    }
}
