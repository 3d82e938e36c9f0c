use super::open_app;
use crate::output::{print_json, print_table, truncate};
use std::path::Path;

pub fn run(root: &Path, query: &str, json: bool) -> anyhow::Result<()> {
    let app = open_app(root)?;
    let results = app.search(query);
    if json {
        return print_json(&serde_json::json!({
            "projects": results.projects.iter().map(|p| serde_json::json!({
                "id": p.id,
                "name": p.name,
                "progress": p.progress,
            })).collect::<Vec<_>>(),
            "members": results.members,
        }));
    }
    if results.is_empty() {
        println!("No matches for '{query}'.");
        return Ok(());
    }
    let mut rows: Vec<Vec<String>> = results
        .projects
        .iter()
        .map(|p| {
            vec![
                "project".to_string(),
                p.id.clone(),
                p.name.clone(),
                truncate(&p.description, 50),
            ]
        })
        .collect();
    rows.extend(results.members.iter().map(|m| {
        vec![
            "member".to_string(),
            m.id.clone(),
            m.name.clone(),
            m.role.clone(),
        ]
    }));
    print_table(&["KIND", "ID", "NAME", "DETAIL"], rows);
    Ok(())
}
