use super::open_app;
use crate::output::{print_json, print_table};
use clap::Subcommand;
use nexus_core::team::{parse_skills, MemberInput};
use std::path::Path;

#[derive(Subcommand)]
pub enum TeamSubcommand {
    /// Add a member to the roster
    Add {
        name: String,
        #[arg(long)]
        role: String,
        /// Comma-separated skills
        #[arg(long, default_value = "")]
        skills: String,
        /// Avatar URL (default: generated from the name)
        #[arg(long)]
        avatar: Option<String>,
    },
    /// Edit a member; changes reach every project that includes them
    Edit {
        /// Member id or name
        member: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        skills: Option<String>,
        #[arg(long)]
        avatar: Option<String>,
    },
    /// Remove a member from the roster and every project
    Remove { member: String },
    /// List the roster
    List,
}

pub fn run(root: &Path, subcmd: TeamSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        TeamSubcommand::Add {
            name,
            role,
            skills,
            avatar,
        } => add(
            root,
            MemberInput {
                name,
                role,
                skills: parse_skills(&skills),
                avatar,
            },
            json,
        ),
        TeamSubcommand::Edit {
            member,
            name,
            role,
            skills,
            avatar,
        } => edit(root, &member, name, role, skills, avatar, json),
        TeamSubcommand::Remove { member } => remove(root, &member, json),
        TeamSubcommand::List => list(root, json),
    }
}

fn add(root: &Path, input: MemberInput, json: bool) -> anyhow::Result<()> {
    let mut app = open_app(root)?;
    let member = app.add_member(input)?;
    if json {
        print_json(&member)?;
    } else {
        println!("Added {} ({}) [{}]", member.name, member.role, member.id);
    }
    Ok(())
}

fn edit(
    root: &Path,
    key: &str,
    name: Option<String>,
    role: Option<String>,
    skills: Option<String>,
    avatar: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let mut app = open_app(root)?;
    let current = app.member(key)?.clone();
    let input = MemberInput {
        name: name.unwrap_or(current.name),
        role: role.unwrap_or(current.role),
        skills: skills
            .as_deref()
            .map(parse_skills)
            .unwrap_or(current.skills),
        avatar: avatar.or(Some(current.avatar)),
    };
    let member = app.update_member(&current.id, input)?;
    if json {
        print_json(&member)?;
    } else {
        println!("Updated {} ({})", member.name, member.role);
    }
    Ok(())
}

fn remove(root: &Path, key: &str, json: bool) -> anyhow::Result<()> {
    let mut app = open_app(root)?;
    let member = app.member(key)?.clone();
    app.delete_member(&member.id)?;
    if json {
        print_json(&serde_json::json!({ "removed": member.id }))?;
    } else {
        println!("Removed {}", member.name);
    }
    Ok(())
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let app = open_app(root)?;
    if json {
        return print_json(&app.team());
    }
    if app.team().is_empty() {
        println!("No team members.");
        return Ok(());
    }
    let rows = app
        .team()
        .iter()
        .map(|m| vec![m.id.clone(), m.name.clone(), m.role.clone(), m.skills.join(", ")])
        .collect();
    print_table(&["ID", "NAME", "ROLE", "SKILLS"], rows);
    Ok(())
}
