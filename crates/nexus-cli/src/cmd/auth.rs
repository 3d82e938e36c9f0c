use super::open_app;
use crate::output::{print_fields, print_json};
use anyhow::Context;
use clap::Args;
use nexus_core::auth::{Registration, User};
use std::path::Path;

#[derive(Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    /// Password (prompted on stdin if omitted)
    #[arg(long, env = "NEXUS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    /// Job title shown next to your name
    #[arg(long)]
    pub role: Option<String>,
}

#[derive(Args)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,
    /// Password (prompted on stdin if omitted)
    #[arg(long, env = "NEXUS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

fn password_or_prompt(password: Option<String>) -> anyhow::Result<String> {
    if let Some(p) = password {
        return Ok(p);
    }
    eprint!("Password: ");
    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn print_user(user: &User, json: bool, verb: &str) -> anyhow::Result<()> {
    if json {
        print_json(user)
    } else {
        println!("{verb} {} <{}>", user.name, user.email);
        Ok(())
    }
}

pub fn register(root: &Path, args: RegisterArgs, json: bool) -> anyhow::Result<()> {
    let password = password_or_prompt(args.password)?;
    let mut app = open_app(root)?;
    let user = app.register(Registration {
        name: args.name,
        email: args.email,
        password,
        role: args.role,
    })?;
    print_user(&user, json, "Registered and signed in as")
}

pub fn login(root: &Path, args: LoginArgs, json: bool) -> anyhow::Result<()> {
    let password = password_or_prompt(args.password)?;
    let mut app = open_app(root)?;
    let user = app.login(&args.email, &password)?;
    print_user(&user, json, "Signed in as")
}

pub fn logout(root: &Path, json: bool) -> anyhow::Result<()> {
    let mut app = open_app(root)?;
    app.logout()?;
    if json {
        print_json(&serde_json::json!({ "signed_in": false }))?;
    } else {
        println!("Signed out");
    }
    Ok(())
}

pub fn whoami(root: &Path, json: bool) -> anyhow::Result<()> {
    let app = open_app(root)?;
    let user = app.current_user();
    if json {
        return print_json(&serde_json::json!({ "user": user }));
    }
    match user {
        Some(u) => print_fields(&[
            ("Name", u.name),
            ("Email", u.email),
            ("Role", u.role),
            ("Id", u.id),
        ]),
        None => println!("Not signed in"),
    }
    Ok(())
}
