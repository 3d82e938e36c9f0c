mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    ai::TranscribeArgs,
    auth::{LoginArgs, RegisterArgs},
    config::ConfigSubcommand,
    notify::NotifySubcommand,
    project::ProjectSubcommand,
    task::TaskSubcommand,
    team::TeamSubcommand,
};
use nexus_core::types::Theme;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "nexus",
    about = "Project and task manager with deadline reminders and AI planning",
    version,
    propagate_version = true
)]
struct Cli {
    /// Data root (default: nearest directory with .nexus/, else your home)
    #[arg(long, global = true, env = "NEXUS_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .nexus/ and a default config
    Init {
        /// Seed a demo team and sample project
        #[arg(long)]
        demo: bool,
    },

    /// Create an account and sign in
    Register(RegisterArgs),

    /// Sign in
    Login(LoginArgs),

    /// Sign out
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Manage projects
    Project {
        #[command(subcommand)]
        subcommand: ProjectSubcommand,
    },

    /// Manage tasks within a project
    Task {
        #[command(subcommand)]
        subcommand: TaskSubcommand,
    },

    /// Manage the team roster
    Team {
        #[command(subcommand)]
        subcommand: TeamSubcommand,
    },

    /// Read and clear notifications
    Notify {
        #[command(subcommand)]
        subcommand: NotifySubcommand,
    },

    /// Fire task reminders as they come due
    Watch {
        /// Run a single scan and exit
        #[arg(long)]
        once: bool,
        /// No terminal bell or stderr alerts
        #[arg(long)]
        quiet: bool,
    },

    /// Search projects and team members
    Search { query: String },

    /// Show or set the colour theme (light or dark)
    Theme { value: Option<Theme> },

    /// Transcribe an audio recording
    Transcribe(TranscribeArgs),

    /// Fix grammar and clarity in a piece of text
    Refine {
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Inspect and validate .nexus/config.yaml
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    // Long-running commands log at INFO; everything else stays quiet unless
    // RUST_LOG says otherwise.
    let default_level = match &cli.command {
        Commands::Watch { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init { demo } => cmd::init::run(&root, demo, cli.json),
        Commands::Register(args) => cmd::auth::register(&root, args, cli.json),
        Commands::Login(args) => cmd::auth::login(&root, args, cli.json),
        Commands::Logout => cmd::auth::logout(&root, cli.json),
        Commands::Whoami => cmd::auth::whoami(&root, cli.json),
        Commands::Project { subcommand } => cmd::project::run(&root, subcommand, cli.json),
        Commands::Task { subcommand } => cmd::task::run(&root, subcommand, cli.json),
        Commands::Team { subcommand } => cmd::team::run(&root, subcommand, cli.json),
        Commands::Notify { subcommand } => cmd::notify::run(&root, subcommand, cli.json),
        Commands::Watch { once, quiet } => cmd::watch::run(&root, once, quiet, cli.json),
        Commands::Search { query } => cmd::search::run(&root, &query, cli.json),
        Commands::Theme { value } => cmd::theme::run(&root, value, cli.json),
        Commands::Transcribe(args) => cmd::ai::transcribe(&root, args, cli.json),
        Commands::Refine { text } => cmd::ai::refine(&root, &text.join(" "), cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
