mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    config::ConfigSubcommand, invite::InviteSubcommand, member::MemberSubcommand,
    report::ReportSubcommand, survey::SurveySubcommand, team::TeamSubcommand,
    token::TokenSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "retro",
    about = "Team retrospectives and surveys: run the server, manage teams, issue links",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: nearest retro.yaml walking up from the cwd)
    #[arg(long, global = true, env = "RETRO_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST and WebSocket server
    Serve {
        /// Port to listen on (overrides server.port; 0 = OS-assigned)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Manage teams
    Team {
        #[command(subcommand)]
        subcommand: TeamSubcommand,
    },

    /// Manage team members
    Member {
        #[command(subcommand)]
        subcommand: MemberSubcommand,
    },

    /// Issue and inspect signed tokens
    Token {
        #[command(subcommand)]
        subcommand: TokenSubcommand,
    },

    /// Build retro or survey invitation links for every member of a team
    Invite {
        #[command(subcommand)]
        subcommand: InviteSubcommand,
    },

    /// Inspect survey submissions
    Survey {
        #[command(subcommand)]
        subcommand: SurveySubcommand,
    },

    /// Inspect stored sprint reports
    Report {
        #[command(subcommand)]
        subcommand: ReportSubcommand,
    },

    /// Create, show, and validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let config_path = root::resolve_config(cli.config.as_deref());

    let result = match cli.command {
        Commands::Serve { port } => cmd::serve::run(&config_path, port),
        Commands::Team { subcommand } => cmd::team::run(&config_path, subcommand, cli.json),
        Commands::Member { subcommand } => cmd::member::run(&config_path, subcommand, cli.json),
        Commands::Token { subcommand } => cmd::token::run(&config_path, subcommand, cli.json),
        Commands::Invite { subcommand } => cmd::invite::run(&config_path, subcommand, cli.json),
        Commands::Survey { subcommand } => cmd::survey::run(&config_path, subcommand, cli.json),
        Commands::Report { subcommand } => cmd::report::run(&config_path, subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&config_path, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
