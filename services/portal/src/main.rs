use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use common::{ProfileUpdate, config::ApiConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod client;
mod reconciler;
mod session;
#[cfg(test)]
mod test_support;
mod validation;
mod view;

use crate::{
    client::HttpProfileApi,
    reconciler::{ProfileReconciler, RetryPolicy},
    session::{PageState, SessionController},
};

#[derive(Parser)]
#[command(name = "nebula-portal")]
#[command(about = "Nebula Cloud Gaming profile portal", long_about = None)]
struct Cli {
    /// Account email
    #[arg(long, env = "NEBULA_EMAIL")]
    email: String,

    /// Account password (required by the login form, never sent)
    #[arg(long, env = "NEBULA_PASSWORD", hide_env_values = true)]
    password: String,

    /// Optional TOML file with API settings
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and show the profile (default)
    Show,
    /// Log in, then update profile fields
    Update(UpdateArgs),
}

#[derive(Args)]
struct UpdateArgs {
    #[arg(long)]
    plan: Option<String>,
    #[arg(long)]
    playing_hours: Option<f64>,
    #[arg(long)]
    connected_devices: Option<u32>,
    #[arg(long)]
    nebula_points: Option<f64>,
    #[arg(long)]
    achievement_progress: Option<f64>,
    #[arg(long)]
    games_completed: Option<u32>,
    #[arg(long)]
    favorite_genre: Option<String>,
}

impl From<UpdateArgs> for ProfileUpdate {
    fn from(args: UpdateArgs) -> Self {
        Self {
            current_plan: args.plan,
            playing_hours: args.playing_hours,
            connected_devices: args.connected_devices,
            plan_expiry_date: None,
            nebula_points: args.nebula_points,
            achievement_progress: args.achievement_progress,
            games_completed: args.games_completed,
            favorite_genre: args.favorite_genre,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("Starting Nebula portal");

    let config = ApiConfig::load(cli.config.as_deref())?;
    let api = HttpProfileApi::new(&config)?;
    let reconciler = ProfileReconciler::new(Arc::new(api), RetryPolicy::from_config(&config));
    let mut session = SessionController::new(reconciler);

    session.submit_login(&cli.email, &cli.password).await?;
    let mut page = session.wait_for_profile().await;

    if let PageState::Failed(kind) = page {
        print!("{}", view::render_page(&page));
        anyhow::bail!("Failed to load profile: {}", kind);
    }

    if let Some(Command::Update(args)) = cli.command {
        let update = ProfileUpdate::from(args);
        if update.is_empty() {
            anyhow::bail!("Nothing to update, pass at least one field");
        }

        session.update_profile(&update).await?;
        page = session.page_state().await;
    }

    print!("{}", view::render_page(&page));
    session.logout().await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_update() {
        let cli = Cli::try_parse_from([
            "nebula-portal",
            "--email",
            "gamer@nebula.io",
            "--password",
            "hunter2",
            "update",
            "--plan",
            "Nebula Nexus Ultimate",
            "--playing-hours",
            "12.5",
        ])
        .unwrap();

        let Some(Command::Update(args)) = cli.command else {
            panic!("expected update subcommand");
        };
        let update = ProfileUpdate::from(args);
        assert_eq!(update.current_plan.as_deref(), Some("Nebula Nexus Ultimate"));
        assert_eq!(update.playing_hours, Some(12.5));
        assert_eq!(update.games_completed, None);
    }

    #[test]
    fn test_cli_defaults_to_show() {
        let cli = Cli::try_parse_from([
            "nebula-portal",
            "--email",
            "gamer@nebula.io",
            "--password",
            "hunter2",
        ])
        .unwrap();

        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }
}
