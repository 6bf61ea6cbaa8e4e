//! Schoolhouse CLI - command-line front-end for the school portal client.
//!
//! # Usage
//!
//! ```bash
//! # Log in and see which dashboard the role lands on
//! schoolhouse login -u teacher@school.test
//!
//! # Switch to dark mode, then go back to the admin default
//! schoolhouse theme toggle
//! schoolhouse theme reset
//!
//! # Print the generated stylesheet
//! schoolhouse theme css
//!
//! # Follow the period in progress
//! schoolhouse period watch
//! ```
//!
//! # Commands
//!
//! - `login` / `logout` / `whoami` - Session management
//! - `theme` - Light/dark mode and the generated stylesheet
//! - `settings` - Admin design settings
//! - `period watch` - Current timetable period
//!
//! Configuration comes from the environment; see `schoolhouse_client::config`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use schoolhouse_client::{ClientConfig, PortalState};
use schoolhouse_core::ColorMode;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "schoolhouse")]
#[command(author, version, about = "Schoolhouse portal client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in to the portal
    Login {
        /// Email, username or admission number
        #[arg(short = 'u', long)]
        identifier: String,

        /// Password
        #[arg(short, long, env = "SCHOOLHOUSE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Log out and forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Light/dark mode and stylesheet
    Theme {
        #[command(subcommand)]
        action: ThemeAction,
    },
    /// Admin design settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Current timetable period
    Period {
        #[command(subcommand)]
        action: PeriodAction,
    },
}

#[derive(Subcommand)]
enum ThemeAction {
    /// Show the current settings and mode
    Show,
    /// Switch between light and dark
    Toggle,
    /// Choose a mode explicitly
    Set {
        #[arg(value_enum)]
        mode: ModeArg,
    },
    /// Follow the admin default again
    Reset,
    /// Print the generated stylesheet
    Css,
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Fetch the admin settings from the backend
    Sync,
    /// Save settings from a JSON file (admin only)
    Push {
        /// Path to a design settings JSON file
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum PeriodAction {
    /// Print the current period and follow changes
    Watch {
        /// Print once and exit
        #[arg(long)]
        once: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Light,
    Dark,
}

impl From<ModeArg> for ColorMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Light => Self::Light,
            ModeArg::Dark => Self::Dark,
        }
    }
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    // Defaults to warn so command output stays readable if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "schoolhouse_cli=info,schoolhouse_client=warn".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration first (needed for Sentry init)
    let config = ClientConfig::from_env();
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);
    init_tracing();

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            return ExitCode::from(2);
        }
    };

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.is_reportable() {
                sentry::capture_error(&e);
            }
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: ClientConfig) -> Result<(), CommandError> {
    let portal = PortalState::open(config)?;
    let modal = portal.mount_auth_lost_modal(None).map_err(schoolhouse_client::ClientError::from)?;
    let mut out = std::io::stdout().lock();

    let result = match cli.command {
        Commands::Login {
            identifier,
            password,
        } => commands::auth::login(&portal, &identifier, password, &mut out).await,
        Commands::Logout => commands::auth::logout(&portal, &mut out).await,
        Commands::Whoami => commands::auth::whoami(&portal, &mut out).await,
        Commands::Theme { action } => match action {
            ThemeAction::Show => commands::theme::show(&portal, &mut out),
            ThemeAction::Toggle => commands::theme::toggle(&portal, &mut out),
            ThemeAction::Set { mode } => commands::theme::set(&portal, mode.into(), &mut out),
            ThemeAction::Reset => commands::theme::reset(&portal, &mut out),
            ThemeAction::Css => commands::theme::css(&portal, &mut out),
        },
        Commands::Settings { action } => match action {
            SettingsAction::Sync => commands::settings::sync(&portal, &mut out).await,
            SettingsAction::Push { file } => {
                commands::settings::push(&portal, &file, &mut out).await
            }
        },
        Commands::Period { action } => match action {
            PeriodAction::Watch { once } => commands::period::watch(&portal, once, &mut out).await,
        },
    };

    commands::auth::answer_auth_lost(&modal, &mut out)?;

    result
}
