use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};

use neemaflex_auth::{SessionState, role_display_name, settle};
use neemaflex_client::{AuthOutcome, ClientConfig, SessionManager};
use neemaflex_core::{ProfileUpdate, Registration, RoleKind};
use neemaflex_observability::LogFormat;

#[derive(Debug, Parser)]
#[command(name = "neemaflex", version, about = "Neemaflex session client")]
struct Cli {
    /// Backend origin, e.g. https://api.neemaflex.com
    #[arg(long, global = true)]
    backend_url: Option<String>,

    /// Token file location.
    #[arg(long, global = true)]
    token_path: Option<PathBuf>,

    #[arg(long, global = true, default_value = "pretty", env = "NEEMAFLEX_LOG_FORMAT")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in and persist the session.
    Login {
        email: String,
        #[arg(env = "NEEMAFLEX_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in.
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        /// customer, service_provider or admin
        #[arg(long, default_value = "customer")]
        role: RoleKind,
        #[arg(long, env = "NEEMAFLEX_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and forget the persisted tokens.
    Logout,
    /// Show the signed-in identity.
    Whoami,
    /// Exchange the refresh token for a new access token.
    Refresh,
    /// Change profile fields; unspecified fields are left alone.
    UpdateProfile {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        profile_picture: Option<String>,
    },
    /// Show the page the application settles on for a path.
    Open { path: String },
    /// Check that the backend is reachable.
    Health,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    neemaflex_observability::init(cli.log_format);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let mut config = ClientConfig::from_env().context("reading configuration")?;
    if let Some(url) = cli.backend_url {
        config = config.with_backend_url(url);
    }
    if let Some(path) = cli.token_path {
        config = config.with_token_path(path);
    }
    config.validate().context("invalid configuration")?;

    let session = SessionManager::from_config(&config).context("building session")?;

    // Health must not touch the persisted session.
    if !matches!(cli.command, Command::Health) {
        let state = session.bootstrap().await;
        tracing::debug!(phase = %state.phase(), "session resolved");
    }

    let ok = match cli.command {
        Command::Login { email, password } => report(session.login(&email, &password).await, &session),
        Command::Register {
            email,
            phone,
            first_name,
            last_name,
            role,
            password,
        } => {
            let registration = Registration {
                email,
                phone,
                first_name,
                last_name,
                role,
                password,
            };
            report(session.register(&registration).await, &session)
        }
        Command::Logout => {
            session.logout().await;
            println!("signed out");
            true
        }
        Command::Whoami => print_identity(&session.state()),
        Command::Refresh => {
            if session.refresh().await {
                println!("session renewed");
                true
            } else {
                println!("session expired; sign in again");
                false
            }
        }
        Command::UpdateProfile {
            first_name,
            last_name,
            phone,
            profile_picture,
        } => {
            let update = ProfileUpdate {
                first_name,
                last_name,
                phone,
                profile_picture,
                address: None,
            };
            if update.is_empty() {
                anyhow::bail!("nothing to update");
            }
            report(session.update_profile(&update).await, &session)
        }
        Command::Open { path } => {
            println!("{}", settle(&path, &session.state()));
            true
        }
        Command::Health => {
            let up = session.api().health().await;
            println!("{} is {}", config.backend_url, if up { "up" } else { "unreachable" });
            up
        }
    };

    Ok(ok)
}

fn report(outcome: AuthOutcome, session: &SessionManager) -> bool {
    match outcome {
        AuthOutcome::Success => print_identity(&session.state()),
        AuthOutcome::Failure { message } => {
            eprintln!("{message}");
            false
        }
    }
}

fn print_identity(state: &SessionState) -> bool {
    let Some(identity) = state.identity() else {
        println!("not signed in");
        return false;
    };
    println!("[{}] {} <{}>", identity.initial(), identity.full_name(), identity.email);
    println!("role: {}", role_display_name(&identity.role));
    println!("id:   {}", identity.id);
    true
}
