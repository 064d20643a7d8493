//! Orderdesk CLI - session management against the record store.
//!
//! # Usage
//!
//! ```bash
//! # Show who is logged in and which view applies
//! orderdesk --config orderdesk.toml status
//!
//! # Log in (password from --password or ORDERDESK_PASSWORD)
//! orderdesk login admin1
//!
//! # Impersonate a user, then return
//! orderdesk login-as user42
//! orderdesk return-to-admin
//! ```
//!
//! Every command except `ping` restores the persisted session first and
//! prints the resulting status as JSON.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use orderdesk_client::{ClientConfig, ClientError, RestClient, SessionOrchestrator};
use orderdesk_core::{ApplicationView, SystemClock};
use orderdesk_storage::LmdbStore;
use secrecy::SecretString;

#[derive(Parser)]
#[command(name = "orderdesk")]
#[command(author, version, about = "Orderdesk session tools")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, env = "ORDERDESK_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current session
    Status,
    /// Check that the record store is reachable
    Ping,
    /// Log in with username and password
    Login {
        username: String,

        #[arg(long, env = "ORDERDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// End the session and clear cached data
    Logout,
    /// Act as another user (administrators only)
    LoginAs { username: String },
    /// Stop impersonating and restore the administrator session
    ReturnToAdmin,
    /// Refetch reference data
    Refresh,
    /// Choose a role (administrators with team membership)
    ///
    /// The choice is not persisted: the next command starts from role
    /// selection again.
    SelectRole {
        #[arg(value_enum)]
        role: Role,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Role {
    Admin,
    User,
}

impl From<Role> for ApplicationView {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => ApplicationView::AdminDashboard,
            Role::User => ApplicationView::UserJourney,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), ClientError> {
    let config = ClientConfig::load(cli.config)?;
    orderdesk_client::telemetry::init_logging(&config.log)?;

    let remote = Arc::new(RestClient::new(&config)?);
    if let Commands::Ping = cli.command {
        remote.ping().await?;
        println!("pong");
        return Ok(());
    }

    let store = Arc::new(LmdbStore::open(&config.store.path, config.store.max_size_mb)?);
    let mut desk = SessionOrchestrator::new(store, Arc::new(SystemClock), Arc::clone(&remote));

    match desk.rehydrate().await {
        Ok(_) => {}
        Err(e) if e.is_fetch() => {
            tracing::warn!(error = %e, "Session could not be restored");
        }
        Err(e) => return Err(e.into()),
    }

    match cli.command {
        Commands::Status | Commands::Ping => {}
        Commands::Login { username, password } => {
            let password = SecretString::from(password);
            let user = remote.authenticate(&username, &password).await?;
            desk.login(user).await?;
        }
        Commands::Logout => desk.logout()?,
        Commands::LoginAs { username } => {
            desk.login_as_username(&username)?;
        }
        Commands::ReturnToAdmin => {
            desk.return_to_admin()?;
        }
        Commands::Refresh => desk.refresh_data().await?,
        Commands::SelectRole { role } => {
            desk.select_role(role.into())?;
        }
    }

    println!("{}", serde_json::to_string_pretty(&desk.summary())?);
    Ok(())
}
