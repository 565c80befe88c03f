// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::{Parser, Subcommand};
use tracing::error;

use roomie::config::ClientConfig;
use roomie::error::AuthError;
use roomie::token;
use roomie::Client;

/// Command-line client for the roommate matching service.
#[derive(Debug, Parser)]
#[command(name = "roomie", version, about)]
struct Cli {
    #[command(flatten)]
    config: ClientConfig,

    /// Log format (json or text).
    #[arg(long, env = "ROOMIE_LOG_FORMAT", default_value = "text", global = true)]
    log_format: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "ROOMIE_LOG_LEVEL", default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in and store the session.
    Login {
        #[arg(long, env = "ROOMIE_EMAIL")]
        email: String,
        #[arg(long, env = "ROOMIE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Drop the session and all cached data.
    Logout,
    /// Show the stored session.
    Whoami,
    /// Print a currently valid access token, refreshing it if needed.
    Token,
    /// Show a property.
    Property {
        id: String,
        /// Bypass the cache.
        #[arg(long)]
        force: bool,
    },
    /// List property matches for the signed-in seeker.
    Matches {
        #[arg(long)]
        force: bool,
    },
    /// List roommate matches for the signed-in seeker.
    Roommates {
        #[arg(long)]
        force: bool,
    },
    /// List the signed-in user's likes.
    Likes {
        #[arg(long)]
        force: bool,
    },
    /// Like a property or seeker.
    Like { target: String },
    /// Dislike a property or seeker.
    Dislike { target: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(e) = run(cli).await {
        if e.downcast_ref::<AuthError>().is_some_and(AuthError::requires_login) {
            error!("not signed in, run `roomie login`: {e:#}");
        } else {
            error!("fatal: {e:#}");
        }
        std::process::exit(1);
    }
}

/// Logs go to stderr; stdout carries command output only.
fn init_tracing(cli: &Cli) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));

    match cli.log_format.as_str() {
        "json" => {
            fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr).json().init();
        }
        _ => {
            fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let client = Client::open(cli.config)?;
    match cli.command {
        Command::Login { email, password } => {
            let session = client.auth.login(&email, &password).await?;
            println!("{}", serde_json::to_string_pretty(&Whoami::from(&session))?);
        }
        Command::Logout => client.logout().await?,
        Command::Whoami => {
            println!("{}", serde_json::to_string_pretty(&Whoami::from(&client.store.snapshot()))?);
        }
        Command::Token => println!("{}", client.gate.valid_token().await?),
        Command::Property { id, force } => {
            print_json(&client.properties.property(&id, force).await?)?;
        }
        Command::Matches { force } => {
            print_json(&client.matches.property_matches(&client.user_id()?, force).await?)?;
        }
        Command::Roommates { force } => {
            print_json(&client.matches.roommate_matches(&client.user_id()?, force).await?)?;
        }
        Command::Likes { force } => {
            print_json(&client.likes.likes(&client.user_id()?, force).await?)?;
        }
        Command::Like { target } => client.likes.like(&client.user_id()?, &target).await?,
        Command::Dislike { target } => client.likes.dislike(&client.user_id()?, &target).await?,
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Session summary without the secrets.
#[derive(serde::Serialize)]
struct Whoami {
    logged_in: bool,
    user_id: Option<String>,
    user_type: Option<roomie::session::UserType>,
    /// Seconds until the access token expires.
    expires_in_secs: Option<i64>,
}

impl From<&roomie::session::Session> for Whoami {
    fn from(session: &roomie::session::Session) -> Self {
        Self {
            logged_in: session.is_logged_in(),
            user_id: session.user_id.clone(),
            user_type: session.user_type,
            expires_in_secs: session
                .access_token
                .as_deref()
                .and_then(token::claims)
                .map(|c| c.remaining_secs(token::epoch_secs())),
        }
    }
}
