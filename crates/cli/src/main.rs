//! Storedesk CLI - database migrations, user management and seeding.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! sd-cli migrate
//!
//! # Create a back-office admin (password from SD_USER_PASSWORD or stdin)
//! sd-cli user create -e admin@example.com -u admin -n "Admin Name" -r admin
//!
//! # Load reference data
//! sd-cli seed -f seed.yaml
//! ```
//!
//! All commands read `SD_DATABASE_URL` (falling back to `DATABASE_URL`),
//! loading a `.env` file first when one exists.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sd-cli")]
#[command(author, version, about = "Storedesk CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Insert categories, brands, locations and coupons from a YAML file
    Seed {
        /// Path to the seed file
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Email address used to log in
        #[arg(short, long)]
        email: String,

        /// Unique user name
        #[arg(short, long)]
        username: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Role (`admin`, `vendor`, `customer`)
        #[arg(short, long, default_value = "admin")]
        role: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                username,
                name,
                role,
            } => {
                commands::user::create(&email, &username, &name, &role).await?;
            }
        },
        Commands::Seed { file } => {
            commands::seed::run(&file).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_user_create() {
        let cli = Cli::try_parse_from([
            "sd-cli", "user", "create", "-e", "mai@example.org", "-u", "mai", "-n", "Mai Tran",
        ])
        .unwrap_or_else(|e| panic!("{e}"));
        match cli.command {
            Commands::User {
                action: UserAction::Create { role, username, .. },
            } => {
                assert_eq!(role, "admin");
                assert_eq!(username, "mai");
            }
            _ => panic!("expected user create"),
        }
    }

    #[test]
    fn test_seed_requires_file() {
        assert!(Cli::try_parse_from(["sd-cli", "seed"]).is_err());
    }
}
