//! Journal CLI - keep a private, titled journal from the command line
//!
//! Entries live in the configured document store, images in blob storage,
//! and every command runs as the identity restored from the keychain.

mod auth;
mod cli;
mod commands;
mod config_profiles;
mod error;


use clap::{CommandFactory, Parser};

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::auth_cmd::{run_signin, run_signout, run_signup};
use crate::commands::common::resolve_db_path;
use crate::commands::config::run_config;
use crate::commands::list::run_list;
use crate::commands::share::run_share;
use crate::commands::status::run_status;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        if let Some(category) = error.category() {
            eprintln!("{}", category.user_message());
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let directive = "journal=info"
        .parse()
        .map_err(|error| CliError::Config(format!("Invalid log directive: {error}")))?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let profile = cli.profile.as_deref();

    match cli.command {
        Some(Commands::Signup { email, password }) => {
            run_signup(&email, &password, profile).await?;
        }
        Some(Commands::Signin { email, password }) => {
            run_signin(&email, &password, profile).await?;
        }
        Some(Commands::Signout) => run_signout(profile).await?,
        Some(Commands::Status) => {
            let db_path = resolve_db_path(cli.db_path)?;
            run_status(profile, &db_path).await?;
        }
        Some(Commands::Add {
            title,
            thoughts,
            image,
        }) => {
            let db_path = resolve_db_path(cli.db_path)?;
            run_add(&title, &thoughts, image.as_deref(), profile, &db_path).await?;
        }
        Some(Commands::List { json }) => {
            let db_path = resolve_db_path(cli.db_path)?;
            run_list(json, profile, &db_path).await?;
        }
        Some(Commands::Share { id }) => {
            let db_path = resolve_db_path(cli.db_path)?;
            run_share(&id, profile, &db_path).await?;
        }
        Some(Commands::Config { command }) => run_config(command, profile)?,
        None => {
            Cli::command().print_help().map_err(CliError::Io)?;
            println!();
        }
    }

    Ok(())
}
