//! SmartSpend CLI - Financial intelligence for personal expenses
//!
//! Usage:
//!   smartspend init                   Initialize database
//!   smartspend import --file CSV      Import expense history
//!   smartspend report                 Forecast, risk, anomalies and advice
//!   smartspend learn && smartspend suggest
//!                                     Learn habits and propose expenses

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let user = cli.user;
    let json = cli.json;

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Status => commands::cmd_status(&cli.db, user, cli.no_encrypt),
        Commands::Import { file } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_import(&db, user, &file, json)
        }
        Commands::Add {
            amount,
            category,
            date,
            merchant,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_add(
                &db,
                user,
                amount,
                &category,
                date.as_deref(),
                merchant.as_deref(),
                json,
            )
        }
        Commands::Expenses { limit } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_expenses_list(&db, user, limit, json)
        }
        Commands::Forecast => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let engine = commands::load_engine(cli.config.as_deref())?;
            commands::cmd_forecast(&db, &engine, user, json)
        }
        Commands::Risk => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let engine = commands::load_engine(cli.config.as_deref())?;
            commands::cmd_risk(&db, &engine, user, json)
        }
        Commands::Anomalies => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let engine = commands::load_engine(cli.config.as_deref())?;
            commands::cmd_anomalies(&db, &engine, user, json)
        }
        Commands::Recommend => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let engine = commands::load_engine(cli.config.as_deref())?;
            commands::cmd_recommend(&db, &engine, user, json)
        }
        Commands::Alerts => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let engine = commands::load_engine(cli.config.as_deref())?;
            commands::cmd_alerts(&db, &engine, user, json)
        }
        Commands::Explain => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let engine = commands::load_engine(cli.config.as_deref())?;
            commands::cmd_explain(&db, &engine, user, json)
        }
        Commands::Report => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let engine = commands::load_engine(cli.config.as_deref())?;
            commands::cmd_report(&db, &engine, user, json)
        }
        Commands::Learn => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let engine = commands::load_engine(cli.config.as_deref())?;
            commands::cmd_learn(&db, &engine, user, json)
        }
        Commands::Suggest => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let engine = commands::load_engine(cli.config.as_deref())?;
            commands::cmd_suggest(&db, &engine, user, json)
        }
        Commands::Suggestions { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None => commands::cmd_suggestions_list(&db, user, "pending", json),
                Some(SuggestionsAction::List { status }) => {
                    commands::cmd_suggestions_list(&db, user, &status, json)
                }
                Some(SuggestionsAction::Confirm { id }) => {
                    commands::cmd_suggestions_confirm(&db, user, id, json)
                }
                Some(SuggestionsAction::Reject { id }) => {
                    commands::cmd_suggestions_reject(&db, user, id)
                }
            }
        }
    }
}
