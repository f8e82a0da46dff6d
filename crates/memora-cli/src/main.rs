use clap::Parser;
use memora_core::db;
use memora_core::error::CoreError;
use memora_core::store::SqliteStore;
use owo_colors::{OwoColorize, Style};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod util;
mod views;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = config::Config::load().unwrap_or_else(|e| {
        eprintln!("{} bad configuration ({e}), using defaults", "Warning:".yellow());
        config::Config::default()
    });

    if let Some(parent) = std::path::Path::new(&config.database_path).parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
    let pool = match db::establish_connection(&config.database_path).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };
    let store = Arc::new(SqliteStore::new(pool));

    let cli = cli::Cli::parse();

    let result = match cli.command {
        cli::Commands::Add(command) => commands::add::add_task(&store, command).await,
        cli::Commands::List(command) => commands::list::list_tasks(&store, command).await,
        cli::Commands::Search(command) => commands::list::search_tasks(&store, command).await,
        cli::Commands::Edit(command) => commands::edit::edit_task(&store, command).await,
        cli::Commands::Do(command) => commands::lifecycle::complete_task(&store, command).await,
        cli::Commands::Undo(command) => {
            commands::lifecycle::uncomplete_task(&store, command).await
        }
        cli::Commands::Start(command) => commands::lifecycle::start_task(&store, command).await,
        cli::Commands::Cancel(command) => {
            commands::lifecycle::cancel_task(&store, command).await
        }
        cli::Commands::Delete(command) => {
            commands::lifecycle::delete_task(&store, command).await
        }
        cli::Commands::Inbox(inbox) => match inbox.command {
            cli::InboxSubcommand::Add(command) => commands::inbox::capture(&store, command).await,
            cli::InboxSubcommand::List => commands::inbox::list(&store).await,
            cli::InboxSubcommand::Promote(command) => {
                commands::inbox::promote(&store, command).await
            }
            cli::InboxSubcommand::Delete(command) => {
                commands::inbox::delete(&store, command).await
            }
        },
        cli::Commands::Remind(remind) => match remind.command {
            cli::RemindSubcommand::Add(command) => commands::remind::add(&store, command).await,
            cli::RemindSubcommand::Custom(command) => {
                commands::remind::custom(&store, command).await
            }
            cli::RemindSubcommand::List => commands::remind::list(&store).await,
            cli::RemindSubcommand::Snooze(command) => {
                commands::remind::snooze(&store, command).await
            }
            cli::RemindSubcommand::Ack(command) => {
                commands::remind::acknowledge(&store, command).await
            }
            cli::RemindSubcommand::Cancel(command) => {
                commands::remind::cancel(&store, command).await
            }
        },
        cli::Commands::Daemon(daemon) => match daemon.command {
            cli::DaemonSubcommand::Run => {
                commands::daemon::run(Arc::clone(&store), &config).await
            }
            cli::DaemonSubcommand::Start => commands::daemon::start(),
            cli::DaemonSubcommand::Stop => commands::daemon::stop(),
            cli::DaemonSubcommand::Restart => commands::daemon::restart(),
            cli::DaemonSubcommand::Status => commands::daemon::status(),
            cli::DaemonSubcommand::Install => commands::daemon::install(),
            cli::DaemonSubcommand::Uninstall => commands::daemon::uninstall(),
        },
        cli::Commands::Health(command) => {
            commands::health::show(Arc::clone(&store), command).await
        }
    };

    if let Err(e) = result {
        handle_error(e);
        std::process::exit(1);
    }
}

fn handle_error(error: anyhow::Error) {
    let error_style = Style::new().red().bold();

    if let Some(CoreError::AmbiguousId(candidates)) = error.downcast_ref::<CoreError>() {
        eprintln!(
            "{} Ambiguous short ID. Did you mean one of these?",
            "Error:".style(error_style)
        );
        for (id, title) in candidates {
            eprintln!("  {} {}", (&id[..8]).yellow(), title);
        }
        return;
    }

    eprintln!("{} {error:#}", "Error:".style(error_style));
}
