//! daily-write: a daily writing tracker over Google Docs.
//!
//! Documents are read and written as Markdown. Words added each day are
//! counted, autosaved to a local ledger and compared against goals.

mod commands;
mod config;
mod context;
mod server;
mod write;

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::config::{Settings, resolve_data_dir};
use crate::context::Context;

#[derive(Parser, Debug)]
#[command(name = "daily-write")]
#[command(about = "Write in Google Docs as Markdown and track daily word counts")]
struct Cli {
    /// OAuth access token for Google Docs and Drive
    #[arg(long, global = true, env = "DAILY_WRITE_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Identity that word counts are saved under
    #[arg(long, global = true, env = "DAILY_WRITE_USER")]
    user: Option<String>,

    /// Directory for settings and the ledger (supports ~)
    #[arg(long, global = true, env = "DAILY_WRITE_DATA_DIR")]
    data_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List recently modified documents
    Docs,

    /// Create an empty document
    Create { title: String },

    /// List a document's tabs
    Tabs { document_id: String },

    /// Print a document (or one tab) as Markdown
    Pull {
        document_id: String,
        #[arg(long)]
        tab: Option<String>,
        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Replace a document's content with a Markdown file
    Push {
        document_id: String,
        file: PathBuf,
        #[arg(long)]
        tab: Option<String>,
    },

    /// Write in a local Markdown file, counting today's words
    Write {
        file: PathBuf,
        /// Pull this document into the file first and push it back on exit
        #[arg(long)]
        document: Option<String>,
        #[arg(long)]
        tab: Option<String>,
    },

    /// Show writing statistics and today's progress
    Stats,

    /// Show daily totals between two dates (inclusive)
    History {
        #[arg(long)]
        from: NaiveDate,
        #[arg(long)]
        to: NaiveDate,
    },

    /// Manage writing goals
    Goals {
        #[command(subcommand)]
        command: GoalsCommand,
    },

    /// Serve the HTTP API
    Serve {
        /// Address to bind to (default from config.json)
        #[arg(long)]
        bind: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum GoalsCommand {
    List,
    Add {
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        /// Daily word target
        #[arg(long)]
        target: u64,
    },
    Delete { id: Uuid },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so command output stays clean
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "daily_write=info,docs_gateway=info,word_ledger=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let data_dir = resolve_data_dir(cli.data_dir.as_deref());
    let settings = Settings::load(&data_dir)?;
    let ctx = Context::new(settings, data_dir, cli.token, cli.user);

    match cli.command {
        Command::Docs => commands::list_documents(&ctx).await,
        Command::Create { title } => commands::create_document(&ctx, &title).await,
        Command::Tabs { document_id } => commands::list_tabs(&ctx, &document_id).await,
        Command::Pull {
            document_id,
            tab,
            output,
        } => commands::pull(&ctx, &document_id, tab.as_deref(), output.as_deref()).await,
        Command::Push {
            document_id,
            file,
            tab,
        } => commands::push(&ctx, &document_id, &file, tab.as_deref()).await,
        Command::Write {
            file,
            document,
            tab,
        } => write::run(&ctx, &file, document.as_deref(), tab.as_deref()).await,
        Command::Stats => commands::stats(&ctx).await,
        Command::History { from, to } => commands::history(&ctx, from, to).await,
        Command::Goals { command } => match command {
            GoalsCommand::List => commands::list_goals(&ctx).await,
            GoalsCommand::Add { start, end, target } => {
                commands::add_goal(&ctx, start, end, target).await
            }
            GoalsCommand::Delete { id } => commands::delete_goal(&ctx, id).await,
        },
        Command::Serve { bind } => commands::serve(&ctx, bind.as_deref()).await,
    }
}
