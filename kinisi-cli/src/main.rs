use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use kinisi_core::{LABEL_PRIMARY, LABEL_PROCESSED};

mod auth;
mod config;
mod mail;
mod sheets;
mod state;
mod workflow;

use mail::GmailMail;
use sheets::SheetsWriter;
use workflow::Workflow;

#[derive(Parser, Debug)]
#[command(
    name = "kinisi",
    version,
    about = "Book card-transaction report emails into a spreadsheet"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan the inbox once and book any new report emails
    Run {
        /// Path to the config file (default: ~/.kinisi/config.json)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Write a skeleton config to ~/.kinisi/config.json
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run { config } => {
            let user_config = config::load_user_config(config.as_deref())?;
            let token = auth::access_token()?;

            let mail = GmailMail::new(token.clone(), LABEL_PRIMARY, LABEL_PROCESSED);
            let sheets = SheetsWriter::new(token, &user_config.spreadsheet_id);
            let workflow = Workflow::new(&user_config, mail, sheets)?;

            let summary = workflow.execute().await?;
            println!(
                "Scan done: {} threads seen, {} booked, {} left for the next run",
                summary.threads_seen, summary.threads_processed, summary.threads_failed
            );
        }

        Command::Init => {
            config::init_config()?;
        }
    }

    Ok(())
}
