use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use orgrep::core::config::{RunConfig, SearchArgs};
use orgrep::core::telemetry::logging::init_logging;
use orgrep::services::checkout::GitCli;
use orgrep::services::mail::{run_notifier, MailArgs, MailConfig, SmtpRelay};
use orgrep::services::pipeline::Pipeline;
use orgrep::services::report::write_report;
use orgrep::services::search::backend_for;
use orgrep::services::source::GithubClient;

#[derive(Debug, Parser)]
#[command(name = "orgrep", version, about = "Search every branch of every repository in an organization")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Clone and search all branches, then write the workbook.
    Search(SearchArgs),
    /// Send a templated notification mail through an SMTP relay.
    Notify(MailArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Search(args) => run_search(args).await,
        Command::Notify(args) => run_notify(args).await,
    }
}

async fn run_search(args: SearchArgs) -> Result<()> {
    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    let config = Arc::new(RunConfig::from_args(args, &cwd)?);
    tracing::debug!("Running with {:?}", config);

    let source = GithubClient::new(&config.api_url, &config.token)?;
    let backend = backend_for(config.engine);
    let pipeline = Pipeline::new(config.clone(), source, GitCli::new(), backend).with_progress(true);

    let run = pipeline
        .search_organization()
        .await
        .context("search aborted")?;

    write_report(&run.rows, &run.metadata, &config.output_path)
        .context("results could not be saved")?;
    Ok(())
}

async fn run_notify(args: MailArgs) -> Result<()> {
    let config = MailConfig::from_args(args)?;
    let relay = SmtpRelay::new(&config)?;
    let sent = run_notifier(&config, &relay).await?;
    tracing::info!("Sent {} of {} messages", sent, config.repeat);
    Ok(())
}
