//! restbench - send templated requests from a workspace and record history
//!
//! Headless front end over the library:
//! - `send` renders a stored request with its scoped variables and sends it
//! - `history` prints the tail of the history log
//! - `validate` checks a workspace document

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use tracing::Level;

use restbench::constants::LOG_FILE;
use restbench::settings::{AppPaths, Settings};
use restbench::storage::{HistoryLog, JsonWorkspaceStorage, WorkspaceStorage};
use restbench::{render_request, HistoryEntry, RequestExecutor, RequestOutcome};

#[derive(Parser, Debug)]
#[command(name = "restbench", version, about = "Send templated HTTP requests from a workspace")]
struct Cli {
    /// Directory holding settings, workspace and history (default: ~/.restbench)
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send a stored request and append the outcome to history
    Send {
        /// Id of the stored request
        request_id: String,

        /// Workspace file (default: <home>/workspace.json)
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        /// Extra variable, overrides workspace environments
        #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
        vars: Vec<(String, String)>,
    },
    /// Print the most recent history entries
    History {
        /// Number of entries (default: settings history_retention)
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Load and validate a workspace
    Validate {
        /// Workspace file (default: <home>/workspace.json)
        workspace: Option<PathBuf>,
    },
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got `{}`", raw)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let paths = cli
        .home
        .clone()
        .map(AppPaths::new)
        .unwrap_or_else(AppPaths::default_dir);

    // Initialize logging to file
    std::fs::create_dir_all(&paths.dir)
        .with_context(|| format!("creating {}", paths.dir.display()))?;
    let file_appender = tracing_appender::rolling::never(&paths.dir, LOG_FILE);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let settings = Settings::load(&paths.settings());

    match cli.command {
        Command::Send {
            request_id,
            workspace,
            vars,
        } => {
            let workspace = workspace.unwrap_or_else(|| paths.workspace());
            send(&paths, &settings, workspace, &request_id, vars).await
        }
        Command::History { limit } => {
            let limit = limit.unwrap_or(settings.history_retention);
            print_history(&HistoryLog::new(paths.history()), limit)
        }
        Command::Validate { workspace } => {
            let workspace = workspace.unwrap_or_else(|| paths.workspace());
            let doc = JsonWorkspaceStorage::default()
                .load(&workspace)
                .with_context(|| format!("loading {}", workspace.display()))?;
            println!(
                "{}: schema {}, {} collections, {} folders, {} requests, {} environments",
                workspace.display(),
                doc.schema_version,
                doc.collections.len(),
                doc.folders.len(),
                doc.requests.len(),
                doc.environments.len()
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn send(
    paths: &AppPaths,
    settings: &Settings,
    workspace: PathBuf,
    request_id: &str,
    vars: Vec<(String, String)>,
) -> anyhow::Result<ExitCode> {
    let doc = JsonWorkspaceStorage::default()
        .load(&workspace)
        .with_context(|| format!("loading {}", workspace.display()))?;
    let stored = doc
        .find_request(request_id)
        .ok_or_else(|| anyhow!("request `{}` not found in {}", request_id, workspace.display()))?;

    let mut variables: HashMap<String, String> = doc.variables_for(request_id);
    variables.extend(vars);

    let executor = RequestExecutor::from_settings(settings);
    let handle = executor.spawn(stored.request.clone(), variables.clone());

    // Ctrl-C cancels the in-flight request
    let token = handle.token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    let outcome = handle.outcome().await;
    interrupt.abort();

    let rendered = render_request(&stored.request, &variables);
    let entry = HistoryEntry::from_outcome(&rendered, &outcome);
    if let Err(e) = HistoryLog::new(paths.history()).append(&entry) {
        tracing::error!(error = %e, "Failed to record history");
        eprintln!("warning: failed to record history: {}", e);
    }

    match outcome {
        RequestOutcome::Completed(response) => {
            println!("{} ({} ms)", response.status_code, response.elapsed_ms);
            for header in &response.headers {
                println!("{}: {}", header.key, header.value);
            }
            println!();
            println!("{}", response.body);
            Ok(ExitCode::SUCCESS)
        }
        RequestOutcome::Failed(message) => {
            eprintln!("error: {}", message);
            Ok(ExitCode::FAILURE)
        }
        RequestOutcome::Canceled => {
            println!("{}", RequestOutcome::CANCELED_MESSAGE);
            Ok(ExitCode::from(130))
        }
    }
}

fn print_history(log: &HistoryLog, limit: usize) -> anyhow::Result<ExitCode> {
    let entries = log
        .load(Some(limit))
        .with_context(|| format!("reading {}", log.path().display()))?;

    for entry in entries {
        let result = match (&entry.error, entry.status_code) {
            (Some(error), _) => format!("error: {}", error),
            (None, Some(status)) => format!("{} ({} ms)", status, entry.elapsed_ms.unwrap_or(0)),
            (None, None) => "-".to_string(),
        };
        println!(
            "{}  {:<7} {}  {}  {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.method,
            entry.name,
            entry.url,
            result
        );
    }

    Ok(ExitCode::SUCCESS)
}
