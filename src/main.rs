//! suggestbot: inline code-review suggestions from a generative model.
//!
//! Entry point and error handling boundary. Uses `anyhow` for
//! ergonomic error propagation and user-facing messages.

mod cli;

use suggestbot::analytics;
use suggestbot::annotations;
use suggestbot::config;
use suggestbot::constants;
use suggestbot::diff;
use suggestbot::env;
use suggestbot::models;
use suggestbot::orchestrator;
use suggestbot::output;
use suggestbot::providers;
use suggestbot::publish;

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::args::{Cli, Command, MapArgs, NormalizeArgs, ReviewArgs};
use config::Config;
use diff::LineMap;
use env::Env;
use models::{FilePatch, InputMode};
use orchestrator::{ReviewOrchestrator, ReviewReport};
use output::github::GithubClient;
use providers::rig::RigProvider;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

/// Install the stderr log subscriber.
///
/// `--log-level` wins over `RUST_LOG`; the default shows this crate's
/// info events only.
fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("{}=info", constants::APP_NAME))),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Review(args) => run_review(*args).await,
        Command::Map(args) => run_map(args).await,
        Command::Normalize(args) => run_normalize(args).await,
        Command::Version => run_version(),
    }
}

/// Print version information.
fn run_version() -> Result<()> {
    use colored::Colorize;

    println!(
        "{} {}",
        constants::APP_NAME.bold(),
        constants::VERSION.green().bold()
    );
    Ok(())
}

/// Print the added-line map of a patch.
async fn run_map(args: MapArgs) -> Result<()> {
    let bytes = tokio::fs::read(&args.patch)
        .await
        .with_context(|| format!("failed to read {}", args.patch.display()))?;
    let map = LineMap::from_bytes(&bytes)?;
    println!("{}", serde_json::to_string_pretty(&map)?);
    Ok(())
}

/// Normalize a saved model response and print annotations, comments, and counters.
async fn run_normalize(args: NormalizeArgs) -> Result<()> {
    let patch = tokio::fs::read(&args.patch)
        .await
        .with_context(|| format!("failed to read {}", args.patch.display()))?;
    let map = LineMap::from_bytes(&patch)?;
    let response = tokio::fs::read_to_string(&args.response)
        .await
        .with_context(|| format!("failed to read {}", args.response.display()))?;

    let normalized = annotations::normalize_response(Some(&response), &map);
    let comments = suggestbot::anchor::resolve_all(&normalized.annotations, &args.path);
    let output = serde_json::json!({
        "annotations": normalized.annotations,
        "comments": comments,
        "stats": normalized.stats,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run_review(args: ReviewArgs) -> Result<()> {
    let input_mode = args.validate_input().map_err(|e| anyhow!("{e}"))?;
    args.validate_post().map_err(|e| anyhow!("{e}"))?;

    // Resolve repo / working directory from --path (default: cwd)
    let base_dir = std::fs::canonicalize(&args.path)
        .with_context(|| format!("--path directory not found: {}", args.path.display()))?;
    let repo_root = match diff::git::find_repo_root(&base_dir).await {
        Ok(root) => PathBuf::from(root),
        Err(_) => base_dir,
    };

    let config = load_config(&args, &repo_root)?;

    let github = match args.target_pull() {
        Some(number) if args.post || matches!(input_mode, InputMode::PullRequest(_)) => Some(
            GithubClient::new(&config.github, number).context("failed to set up GitHub client")?,
        ),
        _ => None,
    };
    let submitter = if args.post { github.as_ref() } else { None };
    let notes = config.review.status_notes;

    if let (Some(client), true) = (submitter, notes) {
        publish::announce_start(client)
            .await
            .context("failed to post started note")?;
    }

    let started = Instant::now();
    let report = match analyze(&input_mode, &repo_root, &config, github.as_ref()).await {
        Ok(report) => report,
        Err(err) => {
            if let (Some(client), true) = (submitter, notes) {
                let message = format!("{err:#}");
                if let Err(note_err) = publish::post_failure_note(client, &message).await {
                    tracing::warn!(error = %note_err, "could not post failure note");
                }
            }
            return Err(err);
        }
    };

    println!("{}", args.format.render(&report));

    if let Some(client) = submitter {
        submit(client, &args, &report, notes).await?;
    }

    let record = analytics::ReviewRecord::from_report(
        &report,
        config.github.repository.as_deref(),
        args.target_pull(),
        started.elapsed(),
    );
    analytics::record_review(&record);

    Ok(())
}

/// Load layered config and apply CLI overrides.
fn load_config(args: &ReviewArgs, repo_root: &Path) -> Result<Config> {
    let mut config =
        Config::load(Some(repo_root), &Env::real()).context("failed to load configuration")?;

    if let Some(ref repo) = args.repo {
        config.github.repository = Some(repo.clone());
    }
    if let Some(n) = args.max_concurrent {
        config.review.max_concurrent = n;
    }
    if let Some(secs) = args.timeout {
        config.review.request_timeout_secs = secs;
    }
    if args.no_status_notes {
        config.review.status_notes = false;
    }
    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}

/// Acquire patches and run the review pipeline.
async fn analyze(
    input_mode: &InputMode,
    repo_root: &Path,
    config: &Config,
    github: Option<&GithubClient>,
) -> Result<ReviewReport> {
    let patches: Vec<FilePatch> = match (input_mode, github) {
        (InputMode::PullRequest(_), Some(client)) => client
            .list_pull_files()
            .await
            .context("failed to fetch pull request files")?,
        (InputMode::PullRequest(number), None) => {
            return Err(anyhow!("pull request #{number} requires GitHub settings"));
        }
        _ => diff::get_patches(input_mode, repo_root)
            .await
            .context("failed to get diff")?,
    };

    if patches.is_empty() {
        tracing::info!("no changes to review");
    }

    let provider = RigProvider::new(config.provider.clone())?;
    tracing::info!(
        provider = %config.provider.name,
        model = provider.model(),
        files = patches.len(),
        "starting review"
    );
    let orchestrator = ReviewOrchestrator::new(Arc::new(provider), config);
    Ok(orchestrator.run(&patches).await)
}

/// Submit the outcome, posting a failure note and a resume hint on error.
async fn submit(
    client: &GithubClient,
    args: &ReviewArgs,
    report: &ReviewReport,
    notes: bool,
) -> Result<()> {
    let commit = match args.commit {
        Some(ref sha) => sha.clone(),
        None => client
            .pull_head_sha()
            .await
            .context("failed to resolve pull request head commit")?,
    };
    let from_part = usize::try_from(args.from_part).unwrap_or(usize::MAX);

    match publish::submit_outcome(client, &report.outcome, &commit, from_part, notes).await {
        Ok(submitted) => {
            tracing::info!(
                parts = submitted.submitted_parts.len(),
                no_issues_note = submitted.posted_no_issues_note,
                "submission complete"
            );
            Ok(())
        }
        Err(err) => {
            if notes {
                if let Err(note_err) = publish::post_failure_note(client, &err).await {
                    tracing::warn!(error = %note_err, "could not post failure note");
                }
            }
            match err.failed_part() {
                Some(part) => Err(anyhow!(err).context(format!(
                    "submission stopped; rerun with --post --from-part {part} --commit {commit} to resume"
                ))),
                None => Err(anyhow!(err)),
            }
        }
    }
}
