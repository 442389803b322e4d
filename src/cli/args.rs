//! Clap argument types and input validation.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use suggestbot::orchestrator::ReviewReport;

/// Turns model suggestions into inline GitHub review comments.
#[derive(Parser, Debug)]
#[command(name = "suggestbot", version = suggestbot::constants::VERSION)]
pub struct Cli {
    /// Log filter, e.g. `debug` or `suggestbot=trace` (overrides RUST_LOG).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Review a diff or pull request and optionally post the suggestions.
    Review(Box<ReviewArgs>),

    /// Print the added-line map of a single-file patch as JSON.
    Map(MapArgs),

    /// Normalize a saved model response against a patch, offline.
    Normalize(NormalizeArgs),

    /// Print version information.
    Version,
}

/// Arguments for the `map` subcommand.
#[derive(Parser, Debug)]
pub struct MapArgs {
    /// Patch file (hunk text of one file).
    pub patch: PathBuf,
}

/// Arguments for the `normalize` subcommand.
#[derive(Parser, Debug)]
pub struct NormalizeArgs {
    /// Patch file (hunk text of one file).
    #[arg(long)]
    pub patch: PathBuf,

    /// File holding the raw model response.
    #[arg(long)]
    pub response: PathBuf,

    /// File path used for anchoring comments.
    #[arg(long, default_value = "file")]
    pub path: String,
}

/// Arguments for the `review` subcommand.
#[derive(Parser, Debug)]
pub struct ReviewArgs {
    // --- Repo location ---
    /// Path to the repository or working directory (default: current directory).
    #[arg(long, default_value = ".")]
    pub path: PathBuf,

    // --- Input (one required) ---
    /// Pre-computed unified diff file.
    #[arg(long)]
    pub diff_file: Option<PathBuf>,

    /// Read unified diff from stdin.
    #[arg(long, default_value_t = false)]
    pub diff_stdin: bool,

    /// Branch or commit to diff against (uses git diff).
    #[arg(long)]
    pub diff_base: Option<String>,

    /// Pull request number; changed files are fetched from GitHub.
    #[arg(long)]
    pub pr: Option<u64>,

    // --- Output ---
    /// Output format.
    #[arg(long, default_value = "terminal")]
    pub format: OutputFormat,

    // --- Submission ---
    /// Submit the review to GitHub. Requires a pull request number.
    #[arg(long, default_value_t = false)]
    pub post: bool,

    /// Pull request to post to when the diff comes from a local source.
    #[arg(long)]
    pub pull_number: Option<u64>,

    /// Repository as owner/repo (default: GITHUB_REPOSITORY or config).
    #[arg(long)]
    pub repo: Option<String>,

    /// Commit to attach the review to (default: the pull request head).
    #[arg(long)]
    pub commit: Option<String>,

    /// First review part to submit, for resuming a failed submission.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub from_part: u64,

    /// Do not post started / no-issues / failed notes.
    #[arg(long, default_value_t = false)]
    pub no_status_notes: bool,

    // --- Performance ---
    /// Max concurrent LLM calls (default: config, 5).
    #[arg(long)]
    pub max_concurrent: Option<usize>,

    /// Per-request model timeout in seconds (default: config, 120).
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Output format options.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Terminal,
    Json,
    Github,
}

impl OutputFormat {
    /// Render a report using the renderer for this format.
    pub fn render(&self, report: &ReviewReport) -> String {
        use suggestbot::output::OutputRenderer;
        match self {
            OutputFormat::Terminal => suggestbot::output::terminal::TerminalRenderer.render(report),
            OutputFormat::Json => suggestbot::output::json::JsonRenderer.render(report),
            OutputFormat::Github => suggestbot::output::github::GithubRenderer.render(report),
        }
    }
}

impl ReviewArgs {
    /// Validate that exactly one input source is provided.
    pub fn validate_input(&self) -> Result<InputMode, String> {
        let sources = [
            self.diff_file.is_some(),
            self.diff_stdin,
            self.diff_base.is_some(),
            self.pr.is_some(),
        ];
        let count = sources.iter().filter(|&&x| x).count();

        if count == 0 {
            return Err(
                "one input source is required: --diff-file, --diff-stdin, --diff-base, or --pr"
                    .to_string(),
            );
        }
        if count > 1 {
            return Err(
                "only one input source allowed: --diff-file, --diff-stdin, --diff-base, or --pr"
                    .to_string(),
            );
        }

        if let Some(ref path) = self.diff_file {
            Ok(InputMode::DiffFile(path.clone()))
        } else if self.diff_stdin {
            Ok(InputMode::Stdin)
        } else if let Some(ref base) = self.diff_base {
            Ok(InputMode::GitBase(base.clone()))
        } else if let Some(number) = self.pr {
            Ok(InputMode::PullRequest(number))
        } else {
            unreachable!()
        }
    }

    /// Pull request to post to, if any.
    pub fn target_pull(&self) -> Option<u64> {
        self.pr.or(self.pull_number)
    }

    /// Validate submission flags.
    pub fn validate_post(&self) -> Result<(), String> {
        if self.post && self.target_pull().is_none() {
            return Err("--post requires a pull request: use --pr or --pull-number".to_string());
        }
        if !self.post && self.from_part > 1 {
            return Err("--from-part only applies together with --post".to_string());
        }
        Ok(())
    }
}

// InputMode is defined in models/ and re-exported here for convenience.
pub use suggestbot::models::InputMode;
