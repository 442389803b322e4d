//! Terminal renderer: styled flowing text grouped by file.

use colored::Colorize;

use crate::models::Severity;
use crate::orchestrator::ReviewReport;
use crate::output::OutputRenderer;
use crate::output::json::Summary;

/// Terminal output renderer with colored, flowing text.
pub struct TerminalRenderer;

impl OutputRenderer for TerminalRenderer {
    fn render(&self, report: &ReviewReport) -> String {
        let mut output = String::new();

        for file in report.files.iter().filter(|f| !f.annotations.is_empty()) {
            for annotation in &file.annotations {
                let label = annotation.severity.to_lowercase();
                let (icon, severity_str) = match Severity::classify(&annotation.severity) {
                    Severity::High => ("✖".red().bold(), label.red().bold()),
                    Severity::Medium => ("⚠".yellow().bold(), label.yellow().bold()),
                    Severity::Low => ("ℹ".blue().bold(), label.blue().bold()),
                };

                let location = if annotation.is_single_line() {
                    format!("{}:{}", file.path, annotation.start_line)
                } else {
                    format!("{}:{}-{}", file.path, annotation.start_line, annotation.end_line)
                };

                output.push_str(&format!(" {icon} {severity_str} in {}\n", location.bold()));
                output.push_str(&format!("   {}\n", annotation.message));
                for line in annotation.suggestion.lines() {
                    output.push_str(&format!("   {} {}\n", "│".cyan(), line));
                }
                output.push('\n');
            }
        }

        for file in report.files.iter().filter(|f| f.error.is_some()) {
            output.push_str(&format!(
                " {} {} {}\n",
                "!".red().bold(),
                file.path.bold(),
                file.error.as_deref().unwrap_or_default().dimmed()
            ));
        }

        let summary = Summary::from_report(report);
        if summary.comments == 0 {
            output.push_str(&format!("{}", "  ✔ No issues found.\n".green()));
        } else {
            output.push_str(&format!("{}\n", "───────────────────────────────────".dimmed()));
            output.push_str(&format!(
                " {} {} in {} {}\n",
                summary.comments.to_string().bold(),
                if summary.comments == 1 { "suggestion" } else { "suggestions" },
                summary.batches.to_string().bold(),
                if summary.batches == 1 { "review" } else { "reviews" },
            ));
        }
        if summary.dropped > 0 || summary.unavailable > 0 {
            output.push_str(&format!(
                " {}\n",
                format!(
                    "{} malformed suggestions dropped, {} files without a model response",
                    summary.dropped, summary.unavailable
                )
                .dimmed()
            ));
        }

        output
    }
}
