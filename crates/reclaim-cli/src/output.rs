//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use humansize::{format_size, BINARY};
use reclaim_domain::{ClassificationVerdict, ProcessInfo, RunResult, RunStatus, TargetStatus};
use serde::Serialize;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Sweep errors listed in table output before the rest is summarized
const MAX_LISTED_ERRORS: usize = 10;

/// One row of `reclaim targets`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetListing {
    /// Category label
    pub category: String,
    /// Resolved root path or pattern
    pub path: String,
    /// Profile suffix, if profile-expanded
    pub profile_suffix: Option<String>,
    /// Whether the root currently exists (patterns: whether anything matches)
    pub exists: bool,
}

/// One row of `reclaim classify`.
#[derive(Debug, Clone, Serialize)]
pub struct VerdictRow {
    /// Snapshot row
    pub process: ProcessInfo,
    /// Classifier decision
    pub verdict: ClassificationVerdict,
}

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Selected output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format a run result.
    pub fn format_run(&self, result: &RunResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
            OutputFormat::Table => Ok(self.format_run_table(result)),
            OutputFormat::Quiet => Ok(format!(
                "{} {} {} {}",
                result.status.as_str(),
                result.sweep.files_removed,
                result.sweep.bytes_freed,
                result.terminated_count()
            )),
        }
    }

    fn format_run_table(&self, result: &RunResult) -> String {
        let mut sections = Vec::new();

        if !result.targets.is_empty() {
            let mut builder = Builder::default();
            builder.push_record(["Category", "Root", "Status", "Files", "Size"]);
            for report in &result.targets {
                builder.push_record([
                    report.category.clone(),
                    report.root_path.display().to_string(),
                    self.target_status(report.status),
                    report.files_removed.to_string(),
                    format_size(report.bytes_freed, BINARY),
                ]);
            }
            sections.push(render(builder));
        }

        let acted: Vec<_> = result
            .process_outcomes
            .iter()
            .filter(|outcome| outcome.termination.is_some())
            .collect();
        if !acted.is_empty() {
            let mut builder = Builder::default();
            builder.push_record(["PID", "Name", "Reason", "Outcome"]);
            for outcome in acted {
                let termination = outcome
                    .termination
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default();
                builder.push_record([
                    outcome.pid.to_string(),
                    outcome.name.clone(),
                    outcome.verdict.reason().to_string(),
                    termination,
                ]);
            }
            sections.push(render(builder));
        }

        if let Some(message) = &result.process_scan_error {
            sections.push(self.error(&format!("Process snapshot failed: {}", message)));
        }

        if !result.sweep.errors.is_empty() {
            let mut lines: Vec<String> = result
                .sweep
                .errors
                .iter()
                .take(MAX_LISTED_ERRORS)
                .map(|e| format!("  [{}] {}: {}", e.target_category, e.path.display(), e.message))
                .collect();
            let hidden = result.sweep.errors.len().saturating_sub(MAX_LISTED_ERRORS);
            if hidden > 0 {
                lines.push(format!("  ... and {} more", hidden));
            }
            sections.push(format!("{}\n{}", self.warning("Sweep errors:"), lines.join("\n")));
        }

        sections.push(self.run_summary(result));
        sections.join("\n\n")
    }

    /// One-paragraph run summary.
    pub fn run_summary(&self, result: &RunResult) -> String {
        let preserved = result.process_outcomes.len() - result.candidate_count();
        let verb = if result.dry_run { "would remove" } else { "removed" };
        format!(
            "{}  {} {} files, {} potential savings\n  {} of {} candidates terminated, {} preserved, {} errors, {} ms",
            self.status(result.status),
            verb,
            result.sweep.files_removed,
            format_size(result.sweep.bytes_freed, BINARY),
            result.terminated_count(),
            result.candidate_count(),
            preserved,
            result.error_count(),
            result.duration_ms()
        )
    }

    /// Format classifier verdicts.
    pub fn format_verdicts(&self, rows: &[VerdictRow]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(rows)?),
            OutputFormat::Quiet => Ok(rows
                .iter()
                .filter(|row| row.verdict.is_candidate())
                .map(|row| row.process.pid.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if rows.is_empty() {
                    return Ok(self.colorize("No processes found.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["PID", "Name", "Age", "CPU (s)", "Memory", "Window", "Verdict", "Reason"]);
                for row in rows {
                    let process = &row.process;
                    let verdict = if row.verdict.is_candidate() {
                        self.colorize("candidate", "red")
                    } else {
                        "preserve".to_string()
                    };
                    builder.push_record([
                        process.pid.to_string(),
                        process.name.clone(),
                        format_age(process.age_seconds()),
                        format!("{:.2}", process.cpu_seconds),
                        format_size(process.working_set_bytes, BINARY),
                        if process.has_window { "yes" } else { "no" }.to_string(),
                        verdict,
                        row.verdict.reason().to_string(),
                    ]);
                }

                let candidates = rows.iter().filter(|row| row.verdict.is_candidate()).count();
                Ok(format!(
                    "{}\n\n{}",
                    render(builder),
                    self.info(&format!("{} of {} processes are candidates", candidates, rows.len()))
                ))
            }
        }
    }

    /// Format the configured targets.
    pub fn format_targets(&self, targets: &[TargetListing]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(targets)?),
            OutputFormat::Quiet => Ok(targets
                .iter()
                .map(|t| t.path.clone())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if targets.is_empty() {
                    return Ok(self.colorize("No targets configured.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["Category", "Path", "Profile suffix", "Exists"]);
                for target in targets {
                    let exists = if target.exists {
                        self.colorize("yes", "green")
                    } else {
                        self.colorize("no", "yellow")
                    };
                    builder.push_record([
                        target.category.clone(),
                        target.path.clone(),
                        target.profile_suffix.clone().unwrap_or_else(|| "-".to_string()),
                        exists,
                    ]);
                }
                Ok(render(builder))
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn status(&self, status: RunStatus) -> String {
        match status {
            RunStatus::Completed => self.success(status.as_str()),
            RunStatus::CompletedWithErrors => self.warning(status.as_str()),
            RunStatus::Aborted => self.error(status.as_str()),
        }
    }

    fn target_status(&self, status: TargetStatus) -> String {
        let text = status.to_string();
        match status {
            TargetStatus::Success => self.colorize(&text, "green"),
            TargetStatus::PartialFailure(_) => self.colorize(&text, "yellow"),
            TargetStatus::Interrupted => self.colorize(&text, "red"),
            TargetStatus::Skipped => text,
        }
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn render(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

/// Compact age such as `45s`, `12m`, `3h`, `2d`.
pub fn format_age(seconds: u64) -> String {
    match seconds {
        s if s < 60 => format!("{}s", s),
        s if s < 3600 => format!("{}m", s / 60),
        s if s < 86_400 => format!("{}h", s / 3600),
        s => format!("{}d", s / 86_400),
    }
}
