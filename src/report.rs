/*!
 * Run summary reporting
 *
 * Renders a finished analysis as a `tabled` summary for the terminal.
 */

use std::path::PathBuf;
use std::time::Duration;

use tabled::{
    settings::{object::Columns, Alignment, Modify, Padding, Style},
    Table, Tabled,
};

use crate::scanner::ScanStatistics;
use crate::types::AnalysisResult;
use crate::utils::format_number;

/// Statistics for one analysis run
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Output file path
    pub output_file: PathBuf,
    /// Session folder path
    pub session_folder: PathBuf,
    /// Wall time of the run
    pub duration: Duration,
    /// Directories visited
    pub directories: usize,
    /// Files shown in the folder structure
    pub files_listed: usize,
    /// Files whose content was concatenated
    pub file_count: usize,
    /// Characters in the final text
    pub char_count: usize,
    /// Tokens in the final text
    pub token_count: usize,
    /// Context window of the tokenizer's model, if one was loaded
    pub context_window: Option<usize>,
    /// Files left out as binary
    pub binary_skipped: usize,
    /// Files left out because reading failed
    pub read_errors: usize,
}

impl ScanReport {
    /// Assemble a report from the analyzer's outputs
    pub fn new(
        result: &AnalysisResult,
        stats: &ScanStatistics,
        context_window: Option<usize>,
        duration: Duration,
    ) -> Self {
        Self {
            output_file: result.output_file.clone(),
            session_folder: result.session_folder.clone(),
            duration,
            directories: stats.directories,
            files_listed: stats.files_listed,
            file_count: result.file_count,
            char_count: result.char_count,
            token_count: result.token_count,
            context_window,
            binary_skipped: stats.binary_skipped,
            read_errors: stats.read_errors,
        }
    }

    /// Share of the context window used, in percent
    pub fn context_share(&self) -> Option<f64> {
        match self.context_window {
            Some(window) if window > 0 && self.token_count > 0 => {
                Some(self.token_count as f64 / window as f64 * 100.0)
            }
            _ => None,
        }
    }
}

/// Renders [`ScanReport`]s
#[derive(Debug, Default)]
pub struct Reporter;

impl Reporter {
    /// Create a new reporter
    pub fn new() -> Self {
        Self
    }

    /// Render the summary table
    pub fn generate_report(&self, report: &ScanReport) -> String {
        #[derive(Tabled)]
        struct SummaryRow {
            #[tabled(rename = "Metric")]
            key: &'static str,

            #[tabled(rename = "Value")]
            value: String,
        }

        let tokens = match (report.token_count, report.context_share()) {
            (0, _) => "unavailable".to_string(),
            (count, Some(share)) => format!("{} ({:.1}% of context)", format_number(count), share),
            (count, None) => format_number(count),
        };

        let mut rows = vec![
            SummaryRow {
                key: "Output File",
                value: report.output_file.display().to_string(),
            },
            SummaryRow {
                key: "Session Folder",
                value: report.session_folder.display().to_string(),
            },
            SummaryRow {
                key: "Directories",
                value: format_number(report.directories),
            },
            SummaryRow {
                key: "Files",
                value: format!(
                    "{} concatenated, {} listed",
                    format_number(report.file_count),
                    format_number(report.files_listed)
                ),
            },
            SummaryRow {
                key: "Characters",
                value: format_number(report.char_count),
            },
            SummaryRow {
                key: "Tokens",
                value: tokens,
            },
        ];

        if report.binary_skipped + report.read_errors > 0 {
            rows.push(SummaryRow {
                key: "Skipped",
                value: format!(
                    "{} binary, {} unreadable",
                    report.binary_skipped, report.read_errors
                ),
            });
        }

        rows.push(SummaryRow {
            key: "Process Time",
            value: format!("{:.4?}", report.duration),
        });

        let mut table = Table::new(rows);
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));

        table.to_string()
    }

    /// Print the report to stderr
    pub fn print_report(&self, report: &ScanReport) {
        eprintln!("\n{}", self.generate_report(report));
    }
}
