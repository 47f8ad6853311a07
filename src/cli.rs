//! CLI argument parsing for app-sizer

use crate::analyzers::ReportKind;
use crate::size::SizeMode;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for reports printed to stdout
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Aligned table (default)
    Text,
    /// JSON, one document per report
    Json,
    /// CSV with one header per report
    Csv,
}

/// Size mode override
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Raw,
    Downloadable,
}

impl From<ModeArg> for SizeMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Raw => SizeMode::Raw,
            ModeArg::Downloadable => SizeMode::Downloadable,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "app-sizer")]
#[command(version)]
#[command(about = "Attribute every byte of an app package to the library, module and team that shipped it", long_about = None)]
pub struct Cli {
    /// Pre-parsed catalog bundle (packages, libraries, modules) as JSON
    #[arg(long = "catalogs", value_name = "FILE")]
    pub catalogs: PathBuf,

    /// Sizer configuration JSON
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Team ownership file (overrides the config)
    #[arg(long = "team-mapping", value_name = "FILE")]
    pub team_mapping: Option<PathBuf>,

    /// Reports to generate; repeat for several. Defaults to every report
    /// the configuration allows.
    #[arg(long = "report", value_enum)]
    pub reports: Vec<ReportKind>,

    /// Size mode (overrides the config)
    #[arg(long = "mode", value_enum)]
    pub mode: Option<ModeArg>,

    /// Library file stem for the lib-content report (overrides the config)
    #[arg(long = "library", value_name = "NAME")]
    pub library: Option<String>,

    /// Output format on stdout
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Also write JSON and CSV files under this directory
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Append reports to a SQLite history database
    #[arg(long = "db", value_name = "FILE")]
    pub db: Option<PathBuf>,

    /// Check that attribution conserves every package byte
    #[arg(long = "audit")]
    pub audit: bool,

    /// Enable debug logging to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_minimal() {
        let cli = Cli::parse_from(["app-sizer", "--catalogs", "catalogs.json"]);

        assert_eq!(cli.catalogs, PathBuf::from("catalogs.json"));
        assert!(cli.reports.is_empty());
        assert!(matches!(cli.format, OutputFormat::Text));
        assert!(!cli.debug);
    }

    #[test]
    fn test_cli_repeated_reports() {
        let cli = Cli::parse_from([
            "app-sizer",
            "--catalogs",
            "c.json",
            "--report",
            "modules",
            "--report",
            "large-files",
            "--mode",
            "raw",
            "--format",
            "csv",
        ]);

        assert_eq!(cli.reports, vec![ReportKind::Modules, ReportKind::LargeFiles]);
        assert_eq!(cli.mode.map(SizeMode::from), Some(SizeMode::Raw));
        assert!(matches!(cli.format, OutputFormat::Csv));
    }

    #[test]
    fn test_cli_requires_catalogs() {
        assert!(Cli::try_parse_from(["app-sizer"]).is_err());
    }
}
