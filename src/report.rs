// 📊 Reports - named rows of attributed bytes, plus writers
//
// A report is what one analyzer hands to the outside world: an id, the run it
// came from, and rows of (name, size, owner?, tag?). Writers turn it into
// JSON, CSV or plain text; the SQLite history lives in `db`.

use crate::config::ProjectInfo;
use crate::size::{CategorySizes, SizeMode};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

// ============================================================================
// ROW
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub name: String,
    pub size: u64,

    /// Owning team, when the report knows one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    /// Extra grouping: module tag, entry category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// Per-category split behind `size`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<CategorySizes>,
}

impl Row {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Row {
            name: name.into(),
            size,
            owner: None,
            tag: None,
            breakdown: None,
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_breakdown(mut self, sizes: CategorySizes) -> Self {
        self.breakdown = Some(sizes);
        self
    }
}

/// Flat CSV record; breakdown columns stay empty when a row has none
#[derive(Debug, Serialize)]
struct CsvRecord<'a> {
    report: &'a str,
    name: &'a str,
    size: u64,
    owner: &'a str,
    tag: &'a str,
    resources: Option<u64>,
    assets: Option<u64>,
    native_libs: Option<u64>,
    classes: Option<u64>,
    others: Option<u64>,
}

// ============================================================================
// REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Which analysis produced it, e.g. `modules`
    pub id: String,

    /// Unique per generation; the history store keys on it
    pub run_id: Uuid,

    pub generated_at: DateTime<Utc>,
    pub mode: SizeMode,

    #[serde(default)]
    pub project: ProjectInfo,

    #[serde(default)]
    pub custom_properties: BTreeMap<String, String>,

    pub rows: Vec<Row>,
}

impl Report {
    pub fn new(id: impl Into<String>, mode: SizeMode, rows: Vec<Row>) -> Self {
        Report {
            id: id.into(),
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            mode,
            project: ProjectInfo::default(),
            custom_properties: BTreeMap::new(),
            rows,
        }
    }

    pub fn with_project(mut self, project: ProjectInfo, custom_properties: BTreeMap<String, String>) -> Self {
        self.project = project;
        self.custom_properties = custom_properties;
        self
    }

    pub fn row(&self, name: &str) -> Option<&Row> {
        self.rows.iter().find(|r| r.name == name)
    }

    pub fn total(&self) -> u64 {
        self.rows.iter().map(|r| r.size).sum()
    }

    pub fn summary(&self) -> String {
        format!(
            "Report {} ({}): {} rows, {} bytes ({})",
            self.id,
            self.run_id,
            self.rows.len(),
            self.total(),
            self.mode.as_str()
        )
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize report")
    }

    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        for row in &self.rows {
            let breakdown = row.breakdown.as_ref();
            writer
                .serialize(CsvRecord {
                    report: &self.id,
                    name: &row.name,
                    size: row.size,
                    owner: row.owner.as_deref().unwrap_or(""),
                    tag: row.tag.as_deref().unwrap_or(""),
                    resources: breakdown.map(|b| b.resources),
                    assets: breakdown.map(|b| b.assets),
                    native_libs: breakdown.map(|b| b.native_libs),
                    classes: breakdown.map(|b| b.classes),
                    others: breakdown.map(|b| b.others),
                })
                .context("Failed to write CSV row")?;
        }

        let bytes = writer.into_inner().context("Failed to flush CSV output")?;
        String::from_utf8(bytes).context("CSV output is not UTF-8")
    }

    /// Aligned table for terminals
    pub fn to_text(&self) -> String {
        let name_width = self
            .rows
            .iter()
            .map(|r| r.name.len())
            .max()
            .unwrap_or(0)
            .max("NAME".len());

        let mut out = String::new();
        let _ = writeln!(out, "{}", self.summary());
        let _ = writeln!(out, "{:<width$}  {:>12}  {:<16}  TAG", "NAME", "SIZE", "OWNER", width = name_width);
        for row in &self.rows {
            let _ = writeln!(
                out,
                "{:<width$}  {:>12}  {:<16}  {}",
                row.name,
                row.size,
                row.owner.as_deref().unwrap_or("-"),
                row.tag.as_deref().unwrap_or("-"),
                width = name_width
            );
        }
        out
    }
}

// ============================================================================
// REPORT WRITERS
// ============================================================================

pub trait ReportWriter {
    /// Persist one report
    fn write(&self, report: &Report) -> Result<()>;
}

/// `<output_dir>/<device>/<report id>-metrics.json`
pub struct JsonReportWriter {
    output_dir: PathBuf,
}

impl JsonReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        JsonReportWriter {
            output_dir: output_dir.into(),
        }
    }

    pub fn path_for(&self, report: &Report) -> PathBuf {
        self.output_dir
            .join(&report.project.device_name)
            .join(format!("{}-metrics.json", report.id))
    }
}

impl ReportWriter for JsonReportWriter {
    fn write(&self, report: &Report) -> Result<()> {
        let path = self.path_for(report);
        write_file(&path, &report.to_json()?)?;
        tracing::info!(path = %path.display(), "Wrote JSON report");
        Ok(())
    }
}

/// `<output_dir>/<device>/<report id>.csv`
pub struct CsvReportWriter {
    output_dir: PathBuf,
}

impl CsvReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        CsvReportWriter {
            output_dir: output_dir.into(),
        }
    }

    pub fn path_for(&self, report: &Report) -> PathBuf {
        self.output_dir
            .join(&report.project.device_name)
            .join(format!("{}.csv", report.id))
    }
}

impl ReportWriter for CsvReportWriter {
    fn write(&self, report: &Report) -> Result<()> {
        let path = self.path_for(report);
        write_file(&path, &report.to_csv()?)?;
        tracing::info!(path = %path.display(), "Wrote CSV report");
        Ok(())
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create report directory: {:?}", parent))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write report: {:?}", path))
}

// ============================================================================
// TESTS
// ============================================================================
