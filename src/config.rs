// ⚙️ Sizer Configuration - Options as Data
//
// Loaded from a JSON file; every field has a default so `{}` is a valid
// configuration.

use crate::hierarchy::{UnassignedPolicy, UNASSIGNED_TEAM};
use crate::size::SizeMode;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Files at or above this many bytes are reported as large by default
pub const DEFAULT_LARGE_FILE_THRESHOLD: u64 = 10 * 1024;

// ============================================================================
// PROJECT INFO
// ============================================================================

/// Describes the build being measured; copied onto every report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    #[serde(default = "default_project_name")]
    pub project_name: String,

    #[serde(default)]
    pub version_name: String,

    /// Device spec the split packages were generated for
    #[serde(default = "default_device_name")]
    pub device_name: String,

    #[serde(default = "default_build_type")]
    pub build_type: String,
}

fn default_project_name() -> String {
    "app".to_string()
}

fn default_device_name() -> String {
    "device".to_string()
}

fn default_build_type() -> String {
    "production".to_string()
}

impl Default for ProjectInfo {
    fn default() -> Self {
        ProjectInfo {
            project_name: default_project_name(),
            version_name: String::new(),
            device_name: default_device_name(),
            build_type: default_build_type(),
        }
    }
}

// ============================================================================
// SIZER CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizerConfig {
    /// "raw" or "downloadable"; anything else means downloadable
    #[serde(default = "default_size_mode")]
    pub size_mode: String,

    #[serde(default = "default_large_file_threshold")]
    pub large_file_threshold: u64,

    /// Library file stem inspected by the lib-content report
    #[serde(default)]
    pub library_name: Option<String>,

    /// Team ownership file
    #[serde(default)]
    pub team_mapping: Option<PathBuf>,

    /// Team receiving modules nobody owns; `null` leaves them out
    #[serde(default = "default_unassigned_team")]
    pub unassigned_team: Option<String>,

    /// Directory for JSON and CSV report files; none means no files
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    #[serde(default)]
    pub project: ProjectInfo,

    /// Extra key/values attached to every report
    #[serde(default)]
    pub custom_properties: BTreeMap<String, String>,
}

fn default_size_mode() -> String {
    SizeMode::Downloadable.as_str().to_string()
}

fn default_large_file_threshold() -> u64 {
    DEFAULT_LARGE_FILE_THRESHOLD
}

fn default_unassigned_team() -> Option<String> {
    Some(UNASSIGNED_TEAM.to_string())
}

impl Default for SizerConfig {
    fn default() -> Self {
        SizerConfig {
            size_mode: default_size_mode(),
            large_file_threshold: DEFAULT_LARGE_FILE_THRESHOLD,
            library_name: None,
            team_mapping: None,
            unassigned_team: default_unassigned_team(),
            output_dir: None,
            project: ProjectInfo::default(),
            custom_properties: BTreeMap::new(),
        }
    }
}

impl SizerConfig {
    /// Load configuration from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: SizerConfig =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.unassigned_team {
            if name.trim().is_empty() {
                bail!("unassigned_team must not be blank; use null to omit unassigned modules");
            }
        }
        if let Some(library) = &self.library_name {
            if library.trim().is_empty() {
                bail!("library_name must not be blank");
            }
        }
        Ok(())
    }

    pub fn mode(&self) -> SizeMode {
        SizeMode::from_name(&self.size_mode)
    }

    pub fn unassigned_policy(&self) -> UnassignedPolicy {
        UnassignedPolicy::from_bucket(self.unassigned_team.as_deref())
    }

    // Builder methods

    pub fn with_size_mode(mut self, mode: SizeMode) -> Self {
        self.size_mode = mode.as_str().to_string();
        self
    }

    pub fn with_library_name(mut self, name: impl Into<String>) -> Self {
        self.library_name = Some(name.into());
        self
    }

    pub fn with_large_file_threshold(mut self, threshold: u64) -> Self {
        self.large_file_threshold = threshold;
        self
    }

    pub fn with_unassigned_team(mut self, team: Option<&str>) -> Self {
        self.unassigned_team = team.map(str::to_string);
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }
}

// ============================================================================
// TESTS
// ============================================================================
