// 📦 Archive Identity - who can own a byte in the final package
//
// "The path is IDENTITY, the tag and name are VALUES"
//
// An archive is a library or a module artifact (aar/jar) that may have
// contributed files or classes to the final package. Two archives are the same
// owner if and only if they share a path, so everything that needs identity
// keys on `ArchiveId` instead of comparing whole `Archive` values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Path and tag of the synthetic owner that absorbs unowned bytes
pub const APP_ARCHIVE_PATH: &str = "root/app/build/";
pub const APP_ARCHIVE_TAG: &str = "app";

// ============================================================================
// ARCHIVE ID
// ============================================================================

/// Stable identity of an owning archive: its path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArchiveId(String);

impl ArchiveId {
    pub fn new(path: impl Into<String>) -> Self {
        ArchiveId(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArchiveId {
    fn from(path: &str) -> Self {
        ArchiveId::new(path)
    }
}

// ============================================================================
// ARCHIVE KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveKind {
    /// Third-party dependency (resolved from a remote repository)
    #[default]
    Library,

    /// In-house module built from the project's own sources
    Module,
}

impl ArchiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveKind::Library => "library",
            ArchiveKind::Module => "module",
        }
    }
}

// ============================================================================
// ARCHIVE
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Archive {
    /// Unique path of the archive, the only identity field
    pub id: ArchiveId,

    /// Display tag, used as the module key in team mappings
    pub tag: String,

    /// File name of the archive
    pub name: String,

    /// Catalog bundles set this from the section the archive is listed in
    #[serde(default)]
    pub kind: ArchiveKind,
}

impl Archive {
    pub fn new(
        path: impl Into<String>,
        tag: impl Into<String>,
        name: impl Into<String>,
        kind: ArchiveKind,
    ) -> Self {
        Archive {
            id: ArchiveId::new(path),
            tag: tag.into(),
            name: name.into(),
            kind,
        }
    }

    pub fn library(path: impl Into<String>, tag: impl Into<String>) -> Self {
        let path = path.into();
        let name = file_name(&path);
        Archive::new(path, tag, name, ArchiveKind::Library)
    }

    pub fn module(path: impl Into<String>, tag: impl Into<String>) -> Self {
        let path = path.into();
        let name = file_name(&path);
        Archive::new(path, tag, name, ArchiveKind::Module)
    }

    /// The "app" pseudo-artifact that owns everything no archive claims
    pub fn app() -> Self {
        Archive::new(
            APP_ARCHIVE_PATH,
            APP_ARCHIVE_TAG,
            APP_ARCHIVE_TAG,
            ArchiveKind::Module,
        )
    }

    pub fn path(&self) -> &str {
        self.id.as_str()
    }

    pub fn is_app(&self) -> bool {
        self.id.as_str() == APP_ARCHIVE_PATH
    }

    /// File name without extension, e.g. `okhttp-4.12.0` for
    /// `.../okhttp-4.12.0.jar`. Reports use this as the library id.
    pub fn file_stem(&self) -> String {
        Path::new(self.path())
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone())
    }

    /// Path below the gradle cache root when the archive lives there
    pub fn display_path(&self) -> &str {
        const CACHE_ROOT: &str = "files-2.1/";
        match self.path().find(CACHE_ROOT) {
            Some(idx) => &self.path()[idx + CACHE_ROOT.len()..],
            None => self.path(),
        }
    }
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_path_only() {
        let a = Archive::library("libs/okhttp.jar", "okhttp");
        let b = Archive::module("libs/okhttp.jar", "renamed");

        assert_eq!(a.id, b.id);
        assert_ne!(a.tag, b.tag);
    }

    #[test]
    fn test_file_stem_and_display_path() {
        let lib = Archive::library(
            "/home/ci/.gradle/caches/modules-2/files-2.1/com.squareup/okhttp-4.12.0.jar",
            "okhttp",
        );

        assert_eq!(lib.file_stem(), "okhttp-4.12.0");
        assert_eq!(lib.display_path(), "com.squareup/okhttp-4.12.0.jar");
        assert_eq!(lib.name, "okhttp-4.12.0.jar");
    }

    #[test]
    fn test_app_pseudo_artifact() {
        let app = Archive::app();

        assert!(app.is_app());
        assert_eq!(app.tag, "app");
        assert_eq!(app.kind, ArchiveKind::Module);
        assert!(!Archive::module("feature/build/outputs/aar/feature.aar", "feature").is_app());
    }
}
