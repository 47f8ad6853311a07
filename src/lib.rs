// App Sizer - Core Library
// Attribution engine behind the CLI: catalogs in, ownership and reports out

pub mod archive;
pub mod catalog;
pub mod size;
pub mod matchers;
pub mod ownership;
pub mod reconciliation;
pub mod hierarchy;
pub mod team_mapping;
pub mod analyzers;
pub mod report;
pub mod config;
pub mod db;
pub mod cli;

// Re-export commonly used types
pub use archive::{Archive, ArchiveId, ArchiveKind, APP_ARCHIVE_PATH, APP_ARCHIVE_TAG};
pub use catalog::{
    ArchiveCatalog, CatalogBundle, CatalogSource, CatalogStore, CategorizedEntries, Category,
    Entry, EntryKey, EntrySet, JsonCatalogSource, PackageCatalog, Scope,
};
pub use size::{CategorySizes, ClassContainer, ContainedClass, SizeMode};
pub use matchers::{
    all_matchers, AssetMatcher, CategoryMatcher, ClassMatcher, MatchResult, NativeLibMatcher,
    OtherMatcher, ResourceMatcher,
};
pub use ownership::{
    AttributionPipeline, Contributor, OwnershipAggregator, OwnershipResult, ScopedAttribution,
};
pub use reconciliation::{
    ConservationReport, ConservationResult, Placement, ReconciliationEngine,
};
pub use hierarchy::{
    sort_by_total_desc, to_modules, to_teams, Module, SizeTotal, Team, UnassignedPolicy,
    UNASSIGNED_TEAM,
};
pub use team_mapping::TeamMapping;
pub use analyzers::{ReportKind, SizeAnalyzer, NOT_AVAILABLE};
pub use report::{CsvReportWriter, JsonReportWriter, Report, ReportWriter, Row};
pub use config::{ProjectInfo, SizerConfig, DEFAULT_LARGE_FILE_THRESHOLD};
pub use db::{
    count_reports, get_report_rows, get_reports, get_row_history, insert_report, open_database,
    setup_database, DatabaseReportWriter, HistoryPoint, StoredReport,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
