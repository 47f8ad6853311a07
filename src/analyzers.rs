// 🔬 Analyzers - one report per question asked of the attribution
//
// Report kinds and the candidate scope each one resolves against:
//   basic        → no matching, package totals per category
//   apk          → libraries; codebase vs library split of the package
//   libraries    → libraries; one row per library
//   modules      → two-step (all, then modules) + app; one row per module
//   codebase     → two-step; one row per team
//   large-files  → two-step; resources and assets above a threshold
//   lib-content  → libraries; every entry of one named library

use crate::catalog::{package_entries, CatalogSource, CatalogStore, CategorizedEntries, Category, Scope};
use crate::config::{ProjectInfo, SizerConfig, DEFAULT_LARGE_FILE_THRESHOLD};
use crate::hierarchy::{sort_by_total_desc, to_modules, to_teams, UnassignedPolicy};
use crate::ownership::{AttributionPipeline, Contributor};
use crate::reconciliation::{ConservationReport, ReconciliationEngine};
use crate::report::{Report, Row};
use crate::size::{CategorySizes, SizeMode};
use crate::team_mapping::TeamMapping;
use anyhow::{anyhow, bail, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Owner shown for modules no team lists
pub const NOT_AVAILABLE: &str = "NA";

// ============================================================================
// REPORT KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
    Basic,
    Apk,
    Libraries,
    Modules,
    Codebase,
    LargeFiles,
    LibContent,
}

impl ReportKind {
    pub const ALL: [ReportKind; 7] = [
        ReportKind::Basic,
        ReportKind::Apk,
        ReportKind::Libraries,
        ReportKind::Modules,
        ReportKind::Codebase,
        ReportKind::LargeFiles,
        ReportKind::LibContent,
    ];

    /// Report id, also the file name stem of written reports
    pub fn id(&self) -> &'static str {
        match self {
            ReportKind::Basic => "basic",
            ReportKind::Apk => "apk",
            ReportKind::Libraries => "libraries",
            ReportKind::Modules => "modules",
            ReportKind::Codebase => "codebase",
            ReportKind::LargeFiles => "large_files",
            ReportKind::LibContent => "lib_content",
        }
    }
}

// ============================================================================
// SIZE ANALYZER
// ============================================================================

pub struct SizeAnalyzer<S: CatalogSource> {
    store: CatalogStore<S>,
    pipeline: AttributionPipeline,
    mode: SizeMode,
    mapping: TeamMapping,
    policy: UnassignedPolicy,
    large_file_threshold: u64,
    library_name: Option<String>,
    project: ProjectInfo,
    custom_properties: BTreeMap<String, String>,
}

impl<S: CatalogSource> SizeAnalyzer<S> {
    pub fn new(source: S, mode: SizeMode) -> Self {
        SizeAnalyzer {
            store: CatalogStore::new(source),
            pipeline: AttributionPipeline::new(mode),
            mode,
            mapping: TeamMapping::new(),
            policy: UnassignedPolicy::default(),
            large_file_threshold: DEFAULT_LARGE_FILE_THRESHOLD,
            library_name: None,
            project: ProjectInfo::default(),
            custom_properties: BTreeMap::new(),
        }
    }

    pub fn from_config(source: S, config: &SizerConfig, mapping: TeamMapping) -> Self {
        let mut analyzer = Self::new(source, config.mode())
            .with_team_mapping(mapping)
            .with_unassigned_policy(config.unassigned_policy())
            .with_large_file_threshold(config.large_file_threshold);
        analyzer.library_name = config.library_name.clone();
        analyzer.project = config.project.clone();
        analyzer.custom_properties = config.custom_properties.clone();
        analyzer
    }

    // Builder methods

    pub fn with_team_mapping(mut self, mapping: TeamMapping) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn with_unassigned_policy(mut self, policy: UnassignedPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_large_file_threshold(mut self, threshold: u64) -> Self {
        self.large_file_threshold = threshold;
        self
    }

    pub fn with_library_name(mut self, name: impl Into<String>) -> Self {
        self.library_name = Some(name.into());
        self
    }

    pub fn store(&self) -> &CatalogStore<S> {
        &self.store
    }

    pub fn mode(&self) -> SizeMode {
        self.mode
    }

    /// Produce one report
    pub fn analyze(&self, kind: ReportKind) -> Result<Report> {
        let rows = match kind {
            ReportKind::Basic => self.basic()?,
            ReportKind::Apk => self.apk()?,
            ReportKind::Libraries => self.libraries()?,
            ReportKind::Modules => self.modules()?,
            ReportKind::Codebase => self.codebase()?,
            ReportKind::LargeFiles => self.large_files()?,
            ReportKind::LibContent => self.lib_content()?,
        };

        let report = Report::new(kind.id(), self.mode, rows)
            .with_project(self.project.clone(), self.custom_properties.clone());
        tracing::info!("{}", report.summary());
        Ok(report)
    }

    /// Audit attribution over one scope for lost or double-counted bytes
    pub fn audit(&self, scope: Scope) -> Result<ConservationReport> {
        let result = self.pipeline.single(&self.store, scope)?;
        Ok(ReconciliationEngine::new().reconcile(&result, self.store.packages()?))
    }

    // ------------------------------------------------------------------------
    // Report bodies
    // ------------------------------------------------------------------------

    fn package_sizes(&self) -> Result<CategorySizes> {
        let packages = self.store.packages()?;
        let entries = CategorizedEntries {
            resources: package_entries(packages, Category::Resource),
            assets: package_entries(packages, Category::Asset),
            native_libs: package_entries(packages, Category::NativeLib),
            classes: package_entries(packages, Category::Class),
            others: package_entries(packages, Category::Other),
        };
        Ok(CategorySizes::of(&entries, self.mode))
    }

    fn basic(&self) -> Result<Vec<Row>> {
        let package = self.package_sizes()?;
        Ok(vec![
            Row::new("apk", package.total).with_breakdown(package),
            Row::new("resource", package.resources),
            Row::new("native_lib", package.native_libs),
            Row::new("asset", package.assets),
            Row::new("other", package.others),
            Row::new("code", package.classes),
        ])
    }

    fn apk(&self) -> Result<Vec<Row>> {
        let package = self.package_sizes()?;
        let libraries = self.pipeline.single(&self.store, Scope::Libraries)?;
        let libs: CategorySizes = libraries.contributors.iter().map(Contributor::sizes).sum();

        Ok(vec![
            Row::new("apk", package.total).with_breakdown(package),
            Row::new("codebase-kotlin-java", package.classes.saturating_sub(libs.classes)),
            Row::new("codebase-resources", package.resources.saturating_sub(libs.resources)),
            Row::new("codebase-assets", package.assets.saturating_sub(libs.assets)),
            Row::new("codebase-native", package.native_libs.saturating_sub(libs.native_libs)),
            Row::new("others", package.others.saturating_sub(libs.others)),
            Row::new("android-java-libraries", libs.total - libs.native_libs),
            Row::new("native-libraries", libs.native_libs),
        ])
    }

    fn libraries(&self) -> Result<Vec<Row>> {
        let mut contributors = self.pipeline.single(&self.store, Scope::Libraries)?.contributors;
        sort_by_total_desc(&mut contributors);

        Ok(contributors
            .iter()
            .map(|c| {
                Row::new(c.archive().file_stem(), c.total())
                    .with_tag(c.archive().display_path())
                    .with_breakdown(*c.sizes())
            })
            .collect())
    }

    fn modules(&self) -> Result<Vec<Row>> {
        let attribution = self.pipeline.run(&self.store, Scope::Modules)?;
        let mut modules = to_modules(&attribution.with_app());
        sort_by_total_desc(&mut modules);

        Ok(modules
            .iter()
            .map(|m| {
                let owner = self.mapping.team_of(m.tag()).unwrap_or(NOT_AVAILABLE);
                Row::new(m.tag(), m.sizes().total)
                    .with_owner(owner)
                    .with_breakdown(*m.sizes())
            })
            .collect())
    }

    fn codebase(&self) -> Result<Vec<Row>> {
        let attribution = self.pipeline.run(&self.store, Scope::Modules)?;
        let mut teams = to_teams(&attribution.with_app(), &self.mapping, &self.policy);
        sort_by_total_desc(&mut teams);

        Ok(teams
            .iter()
            .map(|t| Row::new(t.name(), t.sizes().total).with_breakdown(*t.sizes()))
            .collect())
    }

    fn large_files(&self) -> Result<Vec<Row>> {
        let attribution = self.pipeline.run(&self.store, Scope::Modules)?;
        let threshold = self.large_file_threshold;
        let mode = self.mode;

        let large: Vec<Contributor> = attribution
            .with_app()
            .iter()
            .filter_map(|c| {
                let mut entries = CategorizedEntries::new();
                entries.resources = c.entries(Category::Resource).filtered(|e| e.size(mode) >= threshold);
                entries.assets = c.entries(Category::Asset).filtered(|e| e.size(mode) >= threshold);
                if entries.is_empty() {
                    None
                } else {
                    Some(Contributor::new(c.archive().clone(), entries, mode))
                }
            })
            .collect();

        let teams = to_teams(&large, &self.mapping, &self.policy);

        let mut rows: Vec<Row> = teams
            .iter()
            .flat_map(|team| {
                team.modules().iter().flat_map(move |module| {
                    module.contributors().iter().flat_map(move |c| {
                        c.all_entries().iter().map(move |entry| {
                            Row::new(entry.display_name(), entry.size(mode))
                                .with_owner(team.name())
                                .with_tag(module.tag())
                        })
                    })
                })
            })
            .collect();
        rows.sort_by(|a, b| b.size.cmp(&a.size));

        Ok(rows)
    }

    fn lib_content(&self) -> Result<Vec<Row>> {
        let name = self
            .library_name
            .as_deref()
            .ok_or_else(|| anyhow!("lib-content report needs a library name"))?;

        let libraries = self.pipeline.single(&self.store, Scope::Libraries)?;
        let Some(library) = libraries.contributors.iter().find(|c| c.archive().file_stem() == name) else {
            bail!("Can not find library '{}' among the package contributors", name);
        };

        let sections = [
            (Category::Resource, "Resource"),
            (Category::Asset, "Asset"),
            (Category::NativeLib, "Native"),
            (Category::Other, "Other"),
            (Category::Class, "Class"),
        ];

        Ok(sections
            .iter()
            .flat_map(|(category, label)| {
                library
                    .entries(*category)
                    .iter()
                    .map(move |entry| Row::new(entry.key(), entry.size(self.mode)).with_tag(*label))
            })
            .collect())
    }
}

// ============================================================================
// TESTS
// ============================================================================
