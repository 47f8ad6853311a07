// 🧩 Ownership Aggregator - every package byte gets exactly one owner
//
// "Archive path is IDENTITY, entries are VALUES"
//
// Flow:
//   package entries ──► 5 category matchers ──► per-archive Contributors
//                                          └──► residue (no owner)
//
// The two-step pipeline narrows the candidates to one kind of archive while
// still giving the in-house `app` code its own contributor: the full-scope
// residue is what nobody else shipped, so it belongs to the app.

use crate::archive::{Archive, ArchiveId};
use crate::catalog::{
    package_entries, ArchiveCatalog, CatalogSource, CatalogStore, CategorizedEntries, Category,
    EntrySet, PackageCatalog, Scope,
};
use crate::matchers::{all_matchers, CategoryMatcher};
use crate::size::{CategorySizes, SizeMode};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

// ============================================================================
// CONTRIBUTOR
// ============================================================================

/// One archive together with the package entries attributed to it.
///
/// Sums are computed once, under the mode of the run that built it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contributor {
    archive: Archive,
    entries: CategorizedEntries,
    mode: SizeMode,
    sizes: CategorySizes,
}

impl Contributor {
    pub fn new(archive: Archive, entries: CategorizedEntries, mode: SizeMode) -> Self {
        let sizes = CategorySizes::of(&entries, mode);
        Contributor {
            archive,
            entries,
            mode,
            sizes,
        }
    }

    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    pub fn id(&self) -> &ArchiveId {
        &self.archive.id
    }

    pub fn entries(&self, category: Category) -> &EntrySet {
        self.entries.get(category)
    }

    pub fn all_entries(&self) -> &CategorizedEntries {
        &self.entries
    }

    pub fn mode(&self) -> SizeMode {
        self.mode
    }

    pub fn sizes(&self) -> &CategorySizes {
        &self.sizes
    }

    pub fn total(&self) -> u64 {
        self.sizes.total
    }
}

// ============================================================================
// OWNERSHIP RESULT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnershipResult {
    pub mode: SizeMode,

    /// One contributor per owning archive, ordered by archive path
    pub contributors: Vec<Contributor>,

    /// Package entries no candidate claimed
    pub residue: CategorizedEntries,

    /// Every candidate archive by identity, owning or not
    archives: BTreeMap<ArchiveId, Archive>,
}

impl OwnershipResult {
    pub fn contributor(&self, id: &ArchiveId) -> Option<&Contributor> {
        self.contributors.iter().find(|c| c.id() == id)
    }

    pub fn archive(&self, id: &ArchiveId) -> Option<&Archive> {
        self.archives.get(id)
    }

    pub fn archives(&self) -> impl Iterator<Item = &Archive> + '_ {
        self.archives.values()
    }

    pub fn residue_sizes(&self) -> CategorySizes {
        CategorySizes::of(&self.residue, self.mode)
    }

    /// Contributors plus residue, per category
    pub fn attributed_sizes(&self) -> CategorySizes {
        self.contributors.iter().map(Contributor::sizes).sum::<CategorySizes>() + self.residue_sizes()
    }

    /// The residue packaged as a contributor owned by `archive`
    pub fn residue_contributor(&self, archive: Archive) -> Contributor {
        Contributor::new(archive, self.residue.clone(), self.mode)
    }

    /// Hash of every entry key with its owner, in order. Two runs over the
    /// same catalogs produce the same fingerprint.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.mode.as_str().as_bytes());

        for contributor in &self.contributors {
            for entry in contributor.all_entries().iter() {
                hasher.update(entry.key().as_bytes());
                hasher.update(b"\0");
                hasher.update(contributor.id().as_str().as_bytes());
                hasher.update(b"\n");
            }
        }
        for entry in self.residue.iter() {
            hasher.update(entry.key().as_bytes());
            hasher.update(b"\0\n");
        }

        format!("{:x}", hasher.finalize())
    }
}

// ============================================================================
// OWNERSHIP AGGREGATOR
// ============================================================================

pub struct OwnershipAggregator {
    matchers: Vec<Box<dyn CategoryMatcher>>,
    mode: SizeMode,
}

impl OwnershipAggregator {
    pub fn new(mode: SizeMode) -> Self {
        OwnershipAggregator {
            matchers: all_matchers(),
            mode,
        }
    }

    pub fn mode(&self) -> SizeMode {
        self.mode
    }

    /// Run every matcher and merge the per-category matches into one
    /// contributor per owning archive
    pub fn aggregate(
        &self,
        packages: &[PackageCatalog],
        candidates: &[&ArchiveCatalog],
    ) -> OwnershipResult {
        let archives: BTreeMap<ArchiveId, Archive> = candidates
            .iter()
            .map(|c| (c.archive.id.clone(), c.archive.clone()))
            .collect();

        let mut owned: BTreeMap<ArchiveId, CategorizedEntries> = BTreeMap::new();
        let mut residue = CategorizedEntries::new();

        for matcher in &self.matchers {
            let category = matcher.category();
            let entries = package_entries(packages, category);
            let matched = matcher.resolve(&entries, candidates);

            for (id, set) in matched.owned {
                *owned.entry(id).or_default().get_mut(category) = set;
            }
            *residue.get_mut(category) = matched.unresolved;
        }

        let contributors: Vec<Contributor> = owned
            .into_iter()
            .filter_map(|(id, entries)| {
                archives
                    .get(&id)
                    .map(|archive| Contributor::new(archive.clone(), entries, self.mode))
            })
            .collect();

        tracing::debug!(
            candidates = candidates.len(),
            contributors = contributors.len(),
            residue = residue.len(),
            "Aggregated ownership"
        );

        OwnershipResult {
            mode: self.mode,
            contributors,
            residue,
            archives,
        }
    }
}

impl Default for OwnershipAggregator {
    fn default() -> Self {
        Self::new(SizeMode::default())
    }
}

// ============================================================================
// TWO-STEP ATTRIBUTION PIPELINE
// ============================================================================

/// Result of a narrowed pass plus the app contributor from the full pass
#[derive(Debug, Clone)]
pub struct ScopedAttribution {
    pub scope: Scope,

    /// Attribution over the narrowed candidates only
    pub scoped: OwnershipResult,

    /// Full-scope residue, owned by the `app` pseudo-artifact
    pub app: Contributor,
}

impl ScopedAttribution {
    /// Narrowed contributors followed by the app contributor
    pub fn with_app(&self) -> Vec<Contributor> {
        let mut contributors = self.scoped.contributors.clone();
        contributors.push(self.app.clone());
        contributors
    }
}

pub struct AttributionPipeline {
    aggregator: OwnershipAggregator,
}

impl AttributionPipeline {
    pub fn new(mode: SizeMode) -> Self {
        AttributionPipeline {
            aggregator: OwnershipAggregator::new(mode),
        }
    }

    /// Attribute the packages against the archives of one scope
    pub fn single<S: CatalogSource>(&self, store: &CatalogStore<S>, scope: Scope) -> Result<OwnershipResult> {
        let packages = store.packages()?;
        let candidates = store.candidates(scope)?;
        Ok(self.aggregator.aggregate(packages, &candidates))
    }

    /// Full-scope pass for the app contributor, then the narrowed pass
    pub fn run<S: CatalogSource>(&self, store: &CatalogStore<S>, scope: Scope) -> Result<ScopedAttribution> {
        let full = self.single(store, Scope::All)?;
        let app = full.residue_contributor(Archive::app());

        let scoped = if scope == Scope::All {
            full
        } else {
            self.single(store, scope)?
        };

        tracing::info!(
            scope = ?scope,
            contributors = scoped.contributors.len(),
            app_total = app.total(),
            "Attribution pipeline complete"
        );

        Ok(ScopedAttribution { scope, scoped, app })
    }
}

// ============================================================================
// TESTS
// ============================================================================
