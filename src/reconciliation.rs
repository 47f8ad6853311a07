// ⚖️ Conservation Audit - validate that attribution neither loses nor invents bytes
//
// For every category, under the run's size mode:
//   Σ contributors + Σ residue = Σ package entries
//
// and every package key sits in exactly one place: one contributor or the
// residue. Without this check a matcher bug silently moves bytes off the
// report.

use crate::catalog::{package_entries, Category, EntryKey, PackageCatalog};
use crate::ownership::OwnershipResult;
use crate::size::SizeMode;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ============================================================================
// CONSERVATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConservationResult {
    /// Attributed bytes equal package bytes
    Balanced { package_total: u64 },

    /// Attributed bytes differ from package bytes
    Discrepancy {
        package_total: u64,
        attributed_total: u64,
    },
}

impl ConservationResult {
    fn from_totals(package_total: u64, attributed_total: u64) -> Self {
        if package_total == attributed_total {
            ConservationResult::Balanced { package_total }
        } else {
            ConservationResult::Discrepancy {
                package_total,
                attributed_total,
            }
        }
    }

    pub fn is_balanced(&self) -> bool {
        matches!(self, ConservationResult::Balanced { .. })
    }

    /// Attributed minus package bytes; positive means bytes were invented
    pub fn difference(&self) -> i128 {
        match self {
            ConservationResult::Balanced { .. } => 0,
            ConservationResult::Discrepancy {
                package_total,
                attributed_total,
            } => *attributed_total as i128 - *package_total as i128,
        }
    }
}

// ============================================================================
// CONSERVATION REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConservationReport {
    pub mode: SizeMode,
    pub categories: BTreeMap<Category, ConservationResult>,

    /// Package keys owned by nobody and missing from the residue
    pub missing: Vec<Placement>,

    /// Keys placed more than once (two contributors, or contributor + residue)
    pub duplicated: Vec<Placement>,

    pub reconciled_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub category: Category,
    pub key: EntryKey,
}

impl ConservationReport {
    pub fn is_balanced(&self) -> bool {
        self.categories.values().all(ConservationResult::is_balanced)
            && self.missing.is_empty()
            && self.duplicated.is_empty()
    }

    pub fn summary(&self) -> String {
        let balanced = self.categories.values().filter(|r| r.is_balanced()).count();
        let net: i128 = self.categories.values().map(ConservationResult::difference).sum();
        format!(
            "Conservation ({}): {}/{} categories balanced, net difference {} bytes, {} missing, {} duplicated",
            self.mode.as_str(),
            balanced,
            self.categories.len(),
            net,
            self.missing.len(),
            self.duplicated.len()
        )
    }
}

// ============================================================================
// RECONCILIATION ENGINE
// ============================================================================

pub struct ReconciliationEngine;

impl ReconciliationEngine {
    pub fn new() -> Self {
        ReconciliationEngine
    }

    /// Audit an ownership result against the packages it was built from
    pub fn reconcile(&self, result: &OwnershipResult, packages: &[PackageCatalog]) -> ConservationReport {
        let mode = result.mode;
        let mut categories = BTreeMap::new();
        let mut missing = Vec::new();
        let mut duplicated = Vec::new();

        for category in Category::ALL {
            let expected = package_entries(packages, category);

            let mut placed: BTreeSet<&EntryKey> = BTreeSet::new();
            let owned_sets = result.contributors.iter().map(|c| c.entries(category));
            for set in owned_sets.chain(std::iter::once(result.residue.get(category))) {
                for key in set.keys() {
                    if !placed.insert(key) {
                        duplicated.push(Placement {
                            category,
                            key: key.clone(),
                        });
                    }
                }
            }

            for key in expected.keys() {
                if !placed.contains(key) {
                    missing.push(Placement {
                        category,
                        key: key.clone(),
                    });
                }
            }

            let attributed: u64 = result
                .contributors
                .iter()
                .map(|c| c.sizes().get(category))
                .sum::<u64>()
                + result.residue.get(category).total(mode);

            categories.insert(
                category,
                ConservationResult::from_totals(expected.total(mode), attributed),
            );
        }

        let report = ConservationReport {
            mode,
            categories,
            missing,
            duplicated,
            reconciled_at: chrono::Utc::now(),
        };

        if report.is_balanced() {
            tracing::debug!("{}", report.summary());
        } else {
            tracing::warn!("{}", report.summary());
        }

        report
    }
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::Archive;
    use crate::catalog::{ArchiveCatalog, Entry};
    use crate::ownership::OwnershipAggregator;

    fn create_test_package() -> PackageCatalog {
        PackageCatalog::new("app.apk")
            .with_entry(Entry::file("/assets/a.bin", 30, 10))
            .with_entry(Entry::file("/assets/b.bin", 60, 20))
            .with_entry(Entry::file("/res/raw/c.bin", 90, 30))
    }

    #[test]
    fn test_aggregated_result_balances() {
        let package = create_test_package();
        let lib = ArchiveCatalog::new(Archive::library("libs/a.aar", "a"))
            .with_entry(Entry::file("/assets/a.bin", 1, 1));

        let result = OwnershipAggregator::new(SizeMode::Raw).aggregate(&[package.clone()], &[&lib]);
        let report = ReconciliationEngine::new().reconcile(&result, &[package]);

        assert!(report.is_balanced());
        assert_eq!(
            report.categories[&Category::Asset],
            ConservationResult::Balanced { package_total: 90 }
        );

        println!("✅ {}", report.summary());
    }

    #[test]
    fn test_dropped_entry_is_reported() {
        let package = create_test_package();
        let mut result = OwnershipAggregator::new(SizeMode::Downloadable).aggregate(&[package.clone()], &[]);

        // lose one residue entry
        result.residue.assets = result
            .residue
            .assets
            .filtered(|e| e.key() != "/assets/b.bin");

        let report = ReconciliationEngine::new().reconcile(&result, &[package]);

        assert!(!report.is_balanced());
        assert_eq!(report.categories[&Category::Asset].difference(), -20);
        assert_eq!(report.missing.len(), 1);
        assert_eq!(report.missing[0].key.as_str(), "/assets/b.bin");
        assert!(report.categories[&Category::Resource].is_balanced());
    }

    #[test]
    fn test_double_placement_is_reported() {
        let package = create_test_package();
        let lib = ArchiveCatalog::new(Archive::library("libs/a.aar", "a"))
            .with_entry(Entry::file("/assets/a.bin", 1, 1));

        let mut result = OwnershipAggregator::new(SizeMode::Raw).aggregate(&[package.clone()], &[&lib]);
        result.residue.insert(Entry::file("/assets/a.bin", 30, 10));

        let report = ReconciliationEngine::new().reconcile(&result, &[package]);

        assert_eq!(report.duplicated.len(), 1);
        assert_eq!(report.categories[&Category::Asset].difference(), 30);
    }
}
