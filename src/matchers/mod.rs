// Category Matchers
// "Packaging rewrites the name, the bytes still belong to someone"
//
// Each matcher resolves the package entries of one category to the archive
// that shipped them:
// - Reverse index key → archive, built from the candidates in order
//   (a later candidate overwrites an earlier one on the same key)
// - Exact key lookup first
// - On a miss, category fallback keys in priority order, first hit wins
// - Anything still unmatched lands in `unresolved`, never dropped

pub mod asset;
pub mod class;
pub mod native_lib;
pub mod other;
pub mod resource;

pub use asset::AssetMatcher;
pub use class::ClassMatcher;
pub use native_lib::NativeLibMatcher;
pub use other::OtherMatcher;
pub use resource::ResourceMatcher;

use crate::archive::ArchiveId;
use crate::catalog::{ArchiveCatalog, Category, EntrySet};
use std::collections::{BTreeMap, HashMap};

// ============================================================================
// MATCH RESULT
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct MatchResult {
    /// Package entries grouped by the archive that owns them
    pub owned: BTreeMap<ArchiveId, EntrySet>,

    /// Package entries no candidate claimed
    pub unresolved: EntrySet,
}

impl MatchResult {
    pub fn owned_count(&self) -> usize {
        self.owned.values().map(EntrySet::len).sum()
    }
}

// ============================================================================
// MATCHER TRAIT
// ============================================================================

pub trait CategoryMatcher {
    fn category(&self) -> Category;

    /// Normalized form a candidate key is also indexed under
    fn candidate_alias(&self, _key: &str) -> Option<String> {
        None
    }

    /// Keys to try, in order, when the package key has no exact owner
    fn fallback_keys(&self, _key: &str) -> Vec<String> {
        Vec::new()
    }

    /// Resolve every package entry of this category to its owner
    fn resolve(&self, package_entries: &EntrySet, candidates: &[&ArchiveCatalog]) -> MatchResult {
        let category = self.category();

        let mut exact: HashMap<&str, &ArchiveId> = HashMap::new();
        let mut aliases: HashMap<String, &ArchiveId> = HashMap::new();
        for candidate in candidates {
            let id = &candidate.archive.id;
            for entry in candidate.entries(category).iter() {
                exact.insert(entry.key(), id);
                if let Some(alias) = self.candidate_alias(entry.key()) {
                    aliases.insert(alias, id);
                }
            }
        }

        let mut result = MatchResult::default();
        for entry in package_entries.iter() {
            let owner = exact.get(entry.key()).copied().or_else(|| {
                self.fallback_keys(entry.key()).iter().find_map(|key| {
                    exact
                        .get(key.as_str())
                        .copied()
                        .or_else(|| aliases.get(key).copied())
                })
            });

            match owner {
                Some(id) => {
                    result
                        .owned
                        .entry(id.clone())
                        .or_default()
                        .insert(entry.clone());
                }
                None => {
                    result.unresolved.insert(entry.clone());
                }
            }
        }

        tracing::debug!(
            category = category.as_str(),
            candidates = candidates.len(),
            owned = result.owned_count(),
            unresolved = result.unresolved.len(),
            "Resolved package entries"
        );

        result
    }
}

/// One matcher per category, in the order results are merged
pub fn all_matchers() -> Vec<Box<dyn CategoryMatcher>> {
    vec![
        Box::new(AssetMatcher),
        Box::new(ResourceMatcher),
        Box::new(NativeLibMatcher),
        Box::new(ClassMatcher),
        Box::new(OtherMatcher),
    ]
}

// ============================================================================
// TESTS
// ============================================================================
