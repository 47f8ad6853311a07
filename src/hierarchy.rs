// 🏗️ Hierarchy Builder - Contributor → Module → Team
//
// Modules group contributors that share an archive identity; teams group
// modules by the ownership file. Every level carries its category sums,
// computed from its children when it is built.

use crate::archive::{Archive, ArchiveId};
use crate::ownership::Contributor;
use crate::size::CategorySizes;
use crate::team_mapping::TeamMapping;
use serde::{Deserialize, Serialize};

pub const UNASSIGNED_TEAM: &str = "unassigned";

// ============================================================================
// MODULE
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    archive: Archive,
    contributors: Vec<Contributor>,
    sizes: CategorySizes,
}

impl Module {
    pub fn new(archive: Archive, contributors: Vec<Contributor>) -> Self {
        let sizes = contributors.iter().map(Contributor::sizes).sum();
        Module {
            archive,
            contributors,
            sizes,
        }
    }

    pub fn id(&self) -> &ArchiveId {
        &self.archive.id
    }

    pub fn tag(&self) -> &str {
        &self.archive.tag
    }

    pub fn path(&self) -> &str {
        self.archive.path()
    }

    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    pub fn contributors(&self) -> &[Contributor] {
        &self.contributors
    }

    pub fn sizes(&self) -> &CategorySizes {
        &self.sizes
    }
}

// ============================================================================
// TEAM
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    name: String,
    modules: Vec<Module>,
    sizes: CategorySizes,
}

impl Team {
    pub fn new(name: impl Into<String>, modules: Vec<Module>) -> Self {
        let sizes = modules.iter().map(Module::sizes).sum();
        Team {
            name: name.into(),
            modules,
            sizes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn sizes(&self) -> &CategorySizes {
        &self.sizes
    }
}

// ============================================================================
// UNASSIGNED POLICY
// ============================================================================

/// What happens to modules no team lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnassignedPolicy {
    /// Gather them into a synthetic team of this name
    Bucket(String),

    /// Leave them out of the team view
    Omit,
}

impl UnassignedPolicy {
    /// `None` means omit
    pub fn from_bucket(name: Option<&str>) -> Self {
        match name {
            Some(name) => UnassignedPolicy::Bucket(name.to_string()),
            None => UnassignedPolicy::Omit,
        }
    }
}

impl Default for UnassignedPolicy {
    fn default() -> Self {
        UnassignedPolicy::Bucket(UNASSIGNED_TEAM.to_string())
    }
}

// ============================================================================
// GROUPING
// ============================================================================

/// Group contributors by archive identity, in first-seen order
pub fn to_modules(contributors: &[Contributor]) -> Vec<Module> {
    let mut groups: Vec<(Archive, Vec<Contributor>)> = Vec::new();

    for contributor in contributors {
        match groups.iter_mut().find(|(archive, _)| archive.id == *contributor.id()) {
            Some((_, members)) => members.push(contributor.clone()),
            None => groups.push((contributor.archive().clone(), vec![contributor.clone()])),
        }
    }

    groups
        .into_iter()
        .map(|(archive, members)| Module::new(archive, members))
        .collect()
}

/// Group modules by team. A team collects every module whose tag it lists,
/// in module order; unlisted modules follow the policy.
pub fn to_teams(contributors: &[Contributor], mapping: &TeamMapping, policy: &UnassignedPolicy) -> Vec<Team> {
    let modules = to_modules(contributors);

    let mut teams: Vec<Team> = mapping
        .team_to_modules
        .iter()
        .map(|(team, tags)| {
            // each module joins a team once, however often its tag is listed
            let members: Vec<Module> = modules
                .iter()
                .filter(|m| tags.iter().any(|tag| tag.as_str() == m.tag()))
                .cloned()
                .collect();
            Team::new(team.clone(), members)
        })
        .collect();

    let unassigned: Vec<Module> = modules
        .iter()
        .filter(|m| mapping.team_of(m.tag()).is_none())
        .cloned()
        .collect();

    match policy {
        UnassignedPolicy::Bucket(name) if !unassigned.is_empty() => {
            tracing::debug!(team = %name, modules = unassigned.len(), "Bucketing unassigned modules");
            match teams.iter().position(|t| t.name() == name) {
                Some(idx) => {
                    let existing = teams.remove(idx);
                    let mut members = existing.modules;
                    members.extend(unassigned);
                    teams.insert(idx, Team::new(name.clone(), members));
                }
                None => teams.push(Team::new(name.clone(), unassigned)),
            }
        }
        UnassignedPolicy::Omit if !unassigned.is_empty() => {
            tracing::debug!(modules = unassigned.len(), "Omitting unassigned modules from teams");
        }
        _ => {}
    }

    teams
}

// ============================================================================
// SORTING
// ============================================================================

/// Anything with a total size
pub trait SizeTotal {
    fn size_total(&self) -> u64;
}

impl SizeTotal for Contributor {
    fn size_total(&self) -> u64 {
        self.total()
    }
}

impl SizeTotal for Module {
    fn size_total(&self) -> u64 {
        self.sizes.total
    }
}

impl SizeTotal for Team {
    fn size_total(&self) -> u64 {
        self.sizes.total
    }
}

/// Largest first; equal totals keep their input order
pub fn sort_by_total_desc<T: SizeTotal>(items: &mut [T]) {
    items.sort_by(|a, b| b.size_total().cmp(&a.size_total()));
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CategorizedEntries, Entry};
    use crate::size::SizeMode;

    fn create_test_contributor(path: &str, tag: &str, asset_size: u64) -> Contributor {
        let entries: CategorizedEntries = vec![Entry::file(&format!("/assets/{}.bin", tag), asset_size, asset_size)].into();
        Contributor::new(Archive::module(path, tag), entries, SizeMode::Raw)
    }

    fn create_test_contributors() -> Vec<Contributor> {
        vec![
            create_test_contributor("a/a.aar", "a", 10),
            create_test_contributor("b/b.aar", "b", 30),
            create_test_contributor("c/c.aar", "c", 20),
        ]
    }

    #[test]
    fn test_to_modules_groups_by_identity() {
        let mut contributors = create_test_contributors();
        // same path, different tag: still the same module
        contributors.push(create_test_contributor("a/a.aar", "renamed", 5));

        let modules = to_modules(&contributors);

        assert_eq!(modules.len(), 3);
        assert_eq!(modules[0].tag(), "a");
        assert_eq!(modules[0].contributors().len(), 2);
        assert_eq!(modules[0].sizes().total, 15);
    }

    #[test]
    fn test_to_teams_with_bucket() {
        let mapping = TeamMapping::from_pairs(vec![("alpha", "a"), ("alpha", "b")]);

        let teams = to_teams(&create_test_contributors(), &mapping, &UnassignedPolicy::default());

        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0].name(), "alpha");
        assert_eq!(teams[0].sizes().total, 40);
        assert_eq!(teams[1].name(), UNASSIGNED_TEAM);
        assert_eq!(teams[1].sizes().total, 20);

        // team totals reconcile with module totals
        let team_total: u64 = teams.iter().map(|t| t.sizes().total).sum();
        let module_total: u64 = to_modules(&create_test_contributors()).iter().map(|m| m.sizes().total).sum();
        assert_eq!(team_total, module_total);

        println!("✅ Unassigned modules bucketed");
    }

    #[test]
    fn test_to_teams_omit_drops_unlisted() {
        let mapping = TeamMapping::from_pairs(vec![("alpha", "a")]);

        let teams = to_teams(&create_test_contributors(), &mapping, &UnassignedPolicy::Omit);

        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].sizes().total, 10);
    }

    #[test]
    fn test_team_listing_missing_module_is_empty() {
        let mapping = TeamMapping::from_pairs(vec![("ghosts", "nowhere")]);

        let teams = to_teams(&create_test_contributors(), &mapping, &UnassignedPolicy::Omit);

        assert_eq!(teams.len(), 1);
        assert!(teams[0].modules().is_empty());
        assert_eq!(teams[0].sizes().total, 0);
    }

    #[test]
    fn test_repeated_tag_counts_module_once() {
        let mut mapping = TeamMapping::parse("alpha:\n  - a\n  - :a:\n  - b\n");
        // hand-built mappings may still repeat a tag
        mapping
            .team_to_modules
            .insert("alpha".to_string(), vec!["a".to_string(), "a".to_string(), "b".to_string()]);

        let contributors = vec![
            create_test_contributor("a/a.aar", "a", 10),
            create_test_contributor("b/b.aar", "b", 30),
        ];
        let teams = to_teams(&contributors, &mapping, &UnassignedPolicy::default());

        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].modules().len(), 2);

        let team_total: u64 = teams.iter().map(|t| t.sizes().total).sum();
        let module_total: u64 = to_modules(&contributors).iter().map(|m| m.sizes().total).sum();
        assert_eq!(team_total, 40);
        assert_eq!(team_total, module_total);
    }

    #[test]
    fn test_sort_by_total_desc_is_stable() {
        let mut contributors = vec![
            create_test_contributor("x/x.aar", "x", 10),
            create_test_contributor("y/y.aar", "y", 30),
            create_test_contributor("z/z.aar", "z", 10),
        ];

        sort_by_total_desc(&mut contributors);

        let tags: Vec<&str> = contributors.iter().map(|c| c.archive().tag.as_str()).collect();
        assert_eq!(tags, vec!["y", "x", "z"]);
    }
}
