// 👥 Team Mapping - which team owns which module
//
// Ownership file format:
//
//   # payments squad
//   payments:
//     - :payments:checkout
//     - :payments:wallet
//   maps:
//     - :maps
//
// A line ending in `:` opens a team, `- ` lines list its modules, `#` lines
// and blank lines are skipped. Module names are matched against archive tags
// after leading and trailing `:` are trimmed.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamMapping {
    pub team_to_modules: BTreeMap<String, Vec<String>>,
    pub module_to_team: BTreeMap<String, String>,
}

impl TeamMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from (team, module) pairs. Module tags are taken as given.
    pub fn from_pairs<I, T, M>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (T, M)>,
        T: Into<String>,
        M: AsRef<str>,
    {
        let mut team_to_modules: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (team, module) in pairs {
            team_to_modules
                .entry(team.into())
                .or_default()
                .push(module.as_ref().to_string());
        }
        Self::from_teams(team_to_modules)
    }

    /// Load the ownership file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read team mapping file: {:?}", path.as_ref()))?;

        let mapping = Self::parse(&content);
        tracing::info!(
            teams = mapping.team_to_modules.len(),
            modules = mapping.module_to_team.len(),
            "Loaded team mapping"
        );
        Ok(mapping)
    }

    /// Parse the ownership file format. Module lines before the first team
    /// header are ignored; repeating a header starts that team over.
    pub fn parse(content: &str) -> Self {
        let mut team_to_modules: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut current_team: Option<String> = None;

        for line in content.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            // `- :lib:` is a module line even though it ends in `:`
            if let Some(module) = line.strip_prefix("- ") {
                if let Some(modules) = current_team.as_ref().and_then(|t| team_to_modules.get_mut(t)) {
                    modules.push(normalize_module(module));
                }
            } else if let Some(team) = line.strip_suffix(':') {
                team_to_modules.insert(team.to_string(), Vec::new());
                current_team = Some(team.to_string());
            }
        }

        Self::from_teams(team_to_modules)
    }

    fn from_teams(mut team_to_modules: BTreeMap<String, Vec<String>>) -> Self {
        // a tag listed twice under one team counts once
        for modules in team_to_modules.values_mut() {
            let mut seen = BTreeSet::new();
            modules.retain(|module| seen.insert(module.clone()));
        }

        let mut module_to_team = BTreeMap::new();
        for (team, modules) in &team_to_modules {
            for module in modules {
                if let Some(previous) = module_to_team.insert(module.clone(), team.clone()) {
                    tracing::warn!("Module '{}' listed by both '{}' and '{}'", module, previous, team);
                }
            }
        }

        TeamMapping {
            team_to_modules,
            module_to_team,
        }
    }

    pub fn team_of(&self, module_tag: &str) -> Option<&str> {
        self.module_to_team.get(module_tag).map(String::as_str)
    }

    pub fn modules_of(&self, team: &str) -> &[String] {
        self.team_to_modules.get(team).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.team_to_modules.is_empty()
    }
}

fn normalize_module(module: &str) -> String {
    module.trim().trim_matches(':').to_string()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MAPPING: &str = "\
# ownership
team1:
  - :moduleAar1
  - moduleJar1:

team2:
  - moduleAar2
  - moduleJar2
";

    #[test]
    fn test_parse_ownership_file() {
        let mapping = TeamMapping::parse(MAPPING);

        assert_eq!(mapping.modules_of("team1"), ["moduleAar1", "moduleJar1"]);
        assert_eq!(mapping.team_of("moduleJar2"), Some("team2"));
        assert_eq!(mapping.team_of("app"), None);
        assert!(mapping.modules_of("team3").is_empty());

        println!("✅ Parsed {} teams", mapping.team_to_modules.len());
    }

    #[test]
    fn test_orphan_module_lines_ignored() {
        let mapping = TeamMapping::parse("- stray\nteam:\n  - kept\n");

        assert_eq!(mapping.module_to_team.len(), 1);
        assert_eq!(mapping.team_of("kept"), Some("team"));
    }

    #[test]
    fn test_from_pairs_matches_parse() {
        let pairs = TeamMapping::from_pairs(vec![
            ("team1", "moduleAar1"),
            ("team1", "moduleJar1"),
            ("team2", "moduleAar2"),
            ("team2", "moduleJar2"),
        ]);
        let parsed = TeamMapping::parse(MAPPING);

        assert_eq!(pairs.team_to_modules, parsed.team_to_modules);
        assert_eq!(pairs.module_to_team, parsed.module_to_team);
    }

    #[test]
    fn test_from_pairs_keeps_tags_verbatim() {
        let mapping = TeamMapping::from_pairs(vec![("team1", ":moduleAar1")]);

        assert_eq!(mapping.team_of(":moduleAar1"), Some("team1"));
        assert_eq!(mapping.team_of("moduleAar1"), None);
    }

    #[test]
    fn test_repeated_module_listed_once() {
        let mapping = TeamMapping::parse("alpha:\n  - a\n  - :a:\n  - b\n");

        assert_eq!(mapping.modules_of("alpha"), ["a", "b"]);
        assert_eq!(mapping.module_to_team.len(), 2);

        let pairs = TeamMapping::from_pairs(vec![("alpha", "a"), ("alpha", "a")]);
        assert_eq!(pairs.modules_of("alpha"), ["a"]);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MAPPING.as_bytes()).unwrap();

        let mapping = TeamMapping::from_file(file.path()).unwrap();
        assert_eq!(mapping.module_to_team.len(), 4);

        assert!(TeamMapping::from_file("/no/such/teams.yml").is_err());
    }
}
