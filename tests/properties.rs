//! Property-based tests for the attribution engine
//!
//! Properties covered:
//! 1. Every package byte is attributed exactly once, in both size modes
//! 2. Attribution ignores entry order and candidate order
//! 3. Team and module rollups agree with their contributors
//! 4. An exact resource path always beats a normalized one

use app_sizer::{
    to_modules, to_teams, Archive, ArchiveCatalog, AttributionPipeline, CatalogBundle,
    CatalogStore, Category, CategoryMatcher, CategorySizes, Contributor, Entry, EntrySet,
    PackageCatalog, ResourceMatcher, Scope, SizeAnalyzer, SizeMode, TeamMapping,
    UnassignedPolicy,
};
use proptest::prelude::*;
use std::collections::BTreeSet;

const ARCHIVES: usize = 4;

/// One package entry: category, id, raw size, download size, owner index.
/// Owner `ARCHIVES` means nothing in the build ships it.
type EntryShape = (usize, u32, u64, u64, usize);

fn entry_strategy() -> impl Strategy<Value = EntryShape> {
    (0usize..5, 0u32..50, 0u64..100_000, 0u64..50_000, 0usize..=ARCHIVES)
}

fn package_key(category: usize, id: u32) -> (String, Category) {
    match category {
        0 => (format!("/res/drawable-v21/img_{}.png", id), Category::Resource),
        1 => (format!("/assets/blob_{}.bin", id), Category::Asset),
        2 => (format!("/lib/arm64-v8a/libn{}.so", id), Category::NativeLib),
        3 => (format!("com.test.Class{}", id), Category::Class),
        _ => (format!("meta_{}.properties", id), Category::Other),
    }
}

/// The key an archive lists for the same bytes, before packaging rewrote it
fn archive_key(category: usize, id: u32) -> String {
    match category {
        0 => format!("/res/drawable/img_{}.png", id),
        2 => format!("/jni/arm64-v8a/libn{}.so", id),
        _ => package_key(category, id).0,
    }
}

fn create_test_archive(index: usize) -> Archive {
    match index {
        0 => Archive::module("feature/build/outputs/aar/feature.aar", "feature"),
        1 => Archive::module("core/build/libs/core.jar", "core"),
        2 => Archive::library("/caches/files-2.1/com.vendor/vendor-1.0.aar", "vendor"),
        _ => Archive::library("/caches/files-2.1/com.other/other-2.0.jar", "other"),
    }
}

fn create_test_bundle(shapes: &[EntryShape]) -> CatalogBundle {
    let mut package = PackageCatalog::new("base.apk");
    let mut archives: Vec<ArchiveCatalog> = (0..ARCHIVES)
        .map(|i| ArchiveCatalog::new(create_test_archive(i)))
        .collect();

    let mut seen = BTreeSet::new();
    for &(category, id, raw, download, owner) in shapes {
        // one owner per package key
        if !seen.insert((category, id)) {
            continue;
        }

        let (key, cat) = package_key(category, id);
        package = package.with_entry(Entry::new(&key, cat, raw, download));

        if owner < ARCHIVES {
            archives[owner] = archives[owner]
                .clone()
                .with_entry(Entry::new(&archive_key(category, id), cat, raw, raw));
        }
    }

    let libraries = archives.split_off(2);
    CatalogBundle {
        packages: vec![package],
        libraries,
        modules: archives,
    }
}

/// Unique package keys in generation order, paired with a shuffle of the same set
fn shuffled_shapes() -> impl Strategy<Value = (Vec<EntryShape>, Vec<EntryShape>)> {
    prop::collection::vec(entry_strategy(), 0..60).prop_flat_map(|shapes| {
        let mut seen = BTreeSet::new();
        let unique: Vec<EntryShape> = shapes
            .into_iter()
            .filter(|&(category, id, ..)| seen.insert((category, id)))
            .collect();
        (Just(unique.clone()), Just(unique).prop_shuffle())
    })
}

fn hand_sum(sizes: &CategorySizes) -> u64 {
    sizes.resources + sizes.assets + sizes.native_libs + sizes.classes + sizes.others
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_every_byte_attributed_once(shapes in prop::collection::vec(entry_strategy(), 0..60)) {
        let bundle = create_test_bundle(&shapes);

        for mode in [SizeMode::Raw, SizeMode::Downloadable] {
            let package_total: u64 = bundle.packages[0].entries.iter().map(|e| e.size(mode)).sum();
            let store = CatalogStore::new(bundle.clone());
            let pipeline = AttributionPipeline::new(mode);

            for scope in [Scope::All, Scope::Libraries, Scope::Modules] {
                let result = pipeline.single(&store, scope).unwrap();
                prop_assert_eq!(result.attributed_sizes().total, package_total);
            }

            // modules + libraries + app residue cover the package exactly
            let modules = pipeline.run(&store, Scope::Modules).unwrap();
            let libraries = pipeline.single(&store, Scope::Libraries).unwrap();
            let covered: u64 = modules.with_app().iter().map(Contributor::total).sum::<u64>()
                + libraries.contributors.iter().map(Contributor::total).sum::<u64>();
            prop_assert_eq!(covered, package_total);
        }

        let analyzer = SizeAnalyzer::new(bundle, SizeMode::Downloadable);
        for scope in [Scope::All, Scope::Libraries, Scope::Modules] {
            let audit = analyzer.audit(scope).unwrap();
            prop_assert!(audit.is_balanced(), "{}", audit.summary());
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_attribution_is_deterministic((shapes, shuffled) in shuffled_shapes()) {
        let pipeline = AttributionPipeline::new(SizeMode::Downloadable);

        let mut reordered = create_test_bundle(&shuffled);
        reordered.libraries.reverse();
        reordered.modules.reverse();

        let first = pipeline
            .single(&CatalogStore::new(create_test_bundle(&shapes)), Scope::All)
            .unwrap();
        let second = pipeline
            .single(&CatalogStore::new(reordered), Scope::All)
            .unwrap();

        prop_assert_eq!(first.fingerprint(), second.fingerprint());
        prop_assert_eq!(first.contributors.len(), second.contributors.len());
        prop_assert_eq!(first.attributed_sizes(), second.attributed_sizes());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_rollups_agree(
        shapes in prop::collection::vec(entry_strategy(), 0..60),
        assign_feature in any::<bool>(),
    ) {
        let store = CatalogStore::new(create_test_bundle(&shapes));
        let attribution = AttributionPipeline::new(SizeMode::Raw).run(&store, Scope::Modules).unwrap();
        let contributors = attribution.with_app();

        let mapping = if assign_feature {
            TeamMapping::from_pairs(vec![("growth", "feature"), ("platform", "core")])
        } else {
            TeamMapping::from_pairs(vec![("platform", "core")])
        };

        let modules = to_modules(&contributors);
        let teams = to_teams(&contributors, &mapping, &UnassignedPolicy::default());

        let contributor_total: u64 = contributors.iter().map(Contributor::total).sum();
        let module_total: u64 = modules.iter().map(|m| m.sizes().total).sum();
        let team_total: u64 = teams.iter().map(|t| t.sizes().total).sum();

        prop_assert_eq!(module_total, contributor_total);
        prop_assert_eq!(team_total, module_total);

        for contributor in &contributors {
            prop_assert_eq!(hand_sum(contributor.sizes()), contributor.total());
        }
        for module in &modules {
            prop_assert_eq!(hand_sum(module.sizes()), module.sizes().total);
        }
        for team in &teams {
            prop_assert_eq!(hand_sum(team.sizes()), team.sizes().total);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_exact_resource_path_wins(
        ids in prop::collection::btree_set(0u32..1000, 1..20),
        version in 10u32..100,
        exact_first in any::<bool>(),
    ) {
        let mut package = EntrySet::new();
        let mut exact_owner = ArchiveCatalog::new(create_test_archive(0));
        let mut fallback_owner = ArchiveCatalog::new(create_test_archive(2));
        for id in &ids {
            let packaged = format!("/res/layout-v{}/screen_{}.xml", version, id);
            let original = format!("/res/layout/screen_{}.xml", id);

            package.insert(Entry::file(&packaged, 10, 5));
            exact_owner = exact_owner.with_entry(Entry::file(&packaged, 10, 10));
            fallback_owner = fallback_owner.with_entry(Entry::file(&original, 10, 10));
        }

        let candidates: Vec<&ArchiveCatalog> = if exact_first {
            vec![&exact_owner, &fallback_owner]
        } else {
            vec![&fallback_owner, &exact_owner]
        };

        let result = ResourceMatcher.resolve(&package, &candidates);

        prop_assert!(result.unresolved.is_empty());
        prop_assert_eq!(result.owned.len(), 1);
        prop_assert_eq!(
            result.owned.get(&exact_owner.archive.id).map(EntrySet::len),
            Some(ids.len())
        );
    }
}
