// ☕ Class Matcher - qualified name, then synthesized names undone
//
// Desugaring and the compiler add classes the archive never listed:
//   androidx.core.widget.-$$Lambda$ContentLoadingProgressBar$aW9c...
//       → androidx.core.widget.ContentLoadingProgressBar
//   androidx.appcompat.app.AppCompatDelegateImpl$Api24Impl
//       → androidx.appcompat.app.AppCompatDelegateImpl

use super::CategoryMatcher;
use crate::catalog::Category;

const LAMBDA_MARKER: &str = "-$$Lambda$";

pub struct ClassMatcher;

impl CategoryMatcher for ClassMatcher {
    fn category(&self) -> Category {
        Category::Class
    }

    fn fallback_keys(&self, key: &str) -> Vec<String> {
        original_class(key).into_iter().collect()
    }
}

/// Name of the class a synthesized or nested class came from
fn original_class(name: &str) -> Option<String> {
    if name.contains(LAMBDA_MARKER) {
        let mut original = name.replace(LAMBDA_MARKER, "");
        if let Some(idx) = original.rfind('$').filter(|idx| *idx > 0) {
            original.truncate(idx);
        }
        return Some(original);
    }

    name.find('$').map(|idx| name[..idx].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Entry, EntrySet};
    use crate::matchers::tests::{create_test_library, owner_of};

    #[test]
    fn test_original_class() {
        assert_eq!(
            original_class("androidx.core.widget.-$$Lambda$ContentLoadingProgressBar$aW9csiS0dCdsR2nrqov9CuXAmGo")
                .as_deref(),
            Some("androidx.core.widget.ContentLoadingProgressBar")
        );
        assert_eq!(
            original_class("androidx.appcompat.app.AppCompatDelegate$$ExternalSyntheticLambda0").as_deref(),
            Some("androidx.appcompat.app.AppCompatDelegate")
        );
        assert_eq!(
            original_class("androidx.appcompat.app.AppCompatDelegateImpl$Api24Impl$$ExternalSyntheticApiModelOutline0")
                .as_deref(),
            Some("androidx.appcompat.app.AppCompatDelegateImpl")
        );
        assert_eq!(original_class("com.example.Plain"), None);
    }

    #[test]
    fn test_synthesized_classes_resolve_to_outer_class_owner() {
        let lib = create_test_library(
            "libs/core.aar",
            vec![
                Entry::class("androidx.core.widget.ContentLoadingProgressBar", 100, 0),
                Entry::class("androidx.appcompat.app.AppCompatDelegateImpl", 200, 0),
            ],
        );
        let package: EntrySet = vec![
            Entry::class("androidx.core.widget.-$$Lambda$ContentLoadingProgressBar$aW9c", 10, 2),
            Entry::class("androidx.appcompat.app.AppCompatDelegateImpl$Api24Impl", 10, 2),
            Entry::class("com.example.Unknown$Inner", 10, 2),
        ]
        .into();

        let result = ClassMatcher.resolve(&package, &[&lib]);

        assert_eq!(result.owned_count(), 2);
        assert_eq!(
            owner_of(&result, "androidx.core.widget.-$$Lambda$ContentLoadingProgressBar$aW9c"),
            Some("libs/core.aar")
        );
        assert!(result.unresolved.contains("com.example.Unknown$Inner"));

        println!("✅ Lambda and nested classes resolved");
    }

    #[test]
    fn test_nested_class_listed_by_archive_matches_exactly() {
        let outer = create_test_library("libs/outer.jar", vec![Entry::class("a.Outer", 1, 0)]);
        let inner = create_test_library("libs/inner.jar", vec![Entry::class("a.Outer$Inner", 1, 0)]);
        let package: EntrySet = vec![Entry::class("a.Outer$Inner", 1, 1)].into();

        let result = ClassMatcher.resolve(&package, &[&inner, &outer]);

        assert_eq!(owner_of(&result, "a.Outer$Inner"), Some("libs/inner.jar"));
    }
}
