// 📄 Other Matcher - exact path only
//
// Everything that is not a resource, asset, native lib or class: metadata
// properties, kotlin builtins, META-INF files.

use super::CategoryMatcher;
use crate::catalog::Category;

pub struct OtherMatcher;

impl CategoryMatcher for OtherMatcher {
    fn category(&self) -> Category {
        Category::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Entry, EntrySet};
    use crate::matchers::tests::{create_test_library, owner_of};

    #[test]
    fn test_properties_file_matches_exactly() {
        let lib = create_test_library(
            "libs/play-services-basement.aar",
            vec![Entry::file("/play-services-basement.properties", 20, 10)],
        );
        let package: EntrySet = vec![
            Entry::file("/play-services-basement.properties", 20, 10),
            Entry::file("/META-INF/com/other.properties", 20, 10),
        ]
        .into();

        let result = OtherMatcher.resolve(&package, &[&lib]);

        assert_eq!(
            owner_of(&result, "/play-services-basement.properties"),
            Some("libs/play-services-basement.aar")
        );
        assert_eq!(result.unresolved.len(), 1);
    }
}
