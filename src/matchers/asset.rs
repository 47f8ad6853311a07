// 🎨 Asset Matcher - exact path only
//
// Assets are copied into the package untouched, so `/assets/...` keys match
// verbatim or not at all.

use super::CategoryMatcher;
use crate::catalog::Category;

pub struct AssetMatcher;

impl CategoryMatcher for AssetMatcher {
    fn category(&self) -> Category {
        Category::Asset
    }
}
