// ⚙️ Native Library Matcher - ABI directory + file name
//
// Archives ship shared objects under `/jni/<abi>/`, packages under
// `/lib/<abi>/`. Both sides are reduced to `/<abi>/<file>` so the prefix no
// longer matters while the ABI still does.

use super::CategoryMatcher;
use crate::catalog::Category;

pub struct NativeLibMatcher;

impl CategoryMatcher for NativeLibMatcher {
    fn category(&self) -> Category {
        Category::NativeLib
    }

    fn candidate_alias(&self, key: &str) -> Option<String> {
        Some(abi_relative(key))
    }

    fn fallback_keys(&self, key: &str) -> Vec<String> {
        vec![abi_relative(key)]
    }
}

/// `/lib/armeabi-v7a/libfoo.so` → `/armeabi-v7a/libfoo.so`
fn abi_relative(path: &str) -> String {
    let mut segments = path.rsplit('/');
    let file = segments.next().unwrap_or(path);
    match segments.next() {
        Some(abi) if !abi.is_empty() => format!("/{}/{}", abi, file),
        _ => format!("/{}", file),
    }
}
