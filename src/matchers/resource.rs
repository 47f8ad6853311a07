// 🖼️ Resource Matcher - exact path, then packaging rewrites undone
//
// Fallbacks, tried in order after the exact path:
//   1. `$` markers removed along with the `__<n>` suffix before the extension
//      /res/drawable/$bg_error__0.xml → /res/drawable/bg_error.xml
//   2. `-vNN` api-level qualifier dropped from the directory
//      /res/drawable-v22/ic_pin.xml  → /res/drawable/ic_pin.xml
//   3. both of the above

use super::CategoryMatcher;
use crate::catalog::Category;

pub struct ResourceMatcher;

impl CategoryMatcher for ResourceMatcher {
    fn category(&self) -> Category {
        Category::Resource
    }

    fn fallback_keys(&self, key: &str) -> Vec<String> {
        let unmarked = without_special_chars(key);
        let unversioned = without_version_qualifier(key);
        let both = unmarked.as_deref().and_then(without_version_qualifier);

        [unmarked, unversioned, both].into_iter().flatten().collect()
    }
}

/// Undo the rename applied to duplicated resources
fn without_special_chars(path: &str) -> Option<String> {
    if !path.contains('$') {
        return None;
    }

    let mut cleaned = path.replace('$', "");
    if let (Some(marker), Some(dot)) = (cleaned.rfind("__"), cleaned.rfind('.')) {
        if marker < dot {
            cleaned.replace_range(marker..dot, "");
        }
    }
    Some(cleaned)
}

/// Drop a trailing `-vNN` from the directory holding the file
fn without_version_qualifier(path: &str) -> Option<String> {
    let (dir, file) = path.rsplit_once('/')?;
    let (parent, dir_name) = match dir.rsplit_once('/') {
        Some((parent, name)) => (Some(parent), name),
        None => (None, dir),
    };

    let stripped = strip_version_suffix(dir_name)?;
    Some(match parent {
        Some(parent) => format!("{}/{}/{}", parent, stripped, file),
        None => format!("{}/{}", stripped, file),
    })
}

fn strip_version_suffix(dir_name: &str) -> Option<&str> {
    let bytes = dir_name.as_bytes();
    let len = bytes.len();
    if len < 4 {
        return None;
    }

    let is_qualifier = bytes[len - 4] == b'-'
        && bytes[len - 3] == b'v'
        && bytes[len - 2].is_ascii_digit()
        && bytes[len - 1].is_ascii_digit();

    if is_qualifier {
        Some(&dir_name[..len - 4])
    } else {
        None
    }
}

// ============================================================================
// TESTS
// ============================================================================
