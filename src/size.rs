// ⚖️ Size Model - raw vs downloadable bytes
//
// One mode is selected per run and every sum in the crate goes through it:
//   Raw          → uncompressed byte count of the entry
//   Downloadable → estimated compressed contribution to the download
//
// Files carry a measured download size from the parser. Classes do not:
// compression applies to the whole dex container, so each class gets a share
// of the container's download size proportional to its raw size.

use crate::catalog::{CategorizedEntries, Category, Entry};
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign};

// ============================================================================
// SIZE MODE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeMode {
    Raw,
    #[default]
    Downloadable,
}

impl SizeMode {
    /// Parse a mode name. Anything unrecognised falls back to downloadable.
    pub fn from_name(value: &str) -> Self {
        match value {
            "raw" => SizeMode::Raw,
            "downloadable" => SizeMode::Downloadable,
            other => {
                tracing::warn!("Unknown size mode '{}', using downloadable", other);
                SizeMode::Downloadable
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SizeMode::Raw => "raw",
            SizeMode::Downloadable => "downloadable",
        }
    }

    /// Pick the size of one entry under this mode
    pub fn select(&self, raw_size: u64, download_size: u64) -> u64 {
        match self {
            SizeMode::Raw => raw_size,
            SizeMode::Downloadable => download_size,
        }
    }
}

// ============================================================================
// CATEGORY SIZES
// ============================================================================

/// Per-category sums plus their total, under one size mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySizes {
    pub resources: u64,
    pub assets: u64,
    pub native_libs: u64,
    pub classes: u64,
    pub others: u64,
    pub total: u64,
}

impl CategorySizes {
    pub fn of(entries: &CategorizedEntries, mode: SizeMode) -> Self {
        CategorySizes::from_parts(
            entries.resources.total(mode),
            entries.assets.total(mode),
            entries.native_libs.total(mode),
            entries.classes.total(mode),
            entries.others.total(mode),
        )
    }

    pub fn from_parts(resources: u64, assets: u64, native_libs: u64, classes: u64, others: u64) -> Self {
        CategorySizes {
            resources,
            assets,
            native_libs,
            classes,
            others,
            total: resources + assets + native_libs + classes + others,
        }
    }

    pub fn get(&self, category: Category) -> u64 {
        match category {
            Category::Resource => self.resources,
            Category::Asset => self.assets,
            Category::NativeLib => self.native_libs,
            Category::Class => self.classes,
            Category::Other => self.others,
        }
    }
}

impl Add for CategorySizes {
    type Output = CategorySizes;

    fn add(self, other: CategorySizes) -> CategorySizes {
        CategorySizes {
            resources: self.resources + other.resources,
            assets: self.assets + other.assets,
            native_libs: self.native_libs + other.native_libs,
            classes: self.classes + other.classes,
            others: self.others + other.others,
            total: self.total + other.total,
        }
    }
}

impl AddAssign for CategorySizes {
    fn add_assign(&mut self, other: CategorySizes) {
        *self = *self + other;
    }
}

impl Sum for CategorySizes {
    fn sum<I: Iterator<Item = CategorySizes>>(iter: I) -> Self {
        iter.fold(CategorySizes::default(), Add::add)
    }
}

impl<'a> Sum<&'a CategorySizes> for CategorySizes {
    fn sum<I: Iterator<Item = &'a CategorySizes>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// ============================================================================
// CLASS CONTAINER (dex)
// ============================================================================

/// A class as listed inside a dex file, before apportioning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainedClass {
    pub name: String,
    pub raw_size: u64,
}

/// A dex file: measured sizes for the whole container plus its classes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassContainer {
    pub name: String,

    /// Uncompressed size of the container file
    pub raw_size: u64,

    /// Measured download size of the container file
    pub download_size: u64,

    pub classes: Vec<ContainedClass>,
}

impl ClassContainer {
    pub fn new(name: impl Into<String>, raw_size: u64, download_size: u64) -> Self {
        ClassContainer {
            name: name.into(),
            raw_size,
            download_size,
            classes: Vec::new(),
        }
    }

    /// Builder: add one class
    pub fn with_class(mut self, name: impl Into<String>, raw_size: u64) -> Self {
        self.classes.push(ContainedClass {
            name: name.into(),
            raw_size,
        });
        self
    }

    /// Sum of the raw sizes of every class in the container
    pub fn class_raw_size(&self) -> u64 {
        self.classes.iter().map(|c| c.raw_size).sum()
    }

    /// Turn the container's classes into class entries with apportioned
    /// download sizes.
    ///
    /// download(class) = raw(class) × download(container) ÷ Σ raw(classes),
    /// truncated. One ratio per container, so per-class values may sum to
    /// slightly less than the container's download size.
    pub fn apportion(&self) -> Vec<Entry> {
        let total_raw = self.class_raw_size();

        self.classes
            .iter()
            .map(|class| {
                let download = apportioned(class.raw_size, self.download_size, total_raw);
                Entry::new(&class.name, Category::Class, class.raw_size, download)
            })
            .collect()
    }
}

/// raw × container_download ÷ total_raw, floored; zero when there is nothing
/// to divide by
fn apportioned(raw: u64, container_download: u64, total_raw: u64) -> u64 {
    if total_raw == 0 {
        return 0;
    }
    let value = raw as u128 * container_download as u128 / total_raw as u128;
    value as u64
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_name() {
        assert_eq!(SizeMode::from_name("raw"), SizeMode::Raw);
        assert_eq!(SizeMode::from_name("downloadable"), SizeMode::Downloadable);
        assert_eq!(SizeMode::from_name("compressed"), SizeMode::Downloadable);
        assert_eq!(SizeMode::default(), SizeMode::Downloadable);
    }

    #[test]
    fn test_select() {
        assert_eq!(SizeMode::Raw.select(300, 100), 300);
        assert_eq!(SizeMode::Downloadable.select(300, 100), 100);
    }

    #[test]
    fn test_category_sizes_sum() {
        let a = CategorySizes::from_parts(1, 2, 3, 4, 5);
        let b = CategorySizes::from_parts(10, 0, 0, 0, 20);

        let sum: CategorySizes = [a, b].iter().sum();

        assert_eq!(sum.total, 45);
        assert_eq!(sum.get(Category::Other), 25);
        assert_eq!(sum, a + b);
    }

    #[test]
    fn test_apportion_uses_one_ratio_per_container() {
        // ratio = 50 / 200 = 0.25
        let dex = ClassContainer::new("classes.dex", 400, 50)
            .with_class("com.example.A", 100)
            .with_class("com.example.B", 60)
            .with_class("com.example.C", 40);

        let classes = dex.apportion();
        let downloads: Vec<u64> = classes.iter().map(|c| c.download_size).collect();

        assert_eq!(downloads, vec![25, 15, 10]);
        assert_eq!(classes[0].raw_size, 100);
        assert_eq!(classes[0].category, Category::Class);
    }

    #[test]
    fn test_apportion_truncates() {
        // ratio = 52 / 230, per-class values floor and lose a couple of bytes
        let dex = ClassContainer::new("classes.dex", 230, 52)
            .with_class("a.A", 20)
            .with_class("a.B", 30)
            .with_class("a.C", 40)
            .with_class("a.D", 60)
            .with_class("a.E", 80);

        let downloads: Vec<u64> = dex.apportion().iter().map(|c| c.download_size).collect();
        assert_eq!(downloads, vec![4, 6, 9, 13, 18]);

        let total: u64 = downloads.iter().sum();
        assert!(total <= 52);
    }

    #[test]
    fn test_apportion_empty_container() {
        let dex = ClassContainer::new("classes2.dex", 0, 80).with_class("a.Empty", 0);
        assert_eq!(dex.apportion()[0].download_size, 0);
    }
}
