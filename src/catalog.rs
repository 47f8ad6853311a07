// 🗂️ Entry Catalogs - what is inside each archive and each final package
//
// Catalogs are produced upstream by binary parsers (zip/dex readers) and are
// immutable once loaded. Every entry is identified by its key alone: the path
// for files, the fully-qualified name for classes. Two entries with the same
// key and different sizes are the same logical entry.

use crate::archive::{Archive, ArchiveKind};
use crate::size::{ClassContainer, SizeMode};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// CATEGORY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Resource,
    Asset,
    NativeLib,
    Class,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Resource,
        Category::Asset,
        Category::NativeLib,
        Category::Class,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Resource => "resource",
            Category::Asset => "asset",
            Category::NativeLib => "native_lib",
            Category::Class => "class",
            Category::Other => "other",
        }
    }

    /// Categorize a file path the way the package parsers do
    pub fn classify(path: &str) -> Category {
        if path.starts_with("/res/") {
            Category::Resource
        } else if path.to_lowercase().ends_with(".so") {
            Category::NativeLib
        } else if path.starts_with("/assets/") {
            Category::Asset
        } else {
            Category::Other
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ENTRY
// ============================================================================

/// Identity of an entry: path for files, qualified name for classes
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryKey(String);

impl EntryKey {
    pub fn new(key: impl Into<String>) -> Self {
        EntryKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub key: EntryKey,
    pub category: Category,

    /// Uncompressed size in bytes
    pub raw_size: u64,

    /// Measured (files) or apportioned (classes) download size in bytes
    pub download_size: u64,
}

impl Entry {
    pub fn new(key: &str, category: Category, raw_size: u64, download_size: u64) -> Self {
        Entry {
            key: EntryKey::new(key),
            category,
            raw_size,
            download_size,
        }
    }

    /// A file entry, categorized from its path
    pub fn file(path: &str, raw_size: u64, download_size: u64) -> Self {
        Entry::new(path, Category::classify(path), raw_size, download_size)
    }

    pub fn class(name: &str, raw_size: u64, download_size: u64) -> Self {
        Entry::new(name, Category::Class, raw_size, download_size)
    }

    pub fn key(&self) -> &str {
        self.key.as_str()
    }

    pub fn size(&self, mode: SizeMode) -> u64 {
        mode.select(self.raw_size, self.download_size)
    }

    /// Last path segment for files, simple name for classes
    pub fn display_name(&self) -> &str {
        let key = self.key.as_str();
        match self.category {
            Category::Class => key.rsplit('.').next().unwrap_or(key),
            _ => key.rsplit('/').next().unwrap_or(key),
        }
    }
}

// ============================================================================
// ENTRY SET
// ============================================================================

/// Entries unique by key, iterated in key order.
///
/// Inserting a key that is already present keeps the first entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Entry>", into = "Vec<Entry>")]
pub struct EntrySet {
    entries: BTreeMap<EntryKey, Entry>,
}

impl EntrySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the key was already present
    pub fn insert(&mut self, entry: Entry) -> bool {
        match self.entries.entry(entry.key.clone()) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(entry);
                true
            }
            btree_map::Entry::Occupied(_) => false,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(&EntryKey::new(key))
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(&EntryKey::new(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> + '_ {
        self.entries.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &EntryKey> + '_ {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of entry sizes under the given mode
    pub fn total(&self, mode: SizeMode) -> u64 {
        self.entries.values().map(|e| e.size(mode)).sum()
    }

    /// Keep only entries matching the predicate
    pub fn filtered(&self, keep: impl Fn(&Entry) -> bool) -> EntrySet {
        self.iter().filter(|e| keep(e)).cloned().collect()
    }
}

impl FromIterator<Entry> for EntrySet {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        let mut set = EntrySet::new();
        set.extend(iter);
        set
    }
}

impl Extend<Entry> for EntrySet {
    fn extend<I: IntoIterator<Item = Entry>>(&mut self, iter: I) {
        for entry in iter {
            self.insert(entry);
        }
    }
}

impl From<Vec<Entry>> for EntrySet {
    fn from(entries: Vec<Entry>) -> Self {
        entries.into_iter().collect()
    }
}

impl From<EntrySet> for Vec<Entry> {
    fn from(set: EntrySet) -> Self {
        set.entries.into_values().collect()
    }
}

// ============================================================================
// CATEGORIZED ENTRIES
// ============================================================================

/// Five entry sets, one per category
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Entry>", into = "Vec<Entry>")]
pub struct CategorizedEntries {
    pub resources: EntrySet,
    pub assets: EntrySet,
    pub native_libs: EntrySet,
    pub classes: EntrySet,
    pub others: EntrySet,
}

impl CategorizedEntries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, category: Category) -> &EntrySet {
        match category {
            Category::Resource => &self.resources,
            Category::Asset => &self.assets,
            Category::NativeLib => &self.native_libs,
            Category::Class => &self.classes,
            Category::Other => &self.others,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut EntrySet {
        match category {
            Category::Resource => &mut self.resources,
            Category::Asset => &mut self.assets,
            Category::NativeLib => &mut self.native_libs,
            Category::Class => &mut self.classes,
            Category::Other => &mut self.others,
        }
    }

    /// Route an entry to the set of its category
    pub fn insert(&mut self, entry: Entry) -> bool {
        self.get_mut(entry.category).insert(entry)
    }

    pub fn len(&self) -> usize {
        Category::ALL.iter().map(|c| self.get(*c).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> + '_ {
        Category::ALL.into_iter().flat_map(move |c| self.get(c).iter())
    }
}

impl From<Vec<Entry>> for CategorizedEntries {
    fn from(entries: Vec<Entry>) -> Self {
        let mut categorized = CategorizedEntries::new();
        for entry in entries {
            categorized.insert(entry);
        }
        categorized
    }
}

impl From<CategorizedEntries> for Vec<Entry> {
    fn from(categorized: CategorizedEntries) -> Self {
        let CategorizedEntries {
            resources,
            assets,
            native_libs,
            classes,
            others,
        } = categorized;

        [resources, assets, native_libs, classes, others]
            .into_iter()
            .flat_map(Vec::<Entry>::from)
            .collect()
    }
}

// ============================================================================
// ARCHIVE & PACKAGE CATALOGS
// ============================================================================

/// Everything found inside one candidate owning archive
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveCatalog {
    pub archive: Archive,

    #[serde(default)]
    pub entries: CategorizedEntries,
}

impl ArchiveCatalog {
    pub fn new(archive: Archive) -> Self {
        ArchiveCatalog {
            archive,
            entries: CategorizedEntries::new(),
        }
    }

    /// Builder: add one entry
    pub fn with_entry(mut self, entry: Entry) -> Self {
        self.entries.insert(entry);
        self
    }

    pub fn entries(&self, category: Category) -> &EntrySet {
        self.entries.get(category)
    }
}

/// Serialized form of a package: flat entries plus dex containers whose
/// classes still need their download sizes apportioned
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PackageInput {
    name: String,

    #[serde(default)]
    entries: Vec<Entry>,

    #[serde(default)]
    dexes: Vec<ClassContainer>,
}

/// Everything found inside one final package (apk)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "PackageInput", into = "PackageInput")]
pub struct PackageCatalog {
    pub name: String,
    pub entries: CategorizedEntries,
}

impl PackageCatalog {
    pub fn new(name: impl Into<String>) -> Self {
        PackageCatalog {
            name: name.into(),
            entries: CategorizedEntries::new(),
        }
    }

    /// Builder: add one entry
    pub fn with_entry(mut self, entry: Entry) -> Self {
        self.entries.insert(entry);
        self
    }

    /// Builder: add the classes of a dex container, apportioning its
    /// download size across them
    pub fn with_dex(mut self, dex: &ClassContainer) -> Self {
        for class in dex.apportion() {
            self.entries.insert(class);
        }
        self
    }

    pub fn entries(&self, category: Category) -> &EntrySet {
        self.entries.get(category)
    }
}

impl From<PackageInput> for PackageCatalog {
    fn from(input: PackageInput) -> Self {
        let mut package = PackageCatalog::new(input.name);
        for entry in input.entries {
            package.entries.insert(entry);
        }
        for dex in &input.dexes {
            package = package.with_dex(dex);
        }
        package
    }
}

impl From<PackageCatalog> for PackageInput {
    fn from(package: PackageCatalog) -> Self {
        PackageInput {
            name: package.name,
            entries: package.entries.into(),
            dexes: Vec::new(),
        }
    }
}

/// Union of one category across several packages, unique by key
pub fn package_entries(packages: &[PackageCatalog], category: Category) -> EntrySet {
    packages
        .iter()
        .flat_map(|p| p.entries(category).iter().cloned())
        .collect()
}

// ============================================================================
// SCOPE
// ============================================================================

/// Which candidate archives a resolution pass may attribute bytes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Every known library and module
    All,
    Libraries,
    Modules,
}

// ============================================================================
// CATALOG SOURCE
// ============================================================================

/// Producer of catalogs, normally backed by the binary parsers
pub trait CatalogSource {
    fn load_packages(&self) -> Result<Vec<PackageCatalog>>;
    fn load_libraries(&self) -> Result<Vec<ArchiveCatalog>>;
    fn load_modules(&self) -> Result<Vec<ArchiveCatalog>>;
}

/// Pre-parsed catalogs for a whole run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogBundle {
    #[serde(default)]
    pub packages: Vec<PackageCatalog>,

    #[serde(default)]
    pub libraries: Vec<ArchiveCatalog>,

    #[serde(default)]
    pub modules: Vec<ArchiveCatalog>,
}

impl CatalogBundle {
    /// Load a bundle from a JSON file.
    ///
    /// Archive kinds are taken from the section an archive is listed in.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read catalog file: {:?}", path.as_ref()))?;

        let mut bundle: CatalogBundle =
            serde_json::from_str(&content).context("Failed to parse catalog JSON")?;

        for lib in &mut bundle.libraries {
            lib.archive.kind = ArchiveKind::Library;
        }
        for module in &mut bundle.modules {
            module.archive.kind = ArchiveKind::Module;
        }

        tracing::info!(
            packages = bundle.packages.len(),
            libraries = bundle.libraries.len(),
            modules = bundle.modules.len(),
            "Loaded catalog bundle"
        );

        Ok(bundle)
    }
}

impl CatalogSource for CatalogBundle {
    fn load_packages(&self) -> Result<Vec<PackageCatalog>> {
        Ok(self.packages.clone())
    }

    fn load_libraries(&self) -> Result<Vec<ArchiveCatalog>> {
        Ok(self.libraries.clone())
    }

    fn load_modules(&self) -> Result<Vec<ArchiveCatalog>> {
        Ok(self.modules.clone())
    }
}

/// Reads a `CatalogBundle` JSON file on first access. Every group comes from
/// that one parse, even if the file changes afterwards.
pub struct JsonCatalogSource {
    path: PathBuf,
    bundle: OnceCell<CatalogBundle>,
}

impl JsonCatalogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonCatalogSource {
            path: path.into(),
            bundle: OnceCell::new(),
        }
    }

    fn bundle(&self) -> Result<&CatalogBundle> {
        if let Some(bundle) = self.bundle.get() {
            return Ok(bundle);
        }
        let bundle = CatalogBundle::from_file(&self.path)?;
        Ok(self.bundle.get_or_init(|| bundle))
    }
}

impl CatalogSource for JsonCatalogSource {
    fn load_packages(&self) -> Result<Vec<PackageCatalog>> {
        self.bundle()?.load_packages()
    }

    fn load_libraries(&self) -> Result<Vec<ArchiveCatalog>> {
        self.bundle()?.load_libraries()
    }

    fn load_modules(&self) -> Result<Vec<ArchiveCatalog>> {
        self.bundle()?.load_modules()
    }
}

// ============================================================================
// CATALOG STORE
// ============================================================================

/// Loads each catalog group on first access and reuses it for the rest of
/// the run, so several reports can share one parse.
///
/// Not `Sync`: reports over one store run one after another.
pub struct CatalogStore<S: CatalogSource> {
    source: S,
    packages: OnceCell<Vec<PackageCatalog>>,
    libraries: OnceCell<Vec<ArchiveCatalog>>,
    modules: OnceCell<Vec<ArchiveCatalog>>,
}

impl<S: CatalogSource> CatalogStore<S> {
    pub fn new(source: S) -> Self {
        CatalogStore {
            source,
            packages: OnceCell::new(),
            libraries: OnceCell::new(),
            modules: OnceCell::new(),
        }
    }

    pub fn packages(&self) -> Result<&[PackageCatalog]> {
        memoized(&self.packages, || self.source.load_packages())
    }

    pub fn libraries(&self) -> Result<&[ArchiveCatalog]> {
        memoized(&self.libraries, || self.source.load_libraries())
    }

    pub fn modules(&self) -> Result<&[ArchiveCatalog]> {
        memoized(&self.modules, || self.source.load_modules())
    }

    /// Candidate archives for a scope. `All` lists modules before libraries.
    pub fn candidates(&self, scope: Scope) -> Result<Vec<&ArchiveCatalog>> {
        let candidates = match scope {
            Scope::All => self.modules()?.iter().chain(self.libraries()?.iter()).collect(),
            Scope::Libraries => self.libraries()?.iter().collect(),
            Scope::Modules => self.modules()?.iter().collect(),
        };
        Ok(candidates)
    }
}

fn memoized<'a, T>(
    cell: &'a OnceCell<Vec<T>>,
    load: impl FnOnce() -> Result<Vec<T>>,
) -> Result<&'a [T]> {
    if let Some(loaded) = cell.get() {
        return Ok(loaded);
    }
    let loaded = load()?;
    Ok(cell.get_or_init(|| loaded))
}

// ============================================================================
// TESTS
// ============================================================================
