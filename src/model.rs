//! Lockfile domain model
//!
//! Pure data structures for package records and the metadata block. These
//! are inert records: construction happens in the parser (or tests), and
//! regeneration is the job of the external resolver. I/O lives in `parse`
//! and `write`.

use std::collections::BTreeMap;

use crate::constraint::VersionConstraint;
use crate::error::LockResult;
use crate::hash::ArtifactHash;
use crate::version::Version;

/// Normalize a package name for lookups (PEP 503: lowercase, runs of
/// `-`, `_` and `.` collapse to a single `-`).
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_dash = false;
    for ch in name.chars() {
        if matches!(ch, '-' | '_' | '.') {
            if !prev_dash {
                out.push('-');
            }
            prev_dash = true;
        } else {
            out.push(ch.to_ascii_lowercase());
            prev_dash = false;
        }
    }
    out
}

/// Extract the package name from an extras requirement string such as
/// `coverage[toml] (>=5.0.2)`. Returns the name and the parenthesized
/// constraint text, when present.
pub fn split_requirement(requirement: &str) -> (&str, Option<&str>) {
    let requirement = requirement.trim();
    let name_end = requirement
        .find(['[', '(', ' ', ';', '<', '>', '=', '!'])
        .unwrap_or(requirement.len());
    let name = requirement[..name_end].trim();
    let constraint = requirement
        .find('(')
        .and_then(|open| requirement[open + 1..].find(')').map(|close| {
            requirement[open + 1..open + 1 + close].trim()
        }));
    (name, constraint.filter(|c| !c.is_empty()))
}

/// Dependency group a record was locked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Category {
    #[default]
    Main,
    Dev,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Main => "main",
            Category::Dev => "dev",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        if s.eq_ignore_ascii_case("dev") {
            Category::Dev
        } else {
            Category::Main
        }
    }
}

/// One distributable-file record: filename plus integrity hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageFile {
    file: String,
    hash: ArtifactHash,
}

impl PackageFile {
    pub fn new(file: impl Into<String>, hash: impl Into<ArtifactHash>) -> Self {
        Self {
            file: file.into(),
            hash: hash.into(),
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn hash(&self) -> &ArtifactHash {
        &self.hash
    }
}

/// Non-registry origin of a package (git checkout, URL, local path)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSource {
    pub kind: String,
    pub url: String,
    pub reference: Option<String>,
    pub resolved_reference: Option<String>,
}

/// Detailed dependency record: constraint plus environment qualifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpec {
    pub version: String,
    pub markers: Option<String>,
    pub optional: bool,
    pub extras: Vec<String>,
}

impl DependencySpec {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            markers: None,
            optional: false,
            extras: Vec::new(),
        }
    }
}

/// A dependency as declared in a package record
///
/// Either a bare constraint expression, one detailed record, or several
/// detailed records selected by environment markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    Constraint(String),
    Detailed(DependencySpec),
    Multiple(Vec<DependencySpec>),
}

impl Dependency {
    /// Constraint expressions carried by this dependency, in declaration
    /// order
    pub fn constraint_texts(&self) -> Vec<&str> {
        match self {
            Dependency::Constraint(text) => vec![text.as_str()],
            Dependency::Detailed(spec) => vec![spec.version.as_str()],
            Dependency::Multiple(specs) => specs.iter().map(|s| s.version.as_str()).collect(),
        }
    }

    /// True when every alternative is marked optional: the resolver only
    /// locks the target if some extra demands it
    pub fn is_optional(&self) -> bool {
        match self {
            Dependency::Constraint(_) => false,
            Dependency::Detailed(spec) => spec.optional,
            Dependency::Multiple(specs) => specs.iter().all(|s| s.optional),
        }
    }
}

/// One package record of the lockfile
#[derive(Debug, Clone, PartialEq)]
pub struct LockedPackage {
    name: String,
    version: String,
    description: String,
    category: Category,
    optional: bool,
    python_versions: String,
    dependencies: BTreeMap<String, Dependency>,
    extras: BTreeMap<String, Vec<String>>,
    source: Option<PackageSource>,
    files: Vec<PackageFile>,
}

impl LockedPackage {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: String::new(),
            category: Category::Main,
            optional: false,
            python_versions: VersionConstraint::ANY.to_string(),
            dependencies: BTreeMap::new(),
            extras: BTreeMap::new(),
            source: None,
            files: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn with_python_versions(mut self, constraint: impl Into<String>) -> Self {
        self.python_versions = constraint.into();
        self
    }

    pub fn with_dependency(mut self, name: impl Into<String>, dependency: Dependency) -> Self {
        self.dependencies.insert(name.into(), dependency);
        self
    }

    pub fn with_extra(
        mut self,
        name: impl Into<String>,
        requirements: Vec<String>,
    ) -> Self {
        self.extras.insert(name.into(), requirements);
        self
    }

    pub fn with_source(mut self, source: PackageSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_file(mut self, file: PackageFile) -> Self {
        self.files.push(file);
        self
    }

    pub fn with_files(mut self, files: Vec<PackageFile>) -> Self {
        self.files = files;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalized name used for lookups and dependency resolution
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    /// Version string as written in the file
    pub fn version_str(&self) -> &str {
        &self.version
    }

    /// Parsed version
    pub fn version(&self) -> LockResult<Version> {
        Version::parse(&self.version)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn optional(&self) -> bool {
        self.optional
    }

    /// Interpreter constraint string as written in the file
    pub fn python_versions_str(&self) -> &str {
        &self.python_versions
    }

    /// Parsed interpreter constraint
    pub fn python_versions(&self) -> LockResult<VersionConstraint> {
        VersionConstraint::parse(&self.python_versions)
    }

    pub fn dependencies(&self) -> impl Iterator<Item = (&str, &Dependency)> {
        self.dependencies.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn dependency(&self, name: &str) -> Option<&Dependency> {
        let wanted = normalize_name(name);
        self.dependencies
            .iter()
            .find(|(declared, _)| normalize_name(declared) == wanted)
            .map(|(_, dep)| dep)
    }

    pub fn extras(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.extras.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn source(&self) -> Option<&PackageSource> {
        self.source.as_ref()
    }

    pub fn files(&self) -> &[PackageFile] {
        &self.files
    }
}

/// Top-level metadata block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub lock_version: String,
    pub python_versions: String,
    pub content_hash: String,
}

impl Metadata {
    /// Declared format version as (major, minor), when it parses
    pub fn format_version(&self) -> Option<(u64, u64)> {
        let (major, minor) = self.lock_version.split_once('.')?;
        Some((major.parse().ok()?, minor.parse().ok()?))
    }
}

/// The whole lockfile: package records in file order plus metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Lockfile {
    packages: Vec<LockedPackage>,
    metadata: Metadata,
    /// Format 1.1 `[metadata.files]` entries naming no package record
    unclaimed_files: BTreeMap<String, Vec<PackageFile>>,
}

impl Lockfile {
    pub fn new(packages: Vec<LockedPackage>, metadata: Metadata) -> Self {
        Self {
            packages,
            metadata,
            unclaimed_files: BTreeMap::new(),
        }
    }

    pub fn with_unclaimed_files(
        mut self,
        unclaimed: BTreeMap<String, Vec<PackageFile>>,
    ) -> Self {
        self.unclaimed_files = unclaimed;
        self
    }

    /// File-list entries that belong to no package record
    pub fn unclaimed_files(&self) -> impl Iterator<Item = (&str, &[PackageFile])> {
        self.unclaimed_files
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn packages(&self) -> &[LockedPackage] {
        &self.packages
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// First record with the given (normalized) name
    pub fn get(&self, name: &str) -> Option<&LockedPackage> {
        self.records(name).next()
    }

    /// All records with the given (normalized) name; markers can select
    /// between several records of one package
    pub fn records(&self, name: &str) -> impl Iterator<Item = &LockedPackage> {
        let wanted = normalize_name(name);
        self.packages
            .iter()
            .filter(move |p| p.normalized_name() == wanted)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Records that declare a dependency on `name`, with the dependency
    /// entry itself
    pub fn dependents_of(
        &self,
        name: &str,
    ) -> impl Iterator<Item = (&LockedPackage, &Dependency)> {
        let wanted = normalize_name(name);
        self.packages.iter().filter_map(move |package| {
            package
                .dependencies()
                .find(|(declared, _)| normalize_name(declared) == wanted)
                .map(|(_, dep)| (package, dep))
        })
    }
}
