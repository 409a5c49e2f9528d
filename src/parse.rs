//! Lockfile parsing
//!
//! Deserializes the TOML wire format into the domain model. Both layouts in
//! the wild are accepted: format 1.1 keeps file lists in a trailing
//! `[metadata.files]` table keyed by package name, format 2.x inlines them
//! into each `[[package]]`. Unknown keys are ignored so future format
//! revisions still open.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{LockError, LockResult};
use crate::model::{
    normalize_name, Category, Dependency, DependencySpec, LockedPackage, Lockfile, Metadata,
    PackageFile, PackageSource,
};

#[derive(Debug, Deserialize)]
struct RawLockfile {
    #[serde(default)]
    package: Vec<RawPackage>,
    metadata: Option<RawMetadata>,
}

#[derive(Debug, Deserialize)]
struct RawPackage {
    name: String,
    version: String,
    #[serde(default)]
    description: String,
    category: Option<String>,
    #[serde(default)]
    optional: bool,
    #[serde(rename = "python-versions")]
    python_versions: Option<String>,
    #[serde(default)]
    dependencies: BTreeMap<String, RawDependency>,
    #[serde(default)]
    extras: BTreeMap<String, Vec<String>>,
    source: Option<RawSource>,
    /// Format 2.x only
    #[serde(default)]
    files: Vec<RawFile>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDependency {
    Constraint(String),
    Detailed(RawDependencySpec),
    Multiple(Vec<RawDependencySpec>),
}

#[derive(Debug, Deserialize)]
struct RawDependencySpec {
    /// Absent for git/path dependencies, where the source pins the version
    version: Option<String>,
    markers: Option<String>,
    #[serde(default)]
    optional: bool,
    #[serde(default)]
    extras: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    #[serde(rename = "type")]
    kind: String,
    url: String,
    reference: Option<String>,
    resolved_reference: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFile {
    file: String,
    hash: String,
}

#[derive(Debug, Deserialize)]
struct RawMetadata {
    #[serde(rename = "lock-version")]
    lock_version: String,
    #[serde(rename = "python-versions")]
    python_versions: String,
    #[serde(rename = "content-hash")]
    content_hash: String,
    /// Format 1.1 only
    #[serde(default)]
    files: BTreeMap<String, Vec<RawFile>>,
}

/// Parse a lockfile from a string
pub fn parse_str(content: &str) -> LockResult<Lockfile> {
    parse_str_at(content, Path::new("<string>"))
}

/// Parse a lockfile from disk
pub fn parse_file(path: &Path) -> LockResult<Lockfile> {
    let content = std::fs::read_to_string(path)?;
    parse_str_at(&content, path)
}

fn parse_str_at(content: &str, origin: &Path) -> LockResult<Lockfile> {
    let raw: RawLockfile = toml::from_str(content)?;
    let raw_metadata = raw.metadata.ok_or_else(|| LockError::MissingMetadata {
        file: PathBuf::from(origin),
    })?;

    // Pre-index the trailing files table by normalized name so records claim
    // their entries regardless of spelling. Marker variants of one package
    // share a single file list, so claiming clones rather than takes.
    let mut trailing: BTreeMap<String, (String, Vec<PackageFile>)> = raw_metadata
        .files
        .into_iter()
        .map(|(name, files)| {
            let converted = files.into_iter().map(convert_file).collect();
            (normalize_name(&name), (name, converted))
        })
        .collect();

    let mut packages = Vec::with_capacity(raw.package.len());
    let mut claimed_names = Vec::new();
    for raw_package in raw.package {
        let normalized = normalize_name(&raw_package.name);
        let claimed = trailing.get(&normalized).map(|(_, files)| files.clone());
        if claimed.is_some() {
            claimed_names.push(normalized);
        }
        packages.push(convert_package(raw_package, claimed));
    }
    for name in claimed_names {
        trailing.remove(&name);
    }

    let metadata = Metadata {
        lock_version: raw_metadata.lock_version,
        python_versions: raw_metadata.python_versions,
        content_hash: raw_metadata.content_hash,
    };

    let unclaimed = trailing.into_values().collect();

    Ok(Lockfile::new(packages, metadata).with_unclaimed_files(unclaimed))
}

fn convert_package(raw: RawPackage, trailing_files: Option<Vec<PackageFile>>) -> LockedPackage {
    let mut package = LockedPackage::new(raw.name, raw.version)
        .with_description(raw.description)
        .with_optional(raw.optional)
        .with_python_versions(raw.python_versions.unwrap_or_else(|| "*".to_string()));

    if let Some(category) = raw.category {
        package = package.with_category(Category::from_str_lossy(&category));
    }

    for (name, dependency) in raw.dependencies {
        package = package.with_dependency(name, convert_dependency(dependency));
    }
    for (name, requirements) in raw.extras {
        package = package.with_extra(name, requirements);
    }
    if let Some(source) = raw.source {
        package = package.with_source(PackageSource {
            kind: source.kind,
            url: source.url,
            reference: source.reference,
            resolved_reference: source.resolved_reference,
        });
    }

    // Inline files win; format 1.1 records claim theirs from the trailing
    // table.
    let files = if raw.files.is_empty() {
        trailing_files.unwrap_or_default()
    } else {
        raw.files.into_iter().map(convert_file).collect()
    };
    package.with_files(files)
}

fn convert_dependency(raw: RawDependency) -> Dependency {
    match raw {
        RawDependency::Constraint(text) => Dependency::Constraint(text),
        RawDependency::Detailed(spec) => Dependency::Detailed(convert_spec(spec)),
        RawDependency::Multiple(specs) => {
            Dependency::Multiple(specs.into_iter().map(convert_spec).collect())
        }
    }
}

fn convert_spec(raw: RawDependencySpec) -> DependencySpec {
    DependencySpec {
        version: raw.version.unwrap_or_else(|| "*".to_string()),
        markers: raw.markers,
        optional: raw.optional,
        extras: raw.extras,
    }
}

fn convert_file(raw: RawFile) -> PackageFile {
    PackageFile::new(raw.file, raw.hash)
}
