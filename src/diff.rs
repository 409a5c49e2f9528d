//! Lockfile comparison
//!
//! Compares two lockfiles package-by-package: additions, removals, version
//! updates, and records whose pinned artifact hashes changed without a
//! version change. The latter means the index republished an artifact and
//! deserves a closer look.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{Lockfile, PackageFile};

/// A package present on only one side of the comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    pub name: String,
    pub version: String,
}

/// A package whose resolved version changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionChange {
    pub name: String,
    pub old: String,
    pub new: String,
}

/// Result of comparing two lockfiles
#[derive(Debug, Clone, Default)]
pub struct LockfileDiff {
    pub added: Vec<DiffEntry>,
    pub removed: Vec<DiffEntry>,
    pub updated: Vec<VersionChange>,
    /// Same version on both sides, different file hashes
    pub republished: Vec<DiffEntry>,
}

impl LockfileDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.updated.is_empty()
            && self.republished.is_empty()
    }
}

/// Versions of every record grouped by normalized name
fn versions_by_name(lockfile: &Lockfile) -> BTreeMap<String, Vec<String>> {
    let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for package in lockfile.packages() {
        map.entry(package.normalized_name())
            .or_default()
            .push(package.version_str().to_string());
    }
    for versions in map.values_mut() {
        versions.sort();
    }
    map
}

fn hash_set(files: &[PackageFile]) -> BTreeSet<&str> {
    files.iter().map(|f| f.hash().as_str()).collect()
}

/// Compare two lockfiles
pub fn diff(old: &Lockfile, new: &Lockfile) -> LockfileDiff {
    let old_versions = versions_by_name(old);
    let new_versions = versions_by_name(new);
    let mut result = LockfileDiff::default();

    for (name, versions) in &old_versions {
        match new_versions.get(name) {
            None => result.removed.push(DiffEntry {
                name: name.clone(),
                version: versions.join(", "),
            }),
            Some(new_versions) if new_versions != versions => {
                result.updated.push(VersionChange {
                    name: name.clone(),
                    old: versions.join(", "),
                    new: new_versions.join(", "),
                });
            }
            Some(_) => {
                // Same versions; flag artifact churn
                for old_record in old.records(name) {
                    let changed = new
                        .records(name)
                        .find(|r| r.version_str() == old_record.version_str())
                        .map(|new_record| {
                            hash_set(new_record.files()) != hash_set(old_record.files())
                        })
                        .unwrap_or(false);
                    if changed {
                        result.republished.push(DiffEntry {
                            name: name.clone(),
                            version: old_record.version_str().to_string(),
                        });
                    }
                }
            }
        }
    }

    for (name, versions) in &new_versions {
        if !old_versions.contains_key(name) {
            result.added.push(DiffEntry {
                name: name.clone(),
                version: versions.join(", "),
            });
        }
    }

    result
}
