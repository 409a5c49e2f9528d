//! Lockfile integrity checks
//!
//! Runs the data-integrity catalog over a parsed lockfile and produces a
//! structured report: every declared dependency resolves to a package record
//! in the same file, every hash is a well-formed hex digest, declared
//! constraints are satisfied by the resolved versions, and the metadata
//! block is coherent.

use std::collections::BTreeMap;

use crate::constraint::VersionConstraint;
use crate::hash::is_well_formed_content_hash;
use crate::model::{split_requirement, Lockfile};
use crate::version::Version;

/// Lockfile format versions the checker understands
const SUPPORTED_FORMATS: &[(u64, u64)] = &[(1, 1), (2, 0), (2, 1)];

/// Outcome of a single check item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warning,
    Error,
}

impl CheckStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckStatus::Pass => "pass",
            CheckStatus::Warning => "warning",
            CheckStatus::Error => "error",
        }
    }
}

/// One check result
#[derive(Debug, Clone)]
pub struct IntegrityCheck {
    /// What was checked: a package name, or "metadata" / "lockfile"
    pub subject: String,
    /// Check identifier, e.g. "dependency-resolves"
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub recommendation: Option<String>,
}

/// Integrity report for one lockfile
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    pub checks: Vec<IntegrityCheck>,
}

impl CheckReport {
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    pub fn passes(&self) -> usize {
        self.count(CheckStatus::Pass)
    }

    pub fn warnings(&self) -> usize {
        self.count(CheckStatus::Warning)
    }

    pub fn errors(&self) -> usize {
        self.count(CheckStatus::Error)
    }

    pub fn is_success(&self) -> bool {
        self.errors() == 0
    }

    fn count(&self, status: CheckStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }

    fn add(
        &mut self,
        subject: &str,
        name: &str,
        status: CheckStatus,
        message: String,
        recommendation: Option<&str>,
    ) {
        self.checks.push(IntegrityCheck {
            subject: subject.to_string(),
            name: name.to_string(),
            status,
            message,
            recommendation: recommendation.map(String::from),
        });
    }

    fn add_pass(&mut self, subject: &str, name: &str, message: impl Into<String>) {
        self.add(subject, name, CheckStatus::Pass, message.into(), None);
    }

    fn add_warning(
        &mut self,
        subject: &str,
        name: &str,
        message: impl Into<String>,
        recommendation: Option<&str>,
    ) {
        self.add(
            subject,
            name,
            CheckStatus::Warning,
            message.into(),
            recommendation,
        );
    }

    fn add_error(
        &mut self,
        subject: &str,
        name: &str,
        message: impl Into<String>,
        recommendation: Option<&str>,
    ) {
        self.add(
            subject,
            name,
            CheckStatus::Error,
            message.into(),
            recommendation,
        );
    }
}

/// Run the full integrity catalog
pub fn run_checks(lockfile: &Lockfile) -> CheckReport {
    let mut report = CheckReport::new();
    check_metadata(lockfile, &mut report);
    check_duplicates(lockfile, &mut report);
    check_records(lockfile, &mut report);
    check_dependencies(lockfile, &mut report);
    check_extras(lockfile, &mut report);
    check_file_ownership(lockfile, &mut report);
    report
}

fn check_metadata(lockfile: &Lockfile, report: &mut CheckReport) {
    let metadata = lockfile.metadata();

    match metadata.format_version() {
        Some(version) if SUPPORTED_FORMATS.contains(&version) => {
            report.add_pass(
                "metadata",
                "lock-version",
                format!("lockfile format {} is supported", metadata.lock_version),
            );
        }
        _ => report.add_error(
            "metadata",
            "lock-version",
            format!("unsupported lockfile format '{}'", metadata.lock_version),
            Some("regenerate the lockfile with a supported resolver version"),
        ),
    }

    if is_well_formed_content_hash(&metadata.content_hash) {
        report.add_pass("metadata", "content-hash", "content hash is well-formed");
    } else {
        report.add_error(
            "metadata",
            "content-hash",
            format!("content hash '{}' is not a hex digest", metadata.content_hash),
            Some("regenerate the lockfile; the metadata block is corrupt"),
        );
    }

    match VersionConstraint::parse(&metadata.python_versions) {
        Ok(_) => report.add_pass(
            "metadata",
            "python-versions",
            "interpreter constraint parses",
        ),
        Err(_) => report.add_error(
            "metadata",
            "python-versions",
            format!(
                "interpreter constraint '{}' does not parse",
                metadata.python_versions
            ),
            None,
        ),
    }
}

fn check_duplicates(lockfile: &Lockfile, report: &mut CheckReport) {
    let mut seen: BTreeMap<(String, &str), usize> = BTreeMap::new();
    for package in lockfile.packages() {
        *seen
            .entry((package.normalized_name(), package.version_str()))
            .or_default() += 1;
    }

    let mut clean = true;
    for ((name, version), count) in seen {
        if count > 1 {
            clean = false;
            report.add_error(
                &name,
                "duplicate-record",
                format!("{count} records for {name} {version}"),
                Some("a package may repeat only with distinct versions selected by markers"),
            );
        }
    }
    if clean {
        report.add_pass("lockfile", "duplicate-record", "no duplicate package records");
    }
}

fn check_records(lockfile: &Lockfile, report: &mut CheckReport) {
    let mut versions_ok = true;
    let mut constraints_ok = true;
    let mut hashes_ok = true;

    for package in lockfile.packages() {
        let name = package.name();

        if package.version().is_err() {
            versions_ok = false;
            report.add_error(
                name,
                "version",
                format!("version '{}' does not parse", package.version_str()),
                None,
            );
        }

        if package.python_versions().is_err() {
            constraints_ok = false;
            report.add_error(
                name,
                "python-versions",
                format!(
                    "interpreter constraint '{}' does not parse",
                    package.python_versions_str()
                ),
                None,
            );
        }

        if package.files().is_empty() {
            report.add_warning(
                name,
                "files",
                "no distributable files recorded",
                Some("regenerate the lockfile so installs can verify artifacts"),
            );
        }
        for file in package.files() {
            if !file.hash().is_well_formed() {
                hashes_ok = false;
                report.add_error(
                    name,
                    "file-hash",
                    format!("file '{}' has malformed hash '{}'", file.file(), file.hash()),
                    None,
                );
            }
        }
    }

    let total = lockfile.len();
    if versions_ok {
        report.add_pass("lockfile", "version", format!("all {total} versions parse"));
    }
    if constraints_ok {
        report.add_pass(
            "lockfile",
            "python-versions",
            "all interpreter constraints parse",
        );
    }
    if hashes_ok {
        report.add_pass("lockfile", "file-hash", "all file hashes are well-formed");
    }
}

fn check_dependencies(lockfile: &Lockfile, report: &mut CheckReport) {
    let mut clean = true;

    for package in lockfile.packages() {
        for (dep_name, dependency) in package.dependencies() {
            let targets: Vec<_> = lockfile.records(dep_name).collect();

            if targets.is_empty() {
                // Optional dependencies are only locked when an extra
                // demands them.
                if !dependency.is_optional() {
                    clean = false;
                    report.add_error(
                        package.name(),
                        "dependency-resolves",
                        format!("depends on '{dep_name}' which has no package record"),
                        Some("the lockfile is incomplete; regenerate it"),
                    );
                }
                continue;
            }

            let locked: Vec<Version> = targets
                .iter()
                .filter_map(|t| t.version().ok())
                .collect();

            for text in dependency.constraint_texts() {
                match VersionConstraint::parse(text) {
                    Err(_) => {
                        clean = false;
                        report.add_warning(
                            package.name(),
                            "dependency-constraint",
                            format!("constraint '{text}' on '{dep_name}' does not parse"),
                            None,
                        );
                    }
                    Ok(constraint) => {
                        if !locked.is_empty() && !locked.iter().any(|v| constraint.matches(v)) {
                            clean = false;
                            report.add_error(
                                package.name(),
                                "dependency-constraint",
                                format!(
                                    "no locked version of '{dep_name}' satisfies '{text}'"
                                ),
                                Some("the resolution is stale; regenerate the lockfile"),
                            );
                        }
                    }
                }
            }
        }
    }

    if clean {
        report.add_pass(
            "lockfile",
            "dependency-resolves",
            "every dependency resolves to a satisfying package record",
        );
    }
}

fn check_extras(lockfile: &Lockfile, report: &mut CheckReport) {
    let mut clean = true;
    for package in lockfile.packages() {
        for (extra, requirements) in package.extras() {
            for requirement in requirements {
                let (name, _) = split_requirement(requirement);
                if name.is_empty() || lockfile.contains(name) {
                    continue;
                }
                clean = false;
                report.add_warning(
                    package.name(),
                    "extra-resolves",
                    format!("extra '{extra}' references '{name}' which is not locked"),
                    Some("extras are only locked when requested; this may be expected"),
                );
            }
        }
    }
    if clean {
        report.add_pass(
            "lockfile",
            "extra-resolves",
            "all extras reference locked packages",
        );
    }
}

fn check_file_ownership(lockfile: &Lockfile, report: &mut CheckReport) {
    let mut clean = true;
    for (name, files) in lockfile.unclaimed_files() {
        clean = false;
        report.add_error(
            name,
            "file-ownership",
            format!(
                "file list with {} entries references no package record",
                files.len()
            ),
            Some("remove the stale entry or restore the package record"),
        );
    }
    if clean {
        report.add_pass(
            "lockfile",
            "file-ownership",
            "every file list belongs to a package record",
        );
    }
}
