//! pylock CLI - lockfile validator and inspector
//!
//! Usage: pylock <COMMAND>
//!
//! Commands:
//!   check  Validate a lockfile's integrity (CI-friendly exit codes)
//!   show   List locked package records
//!   why    Explain which records require a package
//!   diff   Compare two lockfiles

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

use pylock::check::CheckStatus;
use pylock::model::{Dependency, Lockfile};

/// pylock - parser, validator and inspector for Python dependency lockfiles
#[derive(Parser, Debug)]
#[command(name = "pylock")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output format for CI
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a lockfile's integrity
    Check {
        /// Path to the lockfile
        #[arg(short, long, default_value = "poetry.lock")]
        lockfile: PathBuf,

        /// Fail on warnings too (CI mode)
        #[arg(long)]
        strict_warnings: bool,
    },

    /// List locked package records
    Show {
        /// Path to the lockfile
        #[arg(short, long, default_value = "poetry.lock")]
        lockfile: PathBuf,

        /// Only show records in this category
        #[arg(long, value_parser = ["main", "dev"])]
        category: Option<String>,
    },

    /// Explain which records require a package
    Why {
        /// Package to explain
        package: String,

        /// Path to the lockfile
        #[arg(short, long, default_value = "poetry.lock")]
        lockfile: PathBuf,
    },

    /// Compare two lockfiles
    Diff {
        /// Lockfile before the change
        old: PathBuf,

        /// Lockfile after the change
        new: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            lockfile,
            strict_warnings,
        } => cmd_check(&lockfile, strict_warnings, cli.json),
        Commands::Show { lockfile, category } => cmd_show(&lockfile, category.as_deref(), cli.json),
        Commands::Why { package, lockfile } => cmd_why(&lockfile, &package, cli.json),
        Commands::Diff { old, new } => cmd_diff(&old, &new, cli.json),
    }
}

fn cmd_check(path: &Path, strict_warnings: bool, json: bool) -> Result<()> {
    let lockfile = pylock::parse_file(path)?;
    let report = pylock::run_checks(&lockfile);

    let has_issues = if strict_warnings {
        report.errors() > 0 || report.warnings() > 0
    } else {
        report.errors() > 0
    };

    if json {
        for check in &report.checks {
            let event = serde_json::json!({
                "event": "check",
                "subject": check.subject,
                "name": check.name,
                "status": check.status.as_str(),
                "message": check.message,
                "recommendation": check.recommendation,
            });
            println!("{}", serde_json::to_string(&event)?);
        }
        let summary = serde_json::json!({
            "event": "complete",
            "lockfile": path.display().to_string(),
            "strict_warnings": strict_warnings,
            "passes": report.passes(),
            "warnings": report.warnings(),
            "errors": report.errors(),
            "success": !has_issues,
        });
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        println!("pylock check: {}", path.display());
        println!();

        for check in &report.checks {
            let icon = match check.status {
                CheckStatus::Pass => "✓",
                CheckStatus::Warning => "⚠",
                CheckStatus::Error => "✗",
            };
            println!("{} [{}] {}: {}", icon, check.subject, check.name, check.message);
            if let Some(rec) = &check.recommendation {
                println!("    ↳ {}", rec);
            }
        }

        println!();
        println!(
            "Summary: {} passed, {} warnings, {} errors",
            report.passes(),
            report.warnings(),
            report.errors()
        );
    }

    if has_issues {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_show(path: &Path, category: Option<&str>, json: bool) -> Result<()> {
    let lockfile = pylock::parse_file(path)?;

    let mut packages: Vec<_> = lockfile
        .packages()
        .iter()
        .filter(|p| category.map_or(true, |c| p.category().as_str().eq_ignore_ascii_case(c)))
        .collect();
    packages.sort_by_key(|p| (p.normalized_name(), p.version_str()));

    if json {
        for package in &packages {
            let event = serde_json::json!({
                "event": "package",
                "name": package.name(),
                "version": package.version_str(),
                "category": package.category().as_str(),
                "description": package.description(),
                "python_versions": package.python_versions_str(),
                "files": package.files().len(),
            });
            println!("{}", serde_json::to_string(&event)?);
        }
    } else {
        println!("pylock show: {}", path.display());
        println!();
        for package in &packages {
            println!(
                "{} {} ({}) - {} [{} files]",
                package.name(),
                package.version_str(),
                package.category().as_str(),
                package.description(),
                package.files().len()
            );
        }
        println!();
        println!(
            "{} of {} records shown",
            packages.len(),
            lockfile.len()
        );
    }

    Ok(())
}

fn cmd_why(path: &Path, package: &str, json: bool) -> Result<()> {
    let lockfile = pylock::parse_file(path)?;

    let Some(target) = lockfile.get(package) else {
        anyhow::bail!(pylock::LockError::UnknownPackage {
            name: package.to_string(),
        });
    };

    if !json {
        println!("{} {}", target.name(), target.version_str());
    }

    let mut visited = BTreeSet::new();
    visited.insert(target.normalized_name());
    print_dependents(&lockfile, package, 1, &mut visited, json)?;

    if !json && lockfile.dependents_of(package).next().is_none() {
        println!("  (no locked package requires it; it is a direct project dependency)");
    }

    Ok(())
}

fn print_dependents(
    lockfile: &Lockfile,
    name: &str,
    depth: usize,
    visited: &mut BTreeSet<String>,
    json: bool,
) -> Result<()> {
    // Collect first: dependents_of borrows the name for the iterator's
    // lifetime.
    let dependents: Vec<_> = lockfile
        .dependents_of(name)
        .map(|(p, dep)| (p.name().to_string(), p.version_str().to_string(), constraint_summary(dep)))
        .collect();

    for (dependent, version, constraint) in dependents {
        if json {
            let event = serde_json::json!({
                "event": "dependent",
                "package": name,
                "required_by": dependent,
                "version": version,
                "constraint": constraint,
                "depth": depth,
            });
            println!("{}", serde_json::to_string(&event)?);
        } else {
            println!(
                "{}↳ required by {} {} ({})",
                "  ".repeat(depth),
                dependent,
                version,
                constraint
            );
        }

        let normalized = pylock::normalize_name(&dependent);
        if visited.insert(normalized) {
            print_dependents(lockfile, &dependent, depth + 1, visited, json)?;
        }
    }

    Ok(())
}

fn constraint_summary(dependency: &Dependency) -> String {
    dependency.constraint_texts().join(" | ")
}

fn cmd_diff(old_path: &Path, new_path: &Path, json: bool) -> Result<()> {
    let old = pylock::parse_file(old_path)?;
    let new = pylock::parse_file(new_path)?;
    let diff = pylock::diff(&old, &new);

    if json {
        for entry in &diff.added {
            println!(
                "{}",
                serde_json::to_string(&serde_json::json!({
                    "event": "added", "name": entry.name, "version": entry.version,
                }))?
            );
        }
        for entry in &diff.removed {
            println!(
                "{}",
                serde_json::to_string(&serde_json::json!({
                    "event": "removed", "name": entry.name, "version": entry.version,
                }))?
            );
        }
        for change in &diff.updated {
            println!(
                "{}",
                serde_json::to_string(&serde_json::json!({
                    "event": "updated", "name": change.name,
                    "old": change.old, "new": change.new,
                }))?
            );
        }
        for entry in &diff.republished {
            println!(
                "{}",
                serde_json::to_string(&serde_json::json!({
                    "event": "republished", "name": entry.name, "version": entry.version,
                }))?
            );
        }
        let summary = serde_json::json!({
            "event": "complete",
            "added": diff.added.len(),
            "removed": diff.removed.len(),
            "updated": diff.updated.len(),
            "republished": diff.republished.len(),
        });
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        println!(
            "pylock diff: {} -> {}",
            old_path.display(),
            new_path.display()
        );
        println!();

        if !diff.added.is_empty() {
            println!("Added ({}):", diff.added.len());
            for entry in &diff.added {
                println!("  + {} {}", entry.name, entry.version);
            }
            println!();
        }
        if !diff.removed.is_empty() {
            println!("Removed ({}):", diff.removed.len());
            for entry in &diff.removed {
                println!("  - {} {}", entry.name, entry.version);
            }
            println!();
        }
        if !diff.updated.is_empty() {
            println!("Updated ({}):", diff.updated.len());
            for change in &diff.updated {
                println!("  ~ {} {} -> {}", change.name, change.old, change.new);
            }
            println!();
        }
        if !diff.republished.is_empty() {
            println!("Republished artifacts ({}):", diff.republished.len());
            for entry in &diff.republished {
                println!("  ! {} {} (same version, different hashes)", entry.name, entry.version);
            }
            println!();
        }

        if diff.is_empty() {
            println!("No changes.");
        } else {
            println!(
                "Summary: {} added, {} removed, {} updated, {} republished",
                diff.added.len(),
                diff.removed.len(),
                diff.updated.len(),
                diff.republished.len()
            );
        }
    }

    Ok(())
}
