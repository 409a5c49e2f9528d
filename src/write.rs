//! Canonical lockfile serialization
//!
//! Renders the domain model back to the resolver's TOML layout for the
//! lockfile's declared format version: format 1.x gets the trailing
//! `[metadata.files]` table, format 2.x inlines `files` into each record.
//! Output is deterministic: packages sort by normalized name then version,
//! file lists by filename, so write-then-parse is a fixpoint on canonical input.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use crate::error::LockResult;
use crate::model::{Dependency, DependencySpec, LockedPackage, Lockfile, PackageFile};

/// Render a lockfile to a TOML string
pub fn write_str(lockfile: &Lockfile) -> String {
    let trailing_files = lockfile
        .metadata()
        .format_version()
        .map_or(true, |(major, _)| major < 2);

    let mut ordered: Vec<&LockedPackage> = lockfile.packages().iter().collect();
    ordered.sort_by(|a, b| {
        (a.normalized_name(), a.version_str()).cmp(&(b.normalized_name(), b.version_str()))
    });

    let mut out = String::new();
    for package in &ordered {
        render_package(&mut out, package, trailing_files);
    }

    out.push_str("[metadata]\n");
    render_kv(&mut out, "lock-version", &lockfile.metadata().lock_version);
    render_kv(
        &mut out,
        "python-versions",
        &lockfile.metadata().python_versions,
    );
    render_kv(&mut out, "content-hash", &lockfile.metadata().content_hash);

    if trailing_files {
        out.push_str("\n[metadata.files]\n");
        // Marker variants of one package share a single merged file list
        let mut by_name: BTreeMap<String, Vec<&PackageFile>> = BTreeMap::new();
        for package in &ordered {
            let entry = by_name.entry(package.name().to_string()).or_default();
            for file in package.files() {
                if !entry.iter().any(|known| *known == file) {
                    entry.push(file);
                }
            }
        }
        for (name, files) in lockfile.unclaimed_files() {
            by_name
                .entry(name.to_string())
                .or_insert_with(|| files.iter().collect());
        }
        for (name, files) in by_name {
            render_file_list(&mut out, &name, &files);
        }
    }

    out
}

/// Render a lockfile to disk
pub fn write_file(lockfile: &Lockfile, path: &Path) -> LockResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, write_str(lockfile))?;
    Ok(())
}

fn render_package(out: &mut String, package: &LockedPackage, trailing_files: bool) {
    out.push_str("[[package]]\n");
    render_kv(out, "name", package.name());
    render_kv(out, "version", package.version_str());
    render_kv(out, "description", package.description());
    if trailing_files {
        render_kv(out, "category", package.category().as_str());
    }
    let _ = writeln!(out, "optional = {}", package.optional());
    render_kv(out, "python-versions", package.python_versions_str());

    if !trailing_files {
        render_inline_file_list(out, package.files());
    }

    let dependencies: Vec<_> = package.dependencies().collect();
    if !dependencies.is_empty() {
        out.push_str("\n[package.dependencies]\n");
        for (name, dependency) in dependencies {
            let _ = writeln!(out, "{} = {}", toml_key(name), render_dependency(dependency));
        }
    }

    let extras: Vec<_> = package.extras().collect();
    if !extras.is_empty() {
        out.push_str("\n[package.extras]\n");
        for (name, requirements) in extras {
            let items: Vec<String> = requirements.iter().map(|r| toml_string(r)).collect();
            let _ = writeln!(out, "{} = [{}]", toml_key(name), items.join(", "));
        }
    }

    if let Some(source) = package.source() {
        out.push_str("\n[package.source]\n");
        render_kv(out, "type", &source.kind);
        render_kv(out, "url", &source.url);
        if let Some(reference) = &source.reference {
            render_kv(out, "reference", reference);
        }
        if let Some(resolved) = &source.resolved_reference {
            render_kv(out, "resolved_reference", resolved);
        }
    }

    out.push('\n');
}

fn render_dependency(dependency: &Dependency) -> String {
    match dependency {
        Dependency::Constraint(text) => toml_string(text),
        Dependency::Detailed(spec) => render_spec(spec),
        Dependency::Multiple(specs) => {
            let items: Vec<String> = specs.iter().map(render_spec).collect();
            format!("[{}]", items.join(", "))
        }
    }
}

fn render_spec(spec: &DependencySpec) -> String {
    let mut fields = vec![format!("version = {}", toml_string(&spec.version))];
    if !spec.extras.is_empty() {
        let items: Vec<String> = spec.extras.iter().map(|e| toml_string(e)).collect();
        fields.push(format!("extras = [{}]", items.join(", ")));
    }
    if let Some(markers) = &spec.markers {
        fields.push(format!("markers = {}", toml_string(markers)));
    }
    if spec.optional {
        fields.push("optional = true".to_string());
    }
    format!("{{{}}}", fields.join(", "))
}

fn render_file_list(out: &mut String, name: &str, files: &[&PackageFile]) {
    if files.is_empty() {
        let _ = writeln!(out, "{} = []", toml_key(name));
        return;
    }
    let _ = writeln!(out, "{} = [", toml_key(name));
    for file in sorted_files(files) {
        let _ = writeln!(
            out,
            "    {{file = {}, hash = {}}},",
            toml_string(file.file()),
            toml_string(file.hash().as_str())
        );
    }
    out.push_str("]\n");
}

fn render_inline_file_list(out: &mut String, files: &[PackageFile]) {
    if files.is_empty() {
        out.push_str("files = []\n");
        return;
    }
    let refs: Vec<&PackageFile> = files.iter().collect();
    out.push_str("files = [\n");
    for file in sorted_files(&refs) {
        let _ = writeln!(
            out,
            "    {{file = {}, hash = {}}},",
            toml_string(file.file()),
            toml_string(file.hash().as_str())
        );
    }
    out.push_str("]\n");
}

fn sorted_files<'a>(files: &[&'a PackageFile]) -> Vec<&'a PackageFile> {
    let mut sorted: Vec<&PackageFile> = files.to_vec();
    sorted.sort_by(|a, b| a.file().cmp(b.file()));
    sorted
}

fn render_kv(out: &mut String, key: &str, value: &str) {
    let _ = writeln!(out, "{} = {}", key, toml_string(value));
}

/// Quote a table key unless it is a bare key
fn toml_key(key: &str) -> String {
    let bare = !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if bare {
        key.to_string()
    } else {
        toml_string(key)
    }
}

/// Render a TOML basic string with escapes
fn toml_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
