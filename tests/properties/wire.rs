//! Property tests for lockfile parsing and canonical serialization.

use std::collections::BTreeSet;

use proptest::prelude::*;

use pylock::{
    normalize_name, parse_str, write_str, LockedPackage, Lockfile, Metadata, PackageFile,
};

fn package_name() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z][a-z0-9-]{0,15}").unwrap()
}

fn version_text() -> impl Strategy<Value = String> {
    proptest::collection::vec(0u64..100, 1..=3).prop_map(|release| {
        let parts: Vec<String> = release.iter().map(u64::to_string).collect();
        parts.join(".")
    })
}

fn metadata() -> Metadata {
    Metadata {
        lock_version: "2.0".to_string(),
        python_versions: ">=3.8,<4.0".to_string(),
        content_hash: "ab".repeat(32),
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 96,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: `parse_str` never panics on arbitrary input.
    #[test]
    fn property_parse_never_panics(content in "(?s).{0,512}") {
        let _ = parse_str(&content);
    }

    /// PROPERTY: `normalize_name` is idempotent.
    #[test]
    fn property_normalize_name_idempotent(name in "[A-Za-z0-9._-]{1,40}") {
        let once = normalize_name(&name);
        prop_assert_eq!(&once, &normalize_name(&once));
    }

    /// PROPERTY: A generated lockfile survives a write/parse round trip, and
    /// the canonical form is a fixpoint of write-then-parse.
    #[test]
    fn property_canonical_form_round_trips(
        entries in proptest::collection::btree_map(package_name(), version_text(), 0..=8),
    ) {
        // One record per normalized name keeps the fixture unambiguous.
        let mut seen = BTreeSet::new();
        let packages: Vec<LockedPackage> = entries
            .iter()
            .filter(|(name, _)| seen.insert(normalize_name(name)))
            .map(|(name, version)| {
                LockedPackage::new(name.clone(), version.clone())
                    .with_python_versions(">=3.8")
                    .with_file(PackageFile::new(
                        format!("{name}-{version}.tar.gz"),
                        format!("sha256:{}", "cd".repeat(32)),
                    ))
            })
            .collect();
        let lockfile = Lockfile::new(packages, metadata());

        let written = write_str(&lockfile);
        let reparsed = parse_str(&written).expect("canonical output parses");

        prop_assert_eq!(reparsed.len(), lockfile.len());
        for package in lockfile.packages() {
            let found = reparsed
                .get(package.name())
                .expect("record survives round trip");
            prop_assert_eq!(found.version_str(), package.version_str());
            prop_assert_eq!(found.files().len(), package.files().len());
        }

        prop_assert_eq!(write_str(&reparsed), written);
    }
}
