//! Property tests for constraint parsing and matching.

use proptest::prelude::*;

use pylock::{Version, VersionConstraint};

fn release_text() -> impl Strategy<Value = String> {
    proptest::collection::vec(0u64..1000, 1..=4).prop_map(|release| {
        let parts: Vec<String> = release.iter().map(u64::to_string).collect();
        parts.join(".")
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: `VersionConstraint::parse` never panics on arbitrary input.
    #[test]
    fn property_constraint_parse_never_panics(text in "(?s).{0,64}") {
        let _ = VersionConstraint::parse(&text);
    }

    /// PROPERTY: A bare version constraint pins exactly that version.
    #[test]
    fn property_bare_version_is_exact_pin(base in release_text()) {
        let constraint = VersionConstraint::parse(&base).expect("bare version parses");
        let version = Version::parse(&base).expect("version parses");
        prop_assert!(constraint.matches(&version));

        let bumped = format!("{base}.1");
        let bumped = Version::parse(&bumped).expect("bumped version parses");
        prop_assert!(!constraint.matches(&bumped));
    }

    /// PROPERTY: A caret constraint accepts its own base version.
    #[test]
    fn property_caret_accepts_base(base in release_text()) {
        let constraint =
            VersionConstraint::parse(&format!("^{base}")).expect("caret parses");
        let version = Version::parse(&base).expect("version parses");
        prop_assert!(constraint.matches(&version));
    }

    /// PROPERTY: A tilde constraint accepts its own base version.
    #[test]
    fn property_tilde_accepts_base(base in release_text()) {
        let constraint =
            VersionConstraint::parse(&format!("~{base}")).expect("tilde parses");
        let version = Version::parse(&base).expect("version parses");
        prop_assert!(constraint.matches(&version));
    }

    /// PROPERTY: An equality wildcard matches every patch under its prefix.
    #[test]
    fn property_wildcard_matches_prefix(
        major in 0u64..1000,
        minor in 0u64..1000,
        patch in 0u64..1000,
    ) {
        let constraint = VersionConstraint::parse(&format!("=={major}.{minor}.*"))
            .expect("wildcard parses");
        let inside = Version::parse(&format!("{major}.{minor}.{patch}"))
            .expect("version parses");
        prop_assert!(constraint.matches(&inside));

        let outside = Version::parse(&format!("{major}.{}.0", minor + 1))
            .expect("version parses");
        prop_assert!(!constraint.matches(&outside));
    }

    /// PROPERTY: An OR of two pins accepts both alternatives.
    #[test]
    fn property_or_accepts_both_alternatives(a in release_text(), b in release_text()) {
        let constraint = VersionConstraint::parse(&format!("{a} || {b}"))
            .expect("OR constraint parses");
        let a = Version::parse(&a).expect("version parses");
        let b = Version::parse(&b).expect("version parses");
        prop_assert!(constraint.matches(&a));
        prop_assert!(constraint.matches(&b));
    }
}
