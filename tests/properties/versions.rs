//! Property tests for version parsing and ordering.

use std::cmp::Ordering;

use proptest::prelude::*;

use pylock::Version;

/// A syntactically valid version string built from generated components.
fn version_text() -> impl Strategy<Value = String> {
    (
        0u64..3,
        proptest::collection::vec(0u64..1000, 1..=4),
        proptest::option::of((prop_oneof![Just("a"), Just("b"), Just("rc")], 0u64..50)),
        proptest::option::of(0u64..50),
        proptest::option::of(0u64..50),
    )
        .prop_map(|(epoch, release, pre, post, dev)| {
            let mut text = String::new();
            if epoch > 0 {
                text.push_str(&format!("{epoch}!"));
            }
            let release: Vec<String> = release.iter().map(u64::to_string).collect();
            text.push_str(&release.join("."));
            if let Some((kind, n)) = pre {
                text.push_str(&format!("{kind}{n}"));
            }
            if let Some(n) = post {
                text.push_str(&format!(".post{n}"));
            }
            if let Some(n) = dev {
                text.push_str(&format!(".dev{n}"));
            }
            text
        })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: `Version::parse` never panics on arbitrary input.
    #[test]
    fn property_version_parse_never_panics(text in "(?s).{0,64}") {
        let _ = Version::parse(&text);
    }

    /// PROPERTY: A constructed version string parses, and its canonical
    /// display reparses to an equal version with a stable display.
    #[test]
    fn property_canonical_display_reparses(text in version_text()) {
        let version = Version::parse(&text).expect("constructed version parses");
        let canonical = version.to_string();
        let reparsed = Version::parse(&canonical)
            .expect("canonical display parses");
        prop_assert_eq!(&version, &reparsed);
        prop_assert_eq!(canonical, reparsed.to_string());
    }

    /// PROPERTY: Trailing zero release segments do not affect equality.
    #[test]
    fn property_trailing_zeros_are_insignificant(
        release in proptest::collection::vec(0u64..1000, 1..=3),
        zeros in 1usize..=3,
    ) {
        let short: Vec<String> = release.iter().map(u64::to_string).collect();
        let mut long = short.clone();
        long.extend(std::iter::repeat("0".to_string()).take(zeros));

        let a = Version::parse(&short.join(".")).expect("short version parses");
        let b = Version::parse(&long.join(".")).expect("padded version parses");
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.cmp(&b), Ordering::Equal);
    }

    /// PROPERTY: Ordering is antisymmetric across arbitrary version pairs.
    #[test]
    fn property_ordering_is_antisymmetric(a in version_text(), b in version_text()) {
        let a = Version::parse(&a).expect("version parses");
        let b = Version::parse(&b).expect("version parses");
        prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
    }

    /// PROPERTY: A dev release sorts before its final release.
    #[test]
    fn property_dev_precedes_final(
        release in proptest::collection::vec(0u64..1000, 1..=4),
        dev in 0u64..50,
    ) {
        let base: Vec<String> = release.iter().map(u64::to_string).collect();
        let base = base.join(".");
        let dev = Version::parse(&format!("{base}.dev{dev}")).expect("dev version parses");
        let fin = Version::parse(&base).expect("final version parses");
        prop_assert!(dev < fin);
    }
}
