//! Property tests for target descriptors.

use proptest::prelude::*;

use relayctl::domain::value_objects::{parse_target_list, Target, TargetOverrides};

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: parsing never panics on arbitrary input.
    #[test]
    fn property_parse_never_panics(s in "(?s).{0,128}") {
        let _ = Target::parse(&s, &TargetOverrides::default());
        let _ = parse_target_list(&s, &TargetOverrides::default());
    }

    /// PROPERTY: a well-formed descriptor keeps its parts, and overrides only fill gaps.
    #[test]
    fn property_descriptor_parts_survive(
        user in "[a-z][a-z0-9_]{0,8}",
        host in "[a-z][a-z0-9-]{0,20}(\\.[a-z]{2,6})?",
        port in 1u16..=u16::MAX,
    ) {
        let overrides = TargetOverrides { user: Some("fallback".into()), port: Some(2200) };

        let full = Target::parse(&format!("{}@{}:{}", user, host, port), &overrides).unwrap().unwrap();
        prop_assert_eq!(full.host(), host.as_str());
        prop_assert_eq!(full.user(), Some(user.as_str()));
        prop_assert_eq!(full.port(), Some(port));

        let bare = Target::parse(&host, &overrides).unwrap().unwrap();
        prop_assert_eq!(bare.user(), Some("fallback"));
        prop_assert_eq!(bare.port(), Some(2200));
    }
}
