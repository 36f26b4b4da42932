//! Property tests for torrc directive edits.

use proptest::prelude::*;

use relayctl::domain::services::mutator::{remove, upsert};
use relayctl::domain::services::{apply_all, directive_values, DirectiveEdit};

fn torrc_line() -> impl Strategy<Value = String> {
    prop_oneof![
        proptest::string::string_regex("[A-Za-z0-9 #%$,.:/_-]{0,40}").unwrap(),
        Just("FamilyId OLD".to_string()),
        Just("  familyid lower".to_string()),
        Just("MyFamily AAAA,BBBB".to_string()),
        Just("%include /etc/tor/torrc.shared".to_string()),
        Just("# FamilyId commented".to_string()),
    ]
}

fn torrc() -> impl Strategy<Value = String> {
    (proptest::collection::vec(torrc_line(), 0..12), any::<bool>()).prop_map(|(lines, trailing)| {
        let mut text = lines.join("\n");
        if trailing && !text.is_empty() {
            text.push('\n');
        }
        text
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: upserting twice is the same as upserting once.
    #[test]
    fn property_upsert_is_idempotent(text in torrc()) {
        let once = upsert(&text, "FamilyId", "FamilyId F1");
        let twice = upsert(&once, "FamilyId", "FamilyId F1");
        prop_assert_eq!(once, twice);
    }

    /// PROPERTY: after an upsert exactly one declaration remains, with the new value.
    #[test]
    fn property_upsert_leaves_one_declaration(text in torrc()) {
        let out = upsert(&text, "FamilyId", "FamilyId F1");
        prop_assert_eq!(directive_values(&out, "FamilyId"), vec!["F1".to_string()]);
    }

    /// PROPERTY: lines not declaring the directive survive an upsert in order.
    #[test]
    fn property_upsert_keeps_other_lines(text in torrc()) {
        let out = upsert(&text, "FamilyId", "FamilyId F1");
        let before: Vec<&str> = text.lines().filter(|l| directive_values(l, "FamilyId").is_empty()).collect();
        let after: Vec<&str> = out.lines().filter(|l| directive_values(l, "FamilyId").is_empty()).collect();
        prop_assert_eq!(before, after);
    }

    /// PROPERTY: remove drops every declaration and is idempotent.
    #[test]
    fn property_remove_clears_and_is_idempotent(text in torrc()) {
        let once = remove(&text, "FamilyId");
        prop_assert!(directive_values(&once, "FamilyId").is_empty());
        prop_assert_eq!(remove(&once, "FamilyId"), once.clone());
    }

    /// PROPERTY: a whole edit set converges after one application.
    #[test]
    fn property_edit_set_converges(text in torrc()) {
        let edits = [
            DirectiveEdit::upsert("FamilyId", "FamilyId F1"),
            DirectiveEdit::upsert("MyFamily", "MyFamily AAAA"),
        ];
        let once = apply_all(&text, &edits);
        prop_assert_eq!(apply_all(&once, &edits), once);
    }
}
