//! Scenario: Rotating a Family Identifier
//!
//! Journey: An operator replaces the FamilyId of an existing family, then
//! retires the family altogether.
//!
//! Success Criteria:
//! - The new FamilyId replaces the old one in place, never duplicated
//! - Removal restores the original torrc byte for byte

use crate::common::*;

/// SCENARIO: update in place, then remove
#[test]
fn scenario_rotate_then_retire() {
    let env = TestEnv::new();
    let original = "Nickname relay\nFamilyId OLDID\nORPort 9001\n";
    env.add_instance("a", original);
    env.add_instance("b", original);
    let key = env.write_credential("fam", None);

    // An existing FamilyId wins over nothing at all
    let keep = env.run(&["deploy", "--key", arg(&key), "--no-reload"]);
    assert!(keep.is_success(), "{}", keep.combined_output());
    assert!(env.read_torrc("a").contains("FamilyId OLDID"));

    // Explicit rotation
    let rotate = env.run(&[
        "deploy",
        "--key",
        arg(&key),
        "--family-id",
        "NEWID",
        "--no-reload",
    ]);
    assert!(rotate.is_success(), "{}", rotate.combined_output());
    for name in ["a", "b"] {
        assert_eq!(
            env.read_torrc(name),
            "Nickname relay\nFamilyId NEWID\nORPort 9001\n"
        );
    }
    assert!(rotate.stdout.contains("FamilyId NEWID (from --family-id)"), "{}", rotate.stdout);

    // Retire
    let remove = env.run(&["remove", "--purge-key", "--yes", "--no-reload"]);
    assert!(remove.is_success(), "{}", remove.combined_output());
    for name in ["a", "b"] {
        assert_eq!(env.read_torrc(name), "Nickname relay\nORPort 9001\n");
        assert!(!env.has_key(name, "fam.secret_family_key"));
    }
}
