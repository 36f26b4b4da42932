//! Scenario: New Relay Family
//!
//! Journey: An operator with three relays on one host sets up a family.
//!
//! Steps:
//! 1. Generates a family key
//! 2. Previews the rollout with `--dry-run`
//! 3. Deploys the key and FamilyId
//! 4. Checks `status`
//! 5. Adds MyFamily for older tor versions
//!
//! Success Criteria:
//! - Nothing changes before step 3
//! - Every instance ends with the key, FamilyId and a full MyFamily line
//! - `status` reports no warnings at the end

use std::os::unix::fs::PermissionsExt;

use crate::common::*;

/// Stand-in for `tor --keygen-family NAME`
const FAKE_TOR: &str = r#"#!/bin/sh
[ "$1" = "--keygen-family" ] || exit 64
printf 'secret-key-material' > "$2.secret_family_key"
printf '%s\n' 'wweKJrJxUDs1EdtFFHCDtvVgTKftOC/crUl1mYJv830' > "$2.public_family_id"
"#;

/// SCENARIO: from no family to a fully configured one
#[test]
fn scenario_new_family_complete_journey() {
    let env = TestEnv::new();
    for (name, fp) in [("a", FP_A), ("b", FP_B), ("c", FP_C)] {
        env.add_instance(name, RELAY_TORRC);
        env.set_fingerprint(name, &format!("relay{}", name), fp);
    }
    let tor = env.write_file("bin/tor", FAKE_TOR);
    std::fs::set_permissions(&tor, std::fs::Permissions::from_mode(0o755)).unwrap();
    let tor_env = [("RELAYCTL_TOR", arg(&tor))];

    // Step 1: generate
    let keys = env.path("keys");
    let result = env.run_with_env(&["generate", "myfamily", "-o", arg(&keys)], &tor_env);
    assert!(result.is_success(), "{}", result.combined_output());
    assert!(result.stdout.contains(FAMILY_ID), "{}", result.stdout);
    let key = keys.join("myfamily.secret_family_key");
    assert!(key.is_file());

    // Refuses to overwrite
    let again = env.run_with_env(&["generate", "myfamily", "-o", arg(&keys)], &tor_env);
    assert_eq!(again.exit_code, 1, "{}", again.combined_output());

    // Step 2: preview
    let preview = env.run(&["deploy", "--key", arg(&key), "--dry-run"]);
    assert!(preview.is_success(), "{}", preview.combined_output());
    assert!(preview.stdout.contains("planned for 3 instance(s)"), "{}", preview.stdout);
    assert_eq!(env.read_torrc("a"), RELAY_TORRC);

    // Step 3: deploy
    let deploy = env.run(&["deploy", "--key", arg(&key), "--no-reload"]);
    assert!(deploy.is_success(), "{}", deploy.combined_output());

    // Step 4: status flags the missing MyFamily
    let status = env.run(&["status", "--key", arg(&key)]);
    assert!(status.is_success(), "{}", status.combined_output());
    assert!(status.stdout.contains("FamilyId set without MyFamily"), "{}", status.stdout);

    // Step 5: MyFamily
    let myfamily = env.run(&["deploy-myfamily", "--no-reload"]);
    assert!(myfamily.is_success(), "{}", myfamily.combined_output());
    let expected = format!("MyFamily {},{},{}", FP_A, FP_B, FP_C);
    for name in ["a", "b", "c"] {
        let torrc = env.read_torrc(name);
        assert!(torrc.contains(&format!("FamilyId {}", FAMILY_ID)), "{}", torrc);
        assert!(torrc.contains(&expected), "{}", torrc);
        assert!(env.has_key(name, "myfamily.secret_family_key"));
    }

    let status = env.run(&["status", "--key", arg(&key)]);
    assert!(status.is_success(), "{}", status.combined_output());
    assert!(!status.stdout.contains("warning:"), "{}", status.stdout);
}
