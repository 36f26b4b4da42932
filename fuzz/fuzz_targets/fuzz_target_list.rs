#![no_main]

use libfuzzer_sys::fuzz_target;
use relayctl::domain::value_objects::{parse_target_list, TargetOverrides};

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        if let Ok(targets) = parse_target_list(content, &TargetOverrides::default()) {
            // Every accepted target must render a usable ssh destination
            for target in targets {
                assert!(!target.host().is_empty());
                assert!(!target.ssh_destination().starts_with('-'));
            }
        }
    }
});
