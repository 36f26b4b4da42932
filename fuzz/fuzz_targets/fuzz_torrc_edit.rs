#![no_main]

use libfuzzer_sys::fuzz_target;
use relayctl::domain::services::mutator::{remove, upsert};
use relayctl::domain::services::directive_values;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        let once = upsert(content, "FamilyId", "FamilyId F1");
        assert_eq!(upsert(&once, "FamilyId", "FamilyId F1"), once);
        assert_eq!(directive_values(&once, "FamilyId"), vec!["F1".to_string()]);

        let removed = remove(content, "FamilyId");
        assert!(directive_values(&removed, "FamilyId").is_empty());
    }
});
