//! Test fixtures - reusable content constants for tests.

/// A plain relay torrc without any family configuration
pub const RELAY_TORRC: &str = "Nickname relay\nORPort 9001\nContactInfo ops@example.org\n";

/// Family identifier used by most tests
pub const FAMILY_ID: &str = "wweKJrJxUDs1EdtFFHCDtvVgTKftOC/crUl1mYJv830";

pub const FP_A: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
pub const FP_B: &str = "BBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB";
pub const FP_C: &str = "CCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCC";

/// torrc for an instance that includes `shared`
pub fn including(shared: &std::path::Path) -> String {
    format!("Nickname relay\n%include {}\n", shared.display())
}
