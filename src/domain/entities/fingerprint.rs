//! Relay fingerprints, used by the legacy `MyFamily` directive.

use serde::Serialize;

use crate::domain::value_objects::MY_FAMILY_DIRECTIVE;

/// Nickname and RSA identity fingerprint of one relay
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RelayFingerprint {
    pub nickname: String,
    pub fingerprint: String,
}

impl RelayFingerprint {
    /// Parse the `fingerprint` file tor writes into its data directory
    /// (`nickname FINGERPRINT`, the fingerprint optionally space-grouped).
    pub fn parse(content: &str) -> Option<Self> {
        let line = content.lines().find(|l| !l.trim().is_empty())?;
        let mut parts = line.split_whitespace();
        let nickname = parts.next()?.to_string();
        let fingerprint: String = parts.collect::<Vec<_>>().concat().to_ascii_uppercase();

        if fingerprint.len() != 40 || !fingerprint.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        Some(Self {
            nickname,
            fingerprint,
        })
    }
}

/// Build the `MyFamily` line from fingerprints (sorted, deduplicated)
pub fn my_family_line<'a>(fingerprints: impl IntoIterator<Item = &'a RelayFingerprint>) -> Option<String> {
    let mut fps: Vec<&str> = fingerprints
        .into_iter()
        .map(|f| f.fingerprint.as_str())
        .collect();
    fps.sort_unstable();
    fps.dedup();
    if fps.is_empty() {
        return None;
    }
    Some(format!("{} {}", MY_FAMILY_DIRECTIVE, fps.join(",")))
}

/// Fingerprints listed by a `MyFamily` value (`$` prefixes and `~nick` suffixes dropped)
pub fn parse_my_family(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| {
            let s = s.trim_start_matches('$');
            let s = s.split(['~', '=']).next().unwrap_or(s);
            s.to_ascii_uppercase()
        })
        .collect()
}
