//! Target value object
//!
//! A fleet member reachable through the remote execution channel, parsed from
//! `[user@]host[:port]`.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::error::{RolloutError, RolloutResult};

/// Port `ssh` uses when neither the descriptor, the overrides nor the
/// operator's ssh config name one.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Invocation-wide overrides applied to fields a descriptor leaves unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetOverrides {
    pub user: Option<String>,
    pub port: Option<u16>,
}

/// One remote fleet member.
///
/// Unset `user`/`port` are deliberately left for `ssh` to resolve through the
/// operator's host aliases before the ambient defaults apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    host: String,
    user: Option<String>,
    port: Option<u16>,
}

/// Fully resolved identity of a target: `(host, user, port)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetIdentity {
    pub host: String,
    pub user: String,
    pub port: u16,
}

impl Target {
    /// Build a target directly (host must already be validated)
    pub fn new(host: impl Into<String>, user: Option<String>, port: Option<u16>) -> Self {
        Self {
            host: host.into(),
            user,
            port,
        }
    }

    /// Parse one descriptor line.
    ///
    /// Returns `Ok(None)` for blank lines and comments.
    pub fn parse(descriptor: &str, overrides: &TargetOverrides) -> RolloutResult<Option<Self>> {
        let line = strip_comment(descriptor).trim();
        if line.is_empty() {
            return Ok(None);
        }

        let malformed = |reason: &str| RolloutError::MalformedTarget {
            input: descriptor.trim().to_string(),
            reason: reason.to_string(),
        };

        if line.chars().any(char::is_whitespace) {
            return Err(malformed("unexpected whitespace"));
        }

        let (user, rest) = match line.split_once('@') {
            Some((user, rest)) => {
                if user.is_empty() {
                    return Err(malformed("empty user before '@'"));
                }
                if user.starts_with('-') {
                    return Err(malformed("invalid user"));
                }
                (Some(user.to_string()), rest)
            }
            None => (None, line),
        };

        let (host, port) = split_host_port(rest).map_err(|reason| malformed(&reason))?;

        if host.is_empty() {
            return Err(malformed("missing host"));
        }
        if host.starts_with('-') || host.contains('@') || host.contains('/') {
            return Err(malformed("invalid host"));
        }

        Ok(Some(Self {
            host: host.to_string(),
            user: user.or_else(|| overrides.user.clone()),
            port: port.or(overrides.port),
        }))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Destination argument for `ssh` (`user@host` or `host`)
    pub fn ssh_destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{}@{}", user, self.host),
            None => self.host.clone(),
        }
    }

    /// Identity with ambient defaults filled in
    pub fn identity(&self) -> TargetIdentity {
        TargetIdentity {
            host: self.host.clone(),
            user: self.user.clone().unwrap_or_else(ambient_user),
            port: self.port.unwrap_or(DEFAULT_SSH_PORT),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(user) = &self.user {
            write!(f, "{}@", user)?;
        }
        if self.host.contains(':') {
            write!(f, "[{}]", self.host)?;
        } else {
            write!(f, "{}", self.host)?;
        }
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        Ok(())
    }
}

/// Parse a target list (one descriptor per line).
///
/// Malformed lines are reported with their line number. Targets resolving to
/// the same identity are collapsed, first occurrence wins.
pub fn parse_target_list(content: &str, overrides: &TargetOverrides) -> RolloutResult<Vec<Target>> {
    let mut seen = HashSet::new();
    let mut targets = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let parsed = Target::parse(line, overrides).map_err(|e| match e {
            RolloutError::MalformedTarget { input, reason } => RolloutError::MalformedTarget {
                input,
                reason: format!("{} (line {})", reason, index + 1),
            },
            other => other,
        })?;

        if let Some(target) = parsed {
            if seen.insert(target.identity()) {
                targets.push(target);
            } else {
                tracing::warn!(descriptor = %target, line = index + 1, "duplicate target ignored");
            }
        }
    }

    Ok(targets)
}

/// Read and parse a target list file
pub fn load_target_list(path: &Path, overrides: &TargetOverrides) -> RolloutResult<Vec<Target>> {
    let content = std::fs::read_to_string(path)?;
    parse_target_list(&content, overrides)
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn split_host_port(rest: &str) -> Result<(&str, Option<u16>), String> {
    if let Some(bracketed) = rest.strip_prefix('[') {
        let (host, after) = bracketed
            .split_once(']')
            .ok_or_else(|| "unterminated '['".to_string())?;
        return match after {
            "" => Ok((host, None)),
            _ => match after.strip_prefix(':') {
                Some(port) => Ok((host, Some(parse_port(port)?))),
                None => Err("unexpected text after ']'".to_string()),
            },
        };
    }

    // Bare IPv6 literal: more than one ':' and no brackets means no port
    if rest.matches(':').count() > 1 {
        return Ok((rest, None));
    }

    match rest.split_once(':') {
        Some((host, port)) => Ok((host, Some(parse_port(port)?))),
        None => Ok((rest, None)),
    }
}

fn parse_port(raw: &str) -> Result<u16, String> {
    match raw.parse::<u16>() {
        Ok(0) | Err(_) => Err(format!("invalid port '{}'", raw)),
        Ok(port) => Ok(port),
    }
}

fn ambient_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("LOGNAME"))
        .unwrap_or_else(|_| "root".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> RolloutResult<Option<Target>> {
        Target::parse(s, &TargetOverrides::default())
    }

    #[test]
    fn parses_host_only() {
        let t = parse("relay1.example.net").unwrap().unwrap();
        assert_eq!(t.host(), "relay1.example.net");
        assert_eq!(t.user(), None);
        assert_eq!(t.port(), None);
    }

    #[test]
    fn parses_user_host_port() {
        let t = parse("admin@relay1:2222").unwrap().unwrap();
        assert_eq!(t.user(), Some("admin"));
        assert_eq!(t.host(), "relay1");
        assert_eq!(t.port(), Some(2222));
        assert_eq!(t.ssh_destination(), "admin@relay1");
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        assert!(parse("").unwrap().is_none());
        assert!(parse("   ").unwrap().is_none());
        assert!(parse("# relay1").unwrap().is_none());
    }

    #[test]
    fn trailing_comment_is_stripped() {
        let t = parse("relay1:2200 # primary").unwrap().unwrap();
        assert_eq!(t.port(), Some(2200));
    }

    #[test]
    fn embedded_values_win_over_overrides() {
        let overrides = TargetOverrides {
            user: Some("ops".to_string()),
            port: Some(2022),
        };
        let t = Target::parse("admin@relay1:2222", &overrides).unwrap().unwrap();
        assert_eq!(t.user(), Some("admin"));
        assert_eq!(t.port(), Some(2222));

        let t = Target::parse("relay2", &overrides).unwrap().unwrap();
        assert_eq!(t.user(), Some("ops"));
        assert_eq!(t.port(), Some(2022));
    }

    #[test]
    fn identity_falls_back_to_ambient_defaults() {
        let t = parse("relay1").unwrap().unwrap();
        assert_eq!(t.identity().port, DEFAULT_SSH_PORT);
        assert!(!t.identity().user.is_empty());
    }

    #[test]
    fn missing_host_is_malformed() {
        let err = parse("admin@").unwrap_err();
        assert!(matches!(err, RolloutError::MalformedTarget { .. }));
        let err = parse(":22").unwrap_err();
        assert!(err.to_string().contains("missing host"));
    }

    #[test]
    fn invalid_port_is_malformed() {
        assert!(parse("relay1:0").is_err());
        assert!(parse("relay1:http").is_err());
        assert!(parse("relay1:70000").is_err());
    }

    #[test]
    fn ipv6_literals() {
        let t = parse("[2001:db8::1]:2222").unwrap().unwrap();
        assert_eq!(t.host(), "2001:db8::1");
        assert_eq!(t.port(), Some(2222));
        assert_eq!(t.to_string(), "[2001:db8::1]:2222");

        let t = parse("2001:db8::1").unwrap().unwrap();
        assert_eq!(t.host(), "2001:db8::1");
        assert_eq!(t.port(), None);
    }

    #[test]
    fn option_like_host_is_rejected() {
        assert!(parse("-oProxyCommand=x").is_err());
        assert!(parse("-oProxyCommand=x@relay1").is_err());
    }

    #[test]
    fn list_reports_line_numbers_and_dedups() {
        let content = "# fleet\nrelay1\n\nadmin@relay2:2222\nrelay1\n";
        let targets = parse_target_list(content, &TargetOverrides::default()).unwrap();
        assert_eq!(targets.len(), 2);

        let err = parse_target_list("relay1\nops@\n", &TargetOverrides::default()).unwrap_err();
        assert!(err.to_string().contains("line 2"), "{}", err);
    }
}
