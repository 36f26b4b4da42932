//! Idempotent directive mutation
//!
//! The single primitive every rollout operation uses to change a torrc-style
//! file. Directives are matched on the first whitespace-separated token of a
//! line, case-insensitively (tor option names are case-insensitive), so
//! commented-out lines (`#FamilyId ...`) never match.

/// Anchor before which new directives are inserted
pub const INCLUDE_KEYWORD: &str = "%include";

/// One edit applied through [`upsert`] or [`remove`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveEdit {
    Upsert { name: String, line: String },
    Remove { name: String },
}

impl DirectiveEdit {
    pub fn upsert(name: &str, line: impl Into<String>) -> Self {
        Self::Upsert {
            name: name.to_string(),
            line: line.into(),
        }
    }

    pub fn remove(name: &str) -> Self {
        Self::Remove {
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Upsert { name, .. } | Self::Remove { name } => name,
        }
    }

    pub fn apply(&self, text: &str) -> String {
        match self {
            Self::Upsert { name, line } => upsert(text, name, line),
            Self::Remove { name } => remove(text, name),
        }
    }
}

/// Apply edits in order
pub fn apply_all(text: &str, edits: &[DirectiveEdit]) -> String {
    edits
        .iter()
        .fold(text.to_string(), |acc, edit| edit.apply(&acc))
}

/// Set `name` to exactly `line`.
///
/// Replaces the first matching line in place and drops later duplicates; with
/// no match, inserts before the first `%include` line, else appends.
pub fn upsert(text: &str, name: &str, line: &str) -> String {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let mut out = String::with_capacity(text.len() + line.len() + 1);

    if lines.iter().any(|l| is_directive(l, name)) {
        let mut replaced = false;
        for l in &lines {
            if is_directive(l, name) {
                if !replaced {
                    out.push_str(line);
                    out.push_str(line_ending(l));
                    replaced = true;
                }
            } else {
                out.push_str(l);
            }
        }
        return out;
    }

    if let Some(anchor) = lines.iter().position(|l| is_directive(l, INCLUDE_KEYWORD)) {
        for (idx, l) in lines.iter().enumerate() {
            if idx == anchor {
                out.push_str(line);
                out.push_str(match line_ending(l) {
                    "" => "\n",
                    ending => ending,
                });
            }
            out.push_str(l);
        }
        return out;
    }

    out.push_str(text);
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(line);
    out.push('\n');
    out
}

/// Delete every line declaring `name`
pub fn remove(text: &str, name: &str) -> String {
    text.split_inclusive('\n')
        .filter(|l| !is_directive(l, name))
        .collect()
}

/// Values of every line declaring `name`, in file order
pub fn directive_values(text: &str, name: &str) -> Vec<String> {
    text.lines()
        .filter(|l| is_directive(l, name))
        .map(|l| {
            let trimmed = l.trim_start();
            trimmed[first_token(trimmed).len()..].trim().to_string()
        })
        .collect()
}

fn is_directive(line: &str, name: &str) -> bool {
    first_token(line.trim_start()).eq_ignore_ascii_case(name)
}

fn first_token(line: &str) -> &str {
    line.split_whitespace().next().unwrap_or("")
}

fn line_ending(line: &str) -> &'static str {
    if line.ends_with("\r\n") {
        "\r\n"
    } else if line.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_replaces_in_place() {
        let text = "Nickname relay1\nFamilyId OLD\nORPort 9001\n";
        let out = upsert(text, "FamilyId", "FamilyId NEW");
        assert_eq!(out, "Nickname relay1\nFamilyId NEW\nORPort 9001\n");
    }

    #[test]
    fn upsert_drops_later_duplicates() {
        let text = "FamilyId A\nORPort 9001\nfamilyid B\n";
        let out = upsert(text, "FamilyId", "FamilyId C");
        assert_eq!(out, "FamilyId C\nORPort 9001\n");
    }

    #[test]
    fn upsert_inserts_before_include() {
        let text = "Nickname relay1\n%include /etc/tor/torrc.shared\n";
        let out = upsert(text, "FamilyId", "FamilyId F1");
        assert_eq!(
            out,
            "Nickname relay1\nFamilyId F1\n%include /etc/tor/torrc.shared\n"
        );
    }

    #[test]
    fn upsert_appends_and_fixes_missing_newline() {
        assert_eq!(upsert("ORPort 9001", "FamilyId", "FamilyId F1"), "ORPort 9001\nFamilyId F1\n");
        assert_eq!(upsert("", "FamilyId", "FamilyId F1"), "FamilyId F1\n");
    }

    #[test]
    fn upsert_ignores_commented_and_prefixed_names() {
        let text = "#FamilyId OLD\nFamilyIdExtra x\n";
        let out = upsert(text, "FamilyId", "FamilyId F1");
        assert_eq!(out, "#FamilyId OLD\nFamilyIdExtra x\nFamilyId F1\n");
    }

    #[test]
    fn insert_before_include_follows_its_line_ending() {
        assert_eq!(
            upsert("Nickname a\r\n%include /s\r\n", "FamilyId", "FamilyId F1"),
            "Nickname a\r\nFamilyId F1\r\n%include /s\r\n"
        );
        assert_eq!(
            upsert("%include /s", "FamilyId", "FamilyId F1"),
            "FamilyId F1\n%include /s"
        );
    }

    #[test]
    fn upsert_preserves_crlf_and_missing_final_newline() {
        assert_eq!(
            upsert("FamilyId A\r\nORPort 1\r\n", "FamilyId", "FamilyId B"),
            "FamilyId B\r\nORPort 1\r\n"
        );
        assert_eq!(upsert("ORPort 1\nFamilyId A", "FamilyId", "FamilyId B"), "ORPort 1\nFamilyId B");
    }

    #[test]
    fn upsert_is_idempotent() {
        let text = "Nickname r\n%include /x\nFamilyId old\n";
        let once = upsert(text, "FamilyId", "FamilyId F1");
        let twice = upsert(&once, "FamilyId", "FamilyId F1");
        assert_eq!(once, twice);
    }

    #[test]
    fn remove_deletes_all_and_is_idempotent() {
        let text = "FamilyId A\nORPort 9001\n  FamilyId B\n";
        let once = remove(text, "FamilyId");
        assert_eq!(once, "ORPort 9001\n");
        assert_eq!(remove(&once, "FamilyId"), once);
    }

    #[test]
    fn remove_without_match_is_noop() {
        let text = "ORPort 9001\n";
        assert_eq!(remove(text, "FamilyId"), text);
    }

    #[test]
    fn directive_values_in_order() {
        let text = "FamilyId A\n# FamilyId X\nfamilyid  B  \n";
        assert_eq!(directive_values(text, "FamilyId"), vec!["A", "B"]);
    }

    #[test]
    fn apply_all_runs_edits_in_sequence() {
        let edits = vec![
            DirectiveEdit::upsert("FamilyId", "FamilyId F1"),
            DirectiveEdit::remove("MyFamily"),
        ];
        let out = apply_all("MyFamily AAAA\n", &edits);
        assert_eq!(out, "FamilyId F1\n");
    }
}
