//! Config diffs shown by `--dry-run -v`.

use crossterm::style::{Color, Stylize};
use similar::{ChangeTag, TextDiff};

const CONTEXT_LINES: usize = 2;

/// Unified diff of one config file, with old and new line numbers.
///
/// Only the lines around each change are printed; untouched stretches of a
/// long torrc collapse into a `@@` separator.
pub fn render_unified_diff(path: &str, old: &str, new: &str, color: bool) -> String {
    let diff = TextDiff::from_lines(old, new);
    let width = old.lines().count().max(new.lines().count()).max(1).to_string().len();

    let mut out = String::new();
    out.push_str(&paint(&format!("--- {}", path), Color::Cyan, color));
    out.push('\n');
    out.push_str(&paint(&format!("+++ {}", path), Color::Cyan, color));
    out.push('\n');

    for (i, group) in diff.grouped_ops(CONTEXT_LINES).iter().enumerate() {
        if i > 0 {
            out.push_str(&paint("@@", Color::DarkGrey, color));
            out.push('\n');
        }
        for op in group {
            for change in diff.iter_changes(op) {
                let (old_no, new_no, sign, tint) = match change.tag() {
                    ChangeTag::Delete => (change.old_index(), None, "-", Color::Red),
                    ChangeTag::Insert => (None, change.new_index(), "+", Color::Green),
                    ChangeTag::Equal => {
                        (change.old_index(), change.new_index(), " ", Color::DarkGrey)
                    }
                };
                let column = |n: Option<usize>| {
                    n.map(|n| format!("{:>width$}", n + 1, width = width))
                        .unwrap_or_else(|| " ".repeat(width))
                };
                let line = format!(
                    "{} {} {} {}",
                    column(old_no),
                    column(new_no),
                    sign,
                    change.value().trim_end_matches('\n')
                );
                out.push_str(&paint(&line, tint, color));
                out.push('\n');
            }
        }
    }

    out
}

fn paint(s: &str, tint: Color, color: bool) -> String {
    if color {
        format!("{}", s.with(tint))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shows_inserted_directive() {
        let rendered = render_unified_diff("torrc", "Nickname a\n", "Nickname a\nFamilyId F1\n", false);
        assert!(rendered.starts_with("--- torrc\n+++ torrc\n"));
        assert!(rendered.contains(" 2 + FamilyId F1"));
        assert!(rendered.contains("1 1   Nickname a"));
    }

    #[test]
    fn appended_directive_layout() {
        let rendered = render_unified_diff(
            "torrc",
            "Nickname a\nORPort 9001\n",
            "Nickname a\nORPort 9001\nFamilyId F1\n",
            false,
        );
        insta::assert_debug_snapshot!(rendered.lines().collect::<Vec<_>>(), @r###"
        [
            "--- torrc",
            "+++ torrc",
            "1 1   Nickname a",
            "2 2   ORPort 9001",
            "  3 + FamilyId F1",
        ]
        "###);
    }

    #[test]
    fn replaced_value_shows_both_sides() {
        let rendered = render_unified_diff("torrc", "FamilyId OLD\n", "FamilyId NEW\n", false);
        assert!(rendered.contains("- FamilyId OLD"));
        assert!(rendered.contains("+ FamilyId NEW"));
    }

    #[test]
    fn distant_changes_are_separated() {
        let old: String = (0..20).map(|i| format!("Line{}\n", i)).collect();
        let new = old.replace("Line1\n", "Line1x\n").replace("Line18\n", "Line18x\n");
        let rendered = render_unified_diff("torrc", &old, &new, false);
        assert!(rendered.contains("@@"));
        assert!(!rendered.contains("Line10"));
    }
}
