//! Output Rendering
//!
//! Text rendering of per-target outcomes and the fleet summary. Every target
//! line starts with its status token so a fleet's health can be read by
//! scanning the first column.

use crossterm::style::{Color, Stylize};

use crate::application::FleetSummary;
use crate::domain::entities::{
    FingerprintEntry, InstanceStatus, OutcomeStatus, PlannedChange, RolloutOutcome,
};

use super::diff::render_unified_diff;

/// Output format for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// NDJSON events plus a final summary line
    Json,
}

impl OutputFormat {
    pub fn from_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Semantic colors
mod colors {
    use super::Color;

    pub const SUCCESS: Color = Color::Green;
    pub const ERROR: Color = Color::Red;
    pub const WARNING: Color = Color::Yellow;
    pub const INFO: Color = Color::Cyan;
    pub const DIM: Color = Color::DarkGrey;
}

/// How text is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextStyle {
    pub color: bool,
    pub verbose: u8,
    pub dry_run: bool,
}

impl TextStyle {
    fn paint(&self, text: &str, color: Color) -> String {
        if self.color {
            format!("{}", text.with(color))
        } else {
            text.to_string()
        }
    }

    fn token(&self, status: OutcomeStatus) -> String {
        let color = match status {
            OutcomeStatus::Ok => colors::SUCCESS,
            OutcomeStatus::Failed => colors::ERROR,
            OutcomeStatus::Noop => colors::DIM,
            OutcomeStatus::Skipped => colors::WARNING,
        };
        self.paint(status.token(), color)
    }
}

/// Lines for one finished target
pub fn render_outcome(outcome: &RolloutOutcome, style: &TextStyle) -> String {
    let mut out = format!(
        "{} {}: {}\n",
        style.token(outcome.status),
        outcome.target,
        headline(outcome, style.dry_run)
    );

    if let Some(err) = &outcome.error {
        if let Some(remediation) = err.remediation() {
            out.push_str(&format!("    fix: {}\n", remediation));
        }
    }

    for change in &outcome.changes {
        let prefix = if style.dry_run { "would " } else { "" };
        out.push_str(&format!("    -> {}{}\n", prefix, change.describe()));
        if style.dry_run && style.verbose > 0 {
            if let PlannedChange::ConfigEdit {
                path, before, after, ..
            } = change
            {
                let diff = render_unified_diff(&path.display().to_string(), before, after, style.color);
                for line in diff.lines() {
                    out.push_str("      ");
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
    }

    for status in &outcome.instances {
        out.push_str(&render_instance(status, style));
    }

    for fp in &outcome.fingerprints {
        out.push_str(&format!("    {}\n", fingerprint_line(fp, &outcome.target)));
    }

    for note in &outcome.notes {
        out.push_str(&format!("    {}\n", style.paint(&format!("note: {}", note), colors::DIM)));
    }

    out
}

fn headline(outcome: &RolloutOutcome, dry_run: bool) -> String {
    if let Some(err) = &outcome.error {
        return format!("{}: {}", err.kind(), err);
    }
    match outcome.status {
        OutcomeStatus::Skipped => "not started".to_string(),
        OutcomeStatus::Noop if outcome.instances.is_empty() => "nothing to change".to_string(),
        _ if !outcome.instances.is_empty() => format!("{} instance(s)", outcome.instances.len()),
        _ if !outcome.fingerprints.is_empty() => {
            format!("{} fingerprint(s)", outcome.fingerprints.len())
        }
        _ if dry_run => format!(
            "{} change(s) planned for {} instance(s)",
            outcome.changes.len(),
            outcome.instances_touched
        ),
        _ => format!(
            "{} instance(s) touched, {} reloaded",
            outcome.instances_touched, outcome.reloaded
        ),
    }
}

fn render_instance(status: &InstanceStatus, style: &TextStyle) -> String {
    let running = if status.running { "running" } else { "stopped" };
    let key = match (status.key_installed, status.key_matches) {
        (false, _) => "no key",
        (true, Some(false)) => "other key",
        (true, _) => "key",
    };
    let family_id = match (&status.family_id, &status.family_id_origin) {
        (Some(id), Some(origin)) => format!("FamilyId {} ({})", id, origin.display()),
        (Some(id), None) => format!("FamilyId {}", id),
        _ => "no FamilyId".to_string(),
    };
    let my_family = match status.my_family {
        Some(count) => format!("MyFamily {} fp", count),
        None => "no MyFamily".to_string(),
    };

    let mut out = format!(
        "    {} {} | {} | {} | {}",
        style.paint(&status.name, colors::INFO),
        running,
        key,
        family_id,
        my_family
    );
    if let Some(fp) = &status.fingerprint {
        out.push_str(&format!(" | {}", fp));
    }
    out.push('\n');
    for warning in &status.warnings {
        out.push_str(&format!(
            "      {}\n",
            style.paint(&format!("warning: {}", warning), colors::WARNING)
        ));
    }
    out
}

/// `FINGERPRINT nickname target`
pub fn fingerprint_line(entry: &FingerprintEntry, target: &str) -> String {
    format!("{} {} {}", entry.fingerprint, entry.nickname, target)
}

/// Every collected fingerprint, one line each
pub fn fingerprint_listing(summary: &FleetSummary) -> String {
    summary
        .outcomes
        .iter()
        .flat_map(|o| o.fingerprints.iter().map(move |fp| fingerprint_line(fp, &o.target)))
        .map(|line| line + "\n")
        .collect()
}

/// Closing summary block
pub fn render_summary(summary: &FleetSummary, style: &TextStyle) -> String {
    let t = &summary.totals;
    let mut out = String::new();
    out.push('\n');
    out.push_str(&format!(
        "{} {} ({}{})\n",
        style.paint("Summary:", colors::INFO),
        summary.operation,
        summary.topology.as_str(),
        if summary.dry_run { ", dry run" } else { "" }
    ));
    out.push_str(&format!(
        "  {} target(s): {} ok, {} failed, {} noop, {} skipped\n",
        t.targets,
        style.paint(&t.ok.to_string(), colors::SUCCESS),
        style.paint(&t.failed.to_string(), if t.failed > 0 { colors::ERROR } else { colors::DIM }),
        t.noop,
        t.skipped
    ));
    if summary.dry_run {
        out.push_str(&format!("  {} instance(s) would change\n", t.instances_touched));
    } else {
        out.push_str(&format!(
            "  {} instance(s) touched, {} reloaded\n",
            t.instances_touched, t.reloaded
        ));
    }
    if let Some(id) = &summary.family_id {
        let source = summary.family_id_source.as_deref().unwrap_or("unknown");
        out.push_str(&format!("  FamilyId {} (from {})\n", id, source));
    }
    if summary.was_interrupted() {
        out.push_str(&format!(
            "  {}\n",
            style.paint("interrupted: skipped targets were not touched", colors::WARNING)
        ));
    }
    let elapsed = summary.elapsed().num_milliseconds() as f64 / 1000.0;
    out.push_str(&format!("  {}\n", style.paint(&format!("took {:.1}s", elapsed), colors::DIM)));
    out
}

/// The final JSON line closing an NDJSON stream
pub fn summary_json(summary: &FleetSummary) -> serde_json::Value {
    serde_json::json!({
        "event": "complete",
        "operation": summary.operation,
        "topology": summary.topology,
        "dry_run": summary.dry_run,
        "family_id": summary.family_id,
        "family_id_source": summary.family_id_source,
        "started_at": summary.started_at,
        "finished_at": summary.finished_at,
        "totals": summary.totals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Topology;
    use crate::error::RolloutError;
    use chrono::Utc;
    use std::path::PathBuf;

    fn plain() -> TextStyle {
        TextStyle::default()
    }

    #[test]
    fn failed_outcome_shows_token_kind_and_fix() {
        let outcome = RolloutOutcome::failed(
            "relay2",
            RolloutError::PrivilegeRequired {
                target: "relay2".into(),
                remediation: "ssh -t relay2 \"...\"".into(),
            },
        );
        let text = render_outcome(&outcome, &plain());
        let first = text.lines().next().unwrap();
        assert!(first.starts_with("[failed] relay2: PrivilegeRequired"));
        assert!(text.contains("    fix: ssh -t relay2"));
    }

    #[test]
    fn dry_run_lists_changes_and_diffs_when_verbose() {
        let mut outcome = RolloutOutcome::new("localhost", OutcomeStatus::Ok);
        outcome.instances_touched = 1;
        outcome.changes.push(PlannedChange::ConfigEdit {
            path: PathBuf::from("/etc/tor/instances/a/torrc"),
            directives: vec!["FamilyId".into()],
            instances: vec!["a".into()],
            before: "Nickname a\n".into(),
            after: "Nickname a\nFamilyId F1\n".into(),
        });

        let quiet = render_outcome(
            &outcome,
            &TextStyle {
                dry_run: true,
                ..plain()
            },
        );
        assert!(quiet.contains("1 change(s) planned"));
        assert!(quiet.contains("-> would edit /etc/tor/instances/a/torrc (FamilyId)"));
        assert!(!quiet.contains("+ FamilyId F1"));

        let verbose = render_outcome(
            &outcome,
            &TextStyle {
                dry_run: true,
                verbose: 1,
                ..plain()
            },
        );
        assert!(verbose.contains("+ FamilyId F1"));
    }

    #[test]
    fn status_lines_include_warnings() {
        let mut outcome = RolloutOutcome::new("localhost", OutcomeStatus::Ok);
        outcome.instances.push(InstanceStatus {
            name: "a".into(),
            running: true,
            key_installed: false,
            key_matches: None,
            family_id: Some("F1".into()),
            family_id_origin: Some(PathBuf::from("/etc/tor/torrc.shared")),
            my_family: None,
            fingerprint: None,
            warnings: vec!["FamilyId set but no family key installed".into()],
        });
        let text = render_outcome(&outcome, &plain());
        assert!(text.contains("a running | no key | FamilyId F1 (/etc/tor/torrc.shared) | no MyFamily"));
        assert!(text.contains("warning: FamilyId set but no family key installed"));
    }

    #[test]
    fn summary_block_and_fingerprint_listing() {
        let mut ok = RolloutOutcome::new("relay1", OutcomeStatus::Ok);
        ok.fingerprints.push(FingerprintEntry {
            instance: "a".into(),
            nickname: "nick".into(),
            fingerprint: "A".repeat(40),
        });
        let summary = FleetSummary::new(
            "collect-fingerprints",
            Topology::BatchRemote,
            false,
            Utc::now(),
            vec![ok, RolloutOutcome::new("relay2", OutcomeStatus::Skipped)],
        );

        assert_eq!(
            fingerprint_listing(&summary),
            format!("{} nick relay1\n", "A".repeat(40))
        );
        let text = render_summary(&summary, &plain());
        assert!(text.contains("2 target(s): 1 ok, 0 failed, 0 noop, 1 skipped"));
        assert!(text.contains("interrupted"));
    }

    #[test]
    fn summary_json_is_a_complete_event() {
        let summary = FleetSummary::new("status", Topology::Local, false, Utc::now(), Vec::new());
        let json = summary_json(&summary);
        assert_eq!(json["event"], "complete");
        assert_eq!(json["topology"], "local");
        assert_eq!(json["totals"]["targets"], 0);
    }
}
