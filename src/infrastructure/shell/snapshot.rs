//! Procedure output decoding
//!
//! Procedures print one record per line after [`SENTINEL`]: a one-letter tag
//! followed by space-separated fields. Text fields are base64. Lines that do
//! not carry a known tag are ignored (an interactive channel mixes remote
//! stderr into stdout).

use std::collections::BTreeMap;
use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::domain::entities::{ApplyReport, InstalledKey, InstanceRecord};
use crate::domain::ports::ProbeIdentity;
use crate::error::{RolloutError, RolloutResult};

use super::script::SENTINEL;

/// Decoder bound to the host that produced the output, for error messages
pub struct RecordReader<'a> {
    host: &'a str,
}

impl<'a> RecordReader<'a> {
    pub fn new(host: &'a str) -> Self {
        Self { host }
    }

    /// Whether the procedure got far enough to print its sentinel
    pub fn started(output: &str) -> bool {
        output.lines().any(|l| l.trim_end_matches('\r') == SENTINEL)
    }

    /// `(tag, fields)` for every record after the sentinel
    fn records<'o>(&self, output: &'o str) -> RolloutResult<Vec<(&'o str, Vec<&'o str>)>> {
        let mut lines = output.lines().map(|l| l.trim_end_matches('\r'));
        if !lines.any(|l| l == SENTINEL) {
            return Err(self.protocol("procedure did not start"));
        }
        Ok(lines
            .filter_map(|line| {
                let mut fields = line.split(' ');
                let tag = fields.next()?;
                if tag.len() != 1 {
                    return None;
                }
                Some((tag, fields.collect()))
            })
            .collect())
    }

    fn protocol(&self, message: impl Into<String>) -> RolloutError {
        RolloutError::Protocol {
            target: self.host.to_string(),
            message: message.into(),
        }
    }

    fn text(&self, field: &str) -> RolloutResult<String> {
        let bytes = STANDARD
            .decode(field)
            .map_err(|e| self.protocol(format!("bad base64 field: {}", e)))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// `-` for unreadable, `=<base64>` for content
    fn content(&self, field: &str) -> RolloutResult<Option<String>> {
        match field {
            "-" => Ok(None),
            _ => match field.strip_prefix('=') {
                Some(encoded) => self.text(encoded).map(Some),
                None => Err(self.protocol(format!("bad content field '{}'", field))),
            },
        }
    }

    fn field<'f>(&self, fields: &[&'f str], idx: usize, tag: &str) -> RolloutResult<&'f str> {
        fields
            .get(idx)
            .copied()
            .ok_or_else(|| self.protocol(format!("truncated '{}' record", tag)))
    }

    pub fn probe(&self, output: &str) -> RolloutResult<ProbeIdentity> {
        for (tag, fields) in self.records(output)? {
            if tag == "P" {
                let uid = self
                    .field(&fields, 0, tag)?
                    .parse()
                    .map_err(|_| self.protocol("bad uid in probe"))?;
                let user = self.text(self.field(&fields, 1, tag)?)?.trim().to_string();
                return Ok(ProbeIdentity { uid, user });
            }
        }
        Err(self.protocol("probe printed no identity"))
    }

    pub fn snapshot(&self, output: &str) -> RolloutResult<Vec<InstanceRecord>> {
        let mut order: Vec<String> = Vec::new();
        let mut by_name: BTreeMap<String, InstanceRecord> = BTreeMap::new();

        for (tag, fields) in self.records(output)? {
            if !matches!(tag, "I" | "C" | "F" | "K" | "A") {
                continue;
            }
            let name = self.text(self.field(&fields, 0, tag)?)?;
            if tag == "I" {
                order.push(name.clone());
                by_name.insert(
                    name.clone(),
                    InstanceRecord {
                        name,
                        ..Default::default()
                    },
                );
                continue;
            }
            let record = by_name
                .get_mut(&name)
                .ok_or_else(|| self.protocol(format!("record for undeclared instance '{}'", name)))?;
            match tag {
                "C" => record.config = self.content(self.field(&fields, 1, tag)?)?,
                "F" => record.fingerprint = self.content(self.field(&fields, 1, tag)?)?,
                "K" => record.keys.push(InstalledKey {
                    file_name: self.text(self.field(&fields, 1, tag)?)?,
                    sha256: self.field(&fields, 2, tag)?.to_ascii_lowercase(),
                }),
                _ => record.active = self.field(&fields, 1, tag)? == "active",
            }
        }

        Ok(order
            .into_iter()
            .filter_map(|name| by_name.remove(&name))
            .collect())
    }

    pub fn files(&self, output: &str) -> RolloutResult<Vec<(PathBuf, Option<String>)>> {
        self.records(output)?
            .into_iter()
            .filter(|(tag, _)| *tag == "N")
            .map(|(tag, fields)| -> RolloutResult<(PathBuf, Option<String>)> {
                let path = PathBuf::from(self.text(self.field(&fields, 0, tag)?)?);
                let content = self.content(self.field(&fields, 1, tag)?)?;
                Ok((path, content))
            })
            .collect()
    }

    pub fn apply_report(&self, output: &str) -> RolloutResult<ApplyReport> {
        let mut report = ApplyReport::default();
        for (tag, fields) in self.records(output)? {
            let bucket = match tag {
                "W" => &mut report.written,
                "K" => &mut report.installed,
                "D" => &mut report.purged,
                _ => continue,
            };
            bucket.push(PathBuf::from(self.text(self.field(&fields, 0, tag)?)?));
        }
        Ok(report)
    }

    pub fn units(&self, output: &str) -> RolloutResult<Vec<String>> {
        self.records(output)?
            .into_iter()
            .filter(|(tag, _)| *tag == "U")
            .map(|(tag, fields)| self.text(self.field(&fields, 0, tag)?))
            .collect()
    }

    /// `Some(true)` for `S ok`, `Some(false)` for `S failed`
    pub fn service_status(&self, output: &str) -> RolloutResult<Option<bool>> {
        Ok(self
            .records(output)?
            .into_iter()
            .find(|(tag, _)| *tag == "S")
            .and_then(|(_, fields)| fields.first().map(|f| *f == "ok")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::shell::script::b64;

    fn output(lines: &[String]) -> String {
        let mut out = format!("noise before\n{}\n", SENTINEL);
        for line in lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    #[test]
    fn snapshot_records_assemble_instances() {
        let a = b64("relay1");
        let out = output(&[
            format!("I {}", a),
            format!("C {} ={}", a, b64("Nickname relay1\n")),
            format!("F {} -", a),
            format!("K {} {} {}", a, b64("fam.secret_family_key"), "AB".repeat(32)),
            format!("A {} active", a),
        ]);
        let records = RecordReader::new("h").snapshot(&out).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "relay1");
        assert_eq!(records[0].config.as_deref(), Some("Nickname relay1\n"));
        assert_eq!(records[0].fingerprint, None);
        assert_eq!(records[0].keys[0].sha256, "ab".repeat(32));
        assert!(records[0].active);
    }

    #[test]
    fn empty_content_is_distinct_from_unreadable() {
        let out = output(&[
            format!("N {} =", b64("/empty")),
            format!("N {} -", b64("/missing")),
        ]);
        let files = RecordReader::new("h").files(&out).unwrap();
        assert_eq!(files[0], (PathBuf::from("/empty"), Some(String::new())));
        assert_eq!(files[1], (PathBuf::from("/missing"), None));
    }

    #[test]
    fn crlf_and_stray_lines_are_tolerated() {
        let out = format!(
            "[sudo] password for admin: \r\n{}\r\nsudo: unrelated warning\r\nP 0 {}\r\n",
            SENTINEL,
            b64("root\n")
        );
        let id = RecordReader::new("h").probe(&out).unwrap();
        assert_eq!(id.uid, 0);
        assert_eq!(id.user, "root");
    }

    #[test]
    fn missing_sentinel_is_protocol_error() {
        let err = RecordReader::new("h").units("U abc\n").unwrap_err();
        assert_eq!(err.kind(), "Protocol");
        assert!(!RecordReader::started("sudo: a password is required\n"));
    }

    #[test]
    fn record_for_unknown_instance_is_rejected() {
        let out = output(&[format!("C {} -", b64("ghost"))]);
        assert!(RecordReader::new("h").snapshot(&out).is_err());
    }

    #[test]
    fn service_status_reads_ok_and_failed() {
        let reader = RecordReader::new("h");
        assert_eq!(reader.service_status(&output(&["S ok".to_string()])).unwrap(), Some(true));
        assert_eq!(
            reader.service_status(&output(&["S failed".to_string()])).unwrap(),
            Some(false)
        );
    }
}
