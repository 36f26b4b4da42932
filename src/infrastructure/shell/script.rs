//! Procedure rendering
//!
//! Every procedure a host runs is a POSIX `sh` script rendered here. Dynamic
//! values (paths, names, file contents, key bytes) never appear in script text
//! directly: each is base64-encoded and decoded on the host, so no quoting of
//! operator or host data is ever needed.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::domain::entities::{ApplyPlan, CredentialSource, CREDENTIAL_SUFFIX};
use crate::domain::ports::ServiceAction;
use crate::domain::value_objects::FleetLayout;

/// Line every procedure prints before its records
pub const SENTINEL: &str = "::relayctl-begin::";

/// Exit status of an apply whose credential failed digest verification
pub const DIGEST_MISMATCH_STATUS: i32 = 3;

const ENC_FN: &str = "enc() { base64 | tr -d '\\n'; }";
const SHA256_FN: &str = "sha256() { if command -v sha256sum >/dev/null 2>&1; then sha256sum | cut -d' ' -f1; else shasum -a 256 | cut -d' ' -f1; fi; }";

/// Base64 text of `bytes`, safe inside single quotes
pub fn b64(bytes: impl AsRef<[u8]>) -> String {
    STANDARD.encode(bytes)
}

/// Incrementally built procedure
struct ScriptBuilder {
    text: String,
}

impl ScriptBuilder {
    fn new() -> Self {
        let mut builder = Self {
            text: String::with_capacity(1024),
        };
        builder.line("set -eu");
        builder.line(ENC_FN);
        builder.line(&format!("printf '%s\\n' '{}'", SENTINEL));
        builder
    }

    fn line(&mut self, line: &str) -> &mut Self {
        self.text.push_str(line);
        self.text.push('\n');
        self
    }

    /// `var=<decoded value>`
    fn decode(&mut self, var: &str, value: impl AsRef<[u8]>) -> &mut Self {
        let line = format!("{}=$(printf '%s' '{}' | base64 -d)", var, b64(value));
        self.line(&line)
    }

    fn path(&mut self, var: &str, path: &Path) -> &mut Self {
        self.decode(var, path.as_os_str().as_encoded_bytes())
    }

    fn finish(self) -> String {
        self.text
    }
}

/// Report `P <uid> <b64 user>`
pub fn probe() -> String {
    let mut s = ScriptBuilder::new();
    s.line(r#"printf 'P %s %s\n' "$(id -u)" "$(id -un | enc)""#);
    s.finish()
}

/// Enumerate instances under the layout's registry.
///
/// Records, per instance in directory order:
/// `I <name>`, `C <name> <content>`, `F <name> <content>`,
/// `K <name> <file> <sha256>` per family key, `A <name> active|inactive`.
/// Names and file names are base64; content is `-` when unreadable, else `=`
/// followed by base64.
pub fn snapshot(layout: &FleetLayout) -> String {
    let (unit_prefix, unit_suffix) = layout.unit_parts();
    let mut s = ScriptBuilder::new();
    s.line(SHA256_FN);
    s.path("registry", &layout.registry_dir)
        .path("data_root", &layout.data_root)
        .decode("config_name", &layout.config_name)
        .decode("key_dir_name", &layout.key_dir_name)
        .decode("fingerprint_name", &layout.fingerprint_name)
        .decode("unit_prefix", unit_prefix)
        .decode("unit_suffix", unit_suffix);
    s.line("has_systemctl=0")
        .line("if command -v systemctl >/dev/null 2>&1; then has_systemctl=1; fi")
        .line(r#"[ -d "$registry" ] || exit 0"#)
        .line(r#"for dir in "$registry"/*; do"#)
        .line(r#"  [ -d "$dir" ] || continue"#)
        .line(r#"  name=${dir##*/}"#)
        .line(r#"  n64=$(printf '%s' "$name" | enc)"#)
        .line(r#"  printf 'I %s\n' "$n64""#)
        .line(r#"  conf="$dir/$config_name""#)
        .line(r#"  if [ -f "$conf" ] && [ -r "$conf" ]; then printf 'C %s =%s\n' "$n64" "$(enc < "$conf")"; else printf 'C %s -\n' "$n64"; fi"#)
        .line(r#"  fp="$data_root/$name/$fingerprint_name""#)
        .line(r#"  if [ -f "$fp" ] && [ -r "$fp" ]; then printf 'F %s =%s\n' "$n64" "$(enc < "$fp")"; else printf 'F %s -\n' "$n64"; fi"#)
        .line(&format!(
            r#"  for key in "$data_root/$name/$key_dir_name"/*{}; do"#,
            CREDENTIAL_SUFFIX
        ))
        .line(r#"    [ -f "$key" ] && [ -r "$key" ] || continue"#)
        .line(r#"    printf 'K %s %s %s\n' "$n64" "$(printf '%s' "${key##*/}" | enc)" "$(sha256 < "$key")""#)
        .line("  done")
        .line("  state=inactive")
        .line(r#"  if [ "$has_systemctl" = 1 ] && systemctl is-active --quiet "$unit_prefix$name$unit_suffix" 2>/dev/null; then state=active; fi"#)
        .line(r#"  printf 'A %s %s\n' "$n64" "$state""#)
        .line("done");
    s.finish()
}

/// Read files, one `N <b64 path> <content>` record each
pub fn read_files(paths: &[impl AsRef<Path>]) -> String {
    let mut s = ScriptBuilder::new();
    for path in paths {
        let encoded = b64(path.as_ref().as_os_str().as_encoded_bytes());
        s.path("p", path.as_ref());
        s.line(&format!(
            r#"if [ -f "$p" ] && [ -r "$p" ]; then printf 'N %s =%s\n' '{0}' "$(enc < "$p")"; else printf 'N %s -\n' '{0}'; fi"#,
            encoded
        ));
    }
    s.finish()
}

/// Apply a plan in one run.
///
/// Runs under `umask 077` with a private `mktemp -d` work directory that a
/// trap removes on every exit path. The credential digest is checked before
/// anything is changed; keys are installed before configs reference them.
/// Records: `K <path>` per installed key, `W <path>` per written file,
/// `D <path>` per purged key.
pub fn apply(plan: &ApplyPlan) -> String {
    let mut s = ScriptBuilder::new();
    s.line(SHA256_FN)
        .line("umask 077")
        .line("work=$(mktemp -d)")
        .line(r#"cleanup() { rm -rf "$work"; }"#)
        .line("trap cleanup EXIT")
        .line("trap 'cleanup; exit 129' HUP")
        .line("trap 'cleanup; exit 130' INT")
        .line("trap 'cleanup; exit 143' TERM");

    if let Some(install) = plan.install.as_ref().filter(|i| !i.destinations.is_empty()) {
        match &install.source {
            CredentialSource::Inline(bytes) => {
                s.line(r#"credential="$work/credential""#);
                s.line(&format!(
                    r#"printf '%s' '{}' | base64 -d > "$credential""#,
                    b64(bytes)
                ));
            }
            CredentialSource::LocalPath(path) => {
                s.path("credential", path);
            }
        }
        s.decode("key_name", &install.file_name);
        s.line(&format!(
            r#"if [ "$(sha256 < "$credential")" != '{}' ]; then echo 'credential digest mismatch' >&2; exit {}; fi"#,
            install.sha256, DIGEST_MISMATCH_STATUS
        ));

        for dest in &install.destinations {
            let mut ownership = String::new();
            s.path("key_dir", &dest.key_dir);
            if let Some(owner) = &dest.owner {
                s.decode("owner", owner);
                ownership.push_str(r#" -o "$owner""#);
            }
            if let Some(group) = &dest.group {
                s.decode("group", group);
                ownership.push_str(r#" -g "$group""#);
            }
            s.line(&format!(
                r#"[ -d "$key_dir" ] || install -d -m 700{} "$key_dir""#,
                ownership
            ));
            s.line(&format!(
                r#"install -m 600{} "$credential" "$key_dir/$key_name""#,
                ownership
            ));
            s.line(r#"printf 'K %s\n' "$(printf '%s' "$key_dir/$key_name" | enc)""#);
        }
    }

    for write in &plan.writes {
        s.path("target", &write.path);
        s.line(&format!(
            r#"printf '%s' '{}' | base64 -d > "$work/content""#,
            b64(&write.content)
        ));
        // Redirecting into the existing file keeps its owner and mode.
        s.line(r#"cat "$work/content" > "$target""#)
            .line(r#"printf 'W %s\n' "$(printf '%s' "$target" | enc)""#);
    }

    for dir in &plan.purge {
        s.path("key_dir", dir);
        s.line(&format!(r#"for key in "$key_dir"/*{}; do"#, CREDENTIAL_SUFFIX))
            .line(r#"  [ -f "$key" ] || continue"#)
            .line(r#"  rm -f "$key""#)
            .line(r#"  printf 'D %s\n' "$(printf '%s' "$key" | enc)""#)
            .line("done");
    }

    s.finish()
}

/// Report `U <b64 unit>` for each active unit
pub fn active_units(units: &[String]) -> String {
    let mut s = ScriptBuilder::new();
    s.line("command -v systemctl >/dev/null 2>&1 || exit 0");
    for unit in units {
        s.decode("unit", unit);
        s.line(&format!(
            r#"if systemctl is-active --quiet "$unit"; then printf 'U %s\n' '{}'; fi"#,
            b64(unit)
        ));
    }
    s.finish()
}

/// One batched `systemctl <action>`, reporting `S ok` or `S failed`
pub fn service_action(action: ServiceAction, units: &[String]) -> String {
    let mut s = ScriptBuilder::new();
    s.line("command -v systemctl >/dev/null 2>&1 || { echo 'systemctl not found' >&2; exit 4; }")
        .line("set --");
    for unit in units {
        s.decode("unit", unit);
        s.line(r#"set -- "$@" "$unit""#);
    }
    s.line(&format!(
        r#"if systemctl {} "$@"; then printf 'S ok\n'; else printf 'S failed\n'; fi"#,
        action.as_str()
    ));
    s.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{FileWrite, KeyDestination, KeyInstall};
    use std::path::PathBuf;

    #[test]
    fn dynamic_values_never_appear_verbatim() {
        let plan = ApplyPlan {
            writes: vec![FileWrite {
                path: PathBuf::from("/etc/tor/it's here/torrc"),
                content: "FamilyId $(rm -rf /)\n".to_string(),
            }],
            ..Default::default()
        };
        let script = apply(&plan);
        assert!(!script.contains("it's here"));
        assert!(!script.contains("rm -rf /)"));
        assert!(script.starts_with("set -eu\n"));
    }

    #[test]
    fn inline_credential_is_verified_and_owned() {
        let plan = ApplyPlan {
            install: Some(KeyInstall {
                source: CredentialSource::Inline(b"secret".to_vec()),
                file_name: "fam.secret_family_key".to_string(),
                sha256: "ab".repeat(32),
                destinations: vec![KeyDestination {
                    instance: "a".to_string(),
                    key_dir: PathBuf::from("/var/lib/tor-instances/a/keys"),
                    owner: Some("_tor-a".to_string()),
                    group: None,
                }],
            }),
            ..Default::default()
        };
        let script = apply(&plan);
        assert!(script.contains("umask 077"));
        assert!(script.contains("trap cleanup EXIT"));
        assert!(script.contains(&"ab".repeat(32)));
        assert!(script.contains(r#"install -m 600 -o "$owner" "$credential""#));
        assert!(!script.contains("secret\n"));
    }

    #[test]
    fn empty_install_renders_no_credential() {
        let plan = ApplyPlan {
            install: Some(KeyInstall {
                source: CredentialSource::Inline(b"secret".to_vec()),
                file_name: "fam.secret_family_key".to_string(),
                sha256: "00".repeat(32),
                destinations: Vec::new(),
            }),
            ..Default::default()
        };
        assert!(!apply(&plan).contains(&b64(b"secret")));
    }

    #[test]
    fn service_action_batches_units() {
        let script = service_action(
            ServiceAction::Reload,
            &["tor@a.service".to_string(), "tor@b.service".to_string()],
        );
        assert_eq!(script.matches(r#"set -- "$@" "$unit""#).count(), 2);
        assert_eq!(script.matches("systemctl reload").count(), 1);
    }
}
