//! Test environment builder for isolated relayctl testing.
//!
//! Provides `TestEnv` - a throwaway fleet under a temp directory laid out like
//! `tor-instance-create` (registry, data root, per-instance keys), plus a
//! fake `ssh` that runs remote commands locally, and helpers to run the CLI.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

/// Any host whose name contains this is unreachable through the fake ssh
pub const UNREACHABLE: &str = "down";

const FAKE_SSH: &str = r#"#!/bin/sh
eval "dest=\${$(($# - 1))}"
eval "cmd=\${$#}"
case "$dest" in
  *down*) echo "ssh: connect to host $dest port 22: Connection refused" >&2; exit 255 ;;
esac
exec sh -c "$cmd"
"#;

/// Result of running a relayctl CLI command
#[derive(Debug)]
pub struct TestResult {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl TestResult {
    /// Check if command succeeded
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Combine stdout and stderr
    pub fn combined_output(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }

    /// Lines starting with a status token
    pub fn target_lines(&self) -> Vec<&str> {
        self.stdout
            .lines()
            .filter(|line| line.starts_with('['))
            .collect()
    }
}

/// Isolated fleet for one test.
pub struct TestEnv {
    pub root: TempDir,
    relayctl_bin: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("Failed to create temp dir");
        let env = Self {
            root,
            relayctl_bin: PathBuf::from(env!("CARGO_BIN_EXE_relayctl")),
        };
        std::fs::create_dir_all(env.registry_dir()).expect("Failed to create registry");
        std::fs::create_dir_all(env.data_root()).expect("Failed to create data root");
        env.write_file("config.toml", "# relayctl test configuration\n");

        let ssh = env.path("bin/ssh");
        env.write_file("bin/ssh", FAKE_SSH);
        std::fs::set_permissions(&ssh, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to make fake ssh executable");
        env
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.path().join(relative)
    }

    pub fn registry_dir(&self) -> PathBuf {
        self.path("etc/tor/instances")
    }

    pub fn data_root(&self) -> PathBuf {
        self.path("var/lib/tor-instances")
    }

    pub fn torrc_path(&self, instance: &str) -> PathBuf {
        self.registry_dir().join(instance).join("torrc")
    }

    pub fn key_dir(&self, instance: &str) -> PathBuf {
        self.data_root().join(instance).join("keys")
    }

    /// Write a file below the environment root
    pub fn write_file(&self, relative: &str, content: &str) -> PathBuf {
        let full_path = self.path(relative);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create directories");
        }
        std::fs::write(&full_path, content).expect("Failed to write file");
        full_path
    }

    /// Register an instance with the given torrc
    pub fn add_instance(&self, name: &str, torrc: &str) {
        let path = self.torrc_path(name);
        std::fs::create_dir_all(path.parent().unwrap()).expect("Failed to create instance dir");
        std::fs::write(&path, torrc).expect("Failed to write torrc");
        std::fs::create_dir_all(self.data_root().join(name)).expect("Failed to create data dir");
    }

    /// Give an instance a `fingerprint` file
    pub fn set_fingerprint(&self, name: &str, nickname: &str, fingerprint: &str) {
        let path = self.data_root().join(name).join("fingerprint");
        std::fs::create_dir_all(path.parent().unwrap()).expect("Failed to create data dir");
        std::fs::write(&path, format!("{} {}\n", nickname, fingerprint))
            .expect("Failed to write fingerprint");
    }

    /// Write a family key and its public id next to it
    pub fn write_credential(&self, family: &str, family_id: Option<&str>) -> PathBuf {
        let secret = self.write_file(
            &format!("op/{}.secret_family_key", family),
            "== ed25519v1-secret: type0 ==\0\0\0test-key-material",
        );
        if let Some(id) = family_id {
            self.write_file(&format!("op/{}.public_family_id", family), &format!("{}\n", id));
        }
        secret
    }

    pub fn read_torrc(&self, instance: &str) -> String {
        std::fs::read_to_string(self.torrc_path(instance))
            .unwrap_or_else(|e| panic!("Failed to read torrc of {}: {}", instance, e))
    }

    pub fn has_key(&self, instance: &str, file_name: &str) -> bool {
        self.key_dir(instance).join(file_name).is_file()
    }

    /// Run relayctl in this environment
    pub fn run(&self, args: &[&str]) -> TestResult {
        self.run_with_env(args, &[])
    }

    /// Run relayctl with extra env vars.
    pub fn run_with_env(&self, args: &[&str], env_vars: &[(&str, &str)]) -> TestResult {
        let mut cmd = Command::new(&self.relayctl_bin);
        cmd.current_dir(self.root.path())
            .args(args)
            .stdin(Stdio::null())
            .env("HOME", self.path("home"))
            .env("XDG_CONFIG_HOME", self.path("home/.config"))
            .env("RELAYCTL_CONFIG", self.path("config.toml"))
            .env("RELAYCTL_ALLOW_UNPRIVILEGED", "1")
            .env("RELAYCTL_REGISTRY_DIR", self.registry_dir())
            .env("RELAYCTL_DATA_ROOT", self.data_root())
            .env("RELAYCTL_SERVICE_USER", "")
            .env("RELAYCTL_SERVICE_GROUP", "")
            .env("RELAYCTL_SSH_PROGRAM", self.path("bin/ssh"))
            .env("NO_COLOR", "1")
            .env_remove("RELAYCTL_LOG")
            .env_remove("RELAYCTL_DERIVE_COMMAND")
            .env_remove("RELAYCTL_RELOAD");

        for (key, value) in env_vars {
            cmd.env(key, value);
        }

        let output = cmd.output().expect("Failed to execute relayctl");
        output_to_result(output)
    }

    /// Write a target list file
    pub fn servers_file(&self, hosts: &[&str]) -> PathBuf {
        self.write_file("servers.txt", &format!("# fleet\n{}\n", hosts.join("\n")))
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

fn output_to_result(output: Output) -> TestResult {
    TestResult {
        success: output.status.success(),
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    }
}

/// Path as a CLI argument
pub fn arg(path: &Path) -> &str {
    path.to_str().expect("test paths are UTF-8")
}
