//! Local transport: procedures run by `sh` on this machine.

use std::io::Write;
use std::process::{Command, Stdio};

use crate::domain::ports::Elevation;
use crate::error::RolloutResult;

use super::transport::{ScriptOutput, ScriptTransport};

/// Runs procedures with `sh -s`, through `sudo -n` when elevated
#[derive(Debug, Clone, Default)]
pub struct LocalTransport;

impl LocalTransport {
    pub fn new() -> Self {
        Self
    }

    fn command(elevation: Elevation) -> Command {
        match elevation {
            Elevation::Current | Elevation::Root => {
                let mut cmd = Command::new("sh");
                cmd.arg("-s");
                cmd
            }
            Elevation::Sudo | Elevation::SudoPrompt => {
                let mut cmd = Command::new("sudo");
                cmd.args(["-n", "sh", "-s"]);
                cmd
            }
        }
    }
}

impl ScriptTransport for LocalTransport {
    fn label(&self) -> String {
        "localhost".to_string()
    }

    fn can_prompt(&self) -> bool {
        false
    }

    fn run(&self, elevation: Elevation, script: &str) -> RolloutResult<ScriptOutput> {
        let mut child = Self::command(elevation)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(script.as_bytes())?;
        }

        let output = child.wait_with_output()?;
        Ok(ScriptOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
