//! SSH transport: procedures run on a remote host as the ssh remote command.
//!
//! Batch channels use `BatchMode=yes` and never prompt. Interactive channels
//! allocate a pty (`-t`) and echo everything the remote side prints before
//! the procedure's sentinel to the operator's stderr. A sudo password is asked
//! for once per target and handed to `sudo -S` on stdin for every procedure,
//! since each ssh session gets its own tty and sudo's timestamp would not carry
//! over.

use std::cell::RefCell;
use std::fmt;
use std::io::{self, Read, Write};
use std::process::{Command, Stdio};
use std::rc::Rc;

use crate::config::SshConfig;
use crate::domain::ports::Elevation;
use crate::domain::value_objects::Target;
use crate::error::{RolloutError, RolloutResult};

use super::script::SENTINEL;
use super::transport::{ScriptOutput, ScriptTransport};

/// Exit status ssh reserves for its own failures
const SSH_FAILURE_STATUS: i32 = 255;

/// Asks the operator for the sudo password of a target
pub type PasswordPrompt = Rc<dyn Fn(&str) -> io::Result<String>>;

/// Remote execution channel to one target
#[derive(Clone)]
pub struct SshTransport {
    target: Target,
    config: SshConfig,
    interactive: bool,
    prompt: PasswordPrompt,
    sudo_password: Rc<RefCell<Option<String>>>,
}

impl fmt::Debug for SshTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SshTransport")
            .field("target", &self.target)
            .field("config", &self.config)
            .field("interactive", &self.interactive)
            .field("sudo_password_cached", &self.sudo_password.borrow().is_some())
            .finish()
    }
}

impl SshTransport {
    pub fn new(target: Target, config: SshConfig, interactive: bool) -> Self {
        Self {
            target,
            config,
            interactive,
            prompt: Rc::new(ask_on_terminal),
            sudo_password: Rc::new(RefCell::new(None)),
        }
    }

    /// Replace the terminal password prompt
    pub fn with_password_prompt(mut self, prompt: PasswordPrompt) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// The remote command line wrapping `script` for `elevation`
    pub fn remote_command(elevation: Elevation, script: &str) -> String {
        match elevation {
            Elevation::Current | Elevation::Root => shell_words::join(["sh", "-c", script]),
            Elevation::Sudo => shell_words::join(["sudo", "-n", "sh", "-c", script]),
            Elevation::SudoPrompt => shell_words::join(["sudo", "-S", "-p", "", "sh", "-c", script]),
        }
    }

    /// Arguments passed to the ssh program.
    ///
    /// `SudoPrompt` runs without a pty: the password travels on stdin and a
    /// pty would echo it back.
    pub fn ssh_args(&self, elevation: Elevation, remote_command: String) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            format!("ConnectTimeout={}", self.config.connect_timeout),
        ];
        if self.interactive {
            if elevation != Elevation::SudoPrompt {
                args.push("-t".to_string());
            }
        } else {
            args.push("-o".to_string());
            args.push("BatchMode=yes".to_string());
        }
        for option in &self.config.options {
            args.push("-o".to_string());
            args.push(option.clone());
        }
        if let Some(port) = self.target.port() {
            args.push("-p".to_string());
            args.push(port.to_string());
        }
        args.push(self.target.ssh_destination());
        args.push(remote_command);
        args
    }

    fn run_batch(&self, args: Vec<String>) -> RolloutResult<ScriptOutput> {
        let output = Command::new(&self.config.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| self.spawn_error(e))?;

        Ok(ScriptOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn run_interactive(&self, args: Vec<String>) -> RolloutResult<ScriptOutput> {
        let mut child = Command::new(&self.config.program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let captured = match child.stdout.take() {
            Some(stdout) => stream_until_sentinel(stdout, io::stderr())?,
            None => Vec::new(),
        };
        let status = child.wait()?;

        Ok(ScriptOutput {
            status: status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&captured).into_owned(),
            stderr: String::new(),
        })
    }

    /// The cached sudo password, asking for it on first use
    fn sudo_password(&self) -> RolloutResult<String> {
        if let Some(password) = self.sudo_password.borrow().as_ref() {
            return Ok(password.clone());
        }
        let password = (self.prompt)(&self.label()).map_err(|e| RolloutError::PrivilegeRequired {
            target: self.label(),
            remediation: format!("cannot read the sudo password: {}", e),
        })?;
        *self.sudo_password.borrow_mut() = Some(password.clone());
        Ok(password)
    }

    fn run_with_password(&self, args: Vec<String>) -> RolloutResult<ScriptOutput> {
        let password = self.sudo_password()?;
        let mut child = Command::new(&self.config.program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        if let Some(mut stdin) = child.stdin.take() {
            // The remote side may exit before reading; its status tells why.
            let _ = writeln!(stdin, "{}", password);
        }
        let output = child.wait_with_output()?;
        let output = ScriptOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if password_rejected(&output) {
            tracing::warn!(host = %self.label(), "sudo rejected the password");
            self.sudo_password.borrow_mut().take();
        }
        Ok(output)
    }

    fn spawn_error(&self, error: io::Error) -> RolloutError {
        RolloutError::ConnectionFailed {
            target: self.label(),
            message: format!("cannot run {}: {}", self.config.program, error),
        }
    }
}

impl ScriptTransport for SshTransport {
    fn label(&self) -> String {
        self.target.to_string()
    }

    fn can_prompt(&self) -> bool {
        self.interactive
    }

    fn run(&self, elevation: Elevation, script: &str) -> RolloutResult<ScriptOutput> {
        let args = self.ssh_args(elevation, Self::remote_command(elevation, script));
        tracing::debug!(host = %self.label(), ?elevation, interactive = self.interactive, "running remote procedure");

        let output = if elevation == Elevation::SudoPrompt {
            self.run_with_password(args)?
        } else if self.interactive {
            self.run_interactive(args)?
        } else {
            self.run_batch(args)?
        };

        if output.status == SSH_FAILURE_STATUS {
            let message = match output.stderr.trim() {
                "" => "ssh exited with status 255".to_string(),
                stderr => stderr.to_string(),
            };
            return Err(RolloutError::ConnectionFailed {
                target: self.label(),
                message,
            });
        }
        Ok(output)
    }
}

fn ask_on_terminal(target: &str) -> io::Result<String> {
    dialoguer::Password::new()
        .with_prompt(format!("[sudo] password on {}", target))
        .interact()
        .map_err(|e| io::Error::other(e.to_string()))
}

fn password_rejected(output: &ScriptOutput) -> bool {
    !output.success()
        && (output.stderr.contains("incorrect password")
            || output.stderr.contains("Sorry, try again"))
}

/// Copy `reader` to `echo` until [`SENTINEL`] appears; return the sentinel and
/// everything after it.
///
/// A trailing partial match is held back so a sentinel split across reads is
/// still found. Prompts without a newline are echoed as soon as they arrive.
pub fn stream_until_sentinel(mut reader: impl Read, mut echo: impl Write) -> io::Result<Vec<u8>> {
    let marker = SENTINEL.as_bytes();
    let mut pending: Vec<u8> = Vec::new();
    let mut captured: Vec<u8> = Vec::new();
    let mut begun = false;
    let mut buf = [0u8; 4096];

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        if begun {
            captured.extend_from_slice(&buf[..n]);
            continue;
        }

        pending.extend_from_slice(&buf[..n]);
        if let Some(pos) = find(&pending, marker) {
            echo.write_all(&pending[..pos])?;
            echo.flush()?;
            captured.extend_from_slice(&pending[pos..]);
            pending.clear();
            begun = true;
        } else {
            let keep = (marker.len() - 1).min(pending.len());
            let cut = pending.len() - keep;
            echo.write_all(&pending[..cut])?;
            echo.flush()?;
            pending.drain(..cut);
        }
    }

    if !begun && !pending.is_empty() {
        echo.write_all(&pending)?;
        echo.flush()?;
    }
    Ok(captured)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
