use std::{
  path::Path,
  process::Stdio,
  sync::OnceLock,
  time::{SystemTime, UNIX_EPOCH},
};

mod output;

pub use output::*;
use tokio::process::Command;

/// One subprocess invocation, captured uniformly so the caller can
/// classify the result (not-found vs. fatal) and so tests can swap in a
/// fake without touching the call sites.
#[derive(Debug, Clone)]
pub struct ExecRecord {
  pub stage: String,
  pub command: String,
  pub start_ts: i64,
  pub end_ts: i64,
  pub success: bool,
  pub stdout: String,
  pub stderr: String,
}

impl ExecRecord {
  pub fn combined(&self) -> String {
    if self.stderr.is_empty() {
      self.stdout.clone()
    } else {
      format!("{}\n{}", self.stdout, self.stderr)
    }
  }
}

fn now_ms() -> i64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|d| d.as_millis() as i64)
    .unwrap_or_default()
}

/// Runs `command`, recording stage/timing for error/log bodies.
/// Commands are run directly (lexed with `shlex`), cannot include `&&`.
pub async fn run_logged(
  stage: &str,
  path: impl Into<Option<&Path>>,
  command: impl Into<String>,
) -> ExecRecord {
  let command = command.into();
  let start_ts = now_ms();
  let output = run(&command, path).await;
  ExecRecord {
    stage: stage.to_string(),
    success: output.success(),
    stdout: output.stdout,
    stderr: output.stderr,
    command,
    start_ts,
    end_ts: now_ms(),
  }
}

/// Commands are run directly, and cannot include `&&`.
pub async fn run(
  command: &str,
  path: impl Into<Option<&Path>>,
) -> ExecOutput {
  let Some(lexed) =
    shlex::split(command).filter(|lexed| !lexed.is_empty())
  else {
    return ExecOutput::from_err(std::io::Error::other(
      "command lexed into empty args",
    ));
  };

  let mut cmd = Command::new(&lexed[0]);

  cmd
    .args(&lexed[1..])
    .kill_on_drop(true)
    .stdin(Stdio::null())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped());

  if let Some(path) = path.into() {
    cmd.current_dir(path);
  }

  tracing::debug!("running command: {command}");

  ExecOutput::from(cmd.output().await)
}

fn shell() -> &'static str {
  static DEFAULT_SHELL: OnceLock<String> = OnceLock::new();
  DEFAULT_SHELL.get_or_init(|| {
    if std::path::Path::new("/bin/bash").exists()
      || std::path::Path::new("/usr/bin/bash").exists()
    {
      String::from("bash")
    } else {
      String::from("sh")
    }
  })
}

/// Commands are wrapped in `sh -c` / `bash -c`, and can include `&&`.
pub async fn run_shell(
  command: &str,
  path: impl Into<Option<&Path>>,
) -> ExecOutput {
  let mut cmd = Command::new(shell());

  cmd.args(["-c", command]).kill_on_drop(true).stdin(Stdio::null());

  if let Some(path) = path.into() {
    cmd.current_dir(path);
  }

  tracing::debug!("running shell command: {command}");

  ExecOutput::from(cmd.output().await)
}
