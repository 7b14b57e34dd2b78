use std::{
  io,
  os::unix::process::ExitStatusExt,
  process::{ExitStatus, Output},
};

#[derive(Debug, Clone)]
pub struct ExecOutput {
  pub status: ExitStatus,
  pub stdout: String,
  pub stderr: String,
}

impl ExecOutput {
  pub fn from(output: io::Result<Output>) -> Self {
    match output {
      Ok(output) => Self {
        status: output.status,
        stdout: String::from_utf8(output.stdout)
          .unwrap_or_else(|_| "failed to parse stdout as utf8".into()),
        stderr: String::from_utf8(output.stderr)
          .unwrap_or_else(|_| "failed to parse stderr as utf8".into()),
      },
      Err(e) => Self::from_err(e),
    }
  }

  pub fn from_err(e: io::Error) -> Self {
    Self {
      status: ExitStatus::from_raw(1),
      stdout: String::new(),
      stderr: format!("{e:#}"),
    }
  }

  pub fn success(&self) -> bool {
    self.status.success()
  }

  pub fn exit_code(&self) -> i32 {
    self.status.code().unwrap_or(1)
  }

  pub fn combined(&self) -> String {
    if self.stderr.is_empty() {
      self.stdout.clone()
    } else {
      format!("{}\n{}", self.stdout, self.stderr)
    }
  }

  /// Runtime/network not-found is treated as success by the caller,
  /// not as a generic failure.
  pub fn not_found(&self) -> bool {
    let combined = self.combined().to_lowercase();
    combined.contains("not found") || combined.contains("no such")
  }
}
