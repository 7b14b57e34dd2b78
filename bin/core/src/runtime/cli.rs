use std::{collections::BTreeMap, path::Path};

use stackyard_client::entities::runtime::{
  ComposeOutput, NetworkInspect, RuntimeVariant,
};

use super::RuntimeDriver;
use crate::error::CoreError;

/// Drives one of the two runtime variants over its CLI. Elevation (a
/// privilege-elevation wrapper prefixed onto the command line) is
/// decided once, from the variant, at construction time.
#[derive(Clone)]
pub struct CliRuntimeDriver {
  variant: RuntimeVariant,
  elevate: bool,
  compose_subcommand: &'static str,
}

impl CliRuntimeDriver {
  pub fn new(variant: RuntimeVariant) -> Self {
    Self {
      variant,
      elevate: variant.requires_elevation(),
      compose_subcommand: match variant {
        RuntimeVariant::Daemonless => "compose",
        RuntimeVariant::Daemonful => "compose",
      },
    }
  }

  fn command_line(&self, args: &str) -> String {
    let binary = self.variant.binary();
    if self.elevate {
      format!("sudo {binary} {args}")
    } else {
      format!("{binary} {args}")
    }
  }

  async fn exec(&self, args: &str) -> command::ExecOutput {
    command::run(&self.command_line(args), None).await
  }
}

impl RuntimeDriver for CliRuntimeDriver {
  async fn create_network(
    &self,
    name: &str,
    labels: &BTreeMap<String, String>,
  ) -> Result<(), CoreError> {
    if self.inspect_network(name).await.is_ok() {
      return Ok(());
    }

    let mut args = String::from("network create --driver bridge");
    for (key, value) in labels {
      args.push_str(&format!(" --label {key}={value}"));
    }
    args.push(' ');
    args.push_str(name);

    let output = self.exec(&args).await;
    if output.success() || output.not_found() {
      return Ok(());
    }
    Err(CoreError::RuntimeFatal(format!(
      "failed to create network '{name}': {}",
      output.combined()
    )))
  }

  async fn remove_network(&self, name: &str) -> Result<(), CoreError> {
    let output = self.exec(&format!("network rm {name}")).await;
    if output.success() || output.not_found() {
      return Ok(());
    }
    Err(CoreError::RuntimeFatal(format!(
      "failed to remove network '{name}': {}",
      output.combined()
    )))
  }

  async fn inspect_network(
    &self,
    name: &str,
  ) -> Result<NetworkInspect, CoreError> {
    let output =
      self.exec(&format!("network inspect {name} --format json")).await;
    if output.not_found() {
      return Err(CoreError::NotFound(format!(
        "network '{name}' not found"
      )));
    }
    if !output.success() {
      return Err(CoreError::RuntimeFatal(format!(
        "failed to inspect network '{name}': {}",
        output.combined()
      )));
    }

    let raw: Vec<RawNetworkInspect> =
      serde_json::from_str(&output.stdout).map_err(|e| {
        CoreError::RuntimeFatal(format!(
          "failed to parse network inspect output for '{name}': {e:#}"
        ))
      })?;
    let raw = raw.into_iter().next().ok_or_else(|| {
      CoreError::NotFound(format!("network '{name}' not found"))
    })?;

    Ok(NetworkInspect {
      name: raw.name,
      id: raw.id,
      driver: raw.driver,
      labels: raw.labels,
      containers: raw.containers.into_keys().collect(),
    })
  }

  async fn list_networks(
    &self,
    label_filter: &str,
  ) -> Result<Vec<String>, CoreError> {
    let output = self
      .exec(&format!(
        "network ls --filter label={label_filter} --format {{{{.Name}}}}"
      ))
      .await;
    if !output.success() {
      return Err(CoreError::RuntimeFatal(format!(
        "failed to list networks: {}",
        output.combined()
      )));
    }
    Ok(
      output
        .stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect(),
    )
  }

  async fn list_containers_with_labels(
    &self,
    filter: &BTreeMap<String, String>,
  ) -> Result<Vec<String>, CoreError> {
    let mut args = String::from("ps -a");
    for (key, value) in filter {
      args.push_str(&format!(" --filter label={key}={value}"));
    }
    args.push_str(" --format {{.Names}}");

    let output = self.exec(&args).await;
    if !output.success() {
      return Err(CoreError::RuntimeFatal(format!(
        "failed to list containers: {}",
        output.combined()
      )));
    }
    Ok(
      output
        .stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect(),
    )
  }

  async fn run_compose(
    &self,
    project_name: &str,
    file: &Path,
    args: &[&str],
  ) -> Result<ComposeOutput, CoreError> {
    let file = file.display();
    let extra = args.join(" ");
    let full_args = format!(
      "{} -p {project_name} -f {file} {extra}",
      self.compose_subcommand
    );
    let output = self.exec(&full_args).await;
    Ok(ComposeOutput {
      stdout: output.stdout,
      stderr: output.stderr,
      exit_code: output.exit_code(),
    })
  }

  fn variant(&self) -> RuntimeVariant {
    self.variant
  }
}

#[derive(serde::Deserialize)]
struct RawNetworkInspect {
  #[serde(rename = "Name")]
  name: String,
  #[serde(rename = "Id")]
  id: String,
  #[serde(rename = "Driver")]
  driver: String,
  #[serde(rename = "Labels", default)]
  labels: BTreeMap<String, String>,
  #[serde(rename = "Containers", default)]
  containers: BTreeMap<String, serde_json::Value>,
}
