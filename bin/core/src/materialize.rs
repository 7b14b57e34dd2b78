use std::{
  io::Write as _,
  os::unix::fs::PermissionsExt as _,
  path::{Path, PathBuf},
};

use stackyard_client::entities::ConfigFile;

use crate::error::CoreError;

/// Writes every instance's `config_files[]` to
/// `<config_root>/<instance_id>/<relative_path>`, mode as specified.
/// Each file is written atomically: write temp + fsync + rename. Returns
/// the stack's config directory so the caller can remove it wholesale
/// on a failure path.
pub async fn materialize(
  config_root: &Path,
  instances: &[(String, Vec<ConfigFile>)],
) -> Result<PathBuf, CoreError> {
  let config_root = config_root.to_path_buf();
  let instances = instances.to_vec();

  tokio::task::spawn_blocking(move || -> Result<PathBuf, CoreError> {
    for (instance_id, files) in &instances {
      let instance_dir = config_root.join(instance_id);
      std::fs::create_dir_all(&instance_dir).map_err(|e| {
        CoreError::FilesystemFatal(format!(
          "failed to create config directory {instance_dir:?}: {e}"
        ))
      })?;

      for file in files {
        let target = instance_dir.join(&file.file_path);
        if let Some(parent) = target.parent() {
          std::fs::create_dir_all(parent).map_err(|e| {
            CoreError::FilesystemFatal(format!(
              "failed to create directory {parent:?}: {e}"
            ))
          })?;
        }
        write_atomic(&target, &file.content, file.mode()).map_err(|e| {
          CoreError::FilesystemFatal(format!(
            "failed to write config file {target:?}: {e}"
          ))
        })?;
      }
    }
    Ok(config_root)
  })
  .await
  .map_err(|e| CoreError::FilesystemFatal(format!("join error: {e}")))?
}

fn write_atomic(
  target: &Path,
  content: &str,
  mode: u32,
) -> std::io::Result<()> {
  let parent = target.parent().unwrap_or_else(|| Path::new("."));
  let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
  tmp.write_all(content.as_bytes())?;
  tmp.flush()?;
  tmp.as_file().sync_all()?;
  tmp
    .as_file()
    .set_permissions(std::fs::Permissions::from_mode(mode))?;
  tmp.persist(target).map_err(|e| e.error)?;
  Ok(())
}

/// Removes the stack's whole config directory tree. Used both for
/// best-effort cleanup on materialize failure and for the
/// `removeAll`/`materialize` round trip that tests exercise.
pub async fn remove_all(config_root: &Path) -> Result<(), CoreError> {
  let config_root = config_root.to_path_buf();
  tokio::task::spawn_blocking(move || {
    match std::fs::remove_dir_all(&config_root) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(CoreError::FilesystemFatal(format!(
        "failed to remove config directory {config_root:?}: {e}"
      ))),
    }
  })
  .await
  .map_err(|e| CoreError::FilesystemFatal(format!("join error: {e}")))?
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn materialize_then_remove_then_materialize_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let config_root = dir.path().join("web");
    let files = vec![(
      "api".to_string(),
      vec![ConfigFile {
        file_path: "nginx.conf".to_string(),
        content: "server {}".to_string(),
        file_mode: Some(0o640),
      }],
    )];

    materialize(&config_root, &files).await.unwrap();
    let written = config_root.join("api").join("nginx.conf");
    assert_eq!(
      std::fs::read_to_string(&written).unwrap(),
      "server {}"
    );
    let mode =
      std::fs::metadata(&written).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o640);

    remove_all(&config_root).await.unwrap();
    assert!(!config_root.exists());

    materialize(&config_root, &files).await.unwrap();
    assert_eq!(
      std::fs::read_to_string(&written).unwrap(),
      "server {}"
    );
  }

  #[tokio::test]
  async fn remove_all_on_missing_directory_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does-not-exist");
    assert!(remove_all(&missing).await.is_ok());
  }

  #[tokio::test]
  async fn nested_relative_paths_create_intermediate_directories() {
    let dir = tempfile::tempdir().unwrap();
    let config_root = dir.path().join("web");
    let files = vec![(
      "api".to_string(),
      vec![ConfigFile {
        file_path: "conf.d/default.conf".to_string(),
        content: "ok".to_string(),
        file_mode: None,
      }],
    )];
    materialize(&config_root, &files).await.unwrap();
    assert!(
      config_root.join("api").join("conf.d").join("default.conf").exists()
    );
  }
}
