use super::Updater;
use crate::error::{Result, TreekeeperError};
use crate::item::MatrixItem;
use crate::process::{CommandRunner, CommandSpec};
use log::debug;
use std::path::PathBuf;
use std::sync::Arc;

/// Updates a packaged recipe by delegating to the external recipe update
/// tool, which fetches new release metadata and rewrites the recipe file
/// in place.
pub struct PackageUpdater {
    runner: Arc<dyn CommandRunner>,
    repo_root: PathBuf,
}

impl PackageUpdater {
    pub fn new(runner: Arc<dyn CommandRunner>, repo_root: impl Into<PathBuf>) -> Self {
        PackageUpdater {
            runner,
            repo_root: repo_root.into(),
        }
    }
}

impl Updater for PackageUpdater {
    fn apply(&self, item: &MatrixItem, platform: &str) -> Result<()> {
        let spec = CommandSpec::new("nix-update", &self.repo_root)
            .args(["--flake", "--system", platform])
            .arg(&item.name);

        let output = self.runner.run(&spec).map_err(|e| {
            TreekeeperError::DelegateUpdate {
                name: item.name.clone(),
                message: e.to_string(),
            }
        })?;

        if !output.success() {
            return Err(TreekeeperError::DelegateUpdate {
                name: item.name.clone(),
                message: format!(
                    "'{}' failed: {}",
                    spec.display_line(),
                    output.stderr_trimmed()
                ),
            });
        }
        Ok(())
    }

    fn resolved_version(&self, item: &MatrixItem, platform: &str) -> Option<String> {
        let spec = CommandSpec::new("nix", &self.repo_root)
            .args(["eval", "--raw"])
            .arg(format!(".#packages.{platform}.{}.version", item.name));

        match self.runner.run(&spec) {
            Ok(output) if output.success() => {
                let version = output.stdout.trim().to_string();
                if version.is_empty() { None } else { Some(version) }
            }
            Ok(output) => {
                debug!(
                    "Version eval for '{}' failed: {}",
                    item.name,
                    output.stderr_trimmed()
                );
                None
            }
            Err(e) => {
                debug!("Version eval for '{}' failed: {e}", item.name);
                None
            }
        }
    }
}
