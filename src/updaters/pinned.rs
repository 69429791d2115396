use super::Updater;
use crate::error::{Result, TreekeeperError};
use crate::item::MatrixItem;
use crate::lock::read_lock_document;
use crate::process::{CommandRunner, CommandSpec};
use log::debug;
use std::path::PathBuf;
use std::sync::Arc;

/// Updates a pinned reference by re-locking that single input in the lock
/// document.
pub struct PinnedUpdater {
    runner: Arc<dyn CommandRunner>,
    repo_root: PathBuf,
    lock_document: String,
}

impl PinnedUpdater {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        repo_root: impl Into<PathBuf>,
        lock_document: impl Into<String>,
    ) -> Self {
        PinnedUpdater {
            runner,
            repo_root: repo_root.into(),
            lock_document: lock_document.into(),
        }
    }
}

impl Updater for PinnedUpdater {
    fn apply(&self, item: &MatrixItem, _platform: &str) -> Result<()> {
        let spec = CommandSpec::new("nix", &self.repo_root)
            .args(["flake", "lock", "--update-input"])
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

    fn resolved_version(&self, item: &MatrixItem, _platform: &str) -> Option<String> {
        let path = self.repo_root.join(&self.lock_document);
        match read_lock_document(&path) {
            Ok(Some(document)) => document.short_revision(&item.name),
            Ok(None) => None,
            Err(e) => {
                debug!("Could not re-read '{}': {e}", path.display());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemKind;
    use crate::process::testing::ScriptedRunner;
    use std::fs;
    use tempfile::tempdir;

    fn item() -> MatrixItem {
        MatrixItem::new(ItemKind::PinnedReference, "nixpkgs", "abcdef01")
    }

    #[test]
    fn test_apply_relocks_the_single_input() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push_ok("");

        let updater = PinnedUpdater::new(runner.clone(), "/repo", "flake.lock");
        updater.apply(&item(), "x86_64-linux").unwrap();

        assert_eq!(
            runner.call_lines(),
            vec!["nix flake lock --update-input nixpkgs"]
        );
    }

    #[test]
    fn test_apply_failure_names_the_item() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.push_exit(1, "", "input 'nixpkgs' not found");

        let updater = PinnedUpdater::new(runner, "/repo", "flake.lock");
        let err = updater.apply(&item(), "x86_64-linux").unwrap_err();
        assert!(matches!(err, TreekeeperError::DelegateUpdate { .. }));
        assert!(err.to_string().contains("nixpkgs"));
    }

    #[test]
    fn test_resolved_version_reads_the_new_lock_revision() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("flake.lock"),
            r#"{"nodes":{"nixpkgs":{"locked":{"rev":"fedcba9876543210"}},"root":{}}}"#,
        )
        .unwrap();

        let runner = Arc::new(ScriptedRunner::new());
        let updater = PinnedUpdater::new(runner, dir.path(), "flake.lock");
        assert_eq!(
            updater.resolved_version(&item(), "x86_64-linux"),
            Some("fedcba98".to_string())
        );
    }

    #[test]
    fn test_resolved_version_none_without_lock_document() {
        let dir = tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::new());
        let updater = PinnedUpdater::new(runner, dir.path(), "flake.lock");
        assert_eq!(updater.resolved_version(&item(), "x86_64-linux"), None);
    }
}
