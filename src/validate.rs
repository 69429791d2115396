use crate::config::Config;
use crate::error::{Result, TreekeeperError};
use crate::item::{ItemKind, MatrixItem};
use crate::process::{CommandRunner, CommandSpec};
use std::path::PathBuf;
use std::sync::Arc;

/// Kind-specific build/check validation; nothing is published unless the
/// updated tree passes.
pub trait Validator: Send + Sync {
    fn validate(&self, item: &MatrixItem) -> Result<()>;
}

/// Production validator: builds the recipe for packages, checks the flake
/// for pinned references.
pub struct NixValidator {
    runner: Arc<dyn CommandRunner>,
    repo_root: PathBuf,
    platform: String,
}

impl NixValidator {
    pub fn new(runner: Arc<dyn CommandRunner>, config: &Config) -> Self {
        NixValidator {
            runner,
            repo_root: config.repo_root.clone(),
            platform: config.platform.clone(),
        }
    }
}

impl Validator for NixValidator {
    fn validate(&self, item: &MatrixItem) -> Result<()> {
        let spec = match item.kind {
            ItemKind::Package => CommandSpec::new("nix", &self.repo_root)
                .arg("build")
                .arg(format!(".#packages.{}.{}", self.platform, item.name))
                .arg("--no-link"),
            ItemKind::PinnedReference => CommandSpec::new("nix", &self.repo_root)
                .args(["flake", "check", "--no-build"]),
        };

        let output = self.runner.run(&spec).map_err(|e| {
            TreekeeperError::Validation {
                name: item.name.clone(),
                message: e.to_string(),
            }
        })?;

        if !output.success() {
            return Err(TreekeeperError::Validation {
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
}
