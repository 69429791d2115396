use crate::error::{Result, TreekeeperError};
use crate::process::{CommandRunner, CommandSpec};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Read-only view of the package index for one platform.
///
/// The result maps package name to its advertised version; a `None` value
/// means the name exists but no version is resolvable. A name missing from
/// the map entirely was not known to the index at all.
pub trait PackageIndex: Send + Sync {
    /// Query once for `{name -> version | absent}`, over all known names
    /// or restricted to exactly `filter` when given.
    fn versions(
        &self,
        filter: Option<&[String]>,
        platform: &str,
    ) -> Result<BTreeMap<String, Option<String>>>;
}

const VERSION_MAP_EXPR: &str = "pkgs: builtins.mapAttrs (_: p: p.version or null) pkgs";

/// Production index backed by one `nix eval` of the flake's package set.
/// Filtering subsets the single evaluation; it never issues per-name
/// queries.
pub struct NixIndex {
    runner: Arc<dyn CommandRunner>,
    repo_root: PathBuf,
}

impl NixIndex {
    pub fn new(runner: Arc<dyn CommandRunner>, repo_root: impl Into<PathBuf>) -> Self {
        NixIndex {
            runner,
            repo_root: repo_root.into(),
        }
    }
}

impl PackageIndex for NixIndex {
    fn versions(
        &self,
        filter: Option<&[String]>,
        platform: &str,
    ) -> Result<BTreeMap<String, Option<String>>> {
        let spec = CommandSpec::new("nix", &self.repo_root)
            .arg("eval")
            .arg(format!(".#packages.{platform}"))
            .args(["--apply", VERSION_MAP_EXPR, "--json"]);

        let output = self.runner.run(&spec)?;
        if !output.success() {
            return Err(TreekeeperError::Process(format!(
                "'{}' failed: {}",
                spec.display_line(),
                output.stderr_trimmed()
            )));
        }

        let mut versions: BTreeMap<String, Option<String>> =
            serde_json::from_str(&output.stdout)?;

        if let Some(filter) = filter {
            versions.retain(|name, _| filter.iter().any(|wanted| wanted == name));
        }

        Ok(versions)
    }
}
