use crate::config::Config;
use crate::error::Result;
use crate::index::PackageIndex;
use crate::item::{ItemKind, MatrixItem};
use crate::lock::read_lock_document;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{info, warn};
use serde::Serialize;
use std::io::{IsTerminal, Write};
use std::path::Path;
use std::time::Duration;

/// Machine-readable worklist: package items first, then pinned-reference
/// items, each group ascending by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Matrix {
    pub include: Vec<MatrixItem>,
}

impl Matrix {
    pub fn has_items(&self) -> bool {
        !self.include.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Writes `matrix=<json>` and `has_items=<bool>` to the results
    /// channel when configured, else echoes both lines to stdout.
    pub fn emit(&self, results_path: Option<&Path>) -> Result<()> {
        let matrix_line = format!("matrix={}", self.to_json()?);
        let flag_line = format!("has_items={}", self.has_items());

        match results_path {
            Some(path) => {
                let mut file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)?;
                writeln!(file, "{matrix_line}")?;
                writeln!(file, "{flag_line}")?;
            }
            None => {
                println!("{matrix_line}");
                println!("{flag_line}");
            }
        }
        Ok(())
    }
}

/// Parses a whitespace-separated name filter. An omitted or blank value
/// means "no filter": enumerate the whole universe for that kind.
pub fn parse_filter(raw: Option<&str>) -> Option<Vec<String>> {
    let raw = raw?;
    let mut names: Vec<String> = raw.split_whitespace().map(str::to_string).collect();
    if names.is_empty() {
        return None;
    }
    names.sort();
    names.dedup();
    Some(names)
}

/// Enumerates updatable items of both kinds from read-only collaborators.
/// A failing query degrades that kind to an empty set instead of aborting
/// discovery as a whole.
pub struct CandidateDiscovery<'a> {
    index: &'a dyn PackageIndex,
    config: &'a Config,
}

impl<'a> CandidateDiscovery<'a> {
    pub fn new(index: &'a dyn PackageIndex, config: &'a Config) -> Self {
        CandidateDiscovery { index, config }
    }

    pub fn discover(
        &self,
        package_filter: Option<&str>,
        pinned_filter: Option<&str>,
    ) -> Matrix {
        let mut include = self.discover_packages(parse_filter(package_filter));
        include.extend(self.discover_pinned(parse_filter(pinned_filter)));
        Matrix { include }
    }

    fn discover_packages(&self, filter: Option<Vec<String>>) -> Vec<MatrixItem> {
        let spinner = index_spinner(&self.config.platform);
        let queried = self
            .index
            .versions(filter.as_deref(), &self.config.platform);
        spinner.finish_and_clear();

        let versions = match queried {
            Ok(versions) => versions,
            Err(e) => {
                warn!("Package index query failed, skipping package discovery: {e}");
                return Vec::new();
            }
        };

        let mut items = Vec::new();
        match filter {
            Some(names) => {
                for name in names {
                    match versions.get(&name) {
                        Some(Some(version)) => {
                            items.push(MatrixItem::new(ItemKind::Package, name, version));
                        }
                        Some(None) => {
                            warn!("Package '{name}' has no resolvable version, skipping");
                        }
                        None => {
                            warn!("Package '{name}' not found in the index, skipping");
                        }
                    }
                }
            }
            None => {
                for (name, version) in versions {
                    match version {
                        Some(version) => {
                            items.push(MatrixItem::new(ItemKind::Package, name, version));
                        }
                        None => {
                            info!("Package '{name}' has no resolvable version, skipping");
                        }
                    }
                }
            }
        }
        items
    }

    fn discover_pinned(&self, filter: Option<Vec<String>>) -> Vec<MatrixItem> {
        let lock_path = self.config.lock_path();
        let document = match read_lock_document(&lock_path) {
            Ok(Some(document)) => document,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(
                    "Could not read lock document '{}', skipping pinned discovery: {e}",
                    lock_path.display()
                );
                return Vec::new();
            }
        };

        let names = match filter {
            Some(names) => names,
            None => document.reference_names(),
        };

        names
            .into_iter()
            .filter_map(|name| {
                // Filtered names with no node are skipped without warning,
                // unlike the package path.
                let revision = document.short_revision(&name)?;
                Some(MatrixItem::new(ItemKind::PinnedReference, name, revision))
            })
            .collect()
    }
}

fn index_spinner(platform: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if !std::io::stderr().is_terminal() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {spinner} {msg}")
            .unwrap(),
    );
    pb.set_message(format!("Querying package index for {platform}..."));
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}
