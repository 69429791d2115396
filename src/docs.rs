use crate::config::Config;
use crate::error::{Result, TreekeeperError};
use crate::index::PackageIndex;
use log::info;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Regenerates the managed documentation block. Idempotent: a second run
/// with unchanged inputs leaves the document byte-identical.
pub trait DocsRegenerator: Send + Sync {
    fn regenerate(&self) -> Result<()>;
}

/// Replaces the text strictly between the begin and end markers with
/// `replacement`, preserving the markers and everything outside them.
pub fn splice_between(
    document: &str,
    begin_marker: &str,
    end_marker: &str,
    replacement: &str,
) -> Result<String> {
    let begin_at = document.find(begin_marker).ok_or_else(|| {
        TreekeeperError::DocsRegeneration(format!("Begin marker '{begin_marker}' not found"))
    })?;
    let after_begin = begin_at + begin_marker.len();

    let end_at = document[after_begin..]
        .find(end_marker)
        .map(|offset| after_begin + offset)
        .ok_or_else(|| {
            TreekeeperError::DocsRegeneration(format!(
                "End marker '{end_marker}' not found after the begin marker"
            ))
        })?;

    let mut updated = String::with_capacity(document.len() + replacement.len());
    updated.push_str(&document[..after_begin]);
    updated.push_str(replacement);
    updated.push_str(&document[end_at..]);
    Ok(updated)
}

/// Renders the package table written between the markers. Stable order
/// keeps regeneration idempotent; unresolvable packages are omitted.
pub fn render_package_table(versions: &BTreeMap<String, Option<String>>) -> String {
    let mut table = String::from("| Package | Version |\n| --- | --- |\n");
    for (name, version) in versions {
        if let Some(version) = version {
            table.push_str(&format!("| {name} | {version} |\n"));
        }
    }
    table
}

/// Production regenerator: rewrites the package table in the configured
/// document from the package index.
pub struct MarkerDocs {
    index: Arc<dyn PackageIndex>,
    document_path: PathBuf,
    begin_marker: String,
    end_marker: String,
    platform: String,
}

impl MarkerDocs {
    pub fn new(index: Arc<dyn PackageIndex>, config: &Config) -> Self {
        MarkerDocs {
            index,
            document_path: config.docs_path(),
            begin_marker: config.docs_begin_marker.clone(),
            end_marker: config.docs_end_marker.clone(),
            platform: config.platform.clone(),
        }
    }
}

impl DocsRegenerator for MarkerDocs {
    fn regenerate(&self) -> Result<()> {
        if !self.document_path.exists() {
            info!(
                "Document '{}' does not exist, skipping docs regeneration",
                self.document_path.display()
            );
            return Ok(());
        }

        let document = std::fs::read_to_string(&self.document_path)?;
        let versions = self.index.versions(None, &self.platform).map_err(|e| {
            TreekeeperError::DocsRegeneration(format!("Package index query failed: {e}"))
        })?;

        let table = render_package_table(&versions);
        let updated = splice_between(
            &document,
            &self.begin_marker,
            &self.end_marker,
            &format!("\n{table}"),
        )?;

        if updated != document {
            std::fs::write(&self.document_path, updated)?;
        }
        Ok(())
    }
}
