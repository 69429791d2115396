use crate::error::Result;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Reserved top-level node that anchors the input graph; never a
/// trackable reference of its own.
pub const ROOT_NODE: &str = "root";

/// Sentinel used when a node carries no locked revision.
pub const UNKNOWN_REVISION: &str = "unknown";

const SHORT_REV_LEN: usize = 8;

/// The lock-state document: a JSON object with a `nodes` map keyed by
/// reference name. Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct LockDocument {
    #[serde(default)]
    pub nodes: BTreeMap<String, LockNode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LockNode {
    #[serde(default)]
    pub locked: Option<LockedSource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LockedSource {
    #[serde(default)]
    pub rev: Option<String>,
}

impl LockDocument {
    /// Names of every tracked node except the reserved root entry,
    /// ascending.
    pub fn reference_names(&self) -> Vec<String> {
        self.nodes
            .keys()
            .filter(|name| name.as_str() != ROOT_NODE)
            .cloned()
            .collect()
    }

    /// Short revision for a node: the first 8 characters of `locked.rev`,
    /// or the `unknown` sentinel when no revision is recorded. `None` when
    /// the node itself does not exist.
    pub fn short_revision(&self, name: &str) -> Option<String> {
        let node = self.nodes.get(name)?;
        let rev = node.locked.as_ref().and_then(|locked| locked.rev.as_deref());
        Some(match rev {
            Some(rev) => rev.chars().take(SHORT_REV_LEN).collect(),
            None => UNKNOWN_REVISION.to_string(),
        })
    }
}

/// Reads the lock document. A missing file is `None`, not an error; the
/// pinned-reference class is optional for a repository.
pub fn read_lock_document(path: &Path) -> Result<Option<LockDocument>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
}
