use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of trackable item kinds. Every dispatch on kind is an
/// exhaustive match; adding a kind is a compile-time exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ItemKind {
    /// A packaged build recipe tracked against the package index.
    Package,
    /// An external dependency locked to a revision in the lock document.
    PinnedReference,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Package => write!(f, "package"),
            ItemKind::PinnedReference => write!(f, "pinned-reference"),
        }
    }
}

/// One unit of update work, as enumerated by discovery. Immutable once
/// produced; consumed by exactly one orchestrator run and then discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixItem {
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub name: String,
    pub current_version: String,
}

impl MatrixItem {
    pub fn new(
        kind: ItemKind,
        name: impl Into<String>,
        current_version: impl Into<String>,
    ) -> Self {
        MatrixItem {
            kind,
            name: name.into(),
            current_version: current_version.into(),
        }
    }

    /// Deterministic branch name for the review proposal. Re-runs for the
    /// same item land on the same branch and supersede earlier pushes.
    pub fn branch_name(&self) -> String {
        match self.kind {
            ItemKind::Package => format!("update/{}", self.name),
            ItemKind::PinnedReference => format!("update/pinned/{}", self.name),
        }
    }
}

impl fmt::Display for MatrixItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.kind, self.name, self.current_version)
    }
}
