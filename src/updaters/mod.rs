// Updater modules, one per item kind.
//
// An updater owns the mutation for its kind: it rewrites the tree to the
// newest upstream version (or does nothing) and can read back the version
// that resulted. It never commits; diffing, validation and publishing
// belong to the orchestrator.

pub mod package;
pub mod pinned;

pub use package::PackageUpdater;
pub use pinned::PinnedUpdater;

use crate::error::Result;
use crate::item::{ItemKind, MatrixItem};

pub trait Updater: Send + Sync {
    /// Applies the update for the item; may mutate the tree or do nothing.
    fn apply(&self, item: &MatrixItem, platform: &str) -> Result<()>;

    /// Best-effort read of the authoritative version after `apply`;
    /// `None` when it cannot be determined.
    fn resolved_version(&self, item: &MatrixItem, platform: &str) -> Option<String>;
}

/// One updater per kind, selected exhaustively.
pub struct UpdaterSet<'a> {
    package: &'a dyn Updater,
    pinned: &'a dyn Updater,
}

impl<'a> UpdaterSet<'a> {
    pub fn new(package: &'a dyn Updater, pinned: &'a dyn Updater) -> Self {
        UpdaterSet { package, pinned }
    }

    pub fn for_kind(&self, kind: ItemKind) -> &'a dyn Updater {
        match kind {
            ItemKind::Package => self.package,
            ItemKind::PinnedReference => self.pinned,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct NamedUpdater {
        label: &'static str,
        applied: Mutex<Vec<String>>,
    }

    impl NamedUpdater {
        fn new(label: &'static str) -> Self {
            NamedUpdater {
                label,
                applied: Mutex::new(Vec::new()),
            }
        }
    }

    impl Updater for NamedUpdater {
        fn apply(&self, item: &MatrixItem, _platform: &str) -> Result<()> {
            self.applied.lock().unwrap().push(item.name.clone());
            Ok(())
        }

        fn resolved_version(&self, _item: &MatrixItem, _platform: &str) -> Option<String> {
            Some(self.label.to_string())
        }
    }

    #[test]
    fn test_selection_is_keyed_by_kind() {
        let package = NamedUpdater::new("package");
        let pinned = NamedUpdater::new("pinned");
        let set = UpdaterSet::new(&package, &pinned);

        let item = MatrixItem::new(ItemKind::Package, "bat", "0.24.0");
        assert_eq!(
            set.for_kind(ItemKind::Package)
                .resolved_version(&item, "x86_64-linux"),
            Some("package".to_string())
        );
        assert_eq!(
            set.for_kind(ItemKind::PinnedReference)
                .resolved_version(&item, "x86_64-linux"),
            Some("pinned".to_string())
        );

        set.for_kind(ItemKind::Package)
            .apply(&item, "x86_64-linux")
            .unwrap();
        assert_eq!(*package.applied.lock().unwrap(), vec!["bat"]);
        assert!(pinned.applied.lock().unwrap().is_empty());
    }
}
