//! Foreign (AUR) package convergence.
//!
//! Each declared package is fetched if needed and rebuilt only when the
//! PKGBUILD's `pkgver` differs from the installed version. Foreign packages
//! nobody declared are removed in one batch afterwards.

use crate::backend::{Backend, ForeignBuilder};
use crate::error::Result;
use crate::reconcile::ReconcileCallback;
use crate::types::{ForeignReport, base_version};
use declarative::SetDiff;
use std::collections::BTreeSet;

/// Converge foreign packages to `declared`.
///
/// `declared` is built in the order given; duplicates are built once.
pub fn converge_foreign(
    backend: &dyn Backend,
    builder: &dyn ForeignBuilder,
    declared: &[String],
    callback: &mut dyn ReconcileCallback,
) -> Result<ForeignReport> {
    let mut report = ForeignReport::default();
    let mut seen = BTreeSet::new();

    for name in declared {
        if !seen.insert(name.clone()) {
            continue;
        }

        let dir = builder.ensure_source(name)?;
        let wanted = builder.manifest_version(&dir)?;
        let installed = backend.installed_version(name)?;

        if installed.as_deref().map(base_version) == Some(wanted.as_str()) {
            log::debug!("{name}: {wanted} already installed");
            continue;
        }

        log::info!(
            "{name}: building {wanted} (installed: {})",
            installed.as_deref().unwrap_or("none")
        );
        callback.on_build(name, &wanted);
        builder.build_install(&dir)?;
        report.built.push(name.clone());
    }

    let foreign: BTreeSet<String> = backend
        .list_foreign()?
        .into_iter()
        .map(|p| p.name)
        .collect();
    let unneeded = SetDiff::between(&seen, &foreign).extra;
    if !unneeded.is_empty() {
        callback.on_remove_foreign(&unneeded);
        backend.remove(&unneeded)?;
        report.removed = unneeded;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::NoCallback;
    use crate::testing::{MockBackend, MockBuilder};
    use declarative::name_set;
    use std::sync::Arc;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_matching_version_is_not_rebuilt() {
        let backend = Arc::new(MockBackend::new());
        backend.set_foreign("paru", "2.0.3-1");
        let builder = MockBuilder::new(backend.clone());
        builder.set_pkgver("paru", "2.0.3");

        let report = converge_foreign(&*backend, &builder, &names(&["paru"]), &mut NoCallback).unwrap();
        assert!(report.built.is_empty());
        assert!(report.removed.is_empty());
        assert!(builder.builds().is_empty());
    }

    #[test]
    fn test_mismatch_builds_once_in_package_dir() {
        let backend = Arc::new(MockBackend::new());
        backend.set_foreign("paru", "2.0.2-1");
        let builder = MockBuilder::new(backend.clone());
        builder.set_pkgver("paru", "2.0.3");

        let report = converge_foreign(&*backend, &builder, &names(&["paru"]), &mut NoCallback).unwrap();
        assert_eq!(report.built, vec!["paru"]);
        assert_eq!(builder.builds(), vec![builder.dir_for("paru")]);
    }

    #[test]
    fn test_not_installed_is_built_then_stable() {
        let backend = Arc::new(MockBackend::new());
        let builder = MockBuilder::new(backend.clone());
        builder.set_pkgver("yay", "12.0");

        let declared = names(&["yay", "yay"]);
        let first = converge_foreign(&*backend, &builder, &declared, &mut NoCallback).unwrap();
        assert_eq!(first.built, vec!["yay"]);

        let second = converge_foreign(&*backend, &builder, &declared, &mut NoCallback).unwrap();
        assert!(second.built.is_empty());
        assert_eq!(builder.builds().len(), 1);
    }

    #[test]
    fn test_undeclared_foreign_removed_in_one_batch() {
        let backend = Arc::new(MockBackend::new());
        backend.set_foreign("paru", "2.0.3-1");
        backend.set_foreign("old-a", "1-1");
        backend.set_foreign("old-b", "1-1");
        let builder = MockBuilder::new(backend.clone());
        builder.set_pkgver("paru", "2.0.3");

        let report = converge_foreign(&*backend, &builder, &names(&["paru"]), &mut NoCallback).unwrap();
        assert_eq!(report.removed, name_set(["old-a", "old-b"]));
        assert_eq!(backend.calls(), vec!["remove old-a old-b"]);
    }

    #[test]
    fn test_missing_pkgver_is_an_error() {
        let backend = Arc::new(MockBackend::new());
        let builder = MockBuilder::new(backend.clone());

        let err = converge_foreign(&*backend, &builder, &names(&["broken"]), &mut NoCallback).unwrap_err();
        assert!(err.to_string().contains("pkgver"));
    }
}
