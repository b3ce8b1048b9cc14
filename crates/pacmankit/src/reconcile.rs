//! Native package convergence.
//!
//! Brings the set of explicitly installed native packages to exactly the
//! declared set (plus the members of declared groups):
//! - Packages installed explicitly but not declared are removed in one batch
//! - Declared packages that are not installed are installed in one batch
//!
//! Removal runs first. `pacman -Rsu` also drops dependencies that become
//! orphaned, which can include a declared package that was only present as
//! a dependency, so the missing set is computed after it.

use crate::backend::Backend;
use crate::error::Result;
use crate::types::PackagePlan;
use declarative::SetDiff;
use std::collections::{BTreeMap, BTreeSet};

/// Progress notifications from the reconcilers.
///
/// Every method has a no-op default.
pub trait ReconcileCallback {
    /// Before a batched native removal.
    fn on_remove(&mut self, _names: &BTreeSet<String>) {}

    /// Before a batched native install.
    fn on_install(&mut self, _names: &BTreeSet<String>) {}

    /// Before building one foreign package.
    fn on_build(&mut self, _name: &str, _version: &str) {}

    /// Before a batched foreign removal.
    fn on_remove_foreign(&mut self, _names: &BTreeSet<String>) {}
}

/// Callback that ignores everything.
pub struct NoCallback;

impl ReconcileCallback for NoCallback {}

/// Declared package set with its group expansion resolved.
pub struct PackageReconciler<'a> {
    backend: &'a dyn Backend,
    desired: &'a BTreeSet<String>,
    groups: BTreeMap<String, BTreeSet<String>>,
}

impl<'a> PackageReconciler<'a> {
    /// Resolve group membership for `desired`.
    ///
    /// An empty desired set issues no group query.
    pub fn new(backend: &'a dyn Backend, desired: &'a BTreeSet<String>) -> Result<Self> {
        let groups = if desired.is_empty() {
            BTreeMap::new()
        } else {
            backend.group_members(desired)?
        };
        Ok(Self {
            backend,
            desired,
            groups,
        })
    }

    /// Declared names plus every member of a declared group.
    pub fn should_exist(&self) -> BTreeSet<String> {
        let mut all = self.desired.clone();
        for members in self.groups.values() {
            all.extend(members.iter().cloned());
        }
        all
    }

    /// Explicitly installed native packages that nothing declares.
    pub fn unneeded(&self) -> Result<BTreeSet<String>> {
        let installed = self.backend.explicit_native()?;
        Ok(SetDiff::between(&self.should_exist(), &installed).extra)
    }

    /// Declared names that are not installed.
    ///
    /// A group counts as installed when every one of its members is.
    pub fn missing(&self) -> Result<BTreeSet<String>> {
        let mut missing = BTreeSet::new();
        for name in self.desired {
            if !self.is_present(name)? {
                missing.insert(name.clone());
            }
        }
        Ok(missing)
    }

    fn is_present(&self, name: &str) -> Result<bool> {
        match self.groups.get(name) {
            Some(members) if !members.is_empty() => {
                for member in members {
                    if !self.backend.is_installed(member)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            _ => self.backend.is_installed(name),
        }
    }

    /// Remove what is unneeded, then install what is missing.
    pub fn converge(&self, callback: &mut dyn ReconcileCallback) -> Result<PackagePlan> {
        let remove = self.unneeded()?;
        if !remove.is_empty() {
            callback.on_remove(&remove);
            self.backend.remove(&remove)?;
        }

        let install = self.missing()?;
        if !install.is_empty() {
            callback.on_install(&install);
            self.backend.install(&install)?;
        }

        Ok(PackagePlan { remove, install })
    }
}

/// Converge native packages to `desired`, returning what was changed.
pub fn converge_packages(
    backend: &dyn Backend,
    desired: &BTreeSet<String>,
    callback: &mut dyn ReconcileCallback,
) -> Result<PackagePlan> {
    PackageReconciler::new(backend, desired)?.converge(callback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBackend;
    use declarative::name_set;

    /// installed={A,B,C}, desired={B,D}, D is a group of {E}
    fn example() -> MockBackend {
        let backend = MockBackend::new();
        backend.set_explicit(["A", "B", "C"]);
        backend.add_group("D", ["E"]);
        backend
    }

    #[test]
    fn test_removes_undeclared_and_installs_missing() {
        let backend = example();
        let desired = name_set(["B", "D"]);

        let reconciler = PackageReconciler::new(&backend, &desired).unwrap();
        assert_eq!(reconciler.should_exist(), name_set(["B", "D", "E"]));

        let plan = reconciler.converge(&mut NoCallback).unwrap();
        assert_eq!(plan.remove, name_set(["A", "C"]));
        assert_eq!(plan.install, name_set(["D"]));
        assert_eq!(
            backend.calls(),
            vec!["groups B D", "remove A C", "install D"]
        );
    }

    #[test]
    fn test_second_run_is_a_no_op() {
        let backend = example();
        let desired = name_set(["B", "D"]);
        converge_packages(&backend, &desired, &mut NoCallback).unwrap();
        backend.clear_calls();

        let plan = converge_packages(&backend, &desired, &mut NoCallback).unwrap();
        assert!(plan.is_empty());
        assert_eq!(backend.calls(), vec!["groups B D"]);
    }

    #[test]
    fn test_empty_desired_makes_no_group_query_or_install() {
        let backend = MockBackend::new();
        backend.set_explicit(["A"]);

        let plan = converge_packages(&backend, &BTreeSet::new(), &mut NoCallback).unwrap();
        assert_eq!(plan.remove, name_set(["A"]));
        assert!(plan.install.is_empty());
        assert_eq!(backend.calls(), vec!["remove A"]);
    }

    #[test]
    fn test_nothing_unneeded_means_no_removal() {
        let backend = MockBackend::new();
        backend.set_explicit(["git"]);

        let plan = converge_packages(&backend, &name_set(["git", "vim"]), &mut NoCallback).unwrap();
        assert!(plan.remove.is_empty());
        assert_eq!(backend.calls(), vec!["groups git vim", "install vim"]);
    }

    #[test]
    fn test_dependency_installed_package_is_not_reinstalled() {
        // Installed as a dependency: absent from the explicit set but present
        let backend = MockBackend::new();
        backend.set_installed_dependency("openssl");

        let plan = converge_packages(&backend, &name_set(["openssl"]), &mut NoCallback).unwrap();
        assert!(plan.is_empty());
    }

    #[test]
    fn test_partially_installed_group_is_missing() {
        let backend = MockBackend::new();
        backend.add_group("base-devel", ["make", "gcc"]);
        backend.set_explicit(["make"]);

        let desired = name_set(["base-devel"]);
        let plan = converge_packages(&backend, &desired, &mut NoCallback).unwrap();
        assert!(plan.remove.is_empty());
        assert_eq!(plan.install, name_set(["base-devel"]));
    }

    #[test]
    fn test_callback_sees_batches() {
        #[derive(Default)]
        struct Seen(Vec<String>);
        impl ReconcileCallback for Seen {
            fn on_remove(&mut self, names: &BTreeSet<String>) {
                self.0.push(format!("-{}", names.len()));
            }
            fn on_install(&mut self, names: &BTreeSet<String>) {
                self.0.push(format!("+{}", names.len()));
            }
        }

        let backend = example();
        let mut seen = Seen::default();
        converge_packages(&backend, &name_set(["B", "D"]), &mut seen).unwrap();
        assert_eq!(seen.0, vec!["-2", "+1"]);
    }
}
