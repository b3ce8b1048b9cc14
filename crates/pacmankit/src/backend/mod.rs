//! Backend abstraction for package operations.
//!
//! The [`Backend`] trait covers everything the reconcilers need from pacman,
//! and [`ForeignBuilder`] covers fetching and building AUR sources, so both
//! can be replaced with in-memory mocks in tests.

pub mod aur;
pub mod pacman;

use crate::error::Result;
use crate::types::InstalledPackage;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Package manager operations.
pub trait Backend: Send + Sync {
    /// Explicitly installed, unrequired, native packages.
    fn explicit_native(&self) -> Result<BTreeSet<String>>;

    /// Members of each name in `names` that is a package group.
    ///
    /// Names that are not groups are absent from the result.
    fn group_members(&self, names: &BTreeSet<String>) -> Result<BTreeMap<String, BTreeSet<String>>>;

    /// Whether a single package is installed.
    fn is_installed(&self, name: &str) -> Result<bool>;

    /// Installed version of a package, if installed.
    fn installed_version(&self, name: &str) -> Result<Option<String>>;

    /// Installed packages that come from no sync database.
    fn list_foreign(&self) -> Result<Vec<InstalledPackage>>;

    /// Install packages in one batch.
    fn install(&self, names: &BTreeSet<String>) -> Result<()>;

    /// Remove packages and their no-longer-needed dependencies in one batch.
    fn remove(&self, names: &BTreeSet<String>) -> Result<()>;
}

/// Source fetching and building for foreign packages.
pub trait ForeignBuilder: Send + Sync {
    /// Make the package's build directory present, returning it.
    fn ensure_source(&self, name: &str) -> Result<PathBuf>;

    /// The version the build directory would produce.
    fn manifest_version(&self, dir: &Path) -> Result<String>;

    /// Build the package and install it.
    fn build_install(&self, dir: &Path) -> Result<()>;
}
