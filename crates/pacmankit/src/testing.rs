//! In-memory [`Backend`] and [`ForeignBuilder`] for tests.

use crate::backend::{Backend, ForeignBuilder};
use crate::error::{Error, Result};
use crate::types::InstalledPackage;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Db {
    explicit: BTreeSet<String>,
    dependencies: BTreeSet<String>,
    groups: BTreeMap<String, BTreeSet<String>>,
    foreign: BTreeMap<String, String>,
    calls: Vec<String>,
}

/// A package database held in memory.
///
/// Mutations are recorded as `groups ...`, `install ...` and `remove ...`.
#[derive(Debug, Default)]
pub struct MockBackend {
    db: Mutex<Db>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn db(&self) -> MutexGuard<'_, Db> {
        self.db.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Mark packages as explicitly installed.
    pub fn set_explicit<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.db().explicit.extend(names.into_iter().map(Into::into));
    }

    /// Mark a package as installed only as a dependency.
    pub fn set_installed_dependency(&self, name: &str) {
        self.db().dependencies.insert(name.to_string());
    }

    /// Declare a sync-database group.
    pub fn add_group<I, S>(&self, group: &str, members: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.db()
            .groups
            .insert(group.to_string(), members.into_iter().map(Into::into).collect());
    }

    /// Mark a foreign package as installed at `version`.
    pub fn set_foreign(&self, name: &str, version: &str) {
        self.db().foreign.insert(name.to_string(), version.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.db().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.db().calls.clear();
    }
}

fn joined(names: &BTreeSet<String>) -> String {
    names.iter().cloned().collect::<Vec<_>>().join(" ")
}

impl Backend for MockBackend {
    fn explicit_native(&self) -> Result<BTreeSet<String>> {
        Ok(self.db().explicit.clone())
    }

    fn group_members(&self, names: &BTreeSet<String>) -> Result<BTreeMap<String, BTreeSet<String>>> {
        let mut db = self.db();
        db.calls.push(format!("groups {}", joined(names)));
        Ok(db
            .groups
            .iter()
            .filter(|(group, _)| names.contains(*group))
            .map(|(group, members)| (group.clone(), members.clone()))
            .collect())
    }

    fn is_installed(&self, name: &str) -> Result<bool> {
        let db = self.db();
        Ok(db.explicit.contains(name)
            || db.dependencies.contains(name)
            || db.foreign.contains_key(name))
    }

    fn installed_version(&self, name: &str) -> Result<Option<String>> {
        Ok(self.db().foreign.get(name).cloned())
    }

    fn list_foreign(&self) -> Result<Vec<InstalledPackage>> {
        Ok(self
            .db()
            .foreign
            .iter()
            .map(|(name, version)| InstalledPackage {
                name: name.clone(),
                version: version.clone(),
            })
            .collect())
    }

    fn install(&self, names: &BTreeSet<String>) -> Result<()> {
        let mut db = self.db();
        db.calls.push(format!("install {}", joined(names)));
        for name in names {
            // Installing a group installs its members explicitly
            let members = db.groups.get(name).cloned();
            match members {
                Some(members) => db.explicit.extend(members),
                None => {
                    db.explicit.insert(name.clone());
                }
            }
        }
        Ok(())
    }

    fn remove(&self, names: &BTreeSet<String>) -> Result<()> {
        let mut db = self.db();
        db.calls.push(format!("remove {}", joined(names)));
        for name in names {
            db.explicit.remove(name);
            db.dependencies.remove(name);
            db.foreign.remove(name);
        }
        Ok(())
    }
}

/// Builder whose sources are a map of name → pkgver.
///
/// A build installs the package into the paired [`MockBackend`] as
/// `<pkgver>-1`.
#[derive(Debug)]
pub struct MockBuilder {
    backend: Arc<MockBackend>,
    pkgvers: Mutex<BTreeMap<String, String>>,
    builds: Mutex<Vec<PathBuf>>,
}

impl MockBuilder {
    pub fn new(backend: Arc<MockBackend>) -> Self {
        Self {
            backend,
            pkgvers: Mutex::new(BTreeMap::new()),
            builds: Mutex::new(Vec::new()),
        }
    }

    pub fn set_pkgver(&self, name: &str, version: &str) {
        self.pkgvers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_string(), version.to_string());
    }

    /// Build directory used for `name`.
    pub fn dir_for(&self, name: &str) -> PathBuf {
        PathBuf::from("/cache/aur").join(name)
    }

    /// Directories built, in order.
    pub fn builds(&self) -> Vec<PathBuf> {
        self.builds.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn name_of(dir: &Path) -> String {
        dir.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

impl ForeignBuilder for MockBuilder {
    fn ensure_source(&self, name: &str) -> Result<PathBuf> {
        Ok(self.dir_for(name))
    }

    fn manifest_version(&self, dir: &Path) -> Result<String> {
        self.pkgvers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&Self::name_of(dir))
            .cloned()
            .ok_or_else(|| Error::MissingPkgver {
                path: dir.join("PKGBUILD"),
            })
    }

    fn build_install(&self, dir: &Path) -> Result<()> {
        let version = self.manifest_version(dir)?;
        self.backend
            .set_foreign(&Self::name_of(dir), &format!("{version}-1"));
        self.builds
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(dir.to_path_buf());
        Ok(())
    }
}
