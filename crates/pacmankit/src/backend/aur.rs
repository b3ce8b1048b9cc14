//! AUR source builder using `git` and `makepkg`.

use crate::backend::ForeignBuilder;
use crate::error::Result;
use crate::pkgbuild::read_pkgver;
use declarative::{CommandSpec, Executor};
use std::path::{Path, PathBuf};

/// Default AUR base URL.
pub const AUR_BASE_URL: &str = "https://aur.archlinux.org";

/// Clones AUR repositories into a cache directory and builds them there.
#[derive(Debug, Clone)]
pub struct AurBuilder {
    exec: Executor,
    cache_dir: PathBuf,
    base_url: String,
}

impl AurBuilder {
    pub fn new(exec: Executor, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            exec,
            cache_dir: cache_dir.into(),
            base_url: AUR_BASE_URL.to_string(),
        }
    }

    /// Clone from a different host (mirrors, tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn repo_url(&self, name: &str) -> String {
        format!("{}/{name}.git", self.base_url)
    }
}

impl ForeignBuilder for AurBuilder {
    fn ensure_source(&self, name: &str) -> Result<PathBuf> {
        let dir = self.cache_dir.join(name);
        if dir.exists() {
            log::debug!("{name}: using cached source at {}", dir.display());
            return Ok(dir);
        }

        std::fs::create_dir_all(&self.cache_dir)?;
        self.exec.run(
            CommandSpec::new("git")
                .args(["clone", "--depth", "1", "--shallow-submodules"])
                .arg(self.repo_url(name))
                .current_dir(&self.cache_dir),
        )?;
        Ok(dir)
    }

    fn manifest_version(&self, dir: &Path) -> Result<String> {
        read_pkgver(dir)
    }

    fn build_install(&self, dir: &Path) -> Result<()> {
        // makepkg escalates on its own for the install step and refuses to run as root
        self.exec.run(
            CommandSpec::new("makepkg")
                .args(["--syncdeps", "--install", "--noconfirm", "--needed"])
                .current_dir(dir),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::testing::{FixedPrivilege, ScriptedRunner};
    use std::sync::Arc;

    fn builder(cache: &Path) -> (AurBuilder, Arc<ScriptedRunner>) {
        let runner = Arc::new(ScriptedRunner::new());
        let exec = Executor::new(runner.clone(), Arc::new(FixedPrivilege::new(false)));
        (AurBuilder::new(exec, cache), runner)
    }

    #[test]
    fn test_clone_when_absent() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = tmp.path().join("aur");
        let (builder, runner) = builder(&cache);

        let dir = builder.ensure_source("paru").unwrap();
        assert_eq!(dir, cache.join("paru"));
        assert!(cache.is_dir());

        let specs = runner.specs();
        assert_eq!(specs.len(), 1);
        assert_eq!(
            specs[0].display(),
            "git clone --depth 1 --shallow-submodules https://aur.archlinux.org/paru.git"
        );
        assert_eq!(specs[0].cwd.as_deref(), Some(cache.as_path()));
    }

    #[test]
    fn test_no_clone_when_cached() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("paru")).unwrap();
        let (builder, runner) = builder(tmp.path());

        builder.ensure_source("paru").unwrap();
        assert!(runner.commands().is_empty());
    }

    #[test]
    fn test_custom_base_url() {
        let tmp = tempfile::tempdir().unwrap();
        let (builder, runner) = builder(tmp.path());
        let builder = builder.with_base_url("https://example.org/aur/");
        builder.ensure_source("yay").unwrap();
        assert!(runner.commands()[0].ends_with("https://example.org/aur/yay.git"));
    }

    #[test]
    fn test_build_runs_in_package_dir_without_sudo() {
        let tmp = tempfile::tempdir().unwrap();
        let (builder, runner) = builder(tmp.path());
        builder.build_install(&tmp.path().join("paru")).unwrap();

        let specs = runner.specs();
        assert_eq!(specs[0].display(), "makepkg --syncdeps --install --noconfirm --needed");
        assert_eq!(specs[0].cwd, Some(tmp.path().join("paru")));
    }
}
