//! Account realization
//!
//! Makes a declared account exist with its declared groups, and optionally
//! writes a getty drop-in that logs it in automatically.

use crate::state::UserDeclaration;
use anyhow::{Context, Result};
use declarative::{CommandSpec, Executor};
use std::fs;
use std::path::{Path, PathBuf};

/// A resolved account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub name: String,
    pub uid: u32,
    pub gid: u32,
    pub home: PathBuf,
}

/// Identity store operations
pub trait IdentityStore: Send + Sync {
    fn lookup(&self, name: &str) -> Result<Option<Account>>;

    /// Create the account with a home directory
    fn create(&self, name: &str) -> Result<()>;

    /// Replace the account's supplementary group list
    fn set_groups(&self, name: &str, groups: &[String]) -> Result<()>;
}

/// [`IdentityStore`] over the passwd database and shadow-utils
#[derive(Debug, Clone)]
pub struct PasswdStore {
    exec: Executor,
}

impl PasswdStore {
    pub fn new(exec: Executor) -> Self {
        Self { exec }
    }
}

impl IdentityStore for PasswdStore {
    #[cfg(unix)]
    fn lookup(&self, name: &str) -> Result<Option<Account>> {
        let user = nix::unistd::User::from_name(name)
            .with_context(|| format!("Failed to look up user '{name}'"))?;
        Ok(user.map(|u| Account {
            name: u.name,
            uid: u.uid.as_raw(),
            gid: u.gid.as_raw(),
            home: u.dir,
        }))
    }

    #[cfg(not(unix))]
    fn lookup(&self, name: &str) -> Result<Option<Account>> {
        anyhow::bail!("Account lookup for '{name}' is only supported on unix")
    }

    fn create(&self, name: &str) -> Result<()> {
        self.exec
            .sudo(CommandSpec::new("useradd").arg("--create-home").arg(name))?;
        Ok(())
    }

    fn set_groups(&self, name: &str, groups: &[String]) -> Result<()> {
        self.exec.sudo(
            CommandSpec::new("usermod")
                .arg("--groups")
                .arg(groups.join(","))
                .arg(name),
        )?;
        Ok(())
    }
}

/// Look the account up, creating it first if absent, and apply its groups
pub fn ensure_account(store: &dyn IdentityStore, user: &UserDeclaration) -> Result<Account> {
    let account = match store.lookup(&user.name)? {
        Some(account) => account,
        None => {
            log::info!("Creating user {}", user.name);
            store.create(&user.name)?;
            store
                .lookup(&user.name)?
                .with_context(|| format!("User '{}' still missing after useradd", user.name))?
        }
    };

    if !user.groups.is_empty() {
        store.set_groups(&user.name, &user.groups)?;
    }

    Ok(account)
}

/// Path of the autologin drop-in for `tty`
pub fn autologin_path(root: &Path, tty: &str) -> PathBuf {
    root.join(format!("getty@{tty}.service.d")).join("autologin.conf")
}

/// Drop-in content that logs `name` in on the getty
pub fn autologin_unit(name: &str) -> String {
    format!(
        "[Service]\nExecStart=\nExecStart=-/sbin/agetty -o '-p -f -- \\\\u' --noclear --autologin {name} %I $TERM\n"
    )
}

/// Write the autologin drop-in; returns whether the file changed
pub fn write_autologin(root: &Path, tty: &str, name: &str) -> Result<bool> {
    let path = autologin_path(root, tty);
    let content = autologin_unit(name);

    if fs::read_to_string(&path).is_ok_and(|existing| existing == content) {
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}
