//! Declaration calls
//!
//! Each call validates its arguments, merges them into [`Desired`] and
//! registers the step for its kind under a fixed id. Repeating a call merges
//! data and re-registers the same step, so a kind always runs once per phase.
//!
//! [`Desired`]: crate::state::Desired

mod files;
mod firewall;
mod git;
mod packages;
mod services;
mod system;
mod users;

use crate::config::Declarations;
use crate::state::State;
use declarative::DeclarationError;

/// Validate a non-empty list of names without whitespace
pub(crate) fn names<I, S>(kind: &'static str, items: I) -> Result<Vec<String>, DeclarationError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let items: Vec<String> = items.into_iter().map(Into::into).collect();
    if items.is_empty() {
        return Err(DeclarationError::Empty { kind });
    }
    for name in &items {
        name_ok(kind, name)?;
    }
    Ok(items)
}

/// Validate one name
pub(crate) fn name_ok(kind: &'static str, name: &str) -> Result<(), DeclarationError> {
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(DeclarationError::InvalidName {
            kind,
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Validate a path argument
pub(crate) fn path_ok(kind: &'static str, path: &str) -> Result<(), DeclarationError> {
    if path.trim().is_empty() {
        return Err(DeclarationError::EmptyPath { kind });
    }
    Ok(())
}

impl State {
    /// Apply every declaration in a [`Declarations`] document
    pub fn declare(&mut self, decls: &Declarations) -> Result<(), DeclarationError> {
        if let Some(names) = &decls.packages {
            self.package(names.iter().cloned())?;
        }
        if let Some(names) = &decls.aur {
            self.aur(names.iter().cloned())?;
        }
        for clone in &decls.git {
            self.git_clone(&clone.from, clone.to.as_deref())?;
        }
        for clone in &decls.github {
            self.github_clone(&clone.repo, clone.to.as_deref())?;
        }
        if let Some(paths) = &decls.mkdir {
            self.mkdir(paths.iter().cloned())?;
        }
        if let Some(keyboard) = &decls.keyboard {
            self.keyboard(keyboard);
        }
        if let Some(locale) = &decls.locale {
            self.locale(locale)?;
        }
        if let Some(timedate) = &decls.timedate {
            self.timedate(&timedate.timezone, timedate.ntp)?;
        }
        if let Some(hostname) = &decls.hostname {
            self.hostname(hostname)?;
        }
        for file in &decls.files {
            self.file(&file.path, &file.content)?;
        }
        for link in &decls.symlinks {
            self.symlink(&link.target, &link.link)?;
        }
        for copy in &decls.copies {
            self.copy(&copy.src, &copy.dest)?;
        }
        for r in &decls.replacements {
            self.replace(&r.file, &r.pattern, &r.replacement)?;
        }
        if let Some(rules) = &decls.firewall {
            self.firewall(rules.iter().cloned())?;
        }
        for user in &decls.users {
            self.user(&user.name, user.groups.iter().cloned(), user.autologin, &user.state)?;
        }
        if let Some(names) = &decls.services {
            self.service(names.iter().cloned())?;
        }
        if let Some(names) = &decls.timers {
            self.timer(names.iter().cloned())?;
        }
        Ok(())
    }
}
