//! `git_clone` and `github_clone`

use super::path_ok;
use crate::paths;
use crate::state::{GitClone, State};
use crate::ui;
use declarative::{CommandSpec, DeclarationError};
use std::path::PathBuf;

const GITHUB_URL: &str = "https://github.com/";

/// Directory `git clone` would pick for `url`
fn default_destination(url: &str) -> Option<PathBuf> {
    let name = url.trim_end_matches('/').rsplit(['/', ':']).next()?;
    let name = name.strip_suffix(".git").unwrap_or(name);
    (!name.is_empty()).then(|| PathBuf::from(name))
}

impl State {
    /// Declare a repository cloned to `to` unless that path already exists
    ///
    /// Without `to` the destination is the repository name, relative to the
    /// working directory.
    pub fn git_clone(&mut self, from: &str, to: Option<&str>) -> Result<(), DeclarationError> {
        path_ok("git_clone", from)?;
        let to = match to {
            Some(to) => {
                path_ok("git_clone", to)?;
                paths::expand(to)
            }
            None => default_destination(from).ok_or(DeclarationError::EmptyPath { kind: "git_clone" })?,
        };

        let clone = GitClone {
            from: from.to_string(),
            to,
        };
        let clones = &mut self.desired_mut().clones;
        if !clones.contains(&clone) {
            clones.push(clone);
        }

        self.on_install("git_clone", |desired, host| {
            for clone in &desired.clones {
                if clone.to.exists() {
                    log::debug!("{} already present", clone.to.display());
                    continue;
                }
                let to = clone.to.display().to_string();
                ui::announce("Cloning", &[("from", (&clone.from).into()), ("to", (&to).into())]);
                host.exec
                    .run(CommandSpec::new("git").args(["clone", clone.from.as_str(), to.as_str()]))?;
            }
            Ok(())
        });
        Ok(())
    }

    /// [`State::git_clone`] for an `owner/repo` on GitHub
    pub fn github_clone(&mut self, repo: &str, to: Option<&str>) -> Result<(), DeclarationError> {
        path_ok("github_clone", repo)?;
        self.git_clone(&format!("{GITHUB_URL}{repo}"), to)
    }
}
