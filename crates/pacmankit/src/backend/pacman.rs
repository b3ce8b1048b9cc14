//! Real pacman CLI backend.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::pkgbuild::parse_info_field;
use crate::types::InstalledPackage;
use declarative::{CommandOutput, CommandSpec, Executor};
use std::collections::{BTreeMap, BTreeSet};

/// Backend that executes real `pacman` commands.
///
/// Queries run as the current user; install and remove are escalated.
#[derive(Debug, Clone)]
pub struct PacmanBackend {
    exec: Executor,
}

impl PacmanBackend {
    pub fn new(exec: Executor) -> Self {
        Self { exec }
    }

    fn pacman<I, S>(args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec::new("pacman").args(args)
    }

    /// Lines of a listing query.
    ///
    /// pacman exits 1 with nothing on stderr when a listing is empty, so
    /// only a failure that says something is an error.
    fn listing(&self, args: &[&str]) -> Result<Vec<String>> {
        let output = self.exec.capture(Self::pacman(args.iter().copied()))?;
        listing_lines(&output)
    }
}

fn listing_lines(output: &CommandOutput) -> Result<Vec<String>> {
    if output.success {
        return Ok(output.lines());
    }
    let stderr = output.stderr_str();
    if stderr.trim().is_empty() {
        Ok(Vec::new())
    } else {
        Err(Error::from_pacman_output(&stderr, None))
    }
}

/// Parse `pacman -Sg` output (`group member` per line).
fn parse_groups(stdout: &str, names: &BTreeSet<String>) -> BTreeMap<String, BTreeSet<String>> {
    let mut groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for line in stdout.lines() {
        let mut parts = line.split_whitespace();
        if let (Some(group), Some(member)) = (parts.next(), parts.next())
            && names.contains(group)
        {
            groups
                .entry(group.to_string())
                .or_default()
                .insert(member.to_string());
        }
    }
    groups
}

impl Backend for PacmanBackend {
    fn explicit_native(&self) -> Result<BTreeSet<String>> {
        Ok(self.listing(&["-Qqetn"])?.into_iter().collect())
    }

    fn group_members(&self, names: &BTreeSet<String>) -> Result<BTreeMap<String, BTreeSet<String>>> {
        if names.is_empty() {
            return Ok(BTreeMap::new());
        }
        // Non-group names make pacman exit non-zero; their lines are simply absent.
        let output = self.exec.capture(Self::pacman(["-Sg"]).args(names.iter().cloned()))?;
        Ok(parse_groups(&output.stdout_str(), names))
    }

    fn is_installed(&self, name: &str) -> Result<bool> {
        Ok(self.exec.succeeds(Self::pacman(["-Qi", name]))?)
    }

    fn installed_version(&self, name: &str) -> Result<Option<String>> {
        let output = self.exec.capture(Self::pacman(["-Qi", name]))?;
        if !output.success {
            return Ok(None);
        }
        Ok(parse_info_field(&output.stdout_str(), "Version"))
    }

    fn list_foreign(&self) -> Result<Vec<InstalledPackage>> {
        Ok(self
            .listing(&["-Qm"])?
            .iter()
            .filter_map(|l| InstalledPackage::parse_line(l))
            .collect())
    }

    fn install(&self, names: &BTreeSet<String>) -> Result<()> {
        self.exec.sudo_teeing(
            Self::pacman(["--noconfirm", "--needed", "-S"]).args(names.iter().cloned()),
        )?;
        Ok(())
    }

    fn remove(&self, names: &BTreeSet<String>) -> Result<()> {
        self.exec
            .sudo_teeing(Self::pacman(["-Rsu"]).args(names.iter().cloned()))?;
        Ok(())
    }
}
