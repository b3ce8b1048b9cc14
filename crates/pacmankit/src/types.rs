//! Core types for package reconciliation.

use serde::Serialize;
use std::collections::BTreeSet;

/// An installed package as listed by `pacman -Q`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledPackage {
    /// Package name
    pub name: String,
    /// Full version, including epoch and pkgrel (e.g. `1:2.3-1`)
    pub version: String,
}

impl InstalledPackage {
    /// Parse one `name version` line.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let name = parts.next()?;
        Some(Self {
            name: name.to_string(),
            version: parts.next().unwrap_or_default().to_string(),
        })
    }
}

/// Batched changes that bring the native package set to the declared one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackagePlan {
    /// Explicitly installed packages nobody declared
    pub remove: BTreeSet<String>,
    /// Declared packages (or groups) not yet installed
    pub install: BTreeSet<String>,
}

impl PackagePlan {
    /// Whether the system already matches.
    pub fn is_empty(&self) -> bool {
        self.remove.is_empty() && self.install.is_empty()
    }
}

/// What a foreign convergence did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ForeignReport {
    /// Packages built and installed, in declaration order
    pub built: Vec<String>,
    /// Foreign packages removed because nothing declared them
    pub removed: BTreeSet<String>,
}

/// Strip the epoch (`N:`) and `-pkgrel` from a full version.
///
/// Leaves exactly what a PKGBUILD's `pkgver=` holds.
pub fn base_version(version: &str) -> &str {
    let without_epoch = version
        .split_once(':')
        .map_or(version, |(_, rest)| rest);
    without_epoch
        .split_once('-')
        .map_or(without_epoch, |(ver, _)| ver)
}
