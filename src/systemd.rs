//! Service and timer reconciliation
//!
//! Unit names are declared without suffix. Services converge both ways:
//! declared units that are not enabled get enabled, and units someone
//! enabled by hand (state `enabled`, vendor preset `disabled`) that nobody
//! declared get disabled. Timers are enable-only.

use anyhow::Result;
use declarative::{CommandSpec, Executor, SetDiff};
use serde::Serialize;
use std::collections::BTreeSet;

/// Unit namespace a command applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    System,
    User,
}

impl Scope {
    /// System scope for root, the caller's user manager otherwise
    pub fn for_root(is_root: bool) -> Self {
        if is_root { Self::System } else { Self::User }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Service,
    Timer,
}

impl UnitKind {
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Service => ".service",
            Self::Timer => ".timer",
        }
    }

    pub fn type_name(self) -> &'static str {
        match self {
            Self::Service => "service",
            Self::Timer => "timer",
        }
    }

    /// `name` with this kind's suffix
    pub fn unit(self, name: &str) -> String {
        format!("{name}{}", self.suffix())
    }
}

/// One row of `systemctl list-unit-files`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFile {
    /// Name without suffix
    pub name: String,
    pub state: String,
    pub preset: Option<String>,
}

impl UnitFile {
    pub fn is_enabled(&self) -> bool {
        self.state == "enabled"
    }

    /// Enabled although the vendor preset says disabled
    pub fn is_manual(&self) -> bool {
        self.is_enabled() && self.preset.as_deref() == Some("disabled")
    }
}

/// Parse `list-unit-files --no-legend` rows (`<unit> <state> [<preset>]`)
pub fn parse_unit_files(output: &str, kind: UnitKind) -> Vec<UnitFile> {
    output
        .lines()
        .filter_map(|line| {
            let mut cols = line.split_whitespace();
            let unit = cols.next()?;
            let state = cols.next()?;
            Some(UnitFile {
                name: unit.strip_suffix(kind.suffix()).unwrap_or(unit).to_string(),
                state: state.to_string(),
                preset: cols.next().map(ToString::to_string),
            })
        })
        .collect()
}

/// Init system operations
pub trait InitSystem: Send + Sync {
    /// Enabled unit files of `kind`
    fn enabled_units(&self, scope: Scope, kind: UnitKind) -> Result<Vec<UnitFile>>;

    /// Enable units (full names, with suffix) in one command
    fn enable(&self, scope: Scope, units: &[String]) -> Result<()>;

    /// Disable units (full names, with suffix) in one command
    fn disable(&self, scope: Scope, units: &[String]) -> Result<()>;
}

/// [`InitSystem`] backed by `systemctl`
///
/// Commands run as the current identity: system scope when root, the
/// caller's user manager (`--user`) otherwise.
#[derive(Debug, Clone)]
pub struct Systemctl {
    exec: Executor,
}

impl Systemctl {
    pub fn new(exec: Executor) -> Self {
        Self { exec }
    }

    fn systemctl(scope: Scope) -> CommandSpec {
        let cmd = CommandSpec::new("systemctl");
        match scope {
            Scope::System => cmd,
            Scope::User => cmd.arg("--user"),
        }
    }
}

impl InitSystem for Systemctl {
    fn enabled_units(&self, scope: Scope, kind: UnitKind) -> Result<Vec<UnitFile>> {
        let stdout = self.exec.capture_checked(
            Self::systemctl(scope)
                .args(["list-unit-files", "--state=enabled"])
                .arg(format!("--type={}", kind.type_name()))
                .args(["--no-legend", "--no-pager"]),
        )?;
        Ok(parse_unit_files(&stdout, kind))
    }

    fn enable(&self, scope: Scope, units: &[String]) -> Result<()> {
        self.exec
            .run(Self::systemctl(scope).arg("enable").args(units.iter().cloned()))?;
        Ok(())
    }

    fn disable(&self, scope: Scope, units: &[String]) -> Result<()> {
        self.exec
            .run(Self::systemctl(scope).arg("disable").args(units.iter().cloned()))?;
        Ok(())
    }
}

/// What a unit convergence changed (names without suffix)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnitChanges {
    pub enabled: BTreeSet<String>,
    pub disabled: BTreeSet<String>,
}

fn with_suffix(names: &BTreeSet<String>, kind: UnitKind) -> Vec<String> {
    names.iter().map(|n| kind.unit(n)).collect()
}

/// Enable declared services, then disable hand-enabled undeclared ones
pub fn converge_services(
    init: &dyn InitSystem,
    scope: Scope,
    declared: &BTreeSet<String>,
) -> Result<UnitChanges> {
    let units = init.enabled_units(scope, UnitKind::Service)?;
    let enabled: BTreeSet<String> = units
        .iter()
        .filter(|u| u.is_enabled())
        .map(|u| u.name.clone())
        .collect();
    let manual: BTreeSet<String> = units
        .iter()
        .filter(|u| u.is_manual())
        .map(|u| u.name.clone())
        .collect();

    let to_enable = SetDiff::between(declared, &enabled).missing;
    let to_disable = SetDiff::between(declared, &manual).extra;

    if !to_enable.is_empty() {
        init.enable(scope, &with_suffix(&to_enable, UnitKind::Service))?;
    }
    if !to_disable.is_empty() {
        init.disable(scope, &with_suffix(&to_disable, UnitKind::Service))?;
    }

    Ok(UnitChanges {
        enabled: to_enable,
        disabled: to_disable,
    })
}

/// Enable declared timers that are not enabled yet
pub fn converge_timers(
    init: &dyn InitSystem,
    scope: Scope,
    declared: &BTreeSet<String>,
) -> Result<UnitChanges> {
    let enabled: BTreeSet<String> = init
        .enabled_units(scope, UnitKind::Timer)?
        .into_iter()
        .filter(UnitFile::is_enabled)
        .map(|u| u.name)
        .collect();

    let to_enable = SetDiff::between(declared, &enabled).missing;
    if !to_enable.is_empty() {
        init.enable(scope, &with_suffix(&to_enable, UnitKind::Timer))?;
    }

    Ok(UnitChanges {
        enabled: to_enable,
        disabled: BTreeSet::new(),
    })
}
