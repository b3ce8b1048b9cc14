//! Declared state and its registered steps
//!
//! A [`State`] is built once per run (and once per declared user, inside
//! that user's child process). Declaration calls accumulate into
//! [`Desired`] and register one step per declaration kind; nothing touches
//! the system until [`State::converge`].

use crate::config::Declarations;
use crate::host::Host;
use declarative::{
    DeclarationError, Phase, PhaseObserver, PhaseOutline, Registration, Registry, RunSummary,
    StepId,
};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::PathBuf;

// ============================================================================
// Desired state
// ============================================================================

/// Everything declared so far, read by steps at run time
#[derive(Debug, Clone, Default)]
pub struct Desired {
    pub packages: BTreeSet<String>,
    /// Foreign packages in declaration order (deduplicated)
    pub aur: Vec<String>,
    pub services: BTreeSet<String>,
    pub timers: BTreeSet<String>,
    pub users: Vec<UserDeclaration>,
    /// Files keyed by path; a later declaration of the same path wins
    pub files: Vec<FileDeclaration>,
    pub symlinks: Vec<SymlinkDeclaration>,
    pub directories: Vec<PathBuf>,
    pub copies: Vec<CopyDeclaration>,
    pub replacements: Vec<Replacement>,
    pub firewall: Vec<String>,
    pub clones: Vec<GitClone>,
    pub keyboard: Keyboard,
    pub locale: Option<String>,
    pub timedate: Option<Timedate>,
    pub hostname: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UserDeclaration {
    pub name: String,
    /// Accumulated across repeated declarations of the same user
    pub groups: Vec<String>,
    pub autologin: bool,
    /// Declarations converged inside the user's own process
    pub nested: Declarations,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDeclaration {
    pub path: PathBuf,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymlinkDeclaration {
    pub target: PathBuf,
    pub link: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyDeclaration {
    /// Expanded source as written; a trailing `/.` means "contents of"
    pub src: String,
    pub dest: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Replacement {
    pub file: PathBuf,
    pub pattern: Regex,
    pub replacement: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitClone {
    pub from: String,
    pub to: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub keymap: Option<String>,
    pub layout: Option<String>,
    pub model: Option<String>,
    pub variant: Option<String>,
    pub options: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timedate {
    pub timezone: String,
    pub ntp: bool,
}

// ============================================================================
// State
// ============================================================================

/// Declared state plus the steps that converge the system to it
#[derive(Debug, Default)]
pub struct State {
    desired: Desired,
    steps: Registry<Desired, Host>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a state by declaring everything in `declarations`
    pub fn from_declarations(declarations: &Declarations) -> Result<Self, DeclarationError> {
        let mut state = Self::new();
        state.declare(declarations)?;
        Ok(state)
    }

    #[cfg(test)]
    pub fn desired(&self) -> &Desired {
        &self.desired
    }

    pub(crate) fn desired_mut(&mut self) -> &mut Desired {
        &mut self.desired
    }

    /// Register a raw step in `phase` under `id`
    pub fn on<F>(&mut self, phase: Phase, id: impl Into<StepId>, step: F) -> Registration
    where
        F: Fn(&Desired, &Host) -> anyhow::Result<()> + 'static,
    {
        self.steps.register(phase, id, step)
    }

    pub fn on_prepare<F>(&mut self, id: impl Into<StepId>, step: F) -> Registration
    where
        F: Fn(&Desired, &Host) -> anyhow::Result<()> + 'static,
    {
        self.on(Phase::Prepare, id, step)
    }

    pub fn on_install<F>(&mut self, id: impl Into<StepId>, step: F) -> Registration
    where
        F: Fn(&Desired, &Host) -> anyhow::Result<()> + 'static,
    {
        self.on(Phase::Install, id, step)
    }

    pub fn on_configure<F>(&mut self, id: impl Into<StepId>, step: F) -> Registration
    where
        F: Fn(&Desired, &Host) -> anyhow::Result<()> + 'static,
    {
        self.on(Phase::Configure, id, step)
    }

    pub fn on_finalize<F>(&mut self, id: impl Into<StepId>, step: F) -> Registration
    where
        F: Fn(&Desired, &Host) -> anyhow::Result<()> + 'static,
    {
        self.on(Phase::Finalize, id, step)
    }

    /// Registered step ids per non-empty phase
    pub fn outline(&self) -> Vec<PhaseOutline> {
        self.steps.outline()
    }

    /// Run all four phases against `host`
    pub fn converge<P: PhaseObserver>(&self, host: &Host, observer: &mut P) -> anyhow::Result<RunSummary> {
        self.steps.run(&self.desired, host, observer)
    }
}
