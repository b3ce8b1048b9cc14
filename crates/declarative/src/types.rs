//! Core types for staged convergence

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Output;

/// One of the four fixed execution stages
///
/// Phases are totally ordered; [`Phase::ALL`] lists them in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Machine-wide prerequisites: directories, keyboard, locale
    Prepare,
    /// Package and source installation
    Install,
    /// Files, users and settings
    Configure,
    /// Unit enablement
    Finalize,
}

impl Phase {
    /// All phases, in the order they run
    pub const ALL: [Phase; 4] = [
        Phase::Prepare,
        Phase::Install,
        Phase::Configure,
        Phase::Finalize,
    ];

    /// Position of this phase in [`Phase::ALL`]
    pub fn index(self) -> usize {
        match self {
            Phase::Prepare => 0,
            Phase::Install => 1,
            Phase::Configure => 2,
            Phase::Finalize => 3,
        }
    }

    /// Display name used in progress headers
    pub fn name(self) -> &'static str {
        match self {
            Phase::Prepare => "Prepare",
            Phase::Install => "Install",
            Phase::Configure => "Configure",
            Phase::Finalize => "Finalize",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Stable key identifying a step within its phase
///
/// Registering a second step under an existing key replaces the first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(String);

impl StepId {
    /// Create a step id from any string-like key
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StepId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for StepId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of registering a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// The id was new to its phase
    Inserted,
    /// An earlier step under the same id was replaced
    Replaced,
}

/// Summary of a scheduler run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Number of steps executed per phase (phases that were skipped are absent)
    pub executed: BTreeMap<Phase, usize>,
}

impl RunSummary {
    /// Total number of steps executed
    pub fn total(&self) -> usize {
        self.executed.values().sum()
    }

    /// Number of steps executed in a phase
    pub fn in_phase(&self, phase: Phase) -> usize {
        self.executed.get(&phase).copied().unwrap_or(0)
    }

    /// Merge another summary into this one (used for nested runs)
    pub fn merge(&mut self, other: &RunSummary) {
        for (phase, count) in &other.executed {
            *self.executed.entry(*phase).or_default() += count;
        }
    }
}

/// Registered steps of one phase, in execution order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseOutline {
    pub phase: Phase,
    pub steps: Vec<StepId>,
}

/// A command to run: program, arguments and optional working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    /// Start a command for `program`
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run the command inside `dir`
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Prefix the command with a wrapper program (e.g. `sudo`)
    pub fn wrapped(self, wrapper: &str) -> Self {
        let mut args = Vec::with_capacity(self.args.len() + 1);
        args.push(self.program);
        args.extend(self.args);
        Self {
            program: wrapper.to_string(),
            args,
            cwd: self.cwd,
        }
    }

    /// Shell-like rendering for logs and error messages
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Captured output of a command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub success: bool,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: output.stdout,
            stderr: output.stderr,
            success: output.status.success(),
        }
    }
}

impl CommandOutput {
    /// Successful output with the given stdout
    pub fn ok(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: Vec::new(),
            success: true,
        }
    }

    /// Failed output with the given stderr
    pub fn failed(stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: stderr.into(),
            success: false,
        }
    }

    /// Get stdout as a string
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    /// Get stderr as a string
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }

    /// Non-empty trimmed stdout lines
    pub fn lines(&self) -> Vec<String> {
        self.stdout_str()
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(ToString::to_string)
            .collect()
    }
}
