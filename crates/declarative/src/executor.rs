//! Command executor with on-demand privilege escalation

use crate::context::{CommandRunner, EffectiveUid, PrivilegeCheck, SystemRunner};
use crate::error::{Error, Result};
use crate::types::{CommandOutput, CommandSpec};
use std::sync::Arc;

/// Wrapper program used to escalate when not already root
pub const DEFAULT_ESCALATION: &str = "sudo";

/// Runs commands, prefixing an escalation wrapper only when needed
///
/// Cloning is cheap; backends each hold their own clone.
#[derive(Clone)]
pub struct Executor {
    runner: Arc<dyn CommandRunner>,
    privilege: Arc<dyn PrivilegeCheck>,
    escalation: String,
}

impl Executor {
    /// Executor over an arbitrary runner and privilege check
    pub fn new(runner: Arc<dyn CommandRunner>, privilege: Arc<dyn PrivilegeCheck>) -> Self {
        Self {
            runner,
            privilege,
            escalation: DEFAULT_ESCALATION.to_string(),
        }
    }

    /// Executor over the real process table and the effective uid
    pub fn system() -> Self {
        Self::new(Arc::new(SystemRunner), Arc::new(EffectiveUid))
    }

    /// Use a different escalation wrapper (e.g. `doas`)
    pub fn with_escalation(mut self, wrapper: impl Into<String>) -> Self {
        self.escalation = wrapper.into();
        self
    }

    /// Whether the current identity is the superuser (checked on each call)
    pub fn is_root(&self) -> bool {
        self.privilege.is_root()
    }

    /// The command as it would run privileged from the current identity
    pub fn escalated(&self, cmd: CommandSpec) -> CommandSpec {
        if self.is_root() {
            cmd
        } else {
            cmd.wrapped(&self.escalation)
        }
    }

    /// Run as the current identity with inherited stdio; fail on non-zero exit
    pub fn run(&self, cmd: CommandSpec) -> Result<()> {
        log::debug!("$ {cmd}");
        let success = self.runner.status(&cmd).map_err(|source| Error::Spawn {
            command: cmd.display(),
            source,
        })?;
        if success {
            Ok(())
        } else {
            Err(Error::CommandFailed {
                command: cmd.display(),
                stderr: String::new(),
            })
        }
    }

    /// Run with superuser rights, escalating only if not already root
    pub fn sudo(&self, cmd: CommandSpec) -> Result<()> {
        self.run(self.escalated(cmd))
    }

    /// Like [`Executor::run`], but a failure carries the command's stderr
    ///
    /// stderr still reaches the terminal as it is written.
    pub fn run_teeing(&self, cmd: CommandSpec) -> Result<()> {
        log::debug!("$ {cmd}");
        let output = self.runner.teeing(&cmd).map_err(|source| Error::Spawn {
            command: cmd.display(),
            source,
        })?;
        if output.success {
            Ok(())
        } else {
            Err(Error::CommandFailed {
                command: cmd.display(),
                stderr: output.stderr_str(),
            })
        }
    }

    /// [`Executor::run_teeing`] with superuser rights
    pub fn sudo_teeing(&self, cmd: CommandSpec) -> Result<()> {
        self.run_teeing(self.escalated(cmd))
    }

    /// Run a query and capture its output, whatever the exit status
    pub fn capture(&self, cmd: CommandSpec) -> Result<CommandOutput> {
        log::trace!("$ {cmd}");
        self.runner.output(&cmd).map_err(|source| Error::Spawn {
            command: cmd.display(),
            source,
        })
    }

    /// Run a query and return stdout; fail on non-zero exit
    pub fn capture_checked(&self, cmd: CommandSpec) -> Result<String> {
        let command = cmd.display();
        let output = self.capture(cmd)?;
        if !output.success {
            return Err(Error::CommandFailed {
                command,
                stderr: output.stderr_str(),
            });
        }
        Ok(output.stdout_str())
    }

    /// Run quietly and report whether the command succeeded
    pub fn succeeds(&self, cmd: CommandSpec) -> Result<bool> {
        log::trace!("$ {cmd}");
        self.runner.quiet(&cmd).map_err(|source| Error::Spawn {
            command: cmd.display(),
            source,
        })
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("escalation", &self.escalation)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FixedPrivilege, ScriptedRunner};

    fn executor(root: bool) -> (Executor, Arc<ScriptedRunner>, Arc<FixedPrivilege>) {
        let runner = Arc::new(ScriptedRunner::new());
        let privilege = Arc::new(FixedPrivilege::new(root));
        let exec = Executor::new(runner.clone(), privilege.clone());
        (exec, runner, privilege)
    }

    #[test]
    fn test_sudo_as_root_runs_directly() {
        let (exec, runner, _) = executor(true);
        exec.sudo(CommandSpec::new("pacman").args(["-S", "git"])).unwrap();
        assert_eq!(runner.commands(), vec!["pacman -S git"]);
    }

    #[test]
    fn test_sudo_as_user_escalates() {
        let (exec, runner, _) = executor(false);
        exec.sudo(CommandSpec::new("pacman").args(["-S", "git"])).unwrap();
        assert_eq!(runner.commands(), vec!["sudo pacman -S git"]);
    }

    #[test]
    fn test_privilege_rechecked_on_every_call() {
        let (exec, runner, privilege) = executor(true);
        exec.sudo(CommandSpec::new("true")).unwrap();
        privilege.set(false);
        exec.sudo(CommandSpec::new("true")).unwrap();
        assert_eq!(runner.commands(), vec!["true", "sudo true"]);
    }

    #[test]
    fn test_custom_escalation() {
        let (exec, runner, _) = executor(false);
        let exec = exec.with_escalation("doas");
        exec.sudo(CommandSpec::new("ufw").args(["allow", "ssh"])).unwrap();
        assert_eq!(runner.commands(), vec!["doas ufw allow ssh"]);
    }

    #[test]
    fn test_run_failure_is_error() {
        let (exec, runner, _) = executor(true);
        runner.fail("makepkg --install", "");
        let err = exec.run(CommandSpec::new("makepkg").arg("--install")).unwrap_err();
        assert!(matches!(err, Error::CommandFailed { .. }));
    }

    #[test]
    fn test_teeing_failure_carries_stderr() {
        let (exec, runner, _) = executor(false);
        runner.fail("sudo pacman -S nosuchpkg", "error: target not found: nosuchpkg\n");
        let err = exec
            .sudo_teeing(CommandSpec::new("pacman").args(["-S", "nosuchpkg"]))
            .unwrap_err();
        match err {
            Error::CommandFailed { command, stderr } => {
                assert_eq!(command, "sudo pacman -S nosuchpkg");
                assert!(stderr.contains("target not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_capture_tolerates_failure() {
        let (exec, runner, _) = executor(true);
        runner.fail("pacman -Sg nope", "error: target not found");
        let out = exec.capture(CommandSpec::new("pacman").args(["-Sg", "nope"])).unwrap();
        assert!(!out.success);

        let err = exec
            .capture_checked(CommandSpec::new("pacman").args(["-Sg", "nope"]))
            .unwrap_err();
        assert!(err.to_string().contains("target not found"));
    }

    #[test]
    fn test_succeeds() {
        let (exec, runner, _) = executor(true);
        runner.fail("pacman -Qi missing", "");
        assert!(exec.succeeds(CommandSpec::new("pacman").args(["-Qi", "git"])).unwrap());
        assert!(!exec.succeeds(CommandSpec::new("pacman").args(["-Qi", "missing"])).unwrap());
    }
}
