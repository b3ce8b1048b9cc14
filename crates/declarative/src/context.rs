//! Provider traits
//!
//! These traits keep the scheduler and the executor independent of the real
//! process table, the real user identity and any particular UI.

use crate::types::{CommandOutput, CommandSpec, Phase, StepId};
use std::io::{self, Read, Write};
use std::process::{Command, Stdio};

/// Boundary to the operating system's process spawning
///
/// Implement this trait to run, record or script commands.
pub trait CommandRunner: Send + Sync {
    /// Run with inherited stdio, returning whether the command succeeded
    fn status(&self, cmd: &CommandSpec) -> io::Result<bool>;

    /// Run and capture stdout/stderr
    fn output(&self, cmd: &CommandSpec) -> io::Result<CommandOutput>;

    /// Run with inherited stdin/stdout, passing stderr through while keeping
    /// a copy of it in the returned output
    fn teeing(&self, cmd: &CommandSpec) -> io::Result<CommandOutput>;

    /// Run with all output discarded, returning whether the command succeeded
    fn quiet(&self, cmd: &CommandSpec) -> io::Result<bool>;
}

/// Answers whether the current process already has superuser rights
///
/// Consulted on every privileged call because identity can change between
/// two calls (e.g. inside a privilege-dropped child).
pub trait PrivilegeCheck: Send + Sync {
    fn is_root(&self) -> bool;
}

/// [`CommandRunner`] backed by `std::process::Command`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    fn command(cmd: &CommandSpec) -> Command {
        let mut command = Command::new(&cmd.program);
        command.args(&cmd.args);
        if let Some(dir) = &cmd.cwd {
            command.current_dir(dir);
        }
        command
    }
}

impl CommandRunner for SystemRunner {
    fn status(&self, cmd: &CommandSpec) -> io::Result<bool> {
        Self::command(cmd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map(|s| s.success())
    }

    fn output(&self, cmd: &CommandSpec) -> io::Result<CommandOutput> {
        Self::command(cmd)
            .stdin(Stdio::null())
            .output()
            .map(CommandOutput::from)
    }

    fn teeing(&self, cmd: &CommandSpec) -> io::Result<CommandOutput> {
        let mut child = Self::command(cmd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .spawn()?;

        let mut stderr = Vec::new();
        let copied = child
            .stderr
            .take()
            .map_or(Ok(()), |pipe| tee(pipe, &mut io::stderr(), &mut stderr));
        let status = child.wait()?;
        copied?;

        Ok(CommandOutput {
            stdout: Vec::new(),
            stderr,
            success: status.success(),
        })
    }

    fn quiet(&self, cmd: &CommandSpec) -> io::Result<bool> {
        Self::command(cmd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
    }
}

/// Copy `source` to `sink` until EOF, keeping everything in `copy`
fn tee(mut source: impl Read, sink: &mut impl Write, copy: &mut Vec<u8>) -> io::Result<()> {
    let mut buf = [0u8; 4096];
    loop {
        let n = match source.read(&mut buf) {
            Ok(0) => return sink.flush(),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        sink.write_all(&buf[..n])?;
        copy.extend_from_slice(&buf[..n]);
    }
}

/// [`PrivilegeCheck`] reading the effective uid of the process
#[derive(Debug, Clone, Copy, Default)]
pub struct EffectiveUid;

impl PrivilegeCheck for EffectiveUid {
    #[cfg(unix)]
    fn is_root(&self) -> bool {
        nix::unistd::Uid::effective().is_root()
    }

    #[cfg(not(unix))]
    fn is_root(&self) -> bool {
        false
    }
}

/// Progress callback for scheduler runs
///
/// Implement this trait to receive phase and step notifications.
pub trait PhaseObserver {
    /// Called before the first step of a non-empty phase
    fn on_phase_start(&mut self, phase: Phase, steps: usize);

    /// Called before each step runs
    fn on_step_start(&mut self, phase: Phase, id: &StepId);

    /// Called after the last step of a phase succeeded
    fn on_phase_complete(&mut self, phase: Phase);
}

/// No-op observer
pub struct NoProgress;

impl PhaseObserver for NoProgress {
    fn on_phase_start(&mut self, _phase: Phase, _steps: usize) {}
    fn on_step_start(&mut self, _phase: Phase, _id: &StepId) {}
    fn on_phase_complete(&mut self, _phase: Phase) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_system_runner_output_and_status() {
        let runner = SystemRunner;
        let out = runner
            .output(&CommandSpec::new("sh").args(["-c", "echo hello; echo oops >&2"]))
            .unwrap();
        assert!(out.success);
        assert_eq!(out.stdout_str().trim(), "hello");
        assert_eq!(out.stderr_str().trim(), "oops");

        assert!(!runner.quiet(&CommandSpec::new("false")).unwrap());
        assert!(runner.quiet(&CommandSpec::new("true")).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_current_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = SystemRunner
            .output(&CommandSpec::new("pwd").current_dir(dir.path()))
            .unwrap();
        let reported = std::path::PathBuf::from(out.stdout_str().trim());
        assert_eq!(
            reported.canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_teeing_keeps_stderr() {
        let out = SystemRunner
            .teeing(&CommandSpec::new("sh").args([
                "-c",
                "echo 'error: target not found: nosuchpkg' >&2; exit 1",
            ]))
            .unwrap();
        assert!(!out.success);
        assert_eq!(out.stderr_str().trim(), "error: target not found: nosuchpkg");
    }

    #[test]
    fn test_tee_copies_and_forwards() {
        let mut sink = Vec::new();
        let mut copy = Vec::new();
        tee(&b"line one\nline two\n"[..], &mut sink, &mut copy).unwrap();
        assert_eq!(sink, b"line one\nline two\n");
        assert_eq!(copy, sink);
    }

    #[test]
    fn test_system_runner_missing_program() {
        let err = SystemRunner
            .status(&CommandSpec::new("definitely-not-a-real-program-archform"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
