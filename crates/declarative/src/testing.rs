//! Test doubles for the provider traits
//!
//! Used by this crate's tests and by downstream crates that want to assert
//! on the exact commands a step issues.

use crate::context::{CommandRunner, PrivilegeCheck};
use crate::types::{CommandOutput, CommandSpec};
use std::io;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Records every command and answers from a script
///
/// Responses are keyed by the exact rendered command line
/// ([`CommandSpec::display`]). Unscripted commands succeed with empty output.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    responses: Mutex<Vec<(String, CommandOutput)>>,
    log: Mutex<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `command` with success and `stdout`
    pub fn respond(&self, command: &str, stdout: &str) {
        self.script(command, CommandOutput::ok(stdout));
    }

    /// Answer `command` with failure and `stderr`
    pub fn fail(&self, command: &str, stderr: &str) {
        self.script(command, CommandOutput::failed(stderr));
    }

    /// Answer `command` with an arbitrary output (latest script wins)
    pub fn script(&self, command: &str, output: CommandOutput) {
        let mut responses = self.responses.lock().unwrap_or_else(|e| e.into_inner());
        responses.retain(|(c, _)| c != command);
        responses.push((command.to_string(), output));
    }

    /// Rendered command lines, in the order they ran
    pub fn commands(&self) -> Vec<String> {
        self.specs().iter().map(CommandSpec::display).collect()
    }

    /// Full command specs, in the order they ran
    pub fn specs(&self) -> Vec<CommandSpec> {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Forget recorded commands, keeping the script
    pub fn clear(&self) {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    fn answer(&self, cmd: &CommandSpec) -> CommandOutput {
        self.log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(cmd.clone());
        let line = cmd.display();
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|(c, _)| *c == line)
            .map(|(_, out)| out.clone())
            .unwrap_or_else(|| CommandOutput::ok(""))
    }
}

impl CommandRunner for ScriptedRunner {
    fn status(&self, cmd: &CommandSpec) -> io::Result<bool> {
        Ok(self.answer(cmd).success)
    }

    fn output(&self, cmd: &CommandSpec) -> io::Result<CommandOutput> {
        Ok(self.answer(cmd))
    }

    fn teeing(&self, cmd: &CommandSpec) -> io::Result<CommandOutput> {
        Ok(self.answer(cmd))
    }

    fn quiet(&self, cmd: &CommandSpec) -> io::Result<bool> {
        Ok(self.answer(cmd).success)
    }
}

/// Privilege check with a switchable answer
#[derive(Debug)]
pub struct FixedPrivilege(AtomicBool);

impl FixedPrivilege {
    pub fn new(root: bool) -> Self {
        Self(AtomicBool::new(root))
    }

    pub fn set(&self, root: bool) {
        self.0.store(root, Ordering::SeqCst);
    }
}

impl PrivilegeCheck for FixedPrivilege {
    fn is_root(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
