//! Per-user child processes
//!
//! A user's nested declarations run in a fresh copy of this program, started
//! in the hidden `run-as-user` mode with the account's credentials. The job
//! travels as JSON in [`JOB_ENV`], leaving stdin attached to the terminal so
//! prompts from pacman or sudo still reach the user. Identity and environment
//! are set on the child command only, so nothing the child does can leak back
//! into this process.

use crate::config::{Declarations, Settings};
use crate::users::Account;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Hidden subcommand that runs a [`UserJob`] from [`JOB_ENV`]
pub const RUN_AS_USER: &str = "run-as-user";

/// Environment variable carrying the encoded job to the child
pub const JOB_ENV: &str = "ARCHFORM_USER_JOB";

/// Work handed to a per-user child
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserJob {
    pub settings: Settings,
    pub declarations: Declarations,
}

impl UserJob {
    /// Decode a job handed over in [`JOB_ENV`]
    pub fn decode(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid user job")
    }

    /// Encode for [`JOB_ENV`]
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to encode user job")
    }
}

/// Runs a job under another account, blocking until it finishes
pub trait UserSpawner: Send + Sync {
    fn run_as(&self, account: &Account, job: &UserJob) -> Result<()>;
}

/// [`UserSpawner`] that re-invokes a program with the account's credentials
#[derive(Debug, Clone)]
pub struct ChildSpawner {
    program: PathBuf,
    args: Vec<String>,
}

impl ChildSpawner {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// This executable in child mode, passing verbosity through
    pub fn current_exe(verbose: u8, quiet: bool) -> Result<Self> {
        let program = std::env::current_exe().context("Could not locate own executable")?;
        let mut args = Vec::new();
        if verbose > 0 {
            args.push(format!("-{}", "v".repeat(usize::from(verbose))));
        }
        if quiet {
            args.push("--quiet".to_string());
        }
        args.push(RUN_AS_USER.to_string());
        Ok(Self::new(program, args))
    }

    fn command(&self, account: &Account, payload: &str) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .env(JOB_ENV, payload)
            .env("HOME", &account.home)
            .env("USER", &account.name)
            .env("LOGNAME", &account.name)
            .env("XDG_RUNTIME_DIR", format!("/run/user/{}", account.uid))
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        if account.home.is_dir() {
            command.current_dir(&account.home);
        }

        // std drops supplementary groups when switching away from root
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.uid(account.uid).gid(account.gid);
        }

        command
    }
}

impl UserSpawner for ChildSpawner {
    fn run_as(&self, account: &Account, job: &UserJob) -> Result<()> {
        #[cfg(unix)]
        {
            let euid = nix::unistd::Uid::effective();
            if !euid.is_root() && euid.as_raw() != account.uid {
                bail!(
                    "Cannot converge user '{}' without root privileges",
                    account.name
                );
            }
        }

        let payload = job.encode()?;
        log::debug!(
            "$ {} {} (as {})",
            self.program.display(),
            self.args.join(" "),
            account.name
        );

        // Blocks until the child exits, so it is always reaped
        let status = self
            .command(account, &payload)
            .status()
            .with_context(|| format!("Failed to start child for user '{}'", account.name))?;
        if !status.success() {
            bail!("Convergence for user '{}' failed ({status})", account.name);
        }
        Ok(())
    }
}
