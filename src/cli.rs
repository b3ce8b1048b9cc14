use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "archform")]
#[command(version)]
#[command(about = "Converge an Arch Linux machine to a declared state", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Converge the system to the system file
    Apply(ConfigArgs),

    /// Validate the system file and list the steps it registers
    Check(CheckArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Converge a user job handed over by `apply`
    #[command(name = "run-as-user", hide = true)]
    RunAsUser {
        /// Encoded job (set by the parent)
        #[arg(long, env = "ARCHFORM_USER_JOB", hide_env_values = true)]
        job: String,
    },
}

#[derive(Parser)]
pub struct ConfigArgs {
    /// System file (default: ~/.config/archform/system.toml)
    #[arg(short, long, env = "ARCHFORM_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Parser)]
pub struct CheckArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Print the step outline as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_apply_with_config() {
        let cli = Cli::try_parse_from(["archform", "-vv", "apply", "--config", "/tmp/s.toml"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Apply(args) => assert_eq!(args.config, Some(PathBuf::from("/tmp/s.toml"))),
            _ => panic!("expected apply"),
        }
    }

    #[test]
    fn test_parse_hidden_child_mode() {
        let cli = Cli::try_parse_from(["archform", "--quiet", "run-as-user", "--job", "{}"]).unwrap();
        assert!(cli.quiet);
        assert!(matches!(cli.command, Command::RunAsUser { job } if job == "{}"));
    }

    #[test]
    fn test_child_mode_env_matches_spawner() {
        let cmd = Cli::command();
        let child = cmd.find_subcommand(crate::spawn::RUN_AS_USER).unwrap();
        let job = child.get_arguments().find(|a| a.get_id() == "job").unwrap();
        assert_eq!(job.get_env(), Some(std::ffi::OsStr::new(crate::spawn::JOB_ENV)));
    }

    #[test]
    fn test_parse_check_json() {
        let cli = Cli::try_parse_from(["archform", "check", "--json"]).unwrap();
        assert!(matches!(cli.command, Command::Check(CheckArgs { json: true, .. })));
    }
}
