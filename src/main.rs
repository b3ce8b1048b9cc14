mod cli;
mod config;
mod declarations;
mod host;
mod interrupt;
mod paths;
mod spawn;
mod state;
mod systemd;
mod ui;
mod users;

#[cfg(test)]
mod testutil;

use anyhow::{Context as _, Result};
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use colored::Colorize;
use config::SystemFile;
use host::Host;
use interrupt::{INTERRUPTED_EXIT_CODE, InterruptState};
use pacmankit::ErrorCategory;
use spawn::{ChildSpawner, UserJob};
use state::State;
use std::io;
use std::path::Path;
use std::process::ExitCode;
use ui::UiProgress;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    ui::set_quiet(cli.quiet);

    let interrupt = match interrupt::set_up_process_interrupt_handler() {
        Ok(state) => state,
        Err(e) => {
            log::warn!("Could not install interrupt handler: {e}");
            InterruptState::new()
        }
    };

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    match run(&ctx, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) if interrupt.is_interrupted() => ExitCode::from(INTERRUPTED_EXIT_CODE),
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(ctx: &Context, command: Command) -> Result<()> {
    match command {
        Command::Apply(args) => apply(ctx, args.config.as_deref()),
        Command::Check(args) => check(args.config.config.as_deref(), args.json),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "archform", &mut io::stdout());
            Ok(())
        }
        Command::RunAsUser { job } => run_as_user(ctx, &job),
    }
}

/// Load a system file and run its declaration pass
fn load(config: Option<&Path>) -> Result<(SystemFile, State)> {
    let path = config::resolve_path(config)?;
    log::info!("Using system file {}", path.display());
    let file = SystemFile::load(&path)?;
    let state = State::from_declarations(&file.declarations)
        .with_context(|| format!("Invalid declaration in {}", path.display()))?;
    Ok((file, state))
}

fn apply(ctx: &Context, config: Option<&Path>) -> Result<()> {
    let (file, state) = load(config)?;
    let spawner = ChildSpawner::current_exe(ctx.verbose, ctx.quiet)?;
    let host = Host::system(file.settings, spawner)?;

    let summary = state.converge(&host, &mut UiProgress)?;
    ui::success(&format!("System converged ({} steps)", summary.total()));
    Ok(())
}

fn check(config: Option<&Path>, json: bool) -> Result<()> {
    let (file, state) = load(config)?;
    let outline = state.outline();

    if json {
        println!("{}", serde_json::to_string_pretty(&outline)?);
        return Ok(());
    }

    if outline.is_empty() {
        println!("Nothing declared");
        return Ok(());
    }

    for phase in &outline {
        println!("{}", phase.phase.name().cyan().bold());
        for step in &phase.steps {
            println!("  {step}");
        }
    }
    for user in &file.declarations.users {
        let nested = State::from_declarations(&user.state)?.outline();
        let steps: usize = nested.iter().map(|p| p.steps.len()).sum();
        println!("{} {} ({steps} steps)", "user".dimmed(), user.name);
    }
    Ok(())
}

/// Child mode: converge a job handed over by the parent
fn run_as_user(ctx: &Context, job: &str) -> Result<()> {
    let job = UserJob::decode(job)?;
    let state = State::from_declarations(&job.declarations)?;
    let spawner = ChildSpawner::current_exe(ctx.verbose, ctx.quiet)?;
    let host = Host::system(job.settings, spawner)?;

    state.converge(&host, &mut UiProgress)?;
    Ok(())
}

/// Print the error chain, plus advice for package manager failures
fn report(err: &anyhow::Error) {
    ui::error(&format!("{err:#}"));

    let category = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<pacmankit::Error>())
        .map(pacmankit::Error::category);
    if let Some(category) = category
        && !matches!(category, ErrorCategory::Other)
    {
        eprintln!("  {}: {}", category.description(), category.advice());
    }
}
