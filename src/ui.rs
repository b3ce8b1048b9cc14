use colored::Colorize;
use declarative::{Phase, PhaseObserver, StepId};
use pacmankit::ReconcileCallback;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};

static QUIET: AtomicBool = AtomicBool::new(false);

/// Suppress informational output for the rest of the process
pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

fn quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Print a success message
pub fn success(msg: &str) {
    if !quiet() {
        println!("{} {}", "✓".green(), msg);
    }
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a section header
pub fn section(title: &str) {
    if !quiet() {
        println!();
        println!("{}", title.cyan().bold());
    }
}

// ============================================================================
// Detail lines
// ============================================================================

/// A value shown on an aligned detail line
pub enum Detail<'a> {
    Text(&'a str),
    List(Vec<&'a str>),
}

impl<'a> From<&'a str> for Detail<'a> {
    fn from(value: &'a str) -> Self {
        Self::Text(value)
    }
}

impl<'a> From<&'a String> for Detail<'a> {
    fn from(value: &'a String) -> Self {
        Self::Text(value)
    }
}

impl<'a> From<&'a BTreeSet<String>> for Detail<'a> {
    fn from(value: &'a BTreeSet<String>) -> Self {
        Self::List(value.iter().map(String::as_str).collect())
    }
}

impl<'a> From<&'a [String]> for Detail<'a> {
    fn from(value: &'a [String]) -> Self {
        Self::List(value.iter().map(String::as_str).collect())
    }
}

/// `(n) a, b, c`
pub fn format_list(items: &[&str]) -> String {
    format!("({}) {}", items.len(), items.join(", "))
}

/// Detail lines with keys right-aligned to the longest key
pub fn format_details(details: &[(&str, Detail<'_>)]) -> Vec<String> {
    let width = details.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    details
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Detail::Text(text) => (*text).to_string(),
                Detail::List(items) => format_list(items),
            };
            format!("\t{key:>width$}: {value}")
        })
        .collect()
}

/// Print an action message followed by its aligned details
pub fn announce(msg: &str, details: &[(&str, Detail<'_>)]) {
    if quiet() {
        return;
    }
    println!("{} {}", "→".blue(), msg);
    for line in format_details(details) {
        println!("{}", line.dimmed());
    }
}

// ============================================================================
// Progress
// ============================================================================

/// Phase headers and step markers on stdout
#[derive(Debug, Default)]
pub struct UiProgress;

impl PhaseObserver for UiProgress {
    fn on_phase_start(&mut self, phase: Phase, steps: usize) {
        log::debug!("{phase}: {steps} step(s)");
        section(&format!("=> {phase}"));
    }

    fn on_step_start(&mut self, _phase: Phase, id: &StepId) {
        log::debug!("step {id}");
    }

    fn on_phase_complete(&mut self, phase: Phase) {
        log::debug!("{phase} complete");
    }
}

/// Package batches announced as they are issued
#[derive(Debug, Default)]
pub struct UiCallback;

impl ReconcileCallback for UiCallback {
    fn on_remove(&mut self, names: &BTreeSet<String>) {
        announce("Removing packages", &[("packages", names.into())]);
    }

    fn on_install(&mut self, names: &BTreeSet<String>) {
        announce("Installing packages", &[("packages", names.into())]);
    }

    fn on_build(&mut self, name: &str, version: &str) {
        announce(
            "Building foreign package",
            &[("package", name.into()), ("version", version.into())],
        );
    }

    fn on_remove_foreign(&mut self, names: &BTreeSet<String>) {
        announce("Removing foreign packages", &[("packages", names.into())]);
    }
}

// ============================================================================
// Tests
// ============================================================================
