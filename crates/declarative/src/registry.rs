//! Phase registry and scheduler
//!
//! A [`Registry`] holds, for each [`Phase`], an ordered mapping from
//! [`StepId`] to a deferred step. Registering under an existing id replaces
//! the step in place (its position is kept), so declarations that are
//! repeated converge to a single step.
//!
//! [`Registry::run`] executes phases in their fixed order, skipping empty
//! ones, and steps in registration order. The first failing step aborts the
//! whole run.

use crate::context::{NoProgress, PhaseObserver};
use crate::types::{Phase, PhaseOutline, Registration, RunSummary, StepId};
use anyhow::{Context, Result};

/// A deferred step over the declared state `S` and the environment `E`
pub type Step<S, E> = Box<dyn Fn(&S, &E) -> Result<()>>;

struct Entry<S: ?Sized, E: ?Sized> {
    id: StepId,
    step: Step<S, E>,
}

/// Phase → (id → step) mappings
pub struct Registry<S: ?Sized, E: ?Sized> {
    phases: [Vec<Entry<S, E>>; 4],
}

impl<S: ?Sized, E: ?Sized> Registry<S, E> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            phases: [Vec::new(), Vec::new(), Vec::new(), Vec::new()],
        }
    }

    /// Store the step for `id` in `phase`, replacing any earlier one
    pub fn register<F>(&mut self, phase: Phase, id: impl Into<StepId>, step: F) -> Registration
    where
        F: Fn(&S, &E) -> Result<()> + 'static,
    {
        let id = id.into();
        let entries = &mut self.phases[phase.index()];

        if let Some(entry) = entries.iter_mut().find(|e| e.id == id) {
            log::trace!("replacing {phase} step '{id}'");
            entry.step = Box::new(step);
            return Registration::Replaced;
        }

        log::trace!("registering {phase} step '{id}'");
        entries.push(Entry {
            id,
            step: Box::new(step),
        });
        Registration::Inserted
    }

    /// Whether a step is registered under `id` in `phase`
    pub fn contains(&self, phase: Phase, id: &str) -> bool {
        self.phases[phase.index()]
            .iter()
            .any(|e| e.id.as_str() == id)
    }

    /// Number of steps registered in `phase`
    pub fn len(&self, phase: Phase) -> usize {
        self.phases[phase.index()].len()
    }

    /// Whether no step is registered in any phase
    pub fn is_empty(&self) -> bool {
        self.phases.iter().all(Vec::is_empty)
    }

    /// Step ids per non-empty phase, in execution order
    pub fn outline(&self) -> Vec<PhaseOutline> {
        Phase::ALL
            .iter()
            .filter(|phase| self.len(**phase) > 0)
            .map(|phase| PhaseOutline {
                phase: *phase,
                steps: self.phases[phase.index()]
                    .iter()
                    .map(|e| e.id.clone())
                    .collect(),
            })
            .collect()
    }

    /// Run every phase in order, reporting progress to `observer`
    pub fn run<P: PhaseObserver>(&self, state: &S, env: &E, observer: &mut P) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for phase in Phase::ALL {
            let entries = &self.phases[phase.index()];
            if entries.is_empty() {
                continue;
            }

            observer.on_phase_start(phase, entries.len());
            for entry in entries {
                observer.on_step_start(phase, &entry.id);
                (entry.step)(state, env)
                    .with_context(|| format!("{phase} step '{}' failed", entry.id))?;
            }
            observer.on_phase_complete(phase);
            summary.executed.insert(phase, entries.len());
        }

        Ok(summary)
    }

    /// Run without progress reporting
    pub fn run_simple(&self, state: &S, env: &E) -> Result<RunSummary> {
        self.run(state, env, &mut NoProgress)
    }
}

impl<S: ?Sized, E: ?Sized> Default for Registry<S, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ?Sized, E: ?Sized> std::fmt::Debug for Registry<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("outline", &self.outline())
            .finish()
    }
}
