//! # Declarative
//!
//! Staged convergence of declared state.
//!
//! Declarations register deferred steps into a [`Registry`], each tagged
//! with a [`Phase`] and a [`StepId`]. Nothing touches the system until
//! [`Registry::run`] is called, which executes the phases in their fixed
//! order and stops at the first failing step.
//!
//! ## Core Concepts
//!
//! - **Phase**: Prepare, Install, Configure, Finalize (always in that order)
//! - **StepId**: Key within a phase; re-registering under it replaces the step
//! - **Executor**: Runs external commands, escalating with `sudo` only when
//!   the process is not already root
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{Phase, Registry};
//!
//! struct Desired { packages: Vec<String> }
//!
//! let mut registry: Registry<Desired, ()> = Registry::new();
//! registry.register(Phase::Install, "package", |desired, _env| {
//!     for pkg in &desired.packages {
//!         println!("would install {pkg}");
//!     }
//!     Ok(())
//! });
//!
//! let desired = Desired { packages: vec!["git".into()] };
//! let summary = registry.run_simple(&desired, &())?;
//! assert_eq!(summary.total(), 1);
//! ```
//!
//! ## Provider Traits
//!
//! - [`CommandRunner`]: Spawns processes (scriptable in tests)
//! - [`PrivilegeCheck`]: Reports whether the process is root
//! - [`PhaseObserver`]: Receives progress updates
//!
//! This allows the crate to be used without hard dependencies on a
//! particular UI or on the real process table.

pub mod context;
pub mod diff;
pub mod error;
pub mod executor;
pub mod registry;
pub mod testing;
pub mod types;

// Re-export main types at crate root
pub use context::{
    CommandRunner, EffectiveUid, NoProgress, PhaseObserver, PrivilegeCheck, SystemRunner,
};
pub use diff::{SetDiff, name_set};
pub use error::{DeclarationError, Error, Result};
pub use executor::{DEFAULT_ESCALATION, Executor};
pub use registry::{Registry, Step};
pub use types::{
    CommandOutput, CommandSpec, Phase, PhaseOutline, Registration, RunSummary, StepId,
};
