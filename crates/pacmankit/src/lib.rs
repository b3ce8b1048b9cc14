//! # pacmankit
//!
//! Package reconciliation for Arch Linux.
//!
//! This crate provides:
//! - Native package convergence: remove undeclared explicit packages,
//!   install missing ones, each as a single batched pacman call
//! - Foreign (AUR) convergence: clone, compare `pkgver`, build on mismatch,
//!   remove undeclared foreign packages
//! - Categorized pacman errors with user-facing advice
//!
//! ## Example
//!
//! ```no_run
//! use declarative::{Executor, name_set};
//! use pacmankit::backend::pacman::PacmanBackend;
//! use pacmankit::{NoCallback, converge_packages};
//!
//! let backend = PacmanBackend::new(Executor::system());
//! let plan = converge_packages(&backend, &name_set(["base", "git"]), &mut NoCallback).unwrap();
//! println!("removed {:?}, installed {:?}", plan.remove, plan.install);
//! ```

#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod foreign;
pub mod pkgbuild;
pub mod reconcile;
pub mod testing;
pub mod types;

pub use backend::aur::{AUR_BASE_URL, AurBuilder};
pub use backend::pacman::PacmanBackend;
pub use backend::{Backend, ForeignBuilder};
pub use error::{Error, ErrorCategory, Result};
pub use foreign::converge_foreign;
pub use reconcile::{NoCallback, PackageReconciler, ReconcileCallback, converge_packages};
pub use types::{ForeignReport, InstalledPackage, PackagePlan, base_version};
