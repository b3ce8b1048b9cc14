//! Error types for pacman and AUR operations.
//!
//! Failures reported by pacman on stderr are categorized so the front end
//! can print a description and actionable advice next to the raw message.

use std::path::PathBuf;
use thiserror::Error;

/// Categories of package manager errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A target is not in any sync database
    NotFound,
    /// File or dependency conflict
    Conflict,
    /// Operation requires root
    Permission,
    /// Another pacman instance holds the database lock
    DatabaseLocked,
    /// Mirror or AUR unreachable
    Network,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Classify pacman stderr.
    pub fn classify(stderr: &str) -> Self {
        let lower = stderr.to_lowercase();

        if lower.contains("unable to lock database") || lower.contains("db.lck") {
            Self::DatabaseLocked
        } else if lower.contains("target not found") || lower.contains("was not found") {
            Self::NotFound
        } else if lower.contains("conflicting")
            || lower.contains("are in conflict")
            || lower.contains("breaks dependency")
            || lower.contains("unable to satisfy dependency")
        {
            Self::Conflict
        } else if lower.contains("you cannot perform this operation unless you are root")
            || lower.contains("permission denied")
        {
            Self::Permission
        } else if lower.contains("failed retrieving file")
            || lower.contains("could not resolve host")
            || lower.contains("failed to synchronize")
            || lower.contains("connection timed out")
        {
            Self::Network
        } else {
            Self::Other
        }
    }

    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::NotFound => "Package not found",
            Self::Conflict => "Package conflict",
            Self::Permission => "Permission denied",
            Self::DatabaseLocked => "Package database locked",
            Self::Network => "Network connectivity issue",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::NotFound => "Verify the package name, or declare it with `aur` if it lives in the AUR",
            Self::Conflict => "Remove the conflicting package or resolve the dependency by hand",
            Self::Permission => "Run as root or make sure sudo is configured for this user",
            Self::DatabaseLocked => {
                "Wait for the other pacman process, or remove /var/lib/pacman/db.lck if none is running"
            }
            Self::Network => "Check your internet connection and mirrorlist, then try again",
            Self::Other => "Check the error details for more information",
        }
    }
}

/// Errors that can occur during package operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Target not found in any sync database
    #[error("package not found: {name}")]
    NotFound {
        /// Name of the package that could not be found
        name: String,
    },

    /// File or dependency conflict
    #[error("conflict: {message}")]
    Conflict {
        /// Description of the conflict
        message: String,
    },

    /// Permission denied
    #[error("permission denied: {message}")]
    Permission {
        /// Details about what permission was denied
        message: String,
    },

    /// Database lock held by another process
    #[error("database locked: {message}")]
    DatabaseLocked {
        /// Message reported by pacman
        message: String,
    },

    /// Network-related error
    #[error("network error: {message}")]
    Network {
        /// Detailed error message
        message: String,
    },

    /// Query command failed for an unrecognized reason
    #[error("command failed: {message}")]
    CommandFailed {
        /// Description of what command failed
        message: String,
        /// Standard error output from the failed command
        stderr: String,
    },

    /// A PKGBUILD has no `pkgver=` line
    #[error("no pkgver= line in {}", .path.display())]
    MissingPkgver {
        /// Path of the PKGBUILD that was read
        path: PathBuf,
    },

    /// Command could not be started or exited unsuccessfully
    #[error(transparent)]
    Exec(#[from] declarative::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::Conflict { .. } => ErrorCategory::Conflict,
            Error::Permission { .. } => ErrorCategory::Permission,
            Error::DatabaseLocked { .. } => ErrorCategory::DatabaseLocked,
            Error::Network { .. } => ErrorCategory::Network,
            Error::Exec(declarative::Error::CommandFailed { stderr, .. }) => {
                ErrorCategory::classify(stderr)
            }
            _ => ErrorCategory::Other,
        }
    }

    /// Create an error from pacman stderr.
    pub fn from_pacman_output(stderr: &str, package_name: Option<&str>) -> Self {
        let message = stderr.trim().to_string();
        match ErrorCategory::classify(stderr) {
            ErrorCategory::NotFound => Error::NotFound {
                name: package_name
                    .map(ToString::to_string)
                    .or_else(|| not_found_target(stderr))
                    .unwrap_or_else(|| "unknown".to_string()),
            },
            ErrorCategory::Conflict => Error::Conflict { message },
            ErrorCategory::Permission => Error::Permission { message },
            ErrorCategory::DatabaseLocked => Error::DatabaseLocked { message },
            ErrorCategory::Network => Error::Network { message },
            ErrorCategory::Other => Error::CommandFailed {
                message: format!(
                    "pacman command failed{}",
                    package_name
                        .map(|n| format!(" for {n}"))
                        .unwrap_or_default()
                ),
                stderr: message,
            },
        }
    }
}

/// Extract `foo` from `error: target not found: foo`.
fn not_found_target(stderr: &str) -> Option<String> {
    stderr
        .lines()
        .find_map(|l| l.split_once("target not found:"))
        .map(|(_, name)| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Result type for package operations.
pub type Result<T> = std::result::Result<T, Error>;
