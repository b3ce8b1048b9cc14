//! Error types for declaration and command execution

use thiserror::Error;

/// Errors raised while declaring desired state
///
/// These are detected before any external effect takes place.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeclarationError {
    /// A list declaration was given no items
    #[error("{kind}: at least one item is required")]
    Empty { kind: &'static str },

    /// A name is empty or contains whitespace
    #[error("{kind}: invalid name '{name}'")]
    InvalidName { kind: &'static str, name: String },

    /// A path argument is empty
    #[error("{kind}: path must not be empty")]
    EmptyPath { kind: &'static str },

    /// A substitution pattern failed to compile
    #[error("replace: invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// A nested (per-user) declaration was rejected
    #[error("user '{user}': {source}")]
    Nested {
        user: String,
        #[source]
        source: Box<DeclarationError>,
    },
}

impl DeclarationError {
    /// Wrap a nested declaration error with the user it belongs to
    pub fn nested(user: impl Into<String>, source: DeclarationError) -> Self {
        Self::Nested {
            user: user.into(),
            source: Box::new(source),
        }
    }
}

/// Errors raised by the command executor
#[derive(Debug, Error)]
pub enum Error {
    /// The program could not be started
    #[error("failed to execute '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and exited unsuccessfully
    #[error("command failed: {command}{}", stderr_suffix(.stderr))]
    CommandFailed { command: String, stderr: String },
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

/// Result type for command execution
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failed_message() {
        let err = Error::CommandFailed {
            command: "pacman -S foo".into(),
            stderr: "error: target not found: foo\n".into(),
        };
        assert_eq!(
            err.to_string(),
            "command failed: pacman -S foo: error: target not found: foo"
        );

        let err = Error::CommandFailed {
            command: "false".into(),
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "command failed: false");
    }

    #[test]
    fn test_nested_declaration_error() {
        let err = DeclarationError::nested("alice", DeclarationError::Empty { kind: "service" });
        assert_eq!(
            err.to_string(),
            "user 'alice': service: at least one item is required"
        );
    }
}
