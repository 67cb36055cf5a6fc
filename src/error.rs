//! Error kinds for configuration resolution and command-line parsing.

use std::path::PathBuf;
use thiserror::Error;

/// Render a scope (`None` = the top-level command) for error messages.
pub fn describe_scope(scope: Option<&str>) -> String {
    match scope {
        Some(name) => format!("subcommand '{}'", name),
        None => "command".to_string(),
    }
}

/// Errors raised while reading or validating declarative configuration.
///
/// These describe a malformed configuration and are meant for the developer
/// of the command, not for the person invoking it.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("argument config error in {}: {message}", describe_scope(.scope.as_deref()))]
    Argument {
        scope: Option<String>,
        message: String,
    },

    #[error("option config error in {}: {message}", describe_scope(.scope.as_deref()))]
    Option {
        scope: Option<String>,
        message: String,
    },

    #[error(
        "mutually exclusive option group config error in {}: {message}",
        describe_scope(.scope.as_deref())
    )]
    OptionGroup {
        scope: Option<String>,
        message: String,
    },

    #[error("command config error in {}: {message}", describe_scope(.scope.as_deref()))]
    Command {
        scope: Option<String>,
        message: String,
    },

    #[error("class '{0}' not found")]
    ClassNotFound(String),

    #[error("method '{method}' of class '{class}' not found")]
    MethodNotFound { class: String, method: String },

    #[error("subcommands are only available in multiple command mode")]
    NotMultipleCommandMode,
}

impl ConfigError {
    pub(crate) fn argument(scope: Option<&str>, message: impl Into<String>) -> Self {
        ConfigError::Argument {
            scope: scope.map(str::to_string),
            message: message.into(),
        }
    }

    pub(crate) fn option(scope: Option<&str>, message: impl Into<String>) -> Self {
        ConfigError::Option {
            scope: scope.map(str::to_string),
            message: message.into(),
        }
    }

    pub(crate) fn option_group(scope: Option<&str>, message: impl Into<String>) -> Self {
        ConfigError::OptionGroup {
            scope: scope.map(str::to_string),
            message: message.into(),
        }
    }

    pub(crate) fn command(scope: Option<&str>, message: impl Into<String>) -> Self {
        ConfigError::Command {
            scope: scope.map(str::to_string),
            message: message.into(),
        }
    }
}

/// The invocation's tokens do not satisfy the command's configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CommandParsingError {
    message: String,
    subcommand: Option<String>,
}

impl CommandParsingError {
    pub fn new(message: impl Into<String>, subcommand: Option<&str>) -> Self {
        Self {
            message: message.into(),
            subcommand: subcommand.map(str::to_string),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The subcommand that was active when parsing failed.
    pub fn subcommand(&self) -> Option<&str> {
        self.subcommand.as_deref()
    }
}

/// Any failure of a parse call.
///
/// Configuration is resolved lazily while tokens are consumed, so a parse can
/// surface either kind.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Parsing(#[from] CommandParsingError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_in_messages() {
        let err = ConfigError::argument(None, "bad");
        assert_eq!(err.to_string(), "argument config error in command: bad");

        let err = ConfigError::option(Some("deploy"), "bad");
        assert_eq!(
            err.to_string(),
            "option config error in subcommand 'deploy': bad"
        );
    }

    #[test]
    fn test_parsing_error_carries_subcommand() {
        let err = CommandParsingError::new("Number of arguments error.", Some("child"));
        assert_eq!(err.to_string(), "Number of arguments error.");
        assert_eq!(err.subcommand(), Some("child"));
    }
}
