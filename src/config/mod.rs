//! Declarative command configuration: value model, descriptor parsers, and
//! the per-command aggregator.

pub mod argument;
pub mod command;
pub mod group;
pub mod model;
pub mod naming;
pub mod option;

pub use command::CommandConfig;
pub use model::{
    ArgumentConfig, MutuallyExclusiveOptionGroupConfig, OptionArgumentConfig, OptionConfig,
};

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Argument, option, and subcommand names.
pub(crate) static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9-]*$").expect("invalid name regex")
});

/// Names of an option's argument.
pub(crate) static OPTION_ARGUMENT_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9-]+$").expect("invalid argument name regex"));

/// Enumerated option-argument values.
pub(crate) static OPTION_VALUE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("invalid value regex"));

/// JSON type name used in "must be" messages.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_pattern() {
        for name in ["a", "file", "dry-run", "0day", "A1-b"] {
            assert!(NAME_PATTERN.is_match(name), "expected '{}' to match", name);
        }
        for name in ["", "-x", "a_b", "a b", "é"] {
            assert!(!NAME_PATTERN.is_match(name), "expected '{}' to fail", name);
        }
    }

    #[test]
    fn test_option_patterns() {
        assert!(OPTION_ARGUMENT_NAME_PATTERN.is_match("-file-"));
        assert!(!OPTION_ARGUMENT_NAME_PATTERN.is_match("a_b"));
        assert!(OPTION_VALUE_PATTERN.is_match("snake_case-1"));
        assert!(!OPTION_VALUE_PATTERN.is_match("a.b"));
    }
}
