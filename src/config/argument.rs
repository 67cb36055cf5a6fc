//! Parsing of raw positional-argument descriptors.

use super::{type_name, ArgumentConfig, NAME_PATTERN};
use crate::error::ConfigError;
use serde_json::Value;

/// Turns an ordered list of raw argument descriptors into [`ArgumentConfig`]s.
///
/// Required arguments must precede optional ones, and only the last
/// argument may be repeatable.
pub struct ArgumentConfigParser<'a> {
    scope: Option<&'a str>,
}

impl<'a> ArgumentConfigParser<'a> {
    pub fn new(scope: Option<&'a str>) -> Self {
        Self { scope }
    }

    pub fn parse(&self, raw: &[Value]) -> Result<Vec<ArgumentConfig>, ConfigError> {
        let mut configs = Vec::with_capacity(raw.len());
        let mut optional: Option<String> = None;
        let mut repeatable: Option<String> = None;

        for (index, descriptor) in raw.iter().enumerate() {
            let map = descriptor.as_object().ok_or_else(|| {
                self.error(format!(
                    "argument at index {} must be an object, got {}",
                    index,
                    type_name(descriptor)
                ))
            })?;

            let name = match map.get("name") {
                None => return Err(self.error(format!("argument at index {} has no name", index))),
                Some(Value::String(name)) => name.clone(),
                Some(other) => {
                    return Err(self.error(format!(
                        "name of argument at index {} must be a string, got {}",
                        index,
                        type_name(other)
                    )))
                }
            };
            if !NAME_PATTERN.is_match(&name) {
                return Err(self.error(format!("argument name '{}' is invalid", name)));
            }

            let required = self.read_bool(map.get("required"), "required", &name, true)?;
            if required {
                if let Some(previous) = &optional {
                    return Err(self.error(format!(
                        "argument '{}' must be optional because it follows optional argument '{}'",
                        name, previous
                    )));
                }
            } else if optional.is_none() {
                optional = Some(name.clone());
            }

            let is_repeatable = self.read_bool(map.get("repeatable"), "repeatable", &name, false)?;

            if let Some(previous) = &repeatable {
                return Err(self.error(format!(
                    "argument '{}' cannot follow repeatable argument '{}'",
                    name, previous
                )));
            }
            if is_repeatable {
                repeatable = Some(name.clone());
            }

            configs.push(ArgumentConfig::new(name, required, is_repeatable));
        }

        Ok(configs)
    }

    fn read_bool(
        &self,
        value: Option<&Value>,
        key: &str,
        name: &str,
        default: bool,
    ) -> Result<bool, ConfigError> {
        match value {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(self.error(format!(
                "'{}' of argument '{}' must be a boolean, got {}",
                key,
                name,
                type_name(other)
            ))),
        }
    }

    fn error(&self, message: String) -> ConfigError {
        ConfigError::argument(self.scope, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Vec<ArgumentConfig>, ConfigError> {
        let raw: Vec<Value> = serde_json::from_str(json).unwrap();
        ArgumentConfigParser::new(None).parse(&raw)
    }

    fn error_message(json: &str) -> String {
        match parse(json) {
            Err(ConfigError::Argument { message, .. }) => message,
            other => panic!("Expected argument config error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_defaults() {
        let configs = parse(r#"[{"name": "source"}]"#).unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].name(), "source");
        assert!(configs[0].is_required());
        assert!(!configs[0].is_repeatable());
    }

    #[test]
    fn test_parse_preserves_order() {
        let configs = parse(
            r#"[
                {"name": "source"},
                {"name": "target", "required": false},
                {"name": "extra", "required": false, "repeatable": true}
            ]"#,
        )
        .unwrap();
        let names: Vec<&str> = configs.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["source", "target", "extra"]);
        assert!(!configs[1].is_required());
        assert!(configs[2].is_repeatable());
    }

    #[test]
    fn test_error_not_an_object() {
        assert!(error_message(r#"["source"]"#).contains("must be an object"));
    }

    #[test]
    fn test_error_missing_name() {
        assert!(error_message(r#"[{"required": true}]"#).contains("has no name"));
    }

    #[test]
    fn test_error_name_not_string() {
        assert!(error_message(r#"[{"name": 1}]"#).contains("must be a string"));
    }

    #[test]
    fn test_error_invalid_name() {
        for name in ["-source", "a_b", ""] {
            let json = format!(r#"[{{"name": "{}"}}]"#, name);
            assert!(error_message(&json).contains("is invalid"));
        }
    }

    #[test]
    fn test_error_required_not_bool() {
        assert!(error_message(r#"[{"name": "a", "required": "yes"}]"#)
            .contains("'required' of argument 'a' must be a boolean"));
    }

    #[test]
    fn test_error_required_after_optional_names_previous() {
        let message = error_message(
            r#"[
                {"name": "a", "required": false},
                {"name": "b", "required": false},
                {"name": "c"}
            ]"#,
        );
        assert!(message.contains("'c'"));
        assert!(message.contains("optional argument 'a'"));
    }

    #[test]
    fn test_error_repeatable_not_bool() {
        assert!(error_message(r#"[{"name": "a", "repeatable": 1}]"#)
            .contains("'repeatable' of argument 'a' must be a boolean"));
    }

    #[test]
    fn test_error_argument_after_repeatable() {
        let message = error_message(
            r#"[
                {"name": "files", "repeatable": true},
                {"name": "last", "required": false}
            ]"#,
        );
        assert!(message.contains("cannot follow repeatable argument 'files'"));
    }

    #[test]
    fn test_type_error_reported_before_repeatable_ordering() {
        let message = error_message(
            r#"[
                {"name": "files", "repeatable": true},
                {"name": "last", "required": "x"}
            ]"#,
        );
        assert!(message.contains("'required' of argument 'last' must be a boolean"));
    }

    #[test]
    fn test_optional_ordering_reported_before_repeatable_ordering() {
        let message = error_message(
            r#"[
                {"name": "files", "required": false, "repeatable": true},
                {"name": "last"}
            ]"#,
        );
        assert!(message.contains("must be optional because it follows optional argument 'files'"));
    }

    #[test]
    fn test_error_names_subcommand_scope() {
        let raw: Vec<Value> = serde_json::from_str(r#"[{"name": "_"}]"#).unwrap();
        let err = ArgumentConfigParser::new(Some("child"))
            .parse(&raw)
            .unwrap_err();
        assert!(err.to_string().contains("subcommand 'child'"));
    }
}
