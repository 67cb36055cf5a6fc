//! Parsing of raw option descriptors.

use super::{
    type_name, OptionArgumentConfig, OptionConfig, NAME_PATTERN, OPTION_ARGUMENT_NAME_PATTERN,
    OPTION_VALUE_PATTERN,
};
use crate::error::ConfigError;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Short name kept free for implementation-defined extensions.
pub const RESERVED_SHORT_NAME: char = 'W';

/// Turns an ordered list of raw option descriptors into [`OptionConfig`]s.
pub struct OptionConfigParser<'a> {
    scope: Option<&'a str>,
}

impl<'a> OptionConfigParser<'a> {
    pub fn new(scope: Option<&'a str>) -> Self {
        Self { scope }
    }

    pub fn parse(&self, raw: &[Value]) -> Result<Vec<OptionConfig>, ConfigError> {
        let mut configs = Vec::with_capacity(raw.len());
        // Long names and short names share one namespace.
        let mut seen: HashSet<String> = HashSet::new();

        for (index, descriptor) in raw.iter().enumerate() {
            let map = descriptor.as_object().ok_or_else(|| {
                self.error(format!(
                    "option at index {} must be an object, got {}",
                    index,
                    type_name(descriptor)
                ))
            })?;

            let config = self.parse_one(index, map)?;

            if let Some(name) = config.name() {
                if !seen.insert(name.to_string()) {
                    return Err(self.error(format!("option name '{}' is duplicated", name)));
                }
            }
            if let Some(short) = config.short_name() {
                let short = short.to_string();
                // `name` equal to `short_name` on the same option is one identifier.
                if config.name() != Some(short.as_str()) && !seen.insert(short.clone()) {
                    return Err(self.error(format!("option short name '{}' is duplicated", short)));
                }
            }

            configs.push(config);
        }

        Ok(configs)
    }

    fn parse_one(&self, index: usize, map: &Map<String, Value>) -> Result<OptionConfig, ConfigError> {
        let name = match map.get("name") {
            None | Some(Value::Null) => None,
            Some(Value::String(name)) => {
                if !NAME_PATTERN.is_match(name) {
                    return Err(self.error(format!("option name '{}' is invalid", name)));
                }
                Some(name.clone())
            }
            Some(other) => {
                return Err(self.error(format!(
                    "name of option at index {} must be a string, got {}",
                    index,
                    type_name(other)
                )))
            }
        };

        let short_name = match map.get("short_name") {
            None | Some(Value::Null) => None,
            Some(Value::String(short)) => {
                let mut chars = short.chars();
                let c = match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_alphanumeric() => c,
                    _ => {
                        return Err(self.error(format!(
                            "short name '{}' of option at index {} must be a single alphanumeric character",
                            short, index
                        )))
                    }
                };
                if c == RESERVED_SHORT_NAME {
                    return Err(self.error(format!(
                        "short name '{}' is reserved and cannot be used",
                        RESERVED_SHORT_NAME
                    )));
                }
                Some(c)
            }
            Some(other) => {
                return Err(self.error(format!(
                    "short name of option at index {} must be a string, got {}",
                    index,
                    type_name(other)
                )))
            }
        };

        let label = match (&name, short_name) {
            (Some(name), _) => name.clone(),
            (None, Some(short)) => short.to_string(),
            (None, None) => {
                return Err(self.error(format!(
                    "option at index {} must have a name or a short name",
                    index
                )))
            }
        };

        if let (Some(name), Some(short)) = (&name, short_name) {
            let mut chars = name.chars();
            if let (Some(only), None) = (chars.next(), chars.next()) {
                if only != short {
                    return Err(self.error(format!(
                        "option name '{}' conflicts with its short name '{}'",
                        name, short
                    )));
                }
            }
        }

        let required = self.read_bool(map, "required", &label)?;
        let repeatable = self.read_bool(map, "repeatable", &label)?;

        let description = match map.get("description") {
            None | Some(Value::Null) => None,
            Some(Value::String(description)) => Some(description.clone()),
            Some(other) => {
                return Err(self.error(format!(
                    "description of option '{}' must be a string, got {}",
                    label,
                    type_name(other)
                )))
            }
        };

        let argument_config = match map.get("argument") {
            None | Some(Value::Null) => None,
            Some(Value::Object(argument)) => Some(self.parse_argument(argument, &label)?),
            Some(other) => {
                return Err(self.error(format!(
                    "argument of option '{}' must be an object, got {}",
                    label,
                    type_name(other)
                )))
            }
        };

        Ok(OptionConfig::new(
            name,
            short_name,
            required,
            repeatable,
            argument_config,
            description,
        ))
    }

    fn parse_argument(
        &self,
        map: &Map<String, Value>,
        label: &str,
    ) -> Result<OptionArgumentConfig, ConfigError> {
        let name = match map.get("name") {
            None => {
                return Err(self.error(format!("argument of option '{}' has no name", label)));
            }
            Some(Value::String(name)) => name.clone(),
            Some(other) => {
                return Err(self.error(format!(
                    "argument name of option '{}' must be a string, got {}",
                    label,
                    type_name(other)
                )))
            }
        };
        if !OPTION_ARGUMENT_NAME_PATTERN.is_match(&name) {
            return Err(self.error(format!(
                "argument name '{}' of option '{}' is invalid",
                name, label
            )));
        }

        let required = match map.get("required") {
            None => true,
            Some(Value::Bool(b)) => *b,
            Some(other) => {
                return Err(self.error(format!(
                    "'required' of the argument of option '{}' must be a boolean, got {}",
                    label,
                    type_name(other)
                )))
            }
        };

        let values = match map.get("values") {
            None | Some(Value::Null) => None,
            Some(Value::Array(items)) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::String(value) if OPTION_VALUE_PATTERN.is_match(value) => {
                            values.push(value.clone());
                        }
                        Value::String(value) => {
                            return Err(self.error(format!(
                                "value '{}' of option '{}' is invalid",
                                value, label
                            )));
                        }
                        other => {
                            return Err(self.error(format!(
                                "values of option '{}' must be strings, got {}",
                                label,
                                type_name(other)
                            )));
                        }
                    }
                }
                Some(values)
            }
            Some(other) => {
                return Err(self.error(format!(
                    "values of option '{}' must be an array, got {}",
                    label,
                    type_name(other)
                )))
            }
        };

        Ok(OptionArgumentConfig::new(name, required, values))
    }

    fn read_bool(
        &self,
        map: &Map<String, Value>,
        key: &str,
        label: &str,
    ) -> Result<bool, ConfigError> {
        match map.get(key) {
            None => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(self.error(format!(
                "'{}' of option '{}' must be a boolean, got {}",
                key,
                label,
                type_name(other)
            ))),
        }
    }

    fn error(&self, message: String) -> ConfigError {
        ConfigError::option(self.scope, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Vec<OptionConfig>, ConfigError> {
        let raw: Vec<Value> = serde_json::from_str(json).unwrap();
        OptionConfigParser::new(None).parse(&raw)
    }

    fn error_message(json: &str) -> String {
        match parse(json) {
            Err(ConfigError::Option { message, .. }) => message,
            other => panic!("Expected option config error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_full_option() {
        let configs = parse(
            r#"[{
                "name": "format",
                "short_name": "f",
                "required": true,
                "repeatable": true,
                "description": "Output format",
                "argument": {"name": "type", "values": ["json", "yaml_1"]}
            }]"#,
        )
        .unwrap();
        let option = &configs[0];
        assert_eq!(option.name(), Some("format"));
        assert_eq!(option.short_name(), Some('f'));
        assert!(option.is_required());
        assert!(option.is_repeatable());
        assert_eq!(option.description(), Some("Output format"));
        let argument = option.argument_config().unwrap();
        assert_eq!(argument.name(), "type");
        assert!(argument.is_required());
        assert_eq!(
            argument.values(),
            Some(&["json".to_string(), "yaml_1".to_string()][..])
        );
    }

    #[test]
    fn test_parse_defaults() {
        let configs = parse(r#"[{"short_name": "t"}, {"name": "quiet"}]"#).unwrap();
        assert_eq!(configs[0].name(), None);
        assert!(!configs[0].is_required());
        assert!(!configs[0].is_repeatable());
        assert!(configs[0].argument_config().is_none());
        assert_eq!(configs[1].short_name(), None);
    }

    #[test]
    fn test_optional_argument() {
        let configs =
            parse(r#"[{"name": "color", "argument": {"name": "when", "required": false}}]"#)
                .unwrap();
        let argument = configs[0].argument_config().unwrap();
        assert!(!argument.is_required());
        assert_eq!(argument.values(), None);
    }

    #[test]
    fn test_single_char_name_matching_short_name() {
        let configs = parse(r#"[{"name": "t", "short_name": "t"}]"#).unwrap();
        assert_eq!(configs[0].key(), "t");
    }

    #[test]
    fn test_error_no_name() {
        assert!(error_message(r#"[{"required": true}]"#).contains("name or a short name"));
    }

    #[test]
    fn test_error_invalid_name() {
        assert!(error_message(r#"[{"name": "-x"}]"#).contains("'-x' is invalid"));
    }

    #[test]
    fn test_error_invalid_short_name() {
        for short in ["ab", "-", ""] {
            let json = format!(r#"[{{"short_name": "{}"}}]"#, short);
            assert!(error_message(&json).contains("single alphanumeric character"));
        }
    }

    #[test]
    fn test_error_reserved_short_name() {
        assert!(error_message(r#"[{"short_name": "W"}]"#).contains("reserved"));
        assert!(error_message(r#"[{"name": "width", "short_name": "W"}]"#).contains("reserved"));
    }

    #[test]
    fn test_lowercase_w_is_allowed() {
        parse(r#"[{"short_name": "w"}]"#).unwrap();
    }

    #[test]
    fn test_error_single_char_name_conflicts_with_short_name() {
        assert!(
            error_message(r#"[{"name": "a", "short_name": "b"}]"#).contains("conflicts with")
        );
    }

    #[test]
    fn test_error_duplicate_name() {
        assert!(error_message(r#"[{"name": "all"}, {"name": "all"}]"#).contains("duplicated"));
    }

    #[test]
    fn test_error_duplicate_short_name() {
        assert!(
            error_message(r#"[{"name": "all", "short_name": "a"}, {"short_name": "a"}]"#)
                .contains("short name 'a' is duplicated")
        );
    }

    #[test]
    fn test_error_name_collides_with_prior_short_name() {
        assert!(
            error_message(r#"[{"name": "all", "short_name": "a"}, {"name": "a"}]"#)
                .contains("option name 'a' is duplicated")
        );
    }

    #[test]
    fn test_error_short_name_collides_with_prior_name() {
        assert!(error_message(r#"[{"name": "a"}, {"name": "all", "short_name": "a"}]"#)
            .contains("short name 'a' is duplicated"));
    }

    #[test]
    fn test_error_bool_fields() {
        assert!(error_message(r#"[{"name": "a", "required": 1}]"#)
            .contains("'required' of option 'a' must be a boolean"));
        assert!(error_message(r#"[{"short_name": "a", "repeatable": "no"}]"#)
            .contains("'repeatable' of option 'a' must be a boolean"));
    }

    #[test]
    fn test_error_description_not_string() {
        assert!(error_message(r#"[{"name": "a", "description": []}]"#)
            .contains("description of option 'a'"));
    }

    #[test]
    fn test_error_argument_fields() {
        assert!(error_message(r#"[{"name": "a", "argument": "x"}]"#).contains("must be an object"));
        assert!(error_message(r#"[{"name": "a", "argument": {}}]"#).contains("has no name"));
        assert!(
            error_message(r#"[{"name": "a", "argument": {"name": "a_b"}}]"#).contains("is invalid")
        );
        assert!(error_message(r#"[{"name": "a", "argument": {"name": "x", "required": "no"}}]"#)
            .contains("must be a boolean"));
        assert!(error_message(r#"[{"name": "a", "argument": {"name": "x", "values": "v"}}]"#)
            .contains("must be an array"));
        assert!(error_message(r#"[{"name": "a", "argument": {"name": "x", "values": [1]}}]"#)
            .contains("must be strings"));
        assert!(
            error_message(r#"[{"name": "a", "argument": {"name": "x", "values": ["a b"]}}]"#)
                .contains("value 'a b'")
        );
    }
}
