//! Validated, immutable configuration records.
//!
//! Instances are only built by the descriptor parsers in this module tree,
//! which have already checked every invariant.

use serde::Serialize;
use std::rc::Rc;

/// A positional argument of a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArgumentConfig {
    name: String,
    required: bool,
    repeatable: bool,
}

impl ArgumentConfig {
    pub(crate) fn new(name: String, required: bool, repeatable: bool) -> Self {
        Self {
            name,
            required,
            repeatable,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_repeatable(&self) -> bool {
        self.repeatable
    }
}

/// The value accepted by an option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionArgumentConfig {
    name: String,
    required: bool,
    values: Option<Vec<String>>,
}

impl OptionArgumentConfig {
    pub(crate) fn new(name: String, required: bool, values: Option<Vec<String>>) -> Self {
        Self {
            name,
            required,
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Allowed values, or `None` when any value is accepted.
    pub fn values(&self) -> Option<&[String]> {
        self.values.as_deref()
    }
}

/// A named and/or single-character option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionConfig {
    name: Option<String>,
    short_name: Option<char>,
    required: bool,
    repeatable: bool,
    #[serde(rename = "argument")]
    argument_config: Option<OptionArgumentConfig>,
    description: Option<String>,
}

impl OptionConfig {
    pub(crate) fn new(
        name: Option<String>,
        short_name: Option<char>,
        required: bool,
        repeatable: bool,
        argument_config: Option<OptionArgumentConfig>,
        description: Option<String>,
    ) -> Self {
        Self {
            name,
            short_name,
            required,
            repeatable,
            argument_config,
            description,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn short_name(&self) -> Option<char> {
        self.short_name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_repeatable(&self) -> bool {
        self.repeatable
    }

    pub fn argument_config(&self) -> Option<&OptionArgumentConfig> {
        self.argument_config.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The key parsed values are stored under: the long name, else the short name.
    pub fn key(&self) -> String {
        match (&self.name, self.short_name) {
            (Some(name), _) => name.clone(),
            (None, Some(short)) => short.to_string(),
            // Both unset never passes validation.
            (None, None) => String::new(),
        }
    }
}

/// Options of which at most one may be given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutuallyExclusiveOptionGroupConfig {
    #[serde(rename = "options", serialize_with = "serialize_option_keys")]
    option_configs: Vec<Rc<OptionConfig>>,
    required: bool,
}

impl MutuallyExclusiveOptionGroupConfig {
    pub(crate) fn new(option_configs: Vec<Rc<OptionConfig>>, required: bool) -> Self {
        Self {
            option_configs,
            required,
        }
    }

    pub fn option_configs(&self) -> &[Rc<OptionConfig>] {
        &self.option_configs
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

fn serialize_option_keys<S>(options: &[Rc<OptionConfig>], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(options.iter().map(|option| option.key()))
}
