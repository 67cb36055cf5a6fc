//! Tokenizing and validating an argument vector against a [`CommandConfig`].

use crate::config::{CommandConfig, OptionConfig};
use crate::error::{CommandParsingError, Error};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::rc::Rc;

/// One occurrence of an option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// Given without an argument.
    Flag,
    /// Given with an argument.
    Value(String),
}

impl OptionValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Flag => None,
            OptionValue::Value(value) => Some(value),
        }
    }
}

impl Serialize for OptionValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            OptionValue::Flag => serializer.serialize_bool(true),
            OptionValue::Value(value) => serializer.serialize_str(value),
        }
    }
}

/// Everything given for one option: the last occurrence, or every occurrence
/// of a repeatable option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParsedOption {
    Single(OptionValue),
    Repeated(Vec<OptionValue>),
}

impl ParsedOption {
    /// Every occurrence, in order.
    pub fn values(&self) -> &[OptionValue] {
        match self {
            ParsedOption::Single(value) => std::slice::from_ref(value),
            ParsedOption::Repeated(values) => values,
        }
    }
}

/// Options that print help or version instead of running the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MagicOption {
    Help,
    Version,
}

impl MagicOption {
    fn key(self) -> &'static str {
        match self {
            MagicOption::Help => "help",
            MagicOption::Version => "version",
        }
    }
}

pub type OptionMap = BTreeMap<String, ParsedOption>;

/// Result of parsing one argument vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedCommand {
    subcommand: Option<String>,
    global_options: OptionMap,
    options: OptionMap,
    arguments: Vec<String>,
    magic: Option<MagicOption>,
}

impl ParsedCommand {
    /// The selected subcommand (multiple command mode only).
    pub fn subcommand(&self) -> Option<&str> {
        self.subcommand.as_deref()
    }

    /// Options given before the subcommand (multiple command mode only).
    pub fn global_options(&self) -> &OptionMap {
        &self.global_options
    }

    /// Options of the command or of the selected subcommand.
    pub fn options(&self) -> &OptionMap {
        &self.options
    }

    pub fn option(&self, key: &str) -> Option<&ParsedOption> {
        self.options.get(key)
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Help or version was requested; required fields were not enforced.
    pub fn magic_option(&self) -> Option<MagicOption> {
        self.magic
    }
}

/// Mutable state of a single parse.
struct ParseState {
    is_global: bool,
    is_argument: bool,
    subcommand: Option<String>,
    global_options: OptionMap,
    options: OptionMap,
    arguments: Vec<String>,
}

impl ParseState {
    fn scope(&self) -> Option<&str> {
        self.subcommand.as_deref()
    }

    fn error(&self, message: String) -> Error {
        CommandParsingError::new(message, self.scope()).into()
    }

    fn record(&mut self, option: &OptionConfig, value: OptionValue) {
        let target = if self.is_global {
            &mut self.global_options
        } else {
            &mut self.options
        };
        let key = option.key();

        if option.is_repeatable() {
            if let ParsedOption::Repeated(values) = target
                .entry(key)
                .or_insert_with(|| ParsedOption::Repeated(Vec::new()))
            {
                values.push(value);
            }
        } else {
            target.insert(key, ParsedOption::Single(value));
        }
    }
}

type Tokens<'t> = std::slice::Iter<'t, String>;

/// Parses argument vectors against a command configuration.
///
/// Parsing is a single deterministic pass; the first violation is returned
/// as an error.
pub struct CommandParser<'a> {
    config: &'a CommandConfig,
}

impl<'a> CommandParser<'a> {
    pub fn new(config: &'a CommandConfig) -> Self {
        Self { config }
    }

    /// Parse `argv`; `argv[0]` is the program name and is ignored.
    pub fn parse(&self, argv: &[String]) -> Result<ParsedCommand, Error> {
        let multiple = self.config.is_multiple_command_mode();
        let mut state = ParseState {
            is_global: multiple,
            is_argument: false,
            subcommand: None,
            global_options: OptionMap::new(),
            options: OptionMap::new(),
            arguments: Vec::new(),
        };
        tracing::debug!(tokens = argv.len().saturating_sub(1), multiple, "parsing arguments");

        let mut tokens = argv.get(1..).unwrap_or_default().iter();
        while let Some(token) = tokens.next() {
            if state.is_argument || token.is_empty() || !token.starts_with('-') || token == "-" {
                self.positional(&mut state, token)?;
            } else if token == "--" {
                if state.is_global {
                    return Err(state.error("Subcommand is not specified before '--'.".to_string()));
                }
                state.is_argument = true;
            } else if let Some(long) = token.strip_prefix("--") {
                self.long_option(&mut state, long, &mut tokens)?;
            } else {
                self.short_options(&mut state, &token[1..], &mut tokens)?;
            }
        }

        let magic = self.magic_option(&state);

        if multiple {
            self.validate_options(&state, None, &state.global_options, magic.is_some())?;
        }
        if !state.is_global {
            self.validate_options(&state, state.scope(), &state.options, magic.is_some())?;
        }
        if !state.is_global && magic.is_none() {
            self.validate_arguments(&state)?;
        }

        tracing::debug!(subcommand = ?state.subcommand, magic = ?magic, "parsed arguments");
        Ok(ParsedCommand {
            subcommand: state.subcommand,
            global_options: state.global_options,
            options: state.options,
            arguments: state.arguments,
            magic,
        })
    }

    fn positional(&self, state: &mut ParseState, token: &str) -> Result<(), Error> {
        if state.is_global {
            if !self.config.has_subcommand(token)? {
                return Err(state.error(format!("Subcommand '{}' does not exist.", token)));
            }
            state.is_global = false;
            state.subcommand = Some(token.to_string());
        } else {
            state.arguments.push(token.to_string());
        }
        Ok(())
    }

    fn lookup(&self, state: &ParseState, name: &str) -> Result<Rc<OptionConfig>, Error> {
        self.config
            .option_config(name, state.scope())?
            .ok_or_else(|| state.error(format!("Option '{}' is not allowed.", name)))
    }

    fn long_option(
        &self,
        state: &mut ParseState,
        body: &str,
        tokens: &mut Tokens<'_>,
    ) -> Result<(), Error> {
        let (name, inline) = match body.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (body, None),
        };
        let option = self.lookup(state, name)?;

        let value = match (option.argument_config(), inline) {
            (None, Some(_)) => {
                return Err(state.error(format!("Option '{}' must not have an argument.", name)))
            }
            (None, None) => OptionValue::Flag,
            (Some(_), Some(value)) => OptionValue::Value(value.to_string()),
            (Some(argument), None) if argument.is_required() => match tokens.next() {
                Some(value) => OptionValue::Value(value.clone()),
                None => {
                    return Err(state.error(format!("Option '{}' requires an argument.", name)))
                }
            },
            (Some(_), None) => OptionValue::Flag,
        };

        state.record(&option, value);
        Ok(())
    }

    fn short_options(
        &self,
        state: &mut ParseState,
        cluster: &str,
        tokens: &mut Tokens<'_>,
    ) -> Result<(), Error> {
        for (offset, c) in cluster.char_indices() {
            let name = c.to_string();
            let option = self.lookup(state, &name)?;
            let rest = &cluster[offset + c.len_utf8()..];

            match option.argument_config() {
                Some(argument) if argument.is_required() => {
                    let value = if !rest.is_empty() {
                        rest.to_string()
                    } else {
                        match tokens.next() {
                            Some(value) => value.clone(),
                            None => {
                                return Err(state
                                    .error(format!("Option '{}' requires an argument.", name)))
                            }
                        }
                    };
                    state.record(&option, OptionValue::Value(value));
                    return Ok(());
                }
                Some(_) if !rest.is_empty() => {
                    state.record(&option, OptionValue::Value(rest.to_string()));
                    return Ok(());
                }
                _ => state.record(&option, OptionValue::Flag),
            }
        }
        Ok(())
    }

    fn magic_option(&self, state: &ParseState) -> Option<MagicOption> {
        [MagicOption::Help, MagicOption::Version]
            .into_iter()
            .find(|magic| {
                state.options.contains_key(magic.key())
                    || state.global_options.contains_key(magic.key())
            })
    }

    fn validate_options(
        &self,
        state: &ParseState,
        scope: Option<&str>,
        parsed: &OptionMap,
        magic: bool,
    ) -> Result<(), Error> {
        let options = self.config.option_configs(scope)?;

        if !magic {
            if let Some(missing) = options
                .iter()
                .find(|option| option.is_required() && !parsed.contains_key(&option.key()))
            {
                return Err(state.error(format!("Option '{}' is required.", missing.key())));
            }
        }

        for option in options.iter() {
            let allowed = match option.argument_config().and_then(|a| a.values()) {
                Some(allowed) => allowed,
                None => continue,
            };
            let key = option.key();
            if let Some(given) = parsed.get(&key) {
                let invalid = given
                    .values()
                    .iter()
                    .filter_map(OptionValue::as_str)
                    .any(|value| !allowed.iter().any(|a| a == value));
                if invalid {
                    return Err(state.error(format!("The value of option '{}' is invalid.", key)));
                }
            }
        }

        for group in self
            .config
            .mutually_exclusive_option_group_configs(scope)?
            .iter()
        {
            let mut present: Option<String> = None;
            for option in group.option_configs() {
                let key = option.key();
                if !parsed.contains_key(&key) {
                    continue;
                }
                if let Some(first) = &present {
                    return Err(state.error(format!(
                        "Option '{}' cannot be specified together with option '{}'.",
                        key, first
                    )));
                }
                present = Some(key);
            }

            if group.is_required()
                && present.is_none()
                && !magic
                && !group.option_configs().is_empty()
            {
                let names: Vec<String> = group
                    .option_configs()
                    .iter()
                    .map(|option| format!("'{}'", option.key()))
                    .collect();
                return Err(state.error(format!(
                    "One of the options {} is required.",
                    names.join(", ")
                )));
            }
        }

        Ok(())
    }

    fn validate_arguments(&self, state: &ParseState) -> Result<(), Error> {
        let configs = self.config.argument_configs(state.scope())?;
        let given = state.arguments.len();

        let overflow = given > configs.len() && !configs.last().is_some_and(|c| c.is_repeatable());
        let missing = configs
            .iter()
            .enumerate()
            .any(|(index, config)| config.is_required() && index >= given);

        if overflow || missing {
            return Err(state.error("Number of arguments error.".to_string()));
        }
        Ok(())
    }
}
