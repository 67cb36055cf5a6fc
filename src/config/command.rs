//! Per-command configuration aggregate.

use super::argument::ArgumentConfigParser;
use super::group::MutuallyExclusiveOptionGroupConfigParser;
use super::naming::{argument_name, pascal_case};
use super::option::OptionConfigParser;
use super::{
    type_name, ArgumentConfig, MutuallyExclusiveOptionGroupConfig, OptionConfig, NAME_PATTERN,
};
use crate::error::ConfigError;
use crate::source::{
    ConfigSource, DirectoryDiscovery, JsonConfigSource, SignatureIntrospector,
    SubcommandDiscovery, ACTION_METHOD,
};
use serde_json::{json, Map, Value};
use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Options of one scope, in declaration order and indexed by name and short name.
#[derive(Debug)]
struct OptionIndex {
    configs: Rc<[Rc<OptionConfig>]>,
    by_name: HashMap<String, Rc<OptionConfig>>,
}

#[derive(Debug, Default)]
struct ScopeCache {
    raw: OnceCell<Rc<Map<String, Value>>>,
    class: OnceCell<Rc<str>>,
    arguments: OnceCell<Rc<[ArgumentConfig]>>,
    options: OnceCell<Rc<OptionIndex>>,
    groups: OnceCell<Rc<[MutuallyExclusiveOptionGroupConfig]>>,
}

fn memoize<T: Clone>(
    cell: &OnceCell<T>,
    init: impl FnOnce() -> Result<T, ConfigError>,
) -> Result<T, ConfigError> {
    if let Some(value) = cell.get() {
        return Ok(value.clone());
    }
    let value = init()?;
    Ok(cell.get_or_init(|| value).clone())
}

/// Resolves, validates, and caches the configuration of a command and its
/// subcommands.
///
/// A scope is `None` for the top-level command or `Some(name)` for a
/// subcommand. Everything is computed on first access and kept for the life
/// of the instance.
pub struct CommandConfig {
    source: Box<dyn ConfigSource>,
    discovery: Box<dyn SubcommandDiscovery>,
    introspector: Box<dyn SignatureIntrospector>,
    scopes: RefCell<HashMap<Option<String>, Rc<ScopeCache>>>,
    subcommand_names: OnceCell<Rc<[String]>>,
}

impl CommandConfig {
    pub fn new(
        source: Box<dyn ConfigSource>,
        discovery: Box<dyn SubcommandDiscovery>,
        introspector: Box<dyn SignatureIntrospector>,
    ) -> Self {
        Self {
            source,
            discovery,
            introspector,
            scopes: RefCell::new(HashMap::new()),
            subcommand_names: OnceCell::new(),
        }
    }

    /// Wire a JSON source to directory discovery and its `entry_points` table.
    pub fn from_json_source(source: JsonConfigSource) -> Result<Self, ConfigError> {
        let table = source.signature_table()?;
        Ok(Self::new(
            Box::new(source),
            Box::new(DirectoryDiscovery),
            Box::new(table),
        ))
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Self::from_json_source(JsonConfigSource::from_json(json)?)
    }

    fn scope(&self, scope: Option<&str>) -> Rc<ScopeCache> {
        let mut scopes = self.scopes.borrow_mut();
        Rc::clone(scopes.entry(scope.map(str::to_string)).or_default())
    }

    fn raw(&self, scope: Option<&str>) -> Result<Rc<Map<String, Value>>, ConfigError> {
        let cache = self.scope(scope);
        memoize(&cache.raw, || {
            if let Some(name) = scope {
                if !self.has_subcommand(name)? {
                    return Err(ConfigError::command(
                        scope,
                        format!("subcommand '{}' does not exist", name),
                    ));
                }
            }
            let raw = self.source.get(scope)?;
            tracing::debug!(scope = ?scope, keys = raw.len(), "loaded raw config");
            Ok(Rc::new(raw))
        })
    }

    fn read_string(&self, scope: Option<&str>, key: &str) -> Result<Option<String>, ConfigError> {
        match self.raw(scope)?.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.clone())),
            Some(other) => Err(ConfigError::command(
                scope,
                format!("'{}' must be a string, got {}", key, type_name(other)),
            )),
        }
    }

    pub fn is_multiple_command_mode(&self) -> bool {
        self.source.is_multiple_command_mode()
    }

    pub fn name(&self) -> Result<Option<String>, ConfigError> {
        self.read_string(None, "name")
    }

    pub fn version(&self) -> Result<Option<String>, ConfigError> {
        self.read_string(None, "version")
    }

    pub fn description(&self, scope: Option<&str>) -> Result<Option<String>, ConfigError> {
        self.read_string(scope, "description")
    }

    /// Identifier of the entry point that runs `scope`.
    pub fn class(&self, scope: Option<&str>) -> Result<Rc<str>, ConfigError> {
        let cache = self.scope(scope);
        memoize(&cache.class, || {
            let class = match self.read_string(scope, "class")? {
                Some(class) => class,
                None => {
                    let namespace = self.source.root_namespace();
                    match scope {
                        None => format!("{}::Command", namespace),
                        Some(name) => {
                            format!("{}::Subcommands::{}Command", namespace, pascal_case(name))
                        }
                    }
                }
            };
            Ok(Rc::from(class))
        })
    }

    /// Positional arguments of `scope`.
    ///
    /// Without an `arguments` declaration they are derived from the entry
    /// point's action method. The top-level command in multiple command mode
    /// never takes positional arguments.
    pub fn argument_configs(
        &self,
        scope: Option<&str>,
    ) -> Result<Rc<[ArgumentConfig]>, ConfigError> {
        if scope.is_none() && self.is_multiple_command_mode() {
            return Ok(Rc::from(Vec::new()));
        }

        let cache = self.scope(scope);
        memoize(&cache.arguments, || {
            let raw = self.raw(scope)?;
            let configs = match raw.get("arguments") {
                None => self.default_argument_configs(scope)?,
                Some(Value::Array(items)) => ArgumentConfigParser::new(scope).parse(items)?,
                Some(other) => {
                    return Err(ConfigError::argument(
                        scope,
                        format!("'arguments' must be an array, got {}", type_name(other)),
                    ))
                }
            };
            Ok(Rc::from(configs))
        })
    }

    fn default_argument_configs(
        &self,
        scope: Option<&str>,
    ) -> Result<Vec<ArgumentConfig>, ConfigError> {
        let class = self.class(scope)?;
        let parameters = self.introspector.parameters(&class)?;

        let mut descriptors = Vec::with_capacity(parameters.len());
        for (index, parameter) in parameters.iter().enumerate() {
            if parameter.is_variadic && index + 1 != parameters.len() {
                return Err(ConfigError::command(
                    scope,
                    format!(
                        "variadic parameter '{}' of {}::{} must be the last parameter",
                        parameter.identifier, class, ACTION_METHOD
                    ),
                ));
            }
            let required = !parameter.is_variadic && !parameter.has_default;
            descriptors.push(json!({
                "name": argument_name(&parameter.identifier, parameter.is_variadic),
                "required": required,
                "repeatable": parameter.is_variadic,
            }));
        }

        tracing::debug!(
            scope = ?scope,
            class = %class,
            count = descriptors.len(),
            "derived arguments from entry point signature"
        );
        ArgumentConfigParser::new(scope).parse(&descriptors)
    }

    fn option_index(&self, scope: Option<&str>) -> Result<Rc<OptionIndex>, ConfigError> {
        let cache = self.scope(scope);
        memoize(&cache.options, || {
            let raw = self.raw(scope)?;
            let configs = match raw.get("options") {
                None => {
                    let defaults = self.default_option_descriptors(scope)?;
                    OptionConfigParser::new(scope).parse(&defaults)?
                }
                Some(Value::Array(items)) => OptionConfigParser::new(scope).parse(items)?,
                Some(other) => {
                    return Err(ConfigError::option(
                        scope,
                        format!("'options' must be an array, got {}", type_name(other)),
                    ))
                }
            };

            let configs: Vec<Rc<OptionConfig>> = configs.into_iter().map(Rc::new).collect();
            let mut by_name = HashMap::new();
            for option in &configs {
                if let Some(name) = option.name() {
                    by_name.insert(name.to_string(), Rc::clone(option));
                }
                if let Some(short) = option.short_name() {
                    by_name.insert(short.to_string(), Rc::clone(option));
                }
            }

            Ok(Rc::new(OptionIndex {
                configs: Rc::from(configs),
                by_name,
            }))
        })
    }

    fn default_option_descriptors(&self, scope: Option<&str>) -> Result<Vec<Value>, ConfigError> {
        let mut defaults = vec![json!({
            "name": "help",
            "short_name": "h",
            "description": "Display this help message",
        })];
        if scope.is_none() && self.version()?.is_some() {
            defaults.push(json!({
                "name": "version",
                "short_name": "V",
                "description": "Display the version",
            }));
        }
        tracing::debug!(scope = ?scope, count = defaults.len(), "using default options");
        Ok(defaults)
    }

    /// Options of `scope` in declaration order.
    pub fn option_configs(
        &self,
        scope: Option<&str>,
    ) -> Result<Rc<[Rc<OptionConfig>]>, ConfigError> {
        Ok(Rc::clone(&self.option_index(scope)?.configs))
    }

    /// Look an option up by its name or short name.
    pub fn option_config(
        &self,
        name_or_short_name: &str,
        scope: Option<&str>,
    ) -> Result<Option<Rc<OptionConfig>>, ConfigError> {
        Ok(self
            .option_index(scope)?
            .by_name
            .get(name_or_short_name)
            .cloned())
    }

    pub fn mutually_exclusive_option_group_configs(
        &self,
        scope: Option<&str>,
    ) -> Result<Rc<[MutuallyExclusiveOptionGroupConfig]>, ConfigError> {
        let cache = self.scope(scope);
        memoize(&cache.groups, || {
            let raw = self.raw(scope)?;
            let groups = match raw.get("mutually_exclusive_option_groups") {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Array(items)) => {
                    let index = self.option_index(scope)?;
                    MutuallyExclusiveOptionGroupConfigParser::new(scope, &index.by_name)
                        .parse(items)?
                }
                Some(other) => {
                    return Err(ConfigError::option_group(
                        scope,
                        format!(
                            "'mutually_exclusive_option_groups' must be an array, got {}",
                            type_name(other)
                        ),
                    ))
                }
            };
            Ok(Rc::from(groups))
        })
    }

    /// Names of all subcommands, only meaningful in multiple command mode.
    ///
    /// Taken from an explicit `subcommands` declaration when present,
    /// otherwise discovered in the configured subcommand directory.
    pub fn subcommand_names(&self) -> Result<Rc<[String]>, ConfigError> {
        if !self.is_multiple_command_mode() {
            return Err(ConfigError::NotMultipleCommandMode);
        }

        memoize(&self.subcommand_names, || {
            let raw = self.raw(None)?;
            let names = match raw.get("subcommands") {
                Some(Value::Array(items)) => {
                    let mut names = Vec::with_capacity(items.len());
                    for item in items {
                        match item {
                            Value::String(name) => names.push(self.checked_subcommand(name)?),
                            other => {
                                return Err(ConfigError::command(
                                    None,
                                    format!(
                                        "subcommand names must be strings, got {}",
                                        type_name(other)
                                    ),
                                ))
                            }
                        }
                    }
                    names
                }
                Some(Value::Object(map)) => map
                    .keys()
                    .map(|name| self.checked_subcommand(name))
                    .collect::<Result<Vec<_>, _>>()?,
                Some(other) => {
                    return Err(ConfigError::command(
                        None,
                        format!(
                            "'subcommands' must be an array or an object, got {}",
                            type_name(other)
                        ),
                    ))
                }
                None => match self.source.subcommand_dir() {
                    Some(dir) => self
                        .discovery
                        .discover(dir)?
                        .into_iter()
                        .filter(|name| NAME_PATTERN.is_match(name))
                        .collect(),
                    None => Vec::new(),
                },
            };
            tracing::debug!(count = names.len(), "resolved subcommand names");
            Ok(Rc::from(names))
        })
    }

    fn checked_subcommand(&self, name: &str) -> Result<String, ConfigError> {
        if NAME_PATTERN.is_match(name) {
            Ok(name.to_string())
        } else {
            Err(ConfigError::command(
                None,
                format!("subcommand name '{}' is invalid", name),
            ))
        }
    }

    pub fn has_subcommand(&self, name: &str) -> Result<bool, ConfigError> {
        Ok(self.subcommand_names()?.iter().any(|n| n == name))
    }

    /// Resolve every scope eagerly and return the resulting model.
    pub fn describe(&self) -> Result<Value, ConfigError> {
        let mut model = Map::new();
        model.insert("name".to_string(), json!(self.name()?));
        model.insert("version".to_string(), json!(self.version()?));
        model.insert(
            "multiple_command_mode".to_string(),
            json!(self.is_multiple_command_mode()),
        );
        model.insert("command".to_string(), self.describe_scope(None)?);

        if self.is_multiple_command_mode() {
            let mut subcommands = Map::new();
            for name in self.subcommand_names()?.iter() {
                subcommands.insert(name.clone(), self.describe_scope(Some(name))?);
            }
            model.insert("subcommands".to_string(), Value::Object(subcommands));
        }

        Ok(Value::Object(model))
    }

    fn describe_scope(&self, scope: Option<&str>) -> Result<Value, ConfigError> {
        let option_configs = self.option_configs(scope)?;
        let options: Vec<&OptionConfig> =
            option_configs.iter().map(|option| option.as_ref()).collect();

        Ok(json!({
            "class": self.class(scope)?.as_ref(),
            "description": self.description(scope)?,
            "arguments": serde_json::to_value(&*self.argument_configs(scope)?)?,
            "options": serde_json::to_value(&options)?,
            "mutually_exclusive_option_groups":
                serde_json::to_value(&*self.mutually_exclusive_option_group_configs(scope)?)?,
        }))
    }
}
