//! Collaborators that supply raw configuration, subcommand names, and
//! entry-point signatures, plus their JSON and file-system implementations.

use crate::config::type_name;
use crate::error::ConfigError;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Method whose parameters define a command's default arguments.
pub const ACTION_METHOD: &str = "execute";

/// Namespace used for default class identifiers when none is configured.
pub const DEFAULT_NAMESPACE: &str = "App";

/// Supplies raw per-scope configuration mappings.
pub trait ConfigSource {
    /// The raw mapping of the top-level command (`None`) or of a subcommand.
    fn get(&self, scope: Option<&str>) -> Result<Map<String, Value>, ConfigError>;

    fn is_multiple_command_mode(&self) -> bool;

    /// Namespace prefix of default class identifiers.
    fn root_namespace(&self) -> &str;

    /// Directory scanned for subcommands when none are declared explicitly.
    fn subcommand_dir(&self) -> Option<&Path>;
}

/// Lists candidate subcommand identifiers under a directory.
pub trait SubcommandDiscovery {
    fn discover(&self, root: &Path) -> Result<Vec<String>, ConfigError>;
}

/// One parameter of an entry point's action method.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ParameterDescriptor {
    pub identifier: String,
    #[serde(default)]
    pub has_default: bool,
    #[serde(default)]
    pub is_variadic: bool,
}

impl ParameterDescriptor {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            has_default: false,
            is_variadic: false,
        }
    }

    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    pub fn variadic(mut self) -> Self {
        self.is_variadic = true;
        self
    }
}

/// Describes the action method of a resolved entry point.
pub trait SignatureIntrospector {
    /// Ordered parameters of `class`'s [`ACTION_METHOD`].
    fn parameters(&self, class: &str) -> Result<Vec<ParameterDescriptor>, ConfigError>;
}

/// Configuration held in a JSON document.
///
/// The document is the top-level command's mapping. Besides the command keys
/// it may carry engine settings: `multiple_command_mode`, `namespace`,
/// `subcommand_dir`, and `entry_points`.
#[derive(Debug, Clone)]
pub struct JsonConfigSource {
    document: Map<String, Value>,
    multiple_command_mode: bool,
    namespace: String,
    subcommand_dir: Option<PathBuf>,
}

impl JsonConfigSource {
    /// Parse a JSON string into a source.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value, None)
    }

    /// Read a JSON file. A relative `subcommand_dir` is resolved against the
    /// file's directory.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value = serde_json::from_str(&content)?;
        Self::from_value(value, path.parent())
    }

    pub fn from_value(value: Value, base_dir: Option<&Path>) -> Result<Self, ConfigError> {
        let document = match value {
            Value::Object(map) => map,
            other => {
                return Err(ConfigError::command(
                    None,
                    format!("config must be an object, got {}", type_name(&other)),
                ))
            }
        };

        let multiple_command_mode = match document.get("multiple_command_mode") {
            None => false,
            Some(Value::Bool(b)) => *b,
            Some(other) => {
                return Err(ConfigError::command(
                    None,
                    format!(
                        "'multiple_command_mode' must be a boolean, got {}",
                        type_name(other)
                    ),
                ))
            }
        };

        let namespace = match document.get("namespace") {
            None => DEFAULT_NAMESPACE.to_string(),
            Some(Value::String(namespace)) => namespace.clone(),
            Some(other) => {
                return Err(ConfigError::command(
                    None,
                    format!("'namespace' must be a string, got {}", type_name(other)),
                ))
            }
        };

        let subcommand_dir = match document.get("subcommand_dir") {
            None => None,
            Some(Value::String(dir)) => {
                let dir = PathBuf::from(dir);
                match base_dir {
                    Some(base) if dir.is_relative() => Some(base.join(dir)),
                    _ => Some(dir),
                }
            }
            Some(other) => {
                return Err(ConfigError::command(
                    None,
                    format!("'subcommand_dir' must be a string, got {}", type_name(other)),
                ))
            }
        };

        Ok(Self {
            document,
            multiple_command_mode,
            namespace,
            subcommand_dir,
        })
    }

    /// Signature table declared under `entry_points`.
    pub fn signature_table(&self) -> Result<SignatureTable, ConfigError> {
        match self.document.get("entry_points") {
            None => Ok(SignatureTable::new()),
            Some(value) => SignatureTable::from_value(value.clone()),
        }
    }
}

impl ConfigSource for JsonConfigSource {
    fn get(&self, scope: Option<&str>) -> Result<Map<String, Value>, ConfigError> {
        let name = match scope {
            None => return Ok(self.document.clone()),
            Some(name) => name,
        };

        if let Some(Value::Object(subcommands)) = self.document.get("subcommands") {
            match subcommands.get(name) {
                Some(Value::Object(inline)) => return Ok(inline.clone()),
                None | Some(Value::Null) | Some(Value::Bool(true)) => {}
                Some(other) => {
                    return Err(ConfigError::command(
                        scope,
                        format!("inline config must be an object, got {}", type_name(other)),
                    ))
                }
            }
        }

        if let Some(dir) = &self.subcommand_dir {
            let path = dir.join(format!("{}.json", name));
            if path.is_file() {
                let content =
                    std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                        path: path.clone(),
                        source,
                    })?;
                return match serde_json::from_str(&content)? {
                    Value::Object(map) => Ok(map),
                    other => Err(ConfigError::command(
                        scope,
                        format!(
                            "config in '{}' must be an object, got {}",
                            path.display(),
                            type_name(&other)
                        ),
                    )),
                };
            }
        }

        Ok(Map::new())
    }

    fn is_multiple_command_mode(&self) -> bool {
        self.multiple_command_mode
    }

    fn root_namespace(&self) -> &str {
        &self.namespace
    }

    fn subcommand_dir(&self) -> Option<&Path> {
        self.subcommand_dir.as_deref()
    }
}

/// Discovers subcommands from the file names in a directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryDiscovery;

impl SubcommandDiscovery for DirectoryDiscovery {
    fn discover(&self, root: &Path) -> Result<Vec<String>, ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: root.to_path_buf(),
            source,
        };

        let mut names = Vec::new();
        for entry in std::fs::read_dir(root).map_err(io_error)? {
            let entry = entry.map_err(io_error)?;
            let path = entry.path();
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        names.dedup();
        Ok(names)
    }
}

/// Entry-point signatures declared up front, keyed by class then method.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct SignatureTable {
    classes: HashMap<String, HashMap<String, Vec<ParameterDescriptor>>>,
}

impl SignatureTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Declare the parameters of `class::method`.
    pub fn with_method(
        mut self,
        class: impl Into<String>,
        method: impl Into<String>,
        parameters: Vec<ParameterDescriptor>,
    ) -> Self {
        self.classes
            .entry(class.into())
            .or_default()
            .insert(method.into(), parameters);
        self
    }
}

impl SignatureIntrospector for SignatureTable {
    fn parameters(&self, class: &str) -> Result<Vec<ParameterDescriptor>, ConfigError> {
        let methods = self
            .classes
            .get(class)
            .ok_or_else(|| ConfigError::ClassNotFound(class.to_string()))?;
        methods
            .get(ACTION_METHOD)
            .cloned()
            .ok_or_else(|| ConfigError::MethodNotFound {
                class: class.to_string(),
                method: ACTION_METHOD.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_settings_defaults() {
        let source = JsonConfigSource::from_json(r#"{"name": "tool"}"#).unwrap();
        assert!(!source.is_multiple_command_mode());
        assert_eq!(source.root_namespace(), DEFAULT_NAMESPACE);
        assert!(source.subcommand_dir().is_none());
        assert_eq!(source.get(None).unwrap()["name"], "tool");
    }

    #[test]
    fn test_settings_type_errors() {
        assert!(JsonConfigSource::from_json(r#"[]"#).is_err());
        assert!(JsonConfigSource::from_json(r#"{"multiple_command_mode": "yes"}"#).is_err());
        assert!(JsonConfigSource::from_json(r#"{"namespace": 1}"#).is_err());
        assert!(JsonConfigSource::from_json(r#"{"subcommand_dir": false}"#).is_err());
        assert!(matches!(
            JsonConfigSource::from_json("{"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_inline_subcommand_config() {
        let source = JsonConfigSource::from_json(
            r#"{"subcommands": {"build": {"description": "Build it"}, "clean": null}}"#,
        )
        .unwrap();
        assert_eq!(source.get(Some("build")).unwrap()["description"], "Build it");
        assert!(source.get(Some("clean")).unwrap().is_empty());
    }

    #[test]
    fn test_subcommand_config_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("deploy.json"),
            r#"{"description": "Deploy"}"#,
        )
        .unwrap();
        let config_path = dir.path().join("cli.json");
        fs::write(&config_path, r#"{"subcommand_dir": "."}"#).unwrap();

        let source = JsonConfigSource::from_path(&config_path).unwrap();
        assert_eq!(source.subcommand_dir(), Some(dir.path().join(".").as_path()));
        assert_eq!(source.get(Some("deploy")).unwrap()["description"], "Deploy");
        assert!(source.get(Some("missing")).unwrap().is_empty());
    }

    #[test]
    fn test_directory_discovery_lists_stems() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.json"), "{}").unwrap();
        fs::write(dir.path().join("a.json"), "{}").unwrap();
        fs::create_dir(dir.path().join("c")).unwrap();

        let names = DirectoryDiscovery.discover(dir.path()).unwrap();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_directory_discovery_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let result = DirectoryDiscovery.discover(&dir.path().join("nope"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_signature_table_lookup() {
        let table = SignatureTable::from_value(serde_json::json!({
            "App::Command": {
                "execute": [
                    {"identifier": "source"},
                    {"identifier": "files", "is_variadic": true}
                ]
            },
            "App::Other": {"run": []}
        }))
        .unwrap();

        let params = table.parameters("App::Command").unwrap();
        assert_eq!(params.len(), 2);
        assert!(!params[0].has_default);
        assert!(params[1].is_variadic);

        assert!(matches!(
            table.parameters("App::Missing"),
            Err(ConfigError::ClassNotFound(class)) if class == "App::Missing"
        ));
        assert!(matches!(
            table.parameters("App::Other"),
            Err(ConfigError::MethodNotFound { method, .. }) if method == ACTION_METHOD
        ));
    }
}
