//! Parsing of raw mutually exclusive option group descriptors.

use super::{type_name, MutuallyExclusiveOptionGroupConfig, OptionConfig};
use crate::error::ConfigError;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Turns raw group descriptors into [`MutuallyExclusiveOptionGroupConfig`]s.
///
/// A descriptor is either an array of option names/short names, or an object
/// `{"options": [...], "required": bool}`. Names are resolved against the
/// scope's option index, so every group member is an already validated option.
pub struct MutuallyExclusiveOptionGroupConfigParser<'a> {
    scope: Option<&'a str>,
    options: &'a HashMap<String, Rc<OptionConfig>>,
}

impl<'a> MutuallyExclusiveOptionGroupConfigParser<'a> {
    pub fn new(scope: Option<&'a str>, options: &'a HashMap<String, Rc<OptionConfig>>) -> Self {
        Self { scope, options }
    }

    pub fn parse(
        &self,
        raw: &[Value],
    ) -> Result<Vec<MutuallyExclusiveOptionGroupConfig>, ConfigError> {
        let mut groups = Vec::with_capacity(raw.len());
        let mut grouped: HashSet<*const OptionConfig> = HashSet::new();

        for (index, descriptor) in raw.iter().enumerate() {
            let (names, required) = match descriptor {
                Value::Array(names) => (names, false),
                Value::Object(map) => {
                    let required = match map.get("required") {
                        None => false,
                        Some(Value::Bool(b)) => *b,
                        Some(other) => {
                            return Err(self.error(format!(
                                "'required' of group at index {} must be a boolean, got {}",
                                index,
                                type_name(other)
                            )))
                        }
                    };
                    let names = match map.get("options") {
                        Some(Value::Array(names)) => names,
                        Some(other) => {
                            return Err(self.error(format!(
                                "options of group at index {} must be an array, got {}",
                                index,
                                type_name(other)
                            )))
                        }
                        None => {
                            return Err(self.error(format!(
                                "group at index {} has no options",
                                index
                            )))
                        }
                    };
                    (names, required)
                }
                other => {
                    return Err(self.error(format!(
                        "group at index {} must be an array or an object, got {}",
                        index,
                        type_name(other)
                    )))
                }
            };

            let mut members: Vec<Rc<OptionConfig>> = Vec::with_capacity(names.len());
            for name in names {
                let name = name.as_str().ok_or_else(|| {
                    self.error(format!(
                        "option names of group at index {} must be strings, got {}",
                        index,
                        type_name(name)
                    ))
                })?;
                let option = self.options.get(name).ok_or_else(|| {
                    self.error(format!("option '{}' is not defined", name))
                })?;

                if members.iter().any(|member| Rc::ptr_eq(member, option)) {
                    continue;
                }
                if !grouped.insert(Rc::as_ptr(option)) {
                    return Err(self.error(format!(
                        "option '{}' belongs to more than one group",
                        name
                    )));
                }
                members.push(Rc::clone(option));
            }

            groups.push(MutuallyExclusiveOptionGroupConfig::new(members, required));
        }

        Ok(groups)
    }

    fn error(&self, message: String) -> ConfigError {
        ConfigError::option_group(self.scope, message)
    }
}
