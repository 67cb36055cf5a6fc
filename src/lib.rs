//! cliconf - declarative command-line configuration and argv parsing.
//!
//! A command's options, positional arguments, and subcommands are described
//! as JSON. [`CommandConfig`] validates and caches that description per
//! scope, and [`CommandParser`] checks an argument vector against it.

pub mod config;
pub mod error;
pub mod parser;
pub mod source;

pub use config::{
    ArgumentConfig, CommandConfig, MutuallyExclusiveOptionGroupConfig, OptionArgumentConfig,
    OptionConfig,
};
pub use error::{CommandParsingError, ConfigError, Error};
pub use parser::{CommandParser, MagicOption, OptionValue, ParsedCommand, ParsedOption};
pub use source::{
    ConfigSource, DirectoryDiscovery, JsonConfigSource, ParameterDescriptor,
    SignatureIntrospector, SignatureTable, SubcommandDiscovery,
};
