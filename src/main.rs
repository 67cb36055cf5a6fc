//! cliconf - validate command configurations and parse arguments against them.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cliconf::{CommandConfig, CommandParser, Error, JsonConfigSource};
use std::path::Path;
use tracing_subscriber::{fmt, EnvFilter};

/// Name used in messages when the config declares none.
const DEFAULT_NAME: &str = "command";

/// Declarative command-line configuration and argv parsing.
#[derive(Parser, Debug)]
#[command(name = "cliconf", version, about, disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse arguments and print the result as JSON
    Parse {
        /// JSON configuration, or a path to a JSON file
        #[arg(long)]
        config: String,

        /// Arguments to parse for the target command
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Validate a configuration and print the resolved model
    Check {
        /// JSON configuration, or a path to a JSON file
        #[arg(long)]
        config: String,
    },
}

fn load_config(config: &str) -> Result<CommandConfig> {
    let source = if config.trim_start().starts_with('{') {
        JsonConfigSource::from_json(config).context("failed to parse config JSON")?
    } else {
        JsonConfigSource::from_path(Path::new(config))
            .with_context(|| format!("failed to load config file '{}'", config))?
    };
    CommandConfig::from_json_source(source).context("invalid config")
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { config, args } => {
            let cfg = load_config(&config)?;
            let name = cfg
                .name()
                .context("invalid config")?
                .unwrap_or_else(|| DEFAULT_NAME.to_string());

            let argv: Vec<String> = std::iter::once(name.clone()).chain(args).collect();
            match CommandParser::new(&cfg).parse(&argv) {
                Ok(parsed) => {
                    println!("{}", serde_json::to_string_pretty(&parsed)?);
                }
                Err(Error::Parsing(err)) => {
                    eprintln!("{}: {}", name, err);
                    match err.subcommand() {
                        Some(subcommand) => {
                            eprintln!("see `{} {} --help`", name, subcommand)
                        }
                        None => eprintln!("see `{} --help`", name),
                    }
                    std::process::exit(1);
                }
                Err(Error::Config(err)) => {
                    return Err(anyhow::Error::new(err).context("invalid config"))
                }
            }
        }
        Commands::Check { config } => {
            let cfg = load_config(&config)?;
            let model = cfg.describe().context("invalid config")?;
            println!("{}", serde_json::to_string_pretty(&model)?);
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_parse_subcommand_parses_config_and_args() {
        let cli = Cli::try_parse_from([
            "cliconf",
            "parse",
            "--config",
            r#"{"name":"test"}"#,
            "--",
            "-v",
            "--output",
            "file.txt",
        ])
        .unwrap();

        match cli.command {
            Commands::Parse { config, args } => {
                assert_eq!(config, r#"{"name":"test"}"#);
                assert_eq!(args, vec!["-v", "--output", "file.txt"]);
            }
            _ => panic!("Expected Parse command"),
        }
    }

    #[test]
    fn test_parse_subcommand_requires_config() {
        let result = Cli::try_parse_from(["cliconf", "parse", "--"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_check_subcommand() {
        let cli = Cli::try_parse_from(["cliconf", "check", "--config", "cli.json"]).unwrap();
        match cli.command {
            Commands::Check { config } => assert_eq!(config, "cli.json"),
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["cliconf"]).is_err());
    }

    #[test]
    fn test_cli_help() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_load_inline_config() {
        let cfg = load_config(r#"{"name": "tool", "arguments": []}"#).unwrap();
        assert_eq!(cfg.name().unwrap(), Some("tool".to_string()));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load_config("/nonexistent/cliconf.json").is_err());
    }
}
