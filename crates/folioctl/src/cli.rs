use std::path::Path;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use folio_llm::ModelConfig;

use crate::commands;

/// Folio CLI - list, inspect, render and run prompt flows
#[derive(Parser, Debug)]
#[command(name = "folioctl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Model client configuration file (YAML)
    ///
    /// An `apiKey` entry in this file is ignored; set GEMINI_API_KEY,
    /// GOOGLE_API_KEY or GOOGLE_GENAI_API_KEY instead.
    #[arg(long, short = 'c', global = true, env = "FOLIOCTL_CONFIG")]
    pub config: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List resources (verb-first: get flows)
    Get {
        /// Resource type (flows)
        resource_type: String,

        /// Flow name (optional - lists all if omitted)
        name: Option<String>,

        /// Output format (json, yaml, wide, name)
        #[arg(short, long, default_value = "wide")]
        output: String,
    },

    /// Describe a flow in detail (verb-first: describe flow <name>)
    Describe {
        /// Resource type (flow)
        resource_type: String,

        /// Flow name
        name: String,

        /// Output format (json, yaml, text)
        #[arg(short, long, default_value = "text")]
        output: String,
    },

    /// Render a flow's prompt for an input without calling the model
    Render {
        /// Flow name
        name: String,

        #[command(flatten)]
        input: InputArgs,
    },

    /// Run a flow against the hosted model
    Run {
        /// Flow name
        name: String,

        #[command(flatten)]
        input: InputArgs,

        /// Output format (json, yaml, text)
        #[arg(short, long, default_value = "text")]
        output: String,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Flow input, inline or from a file
#[derive(clap::Args, Debug)]
#[group(required = true, multiple = false)]
pub struct InputArgs {
    /// Input record as inline JSON
    #[arg(short, long)]
    pub input: Option<String>,

    /// Path to a JSON or YAML file holding the input record
    #[arg(short = 'f', long)]
    pub input_file: Option<String>,
}

impl Cli {
    pub async fn execute(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Get {
                resource_type,
                name,
                output,
            } => commands::get::execute(&resource_type, name.as_deref(), &output),
            Commands::Describe {
                resource_type,
                name,
                output,
            } => commands::describe::execute(&resource_type, &name, &output),
            Commands::Render { name, input } => {
                let input = commands::load_input(input.input.as_deref(), input.input_file.as_deref())?;
                commands::render::execute(&name, &input)
            }
            Commands::Run {
                name,
                input,
                output,
            } => {
                let input = commands::load_input(input.input.as_deref(), input.input_file.as_deref())?;
                let config = load_config(self.config.as_deref())?;
                commands::run::execute(&name, &input, &output, config).await
            }
            Commands::Completion { shell } => commands::completion::execute(shell),
        }
    }
}

/// Load the model client configuration, falling back to defaults
fn load_config(path: Option<&str>) -> anyhow::Result<ModelConfig> {
    let config = match path {
        Some(path) => {
            let file_path = Path::new(path);
            let content = std::fs::read_to_string(file_path)
                .with_context(|| format!("Failed to read config file {:?}", file_path))?;
            let config: ModelConfig = serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file {:?}", file_path))?;
            tracing::info!("Loaded model config from {:?}", file_path);
            config
        }
        None => ModelConfig::default(),
    };
    Ok(config.with_env_api_key())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_requires_one_input_source() {
        assert!(Cli::try_parse_from(["folioctl", "run", "explainCode"]).is_err());
        assert!(Cli::try_parse_from([
            "folioctl",
            "run",
            "explainCode",
            "--input",
            "{}",
            "--input-file",
            "in.json"
        ])
        .is_err());
    }

    #[test]
    fn test_verbose_counts() {
        let cli = Cli::try_parse_from(["folioctl", "-vv", "get", "flows"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_load_config_from_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.yaml");
        std::fs::write(&path, "timeoutSecs: 5\ntemperature: 0.2\n").unwrap();

        let config = load_config(path.to_str()).unwrap();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.temperature, Some(0.2));
    }

    #[test]
    fn test_load_config_ignores_api_key_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.yaml");
        std::fs::write(&path, "apiKey: from-file\ntimeoutSecs: 5\n").unwrap();

        let config = load_config(path.to_str()).unwrap();
        assert_ne!(config.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Some("/nonexistent/folio.yaml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
