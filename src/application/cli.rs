#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgGroup;
use clap::ArgMatches;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::runners;
use crate::configuration::expand_home;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BackendName;
use crate::domain::services::BATCH_MODELS;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

async fn create_config_file(config_file_path: &path::Path) -> Result<()> {
    let config_file_path_str = config_file_path.to_string_lossy().to_string();
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(config_file_path).await?;
    file.write_all(Config::serialize_default(&build()).as_bytes())
        .await?;
    file.flush().await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

fn required_arg(matches: &ArgMatches, id: &str) -> Result<String> {
    if let Some(val) = matches.get_one::<String>(id) {
        return Ok(val.to_string());
    }

    bail!(format!("Missing required argument --{id}"));
}

/// Splits a comma separated `--input` value into paths.
pub fn split_inputs(value: &str) -> Vec<path::PathBuf> {
    return value
        .split(',')
        .map(|e| return e.trim())
        .filter(|e| return !e.is_empty())
        .map(path::PathBuf::from)
        .collect();
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the path for the configuration file.")
        );
}

fn arg_backend() -> Arg {
    return Arg::new(ConfigKey::Backend.to_string())
        .short('b')
        .long(ConfigKey::Backend.to_string())
        .env("CODESMITH_BACKEND")
        .num_args(1)
        .help(format!(
            "The backend hosting the model to talk to. [default: {}]",
            Config::default_value(ConfigKey::Backend)
        ))
        .value_parser(PossibleValuesParser::new(BackendName::VARIANTS));
}

fn arg_text_prompt() -> Arg {
    return Arg::new("text-prompt")
        .long("text-prompt")
        .num_args(1)
        .help("Direct text prompt for code generation.");
}

fn arg_output() -> Arg {
    return Arg::new("output")
        .short('o')
        .long("output")
        .num_args(1)
        .required(true)
        .help("Output directory for generated code. Created when missing.");
}

fn subcommand_ask() -> Command {
    return Command::new("ask")
        .about("Chat about a codebase. Source files are loaded as context before the first question.")
        .arg(
            Arg::new("files")
                .short('f')
                .long("files")
                .num_args(1..)
                .action(ArgAction::Append)
                .help("Files or directories containing the code to analyze. Defaults to the current directory."),
        )
        .arg(
            Arg::new(ConfigKey::ContextWindow.to_string())
                .long(ConfigKey::ContextWindow.to_string())
                .env("CODESMITH_CONTEXT_WINDOW")
                .num_args(1)
                .help(format!(
                    "Number of previous question and answer pairs replayed with each question. [default: {}]",
                    Config::default_value(ConfigKey::ContextWindow)
                )),
        )
        .arg(arg_backend());
}

fn subcommand_codegen() -> Command {
    return Command::new("codegen")
        .about("Plans a set of files for a request, then generates them one at a time.")
        .arg(arg_text_prompt().required(true))
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .num_args(1)
                .required(true)
                .help("Input files or directories (comma-separated) to use as reference."),
        )
        .arg(arg_output())
        .arg(arg_backend());
}

fn subcommand_generate() -> Command {
    return Command::new("generate")
        .about(format!(
            "Generates code snippets with a single OpenAI request. Supported models: {}.",
            BATCH_MODELS.join(", ")
        ))
        .arg(arg_text_prompt())
        .arg(
            Arg::new("prompt-file")
                .long("prompt-file")
                .num_args(1)
                .help("Path to a file containing the prompt."),
        )
        .group(
            ArgGroup::new("prompt")
                .args(["text-prompt", "prompt-file"])
                .required(true),
        )
        .arg(arg_output());
}

pub fn build() -> Command {
    let about = format!(
        "{}\n\nVersion: {}\nCommit: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    );

    return Command::new("codesmith")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .arg_required_else_help(true)
        .subcommand(subcommand_ask())
        .subcommand(subcommand_codegen())
        .subcommand(subcommand_generate())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("CODESMITH_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default_value(ConfigKey::ConfigFile)))
                .global(true)
        )
        .arg(
            Arg::new(ConfigKey::Model.to_string())
                .short('m')
                .long(ConfigKey::Model.to_string())
                .env("CODESMITH_MODEL")
                .num_args(1)
                .help("The model to consume. Defaults to the backend's own default model when not set.")
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::MaxFiles.to_string())
                .long(ConfigKey::MaxFiles.to_string())
                .env("CODESMITH_MAX_FILES")
                .num_args(1)
                .help(format!("Maximum number of files loaded as context, covering both ask sources and codegen reference inputs. [default: {}]", Config::default_value(ConfigKey::MaxFiles)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::ClaudeURL.to_string())
                .long(ConfigKey::ClaudeURL.to_string())
                .env("CODESMITH_CLAUDE_URL")
                .num_args(1)
                .help(format!("Anthropic API URL when using the Claude backend. [default: {}]", Config::default_value(ConfigKey::ClaudeURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::ClaudeKeyFile.to_string())
                .long(ConfigKey::ClaudeKeyFile.to_string())
                .env("CODESMITH_CLAUDE_KEY_FILE")
                .num_args(1)
                .help(format!("File holding the Anthropic API key. [default: {}]", Config::default_value(ConfigKey::ClaudeKeyFile)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::OpenAiURL.to_string())
                .long(ConfigKey::OpenAiURL.to_string())
                .env("CODESMITH_OPENAI_URL")
                .num_args(1)
                .help(format!("OpenAI API URL. Can be swapped to a compatible proxy. [default: {}]", Config::default_value(ConfigKey::OpenAiURL)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::OpenAiKeyFile.to_string())
                .long(ConfigKey::OpenAiKeyFile.to_string())
                .env("CODESMITH_OPENAI_KEY_FILE")
                .num_args(1)
                .help(format!("File holding the OpenAI API key. [default: {}]", Config::default_value(ConfigKey::OpenAiKeyFile)))
                .global(true),
        );
}

pub async fn parse() -> Result<()> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("ask", subcmd_matches)) => {
            let config = Config::load(&build(), vec![&matches, subcmd_matches]).await?;
            let files = subcmd_matches
                .get_many::<String>("files")
                .map(|vals| return vals.map(path::PathBuf::from).collect::<Vec<_>>())
                .unwrap_or_default();

            runners::ask(&config, &files).await?;
        }
        Some(("codegen", subcmd_matches)) => {
            let config = Config::load(&build(), vec![&matches, subcmd_matches]).await?;
            let prompt = required_arg(subcmd_matches, "text-prompt")?;
            let inputs = split_inputs(&required_arg(subcmd_matches, "input")?);
            let output = path::PathBuf::from(required_arg(subcmd_matches, "output")?);

            runners::codegen(&config, &prompt, &inputs, &output).await?;
        }
        Some(("generate", subcmd_matches)) => {
            let config = Config::load(&build(), vec![&matches, subcmd_matches]).await?;
            let prompt = match subcmd_matches.get_one::<String>("prompt-file") {
                Some(prompt_file) => runners::read_prompt_file(path::Path::new(prompt_file)).await?,
                None => required_arg(subcmd_matches, "text-prompt")?,
            };
            let output = path::PathBuf::from(required_arg(subcmd_matches, "output")?);

            runners::generate(&config, &prompt, &output).await?;
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
        }
        Some(("config", subcmd_matches)) => {
            let config_file = subcmd_matches
                .get_one::<String>(&ConfigKey::ConfigFile.to_string())
                .cloned()
                .unwrap_or_else(|| return Config::default_value(ConfigKey::ConfigFile));

            match subcmd_matches.subcommand() {
                Some(("create", _)) => {
                    create_config_file(&expand_home(&config_file)).await?;
                }
                Some(("default", _)) => {
                    println!("{}", Config::serialize_default(&build()));
                }
                Some(("path", _)) => {
                    println!("{}", expand_home(&config_file).to_string_lossy());
                }
                _ => {
                    subcommand_config().print_long_help()?;
                }
            }
        }
        _ => {
            build().print_long_help()?;
        }
    }

    return Ok(());
}
