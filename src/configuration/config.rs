#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::collections::HashMap;
use std::path;

use anyhow::anyhow;
use anyhow::bail;
use anyhow::Result;
use clap::Arg;
use clap::ArgMatches;
use clap::Command;
use strum::EnumIter;
use strum::IntoEnumIterator;
use tokio::fs;

use crate::domain::models::BackendName;
use crate::domain::services::DEFAULT_CONTEXT_WINDOW;
use crate::domain::services::DEFAULT_MAX_FILES;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, EnumIter, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    Backend,
    ClaudeKeyFile,
    #[strum(serialize = "claude-url")]
    ClaudeURL,
    ConfigFile,
    ContextWindow,
    MaxFiles,
    Model,
    #[strum(serialize = "openai-key-file")]
    OpenAiKeyFile,
    #[strum(serialize = "openai-url")]
    OpenAiURL,
}

fn home_dir() -> path::PathBuf {
    return dirs::home_dir().unwrap_or_default();
}

/// Expands a leading `~/` to the home directory.
pub fn expand_home(value: &str) -> path::PathBuf {
    if let Some(rest) = value.strip_prefix("~/") {
        return home_dir().join(rest);
    }

    return path::PathBuf::from(value);
}

/// Looks up the argument backing a config key, on the command itself or any
/// of its subcommands.
fn find_arg(cmd: &Command, key: ConfigKey) -> Option<&Arg> {
    let long = key.to_string();
    if let Some(arg) = cmd
        .get_arguments()
        .find(|arg| return arg.get_long() == Some(long.as_str()))
    {
        return Some(arg);
    }

    for subcmd in cmd.get_subcommands() {
        if let Some(arg) = find_arg(subcmd, key) {
            return Some(arg);
        }
    }

    return None;
}

fn possible_values(cmd: &Command, key: ConfigKey) -> Vec<String> {
    let arg = match find_arg(cmd, key) {
        Some(arg) => arg,
        None => return vec![],
    };

    return arg
        .get_possible_values()
        .iter()
        .map(|e| return e.get_name().to_string())
        .collect::<Vec<String>>();
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    values: HashMap<ConfigKey, String>,
}

impl Config {
    pub fn default_value(key: ConfigKey) -> String {
        let base_dir = home_dir().join(".mingdaoai");

        let res = match key {
            ConfigKey::Backend => BackendName::Claude.to_string(),
            ConfigKey::ClaudeKeyFile => base_dir.join("anthropic.key").to_string_lossy().to_string(),
            ConfigKey::ClaudeURL => "https://api.anthropic.com".to_string(),
            ConfigKey::ContextWindow => DEFAULT_CONTEXT_WINDOW.to_string(),
            ConfigKey::MaxFiles => DEFAULT_MAX_FILES.to_string(),
            ConfigKey::Model => "".to_string(),
            ConfigKey::OpenAiKeyFile => base_dir.join("openai.key").to_string_lossy().to_string(),
            ConfigKey::OpenAiURL => "https://api.openai.com".to_string(),

            // Special
            ConfigKey::ConfigFile => base_dir
                .join("codesmith.toml")
                .to_string_lossy()
                .to_string(),
        };

        return res;
    }

    pub fn defaults() -> Config {
        let values = ConfigKey::iter()
            .map(|key| return (key, Config::default_value(key)))
            .collect::<HashMap<ConfigKey, String>>();

        return Config { values };
    }

    pub fn get(&self, key: ConfigKey) -> String {
        if let Some(val) = self.values.get(&key) {
            return val.to_string();
        }

        return "".to_string();
    }

    pub fn set(&mut self, key: ConfigKey, value: &str) {
        self.values.insert(key, value.to_string());
    }

    pub fn get_usize(&self, key: ConfigKey) -> Result<usize> {
        let val = self.get(key);
        return val.trim().parse::<usize>().map_err(|_| {
            return anyhow!(format!(
                "Config key '{key}' expects a whole number, got '{val}'"
            ));
        });
    }

    pub fn get_path(&self, key: ConfigKey) -> path::PathBuf {
        return expand_home(&self.get(key));
    }

    /// The configured model, or the backend's own default when none is set.
    pub fn model_for(&self, backend: BackendName) -> String {
        let model = self.get(ConfigKey::Model);
        if model.is_empty() {
            return backend.default_model().to_string();
        }

        return model;
    }

    /// Builds the configuration from defaults, then the TOML config file,
    /// then environment variables and flags.
    pub async fn load(cmd: &Command, clap_arg_matches: Vec<&ArgMatches>) -> Result<Config> {
        let mut config = Config::defaults();

        for matches in clap_arg_matches.as_slice() {
            if let Ok(Some(arg_config_file)) =
                matches.try_get_one::<String>(&ConfigKey::ConfigFile.to_string())
            {
                config.set(ConfigKey::ConfigFile, arg_config_file);
            }
        }

        let config_path = config.get_path(ConfigKey::ConfigFile);
        if config_path.exists() {
            let toml_str = fs::read_to_string(&config_path).await?;
            config.merge_toml(cmd, &toml_str)?;
        }

        for key in ConfigKey::iter() {
            for matches in clap_arg_matches.as_slice() {
                if let Ok(Some(val)) = matches.try_get_one::<String>(&key.to_string()) {
                    if val.is_empty() {
                        continue;
                    }
                    config.set(key, val);
                }
            }
        }

        tracing::debug!(
            backend = config.get(ConfigKey::Backend),
            model = config.get(ConfigKey::Model),
            config_file = config.get(ConfigKey::ConfigFile),
            max_files = config.get(ConfigKey::MaxFiles),
            context_window = config.get(ConfigKey::ContextWindow),
            "config"
        );

        return Ok(config);
    }

    fn merge_toml(&mut self, cmd: &Command, toml_str: &str) -> Result<()> {
        let doc = toml_str.parse::<toml_edit::Document>()?;

        for key in ConfigKey::iter() {
            if key == ConfigKey::ConfigFile {
                continue;
            }

            let val = match doc.get(&key.to_string()) {
                Some(val) => val,
                None => continue,
            };

            if let Some(val_int) = val.as_integer() {
                self.set(key, &val_int.to_string());
            } else if let Some(val_str) = val.as_str() {
                if val_str.is_empty() {
                    continue;
                }

                // Use clap value parsers to do validation.
                let possible_values = possible_values(cmd, key);
                if !possible_values.is_empty() && !possible_values.contains(&val_str.to_string()) {
                    bail!(format!(
                        "Config file has an invalid value for key '{key}': {val_str}\nPossible values are: {}",
                        possible_values.join(", ")
                    ));
                }
                self.set(key, val_str);
            } else {
                bail!(format!(
                    "Config file has an unsupported value for key '{key}', expected a string or an integer"
                ));
            }
        }

        return Ok(());
    }

    /// Renders a commented config file holding every default.
    pub fn serialize_default(cmd: &Command) -> String {
        let toml_str = ConfigKey::iter()
            .filter_map(|key| {
                if key == ConfigKey::ConfigFile {
                    return None;
                }

                let arg = find_arg(cmd, key)?;
                let help = arg
                    .get_help()
                    .map(|e| return e.to_string())
                    .unwrap_or_default();

                let mut description = help
                    .split("[default:")
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();

                let possible_values = possible_values(cmd, key);
                if !possible_values.is_empty() {
                    description = format!(
                        "{description} [possible values: {}]",
                        possible_values.join(", ")
                    );
                }

                let mut val = Config::default_value(key);
                if val.is_empty() {
                    val = format!("# {key} = \"\"");
                } else if val.parse::<i64>().is_ok() {
                    val = format!("{key} = {val}");
                } else {
                    val = format!("{key} = \"{val}\"");
                }

                return Some(format!("# {description}\n{val}"));
            })
            .collect::<Vec<String>>()
            .join("\n\n");

        return toml_str;
    }
}
