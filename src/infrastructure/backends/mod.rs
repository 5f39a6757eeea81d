pub mod claude;
pub mod openai;
#[cfg(test)]
pub mod scripted;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;

use crate::configuration::ApiKey;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BackendBox;
use crate::domain::models::BackendName;

pub struct BackendManager {}

impl BackendManager {
    /// Builds a backend, reading the API key of that backend only.
    pub async fn get(name: BackendName, config: &Config) -> Result<BackendBox> {
        if name == BackendName::Claude {
            let token = ApiKey::load(&config.get_path(ConfigKey::ClaudeKeyFile)).await?;
            return Ok(Box::new(claude::Claude::new(
                &config.get(ConfigKey::ClaudeURL),
                &token,
            )));
        }

        if name == BackendName::OpenAI {
            let token = ApiKey::load(&config.get_path(ConfigKey::OpenAiKeyFile)).await?;
            return Ok(Box::new(openai::OpenAI::new(
                &config.get(ConfigKey::OpenAiURL),
                &token,
            )));
        }

        bail!(format!("No backend implemented for {name}"))
    }
}
