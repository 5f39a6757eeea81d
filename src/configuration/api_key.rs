#[cfg(test)]
#[path = "api_key_test.rs"]
mod tests;

use std::path;

use anyhow::bail;
use anyhow::Result;
use tokio::fs;

pub struct ApiKey {}

impl ApiKey {
    /// Reads a key file and returns its trimmed contents.
    pub async fn load(key_path: &path::Path) -> Result<String> {
        let key_path_str = key_path.to_string_lossy().to_string();
        if !key_path.is_file() {
            bail!(format!("API key file not found at {key_path_str}"));
        }

        let key = fs::read_to_string(key_path).await?.trim().to_string();
        if key.is_empty() {
            bail!(format!("API key file at {key_path_str} is empty"));
        }

        tracing::debug!(path = key_path_str.as_str(), "Loaded API key");

        return Ok(key);
    }
}
