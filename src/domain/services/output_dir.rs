#[cfg(test)]
#[path = "output_dir_test.rs"]
mod tests;

use std::path;
use std::path::Component;

use anyhow::bail;
use anyhow::Result;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Destination directory for generated files.
pub struct OutputDir {
    pub root: path::PathBuf,
}

impl OutputDir {
    /// Creates the directory (and its parents) if it does not exist yet.
    pub async fn create(root: &path::Path) -> Result<OutputDir> {
        if !root.exists() {
            fs::create_dir_all(root).await?;
        }

        return Ok(OutputDir {
            root: root.to_path_buf(),
        });
    }

    /// Resolves a model provided relative path under the root. Paths that
    /// would land outside of the root are refused.
    pub fn resolve(&self, relative: &str) -> Result<path::PathBuf> {
        if relative.trim().is_empty() {
            bail!("File path is empty");
        }

        let rel = path::Path::new(relative);
        for component in rel.components() {
            match component {
                Component::Normal(_) | Component::CurDir => continue,
                _ => bail!(format!("File path {relative} escapes the output directory")),
            }
        }

        return Ok(self.root.join(rel));
    }

    /// Writes `content` byte for byte to `root/relative`, creating parent
    /// directories as needed.
    pub async fn write(&self, relative: &str, content: &str) -> Result<path::PathBuf> {
        let full_path = self.resolve(relative)?;
        if let Some(parent) = full_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut file = fs::File::create(&full_path).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;

        tracing::debug!(path = ?full_path, bytes = content.len(), "Wrote generated file");

        return Ok(full_path);
    }
}
