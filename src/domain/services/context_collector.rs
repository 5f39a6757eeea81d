#[cfg(test)]
#[path = "context_collector_test.rs"]
mod tests;

use std::env;
use std::path;

use anyhow::anyhow;
use anyhow::bail;
use anyhow::Result;
use tokio::fs;
use walkdir::WalkDir;

pub const DEFAULT_MAX_FILES: usize = 50;

/// Extensions of files that typically contain source code.
pub const SOURCE_EXTENSIONS: [&str; 17] = [
    "py", "js", "java", "cpp", "c", "h", "cs", "go", "rs", "swift", "kt", "rb", "php", "ts",
    "scala", "m", "hpp",
];

pub struct CollectedFile {
    pub path: path::PathBuf,
    pub content: String,
}

pub struct CollectedContext {
    pub files: Vec<CollectedFile>,
}

impl CollectedContext {
    pub fn is_empty(&self) -> bool {
        return self.files.is_empty();
    }

    /// Context block handed to the chat flow.
    pub fn as_chat_context(&self) -> String {
        return self
            .files
            .iter()
            .map(|file| {
                return format!("\n=== From {} ===\n{}\n", file.path.display(), file.content);
            })
            .collect::<Vec<String>>()
            .join("");
    }

    /// Reference block handed to the multi-file generator.
    pub fn as_reference_context(&self) -> String {
        return self
            .files
            .iter()
            .map(|file| {
                return format!("\n=== {} ===\n{}\n", file.path.display(), file.content);
            })
            .collect::<Vec<String>>()
            .join("");
    }
}

/// Gathers files from a set of paths into a single text blob. Any failure
/// aborts the whole collection, no partial result is ever returned.
pub struct ContextCollector {
    max_files: usize,
    source_only: bool,
    allow_empty: bool,
}

impl ContextCollector {
    /// Source code files only. Finding nothing is an error.
    pub fn source_code(max_files: usize) -> ContextCollector {
        return ContextCollector {
            max_files,
            source_only: true,
            allow_empty: false,
        };
    }

    /// Every file regardless of extension. Finding nothing is fine.
    pub fn references(max_files: usize) -> ContextCollector {
        return ContextCollector {
            max_files,
            source_only: false,
            allow_empty: true,
        };
    }

    fn is_wanted(&self, file_path: &path::Path) -> bool {
        if !self.source_only {
            return true;
        }

        if let Some(ext) = file_path.extension() {
            let ext = ext.to_string_lossy().to_lowercase();
            return SOURCE_EXTENSIONS.contains(&ext.as_str());
        }

        return false;
    }

    /// Lists the files that would be collected, sorted. An empty `paths`
    /// scans the current working directory.
    pub fn discover(&self, paths: &[path::PathBuf]) -> Result<Vec<path::PathBuf>> {
        let mut roots = paths.to_vec();
        if roots.is_empty() {
            roots.push(env::current_dir()?);
        }

        let mut files: Vec<path::PathBuf> = vec![];
        for root in roots.iter() {
            if root.is_dir() {
                for entry in WalkDir::new(root).sort_by_file_name() {
                    let entry = entry.map_err(|err| {
                        return anyhow!(format!("Error reading {}: {err}", root.display()));
                    })?;
                    if entry.path().is_file() && self.is_wanted(entry.path()) {
                        files.push(entry.into_path());
                    }
                }
            } else if root.is_file() {
                if self.is_wanted(root) {
                    files.push(root.to_path_buf());
                }
            } else {
                bail!(format!("File not found: {}", root.display()));
            }
        }

        files.sort();
        files.dedup();

        if files.is_empty() && !self.allow_empty {
            bail!("No valid source code files found");
        }
        if files.len() > self.max_files {
            bail!(format!(
                "Too many files ({}). Maximum allowed is {}.",
                files.len(),
                self.max_files
            ));
        }

        tracing::debug!(count = files.len(), "Discovered context files");

        return Ok(files);
    }

    /// Reads every discovered file. A single unreadable file fails the lot.
    pub async fn read(&self, files: Vec<path::PathBuf>) -> Result<CollectedContext> {
        let mut collected: Vec<CollectedFile> = vec![];
        for file_path in files {
            let content = fs::read_to_string(&file_path).await.map_err(|err| {
                if err.kind() == std::io::ErrorKind::NotFound {
                    return anyhow!(format!("File not found: {}", file_path.display()));
                }
                return anyhow!(format!("Error reading {}: {err}", file_path.display()));
            })?;

            collected.push(CollectedFile {
                path: file_path,
                content,
            });
        }

        return Ok(CollectedContext { files: collected });
    }

    pub async fn collect(&self, paths: &[path::PathBuf]) -> Result<CollectedContext> {
        let files = self.discover(paths)?;
        return self.read(files).await;
    }
}
