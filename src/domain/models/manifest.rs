#[cfg(test)]
#[path = "manifest_test.rs"]
mod tests;

use std::collections::HashSet;
use std::path;
use std::path::Component;

use serde_derive::Deserialize;
use serde_derive::Serialize;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("manifest is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("manifest must be a JSON array of objects")]
    NotAnArray,
    #[error("manifest entry {index} is missing a string '{field}' field")]
    MissingField { index: usize, field: &'static str },
    #[error("manifest lists '{0}' more than once")]
    DuplicatePath(String),
    #[error("manifest path '{0}' must be relative and stay inside the output directory")]
    UnsafePath(String),
}

fn is_safe_relative(filepath: &str) -> bool {
    if filepath.trim().is_empty() {
        return false;
    }

    return path::Path::new(filepath)
        .components()
        .all(|component| return matches!(component, Component::Normal(_) | Component::CurDir));
}

/// Path a manifest entry resolves to under the output directory, so that
/// `a.py`, `./a.py` and `.//a.py` compare equal.
fn normalized(filepath: &str) -> path::PathBuf {
    return path::Path::new(filepath)
        .components()
        .filter(|component| return matches!(component, Component::Normal(_)))
        .collect();
}

/// One file the model promised to produce.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSpec {
    pub filepath: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub filepath: String,
    pub description: String,
    pub content: String,
}

impl GeneratedFile {
    pub fn new(spec: &FileSpec, content: &str) -> GeneratedFile {
        return GeneratedFile {
            filepath: spec.filepath.to_string(),
            description: spec.description.to_string(),
            content: content.to_string(),
        };
    }
}

/// Ordered list of files returned by the manifest call. Order is generation
/// order: later files see the content of earlier ones.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Manifest {
    pub files: Vec<FileSpec>,
}

impl Manifest {
    /// Parses model output strictly. Any shape problem rejects the whole
    /// manifest, as nothing has been written yet.
    pub fn parse(text: &str) -> Result<Manifest, ManifestError> {
        let value: Value = serde_json::from_str(text)?;
        let entries = match value {
            Value::Array(entries) => entries,
            _ => return Err(ManifestError::NotAnArray),
        };

        let mut seen: HashSet<path::PathBuf> = HashSet::new();
        let mut files: Vec<FileSpec> = vec![];
        for (index, entry) in entries.iter().enumerate() {
            let filepath = string_field(entry, index, "filepath")?;
            let description = string_field(entry, index, "description")?;

            if !is_safe_relative(&filepath) {
                return Err(ManifestError::UnsafePath(filepath));
            }
            if !seen.insert(normalized(&filepath)) {
                return Err(ManifestError::DuplicatePath(filepath));
            }

            files.push(FileSpec {
                filepath,
                description,
            });
        }

        return Ok(Manifest { files });
    }

    pub fn len(&self) -> usize {
        return self.files.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.files.is_empty();
    }
}

fn string_field(
    entry: &Value,
    index: usize,
    field: &'static str,
) -> Result<String, ManifestError> {
    if !entry.is_object() {
        return Err(ManifestError::NotAnArray);
    }

    return entry
        .get(field)
        .and_then(|e| return e.as_str())
        .map(|e| return e.to_string())
        .ok_or(ManifestError::MissingField { index, field });
}
