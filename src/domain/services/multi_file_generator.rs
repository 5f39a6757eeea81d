#[cfg(test)]
#[path = "multi_file_generator_test.rs"]
mod tests;

use std::io::Write;

use anyhow::Context;
use anyhow::Result;
use serde_derive::Serialize;
use serde_json::json;
use serde_json::Map;
use serde_json::Value;

use super::OutputDir;
use crate::domain::models::BackendBox;
use crate::domain::models::BackendRequest;
use crate::domain::models::FileOutcome;
use crate::domain::models::FileSpec;
use crate::domain::models::GeneratedFile;
use crate::domain::models::GenerationReport;
use crate::domain::models::Manifest;
use crate::domain::models::Message;

pub const MANIFEST_MAX_TOKENS: u32 = 4096;
pub const FILE_MAX_TOKENS: u32 = 4096 * 2;

const MANIFEST_INSTRUCTION: &str = "You are a helpful programming assistant. Based on the user's request, return a JSON array where each element has 'filepath' and 'description' fields, describing what each file will contain. Output the answer only with json array format. Do not include any other text in front of or behind the json array.\n";
const FILE_SYSTEM_PROMPT: &str = "You are a helpful programming assistant.";
const FILE_INSTRUCTIONS: &str = "Generate the code for this file. Output only the code content, without any formatting or JSON.";

#[derive(Serialize)]
struct FileInfo<'a> {
    filepath: &'a str,
    purpose: &'a str,
}

#[derive(Serialize)]
struct FileContext<'a> {
    reference_files: &'a str,
    generated_files: Map<String, Value>,
}

#[derive(Serialize)]
struct FilePrompt<'a> {
    file_info: FileInfo<'a>,
    context: FileContext<'a>,
    instructions: &'a str,
}

/// Two phase generation: one call for the list of files, then one call per
/// file. Each file call sees the content of every file generated before it.
pub struct MultiFileGenerator {
    backend: BackendBox,
    model: String,
}

impl MultiFileGenerator {
    pub fn new(backend: BackendBox, model: &str) -> MultiFileGenerator {
        return MultiFileGenerator {
            backend,
            model: model.to_string(),
        };
    }

    pub fn manifest_request(&self, prompt: &str, reference_context: &str) -> BackendRequest {
        let mut text = prompt.to_string();
        if !reference_context.is_empty() {
            text = format!(
                "Reference files:\n{reference_context}\n\nBased on these files and the request:\n{prompt}"
            );
        }

        return BackendRequest::new(
            &self.model,
            Some(MANIFEST_MAX_TOKENS),
            vec![Message::system(MANIFEST_INSTRUCTION), Message::user(&text)],
        );
    }

    pub fn file_request(
        &self,
        prompt: &str,
        reference_context: &str,
        spec: &FileSpec,
        generated: &[GeneratedFile],
    ) -> Result<BackendRequest> {
        let mut generated_files = Map::new();
        for file in generated {
            generated_files.insert(
                file.filepath.to_string(),
                json!({
                    "description": file.description,
                    "content": file.content,
                }),
            );
        }

        let file_prompt = FilePrompt {
            file_info: FileInfo {
                filepath: &spec.filepath,
                purpose: &spec.description,
            },
            context: FileContext {
                reference_files: reference_context,
                generated_files,
            },
            instructions: FILE_INSTRUCTIONS,
        };
        let generation_prompt = serde_json::to_string_pretty(&file_prompt)?;

        return Ok(BackendRequest::new(
            &self.model,
            Some(FILE_MAX_TOKENS),
            vec![
                Message::system(FILE_SYSTEM_PROMPT),
                Message::user(&format!("{prompt}\n\n{generation_prompt}")),
            ],
        ));
    }

    /// Asks for the manifest and parses it. Nothing touches the disk here, so
    /// any failure leaves the output directory untouched.
    pub async fn manifest(&self, prompt: &str, reference_context: &str) -> Result<Manifest> {
        let request = self.manifest_request(prompt, reference_context);
        let text = self
            .backend
            .complete(request)
            .await
            .context("Failed to request the file list")?;

        tracing::debug!(body = text.as_str(), "Manifest response");

        let manifest = Manifest::parse(&text).context("Failed to parse the file list")?;
        return Ok(manifest);
    }

    /// Runs both phases. Backend failures abort the run; a file that cannot
    /// be written is reported and skipped, and is left out of the context of
    /// later files.
    pub async fn generate<W: Write>(
        &self,
        prompt: &str,
        reference_context: &str,
        output: &OutputDir,
        out: &mut W,
    ) -> Result<GenerationReport> {
        let manifest = self.manifest(prompt, reference_context).await?;
        if manifest.is_empty() {
            writeln!(out, "The model planned no files.")?;
            return Ok(GenerationReport::default());
        }

        writeln!(out, "Planned {} files:", manifest.len())?;
        for spec in manifest.files.iter() {
            writeln!(out, "  - {} ({})", spec.filepath, spec.description)?;
        }
        writeln!(out)?;

        let mut report = GenerationReport::default();
        let mut generated: Vec<GeneratedFile> = vec![];

        for spec in manifest.files.iter() {
            let request = self.file_request(prompt, reference_context, spec, &generated)?;
            let code = self
                .backend
                .complete(request)
                .await
                .with_context(|| return format!("Failed to generate {}", spec.filepath))?;

            writeln!(
                out,
                "Generated code for {} ({}):",
                spec.filepath, spec.description
            )?;
            writeln!(out, "{code}")?;
            writeln!(out, "\n========")?;

            match output.write(&spec.filepath, &code).await {
                Ok(full_path) => {
                    writeln!(out, "Created: {}", full_path.display())?;
                    report.push(FileOutcome::Created(full_path));
                    generated.push(GeneratedFile::new(spec, &code));
                }
                Err(err) => {
                    let full_path = output.root.join(&spec.filepath);
                    tracing::error!(path = ?full_path, error = ?err, "Failed to write generated file");
                    writeln!(out, "Error creating {}: {err}", full_path.display())?;
                    report.push(FileOutcome::Failed {
                        path: spec.filepath.to_string(),
                        error: err.to_string(),
                    });
                }
            }
        }

        return Ok(report);
    }
}
