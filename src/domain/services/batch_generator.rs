#[cfg(test)]
#[path = "batch_generator_test.rs"]
mod tests;

use std::io::Write;

use anyhow::bail;
use anyhow::Context;
use anyhow::Result;

use super::OutputDir;
use crate::domain::models::parse_snippets;
use crate::domain::models::BackendBox;
use crate::domain::models::BackendRequest;
use crate::domain::models::FileOutcome;
use crate::domain::models::GenerationReport;
use crate::domain::models::Message;

/// Models accepted by the single-batch generator.
pub const BATCH_MODELS: [&str; 4] = ["gpt-4o", "gpt-4o-mini", "o1", "o1-mini"];

const BATCH_INSTRUCTION: &str = "You are a helpful programming assistant. Generate code based on the prompt and return a JSON array where each element has 'name' and 'code' fields. Output the answer only with json array format. Do not use triple quote to enclose the answer.";

pub fn validate_batch_model(model: &str) -> Result<()> {
    if !BATCH_MODELS.contains(&model) {
        bail!(format!(
            "Invalid model. Choose from: {}",
            BATCH_MODELS.join(", ")
        ));
    }

    return Ok(());
}

/// Generates every file of a request with a single completion.
pub struct BatchGenerator {
    backend: BackendBox,
    model: String,
}

impl BatchGenerator {
    pub fn new(backend: BackendBox, model: &str) -> BatchGenerator {
        return BatchGenerator {
            backend,
            model: model.to_string(),
        };
    }

    pub fn request(&self, prompt: &str) -> BackendRequest {
        return BackendRequest::new(
            &self.model,
            None,
            vec![Message::system(BATCH_INSTRUCTION), Message::user(prompt)],
        );
    }

    /// A response that is not a JSON array aborts the run. Entries missing a
    /// field and files that cannot be written are reported and skipped.
    pub async fn generate<W: Write>(
        &self,
        prompt: &str,
        output: &OutputDir,
        out: &mut W,
    ) -> Result<GenerationReport> {
        let content = self
            .backend
            .complete(self.request(prompt))
            .await
            .context("Failed to generate code")?;

        writeln!(out, "Generated code:")?;
        writeln!(out, "{content}")?;
        writeln!(out, "\n========")?;

        let snippets = parse_snippets(&content).context("Failed to parse generated code")?;

        let mut report = GenerationReport::default();
        for (entry, snippet) in snippets.into_iter().enumerate() {
            let snippet = match snippet {
                Ok(snippet) => snippet,
                Err(err) => {
                    tracing::warn!(entry = entry, error = ?err, "Skipping invalid snippet");
                    writeln!(out, "Error: Invalid snippet format ({err})")?;
                    report.push(FileOutcome::Skipped {
                        entry,
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            match output.write(&snippet.name, &snippet.code).await {
                Ok(full_path) => {
                    writeln!(out, "Created: {}", full_path.display())?;
                    report.push(FileOutcome::Created(full_path));
                }
                Err(err) => {
                    let full_path = output.root.join(&snippet.name);
                    tracing::error!(path = ?full_path, error = ?err, "Failed to write snippet");
                    writeln!(out, "Error creating {}: {err}", full_path.display())?;
                    report.push(FileOutcome::Failed {
                        path: snippet.name,
                        error: err.to_string(),
                    });
                }
            }
        }

        return Ok(report);
    }
}
