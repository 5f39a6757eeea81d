#[cfg(test)]
#[path = "runners_test.rs"]
mod tests;

use std::env;
use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use tokio::fs;

use super::terminal;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BackendName;
use crate::domain::models::GenerationReport;
use crate::domain::services::validate_batch_model;
use crate::domain::services::BatchGenerator;
use crate::domain::services::ChatSession;
use crate::domain::services::ContextCollector;
use crate::domain::services::MultiFileGenerator;
use crate::domain::services::OutputDir;
use crate::infrastructure::backends::BackendManager;

pub async fn read_prompt_file(prompt_file: &path::Path) -> Result<String> {
    if !prompt_file.is_file() {
        bail!(format!(
            "Prompt file not found at {}",
            prompt_file.to_string_lossy()
        ));
    }

    return Ok(fs::read_to_string(prompt_file).await?);
}

fn display_path(file: &path::Path, cwd: &path::Path) -> String {
    if let Ok(relative) = file.strip_prefix(cwd) {
        return relative.to_string_lossy().to_string();
    }

    return file.to_string_lossy().to_string();
}

fn print_report(report: &GenerationReport) {
    println!("\n{}", report.summary());
}

/// Loads source files as context and runs an interactive chat about them.
pub async fn ask(config: &Config, files: &[path::PathBuf]) -> Result<()> {
    let backend_name = BackendName::parse(&config.get(ConfigKey::Backend))?;
    let max_files = config.get_usize(ConfigKey::MaxFiles)?;
    let context_window = config.get_usize(ConfigKey::ContextWindow)?;
    let cwd = env::current_dir()?;

    println!(
        "\nStarting code analysis with {}...",
        backend_name.label()
    );
    if files.is_empty() {
        println!("\nNo files specified. Scanning current directory:");
        println!("  Directory: {}", cwd.to_string_lossy());
    }

    let collector = ContextCollector::source_code(max_files);
    let discovered = collector.discover(files)?;
    println!("\nSummary: Found {} files to analyze:", discovered.len());
    for file in discovered.iter() {
        println!("  - {}", display_path(file, &cwd));
    }
    println!();

    let context = collector.read(discovered).await?;
    let backend = BackendManager::get(backend_name, config).await?;
    let session = ChatSession::new(
        backend,
        &config.model_for(backend_name),
        &context.as_chat_context(),
        context_window,
    );

    return terminal::chat_loop(session).await;
}

/// Plans a file list, then generates each file with the earlier ones as context.
pub async fn codegen(
    config: &Config,
    prompt: &str,
    inputs: &[path::PathBuf],
    output: &path::Path,
) -> Result<GenerationReport> {
    let backend_name = BackendName::parse(&config.get(ConfigKey::Backend))?;
    let max_files = config.get_usize(ConfigKey::MaxFiles)?;

    let mut reference_context = "".to_string();
    if !inputs.is_empty() {
        let collected = ContextCollector::references(max_files)
            .collect(inputs)
            .await?;
        if collected.is_empty() {
            println!("No reference files found.");
        } else {
            println!("Loaded {} reference files.", collected.files.len());
        }
        reference_context = collected.as_reference_context();
    }

    let backend = BackendManager::get(backend_name, config).await?;
    let output_dir = OutputDir::create(output).await?;

    let generator = MultiFileGenerator::new(backend, &config.model_for(backend_name));
    let report = generator
        .generate(prompt, &reference_context, &output_dir, &mut io::stdout())
        .await?;

    print_report(&report);
    return Ok(report);
}

/// Generates every snippet of a request with one OpenAI completion.
pub async fn generate(
    config: &Config,
    prompt: &str,
    output: &path::Path,
) -> Result<GenerationReport> {
    let model = config.model_for(BackendName::OpenAI);
    validate_batch_model(&model)?;

    let backend = BackendManager::get(BackendName::OpenAI, config).await?;
    let output_dir = OutputDir::create(output).await?;

    let generator = BatchGenerator::new(backend, &model);
    let report = generator
        .generate(prompt, &output_dir, &mut io::stdout())
        .await?;

    print_report(&report);
    return Ok(report);
}
