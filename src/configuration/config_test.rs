use anyhow::Result;
use test_utils::fixture_tree;

use super::expand_home;
use super::Config;
use super::ConfigKey;
use crate::application::cli;
use crate::domain::models::BackendName;

fn matches_from(args: Vec<&str>) -> Result<clap::ArgMatches> {
    return Ok(cli::build().try_get_matches_from(args)?);
}

#[test]
fn it_names_keys_in_kebab_case() {
    assert_eq!(ConfigKey::ClaudeKeyFile.to_string(), "claude-key-file");
    assert_eq!(ConfigKey::ClaudeURL.to_string(), "claude-url");
    assert_eq!(ConfigKey::OpenAiKeyFile.to_string(), "openai-key-file");
    assert_eq!(ConfigKey::OpenAiURL.to_string(), "openai-url");
    assert_eq!(ConfigKey::ContextWindow.to_string(), "context-window");
}

#[test]
fn it_serializes_to_valid_toml() -> Result<()> {
    let res = Config::serialize_default(&cli::build());
    let doc = res.parse::<toml_edit::Document>()?;

    assert_eq!(doc.get("backend").and_then(|e| return e.as_str()), Some("claude"));
    assert_eq!(doc.get("max-files").and_then(|e| return e.as_integer()), Some(50));
    assert_eq!(doc.get("context-window").and_then(|e| return e.as_integer()), Some(5));
    assert!(doc.get("model").is_none());
    assert!(doc.get("config-file").is_none());
    assert!(res.contains("# model = \"\""));
    assert!(res.contains("[possible values: claude, openai]"));

    return Ok(());
}

#[test]
fn it_resolves_models_per_backend() {
    let mut config = Config::defaults();
    assert_eq!(config.model_for(BackendName::OpenAI), "gpt-4o-mini");
    assert_eq!(
        config.model_for(BackendName::Claude),
        "claude-3-5-sonnet-20241022"
    );

    config.set(ConfigKey::Model, "o1");
    assert_eq!(config.model_for(BackendName::OpenAI), "o1");
}

#[test]
fn it_rejects_non_numeric_limits() {
    let mut config = Config::defaults();
    assert_eq!(config.get_usize(ConfigKey::MaxFiles).ok(), Some(50));

    config.set(ConfigKey::MaxFiles, "lots");
    assert_eq!(
        config.get_usize(ConfigKey::MaxFiles).unwrap_err().to_string(),
        "Config key 'max-files' expects a whole number, got 'lots'"
    );
}

#[test]
fn it_expands_the_home_directory() {
    let expanded = expand_home("~/.mingdaoai/openai.key");
    assert!(expanded.ends_with(".mingdaoai/openai.key"));
    assert!(!expanded.to_string_lossy().starts_with('~'));

    assert_eq!(
        expand_home("/tmp/openai.key"),
        std::path::PathBuf::from("/tmp/openai.key")
    );
}

#[tokio::test]
async fn it_loads_config_from_file() -> Result<()> {
    let dir = fixture_tree(&[(
        "codesmith.toml",
        "backend = \"openai\"\nmodel = \"gpt-4o\"\nmax-files = 10\ncontext-window = 2\n",
    )]);
    let config_file = dir.path().join("codesmith.toml");
    let config_file_str = config_file.to_string_lossy().to_string();

    let matches = matches_from(vec!["codesmith", "ask", "-c", &config_file_str])?;
    let (_, subcmd_matches) = matches.subcommand().unwrap();
    let config = Config::load(&cli::build(), vec![&matches, subcmd_matches]).await?;

    assert_eq!(config.get(ConfigKey::Backend), "openai");
    assert_eq!(config.get(ConfigKey::Model), "gpt-4o");
    assert_eq!(config.get_usize(ConfigKey::MaxFiles)?, 10);
    assert_eq!(config.get_usize(ConfigKey::ContextWindow)?, 2);
    assert_eq!(config.get(ConfigKey::ConfigFile), config_file_str);

    return Ok(());
}

#[tokio::test]
async fn it_prefers_flags_over_the_config_file() -> Result<()> {
    let dir = fixture_tree(&[("codesmith.toml", "backend = \"openai\"\nmax-files = 10\n")]);
    let config_file_str = dir
        .path()
        .join("codesmith.toml")
        .to_string_lossy()
        .to_string();

    let matches = matches_from(vec![
        "codesmith",
        "ask",
        "-c",
        &config_file_str,
        "--backend",
        "claude",
        "--max-files",
        "3",
    ])?;
    let (_, subcmd_matches) = matches.subcommand().unwrap();
    let config = Config::load(&cli::build(), vec![&matches, subcmd_matches]).await?;

    assert_eq!(config.get(ConfigKey::Backend), "claude");
    assert_eq!(config.get_usize(ConfigKey::MaxFiles)?, 3);

    return Ok(());
}

#[tokio::test]
async fn it_uses_defaults_without_a_config_file() -> Result<()> {
    let dir = fixture_tree(&[]);
    let config_file_str = dir
        .path()
        .join("missing.toml")
        .to_string_lossy()
        .to_string();

    let matches = matches_from(vec!["codesmith", "ask", "-c", &config_file_str])?;
    let (_, subcmd_matches) = matches.subcommand().unwrap();
    let config = Config::load(&cli::build(), vec![&matches, subcmd_matches]).await?;

    assert_eq!(config.get(ConfigKey::Backend), "claude");
    assert_eq!(config.get(ConfigKey::ClaudeURL), "https://api.anthropic.com");
    assert_eq!(config.get(ConfigKey::OpenAiURL), "https://api.openai.com");
    assert!(config
        .get(ConfigKey::ClaudeKeyFile)
        .ends_with(".mingdaoai/anthropic.key"));

    return Ok(());
}

#[tokio::test]
async fn it_fails_to_load_invalid_values_from_file() -> Result<()> {
    let dir = fixture_tree(&[("codesmith.toml", "backend = \"gemini\"\n")]);
    let config_file_str = dir
        .path()
        .join("codesmith.toml")
        .to_string_lossy()
        .to_string();

    let matches = matches_from(vec!["codesmith", "ask", "-c", &config_file_str])?;
    let (_, subcmd_matches) = matches.subcommand().unwrap();
    let res = Config::load(&cli::build(), vec![&matches, subcmd_matches]).await;

    assert_eq!(
        res.unwrap_err().to_string(),
        "Config file has an invalid value for key 'backend': gemini\nPossible values are: claude, openai"
    );

    return Ok(());
}

#[tokio::test]
async fn it_fails_to_load_broken_toml() -> Result<()> {
    let dir = fixture_tree(&[("codesmith.toml", "backend = \n")]);
    let config_file_str = dir
        .path()
        .join("codesmith.toml")
        .to_string_lossy()
        .to_string();

    let matches = matches_from(vec!["codesmith", "ask", "-c", &config_file_str])?;
    let res = Config::load(&cli::build(), vec![&matches]).await;
    assert!(res.is_err());

    return Ok(());
}
