use std::env;
use std::fs;
use std::process;

use anyhow::anyhow;
use anyhow::Result;

fn cmd(args: Vec<&str>) -> Result<String> {
    let mut child = process::Command::new("./target/debug/codesmith");
    for arg in args {
        child.arg(arg);
    }

    for (key, _) in env::vars() {
        if key.starts_with("CODESMITH_") {
            child.env_remove(key);
        }
    }

    let output = child.env("NO_COLOR", "1").output()?;
    return Ok(String::from_utf8(output.stdout)?);
}

fn usage(args: Vec<&str>) -> Result<String> {
    let help = cmd(args)?;
    let usage = help.split("Options:").next().unwrap_or_default().trim();
    return Ok(usage.to_string());
}

fn replace_section(readme: &mut String, marker: &str, body: &str) -> Result<()> {
    let start_tag = format!("<!-- {marker} start -->");
    let end_tag = format!("<!-- {marker} end -->");

    let start = readme
        .find(&start_tag)
        .ok_or_else(|| return anyhow!("README.md is missing {start_tag}"))?;
    let end = readme
        .find(&end_tag)
        .ok_or_else(|| return anyhow!("README.md is missing {end_tag}"))?;

    readme.replace_range(start..end, &format!("{start_tag}\n```\n{body}\n```\n"));
    return Ok(());
}

pub fn update() -> Result<()> {
    let mut readme = fs::read_to_string("./README.md")?;

    replace_section(&mut readme, "command-help", cmd(vec!["--help"])?.trim())?;
    replace_section(&mut readme, "command-ask", &usage(vec!["ask", "--help"])?)?;
    replace_section(&mut readme, "command-codegen", &usage(vec!["codegen", "--help"])?)?;
    replace_section(&mut readme, "command-generate", &usage(vec!["generate", "--help"])?)?;
    replace_section(&mut readme, "command-config", &usage(vec!["config", "--help"])?)?;

    if let Ok(home) = env::var("HOME") {
        readme = readme.replace(&home, "~");
    }

    fs::write("./README.md", readme)?;
    return Ok(());
}
