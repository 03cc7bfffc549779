use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use regex::Regex;

use crate::schema::ProjectConfig;

pub fn load_and_validate_config(path: &Path) -> Result<ProjectConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let mut config = parse_config(path, &contents)?;

    config.normalize_names();
    validate_config(&config)
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            extension.eq_ignore_ascii_case("yaml") || extension.eq_ignore_ascii_case("yml")
        })
}

fn parse_config(path: &Path, contents: &str) -> Result<ProjectConfig> {
    if is_yaml(path) {
        return serde_yaml::from_str(contents).map_err(|error| {
            let location = error
                .location()
                .map(|location| format!("line {}, column {}", location.line(), location.column()))
                .unwrap_or_else(|| "unknown location".to_owned());
            anyhow!(
                "failed to parse yaml in {} at {}: {}",
                path.display(),
                location,
                error
            )
        });
    }

    serde_json::from_str(contents).map_err(|error| {
        anyhow!(
            "failed to parse json in {} at line {}, column {}: {}",
            path.display(),
            error.line(),
            error.column(),
            error
        )
    })
}

fn validate_config(config: &ProjectConfig) -> Result<()> {
    config.video_mode.validate()?;
    config.durations.validate()?;

    validate_regex(
        "parsing.dialogueRegex",
        &config.parsing.dialogue_regex,
        &["name", "expression", "text"],
    )?;
    validate_regex(
        "parsing.shortDialogueRegex",
        &config.parsing.short_dialogue_regex,
        &["name", "text"],
    )?;

    for (name, components) in &config.component_macros {
        if components.is_empty() {
            bail!("component macro '{name}' must list at least one component");
        }
    }

    for (alias, target) in &config.aliases {
        if alias == target {
            bail!("alias '{alias}' points at itself");
        }
    }

    Ok(())
}

fn validate_regex(key: &str, pattern: &str, groups: &[&str]) -> Result<()> {
    let regex = Regex::new(pattern).with_context(|| format!("{key} does not compile"))?;
    let names: Vec<&str> = regex.capture_names().flatten().collect();
    for group in groups {
        if !names.contains(group) {
            bail!("{key} must define a named group '{group}'");
        }
    }
    Ok(())
}
