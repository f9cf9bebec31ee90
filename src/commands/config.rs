use anyhow::{Context, Result};

use streamsift::config::{ConfigSource, LoadedConfig};

/// Print the resolved configuration and any loading or validation problems
pub fn show_config(loaded: &LoadedConfig, json: bool) -> Result<()> {
    println!("{}", render_config(loaded, json)?);
    Ok(())
}

/// Render the configuration as it was loaded, before sanitizing, so problems
/// are reported as written
fn render_config(loaded: &LoadedConfig, json: bool) -> Result<String> {
    let mut lines = Vec::new();

    match &loaded.source {
        ConfigSource::User(path) | ConfigSource::File(path) => {
            lines.push(format!("# source: {}", path.display()));
        }
        ConfigSource::Defaults => lines.push("# source: built-in defaults".to_string()),
    }

    let rendered = if json {
        serde_json::to_string_pretty(&loaded.config).context("Failed to serialize config as JSON")?
    } else {
        toml::to_string_pretty(&loaded.config).context("Failed to serialize config as TOML")?
    };
    lines.push(rendered);

    for issue in &loaded.issues {
        lines.push(format!("# error: {issue}"));
    }

    match loaded.config.validate() {
        Ok(()) if loaded.issues.is_empty() => lines.push("# configuration is valid".to_string()),
        Ok(()) => lines.push("# values above include defaults substituted for the errors".to_string()),
        Err(e) => {
            lines.push(format!("# invalid: {e}"));
            lines.push("# invalid values are replaced by defaults at run time".to_string());
        }
    }

    Ok(lines.join("\n"))
}
