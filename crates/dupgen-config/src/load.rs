use std::fs;
use std::path::Path;

use crate::errors::ConfigurationError;
use crate::model::ConfigFile;

/// Load a configuration file; `.toml` files are read as TOML, anything
/// else as JSON.
pub fn load_config(path: &Path) -> Result<ConfigFile, ConfigurationError> {
    let contents = fs::read_to_string(path).map_err(|err| {
        ConfigurationError::global(
            "config_file",
            format!("failed to read {}: {err}", path.display()),
        )
    })?;

    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    if is_toml {
        parse_config_toml(&contents)
    } else {
        parse_config_json(&contents)
    }
}

pub fn parse_config_json(contents: &str) -> Result<ConfigFile, ConfigurationError> {
    serde_json::from_str(contents)
        .map_err(|err| ConfigurationError::global("config_file", format!("invalid json: {err}")))
}

pub fn parse_config_toml(contents: &str) -> Result<ConfigFile, ConfigurationError> {
    toml::from_str(contents)
        .map_err(|err| ConfigurationError::global("config_file", format!("invalid toml: {err}")))
}
