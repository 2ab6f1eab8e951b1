use crate::errors::ConfigurationError;
use crate::load::parse_config_json;
use crate::model::ConfigFile;

const DEFAULT_CONFIG: &str = include_str!("../defaults/attributes.json");

/// Built-in person-record configuration.
///
/// Resource files are resolved against the generation crate's bundled data
/// directory.
pub fn default_config() -> Result<ConfigFile, ConfigurationError> {
    parse_config_json(DEFAULT_CONFIG)
}
