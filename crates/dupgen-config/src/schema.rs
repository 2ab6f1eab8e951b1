use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::model::ConfigFile;

/// Emit the JSON Schema for configuration files.
pub fn config_json_schema() -> RootSchema {
    schema_for!(ConfigFile)
}
