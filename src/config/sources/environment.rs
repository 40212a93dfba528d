//! `DOCTREE__*` environment overlay, e.g. `DOCTREE__CACHE__VIEW_TTL_SECS=60`

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment};
use std::collections::HashMap;

const PREFIX: &str = "DOCTREE";
const SEPARATOR: &str = "__";

/// Environment source over the process environment, or over `vars` when given
fn source(vars: Option<HashMap<String, String>>) -> Environment {
    Environment::with_prefix(PREFIX)
        .prefix_separator(SEPARATOR)
        .separator(SEPARATOR)
        .ignore_empty(true)
        .try_parsing(true)
        .source(vars)
}

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(source(None)))
}
