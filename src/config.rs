// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::Result;
use serde::Deserialize;

/// Knobs shared by the resolver and the analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// The only value accepted by a `version` statement.
    pub supported_version: i64,
    /// Docstrings made of a single line ending with this suffix are read
    /// from the file they name.
    pub external_docstring_suffix: String,
    /// Enforce camelCase rule names and PascalCase type, proc and stream
    /// names.
    pub check_casing: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            supported_version: 1,
            external_docstring_suffix: ".md".to_string(),
            check_casing: true,
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> Result<Config> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}
