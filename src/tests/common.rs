// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Helpers shared by the unit tests.

use crate::analyzer::Analyzer;
use crate::ast::Schema;
use crate::config::Config;
use crate::diagnostic::Diagnostic;
use crate::lexer::Source;
use crate::parser::Parser;
use crate::resolver::CombinedSchema;

use anyhow::{anyhow, Result};

pub const FILE: &str = "case.rpcdl";

pub fn parse_str(contents: &str) -> Result<Schema> {
    let source = Source::new(FILE.to_string(), contents.to_string());
    Parser::new(&source).parse().map_err(|e| anyhow!(e.render()))
}

pub fn messages(diagnostics: &[Diagnostic]) -> Vec<String> {
    diagnostics.iter().map(|d| d.message.clone()).collect()
}

/// Parse a single file and run the analyzer over it.
pub fn analyze_str_with(contents: &str, config: Config) -> Result<Vec<String>> {
    let combined = CombinedSchema::from_schema(parse_str(contents)?);
    let diagnostics = Analyzer::with_config(&combined, config).analyze();
    for d in &diagnostics {
        println!("{}", d.render());
    }
    Ok(messages(&diagnostics))
}

pub fn analyze_str(contents: &str) -> Result<Vec<String>> {
    analyze_str_with(contents, Config::default())
}
