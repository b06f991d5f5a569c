// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::analyzer::Analyzer;
use crate::ast::Schema;
use crate::config::Config;
use crate::lexer::Source;
use crate::parser::Parser;
use crate::provider::{FileProvider, FsFileProvider};
use crate::resolver::{CombinedSchema, Resolved, Resolver};

use anyhow::{anyhow, bail, Result};
use tracing::debug;

/// Front door to the compiler: resolves a schema with its imports and runs
/// the semantic checks over the result.
#[derive(Debug, Clone)]
pub struct Engine<P: FileProvider = FsFileProvider> {
    provider: P,
    config: Config,
}

/// An engine reading from the file system.
impl Default for Engine {
    fn default() -> Self {
        Self::new(FsFileProvider)
    }
}

impl<P: FileProvider> Engine<P> {
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, Config::default())
    }

    pub fn with_config(provider: P, config: Config) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Parse a single schema. Imports are left unresolved.
    pub fn parse_schema(&self, path: String, contents: String) -> Result<Schema> {
        let source = Source::new(path, contents);
        Parser::new(&source).parse().map_err(|e| anyhow!(e.render()))
    }

    /// Load `path` and everything it imports.
    pub fn resolve(&self, path: &str) -> Resolved {
        Resolver::with_config(&self.provider, self.config.clone()).resolve(path)
    }

    /// Resolve `path` and analyze the combined schema. Diagnostics from both
    /// stages are returned, resolver diagnostics first.
    pub fn check(&self, path: &str) -> Resolved {
        let mut resolved = self.resolve(path);
        let diagnostics = Analyzer::with_config(&resolved.schema, self.config.clone()).analyze();
        debug!(
            resolver = resolved.diagnostics.len(),
            analyzer = diagnostics.len(),
            "checked {path}"
        );
        resolved.diagnostics.extend(diagnostics);
        resolved
    }

    /// Like [`Engine::check`] but fails with the first diagnostic.
    pub fn check_file(&self, path: &str) -> Result<CombinedSchema> {
        let resolved = self.check(path);
        if let Some(d) = resolved.error() {
            bail!(d.render());
        }
        Ok(resolved.schema)
    }
}
