// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::*;
use crate::config::Config;
use crate::diagnostic::Diagnostic;
use crate::lexer::{Source, Span};
use crate::parser::Parser;
use crate::provider::{FileError, FileProvider};
use crate::utils::{absolute_path, path_to_string, resolve_path};

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace};

/// The entry file and everything it imports, flattened into one schema.
#[derive(Debug, Clone, Default)]
pub struct CombinedSchema {
    pub schema: Schema,
    pub rules: BTreeMap<String, RuleDecl>,
    pub types: BTreeMap<String, TypeDecl>,
    pub procs: BTreeMap<String, ProcDecl>,
    pub streams: BTreeMap<String, StreamDecl>,
    /// Path of every file read, with the SHA-256 of its contents.
    pub files: BTreeMap<String, String>,
}

impl CombinedSchema {
    /// Index the declarations of `schema`. When a name is declared twice the
    /// first declaration is kept.
    pub fn from_schema(schema: Schema) -> Self {
        let mut combined = CombinedSchema::default();
        for child in &schema.children {
            match child {
                SchemaChild::Rule(r) => {
                    combined
                        .rules
                        .entry(r.name.name.clone())
                        .or_insert_with(|| r.clone());
                }
                SchemaChild::Type(t) => {
                    combined
                        .types
                        .entry(t.name.name.clone())
                        .or_insert_with(|| t.clone());
                }
                SchemaChild::Proc(p) => {
                    combined
                        .procs
                        .entry(p.name.name.clone())
                        .or_insert_with(|| p.clone());
                }
                SchemaChild::Stream(s) => {
                    combined
                        .streams
                        .entry(s.name.name.clone())
                        .or_insert_with(|| s.clone());
                }
                _ => (),
            }
        }
        combined.schema = schema;
        combined
    }
}

#[derive(Debug, Clone)]
pub struct Resolved {
    pub schema: CombinedSchema,
    pub diagnostics: Vec<Diagnostic>,
}

impl Resolved {
    /// The first diagnostic, for callers that only care about success.
    pub fn error(&self) -> Option<&Diagnostic> {
        self.diagnostics.first()
    }
}

/// Loads an entry file and its imports. A resolver is used for a single
/// `resolve` call.
pub struct Resolver<P: FileProvider> {
    provider: P,
    config: Config,
    // Files already entered, whether or not they loaded.
    visited: BTreeSet<String>,
    files: BTreeMap<String, String>,
    diagnostics: Vec<Diagnostic>,
}

impl<P: FileProvider> Resolver<P> {
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, Config::default())
    }

    pub fn with_config(provider: P, config: Config) -> Self {
        Self {
            provider,
            config,
            visited: BTreeSet::new(),
            files: BTreeMap::new(),
            diagnostics: vec![],
        }
    }

    pub fn resolve(mut self, entry: &str) -> Resolved {
        let entry = path_to_string(&absolute_path(entry));
        debug!(entry = %entry, "resolving schema");

        let children = self.process_file(&entry, None);
        let mut schema = Schema { children };
        self.resolve_external_docstrings(&mut schema);

        let mut combined = CombinedSchema::from_schema(schema);
        combined.files = self.files;
        debug!(
            files = combined.files.len(),
            declarations = combined.schema.children.len(),
            diagnostics = self.diagnostics.len(),
            "resolved schema"
        );

        Resolved {
            schema: combined,
            diagnostics: self.diagnostics,
        }
    }

    fn process_file(&mut self, path: &str, importer: Option<&Import>) -> Vec<SchemaChild> {
        // Covers files imported twice as well as import cycles.
        if !self.visited.insert(path.to_string()) {
            trace!(file = %path, "already visited");
            return vec![];
        }

        let relative_to = importer.map_or("", |i| i.span.file());
        let contents = match self.provider.get_file_and_hash(relative_to, path) {
            Ok((contents, hash)) => {
                self.files.insert(path.to_string(), hash);
                contents
            }
            Err(e) => {
                let span = match importer {
                    Some(import) => import.span.clone(),
                    None => Span::start_of(&Source::new(path.to_string(), String::new())),
                };
                self.diagnostics.push(Diagnostic::new(span, e.to_string()));
                return vec![];
            }
        };

        debug!(file = %path, "parsing");
        let source = Source::new(path.to_string(), contents);
        let schema = match Parser::new(&source).parse() {
            Ok(schema) => schema,
            Err(e) => {
                self.diagnostics.push(e.into());
                return vec![];
            }
        };

        if let Some(d) = self.check_version(&schema) {
            self.diagnostics.push(d);
            return vec![];
        }

        let mut merged = vec![];
        for child in &schema.children {
            match child {
                SchemaChild::Import(import) => {
                    let target = path_to_string(&resolve_path(path, &import.path));
                    merged.extend(self.process_file(&target, Some(import)));
                }
                other => merged.push(other.clone()),
            }
        }

        merged
    }

    // A version statement is optional but, when present, must come before
    // any other declaration, appear once and name the supported version.
    fn check_version(&self, schema: &Schema) -> Option<Diagnostic> {
        let mut version: Option<&Version> = None;
        let mut seen_declaration = false;
        for child in &schema.children {
            match child {
                SchemaChild::Version(v) => {
                    if let Some(first) = version {
                        return Some(Diagnostic::new(
                            v.span.clone(),
                            format!("version statement is already declared at {}", first.span),
                        ));
                    }
                    if seen_declaration {
                        return Some(Diagnostic::new(
                            v.span.clone(),
                            "version statement must be the first declaration",
                        ));
                    }
                    if v.number != self.config.supported_version {
                        return Some(Diagnostic::new(
                            v.span.clone(),
                            format!(
                                "unsupported version {}, only version {} is supported",
                                v.number, self.config.supported_version
                            ),
                        ));
                    }
                    version = Some(v);
                }
                c if c.is_declaration() => seen_declaration = true,
                _ => (),
            }
        }
        None
    }

    fn resolve_external_docstrings(&mut self, schema: &mut Schema) {
        let suffix = self.config.external_docstring_suffix.as_str();
        let provider = &self.provider;
        let files = &mut self.files;
        let diagnostics = &mut self.diagnostics;

        schema.for_each_docstring_mut(&mut |doc: &mut Docstring| {
            let Some(path) = doc.external_path(suffix) else {
                return;
            };
            let path = path.to_string();
            match provider.get_file_and_hash(doc.span.file(), &path) {
                Ok((contents, hash)) => {
                    let full = path_to_string(&resolve_path(doc.span.file(), &path));
                    trace!(file = %full, "loaded external docstring");
                    files.insert(full, hash);
                    doc.value = contents;
                }
                Err(FileError::NotFound(full)) => diagnostics.push(Diagnostic::new(
                    doc.span.clone(),
                    format!("external docstring file \"{full}\" not found"),
                )),
                Err(e) => diagnostics.push(Diagnostic::new(
                    doc.span.clone(),
                    format!("failed to load external docstring: {e}"),
                )),
            }
        });
    }
}

/// Resolve `entry` with the default configuration.
pub fn resolve<P: FileProvider>(provider: P, entry: &str) -> Resolved {
    Resolver::new(provider).resolve(entry)
}
