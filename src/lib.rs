// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Use README.md as crate documentation.
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

mod analyzer;
mod ast;
mod config;
mod diagnostic;
mod engine;
mod lexer;
mod parser;
mod provider;
mod resolver;
mod token;
mod utils;

pub use analyzer::{analyze, Analyzer};
pub use config::Config;
pub use diagnostic::{first_error, Diagnostic};
pub use engine::Engine;
pub use provider::{hash_content, FileError, FileProvider, FsFileProvider, MemoryFileProvider};
pub use resolver::{resolve, CombinedSchema, Resolved, Resolver};

/// Items in `unstable` are likely to change.
pub mod unstable {
    pub use crate::analyzer::{BuiltinRule, ParamKind, BUILTIN_RULES};
    pub use crate::ast::*;
    pub use crate::lexer::*;
    pub use crate::parser::*;
    pub use crate::token::*;
}

#[cfg(test)]
mod tests;
