// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::lexer::Span;
use crate::parser::ParseError;

/// A positioned, non-fatal problem found while resolving or analyzing.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{span}: {message}")]
pub struct Diagnostic {
    pub span: Span,
    pub message: String,
}

impl Diagnostic {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }

    /// The diagnostic with the offending source line and a caret.
    pub fn render(&self) -> String {
        self.span.message("error", &self.message)
    }
}

impl From<ParseError> for Diagnostic {
    fn from(e: ParseError) -> Self {
        Self::new(e.span, e.message)
    }
}

/// `Err` with the first diagnostic, if there is any.
pub fn first_error(diagnostics: &[Diagnostic]) -> Result<(), Diagnostic> {
    match diagnostics.first() {
        Some(d) => Err(d.clone()),
        None => Ok(()),
    }
}
