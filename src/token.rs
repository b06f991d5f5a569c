// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::lexer::Span;

use core::fmt;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub enum TokenKind {
    Eof,
    Illegal,

    // Literals
    Ident,
    StringLiteral,
    IntLiteral,
    FloatLiteral,
    TrueLiteral,
    FalseLiteral,
    Docstring,

    // Comments
    Comment,
    CommentBlock,

    Newline,

    // Delimiters
    Colon,
    Comma,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    At,
    Question,

    // Keywords
    Version,
    Import,
    Deprecated,
    Rule,
    Type,
    Extends,
    Proc,
    Input,
    Output,
    Meta,
    Error,
    For,
    Param,
    String,
    Int,
    Float,
    Bool,
    Datetime,
    Stream,
}

/// Names of the built-in scalar types, in the order they are reported.
pub const PRIMITIVE_TYPES: [&str; 5] = ["string", "int", "float", "bool", "datetime"];

pub fn is_primitive_type(name: &str) -> bool {
    PRIMITIVE_TYPES.contains(&name)
}

impl TokenKind {
    pub const fn from_delimiter(ch: char) -> Option<TokenKind> {
        Some(match ch {
            ':' => Self::Colon,
            ',' => Self::Comma,
            '(' => Self::LParen,
            ')' => Self::RParen,
            '{' => Self::LBrace,
            '}' => Self::RBrace,
            '[' => Self::LBracket,
            ']' => Self::RBracket,
            '@' => Self::At,
            '?' => Self::Question,
            '\n' => Self::Newline,
            _ => return None,
        })
    }

    /// Keyword table. `true` and `false` map to literal kinds.
    pub fn from_keyword(ident: &str) -> Option<TokenKind> {
        Some(match ident {
            "version" => Self::Version,
            "import" => Self::Import,
            "deprecated" => Self::Deprecated,
            "rule" => Self::Rule,
            "type" => Self::Type,
            "extends" => Self::Extends,
            "proc" => Self::Proc,
            "input" => Self::Input,
            "output" => Self::Output,
            "meta" => Self::Meta,
            "error" => Self::Error,
            "for" => Self::For,
            "param" => Self::Param,
            "string" => Self::String,
            "int" => Self::Int,
            "float" => Self::Float,
            "bool" => Self::Bool,
            "datetime" => Self::Datetime,
            "stream" => Self::Stream,
            "true" => Self::TrueLiteral,
            "false" => Self::FalseLiteral,
            _ => return None,
        })
    }

    pub const fn is_keyword(self) -> bool {
        matches!(
            self,
            Self::Version
                | Self::Import
                | Self::Deprecated
                | Self::Rule
                | Self::Type
                | Self::Extends
                | Self::Proc
                | Self::Input
                | Self::Output
                | Self::Meta
                | Self::Error
                | Self::For
                | Self::Param
                | Self::String
                | Self::Int
                | Self::Float
                | Self::Bool
                | Self::Datetime
                | Self::Stream
        )
    }

    pub const fn is_primitive(self) -> bool {
        matches!(
            self,
            Self::String | Self::Int | Self::Float | Self::Bool | Self::Datetime
        )
    }

    pub const fn is_comment(self) -> bool {
        matches!(self, Self::Comment | Self::CommentBlock)
    }

    /// Tokens that start a top-level declaration a docstring can attach to.
    pub const fn starts_declaration(self) -> bool {
        matches!(
            self,
            Self::Deprecated | Self::Rule | Self::Type | Self::Proc | Self::Stream
        )
    }

    /// Human readable description used in parse errors.
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Eof => "end of file",
            Self::Illegal => "illegal token",
            Self::Ident => "identifier",
            Self::StringLiteral => "string literal",
            Self::IntLiteral => "integer literal",
            Self::FloatLiteral => "float literal",
            Self::TrueLiteral => "`true`",
            Self::FalseLiteral => "`false`",
            Self::Docstring => "docstring",
            Self::Comment | Self::CommentBlock => "comment",
            Self::Newline => "newline",
            Self::Colon => "`:`",
            Self::Comma => "`,`",
            Self::LParen => "`(`",
            Self::RParen => "`)`",
            Self::LBrace => "`{`",
            Self::RBrace => "`}`",
            Self::LBracket => "`[`",
            Self::RBracket => "`]`",
            Self::At => "`@`",
            Self::Question => "`?`",
            Self::Version => "`version`",
            Self::Import => "`import`",
            Self::Deprecated => "`deprecated`",
            Self::Rule => "`rule`",
            Self::Type => "`type`",
            Self::Extends => "`extends`",
            Self::Proc => "`proc`",
            Self::Input => "`input`",
            Self::Output => "`output`",
            Self::Meta => "`meta`",
            Self::Error => "`error`",
            Self::For => "`for`",
            Self::Param => "`param`",
            Self::String => "`string`",
            Self::Int => "`int`",
            Self::Float => "`float`",
            Self::Bool => "`bool`",
            Self::Datetime => "`datetime`",
            Self::Stream => "`stream`",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            literal: literal.into(),
            span,
        }
    }

    /// Description of the token as it should appear in a parse error.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of file".to_string(),
            TokenKind::Illegal if self.literal.starts_with("\"\"\"") => {
                "unterminated docstring".to_string()
            }
            TokenKind::Illegal if self.literal.starts_with('"') => {
                "unterminated string literal".to_string()
            }
            TokenKind::Illegal if self.literal.starts_with("/*") => {
                "unterminated block comment".to_string()
            }
            TokenKind::Illegal => format!("illegal character `{}`", self.literal.escape_debug()),
            TokenKind::StringLiteral => format!("string \"{}\"", self.literal),
            TokenKind::Docstring => "docstring".to_string(),
            TokenKind::Comment | TokenKind::CommentBlock => "comment".to_string(),
            _ => format!("`{}`", self.literal),
        }
    }
}
