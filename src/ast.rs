// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::lexer::*;

use core::fmt;

/// An identifier together with where it was written.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub struct Name {
    pub span: Span,
    pub name: String,
}

impl Name {
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub enum LiteralValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl LiteralValue {
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s:?}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub struct Literal {
    pub span: Span,
    pub value: LiteralValue,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub struct Version {
    pub span: Span,
    pub number: i64,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub struct Comment {
    pub span: Span,
    pub text: String,
    /// `/* */` rather than `//`.
    pub block: bool,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub struct Docstring {
    pub span: Span,
    pub value: String,
}

impl Docstring {
    /// Path of the markdown file this docstring refers to, if it is a single
    /// line ending in `suffix`.
    pub fn external_path(&self, suffix: &str) -> Option<&str> {
        let value = self.value.trim();
        if !value.is_empty() && !value.contains('\n') && value.ends_with(suffix) {
            Some(value)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub struct Deprecation {
    pub span: Span,
    #[cfg_attr(feature = "ast", serde(skip_serializing_if = "Option::is_none"))]
    pub message: Option<String>,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub struct Import {
    pub span: Span,
    pub path: String,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub struct RuleFor {
    pub span: Span,
    pub target: Name,
    pub is_array: bool,
}

impl RuleFor {
    pub fn target_display(&self) -> String {
        match self.is_array {
            true => format!("{}[]", self.target),
            false => self.target.name.clone(),
        }
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub struct RuleParam {
    pub span: Span,
    pub ty: Name,
    pub is_array: bool,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub struct RuleError {
    pub span: Span,
    pub message: String,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub enum RuleChild {
    For(RuleFor),
    Param(RuleParam),
    Error(RuleError),
    Comment(Comment),
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub struct RuleDecl {
    pub span: Span,
    pub name: Name,
    #[cfg_attr(feature = "ast", serde(skip_serializing_if = "Option::is_none"))]
    pub docstring: Option<Docstring>,
    #[cfg_attr(feature = "ast", serde(skip_serializing_if = "Option::is_none"))]
    pub deprecation: Option<Deprecation>,
    pub children: Vec<RuleChild>,
}

impl RuleDecl {
    pub fn for_clauses(&self) -> impl Iterator<Item = &RuleFor> {
        self.children.iter().filter_map(|c| match c {
            RuleChild::For(f) => Some(f),
            _ => None,
        })
    }

    pub fn param_clauses(&self) -> impl Iterator<Item = &RuleParam> {
        self.children.iter().filter_map(|c| match c {
            RuleChild::Param(p) => Some(p),
            _ => None,
        })
    }

    pub fn error_clauses(&self) -> impl Iterator<Item = &RuleError> {
        self.children.iter().filter_map(|c| match c {
            RuleChild::Error(e) => Some(e),
            _ => None,
        })
    }

    pub fn for_clause(&self) -> Option<&RuleFor> {
        self.for_clauses().next()
    }

    pub fn param(&self) -> Option<&RuleParam> {
        self.param_clauses().next()
    }

    pub fn error(&self) -> Option<&RuleError> {
        self.error_clauses().next()
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub enum FieldRuleParam {
    Single(Literal),
    Array { span: Span, items: Vec<Literal> },
}

impl FieldRuleParam {
    pub const fn span(&self) -> &Span {
        match self {
            Self::Single(l) => &l.span,
            Self::Array { span, .. } => span,
        }
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub struct FieldRule {
    pub span: Span,
    pub name: Name,
    #[cfg_attr(feature = "ast", serde(skip_serializing_if = "Option::is_none"))]
    pub param: Option<FieldRuleParam>,
    #[cfg_attr(feature = "ast", serde(skip_serializing_if = "Option::is_none"))]
    pub error: Option<RuleError>,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub enum FieldTypeBase {
    Named(Name),
    Object(Vec<FieldOrComment>),
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub struct FieldType {
    pub span: Span,
    pub base: FieldTypeBase,
    pub is_array: bool,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.base {
            FieldTypeBase::Named(n) => f.write_str(&n.name)?,
            FieldTypeBase::Object(_) => f.write_str("object")?,
        }
        if self.is_array {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub struct Field {
    pub span: Span,
    #[cfg_attr(feature = "ast", serde(skip_serializing_if = "Option::is_none"))]
    pub docstring: Option<Docstring>,
    pub name: Name,
    pub optional: bool,
    pub ty: FieldType,
    #[cfg_attr(feature = "ast", serde(skip_serializing_if = "Vec::is_empty"))]
    pub rules: Vec<FieldRule>,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub enum FieldOrComment {
    Field(Field),
    Comment(Comment),
    /// A docstring not followed by a field on the next line.
    Docstring(Docstring),
}

/// Fields of a field list, skipping comments.
pub fn fields(children: &[FieldOrComment]) -> impl Iterator<Item = &Field> {
    children.iter().filter_map(|c| match c {
        FieldOrComment::Field(f) => Some(f),
        FieldOrComment::Comment(_) | FieldOrComment::Docstring(_) => None,
    })
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub struct TypeDecl {
    pub span: Span,
    pub name: Name,
    #[cfg_attr(feature = "ast", serde(skip_serializing_if = "Option::is_none"))]
    pub docstring: Option<Docstring>,
    #[cfg_attr(feature = "ast", serde(skip_serializing_if = "Option::is_none"))]
    pub deprecation: Option<Deprecation>,
    pub children: Vec<FieldOrComment>,
}

impl TypeDecl {
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        fields(&self.children)
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub struct FieldBlock {
    pub span: Span,
    pub children: Vec<FieldOrComment>,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub struct MetaEntry {
    pub span: Span,
    pub key: Name,
    pub value: Literal,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub enum MetaChild {
    Entry(MetaEntry),
    Comment(Comment),
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub struct MetaBlock {
    pub span: Span,
    pub children: Vec<MetaChild>,
}

impl MetaBlock {
    pub fn entries(&self) -> impl Iterator<Item = &MetaEntry> {
        self.children.iter().filter_map(|c| match c {
            MetaChild::Entry(e) => Some(e),
            MetaChild::Comment(_) => None,
        })
    }

    pub fn get(&self, key: &str) -> Option<&Literal> {
        self.entries()
            .find(|e| e.key.name == key)
            .map(|e| &e.value)
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub enum ProcChild {
    Input(FieldBlock),
    Output(FieldBlock),
    Meta(MetaBlock),
    Comment(Comment),
}

/// A `proc` or a `stream`. Both share the same shape; `SchemaChild` tells
/// them apart.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub struct ProcDecl {
    pub span: Span,
    pub name: Name,
    #[cfg_attr(feature = "ast", serde(skip_serializing_if = "Option::is_none"))]
    pub docstring: Option<Docstring>,
    #[cfg_attr(feature = "ast", serde(skip_serializing_if = "Option::is_none"))]
    pub deprecation: Option<Deprecation>,
    pub children: Vec<ProcChild>,
}

pub type StreamDecl = ProcDecl;

impl ProcDecl {
    pub fn input(&self) -> Option<&FieldBlock> {
        self.children.iter().find_map(|c| match c {
            ProcChild::Input(b) => Some(b),
            _ => None,
        })
    }

    pub fn output(&self) -> Option<&FieldBlock> {
        self.children.iter().find_map(|c| match c {
            ProcChild::Output(b) => Some(b),
            _ => None,
        })
    }

    pub fn meta(&self) -> Option<&MetaBlock> {
        self.children.iter().find_map(|c| match c {
            ProcChild::Meta(m) => Some(m),
            _ => None,
        })
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub enum SchemaChild {
    Version(Version),
    Comment(Comment),
    Docstring(Docstring),
    Rule(RuleDecl),
    Type(TypeDecl),
    Proc(ProcDecl),
    Stream(StreamDecl),
    Import(Import),
}

impl SchemaChild {
    pub const fn span(&self) -> &Span {
        match self {
            Self::Version(v) => &v.span,
            Self::Comment(c) => &c.span,
            Self::Docstring(d) => &d.span,
            Self::Rule(r) => &r.span,
            Self::Type(t) => &t.span,
            Self::Proc(p) | Self::Stream(p) => &p.span,
            Self::Import(i) => &i.span,
        }
    }

    /// Name of the declared item for rules, types, procs and streams.
    pub fn decl_name(&self) -> Option<&Name> {
        match self {
            Self::Rule(r) => Some(&r.name),
            Self::Type(t) => Some(&t.name),
            Self::Proc(p) | Self::Stream(p) => Some(&p.name),
            _ => None,
        }
    }

    /// Comments and docstrings don't count as declarations.
    pub const fn is_declaration(&self) -> bool {
        !matches!(self, Self::Comment(_) | Self::Docstring(_))
    }
}

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub struct Schema {
    pub children: Vec<SchemaChild>,
}

impl Schema {
    pub fn rules(&self) -> impl Iterator<Item = &RuleDecl> {
        self.children.iter().filter_map(|c| match c {
            SchemaChild::Rule(r) => Some(r),
            _ => None,
        })
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeDecl> {
        self.children.iter().filter_map(|c| match c {
            SchemaChild::Type(t) => Some(t),
            _ => None,
        })
    }

    pub fn procs(&self) -> impl Iterator<Item = &ProcDecl> {
        self.children.iter().filter_map(|c| match c {
            SchemaChild::Proc(p) => Some(p),
            _ => None,
        })
    }

    pub fn streams(&self) -> impl Iterator<Item = &StreamDecl> {
        self.children.iter().filter_map(|c| match c {
            SchemaChild::Stream(s) => Some(s),
            _ => None,
        })
    }

    pub fn imports(&self) -> impl Iterator<Item = &Import> {
        self.children.iter().filter_map(|c| match c {
            SchemaChild::Import(i) => Some(i),
            _ => None,
        })
    }

    /// Call `f` on every docstring in the tree: standalone ones, those of
    /// declarations and those of fields at any depth.
    pub fn for_each_docstring_mut(&mut self, f: &mut impl FnMut(&mut Docstring)) {
        for child in &mut self.children {
            match child {
                SchemaChild::Docstring(d) => f(d),
                SchemaChild::Rule(r) => {
                    if let Some(d) = &mut r.docstring {
                        f(d);
                    }
                }
                SchemaChild::Type(t) => {
                    if let Some(d) = &mut t.docstring {
                        f(d);
                    }
                    field_docstrings_mut(&mut t.children, f);
                }
                SchemaChild::Proc(p) | SchemaChild::Stream(p) => {
                    if let Some(d) = &mut p.docstring {
                        f(d);
                    }
                    for c in &mut p.children {
                        if let ProcChild::Input(b) | ProcChild::Output(b) = c {
                            field_docstrings_mut(&mut b.children, f);
                        }
                    }
                }
                SchemaChild::Version(_) | SchemaChild::Comment(_) | SchemaChild::Import(_) => (),
            }
        }
    }
}

fn field_docstrings_mut(children: &mut [FieldOrComment], f: &mut impl FnMut(&mut Docstring)) {
    for child in children {
        match child {
            FieldOrComment::Field(field) => {
                if let Some(d) = &mut field.docstring {
                    f(d);
                }
                if let FieldTypeBase::Object(nested) = &mut field.ty.base {
                    field_docstrings_mut(nested, f);
                }
            }
            FieldOrComment::Docstring(d) => f(d),
            FieldOrComment::Comment(_) => (),
        }
    }
}
