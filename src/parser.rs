// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ast::*;
use crate::lexer::*;
use crate::token::*;

use std::collections::VecDeque;

/// A grammar violation. Parsing stops at the first one.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{span}: {message}")]
pub struct ParseError {
    pub span: Span,
    pub message: String,
}

impl ParseError {
    pub fn render(&self) -> String {
        self.span.message("error", &self.message)
    }
}

pub type ParseResult<T> = core::result::Result<T, ParseError>;

/// Number of significant tokens the parser can look at without consuming.
pub const LOOKAHEAD: usize = 4;

#[derive(Clone)]
struct Buffered {
    tok: Token,
    // Newline tokens dropped right before `tok`.
    newlines: u32,
}

#[derive(Clone)]
pub struct Parser<'source> {
    source: Source,
    lexer: Lexer<'source>,
    buffer: VecDeque<Buffered>,
    // End of the last consumed token.
    last: Position,
}

/// Parse the contents of one schema file.
pub fn parse(filename: &str, contents: &str) -> ParseResult<Schema> {
    let source = Source::new(filename.to_string(), contents.to_string());
    Parser::new(&source).parse()
}

/// Undo the `\"` and `\\` escapes of a string literal.
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(ch) = chars.next() {
        match (ch, chars.peek()) {
            ('\\', Some(&c)) if c == '"' || c == '\\' => {
                out.push(c);
                chars.next();
            }
            _ => out.push(ch),
        }
    }
    out
}

fn is_name_like(kind: TokenKind) -> bool {
    kind == TokenKind::Ident || kind.is_keyword()
}

impl<'source> Parser<'source> {
    pub fn new(source: &'source Source) -> Self {
        let mut parser = Self {
            source: source.clone(),
            lexer: Lexer::new(source),
            buffer: VecDeque::with_capacity(LOOKAHEAD),
            last: Position::default(),
        };
        parser.fill();
        parser
    }

    fn fill(&mut self) {
        while self.buffer.len() < LOOKAHEAD {
            let mut newlines = 0;
            let tok = loop {
                let tok = self.lexer.next_token();
                if tok.kind != TokenKind::Newline {
                    break tok;
                }
                newlines += 1;
            };
            self.buffer.push_back(Buffered { tok, newlines });
        }
    }

    fn peek(&self, n: usize) -> &Token {
        debug_assert!(n < LOOKAHEAD);
        &self.buffer[n].tok
    }

    fn kind(&self, n: usize) -> TokenKind {
        self.peek(n).kind
    }

    fn newlines_before(&self, n: usize) -> u32 {
        self.buffer[n].newlines
    }

    fn tok(&self) -> &Token {
        self.peek(0)
    }

    fn next_token(&mut self) -> Token {
        let tok = match self.buffer.pop_front() {
            Some(b) => b.tok,
            None => self.lexer.next_token(),
        };
        self.last = tok.span.end;
        self.fill();
        tok
    }

    fn span_from(&self, start: &Span) -> Span {
        Span::new(self.source.clone(), start.start, self.last)
    }

    fn error_at(&self, span: &Span, msg: impl Into<String>) -> ParseError {
        ParseError {
            span: span.clone(),
            message: msg.into(),
        }
    }

    fn unexpected(&self, expecting: &str) -> ParseError {
        let tok = self.tok();
        let message = match tok.kind {
            TokenKind::Illegal => tok.describe(),
            _ => format!("unexpected {}, expecting {expecting}", tok.describe()),
        };
        self.error_at(&tok.span, message)
    }

    fn expect(&mut self, kind: TokenKind, context: &str) -> ParseResult<Token> {
        if self.kind(0) == kind {
            Ok(self.next_token())
        } else {
            let expecting = match context {
                "" => kind.to_string(),
                _ => format!("{kind} {context}"),
            };
            Err(self.unexpected(&expecting))
        }
    }

    fn parse_int(&self, tok: &Token) -> ParseResult<i64> {
        tok.literal
            .parse::<i64>()
            .map_err(|_| self.error_at(&tok.span, "integer literal out of range"))
    }

    fn parse_ident(&mut self, context: &str) -> ParseResult<Name> {
        let tok = self.expect(TokenKind::Ident, context)?;
        Ok(Name {
            span: tok.span,
            name: tok.literal,
        })
    }

    // Field names and meta keys may also be keywords.
    fn parse_name(&mut self, context: &str) -> ParseResult<Name> {
        if !is_name_like(self.kind(0)) {
            return Err(self.unexpected(&format!("identifier {context}")));
        }
        let tok = self.next_token();
        Ok(Name {
            span: tok.span,
            name: tok.literal,
        })
    }

    fn parse_type_name(&mut self) -> ParseResult<Name> {
        let kind = self.kind(0);
        if kind != TokenKind::Ident && !kind.is_primitive() {
            return Err(self.unexpected("a type name"));
        }
        let tok = self.next_token();
        Ok(Name {
            span: tok.span,
            name: tok.literal,
        })
    }

    fn parse_array_suffix(&mut self) -> ParseResult<bool> {
        if self.kind(0) != TokenKind::LBracket {
            return Ok(false);
        }
        self.next_token();
        self.expect(TokenKind::RBracket, "to close array type")?;
        Ok(true)
    }

    fn parse_string(&mut self, context: &str) -> ParseResult<(Token, String)> {
        let tok = self.expect(TokenKind::StringLiteral, context)?;
        let value = unescape(&tok.literal);
        Ok((tok, value))
    }

    fn parse_comment(&mut self) -> Comment {
        let tok = self.next_token();
        Comment {
            block: tok.kind == TokenKind::CommentBlock,
            span: tok.span,
            text: tok.literal,
        }
    }

    fn parse_docstring(&mut self) -> Docstring {
        let tok = self.next_token();
        Docstring {
            span: tok.span,
            value: tok.literal,
        }
    }

    pub fn parse_literal(&mut self) -> ParseResult<Literal> {
        let value = match self.kind(0) {
            TokenKind::StringLiteral => LiteralValue::String(unescape(&self.tok().literal)),
            TokenKind::IntLiteral => LiteralValue::Int(self.parse_int(self.tok())?),
            TokenKind::FloatLiteral => {
                let tok = self.tok();
                let v = tok
                    .literal
                    .parse::<f64>()
                    .map_err(|_| self.error_at(&tok.span, "invalid float literal"))?;
                LiteralValue::Float(v)
            }
            TokenKind::TrueLiteral => LiteralValue::Bool(true),
            TokenKind::FalseLiteral => LiteralValue::Bool(false),
            _ => return Err(self.unexpected("a literal")),
        };
        let tok = self.next_token();
        Ok(Literal {
            span: tok.span,
            value,
        })
    }

    fn parse_version(&mut self) -> ParseResult<Version> {
        let kw = self.next_token();
        let tok = self.expect(TokenKind::IntLiteral, "after `version`")?;
        let number = self.parse_int(&tok)?;
        Ok(Version {
            span: self.span_from(&kw.span),
            number,
        })
    }

    fn parse_import(&mut self) -> ParseResult<Import> {
        let kw = self.next_token();
        let (_, path) = self.parse_string("after `import`")?;
        Ok(Import {
            span: self.span_from(&kw.span),
            path,
        })
    }

    fn parse_deprecation(&mut self) -> ParseResult<Deprecation> {
        let kw = self.next_token();
        let mut message = None;
        if self.kind(0) == TokenKind::LParen {
            self.next_token();
            let (_, msg) = self.parse_string("as deprecation message")?;
            message = Some(msg);
            self.expect(TokenKind::RParen, "after deprecation message")?;
        }
        Ok(Deprecation {
            span: self.span_from(&kw.span),
            message,
        })
    }

    // A docstring belongs to the declaration right after it unless a blank
    // line separates the two.
    fn docstring_attaches(&self) -> bool {
        self.kind(1).starts_declaration() && self.newlines_before(1) < 2
    }

    fn parse_declaration(&mut self, docstring: Option<Docstring>) -> ParseResult<SchemaChild> {
        let start = self.tok().span.clone();
        let deprecation = match self.kind(0) {
            TokenKind::Deprecated => Some(self.parse_deprecation()?),
            _ => None,
        };

        match self.kind(0) {
            TokenKind::Rule => Ok(SchemaChild::Rule(
                self.parse_rule(&start, docstring, deprecation)?,
            )),
            TokenKind::Type => Ok(SchemaChild::Type(
                self.parse_type(&start, docstring, deprecation)?,
            )),
            TokenKind::Proc => Ok(SchemaChild::Proc(
                self.parse_proc(&start, docstring, deprecation)?,
            )),
            TokenKind::Stream => Ok(SchemaChild::Stream(
                self.parse_proc(&start, docstring, deprecation)?,
            )),
            _ => Err(self.unexpected("`rule`, `type`, `proc` or `stream`")),
        }
    }

    fn parse_rule(
        &mut self,
        start: &Span,
        docstring: Option<Docstring>,
        deprecation: Option<Deprecation>,
    ) -> ParseResult<RuleDecl> {
        self.expect(TokenKind::Rule, "")?;
        self.expect(TokenKind::At, "before rule name")?;
        let name = self.parse_ident("as rule name")?;
        self.expect(TokenKind::LBrace, "to open rule body")?;

        let mut children = vec![];
        loop {
            let child = match self.kind(0) {
                TokenKind::RBrace => break,
                TokenKind::Comment | TokenKind::CommentBlock => {
                    RuleChild::Comment(self.parse_comment())
                }
                TokenKind::For => {
                    let kw = self.next_token();
                    self.expect(TokenKind::Colon, "after `for`")?;
                    let target = self.parse_type_name()?;
                    let is_array = self.parse_array_suffix()?;
                    RuleChild::For(RuleFor {
                        span: self.span_from(&kw.span),
                        target,
                        is_array,
                    })
                }
                TokenKind::Param => {
                    let kw = self.next_token();
                    self.expect(TokenKind::Colon, "after `param`")?;
                    let ty = self.parse_type_name()?;
                    let is_array = self.parse_array_suffix()?;
                    RuleChild::Param(RuleParam {
                        span: self.span_from(&kw.span),
                        ty,
                        is_array,
                    })
                }
                TokenKind::Error => RuleChild::Error(self.parse_error_clause()?),
                _ => return Err(self.unexpected("`for`, `param`, `error` or `}` in rule body")),
            };
            children.push(child);
        }
        self.expect(TokenKind::RBrace, "to close rule body")?;

        Ok(RuleDecl {
            span: self.span_from(start),
            name,
            docstring,
            deprecation,
            children,
        })
    }

    // `error: "message"`, both in rule bodies and in field rule arguments.
    fn parse_error_clause(&mut self) -> ParseResult<RuleError> {
        let kw = self.expect(TokenKind::Error, "")?;
        self.expect(TokenKind::Colon, "after `error`")?;
        let (_, message) = self.parse_string("as error message")?;
        Ok(RuleError {
            span: self.span_from(&kw.span),
            message,
        })
    }

    fn parse_type(
        &mut self,
        start: &Span,
        docstring: Option<Docstring>,
        deprecation: Option<Deprecation>,
    ) -> ParseResult<TypeDecl> {
        self.expect(TokenKind::Type, "")?;
        let name = self.parse_ident("as type name")?;
        self.expect(TokenKind::LBrace, "to open type body")?;
        let children = self.parse_field_list()?;
        self.expect(TokenKind::RBrace, "to close type body")?;

        Ok(TypeDecl {
            span: self.span_from(start),
            name,
            docstring,
            deprecation,
            children,
        })
    }

    /// Fields and comments up to (not including) the closing `}`.
    fn parse_field_list(&mut self) -> ParseResult<Vec<FieldOrComment>> {
        let mut children = vec![];
        loop {
            let child = match self.kind(0) {
                TokenKind::RBrace => break,
                TokenKind::Comment | TokenKind::CommentBlock => {
                    FieldOrComment::Comment(self.parse_comment())
                }
                TokenKind::Docstring => {
                    let docstring = self.parse_docstring();
                    // Same attachment rule as for declarations.
                    if is_name_like(self.kind(0)) && self.newlines_before(0) < 2 {
                        FieldOrComment::Field(self.parse_field(Some(docstring))?)
                    } else {
                        FieldOrComment::Docstring(docstring)
                    }
                }
                kind if is_name_like(kind) => FieldOrComment::Field(self.parse_field(None)?),
                _ => return Err(self.unexpected("a field or `}`")),
            };
            children.push(child);
        }
        Ok(children)
    }

    fn parse_field(&mut self, docstring: Option<Docstring>) -> ParseResult<Field> {
        let name = self.parse_name("as field name")?;
        let optional = if self.kind(0) == TokenKind::Question {
            self.next_token();
            true
        } else {
            false
        };
        self.expect(TokenKind::Colon, "after field name")?;
        let ty = self.parse_field_type()?;
        // `name: Type?` is the same as `name?: Type`.
        let optional = if self.kind(0) == TokenKind::Question {
            self.next_token();
            true
        } else {
            optional
        };

        let mut rules = vec![];
        while self.kind(0) == TokenKind::At {
            rules.push(self.parse_field_rule()?);
        }

        Ok(Field {
            span: self.span_from(&name.span),
            docstring,
            name,
            optional,
            ty,
            rules,
        })
    }

    fn parse_field_type(&mut self) -> ParseResult<FieldType> {
        let start = self.tok().span.clone();
        let base = match self.kind(0) {
            TokenKind::LBrace => {
                self.next_token();
                let children = self.parse_field_list()?;
                self.expect(TokenKind::RBrace, "to close inline object")?;
                FieldTypeBase::Object(children)
            }
            kind if kind == TokenKind::Ident || kind.is_primitive() => {
                FieldTypeBase::Named(self.parse_type_name()?)
            }
            _ => return Err(self.unexpected("a type or `{`")),
        };
        let is_array = self.parse_array_suffix()?;

        Ok(FieldType {
            span: self.span_from(&start),
            base,
            is_array,
        })
    }

    fn parse_field_rule(&mut self) -> ParseResult<FieldRule> {
        let at = self.expect(TokenKind::At, "")?;
        let name = self.parse_ident("as rule name")?;
        let mut param = None;
        let mut error = None;

        if self.kind(0) == TokenKind::LParen {
            self.next_token();
            if self.kind(0) == TokenKind::Error && self.kind(1) == TokenKind::Colon {
                error = Some(self.parse_error_clause()?);
            } else if self.kind(0) != TokenKind::RParen {
                param = Some(self.parse_rule_param()?);
                if self.kind(0) == TokenKind::Comma {
                    self.next_token();
                    error = Some(self.parse_error_clause()?);
                }
            }
            self.expect(TokenKind::RParen, "to close rule arguments")?;
        }

        Ok(FieldRule {
            span: self.span_from(&at.span),
            name,
            param,
            error,
        })
    }

    fn parse_rule_param(&mut self) -> ParseResult<FieldRuleParam> {
        if self.kind(0) != TokenKind::LBracket {
            return Ok(FieldRuleParam::Single(self.parse_literal()?));
        }

        let open = self.next_token();
        let mut items: Vec<Literal> = vec![];
        while self.kind(0) != TokenKind::RBracket {
            let item = self.parse_literal()?;
            if let Some(first) = items.first() {
                if first.value.kind_name() != item.value.kind_name() {
                    return Err(self.error_at(
                        &item.span,
                        format!(
                            "array items must all have the same type, expected {} but found {}",
                            first.value.kind_name(),
                            item.value.kind_name()
                        ),
                    ));
                }
            }
            items.push(item);
            if self.kind(0) != TokenKind::Comma {
                break;
            }
            self.next_token();
        }
        self.expect(TokenKind::RBracket, "to close array literal")?;

        Ok(FieldRuleParam::Array {
            span: self.span_from(&open.span),
            items,
        })
    }

    fn parse_proc(
        &mut self,
        start: &Span,
        docstring: Option<Docstring>,
        deprecation: Option<Deprecation>,
    ) -> ParseResult<ProcDecl> {
        let kw = self.next_token();
        let context = match kw.kind {
            TokenKind::Stream => "as stream name",
            _ => "as proc name",
        };
        let name = self.parse_ident(context)?;
        self.expect(TokenKind::LBrace, "to open declaration body")?;

        let mut children = vec![];
        loop {
            let child = match self.kind(0) {
                TokenKind::RBrace => break,
                TokenKind::Comment | TokenKind::CommentBlock => {
                    ProcChild::Comment(self.parse_comment())
                }
                TokenKind::Input => ProcChild::Input(self.parse_field_block()?),
                TokenKind::Output => ProcChild::Output(self.parse_field_block()?),
                TokenKind::Meta => ProcChild::Meta(self.parse_meta_block()?),
                _ => return Err(self.unexpected("`input`, `output`, `meta` or `}`")),
            };
            children.push(child);
        }
        self.expect(TokenKind::RBrace, "to close declaration body")?;

        Ok(ProcDecl {
            span: self.span_from(start),
            name,
            docstring,
            deprecation,
            children,
        })
    }

    fn parse_field_block(&mut self) -> ParseResult<FieldBlock> {
        let kw = self.next_token();
        self.expect(TokenKind::LBrace, &format!("after `{}`", kw.literal))?;
        let children = self.parse_field_list()?;
        self.expect(TokenKind::RBrace, &format!("to close `{}` block", kw.literal))?;
        Ok(FieldBlock {
            span: self.span_from(&kw.span),
            children,
        })
    }

    fn parse_meta_block(&mut self) -> ParseResult<MetaBlock> {
        let kw = self.next_token();
        self.expect(TokenKind::LBrace, "after `meta`")?;

        let mut children = vec![];
        loop {
            let child = match self.kind(0) {
                TokenKind::RBrace => break,
                TokenKind::Comment | TokenKind::CommentBlock => {
                    MetaChild::Comment(self.parse_comment())
                }
                kind if is_name_like(kind) => {
                    let key = self.parse_name("as meta key")?;
                    self.expect(TokenKind::Colon, "after meta key")?;
                    let value = self.parse_literal()?;
                    MetaChild::Entry(MetaEntry {
                        span: key.span.to(&value.span),
                        key,
                        value,
                    })
                }
                _ => return Err(self.unexpected("a meta entry or `}`")),
            };
            children.push(child);
        }
        self.expect(TokenKind::RBrace, "to close `meta` block")?;

        Ok(MetaBlock {
            span: self.span_from(&kw.span),
            children,
        })
    }

    pub fn parse(&mut self) -> ParseResult<Schema> {
        let mut children = vec![];
        loop {
            let child = match self.kind(0) {
                TokenKind::Eof => break,
                TokenKind::Version => SchemaChild::Version(self.parse_version()?),
                TokenKind::Import => SchemaChild::Import(self.parse_import()?),
                TokenKind::Comment | TokenKind::CommentBlock => {
                    SchemaChild::Comment(self.parse_comment())
                }
                TokenKind::Docstring if self.docstring_attaches() => {
                    let docstring = self.parse_docstring();
                    self.parse_declaration(Some(docstring))?
                }
                TokenKind::Docstring => SchemaChild::Docstring(self.parse_docstring()),
                kind if kind.starts_declaration() => self.parse_declaration(None)?,
                _ => return Err(self.unexpected("a declaration")),
            };
            children.push(child);
        }
        Ok(Schema { children })
    }
}
