// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::token::{Token, TokenKind};

use core::cmp;
use core::fmt::{self, Debug, Formatter};
use core::iter::Peekable;
use core::ops::Range;
use core::str::CharIndices;
use std::rc::Rc;

#[derive(Clone)]
struct SourceInternal {
    pub file: String,
    pub contents: String,
    pub lines: Vec<(u32, u32)>,
}

/// A schema file's text, shared by every token and node parsed from it.
#[derive(Clone)]
pub struct Source {
    src: Rc<SourceInternal>,
}

impl cmp::PartialEq for Source {
    fn eq(&self, other: &Source) -> bool {
        Rc::ptr_eq(&self.src, &other.src)
    }
}

impl cmp::Eq for Source {}

impl Debug for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        self.src.file.fmt(f)
    }
}

impl Source {
    pub fn new(file: String, contents: String) -> Source {
        let mut lines = vec![];
        let mut prev_ch = ' ';
        let mut prev_pos = 0u32;
        let mut start = 0u32;
        for (i, ch) in contents.char_indices() {
            if ch == '\n' {
                let end = match prev_ch {
                    '\r' => prev_pos,
                    _ => i as u32,
                };
                lines.push((start, end));
                start = i as u32 + 1;
            }
            prev_ch = ch;
            prev_pos = i as u32;
        }

        if (start as usize) < contents.len() || contents.is_empty() {
            lines.push((start, contents.len() as u32));
        } else {
            let s = contents.len() as u32;
            lines.push((s, s));
        }
        Self {
            src: Rc::new(SourceInternal {
                file,
                contents,
                lines,
            }),
        }
    }

    /// Read a source file from disk.
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Source> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(Self::new(path.to_string_lossy().into_owned(), contents)),
            Err(e) => anyhow::bail!("failed to read {}: {e}", path.display()),
        }
    }

    pub fn file(&self) -> &str {
        &self.src.file
    }

    pub fn contents(&self) -> &str {
        &self.src.contents
    }

    /// Line `idx` (0-based) without its terminator.
    pub fn line(&self, idx: u32) -> &str {
        let idx = idx as usize;
        if idx < self.src.lines.len() {
            let (start, end) = self.src.lines[idx];
            &self.src.contents[start as usize..end as usize]
        } else {
            ""
        }
    }

    /// Render `msg` with the offending line and a caret under `col`.
    pub fn message(&self, line: u32, col: u32, kind: &str, msg: &str) -> String {
        if line == 0 || line as usize > self.src.lines.len() {
            return format!("{}: invalid line {} specified", self.src.file, line);
        }

        let line_str = format!("{line}");
        let line_num_width = line_str.len() + 1;
        let col_spaces = col.saturating_sub(1) as usize;

        format!(
            "\n--> {}:{}:{}\n{:<line_num_width$}|\n\
		{:<line_num_width$}| {}\n\
		{:<line_num_width$}| {:<col_spaces$}^\n\
		{}: {}",
            self.src.file,
            line,
            col,
            "",
            line,
            self.line(line - 1),
            "",
            "",
            kind,
            msg
        )
    }
}

/// A location in a source. Lines and columns start at 1, columns count
/// characters and `offset` counts bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "ast", derive(serde::Serialize))]
pub struct Position {
    pub line: u32,
    pub col: u32,
    pub offset: u32,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            line: 1,
            col: 1,
            offset: 0,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Source range. `end` is the position of the last character covered, so a
/// one character token has `start == end`. Zero-width spans (end of file)
/// also have `start == end` and sit at the end of the contents.
#[derive(Clone)]
pub struct Span {
    pub source: Source,
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(source: Source, start: Position, end: Position) -> Self {
        Self { source, start, end }
    }

    /// Zero-width span at the start of `source`.
    pub fn start_of(source: &Source) -> Self {
        Self::new(source.clone(), Position::default(), Position::default())
    }

    pub fn file(&self) -> &str {
        self.source.file()
    }

    /// Span starting where `self` starts and ending where `other` ends.
    pub fn to(&self, other: &Span) -> Span {
        Span::new(self.source.clone(), self.start, other.end)
    }

    pub fn byte_range(&self) -> Range<usize> {
        let contents = self.source.contents();
        let start = self.start.offset as usize;
        if start >= contents.len() {
            return contents.len()..contents.len();
        }
        let end = self.end.offset as usize;
        let last = contents[end..].chars().next().map_or(0, char::len_utf8);
        start..end + last
    }

    pub fn text(&self) -> &str {
        &self.source.contents()[self.byte_range()]
    }

    pub fn message(&self, kind: &str, msg: &str) -> String {
        self.source
            .message(self.start.line, self.start.col, kind, msg)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source.file(), self.start)
    }
}

impl Debug for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        let t = self.text().escape_debug().to_string();
        let max = 32;
        let (txt, trailer) = if t.len() > max {
            (t.chars().take(max).collect::<String>(), "...")
        } else {
            (t, "")
        };

        f.write_fmt(format_args!(
            "{}-{}, \"{}{}\"",
            self.start, self.end, txt, trailer
        ))
    }
}

#[cfg(feature = "ast")]
impl serde::Serialize for Span {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("Span", 3)?;
        s.serialize_field("file", self.source.file())?;
        s.serialize_field("start", &self.start)?;
        s.serialize_field("end", &self.end)?;
        s.end()
    }
}

/// Hand written tokenizer. Malformed input never fails the lexer; it is
/// returned as `Illegal` tokens and the caller decides what to do.
#[derive(Clone)]
pub struct Lexer<'source> {
    source: Source,
    iter: Peekable<CharIndices<'source>>,
    line: u32,
    col: u32,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source Source) -> Self {
        Self {
            source: source.clone(),
            iter: source.contents().char_indices().peekable(),
            line: 1,
            col: 1,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.iter.peek().map(|(_, ch)| *ch)
    }

    fn peekahead(&self, n: usize) -> Option<char> {
        self.iter.clone().nth(n).map(|(_, ch)| ch)
    }

    /// Position of the next unread character.
    fn here(&mut self) -> Position {
        let offset = match self.iter.peek() {
            Some((index, _)) => *index,
            None => self.source.contents().len(),
        };
        Position {
            line: self.line,
            col: self.col,
            offset: offset as u32,
        }
    }

    /// Consume one character and return its position.
    fn bump(&mut self) -> Option<Position> {
        let pos = self.here();
        let (_, ch) = self.iter.next()?;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(pos)
    }

    fn bump_n(&mut self, n: usize) -> Position {
        let mut last = self.here();
        for _ in 0..n {
            if let Some(p) = self.bump() {
                last = p;
            }
        }
        last
    }

    fn token(
        &self,
        kind: TokenKind,
        literal: impl Into<String>,
        start: Position,
        end: Position,
    ) -> Token {
        Token::new(kind, literal, Span::new(self.source.clone(), start, end))
    }

    fn slice(&self, start: Position, end_exclusive: usize) -> &str {
        &self.source.contents()[start.offset as usize..end_exclusive]
    }

    /// Everything from `start` up to the end of the input as an illegal token.
    fn unterminated(&self, start: Position, last: Position) -> Token {
        let literal = self.slice(start, self.source.contents().len()).to_string();
        self.token(TokenKind::Illegal, literal, start, last)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t' | '\r')) {
            self.bump();
        }
    }

    fn read_ident(&mut self) -> Token {
        let start = self.here();
        let mut last = start;
        while matches!(self.peek(), Some(ch) if ch.is_ascii_alphanumeric()) {
            if let Some(p) = self.bump() {
                last = p;
            }
        }
        let end = self.here().offset as usize;
        let text = self.slice(start, end).to_string();
        let kind = TokenKind::from_keyword(&text).unwrap_or(TokenKind::Ident);
        self.token(kind, text, start, last)
    }

    fn read_digits(&mut self, mut last: Position) -> Position {
        while matches!(self.peek(), Some(ch) if ch.is_ascii_digit()) {
            if let Some(p) = self.bump() {
                last = p;
            }
        }
        last
    }

    // A fraction is consumed only once, so "1.2.3" is a float, an illegal
    // `.` and another number.
    fn read_number(&mut self) -> Token {
        let start = self.here();
        let mut last = self.read_digits(start);
        let mut kind = TokenKind::IntLiteral;

        if self.peek() == Some('.') && matches!(self.peekahead(1), Some(ch) if ch.is_ascii_digit())
        {
            self.bump();
            last = self.read_digits(last);
            kind = TokenKind::FloatLiteral;
        }

        let end = self.here().offset as usize;
        let text = self.slice(start, end).to_string();
        self.token(kind, text, start, last)
    }

    fn read_string(&mut self) -> Token {
        let start = self.here();
        let mut last = self.bump_n(1);
        let content_start = self.here().offset as usize;
        loop {
            match self.peek() {
                None => return self.unterminated(start, last),
                Some('"') => {
                    let content_end = self.here().offset as usize;
                    last = self.bump_n(1);
                    let literal = self.source.contents()[content_start..content_end].to_string();
                    return self.token(TokenKind::StringLiteral, literal, start, last);
                }
                Some('\\') if matches!(self.peekahead(1), Some('"' | '\\')) => {
                    last = self.bump_n(2);
                }
                Some(_) => last = self.bump_n(1),
            }
        }
    }

    fn at_triple_quote(&self) -> bool {
        self.peekahead(0) == Some('"')
            && self.peekahead(1) == Some('"')
            && self.peekahead(2) == Some('"')
    }

    fn read_docstring(&mut self) -> Token {
        let start = self.here();
        let mut last = self.bump_n(3);
        let content_start = self.here().offset as usize;
        loop {
            if self.at_triple_quote() {
                let content_end = self.here().offset as usize;
                last = self.bump_n(3);
                let literal = self.source.contents()[content_start..content_end]
                    .trim()
                    .to_string();
                return self.token(TokenKind::Docstring, literal, start, last);
            }
            match self.bump() {
                Some(p) => last = p,
                None => return self.unterminated(start, last),
            }
        }
    }

    fn read_line_comment(&mut self) -> Token {
        let start = self.here();
        let mut last = self.bump_n(2);
        let content_start = self.here().offset as usize;
        while !matches!(self.peek(), None | Some('\n')) {
            if let Some(p) = self.bump() {
                last = p;
            }
        }
        let content_end = self.here().offset as usize;
        let literal = self.source.contents()[content_start..content_end]
            .trim()
            .to_string();
        self.token(TokenKind::Comment, literal, start, last)
    }

    fn read_block_comment(&mut self) -> Token {
        let start = self.here();
        let mut last = self.bump_n(2);
        let content_start = self.here().offset as usize;
        loop {
            if self.peek() == Some('*') && self.peekahead(1) == Some('/') {
                let content_end = self.here().offset as usize;
                last = self.bump_n(2);
                let literal = self.source.contents()[content_start..content_end]
                    .trim()
                    .to_string();
                return self.token(TokenKind::CommentBlock, literal, start, last);
            }
            match self.bump() {
                Some(p) => last = p,
                None => return self.unterminated(start, last),
            }
        }
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_ws();

        let start = self.here();
        let Some(chr) = self.peek() else {
            return self.token(TokenKind::Eof, "", start, start);
        };

        if let Some(kind) = TokenKind::from_delimiter(chr) {
            self.bump();
            return self.token(kind, chr.to_string(), start, start);
        }

        match chr {
            '"' if self.at_triple_quote() => self.read_docstring(),
            '"' => self.read_string(),
            '/' if self.peekahead(1) == Some('/') => self.read_line_comment(),
            '/' if self.peekahead(1) == Some('*') => self.read_block_comment(),
            _ if chr.is_ascii_digit() => self.read_number(),
            _ if chr.is_ascii_alphabetic() => self.read_ident(),
            _ => {
                self.bump();
                self.token(TokenKind::Illegal, chr.to_string(), start, start)
            }
        }
    }

    /// Drain the lexer. The returned tokens end with `Eof`.
    pub fn read_all_tokens(&mut self) -> Vec<Token> {
        let mut tokens = vec![];
        loop {
            let tok = self.next_token();
            let done = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if done {
                break;
            }
        }
        tokens
    }
}
