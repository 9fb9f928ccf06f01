//! Clause lexer implementation.

use super::{Keyword, Span, Token, TokenKind};

/// A lexer that splits SQL text into clause-level tokens.
///
/// String literals, quoted identifiers and comments are consumed whole so
/// that keyword-like text inside them never surfaces as a keyword token.
///
/// Quotes inside literals are escaped by doubling them. With
/// [`Lexer::backslash_escapes`] enabled, a backslash also escapes the next
/// character inside `'...'` and `"..."`, as MySQL does. PostgreSQL `E'...'`
/// literals always honor backslash escapes.
pub struct Lexer<'a> {
    /// The input source code.
    input: &'a str,
    /// The current byte position.
    pos: usize,
    /// The byte position of the start of the current token.
    start: usize,
    /// Whether `\` escapes the next character in quoted strings.
    backslash_escapes: bool,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            start: 0,
            backslash_escapes: false,
        }
    }

    /// Sets whether a backslash escapes the next character in quoted
    /// strings.
    #[must_use]
    pub const fn backslash_escapes(mut self, enabled: bool) -> Self {
        self.backslash_escapes = enabled;
        self
    }

    /// Returns the current character without advancing.
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    /// Returns the next character without advancing.
    fn peek_next(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    /// Advances to the next character and returns it.
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Skips whitespace and comments.
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.peek().is_some_and(char::is_whitespace) {
                self.advance();
            }

            // -- line comment
            if self.peek() == Some('-') && self.peek_next() == Some('-') {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.advance();
                }
                continue;
            }

            // /* block comment */
            if self.peek() == Some('/') && self.peek_next() == Some('*') {
                self.advance();
                self.advance();
                loop {
                    match self.advance() {
                        Some('*') if self.peek() == Some('/') => {
                            self.advance();
                            break;
                        }
                        None => break,
                        _ => {}
                    }
                }
                continue;
            }

            break;
        }
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, Span::new(self.start, self.pos))
    }

    /// Scans a bare word and classifies it as keyword or identifier.
    fn scan_word(&mut self) -> Token {
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$' || c == '#')
        {
            self.advance();
        }

        match Keyword::from_str(&self.input[self.start..self.pos]) {
            Some(keyword) => self.make_token(TokenKind::Keyword(keyword)),
            None => self.make_token(TokenKind::Identifier),
        }
    }

    /// Scans up to and including `close`, treating a doubled delimiter as an
    /// escaped one. The opening delimiter has already been consumed.
    fn scan_delimited(&mut self, close: char, kind: TokenKind) -> Token {
        self.scan_quoted(close, kind, false)
    }

    /// Like [`Self::scan_delimited`], and when `escapes` is set a backslash
    /// also consumes the character after it.
    fn scan_quoted(&mut self, close: char, kind: TokenKind, escapes: bool) -> Token {
        loop {
            match self.advance() {
                Some('\\') if escapes => {
                    if self.advance().is_none() {
                        return self.make_token(TokenKind::Unterminated);
                    }
                }
                Some(c) if c == close => {
                    if self.peek() == Some(close) {
                        self.advance();
                    } else {
                        return self.make_token(kind);
                    }
                }
                Some(_) => {}
                None => return self.make_token(TokenKind::Unterminated),
            }
        }
    }

    /// Scans a `$tag$ ... $tag$` literal. Returns `None` (without consuming
    /// anything past the first `$`) when the text is not a dollar quote.
    fn scan_dollar_quoted(&mut self) -> Option<Token> {
        let rest = &self.input[self.pos..];
        let tag_len = rest.find('$')?;
        let tag = &rest[..tag_len];
        if !tag.chars().all(|c| c.is_alphanumeric() || c == '_')
            || tag.starts_with(|c: char| c.is_ascii_digit())
        {
            return None;
        }

        let delimiter = format!("${tag}$");
        let body_start = self.pos + tag_len + 1;
        match self.input[body_start..].find(&delimiter) {
            Some(end) => {
                self.pos = body_start + end + delimiter.len();
                Some(self.make_token(TokenKind::String))
            }
            None => {
                self.pos = self.input.len();
                Some(self.make_token(TokenKind::Unterminated))
            }
        }
    }

    fn scan_number(&mut self) -> Token {
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || c == '.')
        {
            self.advance();
        }
        if self.peek().is_some_and(|c| c == 'e' || c == 'E')
            && self
                .peek_next()
                .is_some_and(|c| c.is_ascii_digit() || c == '+' || c == '-')
        {
            self.advance();
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        self.make_token(TokenKind::Number)
    }

    /// Scans the next token.
    #[must_use]
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();
        self.start = self.pos;

        let Some(c) = self.advance() else {
            return self.make_token(TokenKind::Eof);
        };

        match c {
            '(' => self.make_token(TokenKind::LeftParen),
            ')' => self.make_token(TokenKind::RightParen),
            ',' => self.make_token(TokenKind::Comma),
            ';' => self.make_token(TokenKind::Semicolon),
            '\'' => self.scan_quoted('\'', TokenKind::String, self.backslash_escapes),
            '"' => self.scan_quoted('"', TokenKind::QuotedIdentifier, self.backslash_escapes),
            '`' => self.scan_delimited('`', TokenKind::QuotedIdentifier),
            '[' => self.scan_delimited(']', TokenKind::QuotedIdentifier),
            '$' => self
                .scan_dollar_quoted()
                .unwrap_or_else(|| self.make_token(TokenKind::Symbol)),
            'E' | 'e' if self.peek() == Some('\'') => {
                self.advance();
                self.scan_quoted('\'', TokenKind::String, true)
            }
            c if c.is_ascii_digit() => self.scan_number(),
            c if c.is_alphabetic() || c == '_' => self.scan_word(),
            _ => self.make_token(TokenKind::Symbol),
        }
    }

    /// Tokenizes the entire input, ending with an `Eof` token.
    #[must_use]
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.is_eof();
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }
}
