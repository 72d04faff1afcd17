//! Lexer (tokenizer) for filter and order-by expressions.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

/// The kind of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// End of input. Returned repeatedly once the input is exhausted.
    Eof,
    /// A character that starts no token.
    Illegal,
    /// A name: property, keyword, operator or lambda variable.
    Ident,
    /// A single-quoted string.
    String,
    /// An integer, optionally suffixed with `l`.
    Integer,
    /// A number suffixed with `f`.
    Float,
    /// A number suffixed with `m`.
    Decimal,
    /// A number suffixed with `d`.
    Double,
    /// A `yyyy-MM-dd` date.
    Date,
    /// An ISO 8601 date-time.
    DateTime,
    /// A GUID.
    Guid,
    /// `true` or `false`.
    Boolean,
    /// `null`.
    Null,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `/`
    Slash,
    /// `:`
    Colon,
}

impl TokenKind {
    /// Returns a lowercase description of this kind for messages.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Eof => "end of input",
            TokenKind::Illegal => "illegal",
            TokenKind::Ident => "identifier",
            TokenKind::String => "string",
            TokenKind::Integer => "integer",
            TokenKind::Float => "float",
            TokenKind::Decimal => "decimal",
            TokenKind::Double => "double",
            TokenKind::Date => "date",
            TokenKind::DateTime => "datetime",
            TokenKind::Guid => "guid",
            TokenKind::Boolean => "boolean",
            TokenKind::Null => "null",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Slash => "'/'",
            TokenKind::Colon => "':'",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A token with its literal text and position in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The token kind.
    pub kind: TokenKind,
    /// The literal text. Strings exclude their quotes.
    pub literal: String,
    /// The byte position where the token starts (0-indexed).
    pub position: usize,
}

impl Token {
    fn new(kind: TokenKind, literal: impl Into<String>, position: usize) -> Self {
        Self {
            kind,
            literal: literal.into(),
            position,
        }
    }

    /// Returns true if this is an identifier equal to `keyword`, ignoring case.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Ident && self.literal.eq_ignore_ascii_case(keyword)
    }

    /// Returns a description of this token for error messages.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => self.kind.describe().to_string(),
            _ => self.literal.clone(),
        }
    }
}

/// Lexer for tokenizing filter and order-by expressions.
///
/// The lexer never fails: characters that start no token are returned as
/// [`TokenKind::Illegal`] tokens for the parser to reject.
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    /// Current byte position in the input string.
    position: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input string.
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            position: 0,
        }
    }

    /// Peeks at the next character without consuming it.
    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    /// Consumes and returns the next character, updating position.
    fn next_char(&mut self) -> Option<char> {
        let c = self.chars.next();
        if let Some(ch) = c {
            self.position += ch.len_utf8();
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if matches!(c, ' ' | '\t' | '\n' | '\r') {
                self.next_char();
            } else {
                break;
            }
        }
    }

    /// Consumes characters while `accept` holds.
    fn read_while(&mut self, accept: impl Fn(char) -> bool) -> String {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if !accept(c) {
                break;
            }
            text.push(c);
            self.next_char();
        }
        text
    }

    /// Reads a single-quoted string. An unterminated string runs to the end of input.
    fn read_string(&mut self) -> String {
        // Consume the opening quote
        self.next_char();

        let mut result = String::new();
        while let Some(c) = self.next_char() {
            if c == '\'' {
                break;
            }
            result.push(c);
        }
        result
    }

    /// Returns the next token. Returns an end-of-input token once the input is exhausted.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let start = self.position;
        let Some(c) = self.peek() else {
            return Token::new(TokenKind::Eof, "", start);
        };

        let single = match c {
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            '/' => Some(TokenKind::Slash),
            ':' => Some(TokenKind::Colon),
            _ => None,
        };
        if let Some(kind) = single {
            self.next_char();
            return Token::new(kind, c.to_string(), start);
        }

        match c {
            '\'' => {
                let literal = self.read_string();
                Token::new(TokenKind::String, literal, start)
            }
            _ if c.is_ascii_digit() => {
                let literal = self.read_while(is_numeric_or_datetime_char);
                let kind = classify_numeric(&literal);
                Token::new(kind, literal, start)
            }
            _ if is_letter(c) => {
                let literal = self.read_while(is_identifier_char);
                let kind = classify_identifier(&literal);
                Token::new(kind, literal, start)
            }
            _ => {
                self.next_char();
                Token::new(TokenKind::Illegal, c.to_string(), start)
            }
        }
    }

    /// Collects all tokens up to, but excluding, the end-of-input token.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            if token.kind == TokenKind::Eof {
                return tokens;
            }
            tokens.push(token);
        }
    }
}

fn is_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_char(c: char) -> bool {
    is_letter(c) || c.is_ascii_digit() || c == '-' || c == '.'
}

/// Digits, date/time punctuation, numeric suffixes and hex digits (for GUIDs
/// that start with a digit).
fn is_numeric_or_datetime_char(c: char) -> bool {
    c.is_ascii_hexdigit()
        || matches!(
            c,
            '-' | ':' | '.' | 'T' | 'Z' | '+' | 'm' | 'M' | 'l' | 'L'
        )
}

fn classify_identifier(literal: &str) -> TokenKind {
    if is_guid(literal) {
        TokenKind::Guid
    } else if literal.eq_ignore_ascii_case("null") {
        TokenKind::Null
    } else if literal.eq_ignore_ascii_case("true") || literal.eq_ignore_ascii_case("false") {
        TokenKind::Boolean
    } else {
        TokenKind::Ident
    }
}

fn classify_numeric(literal: &str) -> TokenKind {
    if is_guid(literal) {
        return TokenKind::Guid;
    }
    if parse_date(literal).is_some() {
        return TokenKind::Date;
    }
    if parse_datetime(literal).is_some() {
        return TokenKind::DateTime;
    }

    match literal.chars().last().map(|c| c.to_ascii_lowercase()) {
        Some('f') => TokenKind::Float,
        Some('m') => TokenKind::Decimal,
        Some('d') => TokenKind::Double,
        _ => TokenKind::Integer,
    }
}

fn is_guid(literal: &str) -> bool {
    Uuid::try_parse(literal).is_ok()
}

/// Parses an exact `yyyy-MM-dd` date.
pub(crate) fn parse_date(literal: &str) -> Option<NaiveDate> {
    if literal.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(literal, "%Y-%m-%d").ok()
}

/// Parses an ISO 8601 date-time. Values without an offset are taken as UTC.
pub(crate) fn parse_datetime(literal: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(literal) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(literal, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(literal, format).ok())
        .map(|naive| naive.and_utc())
}
