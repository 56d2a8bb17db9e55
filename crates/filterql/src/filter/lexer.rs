//! Lexer (tokenizer) for filter expressions.

use std::iter::Peekable;
use std::str::Chars;

use super::error::{FilterError, FilterResult};

/// The kind of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A field path such as `title` or `meta.author.name`.
    Identifier,
    /// A single or double quoted string, stored unescaped.
    QuotedString,
    /// A decimal integer or float with optional sign.
    Number,
    /// `true` or `false`.
    Bool,
    /// `null`.
    Null,
    /// A `@name` time macro, stored without the `@`.
    Macro,
    /// A `{:name}` named replacement, stored without the braces.
    Placeholder,
    /// Any run of operator characters; validated by the parser.
    Operator,
    /// Opening parenthesis `(`.
    LeftParen,
    /// Closing parenthesis `)`.
    RightParen,
    /// `&&`.
    LogicalAnd,
    /// `||`.
    LogicalOr,
    /// End of input.
    Eof,
}

/// A token with its text and position in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The token kind.
    pub kind: TokenKind,
    /// The token text (unescaped for strings, without sigils for macros and placeholders).
    pub text: String,
    /// The byte position where the token starts (0-indexed).
    pub position: usize,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>, position: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
        }
    }
}

/// Characters that combine into comparison operators.
fn is_comparison_char(c: char) -> bool {
    matches!(c, '=' | '!' | '<' | '>' | '~')
}

/// Characters allowed inside identifiers after the first one.
fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

/// Lexer for tokenizing filter expressions.
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    /// Lookahead used to tell a signed number from a bare `+`/`-`.
    rest: &'a str,
    /// Current byte position in the input string.
    position: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input string.
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            rest: input,
            position: 0,
        }
    }

    /// Peeks at the next character without consuming it.
    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    /// Peeks at the character after the next one.
    fn peek_second(&self) -> Option<char> {
        let mut ahead = self.rest.chars();
        ahead.next();
        ahead.next()
    }

    /// Consumes and returns the next character, updating position.
    fn next_char(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.position += c.len_utf8();
        self.rest = &self.rest[c.len_utf8()..];
        Some(c)
    }

    /// Skips whitespace characters.
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.next_char();
            } else {
                break;
            }
        }
    }

    /// Consumes characters while `pred` holds.
    fn read_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            text.push(c);
            self.next_char();
        }
        text
    }

    /// Reads a quoted string. A backslash escapes the matching quote only;
    /// any other backslash is kept as written.
    fn read_quoted_string(&mut self, quote: char, start: usize) -> FilterResult<Token> {
        // opening quote
        self.next_char();

        let mut text = String::new();
        loop {
            match self.next_char() {
                None => return Err(FilterError::UnterminatedString { position: start }),
                Some(c) if c == quote => break,
                Some('\\') if self.peek() == Some(quote) => {
                    self.next_char();
                    text.push(quote);
                }
                Some(c) => text.push(c),
            }
        }

        Ok(Token::new(TokenKind::QuotedString, text, start))
    }

    /// Reads a number: optional sign, digits, optional fraction.
    fn read_number(&mut self, start: usize) -> Token {
        let mut text = String::new();
        if let Some(sign @ ('+' | '-')) = self.peek() {
            text.push(sign);
            self.next_char();
        }
        text.push_str(&self.read_while(|c| c.is_ascii_digit()));
        if self.peek() == Some('.') {
            text.push('.');
            self.next_char();
            text.push_str(&self.read_while(|c| c.is_ascii_digit()));
        }
        Token::new(TokenKind::Number, text, start)
    }

    /// Reads an identifier and classifies the `true`/`false`/`null` keywords.
    fn read_identifier(&mut self, start: usize) -> Token {
        let text = self.read_while(is_identifier_char);
        let kind = match text.to_lowercase().as_str() {
            "true" | "false" => TokenKind::Bool,
            "null" => TokenKind::Null,
            _ => TokenKind::Identifier,
        };
        Token::new(kind, text, start)
    }

    /// Reads a `{:name}` placeholder.
    fn read_placeholder(&mut self, start: usize) -> FilterResult<Token> {
        // `{`
        self.next_char();
        if self.peek() != Some(':') {
            return Err(FilterError::UnexpectedCharacter {
                character: '{',
                position: start,
            });
        }
        self.next_char();

        let name = self.read_while(|c| c.is_alphanumeric() || c == '_');
        if name.is_empty() || self.peek() != Some('}') {
            return Err(FilterError::UnexpectedCharacter {
                character: '{',
                position: start,
            });
        }
        self.next_char();

        Ok(Token::new(TokenKind::Placeholder, name, start))
    }

    /// Returns true if the upcoming `+`/`-` starts a signed number.
    fn sign_starts_number(&self) -> bool {
        match self.peek_second() {
            Some(c) if c.is_ascii_digit() => true,
            Some('.') => {
                let mut ahead = self.rest.chars().skip(2);
                matches!(ahead.next(), Some(c) if c.is_ascii_digit())
            }
            _ => false,
        }
    }

    /// Returns the next token, or an `Eof` token at the end of input.
    pub fn next_token(&mut self) -> FilterResult<Token> {
        self.skip_whitespace();

        let start = self.position;
        let Some(c) = self.peek() else {
            return Ok(Token::new(TokenKind::Eof, "", start));
        };

        match c {
            '(' => {
                self.next_char();
                Ok(Token::new(TokenKind::LeftParen, "(", start))
            }
            ')' => {
                self.next_char();
                Ok(Token::new(TokenKind::RightParen, ")", start))
            }

            // Logical connectors; a single `&` or `|` is an unsupported operator
            '&' | '|' => {
                self.next_char();
                if self.peek() == Some(c) {
                    self.next_char();
                    let kind = if c == '&' {
                        TokenKind::LogicalAnd
                    } else {
                        TokenKind::LogicalOr
                    };
                    Ok(Token::new(kind, format!("{c}{c}"), start))
                } else {
                    Ok(Token::new(TokenKind::Operator, c.to_string(), start))
                }
            }

            '\'' | '"' => self.read_quoted_string(c, start),

            '@' => {
                self.next_char();
                let name = self.read_while(|c| c.is_alphanumeric() || c == '_');
                if name.is_empty() {
                    return Err(FilterError::UnexpectedCharacter {
                        character: '@',
                        position: start,
                    });
                }
                Ok(Token::new(TokenKind::Macro, name, start))
            }

            '{' => self.read_placeholder(start),

            '+' | '-' if self.sign_starts_number() => Ok(self.read_number(start)),
            '.' if matches!(self.peek_second(), Some(d) if d.is_ascii_digit()) => {
                Ok(self.read_number(start))
            }
            _ if c.is_ascii_digit() => Ok(self.read_number(start)),

            _ if is_comparison_char(c) => {
                let op = self.read_while(is_comparison_char);
                Ok(Token::new(TokenKind::Operator, op, start))
            }
            '+' | '-' | '*' | '/' | '%' | '^' => {
                self.next_char();
                Ok(Token::new(TokenKind::Operator, c.to_string(), start))
            }

            _ if c.is_alphabetic() || c == '_' => Ok(self.read_identifier(start)),

            _ => Err(FilterError::UnexpectedCharacter {
                character: c,
                position: start,
            }),
        }
    }

    /// Collects all tokens, ending with a single `Eof` token.
    ///
    /// Stops at the first lexical error.
    pub fn tokenize(mut self) -> FilterResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }
}
