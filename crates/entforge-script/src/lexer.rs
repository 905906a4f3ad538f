//! Tokenizer for FGD schema text
//!
//! [`Lexer`] is a lazy iterator of [`Token`]s. It ends with exactly one
//! [`TokenKind::Eof`] and then yields `None`. `//` comments and whitespace
//! are dropped. Cloning a lexer, or building a new one over the same text,
//! restarts the stream.

use crate::error::LexError;
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

/// Token variants
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    /// Quoted string with escapes already processed
    String(String),
    /// Numeric literal, kept as written
    Number(String),
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Colon,
    Equals,
    Comma,
    Plus,
    /// `-` not followed by a digit, as in `-TAG`
    Minus,
    Bang,
    At,
    Star,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(s) => write!(f, "identifier '{}'", s),
            TokenKind::String(s) => write!(f, "string \"{}\"", s),
            TokenKind::Number(n) => write!(f, "number {}", n),
            TokenKind::LBrace => write!(f, "'{{'"),
            TokenKind::RBrace => write!(f, "'}}'"),
            TokenKind::LBracket => write!(f, "'['"),
            TokenKind::RBracket => write!(f, "']'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::Colon => write!(f, "':'"),
            TokenKind::Equals => write!(f, "'='"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Plus => write!(f, "'+'"),
            TokenKind::Minus => write!(f, "'-'"),
            TokenKind::Bang => write!(f, "'!'"),
            TokenKind::At => write!(f, "'@'"),
            TokenKind::Star => write!(f, "'*'"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

/// A token and the 1-based line it starts on
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

/// Lazy tokenizer over one chunk of schema text
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            finished: false,
        }
    }

    /// Collect every token up to and including `Eof`
    pub fn tokenize(self) -> Result<Vec<Token>, LexError> {
        self.collect()
    }

    fn skip_trivia(&mut self) {
        while let Some(&c) = self.chars.peek() {
            match c {
                '\n' => {
                    self.line += 1;
                    self.chars.next();
                }
                c if c.is_whitespace() => {
                    self.chars.next();
                }
                '/' => {
                    let mut ahead = self.chars.clone();
                    ahead.next();
                    if ahead.peek() != Some(&'/') {
                        return;
                    }
                    while let Some(&c) = self.chars.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.chars.next();
                    }
                }
                _ => return,
            }
        }
    }

    fn lex_string(&mut self, line: usize) -> Result<TokenKind, LexError> {
        let mut text = String::new();
        loop {
            match self.chars.next() {
                None | Some('\n') => return Err(LexError::UnterminatedString { line }),
                Some('"') => return Ok(TokenKind::String(text)),
                Some('\\') => match self.chars.peek() {
                    Some('"') => {
                        text.push('"');
                        self.chars.next();
                    }
                    Some('\\') => {
                        text.push('\\');
                        self.chars.next();
                    }
                    Some('n') => {
                        text.push('\n');
                        self.chars.next();
                    }
                    // Anything else is a literal backslash, as in Windows paths.
                    _ => text.push('\\'),
                },
                Some(c) => text.push(c),
            }
        }
    }

    fn lex_number(&mut self, first: char) -> TokenKind {
        let mut text = String::from(first);
        let mut seen_dot = first == '.';
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() || (c == '.' && !seen_dot) {
                seen_dot |= c == '.';
                text.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        TokenKind::Number(text)
    }

    fn lex_ident(&mut self, first: char) -> TokenKind {
        let mut text = String::from(first);
        while let Some(&c) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' || c == '.' {
                text.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        TokenKind::Ident(text)
    }

    /// Whether the next char starts the digits of a number
    fn digit_follows(&self) -> bool {
        let mut ahead = self.chars.clone();
        match ahead.next() {
            Some(c) if c.is_ascii_digit() => true,
            Some('.') => ahead.next().is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        }
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_trivia();
        let line = self.line;
        let Some(c) = self.chars.next() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                line,
            });
        };

        let kind = match c {
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ':' => TokenKind::Colon,
            '=' => TokenKind::Equals,
            ',' => TokenKind::Comma,
            '+' => TokenKind::Plus,
            '@' => TokenKind::At,
            '*' => TokenKind::Star,
            '"' => self.lex_string(line)?,
            c if c.is_ascii_digit() => self.lex_number(c),
            '-' | '.' if self.digit_follows() => self.lex_number(c),
            '-' => TokenKind::Minus,
            '!' => TokenKind::Bang,
            c if c.is_alphabetic() || c == '_' => self.lex_ident(c),
            ch => return Err(LexError::UnexpectedChar { ch, line }),
        };
        Ok(Token { kind, line })
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        if matches!(token, Err(_) | Ok(Token { kind: TokenKind::Eof, .. })) {
            self.finished = true;
        }
        Some(token)
    }
}
