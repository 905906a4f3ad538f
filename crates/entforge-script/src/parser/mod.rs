//! Recursive descent parser for FGD schema text
//!
//! ```text
//! document  ::= item*
//! item      ::= "@" "include" string
//!             | "@" "mapsize" "(" number "," number ")"
//!             | "@" class_kw hint* "=" name [":" text] "[" member* "]"
//! hint      ::= ident "(" [arg ("," arg)*] ")"
//! member    ::= keyvalue | io
//! keyvalue  ::= name [tags] "(" type ")" qualifier* [":" text [":" [default] [":" text]]]
//!               ["=" "[" option* "]"]
//! io        ::= ("input" | "output") name [tags] "(" type ")" [":" text]
//! tags      ::= "[" (["!" | "-" | "+"] ident [","])* "]"
//! text      ::= string ("+" string)*
//! ```
//!
//! Class headers are handled in `class.rs`, members in `field.rs`. The
//! parser pulls tokens from the lexer on demand and looks at most two
//! tokens ahead.

mod class;
mod field;

use crate::error::{ParseError, Result};
use crate::lexer::{Lexer, Token, TokenKind};
use entforge_core::{ClassKind, EntityClass, MapSize};
use std::collections::VecDeque;

/// Everything declared in one chunk of schema text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    /// Raw, unresolved classes in declaration order
    pub classes: Vec<EntityClass>,
    /// Paths named by `@include`, in order
    pub includes: Vec<String>,
    /// Last `@mapsize` in the chunk
    pub map_size: Option<MapSize>,
}

/// Parse one chunk of schema text into raw classes and directives
pub fn parse_document(source: &str) -> Result<Document> {
    Parser::new(source).parse_document()
}

pub(crate) struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: VecDeque<Token>,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Self {
            lexer: Lexer::new(source),
            lookahead: VecDeque::new(),
        }
    }

    pub(crate) fn parse_document(&mut self) -> Result<Document> {
        let mut doc = Document::default();
        while !self.at_eof()? {
            self.expect(&TokenKind::At, "'@'")?;
            let line = self.line()?;
            let keyword = self.expect_ident("directive or class kind")?;
            match keyword.to_ascii_lowercase().as_str() {
                "include" => doc.includes.push(self.expect_string("include path")?),
                "mapsize" => doc.map_size = Some(self.parse_map_size()?),
                _ => match ClassKind::from_keyword(&keyword) {
                    Some(kind) => doc.classes.push(self.parse_class(kind)?),
                    None => {
                        return Err(ParseError::UnexpectedToken {
                            line,
                            expected: "directive or class kind".to_string(),
                            found: format!("identifier '{}'", keyword),
                        }
                        .into())
                    }
                },
            }
        }
        Ok(doc)
    }

    fn parse_map_size(&mut self) -> Result<MapSize> {
        self.expect(&TokenKind::LParen, "'('")?;
        let min = self.expect_integer("map minimum")?;
        self.expect(&TokenKind::Comma, "','")?;
        let max = self.expect_integer("map maximum")?;
        self.expect(&TokenKind::RParen, "')'")?;
        Ok(MapSize { min, max })
    }

    // Token cursor

    pub(crate) fn peek(&mut self) -> Result<&Token> {
        self.peek_nth(0)
    }

    /// The token `n` places after the next one
    pub(crate) fn peek_nth(&mut self, n: usize) -> Result<&Token> {
        while self.lookahead.len() <= n {
            let token = self.pull()?;
            self.lookahead.push_back(token);
        }
        Ok(&self.lookahead[n])
    }

    pub(crate) fn advance(&mut self) -> Result<Token> {
        match self.lookahead.pop_front() {
            Some(token) => Ok(token),
            None => self.pull(),
        }
    }

    fn pull(&mut self) -> Result<Token> {
        match self.lexer.next() {
            Some(token) => Ok(token?),
            // The lexer is exhausted after Eof; keep reporting Eof.
            None => Ok(Token {
                kind: TokenKind::Eof,
                line: 0,
            }),
        }
    }

    pub(crate) fn line(&mut self) -> Result<usize> {
        Ok(self.peek()?.line)
    }

    pub(crate) fn at_eof(&mut self) -> Result<bool> {
        self.check(&TokenKind::Eof)
    }

    /// Whether the next token has the same variant as `kind`
    pub(crate) fn check(&mut self, kind: &TokenKind) -> Result<bool> {
        let next = &self.peek()?.kind;
        Ok(std::mem::discriminant(next) == std::mem::discriminant(kind))
    }

    /// Consume the next token if it has the same variant as `kind`
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> Result<bool> {
        if self.check(kind)? {
            self.advance()?;
            return Ok(true);
        }
        Ok(false)
    }

    pub(crate) fn expect(&mut self, kind: &TokenKind, expected: &str) -> Result<()> {
        if self.eat(kind)? {
            return Ok(());
        }
        Err(self.unexpected(expected)?.into())
    }

    pub(crate) fn expect_ident(&mut self, expected: &str) -> Result<String> {
        if self.check(&TokenKind::Ident(String::new()))? {
            if let TokenKind::Ident(name) = self.advance()?.kind {
                return Ok(name);
            }
        }
        Err(self.unexpected(expected)?.into())
    }

    pub(crate) fn expect_string(&mut self, expected: &str) -> Result<String> {
        if self.check(&TokenKind::String(String::new()))? {
            if let TokenKind::String(text) = self.advance()?.kind {
                return Ok(text);
            }
        }
        Err(self.unexpected(expected)?.into())
    }

    fn expect_integer(&mut self, expected: &str) -> Result<i64> {
        let parsed = match &self.peek()?.kind {
            TokenKind::Number(text) => text.parse::<i64>().ok(),
            _ => None,
        };
        if let Some(value) = parsed {
            self.advance()?;
            return Ok(value);
        }
        Err(self.unexpected(expected)?.into())
    }

    /// A string optionally continued with `+ "more"` pieces
    pub(crate) fn parse_text(&mut self, expected: &str) -> Result<String> {
        let mut text = self.expect_string(expected)?;
        while self.eat(&TokenKind::Plus)? {
            text.push_str(&self.expect_string("string after '+'")?);
        }
        Ok(text)
    }

    /// Build an error describing the next token
    pub(crate) fn unexpected(&mut self, expected: &str) -> Result<ParseError> {
        let token = self.peek()?;
        Ok(ParseError::UnexpectedToken {
            line: token.line,
            expected: expected.to_string(),
            found: token.kind.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, LexError};

    #[test]
    fn test_empty_document() {
        let doc = parse_document("// nothing here\n").unwrap();
        assert_eq!(doc, Document::default());
    }

    #[test]
    fn test_directives() {
        let doc = parse_document(
            r#"
            @mapsize(-16384, 16384)
            @include "base.fgd"
            @include "halflife2.fgd"
            "#,
        )
        .unwrap();
        assert_eq!(doc.includes, vec!["base.fgd", "halflife2.fgd"]);
        assert_eq!(doc.map_size, Some(MapSize { min: -16384, max: 16384 }));
        assert!(doc.classes.is_empty());
    }

    #[test]
    fn test_unknown_directive() {
        let err = parse_document("\n@MaterialExclusion [ ]").unwrap_err();
        assert!(matches!(
            err,
            Error::Parse(ParseError::UnexpectedToken { line: 2, ref found, .. })
                if found == "identifier 'MaterialExclusion'"
        ));
    }

    #[test]
    fn test_missing_at() {
        let err = parse_document("PointClass = foo []").unwrap_err();
        assert!(matches!(
            err,
            Error::Parse(ParseError::UnexpectedToken { ref expected, .. }) if expected == "'@'"
        ));
    }

    #[test]
    fn test_lex_error_surfaces() {
        let err = parse_document("@include \"base.fgd").unwrap_err();
        assert!(matches!(
            err,
            Error::Lex(LexError::UnterminatedString { line: 1 })
        ));
    }

    #[test]
    fn test_concatenated_text() {
        let mut parser = Parser::new(r#""An entity " + "that spawns" + " particles." x"#);
        assert_eq!(
            parser.parse_text("text").unwrap(),
            "An entity that spawns particles."
        );
        assert_eq!(parser.expect_ident("name").unwrap(), "x");
        assert!(parser.at_eof().unwrap());
    }
}
