//! Keyvalue and I/O member parsing
//!
//! ```text
//! solid(choices) readonly : "Solid" : 0 : "Collision mode" =
//! [
//!     0 : "Non-solid"
//! ]
//! spawnflags(flags) =
//! [
//!     1 : "Start on" : 1
//! ]
//! input TurnOn(void) : "Start spawning"
//! skin[since_ep1, !tf2](integer) : "Skin"
//! ```
//!
//! Defaults are coerced to the declared kind as soon as the member is read,
//! so a class never holds a default its field cannot represent.

use super::Parser;
use crate::error::{ParseError, Result};
use crate::lexer::TokenKind;
use entforge_core::{
    normalize_tag, ChoiceOption, Direction, EntityClass, FieldSpec, FlagOption, IOSpec, Value,
    ValueKind,
};

impl Parser<'_> {
    /// Parse one member line and append it to `class`
    pub(crate) fn parse_member(&mut self, class: &mut EntityClass) -> Result<()> {
        let name = self.expect_ident("keyvalue or I/O declaration")?;

        let direction = match name.to_ascii_lowercase().as_str() {
            "input" => Some(Direction::Input),
            "output" => Some(Direction::Output),
            _ => None,
        };
        // `input(string)` is a keyvalue called "input"; `input Name(...)` is a signal.
        if let Some(direction) = direction {
            if self.check(&TokenKind::Ident(String::new()))? {
                let io = self.parse_io(direction)?;
                class.push_io(io);
                return Ok(());
            }
        }

        let field = self.parse_keyvalue(name)?;
        class.push_field(field);
        Ok(())
    }

    fn parse_io(&mut self, direction: Direction) -> Result<IOSpec> {
        let name = self.expect_ident("signal name")?;
        let tags = self.parse_tags()?;
        self.expect(&TokenKind::LParen, "'('")?;
        let type_name = self.expect_ident("payload type")?;
        self.expect(&TokenKind::RParen, "')'")?;

        let payload = if type_name.eq_ignore_ascii_case("void") {
            None
        } else {
            Some(ValueKind::from_type_name(&type_name))
        };
        let mut io = match direction {
            Direction::Input => IOSpec::input(name, payload),
            Direction::Output => IOSpec::output(name, payload),
        };
        io.tags = tags;
        if self.eat(&TokenKind::Colon)? {
            io.description = self.parse_text("signal description")?;
        }
        Ok(io)
    }

    fn parse_keyvalue(&mut self, name: String) -> Result<FieldSpec> {
        let tags = self.parse_tags()?;
        self.expect(&TokenKind::LParen, "'('")?;
        let type_name = self.expect_ident("value type")?;
        self.expect(&TokenKind::RParen, "')'")?;

        let mut field = FieldSpec::new(name, ValueKind::from_type_name(&type_name));
        field.tags = tags;
        self.parse_qualifiers(&mut field)?;

        let mut raw_default = None;
        if self.eat(&TokenKind::Colon)? {
            field.label = self.parse_text("display label")?;
            if self.eat(&TokenKind::Colon)? {
                raw_default = self.parse_raw_default()?;
                if self.eat(&TokenKind::Colon)? {
                    field.help = self.parse_text("help text")?;
                }
            }
        }

        if field.kind.has_options() {
            if self.eat(&TokenKind::Equals)? {
                if field.kind == ValueKind::Flags {
                    self.parse_flags(&mut field)?;
                } else {
                    self.parse_choices(&mut field)?;
                }
            }
            if field.choices.is_empty() && field.flags.is_empty() {
                return Err(ParseError::EmptyChoiceSet { field: field.name }.into());
            }
        } else if self.check(&TokenKind::Equals)? {
            return Err(self.unexpected("next member or ']'")?.into());
        }

        field.default = coerce_default(&field, raw_default)?;
        Ok(field)
    }

    /// Optional `[tag, !tag, +tag]` list after a member name
    fn parse_tags(&mut self) -> Result<Vec<String>> {
        let mut tags = Vec::new();
        if !self.eat(&TokenKind::LBracket)? {
            return Ok(tags);
        }
        while !self.eat(&TokenKind::RBracket)? {
            let prefix = if self.eat(&TokenKind::Bang)? {
                "!"
            } else if self.eat(&TokenKind::Minus)? {
                "-"
            } else if self.eat(&TokenKind::Plus)? {
                "+"
            } else {
                ""
            };
            let tag = self.expect_ident("tag or ']'")?;
            tags.push(format!("{}{}", prefix, normalize_tag(&tag)));
            self.eat(&TokenKind::Comma)?;
        }
        Ok(tags)
    }

    /// `readonly`, `engine`, `report` or `*` after the type
    ///
    /// Any other identifier starts the next member, as does a qualifier word
    /// followed by `(` or `[`, which is a member that happens to share its
    /// name.
    fn parse_qualifiers(&mut self, field: &mut FieldSpec) -> Result<()> {
        loop {
            let qualifier = match &self.peek()?.kind {
                TokenKind::Star => Some("report".to_string()),
                TokenKind::Ident(word) => Some(word.to_ascii_lowercase()),
                _ => None,
            };
            if qualifier.is_some() && !self.check(&TokenKind::Star)? {
                let after = &self.peek_nth(1)?.kind;
                if matches!(after, TokenKind::LParen | TokenKind::LBracket) {
                    return Ok(());
                }
            }
            match qualifier.as_deref() {
                Some("readonly") => field.readonly = true,
                Some("engine") => field.engine_only = true,
                Some("report") => field.report = true,
                _ => return Ok(()),
            }
            self.advance()?;
        }
    }

    /// Default text, or `None` when the slot is left empty
    fn parse_raw_default(&mut self) -> Result<Option<String>> {
        let raw = match &self.peek()?.kind {
            TokenKind::String(text) | TokenKind::Number(text) => Some(text.clone()),
            _ => None,
        };
        if raw.is_some() {
            self.advance()?;
        }
        Ok(raw)
    }

    /// A choice literal: number, string or bare word
    fn parse_literal(&mut self, expected: &str) -> Result<String> {
        let literal = match &self.peek()?.kind {
            TokenKind::String(text) | TokenKind::Number(text) | TokenKind::Ident(text) => {
                Some(text.clone())
            }
            _ => None,
        };
        match literal {
            Some(literal) => {
                self.advance()?;
                Ok(literal)
            }
            None => Err(self.unexpected(expected)?.into()),
        }
    }

    fn parse_choices(&mut self, field: &mut FieldSpec) -> Result<()> {
        self.expect(&TokenKind::LBracket, "'['")?;
        while !self.eat(&TokenKind::RBracket)? {
            let value = self.parse_literal("choice value or ']'")?;
            self.expect(&TokenKind::Colon, "':'")?;
            let label = self.parse_text("choice label")?;
            field.choices.push(ChoiceOption { value, label });
        }
        Ok(())
    }

    fn parse_flags(&mut self, field: &mut FieldSpec) -> Result<()> {
        self.expect(&TokenKind::LBracket, "'['")?;
        while !self.eat(&TokenKind::RBracket)? {
            let line = self.line()?;
            let bit = self.expect_integer("flag bit or ']'")?;
            let bit = u64::try_from(bit).map_err(|_| ParseError::UnexpectedToken {
                line,
                expected: "non-negative flag bit".to_string(),
                found: format!("number {}", bit),
            })?;
            self.expect(&TokenKind::Colon, "':'")?;
            let label = self.parse_text("flag label")?;
            let enabled = if self.eat(&TokenKind::Colon)? {
                self.expect_integer("flag default")? != 0
            } else {
                false
            };
            field.flags.push(FlagOption {
                bit,
                label,
                enabled,
            });
        }
        Ok(())
    }
}

/// Coerce the raw default of a finished field to its declared kind
fn coerce_default(field: &FieldSpec, raw: Option<String>) -> Result<Option<Value>> {
    let Some(raw) = raw else {
        if field.kind == ValueKind::Flags {
            return Ok(Some(Value::Int(field.flags_default())));
        }
        return Ok(None);
    };

    let textual = matches!(field.kind, ValueKind::String | ValueKind::FreeForm(_));
    if raw.trim().is_empty() && !textual {
        return Ok(None);
    }

    let mismatch = || ParseError::TypeMismatch {
        field: field.name.clone(),
        expected: field.kind.clone(),
        raw: raw.clone(),
    };
    let value = field.kind.coerce(&raw).ok_or_else(mismatch)?;
    if let Value::Choice(literal) = &value {
        if !field.allows_choice(literal) {
            return Err(mismatch().into());
        }
    }
    Ok(Some(value))
}
