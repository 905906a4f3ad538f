//! Class header parsing
//!
//! ```text
//! @PointClass base(Targetname, Angles) studio("models/a.mdl") = prop_a : "Desc" [ ... ]
//! ```
//!
//! `base(...)` supplies the base list. Every other helper is stored as an
//! opaque [`EditorHint`] with its arguments kept as written.

use super::Parser;
use crate::error::Result;
use crate::lexer::TokenKind;
use entforge_core::{ClassKind, ClassName, EditorHint, EntityClass};

impl Parser<'_> {
    /// Parse a class declaration after its `@Kind` keyword
    pub(crate) fn parse_class(&mut self, kind: ClassKind) -> Result<EntityClass> {
        let mut bases = Vec::new();
        let mut hints = Vec::new();

        while !self.eat(&TokenKind::Equals)? {
            let name = self.expect_ident("editor hint or '='")?;
            self.expect(&TokenKind::LParen, "'('")?;
            if name.eq_ignore_ascii_case("base") {
                bases.extend(self.parse_base_list()?);
            } else {
                let args = self.parse_hint_args()?;
                hints.push(EditorHint { name, args });
            }
        }

        let name = self.expect_ident("class name")?;
        let mut class = EntityClass::new(name, kind);
        class.bases = bases;
        class.hints = hints;

        if self.eat(&TokenKind::Colon)? {
            class.description = self.parse_text("class description")?;
        }

        self.expect(&TokenKind::LBracket, "'['")?;
        while !self.eat(&TokenKind::RBracket)? {
            self.parse_member(&mut class)?;
        }

        log::trace!(
            "parsed class {} ({} bases, {} own fields)",
            class.name,
            class.bases.len(),
            class.fields.len()
        );
        Ok(class)
    }

    /// Comma-separated class names up to the closing `)`
    fn parse_base_list(&mut self) -> Result<Vec<ClassName>> {
        let mut bases = Vec::new();
        if self.eat(&TokenKind::RParen)? {
            return Ok(bases);
        }
        loop {
            bases.push(ClassName::new(self.expect_ident("base class name")?));
            if self.eat(&TokenKind::RParen)? {
                return Ok(bases);
            }
            self.expect(&TokenKind::Comma, "',' or ')'")?;
        }
    }

    /// Hint arguments up to the closing `)`
    ///
    /// Each comma-separated group becomes one string: its tokens as written,
    /// separated by single spaces, with strings keeping their quotes.
    fn parse_hint_args(&mut self) -> Result<Vec<String>> {
        let mut args = Vec::new();
        let mut group: Vec<String> = Vec::new();
        let mut prefix = String::new();
        loop {
            let arg = match &self.peek()?.kind {
                TokenKind::RParen if prefix.is_empty() => Arg::Close,
                TokenKind::Comma if prefix.is_empty() => Arg::Separator,
                TokenKind::Ident(text) | TokenKind::Number(text) => Arg::Piece(text.clone()),
                TokenKind::String(text) => Arg::Piece(format!("\"{}\"", text)),
                TokenKind::Bang => Arg::Prefix('!'),
                TokenKind::Minus => Arg::Prefix('-'),
                TokenKind::Plus => Arg::Prefix('+'),
                _ => Arg::Invalid,
            };
            match arg {
                Arg::Piece(piece) => group.push(format!("{}{}", std::mem::take(&mut prefix), piece)),
                Arg::Prefix(c) => prefix.push(c),
                Arg::Separator => {
                    args.push(group.join(" "));
                    group.clear();
                }
                Arg::Close => {
                    self.advance()?;
                    if !group.is_empty() || !args.is_empty() {
                        args.push(group.join(" "));
                    }
                    return Ok(args);
                }
                Arg::Invalid => return Err(self.unexpected("hint argument or ')'")?.into()),
            }
            self.advance()?;
        }
    }
}

enum Arg {
    Piece(String),
    /// `!`, `-` or `+` in front of a tag, as in `appliesto(EP1, !TF2)`
    Prefix(char),
    Separator,
    Close,
    Invalid,
}

#[cfg(test)]
mod tests {
    use crate::error::{Error, ParseError};
    use crate::parser::parse_document;
    use entforge_core::{ClassKind, ClassName, EditorHint};

    #[test]
    fn test_applies_to_with_prefixed_tags() {
        let doc = parse_document("@PointClass appliesto(EP1, !TF2, -engine +VSCRIPT) = info_x []")
            .unwrap();
        let class = &doc.classes[0];
        assert_eq!(class.hints[0].args, vec!["EP1", "!TF2", "-engine +VSCRIPT"]);
        assert_eq!(class.applies_to(), vec!["!TF2", "+VSCRIPT", "-ENGINE", "EP1"]);
    }

    #[test]
    fn test_dangling_tag_prefix() {
        let err = parse_document("@PointClass appliesto(EP1, !) = info_x []").unwrap_err();
        assert!(matches!(
            err,
            Error::Parse(ParseError::UnexpectedToken { ref found, .. }) if found == "')'"
        ));
    }

    #[test]
    fn test_base_class_with_hint() {
        let doc = parse_document("@BaseClass sphere(distmax) = BModelParticleSpawner []").unwrap();
        let class = &doc.classes[0];
        assert_eq!(class.name, ClassName::from("BModelParticleSpawner"));
        assert_eq!(class.kind, ClassKind::Base);
        assert!(class.is_base_only());
        assert!(class.bases.is_empty());
        assert_eq!(class.hints, vec![EditorHint::new("sphere").with_arg("distmax")]);
    }

    #[test]
    fn test_bases_and_hints_in_order() {
        let doc = parse_document(
            r#"@PointClass base(Targetname, Parentname) studio("models/props/a.mdl")
                size(-8 -8 0, 8 8 16) color(255 0 0) base(Angles)
                = prop_thing : "A thing." + " Really." []"#,
        )
        .unwrap();
        let class = &doc.classes[0];
        assert_eq!(class.kind, ClassKind::Point);
        assert_eq!(
            class.bases,
            vec![
                ClassName::from("Targetname"),
                ClassName::from("Parentname"),
                ClassName::from("Angles"),
            ]
        );
        let hints: Vec<String> = class.hints.iter().map(ToString::to_string).collect();
        assert_eq!(
            hints,
            vec![
                "studio(\"models/props/a.mdl\")",
                "size(-8 -8 0, 8 8 16)",
                "color(255 0 0)",
            ]
        );
        assert_eq!(class.description, "A thing. Really.");
    }

    #[test]
    fn test_empty_hint_args() {
        let doc = parse_document("@PointClass studio() halfgridsnap() = a []").unwrap();
        let class = &doc.classes[0];
        assert_eq!(class.hints.len(), 2);
        assert!(class.hints.iter().all(|h| h.args.is_empty()));
    }

    #[test]
    fn test_other_class_kind_kept() {
        let doc = parse_document("@OverrideClass = func_door []").unwrap();
        assert_eq!(doc.classes[0].kind, ClassKind::Other("OverrideClass".into()));
    }

    #[test]
    fn test_missing_bracket() {
        let err = parse_document("@PointClass = info_null : \"x\"\n{ }").unwrap_err();
        assert_eq!(
            err.to_string(),
            "parse error: line 2: expected '[', found '{'"
        );
    }

    #[test]
    fn test_missing_class_name() {
        let err = parse_document("@PointClass base(A) = [ ]").unwrap_err();
        assert!(matches!(
            err,
            Error::Parse(ParseError::UnexpectedToken { ref expected, .. }) if expected == "class name"
        ));
    }

    #[test]
    fn test_unclosed_class_block() {
        let err = parse_document("@PointClass = info_null [").unwrap_err();
        assert!(matches!(
            err,
            Error::Parse(ParseError::UnexpectedToken { ref found, .. }) if found == "end of input"
        ));
    }
}
