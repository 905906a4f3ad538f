//! FGD text writer
//!
//! Writes classes back out in the syntax the parser reads. Output of a
//! resolved schema re-parses to classes with the same fields, kinds,
//! options and defaults.
//!
//! With search tags set on the [`ExportConfig`], the output is cut down to
//! one game: classes whose `appliesto(...)` does not match are dropped, and
//! of each member only the best matching tagged variant is kept. Members
//! inherited from a base that does not apply are dropped with it.

use entforge_core::{
    ClassName, EntityClass, ExportConfig, FieldSpec, IOSpec, Schema, TagSet, Value, ValueKind,
};
use std::collections::HashSet;
use std::fmt::{self, Write};

/// Write every class of `schema` that `config` selects
pub fn write_schema<W: Write>(out: &mut W, schema: &Schema, config: &ExportConfig) -> fmt::Result {
    let search = config.search_tags();
    let excluded: HashSet<&str> = match &search {
        Some(search) => schema
            .all_classes()
            .filter(|class| !search.matches(&class.applies_to()))
            .map(|class| class.name.as_str())
            .collect(),
        None => HashSet::new(),
    };
    let mut first = true;
    if let Some(size) = schema.map_size() {
        writeln!(out, "@mapsize({}, {})", size.min, size.max)?;
        first = false;
    }
    for class in schema.all_classes() {
        if class.is_base_only() && !config.include_base_classes {
            continue;
        }
        if excluded.contains(class.name.as_str()) {
            log::trace!("{} does not apply to the export tags", class.name);
            continue;
        }
        if !first {
            writeln!(out)?;
        }
        write_declaration(out, class, config, search.as_ref(), &excluded)?;
        first = false;
    }
    Ok(())
}

/// Render a schema to a string
pub fn schema_to_string(schema: &Schema, config: &ExportConfig) -> String {
    let mut out = String::new();
    // Writing into a String never fails.
    let _ = write_schema(&mut out, schema, config);
    out
}

/// Write one class declaration
///
/// `base(...)` is only written when base classes are exported too. The
/// resolver merges inherited members and editor hints into the class, so
/// the declaration stands on its own without its bases.
pub fn write_class<W: Write>(out: &mut W, class: &EntityClass, config: &ExportConfig) -> fmt::Result {
    let search = config.search_tags();
    write_declaration(out, class, config, search.as_ref(), &HashSet::new())
}

fn write_declaration<W: Write>(
    out: &mut W,
    class: &EntityClass,
    config: &ExportConfig,
    search: Option<&TagSet>,
    excluded: &HashSet<&str>,
) -> fmt::Result {
    let indent = config.indent_str();

    write!(out, "@{}", class.kind.keyword())?;
    if config.include_base_classes && !class.bases.is_empty() {
        let bases: Vec<&str> = class.bases.iter().map(|b| b.as_str()).collect();
        write!(out, " base({})", bases.join(", "))?;
    }
    for hint in &class.hints {
        if search.is_some() && hint.is_applies_to() {
            continue;
        }
        write!(out, " {}", hint)?;
    }
    write!(out, " = {}", class.name)?;
    if !class.description.is_empty() {
        write!(out, " : {}", quote(&class.description))?;
    }
    writeln!(out)?;
    writeln!(out, "[")?;

    let fields = select(&class.fields, search, excluded, field_key);
    let inputs = select(&class.inputs, search, excluded, io_key);
    let outputs = select(&class.outputs, search, excluded, io_key);
    let show_tags = search.is_none();

    let mut wrote_field = false;
    for field in fields {
        if field.engine_only && !config.include_engine_fields {
            continue;
        }
        write_field(out, field, config, &indent, show_tags)?;
        wrote_field = true;
    }

    if wrote_field && !(inputs.is_empty() && outputs.is_empty()) {
        writeln!(out)?;
    }
    for io in inputs.into_iter().chain(outputs) {
        write_io(out, io, &indent, show_tags)?;
    }

    writeln!(out, "]")
}

/// Members to write, in declaration order
///
/// Without search tags every member is kept. Otherwise members whose tags
/// do not match, or that come from an excluded class, are dropped, and of
/// several matching variants with the same name the one with the most tags
/// wins, taking the slot of the first.
fn select<'a, T>(
    members: &'a [T],
    search: Option<&TagSet>,
    excluded: &HashSet<&str>,
    key: impl Fn(&T) -> (&str, &[String], Option<&ClassName>),
) -> Vec<&'a T> {
    let Some(search) = search else {
        return members.iter().collect();
    };
    let mut chosen: Vec<&T> = Vec::new();
    for member in members {
        let (name, tags, declared_in) = key(member);
        if !search.matches(tags) {
            continue;
        }
        if declared_in.map_or(false, |class| excluded.contains(class.as_str())) {
            continue;
        }
        match chosen.iter_mut().find(|c| key(**c).0 == name) {
            Some(slot) => {
                if tags.len() > key(*slot).1.len() {
                    *slot = member;
                }
            }
            None => chosen.push(member),
        }
    }
    chosen
}

fn field_key(field: &FieldSpec) -> (&str, &[String], Option<&ClassName>) {
    (field.name.as_str(), field.tags.as_slice(), field.declared_in.as_ref())
}

fn io_key(io: &IOSpec) -> (&str, &[String], Option<&ClassName>) {
    (io.name.as_str(), io.tags.as_slice(), io.declared_in.as_ref())
}

fn format_tags(tags: &[String]) -> String {
    if tags.is_empty() {
        String::new()
    } else {
        format!("[{}]", tags.join(", "))
    }
}

fn write_field<W: Write>(
    out: &mut W,
    field: &FieldSpec,
    config: &ExportConfig,
    indent: &str,
    show_tags: bool,
) -> fmt::Result {
    write!(out, "{}{}", indent, field.name)?;
    if show_tags {
        write!(out, "{}", format_tags(&field.tags))?;
    }
    write!(out, "({})", field.kind.type_name())?;
    if field.readonly {
        write!(out, " readonly")?;
    }
    if field.engine_only {
        write!(out, " engine")?;
    }
    if field.report {
        write!(out, " report")?;
    }

    let default = written_default(field);
    let help = Some(field.help.as_str()).filter(|h| config.include_help_text && !h.is_empty());

    if !field.label.is_empty() || default.is_some() || help.is_some() {
        write!(out, " : {}", quote(&field.label))?;
    }
    if default.is_some() || help.is_some() {
        write!(out, " :")?;
        if let Some(value) = default {
            write!(out, " {}", format_value(value))?;
        }
    }
    if let Some(help) = help {
        write!(out, " : {}", quote(help))?;
    }

    match field.kind {
        ValueKind::Choices => {
            writeln!(out, " =")?;
            writeln!(out, "{}[", indent)?;
            for choice in &field.choices {
                writeln!(
                    out,
                    "{}{}{} : {}",
                    indent,
                    indent,
                    format_literal(&choice.value),
                    quote(&choice.label)
                )?;
            }
            writeln!(out, "{}]", indent)
        }
        ValueKind::Flags => {
            writeln!(out, " =")?;
            writeln!(out, "{}[", indent)?;
            for flag in &field.flags {
                writeln!(
                    out,
                    "{}{}{} : {} : {}",
                    indent,
                    indent,
                    flag.bit,
                    quote(&flag.label),
                    u8::from(flag.enabled)
                )?;
            }
            writeln!(out, "{}]", indent)
        }
        _ => writeln!(out),
    }
}

fn write_io<W: Write>(out: &mut W, io: &IOSpec, indent: &str, show_tags: bool) -> fmt::Result {
    write!(out, "{}{} {}", indent, io.direction.keyword(), io.name)?;
    if show_tags {
        write!(out, "{}", format_tags(&io.tags))?;
    }
    write!(out, "({})", io.payload_name())?;
    if !io.description.is_empty() {
        write!(out, " : {}", quote(&io.description))?;
    }
    writeln!(out)
}

/// The default to write in the header slot
///
/// A flags default equal to the OR of its enabled bits is implied by the
/// option block and left out.
fn written_default(field: &FieldSpec) -> Option<&Value> {
    let default = field.default.as_ref()?;
    if field.kind == ValueKind::Flags && default.as_int() == Some(field.flags_default()) {
        return None;
    }
    Some(default)
}

fn format_value(value: &Value) -> String {
    if value.is_bare() {
        value.to_string()
    } else {
        quote(&value.to_string())
    }
}

fn format_literal(literal: &str) -> String {
    if is_number(literal) {
        literal.to_string()
    } else {
        quote(literal)
    }
}

/// Whether the lexer would read `text` back as a single number token
fn is_number(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let (whole, frac) = match digits.split_once('.') {
        Some((whole, frac)) => (whole, Some(frac)),
        None => (digits, None),
    };
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    match frac {
        None => !whole.is_empty() && all_digits(whole),
        Some(frac) => !frac.is_empty() && all_digits(whole) && all_digits(frac),
    }
}

fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;
    use entforge_core::{ClassKind, EditorHint, SchemaBuilder};

    fn build(source: &str) -> Schema {
        let doc = parse_document(source).unwrap();
        let mut builder = SchemaBuilder::new();
        for class in doc.classes {
            builder.add_class(class).unwrap();
        }
        if let Some(size) = doc.map_size {
            builder.set_map_size(size);
        }
        builder.build().unwrap()
    }

    /// Fields with the declaring class blanked, for comparing across files
    fn fields_of(schema: &Schema, name: &str) -> Vec<FieldSpec> {
        schema
            .lookup(name)
            .unwrap()
            .fields
            .iter()
            .cloned()
            .map(|mut f| {
                f.declared_in = None;
                f
            })
            .collect()
    }

    const SOURCE: &str = r#"
@mapsize(-16384, 16384)

@BaseClass = Targetname
[
    targetname(target_source) report : "Name" : : "The name other entities use."
    input Kill(void) : "Removes this entity."
]

@SolidClass base(Targetname) sphere(distmax) = func_particles : "Brush particle " + "spawner."
[
    solid(choices) readonly : "Solid" : 0 =
    [
        0 : "Non-solid"
    ]
    spawnrate(integer) : "Spawn Rate" : 40
    tint(color255) : "Tint" : "255 128 0 200"
    offset(vector) engine : "Offset" : "0 0 -16.5"
    quote(string) : "Say \"hi\"" : "C:\\maps\\a.vmf"
    spawnflags(flags) =
    [
        1 : "Start on" : 1
        2 : "Loop" : 0
    ]
    input TurnOn(void) : "Start spawning."
    output OnSpawn(integer)
]
"#;

    #[test]
    fn test_round_trip_preserves_fields() {
        let first = build(SOURCE);
        let text = schema_to_string(&first, &ExportConfig::default());
        let second = build(&text);

        assert_eq!(second.len(), 1);
        assert_eq!(second.map_size(), first.map_size());
        assert_eq!(fields_of(&first, "func_particles"), fields_of(&second, "func_particles"));

        let class = second.lookup("func_particles").unwrap();
        assert_eq!(class.description, "Brush particle spawner.");
        assert_eq!(class.hint("sphere"), Some(&EditorHint::new("sphere").with_arg("distmax")));
        let inputs: Vec<_> = class.inputs.iter().map(|io| io.name.as_str()).collect();
        assert_eq!(inputs, vec!["Kill", "TurnOn"]);
        assert_eq!(class.outputs[0].payload, Some(ValueKind::Integer));
    }

    #[test]
    fn test_round_trip_with_bases() {
        let first = build(SOURCE);
        let config = ExportConfig {
            include_base_classes: true,
            ..ExportConfig::default()
        };
        let text = schema_to_string(&first, &config);
        assert!(text.contains("@BaseClass = Targetname"));
        assert!(text.contains("base(Targetname)"));

        let second = build(&text);
        assert_eq!(second.len(), 2);
        assert_eq!(fields_of(&first, "func_particles"), fields_of(&second, "func_particles"));
    }

    #[test]
    fn test_editor_config_hides_engine_fields() {
        let schema = build(SOURCE);
        let text = schema_to_string(&schema, &ExportConfig::editor());
        assert!(!text.contains("offset("));
        assert!(text.contains("spawnrate(integer)"));
    }

    #[test]
    fn test_help_text_can_be_dropped() {
        let schema = build(SOURCE);
        let config = ExportConfig {
            include_help_text: false,
            ..ExportConfig::default()
        };
        let text = schema_to_string(&schema, &config);
        assert!(!text.contains("The name other entities use."));
        assert!(text.contains("targetname(target_source) report : \"Name\"\n"));
    }

    #[test]
    fn test_class_layout() {
        let class = EntityClass::new("info_null", ClassKind::Point)
            .with_field(FieldSpec::new("targetname", ValueKind::String).with_label("Name"))
            .with_io(IOSpec::input("Kill", None));
        let mut out = String::new();
        write_class(&mut out, &class, &ExportConfig::default()).unwrap();
        assert_eq!(
            out,
            "@PointClass = info_null\n[\n    targetname(string) : \"Name\"\n\n    input Kill(void)\n]\n"
        );
    }

    #[test]
    fn test_inherited_hints_survive_without_bases() {
        let schema = build(
            r#"
            @BaseClass sphere(distmax) studio("models/a.mdl") = BModelParticleSpawner [
                spawnrate(integer) : "Spawn Rate" : 40
            ]
            @SolidClass base(BModelParticleSpawner) = func_dustmotes []
            "#,
        );
        let text = schema_to_string(&schema, &ExportConfig::default());
        assert!(!text.contains("BModelParticleSpawner"));
        assert!(text.contains("@SolidClass sphere(distmax) studio(\"models/a.mdl\") = func_dustmotes"));

        let second = build(&text);
        let motes = second.lookup("func_dustmotes").unwrap();
        assert_eq!(motes.hint("sphere"), Some(&EditorHint::new("sphere").with_arg("distmax")));
        assert_eq!(
            motes.hint("studio"),
            Some(&EditorHint::new("studio").with_arg("\"models/a.mdl\""))
        );
        assert!(motes.field("spawnrate").is_some());
    }

    const TAGGED: &str = r#"
@PointClass appliesto(EP1, EP2, TF2) = info_shared
[
    skin(integer) : "Skin"
    skin[SINCE_EP2](integer) : "Skin" : 2
    scale[PROP_SCALING](float) : "Scale" : 1
    script[!TF2, +VSCRIPT](string) : "Script"
    input Break(void)
    input Break[TF2](integer) : "Break with damage."
]

@PointClass appliesto(P2) = info_portal []

@BaseClass appliesto(P2) = PortalLinked
[
    linkage(string) : "Linkage"
]

@PointClass base(PortalLinked) = info_everywhere
[
    origin(vector) : "Origin"
]
"#;

    #[test]
    fn test_tag_filtered_export() {
        let schema = build(TAGGED);

        let ep1 = schema_to_string(&schema, &ExportConfig::default().with_tags(["EP1"]));
        assert!(ep1.contains("@PointClass = info_shared"));
        assert!(!ep1.contains("appliesto"));
        assert!(ep1.contains("skin(integer) : \"Skin\"\n"));
        assert!(!ep1.contains("scale("));
        assert!(!ep1.contains("info_portal"));
        assert!(ep1.contains("info_everywhere"));
        assert!(ep1.contains("origin(vector)"));
        assert!(!ep1.contains("linkage("));

        let p2 = schema_to_string(&schema, &ExportConfig::default().with_tags(["P2"]));
        assert!(p2.contains("linkage(string)"));
        assert!(p2.contains("info_portal"));
        assert!(ep1.contains("input Break(void)"));

        let tf2 = schema_to_string(&schema, &ExportConfig::default().with_tags(["TF2"]));
        assert!(tf2.contains("skin(integer) : \"Skin\" : 2"));
        assert!(tf2.contains("scale(float)"));
        assert!(tf2.contains("input Break(integer)"));
        assert!(!tf2.contains("input Break(void)"));
        assert!(!tf2.contains("script("));
        assert!(!tf2.contains("[SINCE_EP2]"));

        let second = build(&tf2);
        let shared = second.lookup("info_shared").unwrap();
        assert_eq!(shared.fields.len(), 2);
        assert!(shared.fields.iter().all(|f| f.tags.is_empty()));
        assert!(shared.applies_to().is_empty());
    }

    #[test]
    fn test_tags_written_without_filter() {
        let schema = build(TAGGED);
        let text = schema_to_string(&schema, &ExportConfig::default());
        assert!(text.contains("appliesto(EP1, EP2, TF2)"));
        assert!(text.contains("skin[SINCE_EP2](integer)"));
        assert!(text.contains("script[!TF2, +VSCRIPT](string)"));
        assert!(text.contains("input Break[TF2](integer)"));

        let second = build(&text);
        let shared = second.lookup("info_shared").unwrap();
        assert_eq!(shared.fields, schema.lookup("info_shared").unwrap().fields);
        assert_eq!(shared.inputs.len(), 2);
    }

    #[test]
    fn test_number_detection() {
        assert!(is_number("0"));
        assert!(is_number("-12"));
        assert!(is_number("0.5"));
        assert!(!is_number("."));
        assert!(!is_number("1."));
        assert!(!is_number("-"));
        assert!(!is_number("models/a.mdl"));
    }
}
