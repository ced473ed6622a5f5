use serde_json::Value;
use stream_api::{Codec, Event, PluginError};

/// Settings for the format-string codec (`[codec.format]`).
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
pub struct FormatCodecConfig {
    /// Template such as `"%{[host.name]} %{[message]}"`.
    pub string: String,
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    /// `path` is dotted, as taken by [`Event::get_path`].
    Field { path: String, default: Option<String> },
}

/// Renders each event through a template.
///
/// Placeholders are `%{[field]}`. Nested fields use dots (`%{[host.name]}`)
/// or chained brackets (`%{[host][name]}`). `%{[field]:fallback}` renders
/// `fallback` when the field is missing; without a fallback a missing field
/// is an encoding error. String values are inserted raw, everything else
/// as compact JSON.
#[derive(Debug)]
pub struct FormatCodec {
    segments: Vec<Segment>,
}

impl FormatCodec {
    pub fn new(config: &FormatCodecConfig) -> Result<Self, PluginError> {
        if config.string.is_empty() {
            return Err(PluginError::config("format codec: empty format string"));
        }
        Ok(Self { segments: parse(&config.string)? })
    }
}

impl Codec for FormatCodec {
    fn encode(&self, event: &Event) -> Result<Vec<u8>, PluginError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field { path, default } => match event.get_path(path) {
                    Some(Value::String(s)) => out.push_str(s),
                    Some(other) => out.push_str(&serde_json::to_string(other)?),
                    None => match default {
                        Some(d) => out.push_str(d),
                        None => {
                            return Err(PluginError::format_err(format!(
                                "format codec: field '{path}' not found"
                            )));
                        }
                    },
                },
            }
        }
        Ok(out.into_bytes())
    }
}

fn parse(template: &str) -> Result<Vec<Segment>, PluginError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = template;

    while let Some(start) = rest.find("%{") {
        literal.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or_else(|| {
            PluginError::config(format!("format codec: unclosed placeholder in '{template}'"))
        })?;
        if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        segments.push(parse_field(&after[..end])?);
        rest = &after[end + 1..];
    }
    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

/// `[a][b.c]:default` → path `a.b.c` with an optional default.
fn parse_field(expr: &str) -> Result<Segment, PluginError> {
    let (selector, default) = match expr.find("]:") {
        Some(i) => (&expr[..=i], Some(expr[i + 2..].to_string())),
        None => (expr, None),
    };

    let mut path = Vec::new();
    let mut rest = selector;
    while !rest.is_empty() {
        let inner = rest
            .strip_prefix('[')
            .and_then(|r| r.find(']').map(|i| (&r[..i], &r[i + 1..])));
        let Some((name, tail)) = inner else {
            return Err(PluginError::config(format!(
                "format codec: bad field selector '%{{{expr}}}'"
            )));
        };
        for part in name.split('.') {
            if part.is_empty() {
                return Err(PluginError::config(format!(
                    "format codec: empty field name in '%{{{expr}}}'"
                )));
            }
            path.push(part);
        }
        rest = tail;
    }

    if path.is_empty() {
        return Err(PluginError::config("format codec: empty placeholder"));
    }
    Ok(Segment::Field { path: path.join("."), default })
}
