//! Rendering synthesized values to wire text.

use crate::synth::ATTRIBUTE_PREFIX;
use serde_json::{Map, Value};

/// Wire format chosen from a media type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Json,
    Xml,
    /// Anything else: the response description is sent instead
    Description,
}

impl BodyFormat {
    pub fn for_content_type(content_type: &str) -> Self {
        let lower = content_type.to_ascii_lowercase();
        if lower.contains("json") {
            BodyFormat::Json
        } else if lower.contains("xml") {
            BodyFormat::Xml
        } else {
            BodyFormat::Description
        }
    }
}

/// Render a synthesized value for the declared content type.
///
/// Without a content type, or with one that is neither JSON nor XML, the
/// response description is the body.
pub fn render(value: Option<&Value>, content_type: Option<&str>, description: &str) -> String {
    let format = content_type
        .map(BodyFormat::for_content_type)
        .unwrap_or(BodyFormat::Description);
    match format {
        BodyFormat::Json => match value {
            Some(value) => value.to_string(),
            None => String::new(),
        },
        BodyFormat::Xml => value.map(to_xml).unwrap_or_default(),
        BodyFormat::Description => description.to_string(),
    }
}

/// Render a value as XML using object keys as element names; keys carrying
/// the attribute prefix become attributes of the enclosing element.
pub fn to_xml(value: &Value) -> String {
    let mut out = String::new();
    match value {
        Value::Object(map) => write_children(&mut out, map),
        Value::Array(items) => {
            for item in items {
                out.push_str(&to_xml(item));
            }
        }
        other => out.push_str(&escape(&scalar_text(other))),
    }
    out
}

fn write_children(out: &mut String, map: &Map<String, Value>) {
    for (key, value) in map {
        if key.starts_with(ATTRIBUTE_PREFIX) {
            continue;
        }
        match value {
            Value::Array(items) => {
                for item in items {
                    write_element(out, key, item);
                }
            }
            _ => write_element(out, key, value),
        }
    }
}

fn write_element(out: &mut String, name: &str, value: &Value) {
    out.push('<');
    out.push_str(name);
    match value {
        Value::Object(map) => {
            for (key, attr) in map {
                if let Some(attr_name) = key.strip_prefix(ATTRIBUTE_PREFIX) {
                    out.push(' ');
                    out.push_str(attr_name);
                    out.push_str("=\"");
                    out.push_str(&escape(&scalar_text(attr)));
                    out.push('"');
                }
            }
            out.push('>');
            write_children(out, map);
        }
        Value::Array(items) => {
            // nested arrays have no element name of their own
            out.push('>');
            for item in items {
                out.push_str(&to_xml(item));
            }
        }
        other => {
            out.push('>');
            out.push_str(&escape(&scalar_text(other)));
        }
    }
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}
