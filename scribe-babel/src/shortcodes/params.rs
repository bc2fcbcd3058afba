//! Shortcode attribute strings
//!
//! Parsing is best effort: fragments that match no attribute form are dropped.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Ordered attribute map. Serializes as a JSON object in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// Set `key`, replacing an existing value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(name, _)| *name == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.0.iter().position(|(name, _)| name == key)?;
        Some(self.0.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut attributes = Attributes::new();
        for (key, value) in iter {
            attributes.insert(key, value);
        }
        attributes
    }
}

impl Serialize for Attributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Attributes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AttributesVisitor;

        impl<'de> Visitor<'de> for AttributesVisitor {
            type Value = Attributes;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of attribute names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Attributes, A::Error> {
                let mut attributes = Attributes::new();
                while let Some((key, value)) = access.next_entry::<String, AttrValue>()? {
                    attributes.insert(key, value.0);
                }
                Ok(attributes)
            }
        }

        deserializer.deserialize_map(AttributesVisitor)
    }
}

/// Attribute value that also accepts JSON numbers and booleans.
struct AttrValue(String);

impl<'de> Deserialize<'de> for AttrValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(AttrValue(match value {
            serde_json::Value::String(s) => s,
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        }))
    }
}

/// Normalize a raw attribute string.
///
/// A BBCode positional value (`=value` or `="value"`) passes through unchanged.
/// Otherwise `key=value`, `key='value'` and `key="value"` pairs are kept, single
/// quotes are turned into double quotes, and bare words stay as they are.
pub fn normalize_shortcode_params(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('=') {
        return trimmed.to_string();
    }
    fragments(trimmed)
        .into_iter()
        .map(|fragment| match fragment {
            Fragment::Bare(word) => word.to_string(),
            Fragment::Pair {
                key,
                value,
                quote: Some('"'),
            } => format!("{key}=\"{value}\""),
            Fragment::Pair {
                key,
                value,
                quote: Some(_),
            } => format!("{key}=\"{}\"", escape(&unescape(value))),
            Fragment::Pair {
                key,
                value,
                quote: None,
            } => format!("{key}={value}"),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse an attribute string into an ordered map.
///
/// `positional` names the attribute that receives a leading `=value`. Bare words
/// become `"true"`.
pub fn parse_attributes(params: &str, positional: &str) -> Attributes {
    let mut attributes = Attributes::new();
    let mut rest = params.trim();

    if let Some(after) = rest.strip_prefix('=') {
        let after = after.trim_start();
        let (value, remainder) = take_positional_value(after);
        attributes.insert(positional, value);
        rest = remainder.trim_start();
    }

    for fragment in fragments(rest) {
        match fragment {
            Fragment::Bare(word) => attributes.insert(word, "true"),
            Fragment::Pair {
                key,
                value,
                quote: Some(_),
            } => attributes.insert(key, unescape(value)),
            Fragment::Pair { key, value, .. } => attributes.insert(key, value),
        }
    }
    attributes
}

/// One recognised piece of an attribute string. Values are raw (still escaped).
#[derive(Debug, PartialEq)]
enum Fragment<'a> {
    Pair {
        key: &'a str,
        value: &'a str,
        quote: Option<char>,
    },
    Bare(&'a str),
}

fn fragments(text: &str) -> Vec<Fragment<'_>> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        if bytes[pos].is_ascii_whitespace() {
            pos += 1;
            continue;
        }
        if bytes[pos] == b'"' || bytes[pos] == b'\'' {
            // stray quoted string with no key
            pos = skip_quoted(bytes, pos).1;
            continue;
        }
        let key_start = pos;
        while pos < bytes.len()
            && !bytes[pos].is_ascii_whitespace()
            && !matches!(bytes[pos], b'=' | b'"' | b'\'')
        {
            pos += 1;
        }
        let key = &text[key_start..pos];
        let mut look = pos;
        while look < bytes.len() && bytes[look].is_ascii_whitespace() {
            look += 1;
        }
        if look < bytes.len() && bytes[look] == b'=' {
            look += 1;
            while look < bytes.len() && bytes[look].is_ascii_whitespace() {
                look += 1;
            }
            let (value, quote, next) = if look < bytes.len() && matches!(bytes[look], b'"' | b'\'') {
                let (inner, next) = skip_quoted(bytes, look);
                (&text[inner], Some(bytes[look] as char), next)
            } else {
                let value_start = look;
                while look < bytes.len() && !bytes[look].is_ascii_whitespace() {
                    look += 1;
                }
                (&text[value_start..look], None, look)
            };
            if is_name(key) {
                out.push(Fragment::Pair { key, value, quote });
            }
            pos = next;
        } else {
            if is_name(key) {
                out.push(Fragment::Bare(key));
            }
            pos = pos.max(key_start + 1);
        }
    }
    out
}

/// Skip a quoted string starting at `start`. Returns the inner range and the
/// position after the closing quote (or the end of input).
fn skip_quoted(bytes: &[u8], start: usize) -> (std::ops::Range<usize>, usize) {
    let quote = bytes[start];
    let mut pos = start + 1;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 2,
            b if b == quote => return (start + 1..pos, pos + 1),
            _ => pos += 1,
        }
    }
    (start + 1..bytes.len(), bytes.len())
}

fn is_name(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn take_positional_value(text: &str) -> (String, &str) {
    let mut chars = text.char_indices();
    match chars.next() {
        Some((_, quote @ ('"' | '\''))) => {
            let mut escaped = false;
            for (index, ch) in chars {
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == quote {
                    return (unescape(&text[1..index]), &text[index + 1..]);
                }
            }
            (unescape(&text[1..]), "")
        }
        Some(_) => {
            let end = text.find(char::is_whitespace).unwrap_or(text.len());
            (text[..end].to_string(), &text[end..])
        }
        None => (String::new(), ""),
    }
}

/// Render attributes back into a parameter string.
///
/// A map holding only the positional attribute is written in BBCode form
/// (`="value"`).
pub fn build_params(attributes: &Attributes, positional: Option<&str>) -> String {
    if let (Some(positional), 1) = (positional, attributes.len()) {
        if let Some(value) = attributes.get(positional) {
            return format!("=\"{}\"", escape(value));
        }
    }
    attributes
        .iter()
        .map(|(key, value)| format!("{key}=\"{}\"", escape(value)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some(next) => out.push(next),
                None => out.push('\\'),
            }
        } else {
            out.push(ch);
        }
    }
    out
}
