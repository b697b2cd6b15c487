//! Attribute codec
//!
//! Attributes are the query-string-like parameter bag attached to a command
//! and embedded in a response's `message` field.
//!
//! ## Wire Format
//! ```text
//! pid=1&level=10&flag&pid=2
//! ```
//! - `key=value` segments, one per value
//! - bare `key` for a flag with no value
//! - segments joined with `&`, no escaping

use std::fmt;

const SEPARATOR: char = '&';
const ASSIGN: char = '=';

/// Ordered attribute set: name -> list of values
///
/// An empty value list is a bare flag. Keys are unique and keep the order
/// in which they were first added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, Vec<String>)>,
}

impl Attributes {
    /// Empty attribute set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder
    pub fn builder() -> AttributesBuilder {
        AttributesBuilder::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// All values for `key`; empty slice for a flag
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    /// First value for `key`, if any
    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.first()).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Encode to the wire form
    pub fn encode(&self) -> String {
        let mut segments = Vec::new();
        for (key, values) in &self.entries {
            if values.is_empty() {
                segments.push(key.clone());
            } else {
                for value in values {
                    segments.push(format!("{key}{ASSIGN}{value}"));
                }
            }
        }
        segments.join("&")
    }

    /// Decode from the wire form
    ///
    /// Never fails. Repeated keys accumulate values in order.
    pub fn decode(input: &str) -> Self {
        let mut builder = AttributesBuilder::default();
        if input.is_empty() {
            return builder.build();
        }

        for segment in input.split(SEPARATOR) {
            builder = match segment.split_once(ASSIGN) {
                Some((key, value)) => builder.value(key, value),
                None => builder.flag(segment),
            };
        }

        builder.build()
    }

    fn entry_mut(&mut self, key: &str) -> &mut Vec<String> {
        let idx = match self.entries.iter().position(|(k, _)| k == key) {
            Some(idx) => idx,
            None => {
                self.entries.push((key.to_string(), Vec::new()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx].1
    }
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Additive builder for [`Attributes`]
#[derive(Debug, Default)]
pub struct AttributesBuilder {
    attrs: Attributes,
}

impl AttributesBuilder {
    /// Add a bare flag (no-op if the key already exists)
    pub fn flag(mut self, key: &str) -> Self {
        self.attrs.entry_mut(key);
        self
    }

    /// Append one value to `key`
    pub fn value(mut self, key: &str, value: impl ToString) -> Self {
        self.attrs.entry_mut(key).push(value.to_string());
        self
    }

    /// Append several values to `key`
    pub fn values<I, V>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        let entry = self.attrs.entry_mut(key);
        entry.extend(values.into_iter().map(|v| v.to_string()));
        self
    }

    pub fn build(self) -> Attributes {
        self.attrs
    }
}
