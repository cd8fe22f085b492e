//! Property coercion.
//!
//! Editors hand custom properties over as plain strings. Before export each
//! value is promoted to the narrowest type it parses as, in the order
//! boolean, integer, float, string. One designated key (`components` by
//! default) is always split into a list of strings instead.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::source::PropertySource;

/// Key whose value is always exported as a list of strings.
pub const DEFAULT_LIST_KEY: &str = "components";

/// Separator between entries of the list key.
pub const DEFAULT_LIST_SEPARATOR: char = ';';

/// Exported properties, sorted by name for deterministic output.
pub type Properties = BTreeMap<String, PropertyValue>;

/// A typed property value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Boolean(bool),
    Integer(i128),
    Float(f64),
    String(String),
    StringList(Vec<String>),
}

/// How string properties are coerced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coercion {
    /// The key that is split into a `StringList`.
    pub list_key: String,
    /// Separator used when splitting the list key.
    pub list_separator: char,
}

impl Default for Coercion {
    fn default() -> Self {
        Self {
            list_key: DEFAULT_LIST_KEY.to_string(),
            list_separator: DEFAULT_LIST_SEPARATOR,
        }
    }
}

impl Coercion {
    /// Coerce a single raw value stored under `key`.
    pub fn coerce(&self, key: &str, raw: &str) -> PropertyValue {
        if key == self.list_key {
            split_list(raw, self.list_separator)
        } else {
            coerce_value(raw)
        }
    }

    /// Coerce every property exposed by `source`.
    pub fn coerce_all<S: PropertySource + ?Sized>(&self, source: &S) -> Properties {
        source
            .property_keys()
            .into_iter()
            .map(|key| {
                let raw = source.property_as_string(&key).unwrap_or_default();
                let value = self.coerce(&key, &raw);
                (key, value)
            })
            .collect()
    }
}

/// Promote a raw string through the boolean, integer, float, string ladder.
///
/// The first rule that parses wins; nothing here ever fails. Numbers may be
/// surrounded by whitespace. Integers keep their exact value up to the `i128`
/// range. Infinite and NaN floats stay strings since the JSON output cannot
/// represent them.
pub fn coerce_value(raw: &str) -> PropertyValue {
    match raw {
        "true" => return PropertyValue::Boolean(true),
        "false" => return PropertyValue::Boolean(false),
        _ => {}
    }

    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<i128>() {
        return PropertyValue::Integer(n);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if f.is_finite() {
            return PropertyValue::Float(f);
        }
    }

    PropertyValue::String(raw.to_string())
}

/// Strip all whitespace, then split on `separator`.
///
/// Empty segments are kept, so `"a;b;"` yields `["a", "b", ""]`.
pub fn split_list(raw: &str, separator: char) -> PropertyValue {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    PropertyValue::StringList(compact.split(separator).map(str::to_string).collect())
}

/// Coerce properties with the default list key.
pub fn coerce_properties<S: PropertySource + ?Sized>(source: &S) -> Properties {
    Coercion::default().coerce_all(source)
}
