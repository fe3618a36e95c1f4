//! Structured tree form of a sheet.
//!
//! The tree is a JSON object keyed by section name:
//!
//! ```json
//! {
//!   "Header": { "FileFormatVersion": 2, "RunName": "run1" },
//!   "BCLConvert_Data": {
//!     "header": ["Sample_ID", "Index"],
//!     "data": [ { "Sample_ID": "S1", "Index": "ACGT" } ]
//!   }
//! }
//! ```
//!
//! This is what schema validators see and what the JSON interchange format
//! carries. Settings values that are canonical integers become JSON numbers;
//! everything else stays a string.

use serde_json::{Map, Value};
use tracing::warn;

use super::{classify, Data, Section, SectionContent, SectionKind, SectionedSheet, Settings};
use crate::error::ParseError;

/// Key holding the field names of a data section.
pub const HEADER_KEY: &str = "header";
/// Key holding the rows of a data section.
pub const ROWS_KEY: &str = "data";

impl SectionedSheet {
    /// Build the tree form.
    ///
    /// Only the first section of a given name appears in the tree.
    pub fn to_tree(&self) -> Value {
        let mut tree = Map::new();
        for section in &self.sections {
            if tree.contains_key(section.name()) {
                warn!(
                    section = section.name(),
                    "duplicate section name; only the first occurrence is in the tree form"
                );
                continue;
            }
            tree.insert(section.name().to_string(), section_to_tree(section));
        }
        Value::Object(tree)
    }

    /// Encode the tree form as JSON text.
    pub fn to_json(&self, pretty: bool) -> Result<String, serde_json::Error> {
        let tree = self.to_tree();
        if pretty {
            serde_json::to_string_pretty(&tree)
        } else {
            serde_json::to_string(&tree)
        }
    }

    /// Rebuild a sheet from its tree form.
    ///
    /// Section kinds are derived from the names. A data section may be given
    /// either as `{"header": [...], "data": [...]}` or as a bare array of row
    /// objects.
    pub fn from_tree(tree: &Value) -> Result<Self, ParseError> {
        let Value::Object(map) = tree else {
            return Err(ParseError::InvalidTree {
                section: String::new(),
                reason: format!("expected an object of sections, found {}", type_name(tree)),
            });
        };

        let mut sheet = SectionedSheet::new();
        for (name, value) in map {
            let section = match classify(name) {
                SectionKind::Settings => {
                    Section::with_settings(name.clone(), settings_from_tree(name, value)?)
                }
                SectionKind::Data => Section::with_data(name.clone(), data_from_tree(name, value)?),
            };
            sheet.push(section);
        }
        Ok(sheet)
    }

    /// Parse the JSON interchange format.
    pub fn from_json(json: &str) -> Result<Self, ParseError> {
        let tree: Value = serde_json::from_str(json)?;
        Self::from_tree(&tree)
    }
}

fn section_to_tree(section: &Section) -> Value {
    match section.content() {
        SectionContent::Settings(settings) => {
            let map: Map<String, Value> = settings
                .iter()
                .map(|(k, v)| (k.to_string(), settings_value(v)))
                .collect();
            Value::Object(map)
        }
        SectionContent::Data(data) => {
            let header = data
                .header()
                .iter()
                .map(|h| Value::String(h.clone()))
                .collect();
            let rows = data
                .rows()
                .map(|row| {
                    let map: Map<String, Value> = row
                        .iter()
                        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
                        .collect();
                    Value::Object(map)
                })
                .collect();
            let mut map = Map::new();
            map.insert(HEADER_KEY.to_string(), Value::Array(header));
            map.insert(ROWS_KEY.to_string(), Value::Array(rows));
            Value::Object(map)
        }
    }
}

/// Integers whose text form is canonical become numbers; the rest stay strings.
fn settings_value(raw: &str) -> Value {
    if let Ok(n) = raw.parse::<i64>() {
        if n.to_string() == raw {
            return Value::from(n);
        }
    }
    Value::String(raw.to_string())
}

fn scalar_to_string(section: &str, value: &Value) -> Result<String, ParseError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        Value::Array(_) | Value::Object(_) => Err(ParseError::InvalidTree {
            section: section.to_string(),
            reason: format!("expected a scalar value, found {}", type_name(value)),
        }),
    }
}

fn settings_from_tree(name: &str, value: &Value) -> Result<Settings, ParseError> {
    let Value::Object(map) = value else {
        return Err(ParseError::InvalidTree {
            section: name.to_string(),
            reason: format!(
                "settings section must be an object, found {}",
                type_name(value)
            ),
        });
    };
    let mut settings = Settings::new();
    for (key, value) in map {
        settings.insert(key.clone(), scalar_to_string(name, value)?);
    }
    Ok(settings)
}

fn data_from_tree(name: &str, value: &Value) -> Result<Data, ParseError> {
    let invalid = |reason: String| ParseError::InvalidTree {
        section: name.to_string(),
        reason,
    };

    let (header, rows) = match value {
        Value::Object(map) => {
            let header = match map.get(HEADER_KEY) {
                Some(Value::Array(fields)) => fields
                    .iter()
                    .map(|f| scalar_to_string(name, f))
                    .collect::<Result<Vec<_>, _>>()?,
                Some(other) => {
                    return Err(invalid(format!(
                        "'{}' must be an array, found {}",
                        HEADER_KEY,
                        type_name(other)
                    )))
                }
                None => Vec::new(),
            };
            let rows = match map.get(ROWS_KEY) {
                Some(Value::Array(rows)) => rows.as_slice(),
                Some(other) => {
                    return Err(invalid(format!(
                        "'{}' must be an array, found {}",
                        ROWS_KEY,
                        type_name(other)
                    )))
                }
                None => [].as_slice(),
            };
            (header, rows)
        }
        Value::Array(rows) => (union_of_keys(rows), rows.as_slice()),
        other => {
            return Err(invalid(format!(
                "data section must be an object or an array, found {}",
                type_name(other)
            )))
        }
    };

    let mut data = Data::new(header);
    for (idx, row) in rows.iter().enumerate() {
        let Value::Object(fields) = row else {
            return Err(invalid(format!(
                "row {} must be an object, found {}",
                idx,
                type_name(row)
            )));
        };
        let mut values = vec![String::new(); data.header().len()];
        for (field, value) in fields {
            match data.column_index(field) {
                Some(col) => values[col] = scalar_to_string(name, value)?,
                None => warn!(section = name, row = idx, field = %field, "dropping field not in header"),
            }
        }
        data.push_row(values);
    }
    Ok(data)
}

fn union_of_keys(rows: &[Value]) -> Vec<String> {
    let mut header: Vec<String> = Vec::new();
    for row in rows {
        if let Value::Object(fields) = row {
            for key in fields.keys() {
                if !header.contains(key) {
                    header.push(key.clone());
                }
            }
        }
    }
    header
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
