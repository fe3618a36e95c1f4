//! Tabular content of a data section.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::warn;

use crate::error::DataError;

/// A header row plus value rows aligned to it.
///
/// Every stored row has exactly `header.len()` values: short rows are padded
/// with empty strings and long rows are truncated when they are added.
/// Header fields are unique: a repeated name gets a `_2`, `_3`, ... suffix.
/// Rows whose values are all empty are not stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Data {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Data {
    pub fn new<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: unique_header(header.into_iter().map(Into::into)),
            rows: Vec::new(),
        }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Position of a field in the header.
    pub fn column_index(&self, field: &str) -> Option<usize> {
        self.header.iter().position(|h| h == field)
    }

    pub fn has_column(&self, field: &str) -> bool {
        self.column_index(field).is_some()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row given in header order. Returns how many trailing values
    /// were dropped because the row was longer than the header. A row with
    /// no non-empty value within the header is skipped.
    pub fn push_row<I, S>(&mut self, values: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = values.into_iter().map(Into::into).collect();
        let dropped = row.len().saturating_sub(self.header.len());
        row.resize(self.header.len(), String::new());
        self.push_values(row);
        dropped
    }

    /// Append a row given as field → value pairs. Fields missing from the
    /// header are rejected.
    pub fn push_record<'a, I>(&mut self, record: I) -> Result<(), DataError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut row = vec![String::new(); self.header.len()];
        for (field, value) in record {
            let idx = self.column_index(field).ok_or_else(|| DataError::UnknownField {
                field: field.to_string(),
            })?;
            row[idx] = value.to_string();
        }
        self.push_values(row);
        Ok(())
    }

    // An all-empty row serializes as a blank line, which never parses back.
    fn push_values(&mut self, row: Vec<String>) {
        if row.iter().all(String::is_empty) {
            warn!("skipping data row without values");
            return;
        }
        self.rows.push(row);
    }

    pub fn remove_row(&mut self, row: usize) -> Result<Vec<String>, DataError> {
        if row >= self.rows.len() {
            return Err(DataError::RowOutOfRange {
                row,
                len: self.rows.len(),
            });
        }
        Ok(self.rows.remove(row))
    }

    pub fn row(&self, row: usize) -> Option<Row<'_>> {
        self.rows.get(row).map(|values| Row {
            header: &self.header,
            values,
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |values| Row {
            header: &self.header,
            values,
        })
    }

    pub fn get(&self, row: usize, field: &str) -> Option<&str> {
        self.row(row).and_then(|r| r.get(field))
    }

    /// Overwrite one cell, returning the previous value.
    pub fn set(
        &mut self,
        row: usize,
        field: &str,
        value: impl Into<String>,
    ) -> Result<String, DataError> {
        let len = self.rows.len();
        let idx = self
            .column_index(field)
            .ok_or_else(|| DataError::UnknownField {
                field: field.to_string(),
            })?;
        let cells = self
            .rows
            .get_mut(row)
            .ok_or(DataError::RowOutOfRange { row, len })?;
        Ok(std::mem::replace(&mut cells[idx], value.into()))
    }

    /// Add a column at the end of the header; existing rows get an empty value.
    /// Adding a column that already exists is a no-op.
    pub fn add_column(&mut self, field: impl Into<String>) {
        let field = field.into();
        if self.has_column(&field) {
            return;
        }
        self.header.push(field);
        for row in &mut self.rows {
            row.push(String::new());
        }
    }

    /// All values of one column in row order.
    pub fn column<'a>(&'a self, field: &str) -> Option<impl Iterator<Item = &'a str> + 'a> {
        let idx = self.column_index(field)?;
        Some(self.rows.iter().map(move |row| row[idx].as_str()))
    }
}

fn unique_header(fields: impl Iterator<Item = String>) -> Vec<String> {
    let fields: Vec<String> = fields.collect();
    let mut taken: HashSet<String> = HashSet::new();
    let mut header = Vec::with_capacity(fields.len());
    for field in fields {
        let mut name = field.clone();
        let mut n = 2;
        while taken.contains(&name) {
            name = format!("{}_{}", field, n);
            n += 1;
        }
        if name != field {
            warn!(field = %field, renamed = %name, "repeated header field renamed");
        }
        taken.insert(name.clone());
        header.push(name);
    }
    header
}

/// Borrowed view of one data row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    header: &'a [String],
    values: &'a [String],
}

impl<'a> Row<'a> {
    pub fn get(&self, field: &str) -> Option<&'a str> {
        let idx = self.header.iter().position(|h| h == field)?;
        self.values.get(idx).map(String::as_str)
    }

    /// Values in header order.
    pub fn values(&self) -> &'a [String] {
        self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        let header = self.header;
        let values = self.values;
        header
            .iter()
            .zip(values.iter())
            .map(|(h, v)| (h.as_str(), v.as_str()))
    }

    pub fn to_map(&self) -> IndexMap<String, String> {
        self.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}
