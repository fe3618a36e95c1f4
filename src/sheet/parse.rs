//! Text grammar for sectioned sheets.
//!
//! ```text
//! [SectionName] anything after the bracket is ignored
//! key1,value1
//! [OtherSection]
//! field1,field2
//! v1,v2
//! ```
//!
//! Each line is read with CSV rules (double-quote quoting, surrounding
//! whitespace trimmed). Blank lines never belong to a section. Lines before
//! the first section header are ignored.

use tracing::{debug, warn};

use super::{classify, Data, Section, SectionKind, SectionedSheet, Settings};
use crate::error::ParseError;

/// Parse a whole document into a [`SectionedSheet`].
///
/// The only hard failures are malformed section headers; everything else
/// degrades gracefully (short rows are padded, long rows truncated, extra
/// settings fields dropped).
pub fn parse_sectioned_sheet(text: &str) -> Result<SectionedSheet, ParseError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut sheet = SectionedSheet::new();
    let mut current: Option<SectionBuilder> = None;
    let mut preamble_lines = 0usize;

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();

        if let Some(name) = section_header(line, trimmed)? {
            if let Some(builder) = current.take() {
                sheet.push(builder.finish());
            }
            current = Some(SectionBuilder::new(name));
            continue;
        }

        if trimmed.is_empty() {
            continue;
        }

        match current.as_mut() {
            Some(builder) => builder.push_line(line, trimmed)?,
            None => preamble_lines += 1,
        }
    }

    if let Some(builder) = current.take() {
        sheet.push(builder.finish());
    }

    if preamble_lines > 0 {
        warn!(
            lines = preamble_lines,
            "ignoring text before the first section header"
        );
    }
    debug!(sections = sheet.len(), "parsed sectioned sheet");

    Ok(sheet)
}

/// Recognize a `[Name]` line. Returns `Ok(None)` for ordinary lines.
fn section_header(line: usize, trimmed: &str) -> Result<Option<String>, ParseError> {
    let Some(rest) = trimmed.strip_prefix('[') else {
        return Ok(None);
    };
    let close = rest
        .find(']')
        .ok_or_else(|| ParseError::UnclosedSectionHeader {
            line,
            text: trimmed.to_string(),
        })?;
    let name = rest[..close].trim();
    if name.is_empty() {
        return Err(ParseError::EmptySectionName { line });
    }
    Ok(Some(name.to_string()))
}

/// Split one line into trimmed CSV fields.
pub(crate) fn split_record(line: usize, text: &str) -> Result<Vec<String>, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let mut record = csv::StringRecord::new();
    match reader.read_record(&mut record) {
        Ok(true) => Ok(record.iter().map(str::to_string).collect()),
        Ok(false) => Ok(Vec::new()),
        Err(err) => Err(ParseError::Record {
            line,
            message: err.to_string(),
        }),
    }
}

enum Body {
    Settings(Settings),
    Data(Option<Data>),
}

struct SectionBuilder {
    name: String,
    body: Body,
}

impl SectionBuilder {
    fn new(name: String) -> Self {
        let body = match classify(&name) {
            SectionKind::Settings => Body::Settings(Settings::new()),
            SectionKind::Data => Body::Data(None),
        };
        Self { name, body }
    }

    fn push_line(&mut self, line: usize, text: &str) -> Result<(), ParseError> {
        let fields = split_record(line, text)?;
        if fields.iter().all(String::is_empty) {
            return Ok(());
        }

        match &mut self.body {
            Body::Settings(settings) => {
                let key = &fields[0];
                if key.is_empty() {
                    debug!(section = %self.name, line, "skipping settings line without a key");
                    return Ok(());
                }
                let value = fields.get(1).cloned().unwrap_or_default();
                settings.insert(key.clone(), value);
            }
            Body::Data(data @ None) => {
                let mut header = fields;
                while header.last().is_some_and(String::is_empty) {
                    header.pop();
                }
                *data = Some(Data::new(header));
            }
            Body::Data(Some(data)) => {
                let width = data.header().len();
                if fields.iter().skip(width).any(|f| !f.is_empty()) {
                    warn!(
                        section = %self.name,
                        line,
                        fields = fields.len(),
                        header = width,
                        "row has more fields than the header; extra fields dropped"
                    );
                }
                data.push_row(fields);
            }
        }
        Ok(())
    }

    fn finish(self) -> Section {
        match self.body {
            Body::Settings(settings) => Section::with_settings(self.name, settings),
            Body::Data(data) => Section::with_data(self.name, data.unwrap_or_default()),
        }
    }
}
