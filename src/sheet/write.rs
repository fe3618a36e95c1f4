//! Text serialization for sectioned sheets.

use std::fmt;
use std::io::{self, Write};

use super::{SectionContent, SectionedSheet};

impl SectionedSheet {
    /// Write the sheet in the `[Section]` text grammar.
    ///
    /// Sections are separated by one blank line. Fields that need it are
    /// quoted with CSV rules so the output parses back to the same sheet.
    pub fn write_to<W: Write>(&self, mut out: W) -> io::Result<()> {
        for (idx, section) in self.sections.iter().enumerate() {
            if idx > 0 {
                writeln!(out)?;
            }
            writeln!(out, "[{}]", section.name())?;

            match section.content() {
                SectionContent::Settings(settings) => {
                    for (key, value) in settings {
                        write_record(&mut out, &[key, value])?;
                    }
                }
                SectionContent::Data(data) => {
                    if !data.header().is_empty() {
                        write_record(&mut out, data.header())?;
                        for row in data.rows() {
                            write_record(&mut out, row.values())?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// The sheet as text.
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

/// Write one CSV line. A record whose first field starts with `[` is fully
/// quoted so it is not read back as a section header.
fn write_record<W, S>(out: &mut W, fields: &[S]) -> io::Result<()>
where
    W: Write,
    S: AsRef<str>,
{
    let quote_style = match fields.first() {
        Some(first) if first.as_ref().trim_start().starts_with('[') => csv::QuoteStyle::Always,
        _ => csv::QuoteStyle::Necessary,
    };
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quote_style(quote_style)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out);
    writer.write_record(fields.iter().map(|f| f.as_ref()))?;
    writer.flush()
}

impl fmt::Display for SectionedSheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::new();
        self.write_to(&mut buf).map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&buf))
    }
}

#[cfg(test)]
mod tests {
    use crate::sheet::{Data, Section, SectionedSheet, Settings};

    #[test]
    fn test_write_settings_and_data() {
        let mut sheet = SectionedSheet::new();
        let header: Settings = [("FileFormatVersion", "2"), ("RunName", "run1")]
            .into_iter()
            .collect();
        sheet.push(Section::with_settings("Header", header));
        let mut data = Data::new(["Sample_ID", "Index"]);
        data.push_row(["S1", "ACGT"]);
        sheet.push(Section::with_data("BCLConvert_Data", data));

        assert_eq!(
            sheet.to_text(),
            "[Header]\nFileFormatVersion,2\nRunName,run1\n\n[BCLConvert_Data]\nSample_ID,Index\nS1,ACGT\n"
        );
    }

    #[test]
    fn test_write_quotes_when_needed() {
        let mut sheet = SectionedSheet::new();
        let header: Settings = [("RunDescription", "a, b")].into_iter().collect();
        sheet.push(Section::with_settings("Header", header));
        assert_eq!(sheet.to_text(), "[Header]\nRunDescription,\"a, b\"\n");
    }

    #[test]
    fn test_write_empty_sections() {
        let mut sheet = SectionedSheet::new();
        sheet.push(Section::new("Cloud_Data"));
        sheet.push(Section::new("Cloud_Settings"));
        assert_eq!(sheet.to_text(), "[Cloud_Data]\n\n[Cloud_Settings]\n");
    }

    #[test]
    fn test_bracketed_first_field_survives_round_trip() {
        let text = "[Header]\n\"[note]\",x\n[Samples]\nSample_ID,Index\n\"[A1]\",ACGT\n";
        let parsed = SectionedSheet::parse(text).unwrap();
        assert_eq!(parsed.settings("Header").unwrap().get("[note]"), Some("x"));

        let written = parsed.to_text();
        assert!(written.contains("\"[note]\",\"x\"\n"), "{written}");
        let reparsed = SectionedSheet::parse(&written).unwrap();
        assert_eq!(reparsed.len(), 2);
        assert_eq!(parsed, reparsed);
    }

    #[test]
    fn test_mutated_sheet_round_trip() {
        let mut data = Data::new(["Sample_ID", "Index", "Description"]);
        data.push_row(["[S1]", "ACGT", "a, \"quoted\" b"]);
        data.push_row(["S2", "", ""]);
        data.push_record([("Index", "TTGC")]).unwrap();
        let mut sheet = SectionedSheet::new();
        sheet.push(Section::with_data("Samples", data));
        let mut header = Settings::new();
        header.insert("[Key]", "v");
        sheet.insert(0, Section::with_settings("Header", header));

        let reparsed = SectionedSheet::parse(&sheet.to_text()).unwrap();
        assert_eq!(sheet, reparsed);
        assert_eq!(reparsed.data("Samples").unwrap().len(), 3);
    }

    #[test]
    fn test_all_empty_row_is_not_written() {
        let mut data = Data::new(["A", "B"]);
        data.push_row(["1", "2"]);
        data.push_row(["", ""]);
        let mut sheet = SectionedSheet::new();
        sheet.push(Section::with_data("Samples", data));
        assert_eq!(sheet.to_text(), "[Samples]\nA,B\n1,2\n");
        assert_eq!(SectionedSheet::parse(&sheet.to_text()).unwrap(), sheet);
    }

    #[test]
    fn test_text_round_trip() {
        let text = "[Header],\nFileFormatVersion,2\nRunName,x ; comment\n\n[Reads]\nRead1Cycles,151\n\n[BCLConvert_Data]\nLane,Sample_ID,Index\n1,S1,ACGT\n2,S2\n";
        let parsed = SectionedSheet::parse(text).unwrap();
        let reparsed = SectionedSheet::parse(&parsed.to_text()).unwrap();
        assert_eq!(parsed, reparsed);
    }
}
