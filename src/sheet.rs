//! Sectioned sheets: the generic `[Section]` + CSV text format.
//!
//! A sheet is an ordered list of named sections. Each section is either a
//! settings section (key/value lines) or a data section (a header line
//! followed by rows). The kind is derived from the section name, see
//! [`classify`].
//!
//! ```
//! use samshee::sheet::{SectionedSheet, SectionKind};
//!
//! let sheet: SectionedSheet = "[Header]\nRunName,run1\n\n[Samples]\nSample_ID,Index\nS1,ACGT\n"
//!     .parse()
//!     .unwrap();
//! assert_eq!(sheet.section("Header").unwrap().kind(), SectionKind::Settings);
//! assert_eq!(sheet.data("Samples").unwrap().get(0, "Index"), Some("ACGT"));
//! ```

use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, ParseError};

pub mod data;
pub mod parse;
pub mod settings;
pub mod tree;
pub mod write;

pub use data::{Data, Row};
pub use settings::Settings;

/// Section names that are settings sections regardless of suffix.
const SETTINGS_SECTION_NAMES: [&str; 2] = ["header", "reads"];

/// Suffix (case-insensitive) that marks a settings section.
const SETTINGS_SUFFIX: &str = "settings";

/// Whether a section holds key/value pairs or a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Settings,
    Data,
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Settings => write!(f, "settings"),
            Self::Data => write!(f, "data"),
        }
    }
}

/// Classify a section by name.
///
/// `Header`, `Reads` and any name ending in `settings` are settings sections
/// (all case-insensitive); everything else is a data section.
pub fn classify(name: &str) -> SectionKind {
    let lower = name.to_ascii_lowercase();
    if SETTINGS_SECTION_NAMES.contains(&lower.as_str()) || lower.ends_with(SETTINGS_SUFFIX) {
        SectionKind::Settings
    } else {
        SectionKind::Data
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionContent {
    Settings(Settings),
    Data(Data),
}

/// One named section of a sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    name: String,
    content: SectionContent,
}

impl Section {
    /// An empty section whose kind follows from its name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let content = match classify(&name) {
            SectionKind::Settings => SectionContent::Settings(Settings::new()),
            SectionKind::Data => SectionContent::Data(Data::default()),
        };
        Self { name, content }
    }

    pub fn with_settings(name: impl Into<String>, settings: Settings) -> Self {
        Self {
            name: name.into(),
            content: SectionContent::Settings(settings),
        }
    }

    pub fn with_data(name: impl Into<String>, data: Data) -> Self {
        Self {
            name: name.into(),
            content: SectionContent::Data(data),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SectionKind {
        match self.content {
            SectionContent::Settings(_) => SectionKind::Settings,
            SectionContent::Data(_) => SectionKind::Data,
        }
    }

    pub fn content(&self) -> &SectionContent {
        &self.content
    }

    pub fn as_settings(&self) -> Option<&Settings> {
        match &self.content {
            SectionContent::Settings(s) => Some(s),
            SectionContent::Data(_) => None,
        }
    }

    pub fn as_settings_mut(&mut self) -> Option<&mut Settings> {
        match &mut self.content {
            SectionContent::Settings(s) => Some(s),
            SectionContent::Data(_) => None,
        }
    }

    pub fn as_data(&self) -> Option<&Data> {
        match &self.content {
            SectionContent::Data(d) => Some(d),
            SectionContent::Settings(_) => None,
        }
    }

    pub fn as_data_mut(&mut self) -> Option<&mut Data> {
        match &mut self.content {
            SectionContent::Data(d) => Some(d),
            SectionContent::Settings(_) => None,
        }
    }
}

/// An ordered list of sections.
///
/// Section names need not be unique. Lookups by name return the first
/// section with that name; [`SectionedSheet::sections_named`] yields all of
/// them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionedSheet {
    sections: Vec<Section>,
}

impl SectionedSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_sections(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    /// Parse sheet text. See [`parse::parse_sectioned_sheet`].
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        parse::parse_sectioned_sheet(text)
    }

    /// Read and parse a whole file.
    pub fn read(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text)?)
    }

    /// Read a whole stream and parse it.
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self, Error> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Ok(Self::parse(&text)?)
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn sections_mut(&mut self) -> &mut [Section] {
        &mut self.sections
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Section> {
        self.sections.iter()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Index of the first section with this name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// First section with this name.
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.name == name)
    }

    /// Every section with this name, in order.
    pub fn sections_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Section> + 'a {
        self.sections.iter().filter(move |s| s.name == name)
    }

    /// Settings of the first section with this name, if it is a settings section.
    pub fn settings(&self, name: &str) -> Option<&Settings> {
        self.section(name).and_then(Section::as_settings)
    }

    pub fn settings_mut(&mut self, name: &str) -> Option<&mut Settings> {
        self.section_mut(name).and_then(Section::as_settings_mut)
    }

    /// Data of the first section with this name, if it is a data section.
    pub fn data(&self, name: &str) -> Option<&Data> {
        self.section(name).and_then(Section::as_data)
    }

    pub fn data_mut(&mut self, name: &str) -> Option<&mut Data> {
        self.section_mut(name).and_then(Section::as_data_mut)
    }

    pub fn push(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// Insert at `index`, clamped to the end of the list.
    pub fn insert(&mut self, index: usize, section: Section) {
        let index = index.min(self.sections.len());
        self.sections.insert(index, section);
    }

    /// Remove the first section with this name.
    pub fn remove(&mut self, name: &str) -> Option<Section> {
        let idx = self.position(name)?;
        Some(self.sections.remove(idx))
    }

    /// Keep only the sections for which `keep` returns true.
    pub fn retain<F: FnMut(&Section) -> bool>(&mut self, keep: F) {
        self.sections.retain(keep);
    }

    pub fn get(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Section> {
        self.sections.get_mut(index)
    }
}

impl FromStr for SectionedSheet {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'a> IntoIterator for &'a SectionedSheet {
    type Item = &'a Section;
    type IntoIter = std::slice::Iter<'a, Section>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Read a sectioned sheet from a file.
pub fn read_sectioned_sheet(path: &Path) -> Result<SectionedSheet, Error> {
    SectionedSheet::read(path)
}
