//! Illumina SampleSheet v2 view over a [`SectionedSheet`].
//!
//! A `SampleSheetV2` owns a sectioned sheet and exposes `Header`, `Reads` and
//! the *applications* stored in it. An application groups the sections
//! `<Name>_Settings` and `<Name>_Data`; every other section apart from
//! `Header` and `Reads` forms an application under its own name.
//!
//! Nothing is copied out of the sheet: the application views are recomputed
//! from section positions on every call, and mutations go straight to the
//! underlying sections. Validation runs when the sheet is constructed and
//! again whenever it is serialized, never on mutation, so a sheet may pass
//! through invalid states during a multi-step edit.
//!
//! ```no_run
//! use samshee::samplesheet::{read_samplesheetv2, Revalidate};
//!
//! let mut sheet = read_samplesheetv2("SampleSheet.csv".as_ref())?;
//! sheet.header_mut().insert("RunName", "run_2");
//! let text = sheet.to_text(Revalidate::Captured)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::error::{Error, ValidationError};
use crate::sheet::{Data, Section, SectionKind, SectionedSheet, Settings};
use crate::validation::{
    default_validators, validate_with_resolver, DefaultResolver, SchemaResolver, Validator,
};

pub const HEADER_SECTION: &str = "Header";
pub const READS_SECTION: &str = "Reads";

const SETTINGS_SUFFIX: &str = "_settings";
const DATA_SUFFIX: &str = "_data";

/// Which validators run when a sheet is serialized.
#[derive(Debug, Clone, Default)]
pub enum Revalidate {
    /// The validators given at construction.
    #[default]
    Captured,
    /// An explicit override list.
    With(Vec<Validator>),
    /// No validation.
    Skip,
}

/// A validated sample sheet with application views.
pub struct SampleSheetV2 {
    sheet: SectionedSheet,
    validators: Vec<Validator>,
    resolver: Arc<dyn SchemaResolver>,
}

impl SampleSheetV2 {
    /// Wrap `sheet` after validating it with [`default_validators`].
    pub fn new(sheet: SectionedSheet) -> Result<Self, ValidationError> {
        Self::with_validators(sheet, default_validators())
    }

    /// Wrap `sheet` after validating it with `validators`.
    ///
    /// An empty list skips validation, here and at serialization time.
    pub fn with_validators(
        sheet: SectionedSheet,
        validators: Vec<Validator>,
    ) -> Result<Self, ValidationError> {
        Self::with_resolver(sheet, validators, Arc::new(DefaultResolver::new()))
    }

    /// Like [`with_validators`](Self::with_validators), resolving schema
    /// references through `resolver`.
    pub fn with_resolver(
        sheet: SectionedSheet,
        validators: Vec<Validator>,
        resolver: Arc<dyn SchemaResolver>,
    ) -> Result<Self, ValidationError> {
        validate_with_resolver(&sheet, &validators, &resolver)?;
        debug!(
            sections = sheet.len(),
            validators = validators.len(),
            "constructed SampleSheetV2"
        );
        Ok(Self {
            sheet,
            validators,
            resolver,
        })
    }

    /// Parse the JSON interchange format and validate with the defaults.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let sheet = SectionedSheet::from_json(json)?;
        Ok(Self::new(sheet)?)
    }

    pub fn sheet(&self) -> &SectionedSheet {
        &self.sheet
    }

    pub fn into_sheet(self) -> SectionedSheet {
        self.sheet
    }

    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    /// Run the captured validators against the current state.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.revalidate(&Revalidate::Captured)
    }

    pub fn header(&self) -> Option<&Settings> {
        self.sheet.settings(HEADER_SECTION)
    }

    /// The Header settings, created as the first section if missing.
    pub fn header_mut(&mut self) -> &mut Settings {
        let idx = match settings_position(&self.sheet, HEADER_SECTION) {
            Some(idx) => idx,
            None => {
                self.sheet
                    .insert(0, Section::with_settings(HEADER_SECTION, Settings::new()));
                0
            }
        };
        settings_at(&mut self.sheet, idx)
    }

    pub fn reads(&self) -> Option<&Settings> {
        self.sheet.settings(READS_SECTION)
    }

    /// The Reads settings, created after Header (or first) if missing.
    pub fn reads_mut(&mut self) -> &mut Settings {
        let idx = match settings_position(&self.sheet, READS_SECTION) {
            Some(idx) => idx,
            None => {
                let idx = settings_position(&self.sheet, HEADER_SECTION).map_or(0, |h| h + 1);
                self.sheet
                    .insert(idx, Section::with_settings(READS_SECTION, Settings::new()));
                idx
            }
        };
        settings_at(&mut self.sheet, idx)
    }

    /// All applications in order of their first section.
    pub fn applications(&self) -> IndexMap<String, Application<'_>> {
        let mut apps: IndexMap<String, Application<'_>> = IndexMap::new();
        for section in self.sheet.iter() {
            let Some(name) = application_name(section.name()) else {
                continue;
            };
            let app = apps.entry(name.to_string()).or_default();
            match section.kind() {
                SectionKind::Settings if app.settings.is_none() => {
                    app.settings = section.as_settings()
                }
                SectionKind::Data if app.data.is_none() => app.data = section.as_data(),
                _ => debug!(section = section.name(), "ignoring duplicate application section"),
            }
        }
        apps
    }

    pub fn application_names(&self) -> Vec<String> {
        self.applications().into_keys().collect()
    }

    pub fn application(&self, name: &str) -> Option<Application<'_>> {
        let settings = slot(&self.sheet, name, SectionKind::Settings)
            .and_then(|idx| self.sheet.get(idx))
            .and_then(Section::as_settings);
        let data = slot(&self.sheet, name, SectionKind::Data)
            .and_then(|idx| self.sheet.get(idx))
            .and_then(Section::as_data);
        if settings.is_none() && data.is_none() {
            return None;
        }
        Some(Application { settings, data })
    }

    /// Mutable access to an application. Sections are only created when
    /// [`ApplicationMut::settings_mut`] or [`ApplicationMut::data_mut`] is
    /// called.
    pub fn application_mut(&mut self, name: &str) -> ApplicationMut<'_> {
        ApplicationMut {
            sheet: &mut self.sheet,
            name: name.to_string(),
        }
    }

    /// Remove every section of an application. Returns whether any existed.
    pub fn remove_application(&mut self, name: &str) -> bool {
        let before = self.sheet.len();
        self.sheet
            .retain(|section| application_name(section.name()) != Some(name));
        self.sheet.len() != before
    }

    /// The wrapped sheet, after revalidation.
    pub fn to_sectioned_sheet(&self, revalidate: Revalidate) -> Result<SectionedSheet, ValidationError> {
        self.revalidate(&revalidate)?;
        Ok(self.sheet.clone())
    }

    pub fn to_text(&self, revalidate: Revalidate) -> Result<String, ValidationError> {
        self.revalidate(&revalidate)?;
        Ok(self.sheet.to_text())
    }

    pub fn to_tree(&self, revalidate: Revalidate) -> Result<Value, ValidationError> {
        self.revalidate(&revalidate)?;
        Ok(self.sheet.to_tree())
    }

    pub fn to_json(&self, pretty: bool, revalidate: Revalidate) -> Result<String, Error> {
        self.revalidate(&revalidate)?;
        Ok(self.sheet.to_json(pretty)?)
    }

    /// Write the text form. Nothing is written if validation fails.
    pub fn write<W: Write>(&self, out: W, revalidate: Revalidate) -> Result<(), Error> {
        self.revalidate(&revalidate)?;
        self.sheet.write_to(out)?;
        Ok(())
    }

    fn revalidate(&self, revalidate: &Revalidate) -> Result<(), ValidationError> {
        match revalidate {
            Revalidate::Captured => validate_with_resolver(&self.sheet, &self.validators, &self.resolver),
            Revalidate::With(validators) => {
                validate_with_resolver(&self.sheet, validators, &self.resolver)
            }
            Revalidate::Skip => {
                debug!("serializing without validation");
                Ok(())
            }
        }
    }
}

impl fmt::Debug for SampleSheetV2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampleSheetV2")
            .field("sheet", &self.sheet)
            .field("validators", &self.validators)
            .finish_non_exhaustive()
    }
}

/// Read-only view of one application.
#[derive(Debug, Clone, Copy, Default)]
pub struct Application<'a> {
    settings: Option<&'a Settings>,
    data: Option<&'a Data>,
}

impl<'a> Application<'a> {
    pub fn settings(&self) -> Option<&'a Settings> {
        self.settings
    }

    pub fn data(&self) -> Option<&'a Data> {
        self.data
    }
}

/// Mutable view of one application.
pub struct ApplicationMut<'a> {
    sheet: &'a mut SectionedSheet,
    name: String,
}

impl ApplicationMut<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> Option<&Settings> {
        slot(&*self.sheet, &self.name, SectionKind::Settings)
            .and_then(|idx| self.sheet.get(idx))
            .and_then(Section::as_settings)
    }

    pub fn data(&self) -> Option<&Data> {
        slot(&*self.sheet, &self.name, SectionKind::Data)
            .and_then(|idx| self.sheet.get(idx))
            .and_then(Section::as_data)
    }

    /// The `<Name>_Settings` section, created before the application's data
    /// section (or at the end) if missing.
    pub fn settings_mut(&mut self) -> &mut Settings {
        let idx = match slot(&*self.sheet, &self.name, SectionKind::Settings) {
            Some(idx) => idx,
            None => {
                let idx = slot(&*self.sheet, &self.name, SectionKind::Data).unwrap_or(self.sheet.len());
                let section = Section::with_settings(format!("{}_Settings", self.name), Settings::new());
                self.sheet.insert(idx, section);
                idx
            }
        };
        settings_at(self.sheet, idx)
    }

    /// The `<Name>_Data` section, created after the application's settings
    /// section (or at the end) if missing.
    pub fn data_mut(&mut self) -> &mut Data {
        let idx = match slot(&*self.sheet, &self.name, SectionKind::Data) {
            Some(idx) => idx,
            None => {
                let idx = slot(&*self.sheet, &self.name, SectionKind::Settings)
                    .map_or(self.sheet.len(), |s| s + 1);
                let section = Section::with_data(format!("{}_Data", self.name), Data::default());
                self.sheet.insert(idx, section);
                idx
            }
        };
        data_at(self.sheet, idx)
    }
}

/// Read and validate a SampleSheet v2 file with the default validators.
pub fn read_samplesheetv2(path: &Path) -> Result<SampleSheetV2, Error> {
    let sheet = SectionedSheet::read(path)?;
    Ok(SampleSheetV2::new(sheet)?)
}

/// Application a section belongs to, or `None` for Header and Reads (any
/// case).
///
/// A trailing `_Settings` or `_Data` (any case) is stripped; other names are
/// used as they are.
pub fn application_name(section: &str) -> Option<&str> {
    if section.eq_ignore_ascii_case(HEADER_SECTION) || section.eq_ignore_ascii_case(READS_SECTION) {
        return None;
    }
    let lower = section.to_ascii_lowercase();
    for suffix in [SETTINGS_SUFFIX, DATA_SUFFIX] {
        if lower.ends_with(suffix) && lower.len() > suffix.len() {
            return Some(&section[..section.len() - suffix.len()]);
        }
    }
    Some(section)
}

fn slot(sheet: &SectionedSheet, app: &str, kind: SectionKind) -> Option<usize> {
    sheet
        .iter()
        .position(|s| s.kind() == kind && application_name(s.name()) == Some(app))
}

fn settings_position(sheet: &SectionedSheet, name: &str) -> Option<usize> {
    sheet
        .iter()
        .position(|s| s.name() == name && s.kind() == SectionKind::Settings)
}

fn settings_at(sheet: &mut SectionedSheet, idx: usize) -> &mut Settings {
    match sheet.get_mut(idx).and_then(Section::as_settings_mut) {
        Some(settings) => settings,
        None => unreachable!("section {} is a settings section", idx),
    }
}

fn data_at(sheet: &mut SectionedSheet, idx: usize) -> &mut Data {
    match sheet.get_mut(idx).and_then(Section::as_data_mut) {
        Some(data) => data,
        None => unreachable!("section {} is a data section", idx),
    }
}
