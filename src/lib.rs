//! # samshee - sectioned sample sheets
//!
//! Reads, validates and writes the sectioned CSV sample sheets used to
//! describe sequencing runs, with first-class support for Illumina
//! SampleSheet v2.
//!
//! ## Overview
//!
//! A sample sheet is a list of named sections. Each section is either a
//! settings section (key/value lines) or a data section (a header row
//! followed by records). [`sheet::SectionedSheet`] keeps the sections in
//! document order and converts between the text form and a JSON tree.
//!
//! Validation is an ordered list of [`validation::Validator`]s, either JSON
//! schemas (inline or by `$ref`) or predicate functions. The list stops at
//! the first failure.
//!
//! [`samplesheet::SampleSheetV2`] wraps a sheet together with its validator
//! list and exposes the Header, Reads and per-application sections.
//!
//! ## Modules
//!
//! - [`sheet`] - Sectioned sheet model, parser, writer and tree form
//! - [`validation`] - Validator pipeline, schema resolution, Illumina rules
//! - [`samplesheet`] - SampleSheet v2 view with deferred validation
//! - [`config`] - Optional YAML configuration for the command line tool
//! - [`cli`] - Command line front end
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use samshee::samplesheet::{read_samplesheetv2, Revalidate};
//!
//! let sheet = read_samplesheetv2(Path::new("SampleSheet.csv")).expect("invalid sheet");
//! for name in sheet.application_names() {
//!     println!("application: {}", name);
//! }
//! print!("{}", sheet.to_text(Revalidate::Skip).expect("write failed"));
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod samplesheet;
pub mod sheet;
pub mod validation;

pub use error::{Error, ParseError, ResolutionError, ValidationError};
pub use samplesheet::{read_samplesheetv2, Revalidate, SampleSheetV2};
pub use sheet::{read_sectioned_sheet, Section, SectionedSheet};
pub use validation::{validate, Validator};
