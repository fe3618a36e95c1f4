//! Built-in rule sets for Illumina SampleSheet v2 documents.
//!
//! The schemas here operate on the tree form, so settings values that are
//! integers appear as JSON numbers and data sections appear as
//! `{"header": [...], "data": [...]}`.

use anyhow::{anyhow, bail, Context, Result};
use regex::Regex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::OnceLock;

use super::Validator;
use crate::sheet::{SectionedSheet, Settings};

/// Reserved reference for the Illumina SampleSheet v2 schema.
pub const ILLUMINA_V2_SCHEMA_URN: &str = "urn:samshee:illuminav2/v1";

/// Reserved reference for the NextSeq 1000/2000 read length schema.
pub const NEXTSEQ_1K2K_SCHEMA_URN: &str = "urn:samshee:nextseq1k2k/v1";

/// Names of the [Reads] keys in read order.
const READ1: &str = "Read1Cycles";
const INDEX1: &str = "Index1Cycles";
const INDEX2: &str = "Index2Cycles";
const READ2: &str = "Read2Cycles";

/// Built-in schema for a reserved reference.
pub fn builtin_schema(reference: &str) -> Option<Value> {
    match reference {
        ILLUMINA_V2_SCHEMA_URN => Some(illumina_v2_schema()),
        NEXTSEQ_1K2K_SCHEMA_URN => Some(nextseq1k2k_schema()),
        _ => None,
    }
}

/// Validators applied to a SampleSheetV2 unless the caller supplies others.
pub fn default_validators() -> Vec<Validator> {
    vec![Validator::schema(illumina_v2_schema()), illumina_v2_logic()]
}

pub fn illumina_v2_schema() -> Value {
    let sequence = json!({"type": "string", "pattern": "^[ACGT]+$"});
    let mismatches = json!({"type": "integer", "minimum": 0, "maximum": 2});
    let cycles = json!({"type": "integer", "minimum": 1});

    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "illumina SampleSheetv2 schema spec",
        "type": "object",
        "required": ["Header", "Reads"],
        "properties": {
            "Header": {
                "type": "object",
                "required": ["FileFormatVersion"],
                "properties": {
                    "FileFormatVersion": {"type": "integer", "const": 2},
                    "RunName": {
                        "type": ["string", "integer"],
                        "pattern": "^[a-zA-Z0-9_\\-\\.]*$"
                    },
                    "RunDescription": {"type": ["string", "integer"]},
                    "InstrumentPlatform": {"type": "string"},
                    "Instrument Type": {"type": "string"}
                }
            },
            "Reads": {
                "type": "object",
                "required": [READ1],
                "properties": {
                    READ1: cycles.clone(),
                    READ2: cycles.clone(),
                    INDEX1: cycles.clone(),
                    INDEX2: cycles
                }
            },
            "Sequencing_Settings": {
                "type": "object",
                "properties": {
                    "LibraryPrepKits": {"type": "string"}
                }
            },
            "BCLConvert_Settings": {
                "type": "object",
                "required": ["SoftwareVersion"],
                "properties": {
                    "SoftwareVersion": {
                        "type": "string",
                        "pattern": "^[0-9]+\\.[0-9]+\\.[0-9]+"
                    },
                    "AdapterRead1": sequence.clone(),
                    "AdapterRead2": sequence.clone(),
                    "BarcodeMismatchesIndex1": mismatches.clone(),
                    "BarcodeMismatchesIndex2": mismatches,
                    "FastqCompressionFormat": {"enum": ["gzip", "dragen"]},
                    "OverrideCycles": {
                        "type": "string",
                        "pattern": "^([NYIU][0-9]+;?)+$"
                    },
                    "CreateFastqForIndexReads": {"enum": [0, 1]},
                    "NoLaneSplitting": {"enum": ["true", "false"]},
                    "TrimUMI": {"enum": [0, 1]}
                }
            },
            "BCLConvert_Data": {
                "type": "object",
                "required": ["header", "data"],
                "properties": {
                    "header": {
                        "type": "array",
                        "contains": {"const": "Sample_ID"}
                    },
                    "data": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "required": ["Sample_ID"],
                            "properties": {
                                "Sample_ID": {
                                    "type": "string",
                                    "pattern": "^[a-zA-Z0-9\\-_]+$",
                                    "maxLength": 20
                                },
                                "Lane": {"type": "string", "pattern": "^[0-9]+$"},
                                "Index": sequence.clone(),
                                "Index2": sequence,
                                "Sample_Project": {
                                    "type": "string",
                                    "pattern": "^[a-zA-Z0-9\\-_]*$"
                                }
                            }
                        }
                    }
                }
            }
        }
    })
}

pub fn nextseq1k2k_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "NextSeq 1000/2000 read length schema",
        "type": "object",
        "required": ["Reads"],
        "properties": {
            "Reads": {
                "type": "object",
                "properties": {
                    INDEX1: {"type": "integer", "maximum": 10},
                    INDEX2: {"type": "integer", "maximum": 24}
                }
            }
        }
    })
}

pub fn illumina_v2_logic() -> Validator {
    Validator::named_predicate("illumina SampleSheetv2 logic", check_illumina_v2_logic)
}

pub fn basespace_logic() -> Validator {
    Validator::named_predicate("BaseSpace compatibility", check_basespace)
}

pub fn nextseq1k2k_logic() -> Validator {
    Validator::named_predicate("NextSeq 1000/2000 index reads", check_nextseq1k2k)
}

/// The per-read cycle masks of an OverrideCycles setting, expanded to one
/// character per cycle (`Y151;I10` becomes `YYY...` and `IIIIIIIIII`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideCycles {
    pub read1: Option<String>,
    pub index1: Option<String>,
    pub index2: Option<String>,
    pub read2: Option<String>,
}

impl OverrideCycles {
    /// Masks implied by the [Reads] section when no override is given.
    pub fn from_reads(reads: &Settings) -> Result<Self> {
        let mask = |key: &str, symbol: char| -> Result<Option<String>> {
            Ok(read_cycles(reads, key)?.map(|n| symbol.to_string().repeat(n)))
        };
        Ok(Self {
            read1: mask(READ1, 'Y')?,
            index1: mask(INDEX1, 'I')?,
            index2: mask(INDEX2, 'I')?,
            read2: mask(READ2, 'Y')?,
        })
    }

    /// Present reads as `(Reads key, mask)` pairs.
    pub fn segments(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            (READ1, &self.read1),
            (INDEX1, &self.index1),
            (INDEX2, &self.index2),
            (READ2, &self.read2),
        ]
        .into_iter()
        .filter_map(|(name, mask)| mask.as_deref().map(|m| (name, m)))
    }

    fn segment(&self, name: &str) -> Option<&str> {
        self.segments().find(|(n, _)| *n == name).map(|(_, m)| m)
    }
}

/// Upper bound on the cycles of a single read.
pub const MAX_CYCLES: usize = 1000;

fn segment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([NYIU])([0-9]+)").expect("valid regex"))
}

fn mask_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:[NYIU][0-9]+)+$").expect("valid regex"))
}

/// Parse an OverrideCycles value such as `N1Y150;I8N2;U10;Y151`.
///
/// Elements are assigned by count: one element is Read1; two are Read1 and
/// either Read2 or Index1; three are Read1, Index1, Read2; four are Read1,
/// Index1, Index2, Read2.
pub fn parse_override_cycles(setting: &str) -> Result<OverrideCycles> {
    let trimmed = setting.trim().trim_end_matches(';');
    let masks = trimmed
        .split(';')
        .map(|element| expand_mask(setting, element.trim()))
        .collect::<Result<Vec<_>>>()?;

    let count = masks.len();
    let mut masks = masks.into_iter();
    let mut cycles = OverrideCycles {
        read1: masks.next(),
        ..Default::default()
    };
    match count {
        1 => {}
        2 => {
            let second = masks.next();
            if second.as_deref().is_some_and(is_read) {
                cycles.read2 = second;
            } else {
                cycles.index1 = second;
            }
        }
        3 => {
            cycles.index1 = masks.next();
            cycles.read2 = masks.next();
        }
        4 => {
            cycles.index1 = masks.next();
            cycles.index2 = masks.next();
            cycles.read2 = masks.next();
        }
        n => bail!(
            "OverrideCycles {} defines {} elements, at most 4 are allowed",
            setting,
            n
        ),
    }

    for (name, mask) in cycles.segments() {
        let expect_read = name == READ1 || name == READ2;
        if expect_read && !is_read(mask) {
            bail!("OverrideCycles {}: {} must contain read cycles (Y)", setting, name);
        }
        if !expect_read && is_read(mask) {
            bail!("OverrideCycles {}: {} must not contain read cycles (Y)", setting, name);
        }
    }
    Ok(cycles)
}

fn expand_mask(setting: &str, element: &str) -> Result<String> {
    if !mask_re().is_match(element) {
        bail!("OverrideCycles {}: invalid element '{}'", setting, element);
    }
    let mut mask = String::new();
    for caps in segment_re().captures_iter(element) {
        let count: usize = caps[2]
            .parse()
            .with_context(|| format!("OverrideCycles {}: invalid count in '{}'", setting, element))?;
        if count > MAX_CYCLES - mask.len() {
            bail!(
                "OverrideCycles {}: '{}' exceeds the maximum of {} cycles",
                setting,
                element,
                MAX_CYCLES
            );
        }
        mask.push_str(&caps[1].repeat(count));
    }
    Ok(mask)
}

fn is_read(mask: &str) -> bool {
    mask.contains('Y')
}

fn read_cycles(reads: &Settings, key: &str) -> Result<Option<usize>> {
    match reads.get_u64(key) {
        None => Ok(None),
        Some(Ok(n)) if n <= MAX_CYCLES as u64 => Ok(Some(n as usize)),
        Some(Ok(n)) => bail!("Reads.{} is {}, the maximum is {} cycles", key, n, MAX_CYCLES),
        Some(Err(_)) => bail!(
            "Reads.{} must be an integer, found '{}'",
            key,
            reads.get(key).unwrap_or_default()
        ),
    }
}

/// Cross-field checks the schema cannot express.
///
/// - OverrideCycles agrees with the [Reads] section in shape and length.
/// - Adapters are no longer than the read they trim.
/// - With more than one sample, every sample has an index that fits the
///   index read, and index combinations are unique within a lane.
pub fn check_illumina_v2_logic(sheet: &SectionedSheet) -> Result<()> {
    let empty = Settings::new();
    let reads = sheet.settings("Reads").unwrap_or(&empty);

    let mut cycles = None;
    if let Some(bcl) = sheet.settings("BCLConvert_Settings") {
        let parsed = match bcl.get("OverrideCycles") {
            Some(setting) => {
                let parsed = parse_override_cycles(setting)?;
                check_override_matches_reads(setting, &parsed, reads)?;
                parsed
            }
            None => OverrideCycles::from_reads(reads)?,
        };
        check_adapter(bcl, reads, "AdapterRead1", READ1)?;
        check_adapter(bcl, reads, "AdapterRead2", READ2)?;
        cycles = Some(parsed);
    }

    let Some(data) = sheet.data("BCLConvert_Data") else {
        return Ok(());
    };
    if data.len() <= 1 {
        return Ok(());
    }
    let cycles = match cycles {
        Some(c) => c,
        None => OverrideCycles::from_reads(reads)?,
    };

    if !data.has_column("Index") {
        bail!("No Index found in BCLConvert_Data, although it contains more than one sample");
    }
    check_index_lengths(data, "Index", cycles.index1.as_deref(), INDEX1)?;
    if data.has_column("Index2") {
        check_index_lengths(data, "Index2", cycles.index2.as_deref(), INDEX2)?;
    }

    let mut seen: HashMap<(String, String, String), String> = HashMap::new();
    for row in data.rows() {
        let lane = row.get("Lane").unwrap_or_default().to_string();
        let index = row.get("Index").unwrap_or_default().to_string();
        let index2 = row.get("Index2").unwrap_or_default().to_string();
        let sample = row.get("Sample_ID").unwrap_or_default().to_string();
        let key = (lane, index, index2);
        if let Some(other) = seen.get(&key) {
            let (lane, index, index2) = key;
            let combined = if index2.is_empty() {
                index
            } else {
                format!("{}+{}", index, index2)
            };
            let lane = if lane.is_empty() {
                String::new()
            } else {
                format!(" in lane {}", lane)
            };
            bail!(
                "Indices are not unique: samples '{}' and '{}' share the index {}{}",
                other,
                sample,
                combined,
                lane
            );
        }
        seen.insert(key, sample);
    }
    Ok(())
}

fn check_override_matches_reads(setting: &str, parsed: &OverrideCycles, reads: &Settings) -> Result<()> {
    for (name, mask) in parsed.segments() {
        let declared = read_cycles(reads, name)?.ok_or_else(|| {
            anyhow!(
                "BCLConvert_Settings.OverrideCycles {} defines {}, but it is not specified in the Reads section",
                setting,
                name
            )
        })?;
        if declared != mask.len() {
            bail!(
                "Reads.{} is {}, but BCLConvert_Settings.OverrideCycles {} specifies {} cycles",
                name,
                declared,
                setting,
                mask.len()
            );
        }
    }
    for name in [READ1, INDEX1, INDEX2, READ2] {
        if reads.contains_key(name) && parsed.segment(name).is_none() {
            bail!(
                "Reads defines {}, but BCLConvert_Settings.OverrideCycles {} does not",
                name,
                setting
            );
        }
    }
    Ok(())
}

fn check_adapter(bcl: &Settings, reads: &Settings, adapter: &str, read: &str) -> Result<()> {
    let Some(sequence) = bcl.get(adapter) else {
        return Ok(());
    };
    let Some(cycles) = read_cycles(reads, read)? else {
        bail!("BCLConvert_Settings.{} is set, but Reads.{} is not", adapter, read);
    };
    if sequence.len() > cycles {
        bail!(
            "BCLConvert_Settings.{} is {} bases long, longer than Reads.{} ({})",
            adapter,
            sequence.len(),
            read,
            cycles
        );
    }
    Ok(())
}

fn check_index_lengths(
    data: &crate::sheet::Data,
    column: &str,
    mask: Option<&str>,
    read: &str,
) -> Result<()> {
    let Some(mask) = mask else {
        bail!("BCLConvert_Data contains {} values, but no {} are defined", column, read);
    };
    let min = mask.chars().filter(|c| *c == 'I').count();
    let max = mask.len();
    for row in data.rows() {
        let index = row.get(column).unwrap_or_default();
        if index.len() < min || index.len() > max {
            bail!(
                "{} '{}' of sample '{}' has length {}, but {} allows between {} and {} index bases",
                column,
                index,
                row.get("Sample_ID").unwrap_or_default(),
                index.len(),
                read,
                min,
                max
            );
        }
    }
    Ok(())
}

/// BaseSpace runs list every sample a second time in Cloud_Data.
///
/// Every BCLConvert_Data sample must appear there, and indices given in both
/// sections must agree. Cloud_Data may list extra samples.
pub fn check_basespace(sheet: &SectionedSheet) -> Result<()> {
    let Some(cloud) = sheet.data("Cloud_Data") else {
        bail!("no Cloud_Data section");
    };
    let Some(convert) = sheet.data("BCLConvert_Data") else {
        bail!("no BCLConvert_Data section");
    };

    for sample in convert.rows() {
        let id = sample.get("Sample_ID").unwrap_or_default();
        let Some(listed) = cloud.rows().find(|row| row.get("Sample_ID") == Some(id)) else {
            bail!(
                "Sample_ID {} is defined in the BCLConvert_Data section, but not in the Cloud_Data section",
                id
            );
        };
        for column in ["Index", "Index2"] {
            if let (Some(expected), Some(actual)) = (listed.get(column), sample.get(column)) {
                if expected != actual {
                    bail!(
                        "{} of {} does not match between Cloud_Data ({}) and BCLConvert_Data ({})",
                        column,
                        id,
                        expected,
                        actual
                    );
                }
            }
        }
    }
    Ok(())
}

/// Index read limits of the NextSeq 1000/2000 that depend on UMI placement.
pub fn check_nextseq1k2k(sheet: &SectionedSheet) -> Result<()> {
    let Some(setting) = sheet
        .settings("BCLConvert_Settings")
        .and_then(|bcl| bcl.get("OverrideCycles"))
    else {
        return Ok(());
    };
    let cycles = parse_override_cycles(setting)?;
    if let Some(index1) = &cycles.index1 {
        if index1.contains('U') {
            bail!("Index1 of OverrideCycles {} contains UMI cycles, which the NextSeq 1000/2000 cannot read there", setting);
        }
        if index1.len() > 10 {
            bail!("Index1 of OverrideCycles {} has {} cycles, at most 10 are possible", setting, index1.len());
        }
    }
    if let Some(index2) = &cycles.index2 {
        if !index2.contains('U') && index2.len() > 10 {
            bail!(
                "Index2 of OverrideCycles {} has {} cycles; more than 10 are only possible with UMIs",
                setting,
                index2.len()
            );
        }
    }
    Ok(())
}
