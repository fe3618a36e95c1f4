//! Minimum Hamming distance between sample indices.
//!
//! Samples are compared per lane. The required distance for a column is
//! `BarcodeMismatchesIndexN + 1` when BCLConvert_Settings sets it, else the
//! configured minimum. A column with the same value for every sample in a
//! lane does not help tell samples apart and is skipped; a lane where every
//! column is uniform cannot be demultiplexed at all.

use anyhow::{bail, Result};
use indexmap::IndexMap;

use super::Validator;
use crate::sheet::{Data, SectionedSheet};

/// Minimum distance used when none is configured.
pub const DEFAULT_MIN_DISTANCE: usize = 3;

const INDEX_COLUMNS: [(&str, &str); 2] = [
    ("Index", "BarcodeMismatchesIndex1"),
    ("Index2", "BarcodeMismatchesIndex2"),
];

/// A validator enforcing [`check_index_distance`].
pub fn index_distance(mindist: usize) -> Validator {
    Validator::named_predicate(format!("index distance (minimum {})", mindist), move |sheet| {
        check_index_distance(sheet, mindist)
    })
}

pub fn check_index_distance(sheet: &SectionedSheet, mindist: usize) -> Result<()> {
    if mindist == 0 {
        bail!("minimal index distance must be larger than 0");
    }
    let Some(data) = sheet.data("BCLConvert_Data") else {
        return Ok(());
    };
    let settings = sheet.settings("BCLConvert_Settings");

    let mut columns = Vec::new();
    for (column, mismatches_key) in INDEX_COLUMNS {
        if !data.has_column(column) {
            continue;
        }
        let required = match settings.and_then(|s| s.get_u64(mismatches_key)) {
            Some(Ok(mismatches)) => mismatches as usize + 1,
            Some(Err(_)) => bail!("BCLConvert_Settings.{} must be an integer", mismatches_key),
            None => mindist,
        };
        columns.push((column, required));
    }

    for (lane, rows) in lanes(data) {
        if rows.len() < 2 {
            continue;
        }
        let mut distinguishing = false;
        for &(column, required) in &columns {
            let values: Vec<&str> = rows
                .iter()
                .map(|&row| data.row(row).and_then(|r| r.get(column)).unwrap_or_default())
                .collect();
            if values.iter().all(|v| *v == values[0]) {
                continue;
            }
            distinguishing = true;
            let (distance, a, b) = closest_pair(&values);
            if distance < required {
                bail!(
                    "Minimal {} distance is {} between the indices {} and {}{}, which is less than the required distance of {}",
                    column,
                    distance,
                    a,
                    b,
                    lane_suffix(&lane),
                    required
                );
            }
        }
        if !distinguishing {
            bail!(
                "Samples{} cannot be distinguished: every index column has the same value for all of them",
                lane_suffix(&lane)
            );
        }
    }
    Ok(())
}

/// Row numbers grouped by the Lane column (one group if there is none).
fn lanes(data: &Data) -> IndexMap<String, Vec<usize>> {
    let mut lanes: IndexMap<String, Vec<usize>> = IndexMap::new();
    for (idx, row) in data.rows().enumerate() {
        let lane = row.get("Lane").unwrap_or_default().to_string();
        lanes.entry(lane).or_default().push(idx);
    }
    lanes
}

fn lane_suffix(lane: &str) -> String {
    if lane.is_empty() {
        String::new()
    } else {
        format!(" in lane {}", lane)
    }
}

fn closest_pair<'a>(values: &[&'a str]) -> (usize, &'a str, &'a str) {
    let mut best = (usize::MAX, "", "");
    for (i, a) in values.iter().enumerate() {
        for b in &values[i + 1..] {
            let distance = hamming(a, b);
            if distance < best.0 {
                best = (distance, *a, *b);
            }
        }
    }
    best
}

/// Mismatches over the shared prefix of two indices.
fn hamming(a: &str, b: &str) -> usize {
    a.bytes().zip(b.bytes()).filter(|(x, y)| x != y).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sheet(tree: serde_json::Value) -> SectionedSheet {
        SectionedSheet::from_tree(&tree).unwrap()
    }

    #[test]
    fn test_zero_distance_is_rejected() {
        let s = sheet(json!({"Header": {}}));
        let err = check_index_distance(&s, 0).unwrap_err();
        assert!(err.to_string().contains("larger than 0"));
    }

    #[test]
    fn test_close_indices_fail() {
        let s = sheet(json!({
            "BCLConvert_Data": [
                {"Sample_ID": "a", "Index": "ACAA"},
                {"Sample_ID": "b", "Index": "ACTT"}
            ]
        }));
        let err = check_index_distance(&s, 3).unwrap_err();
        assert!(err.to_string().starts_with("Minimal Index distance is 2"), "{err}");
    }

    #[test]
    fn test_barcode_mismatches_override_minimum() {
        let s = sheet(json!({
            "BCLConvert_Settings": {"BarcodeMismatchesIndex1": 1},
            "BCLConvert_Data": [
                {"Sample_ID": "a", "Index": "ACAA"},
                {"Sample_ID": "b", "Index": "ACTT"}
            ]
        }));
        assert!(check_index_distance(&s, 3).is_ok());
    }

    #[test]
    fn test_per_column_mismatches() {
        let tree = |m1: u64| {
            json!({
                "BCLConvert_Settings": {"BarcodeMismatchesIndex1": m1, "BarcodeMismatchesIndex2": 1},
                "BCLConvert_Data": [
                    {"Sample_ID": "a", "Index": "TTTT", "Index2": "ACAA"},
                    {"Sample_ID": "b", "Index": "TTTA", "Index2": "ACTT"}
                ]
            })
        };
        assert!(check_index_distance(&sheet(tree(0)), 3).is_ok());
        assert!(check_index_distance(&sheet(tree(1)), 3).is_err());
    }

    #[test]
    fn test_uniform_column_is_skipped() {
        let s = sheet(json!({
            "BCLConvert_Data": [
                {"Sample_ID": "a", "Index": "TTTT", "Index2": "ACAA"},
                {"Sample_ID": "b", "Index": "TTTT", "Index2": "ACTT"}
            ]
        }));
        assert!(check_index_distance(&s, 2).is_ok());
    }

    #[test]
    fn test_all_uniform_columns_fail() {
        let s = sheet(json!({
            "BCLConvert_Data": [
                {"Sample_ID": "a", "Index": "TTTT", "Index2": "ACAA"},
                {"Sample_ID": "b", "Index": "TTTT", "Index2": "ACAA"}
            ]
        }));
        let err = check_index_distance(&s, 2).unwrap_err();
        assert!(err.to_string().contains("cannot be distinguished"), "{err}");
    }

    #[test]
    fn test_lanes_are_checked_separately() {
        let s = sheet(json!({
            "BCLConvert_Data": [
                {"Lane": "1", "Sample_ID": "a", "Index": "AAAAAA"},
                {"Lane": "2", "Sample_ID": "b", "Index": "AAAAAT"},
                {"Lane": "1", "Sample_ID": "c", "Index": "CCCCCC"}
            ]
        }));
        assert!(check_index_distance(&s, 3).is_ok());

        let s = sheet(json!({
            "BCLConvert_Data": [
                {"Lane": "1", "Sample_ID": "a", "Index": "AAAAAA"},
                {"Lane": "1", "Sample_ID": "b", "Index": "AAAAAT"}
            ]
        }));
        let err = check_index_distance(&s, 3).unwrap_err();
        assert!(err.to_string().contains("in lane 1"), "{err}");
    }

    #[test]
    fn test_single_sample_passes() {
        let s = sheet(json!({
            "BCLConvert_Data": [{"Sample_ID": "a", "Index": "ACGT"}]
        }));
        assert!(check_index_distance(&s, 3).is_ok());
    }

    #[test]
    fn test_validator_is_named() {
        let validator = index_distance(3);
        assert_eq!(validator.name(), Some("index distance (minimum 3)"));
    }

    #[test]
    fn test_hamming_uses_shared_prefix() {
        assert_eq!(hamming("ACGT", "ACGA"), 1);
        assert_eq!(hamming("ACGT", "AC"), 0);
        assert_eq!(hamming("", "ACGT"), 0);
    }
}
