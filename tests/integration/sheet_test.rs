//! Sectioned sheet parsing, writing and the tree form

use crate::common;

use samshee::sheet::SectionKind;
use samshee::{read_sectioned_sheet, SectionedSheet};
use serde_json::json;

#[test]
fn test_read_v2_fixture() {
    let sheet = read_sectioned_sheet(&common::fixture_path("valid_v2")).unwrap();
    let names: Vec<_> = sheet.iter().map(|s| s.name()).collect();
    assert_eq!(
        names,
        vec!["Header", "Reads", "BCLConvert_Settings", "BCLConvert_Data"]
    );

    let header = sheet.settings("Header").unwrap();
    assert_eq!(header.get("RunDescription"), Some("lanes 1, 2"));

    let data = sheet.data("BCLConvert_Data").unwrap();
    assert_eq!(data.header(), ["Lane", "Sample_ID", "Index", "Index2"]);
    assert_eq!(data.len(), 3);
    assert_eq!(data.get(1, "Sample_ID"), Some("S2"));
}

#[test]
fn test_text_round_trip_keeps_quoted_fields() {
    let sheet = SectionedSheet::parse(&common::load_fixture("valid_v2")).unwrap();
    let text = sheet.to_text();
    assert!(text.contains("RunDescription,\"lanes 1, 2\"\n"), "{}", text);
    assert_eq!(SectionedSheet::parse(&text).unwrap(), sheet);
}

#[test]
fn test_v1_sheet_reads_as_sectioned() {
    let sheet = SectionedSheet::parse(&common::load_fixture("v1")).unwrap();
    assert_eq!(sheet.get(1).unwrap().kind(), SectionKind::Settings);
    assert_eq!(sheet.get(2).unwrap().kind(), SectionKind::Settings);
    assert_eq!(sheet.get(3).unwrap().kind(), SectionKind::Data);
    // bare values in [Reads] become keys, repeated ones collapse
    assert_eq!(sheet.settings("Reads").unwrap().len(), 1);
    assert_eq!(
        sheet.data("Data").unwrap().get(0, "index"),
        Some("ACGTACGT")
    );
}

#[test]
fn test_tree_form_types() {
    let sheet = SectionedSheet::parse(&common::load_fixture("valid_v2")).unwrap();
    let tree = sheet.to_tree();
    assert_eq!(tree["Header"]["FileFormatVersion"], json!(2));
    assert_eq!(tree["Header"]["RunName"], json!("run_1"));
    assert_eq!(tree["Reads"]["Read1Cycles"], json!(151));
    assert_eq!(
        tree["BCLConvert_Data"]["header"],
        json!(["Lane", "Sample_ID", "Index", "Index2"])
    );
    // data values are never converted
    assert_eq!(tree["BCLConvert_Data"]["data"][0]["Lane"], json!("1"));
}

#[test]
fn test_json_round_trip() {
    let sheet = SectionedSheet::parse(&common::load_fixture("basespace")).unwrap();
    let json = sheet.to_json(true).unwrap();
    assert_eq!(SectionedSheet::from_json(&json).unwrap(), sheet);
}

#[test]
fn test_read_missing_file() {
    let err = read_sectioned_sheet(&common::fixture_path("does_not_exist")).unwrap_err();
    assert!(err.to_string().contains("does_not_exist.csv"), "{}", err);
}
