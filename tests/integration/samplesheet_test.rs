//! SampleSheetV2 reading, editing and deferred validation

use crate::common;

use samshee::samplesheet::application_name;
use samshee::validation::{default_validators, index_distance};
use samshee::{read_samplesheetv2, Error, Revalidate, SampleSheetV2, SectionedSheet};

fn sheet(name: &str) -> SectionedSheet {
    SectionedSheet::parse(&common::load_fixture(name)).unwrap()
}

#[test]
fn test_read_valid_fixture() {
    let v2 = read_samplesheetv2(&common::fixture_path("valid_v2")).unwrap();
    assert_eq!(v2.header().unwrap().get("RunName"), Some("run_1"));
    assert_eq!(v2.reads().unwrap().get("Index2Cycles"), Some("8"));
    assert_eq!(v2.application_names(), vec!["BCLConvert"]);

    let app = v2.application("BCLConvert").unwrap();
    assert_eq!(app.settings().unwrap().get("SoftwareVersion"), Some("3.9.3"));
    assert_eq!(app.data().unwrap().len(), 3);
}

#[test]
fn test_huge_cycle_count_is_a_validation_error() {
    let text = common::load_fixture("valid_v2").replace("Read1Cycles,151", "Read1Cycles,99999999999999999");
    let err = SampleSheetV2::new(SectionedSheet::parse(&text).unwrap()).unwrap_err();
    assert_eq!(err.index(), 1);
    assert!(err.to_string().contains("Reads.Read1Cycles"), "{err}");

    let text = common::load_fixture("valid_v2").replace("Y151;I8;I8;Y151", "Y99999999999999999;I8;I8;Y151");
    let err = SampleSheetV2::new(SectionedSheet::parse(&text).unwrap()).unwrap_err();
    assert_eq!(err.index(), 1);
}

#[test]
fn test_read_rejects_v1_fixture() {
    let err = read_samplesheetv2(&common::fixture_path("v1")).unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "{:?}", err);
}

#[test]
fn test_applications_in_section_order() {
    let v2 = SampleSheetV2::new(sheet("basespace")).unwrap();
    assert_eq!(v2.application_names(), vec!["BCLConvert", "Cloud"]);
    assert_eq!(application_name("Cloud_Data"), Some("Cloud"));
    assert_eq!(application_name("Reads"), None);
}

#[test]
fn test_invalid_intermediate_state_is_allowed() {
    let mut v2 = SampleSheetV2::new(sheet("valid_v2")).unwrap();

    // break the sheet, then repair it before writing
    v2.reads_mut().insert("Index1Cycles", "10");
    assert!(v2.validate().is_err());
    v2.reads_mut().insert("Index1Cycles", "8");

    let text = v2.to_text(Revalidate::Captured).unwrap();
    assert_eq!(SectionedSheet::parse(&text).unwrap(), sheet("valid_v2"));
}

#[test]
fn test_write_validates_captured_list() {
    let mut validators = default_validators();
    validators.push(index_distance(3));
    let mut v2 = SampleSheetV2::with_validators(sheet("valid_v2"), validators).unwrap();

    v2.application_mut("BCLConvert")
        .data_mut()
        .set(1, "Index", "ACGTACGA")
        .unwrap();

    let mut out = Vec::new();
    let err = v2.write(&mut out, Revalidate::Captured).unwrap_err();
    assert!(out.is_empty());
    assert!(err.to_string().contains("index distance (minimum 3)"), "{}", err);

    // the default list alone is satisfied
    v2.write(&mut out, Revalidate::With(default_validators())).unwrap();
    assert!(!out.is_empty());
}

#[test]
fn test_add_application() {
    let mut v2 = SampleSheetV2::new(sheet("valid_v2")).unwrap();
    {
        let mut cloud = v2.application_mut("Cloud");
        cloud.settings_mut().insert("GeneratedVersion", "1.0");
        let data = cloud.data_mut();
        data.add_column("Sample_ID");
        data.add_column("ProjectName");
        data.push_row(["S1", "proj"]);
    }
    let names: Vec<_> = v2.sheet().iter().map(|s| s.name().to_string()).collect();
    assert_eq!(
        names,
        vec![
            "Header",
            "Reads",
            "BCLConvert_Settings",
            "BCLConvert_Data",
            "Cloud_Settings",
            "Cloud_Data"
        ]
    );
    assert!(v2.remove_application("Cloud"));
    assert_eq!(v2.application_names(), vec!["BCLConvert"]);
}

#[test]
fn test_from_json_round_trip() {
    let v2 = SampleSheetV2::new(sheet("valid_v2")).unwrap();
    let json = v2.to_json(false, Revalidate::Captured).unwrap();
    let back = SampleSheetV2::from_json(&json).unwrap();
    assert_eq!(back.sheet(), v2.sheet());
}
