//! Validator pipeline against the fixtures

use crate::common;

use samshee::error::{ValidationError, ValidatorKind};
use samshee::validation::illumina::{basespace_logic, nextseq1k2k_logic};
use samshee::validation::{
    default_validators, index_distance, validate, validate_with_resolver, SchemaResolver,
    StaticResolver, Validator, ILLUMINA_V2_SCHEMA_URN, NEXTSEQ_1K2K_SCHEMA_URN,
};
use samshee::SectionedSheet;
use serde_json::json;
use std::sync::Arc;

fn fixture(name: &str) -> SectionedSheet {
    SectionedSheet::parse(&common::load_fixture(name)).unwrap()
}

fn offline() -> Arc<dyn SchemaResolver> {
    Arc::new(StaticResolver::new())
}

#[test]
fn test_defaults_accept_valid_sheet() {
    validate(&fixture("valid_v2"), &default_validators()).unwrap();
    validate(&fixture("basespace"), &default_validators()).unwrap();
}

#[test]
fn test_v1_sheet_fails_schema() {
    let err = validate(&fixture("v1"), &default_validators()).unwrap_err();
    match &err {
        ValidationError::Schema { validator, .. } => {
            assert_eq!(validator.index, 0);
            assert_eq!(validator.kind, ValidatorKind::Schema);
        }
        other => panic!("expected a schema error, got {:?}", other),
    }
    assert!(
        err.to_string()
            .starts_with("illumina SampleSheetv2 schema spec (#0) raised validation error: "),
        "{}",
        err
    );
}

#[test]
fn test_duplicate_index_fails_logic() {
    let err = validate(&fixture("duplicate_index"), &default_validators()).unwrap_err();
    assert_eq!(err.index(), 1);
    assert!(err.to_string().contains("Indices are not unique"), "{}", err);
}

#[test]
fn test_index_distance_runs_per_lane() {
    let sheet = fixture("close_index");
    let mut validators = default_validators();
    validators.push(index_distance(3));
    let err = validate(&sheet, &validators).unwrap_err();
    assert_eq!(err.index(), 2);
    assert!(err.to_string().contains("in lane 1"), "{}", err);

    // a single differing base is enough when the threshold is one
    validators.pop();
    validators.push(index_distance(1));
    validate(&sheet, &validators).unwrap();
}

#[test]
fn test_builtin_reference_matches_inline_schema() {
    let sheet = fixture("v1");
    let by_ref = validate_with_resolver(
        &sheet,
        &[Validator::schema_ref(ILLUMINA_V2_SCHEMA_URN)],
        &offline(),
    )
    .unwrap_err();
    let inline = validate_with_resolver(&sheet, &default_validators()[..1], &offline()).unwrap_err();
    assert_eq!(by_ref.to_string(), inline.to_string());
}

#[test]
fn test_first_failure_wins() {
    let sheet = fixture("valid_v2");
    let validators = vec![
        Validator::schema(json!({"required": ["Header"]})),
        Validator::predicate(|_| anyhow::bail!("first")),
        Validator::predicate(|_| anyhow::bail!("second")),
    ];
    let err = validate(&sheet, &validators).unwrap_err();
    assert_eq!(
        err.to_string(),
        "anonymous validation function #1 raised validation error: first"
    );
}

#[test]
fn test_injected_resolver_serves_local_reference() {
    let resolver: Arc<dyn SchemaResolver> = Arc::new(
        StaticResolver::new().with(
            "https://example.org/needs-cloud.json",
            json!({"title": "needs cloud", "required": ["Cloud_Data"]}),
        ),
    );
    let validators = [Validator::schema_ref("https://example.org/needs-cloud.json")];

    validate_with_resolver(&fixture("basespace"), &validators, &resolver).unwrap();
    let err = validate_with_resolver(&fixture("valid_v2"), &validators, &resolver).unwrap_err();
    assert!(err.to_string().starts_with("needs cloud (#0)"), "{}", err);
}

#[test]
fn test_unresolvable_reference() {
    let err = validate_with_resolver(
        &fixture("valid_v2"),
        &[Validator::schema_ref("https://example.org/missing.json")],
        &offline(),
    )
    .unwrap_err();
    assert!(matches!(err, ValidationError::Resolution { .. }), "{:?}", err);
}

#[test]
fn test_basespace_requires_cloud_data() {
    validate(&fixture("basespace"), &[basespace_logic()]).unwrap();
    let err = validate(&fixture("valid_v2"), &[basespace_logic()]).unwrap_err();
    assert!(err.to_string().contains("no Cloud_Data section"), "{}", err);
}

#[test]
fn test_nextseq_profile() {
    let validators = [
        Validator::schema_ref(NEXTSEQ_1K2K_SCHEMA_URN),
        nextseq1k2k_logic(),
    ];
    validate_with_resolver(&fixture("valid_v2"), &validators, &offline()).unwrap();

    let long_index = common::load_fixture("valid_v2")
        .replace("Index1Cycles,8", "Index1Cycles,12");
    let sheet = SectionedSheet::parse(&long_index).unwrap();
    let err = validate_with_resolver(&sheet, &validators, &offline()).unwrap_err();
    assert_eq!(err.index(), 0);
}
