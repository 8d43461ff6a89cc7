//! Generation and Validation Scenario Tests
//!
//! End-to-end tests over in-memory datasets:
//! - Homogeneous series give one record, validated cleanly
//! - Heterogeneous instruments give a discriminated union
//! - Conflicting exemplars fall back to finer grouping
//! - Cardinality findings per subject/session
//! - Every sidecar in scope is claimed once or reported unexpected
//! - Regeneration on unchanged data is byte-identical

use std::collections::HashSet;
use std::fs;

use seriesguard::config::ConfigCache;
use seriesguard::dataset::{
    Dataset, EntityFilter, EntityQuery, EntitySet, FileRef, IndexedDataset,
};
use seriesguard::generate::{initialize, GenerationOptions};
use seriesguard::schema::SchemaStore;
use seriesguard::validate::{validate, Finding, ValidationFilter, ValidationReport};
use serde_json::{json, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn entities(pairs: &[(&str, &str)]) -> EntitySet {
    let mut set: EntitySet = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    set.insert("extension".into(), ".json".into());
    set
}

fn t1w(subject: &str) -> EntitySet {
    entities(&[("subject", subject), ("datatype", "anat"), ("suffix", "T1w")])
}

fn bold(subject: &str, run: &str) -> EntitySet {
    entities(&[
        ("subject", subject),
        ("datatype", "func"),
        ("task", "rest"),
        ("run", run),
        ("suffix", "bold"),
    ])
}

fn siemens(serial: &str) -> Value {
    json!({
        "Manufacturer": "Siemens",
        "ManufacturersModelName": "Prisma",
        "DeviceSerialNumber": serial,
        "MagneticFieldStrength": 3,
        "EchoTime": 0.003,
        "RepetitionTime": 2.3,
        "FlipAngle": 9,
        "ImageType": ["ORIGINAL", "PRIMARY", "M", "ND"],
        "ProtocolName": "t1_mprage"
    })
}

fn ge() -> Value {
    json!({
        "Manufacturer": "GE",
        "ManufacturersModelName": "DISCOVERY MR750",
        "DeviceSerialNumber": "000000",
        "MagneticFieldStrength": 3,
        "EchoTime": 0.0032,
        "RepetitionTime": 8.2,
        "FlipAngle": 12,
        "ImageType": ["ORIGINAL", "PRIMARY", "OTHER"],
        "ProtocolName": "sag_bravo"
    })
}

fn generate(dataset: &IndexedDataset, store: &SchemaStore, options: GenerationOptions) -> bool {
    initialize(dataset, store, &mut ConfigCache::new(), &options).unwrap()
}

fn check(dataset: &IndexedDataset, store: &SchemaStore) -> ValidationReport {
    validate(dataset, store, &ValidationFilter::default()).unwrap()
}

fn violations(report: &ValidationReport) -> Vec<(String, String, String)> {
    report
        .findings
        .iter()
        .filter_map(|f| match f {
            Finding::SchemaViolation {
                file,
                location,
                message,
                ..
            } => Some((file.to_string(), location.clone(), message.clone())),
            _ => None,
        })
        .collect()
}

// =============================================================================
// Homogeneous Series Tests
// =============================================================================

/// Identical exemplars give one record and a clean validation.
#[test]
fn test_identical_subjects_validate_cleanly() {
    let tmp = TempDir::new().unwrap();
    let store = SchemaStore::new(tmp.path());
    let mut dataset = IndexedDataset::new();
    dataset.insert(t1w("01"), siemens("1001"));
    dataset.insert(t1w("02"), siemens("1001"));

    assert!(generate(&dataset, &store, GenerationOptions::default()));

    let stored = store.load_all().unwrap();
    assert_eq!(stored.len(), 1);
    assert!(stored[0].document.get("anyOf").is_none());

    let report = check(&dataset, &store);
    assert!(report.is_compliant(), "{:?}", report.findings);
    assert_eq!(report.claimed.len(), 2);
}

/// Changing one exact-match field for one subject yields exactly one violation.
#[test]
fn test_mutated_field_yields_one_violation() {
    let tmp = TempDir::new().unwrap();
    let store = SchemaStore::new(tmp.path());
    let mut dataset = IndexedDataset::new();
    dataset.insert(t1w("01"), siemens("1001"));
    dataset.insert(t1w("02"), siemens("1001"));
    assert!(generate(&dataset, &store, GenerationOptions::default()));

    let mut mutated = siemens("1001");
    mutated["FlipAngle"] = json!(8);
    dataset.insert(t1w("02"), mutated);

    let report = check(&dataset, &store);
    assert_eq!(report.findings.len(), 1);
    let found = violations(&report);
    assert_eq!(found[0].0, "sub-02/anat/sub-02_T1w.json");
    assert_eq!(found[0].1, "FlipAngle");
}

/// Values on the tolerance boundary pass even when not exactly representable.
#[test]
fn test_tolerance_boundary_literals_pass() {
    let tmp = TempDir::new().unwrap();
    let store = SchemaStore::new(tmp.path());
    let mut dataset = IndexedDataset::new();
    dataset.insert(t1w("01"), siemens("1001"));
    assert!(generate(&dataset, &store, GenerationOptions::default()));

    // RepetitionTime is "~=0.005" around 2.3
    for (tr, compliant) in [(2.305, true), (2.295, true), (2.306, false)] {
        let mut boundary = siemens("1001");
        boundary["RepetitionTime"] = json!(tr);
        dataset.insert(t1w("02"), boundary);
        let report = check(&dataset, &store);
        assert_eq!(report.is_compliant(), compliant, "{} {:?}", tr, report.findings);
    }
}

// =============================================================================
// Union Tests
// =============================================================================

/// Two vendors give a two-branch union; a new subject on a known vendor
/// passes, one on an unknown vendor gets a single root-level violation.
#[test]
fn test_union_over_vendors() {
    let tmp = TempDir::new().unwrap();
    let store = SchemaStore::new(tmp.path());
    let mut dataset = IndexedDataset::new();
    dataset.insert(t1w("01"), siemens("1001"));
    dataset.insert(t1w("02"), ge());
    assert!(generate(&dataset, &store, GenerationOptions::default()));

    let stored = store.load_all().unwrap();
    assert_eq!(stored[0].document["anyOf"].as_array().unwrap().len(), 2);
    assert_eq!(stored[0].expectation.instrument_tags, vec!["Manufacturer"]);

    // another Prisma: serial number is not constrained
    dataset.insert(t1w("03"), siemens("2002"));
    let report = check(&dataset, &store);
    assert!(report.is_compliant(), "{:?}", report.findings);

    let mut philips = siemens("3003");
    philips["Manufacturer"] = json!("Philips");
    dataset.insert(t1w("04"), philips);
    let report = check(&dataset, &store);
    let found = violations(&report);
    assert_eq!(report.findings.len(), 1);
    assert_eq!(found[0].0, "sub-04/anat/sub-04_T1w.json");
    assert_eq!(found[0].1, "");
    assert_eq!(found[0].2, r#"no schema branch for instrument ["Philips"]"#);
}

/// A subject on a known vendor is checked against that vendor's branch, so
/// a mutated field is reported by name.
#[test]
fn test_union_branch_reports_field() {
    let tmp = TempDir::new().unwrap();
    let store = SchemaStore::new(tmp.path());
    let mut dataset = IndexedDataset::new();
    dataset.insert(t1w("01"), siemens("1001"));
    dataset.insert(t1w("02"), ge());
    assert!(generate(&dataset, &store, GenerationOptions::default()));

    let mut mutated = siemens("2002");
    mutated["FlipAngle"] = json!(20);
    dataset.insert(t1w("03"), mutated);

    let report = check(&dataset, &store);
    assert_eq!(report.findings.len(), 1, "{:?}", report.findings);
    let found = violations(&report);
    assert_eq!(found[0].0, "sub-03/anat/sub-03_T1w.json");
    assert_eq!(found[0].1, "FlipAngle");
    assert!(!found[0].2.contains("no schema branch"));
    match &report.findings[0] {
        Finding::SchemaViolation { value, .. } => assert_eq!(value, &json!(20)),
        other => panic!("unexpected finding {:?}", other),
    }
}

/// Exemplars differing by model fall back from manufacturer to model grouping.
#[test]
fn test_model_conflict_falls_back() {
    let tmp = TempDir::new().unwrap();
    let store = SchemaStore::new(tmp.path());
    let mut dataset = IndexedDataset::new();
    dataset.insert(t1w("01"), siemens("1001"));
    let mut skyra = siemens("1002");
    skyra["ManufacturersModelName"] = json!("Skyra");
    skyra["RepetitionTime"] = json!(2.5);
    dataset.insert(t1w("02"), skyra);

    assert!(generate(&dataset, &store, GenerationOptions::default()));
    let stored = store.load_all().unwrap();
    assert_eq!(
        stored[0].expectation.instrument_tags,
        vec!["Manufacturer", "ManufacturersModelName"]
    );
    assert!(check(&dataset, &store).is_compliant());
}

/// Same model with conflicting exemplars needs scanner-specific grouping.
#[test]
fn test_scanner_specific_grouping() {
    let tmp = TempDir::new().unwrap();
    let mut dataset = IndexedDataset::new();
    dataset.insert(t1w("01"), siemens("1001"));
    let mut other = siemens("1002");
    other["RepetitionTime"] = json!(2.0);
    dataset.insert(t1w("02"), other);

    let store = SchemaStore::new(tmp.path());
    assert!(!generate(&dataset, &store, GenerationOptions::default()));
    assert!(store.load_all().unwrap().is_empty());

    let options = GenerationOptions {
        uniform_instruments: false,
        ..GenerationOptions::default()
    };
    assert!(generate(&dataset, &store, options));
    let stored = store.load_all().unwrap();
    assert_eq!(
        stored[0].expectation.instrument_tags,
        vec!["Manufacturer", "ManufacturersModelName", "DeviceSerialNumber"]
    );
    assert!(check(&dataset, &store).is_compliant());
}

// =============================================================================
// Cardinality Tests
// =============================================================================

/// A subject without the series gets one MissingFile; an extra run gets
/// CardinalityExceeded.
#[test]
fn test_cardinality_findings() {
    let tmp = TempDir::new().unwrap();
    let store = SchemaStore::new(tmp.path());
    let mut dataset = IndexedDataset::new();
    dataset.insert(t1w("01"), siemens("1001"));
    dataset.insert(t1w("02"), siemens("1001"));
    dataset.insert(bold("01", "1"), siemens("1001"));
    dataset.insert(bold("02", "1"), siemens("1001"));
    assert!(generate(&dataset, &store, GenerationOptions::default()));
    assert_eq!(store.load_all().unwrap().len(), 2);

    dataset.insert(bold("02", "2"), siemens("1001"));
    dataset.insert(t1w("03"), siemens("1001"));

    let report = check(&dataset, &store);
    let summary: Vec<_> = report
        .findings
        .iter()
        .map(|f| (f.kind(), f.path().to_string()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("CardinalityExceeded", "sub-02/func/sub-02_task-rest_bold.json".to_string()),
            ("MissingFile", "sub-03/func/sub-03_task-rest_bold.json".to_string()),
        ]
    );
}

// =============================================================================
// Consumption Tests
// =============================================================================

/// Claimed and unexpected sidecars partition the sidecars in scope.
#[test]
fn test_every_sidecar_claimed_once_or_unexpected() {
    let tmp = TempDir::new().unwrap();
    let store = SchemaStore::new(tmp.path());
    let mut dataset = IndexedDataset::new();
    for subject in ["01", "02", "03"] {
        dataset.insert(t1w(subject), siemens("1001"));
        dataset.insert(bold(subject, "1"), siemens("1001"));
    }
    assert!(generate(&dataset, &store, GenerationOptions::default()));

    dataset.insert(
        entities(&[("subject", "02"), ("datatype", "anat"), ("suffix", "FLAIR")]),
        siemens("1001"),
    );
    dataset.insert(bold("03", "2"), siemens("1001"));

    let report = check(&dataset, &store);

    let mut scope = EntityQuery::new();
    scope.insert("extension".into(), EntityFilter::Is(".json".into()));
    let in_scope: HashSet<FileRef> = dataset.query(&scope).into_iter().collect();

    let claimed: HashSet<FileRef> = report.claimed.iter().cloned().collect();
    assert_eq!(claimed.len(), report.claimed.len(), "a sidecar was claimed twice");

    let unexpected: HashSet<FileRef> = report
        .findings
        .iter()
        .filter_map(|f| match f {
            Finding::UnexpectedFile { file } => Some(file.clone()),
            _ => None,
        })
        .collect();
    assert!(claimed.is_disjoint(&unexpected));
    assert_eq!(&claimed | &unexpected, in_scope);
    assert_eq!(
        unexpected,
        HashSet::from([FileRef::new("sub-02/anat/sub-02_FLAIR.json")])
    );
}

/// Files differing only by an alternate entity form separate series.
#[test]
fn test_alternate_entities_are_not_conflated() {
    let tmp = TempDir::new().unwrap();
    let store = SchemaStore::new(tmp.path());
    let mut dataset = IndexedDataset::new();
    for subject in ["01", "02"] {
        dataset.insert(t1w(subject), siemens("1001"));
        let mut norm = t1w(subject);
        norm.insert("reconstruction".into(), "norm".into());
        let mut metadata = siemens("1001");
        metadata["ImageType"] = json!(["DERIVED", "PRIMARY", "M", "ND", "NORM"]);
        dataset.insert(norm, metadata);
    }

    assert!(generate(&dataset, &store, GenerationOptions::default()));
    let paths: Vec<_> = store.load_all().unwrap().into_iter().map(|s| s.relpath).collect();
    assert_eq!(
        paths,
        vec!["sub-ref/anat/sub-ref_T1w.json", "sub-ref/anat/sub-ref_rec-norm_T1w.json"]
    );

    let report = check(&dataset, &store);
    assert!(report.is_compliant(), "{:?}", report.findings);
    assert_eq!(report.claimed.len(), 4);
}

// =============================================================================
// Session Tests
// =============================================================================

/// Varying sessions pin schemas to their session; uniform sessions do not.
#[test]
fn test_session_factoring() {
    let mut dataset = IndexedDataset::new();
    for subject in ["01", "02"] {
        for session in ["pre", "post"] {
            let mut set = t1w(subject);
            set.insert("session".into(), session.into());
            dataset.insert(set, siemens("1001"));
        }
    }

    let tmp = TempDir::new().unwrap();
    let store = SchemaStore::new(tmp.path());
    let options = GenerationOptions {
        uniform_sessions: true,
        ..GenerationOptions::default()
    };
    assert!(generate(&dataset, &store, options));
    let stored = store.load_all().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].relpath, "sub-ref/anat/sub-ref_T1w.json");
    assert!(check(&dataset, &store).is_compliant());

    let tmp = TempDir::new().unwrap();
    let store = SchemaStore::new(tmp.path());
    assert!(generate(&dataset, &store, GenerationOptions::default()));
    let paths: Vec<_> = store.load_all().unwrap().into_iter().map(|s| s.relpath).collect();
    assert_eq!(
        paths,
        vec![
            "sub-ref/ses-post/anat/sub-ref_ses-post_T1w.json",
            "sub-ref/ses-pre/anat/sub-ref_ses-pre_T1w.json",
        ]
    );
    let report = check(&dataset, &store);
    assert!(report.is_compliant(), "{:?}", report.findings);
    assert_eq!(report.claimed.len(), 4);
}

// =============================================================================
// Idempotence Tests
// =============================================================================

/// Regenerating on unchanged data rewrites identical bytes.
#[test]
fn test_regeneration_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let store = SchemaStore::new(tmp.path());
    let mut dataset = IndexedDataset::new();
    dataset.insert(t1w("01"), siemens("1001"));
    dataset.insert(t1w("02"), ge());

    assert!(generate(&dataset, &store, GenerationOptions::default()));
    let path = store.folder().join("sub-ref/anat/sub-ref_T1w.json");
    let first = fs::read(&path).unwrap();

    assert!(generate(&dataset, &store, GenerationOptions::default()));
    assert_eq!(first, fs::read(&path).unwrap());
}
