//! Operations backed by standards library metadata.

use std::sync::Arc;

use polars::prelude::*;
use rules_cache::{CacheService, InMemoryCacheService};
use rules_data::{DataService, InMemoryDataService};
use rules_library::{CtPackage, LibraryMetadataContainer, ModelMetadata, StandardMetadata};
use rules_model::{DatasetFrame, DatasetManifestEntry, ErrorKind, OperationParams};
use rules_operations::evaluate;
use serde_json::{Value, json};

const STANDARD: &str = "sdtmig";
const VERSION: &str = "3-4";

fn ae_frame() -> DataFrame {
    DataFrame::new(vec![
        Series::new("STUDYID".into(), ["CDISC01", "CDISC01", "CDISC01"]).into(),
        Series::new("DOMAIN".into(), ["AE", "AE", "AE"]).into(),
        Series::new("AESEQ".into(), [1i64, 2, 3]).into(),
        Series::new("AETERM".into(), ["HEADACHE", "NAUSEA", "RASH"]).into(),
    ])
    .unwrap()
}

/// The same rows as an eager frame and as a two-partition lazy frame.
fn frame_modes(df: &DataFrame) -> Vec<DatasetFrame> {
    let split = df.height() / 2;
    let partitioned =
        DatasetFrame::partitioned(vec![df.slice(0, split), df.slice(split as i64, df.height())])
            .unwrap();
    vec![DatasetFrame::from(df.clone()), partitioned]
}

struct Harness {
    cache: Arc<dyn CacheService>,
    store: Arc<InMemoryDataService>,
    data: Arc<dyn DataService>,
    library: LibraryMetadataContainer,
}

impl Harness {
    fn new() -> Self {
        Self::with_data(InMemoryDataService::new())
    }

    fn with_data(data: InMemoryDataService) -> Self {
        let cache: Arc<dyn CacheService> = Arc::new(InMemoryCacheService::new());
        let store = Arc::new(data);
        let data: Arc<dyn DataService> = store.clone();
        let library =
            LibraryMetadataContainer::new(Arc::clone(&cache)).with_data_service(Arc::clone(&data));
        Self {
            cache,
            store,
            data,
            library,
        }
    }

    fn run(&self, name: &str, params: &OperationParams) -> rules_model::Result<Vec<Value>> {
        let results = evaluate(
            name,
            params,
            &params.dataframe,
            &self.cache,
            &self.data,
            Some(&self.library),
        )?;
        results
            .get(&params.operation_id)
            .expect("result keyed by operation id")
            .to_json_values()
    }
}

// =============================================================================
// domain_is_custom
// =============================================================================

#[test]
fn domain_is_custom_checks_standard_domains() {
    let harness = Harness::new();
    harness
        .library
        .set_standard_metadata(STANDARD, VERSION, StandardMetadata::from_domains(["AE"]))
        .unwrap();

    for frame in frame_modes(&ae_frame()) {
        let base = OperationParams::new("$custom", frame).with_standard(STANDARD, VERSION);

        let standard = base.clone().with_domain("AE");
        assert_eq!(
            harness.run("domain_is_custom", &standard).unwrap(),
            vec![json!(false); 3]
        );

        let custom = base.with_domain("BC");
        assert_eq!(
            harness.run("domain_is_custom", &custom).unwrap(),
            vec![json!(true); 3]
        );
    }
}

#[test]
fn domain_is_custom_fetches_standard_through_data_service() {
    let data = InMemoryDataService::new().with_standard_metadata(
        STANDARD,
        VERSION,
        json!({"classes": [{"name": "Events", "datasets": [{"name": "AE"}]}]}),
    );
    let cache: Arc<dyn CacheService> = Arc::new(InMemoryCacheService::new());
    let data: Arc<dyn DataService> = Arc::new(data);
    let params = OperationParams::new("$custom", ae_frame())
        .with_domain("AE")
        .with_standard(STANDARD, VERSION);

    let results = evaluate("domain_is_custom", &params, &params.dataframe, &cache, &data, None)
        .unwrap();
    assert_eq!(
        results.get("$custom").unwrap().to_json_values().unwrap(),
        vec![json!(false); 3]
    );
}

#[test]
fn domain_is_custom_requires_standard_version() {
    let harness = Harness::new();
    let params = OperationParams::new("$custom", ae_frame())
        .with_domain("AE")
        .with_standard(STANDARD, "");
    let err = harness.run("domain_is_custom", &params).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Usage);
}

#[test]
fn domain_is_custom_without_metadata_is_not_found() {
    let harness = Harness::new();
    let params = OperationParams::new("$custom", ae_frame())
        .with_domain("AE")
        .with_standard(STANDARD, VERSION);
    let err = harness.run("domain_is_custom", &params).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// =============================================================================
// study_domains
// =============================================================================

#[test]
fn study_domains_lists_manifest_domains() {
    let harness = Harness::new();
    let manifest = vec![
        DatasetManifestEntry::new("ae.csv", Some("AE")),
        DatasetManifestEntry::new("ex.csv", Some("EX")),
        DatasetManifestEntry::new("ae2.csv", Some("AE")),
    ];
    for frame in frame_modes(&ae_frame()) {
        let params = OperationParams::new("$domains", frame).with_datasets(manifest.clone());
        assert_eq!(
            harness.run("study_domains", &params).unwrap(),
            vec![json!(["AE", "EX"]); 3]
        );
    }
}

#[test]
fn study_domains_keeps_entries_without_domain() {
    let harness = Harness::new();
    let params = OperationParams::new("$domains", ae_frame()).with_datasets(vec![
        DatasetManifestEntry::new("ae.csv", Some("AE")),
        DatasetManifestEntry::new("unknown.csv", None),
    ]);
    assert_eq!(
        harness.run("study_domains", &params).unwrap(),
        vec![json!(["", "AE"]); 3]
    );
}

// =============================================================================
// get_codelist_attributes
// =============================================================================

fn store_ct_packages(library: &LibraryMetadataContainer) {
    library
        .set_ct_package_metadata(
            "sdtmct-2020-03-27",
            CtPackage::new("sdtmct-2020-03-27")
                .with_codelist("C49487", false, ["C49488", "C25473"])
                .with_codelist("C25473", true, ["C17998"])
                .with_codelist("C141663", false, ["C141664"]),
        )
        .unwrap();
    library
        .set_ct_package_metadata(
            "sdtmct-2022-12-16",
            CtPackage::new("sdtmct-2022-12-16")
                .with_codelist("C141656", false, ["C141670"])
                .with_codelist("C141657", false, ["C141671"])
                .with_codelist("C141663", false, ["C141664"]),
        )
        .unwrap();
}

const CT_2020: &str = "sdtmct-2020-03-27";
const CT_2022: &str = "sdtmct-2022-12-16";

fn ts_frame(codes: &[&str], references: &[&str], versions: &[&str]) -> DataFrame {
    let n = codes.len();
    DataFrame::new(vec![
        Series::new("STUDYID".into(), vec!["CDISC001"; n]).into(),
        Series::new("DOMAIN".into(), vec!["TS"; n]).into(),
        Series::new("TSSEQ".into(), (1..=n as i64).collect::<Vec<_>>()).into(),
        Series::new("TSVALCD".into(), codes).into(),
        Series::new("TSVCDREF".into(), references).into(),
        Series::new("TSVCDVER".into(), versions).into(),
    ])
    .unwrap()
}

fn codes_only(codes: &[&str]) -> DataFrame {
    ts_frame(codes, &vec!["CDISC CT"; codes.len()], &vec![""; codes.len()])
}

fn designated(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

#[test]
fn codelist_attributes_match_each_row() {
    let harness = Harness::new();
    store_ct_packages(&harness.library);

    let frame = codes_only(&["C49487", "C141663", "ZZZ_UNMATCHED", "C141657"]);
    for frame in frame_modes(&frame) {
        let params = OperationParams::new("$codes", frame).with_ct(
            "TSVALCD",
            "TSVCDVER",
            designated(&[CT_2022, CT_2020]),
        );
        assert_eq!(
            harness.run("get_codelist_attributes", &params).unwrap(),
            vec![
                json!([CT_2020]),
                json!([CT_2020, CT_2022]),
                json!([]),
                json!([CT_2022]),
            ]
        );
    }
}

#[test]
fn unmatched_code_gets_empty_list() {
    let harness = Harness::new();
    harness
        .library
        .set_ct_package_metadata(
            CT_2020,
            CtPackage::new(CT_2020)
                .with_codelist("C49487", false, ["A"])
                .with_codelist("C25473", false, ["X"]),
        )
        .unwrap();

    for frame in frame_modes(&codes_only(&["ZZZ_UNMATCHED", "C49487"])) {
        let params =
            OperationParams::new("$codes", frame).with_ct("TSVALCD", "TSVCDVER", designated(&[CT_2020]));
        assert_eq!(
            harness.run("get_codelist_attributes", &params).unwrap(),
            vec![json!([]), json!([CT_2020])]
        );
    }
}

#[test]
fn codelist_attributes_search_referenced_packages_only() {
    let harness = Harness::new();
    store_ct_packages(&harness.library);

    let cases = [
        (
            designated(&[CT_2020]),
            ts_frame(
                &["C49487x", "C49487", "C25473x", "", ""],
                &["CDISC CT", "CDISC CT", "CDISC CT", "SNOMED", "ISO 8601"],
                &["2020-03-27", "2020-03-27", "2020-03-27", "", ""],
            ),
            vec![json!([]), json!([CT_2020]), json!([]), json!([]), json!([])],
        ),
        (
            designated(&[CT_2022]),
            ts_frame(
                &["C49487", "C49487", "C25473", "C141657", "C141663"],
                &["CDISC", "CDISC", "CDISC CT", "CDISC CT", "CDISC CT"],
                &["2020-03-27", "2020-03-27", "2020-03-27", "2022-12-16", "2022-12-16"],
            ),
            vec![json!([]), json!([]), json!([]), json!([CT_2022]), json!([CT_2022])],
        ),
    ];

    for (packages, df, expected) in cases {
        for frame in frame_modes(&df) {
            let params = OperationParams::new("$codes", frame)
                .with_target("TSVCDREF")
                .with_ct("TSVALCD", "TSVCDVER", packages.clone());
            assert_eq!(
                harness.run("get_codelist_attributes", &params).unwrap(),
                expected
            );
        }
    }
}

#[test]
fn designated_package_not_referenced_matches_nothing() {
    let harness = Harness::new();
    store_ct_packages(&harness.library);

    let df = ts_frame(&["C49487", "C141663"], &["CDISC CT"; 2], &["2022-12-16"; 2]);
    let params = OperationParams::new("$codes", df)
        .with_target("TSVCDREF")
        .with_ct("TSVALCD", "TSVCDVER", designated(&[CT_2020]));
    assert_eq!(
        harness.run("get_codelist_attributes", &params).unwrap(),
        vec![json!([]); 2]
    );
}

#[test]
fn codelist_attributes_parameter_errors() {
    let harness = Harness::new();
    store_ct_packages(&harness.library);
    let frame = codes_only(&["C49487"]);

    let mut params = OperationParams::new("$codes", frame.clone());
    params.ct_packages = Some(designated(&[CT_2020]));
    let err = harness.run("get_codelist_attributes", &params).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Usage);

    let params = OperationParams::new("$codes", frame.clone()).with_ct(
        "NO_SUCH_COLUMN",
        "TSVCDVER",
        designated(&[CT_2020]),
    );
    let err = harness.run("get_codelist_attributes", &params).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Usage);
    insta::assert_snapshot!(
        err,
        @"Operation 'get_codelist_attributes' got an invalid 'ct_attribute': column 'NO_SUCH_COLUMN' is not in the dataset"
    );

    let params = OperationParams::new("$codes", frame.clone())
        .with_target("TSXREF")
        .with_ct("TSVALCD", "TSVCDVER", designated(&[CT_2020]));
    let err = harness.run("get_codelist_attributes", &params).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Usage);

    let mut params = OperationParams::new("$codes", frame.clone());
    params.ct_attribute = Some("TSVALCD".to_string());
    let err = harness.run("get_codelist_attributes", &params).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Usage);

    let params = OperationParams::new("$codes", frame.clone()).with_ct(
        "TSVALCD",
        "TSVCDVER",
        designated(&["sdtmct-1999-01-01"]),
    );
    let err = harness.run("get_codelist_attributes", &params).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let params = OperationParams::new("$codes", frame).with_ct("TSVALCD", "TSVCDVER", vec![]);
    assert_eq!(
        harness.run("get_codelist_attributes", &params).unwrap(),
        vec![json!([])]
    );
}

// =============================================================================
// get_column_order_from_library
// =============================================================================

fn general_observations() -> Value {
    json!({
        "name": "GENERAL OBSERVATIONS",
        "classVariables": [
            {"name": "TIMING_VAR", "role": "Timing", "ordinal": 33},
            {"name": "DOMAIN", "role": "Identifier", "ordinal": 2},
            {"name": "STUDYID", "role": "Identifier", "ordinal": 1},
            {"name": "--SEQ", "role": "Identifier", "ordinal": 3}
        ]
    })
}

/// AE defined directly by the model.
fn model_with_dataset() -> ModelMetadata {
    serde_json::from_value(model_with_dataset_json()).unwrap()
}

fn model_with_dataset_json() -> Value {
    json!({
        "datasets": [{
            "name": "AE",
            "parentClass": "Events",
            "datasetVariables": [
                {"name": "AETERM", "ordinal": 4},
                {"name": "AESEQ", "ordinal": 3}
            ]
        }],
        "classes": [general_observations()]
    })
}

/// AE only reachable through its observation class.
fn model_with_class() -> ModelMetadata {
    serde_json::from_value(json!({
        "classes": [
            {"name": "Events", "classVariables": [{"name": "--TERM", "ordinal": 4}]},
            general_observations()
        ]
    }))
    .unwrap()
}

#[test]
fn library_column_order_for_both_model_shapes() {
    let expected = json!(["STUDYID", "DOMAIN", "AESEQ", "AETERM", "TIMING_VAR"]);
    for model in [model_with_dataset(), model_with_class()] {
        let harness = Harness::new();
        harness
            .library
            .set_model_metadata(STANDARD, VERSION, model)
            .unwrap();

        for frame in frame_modes(&ae_frame()) {
            let params = OperationParams::new("$order", frame)
                .with_domain("AE")
                .with_standard(STANDARD, VERSION);
            let values = harness.run("get_column_order_from_library", &params).unwrap();
            assert_eq!(values, vec![expected.clone(); 3]);
        }
    }
}

#[test]
fn library_column_order_ignores_frame_column_order() {
    let harness = Harness::with_data(InMemoryDataService::new().with_model_metadata(
        STANDARD,
        VERSION,
        model_with_dataset_json(),
    ));

    let reordered = ae_frame()
        .select(["AETERM", "AESEQ", "DOMAIN", "STUDYID"])
        .unwrap();
    let original = OperationParams::new("$order", ae_frame())
        .with_domain("AE")
        .with_standard(STANDARD, VERSION);
    let shuffled = OperationParams::new("$order", reordered)
        .with_domain("AE")
        .with_standard(STANDARD, VERSION);

    let first = harness.run("get_column_order_from_library", &original).unwrap();
    let again = harness.run("get_column_order_from_library", &original).unwrap();
    let other = harness.run("get_column_order_from_library", &shuffled).unwrap();
    assert_eq!(first, again);
    assert_eq!(first, other);
    assert_eq!(harness.store.fetch_count(), 1);
}

#[test]
fn dataset_column_order_follows_frame() {
    let harness = Harness::new();
    let reordered = ae_frame().select(["AETERM", "STUDYID"]).unwrap();
    for frame in frame_modes(&reordered) {
        let params = OperationParams::new("$order", frame);
        assert_eq!(
            harness.run("get_column_order_from_dataset", &params).unwrap(),
            vec![json!(["AETERM", "STUDYID"]); 3]
        );
    }
}

#[test]
fn library_column_order_requires_domain() {
    let harness = Harness::new();
    let params = OperationParams::new("$order", ae_frame()).with_standard(STANDARD, VERSION);
    let err = harness
        .run("get_column_order_from_library", &params)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Usage);
    insta::assert_snapshot!(
        err,
        @"Operation 'get_column_order_from_library' requires parameter 'domain'"
    );
}
