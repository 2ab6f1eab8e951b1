use dupgen_config::{
    ConfigFile, CorruptionCategory, DistributionKind, FieldKind, FieldSpecValidator,
    GeneratorParams, ModificationMode, Operation, config_json_schema, default_config,
    parse_config_json, parse_config_toml, validate_config,
};
use serde_json::{Value, json};

fn params() -> GeneratorParams {
    GeneratorParams {
        num_org_records: 10,
        num_dup_records: 10,
        max_num_dups: 1,
        max_num_field_modifi: 1,
        max_num_record_modifi: 1,
        distribution: DistributionKind::Uniform,
        modification: ModificationMode::All,
    }
}

fn config(attributes: Value) -> ConfigFile {
    serde_json::from_value(json!({ "attributes": attributes })).expect("parse config")
}

fn surname(extra: Value) -> Value {
    let mut base = json!({
        "name": "surname",
        "type": "freq",
        "char_range": "alpha",
        "freq_file": "surname-freq.csv",
        "select_prob": 1.0,
        "ins_prob": 0.5,
        "sub_prob": 0.5
    });
    if let (Some(base), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
        for (key, value) in extra {
            base.insert(key.clone(), value.clone());
        }
    }
    base
}

#[test]
fn default_configuration_validates() {
    let config = default_config().expect("default config");
    let validated = validate_config(&config, &params()).expect("validate default config");

    assert_eq!(validated.fields.len(), 12);
    assert_eq!(validated.locale_field.as_deref(), Some("culture"));
    assert_eq!(validated.swaps.len(), 2);
    assert!(validated.warnings.is_empty(), "{:?}", validated.warnings);

    let culture = validated.field_index("culture").expect("culture");
    let blocking = validated.field_index("blocking_number").expect("blocking");
    assert!(validated.field_selection.items().all(|idx| *idx != culture && *idx != blocking));

    let dob = validated.field("date_of_birth").expect("date_of_birth");
    assert_eq!(
        dob.kind,
        FieldKind::Date {
            start_epoch: 0,
            end_epoch: 36_523
        }
    );

    let given = validated.field("given_name").expect("given_name");
    assert_eq!(given.depends_on, vec!["culture".to_string(), "sex".to_string()]);
}

#[test]
fn operation_table_follows_canonical_order() {
    let config = crate::config(json!([surname(json!({
        "ins_prob": 0.1,
        "sub_prob": 0.2,
        "miss_prob": 0.3,
        "trans_prob": 0.4
    }))]));
    let validated = validate_config(&config, &params()).expect("validate");
    let operations: Vec<Operation> = validated.fields[0].operations.items().copied().collect();
    assert_eq!(
        operations,
        vec![
            Operation::Insert,
            Operation::Substitute,
            Operation::Transpose,
            Operation::Missing
        ]
    );
    assert!((validated.fields[0].miss_prob() - 0.3).abs() < 1e-12);
}

#[test]
fn operation_probabilities_must_sum_to_zero_or_one() {
    let config = crate::config(json!([surname(json!({ "ins_prob": 0.5, "sub_prob": 0.4 }))]));
    let err = validate_config(&config, &params()).expect_err("sum of 0.9 is rejected");
    assert_eq!(err.field.as_deref(), Some("surname"));
    assert_eq!(err.key, "modification probabilities");

    let config = config_within_tolerance();
    assert!(validate_config(&config, &params()).is_ok());

    let config = crate::config(json!([surname(json!({ "ins_prob": 0.0, "sub_prob": 0.0 }))]));
    let validated = validate_config(&config, &params()).expect("zero sum is allowed");
    assert!(validated.fields[0].operations.is_empty());
    assert_eq!(validated.warnings.len(), 1);
    assert_eq!(validated.warnings[0].code, "field_never_modified");
}

fn config_within_tolerance() -> ConfigFile {
    config(json!([surname(json!({ "ins_prob": 0.5, "sub_prob": 0.4995 }))]))
}

#[test]
fn probabilities_outside_unit_interval_are_rejected() {
    let config = crate::config(json!([surname(json!({ "sub_prob": 1.5 }))]));
    let err = validate_config(&config, &params()).expect_err("out of range");
    assert_eq!(err.key, "sub_prob");
    assert!(err.to_string().contains("field 'surname', key 'sub_prob'"));
}

#[test]
fn reserved_and_unknown_values_are_rejected() {
    let config = crate::config(json!([surname(json!({ "name": "rec_id" }))]));
    let err = validate_config(&config, &params()).expect_err("rec_id");
    assert_eq!(err.key, "name");

    let config = crate::config(json!([surname(json!({ "type": "blob" }))]));
    let err = validate_config(&config, &params()).expect_err("unknown type");
    assert_eq!(err.key, "type");

    let config = crate::config(json!([surname(json!({ "char_range": "greek" }))]));
    let err = validate_config(&config, &params()).expect_err("unknown range");
    assert_eq!(err.key, "char_range");
}

#[test]
fn type_specific_keys_are_required() {
    let config = crate::config(json!([surname(json!({ "freq_file": null }))]));
    let err = validate_config(&config, &params()).expect_err("freq file");
    assert_eq!(err.key, "freq_file");

    let config = crate::config(json!([surname(json!({
        "type": "date",
        "char_range": "digit",
        "start_date": [31, 2, 1990],
        "end_date": [1, 1, 2000]
    }))]));
    let err = validate_config(&config, &params()).expect_err("invalid start date");
    assert_eq!(err.key, "start_date");

    let config = crate::config(json!([surname(json!({
        "type": "phone",
        "char_range": "digit",
        "area_codes": "02, 03"
    }))]));
    let err = validate_config(&config, &params()).expect_err("num digits");
    assert_eq!(err.key, "num_digits");

    let config = crate::config(json!([surname(json!({
        "type": "ident",
        "char_range": "digit",
        "start_id": 10,
        "end_id": 10
    }))]));
    let err = validate_config(&config, &params()).expect_err("empty id range");
    assert_eq!(err.key, "end_id");
}

#[test]
fn legacy_date_text_is_parsed() {
    let config = crate::config(json!([surname(json!({
        "type": "date",
        "char_range": "digit",
        "start_date": "(1,1,1900)",
        "end_date": "(25,4,2003)"
    }))]));
    let validated = validate_config(&config, &params()).expect("validate");
    assert_eq!(
        validated.fields[0].kind,
        FieldKind::Date {
            start_epoch: 0,
            end_epoch: 37_734
        }
    );
}

#[test]
fn selection_probabilities_must_sum_to_one() {
    let config = crate::config(json!([
        surname(json!({ "select_prob": 0.5 })),
        surname(json!({ "name": "given_name", "select_prob": 0.3 }))
    ]));
    let err = validate_config(&config, &params()).expect_err("select sum 0.8");
    assert_eq!(err.field, None);
    assert_eq!(err.key, "select_prob");
}

#[test]
fn dependencies_must_precede_and_have_lookups() {
    let config = crate::config(json!([
        surname(json!({ "select_prob": 0.5, "depend": "culture", "lookup_file": "x.tbl" })),
        surname(json!({ "name": "culture", "select_prob": 0.5 }))
    ]));
    let err = validate_config(&config, &params()).expect_err("forward dependency");
    assert_eq!(err.key, "depend");

    let config = crate::config(json!([
        surname(json!({ "name": "culture", "select_prob": 0.5 })),
        surname(json!({ "select_prob": 0.5, "depend": "culture" }))
    ]));
    let err = validate_config(&config, &params()).expect_err("missing lookup");
    assert_eq!(err.key, "lookup_file");

    let config = crate::config(json!([surname(json!({ "misspell_prob": 0.5, "ins_prob": 0.0 }))]));
    let err = validate_config(&config, &params()).expect_err("missing misspell file");
    assert_eq!(err.key, "misspell_file");
}

#[test]
fn field_selection_restricts_and_reweights() {
    let config = default_config().expect("default config");
    let selection = vec![("given_name".to_string(), 0.4), ("surname".to_string(), 0.6)];
    let validated = FieldSpecValidator::default()
        .validate(&config, &params(), Some(&selection))
        .expect("validate selection");

    assert_eq!(validated.field_names(), vec!["given_name", "surname"]);
    assert!(validated.fields[0].depends_on.is_empty());
    assert!((validated.fields[1].select_prob - 0.6).abs() < 1e-12);
    assert!(validated.warnings.iter().any(|issue| issue.code == "dependency_dropped"));
    assert_eq!(validated.swaps.len(), 1);
    assert_eq!(validated.locale_field, None);

    let unknown = vec![("nickname".to_string(), 1.0)];
    let err = FieldSpecValidator::default()
        .validate(&config, &params(), Some(&unknown))
        .expect_err("unknown field");
    assert_eq!(err.field.as_deref(), Some("nickname"));
}

#[test]
fn generator_parameters_are_checked() {
    let config = default_config().expect("default config");

    let mut bad = params();
    bad.max_num_dups = 10;
    assert_eq!(validate_config(&config, &bad).expect_err("dups").key, "max_num_dups");

    let mut bad = params();
    bad.max_num_field_modifi = 3;
    bad.max_num_record_modifi = 2;
    assert_eq!(
        validate_config(&config, &bad).expect_err("budgets").key,
        "max_num_record_modifi"
    );

    let mut bad = params();
    bad.num_org_records = 0;
    assert_eq!(validate_config(&config, &bad).expect_err("originals").key, "num_org_records");
}

#[test]
fn category_mix_must_sum_to_one_in_mixed_mode() {
    let mut config = default_config().expect("default config");
    config.error_type_distribution.ocr = 0.1;
    assert!(validate_config(&config, &params()).is_err());

    let mut typographical = params();
    typographical.modification = ModificationMode::Only(CorruptionCategory::Typographical);
    let validated = validate_config(&config, &typographical).expect("mix unused");
    assert_eq!(
        validated.categories.select_at(0.99),
        Some(&CorruptionCategory::Typographical)
    );
}

#[test]
fn tags_parse_with_short_and_long_names() {
    assert_eq!("uni".parse::<DistributionKind>().expect("uni"), DistributionKind::Uniform);
    assert_eq!("Poisson".parse::<DistributionKind>().expect("poisson"), DistributionKind::Poisson);
    assert_eq!("zip".parse::<DistributionKind>().expect("zip"), DistributionKind::Zipf);
    assert!("normal".parse::<DistributionKind>().is_err());

    assert_eq!("all".parse::<ModificationMode>().expect("all"), ModificationMode::All);
    assert_eq!(
        "ocr".parse::<ModificationMode>().expect("ocr"),
        ModificationMode::Only(CorruptionCategory::Ocr)
    );
    assert!("xyz".parse::<ModificationMode>().is_err());
}

#[test]
fn toml_and_json_sources_agree() {
    let toml = r#"
        missing_value = "NA"

        [[attributes]]
        name = "surname"
        type = "freq"
        char_range = "alpha"
        freq_file = "surname-freq.csv"
        select_prob = 1.0
        sub_prob = 1.0

        [[field_swap_prob]]
        fields = ["surname", "surname_alt"]
        prob = 0.1
    "#;
    let from_toml = parse_config_toml(toml).expect("toml");
    assert_eq!(from_toml.missing_value, "NA");
    assert_eq!(from_toml.attributes[0].sub_prob, Some(1.0));
    assert_eq!(from_toml.locale_field.as_deref(), Some("culture"));

    let err = validate_config(&from_toml, &params()).expect_err("unknown swap field");
    assert_eq!(err.key, "field_swap_prob");

    let err = parse_config_json(r#"{"attributes": [], "colour": 1}"#).expect_err("unknown key");
    assert_eq!(err.key, "config_file");
}

#[test]
fn json_schema_describes_attributes() {
    let schema = serde_json::to_value(config_json_schema()).expect("serialize schema");
    let properties = schema
        .get("properties")
        .and_then(|value| value.as_object())
        .expect("properties");
    assert!(properties.contains_key("attributes"));
    assert!(properties.contains_key("field_swap_prob"));
}
