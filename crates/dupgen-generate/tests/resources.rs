use std::fs;
use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use dupgen_config::{
    CorruptionCategory, DistributionKind, GeneratorParams, ModificationMode, default_config,
    validate_config,
};
use dupgen_generate::errors::ResourceLoadError;
use dupgen_generate::{
    DuplicateCountDistribution, FrequencyPool, KeyedTable, ResourceLoader, SourceLine,
    bundled_data_dir,
};

fn lines(texts: &[&str]) -> Vec<SourceLine> {
    texts
        .iter()
        .enumerate()
        .map(|(idx, text)| SourceLine {
            number: idx + 1,
            text: text.to_string(),
        })
        .collect()
}

fn params(distribution: DistributionKind, max_num_dups: u32) -> GeneratorParams {
    GeneratorParams {
        num_org_records: 10,
        num_dup_records: 10,
        max_num_dups,
        max_num_field_modifi: 1,
        max_num_record_modifi: 1,
        distribution,
        modification: ModificationMode::All,
    }
}

fn temp_data_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("dupgen_data_{label}_{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create temp data dir");
    dir
}

#[test]
fn frequency_pool_repeats_values_by_count() {
    let pool = FrequencyPool::parse(Path::new("sex.csv"), &lines(&["m, 3", "f,1", "x,0"]))
        .expect("parse frequency file");
    assert_eq!(pool.len(), 4);
    assert_eq!(pool.values().iter().filter(|value| *value == "m").count(), 3);
    assert!(pool.values().iter().all(|value| value != "x"));
}

#[test]
fn frequency_pool_rejects_malformed_lines() {
    let err = FrequencyPool::parse(Path::new("sex.csv"), &lines(&["m,3", "f,1,2"]))
        .expect_err("three columns");
    assert!(matches!(err, ResourceLoadError::Malformed { line: 2, .. }), "{err}");

    let err = FrequencyPool::parse(Path::new("sex.csv"), &lines(&["m,many"]))
        .expect_err("invalid count");
    assert!(matches!(err, ResourceLoadError::Malformed { line: 1, .. }), "{err}");

    let err =
        FrequencyPool::parse(Path::new("sex.csv"), &lines(&["m,0"])).expect_err("no values");
    assert!(matches!(err, ResourceLoadError::Invalid { .. }), "{err}");
}

#[test]
fn misspellings_are_lowercased_sorted_and_deduplicated() {
    let table = KeyedTable::parse_misspellings(
        Path::new("misspell.tbl"),
        &lines(&["Smith: smyth, Smit, smyth", "smithe", "jones : joens"]),
    )
    .expect("parse misspellings");

    assert_eq!(table.len(), 2);
    let smith: Vec<&str> = table
        .get("smith")
        .expect("smith entry")
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(smith, vec!["smit", "smithe", "smyth"]);
    assert_eq!(table.keys().collect::<Vec<_>>(), vec!["jones", "smith"]);
}

#[test]
fn misspellings_reject_the_correct_spelling_and_orphan_lines() {
    let err = KeyedTable::parse_misspellings(Path::new("m.tbl"), &lines(&["smith: smith"]))
        .expect_err("identical misspelling");
    assert!(matches!(err, ResourceLoadError::Malformed { line: 1, .. }), "{err}");

    let err = KeyedTable::parse_misspellings(Path::new("m.tbl"), &lines(&["smyth, smit"]))
        .expect_err("values before key");
    assert!(matches!(err, ResourceLoadError::Malformed { line: 1, .. }), "{err}");

    let err = KeyedTable::parse_misspellings(Path::new("m.tbl"), &lines(&["smith:"]))
        .expect_err("no values");
    assert!(matches!(err, ResourceLoadError::Malformed { .. }), "{err}");
}

#[test]
fn lookup_tables_expand_weighted_values() {
    let table = KeyedTable::parse_lookup(
        Path::new("lookup.tbl"),
        &lines(&["ENG-M: James;3, john", "  peter"]),
    )
    .expect("parse lookup");

    let values = table.get("eng-m").expect("eng-m entry");
    assert_eq!(values, ["john", "peter", "james", "james", "james"]);

    let mut rng = ChaCha8Rng::seed_from_u64(1);
    assert!(table.choose("eng-m", &mut rng).is_some());
    assert_eq!(table.choose("ger-f", &mut rng), None);

    let err = KeyedTable::parse_lookup(Path::new("lookup.tbl"), &lines(&["eng: james;x"]))
        .expect_err("invalid weight");
    assert!(matches!(err, ResourceLoadError::Malformed { line: 1, .. }), "{err}");
}

#[test]
fn loader_skips_comments_and_reports_line_numbers() {
    let dir = temp_data_dir("comments");
    fs::write(
        dir.join("rules.csv"),
        "# phonetic rules\n\nALL,ph,f\n  # indented comment\nALL,ph\n",
    )
    .expect("write rules");

    let loader = ResourceLoader::new(dir.clone());
    let loaded = loader.load_lines("rules.csv").expect("load lines");
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].number, 3);
    assert_eq!(loaded[1].number, 5);

    let err = loader.rules("rules.csv").expect_err("malformed rule");
    assert!(matches!(err, ResourceLoadError::Malformed { line: 5, .. }), "{err}");

    let err = loader.load_lines("missing.csv").expect_err("missing file");
    assert!(matches!(err, ResourceLoadError::Read { .. }), "{err}");

    fs::remove_dir_all(dir).ok();
}

#[test]
fn bundled_data_covers_the_default_configuration() {
    let config = default_config().expect("default config");
    let validated =
        validate_config(&config, &params(DistributionKind::Uniform, 1)).expect("validate");

    let loader = ResourceLoader::new(bundled_data_dir());
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let tables = loader
        .load_tables(&validated, &mut rng)
        .expect("load bundled tables");

    assert_eq!(tables.frequencies.len(), 8);
    assert!(tables.misspellings.contains_key("given_name"));
    assert!(tables.misspellings.contains_key("surname"));
    assert!(tables.lookups.contains_key("phone_number"));
    assert!(!tables.phonetic.is_empty());
    assert!(!tables.ocr.is_empty());

    let given_names = tables.lookups.get("given_name").expect("given name lookup");
    assert!(given_names.get("eng-m").is_some());
    assert!(given_names.get("chi-f").is_some());
}

#[test]
fn rule_tables_load_only_for_drawable_categories() {
    let config = default_config().expect("default config");
    let mut typographical = params(DistributionKind::Uniform, 1);
    typographical.modification = ModificationMode::Only(CorruptionCategory::Typographical);
    let validated = validate_config(&config, &typographical).expect("validate");

    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let tables = ResourceLoader::new(bundled_data_dir())
        .load_tables(&validated, &mut rng)
        .expect("load tables");
    assert!(tables.phonetic.is_empty());
    assert!(tables.ocr.is_empty());
}

#[test]
fn poisson_distribution_keeps_the_shifted_masses() {
    let mut poisson = params(DistributionKind::Poisson, 3);
    poisson.num_dup_records = 10;
    poisson.num_org_records = 10;
    let distribution = DuplicateCountDistribution::new(&poisson).expect("distribution");

    let entries = distribution.table().entries();
    assert_eq!(entries.len(), 3);
    let expected = [(1, 0.0), (2, 0.2), (3, 0.6)];
    for ((count, bound), (want_count, want_bound)) in entries.iter().zip(expected) {
        assert_eq!(*count, want_count);
        assert!((bound - want_bound).abs() < 1e-9, "{count}: {bound}");
    }
}

#[test]
fn zipf_distribution_weights_counts_by_inverse_square_root() {
    let distribution =
        DuplicateCountDistribution::new(&params(DistributionKind::Zipf, 3)).expect("zipf");

    let entries = distribution.table().entries();
    assert_eq!(entries.len(), 3);
    let expected = [(1, 0.0), (2, 0.437_741), (3, 0.747_270)];
    for ((count, bound), (want_count, want_bound)) in entries.iter().zip(expected) {
        assert_eq!(*count, want_count);
        assert!((bound - want_bound).abs() < 1e-5, "{count}: {bound}");
    }

    let mut rng = ChaCha8Rng::seed_from_u64(13);
    let mut seen = [0_u32; 4];
    let draws = 40_000;
    for _ in 0..draws {
        seen[distribution.sample(&mut rng) as usize] += 1;
    }
    let weights = [1.0, 1.0 / 2_f64.sqrt(), 1.0 / 3_f64.sqrt()];
    let total: f64 = weights.iter().sum();
    for (hits, weight) in seen[1..].iter().zip(weights) {
        let share = f64::from(*hits) / f64::from(draws);
        assert!((share - weight / total).abs() < 0.02, "{seen:?}");
    }
}

#[test]
fn duplicate_counts_stay_within_bounds() {
    let mut rng = ChaCha8Rng::seed_from_u64(21);
    for kind in [
        DistributionKind::Uniform,
        DistributionKind::Poisson,
        DistributionKind::Zipf,
    ] {
        let distribution = DuplicateCountDistribution::new(&params(kind, 5)).expect("distribution");
        let mut seen = [0_u32; 6];
        for _ in 0..10_000 {
            let count = distribution.sample(&mut rng);
            assert!((1..=5).contains(&count), "{kind}: {count}");
            seen[count as usize] += 1;
        }
        assert!(seen[1..].iter().all(|hits| *hits > 0), "{kind}: {seen:?}");
    }
}

#[test]
fn uniform_distribution_converges_to_equal_shares() {
    let distribution =
        DuplicateCountDistribution::new(&params(DistributionKind::Uniform, 4)).expect("uniform");
    let mut rng = ChaCha8Rng::seed_from_u64(8);
    let mut seen = [0_u32; 5];
    let draws = 40_000;
    for _ in 0..draws {
        seen[distribution.sample(&mut rng) as usize] += 1;
    }
    for hits in &seen[1..] {
        let share = f64::from(*hits) / f64::from(draws);
        assert!((share - 0.25).abs() < 0.02, "{seen:?}");
    }
}
