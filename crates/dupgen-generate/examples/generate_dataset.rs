use std::env;
use std::path::PathBuf;

use dupgen_config::{
    DistributionKind, GeneratorParams, ModificationMode, default_config, load_config,
    validate_config,
};
use dupgen_generate::{CsvLayout, GenerateOptions, GenerationEngine, write_records_csv};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = env::args().skip(1);
    let mut config_path: Option<PathBuf> = None;
    let mut out_path: Option<PathBuf> = None;
    let mut seed: Option<u64> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config_path = args.next().map(PathBuf::from),
            "--seed" => seed = args.next().map(|value| value.parse()).transpose()?,
            _ => {
                if out_path.is_none() {
                    out_path = Some(PathBuf::from(arg));
                } else {
                    return Err("unexpected argument".into());
                }
            }
        }
    }

    let out_path = out_path.ok_or("missing output path")?;
    let config = match config_path {
        Some(path) => load_config(&path)?,
        None => default_config()?,
    };
    let params = GeneratorParams {
        num_org_records: 100,
        num_dup_records: 50,
        max_num_dups: 3,
        max_num_field_modifi: 2,
        max_num_record_modifi: 4,
        distribution: DistributionKind::Zipf,
        modification: ModificationMode::All,
    };
    let validated = validate_config(&config, &params)?;

    let options = GenerateOptions {
        seed,
        ..GenerateOptions::default()
    };
    let result = GenerationEngine::new(options).run(&validated)?;

    let mut rng = ChaCha8Rng::seed_from_u64(result.report.seed);
    write_records_csv(
        &out_path,
        &validated.field_names(),
        result.records(),
        &validated.missing_value,
        CsvLayout::default(),
        &mut rng,
    )?;

    println!("records={}", out_path.display());
    println!("{}", serde_json::to_string_pretty(&result.report)?);
    Ok(())
}
