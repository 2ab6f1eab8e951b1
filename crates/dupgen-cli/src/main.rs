mod registry;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use dupgen_config::{
    ConfigurationError, DistributionKind, FieldSpecValidator, GeneratorParams, ModificationMode,
    config_json_schema, default_config, load_config,
};
use dupgen_generate::{
    CsvLayout, GenerateOptions, GenerationEngine, GenerationError, bundled_data_dir,
    write_records_csv, write_true_links_csv,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use registry::{RunManifest, RunOutputs, init_logging, write_json};
use thiserror::Error;

#[derive(Debug, Error)]
enum CliError {
    #[error("registry error: {0}")]
    Registry(#[from] registry::RegistryError),
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "dupgen", version, about = "Synthetic records with corrupted duplicates")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate original records and duplicates into a CSV file.
    Generate(GenerateArgs),
    /// Print the JSON schema of configuration files.
    Schema(SchemaArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// CSV file receiving the records.
    output_file: PathBuf,
    /// Number of original records to create.
    num_originals: u64,
    /// Number of duplicate records to create.
    num_duplicates: u64,
    /// Maximal number of duplicates derived from one original (1-9).
    max_duplicate_per_record: u32,
    /// Maximal number of modifications applied to one field.
    max_modification_per_field: u32,
    /// Maximal number of modifications applied to one record.
    max_modification_per_record: u32,
    /// Distribution of duplicates per original: uni, poi or zip.
    distribution: DistributionKind,
    /// Error types to inject: typ, pho, ocr or all.
    modification_types: ModificationMode,
    /// Value pinned on the locale field of every original record.
    #[arg(long)]
    culture: Option<String>,
    /// Field configuration (JSON, or TOML by extension); defaults to the
    /// built-in configuration.
    #[arg(long, alias = "config_file")]
    config_file: Option<PathBuf>,
    /// Directory holding frequency, lookup, misspelling and rule files.
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Seed of the random generator; drawn and reported when absent.
    #[arg(long)]
    seed: Option<u64>,
    /// Year used to derive birth years from ages.
    #[arg(long)]
    current_year: Option<i32>,
    /// Restrict and re-weight the modified fields, as `name=probability`.
    #[arg(long = "field", value_name = "NAME=PROB", value_parser = parse_field_selection)]
    fields: Vec<(String, f64)>,
    /// Omit the header row.
    #[arg(long, default_value_t = false)]
    no_header: bool,
    /// Write rows in random order instead of originals first.
    #[arg(long, default_value_t = false)]
    shuffle: bool,
    /// Write true-link pairs to this CSV file.
    #[arg(long)]
    links: Option<PathBuf>,
    /// Write the run manifest and generation report to this JSON file.
    #[arg(long)]
    report: Option<PathBuf>,
    /// Append JSON log lines to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    /// Write the schema to a file instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Schema(args) => run_schema(args),
    }
}

fn run_generate(args: GenerateArgs) -> Result<(), CliError> {
    init_logging(args.log_file.as_deref())?;
    let started_at = chrono::Utc::now();
    let timer = Instant::now();

    let params = GeneratorParams {
        num_org_records: args.num_originals,
        num_dup_records: args.num_duplicates,
        max_num_dups: args.max_duplicate_per_record,
        max_num_field_modifi: args.max_modification_per_field,
        max_num_record_modifi: args.max_modification_per_record,
        distribution: args.distribution,
        modification: args.modification_types,
    };

    let config = match &args.config_file {
        Some(path) => load_config(path)?,
        None => default_config()?,
    };
    let selection = (!args.fields.is_empty()).then_some(args.fields.as_slice());
    let validated = FieldSpecValidator::default().validate(&config, &params, selection)?;
    for issue in &validated.warnings {
        tracing::warn!(code = %issue.code, path = %issue.path, "{}", issue.message);
    }

    let data_dir = args.data_dir.clone().unwrap_or_else(bundled_data_dir);
    let options = GenerateOptions {
        seed: args.seed,
        locale: args.culture.clone(),
        current_year: args.current_year,
        data_dir: data_dir.clone(),
        ..GenerateOptions::default()
    };

    let config_source = args
        .config_file
        .as_deref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "builtin".to_string());
    tracing::info!(
        event = "generate_started",
        output = %args.output_file.display(),
        config = %config_source,
        data_dir = %data_dir.display()
    );

    let result = GenerationEngine::new(options).run(&validated)?;
    let run_id = result.report.run_id.as_str();
    let fields = validated.field_names();

    let layout = CsvLayout {
        header: !args.no_header,
        shuffle: args.shuffle,
    };
    let mut rng = ChaCha8Rng::seed_from_u64(result.report.seed);
    let bytes = write_records_csv(
        &args.output_file,
        &fields,
        result.records(),
        &validated.missing_value,
        layout,
        &mut rng,
    )
    .map_err(GenerationError::from)?;
    tracing::info!(
        event = "records_written",
        run_id = %run_id,
        path = %args.output_file.display(),
        bytes
    );

    if let Some(path) = &args.links {
        let links = result.true_links();
        let bytes = write_true_links_csv(path, &links).map_err(GenerationError::from)?;
        tracing::info!(
            event = "true_links_written",
            run_id = %run_id,
            path = %path.display(),
            links = links.len(),
            bytes
        );
    }

    if let Some(path) = &args.report {
        let manifest = RunManifest {
            run_id,
            started_at: started_at.to_rfc3339(),
            finished_at: chrono::Utc::now().to_rfc3339(),
            params: &validated.params,
            config_file: args.config_file.as_deref(),
            data_dir: &data_dir,
            culture: args.culture.as_deref(),
            fields: fields.clone(),
            outputs: RunOutputs {
                records: args.output_file.clone(),
                true_links: args.links.clone(),
                log_file: args.log_file.clone(),
            },
            report: &result.report,
        };
        write_json(path, &manifest)?;
        tracing::info!(event = "report_written", run_id = %run_id, path = %path.display());
    }

    tracing::info!(
        event = "run_finished",
        run_id = %run_id,
        status = "success",
        originals = result.originals.len(),
        duplicates = result.duplicates.len(),
        warnings = result.report.warnings.len(),
        duration_ms = timer.elapsed().as_millis() as u64
    );

    Ok(())
}

fn run_schema(args: SchemaArgs) -> Result<(), CliError> {
    let schema = config_json_schema();
    match args.out {
        Some(path) => write_json(&path, &schema)?,
        None => println!("{}", serde_json::to_string_pretty(&schema)?),
    }
    Ok(())
}

fn parse_field_selection(value: &str) -> Result<(String, f64), String> {
    let (name, prob) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=PROB, got '{value}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing field name in '{value}'"));
    }
    let prob: f64 = prob
        .trim()
        .parse()
        .map_err(|_| format!("invalid probability in '{value}'"))?;
    Ok((name.to_string(), prob))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positional_arguments_mirror_the_classic_tool() {
        let cli = Cli::try_parse_from([
            "dupgen", "generate", "out.csv", "100", "50", "3", "2", "4", "poisson", "typ",
            "--culture", "eng", "--field", "surname=0.6", "--field", "given_name=0.4",
        ])
        .expect("parse arguments");

        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.num_originals, 100);
        assert_eq!(args.max_modification_per_record, 4);
        assert_eq!(args.distribution, DistributionKind::Poisson);
        assert_eq!(
            args.modification_types,
            ModificationMode::Only(dupgen_config::CorruptionCategory::Typographical)
        );
        assert_eq!(args.culture.as_deref(), Some("eng"));
        assert_eq!(
            args.fields,
            vec![("surname".to_string(), 0.6), ("given_name".to_string(), 0.4)]
        );
        assert!(!args.no_header);
    }

    #[test]
    fn unknown_distribution_is_rejected() {
        let parsed = Cli::try_parse_from([
            "dupgen", "generate", "out.csv", "10", "10", "1", "1", "1", "gauss", "all",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn field_selection_needs_name_and_probability() {
        assert_eq!(
            parse_field_selection("surname = 0.25"),
            Ok(("surname".to_string(), 0.25))
        );
        assert!(parse_field_selection("surname").is_err());
        assert!(parse_field_selection("=0.3").is_err());
        assert!(parse_field_selection("surname=often").is_err());
    }
}
