pub mod analysis;
pub mod classify;
pub mod cli;
pub mod config;
pub mod data;
pub mod decompose;
pub mod dependency;
pub mod export;
pub mod ingest;
pub mod io_utils;
pub mod keys;
pub mod model;
pub mod mvd;
pub mod normal_form;
pub mod render;
pub mod rows;
pub mod store;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{LevelFilter, debug, info};
use serde::Serialize;

use crate::{
    analysis::{AnalysisSummary, Violation},
    cli::{AnalyzeArgs, Cli, Commands, InputArgs, OutputFormat, ProbeArgs},
    config::AnalysisConfig,
    decompose::NormalizationEngine,
    ingest::IngestOptions,
    model::{Column, Table},
    store::AnalysisStore,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_normalize", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Probe(args) => handle_probe(&args),
        Commands::Dependencies(args) => handle_dependencies(&args),
        Commands::Classify(args) => handle_classify(&args),
        Commands::Analyze(args) => handle_analyze(&args),
    }
}

fn handle_probe(args: &ProbeArgs) -> Result<()> {
    let config = resolve_config(&args.input)?;
    let table = load_input(&args.input, &config)?;
    let rendered = match args.format {
        OutputFormat::Text => render::columns_report(&table),
        format => serialize(&ProbeReport::from(&table), format)?,
    };
    export::write_report(None, &rendered)
}

fn handle_dependencies(args: &InputArgs) -> Result<()> {
    let config = resolve_config(args)?;
    let table = load_input(args, &config)?;
    let (name, rows) = (table.name.clone(), table.row_count());
    let engine = NormalizationEngine::new(table, &config)
        .with_context(|| format!("Preparing '{name}' for dependency detection"))?;
    let dependencies = engine.dependencies();
    if dependencies.is_empty() {
        info!(
            "No dependencies detected in '{name}' ({rows} row(s), minimum {})",
            config.min_rows
        );
    }
    export::write_report(None, &render::dependencies_report(dependencies))
}

fn handle_classify(args: &InputArgs) -> Result<()> {
    let config = resolve_config(args)?;
    let table = load_input(args, &config)?;
    let name = table.name.clone();
    let engine = NormalizationEngine::new(table, &config)
        .with_context(|| format!("Preparing '{name}' for classification"))?;
    let working = engine
        .tables()
        .first()
        .ok_or_else(|| anyhow!("No working table for '{name}'"))?;
    let form = classify::classify(working);
    export::write_report(None, &format!("{name}: {form}\n"))
}

fn handle_analyze(args: &AnalyzeArgs) -> Result<()> {
    let mut config = resolve_config(&args.input)?;
    if let Some(target) = args.target {
        config.target = target;
    }
    let table = load_input(&args.input, &config)?;
    let name = table.name.clone();
    let result = decompose::analyze_table(table, &config)
        .with_context(|| format!("Analyzing '{name}'"))?;

    let mut store = AnalysisStore::new();
    let id = store.insert(result);
    let summary = store
        .summary(&id)
        .ok_or_else(|| anyhow!("Analysis {id} is missing from the store"))?;
    let result = store
        .get(&id)
        .ok_or_else(|| anyhow!("Analysis {id} is missing from the store"))?;
    debug!("Stored analysis {id} for '{name}'");

    let rendered = match args.format {
        OutputFormat::Text => {
            let mut text = render::summary_report(&summary);
            if result.violation_count() > 0 {
                text.push_str("\nViolations:\n");
                text.push_str(&render::violations_report(result));
            }
            text.push_str("\nFinal tables:\n");
            text.push_str(&render::tables_report(&result.final_tables));
            text
        }
        format => {
            let report = AnalysisReport {
                summary,
                violations: result.all_violations().collect(),
                tables: &result.final_tables,
            };
            serialize(&report, format)?
        }
    };
    export::write_report(args.output.as_deref(), &rendered)?;
    if let Some(path) = &args.output {
        info!("Analysis report written to {path:?}");
    }

    if let Some(dir) = &args.export_dir {
        export::export_tables(&result.final_tables, dir)
            .with_context(|| format!("Exporting final tables to {dir:?}"))?;
    }
    Ok(())
}

/// Defaults, overlaid by the `--config` file, overlaid by explicit flags.
fn resolve_config(args: &InputArgs) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::load(path)
            .with_context(|| format!("Loading analysis settings from {path:?}"))?,
        None => AnalysisConfig::default(),
    };
    if let Some(threshold) = args.threshold {
        config.confidence_threshold = threshold;
    }
    if let Some(rows) = args.sample_rows {
        config.max_sample_rows = rows;
    }
    config.validate().context("Validating analysis settings")?;
    debug!("Effective analysis settings:\n{}", config.to_yaml_string()?);
    Ok(config)
}

fn load_input(args: &InputArgs, config: &AnalysisConfig) -> Result<Table> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    info!(
        "Reading '{}' with delimiter '{}'",
        args.input.display(),
        printable_delimiter(delimiter)
    );
    let options = IngestOptions {
        delimiter: Some(delimiter),
        encoding: args.input_encoding.clone(),
        max_rows: config.max_sample_rows,
    };
    ingest::load_table(&args.input, &options)
        .with_context(|| format!("Loading table from {:?}", args.input))
}

fn serialize<T: Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)
            .map(|mut json| {
                json.push('\n');
                json
            })
            .context("Serializing report to JSON"),
        OutputFormat::Yaml | OutputFormat::Text => {
            serde_yaml::to_string(value).context("Serializing report to YAML")
        }
    }
}

#[derive(Serialize)]
struct ProbeReport<'a> {
    table: &'a str,
    rows: usize,
    columns: &'a [Column],
}

impl<'a> From<&'a Table> for ProbeReport<'a> {
    fn from(table: &'a Table) -> Self {
        Self {
            table: &table.name,
            rows: table.row_count(),
            columns: &table.columns,
        }
    }
}

#[derive(Serialize)]
struct AnalysisReport<'a> {
    summary: AnalysisSummary,
    violations: Vec<&'a Violation>,
    tables: &'a [Table],
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
