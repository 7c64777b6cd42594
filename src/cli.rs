use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::normal_form::NormalForm;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Infer dependencies in CSV samples and decompose them into normal forms",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Infer column names, types, nullability and uniqueness from a CSV file
    Probe(ProbeArgs),
    /// Detect functional dependencies, multi-valued dependencies and candidate keys
    Dependencies(InputArgs),
    /// Report the highest normal form the table currently satisfies
    Classify(InputArgs),
    /// Run the full stepwise decomposition towards a target normal form
    Analyze(AnalyzeArgs),
}

/// Options shared by every command that reads a table.
#[derive(Debug, Args)]
pub struct InputArgs {
    /// Input CSV file (`-` reads standard input)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// YAML file with analysis settings
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Minimum confidence for accepting a dependency (0.0 to 1.0)
    #[arg(long)]
    pub threshold: Option<f64>,
    /// Maximum number of rows sampled from the input
    #[arg(long = "sample-rows")]
    pub sample_rows: Option<usize>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct ProbeArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Emit the inferred table structure as JSON or YAML instead of a table
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Normal form to stop at (1NF, 2NF, 3NF, BCNF, 4NF, 5NF)
    #[arg(long, value_parser = parse_normal_form)]
    pub target: Option<NormalForm>,
    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// Write the report to this file instead of stdout
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Write one CSV per final table into this directory
    #[arg(long = "export-dir")]
    pub export_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

pub fn parse_normal_form(value: &str) -> Result<NormalForm, String> {
    let form: NormalForm = value.parse().map_err(|err: anyhow::Error| err.to_string())?;
    if form == NormalForm::Unnormalized {
        return Err("Target must be 1NF or higher".to_string());
    }
    Ok(form)
}
