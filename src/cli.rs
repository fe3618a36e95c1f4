//! Command line front end: read a sheet, validate it, print it in another form.

use clap::Parser;
use colored::Colorize;
use serde_json::Value;
use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::exit_code;
use crate::samplesheet::{Revalidate, SampleSheetV2};
use crate::sheet::SectionedSheet;
use crate::validation::{validate_with_resolver, SchemaResolver, Validator};

/// Token naming standard input as the input file.
pub const STDIN_TOKEN: &str = "-";

#[derive(Parser, Debug)]
#[command(name = "samshee")]
#[command(version)]
#[command(about = "Read, validate and convert Illumina sample sheets", long_about = None)]
#[command(
    after_help = "EXAMPLES:\n    samshee SampleSheet.csv\n    samshee --output-format json SampleSheet.csv\n    samshee --schema '{\"$ref\": \"urn:samshee:nextseq1k2k/v1\"}' - < SampleSheet.csv"
)]
pub struct Cli {
    /// Input sample sheet. Use "-" for stdin.
    #[arg(value_name = "INFILE")]
    pub infile: String,

    /// Input format: sectioned or json. v1 sheets can be read as sectioned sheets.
    #[arg(long, value_name = "FORMAT", default_value = "sectioned")]
    pub input_format: String,

    /// Output format: sectioned, v2 or json
    #[arg(long, value_name = "FORMAT", default_value = "v2")]
    pub output_format: String,

    /// Additional JSON schema, e.g. '{"required": ["Header", "Reads"]}'.
    /// Use "$ref" to link external or built-in schemas such as
    /// urn:samshee:illuminav2/v1. Can be given more than once.
    #[arg(long = "schema", value_name = "JSON")]
    pub schemas: Vec<String>,

    /// Configuration file (defaults to $SAMSHEE_CONFIG)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Never fetch remote schemas
    #[arg(long)]
    pub offline: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Sectioned,
    Json,
}

impl FromStr for InputFormat {
    type Err = Failure;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sectioned" => Ok(Self::Sectioned),
            "json" => Ok(Self::Json),
            other => Err(Failure::new(
                exit_code::FORMAT,
                format!(
                    "Unknown input format: {}. Must be json or sectioned. Use \"sectioned\" for any v1 or v2 sample sheets.",
                    other
                ),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Sectioned,
    V2,
    Json,
}

impl FromStr for OutputFormat {
    type Err = Failure;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sectioned" => Ok(Self::Sectioned),
            "v2" => Ok(Self::V2),
            "json" => Ok(Self::Json),
            other => Err(Failure::new(
                exit_code::FORMAT,
                format!("Unknown output format: {}. Must be json, v2, or sectioned.", other),
            )),
        }
    }
}

/// A failed run: the message for stderr and the process exit code.
#[derive(Debug)]
pub struct Failure {
    pub code: u8,
    pub message: String,
}

impl Failure {
    pub fn new(code: u8, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn read(err: impl fmt::Display) -> Self {
        Self::new(exit_code::READ, format!("Error reading sheet: {}", err))
    }

    fn validation(err: impl fmt::Display) -> Self {
        Self::new(exit_code::VALIDATION, format!("Validation failed: {}", err))
    }

    fn output(err: impl fmt::Display) -> Self {
        Self::new(exit_code::OUTPUT, format!("Failed writing output: {}", err))
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", "Error:".red(), self.message)
    }
}

/// Run the tool, writing the result to `out`.
pub fn run<W: Write>(cli: &Cli, out: &mut W) -> Result<(), Failure> {
    let config = Config::load(cli.config.as_deref()).map_err(|e| {
        Failure::new(exit_code::READ, format!("Error loading configuration: {:#}", e))
    })?;
    let resolver = build_resolver(&config, cli.offline);

    let input_format: InputFormat = cli.input_format.parse()?;
    let sheet = read_input(&cli.infile, input_format)?;
    info!(sections = sheet.len(), "read sheet");

    let extra = parse_schemas(&cli.schemas)?;
    validate_with_resolver(&sheet, &extra, &resolver).map_err(Failure::validation)?;

    let output_format: OutputFormat = cli.output_format.parse()?;
    let rendered = match output_format {
        OutputFormat::Sectioned => sheet.to_text(),
        OutputFormat::Json => {
            let mut json = sheet.to_json(true).map_err(Failure::output)?;
            json.push('\n');
            json
        }
        OutputFormat::V2 => {
            let mut validators = config.validators();
            validators.extend(extra);
            let v2 = SampleSheetV2::with_resolver(sheet, validators, resolver)
                .map_err(Failure::output)?;
            // construction just ran the same list
            v2.to_text(Revalidate::Skip).map_err(Failure::output)?
        }
    };

    out.write_all(rendered.as_bytes())
        .and_then(|_| out.flush())
        .map_err(Failure::output)
}

fn build_resolver(config: &Config, offline: bool) -> std::sync::Arc<dyn SchemaResolver> {
    if offline && config.resolver.allow_remote {
        let mut config = config.clone();
        config.resolver.allow_remote = false;
        return config.resolver();
    }
    config.resolver()
}

fn read_input(infile: &str, format: InputFormat) -> Result<SectionedSheet, Failure> {
    let text = if infile == STDIN_TOKEN {
        debug!("reading sheet from stdin");
        let mut text = String::new();
        io::stdin().read_to_string(&mut text).map_err(Failure::read)?;
        text
    } else {
        debug!(path = infile, "reading sheet");
        fs::read_to_string(infile)
            .map_err(|e| Failure::read(format!("{}: {}", infile, e)))?
    };

    match format {
        InputFormat::Sectioned => SectionedSheet::parse(&text).map_err(Failure::read),
        InputFormat::Json => SectionedSheet::from_json(&text).map_err(Failure::read),
    }
}

fn parse_schemas(schemas: &[String]) -> Result<Vec<Validator>, Failure> {
    schemas
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            let schema: Value = serde_json::from_str(raw)
                .map_err(|e| Failure::validation(format!("--schema #{} is not valid JSON: {}", i, e)))?;
            Ok(Validator::schema(schema))
        })
        .collect()
}
