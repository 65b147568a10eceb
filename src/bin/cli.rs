//! Command-line interface for the metabomap library
//!
//! This binary maps measured metabolites onto a metabolic model, either as a
//! full run or one stage at a time:
//!
//! # Usage
//!
//! ```bash
//! # Full run, writing measurements.xlsx next to the input
//! metabomap run measurements.csv model.xml --checkpoints checkpoints/
//!
//! # Identifier lookup only
//! metabomap query measurements.csv -o identifiers.csv
//!
//! # Model map only
//! metabomap model model.xml -o model.csv
//!
//! # Print the JSON schema of the configuration file
//! metabomap config --schema
//! ```

use std::{error::Error, path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use colored::Colorize;
use metabomap::{
    config::PipelineConfig,
    identifiers::MatchKey,
    info::to_table,
    io::load_config,
    pipeline::Pipeline,
    report::Report,
    tabular::dataframe::{write_csv, ToDataFrame},
};

/// Main CLI configuration struct
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by all commands that read measurements
#[derive(clap::Args)]
struct MeasurementArgs {
    /// Path to a JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Header of the metabolite name column (first column if omitted)
    #[arg(long)]
    name_column: Option<String>,

    /// Split names on this delimiter, e.g. "/" for citrate/isocitrate
    #[arg(long)]
    delimiter: Option<String>,

    /// Lower-case names before querying
    #[arg(long)]
    lowercase: bool,
}

impl MeasurementArgs {
    /// Loads the configuration file, if any, and applies the flags on top.
    fn to_config(&self) -> Result<PipelineConfig, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(name_column) = &self.name_column {
            config.name_column = Some(name_column.clone());
        }
        if let Some(delimiter) = &self.delimiter {
            config.name_delimiter = Some(delimiter.clone());
        }
        if self.lowercase {
            config.lowercase_queries = true;
        }

        Ok(config)
    }
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write the mapped dataset
    Run {
        /// Measurement file (CSV, TSV, XLSX or ODS)
        data: PathBuf,

        /// SBML model file
        model: PathBuf,

        /// Output workbook
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory for intermediate CSV files
        #[arg(long)]
        checkpoints: Option<PathBuf>,

        /// Expand names with PubChem synonyms before mapping
        #[arg(long)]
        synonyms: bool,

        /// Identifier checkpoint to use instead of querying MetaboAnalyst
        #[arg(long)]
        identifiers: Option<PathBuf>,

        /// Identifier databases used for matching
        #[arg(long, value_delimiter = ',')]
        keys: Option<Vec<MatchKey>>,

        #[command(flatten)]
        measurement: MeasurementArgs,
    },
    /// Resolve measured names to database identifiers
    Query {
        /// Measurement file
        data: PathBuf,

        /// CSV file for the identifier map
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        measurement: MeasurementArgs,
    },
    /// Look up PubChem synonyms of measured names
    Synonyms {
        /// Measurement file
        data: PathBuf,

        /// CSV file for the synonyms
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        measurement: MeasurementArgs,
    },
    /// Read the species and identifiers of a model
    Model {
        /// SBML model file
        model: PathBuf,

        /// CSV file for the model map
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the default configuration
    Config {
        /// Print the JSON schema instead
        #[arg(long)]
        schema: bool,
    },
}

/// Main entry point for the CLI application
pub fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), Box<dyn Error>> {
    match command {
        Commands::Run {
            data,
            model,
            output,
            checkpoints,
            synonyms,
            identifiers,
            keys,
            measurement,
        } => {
            let mut config = measurement.to_config()?;
            if checkpoints.is_some() {
                config.checkpoint_dir = checkpoints;
            }
            if synonyms {
                config.expand_synonyms = true;
            }
            if let Some(keys) = keys {
                config.match_keys = keys;
            }

            let pipeline = Pipeline::builder()
                .config(config)
                .maybe_identifiers(identifiers)
                .build();
            let summary = pipeline.run(&data, &model, output)?;

            println!("{summary}");
            print_report(&summary.report);
        }
        Commands::Query {
            data,
            output,
            measurement,
        } => {
            let pipeline = Pipeline::builder().config(measurement.to_config()?).build();
            let (_, plan) = pipeline.query_plan(&data)?;
            let records = pipeline.identify(&plan)?;

            match output {
                Some(path) => write_csv(&mut records.to_dataframe()?, path)?,
                None => println!("{}", to_table(&records)),
            }
        }
        Commands::Synonyms {
            data,
            output,
            measurement,
        } => {
            let pipeline = Pipeline::builder().config(measurement.to_config()?).build();
            let (_, mut plan) = pipeline.query_plan(&data)?;
            let mut report = Report::new();
            let records = pipeline.expand_synonyms(&mut plan, &mut report)?;

            match output {
                Some(path) => write_csv(&mut records.to_dataframe()?, path)?,
                None => println!("{}", to_table(&records)),
            }
            print_report(&report);
        }
        Commands::Model { model, output } => {
            let pipeline = Pipeline::builder().config(PipelineConfig::default()).build();
            let mut report = Report::new();
            let model = pipeline.model(&model, &mut report)?;

            match output {
                Some(path) => write_csv(&mut model.to_dataframe()?, path)?,
                None => println!("{model}"),
            }
            print_report(&report);
        }
        Commands::Config { schema } => {
            let rendered = if schema {
                serde_json::to_string_pretty(&schemars::schema_for!(PipelineConfig))?
            } else {
                serde_json::to_string_pretty(&PipelineConfig::default())?
            };
            println!("{rendered}");
        }
    }

    Ok(())
}

fn print_report(report: &Report) {
    if report.is_empty() {
        return;
    }

    println!(
        "{}",
        format!("{} items skipped", report.len()).yellow().bold()
    );
    println!("{}", report.to_table());
}
