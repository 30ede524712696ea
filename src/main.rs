//! SHAR Toolkit CLI
//!
//! Converts the raw UniMiB SHAR release to CSV and inspects the classifier.

use anyhow::Context;
use candle_core::{DType, Device, Tensor};
use clap::{Parser, Subcommand};
use shar_toolkit::{
    config::Config,
    core::{convert, raw::SEQUENCE_LEN, OutputPaths},
    model::{build_model, ClassifierConfig},
    VERSION,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shar")]
#[command(version = VERSION)]
#[command(about = "Data preparation and modelling for the UniMiB SHAR dataset", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert the raw MAT files into three CSV tables
    Convert {
        /// Directory holding full_data.mat, adl_data.mat, adl_labels.mat, adl_names.mat
        #[arg(long)]
        dataset_path: Option<PathBuf>,

        /// Directory for any table whose path is not given explicitly
        #[arg(long, short)]
        output_dir: Option<PathBuf>,

        /// Path of the per-timestep accelerometer table
        #[arg(long)]
        output_sensors_ts_csv_path: Option<PathBuf>,

        /// Path of the per-sequence metadata table
        #[arg(long)]
        output_metadata_for_each_ts_csv_path: Option<PathBuf>,

        /// Path of the per-subject metadata table
        #[arg(long)]
        output_metadata_for_each_subj_csv_path: Option<PathBuf>,

        /// Also write a JSON run report to this path
        #[arg(long)]
        report: Option<PathBuf>,

        /// Do not print the dataset summary
        #[arg(long, short)]
        quiet: bool,
    },

    /// Build the classifier and run one forward pass on zeros
    Model {
        /// JSON file with a classifier layout (defaults to the configured one)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Timesteps per input sequence
        #[arg(long, default_value_t = SEQUENCE_LEN)]
        seq_len: usize,

        /// Batch size of the probe input
        #[arg(long, default_value = "1")]
        batch: usize,
    },

    /// Show configuration
    Config {
        /// Write the shown configuration to the config file
        #[arg(long)]
        save: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            dataset_path,
            output_dir,
            output_sensors_ts_csv_path,
            output_metadata_for_each_ts_csv_path,
            output_metadata_for_each_subj_csv_path,
            report,
            quiet,
        } => cmd_convert(
            dataset_path.as_deref(),
            output_dir,
            OutputOverrides {
                sensors: output_sensors_ts_csv_path,
                sequences: output_metadata_for_each_ts_csv_path,
                subjects: output_metadata_for_each_subj_csv_path,
            },
            report.as_deref(),
            quiet,
        ),
        Commands::Model {
            config,
            seq_len,
            batch,
        } => cmd_model(config.as_deref(), seq_len, batch),
        Commands::Config { save } => cmd_config(save),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

/// Per-table output paths given on the command line.
struct OutputOverrides {
    sensors: Option<PathBuf>,
    sequences: Option<PathBuf>,
    subjects: Option<PathBuf>,
}

fn cmd_convert(
    dataset_path: Option<&Path>,
    output_dir: Option<PathBuf>,
    overrides: OutputOverrides,
    report_path: Option<&Path>,
    quiet: bool,
) -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;
    let dataset_dir = config
        .resolve_dataset_path(dataset_path)
        .context("resolving dataset path")?;

    let defaults = OutputPaths::in_dir(&output_dir.unwrap_or_else(|| config.output_dir.clone()));
    let outputs = OutputPaths {
        subjects: overrides.subjects.unwrap_or(defaults.subjects),
        sequences: overrides.sequences.unwrap_or(defaults.sequences),
        sensors: overrides.sensors.unwrap_or(defaults.sensors),
    };

    let report = convert(&dataset_dir, &outputs)
        .with_context(|| format!("converting {}", dataset_dir.display()))?;

    tracing::info!(
        run_id = %report.run_id,
        subjects = report.subjects,
        sequences = report.sequences,
        samples = report.samples,
        "Conversion finished"
    );

    if let Some(path) = report_path {
        report
            .write_json(path)
            .with_context(|| format!("writing report to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Wrote report");
    }

    if !quiet {
        println!("{}", report.summary.render());
    }

    Ok(())
}

fn cmd_model(config_path: Option<&Path>, seq_len: usize, batch: usize) -> anyhow::Result<()> {
    let layout = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str::<ClassifierConfig>(&content)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => Config::load().context("loading configuration")?.model,
    };

    let device = Device::Cpu;
    let model = build_model(&layout, &device)?;

    println!("Binary classifier");
    println!("=================");
    println!();
    for (i, kind) in model.kinds().iter().enumerate() {
        println!("  {i:>2}  {kind}");
    }
    println!();
    println!("Parameters: {}", model.num_parameters());

    match layout.output_len(seq_len) {
        Some(1) => {}
        Some(len) => tracing::warn!(
            seq_len,
            conv_output_len = len,
            "Convolution stack does not reduce the sequence to length 1; forward will fail"
        ),
        None => tracing::warn!(seq_len, "Sequence is too short for the convolution stack"),
    }

    let channels = layout.channel_sizes[0];
    let probe = Tensor::zeros((batch, channels, seq_len), DType::F32, &device)?;
    let output = model.forward(&probe).context("forward pass")?;
    println!("Input shape:  {:?}", probe.dims());
    println!("Output shape: {:?}", output.dims());

    Ok(())
}

fn cmd_config(save: bool) -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);

    if save {
        config.save().context("saving configuration")?;
        println!();
        println!("Saved to {:?}", Config::config_path());
    }

    Ok(())
}
