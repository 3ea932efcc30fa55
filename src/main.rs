use std::fs;
use std::path::{Path, PathBuf};

use astroreport::{Config, OutputFormat, ReportMetadata};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Pdf,
    Docx,
    Both,
}

impl Format {
    fn outputs(self) -> &'static [OutputFormat] {
        match self {
            Format::Pdf => &[OutputFormat::Paginated],
            Format::Docx => &[OutputFormat::Flow],
            Format::Both => &[OutputFormat::Paginated, OutputFormat::Flow],
        }
    }
}

#[derive(Parser)]
#[command(name = "astroreport")]
#[command(about = "Render report markup to PDF and DOCX")]
struct Cli {
    /// Input markup file
    input: PathBuf,

    /// Output file (defaults to input name; the extension is set per format)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Which documents to produce
    #[arg(short, long, value_enum, default_value = "both")]
    format: Format,

    /// Display name used in the delivery file name (repeatable)
    #[arg(long = "name")]
    names: Vec<String>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path),
        None => Config::compiled_default(),
    };

    // Read input file
    let markup = match fs::read_to_string(&cli.input) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading {}: {}", cli.input.display(), e);
            std::process::exit(1);
        }
    };

    let base = cli.output.as_deref().unwrap_or(cli.input.as_path());
    for &format in cli.format.outputs() {
        let metadata = ReportMetadata::new(cli.names.clone(), output_path(base, format));
        let rendered = match format {
            OutputFormat::Paginated => {
                astroreport::render_paginated_with_config(&markup, &metadata, &config)
            }
            OutputFormat::Flow => astroreport::render_flow_with_config(&markup, &metadata, &config),
        };

        match rendered {
            Ok(path) => println!(
                "Created {} ({})",
                path.display(),
                metadata.delivery_file_name(&config.naming.prefix, format)
            ),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn output_path(base: &Path, format: OutputFormat) -> PathBuf {
    base.with_extension(format.extension())
}
