//! protoc-gen-grain
//!
//! Runs as a protoc plugin (request on stdin, response on stdout) unless
//! `--descriptor-set` points at a `protoc --descriptor_set_out` file.

use std::io::{self, Read, Write};
use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use grain_gen::config::GeneratorConfig;
use grain_gen::descriptor::CodeGeneratorRequest;
use grain_gen::errors::GeneratorError;
use grain_gen::output::write_units;
use grain_gen::plugin::{generate_from_descriptor_set, respond};
use prost::Message;
use tracing_subscriber::EnvFilter;

/// Grain code generator - turns service definitions into grain actors and clients
#[derive(Parser, Debug)]
#[command(name = "protoc-gen-grain")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Read a FileDescriptorSet instead of a plugin request on stdin
    #[arg(long)]
    descriptor_set: Option<PathBuf>,

    /// Output directory for generated code (descriptor-set mode)
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Generator parameter, e.g. "bridge=v1,default_timeout=30s"
    #[arg(short, long, default_value = "")]
    param: String,

    /// Proto files to generate; all files in the set when omitted
    files: Vec<String>,

    /// Print generated code without writing files
    #[arg(long)]
    dry_run: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // stdout belongs to the plugin protocol
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

fn run_plugin() -> Result<(), GeneratorError> {
    let mut input = Vec::new();
    io::stdin()
        .read_to_end(&mut input)
        .map_err(|e| GeneratorError::ReadError {
            path: "<stdin>".to_string(),
            source: e,
        })?;

    let request = CodeGeneratorRequest::decode(input.as_slice())?;
    let response = respond(&request);

    io::stdout()
        .write_all(&response.encode_to_vec())
        .map_err(|e| GeneratorError::WriteError {
            path: "<stdout>".to_string(),
            source: e,
        })
}

fn run_descriptor_set(cli: &Cli, path: &PathBuf) -> Result<(), GeneratorError> {
    let config = GeneratorConfig::parse(&cli.param)?;
    let bytes = std::fs::read(path).map_err(|e| GeneratorError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    let units = generate_from_descriptor_set(&bytes, &cli.files, &config)?;
    write_units(&units, &cli.output, cli.dry_run)?;

    if !cli.dry_run {
        for unit in &units {
            eprintln!(
                "{} {}",
                "generated".green().bold(),
                cli.output.join(&unit.name).display()
            );
        }
        if units.is_empty() {
            eprintln!("{}", "no grain services found".yellow());
        }
    }

    Ok(())
}

fn main() -> Result<(), GeneratorError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.descriptor_set {
        Some(path) => run_descriptor_set(&cli, path),
        None => run_plugin(),
    }
}
