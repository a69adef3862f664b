//! Binary entry point.
//!
//! Each input-validation failure exits with its own stable code
//! (document missing: 2, destination not empty: 3, configuration
//! missing/invalid: 4); schema-shape errors found during generation
//! exit 1.

use std::path::PathBuf;
use std::process;

use clap::Parser;

use sdkgen::{ClientGenerator, GeneratorArgs};

/// Generates a lightweight human-readable Python SDK from an OpenAPI
/// json file.
#[derive(Parser, Debug)]
#[command(name = "sdkgen", version)]
struct Cli {
    /// The path to the file that you are willing to create the client from
    #[arg(short, long, default_value = "inputs/blockchainapis.json")]
    file: PathBuf,

    /// The YAML configuration file that contains the config for the run
    #[arg(short, long, default_value = "inputs/config.yml")]
    config: PathBuf,

    /// The path to the folder containing the additional code to append
    #[arg(short, long, default_value = "inputs/additional")]
    additional: PathBuf,

    /// The folder to which the client is generated (must not exist or be empty)
    #[arg(short, long, default_value = "dest")]
    dest: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    let generator = ClientGenerator::new(GeneratorArgs {
        file: cli.file,
        config: cli.config,
        additional: cli.additional,
        dest: cli.dest,
    });
    if let Err(error) = generator.create_client() {
        eprintln!("Error: {error}");
        process::exit(error.exit_code());
    }
}
