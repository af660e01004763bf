mod cli;

use std::fs;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use rvasm::config::{AssemblerConfig, BUNDLED_DEFINITIONS_DIR};
use rvasm::error::AssembleError;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(AssembleError::Diagnostics(diagnostics)) = err.downcast_ref::<AssembleError>() {
                for diagnostic in diagnostics {
                    eprintln!("{diagnostic}");
                }
                ExitCode::from(1)
            } else {
                eprintln!("error: {err:#}");
                ExitCode::from(2)
            }
        }
    }
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let mut search_path = cli.include.clone();
    if cli.include_definitions {
        search_path.push(BUNDLED_DEFINITIONS_DIR.into());
    }

    let config = AssemblerConfig::new()
        .with_compression(cli.compress)
        .with_search_path(search_path);

    tracing::info!(input = %cli.input.display(), "assembling");
    let output = rvasm::assemble(&cli.input, &config)?;

    fs::write(&cli.output, &output.bytes)
        .with_context(|| format!("failed to write output binary to '{}'", cli.output.display()))?;
    tracing::info!(bytes = output.bytes.len(), path = %cli.output.display(), "wrote binary image");

    if let Some(labels_path) = &cli.labels {
        write_labels(labels_path, &output.labels)?;
    }

    if let Some(offset) = cli.hex_offset {
        let hex_path = hex_output_path(&cli.output);
        rvasm::hex::write_file(&hex_path, &output.bytes, offset)
            .with_context(|| format!("failed to write Intel HEX output to '{}'", hex_path.display()))?;
        tracing::info!(path = %hex_path.display(), "wrote Intel HEX image");
    }

    Ok(())
}

fn hex_output_path(output: &std::path::Path) -> std::path::PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".hex");
    name.into()
}

fn write_labels(path: &std::path::Path, labels: &indexmap::IndexMap<String, i64>) -> anyhow::Result<()> {
    let mut listing = String::new();
    for (name, addr) in labels {
        listing.push_str(&format!("{name}\t0x{addr:08X}\n"));
    }
    fs::write(path, listing)
        .with_context(|| format!("failed to write labels listing to '{}'", path.display()))?;
    Ok(())
}
