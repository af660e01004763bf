//! Command-line surface (SPEC_FULL.md §6.2). A thin driver: argument
//! parsing and exit-code conventions only, no assembly logic of its own.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "rvasm", version, about = "RV32I(MAC) standalone assembler", long_about = None)]
pub struct Cli {
    /// Entry assembly source file.
    pub input: PathBuf,

    /// Output binary path.
    #[arg(short, long, default_value = "bb.out")]
    pub output: PathBuf,

    /// Enable the C-extension compression pass.
    #[arg(short, long)]
    pub compress: bool,

    /// Append a directory to the include search path. Repeatable.
    #[arg(short = 'i', long = "include", value_name = "DIR")]
    pub include: Vec<PathBuf>,

    /// Write a two-column labels-to-addresses listing to PATH.
    #[arg(short, long, value_name = "PATH")]
    pub labels: Option<PathBuf>,

    /// Also emit an Intel HEX file (`<output>.hex`) with load offset N.
    #[arg(long, value_name = "N")]
    pub hex_offset: Option<u32>,

    /// Extend the search path with the bundled chip/peripheral definitions
    /// directory.
    #[arg(long)]
    pub include_definitions: bool,

    /// Diagnostic verbosity. Repeat for more (`-v`, `-vv`).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
