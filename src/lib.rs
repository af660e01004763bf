//! # rvasm
//!
//! A standalone assembler for RV32I(M, A, C) microcontroller firmware
//! images. [`assemble`] drives the full nanopass pipeline — source
//! loading, lexing, parsing, constant evaluation, pseudo-instruction
//! expansion, layout, optional compression, encoding — and returns the
//! finished flat binary plus the label table a caller (the `rvasm` CLI, or
//! any embedder) needs for a `--labels` listing or an Intel HEX dump.
//!
//! Every pass takes an owned or borrowed `Vec<Item>`/`Vec<Token>` and
//! produces a fresh one (spec §5): no pass mutates another's data in
//! place, and all file handles are opened and closed within the single
//! function that uses them.

pub mod compress;
pub mod config;
pub mod encoder;
pub mod error;
pub mod eval;
pub mod expand;
pub mod hex;
pub mod isa;
pub mod layout;
pub mod lexer;
pub mod loader;
pub mod parser;

use std::path::Path;

use indexmap::IndexMap;

use config::AssemblerConfig;
use error::{AsmError, AssembleError};
use loader::FileTable;

/// Everything a caller needs once assembly succeeds: the flat binary image,
/// the final label table (for `--labels`), and the file table (for
/// resolving a `Span` back to a path in a diagnostic or listing).
pub struct AssembleOutput {
    pub bytes: Vec<u8>,
    pub labels: IndexMap<String, i64>,
    pub files: FileTable,
}

/// Runs the full pipeline against `entry`, using `config` for endianness,
/// compression, and the include search path. Returns every collected
/// `AsmError` together rather than stopping at the first one, except for
/// `LoadError`s (I/O failures, unresolved/circular includes), which carry
/// no meaningful position within the assembled program and abort
/// immediately.
pub fn assemble(entry: &Path, config: &AssemblerConfig) -> Result<AssembleOutput, AssembleError> {
    let loaded = loader::load(entry, &config.search_path)?;
    if !loaded.errors.is_empty() {
        return Err(AssembleError::Diagnostics(loaded.errors));
    }

    let parsed = parser::parse(&loaded.tokens, config.default_endian);
    if !parsed.errors.is_empty() {
        return Err(AssembleError::Diagnostics(parsed.errors));
    }

    let expanded = expand::expand(parsed.items).map_err(AssembleError::Diagnostics)?;

    let constants = eval::evaluate_constants(&expanded).map_err(AssembleError::Diagnostics)?;

    let items = if config.compress {
        compress::compress(expanded, &constants).map_err(AssembleError::Diagnostics)?
    } else {
        expanded
    };

    let layout = layout::resolve_layout(&items, &constants).map_err(AssembleError::Diagnostics)?;

    let alignment_errors = layout::check_instruction_alignment(&items, &layout, config.compress);
    if !alignment_errors.is_empty() {
        return Err(AssembleError::Diagnostics(alignment_errors));
    }

    let bytes = encoder::encode(&items, &layout, &constants, config.default_endian)
        .map_err(AssembleError::Diagnostics)?;

    Ok(AssembleOutput {
        bytes,
        labels: layout.labels,
        files: loaded.files,
    })
}

pub use error::AsmError as Error;
