//! Global, immutable assembler configuration.
//!
//! Per design note §9 ("Global assembler configuration"), endianness
//! default, the compression flag, and the include search path are bundled
//! into a single value threaded through every pass by reference rather than
//! read from process-wide mutable state.

use std::path::PathBuf;

use crate::parser::ast::Endian;

/// Relative path (from the binary) to the bundled chip/peripheral
/// definitions directory added to the search path by `--include-definitions`.
/// The directory's contents are an external collaborator (spec §1); only
/// the path convention lives here.
pub const BUNDLED_DEFINITIONS_DIR: &str = "definitions";

#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// Default endianness for `db`/`dh`/`dw`/`dd` shorthand and for
    /// multi-byte data directives (`bytes`/`shorts`/...).
    pub default_endian: Endian,
    /// Whether the optional C-extension compressor pass runs after layout
    /// converges.
    pub compress: bool,
    /// Directories searched (in order) for `include`/`include_bytes`
    /// targets, after the including file's own directory.
    pub search_path: Vec<PathBuf>,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            default_endian: Endian::Little,
            compress: false,
            search_path: Vec::new(),
        }
    }
}

impl AssemblerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    pub fn with_search_path(mut self, dirs: Vec<PathBuf>) -> Self {
        self.search_path = dirs;
        self
    }
}
