//! # Source Loader (spec §4.1)
//!
//! Turns an entry file plus a search path into one flat, origin-annotated
//! token stream the parser can consume without ever seeing an unresolved
//! `include`/`include_bytes` directive. `include <file>` is spliced in
//! place, recursively; `include_bytes <file>` is resolved to a single
//! [`crate::lexer::token::TokenKind::IncludeBytesLiteral`] token carrying
//! the file's raw bytes, which the parser turns into an `IncludeBytes` item.
//!
//! Resolution order for both directives: relative to the including file's
//! own directory first, then the search path in order; first hit wins.
//! Circular includes are caught by tracking the set of canonicalized paths
//! currently being loaded.


use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AsmError, FileId, LoadError};
use crate::lexer::{self, token::TokenKind};

/// Maps the `FileId`s embedded in every `Span` back to a source path, so
/// diagnostics and `-l`/labels output can name the file a span came from.
#[derive(Debug, Default)]
pub struct FileTable {
    paths: Vec<PathBuf>,
}

impl FileTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn add(&mut self, path: PathBuf) -> FileId {
        self.paths.push(path);
        (self.paths.len() - 1) as FileId
    }

    pub fn path(&self, id: FileId) -> &Path {
        &self.paths[id as usize]
    }
}

pub struct LoadResult {
    pub tokens: Vec<lexer::token::Token>,
    pub files: FileTable,
    pub errors: Vec<AsmError>,
}

/// Loads `entry` and every file it transitively includes into one token
/// stream. Lex errors inside any file are collected rather than aborting
/// immediately, matching every other pass's "report everything" policy;
/// only I/O failures and include-resolution failures (not found, circular)
/// stop loading outright, since they carry no meaningful position within
/// the program being assembled.
pub fn load(entry: &Path, search_path: &[PathBuf]) -> Result<LoadResult, LoadError> {
    let mut files = FileTable::new();
    let mut in_progress = HashSet::new();
    let mut errors = Vec::new();
    let tokens = load_file(entry, search_path, &mut files, &mut in_progress, &mut errors)?;
    Ok(LoadResult { tokens, files, errors })
}

fn canonical_or_absolute(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn load_file(
    path: &Path,
    search_path: &[PathBuf],
    files: &mut FileTable,
    in_progress: &mut HashSet<PathBuf>,
    errors: &mut Vec<AsmError>,
) -> Result<Vec<lexer::token::Token>, LoadError> {
    let canonical = canonical_or_absolute(path);
    if in_progress.contains(&canonical) {
        return Err(LoadError::CircularInclude(path.display().to_string()));
    }

    let text = fs::read_to_string(path).map_err(|e| LoadError::Io(path.to_path_buf(), e))?;
    let file_id = files.add(path.to_path_buf());
    let lexed = lexer::tokenize(&text, file_id);
    errors.extend(lexed.errors);

    in_progress.insert(canonical.clone());
    let containing_dir = path.parent().map(Path::to_path_buf);
    let result = resolve_directives(lexed.tokens, containing_dir.as_deref(), search_path, files, in_progress, errors);
    in_progress.remove(&canonical);
    result
}

/// Walks one file's already-lexed tokens, splicing `include` targets in
/// place (recursively) and rewriting `include_bytes` targets into a single
/// `IncludeBytesLiteral` token. Every other token passes through untouched.
fn resolve_directives(
    tokens: Vec<lexer::token::Token>,
    containing_dir: Option<&Path>,
    search_path: &[PathBuf],
    files: &mut FileTable,
    in_progress: &mut HashSet<PathBuf>,
    errors: &mut Vec<AsmError>,
) -> Result<Vec<lexer::token::Token>, LoadError> {
    let mut out = Vec::with_capacity(tokens.len());

    for token in tokens {
        match token.kind {
            TokenKind::IncludeRest(ref raw_path) => {
                let target = resolve_include_path(raw_path, containing_dir, search_path)?;
                let spliced = load_file(&target, search_path, files, in_progress, errors)?;
                // Drop the included file's own Eof: it only terminates its
                // own token vector, not the combined stream.
                out.extend(spliced.into_iter().filter(|t| !matches!(t.kind, TokenKind::Eof)));
            }
            TokenKind::IncludeBytesRest(ref raw_path) => {
                let target = resolve_include_path(raw_path, containing_dir, search_path)?;
                let bytes = fs::read(&target).map_err(|e| LoadError::Io(target.clone(), e))?;
                out.push(lexer::token::Token {
                    kind: TokenKind::IncludeBytesLiteral(bytes),
                    lexeme: token.lexeme,
                    span: token.span,
                });
            }
            _ => out.push(token),
        }
    }

    Ok(out)
}

/// Resolves `raw_path` relative to the including file's directory first,
/// then each directory of `search_path` in order. First hit wins.
fn resolve_include_path(
    raw_path: &str,
    containing_dir: Option<&Path>,
    search_path: &[PathBuf],
) -> Result<PathBuf, LoadError> {
    let mut tried = Vec::new();

    if let Some(dir) = containing_dir {
        let candidate = dir.join(raw_path);
        if candidate.is_file() {
            return Ok(candidate);
        }
        tried.push(candidate);
    }

    for dir in search_path {
        let candidate = dir.join(raw_path);
        if candidate.is_file() {
            return Ok(candidate);
        }
        tried.push(candidate);
    }

    Err(LoadError::IncludeNotFound(raw_path.to_string(), tried))
}
