use thiserror::Error;

/// Top-level error type for the XRF compiler pipeline.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{} parse error(s)", .0.len())]
    Parse(Vec<ParseError>),

    #[error("codegen error: {0}")]
    Codegen(#[from] CodegenError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<Vec<ParseError>> for Error {
    fn from(errors: Vec<ParseError>) -> Self {
        Error::Parse(errors)
    }
}

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

/// What went wrong while scanning a chunk.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("invalid command character '{0}'")]
    InvalidCharacter(char),

    #[error("chunk doesn't have enough commands")]
    NotEnoughCommands,

    #[error("chunk has too many commands")]
    TooManyCommands,
}

/// A parse diagnostic at a 1-based source position.
///
/// Invalid characters point at the offending byte; length errors point at
/// the first byte of the chunk.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Error on line {line}, column {col}: {kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: u32,
    pub col: u32,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, line: u32, col: u32) -> Self {
        Self { kind, line, col }
    }
}

// ---------------------------------------------------------------------------
// Codegen errors
// ---------------------------------------------------------------------------

/// Lowering is total over valid chunk lists, so the only codegen failure
/// mode is the text emitter itself.
#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("unsupported construct in emitter: {detail}")]
    Unsupported { detail: String },
}

impl From<std::fmt::Error> for CodegenError {
    fn from(e: std::fmt::Error) -> Self {
        CodegenError::Unsupported {
            detail: e.to_string(),
        }
    }
}
