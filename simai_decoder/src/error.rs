use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupErrorKind {
    /// A character that cannot start a directive, note, or separator.
    UnexpectedCharacter,
    /// `(`, `{` or `<` with no matching closer before end of input.
    UnmatchedDelimiter,
    /// A directive field that must be numeric was not.
    InvalidNumber,
    /// `<...>` whose tag is neither `HS` nor `SV`.
    UnknownTag,
    /// A comma was reached with no positive BPM in effect.
    MissingBpm,
    /// An `&` metadata line without a `=`.
    InvalidCommand,
}

/// Malformed top-level chart syntax. Always fatal to the enclosing
/// difficulty's scan; carries the position and offending text so the error
/// can be pointed at in an editor.
#[derive(Debug, Error, Clone)]
#[error("{reason} at line {line}, column {column} (near \"{snippet}\")")]
pub struct MarkupError {
    pub kind: MarkupErrorKind,
    pub line: u32,
    pub column: u32,
    pub snippet: String,
    pub reason: String,
}

impl MarkupError {
    pub(crate) fn new(
        kind: MarkupErrorKind,
        line: u32,
        column: u32,
        snippet: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            line,
            column,
            snippet: snippet.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid metadata: {0}")]
    Metadata(MarkupError),

    #[error("chart for difficulty {} could not be decoded: {error}", .difficulty + 1)]
    Chart {
        /// Zero-based difficulty slot index; displayed 1-based to match the
        /// `&inote_N` numbering.
        difficulty: usize,
        error: MarkupError,
    },
}
