//! Decoder for the simai rhythm-game chart format.
//!
//! A `maidata.txt` packages song metadata and up to seven per-difficulty
//! fumens. Decoding runs in three stages: the metadata reader extracts the
//! `&key=value` block and raw fumen bodies, the scanner splits each fumen
//! into timed beat groups while tracking BPM and speed directives, and the
//! decomposer classifies each group's note grammar into typed records.
//!
//! Malformed directives are fatal to their difficulty; how that propagates
//! is the caller's choice via [`ErrorPolicy`]. Individual notes that fail to
//! classify are logged and dropped, never fatal.

use std::path::Path;

use simai_schema::{Chart, SimaiFile, SimaiMetadata, DIFFICULTY_COUNT};
use tracing::warn;

mod duration;
mod encode;
mod error;
mod metadata;
mod note_parser;
mod scanner;

pub use encode::encode;
pub use error::{DecodeError, MarkupError, MarkupErrorKind};
pub use metadata::parse_metadata;

/// What to do when one difficulty's fumen fails to scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Fail the whole decode on the first bad difficulty.
    #[default]
    Hard,
    /// Substitute an empty chart for the bad slot and keep going; the
    /// underlying error is recorded in [`DecodeOutput::failures`].
    Soft,
}

#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    pub policy: ErrorPolicy,
}

/// A difficulty that was replaced by an empty chart under [`ErrorPolicy::Soft`].
#[derive(Debug)]
pub struct ChartFailure {
    /// Zero-based difficulty slot index.
    pub difficulty: usize,
    pub error: MarkupError,
}

#[derive(Debug)]
pub struct DecodeOutput {
    pub file: SimaiFile,
    pub failures: Vec<ChartFailure>,
}

/// Decodes one fumen into a chart. The fumen must carry its own first BPM
/// directive before any group boundary.
pub fn parse_chart(fumen: &str, level: &str, designer: &str) -> Result<Chart, MarkupError> {
    let (raw_groups, beat_markers) = scanner::scan(fumen)?;
    let mut note_groups = Vec::new();
    for group in &raw_groups {
        note_groups.extend(note_parser::decompose(group));
    }
    Ok(Chart {
        level: level.to_string(),
        designer: designer.to_string(),
        fumen: fumen.to_string(),
        note_groups,
        beat_markers,
    })
}

/// Decodes full `maidata.txt` content under the default hard error policy.
pub fn decode_str(content: &str) -> Result<SimaiFile, DecodeError> {
    decode_str_with_options(content, &DecodeOptions::default()).map(|output| output.file)
}

/// Decodes full `maidata.txt` content. The seven difficulties are decoded
/// on scoped worker threads; each fumen's scan is independent of the others.
pub fn decode_str_with_options(
    content: &str,
    options: &DecodeOptions,
) -> Result<DecodeOutput, DecodeError> {
    let meta = parse_metadata(content).map_err(DecodeError::Metadata)?;
    let results = decode_difficulties(&meta);

    let mut charts: [Chart; DIFFICULTY_COUNT] = Default::default();
    let mut failures = Vec::new();
    for (difficulty, result) in results.into_iter().enumerate() {
        match result {
            Ok(chart) => charts[difficulty] = chart,
            Err(error) => match options.policy {
                ErrorPolicy::Hard => return Err(DecodeError::Chart { difficulty, error }),
                ErrorPolicy::Soft => {
                    warn!(difficulty, %error, "substituting empty chart");
                    charts[difficulty] = Chart::empty(
                        meta.levels[difficulty].as_str(),
                        meta.designers[difficulty].as_str(),
                        meta.fumens[difficulty].as_str(),
                    );
                    failures.push(ChartFailure { difficulty, error });
                }
            },
        }
    }

    Ok(DecodeOutput {
        file: SimaiFile {
            title: meta.title,
            artist: meta.artist,
            offset: meta.offset,
            charts,
            commands: meta.commands,
        },
        failures,
    })
}

/// Reads and decodes a `maidata.txt` from disk.
pub fn decode_file(path: impl AsRef<Path>) -> Result<SimaiFile, DecodeError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| DecodeError::Io {
        path: path.display().to_string(),
        source,
    })?;
    decode_str(&content)
}

pub fn decode_file_with_options(
    path: impl AsRef<Path>,
    options: &DecodeOptions,
) -> Result<DecodeOutput, DecodeError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| DecodeError::Io {
        path: path.display().to_string(),
        source,
    })?;
    decode_str_with_options(&content, options)
}

fn decode_difficulties(meta: &SimaiMetadata) -> Vec<Result<Chart, MarkupError>> {
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..DIFFICULTY_COUNT)
            .map(|slot| {
                let fumen = meta.fumens[slot].as_str();
                let level = meta.levels[slot].as_str();
                let designer = meta.designers[slot].as_str();
                scope.spawn(move || parse_chart(fumen, level, designer))
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(result) => result,
                Err(payload) => std::panic::resume_unwind(payload),
            })
            .collect()
    })
}

#[cfg(test)]
mod tests;
