//! Character-level walk over one difficulty's fumen text.
//!
//! The scanner owns all mutable timing state (BPM, beats per group, speed
//! multipliers, elapsed time, source position) and splits the text into raw
//! comma-delimited groups. It never looks inside a group's note grammar;
//! that is the decomposer's job.

use simai_schema::BeatMarker;

use crate::error::{MarkupError, MarkupErrorKind};

/// Scanner state, reset per difficulty.
#[derive(Debug, Clone)]
pub(crate) struct TimingContext {
    pub bpm: f32,
    pub beats_per_group: f32,
    pub h_speed: f32,
    pub sub_velocity: f32,
    pub time_seconds: f64,
    pub line: u32,
    pub column: u32,
}

impl Default for TimingContext {
    fn default() -> Self {
        Self {
            bpm: 0.0,
            beats_per_group: 4.0,
            h_speed: 1.0,
            sub_velocity: 1.0,
            time_seconds: 0.0,
            line: 1,
            column: 0,
        }
    }
}

/// One comma-delimited group, with the timing state captured at its close.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawNoteGroup {
    pub time_seconds: f64,
    pub raw_text: String,
    pub bpm: f32,
    pub h_speed: f32,
    pub sub_velocity: f32,
    pub line: u32,
    pub column: u32,
}

/// Splits a fumen into raw note groups and per-comma beat markers.
///
/// Directive errors (unmatched delimiters, non-numeric fields, unknown
/// `<...>` tags, a comma before any BPM) abort the whole scan.
pub(crate) fn scan(fumen: &str) -> Result<(Vec<RawNoteGroup>, Vec<BeatMarker>), MarkupError> {
    let chars: Vec<char> = fumen.chars().collect();
    let mut ctx = TimingContext::default();
    let mut groups = Vec::new();
    let mut markers = Vec::new();

    let mut buffer = String::new();
    let mut have_note = false;
    let mut sv_pending = false;

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        i += 1;

        if c == '\n' {
            ctx.line += 1;
            ctx.column = 0;
            continue;
        }
        ctx.column += 1;

        match c {
            '|' => {
                if chars.get(i) != Some(&'|') {
                    return Err(MarkupError::new(
                        MarkupErrorKind::UnexpectedCharacter,
                        ctx.line,
                        ctx.column,
                        "|",
                        "stray \"|\" (comments start with \"||\")",
                    ));
                }
                // comment runs to end of line
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                    ctx.column += 1;
                }
            }
            '(' => {
                buffer.clear();
                have_note = false;
                let (open_line, open_column) = (ctx.line, ctx.column);
                let body = scan_delimited(&chars, &mut i, &mut ctx, ')').ok_or_else(|| {
                    MarkupError::new(
                        MarkupErrorKind::UnmatchedDelimiter,
                        open_line,
                        open_column,
                        "(",
                        "unmatched \"(\"",
                    )
                })?;
                let body = body.trim();
                ctx.bpm = body.parse().map_err(|_| {
                    MarkupError::new(
                        MarkupErrorKind::InvalidNumber,
                        open_line,
                        open_column + 1,
                        body,
                        "BPM is not a number",
                    )
                })?;
            }
            '{' => {
                buffer.clear();
                have_note = false;
                let (open_line, open_column) = (ctx.line, ctx.column);
                let body = scan_delimited(&chars, &mut i, &mut ctx, '}').ok_or_else(|| {
                    MarkupError::new(
                        MarkupErrorKind::UnmatchedDelimiter,
                        open_line,
                        open_column,
                        "{",
                        "unmatched \"{\"",
                    )
                })?;
                let body = body.trim();
                if let Some(interval) = body.strip_prefix('#') {
                    let interval: f32 = interval.trim().parse().map_err(|_| {
                        MarkupError::new(
                            MarkupErrorKind::InvalidNumber,
                            open_line,
                            open_column + 1,
                            body,
                            "beat interval is not a number",
                        )
                    })?;
                    ctx.beats_per_group = 240.0 / (ctx.bpm * interval);
                } else {
                    ctx.beats_per_group = body.parse().map_err(|_| {
                        MarkupError::new(
                            MarkupErrorKind::InvalidNumber,
                            open_line,
                            open_column + 1,
                            body,
                            "beat value is not a number",
                        )
                    })?;
                }
            }
            // a "<" after note text has started is the slide glyph, not a
            // directive opener
            '<' if !have_note => {
                let (open_line, open_column) = (ctx.line, ctx.column);
                let body = scan_delimited(&chars, &mut i, &mut ctx, '>').ok_or_else(|| {
                    MarkupError::new(
                        MarkupErrorKind::UnmatchedDelimiter,
                        open_line,
                        open_column,
                        "<",
                        "unmatched \"<\"",
                    )
                })?;
                let body = body.trim();
                let Some((tag, value)) = body.split_once('*') else {
                    return Err(MarkupError::new(
                        MarkupErrorKind::UnknownTag,
                        open_line,
                        open_column + 1,
                        body,
                        "speed directive is missing \"*\"",
                    ));
                };
                let value: f32 = value.trim().parse().map_err(|_| {
                    MarkupError::new(
                        MarkupErrorKind::InvalidNumber,
                        open_line,
                        open_column + 1,
                        body,
                        "speed value is not a number",
                    )
                })?;
                match tag.trim() {
                    "HS" => ctx.h_speed = value,
                    "SV" => {
                        ctx.sub_velocity = value;
                        sv_pending = true;
                    }
                    other => {
                        return Err(MarkupError::new(
                            MarkupErrorKind::UnknownTag,
                            open_line,
                            open_column + 1,
                            other,
                            format!("unknown speed tag \"{other}\""),
                        ));
                    }
                }
            }
            ',' => {
                if ctx.bpm <= 0.0 {
                    return Err(MarkupError::new(
                        MarkupErrorKind::MissingBpm,
                        ctx.line,
                        ctx.column,
                        ",",
                        "group boundary before any BPM directive",
                    ));
                }
                markers.push(BeatMarker {
                    time_seconds: ctx.time_seconds,
                    line: ctx.line,
                    column: ctx.column,
                    bpm: ctx.bpm,
                });
                if have_note || sv_pending {
                    groups.push(RawNoteGroup {
                        time_seconds: ctx.time_seconds,
                        raw_text: buffer.clone(),
                        bpm: ctx.bpm,
                        h_speed: ctx.h_speed,
                        sub_velocity: ctx.sub_velocity,
                        line: ctx.line,
                        column: ctx.column,
                    });
                }
                ctx.time_seconds += (60.0 / ctx.bpm as f64) * 4.0 / ctx.beats_per_group as f64;
                buffer.clear();
                have_note = false;
                sv_pending = false;
            }
            _ => {
                if c.is_whitespace() {
                    continue;
                }
                if have_note {
                    buffer.push(c);
                } else if c.is_ascii_digit() || ('A'..='E').contains(&c) {
                    have_note = true;
                    buffer.push(c);
                }
                // anything else before the first note character is ignored
            }
        }
    }

    Ok((groups, markers))
}

/// Collects characters up to `close`, keeping the position counters honest
/// across newlines. `None` means end of input was reached first.
fn scan_delimited(
    chars: &[char],
    i: &mut usize,
    ctx: &mut TimingContext,
    close: char,
) -> Option<String> {
    let mut body = String::new();
    while *i < chars.len() {
        let c = chars[*i];
        *i += 1;
        if c == '\n' {
            ctx.line += 1;
            ctx.column = 0;
            continue;
        }
        ctx.column += 1;
        if c == close {
            return Some(body);
        }
        body.push(c);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_quarter_beats_at_120() {
        let (groups, markers) = scan("(120){4}1,2,3,").unwrap();
        assert_eq!(groups.len(), 3);
        assert_eq!(markers.len(), 3);
        assert_eq!(markers[0].time_seconds, 0.0);
        assert_eq!(markers[1].time_seconds, 0.5);
        assert_eq!(markers[2].time_seconds, 1.0);
        assert_eq!(groups[0].raw_text, "1");
        assert_eq!(groups[2].raw_text, "3");
    }

    #[test]
    fn empty_group_emits_marker_only() {
        let (groups, markers) = scan("(120){4}1,,2,").unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(markers.len(), 3);
        assert_eq!(groups[1].time_seconds, 1.0);
    }

    #[test]
    fn beat_interval_form() {
        // {#2} at 120 BPM: beats = 240 / (120 * 2) = 1, so one full
        // 4-beat measure (2 seconds) per comma
        let (_, markers) = scan("(120){#2}1,2,").unwrap();
        assert_eq!(markers[1].time_seconds - markers[0].time_seconds, 2.0);
    }

    #[test]
    fn bpm_change_mid_chart() {
        let (_, markers) = scan("(120){4}1,(60)2,3,").unwrap();
        assert_eq!(markers[1].time_seconds, 0.5);
        assert_eq!(markers[2].time_seconds, 1.5);
        assert_eq!(markers[1].bpm, 60.0);
    }

    #[test]
    fn comment_skipped_to_end_of_line() {
        let (groups, markers) = scan("(120){4}|| whole line, with a comma\n1,").unwrap();
        assert_eq!(markers.len(), 1);
        assert_eq!(groups[0].raw_text, "1");
        assert_eq!(groups[0].line, 2);
    }

    #[test]
    fn stray_pipe_is_an_error() {
        let err = scan("(120){4}|1,").unwrap_err();
        assert_eq!(err.kind, MarkupErrorKind::UnexpectedCharacter);
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 9);
    }

    #[test]
    fn malformed_bpm_reports_position_and_text() {
        let err = scan("(abc){4}1,").unwrap_err();
        assert_eq!(err.kind, MarkupErrorKind::InvalidNumber);
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 2);
        assert_eq!(err.snippet, "abc");
    }

    #[test]
    fn unmatched_paren_reports_opener() {
        let err = scan("(120{4}1,").unwrap_err();
        assert_eq!(err.kind, MarkupErrorKind::UnmatchedDelimiter);
        assert_eq!(err.column, 1);
    }

    #[test]
    fn comma_before_bpm_is_an_error() {
        let err = scan("1,").unwrap_err();
        assert_eq!(err.kind, MarkupErrorKind::MissingBpm);
    }

    #[test]
    fn speed_directives_take_effect_at_group_close() {
        let (groups, _) = scan("(120){4}<HS*1.5>1,<SV*0.5>2,").unwrap();
        assert_eq!(groups[0].h_speed, 1.5);
        assert_eq!(groups[0].sub_velocity, 1.0);
        assert_eq!(groups[1].sub_velocity, 0.5);
    }

    #[test]
    fn sv_directive_alone_still_emits_a_group() {
        let (groups, markers) = scan("(120){4}<SV*2>,1,").unwrap();
        assert_eq!(markers.len(), 2);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].raw_text, "");
        assert_eq!(groups[0].sub_velocity, 2.0);
    }

    #[test]
    fn unknown_speed_tag_is_an_error() {
        let err = scan("(120){4}<XX*2>1,").unwrap_err();
        assert_eq!(err.kind, MarkupErrorKind::UnknownTag);
    }

    #[test]
    fn angle_bracket_after_note_start_is_a_slide_glyph() {
        let (groups, _) = scan("(120){4}1<2[4:1],").unwrap();
        assert_eq!(groups[0].raw_text, "1<2[4:1]");
    }

    #[test]
    fn directive_mid_accumulation_discards_buffered_text() {
        // the "1" buffered before the BPM change is dropped
        let (groups, _) = scan("(120){4}1(240)2,").unwrap();
        assert_eq!(groups[0].raw_text, "2");
        assert_eq!(groups[0].bpm, 240.0);
    }

    #[test]
    fn whitespace_and_newlines_stripped_from_groups() {
        let (groups, _) = scan("(120){4}\n  1 / 2 ,").unwrap();
        assert_eq!(groups[0].raw_text, "1/2");
        assert_eq!(groups[0].line, 2);
    }

    #[test]
    fn backtick_groups_stay_whole() {
        let (groups, _) = scan("(120){4}1`2`3,").unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].raw_text, "1`2`3");
    }
}
