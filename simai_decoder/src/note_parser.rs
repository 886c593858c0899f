//! Turns one raw comma-delimited group into typed note records.
//!
//! Unlike the scanner, nothing here is fatal: a sub-text that cannot be
//! classified is logged and dropped so one bad note never invalidates a
//! difficulty.

use simai_schema::{Note, NoteGroup, NoteKind, TouchArea};
use tracing::warn;

use crate::duration;
use crate::scanner::RawNoteGroup;

const SLIDE_GLYPHS: &[char] = &['-', '^', 'v', '<', '>', 'V', 'p', 'q', 's', 'z', 'w'];

/// Spacing between fake-each sub-segments, a 1/128 note at the group's BPM.
fn fake_each_step(bpm: f64) -> f64 {
    1.875 / bpm
}

/// Decomposes a raw group into one or more timed groups.
///
/// The first returned group sits at the nominal comma instant; fake-each
/// backticks push later sub-segments into extra groups offset by successive
/// 1/128-note steps.
pub(crate) fn decompose(group: &RawNoteGroup) -> Vec<NoteGroup> {
    let bpm = group.bpm as f64;
    let mut clusters: Vec<Vec<Note>> = vec![Vec::new()];

    let raw = group.raw_text.as_str();
    if is_two_digit_shorthand(raw) {
        // "37" is two simultaneous taps written without a slash
        for digit in raw.chars() {
            push_classified(&mut clusters[0], &digit.to_string(), bpm, group);
        }
    } else if !raw.is_empty() {
        for segment in raw.split('/') {
            // doubled backticks yield empty sub-segments; they must not
            // advance the offset step
            let subs = segment.split('`').filter(|s| !s.is_empty());
            for (step, sub) in subs.enumerate() {
                if clusters.len() <= step {
                    clusters.resize_with(step + 1, Vec::new);
                }
                if sub.contains('*') {
                    let chained = same_origin_chain(sub, bpm, group);
                    clusters[step].extend(chained);
                } else {
                    let cluster = &mut clusters[step];
                    push_classified(cluster, sub, bpm, group);
                }
            }
        }
    }

    clusters
        .into_iter()
        .enumerate()
        .filter(|(step, notes)| *step == 0 || !notes.is_empty())
        .map(|(step, notes)| NoteGroup {
            time_seconds: group.time_seconds + step as f64 * fake_each_step(bpm),
            raw_text: group.raw_text.clone(),
            bpm: group.bpm,
            h_speed: group.h_speed,
            sub_velocity: group.sub_velocity,
            line: group.line,
            column: group.column,
            notes,
        })
        .collect()
}

fn is_two_digit_shorthand(raw: &str) -> bool {
    raw.len() == 2 && raw.chars().all(|c| c.is_ascii_digit())
}

fn push_classified(cluster: &mut Vec<Note>, sub: &str, bpm: f64, group: &RawNoteGroup) {
    match classify_single(sub, bpm) {
        Some(note) => cluster.push(note),
        None => warn!(
            line = group.line,
            column = group.column,
            text = sub,
            "skipping unclassifiable note"
        ),
    }
}

/// `head*path*path`: several slide paths sharing one start position. The
/// first piece is a normal note; each tail piece gets the shared start digit
/// prepended and becomes a headless slide.
fn same_origin_chain(sub: &str, bpm: f64, group: &RawNoteGroup) -> Vec<Note> {
    let mut pieces = sub.split('*');
    let head_text = pieces.next().unwrap_or("");
    let Some(head) = classify_single(head_text, bpm) else {
        warn!(
            line = group.line,
            column = group.column,
            text = sub,
            "skipping slide chain with unclassifiable head"
        );
        return Vec::new();
    };
    let shared_position = head.start_position;

    let mut notes = vec![head];
    for piece in pieces {
        let tail_text = format!("{shared_position}{piece}");
        let Some(mut tail) = classify_single(&tail_text, bpm) else {
            warn!(
                line = group.line,
                column = group.column,
                text = piece,
                "skipping unclassifiable slide chain tail"
            );
            continue;
        };
        tail.kind = match tail.kind {
            NoteKind::Slide {
                start_delay_seconds,
                duration_seconds,
                is_slide_break,
                is_mine_on_body,
                ..
            } => NoteKind::Slide {
                start_delay_seconds,
                duration_seconds,
                no_head: true,
                is_slide_break,
                is_mine_on_body,
            },
            // a tail with no slide glyph still rides the shared head
            _ => NoteKind::Slide {
                start_delay_seconds: 60.0 / bpm,
                duration_seconds: 0.0,
                no_head: true,
                is_slide_break: false,
                is_mine_on_body: false,
            },
        };
        notes.push(tail);
    }
    notes
}

/// Classifies one final note sub-text, or `None` when it cannot be a note.
pub(crate) fn classify_single(text: &str, bpm: f64) -> Option<Note> {
    let mut chars = text.chars();
    let first = chars.next()?;

    let (start_position, touch_area) = if let Some(area) = TouchArea::from_char(first) {
        if area == TouchArea::C {
            // center sensor carries no key digit
            (8, Some(area))
        } else {
            let digit = chars.next()?;
            (key_position(digit)?, Some(area))
        }
    } else {
        (key_position(first)?, None)
    };

    let mut residue = text.to_string();
    let is_hanabi = residue.contains('f');
    let has_hold = residue.contains('h');

    let mut is_break = false;
    let mut is_mine = false;

    let kind = if let Some(area) = touch_area {
        if has_hold {
            NoteKind::TouchHold {
                area,
                duration_seconds: duration::hold_duration(&residue, bpm)?,
            }
        } else {
            NoteKind::Touch { area }
        }
    } else if residue.contains(SLIDE_GLYPHS) {
        let (wait, duration_seconds) = duration::slide_params(&residue, bpm)?;
        let force_immediate = residue.contains('!');
        let delayed_headless = residue.contains('?');
        residue.retain(|c| c != '!' && c != '?');

        let (break_on_head, is_slide_break) = head_or_body(&residue, 'b');
        // b, x and $ are already gone by the time the mine placement is
        // decided, so a trailing one cannot mask a body mine
        let mut mine_text = residue.clone();
        mine_text.retain(|c| c != 'b' && c != 'x' && c != '$');
        let (mine_on_head, is_mine_on_body) = head_or_body(&mine_text, 'm');
        is_break = break_on_head;
        is_mine = mine_on_head;

        NoteKind::Slide {
            start_delay_seconds: if force_immediate { 0.0 } else { wait },
            duration_seconds,
            no_head: force_immediate || delayed_headless,
            is_slide_break,
            is_mine_on_body,
        }
    } else if has_hold {
        NoteKind::Hold {
            duration_seconds: duration::hold_duration(&residue, bpm)?,
        }
    } else {
        NoteKind::Tap
    };

    if !kind.is_slide() {
        is_break = residue.contains('b');
        is_mine = residue.contains('m');
    }
    residue.retain(|c| c != 'b');

    let is_ex = residue.contains('x');
    residue.retain(|c| c != 'x');

    let star_count = residue.chars().filter(|c| *c == '$').count();
    residue.retain(|c| c != '$');

    residue.retain(|c| c != 'm');

    let uses_sub_velocity = !residue.contains('c');
    residue.retain(|c| c != 'c');

    Some(Note {
        start_position,
        kind,
        is_break,
        is_ex,
        is_hanabi,
        is_force_star: star_count >= 1,
        is_fake_rotate: star_count >= 2,
        is_mine,
        uses_sub_velocity,
        raw_modifiers: residue,
    })
}

fn key_position(c: char) -> Option<u8> {
    match c {
        '1'..='8' => Some(c as u8 - b'0'),
        _ => None,
    }
}

/// Decides whether each `b`/`m` occurrence marks the slide body or the head:
/// body iff it is the last character or the next character is `[`. Kept as-is
/// for compatibility with charts in the wild.
fn head_or_body(text: &str, flag: char) -> (bool, bool) {
    let chars: Vec<char> = text.chars().collect();
    let mut on_head = false;
    let mut on_body = false;
    for (idx, &c) in chars.iter().enumerate() {
        if c != flag {
            continue;
        }
        if idx + 1 == chars.len() || chars[idx + 1] == '[' {
            on_body = true;
        } else {
            on_head = true;
        }
    }
    (on_head, on_body)
}
