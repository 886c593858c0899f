//! Line-prefix reader for the `&key=value` metadata block of a
//! `maidata.txt`, including per-difficulty fumen body accumulation.

use simai_schema::{SimaiCommand, SimaiMetadata, DIFFICULTY_COUNT};

use crate::error::{MarkupError, MarkupErrorKind};

/// Reads every metadata field and the raw fumen bodies from full file
/// content. First occurrence wins for scalar fields; an `&` line without
/// `=` is malformed.
pub fn parse_metadata(content: &str) -> Result<SimaiMetadata, MarkupError> {
    let mut title: Option<String> = None;
    let mut artist: Option<String> = None;
    let mut offset: Option<f32> = None;
    let mut global_designer: Option<String> = None;
    let mut designers: [Option<String>; DIFFICULTY_COUNT] = Default::default();
    let mut levels: [Option<String>; DIFFICULTY_COUNT] = Default::default();
    let mut fumens: [Option<String>; DIFFICULTY_COUNT] = Default::default();
    let mut commands = Vec::new();

    // difficulty slot currently accumulating fumen lines
    let mut active: Option<usize> = None;

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx as u32 + 1;
        let trimmed = line.trim();

        let Some(rest) = trimmed.strip_prefix('&') else {
            if let Some(slot) = active {
                if trimmed == "E" {
                    active = None;
                } else if let Some(body) = &mut fumens[slot] {
                    body.push('\n');
                    body.push_str(line);
                }
            }
            continue;
        };
        active = None;

        let Some((prefix, value)) = rest.split_once('=') else {
            return Err(MarkupError::new(
                MarkupErrorKind::InvalidCommand,
                line_no,
                1,
                trimmed,
                "metadata line is missing \"=\"",
            ));
        };
        let prefix = prefix.trim();
        let value = value.trim();

        match prefix {
            "title" => set_first(&mut title, value),
            "artist" => set_first(&mut artist, value),
            "first" => {
                if offset.is_none() {
                    offset = Some(value.parse().unwrap_or(0.0));
                }
            }
            "des" => set_first(&mut global_designer, value),
            _ => {
                if let Some(slot) = slot_suffix(prefix, "des_") {
                    set_first(&mut designers[slot], value);
                } else if let Some(slot) = slot_suffix(prefix, "lv_") {
                    set_first(&mut levels[slot], value);
                } else if let Some(slot) = slot_suffix(prefix, "inote_") {
                    if fumens[slot].is_none() {
                        fumens[slot] = Some(value.to_string());
                        active = Some(slot);
                    }
                } else {
                    commands.push(SimaiCommand {
                        prefix: prefix.to_string(),
                        value: value.to_string(),
                    });
                }
            }
        }
    }

    let global = global_designer.unwrap_or_default();
    Ok(SimaiMetadata {
        title: title.unwrap_or_default(),
        artist: artist.unwrap_or_default(),
        offset: offset.unwrap_or(0.0),
        designers: designers.map(|d| d.unwrap_or_else(|| global.clone())),
        levels: levels.map(Option::unwrap_or_default),
        fumens: fumens.map(Option::unwrap_or_default),
        commands,
    })
}

fn set_first(slot: &mut Option<String>, value: &str) {
    if slot.is_none() {
        *slot = Some(value.to_string());
    }
}

/// `des_3` with prefix `des_` resolves to slot index 2.
fn slot_suffix(prefix: &str, stem: &str) -> Option<usize> {
    let number: usize = prefix.strip_prefix(stem)?.parse().ok()?;
    (1..=DIFFICULTY_COUNT).contains(&number).then(|| number - 1)
}
