//! Rebuilds `maidata.txt` content from a decoded file.
//!
//! Fumen bodies are written back from the raw text kept on each chart, not
//! re-flattened from parsed notes, so the metadata round-trip is lossless
//! while note-level text is only as exact as the original input.

use std::fmt::Write;

use simai_schema::SimaiFile;

pub fn encode(file: &SimaiFile) -> String {
    let mut out = String::new();
    // infallible writes to a String
    let _ = writeln!(out, "&title={}", file.title);
    let _ = writeln!(out, "&artist={}", file.artist);
    let _ = writeln!(out, "&first={}", file.offset);

    for (slot, chart) in file.charts.iter().enumerate() {
        if !chart.level.is_empty() {
            let _ = writeln!(out, "&lv_{}={}", slot + 1, chart.level);
        }
        if !chart.designer.is_empty() {
            let _ = writeln!(out, "&des_{}={}", slot + 1, chart.designer);
        }
    }

    for command in &file.commands {
        let _ = writeln!(out, "&{}={}", command.prefix, command.value);
    }

    for (slot, chart) in file.charts.iter().enumerate() {
        if chart.fumen.is_empty() {
            continue;
        }
        let _ = writeln!(out, "&inote_{}={}", slot + 1, chart.fumen);
        out.push_str("E\n");
    }

    out
}
