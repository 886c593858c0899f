//! The bracketed duration mini-language shared by holds and slides.
//!
//! A bracket body is split on `#` into 1-4 fields:
//!
//! - `D:C` — ratio against the context BPM
//! - `B#D:C` / `B#Ts` — override BPM, ratio against it or literal seconds
//! - `W#?#D:C` / `W#?#Ts` — explicit wait seconds (effective BPM `60/W`),
//!   duration as literal seconds or a ratio against the *context* BPM
//! - `W#?#B#D:C` — explicit wait, override BPM, ratio against the override
//!
//! Evaluation failures are `None`; the decomposer treats them as "drop this
//! note", never as a scan error.

/// Result of evaluating one bracket body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BracketEval {
    pub duration_seconds: f64,
    /// BPM the wait time should be derived from, when this bracket carries
    /// an override (`B` directly, `60/W` for explicit-wait forms).
    pub bpm_override: Option<f64>,
}

pub(crate) fn evaluate(body: &str, bpm: f64) -> Option<BracketEval> {
    let fields: Vec<&str> = body.split('#').collect();
    match fields.len() {
        1 => {
            let duration_seconds = ratio_seconds(bpm, fields[0].trim())?;
            Some(BracketEval {
                duration_seconds,
                bpm_override: None,
            })
        }
        2 => {
            let first = fields[0].trim();
            let second = fields[1].trim();
            if first.is_empty() {
                // [#5.678]: literal duration, context wait
                let duration_seconds = parse_seconds(second)?;
                return Some(BracketEval {
                    duration_seconds,
                    bpm_override: None,
                });
            }
            let override_bpm = parse_positive(first)?;
            let duration_seconds = match parse_seconds(second) {
                Some(t) => t,
                None => ratio_seconds(override_bpm, second)?,
            };
            Some(BracketEval {
                duration_seconds,
                bpm_override: Some(override_bpm),
            })
        }
        3 => {
            let wait = parse_positive(fields[0].trim())?;
            let last = fields[2].trim();
            let duration_seconds = match parse_seconds(last) {
                Some(t) => t,
                None => ratio_seconds(bpm, last)?,
            };
            Some(BracketEval {
                duration_seconds,
                bpm_override: Some(60.0 / wait),
            })
        }
        4 => {
            let wait = parse_positive(fields[0].trim())?;
            let override_bpm = parse_positive(fields[2].trim())?;
            let duration_seconds = ratio_seconds(override_bpm, fields[3].trim())?;
            Some(BracketEval {
                duration_seconds,
                bpm_override: Some(60.0 / wait),
            })
        }
        _ => None,
    }
}

/// Evaluates every bracket in a slide text, left to right. Durations sum;
/// the first bracket carrying a BPM override decides the wait, otherwise the
/// context BPM does. A slide with no brackets has duration 0.
pub(crate) fn slide_params(text: &str, bpm: f64) -> Option<(f64, f64)> {
    if bpm <= 0.0 {
        return None;
    }
    let mut total = 0.0;
    let mut override_bpm: Option<f64> = None;
    let mut rest = text;
    while let Some(start) = rest.find('[') {
        let end = start + rest[start..].find(']')?;
        let eval = evaluate(&rest[start + 1..end], bpm)?;
        total += eval.duration_seconds;
        if override_bpm.is_none() {
            override_bpm = eval.bpm_override;
        }
        rest = &rest[end + 1..];
    }
    let wait = 60.0 / override_bpm.unwrap_or(bpm);
    Some((wait, total))
}

/// Duration of a hold from its first bracket; a hold with no bracket pair
/// is a valid zero-duration hold.
pub(crate) fn hold_duration(text: &str, bpm: f64) -> Option<f64> {
    let (Some(start), Some(end)) = (text.find('['), text.find(']')) else {
        return Some(0.0);
    };
    if end < start {
        return None;
    }
    evaluate(&text[start + 1..end], bpm).map(|e| e.duration_seconds)
}

/// `D:C` against the given BPM: `(60/bpm) * 4 / D * C`.
fn ratio_seconds(bpm: f64, text: &str) -> Option<f64> {
    if bpm <= 0.0 {
        return None;
    }
    let (divide_str, count_str) = text.split_once(':')?;
    let divide: i64 = divide_str.trim().parse().ok()?;
    let count: i64 = count_str.trim().parse().ok()?;
    if divide <= 0 || count < 0 {
        return None;
    }
    Some((60.0 / bpm) * 4.0 / divide as f64 * count as f64)
}

/// A plain number of seconds, with the conventional trailing `s` allowed.
fn parse_seconds(text: &str) -> Option<f64> {
    let text = text.strip_suffix('s').unwrap_or(text);
    if text.is_empty() {
        return None;
    }
    text.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}

fn parse_positive(text: &str) -> Option<f64> {
    let text = text.strip_suffix('s').unwrap_or(text);
    text.parse::<f64>().ok().filter(|v| v.is_finite() && *v > 0.0)
}
