use simai_schema::NoteKind;

use super::*;

const FIXTURE: &str = r#"&title=Test Song
&artist=Test Band
&first=0.5
&des=someone
&lv_5=12+
&wholebpm=120
&inote_5=(120){4}
1,2,3,
1h[4:1],
1-3[8:3]/5,
E
"#;

#[test]
fn quarter_beats_resolve_to_half_seconds() {
    let chart = parse_chart("(120){4}1,2,3,", "", "").unwrap();
    assert_eq!(chart.beat_markers.len(), 3);
    assert_eq!(chart.beat_markers[0].time_seconds, 0.0);
    assert_eq!(chart.beat_markers[1].time_seconds, 0.5);
    assert_eq!(chart.beat_markers[2].time_seconds, 1.0);

    assert_eq!(chart.note_groups.len(), 3);
    for (i, group) in chart.note_groups.iter().enumerate() {
        assert_eq!(group.notes.len(), 1);
        assert_eq!(group.notes[0].start_position, i as u8 + 1);
        assert_eq!(group.notes[0].kind, NoteKind::Tap);
    }
}

#[test]
fn hold_duration_from_ratio() {
    let chart = parse_chart("(120){4}1h[4:1],", "", "").unwrap();
    let note = &chart.note_groups[0].notes[0];
    assert_eq!(note.start_position, 1);
    assert_eq!(note.kind, NoteKind::Hold { duration_seconds: 0.5 });
}

#[test]
fn slide_duration_from_ratio() {
    let chart = parse_chart("(150){4}1-3[8:3],", "", "").unwrap();
    let note = &chart.note_groups[0].notes[0];
    let NoteKind::Slide {
        duration_seconds,
        no_head,
        ..
    } = note.kind
    else {
        panic!("expected a slide");
    };
    let expected = (60.0 / 150.0) * 4.0 / 8.0 * 3.0;
    assert!((duration_seconds - expected).abs() < 1e-12);
    assert!(!no_head);
}

#[test]
fn same_origin_chain_produces_headless_tails() {
    let chart = parse_chart("(120){4}1*2*3,", "", "").unwrap();
    let notes = &chart.note_groups[0].notes;
    assert_eq!(notes.len(), 3);
    assert_eq!(notes[0].kind, NoteKind::Tap);
    for tail in &notes[1..] {
        let NoteKind::Slide { no_head, .. } = tail.kind else {
            panic!("expected a slide tail");
        };
        assert!(no_head);
    }
}

#[test]
fn fake_each_notes_sit_one_128th_apart() {
    let chart = parse_chart("(120){4}1`2,", "", "").unwrap();
    assert_eq!(chart.note_groups.len(), 2);
    let delta = chart.note_groups[1].time_seconds - chart.note_groups[0].time_seconds;
    assert!((delta - 1.875 / 120.0).abs() < 1e-12);
    assert_eq!(chart.note_groups[0].notes[0].kind, NoteKind::Tap);
    assert_eq!(chart.note_groups[1].notes[0].kind, NoteKind::Tap);
}

#[test]
fn beat_markers_are_time_ordered_and_one_per_comma() {
    let fumen = "(120){4}1,,{8}2,3,(240){4},1`2,";
    let chart = parse_chart(fumen, "", "").unwrap();
    assert_eq!(
        chart.beat_markers.len(),
        fumen.chars().filter(|c| *c == ',').count()
    );
    for pair in chart.beat_markers.windows(2) {
        assert!(pair[0].time_seconds <= pair[1].time_seconds);
    }
    for pair in chart.note_groups.windows(2) {
        assert!(pair[0].time_seconds <= pair[1].time_seconds);
    }
}

#[test]
fn parse_chart_is_deterministic() {
    let fumen = "(150){4}1-3[8:3]/5,1`2`3,C2h[4:1],";
    let a = parse_chart(fumen, "12", "x").unwrap();
    let b = parse_chart(fumen, "12", "x").unwrap();
    assert_eq!(a, b);
}

#[test]
fn decode_str_assembles_the_full_file() {
    let file = decode_str(FIXTURE).unwrap();
    assert_eq!(file.title, "Test Song");
    assert_eq!(file.artist, "Test Band");
    assert_eq!(file.offset, 0.5);
    assert_eq!(file.commands.len(), 1);
    assert_eq!(file.commands[0].prefix, "wholebpm");

    let chart = &file.charts[4];
    assert_eq!(chart.level, "12+");
    assert_eq!(chart.designer, "someone");
    assert_eq!(chart.beat_markers.len(), 5);
    assert_eq!(chart.note_groups.len(), 5);
    assert_eq!(chart.note_groups[4].notes.len(), 2);

    for (slot, chart) in file.charts.iter().enumerate() {
        if slot != 4 {
            assert!(chart.is_empty());
        }
    }
}

#[test]
fn hard_policy_fails_the_whole_decode() {
    let content = "&inote_1=(abc){4}1,\n";
    let err = decode_str(content).unwrap_err();
    let DecodeError::Chart { difficulty, error } = err else {
        panic!("expected a chart error, got {err}");
    };
    assert_eq!(difficulty, 0);
    assert_eq!(error.kind, MarkupErrorKind::InvalidNumber);
    assert_eq!(error.line, 1);
    assert_eq!(error.snippet, "abc");
}

#[test]
fn chart_error_names_the_one_based_slot() {
    let err = decode_str("&inote_3=(abc){4}1,\n").unwrap_err();
    let DecodeError::Chart { difficulty, .. } = &err else {
        panic!("expected a chart error, got {err}");
    };
    assert_eq!(*difficulty, 2);
    assert!(err.to_string().contains("chart for difficulty 3"));
}

#[test]
fn soft_policy_substitutes_an_empty_chart() {
    let content = "&lv_1=3\n&inote_1=(abc){4}1,\n&inote_2=(120){4}1,\n";
    let options = DecodeOptions {
        policy: ErrorPolicy::Soft,
    };
    let output = decode_str_with_options(content, &options).unwrap();
    assert_eq!(output.failures.len(), 1);
    assert_eq!(output.failures[0].difficulty, 0);
    assert!(output.file.charts[0].is_empty());
    assert_eq!(output.file.charts[0].level, "3");
    assert_eq!(output.file.charts[1].note_groups.len(), 1);
}

#[test]
fn metadata_survives_an_encode_decode_round_trip() {
    let file = decode_str(FIXTURE).unwrap();
    let reencoded = encode(&file);
    let back = decode_str(&reencoded).unwrap();
    assert_eq!(back.title, file.title);
    assert_eq!(back.artist, file.artist);
    assert_eq!(back.offset, file.offset);
    assert_eq!(back.commands, file.commands);
    assert_eq!(back.charts[4].fumen, file.charts[4].fumen);
    assert_eq!(
        back.charts[4].note_groups.len(),
        file.charts[4].note_groups.len()
    );
}

#[test]
fn metadata_error_surfaces_before_any_chart_work() {
    let err = decode_str("&broken\n").unwrap_err();
    assert!(matches!(err, DecodeError::Metadata(_)));
}

#[test]
fn missing_file_reports_the_path() {
    let err = decode_file("/nonexistent/maidata.txt").unwrap_err();
    let DecodeError::Io { path, .. } = err else {
        panic!("expected an IO error, got {err}");
    };
    assert_eq!(path, "/nonexistent/maidata.txt");
}
