use labchart_text::{Diagnostic, ParsedDocument};

// Standard two-channel header followed by the given data lines
fn export_with(data_lines: &str) -> String {
    format!(
        "Interval=\t0.5 s\n\
         ChannelTitle=\tFlow\tPressure\n\
         UnitName=\tL/min\tcmH2O\n\
         {}",
        data_lines
    )
}

#[test]
fn test_inline_comment_extracted() {
    let text = export_with("0\t0.8\t4.5\n0.5\t0.9\t4.6\t#* INSPI\n1\t0.7\t4.4\n");
    let doc = ParsedDocument::from_text(&text).unwrap();

    // The carrying row is still a full sample row.
    assert_eq!(doc.sample_count(), 3);
    assert_eq!(doc.row(1).unwrap().get("Flow"), Some(0.9));

    assert_eq!(doc.comments().len(), 1);
    let c = &doc.comments()[0];
    assert_eq!(c.label, "INSPI");
    assert_eq!(c.block, 0);
    assert_eq!(c.local_time, 0.5);
    assert_eq!(c.global_time, 0.5);
    assert_eq!(c.line, 5);
    assert!(!c.clamped);
}

#[test]
fn test_standalone_comment_row() {
    let text = export_with("0\t0.8\t4.5\n0.5\t0.9\t4.6\n0.9\trecording paused\n1\t0.7\t4.4\n");
    let doc = ParsedDocument::from_text(&text).unwrap();

    // The comment row is not a sample.
    assert_eq!(doc.sample_count(), 3);

    assert_eq!(doc.comments().len(), 1);
    let c = &doc.comments()[0];
    assert_eq!(c.label, "recording paused");
    assert_eq!(c.local_time, 0.9);
    assert_eq!(c.global_time, 0.9);
    assert!(!c.clamped);
}

#[test]
fn test_sentinel_stripped_in_both_forms() {
    let text = export_with("0\t0.8\t4.5\t#* WAKE\n0.5\t0.9\t4.6\n0.7\t#*DOZE\n1\t0.7\t4.4\n");
    let doc = ParsedDocument::from_text(&text).unwrap();

    let labels: Vec<&str> = doc.comments().iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, vec!["WAKE", "DOZE"]);
}

#[test]
fn test_non_numeric_cell_demotes_row_to_comment() {
    // A stray word inside the data columns turns the whole row into a
    // comment whose text is everything after the time stamp.
    let text = export_with("0\t0.8\t4.5\n0.5\t0.9\tEXPI\n1\t0.7\t4.4\n");
    let doc = ParsedDocument::from_text(&text).unwrap();

    assert_eq!(doc.sample_count(), 2);
    assert_eq!(doc.comments().len(), 1);
    assert_eq!(doc.comments()[0].label, "0.9\tEXPI");
    assert_eq!(doc.comments()[0].local_time, 0.5);
}

#[test]
fn test_out_of_range_comments_clamped() {
    // Block spans [0, 1.5). One comment claims a stamp far past the end,
    // another a negative one.
    let text = export_with(
        "0\t0.8\t4.5\n0.5\t0.9\t4.6\n1\t0.7\t4.4\n9.9\tway past the end\n-2\tbefore the start\n",
    );
    let doc = ParsedDocument::from_text(&text).unwrap();

    assert_eq!(doc.comments().len(), 2);

    let first = &doc.comments()[0];
    assert_eq!(first.label, "before the start");
    assert_eq!(first.global_time, 0.0);
    assert!(first.clamped);

    let second = &doc.comments()[1];
    assert_eq!(second.label, "way past the end");
    assert_eq!(second.global_time, 1.5);
    assert!(second.clamped);

    let clamps = doc
        .diagnostics()
        .iter()
        .filter(|d| matches!(d, Diagnostic::CommentBounds { .. }))
        .count();
    assert_eq!(clamps, 2);
}

#[test]
fn test_equal_times_keep_file_order() {
    // An inline comment and a standalone row at the same instant: the one
    // written first in the file comes first.
    let text = export_with("0\t0.8\t4.5\n0.5\t0.9\t4.6\t#* first\n0.5\tsecond\n1\t0.7\t4.4\n");
    let doc = ParsedDocument::from_text(&text).unwrap();

    let labels: Vec<&str> = doc.comments().iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, vec!["first", "second"]);
    assert_eq!(doc.comments()[0].global_time, doc.comments()[1].global_time);
    assert!(doc.comments()[0].line < doc.comments()[1].line);
}

#[test]
fn test_comments_labeled_is_case_insensitive() {
    let text = export_with(
        "0\t0.8\t4.5\t#* INSPI\n\
         0.5\t0.9\t4.6\t#* inspi\n\
         1\t0.7\t4.4\t#* Inspi\n\
         1.5\t0.6\t4.3\t#* EXPI\n",
    );
    let doc = ParsedDocument::from_text(&text).unwrap();

    assert_eq!(doc.comments_labeled("INSPI").len(), 3);
    assert_eq!(doc.comments_labeled("expi").len(), 1);
    assert_eq!(doc.comments_labeled("apnea").len(), 0);
}

#[test]
fn test_comment_in_later_block_gets_global_offset() {
    let text = "Interval=\t0.5 s\n\
                ExcelDateTime=\t40000.0 6/7/2009 0:00:00.0000\n\
                ChannelTitle=\tFlow\n\
                0\t1.0\n\
                0.5\t1.1\n\
                Interval=\t0.5 s\n\
                ExcelDateTime=\t40000.25 6/7/2009 6:00:00.0000\n\
                ChannelTitle=\tFlow\n\
                0\t2.0\n\
                0.5\t2.1\t#* LATER\n\
                1\t2.2\n";
    let doc = ParsedDocument::from_text(text).unwrap();

    assert_eq!(doc.comments().len(), 1);
    let c = &doc.comments()[0];
    assert_eq!(c.block, 1);
    assert_eq!(c.local_time, 0.5);
    assert_eq!(c.global_time, 21600.5);
    assert!(!c.clamped);
}

#[test]
fn test_comment_with_nonzero_local_origin() {
    // The block's own clock starts at 100 s; the axis still starts at 0.
    let text = "Interval=\t1 s\n\
                ChannelTitle=\tFlow\n\
                100\t1.0\n\
                101\t2.0\n\
                102\t3.0\n\
                102.5\t#* MID\n\
                103\t4.0\n";
    let doc = ParsedDocument::from_text(text).unwrap();

    let span = doc.time_map().span(0).unwrap();
    assert_eq!(span.local_origin, 100.0);
    assert_eq!(span.global_start, 0.0);
    assert_eq!(span.global_end, 4.0);

    let c = &doc.comments()[0];
    assert_eq!(c.label, "MID");
    assert_eq!(c.global_time, 2.5);
    assert!(!c.clamped);
}

#[test]
fn test_comment_in_empty_block_pins_to_span() {
    let text = "Interval=\t1 s\n\
                ChannelTitle=\tFlow\n\
                5\tonly a note\n";
    let doc = ParsedDocument::from_text(text).unwrap();

    assert_eq!(doc.block_count(), 1);
    assert_eq!(doc.sample_count(), 0);

    let c = &doc.comments()[0];
    assert_eq!(c.global_time, 0.0);
    assert!(c.clamped);
}
