use labchart_text::ParsedDocument;

// Two seamless blocks: three rows then two rows at 2 Hz
fn contiguous_export() -> String {
    "Interval=\t0.5 s\n\
     ChannelTitle=\tFlow\n\
     0\t1.0\n\
     0.5\t1.1\n\
     1\t1.2\n\
     Interval=\t0.5 s\n\
     ChannelTitle=\tFlow\n\
     0\t2.0\n\
     0.5\t2.1\n"
        .to_string()
}

// Two blocks separated by a quarter-day recording pause
fn gapped_export() -> String {
    "Interval=\t0.5 s\n\
     ExcelDateTime=\t40000.0 6/7/2009 0:00:00.0000\n\
     ChannelTitle=\tFlow\n\
     0\t1.0\n\
     0.5\t1.1\n\
     Interval=\t0.5 s\n\
     ExcelDateTime=\t40000.25 6/7/2009 6:00:00.0000\n\
     ChannelTitle=\tFlow\n\
     0\t2.0\n\
     0.5\t2.1\n"
        .to_string()
}

#[test]
fn test_span_arithmetic() {
    let doc = ParsedDocument::from_text(&contiguous_export()).unwrap();
    let map = doc.time_map();

    let span0 = map.span(0).unwrap();
    assert_eq!(span0.global_start, 0.0);
    assert_eq!(span0.global_end, 1.5);
    assert_eq!(span0.duration(), 1.5);
    assert_eq!(span0.time_at(2), 1.0);

    let span1 = map.span(1).unwrap();
    assert_eq!(span1.time_at(1), 2.0);
    assert_eq!(span1.global_from_local(0.5), 2.0);
    assert_eq!(span1.duration(), 1.0);

    assert!(span0.contains(0.0));
    assert!(!span0.contains(1.5));
    assert!(!span0.contains(-0.1));
    assert!(span1.contains(1.5));
    assert!(!span1.contains(2.5));
}

#[test]
fn test_block_at_seams() {
    let doc = ParsedDocument::from_text(&contiguous_export()).unwrap();
    let map = doc.time_map();

    assert_eq!(map.block_at(0.0), Some(0));
    assert_eq!(map.block_at(1.49), Some(0));
    // A seam belongs to the later block.
    assert_eq!(map.block_at(1.5), Some(1));
    assert_eq!(map.block_at(2.5), None);
    assert_eq!(map.block_at(-0.5), None);
}

#[test]
fn test_block_at_inside_gap() {
    let doc = ParsedDocument::from_text(&gapped_export()).unwrap();
    let map = doc.time_map();

    assert_eq!(map.block_at(0.5), Some(0));
    assert_eq!(map.block_at(10_000.0), None);
    assert_eq!(map.block_at(21_600.0), Some(1));
}

#[test]
fn test_total_span() {
    let contiguous = ParsedDocument::from_text(&contiguous_export()).unwrap();
    assert_eq!(contiguous.time_map().total_span(), 2.5);
    assert_eq!(contiguous.time_map().len(), 2);
    assert!(!contiguous.time_map().is_empty());

    let gapped = ParsedDocument::from_text(&gapped_export()).unwrap();
    assert_eq!(gapped.time_map().total_span(), 21_601.0);
    assert_eq!(gapped.time_map().span(1).unwrap().gap_before, 21_599.0);
}

#[test]
fn test_nearest_row_in_gap() {
    let doc = ParsedDocument::from_text(&gapped_export()).unwrap();

    // Closest sample just after the pause started.
    let row = doc.nearest_row(21_599.0).unwrap();
    assert_eq!(row.block_index(), 1);
    assert_eq!(row.global_time(), 21_600.0);

    // Before the recording and far past its end.
    assert_eq!(doc.nearest_row(-5.0).unwrap().global_time(), 0.0);
    assert_eq!(doc.nearest_row(1e9).unwrap().global_time(), 21_600.5);
}

#[test]
fn test_nearest_row_tie_prefers_earlier_block() {
    let doc = ParsedDocument::from_text(&gapped_export()).unwrap();

    // Exactly halfway between the last row of block 0 and the first row
    // of block 1.
    let midpoint = (0.5 + 21_600.0) / 2.0;
    let row = doc.nearest_row(midpoint).unwrap();
    assert_eq!(row.block_index(), 0);
    assert_eq!(row.global_time(), 0.5);
}

#[test]
fn test_nearest_row_none_without_samples() {
    let doc = ParsedDocument::from_text("Interval=\t1 s\nChannelTitle=\tFlow\n").unwrap();

    assert_eq!(doc.sample_count(), 0);
    assert!(doc.nearest_row(0.0).is_none());
    assert_eq!(doc.rows().count(), 0);
    assert_eq!(doc.rows_between(0.0, 10.0).count(), 0);
}

#[test]
fn test_rows_between_is_inclusive() {
    let doc = ParsedDocument::from_text(&contiguous_export()).unwrap();

    let times: Vec<f64> = doc.rows_between(0.5, 1.5).map(|r| r.global_time()).collect();
    assert_eq!(times, vec![0.5, 1.0, 1.5]);

    // A single instant selects exactly the sample sitting on it.
    let times: Vec<f64> = doc.rows_between(1.0, 1.0).map(|r| r.global_time()).collect();
    assert_eq!(times, vec![1.0]);

    // Inverted bounds select nothing.
    assert_eq!(doc.rows_between(2.0, 1.0).count(), 0);
}

#[test]
fn test_rows_between_across_gap() {
    let doc = ParsedDocument::from_text(&gapped_export()).unwrap();

    let times: Vec<f64> = doc
        .rows_between(0.5, 21_600.0)
        .map(|r| r.global_time())
        .collect();
    assert_eq!(times, vec![0.5, 21_600.0]);

    // A window lying entirely inside the pause is empty.
    assert_eq!(doc.rows_between(10.0, 20.0).count(), 0);
}

#[test]
fn test_row_iteration_round_trip() {
    let doc = ParsedDocument::from_text(&gapped_export()).unwrap();

    assert_eq!(doc.rows().len(), 4);
    assert_eq!(doc.rows().count(), doc.sample_count());

    let blocks: Vec<usize> = doc.rows().map(|r| r.block_index()).collect();
    let locals: Vec<usize> = doc.rows().map(|r| r.local_index()).collect();
    assert_eq!(blocks, vec![0, 0, 1, 1]);
    assert_eq!(locals, vec![0, 1, 0, 1]);

    for (i, row) in doc.rows().enumerate() {
        let direct = doc.row(i).unwrap();
        assert_eq!(direct.global_time(), row.global_time());
        assert_eq!(direct.block_index(), row.block_index());
    }
    assert!(doc.row(4).is_none());

    let times: Vec<f64> = doc.rows().map(|r| r.global_time()).collect();
    assert!(times.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_row_times_match_local_mapping() {
    // In a drift-free file the index arithmetic and the written stamps
    // agree about where every row sits.
    let doc = ParsedDocument::from_text(&gapped_export()).unwrap();

    for row in doc.rows() {
        let span = doc.time_map().span(row.block_index()).unwrap();
        assert_eq!(span.global_from_local(row.local_time()), row.global_time());
    }
}
