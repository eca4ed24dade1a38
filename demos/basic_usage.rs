//! Walks through a small export: file metadata, blocks, channels,
//! comments, and pairing INSPI/EXPI marks into breaths.
//!
//! Run with `cargo run --example basic_usage` from the crate root.

use labchart_text::{ParsedDocument, Result};

fn main() -> Result<()> {
    let doc = ParsedDocument::open("demos/data/demo.txt")?;

    println!("== File ==");
    if let Some(start) = doc.start_datetime() {
        println!("Recorded: {}", start);
    }
    println!("Interval: {} s", doc.interval());
    println!("Blocks:   {}", doc.block_count());
    println!("Rows:     {}", doc.sample_count());
    println!(
        "Duration: {:.1} s including pauses",
        doc.time_map().total_span()
    );

    println!("\n== Channels ==");
    for c in doc.channels() {
        let unit = if c.unit.is_empty() { "-" } else { &c.unit };
        println!("  {:<10} [{}]", c.name, unit);
    }

    println!("\n== Blocks ==");
    for (block, span) in doc.blocks().iter().zip(doc.time_map().spans()) {
        print!(
            "  #{}  {:>7.1} .. {:<7.1}  {} rows",
            block.index(),
            span.global_start,
            span.global_end,
            block.sample_count()
        );
        if span.gap_before > 0.0 {
            print!("  (pause of {:.1} s before)", span.gap_before);
        }
        println!();
    }

    println!("\n== Comments ==");
    for c in doc.comments() {
        println!("  [{:7.2} s] {}", c.global_time, c.label);
    }

    // Pair inspiration and expiration marks into breaths and look up the
    // pressure at each mark from the nearest sample.
    let inspi = doc.comments_labeled("INSPI");
    let expi = doc.comments_labeled("EXPI");

    println!("\n== Breaths ==");
    for (i, e) in inspi.iter().zip(&expi) {
        let p_start = doc
            .nearest_row(i.global_time)
            .and_then(|r| r.get("Pressure"));
        let p_end = doc
            .nearest_row(e.global_time)
            .and_then(|r| r.get("Pressure"));
        if let (Some(a), Some(b)) = (p_start, p_end) {
            println!(
                "  in at {:6.2} s, out at {:6.2} s: {:.2} s long, dP {:+.2} cmH2O",
                i.global_time,
                e.global_time,
                e.global_time - i.global_time,
                b - a
            );
        }
    }

    if !doc.diagnostics().is_empty() {
        println!("\n== Parser notes ==");
        for d in doc.diagnostics() {
            println!("  {}", d);
        }
    }

    Ok(())
}
