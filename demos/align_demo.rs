//! Demonstration of nearest-timestamp alignment.
//!
//! This example shows how to:
//! 1. Build two irregularly sampled sensor streams
//! 2. Align the gyroscope stream onto the accelerometer stream
//! 3. Inspect matched and unmatched rows
//! 4. Summarise match quality
//! 5. Write the combined table
//!
//! Run with: cargo run --example align_demo

use sensor_merge::{
    core::{align, AlignmentSummary, Sample, Tolerance, Vec3},
    export::write_combined,
    history::ProcessingLog,
    ingest::Activity,
};

/// Accelerometer at ~100 Hz with a little jitter, in nanoseconds.
fn accelerometer() -> Vec<Sample> {
    (0..20)
        .map(|i| {
            let jitter = (i % 3) * 150_000;
            let t = i as f64 * 0.01;
            Sample::new(
                i * 10_000_000 + jitter,
                Vec3::new(t.sin(), t.cos(), 9.81),
            )
        })
        .collect()
}

/// Gyroscope at ~60 Hz, with a dropout between 80 ms and 140 ms.
fn gyroscope() -> Vec<Sample> {
    (0..12)
        .map(|i| i * 16_666_667)
        .filter(|ts| !(80_000_000..140_000_000).contains(ts))
        .map(|ts| {
            let t = ts as f64 / 1e9;
            Sample::new(ts, Vec3::new(0.1 * t, 0.0, -0.1 * t))
        })
        .collect()
}

fn main() {
    println!("sensor-merge - Alignment Demo");
    println!("=============================");
    println!();

    let acc = accelerometer();
    let gyr = gyroscope();
    let tolerance = Tolerance::default();
    let log = ProcessingLog::new();

    println!("Accelerometer samples: {}", acc.len());
    println!("Gyroscope samples: {}", gyr.len());
    println!("Tolerance: {} ms", tolerance.as_millis_f64());
    println!();

    let rows = align(acc, gyr, tolerance);

    for row in &rows {
        match row.secondary {
            Some(g) => println!(
                "  {:>9} ns  acc=({:+.3}, {:+.3}, {:.2})  gyr@{:>9} ns  offset {:>7} ns",
                row.timestamp,
                row.primary.x,
                row.primary.y,
                row.primary.z,
                g.timestamp,
                row.offset_nanos().unwrap_or(0)
            ),
            None => println!(
                "  {:>9} ns  acc=({:+.3}, {:+.3}, {:.2})  no gyroscope sample within tolerance",
                row.timestamp, row.primary.x, row.primary.y, row.primary.z
            ),
        }
    }

    let summary = AlignmentSummary::from_rows(&rows);
    log.record_archive(summary.rows as u64, summary.matched as u64);

    println!();
    println!("=== Alignment Summary ===");
    println!("  Rows: {}", summary.rows);
    println!(
        "  Matched: {} ({:.1}%)",
        summary.matched,
        summary.match_rate() * 100.0
    );
    if let Some(mean) = summary.mean_offset_ns {
        println!("  Mean offset: {:.3} ms", mean / 1e6);
    }
    println!();

    // Show the head of the combined CSV
    let mut buf = Vec::new();
    match write_combined(&mut buf, &rows, Activity::Walking) {
        Ok(_) => {
            println!("  Combined CSV (truncated):");
            for line in String::from_utf8_lossy(&buf).lines().take(6) {
                println!("    {line}");
            }
            println!("    ...");
        }
        Err(e) => eprintln!("Error writing CSV: {e}"),
    }

    println!();
    println!("{}", log.summary());
    println!();
    println!("Demo complete!");
}
