//! Pipeline throughput on a large debug log.
//!
//! The log is re-parsed on every request, so a full read of a log at the retention
//! bound has to stay well inside one request.
//!
//! Run with: cargo bench

#![allow(missing_docs)] // criterion macros generate undocumented items

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dlm::parser::{segment, LogPipeline, SegmentOptions};
use dlm::registry::StaticRegistry;
use dlm::view::{to_rows, RenderContext};

/// Number of entries, half again the default retention bound.
const NUM_ENTRIES: usize = 150_000;

/// Distinct messages; the rest are repeats, as in a real log.
const DISTINCT: usize = 2_000;

/// Mix of single-line warnings and multi-line fatals with stack traces.
fn generate_log() -> String {
    let mut log = String::with_capacity(NUM_ENTRIES * 200);
    for i in 0..NUM_ENTRIES {
        let n = i % DISTINCT;
        let ts = format!("[29-Nov-2023 {:02}:{:02}:{:02} UTC] ", (i / 3600) % 24, (i / 60) % 60, i % 60);
        log.push_str(&ts);
        match n % 4 {
            0 => log.push_str(&format!(
                "PHP Fatal error:  Uncaught Error: Call to undefined function f{n}() in /var/www/html/wp-content/plugins/plugin-{n}/main.php:{n}\nStack trace:\n#0 /var/www/html/wp-settings.php(462): include_once()\n#1 [internal function]: run()\n#2 {{main}}\n  thrown in /var/www/html/wp-content/plugins/plugin-{n}/main.php on line {n}\n"
            )),
            1 => log.push_str(&format!(
                "PHP Warning:  Undefined array key \"k{n}\" in /var/www/html/wp-content/themes/theme-{n}/functions.php on line {n}\n"
            )),
            2 => log.push_str(&format!(
                "PHP Deprecated:  Function old_{n}() is deprecated in /var/www/html/wp-includes/functions.php on line {n}\n"
            )),
            _ => log.push_str(&format!("{{\"order\":{n},\"status\":\"failed\"}}\n")),
        }
    }
    log
}

fn bench_segment(c: &mut Criterion) {
    let log = generate_log();
    c.bench_function("segment_150k", |b| {
        b.iter(|| segment(black_box(&log), SegmentOptions::default()))
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let log = generate_log();
    let pipeline = LogPipeline::new("/var/www/html", Box::new(StaticRegistry::new()));

    c.bench_function("pipeline_150k", |b| b.iter(|| pipeline.run(black_box(&log))));

    let records = pipeline.run(&log);
    let ctx = RenderContext::default();
    c.bench_function("to_rows_distinct", |b| {
        b.iter(|| to_rows(black_box(&records), &ctx))
    });
}

criterion_group!(benches, bench_segment, bench_pipeline);
criterion_main!(benches);
