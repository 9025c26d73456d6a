#![forbid(unsafe_code)]
//! In-memory collection benchmarks for EmberDB.
//!
//! Scenarios:
//! - `add`: typed inserts with the default `id` index plus one secondary index
//! - `find_indexed`: `find_one` through a secondary index
//! - `find_unindexed`: `find_one` falling back to the full reverse scan
//! - `rebuild`: synchronous `ensure_all_indexes`
//! - `rebuild_async`: deferred rebuilds awaited on a current-thread tokio runtime

use std::env;
use std::process;
use std::sync::Arc;
use std::time::{Duration, Instant};

use emberdb_core::{Collection, Document, NoopSink};
use serde_json::json;
use tracing_subscriber::EnvFilter;

mod rebuild_bench;

use crate::rebuild_bench::run_rebuild_async_bench;

const DOCUMENTS: usize = 10_000;
const LOOKUPS: usize = 1_000;
const WARMUP_RUNS: usize = 3;
const MEASURED_RUNS: usize = 15;
const CATEGORIES: usize = 64;

fn main() {
    init_tracing();

    if cfg!(debug_assertions) && env::var("EMBERDB_ALLOW_DEBUG_BENCH").as_deref() != Ok("1") {
        eprintln!(
            "error=debug_build_not_allowed message=\"run `cargo run --release -p emberdb-bench`\""
        );
        process::exit(2);
    }

    let mode = if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    };

    let scenario = env::var("EMBERDB_BENCH_SCENARIO").unwrap_or_else(|_| "all".to_string());
    let ok = match scenario.as_str() {
        "all" => {
            run_add_bench(mode)
                && run_find_bench(mode, true)
                && run_find_bench(mode, false)
                && run_rebuild_bench(mode)
                && run_rebuild_async_bench(mode)
        }
        "add" => run_add_bench(mode),
        "find_indexed" => run_find_bench(mode, true),
        "find_unindexed" => run_find_bench(mode, false),
        "rebuild" => run_rebuild_bench(mode),
        "rebuild_async" => run_rebuild_async_bench(mode),
        _ => {
            eprintln!(
                "error=invalid_scenario scenario=\"{}\" allowed=\"all,add,find_indexed,find_unindexed,rebuild,rebuild_async\"",
                scenario
            );
            false
        }
    };

    if !ok {
        process::exit(1);
    }
}

fn run_add_bench(mode: &str) -> bool {
    for _ in 0..WARMUP_RUNS {
        if seeded_collection(DOCUMENTS).is_none() {
            return false;
        }
    }

    let mut samples_ms = Vec::with_capacity(MEASURED_RUNS);
    let mut total = Duration::from_secs(0);
    for _ in 0..MEASURED_RUNS {
        let started_at = Instant::now();
        if seeded_collection(DOCUMENTS).is_none() {
            return false;
        }
        let elapsed = started_at.elapsed();
        samples_ms.push(elapsed.as_secs_f64() * 1_000.0);
        total += elapsed;
    }

    let (p50_ms, p95_ms, avg_ms) = summarize_ms(&samples_ms);
    let qps = (MEASURED_RUNS * DOCUMENTS) as f64 / total.as_secs_f64();
    println!(
        "bench=collection_add mode={mode} documents={DOCUMENTS} warmup_runs={WARMUP_RUNS} measured_runs={MEASURED_RUNS} p50_ms={p50_ms:.6} p95_ms={p95_ms:.6} avg_ms={avg_ms:.6} qps={qps:.2}"
    );
    true
}

fn run_find_bench(mode: &str, indexed: bool) -> bool {
    let Some(mut collection) = seeded_collection(DOCUMENTS) else {
        return false;
    };
    if !indexed {
        // Same documents, but only the id index.
        collection = match rebuild_without_secondary(&collection) {
            Some(value) => value,
            None => return false,
        };
    }

    for _ in 0..WARMUP_RUNS {
        let _ = run_lookups(&collection);
    }

    let mut samples_ms = Vec::with_capacity(MEASURED_RUNS);
    let mut total = Duration::from_secs(0);
    let mut hits = 0usize;
    for _ in 0..MEASURED_RUNS {
        let (elapsed, sample_hits) = run_lookups(&collection);
        samples_ms.push(elapsed.as_secs_f64() * 1_000.0);
        total += elapsed;
        hits = sample_hits;
    }

    let (p50_ms, p95_ms, avg_ms) = summarize_ms(&samples_ms);
    let qps = (MEASURED_RUNS * LOOKUPS) as f64 / total.as_secs_f64();
    let bench = if indexed {
        "find_one_indexed"
    } else {
        "find_one_unindexed"
    };
    println!(
        "bench={bench} mode={mode} documents={DOCUMENTS} lookups={LOOKUPS} measured_runs={MEASURED_RUNS} p50_ms={p50_ms:.6} p95_ms={p95_ms:.6} avg_ms={avg_ms:.6} qps={qps:.2} hits={hits}"
    );
    true
}

fn run_rebuild_bench(mode: &str) -> bool {
    let Some(mut collection) = seeded_collection(DOCUMENTS) else {
        return false;
    };

    let mut samples_ms = Vec::with_capacity(MEASURED_RUNS);
    for _ in 0..MEASURED_RUNS {
        let started_at = Instant::now();
        collection.ensure_all_indexes();
        samples_ms.push(started_at.elapsed().as_secs_f64() * 1_000.0);
    }

    let (p50_ms, p95_ms, avg_ms) = summarize_ms(&samples_ms);
    let indexes = collection.index_names().count();
    println!(
        "bench=ensure_all_indexes mode={mode} documents={DOCUMENTS} indexes={indexes} measured_runs={MEASURED_RUNS} p50_ms={p50_ms:.6} p95_ms={p95_ms:.6} avg_ms={avg_ms:.6}"
    );
    true
}

fn run_lookups(collection: &Collection) -> (Duration, usize) {
    let started_at = Instant::now();
    let mut hits = 0usize;
    for probe in 0..LOOKUPS {
        let category = json!(format!("category-{}", probe % CATEGORIES));
        if collection.find_one("category", &category).is_some() {
            hits += 1;
        }
    }
    (started_at.elapsed(), hits)
}

pub(crate) fn seeded_collection(documents: usize) -> Option<Collection> {
    let mut collection = Collection::with_sink("bench", "Item", Arc::new(NoopSink));
    if let Err(error) = collection.ensure_index("category") {
        eprintln!("error=ensure_index_failed detail=\"{error}\"");
        return None;
    }

    for seq in 0..documents {
        if let Err(error) = collection.add(deterministic_document(seq)) {
            eprintln!("error=collection_add_failed seq={seq} detail=\"{error}\"");
            return None;
        }
    }
    Some(collection)
}

fn rebuild_without_secondary(source: &Collection) -> Option<Collection> {
    let mut collection = Collection::with_sink("bench_unindexed", "Item", Arc::new(NoopSink));
    for document in source.iter() {
        let mut copy = document.clone();
        copy.id = None;
        if let Err(error) = collection.add(copy) {
            eprintln!("error=collection_add_failed detail=\"{error}\"");
            return None;
        }
    }
    Some(collection)
}

fn deterministic_document(seq: usize) -> Document {
    Document::new("Item")
        .with_field("seq", seq)
        .with_field("category", format!("category-{}", seq % CATEGORIES))
        .with_field("score", (seq.wrapping_mul(31) % 10_000) as f64 / 10_000.0)
}

pub(crate) fn summarize_ms(samples_ms: &[f64]) -> (f64, f64, f64) {
    let p50_ms = percentile_ms(samples_ms, 0.50);
    let p95_ms = percentile_ms(samples_ms, 0.95);
    let avg_ms = samples_ms.iter().sum::<f64>() / samples_ms.len() as f64;
    (p50_ms, p95_ms, avg_ms)
}

fn percentile_ms(samples_ms: &[f64], quantile: f64) -> f64 {
    if samples_ms.is_empty() {
        return 0.0;
    }

    let mut sorted = samples_ms.to_vec();
    sorted.sort_by(f64::total_cmp);
    let last_index = sorted.len().saturating_sub(1);
    let position = (quantile.clamp(0.0, 1.0) * last_index as f64).round() as usize;
    sorted[position]
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(error) = tracing_subscriber::fmt().with_env_filter(filter).try_init() {
        eprintln!("failed to initialize tracing subscriber: {error}");
    }
}
