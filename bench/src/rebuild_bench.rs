use std::sync::Arc;
use std::time::{Duration, Instant};

use emberdb_core::{CollectionHandle, TokioScheduler};

use crate::{seeded_collection, summarize_ms};

const DOCUMENTS: usize = 10_000;
const MEASURED_RUNS: usize = 15;

pub(crate) fn run_rebuild_async_bench(mode: &str) -> bool {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(value) => value,
        Err(error) => {
            eprintln!("error=runtime_build_failed detail=\"{error}\"");
            return false;
        }
    };

    let Some(collection) = seeded_collection(DOCUMENTS) else {
        return false;
    };
    let Some(scheduler) = TokioScheduler::new(runtime.handle().clone()) else {
        eprintln!("error=runtime_flavor_unsupported");
        return false;
    };
    let handle = CollectionHandle::new(collection, Arc::new(scheduler));

    let outcome = runtime.block_on(measure(&handle));
    let Some((samples_ms, total)) = outcome else {
        return false;
    };

    let (p50_ms, p95_ms, avg_ms) = summarize_ms(&samples_ms);
    tracing::info!(
        runs = MEASURED_RUNS,
        total_ms = total.as_millis() as u64,
        "deferred rebuilds finished"
    );
    println!(
        "bench=ensure_all_indexes_async mode={mode} documents={DOCUMENTS} measured_runs={MEASURED_RUNS} p50_ms={p50_ms:.6} p95_ms={p95_ms:.6} avg_ms={avg_ms:.6}"
    );
    true
}

async fn measure(handle: &CollectionHandle) -> Option<(Vec<f64>, Duration)> {
    let mut samples_ms = Vec::with_capacity(MEASURED_RUNS);
    let mut total = Duration::from_secs(0);
    for _ in 0..MEASURED_RUNS {
        let started_at = Instant::now();
        if let Err(error) = handle.ensure_all_indexes_async().await {
            eprintln!("error=deferred_rebuild_failed detail=\"{error}\"");
            return None;
        }
        let elapsed = started_at.elapsed();
        samples_ms.push(elapsed.as_secs_f64() * 1_000.0);
        total += elapsed;
    }
    Some((samples_ms, total))
}
