use crossbeam_channel::{bounded, Receiver, Sender};
use std::path::{Path, PathBuf};
use std::thread;
use tracing::{debug, info, warn};

use super::scanner::{scan_file_with_stats, validate_scan_params};
use crate::errors::{SearchError, SearchResult};
use crate::results::{Aggregator, FileOutcome, ScanOutcome};
use crate::walk::{walk_files, WalkOptions};

/// Queue slots per worker, for both the task queue and the event queue.
const QUEUE_SLOTS_PER_WORKER: usize = 4;

/// Messages flowing into the collector.
///
/// Workers send one `Finished` per task. The producer sends exactly one of
/// `Enumerated` (after the last task) or `Aborted`.
#[derive(Debug)]
enum ScanEvent {
    Finished(FileOutcome),
    Enumerated { total: u64 },
    Aborted(SearchError),
}

/// Scans every file under `root` with `worker_count` concurrent
/// workers.
///
/// A producer thread walks the tree and feeds paths into a bounded queue.
/// Exactly `worker_count` workers, each on its own thread of a dedicated
/// pool, claim one path at a time and report one outcome per path. The
/// calling thread collects outcomes and is the only owner of the result set.
///
/// Per-file failures are recorded in [`ScanOutcome::file_errors`] while the
/// remaining files are still scanned. A traversal failure aborts the call.
pub fn parallel_scan(
    root: &Path,
    term: &[u8],
    buffer_size: usize,
    worker_count: usize,
) -> SearchResult<ScanOutcome> {
    parallel_scan_with(root, term, buffer_size, worker_count, &WalkOptions::default())
}

/// [`parallel_scan`] with traversal filters.
pub fn parallel_scan_with(
    root: &Path,
    term: &[u8],
    buffer_size: usize,
    worker_count: usize,
    options: &WalkOptions,
) -> SearchResult<ScanOutcome> {
    validate_scan_params(term, buffer_size)?;
    if worker_count == 0 {
        return Err(SearchError::config_error("worker count must be at least 1"));
    }
    options.validate()?;

    info!(
        "Starting parallel scan of {} with {} workers",
        root.display(),
        worker_count
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(worker_count)
        .thread_name(|i| format!("offsetscout-worker-{}", i))
        .build()
        .map_err(|e| SearchError::worker_pool(e.to_string()))?;

    let capacity = worker_count.saturating_mul(QUEUE_SLOTS_PER_WORKER);
    let (task_tx, task_rx) = bounded::<PathBuf>(capacity);
    let (event_tx, event_rx) = bounded::<ScanEvent>(capacity);
    let aggregator = Aggregator::new();

    thread::scope(|scope| {
        let producer_events = event_tx.clone();
        let producer = thread::Builder::new()
            .name("offsetscout-producer".to_string())
            .spawn_scoped(scope, move || produce(root, options, task_tx, producer_events))
            .map_err(|e| SearchError::worker_pool(format!("failed to spawn producer: {}", e)))?;

        // The collector keeps no sender, so once the producer and every
        // worker are gone `recv` fails instead of blocking.
        let dispatcher = scope.spawn(move || {
            pool.scope(move |s| {
                for id in 0..worker_count {
                    let tasks = task_rx.clone();
                    let events = event_tx.clone();
                    s.spawn(move |_| run_worker(id, tasks, events, term, buffer_size));
                }
                drop(task_rx);
                drop(event_tx);
            });
        });

        let collected = collect(event_rx, aggregator);

        let producer_ok = producer.join().is_ok();
        let workers_ok = dispatcher.join().is_ok();
        let outcome = collected?;
        if !producer_ok || !workers_ok {
            return Err(SearchError::worker_pool("a scan thread panicked"));
        }

        outcome.stats.log_stats();
        info!(
            "Parallel scan complete. Found {} matches in {} files ({} failed)",
            outcome.stats.total_matches,
            outcome.stats.files_with_matches,
            outcome.stats.files_failed
        );
        Ok(outcome)
    })
}

/// Walks the tree and hands each non-directory entry to the workers.
fn produce(root: &Path, options: &WalkOptions, tasks: Sender<PathBuf>, events: Sender<ScanEvent>) {
    let walk = match walk_files(root, options) {
        Ok(walk) => walk,
        Err(e) => {
            let _ = events.send(ScanEvent::Aborted(e));
            return;
        }
    };

    let mut total = 0u64;
    for entry in walk {
        match entry {
            Ok(path) => {
                if tasks.send(path).is_err() {
                    // Every worker has exited; the collector notices via a
                    // closed event channel.
                    warn!("Workers stopped before enumeration finished");
                    return;
                }
                total += 1;
            }
            Err(e) => {
                warn!("Traversal failed: {}", e);
                let _ = events.send(ScanEvent::Aborted(e));
                return;
            }
        }
    }

    // Close the queue so workers exit once it drains.
    drop(tasks);
    debug!("Enumerated {} files", total);
    let _ = events.send(ScanEvent::Enumerated { total });
}

/// Claims tasks until the queue closes or the collector goes away.
fn run_worker(
    id: usize,
    tasks: Receiver<PathBuf>,
    events: Sender<ScanEvent>,
    term: &[u8],
    buffer_size: usize,
) {
    for path in tasks.iter() {
        let scan = scan_file_with_stats(&path, term, buffer_size);
        let outcome = FileOutcome::from_scan(path, scan);
        match &outcome {
            FileOutcome::Failure(failure) => warn!("Worker {}: {}", id, failure.error),
            FileOutcome::Success { .. } => {
                debug!("Worker {}: finished {}", id, outcome.path().display())
            }
        }
        if events.send(ScanEvent::Finished(outcome)).is_err() {
            debug!("Worker {}: collector gone, stopping", id);
            return;
        }
    }
}

/// Folds events until every enumerated file has reported.
fn collect(events: Receiver<ScanEvent>, mut aggregator: Aggregator) -> SearchResult<ScanOutcome> {
    let mut expected: Option<u64> = None;
    loop {
        if expected.is_some_and(|total| aggregator.recorded() >= total) {
            return Ok(aggregator.finish());
        }
        match events.recv() {
            Ok(ScanEvent::Finished(outcome)) => aggregator.record(outcome),
            Ok(ScanEvent::Enumerated { total }) => expected = Some(total),
            Ok(ScanEvent::Aborted(e)) => return Err(e),
            Err(_) => {
                return Err(SearchError::worker_pool(
                    "scan threads exited before every file was reported",
                ))
            }
        }
    }
}
