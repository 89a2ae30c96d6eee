use crate::chunk_filler::{ChunkFiller, ChunkTask};
use crate::gate::InvocationGate;
use crate::parallelism_config::ParallelismConfig;
use crate::partitioner::RangePartitioner;
use crate::recurrence::{Fibonacci, Recurrence};
use crate::sequence_cache::SequenceCache;
use crate::MemoError;
use itertools::Itertools;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// One top-level "compute up to target" call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillRequest {
    pub target: i64,
    pub parallelism: i64,
}

impl FillRequest {
    pub fn new(target: i64, parallelism: i64) -> Self {
        FillRequest { target, parallelism }
    }

    fn target_index(&self) -> Result<usize, MemoError> {
        usize::try_from(self.target).map_err(|_| MemoError::InvalidArgument { target: self.target })
    }

    /// Parallelism must lie in `1..=target`.
    fn worker_count(&self, target: usize) -> Result<usize, MemoError> {
        match usize::try_from(self.parallelism) {
            Ok(p) if p >= 1 && p <= target => Ok(p),
            _ => Err(MemoError::Configuration(format!(
                "parallelism {} for target {} must be between 1 and {}",
                self.parallelism, self.target, target
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FillStats {
    pub elapsed_micros: u64,
    pub newly_computed: usize,
    pub chunks: usize,
}

impl FillStats {
    fn since(started: Instant, newly_computed: usize, chunks: usize) -> Self {
        FillStats {
            elapsed_micros: u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
            newly_computed,
            chunks,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FillOutcome {
    pub target: usize,
    pub value: u64,
    pub stats: FillStats,
}

/// Answers "value at target" requests against a shared, growing cache.
///
/// Misses are split into chunks, and every chunk is queued at once on a rayon
/// pool of `min(chunks, max_parallelism)` threads owned by the request. The
/// call returns once every chunk has finished. Safe to share across threads:
/// concurrent calls may overlap, but each index is stored once.
pub struct FillCoordinator {
    cache: Arc<SequenceCache>,
    recurrence: Arc<dyn Recurrence>,
    gate: InvocationGate,
    config: ParallelismConfig,
}

impl FillCoordinator {
    /// Fibonacci over a fresh cache.
    pub fn new(config: ParallelismConfig) -> Self {
        Self::with_recurrence(config, Fibonacci)
    }

    pub fn with_recurrence<R>(config: ParallelismConfig, recurrence: R) -> Self
    where
        R: Recurrence + 'static,
    {
        Self::with_cache(config, Arc::new(recurrence), Arc::new(SequenceCache::new()))
    }

    /// Attach to an existing cache. The cache must only ever be filled with
    /// this same recurrence.
    pub fn with_cache(
        config: ParallelismConfig,
        recurrence: Arc<dyn Recurrence>,
        cache: Arc<SequenceCache>,
    ) -> Self {
        FillCoordinator {
            cache,
            recurrence,
            gate: InvocationGate::new(),
            config,
        }
    }

    pub fn compute(&self, target: i64, parallelism: i64) -> Result<FillOutcome, MemoError> {
        self.execute(FillRequest::new(target, parallelism))
    }

    #[tracing::instrument(level = "debug", skip(self), fields(recurrence = self.recurrence.name()))]
    pub fn execute(&self, request: FillRequest) -> Result<FillOutcome, MemoError> {
        let started = Instant::now();

        let target = request.target_index().inspect_err(|e| warn!("Rejected request: {}", e))?;

        if target <= 1 {
            return Ok(FillOutcome {
                target,
                value: self.recurrence.base()[target],
                stats: FillStats::since(started, 0, 0),
            });
        }

        if let Some(value) = self.cache.get(target)? {
            let stats = FillStats::since(started, 0, 0);
            debug!(index = target, value, elapsed_micros = stats.elapsed_micros, "Cache hit");
            return Ok(FillOutcome { target, value, stats });
        }

        let workers = request
            .worker_count(target)
            .inspect_err(|e| warn!("Rejected request: {}", e))?;

        let ticket = self.gate.enter();
        debug!(request_id = ticket.id, concurrent = ticket.concurrent, "Request admitted");

        self.cache.seed_base(self.recurrence.base())?;
        let first_missing = self
            .cache
            .highest_contiguous_index()?
            .map_or(2, |k| k + 1);

        let chunks = RangePartitioner::partition(first_missing, target, workers);
        debug!(first_missing, chunks = %chunks.iter().join(", "), "Partitioned");

        let newly_computed = AtomicUsize::new(0);
        if !chunks.is_empty() {
            let tasks = ChunkTask::plan(&chunks, &self.cache)
                .inspect_err(|e| warn!(index = target, "Dispatch failed: {}", e))?;
            let filler = ChunkFiller::new(&self.cache, self.recurrence.as_ref(), &newly_computed);
            self.run_chunks(tasks, &filler)
                .inspect_err(|e| warn!(index = target, "Fill failed: {}", e))?;
        }

        let value = self.cache.get(target)?.ok_or_else(|| MemoError::DependencyHazard {
            index: target,
            reason: "target still missing after all chunks joined".to_string(),
        })?;

        let stats = FillStats::since(started, newly_computed.load(Ordering::Relaxed), chunks.len());
        info!(
            index = target,
            newly_computed = stats.newly_computed,
            chunks = stats.chunks,
            elapsed_micros = stats.elapsed_micros,
            "Fill complete"
        );

        Ok(FillOutcome { target, value, stats })
    }

    /// Run every task on at most `max_parallelism` workers and wait for all of them.
    ///
    /// Tasks start in chunk order (`spawn_fifo` from a single thread), and a
    /// chunk only ever blocks on the chunk before it. The lowest unfinished
    /// chunk is therefore always running or next in line, whatever the pool
    /// size. Results are checked in chunk order, which puts the root cause
    /// ahead of the hazards it triggers.
    fn run_chunks(&self, tasks: Vec<ChunkTask>, filler: &ChunkFiller<'_>) -> Result<(), MemoError> {
        let threads = tasks.len().min(self.config.max_parallelism).max(1);
        debug!(chunks = tasks.len(), threads, "Dispatching chunks");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("memofill-fill-{}", i))
            .build()?;

        let (done_tx, done_rx) = crossbeam_channel::unbounded();
        pool.scope_fifo(|scope| {
            for (position, task) in tasks.into_iter().enumerate() {
                let done_tx = done_tx.clone();
                scope.spawn_fifo(move |_| {
                    // The receiver outlives the scope.
                    let _ = done_tx.send((position, filler.fill(task)));
                });
            }
        });
        drop(done_tx);

        for (_, result) in done_rx.iter().sorted_by_key(|(position, _)| *position) {
            result?;
        }
        Ok(())
    }

    pub fn cache(&self) -> &Arc<SequenceCache> {
        &self.cache
    }

    pub fn recurrence(&self) -> &dyn Recurrence {
        self.recurrence.as_ref()
    }

    pub fn config(&self) -> &ParallelismConfig {
        &self.config
    }

    pub fn gate(&self) -> &InvocationGate {
        &self.gate
    }
}
