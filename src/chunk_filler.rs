use crate::partitioner::Chunk;
use crate::recurrence::{Recurrence, Window};
use crate::sequence_cache::{SequenceCache, Slot};
use crate::MemoError;
use crossbeam_channel::{Receiver, Sender};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, warn};

/// Where a chunk gets the two values preceding its first index.
#[derive(Debug)]
pub enum WindowSource {
    /// Read from the cache when the request was dispatched.
    Ready(Window),
    /// Handed over by the previous chunk once it finishes.
    Handoff(Receiver<Window>),
}

/// One chunk plus its wiring to its neighbours.
#[derive(Debug)]
pub struct ChunkTask {
    pub chunk: Chunk,
    inbound: WindowSource,
    outbound: Option<Sender<Window>>,
}

impl ChunkTask {
    /// Wire `chunks` into a hand-off chain.
    ///
    /// The first chunk's window is read from `cache` now; it fails with
    /// `DependencyHazard` if either predecessor is missing. Every later chunk
    /// receives the tail of the chunk before it.
    pub fn plan(chunks: &[Chunk], cache: &SequenceCache) -> Result<Vec<ChunkTask>, MemoError> {
        let Some(first) = chunks.first() else {
            return Ok(Vec::new());
        };

        let mut inbound = WindowSource::Ready(window_from_cache(first.start, cache)?);
        let mut tasks = Vec::with_capacity(chunks.len());

        for (i, chunk) in chunks.iter().enumerate() {
            let (outbound, next_inbound) = if i + 1 < chunks.len() {
                let (tx, rx) = crossbeam_channel::bounded(1);
                (Some(tx), Some(WindowSource::Handoff(rx)))
            } else {
                (None, None)
            };

            tasks.push(ChunkTask {
                chunk: *chunk,
                inbound,
                outbound,
            });

            match next_inbound {
                Some(next) => inbound = next,
                None => break,
            }
        }

        Ok(tasks)
    }
}

fn window_from_cache(start: usize, cache: &SequenceCache) -> Result<Window, MemoError> {
    if start < 2 {
        return Err(MemoError::DependencyHazard {
            index: start,
            reason: "base indices are seeded, not filled".to_string(),
        });
    }
    let missing = |index: usize| MemoError::DependencyHazard {
        index: start,
        reason: format!("predecessor index {} missing from cache at dispatch", index),
    };
    let older = cache.get(start - 2)?.ok_or_else(|| missing(start - 2))?;
    let newer = cache.get(start - 1)?.ok_or_else(|| missing(start - 1))?;
    Ok(Window::new(older, newer))
}

/// Fills chunks of one request against a shared cache.
pub struct ChunkFiller<'a> {
    cache: &'a SequenceCache,
    recurrence: &'a dyn Recurrence,
    newly_computed: &'a AtomicUsize,
}

impl<'a> ChunkFiller<'a> {
    pub fn new(
        cache: &'a SequenceCache,
        recurrence: &'a dyn Recurrence,
        newly_computed: &'a AtomicUsize,
    ) -> Self {
        ChunkFiller {
            cache,
            recurrence,
            newly_computed,
        }
    }

    /// Fill every index of the task's chunk in order, then pass the chunk's tail on.
    ///
    /// Indices already in the cache are reused as-is. Returns the number of
    /// entries this chunk computed. On failure the outbound sender is dropped
    /// unsent, which fails the next chunk with a hazard instead of letting it
    /// read a missing value.
    pub fn fill(&self, task: ChunkTask) -> Result<usize, MemoError> {
        let ChunkTask {
            chunk,
            inbound,
            outbound,
        } = task;

        let mut window = match inbound {
            WindowSource::Ready(window) => window,
            WindowSource::Handoff(rx) => rx.recv().map_err(|_| {
                warn!(chunk = %chunk, "Predecessor chunk aborted before handing off");
                MemoError::DependencyHazard {
                    index: chunk.start,
                    reason: format!("chunk ending at {} aborted", chunk.start - 1),
                }
            })?,
        };

        debug!(chunk = %chunk, size = chunk.size(), "Filling chunk");
        let mut computed = 0;
        for index in chunk.start..=chunk.end {
            let slot = self.cache.fill_with(index, || self.step(index, window))?;
            if let Slot::Computed(_) = slot {
                computed += 1;
                self.newly_computed.fetch_add(1, Ordering::Relaxed);
            }
            window = window.advance(slot.value());
        }

        if let Some(tx) = outbound {
            // The receiver only goes away if its task was dropped unrun.
            if tx.send(window).is_err() {
                debug!(chunk = %chunk, "Successor chunk no longer listening");
            }
        }

        debug!(chunk = %chunk, computed, "Chunk done");
        Ok(computed)
    }

    /// One application of the recurrence. A panic inside user code is caught
    /// here and reported like any other failure at `index`.
    fn step(&self, index: usize, window: Window) -> Result<u64, MemoError> {
        panic::catch_unwind(AssertUnwindSafe(|| self.recurrence.next(index, window)))
            .map_err(|payload| {
                let message = panic_message(payload.as_ref());
                warn!(index, recurrence = self.recurrence.name(), "Recurrence panicked: {}", message);
                MemoError::RecurrencePanicked { index, message }
            })?
            .ok_or(MemoError::Overflow { index })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
