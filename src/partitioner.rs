use std::fmt;

/// Inclusive index range filled sequentially by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub start: usize,
    pub end: usize,
}

impl Chunk {
    /// Number of indices covered; at least 1.
    pub fn size(&self) -> usize {
        self.end - self.start + 1
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..={}]", self.start, self.end)
    }
}

pub struct RangePartitioner;

impl RangePartitioner {
    /// Split `[first_missing, target]` into at most `parallelism` contiguous chunks
    /// of `ceil(len / parallelism)` entries, in increasing index order.
    ///
    /// The last emitted chunk always ends at `target`. Returns no chunks when
    /// `first_missing > target`. Chunks that would start past `target` are not
    /// emitted, so every chunk is non-empty. `parallelism` must be validated by
    /// the caller; zero yields no chunks.
    pub fn partition(first_missing: usize, target: usize, parallelism: usize) -> Vec<Chunk> {
        if first_missing > target || parallelism == 0 {
            return Vec::new();
        }

        let total = target - first_missing + 1;
        let chunk_size = total.div_ceil(parallelism);
        let mut chunks = Vec::with_capacity(parallelism.min(total));

        for i in 0..parallelism {
            let start = first_missing + chunk_size * i;
            if start > target {
                break;
            }
            let end = if i == parallelism - 1 {
                target
            } else {
                (start + chunk_size - 1).min(target)
            };
            chunks.push(Chunk { start, end });
        }

        chunks
    }
}
