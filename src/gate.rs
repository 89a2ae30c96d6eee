use std::sync::atomic::{AtomicUsize, Ordering};

/// Admits concurrent top-level requests against one cache.
///
/// There is no request-level exclusion: overlapping requests may both fill the
/// same range, and the cache's write-once slots keep that harmless. The gate
/// only tracks how many requests are in flight.
#[derive(Debug, Default)]
pub struct InvocationGate {
    in_flight: AtomicUsize,
    admitted: AtomicUsize,
}

/// Held for the lifetime of one request.
#[derive(Debug)]
pub struct GateTicket<'a> {
    gate: &'a InvocationGate,
    pub id: usize,
    /// Requests in flight when this one was admitted, itself included.
    pub concurrent: usize,
}

impl InvocationGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self) -> GateTicket<'_> {
        let id = self.admitted.fetch_add(1, Ordering::SeqCst);
        let concurrent = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        GateTicket {
            gate: self,
            id,
            concurrent,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn admitted(&self) -> usize {
        self.admitted.load(Ordering::SeqCst)
    }
}

impl Drop for GateTicket<'_> {
    fn drop(&mut self) {
        self.gate.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
