/// The two values immediately preceding an index: `[value(i-2), value(i-1)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub older: u64,
    pub newer: u64,
}

impl Window {
    pub fn new(older: u64, newer: u64) -> Self {
        Window { older, newer }
    }

    /// Slide forward by one index once `next` has been computed.
    pub fn advance(self, next: u64) -> Self {
        Window { older: self.newer, newer: next }
    }
}

/// A monotonic recurrence whose value at `i` depends only on the two values before it.
///
/// Implementations must be pure: the cache relies on every caller producing the
/// same value for the same index.
pub trait Recurrence: Send + Sync {
    /// Values at indices 0 and 1.
    fn base(&self) -> [u64; 2];

    /// Value at `index` (always >= 2), or `None` if it overflows `u64`.
    fn next(&self, index: usize, window: Window) -> Option<u64>;

    fn name(&self) -> &str {
        "custom"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Fibonacci;

impl Recurrence for Fibonacci {
    fn base(&self) -> [u64; 2] {
        [0, 1]
    }

    fn next(&self, _index: usize, window: Window) -> Option<u64> {
        window.older.checked_add(window.newer)
    }

    fn name(&self) -> &str {
        "fibonacci"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Lucas;

impl Recurrence for Lucas {
    fn base(&self) -> [u64; 2] {
        [2, 1]
    }

    fn next(&self, _index: usize, window: Window) -> Option<u64> {
        window.older.checked_add(window.newer)
    }

    fn name(&self) -> &str {
        "lucas"
    }
}

/// Adapts a closure into a [`Recurrence`].
pub struct FnRecurrence<F> {
    base: [u64; 2],
    step: F,
}

impl<F> FnRecurrence<F>
where
    F: Fn(usize, Window) -> Option<u64> + Send + Sync,
{
    pub fn new(base: [u64; 2], step: F) -> Self {
        FnRecurrence { base, step }
    }
}

impl<F> Recurrence for FnRecurrence<F>
where
    F: Fn(usize, Window) -> Option<u64> + Send + Sync,
{
    fn base(&self) -> [u64; 2] {
        self.base
    }

    fn next(&self, index: usize, window: Window) -> Option<u64> {
        (self.step)(index, window)
    }
}
