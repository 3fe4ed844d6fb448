//! Fixed-capacity window of integrated error samples.

/// Number of samples the integral term looks back over
pub const HISTORY_CAPACITY: usize = 100;

/// Ring buffer holding the last [`HISTORY_CAPACITY`] samples, zero-filled at
/// start.
///
/// Insert and evict are O(1). The sum is taken over the stored samples,
/// most recent first, after every push so it always equals a straight sum of
/// the window.
#[derive(Clone, Debug, PartialEq)]
pub struct ErrorWindow {
    samples: [f64; HISTORY_CAPACITY],
    /// Slot the next sample is written to (holds the oldest sample)
    head: usize,
    sum: f64,
}

impl Default for ErrorWindow {
    fn default() -> Self {
        Self {
            samples: [0.0; HISTORY_CAPACITY],
            head: 0,
            sum: 0.0,
        }
    }
}

impl ErrorWindow {
    /// Inserts a sample as the most recent one and returns the evicted oldest sample
    pub fn push(&mut self, sample: f64) -> f64 {
        let evicted = std::mem::replace(&mut self.samples[self.head], sample);
        self.head = (self.head + 1) % HISTORY_CAPACITY;
        self.sum = self.iter().fold(0.0, |acc, s| acc + s);
        evicted
    }

    /// Sum of the samples currently in the window
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Most recent sample
    pub fn latest(&self) -> f64 {
        self.samples[(self.head + HISTORY_CAPACITY - 1) % HISTORY_CAPACITY]
    }

    /// Samples ordered most-recent-first
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        (1..=HISTORY_CAPACITY)
            .map(move |back| self.samples[(self.head + HISTORY_CAPACITY - back) % HISTORY_CAPACITY])
    }
}
