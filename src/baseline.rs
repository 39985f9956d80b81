use std::collections::VecDeque;

/// Sliding window over the good-match counts of recent evaluated frames.
///
/// The window spans the last `capacity` *evaluated* frames, not wall-clock
/// frames; the tracker has no notion of frame index.
#[derive(Debug, Clone)]
pub struct MatchBaseline {
    window: VecDeque<usize>,
    capacity: usize,
}

impl MatchBaseline {
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "baseline window length must be positive");
        Self {
            window: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Appends a count, evicting the oldest entry once the window is full,
    /// and returns the arithmetic mean of the entries currently held.
    ///
    /// A mean of exactly 0 is reported as 1 so callers can divide by it.
    pub fn observe(&mut self, count: usize) -> f64 {
        self.window.push_back(count);
        if self.window.len() > self.capacity {
            self.window.pop_front();
        }
        let sum: usize = self.window.iter().sum();
        let average = sum as f64 / self.window.len() as f64;
        if average == 0.0 { 1.0 } else { average }
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_never_exceeds_capacity() {
        let mut baseline = MatchBaseline::with_capacity(3);
        for i in 0..10 {
            baseline.observe(i);
            assert!(baseline.len() <= 3);
        }
        assert_eq!(baseline.len(), 3);
    }

    #[test]
    fn evicts_oldest_first() {
        let mut baseline = MatchBaseline::with_capacity(3);
        baseline.observe(10);
        baseline.observe(10);
        baseline.observe(10);
        // 10 falls out, window is [10, 10, 2]
        let average = baseline.observe(2);
        assert!((average - 22.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn zero_mean_reported_as_one() {
        let mut baseline = MatchBaseline::with_capacity(5);
        assert_eq!(baseline.observe(0), 1.0);
        assert_eq!(baseline.observe(0), 1.0);
    }
}
