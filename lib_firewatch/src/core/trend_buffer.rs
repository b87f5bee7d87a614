//! Fixed-depth FIFO of recent aggregate counts, feeding the trend chart.

use std::collections::VecDeque;

/// Depth used by the analytics view.
pub const DEFAULT_TREND_DEPTH: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendBuffer {
    values: VecDeque<u64>,
    depth: usize,
}

impl Default for TrendBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_TREND_DEPTH)
    }
}

impl TrendBuffer {
    pub fn new(depth: usize) -> Self {
        let depth = depth.max(1);
        Self {
            values: VecDeque::with_capacity(depth),
            depth,
        }
    }

    /// Pushes a count, returning the evicted oldest value when over depth.
    pub fn push(&mut self, value: u64) -> Option<u64> {
        let evicted = if self.values.len() == self.depth {
            self.values.pop_front()
        } else {
            None
        };
        self.values.push_back(value);
        evicted
    }

    /// Current contents, oldest first.
    pub fn values(&self) -> Vec<u64> {
        self.values.iter().copied().collect()
    }

    pub fn latest(&self) -> Option<u64> {
        self.values.back().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_evicts_oldest_past_depth() {
        let mut buffer = TrendBuffer::default();
        for v in 0..10 {
            assert_eq!(buffer.push(v), None);
        }
        assert_eq!(buffer.push(10), Some(0));
        assert_eq!(buffer.len(), 10);
        assert_eq!(buffer.values(), (1..=10).collect::<Vec<_>>());
        assert_eq!(buffer.latest(), Some(10));
    }

    #[test]
    fn test_zero_depth_is_clamped() {
        let mut buffer = TrendBuffer::new(0);
        buffer.push(3);
        buffer.push(4);
        assert_eq!(buffer.values(), vec![4]);
    }
}
