//! Per-game record of when active play began at each level

use serde::{Deserialize, Serialize};

use super::{HistoryError, RingBuffer};

/// Default number of entries kept for one game
pub const DEFAULT_INPUT_HISTORY_CAPACITY: usize = 1000;

/// Level and tick at which a piece became controllable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InputHistoryElement {
    pub level: i32,
    pub tick: i32,
}

/// Input history for the game in progress. Cleared whenever the run state
/// is reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputHistory {
    buffer: RingBuffer<InputHistoryElement>,
}

impl Default for InputHistory {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_HISTORY_CAPACITY)
    }
}

impl InputHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: RingBuffer::new(capacity),
        }
    }

    pub fn push(&mut self, level: i32, tick: i32) {
        self.buffer.push(InputHistoryElement { level, tick });
    }

    pub fn get(&self, index: usize) -> Result<&InputHistoryElement, HistoryError> {
        self.buffer.get(index)
    }

    pub fn count(&self) -> usize {
        self.buffer.count()
    }

    pub fn total_pushes(&self) -> usize {
        self.buffer.total_pushes()
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Live entries, oldest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &InputHistoryElement> + '_ {
        self.buffer.iter()
    }

    /// The `n` most recent entries, oldest first. Shorter if fewer are live.
    pub fn recent(&self, n: usize) -> Vec<InputHistoryElement> {
        let mut recent: Vec<_> = self.buffer.iter().rev().take(n).copied().collect();
        recent.reverse();
        recent
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}
