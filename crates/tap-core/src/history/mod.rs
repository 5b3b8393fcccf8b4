//! Fixed-capacity histories
//!
//! Both histories share [`RingBuffer`]: a fixed number of slots, a write
//! cursor, a saturating live count and a monotonic push count. Reads are by
//! *logical* index, i.e. the push number of the element, so an index keeps
//! meaning the same element until it is evicted.

mod game;
mod input;

pub use game::{
    CarnivalWeights, DemoSignature, GameHistory, GameHistoryElement, MAX_GAME_HISTORY_COUNT,
};
pub use input::{DEFAULT_INPUT_HISTORY_CAPACITY, InputHistory, InputHistoryElement};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by history operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("history index {index} is outside the live window [{oldest}, {end})")]
    OutOfRange { index: usize, oldest: usize, end: usize },

    #[error("demo window {window} must be between 1 and the sequence length {len}")]
    InvalidDemoWindow { window: usize, len: usize },

    #[error("inconsistent ring buffer: {0}")]
    Inconsistent(String),
}

/// Serialized form of [`RingBuffer`], checked before it is accepted
#[derive(Deserialize)]
struct RawRingBuffer<T> {
    slots: Vec<T>,
    capacity: usize,
    cursor: usize,
    size: usize,
    total_pushes: usize,
}

impl<T> TryFrom<RawRingBuffer<T>> for RingBuffer<T> {
    type Error = HistoryError;

    fn try_from(raw: RawRingBuffer<T>) -> Result<Self, Self::Error> {
        let RawRingBuffer {
            slots,
            capacity,
            cursor,
            size,
            total_pushes,
        } = raw;
        let stored = slots.len();

        let problem = if capacity == 0 {
            Some("zero capacity".to_string())
        } else if stored > capacity {
            Some(format!("{stored} slots for capacity {capacity}"))
        } else if cursor >= capacity {
            Some(format!("cursor {cursor} past capacity {capacity}"))
        } else if size > stored || size > total_pushes {
            Some(format!("size {size} with {stored} slots and {total_pushes} pushes"))
        } else if stored < capacity && (cursor != stored || size != stored) {
            // Not wrapped yet: the cursor and size both follow the slot count.
            Some(format!("cursor {cursor} and size {size} with {stored} of {capacity} slots"))
        } else {
            None
        };

        match problem {
            Some(problem) => Err(HistoryError::Inconsistent(problem)),
            None => Ok(Self {
                slots,
                capacity,
                cursor,
                size,
                total_pushes,
            }),
        }
    }
}

/// Ring buffer with separate "ever pushed" and "currently live" counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRingBuffer<T>")]
pub struct RingBuffer<T> {
    slots: Vec<T>,
    capacity: usize,
    /// Next slot to write
    cursor: usize,
    /// Live elements, saturating at `capacity`
    size: usize,
    /// Every push ever made, never decreases
    total_pushes: usize,
}

impl<T> RingBuffer<T> {
    /// Create an empty buffer. A zero capacity is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            cursor: 0,
            size: 0,
            total_pushes: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live elements
    pub fn count(&self) -> usize {
        self.size
    }

    /// Number of pushes since creation (or since the last reset)
    pub fn total_pushes(&self) -> usize {
        self.total_pushes
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Logical index of the oldest live element
    pub fn oldest_index(&self) -> usize {
        self.total_pushes - self.size
    }

    /// Append an element, evicting the oldest one once full
    pub fn push(&mut self, element: T) {
        if self.slots.len() < self.capacity {
            self.slots.push(element);
        } else {
            self.slots[self.cursor] = element;
        }
        self.cursor = (self.cursor + 1) % self.capacity;
        self.total_pushes += 1;
        if self.size < self.capacity {
            self.size += 1;
        }
    }

    /// Element at logical position `index`.
    ///
    /// `index` must lie in `[total_pushes - count, total_pushes)`.
    pub fn get(&self, index: usize) -> Result<&T, HistoryError> {
        let oldest = self.oldest_index();
        let end = self.total_pushes;
        if index < oldest || index >= end {
            return Err(HistoryError::OutOfRange { index, oldest, end });
        }
        let offset = index - oldest;
        let slot = (self.cursor + self.capacity - self.size + offset) % self.capacity;
        self.slots
            .get(slot)
            .ok_or(HistoryError::OutOfRange { index, oldest, end })
    }

    /// Most recently pushed element
    pub fn latest(&self) -> Option<&T> {
        self.total_pushes
            .checked_sub(1)
            .and_then(|index| self.get(index).ok())
    }

    /// Live elements, oldest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        let start = self.cursor + self.capacity - self.size;
        (0..self.size).filter_map(move |offset| self.slots.get((start + offset) % self.capacity))
    }

    /// Drop every element and zero both counters
    pub fn clear(&mut self) {
        self.slots.clear();
        self.cursor = 0;
        self.size = 0;
        self.total_pushes = 0;
    }
}
