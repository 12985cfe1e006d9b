//! Sequential identifier generation
//!
//! `IdGenerator` hands out message ids and state references from a bounded
//! range. It keeps a FIFO "bank" of contiguous candidates and only touches
//! the replenishment path once every `threshold` calls, which keeps the
//! common call to a single `pop_front`.

use crate::Handle;
use rand::Rng;
use std::collections::VecDeque;
use std::fmt;

/// Default upper bound (exclusive) for message ids and state references
pub const DEFAULT_MAXIMUM: u32 = 0xFF_FFFF;

/// Default bank size
pub const DEFAULT_INCREMENT: u32 = 256;

/// Bounded sequential identifier generator
///
/// # Algorithm
/// - The bank starts as `increment` contiguous values beginning at a random
///   offset in `[0, maximum - increment)`.
/// - Each call pops the oldest value. When that value is a multiple of
///   `threshold = increment / 2` and the bank is below `increment`, a fresh
///   run of `threshold` values is appended. The run continues after the last
///   appended value modulo `maximum`.
///
/// # Uniqueness
/// Returned values follow each other modulo `maximum`, so any `increment`
/// consecutive values are distinct. This is not a global uniqueness
/// guarantee: the caches reject collisions with `CacheError::DuplicateHandle`,
/// and callers retry with a fresh id.
pub struct IdGenerator {
    maximum: u32,
    increment: u32,
    threshold: u32,
    bank: VecDeque<u32>,
    // next value to append, always below `maximum`
    next: u32,
}

impl IdGenerator {
    /// Create a generator with a random starting offset
    ///
    /// `increment` is clamped to `maximum`.
    ///
    /// # Panics
    /// Panics if `maximum` is 0.
    pub fn new(maximum: u32, increment: u32) -> Self {
        assert!(maximum > 0, "IdGenerator maximum must be positive");
        let increment = increment.clamp(1, maximum);
        let span = maximum - increment;
        let offset = if span == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..span)
        };
        Self::starting_at(maximum, increment, offset)
    }

    /// Create a generator whose bank starts at a fixed offset
    ///
    /// The offset is reduced into `[0, maximum - increment]`.
    pub fn starting_at(maximum: u32, increment: u32, offset: u32) -> Self {
        assert!(maximum > 0, "IdGenerator maximum must be positive");
        let increment = increment.clamp(1, maximum);
        let offset = offset.min(maximum - increment);
        let threshold = (increment / 2).max(1);
        let end = offset + increment;
        Self {
            maximum,
            increment,
            threshold,
            bank: (offset..end).collect(),
            next: end % maximum,
        }
    }

    /// Return the next identifier
    pub fn next_id(&mut self) -> Handle {
        let value = match self.bank.pop_front() {
            Some(value) => value,
            None => {
                self.append_run();
                return self.next_id();
            }
        };

        if value % self.threshold == 0 && self.bank.len() < self.increment as usize {
            self.append_run();
            log::trace!(
                "IdGenerator replenished bank at {} ({} candidates)",
                value,
                self.bank.len()
            );
        }
        value
    }

    fn append_run(&mut self) {
        for _ in 0..self.threshold {
            self.bank.push_back(self.next);
            self.next = (self.next + 1) % self.maximum;
        }
    }

    /// Exclusive upper bound of generated values
    pub fn maximum(&self) -> u32 {
        self.maximum
    }

    /// Effective bank size after clamping
    pub fn increment(&self) -> u32 {
        self.increment
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_MAXIMUM, DEFAULT_INCREMENT)
    }
}

impl fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdGenerator({}, {})", self.maximum, self.increment)
    }
}
