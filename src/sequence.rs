/// Arithmetic of one auto-increment sequence.
///
/// A counter stores the last value it issued. An empty counter issues `start_at`
/// first; every later value is the previous one plus `increment_by`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sequence {
    pub start_at: i64,
    pub increment_by: i64,
}

impl Sequence {
    pub fn new(start_at: i64, increment_by: i64) -> Self {
        Self {
            start_at,
            increment_by,
        }
    }

    pub fn starting_from(start_at: i64) -> Self {
        Self {
            start_at,
            ..Self::default()
        }
    }

    /// The value issued after a counter that last issued `count`.
    /// `None` means the counter does not exist yet. Returns `None` on overflow.
    pub fn next_after(&self, count: Option<i64>) -> Option<i64> {
        match count {
            Some(count) => count.checked_add(self.increment_by),
            None => Some(self.start_at),
        }
    }

    /// The stored count that makes the next issued value equal `start_at`.
    pub fn seed(&self) -> Option<i64> {
        self.start_at.checked_sub(self.increment_by)
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new(0, 1)
    }
}
