//! Listener priorities.
//!
//! Listeners registered on the dispatcher run in priority order; within a
//! bucket, registration order is preserved.

/// Priority bucket for a conversion listener.
///
/// The named buckets cover the usual cases; `Custom` allows slotting a
/// listener anywhere in between (`Normal` ranks as `0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Highest,
    High,
    Normal,
    Low,
    Lowest,
    /// Arbitrary rank; higher runs earlier.
    Custom(i32),
}

impl Priority {
    /// Numeric rank. Higher ranks dispatch first.
    pub fn rank(&self) -> i32 {
        match self {
            Priority::Highest => 100_000,
            Priority::High => 1_000,
            Priority::Normal => 0,
            Priority::Low => -1_000,
            Priority::Lowest => -100_000,
            Priority::Custom(n) => *n,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Highest > Priority::High);
        assert!(Priority::High > Priority::Normal);
        assert!(Priority::Normal > Priority::Low);
        assert!(Priority::Low > Priority::Lowest);
        assert!(Priority::Custom(5) > Priority::Normal);
        assert!(Priority::Custom(-5) < Priority::Normal);
    }

    #[test]
    fn test_custom_rank_equivalence() {
        assert_eq!(Priority::Custom(0).cmp(&Priority::Normal), std::cmp::Ordering::Equal);
    }
}
