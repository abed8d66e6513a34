/// Resume point for downloads.
///
/// Starts unset and only moves forward, to one past the highest record
/// index seen so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncCursor(i64);

impl SyncCursor {
    /// Value sent before any record has been seen.
    pub const UNSET: i64 = -1;

    pub fn new() -> Self {
        Self(Self::UNSET)
    }

    pub fn value(self) -> i64 {
        self.0
    }

    pub fn is_unset(self) -> bool {
        self.0 == Self::UNSET
    }

    /// Records that `index` has been consumed.
    pub fn observe(&mut self, index: i64) {
        if self.0 <= index {
            self.0 = index.saturating_add(1);
        }
    }
}

impl Default for SyncCursor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unset() {
        let cursor = SyncCursor::default();
        assert!(cursor.is_unset());
        assert_eq!(cursor.value(), -1);
    }

    #[test]
    fn never_moves_backwards() {
        let mut cursor = SyncCursor::new();
        for index in [5, 7, 6] {
            cursor.observe(index);
        }
        assert_eq!(cursor.value(), 8);

        cursor.observe(2);
        assert_eq!(cursor.value(), 8);
        cursor.observe(8);
        assert_eq!(cursor.value(), 9);
    }

    #[test]
    fn first_record_zero() {
        let mut cursor = SyncCursor::new();
        cursor.observe(0);
        assert_eq!(cursor.value(), 1);
    }
}
