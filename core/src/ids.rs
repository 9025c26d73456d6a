use std::time::{SystemTime, UNIX_EPOCH};

use crate::document::DocumentId;

/// Hands out document ids derived from the wall clock in milliseconds.
///
/// Two inserts landing in the same millisecond would collide on the raw clock
/// value, so the generator never returns an id lower than or equal to the last
/// one it produced.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    last: DocumentId,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> DocumentId {
        self.next_id_at(now_millis())
    }

    pub fn last_id(&self) -> Option<DocumentId> {
        (self.last > 0).then_some(self.last)
    }

    fn next_id_at(&mut self, clock_ms: u64) -> DocumentId {
        let id = if clock_ms > self.last {
            clock_ms
        } else {
            self.last.saturating_add(1)
        };
        self.last = id;
        id
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
        .min(u64::MAX as u128) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_the_clock_when_it_moves_forward() {
        let mut ids = IdGenerator::new();
        assert_eq!(ids.last_id(), None);
        assert_eq!(ids.next_id_at(1_000), 1_000);
        assert_eq!(ids.next_id_at(2_500), 2_500);
        assert_eq!(ids.last_id(), Some(2_500));
    }

    #[test]
    fn ids_stay_strictly_increasing_within_one_tick() {
        let mut ids = IdGenerator::new();
        assert_eq!(ids.next_id_at(1_000), 1_000);
        assert_eq!(ids.next_id_at(1_000), 1_001);
        assert_eq!(ids.next_id_at(999), 1_002);
        assert_eq!(ids.next_id_at(1_500), 1_500);
    }

    #[test]
    fn a_stopped_clock_still_yields_positive_ids() {
        let mut ids = IdGenerator::new();
        assert_eq!(ids.next_id_at(0), 1);
        assert_eq!(ids.next_id_at(0), 2);
    }

    #[test]
    fn wall_clock_ids_are_unique_under_rapid_inserts() {
        let mut ids = IdGenerator::new();
        let generated: Vec<DocumentId> = (0..1_000).map(|_| ids.next_id()).collect();
        assert!(generated.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(generated[0] > 0);
    }
}
