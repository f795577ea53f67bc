use crate::game::GameRecord;
use serde::Serialize;
use std::fmt;

/// A game with no deposit, claim or recovery for this long is stale.
pub const STALE_AFTER_SECS: u64 = 60 * 60 * 24 * 30;

/// Lifecycle label derived on every read. Depends on the wall clock, so it
/// must never outlive a single render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameStatus {
    Active,
    Ended,
    Stale,
}

impl GameStatus {
    pub fn classify(record: &GameRecord, now: u64) -> Self {
        if record.ended {
            return GameStatus::Ended;
        }
        if now.saturating_sub(record.last_updated_at) >= STALE_AFTER_SECS {
            return GameStatus::Stale;
        }
        GameStatus::Active
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GameStatus::Active => "Active",
            GameStatus::Ended => "Ended",
            GameStatus::Stale => "Stale",
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use crate::game::sample_record;

    const NOW: u64 = 1_800_000_000;

    fn updated_ago(secs: u64, ended: bool) -> GameRecord {
        let mut record = sample_record(3);
        record.last_updated_at = NOW - secs;
        record.ended = ended;
        record
    }

    #[test]
    fn classify__exactly_thirty_days__is_stale() {
        let record = updated_ago(2_592_000, false);
        assert_eq!(GameStatus::classify(&record, NOW), GameStatus::Stale);
    }

    #[test]
    fn classify__past_thirty_days__is_stale() {
        let record = updated_ago(2_592_001, false);
        assert_eq!(GameStatus::classify(&record, NOW), GameStatus::Stale);
    }

    #[test]
    fn classify__just_under_thirty_days__is_active() {
        let record = updated_ago(2_591_999, false);
        assert_eq!(GameStatus::classify(&record, NOW), GameStatus::Active);
    }

    #[test]
    fn classify__ended__overrides_any_timestamp() {
        for secs in [0, 10, 2_591_999, 2_592_000, 90_000_000] {
            let record = updated_ago(secs, true);
            assert_eq!(GameStatus::classify(&record, NOW), GameStatus::Ended);
        }
    }

    #[test]
    fn classify__update_in_the_future__is_active() {
        let mut record = sample_record(3);
        record.last_updated_at = NOW + 100;
        assert_eq!(GameStatus::classify(&record, NOW), GameStatus::Active);
    }

    #[test]
    fn classify__same_record_later__can_turn_stale() {
        let record = updated_ago(10, false);
        assert_eq!(GameStatus::classify(&record, NOW), GameStatus::Active);
        assert_eq!(
            GameStatus::classify(&record, NOW + STALE_AFTER_SECS),
            GameStatus::Stale
        );
    }
}
