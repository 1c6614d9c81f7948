use crate::ports::clock::Clock;
use chrono::{Duration, NaiveDate};
use std::sync::{Mutex, PoisonError};

/// Clockのモック実装
///
/// 固定の日付を返す。テストから日付を進められる。
pub struct FixedClock {
    today: Mutex<NaiveDate>,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: Mutex::new(today),
        }
    }

    pub fn set(&self, today: NaiveDate) {
        *self.today.lock().unwrap_or_else(PoisonError::into_inner) = today;
    }

    pub fn advance_days(&self, days: i64) {
        let mut today = self.today.lock().unwrap_or_else(PoisonError::into_inner);
        *today += Duration::days(days);
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.today.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
