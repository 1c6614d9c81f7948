use crate::ports::clock::Clock;
use chrono::{Local, NaiveDate};

/// ホストのローカル日付を返すClock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}
