use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::{CopyNumber, Isbn};

/// 貸出操作の結果
///
/// 不変条件：due_dateは成功時のみ存在する。
/// コンストラクタ経由でのみ生成できる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutOutcome {
    success: bool,
    message: String,
    due_date: Option<NaiveDate>,
}

impl CheckoutOutcome {
    pub fn succeeded(message: impl Into<String>, due_date: NaiveDate) -> Self {
        Self {
            success: true,
            message: message.into(),
            due_date: Some(due_date),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            due_date: None,
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }
}

/// 返却操作の結果
///
/// 失敗時は料金・日数ともに0。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReturnOutcome {
    success: bool,
    late_fee: Decimal,
    days_overdue: i64,
}

impl ReturnOutcome {
    pub fn succeeded(late_fee: Decimal, days_overdue: i64) -> Self {
        Self {
            success: true,
            late_fee,
            days_overdue,
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            late_fee: Decimal::ZERO,
            days_overdue: 0,
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn late_fee(&self) -> Decimal {
        self.late_fee
    }

    pub fn days_overdue(&self) -> i64 {
        self.days_overdue
    }
}

/// 利用者の貸出中一覧の1行
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutListing {
    pub isbn: Isbn,
    pub title: String,
    pub copy_number: CopyNumber,
    pub checkout_date: NaiveDate,
    pub due_date: NaiveDate,
}
