use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{BookCopyId, CheckoutId, ReturnCheckoutError, UserId};

/// 貸出期間（日数）
pub const LOAN_PERIOD_DAYS: i64 = 14;

/// 1日あたりの延滞料金（0.50）
pub const LATE_FEE_PER_DAY: Decimal = Decimal::from_parts(50, 0, 0, false, 2);

/// 貸出の状態
///
/// OPEN → RETURNED の一方向のみ。RETURNEDは終端状態。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStatus {
    /// 貸出中
    Open,
    /// 返却済み
    Returned,
}

impl CheckoutStatus {
    pub fn from_is_returned(is_returned: bool) -> Self {
        if is_returned {
            CheckoutStatus::Returned
        } else {
            CheckoutStatus::Open
        }
    }

    pub fn is_returned(&self) -> bool {
        matches!(self, CheckoutStatus::Returned)
    }
}

/// Checkout集約 - 1冊のコピーの1回の貸出
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkout {
    pub checkout_id: CheckoutId,
    pub book_copy_id: BookCopyId,
    pub user_id: UserId,
    pub checkout_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub late_fee: Option<Decimal>,
    pub is_returned: bool,
}

impl Checkout {
    pub fn status(&self) -> CheckoutStatus {
        CheckoutStatus::from_is_returned(self.is_returned)
    }
}

/// 新規貸出（まだIDが採番されていない）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCheckout {
    pub book_copy_id: BookCopyId,
    pub user_id: UserId,
    pub checkout_date: NaiveDate,
    pub due_date: NaiveDate,
}

/// 返却時に確定する値
///
/// late_feeは返却時に一度だけ計算され、以後変更されない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutReturn {
    pub return_date: NaiveDate,
    pub days_overdue: i64,
    pub late_fee: Decimal,
}

/// 純粋関数：貸出を作成する
///
/// ビジネスルール：
/// - 貸出日は当日
/// - 返却期限は貸出日 + 14日
pub fn open_checkout(book_copy_id: BookCopyId, user_id: UserId, today: NaiveDate) -> NewCheckout {
    NewCheckout {
        book_copy_id,
        user_id,
        checkout_date: today,
        due_date: today + Duration::days(LOAN_PERIOD_DAYS),
    }
}

/// 純粋関数：延滞日数
///
/// 期限当日以前の返却は0日。
pub fn days_overdue(due_date: NaiveDate, on: NaiveDate) -> i64 {
    on.signed_duration_since(due_date).num_days().max(0)
}

/// 純粋関数：延滞料金
pub fn late_fee(days_overdue: i64) -> Decimal {
    Decimal::from(days_overdue.max(0)) * LATE_FEE_PER_DAY
}

/// 純粋関数：書籍を返却する
///
/// ビジネスルール：
/// - 返却済みの貸出は返却できない
/// - 延滞していても返却は受け付ける（料金を計算する）
pub fn return_checkout(
    checkout: &Checkout,
    today: NaiveDate,
) -> Result<CheckoutReturn, ReturnCheckoutError> {
    if checkout.status().is_returned() {
        return Err(ReturnCheckoutError::AlreadyReturned);
    }

    let days = days_overdue(checkout.due_date, today);

    Ok(CheckoutReturn {
        return_date: today,
        days_overdue: days,
        late_fee: late_fee(days),
    })
}

/// 返却結果を貸出に適用した新しい状態を返す
pub fn apply_return(checkout: &Checkout, returned: &CheckoutReturn) -> Checkout {
    Checkout {
        return_date: Some(returned.return_date),
        late_fee: Some(returned.late_fee),
        is_returned: true,
        ..checkout.clone()
    }
}

/// 純粋関数：延滞判定
///
/// 返却期限が今日より前（当日は含まない）の貸出中のものが延滞。
pub fn is_overdue(checkout: &Checkout, today: NaiveDate) -> bool {
    !checkout.status().is_returned() && checkout.due_date < today
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn open_checkout_due(due_date: NaiveDate) -> Checkout {
        Checkout {
            checkout_id: CheckoutId::new(1),
            book_copy_id: BookCopyId::new(1),
            user_id: UserId::new(1),
            checkout_date: due_date - Duration::days(LOAN_PERIOD_DAYS),
            due_date,
            return_date: None,
            late_fee: None,
            is_returned: false,
        }
    }

    #[test]
    fn test_open_checkout_sets_due_date_fourteen_days_out() {
        let today = date(2025, 3, 1);
        let new_checkout = open_checkout(BookCopyId::new(7), UserId::new(3), today);

        assert_eq!(new_checkout.checkout_date, today);
        assert_eq!(new_checkout.due_date, date(2025, 3, 15));
        assert_eq!(new_checkout.book_copy_id, BookCopyId::new(7));
        assert_eq!(new_checkout.user_id, UserId::new(3));
    }

    #[test]
    fn test_open_checkout_crosses_month_boundary() {
        let new_checkout = open_checkout(BookCopyId::new(1), UserId::new(1), date(2024, 2, 20));
        assert_eq!(new_checkout.due_date, date(2024, 3, 5));
    }

    #[test]
    fn test_late_fee_zero_days() {
        assert_eq!(late_fee(0), dec!(0.00));
    }

    #[test]
    fn test_late_fee_five_days() {
        assert_eq!(late_fee(5), dec!(2.50));
    }

    #[test]
    fn test_late_fee_ignores_negative_days() {
        assert_eq!(late_fee(-4), dec!(0));
    }

    #[test]
    fn test_days_overdue_early_return_is_zero() {
        let due = date(2025, 3, 15);
        assert_eq!(days_overdue(due, date(2025, 3, 1)), 0);
        assert_eq!(days_overdue(due, due), 0);
        assert_eq!(days_overdue(due, date(2025, 3, 16)), 1);
    }

    #[test]
    fn test_return_checkout_on_time() {
        let due = date(2025, 3, 15);
        let checkout = open_checkout_due(due);

        let returned = return_checkout(&checkout, date(2025, 3, 10)).unwrap();
        assert_eq!(returned.days_overdue, 0);
        assert_eq!(returned.late_fee, dec!(0));
        assert_eq!(returned.return_date, date(2025, 3, 10));
    }

    #[test]
    fn test_return_checkout_ten_days_late() {
        let today = date(2025, 3, 25);
        let checkout = open_checkout_due(today - Duration::days(10));

        let returned = return_checkout(&checkout, today).unwrap();
        assert_eq!(returned.days_overdue, 10);
        assert_eq!(returned.late_fee, dec!(5.00));
    }

    #[test]
    fn test_return_checkout_fails_when_already_returned() {
        let today = date(2025, 3, 25);
        let checkout = open_checkout_due(today);
        let first = return_checkout(&checkout, today).unwrap();
        let returned = apply_return(&checkout, &first);

        assert_eq!(returned.status(), CheckoutStatus::Returned);
        assert_eq!(
            return_checkout(&returned, today + Duration::days(3)).unwrap_err(),
            ReturnCheckoutError::AlreadyReturned
        );
    }

    #[test]
    fn test_apply_return_freezes_fee_and_date() {
        let today = date(2025, 3, 25);
        let checkout = open_checkout_due(today - Duration::days(2));
        let returned = return_checkout(&checkout, today).unwrap();

        let updated = apply_return(&checkout, &returned);
        assert!(updated.is_returned);
        assert_eq!(updated.return_date, Some(today));
        assert_eq!(updated.late_fee, Some(dec!(1.00)));
        assert_eq!(updated.due_date, checkout.due_date);
    }

    #[test]
    fn test_is_overdue_excludes_due_today() {
        let today = date(2025, 3, 25);
        assert!(!is_overdue(&open_checkout_due(today), today));
        assert!(is_overdue(&open_checkout_due(today - Duration::days(1)), today));
    }

    #[test]
    fn test_is_overdue_false_once_returned() {
        let today = date(2025, 3, 25);
        let checkout = open_checkout_due(today - Duration::days(5));
        let returned = apply_return(&checkout, &return_checkout(&checkout, today).unwrap());
        assert!(!is_overdue(&returned, today));
    }
}
