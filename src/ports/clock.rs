use chrono::NaiveDate;

/// 「今日」を提供するポート
///
/// 貸出日・返却期限・延滞判定はすべて日付単位で行う。
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}
