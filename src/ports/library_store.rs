use crate::domain::{
    BookCopyDetails, BookCopyId, CheckoutId, CheckoutListing, CopyNumber, Isbn,
    LibraryCardNumber, UserId,
    checkout::{Checkout, CheckoutReturn, NewCheckout},
};
use async_trait::async_trait;
use chrono::NaiveDate;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 貸出行の挿入結果
///
/// 「1コピーにつき貸出中は最大1件」の一意制約に違反した場合は
/// エラーではなく`CopyAlreadyCheckedOut`として報告される。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertCheckout {
    Inserted(CheckoutId),
    CopyAlreadyCheckedOut,
}

/// 図書館ストアポート（Storage Gateway）
///
/// 読み取り専用の単発クエリと、複数文の業務操作をまとめる
/// トランザクションの開始を提供する。
/// 業務ルールは持たない。
#[async_trait]
pub trait LibraryStore: Send + Sync {
    /// トランザクションを開始する
    ///
    /// `commit`せずにドロップした場合はロールバックされる。
    async fn begin(&self) -> Result<Box<dyn LibraryTransaction>>;

    /// 利用者の延滞中（due_date < today かつ未返却）の貸出件数
    async fn count_overdue_checkouts(
        &self,
        card_number: LibraryCardNumber,
        today: NaiveDate,
    ) -> Result<i64>;

    /// 利用者の貸出中一覧（返却期限の昇順）
    async fn find_open_checkouts_for_user(
        &self,
        card_number: LibraryCardNumber,
    ) -> Result<Vec<CheckoutListing>>;

    /// 貸出中でないコピー番号の一覧（昇順）
    async fn find_available_copy_numbers(&self, isbn: &Isbn) -> Result<Vec<CopyNumber>>;
}

/// 1つの業務操作の単位となるトランザクション
///
/// `lock_*`系のメソッドは対象行をトランザクション終了までロックする。
#[async_trait]
pub trait LibraryTransaction: Send {
    async fn count_overdue_checkouts(
        &mut self,
        card_number: LibraryCardNumber,
        today: NaiveDate,
    ) -> Result<i64>;

    /// (isbn, copy_number) で蔵書コピーを解決し、行ロックを取得する
    async fn lock_book_copy(
        &mut self,
        isbn: &Isbn,
        copy_number: CopyNumber,
    ) -> Result<Option<BookCopyDetails>>;

    async fn has_open_checkout(&mut self, book_copy_id: BookCopyId) -> Result<bool>;

    async fn find_user_id(&mut self, card_number: LibraryCardNumber) -> Result<Option<UserId>>;

    async fn insert_checkout(&mut self, new_checkout: &NewCheckout) -> Result<InsertCheckout>;

    /// (isbn, copy_number) の貸出中の貸出を取得し、行ロックを取得する
    async fn lock_open_checkout(
        &mut self,
        isbn: &Isbn,
        copy_number: CopyNumber,
    ) -> Result<Option<Checkout>>;

    async fn mark_returned(
        &mut self,
        checkout_id: CheckoutId,
        returned: &CheckoutReturn,
    ) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;
}
