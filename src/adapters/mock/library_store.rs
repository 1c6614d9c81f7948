use crate::domain::{
    Book, BookCopy, BookCopyDetails, BookCopyId, BookId, CheckoutId, CheckoutListing, CopyNumber,
    Isbn, LibraryCardNumber, User, UserId,
    checkout::{self, Checkout, CheckoutReturn, NewCheckout},
};
use crate::ports::library_store::{
    InsertCheckout, LibraryStore as LibraryStoreTrait, LibraryTransaction, Result,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone, Default)]
struct State {
    books: Vec<Book>,
    copies: Vec<BookCopy>,
    users: Vec<User>,
    checkouts: Vec<Checkout>,
    last_id: i32,
}

impl State {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }

    fn user_by_card(&self, card_number: LibraryCardNumber) -> Option<&User> {
        self.users
            .iter()
            .find(|u| u.library_card_number == card_number)
    }

    fn copy_details(&self, isbn: &Isbn, copy_number: CopyNumber) -> Option<BookCopyDetails> {
        let book = self.books.iter().find(|b| &b.isbn == isbn)?;
        let copy = self
            .copies
            .iter()
            .find(|c| c.book_id == book.book_id && c.copy_number == copy_number)?;

        Some(BookCopyDetails {
            book_copy_id: copy.book_copy_id,
            book_id: book.book_id,
            isbn: book.isbn.clone(),
            title: book.title.clone(),
            copy_number: copy.copy_number,
        })
    }

    fn details_for_copy(&self, book_copy_id: BookCopyId) -> Option<BookCopyDetails> {
        let copy = self
            .copies
            .iter()
            .find(|c| c.book_copy_id == book_copy_id)?;
        let book = self.books.iter().find(|b| b.book_id == copy.book_id)?;

        Some(BookCopyDetails {
            book_copy_id: copy.book_copy_id,
            book_id: book.book_id,
            isbn: book.isbn.clone(),
            title: book.title.clone(),
            copy_number: copy.copy_number,
        })
    }

    fn open_checkout_for_copy(&self, book_copy_id: BookCopyId) -> Option<&Checkout> {
        self.checkouts
            .iter()
            .find(|c| c.book_copy_id == book_copy_id && !c.is_returned)
    }

    fn count_overdue(&self, card_number: LibraryCardNumber, today: NaiveDate) -> i64 {
        let Some(user) = self.user_by_card(card_number) else {
            return 0;
        };

        self.checkouts
            .iter()
            .filter(|c| c.user_id == user.user_id && checkout::is_overdue(c, today))
            .count() as i64
    }
}

fn unavailable_error() -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "library store is unavailable",
    ))
}

/// LibraryStoreのインメモリ実装
///
/// テスト用のシード関数で書籍・コピー・利用者・貸出を登録できる。
/// トランザクションはストア全体の排他ロックを保持し、
/// 作業コピーへの変更を`commit`時に反映する（ドロップ時は破棄）。
pub struct LibraryStore {
    state: Arc<Mutex<State>>,
    unavailable: AtomicBool,
    insert_conflict: AtomicBool,
}

impl LibraryStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            unavailable: AtomicBool::new(false),
            insert_conflict: AtomicBool::new(false),
        }
    }

    /// 接続障害をシミュレートする
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// 挿入時の一意制約違反をシミュレートする
    ///
    /// 有効な間、`insert_checkout`は既存の貸出の有無に関わらず
    /// `CopyAlreadyCheckedOut`を返す。
    pub fn set_insert_conflict(&self, conflict: bool) {
        self.insert_conflict.store(conflict, Ordering::SeqCst);
    }

    pub async fn add_book(&self, isbn: Isbn, title: impl Into<String>) -> BookId {
        let mut state = self.state.lock().await;
        let book_id = BookId::new(state.next_id());
        state.books.push(Book {
            book_id,
            isbn,
            title: title.into(),
        });
        book_id
    }

    pub async fn add_copy(&self, book_id: BookId, copy_number: CopyNumber) -> BookCopyId {
        let mut state = self.state.lock().await;
        let book_copy_id = BookCopyId::new(state.next_id());
        state.copies.push(BookCopy {
            book_copy_id,
            book_id,
            copy_number,
        });
        book_copy_id
    }

    pub async fn add_user(
        &self,
        library_card_number: LibraryCardNumber,
        name: impl Into<String>,
    ) -> UserId {
        let mut state = self.state.lock().await;
        let user_id = UserId::new(state.next_id());
        state.users.push(User {
            user_id,
            library_card_number,
            name: name.into(),
        });
        user_id
    }

    /// 貸出中の貸出を直接登録する（延滞状態の再現用）
    pub async fn add_checkout(
        &self,
        book_copy_id: BookCopyId,
        user_id: UserId,
        checkout_date: NaiveDate,
        due_date: NaiveDate,
    ) -> CheckoutId {
        let mut state = self.state.lock().await;
        let checkout_id = CheckoutId::new(state.next_id());
        state.checkouts.push(Checkout {
            checkout_id,
            book_copy_id,
            user_id,
            checkout_date,
            due_date,
            return_date: None,
            late_fee: None,
            is_returned: false,
        });
        checkout_id
    }

    /// 登録済みの全貸出（返却済みを含む）
    pub async fn checkouts(&self) -> Vec<Checkout> {
        self.state.lock().await.checkouts.clone()
    }

    fn ensure_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(unavailable_error());
        }
        Ok(())
    }
}

impl Default for LibraryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LibraryStoreTrait for LibraryStore {
    async fn begin(&self) -> Result<Box<dyn LibraryTransaction>> {
        self.ensure_available()?;
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        let insert_conflict = self.insert_conflict.load(Ordering::SeqCst);
        let tx: Box<dyn LibraryTransaction> = Box::new(Transaction {
            guard,
            staged,
            insert_conflict,
        });
        Ok(tx)
    }

    async fn count_overdue_checkouts(
        &self,
        card_number: LibraryCardNumber,
        today: NaiveDate,
    ) -> Result<i64> {
        self.ensure_available()?;
        Ok(self.state.lock().await.count_overdue(card_number, today))
    }

    async fn find_open_checkouts_for_user(
        &self,
        card_number: LibraryCardNumber,
    ) -> Result<Vec<CheckoutListing>> {
        self.ensure_available()?;
        let state = self.state.lock().await;
        let Some(user) = state.user_by_card(card_number) else {
            return Ok(Vec::new());
        };

        let mut listings: Vec<CheckoutListing> = state
            .checkouts
            .iter()
            .filter(|c| c.user_id == user.user_id && !c.is_returned)
            .filter_map(|c| {
                state
                    .details_for_copy(c.book_copy_id)
                    .map(|details| CheckoutListing {
                        isbn: details.isbn,
                        title: details.title,
                        copy_number: details.copy_number,
                        checkout_date: c.checkout_date,
                        due_date: c.due_date,
                    })
            })
            .collect();

        listings.sort_by(|a, b| {
            a.due_date
                .cmp(&b.due_date)
                .then_with(|| a.isbn.cmp(&b.isbn))
                .then_with(|| a.copy_number.cmp(&b.copy_number))
        });

        Ok(listings)
    }

    async fn find_available_copy_numbers(&self, isbn: &Isbn) -> Result<Vec<CopyNumber>> {
        self.ensure_available()?;
        let state = self.state.lock().await;
        let Some(book) = state.books.iter().find(|b| &b.isbn == isbn) else {
            return Ok(Vec::new());
        };

        let mut copy_numbers: Vec<CopyNumber> = state
            .copies
            .iter()
            .filter(|c| c.book_id == book.book_id)
            .filter(|c| state.open_checkout_for_copy(c.book_copy_id).is_none())
            .map(|c| c.copy_number)
            .collect();
        copy_numbers.sort();

        Ok(copy_numbers)
    }
}

/// インメモリトランザクション
///
/// ロックはトランザクションの生存期間中保持される。
struct Transaction {
    guard: OwnedMutexGuard<State>,
    staged: State,
    insert_conflict: bool,
}

#[async_trait]
impl LibraryTransaction for Transaction {
    async fn count_overdue_checkouts(
        &mut self,
        card_number: LibraryCardNumber,
        today: NaiveDate,
    ) -> Result<i64> {
        Ok(self.staged.count_overdue(card_number, today))
    }

    async fn lock_book_copy(
        &mut self,
        isbn: &Isbn,
        copy_number: CopyNumber,
    ) -> Result<Option<BookCopyDetails>> {
        Ok(self.staged.copy_details(isbn, copy_number))
    }

    async fn has_open_checkout(&mut self, book_copy_id: BookCopyId) -> Result<bool> {
        Ok(self.staged.open_checkout_for_copy(book_copy_id).is_some())
    }

    async fn find_user_id(&mut self, card_number: LibraryCardNumber) -> Result<Option<UserId>> {
        Ok(self.staged.user_by_card(card_number).map(|u| u.user_id))
    }

    async fn insert_checkout(&mut self, new_checkout: &NewCheckout) -> Result<InsertCheckout> {
        if self.insert_conflict
            || self
                .staged
                .open_checkout_for_copy(new_checkout.book_copy_id)
                .is_some()
        {
            return Ok(InsertCheckout::CopyAlreadyCheckedOut);
        }

        let checkout_id = CheckoutId::new(self.staged.next_id());
        self.staged.checkouts.push(Checkout {
            checkout_id,
            book_copy_id: new_checkout.book_copy_id,
            user_id: new_checkout.user_id,
            checkout_date: new_checkout.checkout_date,
            due_date: new_checkout.due_date,
            return_date: None,
            late_fee: None,
            is_returned: false,
        });

        Ok(InsertCheckout::Inserted(checkout_id))
    }

    async fn lock_open_checkout(
        &mut self,
        isbn: &Isbn,
        copy_number: CopyNumber,
    ) -> Result<Option<Checkout>> {
        let Some(details) = self.staged.copy_details(isbn, copy_number) else {
            return Ok(None);
        };

        Ok(self
            .staged
            .open_checkout_for_copy(details.book_copy_id)
            .cloned())
    }

    async fn mark_returned(
        &mut self,
        checkout_id: CheckoutId,
        returned: &CheckoutReturn,
    ) -> Result<()> {
        let Some(current) = self
            .staged
            .checkouts
            .iter_mut()
            .find(|c| c.checkout_id == checkout_id && !c.is_returned)
        else {
            return Err(format!("no open checkout with id {}", checkout_id.value()).into());
        };

        *current = checkout::apply_return(current, returned);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let Transaction {
            mut guard, staged, ..
        } = *self;
        *guard = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    async fn seeded_store() -> (LibraryStore, BookCopyId, UserId) {
        let store = LibraryStore::new();
        let book_id = store
            .add_book(Isbn::parse("9780451524935").unwrap(), "1984")
            .await;
        let copy_id = store.add_copy(book_id, CopyNumber::new(1).unwrap()).await;
        store.add_copy(book_id, CopyNumber::new(3).unwrap()).await;
        store.add_copy(book_id, CopyNumber::new(2).unwrap()).await;
        let user_id = store
            .add_user(LibraryCardNumber::new(12345), "Alice")
            .await;
        (store, copy_id, user_id)
    }

    #[tokio::test]
    async fn test_available_copies_sorted_and_exclude_open_checkouts() {
        let (store, copy_id, user_id) = seeded_store().await;
        store
            .add_checkout(copy_id, user_id, today(), today() + Duration::days(14))
            .await;

        let isbn = Isbn::parse("9780451524935").unwrap();
        let copies = store.find_available_copy_numbers(&isbn).await.unwrap();
        let values: Vec<i32> = copies.iter().map(CopyNumber::value).collect();
        assert_eq!(values, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_changes() {
        let (store, copy_id, user_id) = seeded_store().await;

        {
            let mut tx = store.begin().await.unwrap();
            let new_checkout = checkout::open_checkout(copy_id, user_id, today());
            let inserted = tx.insert_checkout(&new_checkout).await.unwrap();
            assert!(matches!(inserted, InsertCheckout::Inserted(_)));
        }

        assert!(store.checkouts().await.is_empty());
    }

    #[tokio::test]
    async fn test_committed_transaction_is_visible() {
        let (store, copy_id, user_id) = seeded_store().await;

        let mut tx = store.begin().await.unwrap();
        let new_checkout = checkout::open_checkout(copy_id, user_id, today());
        tx.insert_checkout(&new_checkout).await.unwrap();
        tx.commit().await.unwrap();

        let checkouts = store.checkouts().await;
        assert_eq!(checkouts.len(), 1);
        assert_eq!(checkouts[0].due_date, today() + Duration::days(14));
    }

    #[tokio::test]
    async fn test_insert_rejects_second_open_checkout() {
        let (store, copy_id, user_id) = seeded_store().await;
        store
            .add_checkout(copy_id, user_id, today(), today() + Duration::days(14))
            .await;

        let mut tx = store.begin().await.unwrap();
        let new_checkout = checkout::open_checkout(copy_id, user_id, today());
        let result = tx.insert_checkout(&new_checkout).await.unwrap();
        assert_eq!(result, InsertCheckout::CopyAlreadyCheckedOut);
    }

    #[tokio::test]
    async fn test_insert_conflict_reports_copy_already_checked_out() {
        let (store, copy_id, user_id) = seeded_store().await;
        store.set_insert_conflict(true);

        let mut tx = store.begin().await.unwrap();
        assert!(!tx.has_open_checkout(copy_id).await.unwrap());
        let new_checkout = checkout::open_checkout(copy_id, user_id, today());
        let result = tx.insert_checkout(&new_checkout).await.unwrap();
        assert_eq!(result, InsertCheckout::CopyAlreadyCheckedOut);
    }

    #[tokio::test]
    async fn test_mark_returned_updates_checkout() {
        let (store, copy_id, user_id) = seeded_store().await;
        let checkout_id = store
            .add_checkout(
                copy_id,
                user_id,
                today() - Duration::days(20),
                today() - Duration::days(6),
            )
            .await;

        let mut tx = store.begin().await.unwrap();
        let returned = CheckoutReturn {
            return_date: today(),
            days_overdue: 6,
            late_fee: dec!(3.00),
        };
        tx.mark_returned(checkout_id, &returned).await.unwrap();
        tx.commit().await.unwrap();

        let checkouts = store.checkouts().await;
        assert!(checkouts[0].is_returned);
        assert_eq!(checkouts[0].late_fee, Some(dec!(3.00)));
        assert_eq!(checkouts[0].return_date, Some(today()));
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_reads_and_begin() {
        let (store, _, _) = seeded_store().await;
        store.set_unavailable(true);

        assert!(store.begin().await.is_err());
        assert!(
            store
                .count_overdue_checkouts(LibraryCardNumber::new(12345), today())
                .await
                .is_err()
        );
    }
}
