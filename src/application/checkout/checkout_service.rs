use crate::domain::{
    self, CheckoutId, CheckoutListing, CopyNumber, Isbn, LibraryCardNumber,
    commands::{CheckoutBook, ReturnBook},
};
use crate::ports::{Clock, InsertCheckout, LibraryStore};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;

use super::errors::{CheckoutApplicationError, Result};

/// サービスの依存関係
///
/// 振る舞いは持たず、各サービス関数に明示的に渡される。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub store: Arc<dyn LibraryStore>,
    pub clock: Arc<dyn Clock>,
}

/// 貸出成功時の控え
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutReceipt {
    pub checkout_id: CheckoutId,
    pub isbn: Isbn,
    pub title: String,
    pub copy_number: CopyNumber,
    pub checkout_date: NaiveDate,
    pub due_date: NaiveDate,
}

impl CheckoutReceipt {
    pub fn confirmation_message(&self) -> String {
        format!(
            "Successfully checked out '{}' copy {}",
            self.title, self.copy_number
        )
    }
}

/// 返却成功時の控え
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReturnReceipt {
    pub checkout_id: CheckoutId,
    pub return_date: NaiveDate,
    pub days_overdue: i64,
    pub late_fee: Decimal,
}

fn store_error(err: Box<dyn std::error::Error + Send + Sync>) -> CheckoutApplicationError {
    CheckoutApplicationError::StoreError(err)
}

/// 利用者が貸出可能か判定する
///
/// ビジネスルール：返却期限が今日より前の未返却の貸出が1件でもあれば貸出不可。
#[tracing::instrument(skip(deps))]
pub async fn check_eligibility(
    deps: &ServiceDependencies,
    card_number: LibraryCardNumber,
) -> Result<bool> {
    let today = deps.clock.today();
    let overdue = deps
        .store
        .count_overdue_checkouts(card_number, today)
        .await
        .map_err(store_error)?;

    Ok(overdue == 0)
}

/// 書籍を貸し出す
///
/// ビジネスルール：
/// - 利用者に延滞中の貸出がないこと
/// - 蔵書コピーが存在すること
/// - 蔵書コピーが貸出中でないこと
/// - 利用者が存在すること
/// - 返却期限は貸出日 + 14日
///
/// # 一貫性保証
///
/// すべての確認と挿入は1つのトランザクション内で行われる。
/// 蔵書コピーの行ロックにより同一コピーへの同時貸出は直列化され、
/// ストア側の一意制約違反も`AlreadyCheckedOut`として返される。
/// エラーで早期リターンした場合、トランザクションはドロップ時にロールバックされる。
#[tracing::instrument(skip(deps))]
pub async fn checkout_book(deps: &ServiceDependencies, cmd: CheckoutBook) -> Result<CheckoutReceipt> {
    let today = deps.clock.today();
    let mut tx = deps.store.begin().await.map_err(store_error)?;

    // 1. 延滞確認
    let overdue = tx
        .count_overdue_checkouts(cmd.card_number, today)
        .await
        .map_err(store_error)?;
    if overdue > 0 {
        return Err(CheckoutApplicationError::UserHasOverdueItems);
    }

    // 2. 蔵書コピーの解決（行ロック）
    let copy = tx
        .lock_book_copy(&cmd.isbn, cmd.copy_number)
        .await
        .map_err(store_error)?
        .ok_or(CheckoutApplicationError::BookCopyNotFound)?;

    // 3. 貸出中でないこと
    let already_out = tx
        .has_open_checkout(copy.book_copy_id)
        .await
        .map_err(store_error)?;
    if already_out {
        return Err(CheckoutApplicationError::AlreadyCheckedOut);
    }

    // 4. 利用者の解決
    let user_id = tx
        .find_user_id(cmd.card_number)
        .await
        .map_err(store_error)?
        .ok_or(CheckoutApplicationError::UserNotFound)?;

    // 5. 貸出の作成
    let new_checkout = domain::checkout::open_checkout(copy.book_copy_id, user_id, today);
    let checkout_id = match tx
        .insert_checkout(&new_checkout)
        .await
        .map_err(store_error)?
    {
        InsertCheckout::Inserted(id) => id,
        InsertCheckout::CopyAlreadyCheckedOut => {
            return Err(CheckoutApplicationError::AlreadyCheckedOut);
        }
    };

    tx.commit().await.map_err(store_error)?;

    tracing::info!(
        checkout_id = checkout_id.value(),
        due_date = %new_checkout.due_date,
        "book checked out"
    );

    Ok(CheckoutReceipt {
        checkout_id,
        isbn: copy.isbn,
        title: copy.title,
        copy_number: copy.copy_number,
        checkout_date: new_checkout.checkout_date,
        due_date: new_checkout.due_date,
    })
}

/// 書籍を返却する
///
/// ビジネスルール：
/// - (isbn, copy_number) に貸出中の貸出があること
/// - 延滞日数 = max(0, 今日 - 返却期限)
/// - 延滞料金 = 延滞日数 × 0.50（返却時に確定）
///
/// 貸出行をロックしてから更新するため、同時返却はどちらか一方のみ成功する。
/// 返却済みの貸出は検索対象外なので、二度目の返却は`CheckoutNotFound`になる。
#[tracing::instrument(skip(deps))]
pub async fn return_book(deps: &ServiceDependencies, cmd: ReturnBook) -> Result<ReturnReceipt> {
    let today = deps.clock.today();
    let mut tx = deps.store.begin().await.map_err(store_error)?;

    // 1. 貸出中の貸出を取得（行ロック）
    let checkout = tx
        .lock_open_checkout(&cmd.isbn, cmd.copy_number)
        .await
        .map_err(store_error)?
        .ok_or(CheckoutApplicationError::CheckoutNotFound)?;

    // 2. ドメイン層の純粋関数で料金を計算
    let returned = domain::checkout::return_checkout(&checkout, today)
        .map_err(|e| CheckoutApplicationError::DomainError(e.to_string()))?;

    // 3. 更新して確定
    tx.mark_returned(checkout.checkout_id, &returned)
        .await
        .map_err(store_error)?;
    tx.commit().await.map_err(store_error)?;

    tracing::info!(
        checkout_id = checkout.checkout_id.value(),
        days_overdue = returned.days_overdue,
        late_fee = %returned.late_fee,
        "book returned"
    );

    Ok(ReturnReceipt {
        checkout_id: checkout.checkout_id,
        return_date: returned.return_date,
        days_overdue: returned.days_overdue,
        late_fee: returned.late_fee,
    })
}

/// 利用者の貸出中一覧（返却期限が近い順）
#[tracing::instrument(skip(deps))]
pub async fn list_user_checkouts(
    deps: &ServiceDependencies,
    card_number: LibraryCardNumber,
) -> Result<Vec<CheckoutListing>> {
    deps.store
        .find_open_checkouts_for_user(card_number)
        .await
        .map_err(store_error)
}

/// 貸出可能なコピー番号の一覧（昇順）
#[tracing::instrument(skip(deps))]
pub async fn list_available_copies(
    deps: &ServiceDependencies,
    isbn: &Isbn,
) -> Result<Vec<CopyNumber>> {
    deps.store
        .find_available_copy_numbers(isbn)
        .await
        .map_err(store_error)
}
