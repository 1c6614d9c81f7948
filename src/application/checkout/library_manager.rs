use crate::domain::{
    CheckoutListing, CheckoutOutcome, CopyNumber, Isbn, LibraryCardNumber, ReturnOutcome,
    commands::{CheckoutBook, ReturnBook},
};

use super::checkout_service::{self, ServiceDependencies};
use super::errors::CheckoutApplicationError;

/// 失敗を呼び出し側に伝播しない互換ファサード
///
/// 5つの操作はすべて結果値（Outcome・空リスト・false）を返し、
/// エラーを上位に送出しない。握りつぶしたエラーはtracingで記録する。
/// 「空」と「失敗」を区別したい呼び出し側は`checkout_service`の関数を使う。
#[derive(Clone)]
pub struct LibraryManager {
    deps: ServiceDependencies,
}

impl LibraryManager {
    pub fn new(deps: ServiceDependencies) -> Self {
        Self { deps }
    }

    /// 書籍を貸し出す。常にOutcomeを返す。
    pub async fn checkout_book(&self, isbn: &str, copy_number: i32, card_number: i32) -> CheckoutOutcome {
        let cmd = match parse_copy(isbn, copy_number) {
            Ok((isbn, copy_number)) => CheckoutBook {
                isbn,
                copy_number,
                card_number: LibraryCardNumber::new(card_number),
            },
            Err(err) => {
                log_failure("checkout_book", &err);
                return CheckoutOutcome::failed(err.to_string());
            }
        };

        match checkout_service::checkout_book(&self.deps, cmd).await {
            Ok(receipt) => CheckoutOutcome::succeeded(receipt.confirmation_message(), receipt.due_date),
            Err(err) => {
                log_failure("checkout_book", &err);
                CheckoutOutcome::failed(checkout_failure_message(&err))
            }
        }
    }

    /// 書籍を返却する。失敗時は料金・日数ともに0。
    pub async fn return_book(&self, isbn: &str, copy_number: i32) -> ReturnOutcome {
        let cmd = match parse_copy(isbn, copy_number) {
            Ok((isbn, copy_number)) => ReturnBook { isbn, copy_number },
            Err(err) => {
                log_failure("return_book", &err);
                return ReturnOutcome::failed();
            }
        };

        match checkout_service::return_book(&self.deps, cmd).await {
            Ok(receipt) => ReturnOutcome::succeeded(receipt.late_fee, receipt.days_overdue),
            Err(err) => {
                log_failure("return_book", &err);
                ReturnOutcome::failed()
            }
        }
    }

    /// 利用者の貸出中一覧。失敗時は空。
    pub async fn list_user_checkouts(&self, card_number: i32) -> Vec<CheckoutListing> {
        let card_number = LibraryCardNumber::new(card_number);
        checkout_service::list_user_checkouts(&self.deps, card_number)
            .await
            .unwrap_or_else(|err| {
                log_failure("list_user_checkouts", &err);
                Vec::new()
            })
    }

    /// 貸出可能なコピー番号。失敗時は空。
    pub async fn list_available_copies(&self, isbn: &str) -> Vec<i32> {
        let isbn = match Isbn::parse(isbn) {
            Ok(isbn) => isbn,
            Err(err) => {
                log_failure(
                    "list_available_copies",
                    &CheckoutApplicationError::from(err),
                );
                return Vec::new();
            }
        };

        match checkout_service::list_available_copies(&self.deps, &isbn).await {
            Ok(copies) => copies.into_iter().map(i32::from).collect(),
            Err(err) => {
                log_failure("list_available_copies", &err);
                Vec::new()
            }
        }
    }

    /// 貸出可否。失敗時はfalse（安全側に倒す）。
    pub async fn check_eligibility(&self, card_number: i32) -> bool {
        let card_number = LibraryCardNumber::new(card_number);
        checkout_service::check_eligibility(&self.deps, card_number)
            .await
            .unwrap_or_else(|err| {
                log_failure("check_eligibility", &err);
                false
            })
    }
}

fn parse_copy(
    isbn: &str,
    copy_number: i32,
) -> Result<(Isbn, CopyNumber), CheckoutApplicationError> {
    Ok((Isbn::parse(isbn)?, CopyNumber::new(copy_number)?))
}

fn checkout_failure_message(err: &CheckoutApplicationError) -> String {
    match err {
        CheckoutApplicationError::StoreError(source) => {
            format!("Error during checkout: {}", source)
        }
        CheckoutApplicationError::DomainError(msg) => format!("Error during checkout: {}", msg),
        other => other.to_string(),
    }
}

fn log_failure(operation: &'static str, err: &CheckoutApplicationError) {
    if err.is_store_failure() {
        tracing::error!(operation, error = %err, "library operation failed");
    } else {
        tracing::warn!(operation, reason = %err, "library operation rejected");
    }
}
