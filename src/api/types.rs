use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::checkout::{CheckoutReceipt, ReturnReceipt};
use crate::domain::{
    CopyNumber, Isbn, LibraryCardNumber,
    commands::{CheckoutBook, ReturnBook},
};

/// 貸出リクエスト（POST /checkouts）
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckoutBookRequest {
    pub isbn: String,
    pub copy_number: i32,
    pub card_number: i32,
}

impl CheckoutBookRequest {
    pub fn to_command(&self) -> Result<CheckoutBook, crate::domain::ValueError> {
        Ok(CheckoutBook {
            isbn: Isbn::parse(&self.isbn)?,
            copy_number: CopyNumber::new(self.copy_number)?,
            card_number: LibraryCardNumber::new(self.card_number),
        })
    }
}

/// 返却リクエスト（POST /returns）
#[derive(Debug, Serialize, Deserialize)]
pub struct ReturnBookRequest {
    pub isbn: String,
    pub copy_number: i32,
}

impl ReturnBookRequest {
    pub fn to_command(&self) -> Result<ReturnBook, crate::domain::ValueError> {
        Ok(ReturnBook {
            isbn: Isbn::parse(&self.isbn)?,
            copy_number: CopyNumber::new(self.copy_number)?,
        })
    }
}

/// 貸出作成レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckoutCreatedResponse {
    pub checkout_id: i32,
    pub message: String,
    pub isbn: String,
    pub copy_number: i32,
    pub checkout_date: NaiveDate,
    pub due_date: NaiveDate,
}

impl From<CheckoutReceipt> for CheckoutCreatedResponse {
    fn from(receipt: CheckoutReceipt) -> Self {
        Self {
            checkout_id: receipt.checkout_id.value(),
            message: receipt.confirmation_message(),
            isbn: receipt.isbn.to_string(),
            copy_number: receipt.copy_number.value(),
            checkout_date: receipt.checkout_date,
            due_date: receipt.due_date,
        }
    }
}

/// 返却レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct BookReturnedResponse {
    pub checkout_id: i32,
    pub return_date: NaiveDate,
    pub days_overdue: i64,
    pub late_fee: Decimal,
}

impl From<ReturnReceipt> for BookReturnedResponse {
    fn from(receipt: ReturnReceipt) -> Self {
        Self {
            checkout_id: receipt.checkout_id.value(),
            return_date: receipt.return_date,
            days_overdue: receipt.days_overdue,
            late_fee: receipt.late_fee,
        }
    }
}

/// 貸出中一覧の1行（GET /users/:card_number/checkouts）
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckoutListingResponse {
    pub isbn: String,
    pub title: String,
    pub copy_number: i32,
    pub checkout_date: NaiveDate,
    pub due_date: NaiveDate,
}

impl From<crate::domain::CheckoutListing> for CheckoutListingResponse {
    fn from(listing: crate::domain::CheckoutListing) -> Self {
        Self {
            isbn: listing.isbn.to_string(),
            title: listing.title,
            copy_number: listing.copy_number.value(),
            checkout_date: listing.checkout_date,
            due_date: listing.due_date,
        }
    }
}

/// 貸出可否レスポンス（GET /users/:card_number/eligibility）
#[derive(Debug, Serialize, Deserialize)]
pub struct EligibilityResponse {
    pub card_number: i32,
    pub eligible: bool,
}

/// 貸出可能コピーレスポンス（GET /books/:isbn/available-copies）
#[derive(Debug, Serialize, Deserialize)]
pub struct AvailableCopiesResponse {
    pub isbn: String,
    pub copy_numbers: Vec<i32>,
}

/// エラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
