use crate::application::checkout::{
    ServiceDependencies, check_eligibility as execute_check_eligibility,
    checkout_book as execute_checkout_book, list_available_copies as execute_list_available_copies,
    list_user_checkouts as execute_list_user_checkouts, return_book as execute_return_book,
};
use crate::domain::{Isbn, LibraryCardNumber};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::{
    error::ApiError,
    types::{
        AvailableCopiesResponse, BookReturnedResponse, CheckoutBookRequest,
        CheckoutCreatedResponse, CheckoutListingResponse, EligibilityResponse, ReturnBookRequest,
    },
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
}

// ============================================================================
// Command handlers (POST)
// ============================================================================

/// POST /checkouts - 書籍を貸し出す
///
/// 強制されるビジネスルール:
/// - 利用者に延滞中の貸出がないこと
/// - 蔵書コピーが存在し、貸出中でないこと
/// - 利用者が存在すること
pub async fn create_checkout(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CheckoutBookRequest>,
) -> Result<(StatusCode, Json<CheckoutCreatedResponse>), ApiError> {
    let cmd = req.to_command()?;
    let receipt = execute_checkout_book(&state.service_deps, cmd).await?;

    Ok((StatusCode::CREATED, Json(receipt.into())))
}

/// POST /returns - 書籍を返却する
///
/// 延滞していても返却は受け付け、延滞料金を返す。
pub async fn return_book(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReturnBookRequest>,
) -> Result<(StatusCode, Json<BookReturnedResponse>), ApiError> {
    let cmd = req.to_command()?;
    let receipt = execute_return_book(&state.service_deps, cmd).await?;

    Ok((StatusCode::OK, Json(receipt.into())))
}

// ============================================================================
// Query handlers (GET)
// ============================================================================

/// GET /users/:card_number/checkouts - 利用者の貸出中一覧
pub async fn list_user_checkouts(
    State(state): State<Arc<AppState>>,
    Path(card_number): Path<i32>,
) -> Result<Json<Vec<CheckoutListingResponse>>, ApiError> {
    let listings =
        execute_list_user_checkouts(&state.service_deps, LibraryCardNumber::new(card_number))
            .await?;

    Ok(Json(listings.into_iter().map(Into::into).collect()))
}

/// GET /users/:card_number/eligibility - 利用者の貸出可否
pub async fn get_eligibility(
    State(state): State<Arc<AppState>>,
    Path(card_number): Path<i32>,
) -> Result<Json<EligibilityResponse>, ApiError> {
    let eligible =
        execute_check_eligibility(&state.service_deps, LibraryCardNumber::new(card_number))
            .await?;

    Ok(Json(EligibilityResponse {
        card_number,
        eligible,
    }))
}

/// GET /books/:isbn/available-copies - 貸出可能なコピー番号
pub async fn list_available_copies(
    State(state): State<Arc<AppState>>,
    Path(isbn): Path<String>,
) -> Result<Json<AvailableCopiesResponse>, ApiError> {
    let isbn = Isbn::parse(isbn)?;
    let copies = execute_list_available_copies(&state.service_deps, &isbn).await?;

    Ok(Json(AvailableCopiesResponse {
        isbn: isbn.to_string(),
        copy_numbers: copies.into_iter().map(i32::from).collect(),
    }))
}
