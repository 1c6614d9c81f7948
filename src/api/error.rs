use crate::application::checkout::CheckoutApplicationError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub struct ApiError(CheckoutApplicationError);

impl From<CheckoutApplicationError> for ApiError {
    fn from(err: CheckoutApplicationError) -> Self {
        ApiError(err)
    }
}

impl From<crate::domain::ValueError> for ApiError {
    fn from(err: crate::domain::ValueError) -> Self {
        ApiError(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self.0 {
            // 400 Bad Request - 入力値が不正
            CheckoutApplicationError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg)
            }

            // 404 Not Found - リクエストされたリソースが存在しない
            e @ CheckoutApplicationError::BookCopyNotFound => {
                (StatusCode::NOT_FOUND, "BOOK_COPY_NOT_FOUND", e.to_string())
            }
            e @ CheckoutApplicationError::UserNotFound => {
                (StatusCode::NOT_FOUND, "USER_NOT_FOUND", e.to_string())
            }
            e @ CheckoutApplicationError::CheckoutNotFound => {
                (StatusCode::NOT_FOUND, "CHECKOUT_NOT_FOUND", e.to_string())
            }

            // 409 Conflict - ビジネスルール違反
            e @ CheckoutApplicationError::UserHasOverdueItems => {
                (StatusCode::CONFLICT, "USER_HAS_OVERDUE_ITEMS", e.to_string())
            }
            e @ CheckoutApplicationError::AlreadyCheckedOut => {
                (StatusCode::CONFLICT, "ALREADY_CHECKED_OUT", e.to_string())
            }

            // 500 Internal Server Error - システム障害
            // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
            CheckoutApplicationError::DomainError(msg) => {
                tracing::error!("Domain error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DOMAIN_ERROR",
                    "An unexpected error occurred".to_string(),
                )
            }
            CheckoutApplicationError::StoreError(e) => {
                tracing::error!("Library store error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "Failed to access library store".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse::new(error_type, message));
        (status, body).into_response()
    }
}
