use thiserror::Error;

/// 貸出管理アプリケーション層のエラー
#[derive(Debug, Error)]
pub enum CheckoutApplicationError {
    /// 入力値が不正
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// 利用者に延滞中の貸出がある
    #[error("User has overdue books and cannot check out new items")]
    UserHasOverdueItems,

    /// 蔵書コピーが存在しない
    #[error("Book copy not found")]
    BookCopyNotFound,

    /// 蔵書コピーが貸出中
    #[error("Book copy is already checked out")]
    AlreadyCheckedOut,

    /// 利用者が存在しない
    #[error("User not found")]
    UserNotFound,

    /// 貸出中の貸出が見つからない
    #[error("No open checkout found for this book copy")]
    CheckoutNotFound,

    /// ドメイン層のエラー
    #[error("Domain error: {0}")]
    DomainError(String),

    /// ストアのエラー（接続・クエリ失敗）
    #[error("Library store error: {0}")]
    StoreError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl CheckoutApplicationError {
    /// ストア障害か（業務ルール違反・未検出ではない）
    pub fn is_store_failure(&self) -> bool {
        matches!(self, CheckoutApplicationError::StoreError(_))
    }
}

impl From<crate::domain::ValueError> for CheckoutApplicationError {
    fn from(err: crate::domain::ValueError) -> Self {
        CheckoutApplicationError::InvalidRequest(err.to_string())
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, CheckoutApplicationError>;
