use thiserror::Error;

/// 値オブジェクトの生成エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// ISBNが空
    #[error("ISBN must not be blank")]
    EmptyIsbn,
    /// コピー番号が1未満
    #[error("copy number must be at least 1, got {0}")]
    InvalidCopyNumber(i32),
}

/// 返却のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReturnCheckoutError {
    /// 既に返却済み
    #[error("checkout is already returned")]
    AlreadyReturned,
}
