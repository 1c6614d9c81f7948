use serde::{Deserialize, Serialize};

use super::{BookCopyId, BookId, CopyNumber, Isbn, LibraryCardNumber, UserId};

/// 書籍（カタログ情報）
///
/// 外部のシード処理で登録される。貸出コンテキストからは読み取り専用。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub book_id: BookId,
    pub isbn: Isbn,
    pub title: String,
}

/// 蔵書コピー - 1冊の物理的な本
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookCopy {
    pub book_copy_id: BookCopyId,
    pub book_id: BookId,
    pub copy_number: CopyNumber,
}

/// 利用者
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub library_card_number: LibraryCardNumber,
    pub name: String,
}

/// 書籍情報と結合した蔵書コピー
///
/// 貸出処理で (isbn, copy_number) から解決される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookCopyDetails {
    pub book_copy_id: BookCopyId,
    pub book_id: BookId,
    pub isbn: Isbn,
    pub title: String,
    pub copy_number: CopyNumber,
}
