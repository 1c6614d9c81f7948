use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValueError;

/// 書籍ID - booksテーブルの主キー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BookId(i32);

impl BookId {
    pub fn new(value: i32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

/// 蔵書コピーID - book_copiesテーブルの主キー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BookCopyId(i32);

impl BookCopyId {
    pub fn new(value: i32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

/// 利用者ID - usersテーブルの主キー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(i32);

impl UserId {
    pub fn new(value: i32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

/// 貸出ID - checkoutsテーブルの主キー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CheckoutId(i32);

impl CheckoutId {
    pub fn new(value: i32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

/// ISBN - 書籍の外部キー
///
/// 前後の空白は取り除かれる。空文字は受け付けない。
/// チェックディジットの検証は行わない（カタログ側の責務）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Isbn(String);

impl Isbn {
    pub fn parse(value: impl AsRef<str>) -> Result<Self, ValueError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ValueError::EmptyIsbn);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Isbn {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Isbn> for String {
    fn from(isbn: Isbn) -> Self {
        isbn.0
    }
}

impl fmt::Display for Isbn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// コピー番号
///
/// 不変条件：1以上。同じ書籍の中で一意（book_copiesの一意制約）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct CopyNumber(i32);

impl CopyNumber {
    pub fn new(value: i32) -> Result<Self, ValueError> {
        if value < 1 {
            return Err(ValueError::InvalidCopyNumber(value));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl TryFrom<i32> for CopyNumber {
    type Error = ValueError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CopyNumber> for i32 {
    fn from(copy_number: CopyNumber) -> Self {
        copy_number.0
    }
}

impl fmt::Display for CopyNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 図書館カード番号 - 利用者の外部キー
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LibraryCardNumber(i32);

impl LibraryCardNumber {
    pub fn new(value: i32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for LibraryCardNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isbn_parse_trims_whitespace() {
        let isbn = Isbn::parse("  9780451524935 ").unwrap();
        assert_eq!(isbn.as_str(), "9780451524935");
    }

    #[test]
    fn test_isbn_parse_rejects_blank() {
        assert_eq!(Isbn::parse("   ").unwrap_err(), ValueError::EmptyIsbn);
        assert_eq!(Isbn::parse("").unwrap_err(), ValueError::EmptyIsbn);
    }

    #[test]
    fn test_copy_number_must_be_positive() {
        assert!(CopyNumber::new(1).is_ok());
        assert_eq!(
            CopyNumber::new(0).unwrap_err(),
            ValueError::InvalidCopyNumber(0)
        );
        assert_eq!(
            CopyNumber::new(-3).unwrap_err(),
            ValueError::InvalidCopyNumber(-3)
        );
    }

    #[test]
    fn test_copy_number_ordering_is_numeric() {
        let mut copies = vec![
            CopyNumber::new(10).unwrap(),
            CopyNumber::new(2).unwrap(),
            CopyNumber::new(1).unwrap(),
        ];
        copies.sort();
        let values: Vec<i32> = copies.iter().map(CopyNumber::value).collect();
        assert_eq!(values, vec![1, 2, 10]);
    }

    #[test]
    fn test_isbn_deserialize_rejects_blank() {
        let result: Result<Isbn, _> = serde_json::from_str("\"  \"");
        assert!(result.is_err());
    }

    #[test]
    fn test_copy_number_deserialize_rejects_zero() {
        let result: Result<CopyNumber, _> = serde_json::from_str("0");
        assert!(result.is_err());
    }
}
