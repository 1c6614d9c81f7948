use serde::{Deserialize, Serialize};

use super::{CopyNumber, Isbn, LibraryCardNumber};

/// コマンド：書籍を貸し出す
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutBook {
    pub isbn: Isbn,
    pub copy_number: CopyNumber,
    pub card_number: LibraryCardNumber,
}

/// コマンド：書籍を返却する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnBook {
    pub isbn: Isbn,
    pub copy_number: CopyNumber,
}
