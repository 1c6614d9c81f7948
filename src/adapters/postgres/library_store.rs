use crate::domain::{
    BookCopyDetails, BookCopyId, BookId, CheckoutId, CheckoutListing, CopyNumber, Isbn,
    LibraryCardNumber, UserId,
    checkout::{Checkout, CheckoutReturn, NewCheckout},
};
use crate::ports::library_store::{
    InsertCheckout, LibraryStore as LibraryStoreTrait, LibraryTransaction, Result,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use futures::{StreamExt, TryStreamExt};
use sqlx::{PgPool, Postgres, Row, postgres::PgRow};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const COUNT_OVERDUE_SQL: &str = r#"
    SELECT COUNT(*)
    FROM checkouts c
    JOIN users u ON c.user_id = u.id
    WHERE u.library_card_number = $1
        AND c.is_returned = false
        AND c.due_date < $2
"#;

/// PostgreSQLの行データをBookCopyDetailsに変換する
fn map_row_to_book_copy_details(row: &PgRow) -> Result<BookCopyDetails> {
    let isbn: String = row.try_get("isbn")?;
    let copy_number: i32 = row.try_get("copy_number")?;

    Ok(BookCopyDetails {
        book_copy_id: BookCopyId::new(row.try_get("book_copy_id")?),
        book_id: BookId::new(row.try_get("book_id")?),
        isbn: Isbn::parse(isbn)?,
        title: row.try_get("title")?,
        copy_number: CopyNumber::new(copy_number)?,
    })
}

/// PostgreSQLの行データをCheckoutに変換する
fn map_row_to_checkout(row: &PgRow) -> Result<Checkout> {
    Ok(Checkout {
        checkout_id: CheckoutId::new(row.try_get("id")?),
        book_copy_id: BookCopyId::new(row.try_get("book_copy_id")?),
        user_id: UserId::new(row.try_get("user_id")?),
        checkout_date: row.try_get("checkout_date")?,
        due_date: row.try_get("due_date")?,
        return_date: row.try_get("return_date")?,
        late_fee: row.try_get("late_fee")?,
        is_returned: row.try_get("is_returned")?,
    })
}

/// PostgreSQLの行データをCheckoutListingに変換する
fn map_row_to_checkout_listing(row: &PgRow) -> Result<CheckoutListing> {
    let isbn: String = row.try_get("isbn")?;
    let copy_number: i32 = row.try_get("copy_number")?;

    Ok(CheckoutListing {
        isbn: Isbn::parse(isbn)?,
        title: row.try_get("title")?,
        copy_number: CopyNumber::new(copy_number)?,
        checkout_date: row.try_get("checkout_date")?,
        due_date: row.try_get("due_date")?,
    })
}

/// LibraryStoreのPostgreSQL実装
///
/// 業務操作ごとに`begin`でトランザクションを開始する。
/// 「1コピーにつき貸出中は最大1件」はcheckoutsの部分一意インデックスでも保証される。
pub struct LibraryStore {
    pool: PgPool,
}

impl LibraryStore {
    /// PostgreSQLコネクションプールから新しいLibraryStoreを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LibraryStoreTrait for LibraryStore {
    async fn begin(&self) -> Result<Box<dyn LibraryTransaction>> {
        let tx = self.pool.begin().await?;
        let tx: Box<dyn LibraryTransaction> = Box::new(Transaction { tx });
        Ok(tx)
    }

    async fn count_overdue_checkouts(
        &self,
        card_number: LibraryCardNumber,
        today: NaiveDate,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(COUNT_OVERDUE_SQL)
            .bind(card_number.value())
            .bind(today)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// 利用者の貸出中一覧
    ///
    /// 返却期限の昇順。同じ期限の場合はISBN、コピー番号の順。
    async fn find_open_checkouts_for_user(
        &self,
        card_number: LibraryCardNumber,
    ) -> Result<Vec<CheckoutListing>> {
        sqlx::query(
            r#"
            SELECT
                b.isbn,
                b.title,
                bc.copy_number,
                c.checkout_date,
                c.due_date
            FROM checkouts c
            JOIN users u ON c.user_id = u.id
            JOIN book_copies bc ON c.book_copy_id = bc.id
            JOIN books b ON bc.book_id = b.id
            WHERE u.library_card_number = $1
                AND c.is_returned = false
            ORDER BY c.due_date ASC, b.isbn ASC, bc.copy_number ASC
            "#,
        )
        .bind(card_number.value())
        .fetch(&self.pool)
        .map(|row| {
            row.map_err(|e| Box::new(e) as BoxError)
                .and_then(|row| map_row_to_checkout_listing(&row))
        })
        .try_collect()
        .await
    }

    async fn find_available_copy_numbers(&self, isbn: &Isbn) -> Result<Vec<CopyNumber>> {
        sqlx::query_scalar::<_, i32>(
            r#"
            SELECT bc.copy_number
            FROM book_copies bc
            JOIN books b ON bc.book_id = b.id
            LEFT JOIN checkouts c ON bc.id = c.book_copy_id AND c.is_returned = false
            WHERE b.isbn = $1 AND c.id IS NULL
            ORDER BY bc.copy_number ASC
            "#,
        )
        .bind(isbn.as_str())
        .fetch(&self.pool)
        .map(|copy_number| {
            copy_number
                .map_err(|e| Box::new(e) as BoxError)
                .and_then(|n| CopyNumber::new(n).map_err(|e| Box::new(e) as BoxError))
        })
        .try_collect()
        .await
    }
}

/// PostgreSQLトランザクション
///
/// ドロップ時にsqlxがロールバックする。
struct Transaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl LibraryTransaction for Transaction {
    async fn count_overdue_checkouts(
        &mut self,
        card_number: LibraryCardNumber,
        today: NaiveDate,
    ) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(COUNT_OVERDUE_SQL)
            .bind(card_number.value())
            .bind(today)
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(count)
    }

    async fn lock_book_copy(
        &mut self,
        isbn: &Isbn,
        copy_number: CopyNumber,
    ) -> Result<Option<BookCopyDetails>> {
        let row = sqlx::query(
            r#"
            SELECT
                bc.id AS book_copy_id,
                b.id AS book_id,
                b.isbn,
                b.title,
                bc.copy_number
            FROM book_copies bc
            JOIN books b ON bc.book_id = b.id
            WHERE b.isbn = $1 AND bc.copy_number = $2
            FOR UPDATE OF bc
            "#,
        )
        .bind(isbn.as_str())
        .bind(copy_number.value())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(map_row_to_book_copy_details).transpose()
    }

    async fn has_open_checkout(&mut self, book_copy_id: BookCopyId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM checkouts
                WHERE book_copy_id = $1 AND is_returned = false
            )
            "#,
        )
        .bind(book_copy_id.value())
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(exists)
    }

    async fn find_user_id(&mut self, card_number: LibraryCardNumber) -> Result<Option<UserId>> {
        let id: Option<i32> =
            sqlx::query_scalar("SELECT id FROM users WHERE library_card_number = $1")
                .bind(card_number.value())
                .fetch_optional(&mut *self.tx)
                .await?;

        Ok(id.map(UserId::new))
    }

    /// 貸出行を挿入する
    ///
    /// 部分一意インデックス違反は`CopyAlreadyCheckedOut`として返す。
    /// 違反後のトランザクションは中断状態になるため、呼び出し側はコミットしないこと。
    async fn insert_checkout(&mut self, new_checkout: &NewCheckout) -> Result<InsertCheckout> {
        let inserted = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO checkouts (
                book_copy_id,
                user_id,
                checkout_date,
                due_date,
                is_returned
            )
            VALUES ($1, $2, $3, $4, false)
            RETURNING id
            "#,
        )
        .bind(new_checkout.book_copy_id.value())
        .bind(new_checkout.user_id.value())
        .bind(new_checkout.checkout_date)
        .bind(new_checkout.due_date)
        .fetch_one(&mut *self.tx)
        .await;

        match inserted {
            Ok(id) => Ok(InsertCheckout::Inserted(CheckoutId::new(id))),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                tracing::debug!(
                    book_copy_id = new_checkout.book_copy_id.value(),
                    constraint = ?db_err.constraint(),
                    "open checkout already exists for book copy"
                );
                Ok(InsertCheckout::CopyAlreadyCheckedOut)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn lock_open_checkout(
        &mut self,
        isbn: &Isbn,
        copy_number: CopyNumber,
    ) -> Result<Option<Checkout>> {
        let row = sqlx::query(
            r#"
            SELECT
                c.id,
                c.book_copy_id,
                c.user_id,
                c.checkout_date,
                c.due_date,
                c.return_date,
                c.late_fee,
                c.is_returned
            FROM checkouts c
            JOIN book_copies bc ON c.book_copy_id = bc.id
            JOIN books b ON bc.book_id = b.id
            WHERE b.isbn = $1
                AND bc.copy_number = $2
                AND c.is_returned = false
            FOR UPDATE OF c
            "#,
        )
        .bind(isbn.as_str())
        .bind(copy_number.value())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(map_row_to_checkout).transpose()
    }

    async fn mark_returned(
        &mut self,
        checkout_id: CheckoutId,
        returned: &CheckoutReturn,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE checkouts
            SET return_date = $1,
                late_fee = $2,
                is_returned = true
            WHERE id = $3 AND is_returned = false
            "#,
        )
        .bind(returned.return_date)
        .bind(returned.late_fee)
        .bind(checkout_id.value())
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() != 1 {
            return Err(format!("no open checkout with id {}", checkout_id.value()).into());
        }

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let Transaction { tx } = *self;
        tx.commit().await?;
        Ok(())
    }
}
