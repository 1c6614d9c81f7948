use crate::config::DatabaseConfig;
use sqlx::{PgPool, postgres::PgPoolOptions};

/// 設定からPostgreSQLコネクションプールを作成する
///
/// 接続に失敗した場合はそのままエラーを返す（リトライしない）。
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await
}

/// スキーマのマイグレーションを実行する
///
/// 部分一意インデックス（貸出中は1コピー1件まで）もここで作成される。
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
