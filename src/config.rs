//! 環境変数から読み込む貸出サービスの設定

use std::net::SocketAddr;
use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/library";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// 設定読み込みのエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    InvalidValue {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// データベース接続の設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// 起動時にマイグレーションを実行するか
    pub run_migrations: bool,
}

/// アプリケーション全体の設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub port: u16,
}

impl AppConfig {
    /// 環境変数から設定を読み込む
    ///
    /// - `DATABASE_URL` (default `postgres://localhost/library`)
    /// - `PORT` (default `3000`)
    /// - `DATABASE_MAX_CONNECTIONS` (default `5`)
    /// - `RUN_MIGRATIONS` (default `false`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 任意のルックアップ関数から設定を読み込む
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let port = match lookup("PORT") {
            Some(value) => value.trim().parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                name: "PORT",
                expected: "a port number",
                value,
            })?,
            None => DEFAULT_PORT,
        };

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(value) => match value.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: "DATABASE_MAX_CONNECTIONS",
                        expected: "a positive integer",
                        value,
                    });
                }
            },
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let run_migrations = match lookup("RUN_MIGRATIONS") {
            Some(value) => parse_flag(&value).ok_or(ConfigError::InvalidValue {
                name: "RUN_MIGRATIONS",
                expected: "true or false",
                value,
            })?,
            None => false,
        };

        Ok(Self {
            database: DatabaseConfig {
                url,
                max_connections,
                run_migrations,
            },
            port,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
