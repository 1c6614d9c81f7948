pub mod library_store;
pub mod pool;

// パブリックに型を再エクスポート
pub use library_store::LibraryStore as PostgresLibraryStore;
