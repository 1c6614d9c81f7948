pub mod clock;
pub mod library_store;

pub use clock::FixedClock;
pub use library_store::LibraryStore;
