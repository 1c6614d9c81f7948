pub mod clock;
pub mod library_store;

pub use clock::*;
pub use library_store::*;
