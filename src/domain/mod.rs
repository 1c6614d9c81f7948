pub mod catalog;
pub mod checkout;
pub mod commands;
pub mod errors;
pub mod outcomes;
pub mod value_objects;

pub use catalog::*;
pub use errors::*;
pub use outcomes::*;
pub use value_objects::*;
