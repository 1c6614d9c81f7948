mod checkout_service;
mod errors;
mod library_manager;

pub use checkout_service::{
    CheckoutReceipt, ReturnReceipt, ServiceDependencies, check_eligibility, checkout_book,
    list_available_copies, list_user_checkouts, return_book,
};
pub use errors::{CheckoutApplicationError, Result};
pub use library_manager::LibraryManager;
