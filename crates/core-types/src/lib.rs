pub mod calendar;
pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use calendar::{add_months, first_of_month, month_windows, MonthWindow};
pub use enums::{CollectorKind, RevenueGranularity};
pub use error::CoreError;
pub use structs::{AccountStatement, BankTransaction, DirectCustomer, Profile, Subscription};
