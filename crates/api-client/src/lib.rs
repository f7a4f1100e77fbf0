//! # Pulse API Client
//!
//! Typed collectors for the three external platforms the pipeline pulls from:
//! the banking platform (cash transactions and account statements), the
//! billing platform (subscriptions) and the product-analytics platform (user
//! profiles).
//!
//! ## Architectural Principles
//!
//! - **Trait seams:** the rest of the workspace depends on the
//!   [`TransactionSource`], [`SubscriptionSource`] and [`ProfileSource`]
//!   traits, never on a concrete client, so models can be fed from in-memory
//!   fakes in tests.
//! - **Credentials up front:** every client resolves its secrets in `new`, so
//!   a missing secret fails the run before any request is made.
//! - **Sequential paging:** all pagination loops await one page at a time.
//!
//! ## Public API
//!
//! - [`BankingClient`], [`BillingClient`], [`ProductAnalyticsClient`]
//! - [`cached`]: the on-disk cache wrapper for any collector call.
//! - [`ApiError`]

use async_trait::async_trait;
use core_types::{AccountStatement, BankTransaction, MonthWindow, Profile, Subscription};

pub mod banking;
pub mod billing;
pub mod cache;
pub mod error;
mod http;
pub mod pagination;
pub mod product_analytics;
pub mod responses;
pub mod retry;

// --- Public API ---
pub use banking::BankingClient;
pub use billing::BillingClient;
pub use cache::cached;
pub use error::ApiError;
pub use product_analytics::{ProductAnalyticsClient, ProfileFilter};

/// The cash account on the banking platform.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Every posted transaction on the cash account.
    async fn fetch_transactions(&self) -> Result<Vec<BankTransaction>, ApiError>;

    /// Every periodic statement of the cash account.
    async fn fetch_statements(&self) -> Result<Vec<AccountStatement>, ApiError>;
}

/// Subscriptions in every status, past and present.
#[async_trait]
pub trait SubscriptionSource: Send + Sync {
    async fn fetch_subscriptions(&self) -> Result<Vec<Subscription>, ApiError>;
}

/// Answers the two questions the cohort model asks about a month.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// Users first seen in `[window.start, window.end)`.
    async fn first_seen(&self, window: &MonthWindow) -> Result<Vec<Profile>, ApiError>;

    /// Users who performed any tracked event in `[window.start, window.end)`.
    async fn active(&self, window: &MonthWindow) -> Result<Vec<Profile>, ApiError>;
}
