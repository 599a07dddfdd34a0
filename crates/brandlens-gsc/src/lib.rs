//! Search Console REST client and period-fetch orchestration.

pub mod client;
pub mod error;
pub mod fetch;
pub mod types;

pub use client::{GscClient, DEFAULT_ROW_LIMIT};
pub use error::GscError;
pub use fetch::{fetch_period, FetchedPeriod};
