//! Pure analysis engine for brand vs non-brand search performance.
//!
//! Everything in this crate is synchronous and I/O-free: rows go in,
//! [`PeriodResult`]/[`ComparisonResult`] values come out. Fetching rows from
//! Search Console lives in `brandlens-gsc`; rendering lives in
//! `brandlens-report`.

pub mod aggregate;
pub mod app_config;
pub mod classify;
pub mod compare;
pub mod config;
pub mod dates;
pub mod domain;
pub mod error;
pub mod site;

pub use aggregate::{aggregate, ClassAggregate, PeriodResult, QuerySnapshot, RawQueryRow};
pub use app_config::{AppConfig, Environment};
pub use classify::{BrandPattern, QueryClass};
pub use compare::{compare, pct_change, ComparisonResult, QueryDelta};
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use dates::{DateRange, DateRangeError};
pub use error::AnalysisError;
pub use site::{resolve_site, SiteEntry};
