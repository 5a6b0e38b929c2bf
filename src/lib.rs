//! GitHub statistics for a portfolio site.
//!
//! [`StatsAggregator`] turns an account handle into a [`StatsSummary`] using
//! the GitHub GraphQL API, downgrading once to the REST API when GraphQL is
//! unavailable. [`StatsView`] sits in front of it with a short-lived cache
//! and bounded retries, and [`server`] exposes both over HTTP together with
//! the contact form endpoint.

pub mod age;
pub mod aggregate;
pub mod aggregator;
pub mod config;
pub mod contact;
pub mod error;
pub mod github;
pub mod rest;
pub mod server;
pub mod source;
pub mod stats;
pub mod view;

pub use aggregator::StatsAggregator;
pub use config::Config;
pub use error::{ContactError, StatsError};
pub use stats::StatsSummary;
pub use view::{StatsView, ViewState};
