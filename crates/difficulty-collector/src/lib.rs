//! Collection of daily difficulty scores.
//!
//! The [`Collector`] drives fetch → parse → store for a single day or a
//! date range, with retry and rate-limit policy. Fetching goes through the
//! [`Scraper`] trait so the controller can run against a scripted page
//! source in tests.

// Native `async fn` in traits; the scraper is only driven from one task.
#![allow(async_fn_in_trait)]

pub mod config;
pub mod controller;
pub mod error;
pub mod extract;
pub mod progress;
pub mod scraper;

pub use config::CollectorConfig;
pub use controller::{AttemptOutcome, BackfillReport, Collector, DailyOutcome, companion_url};
pub use error::{Error, Result};
pub use scraper::{FetchError, HttpScraper, Page, Scraper};
