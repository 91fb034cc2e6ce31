//! Board game data loader, ranking aggregator and charts engine
//!
//! - `loader_core`: two-pass entity loading from scraped records
//! - `ranking_core`: dated ranking snapshots reduced per period
//! - `charts_core`: trending charts from raw user ratings
//! - `store`: SQLite persistence
//! - `pipeline`: the runs behind the `filldb`, `fillrankingdb` and `charts` binaries

pub mod charts_core;
pub mod config;
pub mod dates;
pub mod error;
pub mod loader_core;
pub mod model;
pub mod pipeline;
pub mod ranking_core;
pub mod recommender;
pub mod report;
pub mod source;
pub mod stats;
pub mod store;

pub use error::LoadError;
pub use report::LoadReport;
