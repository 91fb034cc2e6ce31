//! Trending charts from raw user ratings
//!
//! Components:
//! - `ratings`: rating events from JSON lines
//! - `scorer`: fixed-window and decaying trending scores
//! - `schedule`: consecutive weekly/monthly/annual charts written as CSV

pub mod ratings;
pub mod scorer;
pub mod schedule;

pub use ratings::{read_ratings, RatingEvent};
pub use schedule::{write_charts, ChartsSchedule, Frequency};
pub use scorer::{ChartEntry, ChartsMode, ChartsScorer};
