//! End-to-end runs behind the binaries
//!
//! Each run returns a [`LoadReport`](crate::report::LoadReport); errors are
//! returned only for fatal setup problems (unreadable inputs, broken store).

pub mod charts;
pub mod filldb;
pub mod rankings;

pub use charts::run_charts;
pub use filldb::run_filldb;
pub use rankings::run_rankings;
