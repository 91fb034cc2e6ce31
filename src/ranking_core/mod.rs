//! Dated ranking snapshots reduced into ranking rows
//!
//! Components:
//! - `snapshot`: CSV snapshot parsing and directory scanning
//! - `period`: weekly period keys
//! - `aggregator`: grouping, reduction and emission per ranking type

pub mod aggregator;
pub mod period;
pub mod snapshot;

pub use aggregator::{group_periods, reduce_last, reduce_mean, AggregatorOptions, Period, RankingAggregator};
pub use period::{following, parse_week_day};
pub use snapshot::{list_snapshots, read_rows, read_snapshot, snapshot_date, RankingSnapshot, SnapshotRow};
