pub mod cell;
pub mod metric;
pub mod sample;
pub mod treegrid;

pub use cell::IndexCell;
pub use metric::Metric;
pub use sample::{IgmPositionSource, PositionSource, Sample};
pub use treegrid::TreeGrid;
