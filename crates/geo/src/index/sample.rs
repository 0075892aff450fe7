//! The unit inserted into the spatial index.

use crate::{Point, Result};

/// A Level-1 sample known to the index by its integer `(igm_row, igm_col)`.
/// `x`/`y` are looked up lazily through a `PositionSource` rather than
/// duplicated here. `distance_sq` is transient, populated by search.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sample {
    pub igm_row: i64,
    pub igm_col: i64,
    pub distance_sq: f64,
}

impl Sample {
    pub fn new(igm_row: i64, igm_col: i64) -> Self {
        Sample {
            igm_row,
            igm_col,
            distance_sq: f64::INFINITY,
        }
    }
}

/// Resolves a sample's ground position from its IGM indices. Implemented by
/// a `DataAccessor`-backed reader over the IGM's X/Y bands; kept as a
/// trait so `TreeGrid` doesn't need to own or borrow the accessor itself.
pub trait PositionSource {
    fn position(&self, igm_row: i64, igm_col: i64) -> Result<Point>;
}

pub struct IgmPositionSource<'a> {
    accessor: crate::raster::DataAccessor<'a>,
}

impl<'a> IgmPositionSource<'a> {
    /// `accessor` must be reading an IGM whose band 0 is X and band 1 is Y.
    pub fn new(accessor: crate::raster::DataAccessor<'a>) -> Self {
        IgmPositionSource { accessor }
    }
}

impl PositionSource for IgmPositionSource<'_> {
    fn position(&self, igm_row: i64, igm_col: i64) -> Result<Point> {
        let x = self.accessor.get(0, igm_row, igm_col)?;
        let y = self.accessor.get(1, igm_row, igm_col)?;
        Ok(Point::new(x, y))
    }
}
