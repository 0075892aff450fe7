//! Nearest-neighbour interpolation (§4.6.1).

use crate::Point;
use crate::Result;
use crate::index::{PositionSource, TreeGrid};
use crate::raster::DataAccessor;

/// Returns one value per band plus the `(igm_row, igm_col)` actually used
/// (for the optional row/col map), or `None` chosen sample when the search
/// found nothing within `max_interp_distance`.
pub fn nearest_neighbour(
    grid: &TreeGrid,
    source: &dyn PositionSource,
    accessor: &DataAccessor,
    p: Point,
    bands: &[usize],
    max_interp_distance: f64,
    ignore_value: Option<f64>,
    no_data: f64,
) -> Result<(Vec<f64>, Option<(i64, i64)>)> {
    let probe_band = bands.first().copied().unwrap_or(0);
    let base = grid.k_nearest(source, accessor, p, 1, max_interp_distance, probe_band, None)?;

    let Some(sample) = base.first() else {
        return Ok((vec![no_data; bands.len()], None));
    };

    let mut out = Vec::with_capacity(bands.len());
    let mut chosen = Some((sample.igm_row, sample.igm_col));

    for &band in bands {
        let value = accessor.get(band, sample.igm_row, sample.igm_col)?;
        if ignore_value == Some(value) {
            let retry = grid.k_nearest(source, accessor, p, 1, max_interp_distance, band, ignore_value)?;
            match retry.first() {
                Some(s) => {
                    chosen = Some((s.igm_row, s.igm_col));
                    out.push(accessor.get(band, s.igm_row, s.igm_col)?);
                }
                None => out.push(no_data),
            }
        } else {
            out.push(value);
        }
    }

    Ok((out, chosen))
}
