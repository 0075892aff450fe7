//! Bilinear interpolation over a quad built from the nearest IGM sample and
//! its row/column neighbours (§4.6.3), rather than a fresh TreeGrid quad
//! query. Cheaper per-cell than [`crate::interp::bilinear::bilinear_quad`]
//! but undefined at the IGM's own row/column edges.

use crate::Point;
use crate::Result;
use crate::index::{PositionSource, TreeGrid};
use crate::interp::quadmath::{bilinear_value, solve_uv};
use crate::raster::DataAccessor;

const MAX_SHIFT_ITERATIONS: usize = 10;

/// `row_bounds` is the inclusive `[lo, hi]` range of IGM rows currently
/// loaded for this segment (global numbering, since a segment's rows don't
/// start at zero); it only keeps the quad-shift loop from reading rows that
/// aren't in memory, and is not an abort condition. `col_bounds` is the
/// IGM's own column range: per spec, `c = 0` or `c = cols - 1` abort this
/// interpolator.
#[allow(clippy::too_many_arguments)]
pub fn bilinear_level1_quad(
    grid: &TreeGrid,
    source: &dyn PositionSource,
    accessor: &DataAccessor,
    row_bounds: (i64, i64),
    col_bounds: (i64, i64),
    p: Point,
    bands: &[usize],
    max_interp_distance: f64,
    ignore_value: Option<f64>,
    no_data: f64,
) -> Result<Vec<f64>> {
    let probe_band = bands.first().copied().unwrap_or(0);
    let nearest = grid.k_nearest(source, accessor, p, 1, max_interp_distance, probe_band, None)?;
    let Some(anchor) = nearest.first() else {
        return Ok(vec![no_data; bands.len()]);
    };

    let (row0, col0) = (anchor.igm_row, anchor.igm_col);
    if col0 <= col_bounds.0 || col0 >= col_bounds.1 {
        return Ok(vec![no_data; bands.len()]);
    }

    let row_neighbour = closer_of(source, p, row0 - 1, col0, row0 + 1, col0)?;
    let col_neighbour = closer_of(source, p, row0, col0 - 1, row0, col0 + 1)?;

    let mut ra = row0.min(row_neighbour);
    let mut rb = row0.max(row_neighbour);
    let mut ca = col0.min(col_neighbour);
    let mut cb = col0.max(col_neighbour);

    let quad_positions = |ra: i64, rb: i64, ca: i64, cb: i64| -> Result<Option<(Point, Point, Point, Point)>> {
        if ra < row_bounds.0 || rb > row_bounds.1 || ca < col_bounds.0 || cb > col_bounds.1 {
            return Ok(None);
        }
        Ok(Some((source.position(ra, ca)?, source.position(ra, cb)?, source.position(rb, ca)?, source.position(rb, cb)?)))
    };

    let mut solved = None;
    for _ in 0..MAX_SHIFT_ITERATIONS {
        let Some((ul, ur, bl, br)) = quad_positions(ra, rb, ca, cb)? else {
            break;
        };
        match solve_uv(ul, ur, bl, br, p) {
            Some((u, v)) if (0.0..=1.0).contains(&u) && (0.0..=1.0).contains(&v) => {
                solved = Some((u, v, ra, rb, ca, cb));
                break;
            }
            Some((u, v)) => {
                if v < 0.0 {
                    ra -= 1;
                    rb -= 1;
                } else if v > 1.0 {
                    ra += 1;
                    rb += 1;
                }
                if u < 0.0 {
                    ca -= 1;
                    cb -= 1;
                } else if u > 1.0 {
                    ca += 1;
                    cb += 1;
                }
            }
            None => break,
        }
    }

    let Some((u, v, ra, rb, ca, cb)) = solved else {
        return Ok(vec![no_data; bands.len()]);
    };

    let mut out = Vec::with_capacity(bands.len());
    for &band in bands {
        let mut d00 = accessor.get(band, ra, ca)?;
        let mut d01 = accessor.get(band, ra, cb)?;
        let mut d10 = accessor.get(band, rb, ca)?;
        let mut d11 = accessor.get(band, rb, cb)?;

        if [d00, d01, d10, d11].iter().any(|&x| ignore_value == Some(x)) {
            let retry = grid.k_nearest(source, accessor, p, 1, max_interp_distance, band, ignore_value)?;
            match retry.first() {
                Some(s) => {
                    let value = accessor.get(band, s.igm_row, s.igm_col)?;
                    d00 = value;
                    d01 = value;
                    d10 = value;
                    d11 = value;
                }
                None => {
                    out.push(no_data);
                    continue;
                }
            }
        }

        out.push(bilinear_value(d00, d01, d10, d11, u, v));
    }

    Ok(out)
}

fn closer_of(source: &dyn PositionSource, target: Point, row_a: i64, col_a: i64, row_b: i64, col_b: i64) -> Result<i64> {
    let pa = source.position(row_a, col_a)?;
    let pb = source.position(row_b, col_b)?;
    let da = (pa.x() - target.x()).powi(2) + (pa.y() - target.y()).powi(2);
    let db = (pb.x() - target.x()).powi(2) + (pb.y() - target.y()).powi(2);
    Ok(if da <= db { if row_a != row_b { row_a } else { col_a } } else if row_a != row_b { row_b } else { col_b })
}
