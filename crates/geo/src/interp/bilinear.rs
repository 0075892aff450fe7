//! Bilinear interpolation over the four-quadrant TreeGrid query (§4.6.4),
//! the default kernel.

use crate::Point;
use crate::Result;
use crate::index::{PositionSource, Sample, TreeGrid};
use crate::interp::quadmath::{bilinear_value, solve_uv};
use crate::raster::DataAccessor;

fn corner_pos(source: &dyn PositionSource, quadrant: &[Sample]) -> Result<Option<Point>> {
    match quadrant.first() {
        Some(s) => Ok(Some(source.position(s.igm_row, s.igm_col)?)),
        None => Ok(None),
    }
}

pub fn bilinear_quad(
    grid: &TreeGrid,
    source: &dyn PositionSource,
    accessor: &DataAccessor,
    p: Point,
    bands: &[usize],
    max_interp_distance: f64,
    ignore_value: Option<f64>,
    no_data: f64,
) -> Result<Vec<f64>> {
    let probe_band = bands.first().copied().unwrap_or(0);
    let quads = grid.quad(source, accessor, p, 1, max_interp_distance, probe_band, None)?;
    if quads.iter().any(|q| q.is_empty()) {
        return Ok(vec![no_data; bands.len()]);
    }

    let corners = [
        corner_pos(source, &quads[0])?,
        corner_pos(source, &quads[1])?,
        corner_pos(source, &quads[2])?,
        corner_pos(source, &quads[3])?,
    ];
    let (Some(ul), Some(ur), Some(bl), Some(br)) = (corners[0], corners[1], corners[2], corners[3]) else {
        return Ok(vec![no_data; bands.len()]);
    };

    let Some((u, v)) = solve_uv(ul, ur, bl, br, p) else {
        return Ok(vec![no_data; bands.len()]);
    };
    if !(-1e-6..=1.0 + 1e-6).contains(&u) || !(-1e-6..=1.0 + 1e-6).contains(&v) {
        return Ok(vec![no_data; bands.len()]);
    }

    let mut out = Vec::with_capacity(bands.len());
    for &band in bands {
        let mut values = [
            accessor.get(band, quads[0][0].igm_row, quads[0][0].igm_col)?,
            accessor.get(band, quads[1][0].igm_row, quads[1][0].igm_col)?,
            accessor.get(band, quads[2][0].igm_row, quads[2][0].igm_col)?,
            accessor.get(band, quads[3][0].igm_row, quads[3][0].igm_col)?,
        ];

        if values.iter().any(|&v| ignore_value == Some(v)) {
            let retry = grid.quad(source, accessor, p, 1, max_interp_distance, band, ignore_value)?;
            if retry.iter().any(|q| q.is_empty()) {
                out.push(no_data);
                continue;
            }
            values = [
                accessor.get(band, retry[0][0].igm_row, retry[0][0].igm_col)?,
                accessor.get(band, retry[1][0].igm_row, retry[1][0].igm_col)?,
                accessor.get(band, retry[2][0].igm_row, retry[2][0].igm_col)?,
                accessor.get(band, retry[3][0].igm_row, retry[3][0].igm_col)?,
            ];
        }

        out.push(bilinear_value(values[0], values[1], values[2], values[3], u, v));
    }

    Ok(out)
}
