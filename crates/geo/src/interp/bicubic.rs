//! Bicubic interpolation over a 4x4 neighbourhood (§4.6.5): a non-uniform
//! Catmull-Rom Hermite spline evaluated against the actual ground positions
//! of a 4x4 sample grid, first along ground X per row then along ground Y
//! across the four row results. The 4x4 grid comes from a `quad` query with
//! `n_per_quadrant = 4`, reordered into rows by ground Y then columns by
//! ground X.

use crate::Point;
use crate::Result;
use crate::index::{PositionSource, Sample, TreeGrid};
use crate::raster::DataAccessor;

/// Non-uniform Catmull-Rom Hermite spline through `(xs[1], vs[1])` and
/// `(xs[2], vs[2])`, with `xs[0]`/`vs[0]` and `xs[3]`/`vs[3]` used only to
/// derive the tangents `m_{i-1}`/`m_i` at those two knots. `None` when the
/// knot spacing or either tangent's denominator is degenerate.
fn catmull_rom_nonuniform(xs: [f64; 4], vs: [f64; 4], x: f64) -> Option<f64> {
    let h = xs[2] - xs[1];
    if h.abs() < 1e-9 {
        return None;
    }
    let m1 = (vs[2] - vs[0]) / (xs[2] - xs[0]);
    let m2 = (vs[3] - vs[1]) / (xs[3] - xs[1]);
    if !m1.is_finite() || !m2.is_finite() {
        return None;
    }

    let t = (x - xs[1]) / h;
    let t2 = t * t;
    let t3 = t2 * t;
    Some(
        (2.0 * t3 - 3.0 * t2 + 1.0) * vs[1]
            + (t3 - 2.0 * t2 + t) * h * m1
            + (-2.0 * t3 + 3.0 * t2) * vs[2]
            + (t3 - t2) * h * m2,
    )
}

/// Flattens the four quadrant sample lists into a 4x4 grid, row-major with
/// row 0 at the greatest ground Y. `None` if any quadrant has fewer than 4
/// samples.
fn build_grid(source: &dyn PositionSource, quads: &[Vec<Sample>; 4]) -> Result<Option<Vec<Vec<(Sample, Point)>>>> {
    let mut all: Vec<(Sample, Point)> = Vec::with_capacity(16);
    for quadrant in quads {
        if quadrant.len() < 4 {
            return Ok(None);
        }
        for &s in quadrant.iter().take(4) {
            all.push((s, source.position(s.igm_row, s.igm_col)?));
        }
    }
    all.sort_by(|a, b| b.1.y().partial_cmp(&a.1.y()).unwrap_or(std::cmp::Ordering::Equal));

    let mut grid = Vec::with_capacity(4);
    for chunk in all.chunks(4).take(4) {
        let mut row = chunk.to_vec();
        row.sort_by(|a, b| a.1.x().partial_cmp(&b.1.x()).unwrap_or(std::cmp::Ordering::Equal));
        grid.push(row);
    }
    Ok(Some(grid))
}

fn gather_values(grid: &[Vec<(Sample, Point)>], accessor: &DataAccessor, band: usize) -> Result<[[f64; 4]; 4]> {
    let mut values = [[0.0f64; 4]; 4];
    for (r, row) in grid.iter().enumerate() {
        for (c, (sample, _)) in row.iter().enumerate() {
            values[r][c] = accessor.get(band, sample.igm_row, sample.igm_col)?;
        }
    }
    Ok(values)
}

/// Evaluates the spline at `p` over `grid`/`values`: one pass along ground X
/// per row at `p.x()`, then one pass along ground Y, at `p.y()`, over the
/// four row results. Each row's representative ground Y is the mean of its
/// four samples' ground Y (the grid is not generally axis-aligned).
fn spline_value(grid: &[Vec<(Sample, Point)>], values: [[f64; 4]; 4], p: Point) -> Option<f64> {
    let mut row_values = [0.0f64; 4];
    for r in 0..4 {
        let mut xs = [0.0f64; 4];
        for c in 0..4 {
            xs[c] = grid[r][c].1.x();
        }
        row_values[r] = catmull_rom_nonuniform(xs, values[r], p.x())?;
    }

    let mut ys = [0.0f64; 4];
    for r in 0..4 {
        ys[r] = grid[r].iter().map(|(_, pt)| pt.y()).sum::<f64>() / 4.0;
    }
    catmull_rom_nonuniform(ys, row_values, p.y())
}

pub fn bicubic(
    grid_index: &TreeGrid,
    source: &dyn PositionSource,
    accessor: &DataAccessor,
    p: Point,
    bands: &[usize],
    max_interp_distance: f64,
    ignore_value: Option<f64>,
    no_data: f64,
) -> Result<Vec<f64>> {
    let probe_band = bands.first().copied().unwrap_or(0);
    let quads = grid_index.quad(source, accessor, p, 4, max_interp_distance, probe_band, None)?;
    let Some(grid) = build_grid(source, &quads)? else {
        return Ok(vec![no_data; bands.len()]);
    };

    let mut out = Vec::with_capacity(bands.len());
    for &band in bands {
        let values = gather_values(&grid, accessor, band)?;
        let any_ignored = values.iter().flatten().any(|&v| ignore_value == Some(v));

        if !any_ignored {
            out.push(spline_value(&grid, values, p).unwrap_or(no_data));
            continue;
        }

        let retry_quads = grid_index.quad(source, accessor, p, 4, max_interp_distance, band, ignore_value)?;
        match build_grid(source, &retry_quads)? {
            Some(retry_grid) => {
                let retry_values = gather_values(&retry_grid, accessor, band)?;
                out.push(spline_value(&retry_grid, retry_values, p).unwrap_or(no_data));
            }
            None => out.push(no_data),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonuniform_spline_reproduces_a_linear_function_exactly() {
        let xs = [0.0, 2.0, 5.0, 9.0];
        let vs = [0.0, 2.0, 5.0, 9.0];
        let value = catmull_rom_nonuniform(xs, vs, 3.5).unwrap();
        assert!((value - 3.5).abs() < 1e-9);
    }

    #[test]
    fn nonuniform_spline_hits_its_knots_exactly() {
        let xs = [0.0, 1.0, 4.0, 6.0];
        let vs = [10.0, -3.0, 7.0, 2.0];
        assert!((catmull_rom_nonuniform(xs, vs, xs[1]).unwrap() - vs[1]).abs() < 1e-9);
        assert!((catmull_rom_nonuniform(xs, vs, xs[2]).unwrap() - vs[2]).abs() < 1e-9);
    }

    #[test]
    fn nonuniform_spline_rejects_degenerate_knot_spacing() {
        let xs = [0.0, 1.0, 1.0, 2.0];
        let vs = [0.0, 1.0, 1.0, 2.0];
        assert!(catmull_rom_nonuniform(xs, vs, 1.0).is_none());
    }
}
