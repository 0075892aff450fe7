//! A regular 2-D hash of Level-1 ground points, sized to roughly 25-30
//! samples per cell, supporting k-nearest and four-quadrant queries via a
//! concentric ring sweep.

use crate::index::cell::IndexCell;
use crate::index::metric::Metric;
use crate::index::sample::{PositionSource, Sample};
use crate::raster::DataAccessor;
use crate::{BBox, Point, Result};

fn insert_sorted_capped(results: &mut Vec<Sample>, sample: Sample, cap: usize) {
    let pos = results.partition_point(|s| s.distance_sq <= sample.distance_sq);
    if results.len() < cap {
        results.insert(pos, sample);
    } else if pos < cap {
        results.insert(pos, sample);
        results.truncate(cap);
    }
}

pub struct TreeGrid {
    tlx: f64,
    tly: f64,
    sx: f64,
    sy: f64,
    rows: i64,
    cols: i64,
    cells: Vec<Option<usize>>,
    arena: Vec<IndexCell>,
    metric: Metric,
    max_rings: i64,
}

impl TreeGrid {
    /// `mean_dx`/`mean_dy` are the estimated mean sample spacing; cell size
    /// is `5x` that, targeting ~25-30 samples per cell.
    pub fn new(tlx: f64, tly: f64, brx: f64, bry: f64, mean_dx: f64, mean_dy: f64, metric: Metric) -> Self {
        let sx = (5.0 * mean_dx).max(1e-9);
        let sy = (5.0 * mean_dy).max(1e-9);
        let rows = ((tly - bry) / sy).ceil() as i64 + 1;
        let cols = ((brx - tlx) / sx).ceil() as i64 + 1;

        TreeGrid {
            tlx,
            tly,
            sx,
            sy,
            rows,
            cols,
            cells: vec![None; (rows * cols).max(0) as usize],
            arena: Vec::new(),
            max_rings: rows.max(cols) + 1,
            metric,
        }
    }

    pub fn rows(&self) -> i64 {
        self.rows
    }

    pub fn cols(&self) -> i64 {
        self.cols
    }

    fn raw_cell_rc(&self, x: f64, y: f64) -> (i64, i64) {
        let row = ((self.tly - y) / self.sy).floor() as i64;
        let col = ((x - self.tlx) / self.sx).floor() as i64;
        (row, col)
    }

    fn cell_rc(&self, x: f64, y: f64) -> Option<(i64, i64)> {
        let (row, col) = self.raw_cell_rc(x, y);
        if row >= 0 && row < self.rows && col >= 0 && col < self.cols {
            Some((row, col))
        } else {
            None
        }
    }

    fn cell_index(&self, row: i64, col: i64) -> usize {
        (row * self.cols + col) as usize
    }

    /// Inserts the Level-1 sample at `(igm_row, igm_col)`, looking up its
    /// ground position through `source`. Out-of-bounds points are dropped
    /// with a log entry rather than panicking.
    pub fn insert(&mut self, source: &dyn PositionSource, igm_row: i64, igm_col: i64) -> Result {
        let p = source.position(igm_row, igm_col)?;
        match self.cell_rc(p.x(), p.y()) {
            None => {
                log::debug!("TreeGrid: dropping out-of-bounds sample ({igm_row}, {igm_col}) at ({}, {})", p.x(), p.y());
                Ok(())
            }
            Some((row, col)) => {
                let idx = self.cell_index(row, col);
                let cell_id = match self.cells[idx] {
                    Some(id) => id,
                    None => {
                        let cx = self.tlx + (col as f64 + 0.5) * self.sx;
                        let cy = self.tly - (row as f64 + 0.5) * self.sy;
                        let id = self.arena.len();
                        self.arena.push(IndexCell::new(Point::new(cx, cy), self.sx / 2.0, self.sy / 2.0));
                        self.cells[idx] = Some(id);
                        id
                    }
                };
                self.arena[cell_id].samples.push(Sample::new(igm_row, igm_col));
                Ok(())
            }
        }
    }

    /// Cells at ring `k` (Chebyshev distance `k`) around `(r0, c0)`. `k=0`
    /// is the home cell itself and is handled separately by the caller.
    fn ring_cells(&self, r0: i64, c0: i64, k: i64) -> Vec<(i64, i64)> {
        let mut out = Vec::with_capacity(8 * k as usize);
        for c in (c0 - k)..=(c0 + k) {
            out.push((r0 - k, c));
            out.push((r0 + k, c));
        }
        for r in (r0 - k + 1)..=(r0 + k - 1) {
            out.push((r, c0 - k));
            out.push((r, c0 + k));
        }
        out
    }

    /// Visits one cell for a search: returns `Ok(true)` if the cell exists
    /// and its bounding box intersects `search_box` (used to decide when a
    /// ring has gone dry), invoking `on_sample` for every non-ignored
    /// sample it holds.
    fn visit_cell(
        &self,
        row: i64,
        col: i64,
        search_box: &BBox,
        source: &dyn PositionSource,
        accessor: &DataAccessor,
        band: usize,
        ignore_value: Option<f64>,
        radius_sq: f64,
        on_sample: &mut dyn FnMut(Sample, f64),
    ) -> Result<bool> {
        if row < 0 || row >= self.rows || col < 0 || col >= self.cols {
            return Ok(false);
        }
        let idx = self.cell_index(row, col);
        let Some(cell_id) = self.cells[idx] else {
            return Ok(false);
        };
        let cell = &self.arena[cell_id];
        if !cell.intersects(search_box) {
            return Ok(false);
        }

        for &sample in &cell.samples {
            let value = accessor.get(band, sample.igm_row, sample.igm_col)?;
            if ignore_value == Some(value) {
                continue;
            }
            let pos = source.position(sample.igm_row, sample.igm_col)?;
            let center = Point::new((search_box.min_x + search_box.max_x) / 2.0, (search_box.min_y + search_box.max_y) / 2.0);
            let d2 = self.metric.distance_sq(center, pos);
            if d2 > radius_sq {
                continue;
            }
            let mut s = sample;
            s.distance_sq = d2;
            on_sample(s, d2);
        }

        Ok(true)
    }

    fn sweep(
        &self,
        p: Point,
        radius_m: f64,
        source: &dyn PositionSource,
        accessor: &DataAccessor,
        band: usize,
        ignore_value: Option<f64>,
        mut on_sample: impl FnMut(Sample, f64),
    ) -> Result {
        let (dx, dy) = self.metric.radius_to_extent(p, radius_m);
        let search_box = BBox::centered_on(p, dx, dy);
        let radius_sq = radius_m * radius_m;
        let (r0, c0) = self.raw_cell_rc(p.x(), p.y());

        if let Some((hr, hc)) = self.cell_rc(p.x(), p.y()) {
            self.visit_cell(hr, hc, &search_box, source, accessor, band, ignore_value, radius_sq, &mut on_sample)?;
        }

        for k in 1..=self.max_rings {
            let mut any_intersect = false;
            for (row, col) in self.ring_cells(r0, c0, k) {
                if self.visit_cell(row, col, &search_box, source, accessor, band, ignore_value, radius_sq, &mut on_sample)? {
                    any_intersect = true;
                }
            }
            if !any_intersect {
                break;
            }
        }

        Ok(())
    }

    /// Up to `k` nearest non-ignored samples within `radius_m`, ascending by
    /// distance. Fewer than `k` are returned if fewer qualify.
    pub fn k_nearest(
        &self,
        source: &dyn PositionSource,
        accessor: &DataAccessor,
        p: Point,
        k: usize,
        radius_m: f64,
        band: usize,
        ignore_value: Option<f64>,
    ) -> Result<Vec<Sample>> {
        let mut results = Vec::with_capacity(k);
        self.sweep(p, radius_m, source, accessor, band, ignore_value, |sample, _| {
            insert_sorted_capped(&mut results, sample, k);
        })?;
        Ok(results)
    }

    /// Up to `4 * n_per_quadrant` samples, `n_per_quadrant` per quadrant
    /// (UL, UR, BL, BR) around `p`. A quadrant with fewer than
    /// `n_per_quadrant` samples at completion signals interpolation failure
    /// to the caller (it returns the partial result; the caller decides).
    pub fn quad(
        &self,
        source: &dyn PositionSource,
        accessor: &DataAccessor,
        p: Point,
        n_per_quadrant: usize,
        radius_m: f64,
        band: usize,
        ignore_value: Option<f64>,
    ) -> Result<[Vec<Sample>; 4]> {
        let (dx, dy) = self.metric.radius_to_extent(p, radius_m);
        let search_box = BBox::centered_on(p, dx, dy);
        let radius_sq = radius_m * radius_m;
        let (r0, c0) = self.raw_cell_rc(p.x(), p.y());

        let mut quadrants: [Vec<Sample>; 4] = Default::default();
        let mut current_radius_sq = radius_sq;

        fn classify_into(quadrants: &mut [Vec<Sample>; 4], source: &dyn PositionSource, p: Point, sample: Sample, n_per_quadrant: usize) {
            let Ok(pos) = source.position(sample.igm_row, sample.igm_col) else {
                return;
            };
            let q = match (pos.y() >= p.y(), pos.x() <= p.x()) {
                (true, true) => 0,   // UL
                (true, false) => 1,  // UR
                (false, true) => 2,  // BL
                (false, false) => 3, // BR
            };
            insert_sorted_capped(&mut quadrants[q], sample, n_per_quadrant);
        }

        if let Some((hr, hc)) = self.cell_rc(p.x(), p.y()) {
            self.visit_cell(hr, hc, &search_box, source, accessor, band, ignore_value, current_radius_sq, &mut |sample, _| {
                classify_into(&mut quadrants, source, p, sample, n_per_quadrant);
            })?;
        }

        for k in 1..=self.max_rings {
            let mut any_intersect = false;
            for (row, col) in self.ring_cells(r0, c0, k) {
                if self.visit_cell(row, col, &search_box, source, accessor, band, ignore_value, current_radius_sq, &mut |sample, _| {
                    classify_into(&mut quadrants, source, p, sample, n_per_quadrant);
                })? {
                    any_intersect = true;
                }
            }
            if !any_intersect {
                break;
            }

            if quadrants.iter().all(|q| q.len() >= n_per_quadrant) {
                current_radius_sq = quadrants.iter().map(|q| q.last().map(|s| s.distance_sq).unwrap_or(0.0)).fold(0.0, f64::max);
                if current_radius_sq < radius_sq {
                    continue;
                }
            }
        }

        Ok(quadrants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RasterDataType;
    use crate::raster::RasterHeader;
    use std::collections::HashMap;

    struct TestSource {
        points: HashMap<(i64, i64), Point>,
    }

    impl PositionSource for TestSource {
        fn position(&self, igm_row: i64, igm_col: i64) -> Result<Point> {
            Ok(self.points[&(igm_row, igm_col)])
        }
    }

    /// A reader stub that always returns `0.0`, used where the test never
    /// exercises the ignore-value fallback path but `DataAccessor::get`
    /// still needs something to call.
    struct ZeroReader {
        header: RasterHeader,
    }

    impl crate::raster::RasterReader for ZeroReader {
        fn header(&self) -> &RasterHeader {
            &self.header
        }

        fn read_band_line(&mut self, _band: usize, _row: i64, buf: &mut [f64]) -> Result {
            buf.fill(0.0);
            Ok(())
        }

        fn read_line(&mut self, _row: i64, buf: &mut [f64]) -> Result {
            buf.fill(0.0);
            Ok(())
        }
    }

    fn make_grid() -> (TreeGrid, TestSource) {
        let mut points = HashMap::new();
        let mut grid = TreeGrid::new(0.0, 10.0, 10.0, 0.0, 1.0, 1.0, Metric::Planar);
        let mut id = 0i64;
        for row in 0..10 {
            for col in 0..10 {
                let p = Point::new(col as f64 + 0.5, 9.5 - row as f64);
                points.insert((0, id), p);
                grid.insert(&TestSource { points: points.clone() }, 0, id).unwrap();
                id += 1;
            }
        }
        (grid, TestSource { points })
    }

    #[test]
    fn round_trip_returns_exact_sample_at_zero_distance() {
        let (grid, source) = make_grid();
        let mut reader = ZeroReader {
            header: RasterHeader::new(1, 100, 1, RasterDataType::Float64),
        };
        let accessor = DataAccessor::new(None, vec![0], &mut reader);

        let target = Point::new(5.5, 9.5 - 3.0);
        let result = grid.k_nearest(&source, &accessor, target, 1, 1.0, 0, None).unwrap();
        assert_eq!(result.len(), 1);
        assert!(result[0].distance_sq < 1e-9);
    }

    #[test]
    fn quad_query_returns_one_sample_per_quadrant() {
        let (grid, source) = make_grid();
        let mut reader = ZeroReader {
            header: RasterHeader::new(1, 100, 1, RasterDataType::Float64),
        };
        let accessor = DataAccessor::new(None, vec![0], &mut reader);

        let target = Point::new(5.0, 5.0);
        let quads = grid.quad(&source, &accessor, target, 1, 20.0, 0, None).unwrap();
        for q in &quads {
            assert_eq!(q.len(), 1);
        }
    }
}
