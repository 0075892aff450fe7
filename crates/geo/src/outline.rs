//! Converts the IGM's boundary pixels into a table of sorted edges in
//! output-grid row/col space, and sweeps them row by row to find the
//! column interval actually covered by the flight line.

use inf::warnonce::WarnOnce;

/// `min_x` is the column of the endpoint with the smaller row; `[min_y,
/// max_y)` is the half-open row span; `grad` is `dcol/drow`. Horizontal
/// edges (`drow = 0`) never exist as `Edge` values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub min_x: f64,
    pub min_y: i64,
    pub max_y: i64,
    pub grad: f64,
}

impl Edge {
    fn column_at(&self, row: i64) -> i64 {
        if row == self.min_y {
            self.min_x.ceil() as i64
        } else {
            (self.min_x + (row - self.min_y) as f64 * self.grad).ceil() as i64
        }
    }
}

/// Immutable table of edges plus the mutable "active" working set of a
/// forward-only scanline sweep. The active set at row `r` is exactly
/// `{ e : e.min_y <= r < e.max_y }`.
pub struct SwathOutline {
    edges: Vec<Edge>,
    active: Vec<usize>,
    next_edge: usize,
    started: bool,
    warn_once: WarnOnce,
}

impl SwathOutline {
    pub fn new(mut edges: Vec<Edge>) -> Self {
        edges.sort_by(|a, b| a.min_y.cmp(&b.min_y).then(a.min_x.partial_cmp(&b.min_x).unwrap_or(std::cmp::Ordering::Equal)));
        SwathOutline {
            edges,
            active: Vec::new(),
            next_edge: 0,
            started: false,
            warn_once: WarnOnce::default(),
        }
    }

    /// Builds edges by walking `points` (ordered boundary pixels, already
    /// converted to segment row/col space) as a closed perimeter, pairing
    /// each point with its successor (wrapping at the end). Horizontal
    /// pairs are skipped.
    pub fn from_boundary(points: &[(i64, i64)]) -> Self {
        let mut edges = Vec::new();
        let n = points.len();
        for i in 0..n {
            let (r1, c1) = points[i];
            let (r2, c2) = points[(i + 1) % n];
            if r1 == r2 {
                continue;
            }
            let (min_y, max_y, min_x, max_x_col) = if r1 < r2 { (r1, r2, c1 as f64, c2 as f64) } else { (r2, r1, c2 as f64, c1 as f64) };
            let grad = (max_x_col - min_x) / (max_y - min_y) as f64;
            edges.push(Edge { min_x, min_y, max_y, grad });
        }
        SwathOutline::new(edges)
    }

    /// Two vertical edges at columns `0` and `cols - 1` spanning every row:
    /// the correctness fallback used when the IGM slice is degenerate
    /// (a single row, or boundary collection failed).
    pub fn degenerate(rows: i64, cols: i64) -> Self {
        let edges = vec![
            Edge {
                min_x: 0.0,
                min_y: 0,
                max_y: rows,
                grad: 0.0,
            },
            Edge {
                min_x: (cols - 1) as f64,
                min_y: 0,
                max_y: rows,
                grad: 0.0,
            },
        ];
        SwathOutline::new(edges)
    }

    /// Column intersects at `row`, sorted ascending. Calls must be made
    /// with non-decreasing `row` (forward-only sweep); the first call may
    /// start at any row and seeds the active set by scanning every edge
    /// whose span contains it.
    pub fn intersects(&mut self, row: i64) -> Vec<i64> {
        if !self.started {
            self.started = true;
            self.active = self
                .edges
                .iter()
                .enumerate()
                .filter(|(_, e)| e.min_y <= row && row < e.max_y)
                .map(|(i, _)| i)
                .collect();
            self.next_edge = self.edges.partition_point(|e| e.min_y <= row);
        } else {
            self.active.retain(|&i| self.edges[i].max_y > row);
            while self.next_edge < self.edges.len() && self.edges[self.next_edge].min_y == row {
                self.active.push(self.next_edge);
                self.next_edge += 1;
            }
        }

        let mut cols: Vec<i64> = self.active.iter().map(|&i| self.edges[i].column_at(row)).collect();
        cols.sort_unstable();
        cols
    }

    /// The `[col_lo, col_hi]` window the engine should process for `row`,
    /// using only the outermost pair of intersects (conservative: handles
    /// self-overlapping swaths at the cost of over-mapping interiors).
    /// `None` means the row has no coverage at all.
    pub fn row_window(&mut self, row: i64, cols: i64) -> Option<(i64, i64)> {
        let intersects = self.intersects(row);
        if intersects.is_empty() {
            return None;
        }

        if intersects.len() % 2 != 0 {
            if self.warn_once.record("outline.odd_intersect_count") {
                log::warn!("swath outline: odd intersect count at row {row}, falling back to full row width");
            }
            return Some((0, cols - 1));
        }

        let lo = *intersects.first().unwrap();
        let hi = *intersects.last().unwrap();
        Some((lo.max(0), hi.min(cols - 1)))
    }

    pub fn warnings(&self) -> &WarnOnce {
        &self.warn_once
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rectangle(rows: i64, cols: i64) -> SwathOutline {
        // A simple closed rectangle: (0,0) -> (0,cols-1) -> (rows-1,cols-1) -> (rows-1,0) -> back.
        let points = vec![(0, 0), (0, cols - 1), (rows - 1, cols - 1), (rows - 1, 0)];
        SwathOutline::from_boundary(&points)
    }

    #[test]
    fn parity_is_even_for_every_row_of_a_simple_polygon() {
        let mut outline = rectangle(10, 10);
        for row in 0..10 {
            let hits = outline.intersects(row);
            assert_eq!(hits.len() % 2, 0, "row {row} had odd intersect count: {hits:?}");
        }
    }

    #[test]
    fn row_window_uses_outermost_pair() {
        let mut outline = rectangle(10, 10);
        let (lo, hi) = outline.row_window(5, 10).unwrap();
        assert_eq!(lo, 0);
        assert_eq!(hi, 9);
    }

    #[test]
    fn degenerate_outline_spans_every_row() {
        let mut outline = SwathOutline::degenerate(5, 20);
        for row in 0..5 {
            let (lo, hi) = outline.row_window(row, 20).unwrap();
            assert_eq!(lo, 0);
            assert_eq!(hi, 19);
        }
    }

    #[test]
    fn first_call_catch_up_seeds_active_set_mid_sweep() {
        let mut outline = rectangle(10, 10);
        // Jump straight to row 5 instead of starting at row 0.
        let hits = outline.intersects(5);
        assert_eq!(hits.len() % 2, 0);
        assert!(hits.contains(&0) || hits.iter().any(|&c| c <= 1));
    }
}
