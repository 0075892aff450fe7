//! The immutable description of an output (or segment) raster grid.

use crate::{BBox, GeoTransform, Point, RowCol};

/// Top-left `(tlx, tly)`, bottom-right `(brx, bry)`, signed pixel sizes
/// `(psx > 0, psy > 0)`. Ground `y` decreases as `row` increases:
/// `y(row) = tly - row * psy`, `x(col) = tlx + col * psx`. Built once at
/// startup (or once per segment) and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct GridInfo {
    pub tlx: f64,
    pub tly: f64,
    pub brx: f64,
    pub bry: f64,
    pub psx: f64,
    pub psy: f64,
    pub rows: i64,
    pub cols: i64,
    pub band_list: Vec<usize>,
    pub projection: String,
}

impl GridInfo {
    pub fn new(tlx: f64, tly: f64, psx: f64, psy: f64, rows: i64, cols: i64, band_list: Vec<usize>, projection: String) -> Self {
        let brx = tlx + cols as f64 * psx;
        let bry = tly - rows as f64 * psy;
        GridInfo {
            tlx,
            tly,
            brx,
            bry,
            psx,
            psy,
            rows,
            cols,
            band_list,
            projection,
        }
    }

    fn transform(&self) -> GeoTransform {
        GeoTransform::new([self.tlx, self.psx, 0.0, self.tly, 0.0, -self.psy])
    }

    /// Ground coordinate at the centre of `(row, col)`.
    pub fn cell_center(&self, rc: RowCol) -> Point {
        self.transform().apply(rc.col as f64 + 0.5, rc.row as f64 + 0.5)
    }

    /// The cell covering ground point `(x, y)`, or `None` if it falls
    /// outside `[0, rows) x [0, cols)`.
    pub fn point_to_cell(&self, x: f64, y: f64) -> Option<RowCol> {
        let col = ((x - self.tlx) / self.psx).floor() as i64;
        let row = ((self.tly - y) / self.psy).floor() as i64;
        let rc = RowCol::new(row, col);
        if rc.is_on_raster(self.rows, self.cols) { Some(rc) } else { None }
    }

    pub fn bounding_box(&self) -> BBox {
        BBox::new(self.tlx, self.brx, self.bry, self.tly)
    }

    /// Is `(x, y)` within the grid's ground extent?
    pub fn is_on_map(&self, x: f64, y: f64) -> bool {
        self.bounding_box().inside(x, y)
    }

    pub fn metadata_intersects(&self, other: &GridInfo) -> bool {
        self.bounding_box().intersects(&other.bounding_box())
    }

    /// Whether `self`'s top-left sits on an integer multiple of `other`'s
    /// pixel size away from `other`'s top-left, within a tenth-of-a-pixel
    /// tolerance. Used to check that a segment grid's columns coincide with
    /// the global grid's.
    pub fn is_aligned(&self, other: &GridInfo) -> bool {
        let dx = (self.tlx - other.tlx) / other.psx;
        let dy = (self.tly - other.tly) / other.psy;
        (dx - dx.round()).abs() < 1e-6 && (dy - dy.round()).abs() < 1e-6
    }

    /// Snap `self`'s top-left onto `global`'s pixel grid, moving it toward
    /// `global`'s top-left (never away), so that the two grids' columns and
    /// rows coincide.
    pub fn snapped_to(&self, global: &GridInfo) -> GridInfo {
        let dx_cells = (self.tlx - global.tlx) / global.psx;
        let dy_cells = (global.tly - self.tly) / global.psy;
        let snapped_tlx = global.tlx + dx_cells.floor() * global.psx;
        let snapped_tly = global.tly - dy_cells.floor() * global.psy;

        GridInfo::new(
            snapped_tlx,
            snapped_tly,
            self.psx,
            self.psy,
            self.rows,
            self.cols,
            self.band_list.clone(),
            self.projection.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> GridInfo {
        GridInfo::new(0.0, 10.0, 1.0, 1.0, 10, 10, vec![0], "planar".into())
    }

    #[test]
    fn corner_round_trip() {
        let g = grid();
        assert_eq!(g.point_to_cell(0.0001, 9.9999), Some(RowCol::new(0, 0)));
        assert_eq!(g.point_to_cell(9.9999, 0.0001), Some(RowCol::new(9, 9)));
        assert_eq!(g.point_to_cell(10.0, 10.0), None);
    }

    #[test]
    fn cell_center_matches_grid_spacing() {
        let g = grid();
        let c = g.cell_center(RowCol::new(0, 0));
        assert!((c.x() - 0.5).abs() < 1e-9);
        assert!((c.y() - 9.5).abs() < 1e-9);
    }

    #[test]
    fn bounding_box_covers_extent() {
        let g = grid();
        let bb = g.bounding_box();
        assert_eq!(bb, BBox::new(0.0, 10.0, 0.0, 10.0));
    }

    #[test]
    fn snap_moves_toward_global_top_left_only() {
        let global = GridInfo::new(0.0, 100.0, 2.0, 2.0, 50, 50, vec![0], "planar".into());
        let seg = GridInfo::new(5.3, 80.0, 2.0, 2.0, 10, 10, vec![0], "planar".into());
        let snapped = seg.snapped_to(&global);
        assert!(snapped.tlx <= seg.tlx);
        assert!(snapped.is_aligned(&global));
    }
}
