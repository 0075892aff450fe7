//! Row-range planning for the segment loop: how many segments the RAM
//! budget allows, each segment's overlap, and the segment-local output
//! grid snapped onto the global grid.

use crate::GridInfo;
use crate::outline::SwathOutline;
use crate::raster::Level1Raster;

/// `[first_row, last_row)` of one segment's own (non-overlapping) share of
/// the flight line, in global row numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentBounds {
    pub first_row: i64,
    pub last_row: i64,
}

/// Estimates peak RAM for a single-segment run and returns the row bounds
/// of however many segments keep it under `budget_bytes`.
/// `full_ram = bands*samples*lines*sizeof(T) + 2*samples*lines*sizeof(f64)`
/// (the Level-1 block plus the IGM's X/Y bands).
pub fn plan_segments(lines: i64, bands: usize, samples: i64, level1_bytes_per_sample: usize, budget_bytes: u64) -> Vec<SegmentBounds> {
    let full_ram = bands as u64 * samples as u64 * lines as u64 * level1_bytes_per_sample as u64
        + 2 * samples as u64 * lines as u64 * std::mem::size_of::<f64>() as u64;

    let n = if full_ram <= budget_bytes || budget_bytes == 0 {
        1
    } else {
        full_ram.div_ceil(budget_bytes).max(1) as i64
    };

    (0..n)
        .map(|i| SegmentBounds {
            first_row: i * lines / n,
            last_row: (i + 1) * lines / n,
        })
        .collect()
}

/// Rows of overlap to load before/after a segment's own range, capped by
/// the raster's extent and the default overlap `overlap_rows`.
pub fn compute_overlap(bounds: SegmentBounds, lines: i64, overlap_rows: i64) -> (i64, i64) {
    let lead = bounds.first_row.min(overlap_rows);
    let trail = (lines - bounds.last_row).min(overlap_rows);
    (lead, trail)
}

/// Builds the segment-local output grid from its ground extent (computed
/// from the slice's X/Y range, excluding overlap), sharing `global`'s pixel
/// size and snapped onto `global`'s pixel grid so segment-local and
/// global-grid columns coincide.
pub fn segment_output_grid(global: &GridInfo, min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> GridInfo {
    let rows = ((max_y - min_y) / global.psy).ceil().max(1.0) as i64;
    let cols = ((max_x - min_x) / global.psx).ceil().max(1.0) as i64;
    let raw = GridInfo::new(min_x, max_y, global.psx, global.psy, rows, cols, global.band_list.clone(), global.projection.clone());
    raw.snapped_to(global)
}

/// RAM-resident slice of the flight line: the loaded IGM and Level-1
/// tiles (rows `[first_row-lead, last_row+trail)`), the segment-local
/// output grid, and the swath outline built from the slice. One per
/// iteration of the segment loop; dropped before the next segment loads.
pub struct LineSegment {
    pub bounds: SegmentBounds,
    pub lead: i64,
    pub trail: i64,
    pub igm: Level1Raster,
    pub level1: Level1Raster,
    pub grid: GridInfo,
    pub outline: SwathOutline,
}

impl LineSegment {
    pub fn new(bounds: SegmentBounds, lead: i64, trail: i64, igm: Level1Raster, level1: Level1Raster, grid: GridInfo, outline: SwathOutline) -> Self {
        LineSegment {
            bounds,
            lead,
            trail,
            igm,
            level1,
            grid,
            outline,
        }
    }

    /// The global row range actually loaded into RAM, including overlap.
    pub fn loaded_row_range(&self) -> (i64, i64) {
        (self.bounds.first_row - self.lead, self.bounds.last_row + self.trail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_segment_when_within_budget() {
        let bounds = plan_segments(100, 4, 50, 2, u64::MAX);
        assert_eq!(bounds.len(), 1);
        assert_eq!(bounds[0], SegmentBounds { first_row: 0, last_row: 100 });
    }

    #[test]
    fn splits_into_enough_segments_to_respect_budget() {
        let bounds = plan_segments(100, 4, 50, 2, 10_000);
        assert!(bounds.len() > 1);
        assert_eq!(bounds.first().unwrap().first_row, 0);
        assert_eq!(bounds.last().unwrap().last_row, 100);
    }

    #[test]
    fn segments_cover_every_row_without_overlap_or_gap() {
        let bounds = plan_segments(101, 1, 10, 1, 1000);
        for window in bounds.windows(2) {
            assert_eq!(window[0].last_row, window[1].first_row);
        }
    }

    #[test]
    fn overlap_is_capped_at_raster_edges() {
        let bounds = SegmentBounds { first_row: 0, last_row: 50 };
        let (lead, trail) = compute_overlap(bounds, 100, 10);
        assert_eq!(lead, 0);
        assert_eq!(trail, 10);
    }

    #[test]
    fn segment_grid_snaps_onto_global_grid() {
        let global = GridInfo::new(0.0, 100.0, 2.0, 2.0, 50, 50, vec![0], "planar".into());
        let seg_grid = segment_output_grid(&global, 5.3, 20.0, 70.0, 90.0);
        assert!(seg_grid.is_aligned(&global));
    }
}
