//! Orchestrates the segment loop: load each `LineSegment`, build its spatial
//! index, sweep the swath outline row by row and fill an output row buffer
//! per cell, writing it out through a [`crate::raster::RasterWriter`].

use inf::warnonce::WarnOnce;

use crate::index::{IgmPositionSource, Metric, PositionSource, TreeGrid};
use crate::interp::{self, InterpolationKind};
use crate::raster::{DataAccessor, Level1Raster, RasterReader, RasterWriter};
use crate::segment::{self, LineSegment, SegmentBounds};
use crate::{Error, GridInfo, Point, Result, RowCol};

const DEFAULT_OVERLAP_ROWS: i64 = 10;

/// Counts of the non-fatal conditions the engine tolerates rather than
/// aborting the run for. `warnings` rate-limits the log lines; the counts
/// always accumulate regardless of whether the warning fired.
#[derive(Debug, Default)]
pub struct Diagnostics {
    pub out_of_bounds_samples: u64,
    pub interpolation_failures: u64,
    pub degenerate_outlines: u64,
    pub odd_intersect_rows: u64,
    warnings: WarnOnce,
}

impl Diagnostics {
    fn note_degenerate_outline(&mut self) {
        self.degenerate_outlines += 1;
        if self.warnings.record("engine.degenerate_outline") {
            log::warn!("segment has a degenerate outline, falling back to full-width rows");
        }
    }

    fn note_interpolation_failure(&mut self) {
        self.interpolation_failures += 1;
    }

    pub fn summary(&self) -> String {
        format!(
            "out_of_bounds_samples={} interpolation_failures={} degenerate_outlines={} odd_intersect_rows={}",
            self.out_of_bounds_samples, self.interpolation_failures, self.degenerate_outlines, self.odd_intersect_rows
        )
    }

    pub fn log_summary(&self) {
        log::info!("mapping complete: {}", self.summary());
        for (key, count) in self.warnings.summary() {
            log::info!("  {key}: {count} occurrence(s)");
        }
    }
}

/// Parameters the CLI layer translates into a run: interpolation kernel,
/// distance limits, output dtype, and the RAM budget that drives
/// segmentation.
pub struct MapConfig {
    pub band_list: Vec<usize>,
    pub interpolation: InterpolationKind,
    pub max_interp_distance: f64,
    pub ignore_value: Option<f64>,
    pub output_nodata: f64,
    pub ram_budget_bytes: u64,
    pub metric: Metric,
    pub overlap_rows: i64,
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig {
            band_list: Vec::new(),
            interpolation: InterpolationKind::Bilinear,
            max_interp_distance: f64::INFINITY,
            ignore_value: None,
            output_nodata: -9999.0,
            ram_budget_bytes: 1 << 30,
            metric: Metric::Planar,
            overlap_rows: DEFAULT_OVERLAP_ROWS,
        }
    }
}

pub struct MapEngine {
    config: MapConfig,
}

impl MapEngine {
    pub fn new(config: MapConfig) -> Self {
        MapEngine { config }
    }

    /// Maps every row of `igm`/`level1` into `output`, whose header already
    /// declares the target grid (`global`). `row_col_map`, when present,
    /// receives a two-band `i32` raster of the chosen IGM `(row, col)` per
    /// output cell (`-1` where nothing was mapped).
    pub fn run<'a>(
        &self,
        igm: &mut dyn RasterReader,
        level1: &mut dyn RasterReader,
        global: &GridInfo,
        output: &mut dyn RasterWriter,
        mut row_col_map: Option<&'a mut dyn RasterWriter>,
    ) -> Result<Diagnostics> {
        let mut diagnostics = Diagnostics::default();
        let lines = igm.header().rows;
        let samples = igm.header().cols;
        let bands = if self.config.band_list.is_empty() {
            (0..level1.header().bands).collect::<Vec<_>>()
        } else {
            self.config.band_list.clone()
        };
        let bytes_per_sample = level1.header().dtype.size_in_bytes();

        let plans = segment::plan_segments(lines, bands.len(), samples, bytes_per_sample, self.config.ram_budget_bytes);
        log::info!("mapping {lines} lines in {} segment(s)", plans.len());

        for bounds in plans {
            let mut line_segment = self.load_segment(igm, level1, global, &bands, bounds, &mut diagnostics)?;
            self.map_segment(
                &mut line_segment,
                global,
                &bands,
                output,
                match row_col_map {
                    Some(ref mut r) => Some(&mut **r),
                    None => None,
                },
                &mut diagnostics,
            )?;
        }

        diagnostics.log_summary();
        Ok(diagnostics)
    }

    fn load_segment(
        &self,
        igm: &mut dyn RasterReader,
        level1: &mut dyn RasterReader,
        global: &GridInfo,
        bands: &[usize],
        bounds: SegmentBounds,
        diagnostics: &mut Diagnostics,
    ) -> Result<LineSegment> {
        let (lead, trail) = segment::compute_overlap(bounds, igm.header().rows, self.config.overlap_rows);
        let first_row = bounds.first_row - lead;
        let row_count = (bounds.last_row + trail - first_row) as usize;
        let cols = igm.header().cols as usize;

        let mut igm_block = Level1Raster::empty(igm.header().dtype, first_row, row_count, cols, igm.header().bands);
        let mut level1_block = Level1Raster::empty(level1.header().dtype, first_row, row_count, cols, bands.len());

        let mut line_buf = vec![0.0; cols];
        for local_row in 0..row_count {
            let global_row = first_row + local_row as i64;
            for igm_band in 0..igm.header().bands {
                igm.read_band_line(igm_band, global_row, &mut line_buf)?;
                for col in 0..cols {
                    igm_block.set_from_f64(local_row, igm_band, col, line_buf[col]);
                }
            }
            for (pos, &level1_band) in bands.iter().enumerate() {
                level1.read_band_line(level1_band, global_row, &mut line_buf)?;
                for col in 0..cols {
                    level1_block.set_from_f64(local_row, pos, col, line_buf[col]);
                }
            }
        }

        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for local_row in 0..row_count {
            for col in 0..cols {
                let x = igm_block.value(local_row, 0, col);
                let y = igm_block.value(local_row, 1, col);
                min_x = min_x.min(x);
                max_x = max_x.max(x);
                min_y = min_y.min(y);
                max_y = max_y.max(y);
            }
        }

        let grid = segment::segment_output_grid(global, min_x, max_x, min_y, max_y);

        let mut boundary = Vec::new();
        let row_stride = (row_count / 32).max(1);
        let col_stride = (cols / 32).max(1);
        for local_row in [0usize, row_count - 1] {
            for col in (0..cols).step_by(col_stride) {
                push_boundary_point(&igm_block, &grid, local_row, col, &mut boundary);
            }
        }
        for col in [0usize, cols - 1] {
            for local_row in (0..row_count).step_by(row_stride) {
                push_boundary_point(&igm_block, &grid, local_row, col, &mut boundary);
            }
        }

        let outline = if boundary.len() >= 3 {
            crate::outline::SwathOutline::from_boundary(&boundary)
        } else {
            diagnostics.note_degenerate_outline();
            crate::outline::SwathOutline::degenerate(grid.rows, grid.cols)
        };

        Ok(LineSegment::new(bounds, lead, trail, igm_block, level1_block, grid, outline))
    }

    fn map_segment(
        &self,
        segment: &mut LineSegment,
        global: &GridInfo,
        bands: &[usize],
        output: &mut dyn RasterWriter,
        mut row_col_map: Option<&mut dyn RasterWriter>,
        diagnostics: &mut Diagnostics,
    ) -> Result<()> {
        let first_row = segment.igm.first_row();
        let igm_rows = segment.igm.rows() as i64;
        let igm_cols = segment.igm.cols() as i64;

        let mut igm_null = NullReader::for_header(segment.igm.cols(), segment.igm.bands());
        let igm_accessor = DataAccessor::new(Some(segment.igm.clone()), (0..segment.igm.bands()).collect(), &mut igm_null);
        let source = IgmPositionSource::new(igm_accessor);

        let mean_spacing = estimate_mean_spacing(&source, first_row, segment.igm.cols());
        let bbox = segment.grid.bounding_box();
        let mut index = TreeGrid::new(bbox.min_x, bbox.max_y, bbox.max_x, bbox.min_y, mean_spacing, mean_spacing, self.config.metric);
        for row in first_row..first_row + igm_rows {
            for col in 0..igm_cols {
                index.insert(&source, row, col)?;
            }
        }

        let mut level1_null = NullReader::for_header(segment.level1.cols(), segment.level1.bands());
        let accessor = DataAccessor::new(Some(segment.level1.clone()), bands.to_vec(), &mut level1_null);

        let cols = segment.grid.cols as usize;
        let mut band_bufs = vec![vec![self.config.output_nodata; cols]; bands.len()];
        let mut map_row_buf = vec![-1i32; cols];
        let mut map_col_buf = vec![-1i32; cols];
        let row_bounds = (first_row, first_row + igm_rows - 1);
        let col_bounds = (0, igm_cols - 1);

        // The segment's own grid shares pixel size with `global` but its
        // own row/col count, snapped to `global`'s pixel grid (see
        // `segment::segment_output_grid`); every row this loop writes must
        // land at its true position in the shared output file.
        let row_offset = ((global.tly - segment.grid.tly) / global.psy).round() as i64;
        let col_offset = ((segment.grid.tlx - global.tlx) / global.psx).round().max(0.0) as usize;

        for row in 0..segment.grid.rows {
            for buf in &mut band_bufs {
                buf.fill(self.config.output_nodata);
            }
            map_row_buf.fill(-1);
            map_col_buf.fill(-1);

            if let Some((col_lo, col_hi)) = segment.outline.row_window(row, segment.grid.cols) {
                for col in col_lo..=col_hi {
                    let center: Point = segment.grid.cell_center(RowCol::new(row, col));
                    let (values, chosen) = self.interpolate(&index, &source, &accessor, center, bands, row_bounds, col_bounds)?;
                    for (band_idx, value) in values.iter().enumerate() {
                        if *value == self.config.output_nodata {
                            diagnostics.note_interpolation_failure();
                        }
                        band_bufs[band_idx][col as usize] = *value;
                    }
                    if let Some((igm_row, igm_col)) = chosen {
                        map_row_buf[col as usize] = igm_row as i32;
                        map_col_buf[col as usize] = igm_col as i32;
                    }
                }
            }

            let global_row = row_offset + row;
            for (band_idx, buf) in band_bufs.iter().enumerate() {
                output.write_range(global_row, band_idx, col_offset, buf)?;
            }
            if let Some(writer) = row_col_map.as_deref_mut() {
                let row_f64: Vec<f64> = map_row_buf.iter().map(|&v| v as f64).collect();
                let col_f64: Vec<f64> = map_col_buf.iter().map(|&v| v as f64).collect();
                writer.write_range(global_row, 0, col_offset, &row_f64)?;
                writer.write_range(global_row, 1, col_offset, &col_f64)?;
            }
        }

        diagnostics.odd_intersect_rows += segment.outline.warnings().count("outline.odd_intersect_count");
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn interpolate(
        &self,
        index: &TreeGrid,
        source: &dyn PositionSource,
        accessor: &DataAccessor,
        p: Point,
        bands: &[usize],
        row_bounds: (i64, i64),
        col_bounds: (i64, i64),
    ) -> Result<(Vec<f64>, Option<(i64, i64)>)> {
        let no_data = self.config.output_nodata;
        match self.config.interpolation {
            InterpolationKind::Nearest => interp::nearest_neighbour(index, source, accessor, p, bands, self.config.max_interp_distance, self.config.ignore_value, no_data),
            InterpolationKind::InverseDistance { k } => {
                let values = interp::inverse_distance_weighted(index, source, accessor, p, bands, k, self.config.max_interp_distance, self.config.ignore_value, no_data)?;
                Ok((values, None))
            }
            InterpolationKind::BilinearLevel1 => {
                let values = interp::bilinear_level1_quad(index, source, accessor, row_bounds, col_bounds, p, bands, self.config.max_interp_distance, self.config.ignore_value, no_data)?;
                Ok((values, None))
            }
            InterpolationKind::Bilinear => {
                let values = interp::bilinear_quad(index, source, accessor, p, bands, self.config.max_interp_distance, self.config.ignore_value, no_data)?;
                Ok((values, None))
            }
            InterpolationKind::Bicubic => {
                let values = interp::bicubic(index, source, accessor, p, bands, self.config.max_interp_distance, self.config.ignore_value, no_data)?;
                Ok((values, None))
            }
        }
    }
}

fn push_boundary_point(igm: &Level1Raster, grid: &GridInfo, local_row: usize, col: usize, boundary: &mut Vec<(i64, i64)>) {
    let x = igm.value(local_row, 0, col);
    let y = igm.value(local_row, 1, col);
    if let Some(rc) = grid.point_to_cell(x, y) {
        boundary.push((rc.row, rc.col));
    }
}

/// Average ground distance between consecutive samples of the IGM's first
/// row, used to size the TreeGrid's cells. A cheap proxy for the true mean
/// spacing: adequate because TreeGrid degrades gracefully (more rings) when
/// the estimate is off, it just costs more ring sweeps per query.
fn estimate_mean_spacing(source: &dyn PositionSource, row: i64, cols: usize) -> f64 {
    if cols < 2 {
        return 1.0;
    }
    let mut total = 0.0;
    let mut n = 0;
    for col in 0..cols - 1 {
        if let (Ok(a), Ok(b)) = (source.position(row, col as i64), source.position(row, col as i64 + 1)) {
            total += ((b.x() - a.x()).powi(2) + (b.y() - a.y()).powi(2)).sqrt();
            n += 1;
        }
    }
    if n == 0 { 1.0 } else { (total / n as f64).max(1e-6) }
}

/// A `RasterReader` that is never actually read: `DataAccessor` only falls
/// through to its reader when the requested row misses the in-RAM block,
/// which never happens here because the block always spans the segment it
/// was built for.
struct NullReader {
    header: crate::raster::RasterHeader,
}

impl NullReader {
    fn for_header(cols: usize, bands: usize) -> Self {
        NullReader {
            header: crate::raster::RasterHeader::new(0, cols as i64, bands, crate::RasterDataType::Float64),
        }
    }
}

impl RasterReader for NullReader {
    fn header(&self) -> &crate::raster::RasterHeader {
        &self.header
    }

    fn read_band_line(&mut self, _band: usize, row: i64, _buf: &mut [f64]) -> Result {
        Err(Error::Runtime(format!("segment block does not cover row {row}")))
    }

    fn read_line(&mut self, row: i64, _buf: &mut [f64]) -> Result {
        Err(Error::Runtime(format!("segment block does not cover row {row}")))
    }
}
