//! Inverse-distance-weighted interpolation (§4.6.2): weight `1/d^2` over the
//! `k` nearest non-ignored samples.

use crate::Point;
use crate::Result;
use crate::index::{PositionSource, TreeGrid};
use crate::raster::DataAccessor;

pub fn inverse_distance_weighted(
    grid: &TreeGrid,
    source: &dyn PositionSource,
    accessor: &DataAccessor,
    p: Point,
    bands: &[usize],
    k: usize,
    max_interp_distance: f64,
    ignore_value: Option<f64>,
    no_data: f64,
) -> Result<Vec<f64>> {
    let probe_band = bands.first().copied().unwrap_or(0);
    let base = grid.k_nearest(source, accessor, p, k, max_interp_distance, probe_band, None)?;

    let mut out = Vec::with_capacity(bands.len());
    for &band in bands {
        let mut samples = base.clone();
        let mut needs_retry = false;
        for s in &samples {
            if ignore_value == Some(accessor.get(band, s.igm_row, s.igm_col)?) {
                needs_retry = true;
                break;
            }
        }
        if needs_retry {
            samples = grid.k_nearest(source, accessor, p, k, max_interp_distance, band, ignore_value)?;
        }

        if samples.is_empty() {
            out.push(no_data);
            continue;
        }

        let mut weight_sum = 0.0;
        let mut value_sum = 0.0;
        for s in &samples {
            let value = accessor.get(band, s.igm_row, s.igm_col)?;
            let weight = if s.distance_sq > 0.0 { 1.0 / s.distance_sq } else { f64::MAX };
            weight_sum += weight;
            value_sum += weight * value;
        }

        out.push(if weight_sum > 0.0 { value_sum / weight_sum } else { no_data });
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Metric;
    use crate::raster::{Level1Raster, RasterHeader, RasterReader};
    use crate::{Point, RasterDataType};
    use std::collections::HashMap;

    struct ZeroReader(RasterHeader);
    impl RasterReader for ZeroReader {
        fn header(&self) -> &RasterHeader {
            &self.0
        }
        fn read_band_line(&mut self, _band: usize, _row: i64, buf: &mut [f64]) -> Result<()> {
            buf.fill(0.0);
            Ok(())
        }
        fn read_line(&mut self, _row: i64, buf: &mut [f64]) -> Result<()> {
            buf.fill(0.0);
            Ok(())
        }
    }

    struct MapSource(HashMap<(i64, i64), Point>);
    impl PositionSource for MapSource {
        fn position(&self, row: i64, col: i64) -> Result<Point> {
            Ok(self.0[&(row, col)])
        }
    }

    #[test]
    fn averages_equal_weight_neighbours_toward_their_mean() {
        let mut grid = TreeGrid::new(0.0, 10.0, 10.0, 0.0, 1.0, 1.0, Metric::Planar);
        let mut positions = HashMap::new();
        for (row, col, x, y) in [(0i64, 0i64, 1.0, 9.0), (0, 1, 1.0, 9.0)] {
            positions.insert((row, col), Point::new(x, y));
        }
        // Give the two samples distinct positions so distance weights differ predictably.
        positions.insert((0, 0), Point::new(4.0, 5.0));
        positions.insert((0, 1), Point::new(6.0, 5.0));
        let source = MapSource(positions);
        grid.insert(&source, 0, 0).unwrap();
        grid.insert(&source, 0, 1).unwrap();

        let mut header = RasterHeader::new(1, 2, 1, RasterDataType::Float32);
        header.set_field("data ignore value", "-9999");
        let mut reader = ZeroReader(header);
        let mut block = Level1Raster::empty(RasterDataType::Float32, 0, 1, 2, 1);
        block.set_from_f64(0, 0, 0, 2.0);
        block.set_from_f64(0, 0, 1, 8.0);
        let accessor = DataAccessor::new(Some(block), vec![0], &mut reader);

        let out = inverse_distance_weighted(&grid, &source, &accessor, Point::new(5.0, 5.0), &[0], 2, 100.0, None, -9999.0).unwrap();
        assert!((out[0] - 5.0).abs() < 1e-6);
    }
}
