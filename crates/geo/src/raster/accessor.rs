//! Unified read of a Level-1 pixel, served from RAM when the row/band is
//! materialised in the current segment's block, otherwise a pass-through
//! random read on the file.

use std::cell::{Cell, RefCell};

use crate::Result;
use crate::raster::block::Level1Raster;
use crate::raster::io::RasterReader;

pub struct DataAccessor<'a> {
    block: Option<Level1Raster>,
    /// For each position in the block's band dimension, the logical band
    /// index it was loaded for.
    band_map: Vec<usize>,
    reader: RefCell<&'a mut dyn RasterReader>,
    last_band_hit: Cell<usize>,
    line_buf: RefCell<Vec<f64>>,
}

impl<'a> DataAccessor<'a> {
    pub fn new(block: Option<Level1Raster>, band_map: Vec<usize>, reader: &'a mut dyn RasterReader) -> Self {
        let cols = reader.header().cols as usize;
        DataAccessor {
            block,
            band_map,
            reader: RefCell::new(reader),
            last_band_hit: Cell::new(0),
            line_buf: RefCell::new(vec![0.0; cols]),
        }
    }

    fn band_position(&self, logical_band: usize) -> Option<usize> {
        let hint = self.last_band_hit.get();
        if hint < self.band_map.len() && self.band_map[hint] == logical_band {
            return Some(hint);
        }
        let pos = self.band_map.iter().position(|&b| b == logical_band)?;
        self.last_band_hit.set(pos);
        Some(pos)
    }

    /// Value at `(logical_band, row, col)`, widened to `f64`.
    pub fn get(&self, logical_band: usize, row: i64, col: i64) -> Result<f64> {
        if let Some(block) = &self.block {
            let local_row = row - block.first_row();
            if local_row >= 0 && (local_row as usize) < block.rows() {
                if let Some(pos) = self.band_position(logical_band) {
                    return Ok(block.value(local_row as usize, pos, col as usize));
                }
            }
        }

        let mut reader = self.reader.borrow_mut();
        let mut buf = self.line_buf.borrow_mut();
        reader.read_band_line(logical_band, row, &mut buf)?;
        Ok(buf[col as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RasterDataType;
    use crate::raster::bil::{BilRasterReader, BilRasterWriter};
    use crate::raster::io::RasterWriter;
    use tempfile::tempdir;

    #[test]
    fn prefers_block_over_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("accessor.bil");

        {
            let mut writer = BilRasterWriter::create(&path, RasterDataType::Uint16, 2, 2, 1).unwrap();
            writer.write_line(0, &[1.0, 2.0]).unwrap();
            writer.write_line(1, &[3.0, 4.0]).unwrap();
            writer.close().unwrap();
        }

        let mut reader = BilRasterReader::open(&path).unwrap();
        let mut block = Level1Raster::empty(RasterDataType::Uint16, 1, 1, 2, 1);
        block.set_from_f64(0, 0, 0, 999.0);
        block.set_from_f64(0, 0, 1, 998.0);

        let accessor = DataAccessor::new(Some(block), vec![0], &mut reader);
        // row 1 is in the block: should return block values, not file values.
        assert_eq!(accessor.get(0, 1, 0).unwrap(), 999.0);
        // row 0 is not in the block: falls through to the file.
        assert_eq!(accessor.get(0, 0, 0).unwrap(), 1.0);
    }
}
