//! Typed raster I/O contract. `crate::raster::bil` is the one concrete
//! implementation this crate ships.

use std::collections::BTreeMap;

use crate::{RasterDataType, Result};

/// Everything the engine needs to know about a raster's shape plus the raw
/// key/value header fields it should copy through (band names, wavelength,
/// map info, ...) without interpreting them.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterHeader {
    pub rows: i64,
    pub cols: i64,
    pub bands: usize,
    pub dtype: RasterDataType,
    pub fields: BTreeMap<String, String>,
}

impl RasterHeader {
    pub fn new(rows: i64, cols: i64, bands: usize, dtype: RasterDataType) -> Self {
        RasterHeader {
            rows,
            cols,
            bands,
            dtype,
            fields: BTreeMap::new(),
        }
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn set_field(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    /// `data ignore value`, parsed as `f64`. Absent means "no ignore value".
    pub fn ignore_value(&self) -> Option<f64> {
        self.field("data ignore value").and_then(|v| v.parse::<f64>().ok())
    }

    /// `true` when `projection` declares a geographic (lat/lon) grid.
    pub fn is_geographic(&self) -> bool {
        self.field("projection")
            .map(|p| p.eq_ignore_ascii_case("Geographic Lat/Lon"))
            .unwrap_or(false)
    }
}

/// Random and sequential read access to a Level-1-shaped raster. Values are
/// always returned widened to `f64`; interpolation arithmetic stays in
/// `f64` throughout the engine (see the design notes on the dtype pipeline).
pub trait RasterReader {
    fn header(&self) -> &RasterHeader;

    /// Reads the `cols` values of `band` at `row` into `buf`.
    fn read_band_line(&mut self, band: usize, row: i64, buf: &mut [f64]) -> Result;

    /// Reads all bands of `row`, band-interleaved, into `buf` (length
    /// `bands * cols`).
    fn read_line(&mut self, row: i64, buf: &mut [f64]) -> Result;
}

/// Sequential, append-only write of full rows plus positioned writes within
/// rows already allocated on disk. `close` flushes and finalizes the header;
/// it is an explicit step so a failure to finalize is a catchable error
/// rather than a silent best-effort at drop time.
pub trait RasterWriter {
    fn header(&self) -> &RasterHeader;

    /// Writes a full row (band-interleaved, length `bands * cols`).
    fn write_line(&mut self, row: i64, buf: &[f64]) -> Result;

    /// Writes `buf` into `band` of `row` starting at `col_lo`.
    fn write_range(&mut self, row: i64, band: usize, col_lo: usize, buf: &[f64]) -> Result;

    fn close(&mut self) -> Result;
}
