//! A raw band-interleaved-by-line (BIL) raster plus a `key = value` text
//! sidecar header (`<path>.hdr`), matching the original airborne processing
//! chain's flat-file convention. This is intentionally the simplest
//! possible concrete `RasterReader`/`RasterWriter`: no compression, no
//! arbitrary-format support, native-endian only.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::raster::io::{RasterHeader, RasterReader, RasterWriter};
use crate::{Error, RasterDataType, Result};

fn hdr_path(data_path: &Path) -> PathBuf {
    let mut p = data_path.as_os_str().to_owned();
    p.push(".hdr");
    PathBuf::from(p)
}

fn parse_header_text(text: &str) -> Result<(i64, i64, usize, RasterDataType, BTreeMap<String, String>)> {
    let mut fields = BTreeMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        fields.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
    }

    let lines = fields
        .get("lines")
        .ok_or_else(|| Error::Io("BIL header missing 'lines'".into()))?
        .parse::<i64>()
        .map_err(|e| Error::Io(format!("BIL header 'lines' is not an integer: {e}")))?;
    let samples = fields
        .get("samples")
        .ok_or_else(|| Error::Io("BIL header missing 'samples'".into()))?
        .parse::<i64>()
        .map_err(|e| Error::Io(format!("BIL header 'samples' is not an integer: {e}")))?;
    let bands = fields
        .get("bands")
        .ok_or_else(|| Error::Io("BIL header missing 'bands'".into()))?
        .parse::<usize>()
        .map_err(|e| Error::Io(format!("BIL header 'bands' is not an integer: {e}")))?;
    let dtype_str = fields.get("data type").ok_or_else(|| Error::Io("BIL header missing 'data type'".into()))?;
    let dtype = RasterDataType::from_str(dtype_str).ok_or_else(|| Error::Io(format!("BIL header has unsupported data type '{dtype_str}'")))?;

    fields.remove("lines");
    fields.remove("samples");
    fields.remove("bands");
    fields.remove("data type");
    fields.remove("interleave");
    fields.remove("byte order");

    Ok((lines, samples, bands, dtype, fields))
}

fn decode_value(bytes: &[u8], dtype: RasterDataType) -> f64 {
    match dtype {
        RasterDataType::Uint8 => bytes[0] as f64,
        RasterDataType::Int16 => i16::from_ne_bytes([bytes[0], bytes[1]]) as f64,
        RasterDataType::Uint16 => u16::from_ne_bytes([bytes[0], bytes[1]]) as f64,
        RasterDataType::Int32 => i32::from_ne_bytes(bytes[..4].try_into().unwrap()) as f64,
        RasterDataType::Uint32 => u32::from_ne_bytes(bytes[..4].try_into().unwrap()) as f64,
        RasterDataType::Float32 => f32::from_ne_bytes(bytes[..4].try_into().unwrap()) as f64,
        RasterDataType::Float64 => f64::from_ne_bytes(bytes[..8].try_into().unwrap()),
    }
}

fn encode_value(v: f64, dtype: RasterDataType, out: &mut Vec<u8>) {
    match dtype {
        RasterDataType::Uint8 => out.push(v as u8),
        RasterDataType::Int16 => out.extend_from_slice(&(v as i16).to_ne_bytes()),
        RasterDataType::Uint16 => out.extend_from_slice(&(v as u16).to_ne_bytes()),
        RasterDataType::Int32 => out.extend_from_slice(&(v as i32).to_ne_bytes()),
        RasterDataType::Uint32 => out.extend_from_slice(&(v as u32).to_ne_bytes()),
        RasterDataType::Float32 => out.extend_from_slice(&(v as f32).to_ne_bytes()),
        RasterDataType::Float64 => out.extend_from_slice(&v.to_ne_bytes()),
    }
}

pub struct BilRasterReader {
    header: RasterHeader,
    file: BufReader<File>,
    row_stride_bytes: u64,
    band_stride_bytes: u64,
}

impl BilRasterReader {
    pub fn open(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(hdr_path(path)).map_err(|e| Error::Io(format!("opening header for '{}': {e}", path.display())))?;
        let (lines, samples, bands, dtype, fields) = parse_header_text(&text)?;

        let mut header = RasterHeader::new(lines, samples, bands, dtype);
        header.fields = fields;

        let file = File::open(path).map_err(|e| Error::Io(format!("opening '{}': {e}", path.display())))?;

        let size = dtype.size_in_bytes() as u64;
        Ok(BilRasterReader {
            band_stride_bytes: samples as u64 * size,
            row_stride_bytes: samples as u64 * bands as u64 * size,
            header,
            file: BufReader::new(file),
        })
    }
}

impl RasterReader for BilRasterReader {
    fn header(&self) -> &RasterHeader {
        &self.header
    }

    fn read_band_line(&mut self, band: usize, row: i64, buf: &mut [f64]) -> Result {
        let size = self.header.dtype.size_in_bytes();
        let offset = row as u64 * self.row_stride_bytes + band as u64 * self.band_stride_bytes;
        self.file.seek(SeekFrom::Start(offset)).map_err(Error::StdIo)?;

        let mut raw = vec![0u8; self.header.cols as usize * size];
        self.file.read_exact(&mut raw).map_err(Error::StdIo)?;
        for (i, chunk) in raw.chunks_exact(size).enumerate() {
            buf[i] = decode_value(chunk, self.header.dtype);
        }
        Ok(())
    }

    fn read_line(&mut self, row: i64, buf: &mut [f64]) -> Result {
        let size = self.header.dtype.size_in_bytes();
        let offset = row as u64 * self.row_stride_bytes;
        self.file.seek(SeekFrom::Start(offset)).map_err(Error::StdIo)?;

        let mut raw = vec![0u8; self.row_stride_bytes as usize];
        self.file.read_exact(&mut raw).map_err(Error::StdIo)?;
        for (i, chunk) in raw.chunks_exact(size).enumerate() {
            buf[i] = decode_value(chunk, self.header.dtype);
        }
        Ok(())
    }
}

pub struct BilRasterWriter {
    header: RasterHeader,
    path: PathBuf,
    file: Option<BufWriter<File>>,
    row_stride_bytes: u64,
    band_stride_bytes: u64,
}

impl BilRasterWriter {
    pub fn create(path: &Path, dtype: RasterDataType, rows: i64, cols: i64, bands: usize) -> Result<Self> {
        let size = dtype.size_in_bytes() as u64;
        let row_stride_bytes = cols as u64 * bands as u64 * size;

        let file = File::create(path).map_err(|e| Error::Io(format!("creating '{}': {e}", path.display())))?;
        file.set_len(rows as u64 * row_stride_bytes).map_err(Error::StdIo)?;

        Ok(BilRasterWriter {
            header: RasterHeader::new(rows, cols, bands, dtype),
            path: path.to_path_buf(),
            file: Some(BufWriter::new(file)),
            row_stride_bytes,
            band_stride_bytes: cols as u64 * size,
        })
    }

    pub fn header_mut(&mut self) -> &mut RasterHeader {
        &mut self.header
    }

    fn file_mut(&mut self) -> Result<&mut BufWriter<File>> {
        self.file.as_mut().ok_or_else(|| Error::Io("writer already closed".into()))
    }
}

impl RasterWriter for BilRasterWriter {
    fn header(&self) -> &RasterHeader {
        &self.header
    }

    fn write_line(&mut self, row: i64, buf: &[f64]) -> Result {
        let dtype = self.header.dtype;
        let offset = row as u64 * self.row_stride_bytes;
        let mut raw = Vec::with_capacity(self.row_stride_bytes as usize);
        for &v in buf {
            encode_value(v, dtype, &mut raw);
        }

        let file = self.file_mut()?;
        file.seek(SeekFrom::Start(offset)).map_err(Error::StdIo)?;
        file.write_all(&raw).map_err(Error::StdIo)?;
        Ok(())
    }

    fn write_range(&mut self, row: i64, band: usize, col_lo: usize, buf: &[f64]) -> Result {
        let dtype = self.header.dtype;
        let size = dtype.size_in_bytes() as u64;
        let offset = row as u64 * self.row_stride_bytes + band as u64 * self.band_stride_bytes + col_lo as u64 * size;
        let mut raw = Vec::with_capacity(buf.len() * size as usize);
        for &v in buf {
            encode_value(v, dtype, &mut raw);
        }

        let file = self.file_mut()?;
        file.seek(SeekFrom::Start(offset)).map_err(Error::StdIo)?;
        file.write_all(&raw).map_err(Error::StdIo)?;
        Ok(())
    }

    fn close(&mut self) -> Result {
        if let Some(mut file) = self.file.take() {
            file.flush().map_err(Error::StdIo)?;
        }

        let mut text = String::new();
        text.push_str(&format!("samples = {}\n", self.header.cols));
        text.push_str(&format!("lines = {}\n", self.header.rows));
        text.push_str(&format!("bands = {}\n", self.header.bands));
        text.push_str(&format!("data type = {}\n", self.header.dtype));
        text.push_str("byte order = native\n");
        text.push_str("interleave = bil\n");
        for (key, value) in &self.header.fields {
            text.push_str(&format!("{key} = {value}\n"));
        }

        std::fs::write(hdr_path(&self.path), text).map_err(Error::StdIo)?;
        Ok(())
    }
}

impl Drop for BilRasterWriter {
    fn drop(&mut self) {
        if self.file.is_some() {
            let _ = self.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trips_a_single_band_row() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.bil");

        {
            let mut writer = BilRasterWriter::create(&path, RasterDataType::Uint16, 2, 4, 1).unwrap();
            writer.header_mut().set_field("data ignore value", "0");
            writer.write_line(0, &[1.0, 2.0, 3.0, 4.0]).unwrap();
            writer.write_line(1, &[5.0, 6.0, 7.0, 8.0]).unwrap();
            writer.close().unwrap();
        }

        let mut reader = BilRasterReader::open(&path).unwrap();
        assert_eq!(reader.header().rows, 2);
        assert_eq!(reader.header().cols, 4);
        assert_eq!(reader.header().ignore_value(), Some(0.0));

        let mut row = vec![0.0; 4];
        reader.read_line(1, &mut row).unwrap();
        assert_eq!(row, vec![5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn band_interleave_keeps_bands_separate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("multiband.bil");

        {
            let mut writer = BilRasterWriter::create(&path, RasterDataType::Float32, 1, 3, 2).unwrap();
            // row 0: band0 = [1,2,3], band1 = [10,20,30]
            writer.write_line(0, &[1.0, 2.0, 3.0, 10.0, 20.0, 30.0]).unwrap();
            writer.close().unwrap();
        }

        let mut reader = BilRasterReader::open(&path).unwrap();
        let mut band1 = vec![0.0; 3];
        reader.read_band_line(1, 0, &mut band1).unwrap();
        assert_eq!(band1, vec![10.0, 20.0, 30.0]);
    }
}
