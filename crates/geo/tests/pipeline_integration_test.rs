//! End-to-end: build a tiny synthetic IGM + Level-1 pair, run the full
//! `MapEngine` pipeline against them through the concrete BIL reader/writer,
//! and check the output grid against hand-computed expectations.

use geo::interp::InterpolationKind;
use geo::raster::bil::{BilRasterReader, BilRasterWriter};
use geo::raster::{RasterReader, RasterWriter};
use geo::{GridInfo, MapConfig, MapEngine, RasterDataType};
use tempfile::tempdir;

const IGM_ROWS: i64 = 6;
const IGM_COLS: i64 = 5;
const PIXEL: f64 = 10.0;

// `segment::segment_output_grid` sizes the output from the IGM samples'
// ground extent (`ceil(span / pixel_size)`), which spans one fewer pixel
// than the sample count for a regularly spaced flight line. The output
// grid this fixture produces is therefore one row/column smaller than the
// IGM sample grid.
const OUT_ROWS: i64 = IGM_ROWS - 1;
const OUT_COLS: i64 = IGM_COLS - 1;

/// A flight line flying due south over a flat, axis-aligned swath: IGM
/// sample `(r, c)` sits at ground `(c * PIXEL, 100 - r * PIXEL)`, and its
/// Level-1 value is `r * 100 + c`. The output grid's top-left is offset by
/// half a pixel so that cell centres land exactly on IGM sample positions,
/// making nearest-neighbour output fully predictable.
fn write_fixtures(dir: &std::path::Path) -> (std::path::PathBuf, std::path::PathBuf) {
    let igm_path = dir.join("flight.igm");
    let lev1_path = dir.join("flight.lev1");

    let mut igm = BilRasterWriter::create(&igm_path, RasterDataType::Float64, IGM_ROWS, IGM_COLS, 3).unwrap();
    for r in 0..IGM_ROWS {
        let mut row = vec![0.0; 3 * IGM_COLS as usize];
        for c in 0..IGM_COLS {
            row[c as usize] = c as f64 * PIXEL;
            row[IGM_COLS as usize + c as usize] = 100.0 - r as f64 * PIXEL;
        }
        igm.write_line(r, &row).unwrap();
    }
    igm.close().unwrap();

    let mut lev1 = BilRasterWriter::create(&lev1_path, RasterDataType::Float32, IGM_ROWS, IGM_COLS, 1).unwrap();
    for r in 0..IGM_ROWS {
        let row: Vec<f64> = (0..IGM_COLS).map(|c| (r * 100 + c) as f64).collect();
        lev1.write_line(r, &row).unwrap();
    }
    lev1.close().unwrap();

    (igm_path, lev1_path)
}

fn aligned_grid() -> GridInfo {
    GridInfo::new(-PIXEL / 2.0, 100.0 + PIXEL / 2.0, PIXEL, PIXEL, OUT_ROWS, OUT_COLS, vec![0], String::new())
}

#[test]
fn nearest_neighbour_recovers_exact_samples_on_an_aligned_grid() {
    let dir = tempdir().unwrap();
    let (igm_path, lev1_path) = write_fixtures(dir.path());
    let out_path = dir.path().join("out.lev3");

    let mut igm = BilRasterReader::open(&igm_path).unwrap();
    let mut lev1 = BilRasterReader::open(&lev1_path).unwrap();
    let global = aligned_grid();

    let mut output = BilRasterWriter::create(&out_path, RasterDataType::Float32, OUT_ROWS, OUT_COLS, 1).unwrap();

    let config = MapConfig {
        band_list: vec![0],
        interpolation: InterpolationKind::Nearest,
        ..MapConfig::default()
    };
    let diagnostics = MapEngine::new(config).run(&mut igm, &mut lev1, &global, &mut output, None).unwrap();
    output.close().unwrap();

    assert_eq!(diagnostics.interpolation_failures, 0);

    let mut reader = BilRasterReader::open(&out_path).unwrap();
    let mut row = vec![0.0; OUT_COLS as usize];
    for r in 0..OUT_ROWS {
        reader.read_line(r, &mut row).unwrap();
        for c in 0..OUT_COLS {
            let expected = (r * 100 + c) as f64;
            assert!((row[c as usize] - expected).abs() < 1e-3, "row {r} col {c}: expected {expected}, got {}", row[c as usize]);
        }
    }
}

#[test]
fn bilinear_default_produces_no_nodata_cells_inside_the_swath() {
    let dir = tempdir().unwrap();
    let (igm_path, lev1_path) = write_fixtures(dir.path());
    let out_path = dir.path().join("out.lev3");

    let mut igm = BilRasterReader::open(&igm_path).unwrap();
    let mut lev1 = BilRasterReader::open(&lev1_path).unwrap();
    let global = aligned_grid();

    let mut output = BilRasterWriter::create(&out_path, RasterDataType::Float32, OUT_ROWS, OUT_COLS, 1).unwrap();
    let config = MapConfig { band_list: vec![0], ..MapConfig::default() };
    assert_eq!(config.interpolation, InterpolationKind::Bilinear);

    MapEngine::new(config).run(&mut igm, &mut lev1, &global, &mut output, None).unwrap();
    output.close().unwrap();

    let mut reader = BilRasterReader::open(&out_path).unwrap();
    let mut row = vec![0.0; OUT_COLS as usize];
    for r in 1..OUT_ROWS - 1 {
        reader.read_line(r, &mut row).unwrap();
        for c in 1..OUT_COLS - 1 {
            assert_ne!(row[c as usize], -9999.0, "row {r} col {c} should have been interpolated");
        }
    }
}

#[test]
fn row_col_map_is_populated_only_for_nearest_neighbour() {
    let dir = tempdir().unwrap();
    let (igm_path, lev1_path) = write_fixtures(dir.path());
    let out_path = dir.path().join("out.lev3");
    let map_path = dir.path().join("out.rowcol");

    let mut igm = BilRasterReader::open(&igm_path).unwrap();
    let mut lev1 = BilRasterReader::open(&lev1_path).unwrap();
    let global = aligned_grid();

    let mut output = BilRasterWriter::create(&out_path, RasterDataType::Float32, OUT_ROWS, OUT_COLS, 1).unwrap();
    let mut row_col_map = BilRasterWriter::create(&map_path, RasterDataType::Int32, OUT_ROWS, OUT_COLS, 2).unwrap();

    let config = MapConfig {
        band_list: vec![0],
        interpolation: InterpolationKind::Nearest,
        ..MapConfig::default()
    };
    MapEngine::new(config).run(&mut igm, &mut lev1, &global, &mut output, Some(&mut row_col_map)).unwrap();
    output.close().unwrap();
    row_col_map.close().unwrap();

    let mut reader = BilRasterReader::open(&map_path).unwrap();
    let mut igm_row = vec![0.0; OUT_COLS as usize];
    let mut igm_col = vec![0.0; OUT_COLS as usize];
    reader.read_band_line(0, 2, &mut igm_row).unwrap();
    reader.read_band_line(1, 2, &mut igm_col).unwrap();
    for c in 0..OUT_COLS as usize {
        assert_eq!(igm_row[c] as i64, 2);
        assert_eq!(igm_col[c] as i64, c as i64);
    }
}
