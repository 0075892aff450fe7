use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use env_logger::{Env, TimestampPrecision};
use geo::index::Metric;
use geo::raster::bil::{BilRasterReader, BilRasterWriter};
use geo::raster::{RasterReader, RasterWriter};
use geo::{GridInfo, MapConfig, MapEngine};
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;
use inf::Error;

mod options;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Parser, Debug)]
#[clap(name = "map", about = "Georectify a Level-1 hyperspectral cube onto a map grid using its IGM navigation file")]
pub struct Opt {
    #[arg(long)]
    pub igm: PathBuf,

    #[arg(long)]
    pub lev1: PathBuf,

    #[arg(long)]
    pub mapname: PathBuf,

    #[arg(long, num_args = 1.., default_values_t = vec!["ALL".to_string()])]
    pub bandlist: Vec<String>,

    #[arg(long, num_args = 2)]
    pub pixelsize: Option<Vec<f64>>,

    #[arg(long, num_args = 4..=6)]
    pub area: Option<Vec<String>>,

    #[arg(long, num_args = 1..=2, default_values_t = vec!["bilinear".to_string()])]
    pub interpolation: Vec<String>,

    #[arg(long)]
    pub buffersize: Option<u64>,

    #[arg(long)]
    pub maxinterpdistance: Option<f64>,

    #[arg(long, default_value = "float32")]
    pub outputdatatype: String,

    #[arg(long, num_args = 1..)]
    pub ignorescan: Option<Vec<String>>,

    #[arg(long, default_value = "NONE")]
    pub ignorevalue: String,

    #[arg(long)]
    pub nodata: Option<f64>,

    #[arg(long)]
    pub rowcolmap: Option<PathBuf>,

    #[arg(long)]
    pub ignorediskspace: bool,

    #[arg(long, default_value = "standard")]
    pub outputlevel: String,
}

fn main() -> ExitCode {
    let opt = Opt::parse();

    let level = match options::parse_output_level(&opt.outputlevel) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(e.exit_code() as u8);
        }
    };

    let default_filter = match level {
        log::LevelFilter::Off => "off",
        log::LevelFilter::Error => "error",
        log::LevelFilter::Warn => "warn",
        log::LevelFilter::Info => "info",
        log::LevelFilter::Debug => "debug",
        log::LevelFilter::Trace => "trace",
    };
    let logger = env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .filter_level(level)
        .format_timestamp(Some(TimestampPrecision::Millis))
        .build();
    let multi = MultiProgress::new();
    LogWrapper::new(multi.clone(), logger).try_init().expect("logger already initialized");
    log::set_max_level(level);

    match run(&opt) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn run(opt: &Opt) -> Result<()> {
    let mut igm = BilRasterReader::open(&opt.igm)?;
    let mut level1 = BilRasterReader::open(&opt.lev1)?;

    if igm.header().rows != level1.header().rows {
        return Err(Error::config(format!(
            "IGM has {} lines but level-1 has {} lines",
            igm.header().rows,
            level1.header().rows
        )));
    }
    if igm.header().bands < 2 {
        return Err(Error::config("IGM file must carry at least X and Y bands"));
    }

    let band_list = options::parse_band_list(&opt.bandlist, level1.header().bands)?;
    let interpolation = options::parse_interpolation(&opt.interpolation)?;
    let output_dtype = options::parse_output_dtype(&opt.outputdatatype)?;
    let ignore_value = options::parse_ignore_value(&opt.ignorevalue)?.or_else(|| level1.header().ignore_value());
    let _ignore_scan = options::parse_ignore_scan(opt.ignorescan.as_deref().unwrap_or(&[]), &band_list)?;
    let nodata = opt.nodata.unwrap_or(-9999.0);
    let metric = if igm.header().is_geographic() { Metric::Geodesic } else { Metric::Planar };
    let projection = igm.header().field("projection").unwrap_or("").to_string();

    let extent = scan_igm_extent(&mut igm)?;
    let area = opt.area.as_deref().map(options::parse_area).transpose()?;
    let (min_x, max_x, min_y, max_y) = match &area {
        Some(a) => (a.min_x, a.max_x, a.min_y, a.max_y),
        None => extent,
    };

    let (psx, psy) = match &opt.pixelsize {
        Some(v) if v.len() == 2 => (v[0], v[1]),
        _ => {
            let spacing = estimate_pixel_size(&mut igm)?;
            (spacing, spacing)
        }
    };
    if psx <= 0.0 || psy <= 0.0 {
        return Err(Error::config("pixel size must be positive"));
    }

    let (rows, cols) = match area.as_ref().and_then(|a| a.rows_cols) {
        Some((rows, cols)) => (rows, cols),
        None => (((max_y - min_y) / psy).ceil().max(1.0) as i64, ((max_x - min_x) / psx).ceil().max(1.0) as i64),
    };

    let global = GridInfo::new(min_x, max_y, psx, psy, rows, cols, band_list.clone(), projection.clone());

    let ram_budget_bytes = opt.buffersize.map(|mb| mb * 1024 * 1024).unwrap_or(MapConfig::default().ram_budget_bytes);

    let required_bytes = rows as u64 * cols as u64 * band_list.len() as u64 * output_dtype.size_in_bytes() as u64;
    if !opt.ignorediskspace {
        inf::fs::ensure_free_space(&opt.mapname, required_bytes)?;
    }

    inf::fs::create_directory_for_file(&opt.mapname)?;
    let mut output = BilRasterWriter::create(&opt.mapname, output_dtype, rows, cols, band_list.len())?;
    output.header_mut().set_field("projection", projection);
    output.header_mut().set_field("data ignore value", nodata.to_string());
    if let Some(bands_field) = level1.header().field("band names") {
        output.header_mut().set_field("band names", bands_field.to_string());
    }
    if let Some(wavelength) = level1.header().field("wavelength") {
        output.header_mut().set_field("wavelength", wavelength.to_string());
    }

    let mut row_col_writer = opt
        .rowcolmap
        .as_ref()
        .map(|path| {
            inf::fs::create_directory_for_file(path)?;
            let mut w = BilRasterWriter::create(path, geo::RasterDataType::Int32, rows, cols, 2)?;
            w.header_mut().set_field("band names", "igm_row, igm_col");
            Result::Ok(w)
        })
        .transpose()?;

    let config = MapConfig {
        band_list,
        interpolation,
        max_interp_distance: opt.maxinterpdistance.unwrap_or(MapConfig::default().max_interp_distance),
        ignore_value,
        output_nodata: nodata,
        ram_budget_bytes,
        metric,
        ..MapConfig::default()
    };

    let engine = MapEngine::new(config);
    let diagnostics = engine.run(&mut igm, &mut level1, &global, &mut output, row_col_writer.as_mut().map(|w| w as &mut dyn RasterWriter))?;
    log::info!("done: {}", diagnostics.summary());

    output.close()?;
    if let Some(mut writer) = row_col_writer {
        writer.close()?;
    }

    Ok(())
}

/// Scans the whole IGM file once to find its ground extent, used when
/// `--area` is not given.
fn scan_igm_extent(igm: &mut BilRasterReader) -> Result<(f64, f64, f64, f64)> {
    let cols = igm.header().cols as usize;
    let rows = igm.header().rows;
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    let mut xbuf = vec![0.0; cols];
    let mut ybuf = vec![0.0; cols];
    for row in 0..rows {
        igm.read_band_line(0, row, &mut xbuf)?;
        igm.read_band_line(1, row, &mut ybuf)?;
        for i in 0..cols {
            min_x = min_x.min(xbuf[i]);
            max_x = max_x.max(xbuf[i]);
            min_y = min_y.min(ybuf[i]);
            max_y = max_y.max(ybuf[i]);
        }
    }

    if !min_x.is_finite() || !max_x.is_finite() || !min_y.is_finite() || !max_y.is_finite() {
        return Err(Error::config("IGM file has no usable X/Y samples"));
    }
    Ok((min_x, max_x, min_y, max_y))
}

/// Mean ground spacing between consecutive samples on the IGM's middle row,
/// used as the output pixel size when `--pixelsize` is not given. A cheap
/// proxy for the true native resolution, same rationale as
/// `engine::estimate_mean_spacing`.
fn estimate_pixel_size(igm: &mut BilRasterReader) -> Result<f64> {
    let cols = igm.header().cols as usize;
    if cols < 2 {
        return Ok(1.0);
    }
    let row = igm.header().rows / 2;
    let mut xbuf = vec![0.0; cols];
    let mut ybuf = vec![0.0; cols];
    igm.read_band_line(0, row, &mut xbuf)?;
    igm.read_band_line(1, row, &mut ybuf)?;

    let mut total = 0.0;
    for i in 0..cols - 1 {
        total += ((xbuf[i + 1] - xbuf[i]).powi(2) + (ybuf[i + 1] - ybuf[i]).powi(2)).sqrt();
    }
    Ok((total / (cols - 1) as f64).max(1e-6))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opt_parses_minimal_required_flags() {
        let opt = Opt::parse_from(["map", "--igm", "a.bil", "--lev1", "b.bil", "--mapname", "c.bil"]);
        assert_eq!(opt.bandlist, vec!["ALL".to_string()]);
        assert_eq!(opt.interpolation, vec!["bilinear".to_string()]);
        assert_eq!(opt.outputlevel, "standard");
        assert!(!opt.ignorediskspace);
    }

    #[test]
    fn opt_parses_idw_with_k() {
        let opt = Opt::parse_from(["map", "--igm", "a.bil", "--lev1", "b.bil", "--mapname", "c.bil", "--interpolation", "idw", "8"]);
        assert_eq!(opt.interpolation, vec!["idw".to_string(), "8".to_string()]);
    }
}
