//! Pure parsing/validation helpers for the CLI flags in [`crate::Opt`]. Kept
//! separate from `main.rs` so the `ConfigError` checks (§7) are unit
//! testable without a filesystem or a parsed `clap::Parser`, matching
//! `tools/createcog/src/createtiles.rs`'s `create_opts` convention.

use geo::RasterDataType;
use geo::interp::InterpolationKind;
use inf::Error;

/// Parses `--bandlist`: `ALL`, an inclusive 1-based range `a-b`, or a
/// space-separated list of 1-based band numbers. Returns 0-based indices.
pub fn parse_band_list(tokens: &[String], available_bands: usize) -> Result<Vec<usize>, Error> {
    if tokens.is_empty() || tokens.iter().any(|t| t.eq_ignore_ascii_case("all")) {
        return Ok((0..available_bands).collect());
    }

    if tokens.len() == 1 {
        if let Some((lo, hi)) = tokens[0].split_once('-') {
            let lo: usize = lo.trim().parse().map_err(|_| Error::config(format!("invalid --bandlist range '{}'", tokens[0])))?;
            let hi: usize = hi.trim().parse().map_err(|_| Error::config(format!("invalid --bandlist range '{}'", tokens[0])))?;
            if lo == 0 || hi < lo {
                return Err(Error::config(format!("invalid --bandlist range '{}'", tokens[0])));
            }
            return validate_bands((lo - 1..hi).collect(), available_bands);
        }
    }

    let mut bands = Vec::with_capacity(tokens.len());
    for token in tokens {
        let one_based: usize = token.parse().map_err(|_| Error::config(format!("invalid --bandlist entry '{token}'")))?;
        if one_based == 0 {
            return Err(Error::config("--bandlist band numbers are 1-based, got 0"));
        }
        bands.push(one_based - 1);
    }
    validate_bands(bands, available_bands)
}

fn validate_bands(bands: Vec<usize>, available_bands: usize) -> Result<Vec<usize>, Error> {
    for &b in &bands {
        if b >= available_bands {
            return Err(Error::config(format!("--bandlist requests band {} but the level-1 file only has {available_bands}", b + 1)));
        }
    }
    Ok(bands)
}

/// Parses `--interpolation {nearest|bilinear|bilinearlev1|idw N|cubic}`.
pub fn parse_interpolation(tokens: &[String]) -> Result<InterpolationKind, Error> {
    let Some(kind) = tokens.first() else {
        return Err(Error::config("--interpolation requires a kernel name"));
    };

    match kind.to_ascii_lowercase().as_str() {
        "nearest" => Ok(InterpolationKind::Nearest),
        "bilinear" => Ok(InterpolationKind::Bilinear),
        "bilinearlev1" => Ok(InterpolationKind::BilinearLevel1),
        "cubic" | "bicubic" => Ok(InterpolationKind::Bicubic),
        "idw" => {
            let k = tokens
                .get(1)
                .ok_or_else(|| Error::config("--interpolation idw requires a neighbour count, e.g. '--interpolation idw 8'"))?
                .parse::<usize>()
                .map_err(|_| Error::config(format!("invalid IDW neighbour count '{}'", tokens[1])))?;
            if k == 0 {
                return Err(Error::config("--interpolation idw neighbour count must be at least 1"));
            }
            Ok(InterpolationKind::InverseDistance { k })
        }
        other => Err(Error::config(format!("unknown --interpolation kernel '{other}'"))),
    }
}

/// Parses `--ignorevalue {<number>|NONE}`.
pub fn parse_ignore_value(s: &str) -> Result<Option<f64>, Error> {
    if s.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    s.parse::<f64>().map(Some).map_err(|_| Error::config(format!("invalid --ignorevalue '{s}'")))
}

/// Parses `--outputdatatype`.
pub fn parse_output_dtype(s: &str) -> Result<RasterDataType, Error> {
    RasterDataType::from_str(s).ok_or_else(|| Error::config(format!("unsupported --outputdatatype '{s}'")))
}

/// Parses `--outputlevel {standard|verbose|debug}` into the matching
/// `env_logger` filter, per §5.1's `standard -> warn`, `verbose -> info`,
/// `debug -> debug` mapping.
pub fn parse_output_level(s: &str) -> Result<log::LevelFilter, Error> {
    match s.to_ascii_lowercase().as_str() {
        "standard" => Ok(log::LevelFilter::Warn),
        "verbose" => Ok(log::LevelFilter::Info),
        "debug" => Ok(log::LevelFilter::Debug),
        other => Err(Error::config(format!("unknown --outputlevel '{other}'"))),
    }
}

/// Parses `--ignorescan <list>`, a space-separated list of 1-based band
/// numbers to apply the ignore-value retry to. `None` (the flag absent)
/// means every requested band is scanned, which is also the behaviour when
/// the list names every requested band explicitly.
pub fn parse_ignore_scan(tokens: &[String], requested_bands: &[usize]) -> Result<Option<Vec<usize>>, Error> {
    if tokens.is_empty() {
        return Ok(None);
    }
    let mut scan = Vec::with_capacity(tokens.len());
    for token in tokens {
        let one_based: usize = token.parse().map_err(|_| Error::config(format!("invalid --ignorescan entry '{token}'")))?;
        if one_based == 0 || !requested_bands.contains(&(one_based - 1)) {
            return Err(Error::config(format!("--ignorescan band {one_based} is not part of --bandlist")));
        }
        scan.push(one_based - 1);
    }
    Ok(Some(scan))
}

/// `--area <minx> <maxx> <miny> <maxy> [rows cols]`, parsed from the raw
/// token list clap hands back (mixed float/int arity ruled out a typed
/// `clap::Args` struct).
pub struct AreaOverride {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub rows_cols: Option<(i64, i64)>,
}

pub fn parse_area(tokens: &[String]) -> Result<AreaOverride, Error> {
    if tokens.len() != 4 && tokens.len() != 6 {
        return Err(Error::config("--area takes 4 values (minx maxx miny maxy) or 6 (... rows cols)"));
    }
    let f = |i: usize| tokens[i].parse::<f64>().map_err(|_| Error::config(format!("invalid --area value '{}'", tokens[i])));
    let min_x = f(0)?;
    let max_x = f(1)?;
    let min_y = f(2)?;
    let max_y = f(3)?;
    if max_x <= min_x || max_y <= min_y {
        return Err(Error::config("--area bounds must satisfy maxx > minx and maxy > miny"));
    }

    let rows_cols = if tokens.len() == 6 {
        let rows = tokens[4].parse::<i64>().map_err(|_| Error::config(format!("invalid --area rows '{}'", tokens[4])))?;
        let cols = tokens[5].parse::<i64>().map_err(|_| Error::config(format!("invalid --area cols '{}'", tokens[5])))?;
        if rows <= 0 || cols <= 0 {
            return Err(Error::config("--area rows/cols must be positive"));
        }
        Some((rows, cols))
    } else {
        None
    };

    Ok(AreaOverride { min_x, max_x, min_y, max_y, rows_cols })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bandlist_all_expands_to_every_band() {
        assert_eq!(parse_band_list(&["ALL".to_string()], 4).unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn bandlist_range_is_inclusive_and_one_based() {
        assert_eq!(parse_band_list(&["2-4".to_string()], 5).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn bandlist_explicit_list_rejects_out_of_range() {
        assert!(parse_band_list(&["1".to_string(), "9".to_string()], 4).is_err());
    }

    #[test]
    fn interpolation_idw_requires_k() {
        assert!(parse_interpolation(&["idw".to_string()]).is_err());
        let kind = parse_interpolation(&["idw".to_string(), "6".to_string()]).unwrap();
        assert_eq!(kind, InterpolationKind::InverseDistance { k: 6 });
    }

    #[test]
    fn ignorevalue_none_is_case_insensitive() {
        assert_eq!(parse_ignore_value("NONE").unwrap(), None);
        assert_eq!(parse_ignore_value("none").unwrap(), None);
        assert_eq!(parse_ignore_value("-9999").unwrap(), Some(-9999.0));
    }

    #[test]
    fn output_level_maps_to_log_filter() {
        assert_eq!(parse_output_level("standard").unwrap(), log::LevelFilter::Warn);
        assert_eq!(parse_output_level("verbose").unwrap(), log::LevelFilter::Info);
        assert_eq!(parse_output_level("debug").unwrap(), log::LevelFilter::Debug);
        assert!(parse_output_level("chatty").is_err());
    }

    #[test]
    fn area_rejects_degenerate_bounds() {
        let tokens: Vec<String> = ["0", "0", "0", "10"].iter().map(|s| s.to_string()).collect();
        assert!(parse_area(&tokens).is_err());
    }

    #[test]
    fn area_with_rows_cols_parses_the_trailing_pair() {
        let tokens: Vec<String> = ["0", "10", "0", "20", "200", "100"].iter().map(|s| s.to_string()).collect();
        let area = parse_area(&tokens).unwrap();
        assert_eq!(area.rows_cols, Some((200, 100)));
    }
}
