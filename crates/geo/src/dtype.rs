//! The set of Level-1 / Level-3 pixel data types this engine supports.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterDataType {
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float32,
    Float64,
}

impl RasterDataType {
    pub fn size_in_bytes(self) -> usize {
        match self {
            RasterDataType::Uint8 => 1,
            RasterDataType::Int16 | RasterDataType::Uint16 => 2,
            RasterDataType::Int32 | RasterDataType::Uint32 | RasterDataType::Float32 => 4,
            RasterDataType::Float64 => 8,
        }
    }

    pub fn to_str(self) -> &'static str {
        match self {
            RasterDataType::Uint8 => "uchar8",
            RasterDataType::Int16 => "int16",
            RasterDataType::Uint16 => "uint16",
            RasterDataType::Int32 => "int32",
            RasterDataType::Uint32 => "uint32",
            RasterDataType::Float32 => "float32",
            RasterDataType::Float64 => "float64",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "uchar8" | "uint8" | "u8" => RasterDataType::Uint8,
            "int16" | "i16" => RasterDataType::Int16,
            "uint16" | "u16" => RasterDataType::Uint16,
            "int32" | "i32" => RasterDataType::Int32,
            "uint32" | "u32" => RasterDataType::Uint32,
            "float32" | "f32" => RasterDataType::Float32,
            "float64" | "f64" => RasterDataType::Float64,
            _ => return None,
        })
    }

    /// Whether values of this type round (destination of a `static_cast`
    /// with `+0.5` half-away-from-zero semantics) instead of truncating.
    pub fn is_integer(self) -> bool {
        !matches!(self, RasterDataType::Float32 | RasterDataType::Float64)
    }
}

impl std::fmt::Display for RasterDataType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for dt in [
            RasterDataType::Uint8,
            RasterDataType::Int16,
            RasterDataType::Uint16,
            RasterDataType::Int32,
            RasterDataType::Uint32,
            RasterDataType::Float32,
            RasterDataType::Float64,
        ] {
            assert_eq!(RasterDataType::from_str(dt.to_str()), Some(dt));
        }
    }

    #[test]
    fn integer_vs_float() {
        assert!(RasterDataType::Uint8.is_integer());
        assert!(!RasterDataType::Float64.is_integer());
    }
}
