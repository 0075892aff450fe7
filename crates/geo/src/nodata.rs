use num::ToPrimitive;

/// A type-level no-data sentinel for the seven Level-1/Level-3 pixel types.
/// Unsigned integers use their maximum value, signed integers their minimum,
/// and floating point types use NaN.
pub trait Nodata: ToPrimitive + PartialEq + PartialOrd + Sized + Copy {
    const NODATA: Self;

    #[inline]
    fn is_nodata(self) -> bool {
        self == Self::NODATA
    }

    fn has_nan() -> bool;
    fn is_nan(self) -> bool;
}

macro_rules! impl_nodata_fixed_point {
    ( $t:ident, $nodata:ident ) => {
        impl Nodata for $t {
            const NODATA: $t = $t::$nodata;

            fn has_nan() -> bool {
                false
            }

            fn is_nan(self) -> bool {
                false
            }
        }
    };
}

macro_rules! impl_nodata_floating_point {
    ( $t:ident ) => {
        impl Nodata for $t {
            const NODATA: $t = $t::NAN;

            fn is_nodata(self) -> bool {
                self.is_nan()
            }

            fn has_nan() -> bool {
                true
            }

            fn is_nan(self) -> bool {
                self.is_nan()
            }
        }
    };
}

impl_nodata_fixed_point!(u8, MAX);
impl_nodata_fixed_point!(u16, MAX);
impl_nodata_fixed_point!(u32, MAX);
impl_nodata_fixed_point!(i16, MIN);
impl_nodata_fixed_point!(i32, MIN);

impl_nodata_floating_point!(f32);
impl_nodata_floating_point!(f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_nodata_is_max() {
        assert_eq!(u16::NODATA, u16::MAX);
        assert!(u16::MAX.is_nodata());
    }

    #[test]
    fn signed_nodata_is_min() {
        assert_eq!(i32::NODATA, i32::MIN);
    }

    #[test]
    fn float_nodata_is_nan() {
        assert!(f64::NODATA.is_nan());
        assert!(f64::NODATA.is_nodata());
        assert!(!1.0_f64.is_nodata());
    }
}
