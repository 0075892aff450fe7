use crate::{Error, Result};
use std::ops::Range;

use num::NumCast;

/// Check if a f64 value fits in a given numerical type.
pub fn fits_in_type<T: NumCast>(v: f64) -> bool {
    let x: Option<T> = NumCast::from(v);
    x.is_some()
}

pub fn option<To: NumCast>(from: Option<impl NumCast>) -> Option<To> {
    from.and_then(|x| NumCast::from(x))
}

pub fn option_or<To: NumCast>(from: Option<impl NumCast>, default: To) -> To {
    from.and_then(|x| NumCast::from(x)).unwrap_or(default)
}

pub fn range<To: NumCast>(from: Range<impl NumCast>) -> Result<Range<To>> {
    Ok(Range {
        start: NumCast::from(from.start).ok_or_else(|| Error::Runtime("Impossible range cast".into()))?,
        end: NumCast::from(from.end).ok_or_else(|| Error::Runtime("Impossible range cast".into()))?,
    })
}

pub fn slice<To: NumCast>(from: &[impl NumCast + Copy]) -> Result<Vec<To>> {
    from.iter()
        .map(|x| NumCast::from(*x).ok_or_else(|| Error::Runtime("Impossible slice cast".into())))
        .collect()
}

/// Converts an `f64` accumulator value to `T`, matching the reference
/// pipeline's `static_cast` semantics: integer destinations round
/// half-away-from-zero (`+0.5` then truncate), floating point destinations
/// truncate (a plain `as` narrowing). Returns `None` if the rounded value
/// does not fit in `T`.
pub fn round_cast<T: NumCast>(value: f64, is_integer: bool) -> Option<T> {
    let value = if is_integer {
        if value >= 0.0 { value + 0.5 } else { value - 0.5 }
    } else {
        value
    };

    NumCast::from(value)
}

/// # Safety
/// Return a u8 slice to a vec of any type, only use this for structs that are #[repr(C)]
/// Otherwise the slice will contain (uninitialized) padding bytes
pub unsafe fn vec_as_u8_slice<T: Sized>(data: &[T]) -> &[u8] {
    unsafe { ::core::slice::from_raw_parts(data.as_ptr().cast::<u8>(), std::mem::size_of_val(data)) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_cast_integer_rounds_half_up() {
        assert_eq!(round_cast::<u16>(4.4, true), Some(4));
        assert_eq!(round_cast::<u16>(4.5, true), Some(5));
        assert_eq!(round_cast::<i32>(-4.5, true), Some(-5));
        assert_eq!(round_cast::<i32>(-4.4, true), Some(-4));
    }

    #[test]
    fn round_cast_float_truncates_only() {
        let v: Option<f32> = round_cast(4.7, false);
        assert_eq!(v, Some(4.7_f32));
    }

    #[test]
    fn round_cast_out_of_range_is_none() {
        assert_eq!(round_cast::<u8>(-1.0, true), None);
        assert_eq!(round_cast::<u8>(1000.0, true), None);
    }
}
