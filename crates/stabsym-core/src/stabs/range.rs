//! Subrange bounds and the numeric type they imply.
//!
//! STABS describes integer base types only by their bounds, e.g.
//! `int:t1=r1;-2147483648;2147483647;`. Width and signedness are inferred from
//! those bounds; a zero maximum with a positive minimum is the float encoding
//! where the minimum carries the size in bytes.

use super::cursor::{parse_c_integer, StabCursor};
use crate::database::{DataRange, NumericType};
use crate::error::{StabError, StabResult};

/// Bound strings at or above this length are rejected.
pub const MAX_RANGE_STRING: usize = 32;

/// Octal spelling of `u64::MAX`, which does not fit in the signed maximum.
const UNSIGNED_64_MAXIMUM: &[u8] = b"01777777777777777777777";

/// Octal spelling of `i64::MAX`.
const SIGNED_64_MAXIMUM: &[u8] = b"0777777777777777777777";

/// Octal spelling of `i64::MIN`.
const SIGNED_64_MINIMUM: &[u8] = b"01000000000000000000000";

/// Parse `min;max;` and leave the cursor after the second `;`.
pub(crate) fn parse_range(cursor: &mut StabCursor<'_>) -> StabResult<DataRange>
{
    let minimum = take_bound(cursor, "minimum")?;
    let maximum = take_bound(cursor, "maximum")?;

    let mut range = DataRange::new(parse_c_integer(minimum, 0), parse_c_integer(maximum, 0));
    if maximum == UNSIGNED_64_MAXIMUM {
        range.max_ulonglong = true;
        range.maximum = 0;
    }

    if maximum == SIGNED_64_MAXIMUM {
        range.maximum = i64::MAX;
    }

    if minimum == SIGNED_64_MINIMUM {
        range.minimum = i64::MIN;
    }

    Ok(range)
}

fn take_bound<'s>(cursor: &mut StabCursor<'s>, which: &str) -> StabResult<&'s [u8]>
{
    let bound = cursor.take_until(b';').ok_or(StabError::Truncated)?;
    if bound.is_empty() || bound.len() >= MAX_RANGE_STRING {
        return Err(StabError::bad(format!("range {which} has invalid length {}", bound.len())));
    }

    Ok(bound)
}

/// Parse a standalone `min;max;` string, returning the range and what follows it.
///
/// ```rust
/// use stabsym_core::stabs::parse_range_str;
///
/// let (range, rest) = parse_range_str(b"-128;127;tail").unwrap();
/// assert_eq!((range.minimum, range.maximum), (-128, 127));
/// assert_eq!(rest, b"tail");
/// ```
///
/// ## Errors
///
/// Returns [`StabError::Truncated`] when a `;` is missing and
/// [`StabError::BadEncoding`] for empty or overlong bounds.
pub fn parse_range_str(text: &[u8]) -> StabResult<(DataRange, &[u8])>
{
    let mut cursor = StabCursor::new(text);
    let range = parse_range(&mut cursor)?;
    Ok((range, cursor.rest()))
}

/// Infer the numeric type a subrange describes.
///
/// The width is the smallest of 8, 16, 32 and 64 bits whose unsigned maximum
/// holds `range.maximum`; the type is signed when the minimum is negative. A
/// zero maximum with a positive minimum is a float of `minimum * 8` bits.
///
/// ```rust
/// use stabsym_core::database::DataRange;
/// use stabsym_core::stabs::range_to_numeric;
///
/// let int = range_to_numeric(&DataRange::new(-2147483648, 2147483647));
/// assert_eq!((int.bit_size, int.signed, int.float), (32, true, false));
///
/// let double = range_to_numeric(&DataRange::new(8, 0));
/// assert_eq!((double.bit_size, double.float), (64, true));
/// ```
#[must_use]
pub fn range_to_numeric(range: &DataRange) -> NumericType
{
    let signed = range.minimum < 0;
    if range.max_ulonglong {
        return NumericType {
            bit_size: 64,
            signed,
            float: false,
        };
    }

    if range.maximum == 0 && range.minimum > 0 {
        return NumericType {
            bit_size: u32::try_from(range.minimum.saturating_mul(8)).unwrap_or(u32::MAX),
            signed: false,
            float: true,
        };
    }

    let bit_size = if range.maximum <= i64::from(u8::MAX) {
        8
    } else if range.maximum <= i64::from(u16::MAX) {
        16
    } else if range.maximum <= i64::from(u32::MAX) {
        32
    } else {
        64
    };

    NumericType {
        bit_size,
        signed,
        float: false,
    }
}
