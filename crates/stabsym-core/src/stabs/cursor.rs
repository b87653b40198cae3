//! Byte cursor over a single stab string.

use crate::error::{StabError, StabResult};

/// Forward-only reader over the bytes of one stab string.
///
/// STABS strings are ASCII grammar around arbitrary name bytes, so the cursor
/// works on bytes and only converts names to `String` at the edges.
#[derive(Debug, Clone)]
pub(crate) struct StabCursor<'s>
{
    text: &'s [u8],
    position: usize,
}

impl<'s> StabCursor<'s>
{
    pub(crate) fn new(text: &'s [u8]) -> Self
    {
        Self { text, position: 0 }
    }

    pub(crate) fn peek(&self) -> Option<u8>
    {
        self.text.get(self.position).copied()
    }

    pub(crate) fn is_empty(&self) -> bool
    {
        self.position >= self.text.len()
    }

    /// Unconsumed bytes.
    pub(crate) fn rest(&self) -> &'s [u8]
    {
        self.text.get(self.position..).unwrap_or_default()
    }

    /// Skip one byte; a no-op at the end.
    pub(crate) fn bump(&mut self)
    {
        if !self.is_empty() {
            self.position += 1;
        }
    }

    /// Consume `byte` if it is next.
    pub(crate) fn eat(&mut self, byte: u8) -> bool
    {
        if self.peek() == Some(byte) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, byte: u8) -> StabResult<()>
    {
        match self.peek() {
            Some(found) if found == byte => {
                self.position += 1;
                Ok(())
            }
            Some(found) => Err(StabError::bad(format!(
                "expected '{}' but found '{}'",
                char::from(byte),
                char::from(found)
            ))),
            None => Err(StabError::Truncated),
        }
    }

    /// Advance past the next `byte`. Without one, move to the end and return false.
    pub(crate) fn skip_past(&mut self, byte: u8) -> bool
    {
        match self.rest().iter().position(|&b| b == byte) {
            Some(offset) => {
                self.position += offset + 1;
                true
            }
            None => {
                self.position = self.text.len();
                false
            }
        }
    }

    /// Bytes before the next `byte`, consuming the delimiter too.
    ///
    /// Leaves the cursor untouched when `byte` does not occur.
    pub(crate) fn take_until(&mut self, byte: u8) -> Option<&'s [u8]>
    {
        let rest = self.rest();
        let offset = rest.iter().position(|&b| b == byte)?;
        self.position += offset + 1;
        Some(&rest[..offset])
    }

    /// Consume and return everything left.
    pub(crate) fn take_rest(&mut self) -> &'s [u8]
    {
        let rest = self.rest();
        self.position = self.text.len();
        rest
    }

    /// Name of a structure member: bytes up to a colon that has no colon on
    /// either side, consuming that colon.
    pub(crate) fn take_member_name(&mut self) -> Option<&'s [u8]>
    {
        let rest = self.rest();
        let colon = (0..rest.len()).find(|&i| {
            rest[i] == b':' && (i == 0 || rest[i - 1] != b':') && rest.get(i + 1) != Some(&b':')
        })?;
        self.position += colon + 1;
        Some(&rest[..colon])
    }

    /// Optionally signed decimal integer, like `sscanf("%d")` without the
    /// whitespace skipping.
    pub(crate) fn parse_decimal(&mut self) -> StabResult<i64>
    {
        let rest = self.rest();
        let sign_len = usize::from(matches!(rest.first(), Some(b'-' | b'+')));
        let digits = rest[sign_len..].iter().take_while(|b| b.is_ascii_digit()).count();
        if digits == 0 {
            return Err(match rest.first() {
                None => StabError::Truncated,
                Some(_) => StabError::bad(format!("expected integer at '{}'", String::from_utf8_lossy(rest))),
            });
        }

        let end = sign_len + digits;
        let value = parse_c_integer(&rest[..end], 10);
        self.position += end;
        Ok(value)
    }

    /// Decimal integer that must fit in an `i32`.
    pub(crate) fn parse_i32(&mut self) -> StabResult<i32>
    {
        let value = self.parse_decimal()?;
        i32::try_from(value).map_err(|_| StabError::bad(format!("integer {value} out of range")))
    }

    /// Decimal integer that must fit in a `u32`.
    pub(crate) fn parse_u32(&mut self) -> StabResult<u32>
    {
        let value = self.parse_decimal()?;
        u32::try_from(value).map_err(|_| StabError::bad(format!("integer {value} out of range")))
    }

    /// Lenient decimal value like `strtoll(.., 10)`: zero when no digits follow.
    /// Consumes nothing.
    pub(crate) fn peek_lenient_decimal(&self) -> i64
    {
        parse_c_integer(self.rest(), 10)
    }
}

/// Parse the longest integer prefix of `text` the way C `strtoll` does.
///
/// `radix` 0 selects octal for a leading `0`, hexadecimal for `0x`, and decimal
/// otherwise. Leading whitespace and a sign are accepted. Out of range values
/// saturate to `i64::MIN`/`i64::MAX`; text without digits yields zero.
pub(crate) fn parse_c_integer(text: &[u8], radix: u32) -> i64
{
    let mut bytes = text.iter().copied().skip_while(u8::is_ascii_whitespace).peekable();
    let negative = match bytes.peek() {
        Some(b'-') => {
            bytes.next();
            true
        }
        Some(b'+') => {
            bytes.next();
            false
        }
        _ => false,
    };

    let digits: Vec<u8> = bytes.collect();
    let (radix, digits) = match radix {
        0 => match digits.as_slice() {
            [b'0', b'x' | b'X', rest @ ..] if rest.first().is_some_and(u8::is_ascii_hexdigit) => (16, rest),
            [b'0', ..] => (8, &digits[..]),
            _ => (10, &digits[..]),
        },
        radix => (radix, &digits[..]),
    };

    let mut magnitude: u64 = 0;
    let mut overflow = false;
    for &byte in digits {
        let Some(digit) = char::from(byte).to_digit(radix) else {
            break;
        };
        match magnitude.checked_mul(u64::from(radix)).and_then(|m| m.checked_add(u64::from(digit))) {
            Some(next) => magnitude = next,
            None => overflow = true,
        }
    }

    if negative {
        if overflow || magnitude > i64::MIN.unsigned_abs() {
            i64::MIN
        } else {
            0i64.wrapping_sub_unsigned(magnitude)
        }
    } else if overflow {
        i64::MAX
    } else {
        i64::try_from(magnitude).unwrap_or(i64::MAX)
    }
}
