//! Raw `.stab` records and `.stabstr` string access.

use std::fmt;

use crate::error::{StabError, StabResult};

/// Size in bytes of one packed `.stab` record.
pub const STAB_RECORD_SIZE: usize = 12;

/// One packed `.stab` entry.
///
/// Layout: `string_index: u32, kind: u8, other: u8, description: u16, value: u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawStab
{
    /// Offset of the record's string in `.stabstr`; zero means no string
    pub string_index: u32,
    /// Raw record kind (see [`StabKind`])
    pub kind: u8,
    /// Unused by this parser
    pub other: u8,
    /// Line number, function sequence, and similar small values
    pub description: u16,
    /// Address, offset, register or size depending on `kind`
    pub value: u32,
}

impl RawStab
{
    /// Decode one record from exactly [`STAB_RECORD_SIZE`] bytes.
    ///
    /// ## Errors
    ///
    /// Returns [`StabError::Truncated`] if `bytes` is shorter than a record.
    pub fn parse(bytes: &[u8], big_endian: bool) -> StabResult<Self>
    {
        let Some(record) = bytes.get(..STAB_RECORD_SIZE) else {
            return Err(StabError::Truncated);
        };

        let u32_at = |offset: usize| {
            let raw = [record[offset], record[offset + 1], record[offset + 2], record[offset + 3]];
            if big_endian {
                u32::from_be_bytes(raw)
            } else {
                u32::from_le_bytes(raw)
            }
        };

        let description = if big_endian {
            u16::from_be_bytes([record[6], record[7]])
        } else {
            u16::from_le_bytes([record[6], record[7]])
        };

        Ok(Self {
            string_index: u32_at(0),
            kind: record[4],
            other: record[5],
            description,
            value: u32_at(8),
        })
    }

    /// Encode the record in its packed on-disk form.
    #[must_use]
    pub fn to_bytes(&self, big_endian: bool) -> [u8; STAB_RECORD_SIZE]
    {
        let (index, description, value) = if big_endian {
            (
                self.string_index.to_be_bytes(),
                self.description.to_be_bytes(),
                self.value.to_be_bytes(),
            )
        } else {
            (
                self.string_index.to_le_bytes(),
                self.description.to_le_bytes(),
                self.value.to_le_bytes(),
            )
        };

        let mut out = [0; STAB_RECORD_SIZE];
        out[..4].copy_from_slice(&index);
        out[4] = self.kind;
        out[5] = self.other;
        out[6..8].copy_from_slice(&description);
        out[8..].copy_from_slice(&value);
        out
    }

    /// `value` reinterpreted as a signed offset (frame offsets, brace offsets).
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn signed_value(&self) -> i32
    {
        self.value as i32
    }

    /// Decoded record kind, if this parser knows it.
    #[must_use]
    pub const fn stab_kind(&self) -> Option<StabKind>
    {
        StabKind::from_raw(self.kind)
    }
}

/// Record kinds understood by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StabKind
{
    /// `N_GSYM`: global variable
    GlobalSymbol = 0x20,
    /// `N_FUN`: function begin, or function end with an empty string
    Function = 0x24,
    /// `N_STSYM`: initialized static
    Static = 0x26,
    /// `N_LCSYM`: uninitialized (bss) static
    BssSymbol = 0x28,
    /// `N_RSYM`: register variable
    RegisterVariable = 0x40,
    /// `N_SLINE`: line number
    SourceLine = 0x44,
    /// `N_SO`: main source file, or directory when ending in `/`
    SourceFile = 0x64,
    /// `N_LSYM`: stack local or type definition
    LocalSymbol = 0x80,
    /// `N_BINCL`: begin include file
    IncludeBegin = 0x82,
    /// `N_SOL`: name of the file following line numbers belong to
    IncludeName = 0x84,
    /// `N_PSYM`: parameter
    FunctionParameter = 0xa0,
    /// `N_EINCL`: end include file
    IncludeEnd = 0xa2,
    /// `N_LBRAC`: lexical block begin
    LeftBrace = 0xc0,
    /// `N_EXCL`: include file already seen
    IncludePlaceholder = 0xc2,
    /// `N_RBRAC`: lexical block end
    RightBrace = 0xe0,
}

impl StabKind
{
    /// Decode a raw kind byte.
    #[must_use]
    pub const fn from_raw(kind: u8) -> Option<Self>
    {
        Some(match kind {
            0x20 => StabKind::GlobalSymbol,
            0x24 => StabKind::Function,
            0x26 => StabKind::Static,
            0x28 => StabKind::BssSymbol,
            0x40 => StabKind::RegisterVariable,
            0x44 => StabKind::SourceLine,
            0x64 => StabKind::SourceFile,
            0x80 => StabKind::LocalSymbol,
            0x82 => StabKind::IncludeBegin,
            0x84 => StabKind::IncludeName,
            0xa0 => StabKind::FunctionParameter,
            0xa2 => StabKind::IncludeEnd,
            0xc0 => StabKind::LeftBrace,
            0xc2 => StabKind::IncludePlaceholder,
            0xe0 => StabKind::RightBrace,
            _ => return None,
        })
    }

    /// Raw kind byte.
    #[must_use]
    pub const fn raw(self) -> u8
    {
        self as u8
    }

    /// Kinds whose string is a file name rather than `name:descriptor`.
    #[must_use]
    pub const fn is_source_file(self) -> bool
    {
        matches!(
            self,
            StabKind::SourceFile | StabKind::IncludeBegin | StabKind::IncludeName | StabKind::IncludePlaceholder
        )
    }
}

impl fmt::Display for StabKind
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let label = match self {
            StabKind::GlobalSymbol => "GSYM",
            StabKind::Function => "FUN",
            StabKind::Static => "STSYM",
            StabKind::BssSymbol => "LCSYM",
            StabKind::RegisterVariable => "RSYM",
            StabKind::SourceLine => "SLINE",
            StabKind::SourceFile => "SO",
            StabKind::LocalSymbol => "LSYM",
            StabKind::IncludeBegin => "BINCL",
            StabKind::IncludeName => "SOL",
            StabKind::FunctionParameter => "PSYM",
            StabKind::IncludeEnd => "EINCL",
            StabKind::LeftBrace => "LBRAC",
            StabKind::IncludePlaceholder => "EXCL",
            StabKind::RightBrace => "RBRAC",
        };
        f.write_str(label)
    }
}

/// Iterator over the records of a `.stab` section.
///
/// A trailing partial record yields one [`StabError::Truncated`] and ends the
/// iteration.
#[derive(Debug, Clone)]
pub struct StabIter<'a>
{
    data: &'a [u8],
    big_endian: bool,
}

impl<'a> StabIter<'a>
{
    /// Iterate over `data`.
    #[must_use]
    pub fn new(data: &'a [u8], big_endian: bool) -> Self
    {
        Self { data, big_endian }
    }
}

impl Iterator for StabIter<'_>
{
    type Item = StabResult<RawStab>;

    fn next(&mut self) -> Option<Self::Item>
    {
        if self.data.is_empty() {
            return None;
        }

        if self.data.len() < STAB_RECORD_SIZE {
            self.data = &[];
            return Some(Err(StabError::Truncated));
        }

        let (record, rest) = self.data.split_at(STAB_RECORD_SIZE);
        self.data = rest;
        Some(RawStab::parse(record, self.big_endian))
    }

    fn size_hint(&self) -> (usize, Option<usize>)
    {
        let count = self.data.len().div_ceil(STAB_RECORD_SIZE);
        (count, Some(count))
    }
}

/// Fetch the NUL-terminated string at `index` in `.stabstr`.
///
/// Index zero and indices past the end mean "no string".
///
/// ## Errors
///
/// Returns [`StabError::Truncated`] if the string is not terminated before the
/// end of the table.
pub fn stab_string(strings: &[u8], index: u32) -> StabResult<Option<&[u8]>>
{
    let Ok(start) = usize::try_from(index) else {
        return Ok(None);
    };

    if start == 0 || start >= strings.len() {
        return Ok(None);
    }

    let tail = &strings[start..];
    match tail.iter().position(|&byte| byte == 0) {
        Some(end) => Ok(Some(&tail[..end])),
        None => Err(StabError::Truncated),
    }
}

/// Split `name:rest` at the first colon that is not part of `::`.
///
/// Without such a colon there is no name and the whole string is returned.
pub(crate) fn split_stab_name(string: &[u8]) -> (Option<&[u8]>, &[u8])
{
    let mut search = 0;
    while let Some(offset) = string[search..].iter().position(|&byte| byte == b':') {
        let colon = search + offset;
        if string.get(colon + 1) == Some(&b':') {
            search = colon + 2;
            if search >= string.len() {
                break;
            }
            continue;
        }

        return (Some(&string[..colon]), &string[colon + 1..]);
    }

    (None, string)
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_record_layout_little_endian()
    {
        let bytes = [0x10, 0, 0, 0, 0x24, 0x01, 0x05, 0x00, 0x00, 0x10, 0x40, 0x00];
        let stab = RawStab::parse(&bytes, false).unwrap();
        assert_eq!(stab.string_index, 0x10);
        assert_eq!(stab.kind, 0x24);
        assert_eq!(stab.other, 1);
        assert_eq!(stab.description, 5);
        assert_eq!(stab.value, 0x0040_1000);
        assert_eq!(stab.stab_kind(), Some(StabKind::Function));
        assert_eq!(stab.to_bytes(false), bytes);
    }

    #[test]
    fn test_record_layout_big_endian()
    {
        let stab = RawStab {
            string_index: 1,
            kind: StabKind::SourceLine.raw(),
            other: 0,
            description: 0x0102,
            value: 0x0a0b_0c0d,
        };
        let bytes = stab.to_bytes(true);
        assert_eq!(&bytes[6..8], &[1, 2]);
        assert_eq!(RawStab::parse(&bytes, true).unwrap(), stab);
    }

    #[test]
    fn test_iterator_reports_trailing_partial_record()
    {
        let mut data = RawStab::default().to_bytes(false).to_vec();
        data.extend_from_slice(&[1, 2, 3]);
        let records: Vec<_> = StabIter::new(&data, false).collect();
        assert_eq!(records.len(), 2);
        assert!(records[0].is_ok());
        assert_eq!(records[1], Err(StabError::Truncated));
    }

    #[test]
    fn test_stab_string_bounds()
    {
        let strings = b"\0main:F1\0tail";
        assert_eq!(stab_string(strings, 0), Ok(None));
        assert_eq!(stab_string(strings, 1), Ok(Some(&b"main:F1"[..])));
        assert_eq!(stab_string(strings, 100), Ok(None));
        assert_eq!(stab_string(strings, 9), Err(StabError::Truncated));
    }

    #[test]
    fn test_split_name_skips_scope_operator()
    {
        assert_eq!(split_stab_name(b"main:F1"), (Some(&b"main"[..]), &b"F1"[..]));
        assert_eq!(split_stab_name(b"ns::f:F(0,1)"), (Some(&b"ns::f"[..]), &b"F(0,1)"[..]));
        assert_eq!(split_stab_name(b"nocolon"), (None, &b"nocolon"[..]));
        assert_eq!(split_stab_name(b"a::"), (None, &b"a::"[..]));
        assert_eq!(split_stab_name(b":t1"), (Some(&b""[..]), &b"t1"[..]));
    }

    #[test]
    fn test_unknown_kind()
    {
        assert_eq!(StabKind::from_raw(0x3c), None);
        assert!(StabKind::IncludePlaceholder.is_source_file());
        assert!(!StabKind::LocalSymbol.is_source_file());
    }
}
