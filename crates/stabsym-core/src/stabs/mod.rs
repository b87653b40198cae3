//! # STABS
//!
//! Parser for the STABS debug format found in the `.stab` and `.stabstr`
//! sections of PE and ELF images built by older GNU toolchains.
//!
//! Each `.stab` record is a fixed 12 byte entry whose string (in `.stabstr`)
//! carries a small grammar of names, type references and type definitions.
//! [`parse_stabs`] walks the records in order and fills a
//! [`SymbolDatabase`](crate::database::SymbolDatabase).
//!
//! Parsing is best effort: a record that cannot be understood is logged and
//! skipped, and only running out of memory aborts a parse.

mod cursor;
mod grammar;
mod handlers;
mod parser;
mod range;
pub mod record;
mod scope;
mod xref;

pub use parser::{parse_stabs, StabStats};
pub use range::{parse_range_str, range_to_numeric, MAX_RANGE_STRING};
pub use record::{stab_string, RawStab, StabIter, StabKind, STAB_RECORD_SIZE};

pub use crate::error::{StabError, StabResult};

/// Type number GCC uses for `bool` without ever defining it.
const BUILTIN_TYPE_BOOL: i32 = -16;

/// Definition applied the first time [`BUILTIN_TYPE_BOOL`] is referenced.
const BUILTIN_TYPE_BOOL_DEFINITION: &[u8] = b"@s1;r-16;0;1;";

/// Deepest chain of inline `=` definitions accepted in one string.
const MAX_TYPE_NESTING: usize = 64;

fn lossy(bytes: &[u8]) -> String
{
    String::from_utf8_lossy(bytes).into_owned()
}
