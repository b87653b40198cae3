//! # Error Types
//!
//! Error handling for symbol loading.
//!
//! Two layers exist. [`StabError`] describes why a single STABS record (or a
//! single cross reference) could not be turned into symbols; the record loop
//! logs it and moves on. [`SymbolError`] is what a whole load reports, and only
//! arises from I/O, container problems, or a fatal [`StabError`].

use thiserror::Error;

use crate::types::MachineType;

/// Failure while decoding a single STABS record.
///
/// Every variant except [`StabError::Allocation`] is recovered at the record
/// that produced it: the symbol described by that record is simply absent from
/// the database.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StabError
{
    /// The record or its string ran past the end of its section
    ///
    /// Raised for a trailing partial record in `.stab` and for a string that
    /// has no NUL terminator before the end of `.stabstr`.
    #[error("Truncated STABS data")]
    Truncated,

    /// A string did not follow the STABS grammar
    ///
    /// Examples:
    /// - A missing integer where one is required (`s` without a byte size)
    /// - An include index that was never pushed
    /// - A range bound that is empty or too long
    #[error("Malformed STABS string: {0}")]
    BadEncoding(String),

    /// A type definition started with a descriptor this parser does not know
    #[error("Unknown type descriptor '{0}'")]
    UnknownDescriptor(char),

    /// A handler ran without the scope it needs
    ///
    /// For example a register variable outside of any function, or a source
    /// line before any source file was opened.
    #[error("No current {0}")]
    MissingScope(&'static str),

    /// Growing one of the database collections failed
    ///
    /// This is the only condition that aborts the whole parse.
    #[error("Out of memory while building the symbol database")]
    Allocation,
}

impl StabError
{
    /// Whether this error must abort the whole parse.
    #[must_use]
    pub const fn is_fatal(&self) -> bool
    {
        matches!(self, StabError::Allocation)
    }

    pub(crate) fn bad(message: impl Into<String>) -> Self
    {
        StabError::BadEncoding(message.into())
    }
}

/// Convenience type alias for `Result<T, StabError>`
pub type StabResult<T> = std::result::Result<T, StabError>;

/// Error returned by the symbol loading entry points.
#[derive(Error, Debug)]
pub enum SymbolError
{
    /// The binary could not be read from disk
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The container (PE or ELF) could not be parsed
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// A required section is absent or empty
    ///
    /// Both `.stab` and `.stabstr` must be present and non-empty.
    #[error("Missing or empty section {0}")]
    MissingSection(&'static str),

    /// The image was built for a different machine than the caller expected
    #[error("Machine mismatch: expected {expected}, image is {actual}")]
    MachineMismatch
    {
        /// Machine the caller asked for
        expected: MachineType,
        /// Machine recorded in the image header
        actual: MachineType,
    },

    /// Invalid argument passed to a loader function
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// STABS parsing hit a fatal error
    #[error("STABS parse aborted: {0}")]
    Stab(#[from] StabError),
}

/// Convenience type alias for `Result<T, SymbolError>`
///
/// ```rust
/// use stabsym_core::error::Result;
/// fn foo() -> Result<()>
/// {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, SymbolError>;
