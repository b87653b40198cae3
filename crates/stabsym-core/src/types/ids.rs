//! Arena keys for source files, functions and types.

use std::fmt;

/// Index of a [`SourceFile`](crate::database::SourceFile) inside its database.
///
/// Identifiers are assigned in creation order and stay valid for the lifetime
/// of the database that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceFileId(usize);

impl SourceFileId
{
    pub(crate) const fn new(index: usize) -> Self
    {
        Self(index)
    }

    /// Position of the file in creation order.
    #[must_use]
    pub const fn index(self) -> usize
    {
        self.0
    }
}

impl fmt::Display for SourceFileId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "file#{}", self.0)
    }
}

/// Identifies a function by its owning source file and position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId
{
    source: SourceFileId,
    index: usize,
}

impl FunctionId
{
    pub(crate) const fn new(source: SourceFileId, index: usize) -> Self
    {
        Self { source, index }
    }

    /// Source file that owns the function.
    #[must_use]
    pub const fn source(self) -> SourceFileId
    {
        self.source
    }

    /// Position within the owning file's function list.
    #[must_use]
    pub const fn index(self) -> usize
    {
        self.index
    }
}

/// Key of a type: the file whose namespace defines it plus its type number.
///
/// STABS type numbers are only unique within one `(file, include index)`
/// namespace. The include index is resolved to a file while parsing, so the
/// pair below is enough to find the type again later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeRef
{
    /// File whose type list holds the definition.
    pub file: SourceFileId,
    /// Type number within that file.
    pub number: i32,
}

impl TypeRef
{
    /// Create a key.
    #[must_use]
    pub const fn new(file: SourceFileId, number: i32) -> Self
    {
        Self { file, number }
    }
}

impl fmt::Display for TypeRef
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "({},{})", self.file.index(), self.number)
    }
}
