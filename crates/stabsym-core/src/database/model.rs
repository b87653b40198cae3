//! Symbol records stored in the database.

use std::collections::HashMap;
use std::sync::Arc;

use crate::types::{FunctionId, SourceFileId, TypeRef};

/// Size in bytes of every STABS pointer type.
pub const STABS_POINTER_SIZE: u64 = 4;

/// One source file or header, with everything defined in it.
#[derive(Debug, Clone)]
pub struct SourceFile
{
    pub(crate) directory: Option<Arc<str>>,
    pub(crate) file_name: String,
    pub(crate) start_address: u64,
    pub(crate) end_address: u64,
    pub(crate) identifier: u32,
    pub(crate) types: Vec<Type>,
    pub(crate) type_index: HashMap<i32, usize>,
    pub(crate) functions: Vec<Function>,
    pub(crate) globals: Vec<DataSymbol>,
    pub(crate) lines: Vec<SourceLine>,
}

impl SourceFile
{
    pub(crate) fn new(directory: Option<Arc<str>>, file_name: String, start_address: u64, identifier: u32) -> Self
    {
        Self {
            directory,
            file_name,
            start_address,
            end_address: 0,
            identifier,
            types: Vec::new(),
            type_index: HashMap::new(),
            functions: Vec::new(),
            globals: Vec::new(),
            lines: Vec::new(),
        }
    }

    /// Compilation directory, when the file name was relative.
    #[must_use]
    pub fn directory(&self) -> Option<&str>
    {
        self.directory.as_deref()
    }

    /// File name as it appeared in the stab.
    #[must_use]
    pub fn file_name(&self) -> &str
    {
        &self.file_name
    }

    /// First address covered by the file.
    #[must_use]
    pub fn start_address(&self) -> u64
    {
        self.start_address
    }

    /// One past the last address covered by the file.
    #[must_use]
    pub fn end_address(&self) -> u64
    {
        self.end_address
    }

    /// Raw stab value that identifies repeated includes of this file.
    #[must_use]
    pub fn identifier(&self) -> u32
    {
        self.identifier
    }

    /// Whether `address` lies in `[start, end)`.
    #[must_use]
    pub fn contains(&self, address: u64) -> bool
    {
        address >= self.start_address && address < self.end_address
    }

    /// Types in definition order.
    #[must_use]
    pub fn types(&self) -> &[Type]
    {
        &self.types
    }

    /// Latest type defined under `number`.
    #[must_use]
    pub fn type_by_number(&self, number: i32) -> Option<&Type>
    {
        self.type_index.get(&number).and_then(|&index| self.types.get(index))
    }

    /// Functions in definition order.
    #[must_use]
    pub fn functions(&self) -> &[Function]
    {
        &self.functions
    }

    /// File-scope variables.
    #[must_use]
    pub fn globals(&self) -> &[DataSymbol]
    {
        &self.globals
    }

    /// Line table entries in emission order.
    #[must_use]
    pub fn lines(&self) -> &[SourceLine]
    {
        &self.lines
    }

    /// `directory` joined with `file_name`.
    #[must_use]
    pub fn full_path(&self) -> String
    {
        match &self.directory {
            Some(directory) => format!("{directory}{}", self.file_name),
            None => self.file_name.clone(),
        }
    }
}

/// A function and its variables.
#[derive(Debug, Clone)]
pub struct Function
{
    pub(crate) name: String,
    pub(crate) sequence: u16,
    pub(crate) start_address: u64,
    pub(crate) end_address: u64,
    pub(crate) parameters: Vec<DataSymbol>,
    pub(crate) locals: Vec<DataSymbol>,
    pub(crate) return_type: Option<TypeRef>,
    pub(crate) source: SourceFileId,
}

impl Function
{
    pub(crate) fn new(name: String, start_address: u64, return_type: Option<TypeRef>, source: SourceFileId) -> Self
    {
        Self {
            name,
            sequence: 0,
            start_address,
            end_address: 0,
            parameters: Vec::new(),
            locals: Vec::new(),
            return_type,
            source,
        }
    }

    /// Function name.
    #[must_use]
    pub fn name(&self) -> &str
    {
        &self.name
    }

    /// Sequence number from the stab description field.
    #[must_use]
    pub fn sequence(&self) -> u16
    {
        self.sequence
    }

    /// Entry address.
    #[must_use]
    pub fn start_address(&self) -> u64
    {
        self.start_address
    }

    /// One past the last address, or zero while the function is still open.
    #[must_use]
    pub fn end_address(&self) -> u64
    {
        self.end_address
    }

    /// Whether `address` lies in `[start, end)`.
    #[must_use]
    pub fn contains(&self, address: u64) -> bool
    {
        address >= self.start_address && address < self.end_address
    }

    /// Parameters in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[DataSymbol]
    {
        &self.parameters
    }

    /// Locals, including function-scope statics.
    #[must_use]
    pub fn locals(&self) -> &[DataSymbol]
    {
        &self.locals
    }

    /// Return type; `None` for functions only known from a native symbol table.
    #[must_use]
    pub fn return_type(&self) -> Option<TypeRef>
    {
        self.return_type
    }

    /// Owning source file.
    #[must_use]
    pub fn source(&self) -> SourceFileId
    {
        self.source
    }
}

/// Where a variable lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location
{
    /// Held in a register
    Register(u32),
    /// At a signed byte offset from a register
    Indirect
    {
        /// Base register
        register: u32,
        /// Byte offset from the base register
        offset: i32,
    },
    /// At a fixed address
    Absolute(u64),
}

/// A parameter, local, static or global variable.
#[derive(Debug, Clone)]
pub struct DataSymbol
{
    pub(crate) name: String,
    pub(crate) location: Location,
    pub(crate) type_ref: TypeRef,
    pub(crate) source: SourceFileId,
    pub(crate) function: Option<FunctionId>,
    pub(crate) minimum_valid_address: u64,
}

impl DataSymbol
{
    /// Variable name.
    #[must_use]
    pub fn name(&self) -> &str
    {
        &self.name
    }

    /// Storage location.
    #[must_use]
    pub fn location(&self) -> Location
    {
        self.location
    }

    /// Declared type.
    #[must_use]
    pub fn type_ref(&self) -> TypeRef
    {
        self.type_ref
    }

    /// File the symbol was declared in.
    #[must_use]
    pub fn source(&self) -> SourceFileId
    {
        self.source
    }

    /// Enclosing function for parameters and locals.
    #[must_use]
    pub fn function(&self) -> Option<FunctionId>
    {
        self.function
    }

    /// Earliest PC at which the variable is live.
    #[must_use]
    pub fn minimum_valid_address(&self) -> u64
    {
        self.minimum_valid_address
    }

    /// Absolute address for statics and globals.
    #[must_use]
    pub fn absolute_address(&self) -> Option<u64>
    {
        match self.location {
            Location::Absolute(address) => Some(address),
            _ => None,
        }
    }
}

/// One line table entry covering `[start_address, end_address)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLine
{
    /// File the line belongs to (may be a header).
    pub source: SourceFileId,
    /// 1-based line number.
    pub line: u32,
    /// First address of the line.
    pub start_address: u64,
    /// One past the last address, or zero while the line is still open.
    pub end_address: u64,
}

impl SourceLine
{
    /// Whether `address` lies in `[start, end)`.
    #[must_use]
    pub fn contains(&self, address: u64) -> bool
    {
        address >= self.start_address && address < self.end_address
    }
}

/// A type definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Type
{
    pub(crate) name: Option<String>,
    pub(crate) number: i32,
    pub(crate) owner: SourceFileId,
    pub(crate) kind: TypeKind,
}

impl Type
{
    /// Typedef, tag or base type name.
    #[must_use]
    pub fn name(&self) -> Option<&str>
    {
        self.name.as_deref()
    }

    /// Type number within the owner's namespace.
    #[must_use]
    pub fn number(&self) -> i32
    {
        self.number
    }

    /// File whose namespace defines this type.
    #[must_use]
    pub fn owner(&self) -> SourceFileId
    {
        self.owner
    }

    /// Variant payload.
    #[must_use]
    pub fn kind(&self) -> &TypeKind
    {
        &self.kind
    }

    /// Key that refers back to this type.
    #[must_use]
    pub fn type_ref(&self) -> TypeRef
    {
        TypeRef::new(self.owner, self.number)
    }
}

/// Variant payload of a [`Type`].
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind
{
    /// Integer, boolean or floating point base type
    Numeric(NumericType),
    /// Typedef, pointer, array or function built on another type
    Relation(RelationType),
    /// `struct` or `union`
    Structure(StructureType),
    /// `enum`
    Enumeration(EnumerationType),
}

/// Base type layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericType
{
    /// Width in bits
    pub bit_size: u32,
    /// Two's complement signed
    pub signed: bool,
    /// IEEE floating point
    pub float: bool,
}

/// Inclusive bounds of a subrange or array index.
///
/// `max_ulonglong` marks the unsigned 64-bit maximum, which does not fit in
/// `maximum`; `maximum` is zero in that case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DataRange
{
    /// Lower bound
    pub minimum: i64,
    /// Upper bound
    pub maximum: i64,
    /// Upper bound is `u64::MAX`
    pub max_ulonglong: bool,
}

impl DataRange
{
    /// Create a range without the unsigned 64-bit marker.
    #[must_use]
    pub const fn new(minimum: i64, maximum: i64) -> Self
    {
        Self {
            minimum,
            maximum,
            max_ulonglong: false,
        }
    }

    /// Whether the bounds describe a non-empty array.
    #[must_use]
    pub const fn is_array(&self) -> bool
    {
        self.minimum != self.maximum
    }

    /// Element count `max + 1 - min` for arrays, one otherwise.
    #[must_use]
    pub const fn element_count(&self) -> u64
    {
        if self.is_array() {
            self.maximum.wrapping_add(1).wrapping_sub(self.minimum) as u64
        } else {
            1
        }
    }
}

/// Something built on top of another type.
///
/// A single relation may combine pointer, array and function flags, as in
/// `*ar1;0;3;f2` (pointer to array of functions).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationType
{
    /// Pointer (or reference) to the target
    pub pointer: bool,
    /// Array bounds; `None` when no array descriptor was present
    pub array: Option<DataRange>,
    /// Function returning the target
    pub function: bool,
    /// Referenced type
    pub target: TypeRef,
}

impl RelationType
{
    /// Whether the relation is an array with a non-empty range.
    #[must_use]
    pub fn is_array(&self) -> bool
    {
        self.array.is_some_and(|range| range.is_array())
    }

    /// A plain typedef: no pointer and no array.
    #[must_use]
    pub fn is_typedef(&self) -> bool
    {
        !self.pointer && !self.is_array()
    }
}

/// Field of a structure or union.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureMember
{
    /// Field name
    pub name: String,
    /// Field type
    pub type_ref: TypeRef,
    /// Offset from the start of the aggregate, in bits
    pub bit_offset: u32,
    /// Width in bits
    pub bit_size: u32,
}

/// `struct`/`union` layout.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructureType
{
    /// Total size in bytes
    pub size_in_bytes: u32,
    /// Fields in declaration order
    pub members: Vec<StructureMember>,
}

impl StructureType
{
    /// Number of parsed members.
    #[must_use]
    pub fn member_count(&self) -> usize
    {
        self.members.len()
    }
}

/// Named enumeration constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerationMember
{
    /// Constant name
    pub name: String,
    /// Constant value
    pub value: i64,
}

/// `enum` layout.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnumerationType
{
    /// Always 4 for STABS enums
    pub size_in_bytes: u32,
    /// Constants in declaration order
    pub members: Vec<EnumerationMember>,
}

impl EnumerationType
{
    /// Number of parsed members.
    #[must_use]
    pub fn member_count(&self) -> usize
    {
        self.members.len()
    }

    /// Constant name for `value`, if any.
    #[must_use]
    pub fn name_of(&self, value: i64) -> Option<&str>
    {
        self.members.iter().find(|member| member.value == value).map(|member| member.name.as_str())
    }
}
