//! # Symbol Database
//!
//! The structure produced by STABS parsing and read by the debugger.
//!
//! Source files live in one arena owned by [`SymbolDatabase`]; everything else
//! (types, functions, globals, line entries) is owned by the source file that
//! declared it. Cross links are keys ([`SourceFileId`], [`FunctionId`],
//! [`TypeRef`]) so the graph can be cyclic without shared ownership.
//!
//! Every collection grows through [`try_push`], which turns an allocation
//! failure into [`StabError::Allocation`] instead of aborting the process.

mod enrich;
mod model;
mod query;

pub use enrich::NATIVE_FUNCTION_SPAN;
pub use model::{
    DataRange, DataSymbol, EnumerationMember, EnumerationType, Function, Location, NumericType, RelationType,
    SourceFile, SourceLine, StructureMember, StructureType, Type, TypeKind, STABS_POINTER_SIZE,
};
pub use query::{name_matches, SymbolMatch, MAX_RELATION_TYPE_DEPTH};

use crate::error::{StabError, StabResult};
use crate::types::{FunctionId, ImageFormat, MachineType, SourceFileId, TypeRef};

/// Position of a line entry, used to close it once the next line starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LineId
{
    pub(crate) source: SourceFileId,
    pub(crate) index: usize,
}

/// All debug symbols of one binary.
#[derive(Debug, Clone, Default)]
pub struct SymbolDatabase
{
    filename: String,
    machine: MachineType,
    format: ImageFormat,
    image_base: u64,
    sources: Vec<SourceFile>,
}

impl SymbolDatabase
{
    /// Create an empty database for `filename`.
    #[must_use]
    pub fn new(filename: impl Into<String>, machine: MachineType, format: ImageFormat, image_base: u64) -> Self
    {
        Self {
            filename: filename.into(),
            machine,
            format,
            image_base,
            sources: Vec::new(),
        }
    }

    /// Path of the binary the symbols came from.
    #[must_use]
    pub fn filename(&self) -> &str
    {
        &self.filename
    }

    /// Target machine.
    #[must_use]
    pub fn machine(&self) -> MachineType
    {
        self.machine
    }

    /// Container format.
    #[must_use]
    pub fn format(&self) -> ImageFormat
    {
        self.format
    }

    /// Preferred load address of the image.
    #[must_use]
    pub fn image_base(&self) -> u64
    {
        self.image_base
    }

    /// Number of source files (including headers).
    #[must_use]
    pub fn source_file_count(&self) -> usize
    {
        self.sources.len()
    }

    /// Source files, most recently opened first.
    pub fn source_files(&self) -> impl DoubleEndedIterator<Item = (SourceFileId, &SourceFile)> + '_
    {
        self.sources
            .iter()
            .enumerate()
            .rev()
            .map(|(index, file)| (SourceFileId::new(index), file))
    }

    /// Look up a source file by id.
    #[must_use]
    pub fn source_file(&self, id: SourceFileId) -> Option<&SourceFile>
    {
        self.sources.get(id.index())
    }

    /// Look up a function by id.
    #[must_use]
    pub fn function(&self, id: FunctionId) -> Option<&Function>
    {
        self.source_file(id.source())?.functions.get(id.index())
    }

    /// Resolve a type key to the latest definition of that number.
    #[must_use]
    pub fn get_type(&self, type_ref: TypeRef) -> Option<&Type>
    {
        self.source_file(type_ref.file)?.type_by_number(type_ref.number)
    }

    /// All functions with their ids.
    pub fn functions(&self) -> impl Iterator<Item = (FunctionId, &Function)> + '_
    {
        self.source_files().flat_map(|(source, file)| {
            file.functions
                .iter()
                .enumerate()
                .map(move |(index, function)| (FunctionId::new(source, index), function))
        })
    }

    pub(crate) fn source_mut(&mut self, id: SourceFileId) -> Option<&mut SourceFile>
    {
        self.sources.get_mut(id.index())
    }

    pub(crate) fn function_mut(&mut self, id: FunctionId) -> Option<&mut Function>
    {
        self.source_mut(id.source())?.functions.get_mut(id.index())
    }

    pub(crate) fn line_mut(&mut self, id: LineId) -> Option<&mut SourceLine>
    {
        self.source_mut(id.source)?.lines.get_mut(id.index)
    }

    /// Find a file by identifier and name, newest first.
    pub(crate) fn find_source(&self, identifier: u32, file_name: &str) -> Option<SourceFileId>
    {
        self.source_files()
            .find(|(_, file)| file.identifier == identifier && file.file_name == file_name)
            .map(|(id, _)| id)
    }

    pub(crate) fn add_source_file(&mut self, file: SourceFile) -> StabResult<SourceFileId>
    {
        try_push(&mut self.sources, file).map(SourceFileId::new)
    }

    /// Append a type to its owner and make it the definition of its number.
    pub(crate) fn add_type(&mut self, ty: Type) -> StabResult<TypeRef>
    {
        let type_ref = ty.type_ref();
        let file = self
            .source_mut(type_ref.file)
            .ok_or_else(|| StabError::bad(format!("type {type_ref} names an unknown file")))?;
        file.type_index.try_reserve(1).map_err(|_| StabError::Allocation)?;
        let index = try_push(&mut file.types, ty)?;
        file.type_index.insert(type_ref.number, index);
        Ok(type_ref)
    }

    pub(crate) fn add_function(&mut self, function: Function) -> StabResult<FunctionId>
    {
        let source = function.source;
        let file = self.source_mut(source).ok_or(StabError::MissingScope("source file"))?;
        try_push(&mut file.functions, function).map(|index| FunctionId::new(source, index))
    }

    pub(crate) fn add_global(&mut self, source: SourceFileId, symbol: DataSymbol) -> StabResult<()>
    {
        let file = self.source_mut(source).ok_or(StabError::MissingScope("source file"))?;
        try_push(&mut file.globals, symbol).map(drop)
    }

    pub(crate) fn add_parameter(&mut self, function: FunctionId, symbol: DataSymbol) -> StabResult<()>
    {
        let function = self.function_mut(function).ok_or(StabError::MissingScope("function"))?;
        try_push(&mut function.parameters, symbol).map(drop)
    }

    pub(crate) fn add_local(&mut self, function: FunctionId, symbol: DataSymbol) -> StabResult<()>
    {
        let function = self.function_mut(function).ok_or(StabError::MissingScope("function"))?;
        try_push(&mut function.locals, symbol).map(drop)
    }

    pub(crate) fn add_line(&mut self, line: SourceLine) -> StabResult<LineId>
    {
        let source = line.source;
        let file = self.source_mut(source).ok_or(StabError::MissingScope("line file"))?;
        try_push(&mut file.lines, line).map(|index| LineId { source, index })
    }
}

/// Push onto `vec`, reporting allocation failure instead of aborting.
pub(crate) fn try_push<T>(vec: &mut Vec<T>, value: T) -> StabResult<usize>
{
    vec.try_reserve(1).map_err(|_| StabError::Allocation)?;
    vec.push(value);
    Ok(vec.len() - 1)
}
