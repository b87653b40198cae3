//! Parse state threaded through every record handler.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::database::LineId;
use crate::types::{FunctionId, MachineType, SourceFileId};

/// Maps an include index (as used in `(index,number)` type references) to the
/// file it denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IncludeStackElement
{
    pub(crate) index: u32,
    pub(crate) file: SourceFileId,
}

/// A forward reference to a tagged aggregate that is resolved when the
/// enclosing source file closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CrossReferenceEntry
{
    /// Name given to the referring type, if any
    pub(crate) name: Option<String>,
    /// Type number the resolution is recorded under
    pub(crate) number: i32,
    /// File whose namespace owns `number` and is searched for the tag
    pub(crate) owner: SourceFileId,
    /// Reference text after the `x`: kind letter then tag name
    pub(crate) reference: Vec<u8>,
}

/// Everything the record loop remembers between records.
#[derive(Debug)]
pub(crate) struct ScopeTracker
{
    pub(crate) machine: MachineType,
    pub(crate) current_source: Option<SourceFileId>,
    /// File that line records belong to; differs from `current_source`
    /// inside code pulled in from a header.
    pub(crate) current_line_file: Option<SourceFileId>,
    pub(crate) current_function: Option<FunctionId>,
    /// Start address of `current_function`, cached for address arithmetic.
    pub(crate) function_start: u64,
    pub(crate) current_line: Option<LineId>,
    pub(crate) current_directory: Option<Arc<str>>,
    pub(crate) include_stack: SmallVec<[IncludeStackElement; 8]>,
    pub(crate) max_include_index: u32,
    pub(crate) max_brace_address: u64,
    pub(crate) pending_references: Vec<CrossReferenceEntry>,
}

impl ScopeTracker
{
    pub(crate) fn new(machine: MachineType) -> Self
    {
        Self {
            machine,
            current_source: None,
            current_line_file: None,
            current_function: None,
            function_start: 0,
            current_line: None,
            current_directory: None,
            include_stack: SmallVec::new(),
            max_include_index: 0,
            max_brace_address: 0,
            pending_references: Vec::new(),
        }
    }

    /// File denoted by a type reference's include index.
    ///
    /// Index zero is the current top-level source file.
    pub(crate) fn include_file(&self, index: i64) -> Option<SourceFileId>
    {
        if index == 0 {
            return self.current_source;
        }

        let index = u32::try_from(index).ok().filter(|&i| i <= self.max_include_index)?;
        self.include_stack
            .iter()
            .rev()
            .find(|element| element.index == index)
            .map(|element| element.file)
    }

    pub(crate) fn open_function(&mut self, function: FunctionId, start: u64)
    {
        self.current_function = Some(function);
        self.function_start = start;
        self.max_brace_address = start;
    }

    pub(crate) fn close_function(&mut self) -> Option<FunctionId>
    {
        self.function_start = 0;
        self.current_function.take()
    }

    /// Offset relative to the current function start, if one is open.
    pub(crate) fn function_relative(&self, value: u32) -> u64
    {
        if self.current_function.is_some() {
            self.function_start.wrapping_add(u64::from(value))
        } else {
            u64::from(value)
        }
    }

    /// Frame pointer of the current function (ARM depends on Thumb mode).
    pub(crate) fn frame_pointer_register(&self) -> u32
    {
        self.machine.frame_pointer_register(self.function_start).unwrap_or_default()
    }

    /// Forget per-file include numbering once a top-level file closes.
    pub(crate) fn reset_file_namespace(&mut self)
    {
        self.include_stack.clear();
        self.max_include_index = 0;
        self.max_brace_address = 0;
    }

    /// Whether nothing transient is left after the final close.
    pub(crate) fn is_drained(&self) -> bool
    {
        self.pending_references.is_empty() && self.include_stack.is_empty()
    }
}
