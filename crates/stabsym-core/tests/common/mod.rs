//! Helpers for building synthetic `.stab`/`.stabstr` sections.

#![allow(dead_code)]

use stabsym_core::loader::StabSections;
use stabsym_core::stabs::{RawStab, StabKind, StabStats};
use stabsym_core::{MachineType, SymbolDatabase};
use stabsym_utils::{LogFormat, LogLevel};

/// Route parser events to the test output. Later calls are no-ops.
pub fn init_test_logging()
{
    let _ = stabsym_utils::init_logging_with_level(LogLevel::Debug, LogFormat::Pretty);
}

/// Appends records and their strings in emission order.
#[derive(Debug, Clone)]
pub struct StabStreamBuilder
{
    stabs: Vec<u8>,
    strings: Vec<u8>,
    big_endian: bool,
}

impl Default for StabStreamBuilder
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl StabStreamBuilder
{
    pub fn new() -> Self
    {
        Self {
            stabs: Vec::new(),
            // Offset zero means "no string".
            strings: vec![0],
            big_endian: false,
        }
    }

    pub fn big_endian(mut self) -> Self
    {
        self.big_endian = true;
        self
    }

    /// Append a record of any raw kind byte.
    pub fn raw(mut self, kind: u8, string: Option<&str>, description: u16, value: u32) -> Self
    {
        let string_index = match string {
            Some(text) => {
                let index = u32::try_from(self.strings.len()).unwrap();
                self.strings.extend_from_slice(text.as_bytes());
                self.strings.push(0);
                index
            }
            None => 0,
        };

        let stab = RawStab {
            string_index,
            kind,
            other: 0,
            description,
            value,
        };
        self.stabs.extend_from_slice(&stab.to_bytes(self.big_endian));
        self
    }

    pub fn stab(self, kind: StabKind, string: Option<&str>, description: u16, value: u32) -> Self
    {
        self.raw(kind.raw(), string, description, value)
    }

    pub fn source_file(self, name: &str, address: u32) -> Self
    {
        self.stab(StabKind::SourceFile, Some(name), 0, address)
    }

    /// Empty `N_SO`, closing the current file at `address`.
    pub fn end_source_file(self, address: u32) -> Self
    {
        self.stab(StabKind::SourceFile, None, 0, address)
    }

    pub fn include_begin(self, name: &str, identifier: u32) -> Self
    {
        self.stab(StabKind::IncludeBegin, Some(name), 0, identifier)
    }

    pub fn include_end(self) -> Self
    {
        self.stab(StabKind::IncludeEnd, None, 0, 0)
    }

    pub fn include_name(self, name: &str, address: u32) -> Self
    {
        self.stab(StabKind::IncludeName, Some(name), 0, address)
    }

    pub fn function(self, string: &str, address: u32) -> Self
    {
        self.stab(StabKind::Function, Some(string), 0, address)
    }

    /// Empty `N_FUN`; `offset` is relative to the function start.
    pub fn end_function(self, offset: u32) -> Self
    {
        self.stab(StabKind::Function, None, 0, offset)
    }

    pub fn line(self, line: u16, offset: u32) -> Self
    {
        self.stab(StabKind::SourceLine, None, line, offset)
    }

    pub fn local(self, string: &str, value: i32) -> Self
    {
        self.stab(StabKind::LocalSymbol, Some(string), 0, value as u32)
    }

    pub fn parameter(self, string: &str, value: i32) -> Self
    {
        self.stab(StabKind::FunctionParameter, Some(string), 0, value as u32)
    }

    pub fn register(self, string: &str, register: u32) -> Self
    {
        self.stab(StabKind::RegisterVariable, Some(string), 0, register)
    }

    pub fn global(self, string: &str, address: u32) -> Self
    {
        self.stab(StabKind::GlobalSymbol, Some(string), 0, address)
    }

    pub fn static_symbol(self, string: &str, address: u32) -> Self
    {
        self.stab(StabKind::Static, Some(string), 0, address)
    }

    pub fn left_brace(self, offset: u32) -> Self
    {
        self.stab(StabKind::LeftBrace, None, 0, offset)
    }

    pub fn right_brace(self, offset: u32) -> Self
    {
        self.stab(StabKind::RightBrace, None, 0, offset)
    }

    pub fn sections(&self, machine: MachineType) -> StabSections
    {
        StabSections {
            stabs: self.stabs.clone(),
            strings: self.strings.clone(),
            machine,
            big_endian: self.big_endian,
            ..StabSections::default()
        }
    }

    /// Parse the stream as an x86 image.
    pub fn parse(&self) -> (SymbolDatabase, StabStats)
    {
        self.parse_for(MachineType::X86)
    }

    pub fn parse_for(&self, machine: MachineType) -> (SymbolDatabase, StabStats)
    {
        init_test_logging();
        SymbolDatabase::from_stabs("test.elf", &self.sections(machine)).unwrap()
    }
}
