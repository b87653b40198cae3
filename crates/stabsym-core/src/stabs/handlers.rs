//! One handler per record kind.
//!
//! Handlers receive the record, the name split off its string (if any) and
//! the text after the name's colon. A handler failure only drops the symbol
//! that record described.

use std::sync::Arc;

use tracing::{debug, trace};

use super::cursor::StabCursor;
use super::parser::StabParser;
use super::record::{RawStab, StabKind};
use super::lossy;
use super::scope::IncludeStackElement;
use crate::database::{DataSymbol, Function, Location, SourceFile, SourceLine};
use crate::error::{StabError, StabResult};
use crate::types::machine::stab_register_to_general;
use crate::types::{FunctionId, TypeRef};

/// Descriptor byte at the cursor, or the matching error at end of string.
fn descriptor(cursor: &StabCursor<'_>) -> StabResult<u8>
{
    cursor.peek().ok_or(StabError::Truncated)
}

fn unknown(byte: u8) -> StabError
{
    StabError::UnknownDescriptor(char::from(byte))
}

impl StabParser<'_>
{
    /// `N_FUN`: open a function, or close the current one when nothing
    /// follows the name.
    pub(crate) fn handle_function(&mut self, stab: &RawStab, name: Option<&[u8]>, rest: Option<&[u8]>) -> StabResult<()>
    {
        let rest = rest.unwrap_or_default();
        if rest.is_empty() {
            let end = self.scope.function_relative(stab.value);
            self.close_current_line(end);
            if let Some(id) = self.scope.close_function() {
                if let Some(function) = self.db.function_mut(id) {
                    function.end_address = end;
                    trace!("Closed function {} at 0x{end:x}", function.name);
                }
            }
            self.scope.max_brace_address = 0;
            return Ok(());
        }

        let mut cursor = StabCursor::new(rest);
        match descriptor(&cursor)? {
            b'F' | b'f' => cursor.bump(),
            other => return Err(unknown(other)),
        }

        let source = self.scope.current_source.ok_or(StabError::MissingScope("source file"))?;
        let return_type = self.parse_type_reference(&mut cursor, None)?;
        let start = u64::from(stab.value);
        let mut function = Function::new(name.map(lossy).unwrap_or_default(), start, Some(return_type), source);
        function.sequence = stab.description;
        let id = self.db.add_function(function)?;
        self.scope.open_function(id, start);
        Ok(())
    }

    /// `N_PSYM`, and `N_RSYM` with a `P` descriptor.
    ///
    /// A parameter seen outside of any function still has its type parsed
    /// (it may define types) but is not stored.
    pub(crate) fn handle_parameter(
        &mut self,
        stab: &RawStab,
        name: Option<&[u8]>,
        rest: Option<&[u8]>,
    ) -> StabResult<()>
    {
        let mut cursor = StabCursor::new(rest.unwrap_or_default());
        let location = match descriptor(&cursor)? {
            b'P' => Location::Register(stab_register_to_general(stab.value)),
            b'p' => Location::Indirect {
                register: self.scope.frame_pointer_register(),
                offset: stab.signed_value(),
            },
            other => return Err(unknown(other)),
        };
        cursor.bump();

        let type_ref = self.parse_type_reference(&mut cursor, None)?;
        let Some(function) = self.scope.current_function else {
            trace!("Dropping parameter outside of a function");
            return Ok(());
        };

        let symbol = self.data_symbol(name, location, type_ref, function, self.scope.function_start);
        self.db.add_parameter(function, symbol)
    }

    /// `N_RSYM`: register local, or register parameter.
    pub(crate) fn handle_register_variable(
        &mut self,
        stab: &RawStab,
        name: Option<&[u8]>,
        rest: Option<&[u8]>,
    ) -> StabResult<()>
    {
        let function = self.scope.current_function.ok_or(StabError::MissingScope("function"))?;
        let mut cursor = StabCursor::new(rest.unwrap_or_default());
        match descriptor(&cursor)? {
            b'P' => return self.handle_parameter(stab, name, rest),
            b'r' => cursor.bump(),
            other => return Err(unknown(other)),
        }

        let type_ref = self.parse_type_reference(&mut cursor, None)?;
        let location = Location::Register(stab_register_to_general(stab.value));
        let symbol = self.data_symbol(name, location, type_ref, function, self.scope.max_brace_address);
        self.db.add_local(function, symbol)
    }

    /// `N_LSYM`: type definition (`t`/`T`) or frame-relative local.
    pub(crate) fn handle_local_symbol(
        &mut self,
        stab: &RawStab,
        name: Option<&[u8]>,
        rest: Option<&[u8]>,
    ) -> StabResult<()>
    {
        let rest = rest.filter(|rest| !rest.is_empty()).ok_or_else(|| StabError::bad("empty local symbol"))?;
        let mut cursor = StabCursor::new(rest);
        match descriptor(&cursor)? {
            b't' | b'T' => {
                cursor.bump();
                // "Tt" declares a tag and a typedef of the same name.
                cursor.eat(b't');
                self.parse_type_reference(&mut cursor, name)?;
                Ok(())
            }
            b'-' | b'(' | b'0'..=b'9' => {
                self.scope.current_source.ok_or(StabError::MissingScope("source file"))?;
                let function = self.scope.current_function.ok_or(StabError::MissingScope("function"))?;
                let type_ref = self.parse_type_reference(&mut cursor, None)?;
                let location = Location::Indirect {
                    register: self.scope.frame_pointer_register(),
                    offset: stab.signed_value(),
                };
                let symbol = self.data_symbol(name, location, type_ref, function, self.scope.max_brace_address);
                self.db.add_local(function, symbol)
            }
            other => {
                trace!("Ignoring local symbol descriptor '{}'", char::from(other));
                Ok(())
            }
        }
    }

    /// `N_GSYM`, `N_STSYM`, `N_LCSYM`: globals and statics at absolute addresses.
    pub(crate) fn handle_static(&mut self, stab: &RawStab, name: Option<&[u8]>, rest: Option<&[u8]>) -> StabResult<()>
    {
        let mut cursor = StabCursor::new(rest.unwrap_or_default());
        let scope = descriptor(&cursor)?;
        if !matches!(scope, b'S' | b'V' | b'G') {
            return Err(unknown(scope));
        }
        cursor.bump();

        let source = self.scope.current_source.ok_or(StabError::MissingScope("source file"))?;
        let type_ref = self.parse_type_reference(&mut cursor, None)?;
        let location = Location::Absolute(u64::from(stab.value));
        match (scope, self.scope.current_function) {
            (b'V', Some(function)) => {
                let symbol = self.data_symbol(name, location, type_ref, function, self.scope.function_start);
                self.db.add_local(function, symbol)
            }
            _ => {
                let symbol = DataSymbol {
                    name: name.map(lossy).unwrap_or_default(),
                    location,
                    type_ref,
                    source,
                    function: None,
                    minimum_valid_address: 0,
                };
                self.db.add_global(source, symbol)
            }
        }
    }

    /// `N_SLINE`: close the open line and start a new one.
    pub(crate) fn handle_source_line(&mut self, stab: &RawStab) -> StabResult<()>
    {
        let source = self.scope.current_line_file.ok_or(StabError::MissingScope("line file"))?;
        if stab.description == 0 {
            return Ok(());
        }

        let address = self.scope.function_relative(stab.value);
        self.close_current_line(address);
        let line = SourceLine {
            source,
            line: u32::from(stab.description),
            start_address: address,
            end_address: 0,
        };
        self.scope.current_line = Some(self.db.add_line(line)?);
        Ok(())
    }

    /// `N_LBRAC`/`N_RBRAC`: advance the block address used for local visibility.
    pub(crate) fn handle_brace(&mut self, stab: &RawStab) -> StabResult<()>
    {
        if self.scope.current_function.is_none() {
            return Err(StabError::MissingScope("function"));
        }

        let address = self.scope.function_start.wrapping_add_signed(i64::from(stab.signed_value()));
        if address > self.scope.max_brace_address {
            self.scope.max_brace_address = address;
        }
        Ok(())
    }

    /// `N_SO`, `N_BINCL`, `N_SOL` and `N_EXCL`, plus the final synthetic close
    /// (`source` is `None`).
    ///
    /// A non-include record first closes whatever is open: the line, the
    /// function and (unless it is `N_SOL`) the source file, whose pending
    /// cross references are resolved then.
    pub(crate) fn handle_source_file(
        &mut self,
        source: Option<(StabKind, &RawStab)>,
        string: Option<&[u8]>,
        include: bool,
    ) -> StabResult<()>
    {
        let kind = source.map(|(kind, _)| kind);
        let value = source.map_or(0, |(_, stab)| stab.value);
        let end_address = u64::from(value);
        let is_include_name = kind == Some(StabKind::IncludeName);
        let existing = string.and_then(|name| self.db.find_source(value, &lossy(name)));

        if !include {
            for id in [self.scope.current_line_file, self.scope.current_source].into_iter().flatten() {
                if let Some(file) = self.db.source_mut(id) {
                    file.end_address = file.end_address.max(end_address);
                }
            }

            if !is_include_name {
                if let Some(closing) = self.scope.current_source {
                    self.resolve_cross_references()?;
                    self.scope.current_source = None;
                    self.scope.current_line_file = None;
                    debug!("Closed source file {closing} at 0x{end_address:x}");
                }

                if let Some(id) = self.scope.close_function() {
                    if let Some(function) = self.db.function_mut(id) {
                        function.end_address = end_address;
                    }
                }

                self.scope.reset_file_namespace();
            }

            self.close_current_line(end_address);
        }

        let Some(string) = string.filter(|string| !string.is_empty()) else {
            if is_include_name {
                return Err(StabError::bad("include name record without a file name"));
            }
            return Ok(());
        };

        if string.ends_with(b"/") {
            let directory: Arc<str> = Arc::from(lossy(string));
            debug!("Current directory is now {directory}");
            self.scope.current_directory = Some(directory);
            return Ok(());
        }

        let id = match existing {
            Some(id) => id,
            None => {
                let path_fully_specified = string.first() == Some(&b'/') || string.contains(&b':');
                let directory = if path_fully_specified {
                    None
                } else {
                    self.scope.current_directory.clone()
                };
                let start = if include { 0 } else { end_address };
                let file = SourceFile::new(directory, lossy(string), start, value);
                let id = self.db.add_source_file(file)?;
                debug!("Opened source file {id}: {}", lossy(string));
                id
            }
        };

        if include {
            self.scope.max_include_index += 1;
            self.scope.include_stack.try_reserve(1).map_err(|_| StabError::Allocation)?;
            self.scope.include_stack.push(IncludeStackElement {
                index: self.scope.max_include_index,
                file: id,
            });
            trace!("Include {} is {id}", self.scope.max_include_index);
        }

        if is_include_name {
            let enclosing_start = self
                .scope
                .current_source
                .and_then(|current| self.db.source_file(current))
                .map_or(0, SourceFile::start_address);
            if let Some(file) = self.db.source_mut(id) {
                if file.start_address == 0 {
                    file.start_address = enclosing_start;
                }
            }
            self.scope.current_line_file = Some(id);
        } else if !include {
            self.scope.current_source = Some(id);
            self.scope.current_line_file = Some(id);
            self.scope.max_brace_address = self.db.source_file(id).map_or(0, SourceFile::start_address);
        }

        Ok(())
    }

    /// Stamp the end of the open line entry.
    pub(crate) fn close_current_line(&mut self, end: u64)
    {
        if let Some(id) = self.scope.current_line.take() {
            if let Some(line) = self.db.line_mut(id) {
                line.end_address = end.max(line.start_address);
            }
        }
    }

    fn data_symbol(
        &self,
        name: Option<&[u8]>,
        location: Location,
        type_ref: TypeRef,
        function: FunctionId,
        minimum_valid_address: u64,
    ) -> DataSymbol
    {
        DataSymbol {
            name: name.map(lossy).unwrap_or_default(),
            location,
            type_ref,
            source: self.scope.current_source.unwrap_or(function.source()),
            function: Some(function),
            minimum_valid_address,
        }
    }
}
