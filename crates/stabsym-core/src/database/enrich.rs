//! Upserts from native (COFF/ELF) symbol tables.
//!
//! The native tables know about functions compiled without debug information
//! and about the final address of globals the STABS emitted as zero. They
//! never remove or rename anything STABS produced.

use tracing::{debug, trace};

use super::model::{Function, Location};
use super::SymbolDatabase;

/// Address span given to functions that only appear in a native symbol table.
pub const NATIVE_FUNCTION_SPAN: u64 = 0x20;

impl SymbolDatabase
{
    /// Merge one native symbol into the database.
    ///
    /// Functions are added when no function of that name exists and some
    /// source file's range contains `value`; the new function covers
    /// `[value, value + 0x20)`. Data symbols backfill globals of the same name
    /// whose absolute address is still zero.
    ///
    /// Returns `true` when the database changed.
    pub fn create_or_update_symbol(&mut self, name: &str, value: u64, is_function: bool) -> bool
    {
        if name.is_empty() {
            return false;
        }

        if is_function {
            self.upsert_function(name, value)
        } else {
            self.backfill_global(name, value)
        }
    }

    fn upsert_function(&mut self, name: &str, value: u64) -> bool
    {
        if self.functions().any(|(_, function)| function.name == name) {
            return false;
        }

        let Some(source) = self.source_files().find(|(_, file)| file.contains(value)).map(|(id, _)| id) else {
            trace!("No source file covers native function {name} at 0x{value:x}");
            return false;
        };

        let mut function = Function::new(name.to_string(), value, None, source);
        function.end_address = value.saturating_add(NATIVE_FUNCTION_SPAN);
        match self.add_function(function) {
            Ok(_) => {
                debug!("Added native function {name} at 0x{value:x}");
                true
            }
            Err(err) => {
                debug!("Could not add native function {name}: {err}");
                false
            }
        }
    }

    fn backfill_global(&mut self, name: &str, value: u64) -> bool
    {
        for file in &mut self.sources {
            let unset = file
                .globals
                .iter_mut()
                .find(|global| global.name == name && global.location == Location::Absolute(0));

            if let Some(global) = unset {
                global.location = Location::Absolute(value);
                debug!("Backfilled {name} to 0x{value:x}");
                return true;
            }
        }

        false
    }
}
