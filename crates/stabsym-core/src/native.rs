//! Native (COFF/ELF) symbol table pass.

use object::{Object, ObjectSymbol, SymbolKind};
use tracing::trace;

use crate::database::SymbolDatabase;

/// Feed every defined text and data symbol of `file` to
/// [`SymbolDatabase::create_or_update_symbol`].
///
/// Returns how many symbols changed the database.
pub fn enrich_from_object(db: &mut SymbolDatabase, file: &object::File<'_>) -> usize
{
    let mut changed = 0;
    for symbol in file.symbols() {
        if symbol.is_undefined() {
            continue;
        }

        let is_function = match symbol.kind() {
            SymbolKind::Text => true,
            SymbolKind::Data => false,
            _ => continue,
        };

        let Ok(name) = symbol.name() else {
            trace!(index = symbol.index().0, "Skipping native symbol with an unreadable name");
            continue;
        };

        if !name.is_empty() && db.create_or_update_symbol(name, symbol.address(), is_function) {
            changed += 1;
        }
    }

    changed
}
