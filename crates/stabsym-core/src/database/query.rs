//! Read-only queries over a populated database.
//!
//! The type graph may contain cycles (a pointer to the struct being defined)
//! and chains of typedefs produced by cross reference resolution, so every
//! walk over relations is bounded by [`MAX_RELATION_TYPE_DEPTH`].

use std::fmt::Write as _;

use tracing::debug;

use super::model::{DataSymbol, Function, SourceLine, Type, TypeKind, STABS_POINTER_SIZE};
use super::SymbolDatabase;
use crate::types::FunctionId;

/// Maximum number of relation hops followed by the type walkers.
pub const MAX_RELATION_TYPE_DEPTH: usize = 50;

/// Result of an address lookup.
#[derive(Debug, Clone, Copy)]
pub enum SymbolMatch<'a>
{
    /// A global or static variable covering the address
    Data(&'a DataSymbol),
    /// The function whose range contains the address
    Function(FunctionId, &'a Function),
}

impl SymbolDatabase
{
    /// Size of a type in bytes; zero for void, unknown or cyclic types.
    #[must_use]
    pub fn type_size(&self, ty: &Type) -> u64
    {
        self.type_size_at_depth(ty, 0)
    }

    fn type_size_at_depth(&self, ty: &Type, depth: usize) -> u64
    {
        match &ty.kind {
            TypeKind::Numeric(numeric) => u64::from(numeric.bit_size).div_ceil(8),
            TypeKind::Structure(structure) => u64::from(structure.size_in_bytes),
            TypeKind::Enumeration(enumeration) => u64::from(enumeration.size_in_bytes),
            TypeKind::Relation(relation) => {
                let Some(target) = self.get_type(relation.target) else {
                    debug!("Type {} refers to undefined type {}", ty.type_ref(), relation.target);
                    return 0;
                };

                if depth >= MAX_RELATION_TYPE_DEPTH {
                    debug!("Type {} nests deeper than {MAX_RELATION_TYPE_DEPTH} relations", ty.type_ref());
                    return 0;
                }

                let count = relation.array.map_or(1, |range| range.element_count());
                if relation.pointer {
                    return count.wrapping_mul(STABS_POINTER_SIZE);
                }

                if target.type_ref() == ty.type_ref() {
                    return 0;
                }

                count.wrapping_mul(self.type_size_at_depth(target, depth + 1))
            }
        }
    }

    /// Printable type name with array and pointer decorations.
    ///
    /// Named types print their name. Anonymous relations print their target
    /// followed by `[n]` (or `[min:max+1]`) and `*`.
    #[must_use]
    pub fn type_name(&self, ty: &Type) -> String
    {
        let mut out = String::new();
        self.write_type_name(&mut out, ty, 0);
        out
    }

    fn write_type_name(&self, out: &mut String, ty: &Type, depth: usize)
    {
        let name = ty.name.as_deref().filter(|name| !name.is_empty());
        match &ty.kind {
            TypeKind::Structure(_) => match name {
                Some(name) => {
                    let _ = write!(out, "struct {name}");
                }
                None => out.push_str("struct (anon)"),
            },
            TypeKind::Enumeration(_) => out.push_str(name.filter(|n| *n != " ").unwrap_or("(unnamed enum)")),
            TypeKind::Numeric(_) => out.push_str(name.filter(|n| *n != " ").unwrap_or("(unnamed numeric)")),
            TypeKind::Relation(relation) => {
                if let Some(name) = name {
                    out.push_str(name);
                    return;
                }

                match self.get_type(relation.target) {
                    Some(target) if target.type_ref() == ty.type_ref() => out.push_str("void"),
                    Some(_) if depth >= MAX_RELATION_TYPE_DEPTH => out.push_str("..."),
                    Some(target) => self.write_type_name(out, target, depth + 1),
                    None => {
                        let _ = write!(out, "(undefined type {})", relation.target);
                    }
                }

                if let Some(range) = relation.array.filter(|range| range.is_array()) {
                    if range.minimum == 0 {
                        let _ = write!(out, "[{}]", range.maximum.wrapping_add(1));
                    } else {
                        let _ = write!(out, "[{}:{}]", range.minimum, range.maximum.wrapping_add(1));
                    }
                }

                if relation.pointer {
                    out.push('*');
                }
            }
        }
    }

    /// Follow typedef relations down to the underlying type.
    ///
    /// Pointers and arrays stop the walk. Returns `None` when the chain ends in
    /// an undefined type, refers to itself (void), or exceeds
    /// [`MAX_RELATION_TYPE_DEPTH`] hops.
    #[must_use]
    pub fn skip_typedefs<'a>(&'a self, ty: &'a Type) -> Option<&'a Type>
    {
        let mut current = ty;
        for _ in 0..MAX_RELATION_TYPE_DEPTH {
            let TypeKind::Relation(relation) = &current.kind else {
                return Some(current);
            };

            if !relation.is_typedef() {
                return Some(current);
            }

            let next = self.get_type(relation.target)?;
            if next.type_ref() == current.type_ref() {
                return None;
            }

            current = next;
        }

        match current.kind {
            TypeKind::Relation(relation) if relation.is_typedef() => None,
            _ => Some(current),
        }
    }

    /// Line table entry whose range contains `address`.
    #[must_use]
    pub fn lookup_source_line(&self, address: u64) -> Option<&SourceLine>
    {
        self.source_files()
            .flat_map(|(_, file)| file.lines.iter())
            .find(|line| line.contains(address))
    }

    /// Function whose range contains `address`.
    #[must_use]
    pub fn function_at(&self, address: u64) -> Option<(FunctionId, &Function)>
    {
        self.functions().find(|(_, function)| function.contains(address))
    }

    /// Global or static variable occupying `address`.
    ///
    /// A variable covers `[address, address + size)`, where a zero-sized type
    /// still covers its own address.
    #[must_use]
    pub fn data_symbol_at(&self, address: u64) -> Option<&DataSymbol>
    {
        self.source_files().flat_map(|(_, file)| file.globals.iter()).find(|symbol| {
            let Some(start) = symbol.absolute_address() else {
                return false;
            };
            let size = self.get_type(symbol.type_ref).map_or(1, |ty| self.type_size(ty).max(1));
            address >= start && address - start < size
        })
    }

    /// Data symbol or function at `address`, data first.
    #[must_use]
    pub fn lookup_address(&self, address: u64) -> Option<SymbolMatch<'_>>
    {
        if let Some(symbol) = self.data_symbol_at(address) {
            return Some(SymbolMatch::Data(symbol));
        }

        self.function_at(address).map(|(id, function)| SymbolMatch::Function(id, function))
    }

    /// Functions whose name matches `pattern` (see [`name_matches`]).
    #[must_use]
    pub fn find_functions(&self, pattern: &str) -> Vec<(FunctionId, &Function)>
    {
        self.functions().filter(|(_, function)| name_matches(pattern, &function.name)).collect()
    }

    /// Globals and file-scope statics whose name matches `pattern`.
    #[must_use]
    pub fn find_globals(&self, pattern: &str) -> Vec<&DataSymbol>
    {
        self.source_files()
            .flat_map(|(_, file)| file.globals.iter())
            .filter(|symbol| name_matches(pattern, &symbol.name))
            .collect()
    }

    /// Named types whose name matches `pattern`.
    #[must_use]
    pub fn find_types(&self, pattern: &str) -> Vec<&Type>
    {
        self.source_files()
            .flat_map(|(_, file)| file.types.iter())
            .filter(|ty| ty.name.as_deref().is_some_and(|name| name_matches(pattern, name)))
            .collect()
    }
}

impl Function
{
    /// The local called `name` that is live at `pc`.
    ///
    /// Locals reusing a name in disjoint blocks differ by minimum valid
    /// address; the innermost one already live at `pc` wins.
    #[must_use]
    pub fn local_at(&self, name: &str, pc: u64) -> Option<&DataSymbol>
    {
        self.locals
            .iter()
            .filter(|local| local.name == name && local.minimum_valid_address <= pc)
            .max_by_key(|local| local.minimum_valid_address)
    }

    /// Parameter called `name`.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&DataSymbol>
    {
        self.parameters.iter().find(|parameter| parameter.name == name)
    }
}

/// Case-insensitive match where `*` in `pattern` stands for any run of characters.
///
/// ```rust
/// use stabsym_core::database::name_matches;
///
/// assert!(name_matches("dbg*", "DbgGetType"));
/// assert!(name_matches("*type*", "DbgGetTypeSize"));
/// assert!(!name_matches("dbg", "DbgGetType"));
/// ```
#[must_use]
pub fn name_matches(pattern: &str, candidate: &str) -> bool
{
    let pattern: Vec<char> = pattern.chars().flat_map(char::to_lowercase).collect();
    let candidate: Vec<char> = candidate.chars().flat_map(char::to_lowercase).collect();

    let (mut p, mut c) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;
    while c < candidate.len() {
        if p < pattern.len() && pattern[p] == '*' {
            backtrack = Some((p, c));
            p += 1;
        } else if p < pattern.len() && pattern[p] == candidate[c] {
            p += 1;
            c += 1;
        } else if let Some((star, matched)) = backtrack {
            p = star + 1;
            c = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&ch| ch == '*')
}
