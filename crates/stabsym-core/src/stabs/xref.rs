//! Resolution of `x` cross references when a source file closes.

use std::mem;

use tracing::{trace, warn};

use super::parser::StabParser;
use super::record::split_stab_name;
use super::lossy;
use super::scope::CrossReferenceEntry;
use crate::database::{EnumerationType, RelationType, StructureType, Type, TypeKind};
use crate::error::{StabError, StabResult};
use crate::types::TypeRef;

/// Tag kind a cross reference asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReferenceKind
{
    Structure,
    Enumeration,
}

impl ReferenceKind
{
    fn from_letter(letter: u8) -> Option<Self>
    {
        match letter {
            b's' | b'u' => Some(Self::Structure),
            b'e' => Some(Self::Enumeration),
            _ => None,
        }
    }

    fn matches(self, kind: &TypeKind) -> bool
    {
        matches!(
            (self, kind),
            (Self::Structure, TypeKind::Structure(_)) | (Self::Enumeration, TypeKind::Enumeration(_))
        )
    }

    /// Empty definition used when the tag was never defined in the file.
    fn placeholder(self) -> TypeKind
    {
        match self {
            Self::Structure => TypeKind::Structure(StructureType::default()),
            Self::Enumeration => TypeKind::Enumeration(EnumerationType {
                size_in_bytes: 4,
                members: Vec::new(),
            }),
        }
    }
}

impl StabParser<'_>
{
    /// Drain the pending cross references, adding one new type per entry.
    ///
    /// A reference that names a struct, union or enum defined in the owning
    /// file becomes a typedef of it. Otherwise an empty aggregate of the
    /// requested kind is created under the referring number so lookups still
    /// succeed. Existing types are never modified.
    ///
    /// ## Errors
    ///
    /// Only [`StabError::Allocation`] is returned, after the queue is emptied.
    pub(crate) fn resolve_cross_references(&mut self) -> StabResult<()>
    {
        let pending = mem::take(&mut self.scope.pending_references);
        for entry in pending {
            match self.resolve_cross_reference(&entry) {
                Ok(()) => {}
                Err(StabError::Allocation) => return Err(StabError::Allocation),
                Err(err) => warn!(number = entry.number, "Failed to resolve cross reference: {err}"),
            }
        }

        Ok(())
    }

    fn resolve_cross_reference(&mut self, entry: &CrossReferenceEntry) -> StabResult<()>
    {
        let Some((&letter, tail)) = entry.reference.split_first() else {
            return Err(StabError::bad("empty cross reference"));
        };
        let kind = ReferenceKind::from_letter(letter).ok_or(StabError::UnknownDescriptor(char::from(letter)))?;
        let name = match split_stab_name(tail) {
            (Some(name), _) => lossy(name),
            (None, whole) => lossy(whole),
        };

        let target = self.db.source_file(entry.owner).and_then(|file| {
            file.types()
                .iter()
                .rev()
                .find(|ty| ty.name() == Some(name.as_str()) && kind.matches(ty.kind()))
                .map(Type::type_ref)
        });

        let ty = match target {
            Some(target) => {
                trace!("Cross reference {name} resolved to {target}");
                self.stats.resolved_references += 1;
                // Keeps the referring typedef's name rather than leaving the
                // relation anonymous, so `type_name` prints it instead of the tag.
                Type {
                    name: entry.name.clone(),
                    number: entry.number,
                    owner: entry.owner,
                    kind: TypeKind::Relation(typedef_of(target)),
                }
            }
            None => {
                trace!("Cross reference {name} has no definition, adding a placeholder");
                self.stats.placeholder_references += 1;
                Type {
                    name: Some(name),
                    number: entry.number,
                    owner: entry.owner,
                    kind: kind.placeholder(),
                }
            }
        };

        self.db.add_type(ty).map(drop)
    }
}

fn typedef_of(target: TypeRef) -> RelationType
{
    RelationType {
        pointer: false,
        array: None,
        function: false,
        target,
    }
}
