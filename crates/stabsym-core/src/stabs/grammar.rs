//! Type references and type definitions.
//!
//! ```text
//! typeref    := "(" index "," number ")" | number
//! definition := typeref "=" attributes* ["k"] ["B"] body
//! attributes := "@" ... ";"            ("@s<bits>;" overrides the bit size)
//! body       := "x" kind name ":"      cross reference
//!             | ["*"|"&"] ["ar" typeref [";"] range] ["f"|"#"] typeref
//!             | "r" typeref ";" range
//!             | "R" fpkind ";" bytes ";"
//!             | ("s"|"u") bytes member* ";"
//!             | "e" (name ":" value ",")* ";"
//! ```

use tracing::trace;

use super::cursor::StabCursor;
use super::parser::StabParser;
use super::range::{parse_range, range_to_numeric};
use super::scope::CrossReferenceEntry;
use super::{lossy, BUILTIN_TYPE_BOOL, BUILTIN_TYPE_BOOL_DEFINITION, MAX_TYPE_NESTING};
use crate::database::{
    try_push, EnumerationMember, EnumerationType, NumericType, RelationType, StructureMember, StructureType, Type,
    TypeKind,
};
use crate::error::{StabError, StabResult};
use crate::types::{SourceFileId, TypeRef};

impl StabParser<'_>
{
    /// Parse a type reference, defining the type when `=` follows.
    ///
    /// `name` is attached to a definition introduced here; it is ignored for
    /// a bare reference.
    pub(crate) fn parse_type_reference(
        &mut self,
        cursor: &mut StabCursor<'_>,
        name: Option<&[u8]>,
    ) -> StabResult<TypeRef>
    {
        let (index, number) = if cursor.eat(b'(') {
            let index = cursor.parse_decimal()?;
            cursor.expect(b',')?;
            let number = cursor.parse_i32()?;
            cursor.expect(b')')?;
            (index, number)
        } else {
            (0, cursor.parse_i32()?)
        };

        let owner = match self.scope.include_file(index) {
            Some(owner) => owner,
            None if index == 0 => return Err(StabError::MissingScope("source file")),
            None => return Err(StabError::bad(format!("unknown include index {index}"))),
        };

        let key = TypeRef::new(owner, number);
        if cursor.eat(b'=') {
            if self.type_depth >= MAX_TYPE_NESTING {
                return Err(StabError::bad(format!("type definitions nested deeper than {MAX_TYPE_NESTING}")));
            }
            self.type_depth += 1;
            let defined = self.parse_type_definition(cursor, name, key);
            self.type_depth -= 1;
            defined?;
        } else if number == BUILTIN_TYPE_BOOL && self.db.get_type(key).is_none() {
            self.define_builtin_bool(owner)?;
        }

        Ok(key)
    }

    /// Parse the text after `=` and store the type under `key`.
    ///
    /// The type is stored once its body is complete; references to `key`
    /// from inside the body already carry the right key.
    pub(crate) fn parse_type_definition(
        &mut self,
        cursor: &mut StabCursor<'_>,
        name: Option<&[u8]>,
        key: TypeRef,
    ) -> StabResult<()>
    {
        let mut bit_size_override = None;
        while cursor.eat(b'@') {
            if cursor.eat(b's') {
                bit_size_override = Some(cursor.parse_u32()?);
            }
            if !cursor.skip_past(b';') || cursor.is_empty() {
                return Err(StabError::Truncated);
            }
        }

        // Const and volatile qualifiers do not change the layout.
        cursor.eat(b'k');
        cursor.eat(b'B');

        let kind = match cursor.peek().ok_or(StabError::Truncated)? {
            b'x' => {
                cursor.bump();
                return self.push_cross_reference(cursor, name, key);
            }
            b'*' | b'&' | b'-' | b'(' | b'a' | b'f' | b'#' | b'0'..=b'9' => {
                TypeKind::Relation(self.parse_relation(cursor)?)
            }
            b'r' => {
                cursor.bump();
                // The base type of a subrange is not needed to size it.
                if !cursor.skip_past(b';') {
                    return Err(StabError::Truncated);
                }
                let mut numeric = range_to_numeric(&parse_range(cursor)?);
                if let Some(bits) = bit_size_override {
                    numeric.bit_size = bits;
                }
                TypeKind::Numeric(numeric)
            }
            b'R' => {
                cursor.bump();
                let mut numeric = parse_float(cursor)?;
                if let Some(bits) = bit_size_override {
                    numeric.bit_size = bits;
                }
                TypeKind::Numeric(numeric)
            }
            b's' | b'u' => {
                cursor.bump();
                TypeKind::Structure(self.parse_structure(cursor)?)
            }
            b'e' => {
                cursor.bump();
                TypeKind::Enumeration(parse_enumeration(cursor)?)
            }
            other => return Err(StabError::UnknownDescriptor(char::from(other))),
        };

        self.db.add_type(Type {
            name: name.map(lossy),
            number: key.number,
            owner: key.file,
            kind,
        })?;
        Ok(())
    }

    fn parse_relation(&mut self, cursor: &mut StabCursor<'_>) -> StabResult<RelationType>
    {
        let pointer = cursor.eat(b'*') || cursor.eat(b'&');
        let mut relation = RelationType {
            pointer,
            array: None,
            function: false,
            target: TypeRef::new(SourceFileId::new(0), 0),
        };

        if cursor.eat(b'a') {
            cursor.expect(b'r')?;
            self.parse_type_reference(cursor, None)?;
            cursor.eat(b';');
            let mut range = parse_range(cursor)?;
            // Flexible array member: treat as a pointer to the element.
            if range.minimum == 0 && range.maximum == -1 {
                relation.pointer = true;
                range.maximum = 0;
            }
            relation.array = Some(range);
        }

        if cursor.eat(b'f') {
            relation.function = true;
        } else if cursor.eat(b'#') {
            // "##" is a method whose class is implied.
            cursor.eat(b'#');
            relation.function = true;
        }

        relation.target = self.parse_type_reference(cursor, None)?;
        Ok(relation)
    }

    fn parse_structure(&mut self, cursor: &mut StabCursor<'_>) -> StabResult<StructureType>
    {
        let size_in_bytes = cursor.parse_u32()?;
        let mut members = Vec::new();
        loop {
            match self.parse_structure_member(cursor) {
                Ok(Some(member)) => {
                    try_push(&mut members, member)?;
                }
                Ok(None) => break,
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    trace!("Stopping structure member list: {err}");
                    break;
                }
            }
        }

        cursor.bump();
        Ok(StructureType { size_in_bytes, members })
    }

    /// `name:typeref,bit_offset,bit_size;`
    fn parse_structure_member(&mut self, cursor: &mut StabCursor<'_>) -> StabResult<Option<StructureMember>>
    {
        if matches!(cursor.peek(), None | Some(b';')) {
            return Ok(None);
        }

        let Some(name) = cursor.take_member_name() else {
            return Ok(None);
        };

        let type_ref = self.parse_type_reference(cursor, None)?;
        cursor.expect(b',')?;
        let bit_offset = cursor.parse_u32()?;
        cursor.expect(b',')?;
        let bit_size = cursor.parse_u32()?;
        cursor.skip_past(b';');

        Ok(Some(StructureMember {
            name: lossy(name),
            type_ref,
            bit_offset,
            bit_size,
        }))
    }

    /// Queue `kind name:` for resolution when the owning file closes.
    fn push_cross_reference(&mut self, cursor: &mut StabCursor<'_>, name: Option<&[u8]>, key: TypeRef) -> StabResult<()>
    {
        let reference = match cursor.take_member_name() {
            Some(reference) => reference,
            None => cursor.take_rest(),
        };

        let pending = &mut self.scope.pending_references;
        pending.try_reserve(1).map_err(|_| StabError::Allocation)?;
        pending.push(CrossReferenceEntry {
            name: name.map(lossy),
            number: key.number,
            owner: key.file,
            reference: reference.to_vec(),
        });
        Ok(())
    }

    /// Define type -16 (`bool`) in `owner` the first time it is referenced.
    fn define_builtin_bool(&mut self, owner: SourceFileId) -> StabResult<()>
    {
        let mut cursor = StabCursor::new(BUILTIN_TYPE_BOOL_DEFINITION);
        self.parse_type_definition(&mut cursor, None, TypeRef::new(owner, BUILTIN_TYPE_BOOL))
    }
}

/// `fpkind;bytes;` following `R`. Kinds 1 and 2 are single and double
/// precision; any other kind is sized by `bytes`.
fn parse_float(cursor: &mut StabCursor<'_>) -> StabResult<NumericType>
{
    let float_kind = cursor.parse_decimal()?;
    cursor.expect(b';')?;
    let bytes = cursor.parse_u32()?;
    cursor.eat(b';');

    let bit_size = match float_kind {
        1 => 32,
        2 => 64,
        _ => bytes.saturating_mul(8),
    };

    Ok(NumericType {
        bit_size,
        signed: false,
        float: true,
    })
}

fn parse_enumeration(cursor: &mut StabCursor<'_>) -> StabResult<EnumerationType>
{
    let mut members = Vec::new();
    while !matches!(cursor.peek(), None | Some(b';')) {
        let Some(name) = cursor.take_until(b':') else {
            break;
        };
        let value = cursor.peek_lenient_decimal();
        if !cursor.skip_past(b',') {
            break;
        }

        try_push(&mut members, EnumerationMember { name: lossy(name), value })?;
    }

    cursor.bump();
    Ok(EnumerationType {
        size_in_bytes: 4,
        members,
    })
}
