//! Type grammar and type graph queries

mod common;

use common::StabStreamBuilder;
use stabsym_core::database::{SymbolDatabase, Type, TypeKind};
use stabsym_core::TypeRef;

const INT: &str = "int:t(0,1)=r(0,1);-2147483648;2147483647;";
const CHAR: &str = "char:t(0,2)=r(0,2);0;127;";

/// Parse `definitions` as local type records of a single source file.
fn parse_types(definitions: &[&str]) -> SymbolDatabase
{
    let builder = definitions
        .iter()
        .fold(StabStreamBuilder::new().source_file("types.c", 0x1000), |builder, text| {
            builder.local(text, 0)
        });
    let (db, stats) = builder.end_source_file(0x2000).parse();
    assert_eq!(stats.failed, 0, "all definitions should parse");
    db
}

fn named<'a>(db: &'a SymbolDatabase, name: &str) -> &'a Type
{
    db.find_types(name)
        .into_iter()
        .next()
        .unwrap_or_else(|| panic!("no type named {name}"))
}

fn types_of(db: &SymbolDatabase) -> &[Type]
{
    let (_, file) = db.source_files().next().expect("one source file");
    file.types()
}

#[test]
fn test_numeric_widths()
{
    let db = parse_types(&[
        INT,
        CHAR,
        "short unsigned int:t(0,3)=r(0,3);0;65535;",
        "long long int:t(0,4)=r(0,4);01000000000000000000000;0777777777777777777777;",
        "long long unsigned int:t(0,5)=r(0,5);0;01777777777777777777777;",
        "double:t(0,6)=r(0,1);8;0;",
    ]);

    let numeric = |name| match named(&db, name).kind() {
        TypeKind::Numeric(numeric) => (numeric.bit_size, numeric.signed, numeric.float),
        other => panic!("{name} is {other:?}"),
    };

    assert_eq!(numeric("int"), (32, true, false));
    assert_eq!(numeric("char"), (8, false, false));
    assert_eq!(numeric("short unsigned int"), (16, false, false));
    assert_eq!(numeric("long long int"), (64, true, false));
    assert_eq!(numeric("long long unsigned int"), (64, false, false));
    assert_eq!(numeric("double"), (64, false, true));
}

#[test]
fn test_repeated_reference_is_idempotent()
{
    let db = parse_types(&[INT, "alias:t(0,7)=(0,1)", "again:t(0,8)=(0,1)"]);
    let types = types_of(&db);
    assert_eq!(types.len(), 3);
    assert_eq!(types.iter().filter(|ty| ty.number() == 1).count(), 1);

    let alias = named(&db, "alias");
    let again = named(&db, "again");
    let target = |ty: &Type| match ty.kind() {
        TypeKind::Relation(relation) => relation.target,
        other => panic!("expected relation, got {other:?}"),
    };
    assert_eq!(target(alias), target(again));
    assert_eq!(db.type_size(alias), 4);
}

#[test]
fn test_self_referential_structure()
{
    let db = parse_types(&[INT, "node:T(0,2)=s8next:(0,3)=*(0,2),0,32;value:(0,1),32,32;;"]);

    let structures: Vec<_> = types_of(&db)
        .iter()
        .filter(|ty| matches!(ty.kind(), TypeKind::Structure(_)))
        .collect();
    assert_eq!(structures.len(), 1);

    let node = structures[0];
    assert_eq!(node.name(), Some("node"));
    assert_eq!(db.type_size(node), 8);
    assert_eq!(db.type_name(node), "struct node");

    let TypeKind::Structure(layout) = node.kind() else {
        unreachable!();
    };
    assert_eq!(layout.member_count(), 2);
    assert_eq!(layout.members[1].name, "value");
    assert_eq!(layout.members[1].bit_offset, 32);

    let next = db.get_type(layout.members[0].type_ref).unwrap();
    assert_eq!(db.type_size(next), 4);
    assert_eq!(db.type_name(next), "struct node*");
}

#[test]
fn test_structure_member_counts()
{
    let db = parse_types(&[
        INT,
        "empty:T(0,2)=s0;",
        "one:T(0,3)=s4a:(0,1),0,32;;",
        "many:T(0,4)=s16a:(0,1),0,32;b:(0,1),32,32;c:(0,1),64,32;d:(0,1),96,32;;",
        "bits:T(0,5)=u4lo:(0,1),0,4;hi:(0,1),4,28;;",
    ]);

    let members = |name| match named(&db, name).kind() {
        TypeKind::Structure(layout) => layout.member_count(),
        other => panic!("{name} is {other:?}"),
    };
    assert_eq!(members("empty"), 0);
    assert_eq!(members("one"), 1);
    assert_eq!(members("many"), 4);
    assert_eq!(members("bits"), 2);
    assert_eq!(db.type_size(named(&db, "many")), 16);
}

#[test]
fn test_arrays_and_typedef_chains()
{
    let db = parse_types(&[
        INT,
        CHAR,
        "buffer:t(0,3)=ar(0,1);0;15;(0,2)",
        "matrix:t(0,4)=ar(0,1);0;3;(0,5)=ar(0,1);0;3;(0,1)",
        "pchar:t(0,6)=*(0,2)",
        "myint:t(0,7)=(0,1)",
        "myint2:t(0,8)=(0,7)",
    ]);

    assert_eq!(db.type_size(named(&db, "buffer")), 16);
    assert_eq!(db.type_size(named(&db, "matrix")), 64);
    assert_eq!(db.type_size(named(&db, "pchar")), 4);

    let row = db.get_type(TypeRef::new(named(&db, "matrix").owner(), 5)).unwrap();
    assert_eq!(db.type_name(row), "int[4]");

    let base = db.skip_typedefs(named(&db, "myint2")).unwrap();
    assert_eq!(base.name(), Some("int"));
    let pointer = db.skip_typedefs(named(&db, "pchar")).unwrap();
    assert_eq!(pointer.name(), Some("pchar"));
}

#[test]
fn test_void_self_reference()
{
    let db = parse_types(&["void:t(0,9)=(0,9)", "pvoid:t(0,10)=*(0,9)"]);
    let void = named(&db, "void");
    assert_eq!(db.type_size(void), 0);
    assert!(db.skip_typedefs(void).is_none());

    let anonymous = parse_types(&["void:t(0,9)=(0,9)", "x:t(0,11)=(0,12)=*(0,9)"]);
    let pointer = anonymous
        .get_type(TypeRef::new(named(&anonymous, "x").owner(), 12))
        .unwrap();
    assert_eq!(anonymous.type_name(pointer), "void*");
}

#[test]
fn test_enumeration()
{
    let db = parse_types(&["color:T(0,20)=eRED:0,GREEN:1,BLUE:2,;"]);
    let color = named(&db, "color");
    assert_eq!(db.type_size(color), 4);
    let TypeKind::Enumeration(values) = color.kind() else {
        panic!("expected enumeration");
    };
    assert_eq!(values.name_of(1), Some("GREEN"));
    assert_eq!(values.member_count(), 3);
}

#[test]
fn test_builtin_bool()
{
    let db = parse_types(&["flag_t:t(0,3)=(0,-16)", "other_t:t(0,4)=(0,-16)"]);
    let bools: Vec<_> = types_of(&db).iter().filter(|ty| ty.number() == -16).collect();
    assert_eq!(bools.len(), 1);

    let TypeKind::Numeric(numeric) = bools[0].kind() else {
        panic!("bool should be numeric");
    };
    assert_eq!((numeric.bit_size, numeric.signed), (1, false));
    assert_eq!(db.type_size(named(&db, "flag_t")), 1);
}

#[test]
fn test_redefinition_uses_latest()
{
    let db = parse_types(&["first:t(0,1)=r(0,1);0;255;", "second:t(0,1)=r(0,1);0;65535;"]);
    let latest = db
        .get_type(TypeRef::new(named(&db, "first").owner(), 1))
        .unwrap();
    assert_eq!(latest.name(), Some("second"));
}

#[test]
fn test_malformed_definition_is_skipped()
{
    let (db, stats) = StabStreamBuilder::new()
        .source_file("bad.c", 0x1000)
        .local("broken:t(0,1)=Z", 0)
        .local("short:t(0,2)=r(0,2);0", 0)
        .local(INT, 0)
        .end_source_file(0x2000)
        .parse();
    assert_eq!(stats.failed, 2);
    assert_eq!(db.find_types("*").len(), 1);
}

/// `name:t(0,first)=*(0,first+1)=*...=*(0,1)` with `levels` inline definitions.
fn pointer_chain(name: &str, first: i32, levels: i32) -> String
{
    let mut chain = format!("{name}:t");
    for number in first..first + levels {
        chain.push_str(&format!("(0,{number})=*"));
    }
    chain.push_str("(0,1)");
    chain
}

#[test]
fn test_deeply_nested_definition_fails_alone()
{
    let (db, stats) = StabStreamBuilder::new()
        .source_file("nested.c", 0x1000)
        .local(&pointer_chain("deep", 100, 2000), 0)
        .local(INT, 0)
        .local(&pointer_chain("shallow", 10, 32), 0)
        .local("after:t(0,2)=*(0,1)", 0)
        .end_source_file(0x2000)
        .parse();
    assert_eq!(stats.failed, 1);
    assert!(db.find_types("deep").is_empty());
    assert_eq!(db.find_types("shallow").len(), 1);
    assert_eq!(db.type_size(named(&db, "after")), 4);
}
