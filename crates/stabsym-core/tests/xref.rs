//! Cross references and include file namespaces

mod common;

use common::StabStreamBuilder;
use stabsym_core::database::{SymbolDatabase, Type, TypeKind};
use stabsym_core::{SourceFileId, TypeRef};

const INT: &str = "int:t(0,1)=r(0,1);-2147483648;2147483647;";

fn file_named(db: &SymbolDatabase, name: &str) -> SourceFileId
{
    db.source_files()
        .find(|(_, file)| file.file_name() == name)
        .map(|(id, _)| id)
        .unwrap_or_else(|| panic!("no source file {name}"))
}

fn type_in<'a>(db: &'a SymbolDatabase, file: SourceFileId, number: i32) -> &'a Type
{
    db.get_type(TypeRef::new(file, number))
        .unwrap_or_else(|| panic!("type {number} missing"))
}

#[test]
fn test_unresolved_references_become_placeholders()
{
    let (db, stats) = StabStreamBuilder::new()
        .source_file("opaque.c", 0x1000)
        .local("list:t(0,4)=xslist_node:", 0)
        .local("color_t:t(0,5)=xecolor:", 0)
        .local("handle:t(0,6)=*(0,7)=xuhandle_impl:", 0)
        .end_source_file(0x2000)
        .parse();
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.placeholder_references, 3);
    assert_eq!(stats.resolved_references, 0);

    let file = file_named(&db, "opaque.c");
    let list = type_in(&db, file, 4);
    assert_eq!(list.name(), Some("list_node"));
    assert!(matches!(
        list.kind(),
        TypeKind::Structure(layout) if layout.size_in_bytes == 0 && layout.members.is_empty()
    ));

    let color = type_in(&db, file, 5);
    assert_eq!(color.name(), Some("color"));
    assert!(matches!(
        color.kind(),
        TypeKind::Enumeration(values) if values.size_in_bytes == 4 && values.members.is_empty()
    ));

    assert!(matches!(type_in(&db, file, 7).kind(), TypeKind::Structure(_)));
    assert_eq!(db.type_size(type_in(&db, file, 6)), 4);
}

#[test]
fn test_reference_resolved_against_later_definition()
{
    let (db, stats) = StabStreamBuilder::new()
        .source_file("forward.c", 0x1000)
        .local(INT, 0)
        .local("node_t:t(0,2)=xsnode:", 0)
        .local("node:T(0,3)=s4value:(0,1),0,32;;", 0)
        .end_source_file(0x2000)
        .parse();
    assert_eq!(stats.resolved_references, 1);

    let file = file_named(&db, "forward.c");
    let node_t = type_in(&db, file, 2);
    assert_eq!(node_t.name(), Some("node_t"));
    let TypeKind::Relation(relation) = node_t.kind() else {
        panic!("expected a typedef, got {:?}", node_t.kind());
    };
    assert_eq!(relation.target, TypeRef::new(file, 3));
    assert_eq!(db.type_size(node_t), 4);
    assert_eq!(db.skip_typedefs(node_t).and_then(Type::name), Some("node"));
}

#[test]
fn test_reference_kind_must_match()
{
    let (db, stats) = StabStreamBuilder::new()
        .source_file("kinds.c", 0x1000)
        .local("mode:T(0,3)=eA:0,B:1,;", 0)
        .local("mode_s:t(0,4)=xsmode:", 0)
        .end_source_file(0x2000)
        .parse();
    assert_eq!(stats.placeholder_references, 1);

    let file = file_named(&db, "kinds.c");
    assert!(matches!(type_in(&db, file, 4).kind(), TypeKind::Structure(_)));
}

#[test]
fn test_references_resolve_per_file()
{
    let (db, _) = StabStreamBuilder::new()
        .source_file("a.c", 0x1000)
        .local("pt:t(0,2)=xspoint:", 0)
        .end_source_file(0x2000)
        .source_file("b.c", 0x2000)
        .local(INT, 0)
        .local("point:T(0,2)=s4x:(0,1),0,32;;", 0)
        .end_source_file(0x3000)
        .parse();

    let a = file_named(&db, "a.c");
    let placeholder = type_in(&db, a, 2);
    assert!(matches!(placeholder.kind(), TypeKind::Structure(layout) if layout.members.is_empty()));

    let b = file_named(&db, "b.c");
    assert_eq!(db.type_size(type_in(&db, b, 2)), 4);
}

#[test]
fn test_repeated_include_reuses_file()
{
    let (db, stats) = StabStreamBuilder::new()
        .source_file("a.c", 0x1000)
        .include_begin("defs.h", 0x77)
        .local("u8:t(1,1)=r(1,1);0;255;", 0)
        .include_end()
        .local("local_a:t(0,1)=(1,1)", 0)
        .end_source_file(0x2000)
        .source_file("b.c", 0x2000)
        .stab(stabsym_core::stabs::StabKind::IncludePlaceholder, Some("defs.h"), 0, 0x77)
        .local("local_b:t(0,1)=(1,1)", 0)
        .end_source_file(0x3000)
        .parse();
    assert_eq!(stats.failed, 0);
    assert_eq!(db.source_file_count(), 3);

    let header = file_named(&db, "defs.h");
    assert_eq!(db.source_file(header).unwrap().types().len(), 1);
    assert_eq!(db.source_file(header).unwrap().start_address(), 0);

    for name in ["a.c", "b.c"] {
        let typedef = type_in(&db, file_named(&db, name), 1);
        let TypeKind::Relation(relation) = typedef.kind() else {
            panic!("{name}: expected typedef");
        };
        assert_eq!(relation.target, TypeRef::new(header, 1));
        assert_eq!(db.type_size(typedef), 1);
    }
}

#[test]
fn test_include_index_is_per_source_file()
{
    let (_, stats) = StabStreamBuilder::new()
        .source_file("a.c", 0x1000)
        .include_begin("defs.h", 0x77)
        .include_end()
        .end_source_file(0x2000)
        .source_file("b.c", 0x2000)
        .local("stale:t(0,1)=(1,1)", 0)
        .end_source_file(0x3000)
        .parse();
    assert_eq!(stats.failed, 1);
}

#[test]
fn test_include_name_redirects_lines()
{
    let (db, stats) = StabStreamBuilder::new()
        .source_file("main.c", 0x1000)
        .local(INT, 0)
        .function("main:F(0,1)", 0x1000)
        .line(10, 0)
        .include_name("inline.h", 0x1008)
        .line(3, 8)
        .include_name("main.c", 0x1010)
        .line(11, 0x10)
        .end_function(0x20)
        .end_source_file(0x1020)
        .parse();
    assert_eq!(stats.failed, 0);

    let header = file_named(&db, "inline.h");
    let line = db.lookup_source_line(0x100a).unwrap();
    assert_eq!((line.line, line.source), (3, header));
    assert_eq!(db.source_file(line.source).unwrap().start_address(), 0x1008);

    let main = db.lookup_source_line(0x1014).unwrap();
    assert_eq!(main.line, 11);
    assert_eq!(db.source_file(main.source).unwrap().file_name(), "main.c");

    // Functions stay with the main file.
    assert_eq!(db.functions().count(), 1);
    let (id, _) = db.function_at(0x1004).unwrap();
    assert_eq!(db.source_file(id.source()).unwrap().file_name(), "main.c");
}

#[test]
fn test_include_name_without_file_fails()
{
    let (_, stats) = StabStreamBuilder::new()
        .source_file("main.c", 0x1000)
        .stab(stabsym_core::stabs::StabKind::IncludeName, None, 0, 0x1000)
        .end_source_file(0x2000)
        .parse();
    assert_eq!(stats.failed, 1);
}
