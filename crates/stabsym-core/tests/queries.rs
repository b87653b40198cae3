//! Address and name lookups, and native symbol enrichment

mod common;

use common::StabStreamBuilder;
use stabsym_core::database::{SymbolMatch, NATIVE_FUNCTION_SPAN};
use stabsym_core::SymbolDatabase;

const INT: &str = "int:t(0,1)=r(0,1);-2147483648;2147483647;";

fn program() -> SymbolDatabase
{
    StabStreamBuilder::new()
        .source_file("util.c", 0x1000)
        .local(INT, 0)
        .local("buf_t:t(0,2)=ar(0,1);0;7;(0,1)", 0)
        .global("ticks:G(0,1)", 0x5000)
        .global("buffer:G(0,2)", 0x5010)
        .global("late:G(0,1)", 0)
        .function("DbgInit:F(0,1)", 0x1000)
        .end_function(0x40)
        .function("DbgGetTypeSize:F(0,1)", 0x1040)
        .end_function(0x40)
        .function("helper:f(0,1)", 0x1080)
        .end_function(0x20)
        .end_source_file(0x1100)
        .parse()
        .0
}

#[test]
fn test_function_at_address()
{
    let db = program();
    let (_, function) = db.function_at(0x1050).unwrap();
    assert_eq!(function.name(), "DbgGetTypeSize");
    assert!(db.function_at(0x10a0).is_none());
    assert!(db.function_at(0x0fff).is_none());
}

#[test]
fn test_data_symbol_covers_its_size()
{
    let db = program();
    assert_eq!(db.data_symbol_at(0x5003).map(|symbol| symbol.name()), Some("ticks"));
    assert!(db.data_symbol_at(0x5004).is_none());
    assert_eq!(db.data_symbol_at(0x502f).map(|symbol| symbol.name()), Some("buffer"));
    assert!(db.data_symbol_at(0x5030).is_none());
}

#[test]
fn test_lookup_address_prefers_data()
{
    let db = program();
    assert!(matches!(db.lookup_address(0x5000), Some(SymbolMatch::Data(symbol)) if symbol.name() == "ticks"));
    assert!(
        matches!(db.lookup_address(0x1001), Some(SymbolMatch::Function(_, function)) if function.name() == "DbgInit")
    );
    assert!(db.lookup_address(0x9000).is_none());
}

#[test]
fn test_name_queries()
{
    let db = program();
    let names: Vec<_> = db.find_functions("dbg*").iter().map(|(_, f)| f.name()).collect();
    assert_eq!(names, ["DbgInit", "DbgGetTypeSize"]);
    assert_eq!(db.find_functions("*size").len(), 1);
    assert_eq!(db.find_globals("*").len(), 3);
    assert_eq!(db.find_types("BUF_T").len(), 1);
    assert!(db.find_functions("nothing*").is_empty());
}

#[test]
fn test_enrichment_adds_missing_functions()
{
    let mut db = program();
    assert!(db.create_or_update_symbol("asm_entry", 0x10c0, true));
    let (_, added) = db.function_at(0x10c4).unwrap();
    assert_eq!(added.name(), "asm_entry");
    assert_eq!(added.end_address(), 0x10c0 + NATIVE_FUNCTION_SPAN);
    assert_eq!(added.return_type(), None);

    // Outside every source file.
    assert!(!db.create_or_update_symbol("far_away", 0x9000, true));
    // Already described by STABS.
    assert!(!db.create_or_update_symbol("helper", 0x1080, true));
    assert_eq!(db.find_functions("helper").len(), 1);
}

#[test]
fn test_enrichment_backfills_zero_globals()
{
    let mut db = program();
    assert!(db.create_or_update_symbol("late", 0x6000, false));
    assert_eq!(db.find_globals("late")[0].absolute_address(), Some(0x6000));

    // Already placed, so it is never moved.
    assert!(!db.create_or_update_symbol("late", 0x7000, false));
    assert!(!db.create_or_update_symbol("ticks", 0x7000, false));
    assert_eq!(db.find_globals("ticks")[0].absolute_address(), Some(0x5000));
    assert!(!db.create_or_update_symbol("unknown", 0x7000, false));
    assert!(!db.create_or_update_symbol("", 0x7000, false));
}
