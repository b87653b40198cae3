//! # stabsym-core
//!
//! STABS debug information parsing for PE and ELF images.
//!
//! The crate reads the `.stab`/`.stabstr` sections of a binary and builds a
//! [`SymbolDatabase`]: source files with their line tables, functions with
//! parameters and block-scoped locals, globals, and a type graph of numeric,
//! relation, structure and enumeration types.
//!
//! ```no_run
//! use stabsym_core::{load_symbols, LoadOptions};
//!
//! let db = load_symbols("kernel.elf", &LoadOptions::default())?;
//! if let Some(line) = db.lookup_source_line(0x8000_1234) {
//!     println!("line {}", line.line);
//! }
//! # Ok::<(), stabsym_core::SymbolError>(())
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod loader;
pub mod native;
pub mod stabs;
pub mod types;

pub use config::LoadOptions;
pub use database::SymbolDatabase;
// Re-export commonly used types
pub use error::{Result, SymbolError};
pub use loader::{load_symbols, load_symbols_from_bytes, StabSections};
pub use types::{FunctionId, ImageFormat, MachineType, SourceFileId, TypeRef};
