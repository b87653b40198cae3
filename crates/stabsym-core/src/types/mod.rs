//! # Types
//!
//! Small value types shared by the parser and the symbol database.
//!
//! Identifiers here are keys into the database's arenas rather than pointers,
//! so a type can name another type that has not been defined yet.

pub mod ids;
pub mod machine;

// Re-export all public types
pub use ids::{FunctionId, SourceFileId, TypeRef};
pub use machine::{ImageFormat, MachineType};
