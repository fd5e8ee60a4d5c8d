//! Scoped symbol table
//!
//! Symbols live in one arena addressed by [`SymbolId`]; scopes form a tree in
//! a second arena addressed by [`ScopeId`]. Each scope hashes names into a
//! fixed number of buckets whose chains hold symbol ids.

pub mod hash;
pub mod symbol;
pub mod table;

pub use symbol::{mangle_name, DeclKind, Literal, Param, Symbol, ValueType};
pub use table::{LookupInsert, Scope, ScopeId, SymbolId, SymbolTable};
