//! # Introduction
//!
//! pasfront is the front end of a compiler for a small Pascal dialect. It
//! reads a source file, checks it and lowers it to three-address code (TAC)
//! in a single pass, without building a syntax tree.
//!
//! ## Compilation pipeline
//!
//! ```text
//! Source → Lexer → Parser / Semantic analysis → TAC Builder → Backend
//!                          ↕
//!                    Symbol Table
//! ```
//!
//! 1. [`parser`] tokenises the source and drives a recursive descent parse
//!    that type-checks every construct as it is recognized.
//! 2. [`symbols`] the hashed, scoped symbol table with overload mangling.
//! 3. [`tac`] instruction chains, constant folding and control-flow shapes.
//! 4. [`backend`] the read-only consumer of the finished program.
//!
//! The first error aborts compilation; see [`errors::CompileError`].
//!
//! ## Example
//!
//! ```
//! use pasfront::{compile_source, CompileOptions};
//!
//! let program = compile_source(
//!     "program p; var x: integer; begin x := 2 + 3; write(x) end.",
//!     &CompileOptions::default(),
//! )
//! .unwrap();
//! assert_eq!(program.listing()[2], "cpy x, 5");
//! ```

pub mod backend;
pub mod config;
pub mod constants;
pub mod errors;
pub mod parser;
pub mod symbols;
pub mod tac;

pub use config::CompileOptions;
pub use errors::CompileError;
pub use parser::parse::{compile_file, compile_source, parse, CompiledProgram, Parser};
