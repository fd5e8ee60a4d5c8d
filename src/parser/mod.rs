//! Pascal source front end
//!
//! This module turns source text into three-address code in a single pass:
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`parse`]: Parser struct, program driver and compile entry points
//! - [`declarations`]: const / var sections, functions and procedures
//! - [`statements`]: statements
//! - [`expressions`]: expressions, conditions, calls and type checking
//!
//! # Supported Pascal Subset
//!
//! - Types: `integer`, `real`, `char`, `string`, `boolean`
//! - Declarations: constants, variables with optional initializer,
//!   overloaded functions and procedures with value and `var` parameters
//! - Statements: assignment, calls, `if`, `while`, `for`, `write`,
//!   `writeln`, `read`, compound blocks
//! - No arrays, records, pointers, `case` or `repeat`
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser with one token of lookahead.
//! No external parser generator dependencies.

pub mod declarations;
pub mod expressions;
pub mod lexer;
pub mod parse;
pub mod statements;
