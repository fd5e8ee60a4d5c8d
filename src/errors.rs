//! Compile error types
//!
//! This module defines [`CompileError`], which represents every failure the
//! front end can report: unreadable input, malformed tokens, grammar
//! violations and semantic (declaration, resolution and typing) errors.
//!
//! All errors are fatal. The first one aborts the parse and is rendered as a
//! single `Error: <message> at line <L>, char <C>` diagnostic.

use crate::parser::lexer::SourceLocation;
use crate::symbols::ValueType;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    /// The source file could not be opened or read
    #[error("Error: cannot read {path}: {reason}")]
    Io { path: String, reason: String },

    /// Malformed token: unterminated string, digit-leading identifier, ...
    #[error("Error: {message} at {location}")]
    Lex {
        message: String,
        location: SourceLocation,
    },

    /// A specific token or token class was required
    #[error("Error: expected token {expected} but got {found} at {location}")]
    Syntax {
        expected: String,
        found: String,
        location: SourceLocation,
    },

    #[error("Error: undeclared identifier {name} at {location}")]
    UndeclaredIdentifier {
        name: String,
        location: SourceLocation,
    },

    /// No callable matches the mangled name derived from the arguments
    #[error("Error: no callable {name} takes these arguments (tried {mangled}) at {location}")]
    UndeclaredCallable {
        name: String,
        mangled: String,
        location: SourceLocation,
    },

    #[error("Error: cannot assign to constant {name} at {location}")]
    AssignToConstant {
        name: String,
        location: SourceLocation,
    },

    /// Assignment or read target names a function or procedure
    #[error("Error: {name} is not a variable at {location}")]
    NotAVariable {
        name: String,
        location: SourceLocation,
    },

    #[error("Error: duplicate constant {name} at {location}")]
    DuplicateConstant {
        name: String,
        location: SourceLocation,
    },

    #[error("Error: duplicate identifier {name} at {location}")]
    DuplicateIdentifier {
        name: String,
        location: SourceLocation,
    },

    #[error("Error: duplicate parameter {name} at {location}")]
    DuplicateParameter {
        name: String,
        location: SourceLocation,
    },

    #[error("Error: library {name} already used at {location}")]
    DuplicateLibrary {
        name: String,
        location: SourceLocation,
    },

    /// Two callables with the same base name and the same parameter list
    #[error("Error: {name} already declared with the same parameter list at {location}")]
    DuplicateOverload {
        name: String,
        location: SourceLocation,
    },

    #[error("Error: {name} is not a function or procedure at {location}")]
    NotCallable {
        name: String,
        location: SourceLocation,
    },

    #[error("Error: procedure {name} does not return a value at {location}")]
    ProcedureAsValue {
        name: String,
        location: SourceLocation,
    },

    /// A constant or literal was passed to a `var` parameter
    #[error("Error: argument {argument} cannot be passed by reference to {callee} at {location}")]
    ReferenceArgument {
        argument: String,
        callee: String,
        location: SourceLocation,
    },

    #[error("Error: expected type {expected} but got {found} at {location}")]
    TypeMismatch {
        expected: ValueType,
        found: ValueType,
        location: SourceLocation,
    },

    /// `a, b: integer = 1`
    #[error("Error: only a single variable may be initialized at {location}")]
    MultipleInitializers { location: SourceLocation },

    #[error("Error: illegal statement starting with {found} at {location}")]
    IllegalStatement {
        found: String,
        location: SourceLocation,
    },
}

impl CompileError {
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            CompileError::Io { .. } => None,
            CompileError::Lex { location, .. } => Some(location),
            CompileError::Syntax { location, .. } => Some(location),
            CompileError::UndeclaredIdentifier { location, .. } => Some(location),
            CompileError::UndeclaredCallable { location, .. } => Some(location),
            CompileError::AssignToConstant { location, .. } => Some(location),
            CompileError::NotAVariable { location, .. } => Some(location),
            CompileError::DuplicateConstant { location, .. } => Some(location),
            CompileError::DuplicateIdentifier { location, .. } => Some(location),
            CompileError::DuplicateParameter { location, .. } => Some(location),
            CompileError::DuplicateLibrary { location, .. } => Some(location),
            CompileError::DuplicateOverload { location, .. } => Some(location),
            CompileError::NotCallable { location, .. } => Some(location),
            CompileError::ProcedureAsValue { location, .. } => Some(location),
            CompileError::ReferenceArgument { location, .. } => Some(location),
            CompileError::TypeMismatch { location, .. } => Some(location),
            CompileError::MultipleInitializers { location } => Some(location),
            CompileError::IllegalStatement { location, .. } => Some(location),
        }
    }
}
