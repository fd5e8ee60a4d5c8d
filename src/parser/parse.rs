//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct, its token helpers, the
//! program-level driver and the compilation entry points.
//!
//! # Parser Architecture
//!
//! The Parser is a single-pass recursive descent analyzer with one token of
//! lookahead. There is no syntax tree: while recognizing a production it
//! updates the symbol table and synthesizes three-address code directly.
//! - This module: Parser struct, helpers, program header and `uses` clause
//! - `declarations`: const / var sections, functions and procedures
//! - `statements`: compound, assignment, call, control flow and I/O
//! - `expressions`: expressions, conditions, calls and type checking
//!
//! # Grammar
//!
//! ```text
//! program ::= "program" id [ "(" id { "," id } ")" ] ";"
//!             [ "uses" id { "," id } ";" ]
//!             { const_section | var_section | function | procedure }
//!             compound "." EOF
//! ```
//!
//! # Implementation
//!
//! Parser methods are split across multiple files using `impl Parser` blocks.
//! The parser is also the compiler context: it owns the current scope, the
//! label and temporary counters and the instruction units built so far.

use crate::backend;
use crate::config::CompileOptions;
use crate::errors::CompileError;
use crate::parser::lexer::{Lexer, SourceLocation, Token, TokenKind};
use crate::symbols::{
    DeclKind, Literal, LookupInsert, ScopeId, Symbol, SymbolId, SymbolTable, ValueType,
};
use crate::tac::{Instruction, TacBuilder, TacChain};
use rustc_hash::FxHashSet;
use std::path::Path;

/// Result of a successful compilation, handed to the backend
#[derive(Debug, Clone)]
pub struct CompiledProgram {
    /// Program identifier from the header
    pub name: String,
    /// Unscoped procedure symbol standing for the main body
    pub program: SymbolId,
    /// Callable units in declaration order, then the main unit
    pub instructions: Vec<Instruction>,
    pub symbols: SymbolTable,
}

impl CompiledProgram {
    pub fn root(&self) -> ScopeId {
        self.symbols.root()
    }

    /// One rendered line per instruction.
    pub fn listing(&self) -> Vec<String> {
        self.instructions
            .iter()
            .map(|instruction| instruction.render(&self.symbols))
            .collect()
    }
}

/// Recursive descent parser and semantic analyzer
pub struct Parser {
    pub(crate) lexer: Lexer,
    pub(crate) current: Token,
    pub(crate) table: SymbolTable,
    pub(crate) scope: ScopeId,
    pub(crate) tac: TacBuilder,
    /// Finished callable units
    pub(crate) units: TacChain,
    /// Initializations of the variables declared for the unit being parsed
    pub(crate) prologue: TacChain,
    /// Body-scope copy of the function being parsed (its result variable)
    pub(crate) enclosing: Option<SymbolId>,
    /// Base names of every declared callable
    pub(crate) callables: FxHashSet<String>,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, CompileError> {
        let current = lexer.next_token()?;
        let table = SymbolTable::new();
        let scope = table.root();
        Ok(Self {
            lexer,
            current,
            table,
            scope,
            tac: TacBuilder::new(),
            units: TacChain::new(),
            prologue: TacChain::new(),
            enclosing: None,
            callables: FxHashSet::default(),
        })
    }

    /// Parse the whole program. The lexer is closed on every exit path.
    pub fn run(mut self) -> Result<CompiledProgram, CompileError> {
        let result = self.parse_program();
        self.lexer.close();
        let (name, program) = result?;

        Ok(CompiledProgram {
            name,
            program,
            instructions: self.units.into_vec(),
            symbols: self.table,
        })
    }

    pub(crate) fn parse_program(&mut self) -> Result<(String, SymbolId), CompileError> {
        self.expect(TokenKind::Program)?;
        let name = self.expect_identifier()?;
        let program = self.table.alloc(Symbol::new(
            name.lexeme.clone(),
            DeclKind::Procedure,
            None,
            name.location,
        ));

        // Header parameters (`program p(input, output);`) carry no meaning.
        if self.match_token(TokenKind::LParen)? {
            self.expect_identifier()?;
            while self.match_token(TokenKind::Comma)? {
                self.expect_identifier()?;
            }
            self.expect(TokenKind::RParen)?;
        }
        self.expect(TokenKind::Semicolon)?;

        if self.check(TokenKind::Uses) {
            self.parse_uses()?;
        }

        loop {
            match self.current.kind {
                TokenKind::Const => self.parse_const_section()?,
                TokenKind::Var => self.parse_var_section()?,
                TokenKind::Function => self.parse_callable(DeclKind::Function)?,
                TokenKind::Procedure => self.parse_callable(DeclKind::Procedure)?,
                TokenKind::Begin => break,
                _ => return Err(self.syntax_error(TokenKind::Begin)),
            }
        }

        self.scope = self.table.root();
        let body = self.parse_compound()?;
        self.expect(TokenKind::Period)?;
        if !self.check(TokenKind::EndOfFile) {
            return Err(self.syntax_error(TokenKind::EndOfFile));
        }

        let body = std::mem::take(&mut self.prologue).then(body);
        let main = self.tac.program_unit(program, body);
        self.units.append(main);
        Ok((name.lexeme, program))
    }

    /// `uses a, b;` binds each library name in the root scope.
    fn parse_uses(&mut self) -> Result<(), CompileError> {
        self.expect(TokenKind::Uses)?;
        let root = self.table.root();
        loop {
            let name = self.expect_identifier()?;
            let symbol = Symbol::new(
                name.lexeme.clone(),
                DeclKind::Const,
                Some(ValueType::String),
                name.location,
            )
            .with_literal(Literal::Str(name.lexeme.clone()));
            let id = self.table.alloc(symbol);

            if !matches!(self.table.lookup_insert(root, id), LookupInsert::Inserted(_)) {
                return Err(CompileError::DuplicateLibrary {
                    name: name.lexeme,
                    location: name.location,
                });
            }

            if !self.match_token(TokenKind::Comma)? {
                break;
            }
        }
        self.expect(TokenKind::Semicolon)?;
        Ok(())
    }

    // ===== Helper methods =====

    /// Move to the next token, returning the one just consumed.
    pub(crate) fn advance(&mut self) -> Result<Token, CompileError> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    pub(crate) fn match_token(&mut self, kind: TokenKind) -> Result<bool, CompileError> {
        if self.check(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) -> Result<Token, CompileError> {
        if self.check(kind) {
            self.advance()
        } else {
            Err(self.syntax_error(kind))
        }
    }

    pub(crate) fn expect_identifier(&mut self) -> Result<Token, CompileError> {
        self.expect(TokenKind::Identifier)
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.current.location
    }

    /// Error for an unexpected current token.
    pub(crate) fn syntax_error(&self, expected: impl ToString) -> CompileError {
        CompileError::Syntax {
            expected: expected.to_string(),
            found: self.current.to_string(),
            location: self.current.location,
        }
    }
}

/// Compile in-memory source text.
pub fn compile_source(
    source: &str,
    options: &CompileOptions,
) -> Result<CompiledProgram, CompileError> {
    let lexer = Lexer::new(source).with_trace(options.trace_tokens);
    Parser::new(lexer)?.run()
}

/// Compile the source file at `path`.
pub fn compile_file(
    path: impl AsRef<Path>,
    options: &CompileOptions,
) -> Result<CompiledProgram, CompileError> {
    let lexer = Lexer::open(path)?.with_trace(options.trace_tokens);
    Parser::new(lexer)?.run()
}

/// Compile `path`, hand the result to the backend and report success.
/// The diagnostic of a failed compilation is written to stderr.
pub fn parse(path: impl AsRef<Path>) -> bool {
    match compile_file(path, &CompileOptions::default()) {
        Ok(program) => {
            backend::generate(&program);
            true
        }
        Err(err) => {
            eprintln!("{}", err);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tac::TacOp;

    fn compile(source: &str) -> Result<CompiledProgram, CompileError> {
        compile_source(source, &CompileOptions::default())
    }

    #[test]
    fn test_minimal_program() {
        let program = compile("program Empty; begin end.").unwrap();
        assert_eq!(program.name, "empty");
        let ops: Vec<TacOp> = program.instructions.iter().map(|i| i.op).collect();
        assert_eq!(ops, vec![TacOp::BeginProc, TacOp::ArgList, TacOp::EndProc]);
    }

    #[test]
    fn test_header_parameters_ignored() {
        assert!(compile("program p(input, output); begin end.").is_ok());
    }

    #[test]
    fn test_uses_clause() {
        let program = compile("program p; uses crt, dos; begin end.").unwrap();
        let crt = program.symbols.lookup(program.root(), "crt").unwrap();
        assert_eq!(program.symbols.symbol(crt).kind, DeclKind::Const);
        assert_eq!(program.symbols.symbol(crt).value_type, Some(ValueType::String));
    }

    #[test]
    fn test_duplicate_library() {
        let err = compile("program p; uses crt, crt; begin end.").unwrap_err();
        assert!(matches!(err, CompileError::DuplicateLibrary { .. }));
    }

    #[test]
    fn test_missing_period() {
        let err = compile("program p; begin end").unwrap_err();
        match err {
            CompileError::Syntax { expected, found, .. } => {
                assert_eq!(expected, ".");
                assert_eq!(found, "eof");
            }
            other => panic!("Expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        let err = compile("program p; begin end. x").unwrap_err();
        assert!(matches!(err, CompileError::Syntax { expected, .. } if expected == "eof"));
    }

    #[test]
    fn test_bad_section_keyword() {
        let err = compile("program p; x: integer; begin end.").unwrap_err();
        assert!(matches!(err, CompileError::Syntax { expected, .. } if expected == "begin"));
    }

    #[test]
    fn test_lexical_error_propagates() {
        let err = compile("program p; var x: string; begin x := 'abc end.").unwrap_err();
        assert!(matches!(err, CompileError::Lex { .. }));
    }
}
