//! Statement parsing implementation
//!
//! This module handles parsing of all statement types:
//!
//! - Compound statements: `begin ... end`
//! - Assignments: `x := expr`, including a function's result `f := expr`
//! - Procedure and function calls: `p(a, b)`
//! - Control flow: `if`, `while`, `for ... to | downto`
//! - I/O: `write`, `writeln`, `read`
//!
//! # Grammar
//!
//! ```text
//! compound  ::= "begin" [ statement { ";" statement } [ ";" ] ] "end"
//! statement ::= id ":=" expression | id "(" [ args ] ")" | compound
//!             | "if" condition "then" statement [ "else" statement ]
//!             | "while" condition "do" statement
//!             | "for" id ":=" expression ("to" | "downto") expression "do" statement
//!             | ("write" | "writeln") [ "(" expression { "," expression } ")" ]
//!             | "read" "(" id { "," id } ")"
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct
//! and return the instruction chain of the statement.

use crate::errors::CompileError;
use crate::parser::lexer::{Token, TokenKind};
use crate::parser::parse::Parser;
use crate::symbols::{DeclKind, SymbolId, ValueType};
use crate::tac::TacChain;

impl Parser {
    /// Parse `begin ... end`. The last statement may omit its semicolon.
    pub(crate) fn parse_compound(&mut self) -> Result<TacChain, CompileError> {
        self.expect(TokenKind::Begin)?;
        let mut code = TacChain::new();

        while !self.check(TokenKind::End) {
            code.append(self.parse_statement()?);
            if !self.match_token(TokenKind::Semicolon)? && !self.check(TokenKind::End) {
                return Err(self.syntax_error(TokenKind::Semicolon));
            }
        }

        self.expect(TokenKind::End)?;
        Ok(code)
    }

    pub(crate) fn parse_statement(&mut self) -> Result<TacChain, CompileError> {
        match self.current.kind {
            TokenKind::Identifier => {
                let name = self.advance()?;
                match self.current.kind {
                    TokenKind::Assign => self.parse_assignment(name),
                    TokenKind::LParen => {
                        let call = self.function_call_check(&name, None, false)?;
                        Ok(self.tac.call_statement(call.callee, call.args))
                    }
                    _ => Err(self.syntax_error(TokenKind::Assign)),
                }
            }
            TokenKind::Begin => self.parse_compound(),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Write | TokenKind::Writeln => self.parse_write_statement(),
            TokenKind::Read => self.parse_read_statement(),
            _ => Err(CompileError::IllegalStatement {
                found: self.current.to_string(),
                location: self.current.location,
            }),
        }
    }

    fn parse_assignment(&mut self, name: Token) -> Result<TacChain, CompileError> {
        let (target, target_type) = self.resolve_assign_target(&name)?;
        self.expect(TokenKind::Assign)?;
        let value = self.parse_expression(Some(target_type))?;
        Ok(self.tac.assign(target, value))
    }

    /// Resolve a name that is about to be written.
    ///
    /// Variables and parameters are writable. Inside a function its own
    /// unmangled name is the result variable.
    pub(crate) fn resolve_assign_target(
        &self,
        name: &Token,
    ) -> Result<(SymbolId, ValueType), CompileError> {
        let id = self.resolve(name)?;
        let symbol = self.table.symbol(id);

        let writable = match symbol.kind {
            DeclKind::Const => {
                return Err(CompileError::AssignToConstant {
                    name: name.lexeme.clone(),
                    location: name.location,
                })
            }
            DeclKind::Var | DeclKind::Param => true,
            DeclKind::Function => self.enclosing == Some(id),
            DeclKind::Procedure => false,
        };

        match symbol.value_type {
            Some(value_type) if writable => Ok((id, value_type)),
            _ => Err(CompileError::NotAVariable {
                name: name.lexeme.clone(),
                location: name.location,
            }),
        }
    }

    fn parse_if_statement(&mut self) -> Result<TacChain, CompileError> {
        self.expect(TokenKind::If)?;
        let condition = self.parse_condition()?;
        self.expect(TokenKind::Then)?;
        let then_branch = self.parse_statement()?;

        if self.match_token(TokenKind::Else)? {
            let else_branch = self.parse_statement()?;
            Ok(self.tac.if_then_else(condition, then_branch, else_branch))
        } else {
            Ok(self.tac.if_then(condition, then_branch))
        }
    }

    fn parse_while_statement(&mut self) -> Result<TacChain, CompileError> {
        self.expect(TokenKind::While)?;
        let condition = self.parse_condition()?;
        self.expect(TokenKind::Do)?;
        let body = self.parse_statement()?;
        Ok(self.tac.while_loop(condition, body))
    }

    fn parse_for_statement(&mut self) -> Result<TacChain, CompileError> {
        self.expect(TokenKind::For)?;
        let name = self.expect_identifier()?;
        let (variable, value_type) = self.resolve_assign_target(&name)?;

        self.expect(TokenKind::Assign)?;
        let start = self.parse_expression(Some(value_type))?;
        let descending = match self.current.kind {
            TokenKind::To => false,
            TokenKind::Downto => true,
            _ => return Err(self.syntax_error(TokenKind::To)),
        };
        self.advance()?;
        let bound = self.parse_expression(Some(value_type))?;
        self.expect(TokenKind::Do)?;
        let body = self.parse_statement()?;

        Ok(self
            .tac
            .for_loop(&mut self.table, variable, start, bound, descending, body))
    }

    fn parse_write_statement(&mut self) -> Result<TacChain, CompileError> {
        let keyword = self.advance()?;
        let mut code = TacChain::new();

        if self.match_token(TokenKind::LParen)? {
            loop {
                let value = self.parse_expression(None)?;
                code.append(self.tac.print(value));
                if !self.match_token(TokenKind::Comma)? {
                    break;
                }
            }
            self.expect(TokenKind::RParen)?;
        }

        if keyword.kind == TokenKind::Writeln {
            code.append(self.tac.print_newline(&mut self.table, keyword.location));
        }
        Ok(code)
    }

    fn parse_read_statement(&mut self) -> Result<TacChain, CompileError> {
        self.expect(TokenKind::Read)?;
        self.expect(TokenKind::LParen)?;
        let mut code = TacChain::new();

        loop {
            let name = self.expect_identifier()?;
            let (target, _) = self.resolve_assign_target(&name)?;
            code.append(self.tac.read(target));
            if !self.match_token(TokenKind::Comma)? {
                break;
            }
        }

        self.expect(TokenKind::RParen)?;
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::CompileOptions;
    use crate::errors::CompileError;
    use crate::parser::lexer::SourceLocation;
    use crate::parser::parse::{compile_source, CompiledProgram};
    use crate::symbols::ValueType;
    use crate::tac::TacOp;

    fn compile(source: &str) -> Result<CompiledProgram, CompileError> {
        compile_source(source, &CompileOptions::default())
    }

    fn body(program: &CompiledProgram) -> Vec<String> {
        let listing = program.listing();
        listing[2..listing.len() - 1].to_vec()
    }

    #[test]
    fn test_assignment_and_write() {
        let program =
            compile("program P; var x: integer; begin x := 2 + 3; write(x); end.").unwrap();
        assert_eq!(body(&program), vec!["cpy x, 5", "print x"]);
    }

    #[test]
    fn test_optional_final_semicolon() {
        assert!(compile("program p; var x: integer; begin x := 1 end.").is_ok());
        assert!(compile("program p; var x: integer; begin x := 1; end.").is_ok());
    }

    #[test]
    fn test_missing_semicolon() {
        let err = compile("program p; var x: integer; begin x := 1 x := 2 end.").unwrap_err();
        assert!(matches!(err, CompileError::Syntax { expected, .. } if expected == ";"));
    }

    #[test]
    fn test_undeclared_target_location() {
        let err = compile("program P; var x: integer; begin y := 1; end.").unwrap_err();
        match err {
            CompileError::UndeclaredIdentifier { name, location } => {
                assert_eq!(name, "y");
                assert_eq!(location, SourceLocation::new(1, 34));
            }
            other => panic!("Expected undeclared identifier, got {:?}", other),
        }
    }

    #[test]
    fn test_assign_to_constant() {
        let err = compile("program p; const c = 5; begin c := 6; end.").unwrap_err();
        assert!(matches!(err, CompileError::AssignToConstant { name, .. } if name == "c"));
    }

    #[test]
    fn test_assign_to_procedure() {
        let source = "program p;
            procedure q; begin q := 1 end;
            begin end.";
        let err = compile(source).unwrap_err();
        assert!(matches!(err, CompileError::NotAVariable { name, .. } if name == "q"));
    }

    #[test]
    fn test_function_result_is_local() {
        let source = "program p;
            function f: integer; begin f := 1 end;
            begin f := 2 end.";
        let err = compile(source).unwrap_err();
        assert!(matches!(err, CompileError::UndeclaredIdentifier { name, .. } if name == "f"));
    }

    #[test]
    fn test_illegal_statement() {
        let err = compile("program p; begin then end.").unwrap_err();
        assert!(matches!(err, CompileError::IllegalStatement { found, .. } if found == "then"));
    }

    #[test]
    fn test_identifier_without_assignment() {
        let err = compile("program p; var x: integer; begin x end.").unwrap_err();
        assert!(matches!(err, CompileError::Syntax { expected, .. } if expected == ":="));
    }

    #[test]
    fn test_if_else() {
        let source = "program p; var x: integer; begin if x > 0 then x := 1 else x := 2 end.";
        let program = compile(source).unwrap();
        assert_eq!(
            body(&program),
            vec![
                "var _t0",
                "gt _t0, x, 0",
                "ifz L0, _t0",
                "cpy x, 1",
                "goto L1",
                "label L0",
                "cpy x, 2",
                "label L1"
            ]
        );
    }

    #[test]
    fn test_while_loop() {
        let source = "program p; var x: integer; begin while x < 10 do x := x + 1 end.";
        let program = compile(source).unwrap();
        assert_eq!(
            body(&program),
            vec![
                "label L0",
                "var _t0",
                "lt _t0, x, 10",
                "ifz L1, _t0",
                "var _t1",
                "add _t1, x, 1",
                "cpy x, _t1",
                "goto L0",
                "label L1"
            ]
        );
    }

    #[test]
    fn test_for_downto() {
        let source = "program p; var i: integer; begin for i := 10 downto 1 do write(i) end.";
        let program = compile(source).unwrap();
        assert_eq!(
            body(&program),
            vec![
                "cpy i, 10",
                "label L0",
                "var _t0",
                "gte _t0, i, 1",
                "ifz L1, _t0",
                "print i",
                "sub i, i, 1",
                "goto L0",
                "label L1"
            ]
        );
    }

    #[test]
    fn test_for_real_variable() {
        let program =
            compile("program p; var r: real; begin for r := 1 to 2 do write(r) end.").unwrap();
        assert_eq!(
            body(&program),
            vec![
                "cpy r, 1",
                "label L0",
                "var _t0",
                "lte _t0, r, 2",
                "ifz L1, _t0",
                "print r",
                "add r, r, 1",
                "goto L0",
                "label L1"
            ]
        );
    }

    #[test]
    fn test_for_char_variable() {
        let program =
            compile("program p; var c: char; begin for c := 'a' to 'z' do write(c) end.").unwrap();
        let listing = body(&program);
        assert_eq!(listing[0], "cpy c, 'a'");
        assert_eq!(listing[3], "lte _t0, c, 'z'");
    }

    #[test]
    fn test_for_bound_checked_against_variable() {
        let err = compile(
            "program p; var c: char; begin for c := 'a' to 3 do write(c) end.",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CompileError::TypeMismatch {
                expected: ValueType::Char,
                found: ValueType::Integer,
                ..
            }
        ));
    }

    #[test]
    fn test_for_missing_direction() {
        let err =
            compile("program p; var i: integer; begin for i := 1 do write(i) end.").unwrap_err();
        assert!(matches!(err, CompileError::Syntax { expected, .. } if expected == "to"));
    }

    #[test]
    fn test_writeln_appends_newline() {
        let program = compile("program p; begin writeln('hi', 3); writeln end.").unwrap();
        let ops: Vec<TacOp> = program.instructions.iter().map(|i| i.op).collect();
        assert_eq!(ops.iter().filter(|op| **op == TacOp::Print).count(), 4);
        assert_eq!(body(&program)[0], "print 'hi'");
    }

    #[test]
    fn test_read_targets() {
        let program = compile("program p; var a, b: integer; begin read(a, b) end.").unwrap();
        assert_eq!(body(&program), vec!["read a", "read b"]);

        let err = compile("program p; const k = 1; begin read(k) end.").unwrap_err();
        assert!(matches!(err, CompileError::AssignToConstant { .. }));
    }

    #[test]
    fn test_procedure_call_statement() {
        let source = "program p;
            var k: integer;
            procedure show(n: integer); begin write(n) end;
            begin show(k); show(4) end.";
        let program = compile(source).unwrap();
        let listing = program.listing();
        assert!(listing.contains(&"param k".to_string()));
        assert!(listing.contains(&"param 4".to_string()));
        assert_eq!(
            listing.iter().filter(|line| *line == "call show$_i").count(),
            2
        );
    }

    #[test]
    fn test_nested_compound() {
        let source = "program p; var x: integer; begin begin x := 1; begin x := 2 end end end.";
        let program = compile(source).unwrap();
        assert_eq!(body(&program), vec!["cpy x, 1", "cpy x, 2"]);
    }
}
