//! Declaration parsing implementation
//!
//! This module handles the declarative sections of a program:
//!
//! - Constants: `const max = 10; greeting = 'hi';`
//! - Variables: `var a, b: integer; limit: real = 2.5;`
//! - Functions and procedures, including their parameter lists
//!
//! # Grammar
//!
//! ```text
//! const_section ::= "const" id "=" signed_literal ";" { id "=" signed_literal ";" }
//! var_section   ::= "var" var_decl { var_decl }
//! var_decl      ::= id { "," id } ":" type [ "=" signed_literal ] ";"
//! function      ::= "function" id [ params ] ":" type ";" locals compound ";"
//! procedure     ::= "procedure" id [ params ] ";" locals compound ";"
//! params        ::= "(" [ param_group { ";" param_group } ] ")"
//! param_group   ::= [ "var" ] id { "," id } ":" type
//! locals        ::= { const_section | var_section }
//! ```
//!
//! Callables are bound in the root scope under their mangled name; a copy
//! under the plain name goes into the body scope so the body can refer to
//! itself (and, for functions, assign its result).

use crate::errors::CompileError;
use crate::parser::lexer::{SourceLocation, Token, TokenKind};
use crate::parser::parse::Parser;
use crate::symbols::{
    mangle_name, DeclKind, Literal, LookupInsert, Param, Symbol, SymbolId, ValueType,
};
use crate::tac::{Instruction, TacChain};

impl Parser {
    pub(crate) fn parse_const_section(&mut self) -> Result<(), CompileError> {
        self.expect(TokenKind::Const)?;
        if !self.check(TokenKind::Identifier) {
            return Err(self.syntax_error(TokenKind::Identifier));
        }

        while self.check(TokenKind::Identifier) {
            let name = self.advance()?;
            self.expect(TokenKind::Eq)?;
            let (literal, _) = self.parse_signed_literal()?;
            self.expect(TokenKind::Semicolon)?;
            self.check_callable_clash(&name)?;

            let symbol = Symbol::new(
                name.lexeme.clone(),
                DeclKind::Const,
                Some(literal.value_type()),
                name.location,
            )
            .with_literal(literal);
            let id = self.table.alloc(symbol);

            if !matches!(self.table.lookup_insert(self.scope, id), LookupInsert::Inserted(_)) {
                return Err(CompileError::DuplicateConstant {
                    name: name.lexeme,
                    location: name.location,
                });
            }
        }
        Ok(())
    }

    pub(crate) fn parse_var_section(&mut self) -> Result<(), CompileError> {
        self.expect(TokenKind::Var)?;
        if !self.check(TokenKind::Identifier) {
            return Err(self.syntax_error(TokenKind::Identifier));
        }

        while self.check(TokenKind::Identifier) {
            self.parse_var_declaration()?;
        }
        Ok(())
    }

    fn parse_var_declaration(&mut self) -> Result<(), CompileError> {
        let mut names = vec![self.expect_identifier()?];
        while self.match_token(TokenKind::Comma)? {
            names.push(self.expect_identifier()?);
        }
        self.expect(TokenKind::Colon)?;
        let value_type = self.parse_type()?;

        let initializer = if self.check(TokenKind::Eq) {
            if names.len() > 1 {
                return Err(CompileError::MultipleInitializers {
                    location: self.current_location(),
                });
            }
            self.advance()?;
            let (literal, location) = self.parse_signed_literal()?;
            Some(Self::coerce_initializer(value_type, literal, location)?)
        } else {
            None
        };
        self.expect(TokenKind::Semicolon)?;

        let mut first = None;
        for name in names {
            let symbol = Symbol::new(
                name.lexeme.clone(),
                DeclKind::Var,
                Some(value_type),
                name.location,
            );
            let id = self.table.alloc(symbol);
            self.declare_variable(id, &name)?;
            first.get_or_insert(id);
        }

        if let (Some(id), Some((literal, location))) = (first, initializer) {
            self.table.symbol_mut(id).literal = Some(literal.clone());
            let value = self.tac.literal(&mut self.table, literal, location);
            self.prologue.push(Instruction::copy(id, value.result));
        }
        Ok(())
    }

    /// Callables live in the root scope under their mangled names, so a
    /// root-level constant or variable must not reuse a callable's base name.
    fn check_callable_clash(&self, name: &Token) -> Result<(), CompileError> {
        if self.scope == self.table.root() && self.callables.contains(&name.lexeme) {
            return Err(CompileError::DuplicateIdentifier {
                name: name.lexeme.clone(),
                location: name.location,
            });
        }
        Ok(())
    }

    /// Bind a variable in the current scope. Only a parameter may be
    /// re-declared.
    fn declare_variable(&mut self, id: SymbolId, name: &Token) -> Result<(), CompileError> {
        self.check_callable_clash(name)?;
        match self.table.lookup_insert(self.scope, id) {
            LookupInsert::Inserted(_) => Ok(()),
            LookupInsert::Replaced { previous, .. }
                if self.table.symbol(previous).kind == DeclKind::Param =>
            {
                Ok(())
            }
            LookupInsert::Replaced { .. } => Err(CompileError::DuplicateIdentifier {
                name: name.lexeme.clone(),
                location: name.location,
            }),
            LookupInsert::DuplicateConst(_) => Err(CompileError::DuplicateConstant {
                name: name.lexeme.clone(),
                location: name.location,
            }),
        }
    }

    /// Check an initializer against the declared type, widening where the
    /// declared type accepts a narrower literal.
    fn coerce_initializer(
        value_type: ValueType,
        literal: Literal,
        location: SourceLocation,
    ) -> Result<(Literal, SourceLocation), CompileError> {
        let found = literal.value_type();
        if !value_type.accepts(found) {
            return Err(CompileError::TypeMismatch {
                expected: value_type,
                found,
                location,
            });
        }

        let literal = match (value_type, literal) {
            (ValueType::Real, Literal::Int(i)) => Literal::Real(i as f64),
            (ValueType::String, Literal::Char(c)) => Literal::Str(c.to_string()),
            (_, literal) => literal,
        };
        Ok((literal, location))
    }

    /// A literal value with an optional sign on numbers.
    pub(crate) fn parse_signed_literal(
        &mut self,
    ) -> Result<(Literal, SourceLocation), CompileError> {
        let location = self.current_location();
        let sign = match self.current.kind {
            TokenKind::Minus | TokenKind::Plus => Some(self.advance()?.kind),
            _ => None,
        };
        let negative = sign == Some(TokenKind::Minus);

        if sign.is_some()
            && !matches!(
                self.current.kind,
                TokenKind::IntLiteral | TokenKind::RealLiteral
            )
        {
            return Err(self.syntax_error("number"));
        }
        if !self.current.kind.is_value() {
            return Err(self.syntax_error("value"));
        }

        let token = self.advance()?;
        let literal = Literal::from_token(token.kind, &token.lexeme).ok_or_else(|| {
            CompileError::Lex {
                message: format!("malformed literal {}", token.lexeme),
                location: token.location,
            }
        })?;

        let literal = match literal {
            Literal::Int(i) if negative => Literal::Int(i.wrapping_neg()),
            Literal::Real(r) if negative => Literal::Real(-r),
            literal => literal,
        };
        Ok((literal, location))
    }

    pub(crate) fn parse_type(&mut self) -> Result<ValueType, CompileError> {
        match ValueType::of_type_keyword(self.current.kind) {
            Some(value_type) => {
                self.advance()?;
                Ok(value_type)
            }
            None => Err(self.syntax_error("variable type")),
        }
    }

    /// Parse a function or procedure declaration and emit its unit.
    pub(crate) fn parse_callable(&mut self, kind: DeclKind) -> Result<(), CompileError> {
        self.advance()?; // function / procedure
        let name = self.expect_identifier()?;
        let root = self.table.root();

        if self.table.lookup(root, &name.lexeme).is_some() {
            return Err(CompileError::NotCallable {
                name: name.lexeme,
                location: name.location,
            });
        }

        let outer = self.scope;
        self.scope = self.table.new_scope(Some(outer));

        let params = if self.match_token(TokenKind::LParen)? {
            self.parse_parameter_list()?
        } else {
            Vec::new()
        };
        let param_types: Vec<ValueType> = params
            .iter()
            .filter_map(|param| self.table.symbol(param.symbol).value_type)
            .collect();

        let return_type = if kind == DeclKind::Function {
            self.expect(TokenKind::Colon)?;
            Some(self.parse_type()?)
        } else {
            None
        };

        let mangled = mangle_name(&name.lexeme, &param_types);
        if self.table.lookup(root, &mangled).is_some() {
            return Err(CompileError::DuplicateOverload {
                name: name.lexeme,
                location: name.location,
            });
        }
        let callable = self.table.alloc(
            Symbol::new(mangled, kind, return_type, name.location).with_params(params.clone()),
        );
        self.table.insert(root, callable);
        self.callables.insert(name.lexeme.clone());

        let own = self.table.alloc(
            Symbol::new(name.lexeme.clone(), kind, return_type, name.location).with_params(params),
        );
        self.table.insert(self.scope, own);

        self.expect(TokenKind::Semicolon)?;

        let saved_enclosing = std::mem::replace(
            &mut self.enclosing,
            (kind == DeclKind::Function).then_some(own),
        );
        let saved_prologue = std::mem::take(&mut self.prologue);

        let body = self.parse_callable_body();

        let prologue = std::mem::replace(&mut self.prologue, saved_prologue);
        self.enclosing = saved_enclosing;
        self.scope = outer;

        let body = prologue.then(body?);
        let unit = self.tac.procedure_unit(callable, body);
        self.units.append(unit);
        Ok(())
    }

    fn parse_callable_body(&mut self) -> Result<TacChain, CompileError> {
        loop {
            match self.current.kind {
                TokenKind::Const => self.parse_const_section()?,
                TokenKind::Var => self.parse_var_section()?,
                _ => break,
            }
        }
        let body = self.parse_compound()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(body)
    }

    /// Parameter groups up to and including the closing parenthesis. Each
    /// parameter is bound in the (already current) body scope.
    fn parse_parameter_list(&mut self) -> Result<Vec<Param>, CompileError> {
        let mut params = Vec::new();
        if self.match_token(TokenKind::RParen)? {
            return Ok(params);
        }

        loop {
            let by_ref = self.match_token(TokenKind::Var)?;
            let mut group = vec![self.expect_identifier()?];
            while self.match_token(TokenKind::Comma)? {
                group.push(self.expect_identifier()?);
            }
            self.expect(TokenKind::Colon)?;
            let value_type = self.parse_type()?;

            for name in group {
                let symbol = Symbol::new(
                    name.lexeme.clone(),
                    DeclKind::Param,
                    Some(value_type),
                    name.location,
                );
                let id = self.table.alloc(symbol);
                if !matches!(self.table.lookup_insert(self.scope, id), LookupInsert::Inserted(_)) {
                    return Err(CompileError::DuplicateParameter {
                        name: name.lexeme,
                        location: name.location,
                    });
                }
                params.push(Param { symbol: id, by_ref });
            }

            if !self.match_token(TokenKind::Semicolon)? {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::CompileOptions;
    use crate::errors::CompileError;
    use crate::parser::parse::{compile_source, CompiledProgram};
    use crate::symbols::{DeclKind, Literal, ValueType};

    fn compile(source: &str) -> Result<CompiledProgram, CompileError> {
        compile_source(source, &CompileOptions::default())
    }

    #[test]
    fn test_constants() {
        let program =
            compile("program p; const max = 10; pi = 3.14; greet = 'hi'; begin end.").unwrap();
        let root = program.root();
        let max = program.symbols.lookup(root, "max").unwrap();
        let pi = program.symbols.lookup(root, "pi").unwrap();
        let greet = program.symbols.lookup(root, "greet").unwrap();
        assert_eq!(program.symbols.symbol(max).literal, Some(Literal::Int(10)));
        assert_eq!(program.symbols.symbol(pi).value_type, Some(ValueType::Real));
        assert_eq!(program.symbols.symbol(greet).value_type, Some(ValueType::String));
    }

    #[test]
    fn test_negative_constant() {
        let program = compile("program p; const low = -5; begin end.").unwrap();
        let low = program.symbols.lookup(program.root(), "low").unwrap();
        assert_eq!(program.symbols.symbol(low).literal, Some(Literal::Int(-5)));
    }

    #[test]
    fn test_duplicate_constant() {
        let err = compile("program p; const c = 1; const c = 2; begin end.").unwrap_err();
        assert!(matches!(err, CompileError::DuplicateConstant { name, .. } if name == "c"));
    }

    #[test]
    fn test_var_over_constant() {
        let err = compile("program p; const c = 1; var c: integer; begin end.").unwrap_err();
        assert!(matches!(err, CompileError::DuplicateConstant { .. }));
    }

    #[test]
    fn test_var_list_shares_type() {
        let program = compile("program p; var a, b, c: real; begin end.").unwrap();
        for name in ["a", "b", "c"] {
            let id = program.symbols.lookup(program.root(), name).unwrap();
            assert_eq!(program.symbols.symbol(id).value_type, Some(ValueType::Real));
            assert_eq!(program.symbols.symbol(id).kind, DeclKind::Var);
        }
    }

    #[test]
    fn test_var_initializer() {
        let program = compile("program p; var r: real = 2; begin end.").unwrap();
        let r = program.symbols.lookup(program.root(), "r").unwrap();
        assert_eq!(program.symbols.symbol(r).literal, Some(Literal::Real(2.0)));
        assert_eq!(
            program.listing(),
            vec!["beginproc p", "arglist p", "cpy r, 2.0", "endproc p"]
        );
    }

    #[test]
    fn test_initializer_type_mismatch() {
        let err = compile("program p; var n: integer = 'x'; begin end.").unwrap_err();
        assert!(matches!(
            err,
            CompileError::TypeMismatch {
                expected: ValueType::Integer,
                found: ValueType::Char,
                ..
            }
        ));
    }

    #[test]
    fn test_multiple_initializers() {
        let err = compile("program p; var a, b: integer = 1; begin end.").unwrap_err();
        assert!(matches!(err, CompileError::MultipleInitializers { .. }));
    }

    #[test]
    fn test_duplicate_variable() {
        let err = compile("program p; var a: integer; a: real; begin end.").unwrap_err();
        assert!(matches!(err, CompileError::DuplicateIdentifier { name, .. } if name == "a"));
    }

    #[test]
    fn test_local_redeclares_parameter() {
        let source = "program p;
            procedure show(n: integer);
            var n: integer;
            begin write(n) end;
            begin end.";
        assert!(compile(source).is_ok());
    }

    #[test]
    fn test_duplicate_parameter() {
        let err = compile(
            "program p; procedure q(a: integer; a: real); begin end; begin end.",
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::DuplicateParameter { .. }));
    }

    #[test]
    fn test_callable_mangling_and_params() {
        let source = "program p;
            procedure swap(var a, b: integer; c: real);
            begin end;
            function zero: integer;
            begin zero := 0 end;
            begin end.";
        let program = compile(source).unwrap();
        let root = program.root();

        let swap = program.symbols.lookup(root, "swap$_i_i_r").unwrap();
        let swap = program.symbols.symbol(swap);
        assert_eq!(swap.kind, DeclKind::Procedure);
        assert_eq!(swap.dimension, 3);
        let refs: Vec<bool> = swap.params.iter().map(|p| p.by_ref).collect();
        assert_eq!(refs, vec![true, true, false]);

        let zero = program.symbols.lookup(root, "zero$_v").unwrap();
        assert_eq!(program.symbols.symbol(zero).value_type, Some(ValueType::Integer));
        assert!(program.symbols.lookup(root, "zero").is_none());
    }

    #[test]
    fn test_underscore_names_are_distinct_overloads() {
        let source = "program p;
            procedure f_i(a: integer); begin end;
            procedure f(a, b: integer); begin end;
            begin f_i(1); f(1, 2) end.";
        let program = compile(source).unwrap();
        let root = program.root();
        assert!(program.symbols.lookup(root, "f_i$_i").is_some());
        assert!(program.symbols.lookup(root, "f$_i_i").is_some());
    }

    #[test]
    fn test_callable_name_clashes_with_variable() {
        let err =
            compile("program p; var f: integer; procedure f; begin end; begin end.").unwrap_err();
        assert!(matches!(err, CompileError::NotCallable { name, .. } if name == "f"));
    }

    #[test]
    fn test_variable_clashes_with_earlier_function() {
        let source = "program p;
            function f: integer; begin f := 1 end;
            var f: integer;
            begin f := 2 end.";
        let err = compile(source).unwrap_err();
        assert!(matches!(
            err,
            CompileError::DuplicateIdentifier { name, location }
                if name == "f" && location.line == 3
        ));
    }

    #[test]
    fn test_constant_clashes_with_earlier_procedure() {
        let source = "program p; procedure q(a: integer); begin end; const q = 1; begin end.";
        let err = compile(source).unwrap_err();
        assert!(matches!(err, CompileError::DuplicateIdentifier { name, .. } if name == "q"));
    }

    #[test]
    fn test_local_may_shadow_other_callable() {
        let source = "program p;
            procedure q; begin end;
            procedure r;
            var q: integer;
            begin q := 1 end;
            begin q() end.";
        assert!(compile(source).is_ok());
    }

    #[test]
    fn test_locals_do_not_leak() {
        let source = "program p;
            procedure q;
            var local: integer;
            begin local := 1 end;
            begin local := 2 end.";
        let err = compile(source).unwrap_err();
        assert!(matches!(err, CompileError::UndeclaredIdentifier { name, .. } if name == "local"));
    }

    #[test]
    fn test_sections_in_any_order() {
        let source = "program p;
            var a: integer;
            procedure q; begin end;
            const k = 1;
            var b: integer;
            begin a := k; b := a end.";
        assert!(compile(source).is_ok());
    }
}
