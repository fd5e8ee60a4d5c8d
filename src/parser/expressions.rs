//! Expression parsing implementation
//!
//! This module handles expressions, conditions and call resolution:
//!
//! - Arithmetic and logical expressions with Pascal precedence
//! - Conditions: a single comparison or parenthesized comparisons joined
//!   by `and` / `or`, each optionally negated with `not`
//! - Calls: overloads are resolved by mangling the argument types
//!
//! # Grammar
//!
//! ```text
//! expression ::= term { ("+" | "-" | "or") term }
//! term       ::= factor { ("*" | "/" | "div" | "mod" | "and") factor }
//! factor     ::= ("+" | "-" | "not") factor
//!              | literal | id | id "(" [ expression { "," expression } ] ")"
//!              | "(" expression ")"
//! condition  ::= comparison | group { ("and" | "or") group }
//! group      ::= [ "not" ] "(" comparison ")"
//! comparison ::= expression ("=" | "<>" | "<" | "<=" | ">" | ">=") expression
//! ```
//!
//! Every operand is checked against the type expected by the context
//! (assignment target, loop variable); `None` means any type is accepted.

use crate::errors::CompileError;
use crate::parser::lexer::{Token, TokenKind};
use crate::parser::parse::Parser;
use crate::symbols::{mangle_name, DeclKind, Literal, SymbolId, ValueType};
use crate::tac::{ExprNode, TacOp};

/// Whether `actual` may be used where `expected` is required.
pub fn type_check(expected: Option<ValueType>, actual: ValueType) -> bool {
    match expected {
        None => true,
        Some(expected) => expected.accepts(actual),
    }
}

/// A resolved call: the callee and its evaluated arguments
pub(crate) struct CallSite {
    pub callee: SymbolId,
    pub args: Vec<ExprNode>,
}

impl Parser {
    pub(crate) fn parse_expression(
        &mut self,
        expected: Option<ValueType>,
    ) -> Result<ExprNode, CompileError> {
        let mut lhs = self.parse_term(expected)?;

        loop {
            let op = match self.current.kind {
                TokenKind::Plus => TacOp::Add,
                TokenKind::Minus => TacOp::Sub,
                TokenKind::Or => TacOp::Or,
                _ => break,
            };
            let operator = self.advance()?;
            let rhs = self.parse_term(expected)?;
            lhs = self.combine(&operator, op, lhs, rhs)?;
        }

        Ok(lhs)
    }

    fn parse_term(&mut self, expected: Option<ValueType>) -> Result<ExprNode, CompileError> {
        let mut lhs = self.parse_factor(expected)?;

        loop {
            let op = match self.current.kind {
                TokenKind::Star => TacOp::Mult,
                TokenKind::Slash | TokenKind::Div => TacOp::Div,
                TokenKind::Mod => TacOp::Mod,
                TokenKind::And => TacOp::And,
                _ => break,
            };
            let operator = self.advance()?;
            let rhs = self.parse_factor(expected)?;
            lhs = self.combine(&operator, op, lhs, rhs)?;
        }

        Ok(lhs)
    }

    fn parse_factor(&mut self, expected: Option<ValueType>) -> Result<ExprNode, CompileError> {
        match self.current.kind {
            TokenKind::Plus | TokenKind::Minus | TokenKind::Not => {
                let operator = self.advance()?;
                let operand = self.parse_factor(expected)?;
                self.negate(&operator, operand)
            }
            kind if kind.is_value() => {
                let token = self.advance()?;
                let literal = Literal::from_token(token.kind, &token.lexeme).ok_or_else(|| {
                    CompileError::Lex {
                        message: format!("malformed literal {}", token.lexeme),
                        location: token.location,
                    }
                })?;
                let found = literal.value_type();
                if !type_check(expected, found) {
                    return Err(Self::mismatch(expected, found, &token));
                }
                Ok(self.tac.literal(&mut self.table, literal, token.location))
            }
            TokenKind::Identifier => {
                let name = self.advance()?;
                if self.check(TokenKind::LParen) {
                    return self.parse_call_value(name, expected);
                }
                self.parse_variable_reference(name, expected)
            }
            TokenKind::LParen => {
                self.advance()?;
                let inner = self.parse_expression(expected)?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            _ => Err(self.syntax_error("identifier or value")),
        }
    }

    fn parse_variable_reference(
        &mut self,
        name: Token,
        expected: Option<ValueType>,
    ) -> Result<ExprNode, CompileError> {
        let id = self.resolve(&name)?;
        let symbol = self.table.symbol(id);

        let found = match symbol.value_type {
            Some(found) if !symbol.is_callable() => found,
            _ => {
                return Err(CompileError::NotAVariable {
                    name: name.lexeme,
                    location: name.location,
                })
            }
        };
        if !type_check(expected, found) {
            return Err(Self::mismatch(expected, found, &name));
        }
        Ok(ExprNode::leaf(id, found, name.location))
    }

    /// A function call in value position.
    fn parse_call_value(
        &mut self,
        name: Token,
        expected: Option<ValueType>,
    ) -> Result<ExprNode, CompileError> {
        let CallSite { callee, args } = self.function_call_check(&name, expected, true)?;
        let return_type = match self.table.symbol(callee).value_type {
            Some(return_type) => return_type,
            None => {
                return Err(CompileError::ProcedureAsValue {
                    name: name.lexeme,
                    location: name.location,
                })
            }
        };
        Ok(self
            .tac
            .call_value(&mut self.table, callee, args, return_type, name.location))
    }

    /// Resolve a call from its argument list. The current token is the `(`.
    ///
    /// Arguments are evaluated first; their types select the overload
    /// through the mangled name. Constants and computed values are refused
    /// for `var` parameters. In value position procedures are rejected and
    /// the return type is checked against `expected`.
    pub(crate) fn function_call_check(
        &mut self,
        name: &Token,
        expected: Option<ValueType>,
        as_value: bool,
    ) -> Result<CallSite, CompileError> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                args.push(self.parse_expression(None)?);
                if !self.match_token(TokenKind::Comma)? {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;

        let types: Vec<ValueType> = args.iter().map(|arg| arg.value_type).collect();
        let mangled = mangle_name(&name.lexeme, &types);
        let callee = self
            .table
            .deep_lookup(self.scope, &mangled)
            .ok_or_else(|| CompileError::UndeclaredCallable {
                name: name.lexeme.clone(),
                mangled: mangled.clone(),
                location: name.location,
            })?;

        let symbol = self.table.symbol(callee);
        if !symbol.is_callable() {
            return Err(CompileError::NotCallable {
                name: name.lexeme.clone(),
                location: name.location,
            });
        }
        if symbol.params.len() != args.len() {
            return Err(CompileError::UndeclaredCallable {
                name: name.lexeme.clone(),
                mangled,
                location: name.location,
            });
        }

        for (param, arg) in symbol.params.iter().zip(&args) {
            if param.by_ref && !self.is_variable_operand(arg) {
                return Err(CompileError::ReferenceArgument {
                    argument: self.table.symbol(arg.result).name.clone(),
                    callee: name.lexeme.clone(),
                    location: arg.location,
                });
            }
        }

        if as_value {
            if symbol.kind == DeclKind::Procedure {
                return Err(CompileError::ProcedureAsValue {
                    name: name.lexeme.clone(),
                    location: name.location,
                });
            }
            if let Some(found) = symbol.value_type {
                if !type_check(expected, found) {
                    return Err(Self::mismatch(expected, found, name));
                }
            }
        }

        Ok(CallSite { callee, args })
    }

    /// A bare variable or parameter, usable for a `var` parameter.
    fn is_variable_operand(&self, arg: &ExprNode) -> bool {
        arg.code.is_empty()
            && matches!(
                self.table.symbol(arg.result).kind,
                DeclKind::Var | DeclKind::Param
            )
    }

    pub(crate) fn parse_condition(&mut self) -> Result<ExprNode, CompileError> {
        if !self.check(TokenKind::Not) && !self.check(TokenKind::LParen) {
            return self.parse_comparison();
        }

        let mut lhs = self.parse_condition_group()?;
        loop {
            let op = match self.current.kind {
                TokenKind::And => TacOp::And,
                TokenKind::Or => TacOp::Or,
                _ => break,
            };
            self.advance()?;
            let rhs = self.parse_condition_group()?;
            lhs = self.tac.binary(&mut self.table, op, lhs, rhs, ValueType::Boolean);
        }
        Ok(lhs)
    }

    fn parse_condition_group(&mut self) -> Result<ExprNode, CompileError> {
        let negated = self.match_token(TokenKind::Not)?;
        self.expect(TokenKind::LParen)?;
        let comparison = self.parse_comparison()?;
        self.expect(TokenKind::RParen)?;

        if negated {
            Ok(self
                .tac
                .unary(&mut self.table, TacOp::Not, comparison, ValueType::Boolean))
        } else {
            Ok(comparison)
        }
    }

    fn parse_comparison(&mut self) -> Result<ExprNode, CompileError> {
        let lhs = self.parse_expression(None)?;
        let op = match self.current.kind {
            TokenKind::Eq => TacOp::Eq,
            TokenKind::Ne => TacOp::Neq,
            TokenKind::Lt => TacOp::Lt,
            TokenKind::Le => TacOp::Lte,
            TokenKind::Gt => TacOp::Gt,
            TokenKind::Ge => TacOp::Gte,
            _ => return Err(self.syntax_error("relational operator")),
        };
        self.advance()?;
        let rhs = self.parse_expression(None)?;

        if !lhs.value_type.accepts(rhs.value_type) && !rhs.value_type.accepts(lhs.value_type) {
            return Err(CompileError::TypeMismatch {
                expected: lhs.value_type,
                found: rhs.value_type,
                location: rhs.location,
            });
        }
        Ok(self.tac.binary(&mut self.table, op, lhs, rhs, ValueType::Boolean))
    }

    /// Type a binary operator and synthesize it.
    fn combine(
        &mut self,
        operator: &Token,
        op: TacOp,
        lhs: ExprNode,
        rhs: ExprNode,
    ) -> Result<ExprNode, CompileError> {
        let (l, r) = (lhs.value_type, rhs.value_type);
        let result_type = match operator.kind {
            TokenKind::Plus | TokenKind::Minus | TokenKind::Star | TokenKind::Slash => {
                Self::require(ValueType::Real, &lhs, &rhs, ValueType::is_numeric)?;
                if l == ValueType::Integer && r == ValueType::Integer {
                    ValueType::Integer
                } else {
                    ValueType::Real
                }
            }
            TokenKind::Div | TokenKind::Mod => {
                Self::require(ValueType::Integer, &lhs, &rhs, |t| t == ValueType::Integer)?;
                ValueType::Integer
            }
            _ => {
                Self::require(ValueType::Boolean, &lhs, &rhs, ValueType::is_logical)?;
                if l == ValueType::Boolean && r == ValueType::Boolean {
                    ValueType::Boolean
                } else {
                    ValueType::Integer
                }
            }
        };
        Ok(self.tac.binary(&mut self.table, op, lhs, rhs, result_type))
    }

    /// Unary `+`, `-` or `not` applied to `operand`.
    fn negate(&mut self, operator: &Token, operand: ExprNode) -> Result<ExprNode, CompileError> {
        let (op, allowed, wanted) = match operator.kind {
            TokenKind::Plus => (TacOp::Pos, operand.value_type.is_numeric(), ValueType::Real),
            TokenKind::Minus => (TacOp::Neg, operand.value_type.is_numeric(), ValueType::Real),
            _ => (TacOp::Not, operand.value_type.is_logical(), ValueType::Boolean),
        };
        if !allowed {
            return Err(CompileError::TypeMismatch {
                expected: wanted,
                found: operand.value_type,
                location: operand.location,
            });
        }
        let result_type = operand.value_type;
        Ok(self.tac.unary(&mut self.table, op, operand, result_type))
    }

    fn require(
        wanted: ValueType,
        lhs: &ExprNode,
        rhs: &ExprNode,
        allowed: impl Fn(ValueType) -> bool,
    ) -> Result<(), CompileError> {
        for operand in [lhs, rhs] {
            if !allowed(operand.value_type) {
                return Err(CompileError::TypeMismatch {
                    expected: wanted,
                    found: operand.value_type,
                    location: operand.location,
                });
            }
        }
        Ok(())
    }

    /// Look `name` up in the current scope, then the root scope.
    pub(crate) fn resolve(&self, name: &Token) -> Result<SymbolId, CompileError> {
        self.table
            .deep_lookup(self.scope, &name.lexeme)
            .ok_or_else(|| CompileError::UndeclaredIdentifier {
                name: name.lexeme.clone(),
                location: name.location,
            })
    }

    fn mismatch(expected: Option<ValueType>, found: ValueType, at: &Token) -> CompileError {
        CompileError::TypeMismatch {
            expected: expected.unwrap_or(found),
            found,
            location: at.location,
        }
    }
}
