//! TAC synthesis
//!
//! [`TacBuilder`] owns the label and temporary counters of one compilation
//! and turns typed operands into instruction chains. Expressions whose
//! operands are all compile-time constants are folded into a fresh literal
//! symbol and produce no instructions.
//!
//! Shapes produced:
//!
//! ```text
//! binary      [lhs] [rhs] var t; op t, lhs, rhs
//! if          [c] ifz Lx, c; [then]; label Lx
//! if/else     [c] ifz Le, c; [then]; goto Lend; label Le; [else]; label Lend
//! while       label Ltop; [c] ifz Lx, c; [body]; goto Ltop; label Lx
//! for         [start] cpy v, start; label Ltop; [bound] var t; lte|gte t, v, bound;
//!             ifz Lx, t; [body]; add|sub v, v, 1; goto Ltop; label Lx
//! call        [args] param a..; var t; call t, f      (function)
//!             [args] param a..; call f                (procedure)
//! callable    label L; beginproc f; arglist f; [body]; endproc f
//! program     beginproc p; arglist p; [body]; endproc p
//! ```

use super::fold::{fold_binary, fold_unary};
use super::instruction::{Instruction, Label, Operand, TacChain, TacOp};
use crate::constants::TEMP_PREFIX;
use crate::parser::lexer::SourceLocation;
use crate::symbols::{DeclKind, Literal, Symbol, SymbolId, SymbolTable, ValueType};

/// Value and code of a parsed expression
#[derive(Debug, Clone, PartialEq)]
pub struct ExprNode {
    pub result: SymbolId,
    pub value_type: ValueType,
    pub location: SourceLocation,
    pub code: TacChain,
}

impl ExprNode {
    /// An operand that needs no instructions.
    pub fn leaf(result: SymbolId, value_type: ValueType, location: SourceLocation) -> Self {
        Self {
            result,
            value_type,
            location,
            code: TacChain::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct TacBuilder {
    next_label: u32,
    next_temp: u32,
}

impl TacBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    /// Allocate a temporary. Temporaries are never bound in a scope.
    pub fn new_temp(
        &mut self,
        table: &mut SymbolTable,
        value_type: ValueType,
        location: SourceLocation,
    ) -> SymbolId {
        let name = format!("{}{}", TEMP_PREFIX, self.next_temp);
        self.next_temp += 1;
        table.alloc(Symbol::new(name, DeclKind::Var, Some(value_type), location))
    }

    /// A constant operand for `literal`.
    pub fn literal(
        &mut self,
        table: &mut SymbolTable,
        literal: Literal,
        location: SourceLocation,
    ) -> ExprNode {
        let value_type = literal.value_type();
        let id = table.alloc(Symbol::constant(literal, location));
        ExprNode::leaf(id, value_type, location)
    }

    pub fn binary(
        &mut self,
        table: &mut SymbolTable,
        op: TacOp,
        lhs: ExprNode,
        rhs: ExprNode,
        result_type: ValueType,
    ) -> ExprNode {
        let location = lhs.location;
        let folded = {
            let (l, r) = (table.symbol(lhs.result), table.symbol(rhs.result));
            match (&l.literal, &r.literal) {
                (Some(a), Some(b)) if l.is_foldable() && r.is_foldable() => {
                    fold_binary(op, a, b)
                }
                _ => None,
            }
        };

        if let Some(literal) = folded {
            let mut node = self.literal(table, literal, location);
            node.code = lhs.code.then(rhs.code);
            return node;
        }

        let temp = self.new_temp(table, result_type, location);
        let mut code = lhs.code.then(rhs.code);
        code.push(Instruction::unary(TacOp::Var, temp));
        code.push(Instruction::binary(op, temp, lhs.result, rhs.result));
        ExprNode {
            result: temp,
            value_type: result_type,
            location,
            code,
        }
    }

    pub fn unary(
        &mut self,
        table: &mut SymbolTable,
        op: TacOp,
        operand: ExprNode,
        result_type: ValueType,
    ) -> ExprNode {
        let location = operand.location;
        let folded = {
            let symbol = table.symbol(operand.result);
            match &symbol.literal {
                Some(literal) if symbol.is_foldable() => fold_unary(op, literal),
                _ => None,
            }
        };

        if let Some(literal) = folded {
            let mut node = self.literal(table, literal, location);
            node.code = operand.code;
            return node;
        }

        let temp = self.new_temp(table, result_type, location);
        let mut code = operand.code;
        code.push(Instruction::unary(TacOp::Var, temp));
        code.push(Instruction::with_source(op, temp, operand.result));
        ExprNode {
            result: temp,
            value_type: result_type,
            location,
            code,
        }
    }

    /// `target := value`
    pub fn assign(&mut self, target: SymbolId, value: ExprNode) -> TacChain {
        let mut code = value.code;
        code.push(Instruction::copy(target, value.result));
        code
    }

    pub fn if_then(&mut self, condition: ExprNode, body: TacChain) -> TacChain {
        let skip = self.new_label();
        let mut code = condition.code;
        code.push(Instruction::if_zero(skip, condition.result));
        code.append(body);
        code.push(Instruction::label(skip));
        code
    }

    pub fn if_then_else(
        &mut self,
        condition: ExprNode,
        then_branch: TacChain,
        else_branch: TacChain,
    ) -> TacChain {
        let otherwise = self.new_label();
        let end = self.new_label();
        let mut code = condition.code;
        code.push(Instruction::if_zero(otherwise, condition.result));
        code.append(then_branch);
        code.push(Instruction::goto(end));
        code.push(Instruction::label(otherwise));
        code.append(else_branch);
        code.push(Instruction::label(end));
        code
    }

    /// A guarded body that jumps back to a label placed before the guard.
    pub fn while_loop(&mut self, condition: ExprNode, mut body: TacChain) -> TacChain {
        let top = self.new_label();
        body.push(Instruction::goto(top));

        let mut code = TacChain::new();
        code.push(Instruction::label(top));
        code.append(self.if_then(condition, body));
        code
    }

    /// Counting loop over `variable`, built on [`TacBuilder::while_loop`].
    pub fn for_loop(
        &mut self,
        table: &mut SymbolTable,
        variable: SymbolId,
        start: ExprNode,
        bound: ExprNode,
        descending: bool,
        mut body: TacChain,
    ) -> TacChain {
        let location = start.location;
        let (compare, step) = if descending {
            (TacOp::Gte, TacOp::Sub)
        } else {
            (TacOp::Lte, TacOp::Add)
        };

        let counter_type = table
            .symbol(variable)
            .value_type
            .unwrap_or(ValueType::Integer);
        let init = self.assign(variable, start);

        let counter = ExprNode::leaf(variable, counter_type, location);
        let condition = self.binary(table, compare, counter, bound, ValueType::Boolean);

        let one = self.literal(table, Literal::Int(1), location);
        body.push(Instruction::binary(step, variable, variable, one.result));

        init.then(self.while_loop(condition, body))
    }

    pub fn print(&mut self, value: ExprNode) -> TacChain {
        let mut code = value.code;
        code.push(Instruction::unary(TacOp::Print, value.result));
        code
    }

    pub fn print_newline(&mut self, table: &mut SymbolTable, location: SourceLocation) -> TacChain {
        let newline = self.literal(table, Literal::Char('\n'), location);
        self.print(newline)
    }

    pub fn read(&mut self, target: SymbolId) -> TacChain {
        let mut code = TacChain::new();
        code.push(Instruction::unary(TacOp::Read, target));
        code
    }

    /// Argument code followed by one `param` per argument, in order.
    fn pass_arguments(args: Vec<ExprNode>) -> TacChain {
        let mut code = TacChain::new();
        let mut passed = Vec::with_capacity(args.len());
        for arg in args {
            passed.push(arg.result);
            code.append(arg.code);
        }
        for id in passed {
            code.push(Instruction::unary(TacOp::Param, id));
        }
        code
    }

    /// Call a function for its value.
    pub fn call_value(
        &mut self,
        table: &mut SymbolTable,
        callee: SymbolId,
        args: Vec<ExprNode>,
        return_type: ValueType,
        location: SourceLocation,
    ) -> ExprNode {
        let mut code = Self::pass_arguments(args);
        let temp = self.new_temp(table, return_type, location);
        code.push(Instruction::unary(TacOp::Var, temp));
        code.push(Instruction::new(
            TacOp::Call,
            Some(Operand::Symbol(temp)),
            Some(Operand::Symbol(callee)),
            None,
        ));
        ExprNode {
            result: temp,
            value_type: return_type,
            location,
            code,
        }
    }

    /// Call a function or procedure as a statement, discarding any result.
    pub fn call_statement(&mut self, callee: SymbolId, args: Vec<ExprNode>) -> TacChain {
        let mut code = Self::pass_arguments(args);
        code.push(Instruction::new(
            TacOp::Call,
            None,
            Some(Operand::Symbol(callee)),
            None,
        ));
        code
    }

    pub fn procedure_unit(&mut self, callable: SymbolId, body: TacChain) -> TacChain {
        let entry = self.new_label();
        let mut code = TacChain::new();
        code.push(Instruction::label(entry));
        code.append(Self::frame(callable, body));
        code
    }

    pub fn program_unit(&mut self, program: SymbolId, body: TacChain) -> TacChain {
        Self::frame(program, body)
    }

    fn frame(symbol: SymbolId, body: TacChain) -> TacChain {
        let mut code = TacChain::new();
        code.push(Instruction::unary(TacOp::BeginProc, symbol));
        code.push(Instruction::unary(TacOp::ArgList, symbol));
        code.append(body);
        code.push(Instruction::unary(TacOp::EndProc, symbol));
        code
    }
}
