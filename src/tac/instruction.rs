//! Three-address instructions and instruction chains

use crate::symbols::{SymbolId, SymbolTable};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TacOp {
    // Arithmetic
    Add,
    Sub,
    Mult,
    Div,
    Mod,
    // Logical
    And,
    Or,
    Not,
    // Relational
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    // Unary sign
    Pos,
    Neg,
    // Control
    Goto,
    IfZero,
    // Declarations and markers
    Var,
    Label,
    BeginProc,
    EndProc,
    ArgList,
    BeginProg,
    EndProg,
    // Data movement and I/O
    Cpy,
    Print,
    Read,
    // Calls
    Param,
    Call,
}

impl TacOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            TacOp::Add => "add",
            TacOp::Sub => "sub",
            TacOp::Mult => "mult",
            TacOp::Div => "div",
            TacOp::Mod => "mod",
            TacOp::And => "and",
            TacOp::Or => "or",
            TacOp::Not => "not",
            TacOp::Eq => "eq",
            TacOp::Neq => "neq",
            TacOp::Lt => "lt",
            TacOp::Lte => "lte",
            TacOp::Gt => "gt",
            TacOp::Gte => "gte",
            TacOp::Pos => "pos",
            TacOp::Neg => "neg",
            TacOp::Goto => "goto",
            TacOp::IfZero => "ifz",
            TacOp::Var => "var",
            TacOp::Label => "label",
            TacOp::BeginProc => "beginproc",
            TacOp::EndProc => "endproc",
            TacOp::ArgList => "arglist",
            TacOp::BeginProg => "beginprog",
            TacOp::EndProg => "endprog",
            TacOp::Cpy => "cpy",
            TacOp::Print => "print",
            TacOp::Read => "read",
            TacOp::Param => "param",
            TacOp::Call => "call",
        }
    }

    pub fn is_relational(self) -> bool {
        matches!(
            self,
            TacOp::Eq | TacOp::Neq | TacOp::Lt | TacOp::Lte | TacOp::Gt | TacOp::Gte
        )
    }
}

impl fmt::Display for TacOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Jump target. Numbers are never reused within one compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(pub u32);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Symbol(SymbolId),
    Label(Label),
}

/// One instruction; operand `a` is the destination when there is one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub op: TacOp,
    pub a: Option<Operand>,
    pub b: Option<Operand>,
    pub c: Option<Operand>,
}

impl Instruction {
    pub fn new(
        op: TacOp,
        a: Option<Operand>,
        b: Option<Operand>,
        c: Option<Operand>,
    ) -> Self {
        Self { op, a, b, c }
    }

    /// `op a` on a single symbol (`var`, `print`, `beginproc`, ...).
    pub fn unary(op: TacOp, a: SymbolId) -> Self {
        Self::new(op, Some(Operand::Symbol(a)), None, None)
    }

    /// `a := b op c`
    pub fn binary(op: TacOp, a: SymbolId, b: SymbolId, c: SymbolId) -> Self {
        Self::new(
            op,
            Some(Operand::Symbol(a)),
            Some(Operand::Symbol(b)),
            Some(Operand::Symbol(c)),
        )
    }

    /// `a := op b`
    pub fn with_source(op: TacOp, a: SymbolId, b: SymbolId) -> Self {
        Self::new(op, Some(Operand::Symbol(a)), Some(Operand::Symbol(b)), None)
    }

    pub fn copy(dest: SymbolId, source: SymbolId) -> Self {
        Self::with_source(TacOp::Cpy, dest, source)
    }

    pub fn label(label: Label) -> Self {
        Self::new(TacOp::Label, Some(Operand::Label(label)), None, None)
    }

    pub fn goto(label: Label) -> Self {
        Self::new(TacOp::Goto, Some(Operand::Label(label)), None, None)
    }

    /// Jump to `label` when `condition` is zero.
    pub fn if_zero(label: Label, condition: SymbolId) -> Self {
        Self::new(
            TacOp::IfZero,
            Some(Operand::Label(label)),
            Some(Operand::Symbol(condition)),
            None,
        )
    }

    pub fn operands(&self) -> impl Iterator<Item = Operand> + '_ {
        [self.a, self.b, self.c].into_iter().flatten()
    }

    /// Listing line with symbol names resolved through `table`.
    pub fn render(&self, table: &SymbolTable) -> String {
        let mut line = String::from(self.op.mnemonic());
        for (i, operand) in self.operands().enumerate() {
            line.push_str(if i == 0 { " " } else { ", " });
            match operand {
                Operand::Symbol(id) => line.push_str(&table.symbol(id).name),
                Operand::Label(label) => line.push_str(&label.to_string()),
            }
        }
        line
    }
}

/// Instructions in execution order, built by appending
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TacChain {
    instructions: Vec<Instruction>,
}

impl TacChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    pub fn append(&mut self, mut other: TacChain) {
        self.instructions.append(&mut other.instructions);
    }

    /// `self` followed by `other`.
    pub fn then(mut self, other: TacChain) -> Self {
        self.append(other);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    pub fn into_vec(self) -> Vec<Instruction> {
        self.instructions
    }
}

impl FromIterator<Instruction> for TacChain {
    fn from_iter<I: IntoIterator<Item = Instruction>>(iter: I) -> Self {
        Self {
            instructions: iter.into_iter().collect(),
        }
    }
}

/// Concatenate two optional chains, `first` executing before `second`.
pub fn join_tac(first: Option<TacChain>, second: Option<TacChain>) -> Option<TacChain> {
    match (first, second) {
        (None, second) => second,
        (first, None) => first,
        (Some(first), Some(second)) => Some(first.then(second)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(labels: &[u32]) -> TacChain {
        labels.iter().map(|&n| Instruction::label(Label(n))).collect()
    }

    #[test]
    fn test_join_identities() {
        let a = chain(&[1, 2]);
        assert_eq!(join_tac(Some(a.clone()), None), Some(a.clone()));
        assert_eq!(join_tac(None, Some(a.clone())), Some(a));
        assert_eq!(join_tac(None, None), None);
    }

    #[test]
    fn test_join_order_and_associativity() {
        let a = chain(&[1]);
        let b = chain(&[2, 3]);
        let c = chain(&[4]);

        let left = join_tac(join_tac(Some(a.clone()), Some(b.clone())), Some(c.clone()));
        let right = join_tac(Some(a), join_tac(Some(b), Some(c)));
        assert_eq!(left, right);
        assert_eq!(left, Some(chain(&[1, 2, 3, 4])));
    }

    #[test]
    fn test_render_labels() {
        let table = SymbolTable::new();
        let truth = table.lookup(table.root(), "true").unwrap();
        assert_eq!(Instruction::goto(Label(3)).render(&table), "goto L3");
        assert_eq!(
            Instruction::if_zero(Label(7), truth).render(&table),
            "ifz L7, true"
        );
    }
}
