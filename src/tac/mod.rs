//! Three-address code: instructions, synthesis and constant folding

pub mod builder;
pub mod fold;
pub mod instruction;

pub use builder::{ExprNode, TacBuilder};
pub use instruction::{join_tac, Instruction, Label, Operand, TacChain, TacOp};
