//! Backend boundary
//!
//! The backend receives a finished [`CompiledProgram`] and only reads it.
//! No target code is emitted: [`generate`] walks the instructions and
//! summarizes what a code generator would have to handle.

use crate::parser::parse::CompiledProgram;
use crate::symbols::DeclKind;
use crate::tac::TacOp;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendReport {
    pub opcode_counts: FxHashMap<TacOp, usize>,
    /// Callable units plus the main unit
    pub units: usize,
    pub instructions: usize,
}

impl BackendReport {
    pub fn count(&self, op: TacOp) -> usize {
        self.opcode_counts.get(&op).copied().unwrap_or(0)
    }
}

pub fn generate(program: &CompiledProgram) -> BackendReport {
    let mut report = BackendReport {
        instructions: program.instructions.len(),
        ..BackendReport::default()
    };

    for instruction in &program.instructions {
        *report.opcode_counts.entry(instruction.op).or_insert(0) += 1;
        if matches!(instruction.op, TacOp::BeginProc | TacOp::BeginProg) {
            report.units += 1;
        }
    }

    report
}

/// Root-scope bindings sorted by name, one line each.
pub fn symbol_listing(program: &CompiledProgram) -> Vec<String> {
    let table = &program.symbols;
    let mut symbols: Vec<_> = table
        .symbols_in(program.root())
        .into_iter()
        .map(|id| table.symbol(id))
        .collect();
    symbols.sort_by(|a, b| a.name.cmp(&b.name));

    symbols
        .into_iter()
        .map(|symbol| {
            let value_type = symbol
                .value_type
                .map(|ty| ty.to_string())
                .unwrap_or_else(|| "-".to_string());
            let mut line = format!(
                "{:<16} {:<10} {}",
                symbol.name,
                symbol.kind.as_str(),
                value_type
            );
            if symbol.kind.is_callable() {
                let params: Vec<String> = symbol
                    .params
                    .iter()
                    .map(|param| {
                        let prefix = if param.by_ref { "var " } else { "" };
                        format!("{}{}", prefix, table.symbol(param.symbol).name)
                    })
                    .collect();
                line.push_str(&format!(" ({})", params.join(", ")));
            } else if symbol.kind == DeclKind::Const {
                if let Some(literal) = &symbol.literal {
                    line.push_str(&format!(" = {}", literal));
                }
            }
            line
        })
        .collect()
}
