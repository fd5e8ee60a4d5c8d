//! Scope tree and symbol arena
//!
//! Every scope owns `HASH_SIZE` bucket chains. A chain is stored oldest
//! first, so the most recently inserted binding (the chain head) is the last
//! element and lookups scan from the back.

use super::hash::bucket_index;
use super::symbol::{DeclKind, Literal, Symbol, ValueType};
use crate::constants::HASH_SIZE;
use crate::parser::lexer::SourceLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(u32);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One lexical region: the program or a function/procedure body
#[derive(Debug, Clone)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    pub nesting_level: usize,
    buckets: Vec<Vec<SymbolId>>,
}

impl Scope {
    fn new(parent: Option<ScopeId>, nesting_level: usize) -> Self {
        Self {
            parent,
            children: Vec::new(),
            nesting_level,
            buckets: vec![Vec::new(); HASH_SIZE],
        }
    }

    /// Number of live bindings.
    pub fn symbol_count(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }
}

/// Outcome of [`SymbolTable::lookup_insert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupInsert {
    Inserted(SymbolId),
    /// The new symbol took over `previous`'s chain position
    Replaced { id: SymbolId, previous: SymbolId },
    /// A constant was involved; nothing changed
    DuplicateConst(SymbolId),
}

#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    symbols: Vec<Symbol>,
    root: ScopeId,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// Create the table with its root scope, which binds `true` and `false`.
    pub fn new() -> Self {
        let mut table = Self {
            scopes: Vec::new(),
            symbols: Vec::new(),
            root: ScopeId(0),
        };
        table.root = table.new_scope(None);

        for (name, value) in [("true", 1), ("false", 0)] {
            let symbol = Symbol::new(
                name,
                DeclKind::Var,
                Some(ValueType::Integer),
                SourceLocation::new(0, 0),
            )
            .with_literal(Literal::Int(value));
            let id = table.alloc(symbol);
            table.insert(table.root, id);
        }
        table
    }

    pub fn root(&self) -> ScopeId {
        self.root
    }

    /// Create a scope one level below `parent` (level 0 without a parent).
    pub fn new_scope(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        let level = match parent {
            Some(p) => self.scopes[p.index()].nesting_level + 1,
            None => 0,
        };
        self.scopes.push(Scope::new(parent, level));
        if let Some(p) = parent {
            self.scopes[p.index()].children.push(id);
        }
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    /// Add a symbol to the arena without binding it in any scope.
    pub fn alloc(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(symbol);
        id
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.index()]
    }

    /// Head-insert without checking for an existing binding.
    pub fn insert(&mut self, scope: ScopeId, id: SymbolId) {
        let bucket = bucket_index(&self.symbols[id.index()].name);
        self.scopes[scope.index()].buckets[bucket].push(id);
    }

    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.position(scope, name)
            .map(|(bucket, pos)| self.scopes[scope.index()].buckets[bucket][pos])
    }

    /// Insert `id`, or replace an existing non-constant binding in place.
    ///
    /// Reports [`LookupInsert::DuplicateConst`] when either the existing or
    /// the incoming symbol is a constant.
    pub fn lookup_insert(&mut self, scope: ScopeId, id: SymbolId) -> LookupInsert {
        let name = self.symbols[id.index()].name.clone();
        let Some((bucket, pos)) = self.position(scope, &name) else {
            self.insert(scope, id);
            return LookupInsert::Inserted(id);
        };

        let slot = &mut self.scopes[scope.index()].buckets[bucket][pos];
        let previous = *slot;
        if self.symbols[previous.index()].kind == DeclKind::Const
            || self.symbols[id.index()].kind == DeclKind::Const
        {
            return LookupInsert::DuplicateConst(previous);
        }
        *slot = id;
        LookupInsert::Replaced { id, previous }
    }

    /// Look in `current`, then in the root scope. Intermediate scopes are
    /// not searched.
    pub fn deep_lookup(&self, current: ScopeId, name: &str) -> Option<SymbolId> {
        self.lookup(current, name).or_else(|| {
            if current != self.root {
                self.lookup(self.root, name)
            } else {
                None
            }
        })
    }

    /// Unbind the most recent binding of `name`.
    pub fn delete(&mut self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let (bucket, pos) = self.position(scope, name)?;
        Some(self.scopes[scope.index()].buckets[bucket].remove(pos))
    }

    /// Bindings of a scope, bucket by bucket, newest first within a chain.
    pub fn symbols_in(&self, scope: ScopeId) -> Vec<SymbolId> {
        self.scopes[scope.index()]
            .buckets
            .iter()
            .flat_map(|chain| chain.iter().rev().copied())
            .collect()
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    fn position(&self, scope: ScopeId, name: &str) -> Option<(usize, usize)> {
        let bucket = bucket_index(name);
        let chain = &self.scopes[scope.index()].buckets[bucket];
        chain
            .iter()
            .rposition(|id| self.symbols[id.index()].name == name)
            .map(|pos| (bucket, pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> SourceLocation {
        SourceLocation::new(1, 1)
    }

    fn var(table: &mut SymbolTable, name: &str, ty: ValueType) -> SymbolId {
        table.alloc(Symbol::new(name, DeclKind::Var, Some(ty), loc()))
    }

    #[test]
    fn test_root_has_booleans() {
        let table = SymbolTable::new();
        let t = table.lookup(table.root(), "true").unwrap();
        let f = table.lookup(table.root(), "false").unwrap();
        assert_eq!(table.symbol(t).literal, Some(Literal::Int(1)));
        assert_eq!(table.symbol(f).literal, Some(Literal::Int(0)));
        assert_eq!(table.symbol(t).kind, DeclKind::Var);
        assert_eq!(table.scope(table.root()).nesting_level, 0);
    }

    #[test]
    fn test_nesting_levels() {
        let mut table = SymbolTable::new();
        let root = table.root();
        let child = table.new_scope(Some(root));
        let grandchild = table.new_scope(Some(child));
        assert_eq!(table.scope(child).nesting_level, 1);
        assert_eq!(table.scope(grandchild).nesting_level, 2);
        assert_eq!(table.scope(grandchild).parent, Some(child));
        assert_eq!(table.scope(root).children, vec![child]);
    }

    #[test]
    fn test_insert_shadows_in_chain() {
        let mut table = SymbolTable::new();
        let root = table.root();
        let first = var(&mut table, "x", ValueType::Integer);
        let second = var(&mut table, "x", ValueType::Real);
        table.insert(root, first);
        table.insert(root, second);
        assert_eq!(table.lookup(root, "x"), Some(second));
        assert_eq!(table.delete(root, "x"), Some(second));
        assert_eq!(table.lookup(root, "x"), Some(first));
    }

    #[test]
    fn test_var_redeclaration_replaces() {
        let mut table = SymbolTable::new();
        let root = table.root();
        let first = var(&mut table, "x", ValueType::Integer);
        let second = var(&mut table, "x", ValueType::Real);
        assert_eq!(table.lookup_insert(root, first), LookupInsert::Inserted(first));
        assert_eq!(
            table.lookup_insert(root, second),
            LookupInsert::Replaced {
                id: second,
                previous: first
            }
        );
        assert_eq!(table.lookup(root, "x"), Some(second));
        assert_eq!(table.scope(root).symbol_count(), 3);
    }

    #[test]
    fn test_const_redeclaration_rejected() {
        let mut table = SymbolTable::new();
        let root = table.root();
        let c1 = table.alloc(
            Symbol::new("c", DeclKind::Const, Some(ValueType::Integer), loc())
                .with_literal(Literal::Int(5)),
        );
        let c2 = table.alloc(
            Symbol::new("c", DeclKind::Const, Some(ValueType::Integer), loc())
                .with_literal(Literal::Int(6)),
        );
        let v = var(&mut table, "c", ValueType::Integer);
        table.lookup_insert(root, c1);
        assert_eq!(table.lookup_insert(root, c2), LookupInsert::DuplicateConst(c1));
        assert_eq!(table.lookup_insert(root, v), LookupInsert::DuplicateConst(c1));
        assert_eq!(table.lookup(root, "c"), Some(c1));
    }

    #[test]
    fn test_deep_lookup_two_levels() {
        let mut table = SymbolTable::new();
        let root = table.root();
        let outer = table.new_scope(Some(root));
        let inner = table.new_scope(Some(outer));

        let g = var(&mut table, "g", ValueType::Real);
        table.insert(root, g);
        let o = var(&mut table, "o", ValueType::Char);
        table.insert(outer, o);

        assert_eq!(table.deep_lookup(inner, "g"), Some(g));
        assert_eq!(table.deep_lookup(outer, "o"), Some(o));
        assert_eq!(table.deep_lookup(inner, "o"), None);
        assert_eq!(table.symbol(g).value_type, Some(ValueType::Real));
    }

    #[test]
    fn test_symbols_in_scope() {
        let mut table = SymbolTable::new();
        let root = table.root();
        let scope = table.new_scope(Some(root));
        let a = var(&mut table, "a", ValueType::Integer);
        let b = var(&mut table, "b", ValueType::Integer);
        table.insert(scope, a);
        table.insert(scope, b);
        let mut ids = table.symbols_in(scope);
        ids.sort();
        assert_eq!(ids, vec![a, b]);
        assert_eq!(table.symbols_in(root).len(), 2);
    }

    #[test]
    fn test_delete_missing() {
        let mut table = SymbolTable::new();
        let root = table.root();
        assert_eq!(table.delete(root, "nothing"), None);
    }
}
