//! Symbol entries, value types and literal values

use super::table::SymbolId;
use crate::constants::{MANGLE_SEPARATOR, VOID_SUFFIX};
use crate::parser::lexer::{SourceLocation, TokenKind};
use std::fmt;

/// How a name was declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Const,
    Var,
    Param,
    Function,
    Procedure,
}

impl DeclKind {
    pub fn is_callable(self) -> bool {
        matches!(self, DeclKind::Function | DeclKind::Procedure)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeclKind::Const => "const",
            DeclKind::Var => "var",
            DeclKind::Param => "param",
            DeclKind::Function => "function",
            DeclKind::Procedure => "procedure",
        }
    }
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value types of the language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Integer,
    Real,
    Char,
    String,
    Boolean,
}

impl ValueType {
    /// Type carried by a literal token.
    pub fn of_literal(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::IntLiteral => Some(ValueType::Integer),
            TokenKind::RealLiteral => Some(ValueType::Real),
            TokenKind::CharLiteral => Some(ValueType::Char),
            TokenKind::StringLiteral => Some(ValueType::String),
            _ => None,
        }
    }

    /// Type named by a declaration keyword (`integer`, `real`, ...).
    pub fn of_type_keyword(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Integer => Some(ValueType::Integer),
            TokenKind::Real => Some(ValueType::Real),
            TokenKind::Char => Some(ValueType::Char),
            TokenKind::String => Some(ValueType::String),
            TokenKind::Boolean => Some(ValueType::Boolean),
            _ => None,
        }
    }

    pub fn mangle_suffix(self) -> &'static str {
        match self {
            ValueType::Integer => "_i",
            ValueType::Real => "_r",
            ValueType::Char => "_c",
            ValueType::String => "_s",
            ValueType::Boolean => "_b",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ValueType::Integer | ValueType::Real)
    }

    /// Integer-backed truth values.
    pub fn is_logical(self) -> bool {
        matches!(self, ValueType::Integer | ValueType::Boolean)
    }

    /// Whether a value of type `actual` may stand where `self` is expected.
    /// Strings take characters, reals take integers and booleans take
    /// integers; everything else must match exactly.
    pub fn accepts(self, actual: ValueType) -> bool {
        match self {
            ValueType::String => matches!(actual, ValueType::String | ValueType::Char),
            ValueType::Real => actual.is_numeric(),
            ValueType::Boolean => actual.is_logical(),
            _ => self == actual,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Integer => "integer number",
            ValueType::Real => "real number",
            ValueType::Char => "character",
            ValueType::String => "string literal",
            ValueType::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// Compile-time value of a constant
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Real(f64),
    Char(char),
    Str(String),
}

impl Literal {
    /// Value of a literal token; `None` for non-literal kinds or an
    /// unparsable number.
    pub fn from_token(kind: TokenKind, lexeme: &str) -> Option<Self> {
        match kind {
            TokenKind::IntLiteral => lexeme.parse().ok().map(Literal::Int),
            TokenKind::RealLiteral => lexeme.parse().ok().map(Literal::Real),
            TokenKind::CharLiteral => lexeme.chars().next().map(Literal::Char),
            TokenKind::StringLiteral => Some(Literal::Str(lexeme.to_string())),
            _ => None,
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Literal::Int(_) => ValueType::Integer,
            Literal::Real(_) => ValueType::Real,
            Literal::Char(_) => ValueType::Char,
            Literal::Str(_) => ValueType::String,
        }
    }

    /// Numeric value widened to a real.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Literal::Int(i) => Some(*i as f64),
            Literal::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// Literal length: characters for strings, 1 otherwise.
    pub fn dimension(&self) -> usize {
        match self {
            Literal::Str(s) => s.chars().count(),
            _ => 1,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Real(r) => write!(f, "{:?}", r),
            Literal::Char(c) => write!(f, "{:?}", c),
            Literal::Str(s) => write!(f, "'{}'", s),
        }
    }
}

/// One formal parameter of a callable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub symbol: SymbolId,
    /// Declared with `var`
    pub by_ref: bool,
}

/// A declared name, literal or temporary
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    /// Name as stored; callables are mangled
    pub name: String,
    pub kind: DeclKind,
    /// Declared type; return type for functions, `None` for procedures
    pub value_type: Option<ValueType>,
    pub location: SourceLocation,
    /// Literal length, or parameter count for callables
    pub dimension: usize,
    pub params: Vec<Param>,
    pub literal: Option<Literal>,
}

impl Symbol {
    pub fn new(
        name: impl Into<String>,
        kind: DeclKind,
        value_type: Option<ValueType>,
        location: SourceLocation,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            value_type,
            location,
            dimension: 0,
            params: Vec::new(),
            literal: None,
        }
    }

    /// An anonymous constant holding `literal`, named by its spelling.
    pub fn constant(literal: Literal, location: SourceLocation) -> Self {
        let mut symbol = Symbol::new(
            literal.to_string(),
            DeclKind::Const,
            Some(literal.value_type()),
            location,
        );
        symbol.dimension = literal.dimension();
        symbol.literal = Some(literal);
        symbol
    }

    pub fn with_literal(mut self, literal: Literal) -> Self {
        self.dimension = literal.dimension();
        self.literal = Some(literal);
        self
    }

    pub fn with_params(mut self, params: Vec<Param>) -> Self {
        self.dimension = params.len();
        self.params = params;
        self
    }

    pub fn is_callable(&self) -> bool {
        self.kind.is_callable()
    }

    /// A constant whose value is known at compile time.
    pub fn is_foldable(&self) -> bool {
        self.kind == DeclKind::Const && self.literal.is_some()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Overload key of a callable: base name plus one suffix per parameter type.
pub fn mangle_name(base: &str, params: &[ValueType]) -> String {
    let mut name = String::from(base);
    name.push(MANGLE_SEPARATOR);
    if params.is_empty() {
        name.push_str(VOID_SUFFIX);
        return name;
    }
    for ty in params {
        name.push_str(ty.mangle_suffix());
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mangling() {
        assert_eq!(mangle_name("f", &[]), "f$_v");
        assert_eq!(mangle_name("f", &[ValueType::Integer]), "f$_i");
        assert_eq!(
            mangle_name("f", &[ValueType::Real, ValueType::String]),
            "f$_r_s"
        );
        assert_ne!(
            mangle_name("f", &[ValueType::Integer, ValueType::Real]),
            mangle_name("f", &[ValueType::Real, ValueType::Integer])
        );
        assert_ne!(
            mangle_name("f_i", &[ValueType::Integer]),
            mangle_name("f", &[ValueType::Integer, ValueType::Integer])
        );
        assert_ne!(mangle_name("f_v", &[]), mangle_name("f", &[]));
    }

    #[test]
    fn test_accepts() {
        assert!(ValueType::Real.accepts(ValueType::Integer));
        assert!(!ValueType::Integer.accepts(ValueType::Real));
        assert!(ValueType::String.accepts(ValueType::Char));
        assert!(!ValueType::Char.accepts(ValueType::String));
        assert!(ValueType::Boolean.accepts(ValueType::Integer));
        assert!(ValueType::Char.accepts(ValueType::Char));
    }

    #[test]
    fn test_literal_from_token() {
        assert_eq!(
            Literal::from_token(TokenKind::IntLiteral, "42"),
            Some(Literal::Int(42))
        );
        assert_eq!(
            Literal::from_token(TokenKind::RealLiteral, "2.5"),
            Some(Literal::Real(2.5))
        );
        assert_eq!(
            Literal::from_token(TokenKind::CharLiteral, "x"),
            Some(Literal::Char('x'))
        );
        assert_eq!(Literal::from_token(TokenKind::Identifier, "x"), None);
    }

    #[test]
    fn test_constant_symbol() {
        let sym = Symbol::constant(Literal::Str("abc".into()), SourceLocation::new(1, 1));
        assert_eq!(sym.kind, DeclKind::Const);
        assert_eq!(sym.value_type, Some(ValueType::String));
        assert_eq!(sym.dimension, 3);
        assert!(sym.is_foldable());
    }
}
