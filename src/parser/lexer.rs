//! Lexer (tokenizer) for Pascal-subset source code
//!
//! Hands out one [`Token`] per call to [`Lexer::next_token`]; no token history
//! is kept. Characters are gathered into a word until whitespace, a `{ ... }`
//! comment, a quote or an operator ends it. Operators are resolved by longest
//! match: up to [`MAX_OPERATOR_WIDTH`] characters are examined and the
//! candidate is shrunk from the right until it is a known spelling, so only
//! the matched characters are consumed.
//!
//! When a literal or operator is found right after a word, the word is
//! returned first and the literal/operator is *stocked* and returned by the
//! following call.

use crate::constants::MAX_OPERATOR_WIDTH;
use crate::errors::CompileError;
use std::fmt;
use std::fs;
use std::path::Path;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, char {}", self.line, self.column)
    }
}

/// Every token class the lexer can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Reserved words
    And,
    Array,
    Asm,
    Begin,
    Boolean,
    Break,
    Case,
    Char,
    Const,
    Constructor,
    Continue,
    Destructor,
    Div,
    Do,
    Downto,
    Else,
    End,
    File,
    For,
    Function,
    Goto,
    If,
    Implementation,
    In,
    Inline,
    Integer,
    Interface,
    Label,
    Mod,
    Nil,
    Not,
    Object,
    Of,
    On,
    Operator,
    Or,
    Packed,
    Procedure,
    Program,
    Read,
    Real,
    Record,
    Repeat,
    Set,
    Shl,
    Shr,
    String,
    Then,
    To,
    Type,
    Unit,
    Until,
    Uses,
    Var,
    While,
    With,
    Write,
    Writeln,
    Xor,

    // Operators and punctuation
    Semicolon, // ;
    Colon,     // :
    Period,    // .
    Plus,      // +
    Minus,     // -
    Star,      // *
    Slash,     // /
    Comma,     // ,
    Assign,    // :=
    Eq,        // =
    Lt,        // <
    Le,        // <=
    Gt,        // >
    Ge,        // >=
    Ne,        // <>
    LParen,    // (
    RParen,    // )

    // Literal classes
    Identifier,
    IntLiteral,
    RealLiteral,
    StringLiteral,
    CharLiteral,

    // Sentinels
    EndOfFile,
    Error,
}

/// Reserved words, scanned linearly after case folding.
const KEYWORDS: &[(&str, TokenKind)] = &[
    ("and", TokenKind::And),
    ("array", TokenKind::Array),
    ("asm", TokenKind::Asm),
    ("begin", TokenKind::Begin),
    ("boolean", TokenKind::Boolean),
    ("break", TokenKind::Break),
    ("case", TokenKind::Case),
    ("char", TokenKind::Char),
    ("const", TokenKind::Const),
    ("constructor", TokenKind::Constructor),
    ("continue", TokenKind::Continue),
    ("destructor", TokenKind::Destructor),
    ("div", TokenKind::Div),
    ("do", TokenKind::Do),
    ("downto", TokenKind::Downto),
    ("else", TokenKind::Else),
    ("end", TokenKind::End),
    ("file", TokenKind::File),
    ("for", TokenKind::For),
    ("function", TokenKind::Function),
    ("goto", TokenKind::Goto),
    ("if", TokenKind::If),
    ("implementation", TokenKind::Implementation),
    ("in", TokenKind::In),
    ("inline", TokenKind::Inline),
    ("integer", TokenKind::Integer),
    ("interface", TokenKind::Interface),
    ("label", TokenKind::Label),
    ("mod", TokenKind::Mod),
    ("nil", TokenKind::Nil),
    ("not", TokenKind::Not),
    ("object", TokenKind::Object),
    ("of", TokenKind::Of),
    ("on", TokenKind::On),
    ("operator", TokenKind::Operator),
    ("or", TokenKind::Or),
    ("packed", TokenKind::Packed),
    ("procedure", TokenKind::Procedure),
    ("program", TokenKind::Program),
    ("read", TokenKind::Read),
    ("real", TokenKind::Real),
    ("record", TokenKind::Record),
    ("repeat", TokenKind::Repeat),
    ("set", TokenKind::Set),
    ("shl", TokenKind::Shl),
    ("shr", TokenKind::Shr),
    ("string", TokenKind::String),
    ("then", TokenKind::Then),
    ("to", TokenKind::To),
    ("type", TokenKind::Type),
    ("unit", TokenKind::Unit),
    ("until", TokenKind::Until),
    ("uses", TokenKind::Uses),
    ("var", TokenKind::Var),
    ("while", TokenKind::While),
    ("with", TokenKind::With),
    ("write", TokenKind::Write),
    ("writeln", TokenKind::Writeln),
    ("xor", TokenKind::Xor),
];

const OPERATORS: &[(&str, TokenKind)] = &[
    (";", TokenKind::Semicolon),
    (":", TokenKind::Colon),
    (".", TokenKind::Period),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    (",", TokenKind::Comma),
    (":=", TokenKind::Assign),
    ("=", TokenKind::Eq),
    ("<", TokenKind::Lt),
    ("<=", TokenKind::Le),
    (">", TokenKind::Gt),
    (">=", TokenKind::Ge),
    ("<>", TokenKind::Ne),
    ("(", TokenKind::LParen),
    (")", TokenKind::RParen),
];

fn keyword_kind(word: &str) -> Option<TokenKind> {
    KEYWORDS
        .iter()
        .find(|(spelling, _)| *spelling == word)
        .map(|(_, kind)| *kind)
}

fn operator_kind(word: &str) -> Option<TokenKind> {
    OPERATORS
        .iter()
        .find(|(spelling, _)| *spelling == word)
        .map(|(_, kind)| *kind)
}

impl TokenKind {
    /// Source spelling of a reserved word or operator.
    pub fn spelling(self) -> Option<&'static str> {
        KEYWORDS
            .iter()
            .chain(OPERATORS.iter())
            .find(|(_, kind)| *kind == self)
            .map(|(spelling, _)| *spelling)
    }

    /// Literal token classes (`1`, `1.5`, `'a'`, `'abc'`).
    pub fn is_value(self) -> bool {
        matches!(
            self,
            TokenKind::IntLiteral
                | TokenKind::RealLiteral
                | TokenKind::StringLiteral
                | TokenKind::CharLiteral
        )
    }

    /// Type keywords usable in declarations.
    pub fn is_variable_type(self) -> bool {
        matches!(
            self,
            TokenKind::Integer
                | TokenKind::Real
                | TokenKind::String
                | TokenKind::Char
                | TokenKind::Boolean
        )
    }

    /// Upper-snake name used by the token trace, e.g. `ASSIGN_TOKEN`.
    pub fn trace_name(self) -> String {
        let debug = format!("{:?}", self);
        let mut name = String::with_capacity(debug.len() + 6);
        for (i, ch) in debug.chars().enumerate() {
            if ch.is_ascii_uppercase() && i > 0 {
                name.push('_');
            }
            name.push(ch.to_ascii_uppercase());
        }
        name.push_str("_TOKEN");
        name
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier => write!(f, "identifier"),
            TokenKind::IntLiteral => write!(f, "integer number"),
            TokenKind::RealLiteral => write!(f, "real number"),
            TokenKind::StringLiteral => write!(f, "string literal"),
            TokenKind::CharLiteral => write!(f, "character"),
            TokenKind::EndOfFile => write!(f, "eof"),
            TokenKind::Error => write!(f, "invalid token"),
            other => write!(f, "{}", other.spelling().unwrap_or("?")),
        }
    }
}

/// A classified token with its (case-folded) lexeme and start position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub location: SourceLocation,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        lexeme: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            location,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Identifier
            | TokenKind::IntLiteral
            | TokenKind::RealLiteral
            | TokenKind::StringLiteral
            | TokenKind::CharLiteral
            | TokenKind::EndOfFile => write!(f, "{}", self.kind),
            _ => write!(f, "{}", self.lexeme),
        }
    }
}

/// Numeric test: digits, a single leading sign only when the word is longer
/// than one character, and at most one `.`.
fn number_kind(word: &str) -> Option<TokenKind> {
    let length = word.chars().count();
    let mut is_decimal = false;
    let mut has_digit = false;

    for (i, ch) in word.chars().enumerate() {
        if ch.is_ascii_digit() {
            has_digit = true;
        } else if i == 0 && (ch == '+' || ch == '-') && length > 1 {
            continue;
        } else if ch == '.' && length != 1 && !is_decimal {
            is_decimal = true;
        } else {
            return None;
        }
    }

    if !has_digit {
        return None;
    }
    Some(if is_decimal {
        TokenKind::RealLiteral
    } else {
        TokenKind::IntLiteral
    })
}

fn is_identifier(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        && keyword_kind(word).is_none()
        && operator_kind(word).is_none()
}

/// Classify an already case-folded word.
fn classify_word(word: &str) -> TokenKind {
    if is_identifier(word) {
        return TokenKind::Identifier;
    }
    if let Some(kind) = number_kind(word) {
        return kind;
    }
    if let Some(kind) = keyword_kind(word) {
        return kind;
    }
    if let Some(kind) = operator_kind(word) {
        return kind;
    }
    TokenKind::Error
}

/// Pull-based lexer over one source buffer.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    stocked: Option<Token>,
    trace: bool,
}

impl Lexer {
    /// Create a lexer over an in-memory source string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            stocked: None,
            trace: false,
        }
    }

    /// Open the source file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CompileError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|err| CompileError::Io {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        Ok(Self::new(&source))
    }

    /// Echo each token on stderr as `<lexeme> -> <KIND>`.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Release the source buffer and any stocked token. Safe to call twice.
    pub fn close(&mut self) {
        self.input = Vec::new();
        self.position = 0;
        self.stocked = None;
    }

    /// Produce the next token.
    pub fn next_token(&mut self) -> Result<Token, CompileError> {
        let token = match self.stocked.take() {
            Some(token) => token,
            None => self.scan()?,
        };

        if self.trace {
            eprintln!("{} -> {}", token.lexeme, token.kind.trace_name());
        }
        Ok(token)
    }

    fn scan(&mut self) -> Result<Token, CompileError> {
        let mut word = String::new();
        let mut start = self.current_location();

        loop {
            let Some(ch) = self.peek() else {
                if word.is_empty() {
                    return Ok(Token::new(
                        TokenKind::EndOfFile,
                        "",
                        self.current_location(),
                    ));
                }
                return self.finish_word(&word, start);
            };

            if ch.is_whitespace() {
                if !word.is_empty() {
                    return self.finish_word(&word, start);
                }
                self.advance();
                continue;
            }

            if ch == '{' {
                self.skip_comment()?;
                if !word.is_empty() {
                    return self.finish_word(&word, start);
                }
                continue;
            }

            if ch == '\'' {
                let literal = self.string_literal()?;
                return self.deliver(&word, start, literal);
            }

            if let Some(operator) = self.match_operator(&word) {
                return self.deliver(&word, start, operator);
            }

            if word.is_empty() {
                start = self.current_location();
            }
            word.push(ch);
            self.advance();
        }
    }

    /// Return the pending word and stock `pending`, or return `pending`
    /// directly when no word was in progress.
    fn deliver(
        &mut self,
        word: &str,
        start: SourceLocation,
        pending: Token,
    ) -> Result<Token, CompileError> {
        if word.is_empty() {
            return Ok(pending);
        }
        let token = self.finish_word(word, start)?;
        self.stocked = Some(pending);
        Ok(token)
    }

    fn finish_word(
        &self,
        word: &str,
        start: SourceLocation,
    ) -> Result<Token, CompileError> {
        let folded = word.to_lowercase();
        let kind = classify_word(&folded);

        match kind {
            TokenKind::Error => {
                let message = if folded.starts_with(|c: char| c.is_ascii_digit()) {
                    format!("identifier {} starts with a digit", word)
                } else {
                    format!("illegal token {}", word)
                };
                Err(CompileError::Lex {
                    message,
                    location: start,
                })
            }
            TokenKind::IntLiteral if folded.parse::<i64>().is_err() => {
                Err(CompileError::Lex {
                    message: format!("integer literal {} is out of range", word),
                    location: start,
                })
            }
            _ => Ok(Token::new(kind, folded, start)),
        }
    }

    /// Longest-match operator at the cursor. A `.` right after a number is a
    /// decimal point and does not match.
    fn match_operator(&mut self, word: &str) -> Option<Token> {
        let window: Vec<char> = (0..MAX_OPERATOR_WIDTH)
            .map_while(|n| self.peek_ahead(n))
            .collect();

        for width in (1..=window.len()).rev() {
            let candidate: String = window[..width].iter().collect();
            let Some(kind) = operator_kind(&candidate) else {
                continue;
            };
            if kind == TokenKind::Period && number_kind(word).is_some() {
                return None;
            }

            let location = self.current_location();
            for _ in 0..width {
                self.advance();
            }
            return Some(Token::new(kind, candidate, location));
        }
        None
    }

    /// Scan a quoted literal; the cursor is on the opening quote.
    fn string_literal(&mut self) -> Result<Token, CompileError> {
        let location = self.current_location();
        self.advance(); // opening quote
        let mut text = String::new();

        loop {
            match self.peek() {
                Some('\'') => {
                    self.advance();
                    break;
                }
                Some('\n') => {
                    return Err(CompileError::Lex {
                        message: "string literal exceeds line".to_string(),
                        location,
                    });
                }
                Some(ch) => {
                    text.push(ch);
                    self.advance();
                }
                None => {
                    return Err(CompileError::Lex {
                        message: "unclosed string literal".to_string(),
                        location,
                    });
                }
            }
        }

        let kind = if text.chars().count() == 1 {
            TokenKind::CharLiteral
        } else {
            TokenKind::StringLiteral
        };
        Ok(Token::new(kind, text, location))
    }

    /// Skip a `{ ... }` comment (no nesting); the cursor is on the `{`.
    fn skip_comment(&mut self) -> Result<(), CompileError> {
        let start = self.current_location();
        self.advance();

        while let Some(ch) = self.advance() {
            if ch == '}' {
                return Ok(());
            }
        }

        Err(CompileError::Lex {
            message: "unclosed comment".to_string(),
            location: start,
        })
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;

        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }

        Some(ch)
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }
}
