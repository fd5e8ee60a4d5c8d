//! Compilation options
//!
//! The front end has no configuration file; everything a caller can tune
//! travels in [`CompileOptions`]. The binary maps its command-line flags onto
//! this struct.

/// Options controlling a single compilation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Echo every token as `<lexeme> -> <KIND>` on stderr.
    pub trace_tokens: bool,
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token_trace(mut self) -> Self {
        self.trace_tokens = true;
        self
    }
}
