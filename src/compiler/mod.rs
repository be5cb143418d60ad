// src/compiler/mod.rs
pub mod errors;
pub mod pipeline;
pub mod symbol_table;

pub use errors::{CompileError, Diagnostic, SymbolKind, TranslationError};
pub use pipeline::{compile, CompilerPipeline};
