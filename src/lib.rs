// src/lib.rs

//! Compilador de um subconjunto de Pascal para a máquina virtual EWVM
//!
//! Este projeto implementa as etapas clássicas de um compilador:
//! - Análise léxica com `logos`
//! - Análise sintática LR(1) com `lalrpop`, com recuperação de erros
//! - Árvore sintática percorrida por visitantes
//! - Tradução para o assembly textual da EWVM, com verificação de tipos
//! - Impressão da árvore para depuração
//!
//! Um interpretador mínimo da EWVM acompanha o compilador para executar o código gerado.

pub mod ast;
pub mod codegen;
pub mod compiler;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod runtime;
pub mod stdlib;
pub mod type_checker;
pub mod type_inference;

// Parser gerado pelo LALRPOP a partir de src/grammar.lalrpop
use lalrpop_util::lalrpop_mod;
lalrpop_mod!(
    #[allow(clippy::all, unused_parens)]
    pub grammar
);

// Re-exportações básicas
pub use ast::{AbstractSyntaxTree, Node, Visitor};
pub use codegen::{translate, Translator};
pub use compiler::{compile, CompileError, CompilerPipeline, Diagnostic, TranslationError};
pub use lexer::{tokenize, Lexeme, Token};
pub use parser::{parse, ParseOutcome};
pub use printer::{print_ast, AstPrinter};
