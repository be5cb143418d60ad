// src/compiler/pipeline.rs
use crate::ast::AbstractSyntaxTree;
use crate::codegen;
use crate::compiler::errors::{CompileError, Diagnostic};
use crate::lexer::{Lexeme, Lexer};
use crate::parser;

/// Etapas da compilação expostas uma a uma, para quem precisa dos resultados
/// intermediários (tokens, árvore) além do bytecode.
pub struct CompilerPipeline<'src> {
    source: &'src str,
    pub context: CompilationContext,
}

/// Tudo o que as etapas já executadas registraram.
#[derive(Debug, Default)]
pub struct CompilationContext {
    pub diagnostics: Vec<Diagnostic>,
}

impl CompilationContext {
    pub fn syntax_errors(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_syntax()).count()
    }
}

impl<'src> CompilerPipeline<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            context: CompilationContext::default(),
        }
    }

    /// Todos os tokens válidos; caracteres ilegais vão para o contexto.
    pub fn tokens(&mut self) -> Vec<Lexeme> {
        let mut lexer = Lexer::new(self.source);
        let lexemes: Vec<Lexeme> = lexer.by_ref().collect();
        self.context
            .diagnostics
            .extend(lexer.into_errors().into_iter().map(|err| Diagnostic::Lexical {
                line: err.line,
                character: err.character,
            }));
        lexemes
    }

    /// Árvore do programa, desde que não haja erro de sintaxe algum.
    pub fn parse(&mut self) -> Result<AbstractSyntaxTree, CompileError> {
        let outcome = parser::parse(self.source);
        let count = outcome.error_count();
        self.context.diagnostics.extend(outcome.diagnostics.iter().cloned());

        match outcome.tree {
            Some(tree) if count == 0 => Ok(tree),
            _ => Err(CompileError::Syntax {
                count: count.max(1),
                diagnostics: outcome.diagnostics,
            }),
        }
    }

    pub fn translate(&self, tree: &AbstractSyntaxTree) -> Result<Vec<String>, CompileError> {
        let code = codegen::translate(tree)?;
        tracing::debug!(instrucoes = code.len(), "tradução concluída");
        Ok(code)
    }

    pub fn run(&mut self) -> Result<Vec<String>, CompileError> {
        let tree = self.parse()?;
        self.translate(&tree)
    }
}

/// Compila um programa inteiro para linhas de bytecode EWVM.
pub fn compile(source: &str) -> Result<Vec<String>, CompileError> {
    CompilerPipeline::new(source).run()
}
