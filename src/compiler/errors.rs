// src/compiler/errors.rs
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Problema encontrado na análise léxica ou sintática.
///
/// Nenhum destes interrompe o parser: são acumulados e inspecionados por quem chamou.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "tipo", rename_all = "snake_case")]
pub enum Diagnostic {
    Lexical {
        line: usize,
        character: char,
    },
    Syntax {
        line: usize,
        kind: String,
        value: String,
        expected: Vec<String>,
        /// Tokens descartados até o parser conseguir se recuperar
        dropped: usize,
    },
    UnexpectedEof {
        line: usize,
        expected: Vec<String>,
    },
}

impl Diagnostic {
    pub fn line(&self) -> usize {
        match self {
            Diagnostic::Lexical { line, .. }
            | Diagnostic::Syntax { line, .. }
            | Diagnostic::UnexpectedEof { line, .. } => *line,
        }
    }

    pub fn is_syntax(&self) -> bool {
        !matches!(self, Diagnostic::Lexical { .. })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Diagnostic::Lexical { line, character } => {
                write!(f, "linha {}: caractere ilegal '{}'", line, character)
            }
            Diagnostic::Syntax { line, kind, value, expected, .. } => {
                write!(f, "linha {}: erro de sintaxe em {} '{}'", line, kind, value)?;
                write_expected(f, expected)
            }
            Diagnostic::UnexpectedEof { line, expected } => {
                write!(f, "linha {}: fim de arquivo inesperado", line)?;
                write_expected(f, expected)
            }
        }
    }
}

fn write_expected(f: &mut fmt::Formatter, expected: &[String]) -> fmt::Result {
    if expected.is_empty() {
        return Ok(());
    }
    write!(f, " (esperado: {})", expected.join(", "))
}

/// Erro fatal da tradução: o primeiro encontrado aborta a geração de código.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslationError {
    #[error("{kind} '{name}' não declarado(a)")]
    Undeclared { kind: SymbolKind, name: String },

    #[error("'{name}' espera {expected} argumento(s), recebeu {found}")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("tipos incompatíveis em {context}: esperado {expected}, encontrado {found}")]
    TypeMismatch {
        expected: String,
        found: String,
        context: String,
    },

    #[error("'{name}' não é um array")]
    NotAnArray { name: String },

    #[error("{what} precisa ser uma constante inteira")]
    NonConstant { what: String },

    #[error("limites inválidos para o array '{name}': {low}..{high}")]
    InvalidBounds { name: String, low: i64, high: i64 },

    #[error("expoente precisa ser uma constante inteira não negativa")]
    DynamicExponent,

    #[error("operador '{operator}' não suportado")]
    UnsupportedOperator { operator: String },

    #[error("construção não suportada: {construct}")]
    Unsupported { construct: String },

    #[error("'{name}' já declarado neste escopo")]
    DuplicateDeclaration { name: String },

    #[error("função '{name}' declarada forward nunca recebeu corpo")]
    UndefinedForward { name: String },

    #[error("função '{name}' é external e não pode ser ligada")]
    ExternalLinkage { name: String },
}

impl TranslationError {
    /// Identificador curto e estável do tipo de erro.
    pub fn kind(&self) -> &'static str {
        match self {
            TranslationError::Undeclared { .. } => "undeclared",
            TranslationError::ArityMismatch { .. } => "arity_mismatch",
            TranslationError::TypeMismatch { .. } => "type_mismatch",
            TranslationError::NotAnArray { .. } => "not_an_array",
            TranslationError::NonConstant { .. } => "non_constant",
            TranslationError::InvalidBounds { .. } => "invalid_bounds",
            TranslationError::DynamicExponent => "dynamic_exponent",
            TranslationError::UnsupportedOperator { .. } => "unsupported_operator",
            TranslationError::Unsupported { .. } => "unsupported",
            TranslationError::DuplicateDeclaration { .. } => "duplicate_declaration",
            TranslationError::UndefinedForward { .. } => "undefined_forward",
            TranslationError::ExternalLinkage { .. } => "external_linkage",
        }
    }

    pub(crate) fn type_mismatch(
        expected: impl fmt::Display,
        found: impl fmt::Display,
        context: impl Into<String>,
    ) -> Self {
        TranslationError::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
            context: context.into(),
        }
    }

    pub(crate) fn unsupported(construct: impl Into<String>) -> Self {
        TranslationError::Unsupported {
            construct: construct.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function,
    Procedure,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let nome = match self {
            SymbolKind::Variable => "variável",
            SymbolKind::Function => "função",
            SymbolKind::Procedure => "procedimento",
        };
        write!(f, "{}", nome)
    }
}

/// Falha de `compile`: ou o programa tem erros de sintaxe, ou a tradução falhou.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{count} erro(s) de sintaxe")]
    Syntax {
        count: usize,
        diagnostics: Vec<Diagnostic>,
    },

    #[error(transparent)]
    Translation(#[from] TranslationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mensagens_de_diagnostico() {
        let diag = Diagnostic::Syntax {
            line: 3,
            kind: "SEMICOLON".into(),
            value: ";".into(),
            expected: vec!["end".into()],
            dropped: 1,
        };
        assert_eq!(
            diag.to_string(),
            "linha 3: erro de sintaxe em SEMICOLON ';' (esperado: end)"
        );
        assert!(diag.is_syntax());

        let eof = Diagnostic::UnexpectedEof { line: 7, expected: vec![] };
        assert_eq!(eof.to_string(), "linha 7: fim de arquivo inesperado");
        assert_eq!(eof.line(), 7);

        let lex = Diagnostic::Lexical { line: 2, character: '@' };
        assert!(!lex.is_syntax());
    }

    #[test]
    fn erro_de_traducao_tem_tag_estavel() {
        let err = TranslationError::ArityMismatch {
            name: "length".into(),
            expected: 1,
            found: 2,
        };
        assert_eq!(err.kind(), "arity_mismatch");
        assert_eq!(err.to_string(), "'length' espera 1 argumento(s), recebeu 2");

        let err = TranslationError::Undeclared {
            kind: SymbolKind::Variable,
            name: "y".into(),
        };
        assert_eq!(err.to_string(), "variável 'y' não declarado(a)");
    }

    #[test]
    fn compile_error_envolve_traducao() {
        let err: CompileError = TranslationError::DynamicExponent.into();
        assert!(matches!(err, CompileError::Translation(TranslationError::DynamicExponent)));
    }
}
