// src/parser.rs
//! Fachada sobre o parser gerado pelo LALRPOP.
//!
//! O parser nunca aborta num programa parcialmente inválido: comandos que não
//! puderam ser analisados são descartados e viram diagnósticos. Só quando a
//! recuperação é impossível (por exemplo, falta o `.` final) a árvore fica ausente.

use crate::ast::AbstractSyntaxTree;
use crate::compiler::errors::Diagnostic;
use crate::grammar;
use crate::lexer::{LexicalError, Lexer, Token};
use lalrpop_util::{ErrorRecovery, ParseError};

/// Resultado da análise sintática: a árvore (se houver) e tudo o que deu errado.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    pub tree: Option<AbstractSyntaxTree>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseOutcome {
    /// Quantidade de erros de sintaxe (recuperados ou fatais).
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_syntax()).count()
    }

    pub fn lexical_errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_syntax())
    }

    pub fn is_clean(&self) -> bool {
        self.tree.is_some() && self.error_count() == 0
    }

    /// A árvore só é entregue quando não houve nenhum erro de sintaxe.
    pub fn into_result(self) -> Result<AbstractSyntaxTree, Vec<Diagnostic>> {
        match self.tree {
            Some(tree) if self.diagnostics.iter().all(|d| !d.is_syntax()) => Ok(tree),
            _ => Err(self.diagnostics),
        }
    }
}

pub fn parse(source: &str) -> ParseOutcome {
    let mut lexer = Lexer::new(source);
    let mut recovered = Vec::new();

    let result = grammar::ProgramParser::new().parse(
        &mut recovered,
        lexer.by_ref().map(|lexeme| Ok::<_, LexicalError>(lexeme.into_triple())),
    );

    let mut diagnostics: Vec<Diagnostic> = recovered.into_iter().map(from_recovery).collect();

    let tree = match result {
        Ok(program) => Some(AbstractSyntaxTree { program }),
        Err(error) => {
            diagnostics.push(from_parse_error(error, 0));
            None
        }
    };

    for diagnostic in &diagnostics {
        tracing::warn!("{}", diagnostic);
    }

    diagnostics.extend(lexer.into_errors().into_iter().map(|err| Diagnostic::Lexical {
        line: err.line,
        character: err.character,
    }));
    diagnostics.sort_by_key(Diagnostic::line);

    tracing::debug!(
        erros = diagnostics.len(),
        arvore = tree.is_some(),
        "análise sintática concluída"
    );

    ParseOutcome { tree, diagnostics }
}

fn from_recovery(recovery: ErrorRecovery<usize, Token, LexicalError>) -> Diagnostic {
    from_parse_error(recovery.error, recovery.dropped_tokens.len())
}

fn from_parse_error(error: ParseError<usize, Token, LexicalError>, dropped: usize) -> Diagnostic {
    match error {
        ParseError::UnrecognizedToken { token: (line, token, _), expected } => Diagnostic::Syntax {
            line,
            kind: token.kind().to_string(),
            value: token.to_string(),
            expected: clean_expected(expected),
            dropped,
        },
        ParseError::ExtraToken { token: (line, token, _) } => Diagnostic::Syntax {
            line,
            kind: token.kind().to_string(),
            value: token.to_string(),
            expected: Vec::new(),
            dropped,
        },
        ParseError::UnrecognizedEof { location, expected } => Diagnostic::UnexpectedEof {
            line: location,
            expected: clean_expected(expected),
        },
        ParseError::InvalidToken { location } => Diagnostic::Syntax {
            line: location,
            kind: "INVALID".to_string(),
            value: String::new(),
            expected: Vec::new(),
            dropped,
        },
        ParseError::User { error } => Diagnostic::Lexical {
            line: error.line,
            character: error.character,
        },
    }
}

// O LALRPOP entrega os terminais esperados entre aspas
fn clean_expected(expected: Vec<String>) -> Vec<String> {
    expected
        .into_iter()
        .map(|name| name.trim_matches('"').to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;

    fn parse_ok(source: &str) -> AbstractSyntaxTree {
        let outcome = parse(source);
        assert_eq!(outcome.error_count(), 0, "diagnósticos: {:?}", outcome.diagnostics);
        outcome.into_result().expect("árvore")
    }

    fn main_statements(tree: &AbstractSyntaxTree) -> &[Statement] {
        &tree.program.block.statements.statements
    }

    #[test]
    fn programa_minimo() {
        let tree = parse_ok("program Vazio; begin end.");
        assert_eq!(tree.program.heading.name, "Vazio");
        assert!(tree.program.block.functions.is_empty());
        assert!(tree.program.block.variables.is_empty());
    }

    #[test]
    fn cabecalho_com_parametros() {
        let tree = parse_ok("program P(input, output); begin end.");
        assert_eq!(tree.program.heading.parameters, vec!["input", "output"]);
    }

    #[test]
    fn multiplicacao_antes_da_soma() {
        let tree = parse_ok("program P; var x: integer; begin x := 2 + 3 * 4 end.");
        let Statement::Assignment(assignment) = &main_statements(&tree)[0] else {
            panic!("esperava atribuição");
        };
        let Expression::Binary(soma) = &assignment.value else {
            panic!("esperava expressão binária");
        };
        assert_eq!(soma.operator, BinaryOperator::Add);
        assert!(matches!(
            &*soma.right,
            Expression::Binary(b) if b.operator == BinaryOperator::Multiply
        ));
    }

    #[test]
    fn potencia_associa_a_direita() {
        let tree = parse_ok("program P; var x: integer; begin x := 2 ** 3 ** 2 end.");
        let Statement::Assignment(assignment) = &main_statements(&tree)[0] else {
            panic!("esperava atribuição");
        };
        let Expression::Exponentiation(potencia) = &assignment.value else {
            panic!("esperava potência");
        };
        assert_eq!(*potencia.base, Expression::Constant(Constant::Integer(2)));
        assert!(matches!(*potencia.exponent, Expression::Exponentiation(_)));
    }

    #[test]
    fn else_pertence_ao_if_mais_interno() {
        let tree = parse_ok(
            "program P; var x: integer; begin if x = 1 then if x = 2 then x := 3 else x := 4 end.",
        );
        let Statement::If(externo) = &main_statements(&tree)[0] else {
            panic!("esperava if");
        };
        assert!(externo.else_branch.is_none());
        let Statement::If(interno) = externo.then_branch.as_ref() else {
            panic!("esperava if aninhado");
        };
        assert!(interno.else_branch.is_some());
    }

    #[test]
    fn while_e_for_com_if_aberto() {
        let tree = parse_ok(
            "program P; var i, s: integer; begin \
             for i := 10 downto 1 do if i mod 2 = 0 then s := s + i; \
             while s > 0 do s := s - 1 \
             end.",
        );
        let stmts = main_statements(&tree);
        assert_eq!(stmts.len(), 2);
        let Statement::For(laco) = &stmts[0] else {
            panic!("esperava for");
        };
        assert_eq!(laco.direction, Direction::DownTo);
        assert!(matches!(laco.body.as_ref(), Statement::If(_)));
        assert!(matches!(stmts[1], Statement::While(_)));
    }

    #[test]
    fn declaracoes_de_funcao() {
        let tree = parse_ok(
            "program P; \
             function Soma(a, b: integer; var c: real): integer; forward; \
             function Soma; begin Soma := a + b end; \
             function Dobro(n: integer): integer; begin Dobro := n * 2 end; \
             var x: integer; \
             begin x := Dobro(2) end.",
        );
        let functions = &tree.program.block.functions;
        assert_eq!(functions.len(), 3);
        match &functions[0] {
            FunctionDeclaration::Directive { heading, directive } => {
                assert_eq!(heading.name, "Soma");
                assert_eq!(heading.parameter_count(), 3);
                assert_eq!(*directive, Directive::Forward);
            }
            outra => panic!("esperava diretiva, veio {:?}", outra),
        }
        assert!(matches!(&functions[1], FunctionDeclaration::Body { name, .. } if name == "Soma"));
        assert!(matches!(&functions[2], FunctionDeclaration::Definition { .. }));
    }

    #[test]
    fn arrays_e_conjuntos() {
        let tree = parse_ok(
            "program P; var v: array[1..5] of integer; b: boolean; \
             begin v[2] := 7; b := 3 in [1, 2..4] end.",
        );
        let decl = &tree.program.block.variables[0];
        let TypeDenoter::Array(array) = &decl.type_denoter else {
            panic!("esperava array");
        };
        assert_eq!(array.low, Expression::Constant(Constant::Integer(1)));
        assert_eq!(*array.element, TypeDenoter::Integer);

        let Statement::Assignment(atribuicao) = &main_statements(&tree)[1] else {
            panic!("esperava atribuição");
        };
        let Expression::Binary(teste) = &atribuicao.value else {
            panic!("esperava in");
        };
        assert_eq!(teste.operator, BinaryOperator::In);
        let Expression::Set(conjunto) = &*teste.right else {
            panic!("esperava conjunto");
        };
        assert_eq!(conjunto.members.len(), 2);
        assert!(matches!(conjunto.members[1], SetMember::Range { .. }));
    }

    #[test]
    fn parametros_formatados_do_write() {
        let tree = parse_ok("program P; var r: real; begin writeln(r:8:2, 'x') end.");
        let Statement::ProcedureCall(chamada) = &main_statements(&tree)[0] else {
            panic!("esperava chamada");
        };
        assert_eq!(chamada.arguments.len(), 2);
        assert!(matches!(
            chamada.arguments[0],
            ActualParameter::Formatted { precision: Some(_), .. }
        ));
    }

    #[test]
    fn comando_invalido_e_descartado() {
        let outcome = parse(
            "program P;\nvar x: integer;\nbegin\n  x := 1;\n  x := := 2;\n  x := 3\nend.",
        );
        assert_eq!(outcome.error_count(), 1);
        match &outcome.diagnostics[0] {
            Diagnostic::Syntax { line, kind, value, .. } => {
                assert_eq!(*line, 5);
                assert_eq!(kind, "ASSIGNMENT");
                assert_eq!(value, ":=");
            }
            outro => panic!("diagnóstico inesperado: {:?}", outro),
        }
        let tree = outcome.tree.clone().expect("árvore parcial");
        assert_eq!(tree.program.block.statements.statements.len(), 2);
        assert!(outcome.into_result().is_err());
    }

    #[test]
    fn fim_de_arquivo_inesperado() {
        let outcome = parse("program P;\nbegin\n  x := 1\nend");
        assert!(outcome.tree.is_none());
        assert_eq!(outcome.error_count(), 1);
        assert!(matches!(
            outcome.diagnostics[0],
            Diagnostic::UnexpectedEof { line: 4, .. }
        ));
    }

    #[test]
    fn erro_lexico_nao_conta_como_sintatico() {
        let outcome = parse("program P;\nvar x: integer;\nbegin x := 1 @ end.");
        assert_eq!(outcome.error_count(), 0);
        assert_eq!(outcome.lexical_errors().count(), 1);
        assert!(outcome.is_clean());
    }
}
