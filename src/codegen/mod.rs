// src/codegen/mod.rs
//! Tradução da árvore para o bytecode da EWVM.
//!
//! Ordem de emissão do programa:
//! 1. inicialização das variáveis globais e `jump main`;
//! 2. o bloco de cada função, rotulado com o nome dela e terminado em `return`;
//! 3. `main:`, `start`, os comandos do programa principal e `stop`.
//!
//! Todo o estado (escopos, contadores de rótulos) vive num [`Translator`] novo
//! a cada chamada de [`translate`].

mod expressions;
mod statements;

use crate::ast::*;
use crate::compiler::errors::{SymbolKind, TranslationError};
use crate::compiler::symbol_table::{DataType, FunctionSignature, Scopes, Symbol};
use crate::stdlib::Builtin;
use crate::type_inference::constant_integer;
use std::collections::HashMap;

pub type Code = Result<Vec<String>, TranslationError>;

/// Maior número de elementos de um array declarado.
pub const MAX_ARRAY_SIZE: usize = 65_536;

/// Traduz um programa inteiro. O primeiro erro encontrado aborta a tradução.
pub fn translate(tree: &AbstractSyntaxTree) -> Code {
    let mut translator = Translator::new();
    tree.evaluate(&mut translator)
}

#[derive(Debug, Default)]
struct LabelCounters {
    ifs: usize,
    whiles: usize,
    fors: usize,
}

impl LabelCounters {
    fn next(counter: &mut usize) -> usize {
        let current = *counter;
        *counter += 1;
        current
    }
}

/// Função cujo corpo está sendo traduzido.
#[derive(Debug, Clone)]
struct Frame {
    name: String,
    result_slot: usize,
    result: DataType,
}

#[derive(Debug, Default)]
pub struct Translator {
    scopes: Scopes,
    labels: LabelCounters,
    frame: Option<Frame>,
    /// Cabeçalhos `forward` à espera do corpo
    pending: HashMap<String, FunctionHeading>,
}

impl Translator {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_if(&mut self) -> usize {
        LabelCounters::next(&mut self.labels.ifs)
    }

    fn next_while(&mut self) -> usize {
        LabelCounters::next(&mut self.labels.whiles)
    }

    fn next_for(&mut self) -> usize {
        LabelCounters::next(&mut self.labels.fors)
    }

    /// Assinatura de uma função a partir do cabeçalho, validando nome e parâmetros.
    fn signature(&self, heading: &FunctionHeading, directive: Option<Directive>) -> Result<FunctionSignature, TranslationError> {
        if heading.name.eq_ignore_ascii_case("main") {
            return Err(TranslationError::unsupported("função chamada 'main'"));
        }
        if Builtin::lookup(&heading.name).is_some() {
            return Err(TranslationError::DuplicateDeclaration {
                name: heading.name.clone(),
            });
        }
        let parameters = parameter_list(heading)?
            .into_iter()
            .map(|(_, ty)| ty)
            .collect();
        let result = DataType::from_scalar(&heading.result)
            .ok_or_else(|| TranslationError::unsupported("função que devolve array"))?;
        Ok(FunctionSignature {
            label: heading.name.clone(),
            parameters,
            result,
            directive,
            has_body: directive.is_none(),
            called: false,
        })
    }

    /// Emite o bloco de uma função: rótulo, parâmetros, locais, corpo e retorno.
    fn function_body(&mut self, label: &str, heading: &FunctionHeading, block: &Block) -> Code {
        if !block.functions.is_empty() {
            return Err(TranslationError::unsupported("função aninhada"));
        }
        let result = DataType::from_scalar(&heading.result)
            .ok_or_else(|| TranslationError::unsupported("função que devolve array"))?;

        self.scopes.enter_function(label);
        let result_slot = self.scopes.allocate(1);
        self.frame = Some(Frame {
            name: label.to_string(),
            result_slot,
            result,
        });
        tracing::trace!(funcao = label, slot_resultado = result_slot, "traduzindo função");

        let mut code = vec![format!("{}:", label)];
        let mut parameter_slots = Vec::new();
        for (name, ty) in parameter_list(heading)? {
            let slot = self.scopes.allocate(1);
            self.scopes.declare(&name, Symbol::scalar(slot, ty))?;
            parameter_slots.push(slot);
        }
        // O último argumento está no topo da pilha
        for slot in parameter_slots.iter().rev() {
            code.push(format!("storeg {}", slot));
        }
        for declaration in &block.variables {
            code.extend(declaration.evaluate(self)?);
        }
        code.extend(block.evaluate(self)?);
        code.push(format!("pushg {}", result_slot));
        code.push("return".to_string());

        self.frame = None;
        self.scopes.exit_function();
        Ok(code)
    }

    /// Uma função chamada que ficou só no `forward` não tem código para onde saltar.
    fn check_forwards(&self) -> Result<(), TranslationError> {
        let mut missing: Vec<&FunctionSignature> = self
            .scopes
            .functions()
            .filter(|f| f.directive == Some(Directive::Forward) && !f.has_body && f.called)
            .collect();
        missing.sort_by(|a, b| a.label.cmp(&b.label));
        match missing.first() {
            Some(function) => Err(TranslationError::UndefinedForward {
                name: function.label.clone(),
            }),
            None => Ok(()),
        }
    }

    fn undeclared_variable(name: &str) -> TranslationError {
        TranslationError::Undeclared {
            kind: SymbolKind::Variable,
            name: name.to_string(),
        }
    }
}

/// Nomes e tipos dos parâmetros, na ordem da declaração.
fn parameter_list(heading: &FunctionHeading) -> Result<Vec<(String, DataType)>, TranslationError> {
    let mut parameters = Vec::new();
    for section in &heading.parameters {
        let (names, ty) = match section {
            ParameterSection::Value { names, ty } | ParameterSection::Variable { names, ty } => (names, ty),
            ParameterSection::Functional(_) => {
                return Err(TranslationError::unsupported("parâmetro funcional"))
            }
        };
        let ty = DataType::from_scalar(ty)
            .ok_or_else(|| TranslationError::unsupported("parâmetro do tipo array"))?;
        parameters.extend(names.iter().map(|name| (name.clone(), ty)));
    }
    Ok(parameters)
}

impl Visitor for Translator {
    type Output = Code;

    fn visit_program(&mut self, program: &Program) -> Code {
        tracing::debug!(programa = %program.heading.name, "iniciando tradução");

        let mut code = Vec::new();
        for declaration in &program.block.variables {
            code.extend(declaration.evaluate(self)?);
        }
        code.push("jump main".to_string());

        for function in &program.block.functions {
            code.extend(function.evaluate(self)?);
        }

        code.push("main:".to_string());
        code.push("start".to_string());
        code.extend(program.block.evaluate(self)?);
        code.push("stop".to_string());

        self.check_forwards()?;

        tracing::debug!(
            instrucoes = code.len(),
            slots = self.scopes.slots_used(),
            "tradução concluída"
        );
        Ok(code)
    }

    fn visit_block(&mut self, block: &Block) -> Code {
        let mut code = Vec::new();
        for statement in &block.statements.statements {
            code.extend(statement.evaluate(self)?);
        }
        Ok(code)
    }

    fn visit_function_declaration(&mut self, declaration: &FunctionDeclaration) -> Code {
        match declaration {
            FunctionDeclaration::Definition { heading, block } => {
                let declared = self.signature(heading, None)?;
                let label = match self.scopes.function_mut(&heading.name) {
                    // Definição completa de uma função anunciada com forward
                    Some(existing) if existing.directive == Some(Directive::Forward) && !existing.has_body => {
                        if existing.parameters != declared.parameters || existing.result != declared.result {
                            return Err(TranslationError::type_mismatch(
                                format!("{:?} -> {}", existing.parameters, existing.result),
                                format!("{:?} -> {}", declared.parameters, declared.result),
                                format!("definição de '{}'", heading.name),
                            ));
                        }
                        existing.has_body = true;
                        existing.label.clone()
                    }
                    Some(_) => {
                        return Err(TranslationError::DuplicateDeclaration {
                            name: heading.name.clone(),
                        })
                    }
                    None => {
                        let label = declared.label.clone();
                        self.scopes.declare_function(declared)?;
                        label
                    }
                };
                self.pending.remove(&heading.name.to_lowercase());
                self.function_body(&label, heading, block)
            }
            FunctionDeclaration::Directive { heading, directive } => {
                let signature = self.signature(heading, Some(*directive))?;
                self.scopes.declare_function(signature)?;
                if *directive == Directive::Forward {
                    self.pending.insert(heading.name.to_lowercase(), heading.clone());
                }
                Ok(Vec::new())
            }
            FunctionDeclaration::Body { name, block } => {
                let signature = self.scopes.function_mut(name).ok_or_else(|| TranslationError::Undeclared {
                    kind: SymbolKind::Function,
                    name: name.clone(),
                })?;
                if signature.directive == Some(Directive::External) {
                    return Err(TranslationError::ExternalLinkage { name: name.clone() });
                }
                if signature.has_body {
                    return Err(TranslationError::DuplicateDeclaration { name: name.clone() });
                }
                signature.has_body = true;
                let label = signature.label.clone();
                let heading = self
                    .pending
                    .remove(&name.to_lowercase())
                    .ok_or_else(|| TranslationError::DuplicateDeclaration { name: name.clone() })?;
                self.function_body(&label, &heading, block)
            }
        }
    }

    fn visit_variable_declaration(&mut self, declaration: &VariableDeclaration) -> Code {
        let mut code = Vec::new();
        match &declaration.type_denoter {
            TypeDenoter::Array(array) => {
                let element = DataType::from_scalar(&array.element)
                    .ok_or_else(|| TranslationError::unsupported("array de arrays"))?;
                for name in &declaration.identifiers {
                    let low = constant_integer(&array.low).ok_or_else(|| TranslationError::NonConstant {
                        what: format!("limite inferior do array '{}'", name),
                    })?;
                    let high = constant_integer(&array.high).ok_or_else(|| TranslationError::NonConstant {
                        what: format!("limite superior do array '{}'", name),
                    })?;
                    let size = high
                        .checked_sub(low)
                        .and_then(|span| span.checked_add(1))
                        .and_then(|count| usize::try_from(count).ok())
                        .filter(|count| (1..=MAX_ARRAY_SIZE).contains(count))
                        .ok_or_else(|| TranslationError::InvalidBounds {
                            name: name.clone(),
                            low,
                            high,
                        })?;
                    let base = self.scopes.allocate(size);
                    self.scopes.declare(name, Symbol::array(base, low, element))?;
                    code.push(format!("pushn {}", size));
                    code.extend((base..base + size).map(|slot| format!("storeg {}", slot)));
                }
            }
            scalar => {
                code.extend(scalar.evaluate(self)?);
                let ty = DataType::from_scalar(scalar)
                    .ok_or_else(|| TranslationError::unsupported("tipo de variável"))?;
                for name in &declaration.identifiers {
                    let slot = self.scopes.allocate(1);
                    self.scopes.declare(name, Symbol::scalar(slot, ty))?;
                    code.push(ty.default_push().to_string());
                    code.push(format!("storeg {}", slot));
                }
            }
        }
        Ok(code)
    }

    // Tipos não geram código
    fn visit_type_denoter(&mut self, _type_denoter: &TypeDenoter) -> Code {
        Ok(Vec::new())
    }

    fn visit_statement(&mut self, statement: &Statement) -> Code {
        match statement {
            Statement::Compound(compound) => {
                let mut code = Vec::new();
                for inner in &compound.statements {
                    code.extend(inner.evaluate(self)?);
                }
                Ok(code)
            }
            Statement::Assignment(assignment) => self.assignment(assignment),
            Statement::If(if_statement) => self.if_statement(if_statement),
            Statement::While(while_statement) => self.while_statement(while_statement),
            Statement::For(for_statement) => self.for_statement(for_statement),
            Statement::ProcedureCall(call) => self.procedure_call(call),
        }
    }

    fn visit_expression(&mut self, expression: &Expression) -> Code {
        match expression {
            Expression::Variable(access) => access.evaluate(self),
            Expression::FunctionCall(call) => self.function_call(call),
            Expression::Binary(binary) => self.binary(binary),
            Expression::Signed(signed) => self.signed(signed),
            Expression::Exponentiation(power) => self.exponentiation(power),
            Expression::Not(not) => self.not(not),
            Expression::Constant(constant) => Ok(vec![constant_push(constant)]),
            Expression::Set(set) => self.set_constructor(set),
        }
    }

    fn visit_variable_access(&mut self, access: &VariableAccess) -> Code {
        self.load(access)
    }
}

/// Instrução que empilha uma constante.
pub fn constant_push(constant: &Constant) -> String {
    match constant {
        Constant::Integer(value) => format!("pushi {}", value),
        Constant::Real(value) => format!("pushf {}", crate::lexer::format_real(*value)),
        Constant::Char(c) => format!("pushi {}", u32::from(*c)),
        Constant::String(text) => format!("pushs \"{}\"", escape_string(text)),
        Constant::Nil => "pushi 0".to_string(),
    }
}

/// Uma instrução por linha: quebras de linha e barras também são escapadas.
fn escape_string(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c => escaped.push(c),
        }
    }
    escaped
}
