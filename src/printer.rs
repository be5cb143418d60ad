// src/printer.rs
//! Impressão indentada da árvore, para depuração.

use crate::ast::*;
use crate::lexer::format_real;
use crate::type_inference::constant_integer;
use std::fmt::Display;

pub struct AstPrinter {
    indent_size: usize,
    current: usize,
}

impl AstPrinter {
    pub fn new(indent_size: usize) -> Self {
        Self {
            indent_size,
            current: 0,
        }
    }

    fn line(&self, text: impl Display) -> String {
        format!("{}{}\n", " ".repeat(self.current), text)
    }

    fn nested(&mut self, body: impl FnOnce(&mut Self) -> String) -> String {
        self.current += self.indent_size;
        let text = body(self);
        self.current -= self.indent_size;
        text
    }

    /// Rótulo seguido do filho um nível abaixo.
    fn labeled<N: Node>(&mut self, label: &str, child: &N) -> String {
        let mut out = self.line(label);
        out += &self.nested(|p| child.evaluate(p));
        out
    }

    /// Comandos vazios, inclusive `begin end` aninhados, não aparecem.
    fn compound(&mut self, compound: &CompoundStatement) -> String {
        let statements: Vec<&Statement> = compound.statements.iter().filter(|s| !is_empty(s)).collect();
        if statements.is_empty() {
            return String::new();
        }
        let mut out = self.line("CompoundStatement:");
        out += &self.nested(|p| statements.iter().map(|s| s.evaluate(p)).collect());
        out
    }

    fn arguments(&mut self, label: &str, arguments: &[ActualParameter]) -> String {
        if arguments.is_empty() {
            return String::new();
        }
        let mut out = self.line(label);
        out += &self.nested(|p| {
            let mut out = String::new();
            for argument in arguments {
                match argument {
                    ActualParameter::Value(value) => out += &value.evaluate(p),
                    ActualParameter::Formatted { value, width, precision } => {
                        out += &p.line("FormattedParameter:");
                        out += &p.nested(|p| {
                            let mut out = p.labeled("Value:", value);
                            out += &p.labeled("Width:", width);
                            if let Some(precision) = precision {
                                out += &p.labeled("Precision:", precision);
                            }
                            out
                        });
                    }
                }
            }
            out
        });
        out
    }
}

fn is_empty(statement: &Statement) -> bool {
    match statement {
        Statement::Compound(compound) => compound.statements.iter().all(is_empty),
        _ => false,
    }
}

impl Visitor for AstPrinter {
    type Output = String;

    fn visit_program(&mut self, program: &Program) -> String {
        let mut out = self.line("Program:");
        out += &self.nested(|p| {
            let mut out = p.line(format!("Heading: {}", program_heading(&program.heading)));
            out += &p.labeled("Block:", &program.block);
            out
        });
        out
    }

    fn visit_block(&mut self, block: &Block) -> String {
        let mut out = String::new();
        if !block.functions.is_empty() {
            out += &self.line("Functions:");
            out += &self.nested(|p| block.functions.iter().map(|f| f.evaluate(p)).collect());
        }
        if !block.variables.is_empty() {
            out += &self.line("Variables:");
            out += &self.nested(|p| block.variables.iter().map(|v| v.evaluate(p)).collect());
        }
        out += &self.line("Statements:");
        out += &self.nested(|p| p.compound(&block.statements));
        out
    }

    fn visit_function_declaration(&mut self, declaration: &FunctionDeclaration) -> String {
        let mut out = self.line("FunctionDeclaration:");
        out += &self.nested(|p| match declaration {
            FunctionDeclaration::Definition { heading, block } => {
                let mut out = p.line(format!("Heading: {}", function_heading(heading)));
                out += &p.labeled("Body:", block);
                out
            }
            FunctionDeclaration::Directive { heading, directive } => {
                let mut out = p.line(format!("Heading: {}", function_heading(heading)));
                let directive = match directive {
                    Directive::Forward => "forward",
                    Directive::External => "external",
                };
                out += &p.line(format!("Directive: {}", directive));
                out
            }
            FunctionDeclaration::Body { name, block } => {
                let mut out = p.line(format!("Heading: {}", name));
                out += &p.labeled("Body:", block);
                out
            }
        });
        out
    }

    fn visit_variable_declaration(&mut self, declaration: &VariableDeclaration) -> String {
        let mut out = self.line("VariableDeclaration:");
        out += &self.nested(|p| {
            let mut out = p.line(format!("Identifiers: {}", declaration.identifiers.join(", ")));
            out += &p.labeled("Type:", &declaration.type_denoter);
            out
        });
        out
    }

    fn visit_type_denoter(&mut self, type_denoter: &TypeDenoter) -> String {
        let TypeDenoter::Array(array) = type_denoter else {
            return self.line(type_name(type_denoter));
        };
        let mut out = self.line("ArrayType:");
        out += &self.nested(|p| {
            let mut out = p.line("Index Range:");
            out += &p.nested(|p| {
                let mut out = p.labeled("From:", &array.low);
                out += &p.labeled("To:", &array.high);
                out
            });
            out += &p.labeled("Element Type:", array.element.as_ref());
            out
        });
        out
    }

    fn visit_statement(&mut self, statement: &Statement) -> String {
        match statement {
            Statement::Compound(compound) => self.compound(compound),
            Statement::Assignment(assignment) => {
                let mut out = self.line("AssignmentStatement:");
                out += &self.nested(|p| {
                    let mut out = p.labeled("Variable:", &assignment.target);
                    out += &p.labeled("Expression:", &assignment.value);
                    out
                });
                out
            }
            Statement::If(statement) => {
                let mut out = self.line("IfStatement:");
                out += &self.nested(|p| {
                    let mut out = p.labeled("Condition:", &statement.condition);
                    out += &p.labeled("Then:", statement.then_branch.as_ref());
                    if let Some(else_branch) = &statement.else_branch {
                        out += &p.labeled("Else:", else_branch.as_ref());
                    }
                    out
                });
                out
            }
            Statement::While(statement) => {
                let mut out = self.line("WhileStatement:");
                out += &self.nested(|p| {
                    let mut out = p.labeled("Condition:", &statement.condition);
                    out += &p.labeled("Body:", statement.body.as_ref());
                    out
                });
                out
            }
            Statement::For(statement) => {
                let mut out = self.line("ForStatement:");
                out += &self.nested(|p| {
                    let mut out = p.line(format!("ControlVar: {}", statement.control));
                    out += &p.labeled("InitialValue:", &statement.initial);
                    let direction = match statement.direction {
                        Direction::To => "to",
                        Direction::DownTo => "downto",
                    };
                    out += &p.line(format!("Direction: {}", direction));
                    out += &p.labeled("FinalValue:", &statement.final_value);
                    out += &p.labeled("Body:", statement.body.as_ref());
                    out
                });
                out
            }
            Statement::ProcedureCall(call) => {
                let mut out = self.line(format!("ProcedureCall: {}", call.name));
                out += &self.nested(|p| p.arguments("Arguments:", &call.arguments));
                out
            }
        }
    }

    fn visit_expression(&mut self, expression: &Expression) -> String {
        match expression {
            Expression::Variable(access) => access.evaluate(self),
            Expression::FunctionCall(call) => {
                let mut out = self.line("FunctionCall:");
                out += &self.nested(|p| {
                    let mut out = p.line(format!("Function: {}", call.name));
                    out += &p.arguments("Params:", &call.arguments);
                    out
                });
                out
            }
            Expression::Binary(binary) => {
                let mut out = self.line(format!("BinaryExpression ({}):", binary.operator.symbol()));
                out += &self.nested(|p| {
                    let mut out = p.labeled("Left:", binary.left.as_ref());
                    out += &p.labeled("Right:", binary.right.as_ref());
                    out
                });
                out
            }
            Expression::Signed(signed) => {
                self.labeled(&format!("SignedExpression ({}):", signed.sign.symbol()), signed.operand.as_ref())
            }
            Expression::Exponentiation(power) => {
                let mut out = self.line("Exponentiation:");
                out += &self.nested(|p| {
                    let mut out = p.labeled("Base:", power.base.as_ref());
                    out += &p.labeled("Exponent:", power.exponent.as_ref());
                    out
                });
                out
            }
            Expression::Not(not) => self.labeled("NotExpression:", not.operand.as_ref()),
            Expression::Constant(constant) => self.line(format!("Constant: {}", constant_text(constant))),
            Expression::Set(set) => {
                let mut out = self.line("SetConstructor:");
                out += &self.nested(|p| {
                    let mut out = String::new();
                    for member in &set.members {
                        match member {
                            SetMember::Single(value) => out += &value.evaluate(p),
                            SetMember::Range { low, high } => {
                                out += &p.line("Range:");
                                out += &p.nested(|p| {
                                    let mut out = p.labeled("From:", low);
                                    out += &p.labeled("To:", high);
                                    out
                                });
                            }
                        }
                    }
                    out
                });
                out
            }
        }
    }

    fn visit_variable_access(&mut self, access: &VariableAccess) -> String {
        match access {
            VariableAccess::Identifier(name) => self.line(format!("VariableAccess: {}", name)),
            VariableAccess::Indexed(indexed) => {
                let mut out = self.line("IndexedVariable:");
                out += &self.nested(|p| {
                    let mut out = p.labeled("Variable:", indexed.variable.as_ref());
                    out += &p.line("Indices:");
                    out += &p.nested(|p| indexed.indices.iter().map(|i| i.evaluate(p)).collect());
                    out
                });
                out
            }
            VariableAccess::Field(field) => {
                let mut out = self.line("FieldDesignator:");
                out += &self.nested(|p| {
                    let mut out = p.labeled("Variable:", field.variable.as_ref());
                    out += &p.line(format!("Field: {}", field.field));
                    out
                });
                out
            }
            VariableAccess::PointerDereference(pointer) => {
                self.labeled("PointerDereference:", pointer.variable.as_ref())
            }
        }
    }
}

/// Texto indentado de uma árvore inteira.
pub fn print_ast(tree: &AbstractSyntaxTree, indent_size: usize) -> String {
    let mut printer = AstPrinter::new(indent_size);
    tree.evaluate(&mut printer)
}

fn program_heading(heading: &ProgramHeading) -> String {
    if heading.parameters.is_empty() {
        heading.name.clone()
    } else {
        format!("{}({})", heading.name, heading.parameters.join(", "))
    }
}

fn function_heading(heading: &FunctionHeading) -> String {
    let sections: Vec<String> = heading
        .parameters
        .iter()
        .map(|section| match section {
            ParameterSection::Value { names, ty } => format!("{}: {}", names.join(", "), type_name(ty)),
            ParameterSection::Variable { names, ty } => {
                format!("var {}: {}", names.join(", "), type_name(ty))
            }
            ParameterSection::Functional(inner) => format!("function {}", function_heading(inner)),
        })
        .collect();
    if sections.is_empty() {
        format!("{}: {}", heading.name, type_name(&heading.result))
    } else {
        format!("{}({}): {}", heading.name, sections.join("; "), type_name(&heading.result))
    }
}

fn type_name(type_denoter: &TypeDenoter) -> String {
    match type_denoter {
        TypeDenoter::Real => "real".to_string(),
        TypeDenoter::Integer => "integer".to_string(),
        TypeDenoter::Boolean => "boolean".to_string(),
        TypeDenoter::String => "string".to_string(),
        TypeDenoter::Char => "char".to_string(),
        TypeDenoter::Array(array) => {
            let bound = |e: &Expression| constant_integer(e).map_or("?".to_string(), |n| n.to_string());
            format!("array[{}..{}] of {}", bound(&array.low), bound(&array.high), type_name(&array.element))
        }
    }
}

fn constant_text(constant: &Constant) -> String {
    match constant {
        Constant::Integer(value) => value.to_string(),
        Constant::Real(value) => format_real(*value),
        Constant::Char(c) => format!("'{}'", c),
        Constant::String(text) => format!("'{}'", text),
        Constant::Nil => "nil".to_string(),
    }
}
