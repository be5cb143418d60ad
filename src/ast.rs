//! Árvore sintática abstrata do subconjunto de Pascal.
//!
//! O conjunto de nós é fechado. Cada passagem sobre a árvore (tradução,
//! impressão) implementa [`Visitor`] e faz um `match` exaustivo sobre os
//! enums, de modo que uma variante nova obriga todas as passagens a tratá-la.

use serde::Serialize;

/// Dono da raiz `Program` durante todas as passagens.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbstractSyntaxTree {
    pub program: Program,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    pub heading: ProgramHeading,
    pub block: Block,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramHeading {
    pub name: String,
    pub parameters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub functions: Vec<FunctionDeclaration>,
    pub variables: Vec<VariableDeclaration>,
    pub statements: CompoundStatement,
}

/// As três formas de declarar uma função.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FunctionDeclaration {
    /// Cabeçalho completo seguido do corpo.
    Definition { heading: FunctionHeading, block: Block },
    /// Cabeçalho seguido de `forward` ou `external`, sem corpo.
    Directive {
        heading: FunctionHeading,
        directive: Directive,
    },
    /// `function nome;` seguido do corpo de um cabeçalho declarado antes.
    Body { name: String, block: Block },
}

impl FunctionDeclaration {
    pub fn name(&self) -> &str {
        match self {
            FunctionDeclaration::Definition { heading, .. }
            | FunctionDeclaration::Directive { heading, .. } => &heading.name,
            FunctionDeclaration::Body { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Directive {
    Forward,
    External,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionHeading {
    pub name: String,
    pub parameters: Vec<ParameterSection>,
    pub result: TypeDenoter,
}

impl FunctionHeading {
    pub fn parameter_count(&self) -> usize {
        self.parameters
            .iter()
            .map(|section| match section {
                ParameterSection::Value { names, .. } | ParameterSection::Variable { names, .. } => {
                    names.len()
                }
                ParameterSection::Functional(_) => 1,
            })
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ParameterSection {
    Value { names: Vec<String>, ty: TypeDenoter },
    Variable { names: Vec<String>, ty: TypeDenoter },
    Functional(FunctionHeading),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableDeclaration {
    pub identifiers: Vec<String>,
    pub type_denoter: TypeDenoter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TypeDenoter {
    Real,
    Integer,
    Boolean,
    String,
    Char,
    Array(ArrayType),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrayType {
    pub low: Expression,
    pub high: Expression,
    pub element: Box<TypeDenoter>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompoundStatement {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Statement {
    Compound(CompoundStatement),
    Assignment(AssignmentStatement),
    If(IfStatement),
    While(WhileStatement),
    For(ForStatement),
    ProcedureCall(ProcedureCall),
}

impl Statement {
    /// Comando vazio (`begin end`, `;;`).
    pub fn empty() -> Self {
        Statement::Compound(CompoundStatement::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentStatement {
    pub target: VariableAccess,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IfStatement {
    pub condition: Expression,
    pub then_branch: Box<Statement>,
    pub else_branch: Option<Box<Statement>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhileStatement {
    pub condition: Expression,
    pub body: Box<Statement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    To,
    DownTo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForStatement {
    pub control: String,
    pub initial: Expression,
    pub direction: Direction,
    pub final_value: Expression,
    pub body: Box<Statement>,
}

/// Cabeçalho de um `for` já reconhecido, à espera do corpo.
#[derive(Debug, Clone, PartialEq)]
pub struct ForHead {
    pub control: String,
    pub initial: Expression,
    pub direction: Direction,
    pub final_value: Expression,
}

impl ForHead {
    pub fn with_body(self, body: Statement) -> Statement {
        Statement::For(ForStatement {
            control: self.control,
            initial: self.initial,
            direction: self.direction,
            final_value: self.final_value,
            body: Box::new(body),
        })
    }
}

/// Chamada em posição de comando. Um identificador sozinho é uma chamada sem argumentos.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcedureCall {
    pub name: String,
    pub arguments: Vec<ActualParameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ActualParameter {
    Value(Expression),
    /// `valor:largura` ou `valor:largura:precisao` (formatação de `write`).
    Formatted {
        value: Expression,
        width: Expression,
        precision: Option<Expression>,
    },
}

impl ActualParameter {
    pub fn value(&self) -> &Expression {
        match self {
            ActualParameter::Value(value) | ActualParameter::Formatted { value, .. } => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expression {
    Variable(VariableAccess),
    FunctionCall(FunctionCall),
    Binary(BinaryExpression),
    Signed(SignedExpression),
    Exponentiation(Exponentiation),
    Not(NotExpression),
    Constant(Constant),
    Set(SetConstructor),
}

impl Expression {
    pub fn binary(operator: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::Binary(BinaryExpression {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn signed(sign: Sign, operand: Expression) -> Self {
        Expression::Signed(SignedExpression {
            sign,
            operand: Box::new(operand),
        })
    }

    pub fn power(base: Expression, exponent: Expression) -> Self {
        Expression::Exponentiation(Exponentiation {
            base: Box::new(base),
            exponent: Box::new(exponent),
        })
    }

    pub fn not(operand: Expression) -> Self {
        Expression::Not(NotExpression {
            operand: Box::new(operand),
        })
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Expression::Variable(VariableAccess::Identifier(name.into()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: Vec<ActualParameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinaryExpression {
    pub operator: BinaryOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignedExpression {
    pub sign: Sign,
    pub operand: Box<Expression>,
}

/// `base ** expoente`, associativa à direita.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exponentiation {
    pub base: Box<Expression>,
    pub exponent: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotExpression {
    pub operand: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Constant {
    Integer(i64),
    Real(f64),
    Char(char),
    String(String),
    Nil,
}

impl Constant {
    /// Uma string literal de exatamente um caractere é um `char`.
    pub fn from_literal(text: String) -> Self {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Constant::Char(c),
            _ => Constant::String(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetConstructor {
    pub members: Vec<SetMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SetMember {
    Single(Expression),
    Range { low: Expression, high: Expression },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum VariableAccess {
    Identifier(String),
    Indexed(IndexedVariable),
    Field(FieldDesignator),
    PointerDereference(PointerDereference),
}

impl VariableAccess {
    /// Nome da variável na raiz do acesso (`v` em `v[i].campo^`).
    pub fn root_name(&self) -> &str {
        match self {
            VariableAccess::Identifier(name) => name,
            VariableAccess::Indexed(indexed) => indexed.variable.root_name(),
            VariableAccess::Field(field) => field.variable.root_name(),
            VariableAccess::PointerDereference(pointer) => pointer.variable.root_name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexedVariable {
    pub variable: Box<VariableAccess>,
    pub indices: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDesignator {
    pub variable: Box<VariableAccess>,
    pub field: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointerDereference {
    pub variable: Box<VariableAccess>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOperator {
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    In,
    Add,
    Subtract,
    Or,
    Multiply,
    Divide,
    IntegerDivide,
    Modulo,
    And,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "<>",
            BinaryOperator::Less => "<",
            BinaryOperator::Greater => ">",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::In => "in",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Or => "or",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::IntegerDivide => "div",
            BinaryOperator::Modulo => "mod",
            BinaryOperator::And => "and",
        }
    }

    pub fn is_relational(self) -> bool {
        matches!(
            self,
            BinaryOperator::Equal
                | BinaryOperator::NotEqual
                | BinaryOperator::Less
                | BinaryOperator::Greater
                | BinaryOperator::LessEqual
                | BinaryOperator::GreaterEqual
                | BinaryOperator::In
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sign {
    Plus,
    Minus,
}

impl Sign {
    pub fn symbol(self) -> &'static str {
        match self {
            Sign::Plus => "+",
            Sign::Minus => "-",
        }
    }
}

/// Uma passagem sobre a árvore. Cada método recebe um enum inteiro e deve
/// fazer o `match` exaustivo das suas variantes.
pub trait Visitor {
    type Output;

    fn visit_program(&mut self, program: &Program) -> Self::Output;
    fn visit_block(&mut self, block: &Block) -> Self::Output;
    fn visit_function_declaration(&mut self, declaration: &FunctionDeclaration) -> Self::Output;
    fn visit_variable_declaration(&mut self, declaration: &VariableDeclaration) -> Self::Output;
    fn visit_type_denoter(&mut self, type_denoter: &TypeDenoter) -> Self::Output;
    fn visit_statement(&mut self, statement: &Statement) -> Self::Output;
    fn visit_expression(&mut self, expression: &Expression) -> Self::Output;
    fn visit_variable_access(&mut self, access: &VariableAccess) -> Self::Output;
}

/// Despacho duplo: o nó escolhe o método do visitante que lhe corresponde.
pub trait Node {
    fn evaluate<V: Visitor>(&self, visitor: &mut V) -> V::Output;
}

impl Node for AbstractSyntaxTree {
    fn evaluate<V: Visitor>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_program(&self.program)
    }
}

impl Node for Program {
    fn evaluate<V: Visitor>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_program(self)
    }
}

impl Node for Block {
    fn evaluate<V: Visitor>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_block(self)
    }
}

impl Node for FunctionDeclaration {
    fn evaluate<V: Visitor>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_function_declaration(self)
    }
}

impl Node for VariableDeclaration {
    fn evaluate<V: Visitor>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_variable_declaration(self)
    }
}

impl Node for TypeDenoter {
    fn evaluate<V: Visitor>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_type_denoter(self)
    }
}

impl Node for Statement {
    fn evaluate<V: Visitor>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_statement(self)
    }
}

impl Node for Expression {
    fn evaluate<V: Visitor>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_expression(self)
    }
}

impl Node for VariableAccess {
    fn evaluate<V: Visitor>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_variable_access(self)
    }
}
