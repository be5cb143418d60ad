// src/compiler/symbol_table.rs
use crate::ast::{Directive, TypeDenoter};
use crate::compiler::errors::TranslationError;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Integer,
    Real,
    Boolean,
    String,
    Char,
    Array,
}

impl DataType {
    pub fn is_numeric(self) -> bool {
        matches!(self, DataType::Integer | DataType::Real)
    }

    /// Tipo de um denotador escalar. Arrays são tratados à parte por quem declara.
    pub fn from_scalar(denoter: &TypeDenoter) -> Option<Self> {
        match denoter {
            TypeDenoter::Real => Some(DataType::Real),
            TypeDenoter::Integer => Some(DataType::Integer),
            TypeDenoter::Boolean => Some(DataType::Boolean),
            TypeDenoter::String => Some(DataType::String),
            TypeDenoter::Char => Some(DataType::Char),
            TypeDenoter::Array(_) => None,
        }
    }

    /// Instrução que empilha o valor inicial de uma variável deste tipo.
    pub fn default_push(self) -> &'static str {
        match self {
            DataType::Real => "pushf 0.0",
            DataType::String => "pushs \"\"",
            _ => "pushi 0",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let nome = match self {
            DataType::Integer => "integer",
            DataType::Real => "real",
            DataType::Boolean => "boolean",
            DataType::String => "string",
            DataType::Char => "char",
            DataType::Array => "array",
        };
        f.write_str(nome)
    }
}

/// Entrada da tabela: onde a variável mora e como interpretá-la.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub slot: usize,
    pub ty: DataType,
    pub lower_bound: Option<i64>,
    pub element: Option<DataType>,
}

impl Symbol {
    pub fn scalar(slot: usize, ty: DataType) -> Self {
        Self {
            slot,
            ty,
            lower_bound: None,
            element: None,
        }
    }

    pub fn array(slot: usize, lower_bound: i64, element: DataType) -> Self {
        Self {
            slot,
            ty: DataType::Array,
            lower_bound: Some(lower_bound),
            element: Some(element),
        }
    }
}

/// Um escopo: nomes (sem distinção de maiúsculas) para símbolos.
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    symbols: HashMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: &str, symbol: Symbol) -> Result<(), TranslationError> {
        let key = name.to_lowercase();
        if self.symbols.contains_key(&key) {
            return Err(TranslationError::DuplicateDeclaration {
                name: name.to_string(),
            });
        }
        self.symbols.insert(key, symbol);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// O que se sabe de uma função do usuário num dado ponto da tradução.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    /// Rótulo no bytecode, com a grafia da declaração
    pub label: String,
    pub parameters: Vec<DataType>,
    pub result: DataType,
    pub directive: Option<Directive>,
    pub has_body: bool,
    pub called: bool,
}

impl FunctionSignature {
    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }
}

/// Escopos ativos durante a tradução.
///
/// Há sempre o escopo global e, dentro de uma função, a tabela local dela.
/// A resolução de nomes procura primeiro no escopo local e depois no global.
/// Os slots são alocados em ordem crescente e nunca reaproveitados.
#[derive(Debug, Default)]
pub struct Scopes {
    global: SymbolTable,
    locals: HashMap<String, SymbolTable>,
    functions: HashMap<String, FunctionSignature>,
    current: Option<String>,
    next_slot: usize,
}

impl Scopes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserva `size` slots consecutivos e devolve o primeiro.
    pub fn allocate(&mut self, size: usize) -> usize {
        let slot = self.next_slot;
        self.next_slot += size;
        slot
    }

    pub fn slots_used(&self) -> usize {
        self.next_slot
    }

    pub fn enter_function(&mut self, name: &str) {
        let key = name.to_lowercase();
        self.locals.entry(key.clone()).or_default();
        self.current = Some(key);
    }

    pub fn exit_function(&mut self) {
        self.current = None;
    }

    /// Declara no escopo corrente (local, se dentro de uma função).
    pub fn declare(&mut self, name: &str, symbol: Symbol) -> Result<(), TranslationError> {
        if self.functions.contains_key(&name.to_lowercase()) {
            return Err(TranslationError::DuplicateDeclaration {
                name: name.to_string(),
            });
        }
        let table = match &self.current {
            Some(function) => self.locals.entry(function.clone()).or_default(),
            None => &mut self.global,
        };
        table.define(name, symbol)
    }

    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        self.current
            .as_ref()
            .and_then(|function| self.locals.get(function))
            .and_then(|table| table.lookup(name))
            .or_else(|| self.global.lookup(name))
    }

    pub fn locals_of(&self, function: &str) -> Option<&SymbolTable> {
        self.locals.get(&function.to_lowercase())
    }

    pub fn function(&self, name: &str) -> Option<&FunctionSignature> {
        self.functions.get(&name.to_lowercase())
    }

    pub fn function_mut(&mut self, name: &str) -> Option<&mut FunctionSignature> {
        self.functions.get_mut(&name.to_lowercase())
    }

    /// Registra uma assinatura nova. Um nome já usado por variável global também conflita.
    pub fn declare_function(&mut self, signature: FunctionSignature) -> Result<(), TranslationError> {
        let key = signature.label.to_lowercase();
        if self.functions.contains_key(&key) || self.global.contains(&key) {
            return Err(TranslationError::DuplicateDeclaration {
                name: signature.label,
            });
        }
        self.functions.insert(key, signature);
        Ok(())
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionSignature> {
        self.functions.values()
    }
}
