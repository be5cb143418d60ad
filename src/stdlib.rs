// src/stdlib.rs
//! Procedimentos e funções pré-definidos.
//!
//! Não passam pela chamada de função do usuário: cada um tem aridade fixa e
//! um molde de instruções próprio.

use crate::compiler::symbol_table::DataType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Write,
    Writeln,
    Read,
    Readln,
    Length,
    CharAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtMost(usize),
    Any,
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::AtMost(n) => count <= n,
            Arity::Any => true,
        }
    }

    /// Número usado na mensagem de erro de aridade.
    pub fn expected(self) -> usize {
        match self {
            Arity::Exact(n) | Arity::AtMost(n) => n,
            Arity::Any => 0,
        }
    }
}

impl Builtin {
    pub fn lookup(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "write" => Some(Builtin::Write),
            "writeln" => Some(Builtin::Writeln),
            "read" => Some(Builtin::Read),
            "readln" => Some(Builtin::Readln),
            "length" => Some(Builtin::Length),
            "charat" => Some(Builtin::CharAt),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Write => "write",
            Builtin::Writeln => "writeln",
            Builtin::Read => "read",
            Builtin::Readln => "readln",
            Builtin::Length => "length",
            Builtin::CharAt => "charat",
        }
    }

    pub fn arity(self) -> Arity {
        match self {
            Builtin::Write | Builtin::Writeln => Arity::Any,
            Builtin::Read => Arity::Exact(1),
            Builtin::Readln => Arity::AtMost(1),
            Builtin::Length => Arity::Exact(1),
            Builtin::CharAt => Arity::Exact(2),
        }
    }

    /// Tipo devolvido, para os que são funções.
    pub fn result(self) -> Option<DataType> {
        match self {
            Builtin::Length => Some(DataType::Integer),
            Builtin::CharAt => Some(DataType::Char),
            _ => None,
        }
    }

    pub fn is_function(self) -> bool {
        self.result().is_some()
    }

    /// Tipos exigidos dos argumentos das funções.
    pub fn parameters(self) -> &'static [DataType] {
        match self {
            Builtin::Length => &[DataType::String],
            Builtin::CharAt => &[DataType::String, DataType::Integer],
            _ => &[],
        }
    }

    /// Instruções emitidas depois dos argumentos.
    pub fn template(self) -> &'static [&'static str] {
        match self {
            Builtin::Length => &["strlen"],
            Builtin::CharAt => &["charat"],
            Builtin::Writeln => &["writeln"],
            Builtin::Read | Builtin::Readln => &["read"],
            Builtin::Write => &[],
        }
    }
}

/// Instrução de escrita para um valor do tipo dado.
pub fn write_instruction(ty: DataType) -> Option<&'static str> {
    match ty {
        DataType::Integer | DataType::Boolean => Some("writei"),
        DataType::Real => Some("writef"),
        DataType::String => Some("writes"),
        DataType::Char => Some("writechr"),
        DataType::Array => None,
    }
}

/// Conversão aplicada ao texto lido por `read` antes de guardar no destino.
pub fn read_conversion(ty: DataType) -> Option<&'static [&'static str]> {
    let conversion: &'static [&'static str] = match ty {
        DataType::Integer | DataType::Boolean => &["atoi"],
        DataType::Real => &["atof"],
        DataType::String => &[],
        DataType::Char => &["pushi 0", "charat"],
        DataType::Array => return None,
    };
    Some(conversion)
}
