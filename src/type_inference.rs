// src/type_inference.rs
//! Tipagem estrutural das expressões.
//!
//! Literais carregam o próprio tipo, referências a variáveis consultam os
//! escopos, operadores relacionais e lógicos dão `boolean` e os aritméticos dão
//! o mais largo dos operandos numéricos (`real` domina `integer`).

use crate::ast::*;
use crate::compiler::errors::{SymbolKind, TranslationError};
use crate::compiler::symbol_table::{DataType, Scopes, Symbol};
use crate::stdlib::Builtin;

pub fn infer(expression: &Expression, scopes: &Scopes) -> Result<DataType, TranslationError> {
    match expression {
        Expression::Constant(constant) => Ok(constant_type(constant)),
        Expression::Variable(access) => infer_access(access, scopes),
        Expression::FunctionCall(call) => call_result(&call.name, scopes),
        Expression::Binary(binary) => {
            if binary.operator.is_relational() || binary.operator.is_logical() {
                return Ok(DataType::Boolean);
            }
            let left = infer(&binary.left, scopes)?;
            let right = infer(&binary.right, scopes)?;
            Ok(wider(left, right))
        }
        Expression::Signed(signed) => infer(&signed.operand, scopes),
        Expression::Exponentiation(power) => infer(&power.base, scopes),
        Expression::Not(_) => Ok(DataType::Boolean),
        Expression::Set(set) => match set.members.first() {
            Some(SetMember::Single(value)) | Some(SetMember::Range { low: value, .. }) => {
                infer(value, scopes)
            }
            None => Ok(DataType::Integer),
        },
    }
}

pub fn constant_type(constant: &Constant) -> DataType {
    match constant {
        Constant::Integer(_) | Constant::Nil => DataType::Integer,
        Constant::Real(_) => DataType::Real,
        Constant::Char(_) => DataType::Char,
        Constant::String(_) => DataType::String,
    }
}

/// `true`/`false` são identificadores comuns com valor fixo.
pub fn boolean_literal(name: &str) -> Option<bool> {
    match name.to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

pub fn infer_access(access: &VariableAccess, scopes: &Scopes) -> Result<DataType, TranslationError> {
    match access {
        VariableAccess::Identifier(name) => {
            if boolean_literal(name).is_some() {
                return Ok(DataType::Boolean);
            }
            if let Some(symbol) = scopes.resolve(name) {
                return Ok(symbol.ty);
            }
            match scopes.function(name) {
                Some(signature) => Ok(signature.result),
                None => Err(TranslationError::Undeclared {
                    kind: SymbolKind::Variable,
                    name: name.clone(),
                }),
            }
        }
        VariableAccess::Indexed(indexed) => {
            let symbol = indexed_symbol(indexed, scopes)?;
            match symbol.ty {
                DataType::Array => Ok(symbol.element.unwrap_or(DataType::Integer)),
                DataType::String => Ok(DataType::Char),
                _ => Err(TranslationError::NotAnArray {
                    name: indexed.variable.root_name().to_string(),
                }),
            }
        }
        VariableAccess::Field(_) => Err(TranslationError::unsupported("acesso a campo de registro")),
        VariableAccess::PointerDereference(_) => {
            Err(TranslationError::unsupported("desreferência de ponteiro"))
        }
    }
}

/// Símbolo indexado em `v[i]`. Só um nível de índice é aceito.
pub fn indexed_symbol<'a>(
    indexed: &IndexedVariable,
    scopes: &'a Scopes,
) -> Result<&'a Symbol, TranslationError> {
    let VariableAccess::Identifier(name) = indexed.variable.as_ref() else {
        return Err(TranslationError::unsupported("array multidimensional"));
    };
    if indexed.indices.len() != 1 {
        return Err(TranslationError::unsupported("array multidimensional"));
    }
    scopes.resolve(name).ok_or_else(|| TranslationError::Undeclared {
        kind: SymbolKind::Variable,
        name: name.clone(),
    })
}

fn call_result(name: &str, scopes: &Scopes) -> Result<DataType, TranslationError> {
    if let Some(builtin) = Builtin::lookup(name) {
        return builtin.result().ok_or_else(|| {
            TranslationError::unsupported(format!("procedimento '{}' usado como função", builtin.name()))
        });
    }
    scopes
        .function(name)
        .map(|signature| signature.result)
        .ok_or_else(|| TranslationError::Undeclared {
            kind: SymbolKind::Function,
            name: name.to_string(),
        })
}

fn wider(left: DataType, right: DataType) -> DataType {
    match (left, right) {
        (DataType::Real, r) if r.is_numeric() => DataType::Real,
        (l, DataType::Real) if l.is_numeric() => DataType::Real,
        (l, _) => l,
    }
}

/// Valor de uma expressão inteira constante (`10`, `-3`, `+2`).
pub fn constant_integer(expression: &Expression) -> Option<i64> {
    match expression {
        Expression::Constant(Constant::Integer(value)) => Some(*value),
        Expression::Signed(signed) => {
            let value = constant_integer(&signed.operand)?;
            match signed.sign {
                Sign::Plus => Some(value),
                Sign::Minus => value.checked_neg(),
            }
        }
        _ => None,
    }
}
