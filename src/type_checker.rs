// src/type_checker.rs
use crate::ast::BinaryOperator;
use crate::compiler::errors::TranslationError;
use crate::compiler::symbol_table::DataType;

/// Aritmética escolhida para uma operação: inteira ou de ponto flutuante.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arithmetic {
    Integer,
    Real,
}

impl Arithmetic {
    /// Conversão a aplicar num operando deste tipo para entrar na operação.
    pub fn conversion_for(self, operand: DataType) -> Option<&'static str> {
        match (self, operand) {
            (Arithmetic::Real, DataType::Integer) => Some("itof"),
            _ => None,
        }
    }
}

/// Instrução de conversão exigida para guardar `value` num destino `target`.
///
/// `integer` e `real` se convertem implicitamente nos dois sentidos; qualquer
/// outro par diferente é rejeitado.
pub fn assignment_conversion(
    target: DataType,
    value: DataType,
    context: &str,
) -> Result<Option<&'static str>, TranslationError> {
    match (target, value) {
        (t, v) if t == v && t != DataType::Array => Ok(None),
        (DataType::Real, DataType::Integer) => Ok(Some("itof")),
        (DataType::Integer, DataType::Real) => Ok(Some("ftoi")),
        _ => Err(TranslationError::type_mismatch(target, value, context)),
    }
}

pub fn binary_operands(
    operator: BinaryOperator,
    left: DataType,
    right: DataType,
) -> Result<Arithmetic, TranslationError> {
    let context = format!("operador '{}'", operator.symbol());
    match operator {
        BinaryOperator::And | BinaryOperator::Or => {
            check_truth_value(left, &context)?;
            check_truth_value(right, &context)?;
            Ok(Arithmetic::Integer)
        }
        BinaryOperator::IntegerDivide | BinaryOperator::Modulo => {
            expect(DataType::Integer, left, &context)?;
            expect(DataType::Integer, right, &context)?;
            Ok(Arithmetic::Integer)
        }
        BinaryOperator::Add
        | BinaryOperator::Subtract
        | BinaryOperator::Multiply
        | BinaryOperator::Divide => numeric_mode(left, right, &context),
        BinaryOperator::Equal | BinaryOperator::NotEqual => {
            if left.is_numeric() && right.is_numeric() {
                return numeric_mode(left, right, &context);
            }
            if left == right && left != DataType::Array {
                return Ok(Arithmetic::Integer);
            }
            Err(TranslationError::type_mismatch(left, right, context))
        }
        // `inf`/`sup` da EWVM só ordenam números; `char` é empilhado como código.
        BinaryOperator::Less
        | BinaryOperator::Greater
        | BinaryOperator::LessEqual
        | BinaryOperator::GreaterEqual => {
            if left == DataType::Char && right == DataType::Char {
                return Ok(Arithmetic::Integer);
            }
            numeric_mode(left, right, &context)
        }
        BinaryOperator::In => Err(TranslationError::UnsupportedOperator {
            operator: operator.symbol().to_string(),
        }),
    }
}

fn numeric_mode(left: DataType, right: DataType, context: &str) -> Result<Arithmetic, TranslationError> {
    for operand in [left, right] {
        if !operand.is_numeric() {
            return Err(TranslationError::type_mismatch("integer ou real", operand, context));
        }
    }
    if left == DataType::Real || right == DataType::Real {
        Ok(Arithmetic::Real)
    } else {
        Ok(Arithmetic::Integer)
    }
}

/// Condições e operandos lógicos: `boolean`, ou `integer` tratado como verdade.
pub fn check_truth_value(ty: DataType, context: &str) -> Result<(), TranslationError> {
    match ty {
        DataType::Boolean | DataType::Integer => Ok(()),
        other => Err(TranslationError::type_mismatch(DataType::Boolean, other, context)),
    }
}

pub fn expect(expected: DataType, found: DataType, context: &str) -> Result<(), TranslationError> {
    if expected == found {
        Ok(())
    } else {
        Err(TranslationError::type_mismatch(expected, found, context))
    }
}

pub fn check_numeric(ty: DataType, context: &str) -> Result<(), TranslationError> {
    if ty.is_numeric() {
        Ok(())
    } else {
        Err(TranslationError::type_mismatch("integer ou real", ty, context))
    }
}
