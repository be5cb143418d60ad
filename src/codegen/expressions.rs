// src/codegen/expressions.rs
use super::{Code, Translator};
use crate::ast::*;
use crate::compiler::errors::{SymbolKind, TranslationError};
use crate::compiler::symbol_table::DataType;
use crate::stdlib::Builtin;
use crate::type_checker::{assignment_conversion, binary_operands, check_numeric, check_truth_value, expect, Arithmetic};
use crate::type_inference::{boolean_literal, constant_integer, indexed_symbol, infer};

/// Maior expoente constante aceito em `**`.
const MAX_EXPONENT: i64 = 64;

fn opcode(operator: BinaryOperator, mode: Arithmetic) -> &'static [&'static str] {
    use BinaryOperator::*;
    match (operator, mode) {
        (Add, Arithmetic::Integer) => &["add"],
        (Subtract, Arithmetic::Integer) => &["sub"],
        (Multiply, Arithmetic::Integer) => &["mul"],
        (Divide | IntegerDivide, Arithmetic::Integer) => &["div"],
        (Modulo, _) => &["mod"],
        (Less, Arithmetic::Integer) => &["inf"],
        (LessEqual, Arithmetic::Integer) => &["infeq"],
        (Greater, Arithmetic::Integer) => &["sup"],
        (GreaterEqual, Arithmetic::Integer) => &["supeq"],
        (Add, Arithmetic::Real) => &["fadd"],
        (Subtract, Arithmetic::Real) => &["fsub"],
        (Multiply, Arithmetic::Real) => &["fmul"],
        (Divide | IntegerDivide, Arithmetic::Real) => &["fdiv"],
        (Less, Arithmetic::Real) => &["finf"],
        (LessEqual, Arithmetic::Real) => &["finfeq"],
        (Greater, Arithmetic::Real) => &["fsup"],
        (GreaterEqual, Arithmetic::Real) => &["fsupeq"],
        (Equal, _) => &["equal"],
        (NotEqual, _) => &["equal", "not"],
        (And, _) => &["and"],
        (Or, _) => &["or"],
        (In, _) => &[],
    }
}

impl Translator {
    pub(super) fn binary(&mut self, binary: &BinaryExpression) -> Code {
        let left_type = infer(&binary.left, &self.scopes)?;
        let right_type = infer(&binary.right, &self.scopes)?;
        let mode = binary_operands(binary.operator, left_type, right_type)?;

        let mut code = binary.left.evaluate(self)?;
        code.extend(mode.conversion_for(left_type).map(String::from));
        code.extend(binary.right.evaluate(self)?);
        code.extend(mode.conversion_for(right_type).map(String::from));
        code.extend(opcode(binary.operator, mode).iter().map(|s| s.to_string()));
        Ok(code)
    }

    pub(super) fn signed(&mut self, signed: &SignedExpression) -> Code {
        let ty = infer(&signed.operand, &self.scopes)?;
        check_numeric(ty, "sinal")?;
        let mut code = signed.operand.evaluate(self)?;
        if signed.sign == Sign::Minus {
            match ty {
                DataType::Real => code.extend(["pushf -1.0".to_string(), "fmul".to_string()]),
                _ => code.extend(["pushi -1".to_string(), "mul".to_string()]),
            }
        }
        Ok(code)
    }

    /// Potência com expoente constante vira multiplicações repetidas.
    pub(super) fn exponentiation(&mut self, power: &Exponentiation) -> Code {
        let exponent = constant_integer(&power.exponent)
            .filter(|n| *n >= 0)
            .ok_or(TranslationError::DynamicExponent)?;
        if exponent > MAX_EXPONENT {
            return Err(TranslationError::unsupported(format!(
                "expoente {} (o máximo é {})",
                exponent, MAX_EXPONENT
            )));
        }
        let ty = infer(&power.base, &self.scopes)?;
        check_numeric(ty, "base da potência")?;

        if exponent == 0 {
            return Ok(vec![match ty {
                DataType::Real => "pushf 1.0".to_string(),
                _ => "pushi 1".to_string(),
            }]);
        }
        let repeats = usize::try_from(exponent - 1).map_err(|_| TranslationError::DynamicExponent)?;
        let multiply = if ty == DataType::Real { "fmul" } else { "mul" };

        let mut code = power.base.evaluate(self)?;
        code.extend(std::iter::repeat("dup 1".to_string()).take(repeats));
        code.extend(std::iter::repeat(multiply.to_string()).take(repeats));
        Ok(code)
    }

    pub(super) fn not(&mut self, not: &NotExpression) -> Code {
        check_truth_value(infer(&not.operand, &self.scopes)?, "not")?;
        let mut code = not.operand.evaluate(self)?;
        code.push("not".to_string());
        Ok(code)
    }

    /// Os membros ficam na pilha; intervalos empilham os dois limites.
    pub(super) fn set_constructor(&mut self, set: &SetConstructor) -> Code {
        let mut code = Vec::new();
        for member in &set.members {
            match member {
                SetMember::Single(value) => code.extend(value.evaluate(self)?),
                SetMember::Range { low, high } => {
                    code.extend(low.evaluate(self)?);
                    code.extend(high.evaluate(self)?);
                }
            }
        }
        Ok(code)
    }

    pub(super) fn function_call(&mut self, call: &FunctionCall) -> Code {
        match Builtin::lookup(&call.name) {
            Some(builtin) if builtin.is_function() => {
                if !builtin.arity().accepts(call.arguments.len()) {
                    return Err(TranslationError::ArityMismatch {
                        name: builtin.name().to_string(),
                        expected: builtin.arity().expected(),
                        found: call.arguments.len(),
                    });
                }
                self.builtin_function(builtin, &call.arguments)
            }
            Some(builtin) => Err(TranslationError::unsupported(format!(
                "procedimento '{}' usado como função",
                builtin.name()
            ))),
            None => self.user_call(&call.name, &call.arguments),
        }
    }

    pub(super) fn builtin_function(&mut self, builtin: Builtin, arguments: &[ActualParameter]) -> Code {
        let mut code = Vec::new();
        for (argument, expected) in arguments.iter().zip(builtin.parameters()) {
            let ActualParameter::Value(value) = argument else {
                return Err(TranslationError::unsupported("formatação fora de write"));
            };
            expect(*expected, infer(value, &self.scopes)?, builtin.name())?;
            code.extend(value.evaluate(self)?);
        }
        code.extend(builtin.template().iter().map(|s| s.to_string()));
        Ok(code)
    }

    /// Chamada de função do usuário: argumentos na pilha, `pusha` e `call`.
    pub(super) fn user_call(&mut self, name: &str, arguments: &[ActualParameter]) -> Code {
        let signature = self.scopes.function_mut(name).ok_or_else(|| TranslationError::Undeclared {
            kind: SymbolKind::Function,
            name: name.to_string(),
        })?;
        if signature.directive == Some(Directive::External) {
            return Err(TranslationError::ExternalLinkage {
                name: signature.label.clone(),
            });
        }
        signature.called = true;
        let signature = signature.clone();

        let expected = signature.parameter_count();
        if arguments.len() != expected {
            return Err(TranslationError::ArityMismatch {
                name: signature.label,
                expected,
                found: arguments.len(),
            });
        }

        let mut code = Vec::new();
        for (position, (argument, parameter)) in arguments.iter().zip(&signature.parameters).enumerate() {
            let ActualParameter::Value(value) = argument else {
                return Err(TranslationError::unsupported("formatação fora de write"));
            };
            let context = format!("argumento {} de '{}'", position + 1, signature.label);
            let conversion = assignment_conversion(*parameter, infer(value, &self.scopes)?, &context)?;
            code.extend(value.evaluate(self)?);
            code.extend(conversion.map(String::from));
        }
        code.push(format!("pusha {}", signature.label));
        code.push("call".to_string());
        Ok(code)
    }

    /// Empilha o valor de um acesso a variável.
    pub(super) fn load(&mut self, access: &VariableAccess) -> Code {
        match access {
            VariableAccess::Identifier(name) => {
                if let Some(value) = boolean_literal(name) {
                    return Ok(vec![format!("pushi {}", u8::from(value))]);
                }
                if let Some(symbol) = self.scopes.resolve(name) {
                    if symbol.ty == DataType::Array {
                        return Err(TranslationError::unsupported("array usado como valor"));
                    }
                    return Ok(vec![format!("pushg {}", symbol.slot)]);
                }
                // Nome de função sozinho numa expressão é uma chamada sem argumentos
                if self.scopes.function(name).is_some() {
                    return self.user_call(name, &[]);
                }
                Err(Self::undeclared_variable(name))
            }
            VariableAccess::Indexed(indexed) => {
                let symbol = indexed_symbol(indexed, &self.scopes)?.clone();
                match symbol.ty {
                    DataType::Array => {
                        let mut code = self.element_address(indexed)?;
                        code.push("pushg".to_string());
                        Ok(code)
                    }
                    DataType::String => {
                        let index = &indexed.indices[0];
                        expect(DataType::Integer, infer(index, &self.scopes)?, "índice de string")?;
                        let mut code = vec![format!("pushg {}", symbol.slot)];
                        code.extend(index.evaluate(self)?);
                        code.extend(["pushi 1".to_string(), "sub".to_string(), "charat".to_string()]);
                        Ok(code)
                    }
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
}
