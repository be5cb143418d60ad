// src/runtime/execution_context.rs
use super::RuntimeError;
use std::fmt;

/// Valor na pilha ou num slot global da máquina.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Real(f64),
    String(String),
    /// Endereço de código empilhado por `pusha`.
    Address(usize),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "inteiro",
            Value::Real(_) => "real",
            Value::String(_) => "string",
            Value::Address(_) => "endereço",
        }
    }

    pub fn is_true(&self) -> bool {
        match self {
            Value::Integer(n) => *n != 0,
            Value::Real(x) => *x != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Address(_) => true,
        }
    }

    /// Igualdade da instrução `equal`: números comparam pelo valor.
    pub fn same_as(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Real(b)) | (Value::Real(b), Value::Integer(a)) => *a as f64 == *b,
            _ => self == other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Real(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{}", s),
            Value::Address(a) => write!(f, "@{}", a),
        }
    }
}

/// Quantidade máxima de slots globais endereçáveis.
pub const MAX_GLOBALS: usize = 1 << 20;

/// Estado mutável da execução: pilha de operandos, globais e pilha de retorno.
#[derive(Debug, Default)]
pub struct ExecutionContext {
    pub stack: Vec<Value>,
    pub globals: Vec<Value>,
    pub calls: Vec<usize>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    pub fn pop(&mut self, instruction: &str) -> Result<Value, RuntimeError> {
        self.stack.pop().ok_or_else(|| RuntimeError::StackUnderflow {
            instruction: instruction.to_string(),
        })
    }

    pub fn pop_integer(&mut self, instruction: &str) -> Result<i64, RuntimeError> {
        match self.pop(instruction)? {
            Value::Integer(n) => Ok(n),
            other => Err(type_error(instruction, "inteiro", &other)),
        }
    }

    /// Operandos de ponto flutuante aceitam inteiros (zeros de `pushn`, por exemplo).
    pub fn pop_real(&mut self, instruction: &str) -> Result<f64, RuntimeError> {
        match self.pop(instruction)? {
            Value::Real(x) => Ok(x),
            Value::Integer(n) => Ok(n as f64),
            other => Err(type_error(instruction, "real", &other)),
        }
    }

    pub fn pop_string(&mut self, instruction: &str) -> Result<String, RuntimeError> {
        match self.pop(instruction)? {
            Value::String(s) => Ok(s),
            other => Err(type_error(instruction, "string", &other)),
        }
    }

    /// Endereço de slot global: inteiro entre 0 e [`MAX_GLOBALS`] no topo da pilha.
    pub fn pop_slot(&mut self, instruction: &str) -> Result<usize, RuntimeError> {
        let address = self.pop_integer(instruction)?;
        usize::try_from(address)
            .ok()
            .filter(|slot| *slot < MAX_GLOBALS)
            .ok_or(RuntimeError::InvalidAddress { address })
    }

    pub fn pop_address(&mut self, instruction: &str) -> Result<usize, RuntimeError> {
        match self.pop(instruction)? {
            Value::Address(a) => Ok(a),
            other => Err(type_error(instruction, "endereço", &other)),
        }
    }

    /// Slots nunca escritos valem zero.
    pub fn load_global(&self, slot: usize) -> Result<Value, RuntimeError> {
        check_slot(slot)?;
        Ok(self.globals.get(slot).cloned().unwrap_or(Value::Integer(0)))
    }

    pub fn store_global(&mut self, slot: usize, value: Value) -> Result<(), RuntimeError> {
        check_slot(slot)?;
        if slot >= self.globals.len() {
            self.globals.resize(slot + 1, Value::Integer(0));
        }
        self.globals[slot] = value;
        Ok(())
    }

    /// Copia os `count` valores do topo, na mesma ordem.
    pub fn duplicate(&mut self, count: usize, instruction: &str) -> Result<(), RuntimeError> {
        if self.stack.len() < count {
            return Err(RuntimeError::StackUnderflow {
                instruction: instruction.to_string(),
            });
        }
        let top = self.stack[self.stack.len() - count..].to_vec();
        self.stack.extend(top);
        Ok(())
    }

    pub fn discard(&mut self, count: usize, instruction: &str) -> Result<(), RuntimeError> {
        if self.stack.len() < count {
            return Err(RuntimeError::StackUnderflow {
                instruction: instruction.to_string(),
            });
        }
        self.stack.truncate(self.stack.len() - count);
        Ok(())
    }
}

fn check_slot(slot: usize) -> Result<(), RuntimeError> {
    if slot < MAX_GLOBALS {
        Ok(())
    } else {
        Err(RuntimeError::InvalidAddress {
            address: i64::try_from(slot).unwrap_or(i64::MAX),
        })
    }
}

fn type_error(instruction: &str, expected: &str, found: &Value) -> RuntimeError {
    RuntimeError::TypeError {
        instruction: instruction.to_string(),
        message: format!("esperado {}, encontrado {} ({})", expected, found.type_name(), found),
    }
}
