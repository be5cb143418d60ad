// src/runtime/mod.rs
//! Interpretador do subconjunto da EWVM que o tradutor gera.
//!
//! O texto é carregado uma vez (rótulos resolvidos, operandos separados) e
//! depois executado instrução a instrução sobre um [`ExecutionContext`].
//! Entrada e saída são genéricas para que os testes rodem sem terminal.

pub mod execution_context;

pub use execution_context::{ExecutionContext, Value, MAX_GLOBALS};

use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use thiserror::Error;

/// Limite de passos usado por [`run_with_input`].
pub const DEFAULT_STEP_LIMIT: usize = 5_000_000;

const OPCODES: &[&str] = &[
    "pushi", "pushf", "pushs", "pushn", "pushg", "pusha", "storeg", "load", "pop", "dup", "jump", "jz",
    "call", "return", "start", "stop", "nop", "add", "sub", "mul", "div", "mod", "fadd", "fsub", "fmul",
    "fdiv", "itof", "ftoi", "equal", "not", "inf", "infeq", "sup", "supeq", "finf", "finfeq", "fsup",
    "fsupeq", "and", "or", "writei", "writef", "writes", "writechr", "writeln", "read", "atoi", "atof",
    "strlen", "charat",
];

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("linha {line}: instrução desconhecida '{name}'")]
    UnknownInstruction { name: String, line: usize },

    #[error("operando inválido para {instruction}: '{operand}'")]
    MalformedOperand { instruction: String, operand: String },

    #[error("rótulo desconhecido '{label}'")]
    UnknownLabel { label: String },

    #[error("pilha vazia em {instruction}")]
    StackUnderflow { instruction: String },

    #[error("erro de tipo em {instruction}: {message}")]
    TypeError { instruction: String, message: String },

    #[error("divisão por zero")]
    DivisionByZero,

    #[error("return sem call correspondente")]
    CallStackUnderflow,

    #[error("endereço global inválido {address}")]
    InvalidAddress { address: i64 },

    #[error("índice {index} fora da string de tamanho {length}")]
    StringIndex { index: i64, length: usize },

    #[error("limite de {limit} passos excedido")]
    StepLimit { limit: usize },

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub opcode: String,
    pub operand: Option<String>,
    /// Linha no texto carregado, a partir de 1.
    pub line: usize,
}

/// Programa pronto para executar: instruções e a posição de cada rótulo.
#[derive(Debug, Clone, Default)]
pub struct LoadedProgram {
    pub instructions: Vec<Instruction>,
    pub labels: HashMap<String, usize>,
}

impl LoadedProgram {
    fn target(&self, label: &str) -> Result<usize, RuntimeError> {
        self.labels.get(label).copied().ok_or_else(|| RuntimeError::UnknownLabel {
            label: label.to_string(),
        })
    }
}

/// Carrega o texto de um programa `.vm`.
///
/// Linhas vazias e comentários `//` são ignorados; `nome:` define um rótulo
/// que aponta para a instrução seguinte. Instruções desconhecidas e saltos
/// para rótulos inexistentes são rejeitados já aqui.
pub fn load(text: &str) -> Result<LoadedProgram, RuntimeError> {
    let mut program = LoadedProgram::default();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        if let Some(label) = line.strip_suffix(':') {
            if !label.contains(char::is_whitespace) {
                program.labels.insert(label.to_string(), program.instructions.len());
                continue;
            }
        }

        let (opcode, operand) = match line.split_once(char::is_whitespace) {
            Some((opcode, operand)) => (opcode, Some(operand.trim().to_string())),
            None => (line, None),
        };
        let opcode = opcode.to_ascii_lowercase();
        if !OPCODES.contains(&opcode.as_str()) {
            return Err(RuntimeError::UnknownInstruction {
                name: opcode,
                line: index + 1,
            });
        }
        program.instructions.push(Instruction {
            opcode,
            operand,
            line: index + 1,
        });
    }

    for instruction in &program.instructions {
        if matches!(instruction.opcode.as_str(), "jump" | "jz" | "pusha") {
            program.target(required(instruction)?)?;
        }
    }

    tracing::debug!(
        instrucoes = program.instructions.len(),
        rotulos = program.labels.len(),
        "programa carregado"
    );
    Ok(program)
}

enum Flow {
    Goto(usize),
    Stop,
}

pub struct Machine<R, W> {
    program: LoadedProgram,
    pub context: ExecutionContext,
    input: R,
    output: W,
    step_limit: Option<usize>,
}

impl<R: BufRead, W: Write> Machine<R, W> {
    pub fn new(program: LoadedProgram, input: R, output: W) -> Self {
        Self {
            program,
            context: ExecutionContext::new(),
            input,
            output,
            step_limit: None,
        }
    }

    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.step_limit = Some(limit);
        self
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Executa desde a primeira instrução até `stop` ou o fim do programa.
    pub fn run(&mut self) -> Result<(), RuntimeError> {
        let mut ip = 0;
        let mut steps = 0usize;

        while let Some(instruction) = self.program.instructions.get(ip) {
            steps += 1;
            if let Some(limit) = self.step_limit {
                if steps > limit {
                    return Err(RuntimeError::StepLimit { limit });
                }
            }
            tracing::trace!(ip, op = %instruction.opcode, pilha = self.context.stack.len());

            match execute(
                instruction,
                ip,
                &self.program,
                &mut self.context,
                &mut self.input,
                &mut self.output,
            )? {
                Flow::Goto(next) => ip = next,
                Flow::Stop => break,
            }
        }

        self.output.flush()?;
        tracing::debug!(passos = steps, "execução concluída");
        Ok(())
    }
}

fn execute<R: BufRead, W: Write>(
    instruction: &Instruction,
    ip: usize,
    program: &LoadedProgram,
    ctx: &mut ExecutionContext,
    input: &mut R,
    output: &mut W,
) -> Result<Flow, RuntimeError> {
    let op = instruction.opcode.as_str();

    match op {
        "pushi" => ctx.push(Value::Integer(parse_operand(instruction)?)),
        "pushf" => ctx.push(Value::Real(parse_operand(instruction)?)),
        "pushs" => ctx.push(Value::String(string_operand(instruction)?)),
        "pushn" => {
            let count: usize = parse_operand(instruction)?;
            if count > MAX_GLOBALS {
                return Err(RuntimeError::MalformedOperand {
                    instruction: op.to_string(),
                    operand: count.to_string(),
                });
            }
            ctx.stack.extend(std::iter::repeat(Value::Integer(0)).take(count));
        }
        "pushg" => {
            let slot = match &instruction.operand {
                Some(_) => parse_operand(instruction)?,
                None => ctx.pop_slot(op)?,
            };
            let value = ctx.load_global(slot)?;
            ctx.push(value);
        }
        "storeg" => {
            let slot = match &instruction.operand {
                Some(_) => parse_operand(instruction)?,
                None => ctx.pop_slot(op)?,
            };
            let value = ctx.pop(op)?;
            ctx.store_global(slot, value)?;
        }
        "load" => {
            let offset: usize = parse_operand(instruction)?;
            let base = ctx.pop_slot(op)?;
            let slot = base
                .checked_add(offset)
                .ok_or(RuntimeError::InvalidAddress { address: i64::MAX })?;
            let value = ctx.load_global(slot)?;
            ctx.push(value);
        }
        "pusha" => ctx.push(Value::Address(program.target(required(instruction)?)?)),
        "pop" => ctx.discard(count_operand(instruction)?, op)?,
        "dup" => ctx.duplicate(count_operand(instruction)?, op)?,

        "jump" => return Ok(Flow::Goto(program.target(required(instruction)?)?)),
        "jz" => {
            if !ctx.pop(op)?.is_true() {
                return Ok(Flow::Goto(program.target(required(instruction)?)?));
            }
        }
        "call" => {
            let target = ctx.pop_address(op)?;
            ctx.calls.push(ip + 1);
            return Ok(Flow::Goto(target));
        }
        "return" => {
            let back = ctx.calls.pop().ok_or(RuntimeError::CallStackUnderflow)?;
            return Ok(Flow::Goto(back));
        }
        "start" | "nop" => {}
        "stop" => return Ok(Flow::Stop),

        "add" | "sub" | "mul" | "div" | "mod" => {
            let right = ctx.pop_integer(op)?;
            let left = ctx.pop_integer(op)?;
            let result = match op {
                "add" => left.wrapping_add(right),
                "sub" => left.wrapping_sub(right),
                "mul" => left.wrapping_mul(right),
                "div" => left.checked_div(right).ok_or(RuntimeError::DivisionByZero)?,
                _ => left.checked_rem(right).ok_or(RuntimeError::DivisionByZero)?,
            };
            ctx.push(Value::Integer(result));
        }
        "fadd" | "fsub" | "fmul" | "fdiv" => {
            let right = ctx.pop_real(op)?;
            let left = ctx.pop_real(op)?;
            let result = match op {
                "fadd" => left + right,
                "fsub" => left - right,
                "fmul" => left * right,
                _ if right == 0.0 => return Err(RuntimeError::DivisionByZero),
                _ => left / right,
            };
            ctx.push(Value::Real(result));
        }
        "inf" | "infeq" | "sup" | "supeq" => {
            let right = ctx.pop_integer(op)?;
            let left = ctx.pop_integer(op)?;
            let result = match op {
                "inf" => left < right,
                "infeq" => left <= right,
                "sup" => left > right,
                _ => left >= right,
            };
            ctx.push(Value::Integer(i64::from(result)));
        }
        "finf" | "finfeq" | "fsup" | "fsupeq" => {
            let right = ctx.pop_real(op)?;
            let left = ctx.pop_real(op)?;
            let result = match op {
                "finf" => left < right,
                "finfeq" => left <= right,
                "fsup" => left > right,
                _ => left >= right,
            };
            ctx.push(Value::Integer(i64::from(result)));
        }
        "equal" => {
            let right = ctx.pop(op)?;
            let left = ctx.pop(op)?;
            ctx.push(Value::Integer(i64::from(left.same_as(&right))));
        }
        "not" => {
            let value = ctx.pop(op)?;
            ctx.push(Value::Integer(i64::from(!value.is_true())));
        }
        "and" | "or" => {
            let right = ctx.pop(op)?.is_true();
            let left = ctx.pop(op)?.is_true();
            let result = if op == "and" { left && right } else { left || right };
            ctx.push(Value::Integer(i64::from(result)));
        }
        "itof" => {
            let value = ctx.pop_real(op)?;
            ctx.push(Value::Real(value));
        }
        "ftoi" => {
            let value = ctx.pop_real(op)?;
            ctx.push(Value::Integer(value.trunc() as i64));
        }

        "writei" => write!(output, "{}", ctx.pop_integer(op)?)?,
        "writef" => write!(output, "{}", ctx.pop_real(op)?)?,
        "writes" => write!(output, "{}", ctx.pop_string(op)?)?,
        "writechr" => {
            let code = ctx.pop_integer(op)?;
            let character = u32::try_from(code)
                .ok()
                .and_then(char::from_u32)
                .ok_or_else(|| RuntimeError::TypeError {
                    instruction: op.to_string(),
                    message: format!("{} não é um caractere", code),
                })?;
            write!(output, "{}", character)?;
        }
        "writeln" => writeln!(output)?,
        "read" => {
            output.flush()?;
            let mut line = String::new();
            input.read_line(&mut line)?;
            let trimmed = line.trim_end_matches(['\n', '\r']).to_string();
            ctx.push(Value::String(trimmed));
        }
        "atoi" => {
            let text = ctx.pop_string(op)?;
            let value = text.trim().parse::<i64>().map_err(|_| RuntimeError::TypeError {
                instruction: op.to_string(),
                message: format!("'{}' não é um inteiro", text),
            })?;
            ctx.push(Value::Integer(value));
        }
        "atof" => {
            let text = ctx.pop_string(op)?;
            let value = text.trim().parse::<f64>().map_err(|_| RuntimeError::TypeError {
                instruction: op.to_string(),
                message: format!("'{}' não é um real", text),
            })?;
            ctx.push(Value::Real(value));
        }
        "strlen" => {
            let text = ctx.pop_string(op)?;
            ctx.push(Value::Integer(text.chars().count() as i64));
        }
        "charat" => {
            let index = ctx.pop_integer(op)?;
            let text = ctx.pop_string(op)?;
            let character = usize::try_from(index)
                .ok()
                .and_then(|i| text.chars().nth(i))
                .ok_or_else(|| RuntimeError::StringIndex {
                    index,
                    length: text.chars().count(),
                })?;
            ctx.push(Value::Integer(i64::from(u32::from(character))));
        }
        other => {
            return Err(RuntimeError::UnknownInstruction {
                name: other.to_string(),
                line: instruction.line,
            })
        }
    }

    Ok(Flow::Goto(ip + 1))
}

fn required(instruction: &Instruction) -> Result<&str, RuntimeError> {
    instruction
        .operand
        .as_deref()
        .ok_or_else(|| RuntimeError::MalformedOperand {
            instruction: instruction.opcode.clone(),
            operand: String::new(),
        })
}

fn parse_operand<T: std::str::FromStr>(instruction: &Instruction) -> Result<T, RuntimeError> {
    let operand = required(instruction)?;
    operand.parse().map_err(|_| RuntimeError::MalformedOperand {
        instruction: instruction.opcode.clone(),
        operand: operand.to_string(),
    })
}

/// `pop` e `dup` sem operando valem 1.
fn count_operand(instruction: &Instruction) -> Result<usize, RuntimeError> {
    match instruction.operand {
        Some(_) => parse_operand(instruction),
        None => Ok(1),
    }
}

/// Literal entre aspas, com `\"`, `\\`, `\n`, `\r` e `\t` escapados.
fn string_operand(instruction: &Instruction) -> Result<String, RuntimeError> {
    let operand = required(instruction)?;
    let malformed = || RuntimeError::MalformedOperand {
        instruction: instruction.opcode.clone(),
        operand: operand.to_string(),
    };
    let inner = operand
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .ok_or_else(malformed)?;

    let mut text = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            text.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => text.push('\n'),
            Some('t') => text.push('\t'),
            Some('r') => text.push('\r'),
            Some(escaped) => text.push(escaped),
            None => return Err(malformed()),
        }
    }
    Ok(text)
}

/// Carrega e executa `code` lendo de `input`; devolve tudo o que foi escrito.
pub fn run_with_input(code: &str, input: &str) -> Result<String, RuntimeError> {
    let program = load(code)?;
    let mut machine = Machine::new(program, input.as_bytes(), Vec::new()).with_step_limit(DEFAULT_STEP_LIMIT);
    machine.run()?;
    Ok(String::from_utf8_lossy(&machine.into_output()).into_owned())
}
