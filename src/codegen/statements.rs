// src/codegen/statements.rs
use super::{Code, Translator};
use crate::ast::*;
use crate::compiler::errors::{SymbolKind, TranslationError};
use crate::compiler::symbol_table::{DataType, Symbol};
use crate::stdlib::{self, Builtin};
use crate::type_checker::{assignment_conversion, check_truth_value, expect};
use crate::type_inference::{indexed_symbol, infer};

impl Translator {
    pub(super) fn assignment(&mut self, assignment: &AssignmentStatement) -> Code {
        let value_type = infer(&assignment.value, &self.scopes)?;
        let mut code = assignment.value.evaluate(self)?;

        match &assignment.target {
            VariableAccess::Identifier(name) => {
                let (slot, target_type) = self.store_target(name)?;
                let context = format!("atribuição a '{}'", name);
                code.extend(assignment_conversion(target_type, value_type, &context)?.map(String::from));
                code.push(format!("storeg {}", slot));
            }
            VariableAccess::Indexed(indexed) => {
                let element = self.writable_element(indexed)?;
                let context = format!("atribuição a elemento de '{}'", indexed.variable.root_name());
                code.extend(assignment_conversion(element, value_type, &context)?.map(String::from));
                code.extend(self.element_address(indexed)?);
                code.push("storeg".to_string());
            }
            VariableAccess::Field(_) => {
                return Err(TranslationError::unsupported("atribuição a campo de registro"))
            }
            VariableAccess::PointerDereference(_) => {
                return Err(TranslationError::unsupported("atribuição por ponteiro"))
            }
        }
        Ok(code)
    }

    /// Slot e tipo de um destino simples. O nome da função corrente é o slot de resultado.
    fn store_target(&self, name: &str) -> Result<(usize, DataType), TranslationError> {
        if let Some(frame) = &self.frame {
            if frame.name.eq_ignore_ascii_case(name) {
                return Ok((frame.result_slot, frame.result));
            }
        }
        self.scopes
            .resolve(name)
            .map(|symbol| (symbol.slot, symbol.ty))
            .ok_or_else(|| Self::undeclared_variable(name))
    }

    /// Tipo do elemento de um array que vai receber um valor.
    fn writable_element(&self, indexed: &IndexedVariable) -> Result<DataType, TranslationError> {
        let symbol = indexed_symbol(indexed, &self.scopes)?;
        match symbol.ty {
            DataType::Array => Ok(symbol.element.unwrap_or(DataType::Integer)),
            DataType::String => Err(TranslationError::unsupported("alteração de caractere de string")),
            _ => Err(TranslationError::NotAnArray {
                name: indexed.variable.root_name().to_string(),
            }),
        }
    }

    /// Endereço (slot) de `v[i]` calculado na pilha: `i - low + base`.
    pub(super) fn element_address(&mut self, indexed: &IndexedVariable) -> Code {
        let symbol = indexed_symbol(indexed, &self.scopes)?.clone();
        let index = &indexed.indices[0];
        expect(DataType::Integer, infer(index, &self.scopes)?, "índice de array")?;

        let mut code = index.evaluate(self)?;
        code.push(format!("pushi {}", symbol.lower_bound.unwrap_or(0)));
        code.push("sub".to_string());
        code.push(format!("pushi {}", symbol.slot));
        code.push("add".to_string());
        Ok(code)
    }

    fn condition(&mut self, condition: &Expression, context: &str) -> Code {
        check_truth_value(infer(condition, &self.scopes)?, context)?;
        condition.evaluate(self)
    }

    pub(super) fn if_statement(&mut self, statement: &IfStatement) -> Code {
        let k = self.next_if();
        let mut code = self.condition(&statement.condition, "condição do if")?;
        let then_code = statement.then_branch.evaluate(self)?;

        match &statement.else_branch {
            Some(else_branch) => {
                code.push(format!("jz else{}", k));
                code.extend(then_code);
                code.push(format!("jump endif{}", k));
                code.push(format!("else{}:", k));
                code.extend(else_branch.evaluate(self)?);
            }
            None => {
                code.push(format!("jz endif{}", k));
                code.extend(then_code);
            }
        }
        code.push(format!("endif{}:", k));
        Ok(code)
    }

    pub(super) fn while_statement(&mut self, statement: &WhileStatement) -> Code {
        let k = self.next_while();
        let mut code = vec![format!("while{}:", k)];
        code.extend(self.condition(&statement.condition, "condição do while")?);
        code.push(format!("jz endwhile{}", k));
        code.extend(statement.body.evaluate(self)?);
        code.push(format!("jump while{}", k));
        code.push(format!("endwhile{}:", k));
        Ok(code)
    }

    pub(super) fn for_statement(&mut self, statement: &ForStatement) -> Code {
        let k = self.next_for();
        let slot = self.control_variable(&statement.control)?;
        expect(DataType::Integer, infer(&statement.initial, &self.scopes)?, "valor inicial do for")?;
        expect(DataType::Integer, infer(&statement.final_value, &self.scopes)?, "valor final do for")?;

        let (compare, step) = match statement.direction {
            Direction::To => ("infeq", "add"),
            Direction::DownTo => ("supeq", "sub"),
        };

        let mut code = statement.initial.evaluate(self)?;
        code.push(format!("storeg {}", slot));
        code.push(format!("for{}:", k));
        code.push(format!("pushg {}", slot));
        code.extend(statement.final_value.evaluate(self)?);
        code.push(compare.to_string());
        code.push(format!("jz endfor{}", k));
        code.extend(statement.body.evaluate(self)?);
        code.push(format!("pushg {}", slot));
        code.push("pushi 1".to_string());
        code.push(step.to_string());
        code.push(format!("storeg {}", slot));
        code.push(format!("jump for{}", k));
        code.push(format!("endfor{}:", k));
        Ok(code)
    }

    /// Slot da variável de controle. Se ainda não existe, é declarada como `integer`.
    fn control_variable(&mut self, name: &str) -> Result<usize, TranslationError> {
        if let Some(symbol) = self.scopes.resolve(name) {
            expect(DataType::Integer, symbol.ty, "variável de controle do for")?;
            return Ok(symbol.slot);
        }
        let slot = self.scopes.allocate(1);
        self.scopes.declare(name, Symbol::scalar(slot, DataType::Integer))?;
        tracing::trace!(variavel = name, slot, "variável de controle declarada implicitamente");
        Ok(slot)
    }

    pub(super) fn procedure_call(&mut self, call: &ProcedureCall) -> Code {
        if let Some(builtin) = Builtin::lookup(&call.name) {
            if !builtin.arity().accepts(call.arguments.len()) {
                return Err(TranslationError::ArityMismatch {
                    name: builtin.name().to_string(),
                    expected: builtin.arity().expected(),
                    found: call.arguments.len(),
                });
            }
            return match builtin {
                Builtin::Write | Builtin::Writeln => self.write(builtin, &call.arguments),
                Builtin::Read | Builtin::Readln => self.read(&call.arguments),
                Builtin::Length | Builtin::CharAt => {
                    let mut code = self.builtin_function(builtin, &call.arguments)?;
                    code.push("pop 1".to_string());
                    Ok(code)
                }
            };
        }

        if self.scopes.function(&call.name).is_none() {
            return Err(TranslationError::Undeclared {
                kind: SymbolKind::Procedure,
                name: call.name.clone(),
            });
        }
        // Funções do usuário sempre devolvem um valor, descartado aqui
        let mut code = self.user_call(&call.name, &call.arguments)?;
        code.push("pop 1".to_string());
        Ok(code)
    }

    fn write(&mut self, builtin: Builtin, arguments: &[ActualParameter]) -> Code {
        let mut code = Vec::new();
        for argument in arguments {
            // Largura e precisão não têm instrução correspondente na EWVM
            if let ActualParameter::Formatted { width, precision, .. } = argument {
                expect(DataType::Integer, infer(width, &self.scopes)?, "largura do write")?;
                if let Some(precision) = precision {
                    expect(DataType::Integer, infer(precision, &self.scopes)?, "precisão do write")?;
                }
            }
            let value = argument.value();
            let ty = infer(value, &self.scopes)?;
            let instruction = stdlib::write_instruction(ty)
                .ok_or_else(|| TranslationError::type_mismatch("valor escalar", ty, builtin.name()))?;
            code.extend(value.evaluate(self)?);
            code.push(instruction.to_string());
        }
        code.extend(builtin.template().iter().map(|s| s.to_string()));
        Ok(code)
    }

    fn read(&mut self, arguments: &[ActualParameter]) -> Code {
        let Some(argument) = arguments.first() else {
            // readln sem argumentos só consome uma linha
            return Ok(vec!["read".to_string(), "pop 1".to_string()]);
        };
        let ActualParameter::Value(Expression::Variable(target)) = argument else {
            return Err(TranslationError::unsupported("leitura para algo que não é variável"));
        };

        let mut code = vec!["read".to_string()];
        match target {
            VariableAccess::Identifier(name) => {
                let (slot, ty) = self.store_target(name)?;
                let conversion = stdlib::read_conversion(ty)
                    .ok_or_else(|| TranslationError::unsupported("leitura de array inteiro"))?;
                code.extend(conversion.iter().map(|s| s.to_string()));
                code.push(format!("storeg {}", slot));
            }
            VariableAccess::Indexed(indexed) => {
                let element = self.writable_element(indexed)?;
                let conversion = stdlib::read_conversion(element)
                    .ok_or_else(|| TranslationError::unsupported("leitura de array inteiro"))?;
                code.extend(conversion.iter().map(|s| s.to_string()));
                code.extend(self.element_address(indexed)?);
                code.push("storeg".to_string());
            }
            VariableAccess::Field(_) | VariableAccess::PointerDereference(_) => {
                return Err(TranslationError::unsupported("leitura para campo ou ponteiro"))
            }
        }
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use crate::codegen::translate;
    use crate::compiler::errors::TranslationError;
    use crate::parser::parse;

    fn traduz(source: &str) -> Result<Vec<String>, TranslationError> {
        let tree = parse(source).into_result().expect("programa válido");
        translate(&tree)
    }

    /// Instruções entre `start` e `stop`.
    fn corpo(code: &[String]) -> Vec<&str> {
        let start = code.iter().position(|l| l == "start").expect("start");
        code[start + 1..code.len() - 1].iter().map(String::as_str).collect()
    }

    #[test]
    fn precedencia_na_atribuicao() {
        let code = traduz("program P; var x: integer; begin x := 2 + 3 * 4; end.").unwrap();
        assert_eq!(
            corpo(&code),
            vec!["pushi 2", "pushi 3", "pushi 4", "mul", "add", "storeg 0"]
        );
    }

    #[test]
    fn if_else_com_quarteto_de_rotulos() {
        let code = traduz(
            "program P; var x: integer; begin x := 1; if x = 1 then x := 2 else x := 3; end.",
        )
        .unwrap();
        assert_eq!(
            corpo(&code),
            vec![
                "pushi 1", "storeg 0",
                "pushg 0", "pushi 1", "equal", "jz else0",
                "pushi 2", "storeg 0", "jump endif0",
                "else0:", "pushi 3", "storeg 0",
                "endif0:",
            ]
        );
    }

    #[test]
    fn if_sem_else() {
        let code = traduz("program P; var x: integer; begin if x > 0 then x := 0 end.").unwrap();
        assert_eq!(
            corpo(&code),
            vec!["pushg 0", "pushi 0", "sup", "jz endif0", "pushi 0", "storeg 0", "endif0:"]
        );
    }

    #[test]
    fn rotulos_unicos_em_ordem_de_encontro() {
        let code = traduz(
            "program P; var x: integer; begin \
             if x = 1 then if x = 2 then x := 3 else x := 4; \
             if x = 5 then x := 6 end.",
        )
        .unwrap();
        let rotulos: Vec<&str> = code
            .iter()
            .filter(|l| l.starts_with("endif"))
            .map(String::as_str)
            .collect();
        assert_eq!(rotulos, vec!["endif1:", "endif0:", "endif2:"]);
        // O else pertence ao if interno
        assert!(code.contains(&"jz else1".to_string()));
        assert!(!code.contains(&"jz else0".to_string()));
    }

    #[test]
    fn while_e_for() {
        let code = traduz(
            "program P; var i, s: integer; begin \
             while s < 10 do s := s + 1; \
             for i := 3 downto 1 do s := s - i end.",
        )
        .unwrap();
        assert_eq!(
            corpo(&code),
            vec![
                "while0:", "pushg 1", "pushi 10", "inf", "jz endwhile0",
                "pushg 1", "pushi 1", "add", "storeg 1",
                "jump while0", "endwhile0:",
                "pushi 3", "storeg 0", "for0:", "pushg 0", "pushi 1", "supeq", "jz endfor0",
                "pushg 1", "pushg 0", "sub", "storeg 1",
                "pushg 0", "pushi 1", "sub", "storeg 0", "jump for0", "endfor0:",
            ]
        );
    }

    #[test]
    fn variavel_de_controle_implicita() {
        let code = traduz("program P; var s: integer; begin for k := 1 to 2 do s := s + k end.").unwrap();
        assert!(code.contains(&"storeg 1".to_string()));
        assert!(code.contains(&"pushg 1".to_string()));
    }

    #[test]
    fn string_em_inteiro_e_erro_de_tipo() {
        let err = traduz("program P; var x: integer; begin x := 'texto' end.").unwrap_err();
        assert!(matches!(err, TranslationError::TypeMismatch { .. }));
    }

    #[test]
    fn conversoes_implicitas() {
        let code = traduz("program P; var r: real; i: integer; begin r := i; i := r end.").unwrap();
        assert_eq!(
            corpo(&code),
            vec!["pushg 1", "itof", "storeg 0", "pushg 0", "ftoi", "storeg 1"]
        );
    }

    #[test]
    fn escrita_por_tipo() {
        let code = traduz(
            "program P; var i: integer; r: real; s: string; b: boolean; \
             begin writeln('soma: ', i, r, s, b, 'x'); write(s[1]) end.",
        )
        .unwrap();
        assert_eq!(
            corpo(&code),
            vec![
                "pushs \"soma: \"", "writes",
                "pushg 0", "writei",
                "pushg 1", "writef",
                "pushg 2", "writes",
                "pushg 3", "writei",
                "pushi 120", "writechr",
                "writeln",
                "pushg 2", "pushi 1", "pushi 1", "sub", "charat", "writechr",
            ]
        );
    }

    #[test]
    fn leitura_por_tipo() {
        let code = traduz(
            "program P; var i: integer; r: real; s: string; c: char; \
             begin readln(i); read(r); readln(s); readln(c); readln end.",
        )
        .unwrap();
        assert_eq!(
            corpo(&code),
            vec![
                "read", "atoi", "storeg 0",
                "read", "atof", "storeg 1",
                "read", "storeg 2",
                "read", "pushi 0", "charat", "storeg 3",
                "read", "pop 1",
            ]
        );
    }

    #[test]
    fn leitura_e_escrita_em_array() {
        let code = traduz(
            "program P; var v: array[1..3] of integer; i: integer; \
             begin for i := 1 to 3 do readln(v[i]); v[2] := v[1] end.",
        )
        .unwrap();
        let corpo = corpo(&code);
        let leitura = ["read", "atoi", "pushg 3", "pushi 1", "sub", "pushi 0", "add", "storeg"];
        assert!(corpo.windows(leitura.len()).any(|w| w == leitura));
        let copia = [
            "pushi 1", "pushi 1", "sub", "pushi 0", "add", "pushg",
            "pushi 2", "pushi 1", "sub", "pushi 0", "add", "storeg",
        ];
        assert!(corpo.ends_with(&copia));
    }

    #[test]
    fn alterar_caractere_de_string_nao_e_suportado() {
        assert!(matches!(
            traduz("program P; var s: string; begin s[1] := 'a' end."),
            Err(TranslationError::Unsupported { .. })
        ));
        assert!(matches!(
            traduz("program P; var s: string; begin readln(s[1]) end."),
            Err(TranslationError::Unsupported { .. })
        ));
    }

    #[test]
    fn aridade_dos_predefinidos() {
        let err = traduz("program P; var s: string; i: integer; begin i := length(s, s) end.").unwrap_err();
        assert_eq!(
            err,
            TranslationError::ArityMismatch {
                name: "length".into(),
                expected: 1,
                found: 2,
            }
        );
        assert!(matches!(
            traduz("program P; var i: integer; begin read(i, i) end."),
            Err(TranslationError::ArityMismatch { expected: 1, found: 2, .. })
        ));
    }

    #[test]
    fn procedimento_desconhecido() {
        assert!(matches!(
            traduz("program P; begin limpar(1) end."),
            Err(TranslationError::Undeclared { .. })
        ));
        assert!(matches!(
            traduz("program P; begin y := 1 end."),
            Err(TranslationError::Undeclared { .. })
        ));
    }

    #[test]
    fn funcao_como_comando_descarta_resultado() {
        let code = traduz(
            "program P; function Um: integer; begin Um := 1 end; begin Um end.",
        )
        .unwrap();
        assert_eq!(corpo(&code), vec!["pusha Um", "call", "pop 1"]);
    }
}
