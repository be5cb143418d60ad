mod common;

use common::*;
use compilador_pascal::compile;
use compilador_pascal::compiler::{CompileError, TranslationError};
use compilador_pascal::runtime::{run_with_input, RuntimeError};

#[test]
fn test_for_decrescente() {
    let fonte = "program P; var i: integer; begin for i := 3 downto 1 do write(i); writeln end.";
    assert_eq!(executar(fonte, ""), "321\n");
}

#[test]
fn test_else_pertence_ao_if_mais_proximo() {
    let fonte = "program P; var x: integer;
begin
  x := 5;
  if x > 0 then if x > 10 then writeln('grande') else writeln('pequeno')
end.";
    assert_eq!(executar(fonte, ""), "pequeno\n");
}

#[test]
fn test_while_acumulando() {
    let fonte = "program P; var i, soma: integer;
begin
  i := 1; soma := 0;
  while i <= 10 do begin soma := soma + i; i := i + 1 end;
  writeln(soma)
end.";
    assert_eq!(executar(fonte, ""), "55\n");
}

#[test]
fn test_forward_com_corpo_separado() {
    let fonte = "program P;
function Dobro(n: integer): integer; forward;
function Quadruplo(n: integer): integer;
begin Quadruplo := Dobro(Dobro(n)) end;
function Dobro;
begin Dobro := n * 2 end;
begin writeln(Quadruplo(5)) end.";
    assert_eq!(executar(fonte, ""), "20\n");
}

#[test]
fn test_aritmetica_real_e_conversoes() {
    let fonte = "program P; var r: real; i: integer;
begin
  r := 7; i := 2;
  r := r / i;
  writeln(r);
  i := r * 2;
  writeln(i);
  writeln(r > 3, ' ', -r)
end.";
    assert_eq!(executar(fonte, ""), "3.5\n7\n1 -3.5\n");
}

#[test]
fn test_potencia_com_base_real() {
    let fonte = "program P; var r: real; begin r := 1.5 ** 2; writeln(r, ' ', 2 ** 0) end.";
    assert_eq!(executar(fonte, ""), "2.25 1\n");
}

#[test]
fn test_leitura_de_string_e_char() {
    let fonte = "program P; var s: string; c: char;
begin
  readln(s);
  read(c);
  if s = 'abc' then writeln('igual');
  writeln(c, length(s))
end.";
    assert_eq!(executar(fonte, "abc\nxyz\n"), "igual\nx3\n");
}

#[test]
fn test_not_e_booleanos() {
    let fonte = "program P; var b: boolean;
begin
  b := not (1 > 2);
  if b and true then writeln('ok') else writeln('falhou')
end.";
    assert_eq!(executar(fonte, ""), "ok\n");
}

#[test]
fn test_array_de_reais_com_limite_zero() {
    let fonte = "program P; var v: array[0..2] of real; i: integer;
begin
  for i := 0 to 2 do v[i] := i * 1.5;
  writeln(v[0] + v[1] + v[2])
end.";
    assert_eq!(executar(fonte, ""), "4.5\n");
}

#[test]
fn test_funcao_como_comando_descarta_resultado() {
    let fonte = "program P;
function Efeito(n: integer): integer;
begin writeln(n); Efeito := n end;
var x: integer;
begin Efeito(3); x := Efeito(4) + 1; writeln(x) end.";
    assert_eq!(executar(fonte, ""), "3\n4\n5\n");
}

#[test]
fn test_identificadores_sem_distincao_de_caixa() {
    let fonte = "PROGRAM P; VAR Total: INTEGER; BEGIN total := 2; WriteLn(TOTAL) END.";
    assert_eq!(executar(fonte, ""), "2\n");
}

#[test]
fn test_mensagem_de_tipos_incompativeis() {
    let err = compile("program P; var x: integer; begin x := 'texto' end.").unwrap_err();
    assert!(matches!(
        err,
        CompileError::Translation(TranslationError::TypeMismatch { .. })
    ));
    assert_eq!(
        err.to_string(),
        "tipos incompatíveis em atribuição a 'x': esperado integer, encontrado string"
    );
}

#[test]
fn test_erros_de_sintaxe_sao_contados() {
    let fonte = "program P;
var x: integer;
begin
  x := ;
  x := 1 +;
  x := 2
end.";
    match compile(fonte) {
        Err(CompileError::Syntax { count, diagnostics }) => {
            assert_eq!(count, 2);
            let linhas: Vec<usize> = diagnostics.iter().map(|d| d.line()).collect();
            assert_eq!(linhas, vec![4, 5]);
        }
        outro => panic!("esperava erros de sintaxe, veio {:?}", outro),
    }
}

#[test]
fn test_rotulos_unicos_no_programa() {
    let fonte = "program P; var i: integer;
begin
  if i = 0 then i := 1;
  while i < 3 do i := i + 1;
  for i := 1 to 2 do if i = 2 then writeln(i);
  if i = 3 then writeln(i) else writeln(0)
end.";
    let codigo = compilar(fonte);
    let rotulos: Vec<&String> = codigo.iter().filter(|l| l.ends_with(':')).collect();
    let mut unicos = rotulos.clone();
    unicos.sort();
    unicos.dedup();
    assert_eq!(rotulos.len(), unicos.len());
    for esperado in ["endif0:", "while0:", "endwhile0:", "for0:", "endfor0:", "endif1:", "else2:", "endif2:"] {
        assert!(codigo.iter().any(|l| l == esperado), "faltou {}", esperado);
    }
}

#[test]
fn test_comentarios_das_duas_formas() {
    let fonte = "program P; (* cabeçalho
  em duas linhas *)
var x: integer; { contador }
begin
  x := 2 (* dobro *) * 3;
  writeln(x) { fim }
end.";
    assert_eq!(executar(fonte, ""), "6\n");
}

#[test]
fn test_strings_com_barra_invertida_e_quebra_de_linha() {
    assert_eq!(executar(r"program P; begin writeln('a\nb') end.", ""), "a\\nb\n");
    assert_eq!(executar(r"program P; begin writeln('dir\') end.", ""), "dir\\\n");
    let fonte = "program P; begin writeln('a\nb', '\t\"') end.";
    assert_eq!(executar(fonte, ""), "a\nb\t\"\n");
}

#[test]
fn test_indice_fora_do_array_e_erro_de_execucao() {
    let codigo = compilar("program P; var v: array[1..3] of integer; begin v[100000000000000] := 1 end.");
    let err = run_with_input(&codigo.join("\n"), "").unwrap_err();
    assert!(matches!(err, RuntimeError::InvalidAddress { .. }));
}

#[test]
fn test_ordenacao_de_strings_e_rejeitada() {
    let err = compile("program P; var s: string; begin if s < 'cd' then writeln(s) end.").unwrap_err();
    assert!(matches!(
        err,
        CompileError::Translation(TranslationError::TypeMismatch { .. })
    ));
    let fonte = "program P; var c: char; begin c := 'b'; if c > 'a' then writeln('depois') end.";
    assert_eq!(executar(fonte, ""), "depois\n");
}
