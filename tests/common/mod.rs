#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use compilador_pascal::compile;
use compilador_pascal::runtime::run_with_input;

pub fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

pub fn exemplo(nome: &str) -> PathBuf {
    repo_root().join("exemplos").join(nome)
}

/// Fonte, entrada (vazia se não houver `.in.txt`) e saída esperada de um exemplo.
pub fn ler_exemplo(nome: &str) -> (String, String, String) {
    let ler = |path: &Path| {
        fs::read_to_string(path).unwrap_or_else(|e| panic!("falha ao ler {}: {}", path.display(), e))
    };
    let fonte = ler(&exemplo(&format!("{}.pas", nome)));
    let entrada_path = exemplo(&format!("{}.in.txt", nome));
    let entrada = if entrada_path.exists() { ler(&entrada_path) } else { String::new() };
    let saida = ler(&exemplo(&format!("{}.out.txt", nome)));
    (fonte, entrada, saida)
}

pub fn compilar(fonte: &str) -> Vec<String> {
    compile(fonte).unwrap_or_else(|e| panic!("falha na compilação: {}", e))
}

/// Compila e executa na máquina virtual, devolvendo a saída.
pub fn executar(fonte: &str, entrada: &str) -> String {
    let codigo = compilar(fonte).join("\n");
    run_with_input(&codigo, entrada).unwrap_or_else(|e| panic!("falha na execução: {}\n{}", e, codigo))
}

/// Caminho temporário exclusivo deste processo de teste.
pub fn arquivo_temporario(nome: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("compilador-pascal-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("Falha ao criar diretório de teste");
    dir.join(nome)
}
