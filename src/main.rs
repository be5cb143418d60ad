//! Compilador de Pascal para EWVM

use clap::{Parser, ValueEnum};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use compilador_pascal::compiler::{CompileError, CompilerPipeline};
use compilador_pascal::print_ast;

#[derive(Parser)]
#[command(name = "compilador")]
#[command(about = "Compila um programa Pascal para o bytecode da máquina virtual EWVM")]
#[command(version)]
struct Cli {
    /// Arquivo Pascal de entrada
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Arquivo de saída (padrão: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// O que emitir
    #[arg(long, value_enum, default_value_t = Emit::Bytecode)]
    emit: Emit,

    /// Espaços por nível na impressão da árvore
    #[arg(long, default_value_t = 2)]
    indent: usize,

    /// Mais detalhes nos logs (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Emit {
    Bytecode,
    Ast,
    AstJson,
    Tokens,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(CompileError::Syntax { diagnostics, .. }) = err.downcast_ref::<CompileError>() {
                for diagnostic in diagnostics {
                    eprintln!("{}", diagnostic);
                }
            }
            eprintln!("erro: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "error",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let source = fs::read_to_string(&cli.input)
        .map_err(|e| format!("não foi possível ler {}: {}", cli.input.display(), e))?;
    let mut pipeline = CompilerPipeline::new(&source);

    let text = match cli.emit {
        Emit::Tokens => pipeline
            .tokens()
            .iter()
            .map(|lexeme| format!("{}\t{}\t{}\n", lexeme.line, lexeme.token.kind(), lexeme.token))
            .collect(),
        Emit::Ast => print_ast(&pipeline.parse()?, cli.indent),
        Emit::AstJson => serde_json::to_string_pretty(&pipeline.parse()?)? + "\n",
        Emit::Bytecode => {
            let code = pipeline.run()?;
            code.iter().map(|line| format!("{}\n", line)).collect()
        }
    };

    // Caracteres ilegais não impedem a compilação, mas são reportados
    for diagnostic in &pipeline.context.diagnostics {
        eprintln!("aviso: {}", diagnostic);
    }

    match &cli.output {
        Some(path) => fs::write(path, text)?,
        None => io::stdout().write_all(text.as_bytes())?,
    }
    Ok(())
}
