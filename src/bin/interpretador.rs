use clap::Parser;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use compilador_pascal::runtime::{load, Machine};

//cargo run --bin compilador -- teste.pas -o teste.vm
//cargo run --bin interpretador -- teste.vm

#[derive(Parser)]
#[command(name = "interpretador")]
#[command(about = "Executa um programa EWVM gerado pelo compilador")]
#[command(version)]
struct Cli {
    /// Arquivo .vm
    #[arg(value_name = "FILE")]
    program: PathBuf,

    /// Interrompe a execução depois deste número de instruções
    #[arg(long)]
    max_steps: Option<usize>,

    /// Mais detalhes nos logs (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "error",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("\n--- Erro de Execução ---");
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let text = fs::read_to_string(&cli.program)
        .map_err(|e| format!("não foi possível ler {}: {}", cli.program.display(), e))?;
    let program = load(&text)?;

    let stdin = io::stdin();
    let mut machine = Machine::new(program, stdin.lock(), io::stdout().lock());
    if let Some(limit) = cli.max_steps {
        machine = machine.with_step_limit(limit);
    }
    machine.run()?;
    Ok(())
}
