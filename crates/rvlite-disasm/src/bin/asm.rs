use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use rvlite::asm::assemble;

#[derive(Parser, Debug)]
#[command(author, version, about = "Assembler for the rvlite RV32 subset")]
struct Opts {
    /// Input assembly file (one instruction per line, `label:` prefixes allowed)
    #[arg(value_name = "INPUT")]
    input: PathBuf,
    /// Output file: one 32-digit binary word per line
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,
    /// Also print the label table to stderr
    #[arg(long)]
    print_labels: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let opts = Opts::parse();
    let src = fs::read_to_string(&opts.input)
        .with_context(|| format!("reading {}", opts.input.display()))?;

    // Nothing is written when assembly fails
    let asm = match assemble(&src) {
        Ok(asm) => asm,
        Err(e) => {
            eprintln!("{}", e.diagnostic());
            std::process::exit(1);
        }
    };
    if opts.print_labels {
        for (name, addr) in &asm.labels {
            eprintln!("{addr:#06x} {name}");
        }
    }
    fs::write(&opts.output, asm.to_text())
        .with_context(|| format!("writing {}", opts.output.display()))?;
    tracing::info!(words = asm.words.len(), "assembled");
    Ok(())
}
