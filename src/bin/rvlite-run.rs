use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use rvlite::{trace, CpuConfig, Machine, Program};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Run an assembled program on the rvlite simulator"
)]
struct Opts {
    /// Assembled program: one 32-digit binary word per line
    #[arg(value_name = "BINFILE")]
    input: PathBuf,
    /// Trace output: one state line per step, then the data memory dump
    #[arg(value_name = "TRACEFILE")]
    output: PathBuf,
    /// JSON file with a CpuConfig (stack_top, data_base, data_words)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Abort after this many steps instead of running until a halt
    #[arg(long)]
    max_steps: Option<u64>,
    /// Write the final CPU state as JSON
    #[arg(long, value_name = "FILE")]
    dump_state: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let opts = Opts::parse();

    let cfg = match &opts.config {
        Some(path) => {
            let txt = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str::<CpuConfig>(&txt)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => CpuConfig::default(),
    };

    let text = std::fs::read_to_string(&opts.input)
        .with_context(|| format!("reading {}", opts.input.display()))?;
    let program = Program::from_text(&text)?;

    let mut machine = Machine::new(program, cfg);
    if let Some(limit) = opts.max_steps {
        machine = machine.with_max_steps(limit);
    }

    let mut lines = Vec::new();
    let halt = machine.run(|cpu, _| lines.push(trace::state_line(cpu)));
    if let Some(path) = &opts.dump_state {
        std::fs::write(path, serde_json::to_string_pretty(&machine.cpu)?)?;
    }
    let halt = halt.with_context(|| format!("after {} steps", machine.steps()))?;
    tracing::info!(?halt, steps = machine.steps(), "simulation finished");

    std::fs::write(&opts.output, trace::render(&lines, &machine.data))
        .with_context(|| format!("writing {}", opts.output.display()))?;
    Ok(())
}
