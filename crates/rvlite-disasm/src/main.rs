use anyhow::Result;
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use rvlite::decoder::{Decoder, Format};
use rvlite::disasm::disassemble;
use rvlite::isa::rv32::Rv32Decoder;

use rvlite_disasm::analyze::{analyze_entries, target_labels, Edge};
use rvlite_disasm::model::{end, load_text_bin, Image};

#[derive(Parser, Debug)]
#[command(author, version, about = "RV32 subset disassembler", long_about = None)]
struct Cli {
    /// Assembled program: one 32-digit binary word per line
    #[arg(value_name = "BINFILE")]
    input: PathBuf,
    /// Output format: text or json
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Name branch and jump targets `loc_XXXXXXXX` and use the names as operands
    #[arg(long)]
    labels: bool,
    /// Show the raw instruction word next to each line
    #[arg(long)]
    show_bits: bool,
    /// Extra entry addresses for the reachability walk (hex or dec)
    #[arg(long = "entry", value_name = "ADDR")]
    entries: Vec<String>,
    /// Maximum instructions to visit while walking
    #[arg(long, default_value_t = 100_000usize)]
    max_instr: usize,
    /// Write output to file instead of stdout
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize)]
struct LineOut {
    addr: u32,
    word: String,
    text: String,
    reachable: bool,
}

#[derive(Debug, Clone, Serialize)]
struct LabelKV {
    addr: u32,
    name: String,
}

#[derive(Debug, Clone, Serialize)]
struct Report {
    name: String,
    end: u32,
    entries: Vec<u32>,
    lines: Vec<LineOut>,
    edges: Vec<Edge>,
    labels: Vec<LabelKV>,
}

fn parse_u32(s: &str) -> Result<u32> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Ok(u32::from_str_radix(hex, 16)?)
    } else {
        Ok(s.parse::<u32>()?)
    }
}

/// Render the word at `pc`, substituting a label name for a branch or jump
/// offset when its target has one.
fn render_insn<D: Decoder>(dec: &D, pc: u32, raw: u32, labels: &BTreeMap<u32, String>) -> String {
    let Some(d) = dec.decode(raw) else {
        return format!(".word {raw:#010x}");
    };
    let mut dis = disassemble(&d, None);
    if matches!(d.format, Format::B | Format::J) {
        if let Some(name) = labels.get(&pc.wrapping_add(d.imm as u32)) {
            if let Some(last) = dis.operands.last_mut() {
                *last = name.clone();
            }
        }
    }
    dis.to_string()
}

fn build_report(img: &Image, seeds: &[u32], max_instr: usize, with_labels: bool) -> Report {
    let dec = Rv32Decoder::new();
    let analysis = analyze_entries(img, seeds, max_instr);
    tracing::debug!(
        visited = analysis.visited.len(),
        edges = analysis.edges.len(),
        exits = analysis.exits.len(),
        "reachability walk done"
    );
    let labels = if with_labels { target_labels(&analysis) } else { BTreeMap::new() };
    let lines = img
        .program
        .iter()
        .map(|(addr, raw)| LineOut {
            addr,
            word: format!("{raw:032b}"),
            text: render_insn(&dec, addr, raw, &labels),
            reachable: analysis.visited.contains(&addr),
        })
        .collect();
    Report {
        name: img.name.clone(),
        end: end(img),
        entries: seeds.to_vec(),
        lines,
        edges: analysis.edges,
        labels: labels.into_iter().map(|(addr, name)| LabelKV { addr, name }).collect(),
    }
}

fn render_text(report: &Report, show_bits: bool) -> String {
    let names: BTreeMap<u32, &str> = report.labels.iter().map(|l| (l.addr, l.name.as_str())).collect();
    let mut buf = String::new();
    for l in &report.lines {
        if let Some(name) = names.get(&l.addr) {
            let _ = writeln!(buf, "{name}:");
        }
        if show_bits {
            let _ = writeln!(buf, "{:#06x}: {}  {}", l.addr, l.word, l.text);
        } else {
            let _ = writeln!(buf, "{:#06x}: {}", l.addr, l.text);
        }
    }
    buf
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let img = load_text_bin(&cli.input)?;

    let mut seeds = vec![0u32];
    for e in &cli.entries {
        seeds.push(parse_u32(e)?);
    }
    seeds.sort_unstable();
    seeds.dedup();

    let report = build_report(&img, &seeds, cli.max_instr, cli.labels);
    let out = match cli.format {
        OutputFormat::Text => render_text(&report, cli.show_bits),
        OutputFormat::Json => serde_json::to_string_pretty(&report)? + "\n",
    };
    match cli.out {
        Some(path) => std::fs::write(path, out)?,
        None => print!("{out}"),
    }
    Ok(())
}
