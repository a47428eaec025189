//! Two-pass assembler.
//!
//! Pass 1 strips comments, records `label:` definitions against the address
//! of the instruction they precede and tokenizes the rest. Pass 2 encodes one
//! word per instruction; an immediate operand that names a label is replaced
//! by `label address - instruction address` through a symbol-table lookup.
//! The first error stops assembly and no words are produced.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::codec::{self, CodecError, Fields};
use crate::decoder::{Format, Op};
use crate::instructions::{
    by_mnemonic, InstrDesc, FUNCT7_BASE, HALT_WORD, OPC_RVRS, RESET_WORD, VIRTUAL_HALT_WORD,
};
use crate::regs::reg_index;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmErrorKind {
    #[error("Invalid Instruction '{0}'")]
    InvalidMnemonic(String),
    #[error("Invalid Register '{0}'")]
    InvalidRegisterName(String),
    #[error("Incorrect Immediate: {value} does not fit in {width} bits")]
    ImmediateOutOfRange { value: i64, width: u32 },
    #[error("Invalid Instruction Format: {0}")]
    MalformedOperands(String),
}

impl From<CodecError> for AsmErrorKind {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::ImmediateOutOfRange { value, width } => {
                AsmErrorKind::ImmediateOutOfRange { value, width }
            }
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmError {
    #[error("Line {line}: {kind}")]
    Line { line: usize, kind: AsmErrorKind },
    #[error("Virtual Halt Not Found")]
    MissingVirtualHalt,
}

impl AsmError {
    /// The line the assembler CLI prints, e.g. `ERROR: Line 3: Invalid Instruction 'foo'!`.
    pub fn diagnostic(&self) -> String {
        format!("ERROR: {self}!")
    }

    /// 1-based source line, if the error belongs to one.
    pub fn line(&self) -> Option<usize> {
        match self {
            AsmError::Line { line, .. } => Some(*line),
            AsmError::MissingVirtualHalt => None,
        }
    }
}

pub type Labels = BTreeMap<String, u32>;

/// One instruction line after pass 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub line: usize,
    pub addr: u32,
    pub tokens: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
    pub words: Vec<u32>,
    pub labels: Labels,
}

impl Assembly {
    /// One 32-digit binary line per word, no trailing newline.
    pub fn to_text(&self) -> String {
        self.words
            .iter()
            .map(|w| format!("{w:032b}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find(['#', ';']) {
        Some(p) => &line[..p],
        None => line,
    }
}

/// Split an instruction into mnemonic and operand tokens: commas and `(`
/// separate, `)` is dropped, so `lw a4,20(s1)` becomes `lw a4 20 s1`.
pub fn tokenize(text: &str) -> Vec<String> {
    text.replace([',', '('], " ")
        .replace(')', "")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Pass 1: tokenize instruction lines and collect label addresses.
pub fn parse_source(src: &str) -> Result<(Vec<SourceLine>, Labels), AsmError> {
    let mut lines = Vec::new();
    let mut labels = Labels::new();
    let mut addr = 0u32;
    for (i, raw) in src.lines().enumerate() {
        let line = i + 1;
        let err = |kind| AsmError::Line { line, kind };
        let mut body = strip_comment(raw).trim();
        if let Some((label, rest)) = body.split_once(':') {
            let label = label.trim();
            if label.is_empty() || label.contains(char::is_whitespace) || rest.contains(':') {
                return Err(err(AsmErrorKind::MalformedOperands(format!(
                    "bad label definition '{}'",
                    raw.trim()
                ))));
            }
            if labels.insert(label.to_string(), addr).is_some() {
                return Err(err(AsmErrorKind::MalformedOperands(format!(
                    "duplicate label '{label}'"
                ))));
            }
            body = rest.trim();
        }
        if body.is_empty() {
            continue;
        }
        lines.push(SourceLine { line, addr, tokens: tokenize(body) });
        addr = addr.wrapping_add(4);
    }
    Ok((lines, labels))
}

/// Assemble a whole source file.
pub fn assemble(src: &str) -> Result<Assembly, AsmError> {
    let (lines, labels) = parse_source(src)?;
    let mut words = Vec::with_capacity(lines.len());
    for sl in &lines {
        let toks: Vec<&str> = sl.tokens.iter().map(String::as_str).collect();
        let word = encode_tokens(&toks, sl.addr, &labels)
            .map_err(|kind| AsmError::Line { line: sl.line, kind })?;
        debug!(line = sl.line, addr = sl.addr, "{word:032b}  {}", sl.tokens.join(" "));
        words.push(word);
    }
    if !words.contains(&VIRTUAL_HALT_WORD) {
        return Err(AsmError::MissingVirtualHalt);
    }
    Ok(Assembly { words, labels })
}

/// A token shaped like a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Imm {
    Value(i64),
    /// Too large for an `i64`; carries the saturated value.
    Overflow(i64),
}

/// Parse a decimal or `0x` hexadecimal integer with one optional leading
/// sign. `None` when the token is not shaped like a number at all.
pub fn parse_imm(s: &str) -> Option<Imm> {
    let (neg, body) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };
    let (digits, radix) = match body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (body, 10),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let saturated = if neg { i64::MIN } else { i64::MAX };
    let Ok(mag) = u64::from_str_radix(digits, radix) else {
        return Some(Imm::Overflow(saturated));
    };
    let signed = if neg { -i128::from(mag) } else { i128::from(mag) };
    Some(i64::try_from(signed).map_or(Imm::Overflow(saturated), Imm::Value))
}

/// Operand accessor for one instruction line.
struct Operands<'a> {
    mnemonic: &'a str,
    toks: &'a [&'a str],
    addr: u32,
    labels: &'a Labels,
}

impl Operands<'_> {
    fn expect(&self, n: usize) -> Result<(), AsmErrorKind> {
        if self.toks.len() != n {
            return Err(AsmErrorKind::MalformedOperands(format!(
                "'{}' takes {n} operand(s), found {}",
                self.mnemonic,
                self.toks.len()
            )));
        }
        Ok(())
    }

    fn reg(&self, i: usize) -> Result<u8, AsmErrorKind> {
        let t = self.toks[i];
        reg_index(t).ok_or_else(|| AsmErrorKind::InvalidRegisterName(t.to_string()))
    }

    /// Immediate or label offset for a `width`-bit field.
    fn imm(&self, i: usize, width: u32) -> Result<i64, AsmErrorKind> {
        let t = self.toks[i];
        match parse_imm(t) {
            Some(Imm::Value(v)) => return Ok(v),
            Some(Imm::Overflow(value)) => {
                return Err(AsmErrorKind::ImmediateOutOfRange { value, width })
            }
            None => {}
        }
        match self.labels.get(t) {
            Some(&target) => Ok(i64::from(target) - i64::from(self.addr)),
            None => Err(AsmErrorKind::MalformedOperands(format!(
                "'{t}' is neither an immediate nor a known label"
            ))),
        }
    }
}

/// Encode one tokenized instruction located at `addr`.
pub fn encode_tokens(tokens: &[&str], addr: u32, labels: &Labels) -> Result<u32, AsmErrorKind> {
    let Some((&first, toks)) = tokens.split_first() else {
        return Err(AsmErrorKind::MalformedOperands("empty instruction".into()));
    };
    let mnemonic = first.to_ascii_lowercase();
    let ops = Operands { mnemonic: &mnemonic, toks, addr, labels };

    match mnemonic.as_str() {
        "rst" => {
            ops.expect(0)?;
            return Ok(RESET_WORD);
        }
        "halt" => {
            ops.expect(0)?;
            return Ok(HALT_WORD);
        }
        "rvrs" => {
            ops.expect(2)?;
            let f = Fields {
                opcode: OPC_RVRS,
                rd: ops.reg(0)?,
                rs1: ops.reg(1)?,
                funct7: FUNCT7_BASE,
                ..Fields::default()
            };
            return Ok(codec::pack(Format::R, &f)?);
        }
        _ => {}
    }

    let desc = by_mnemonic(&mnemonic)
        .ok_or_else(|| AsmErrorKind::InvalidMnemonic(first.to_string()))?;
    encode_format(desc, &ops)
}

fn encode_format(desc: &InstrDesc, ops: &Operands<'_>) -> Result<u32, AsmErrorKind> {
    let mut f = Fields {
        opcode: desc.opcode,
        funct3: desc.funct3,
        funct7: desc.funct7,
        ..Fields::default()
    };
    match desc.format {
        Format::R => {
            ops.expect(3)?;
            f.rd = ops.reg(0)?;
            f.rs1 = ops.reg(1)?;
            f.rs2 = ops.reg(2)?;
        }
        Format::I if desc.op == Op::Lw => {
            // lw rd, imm(rs1)
            ops.expect(3)?;
            f.rd = ops.reg(0)?;
            f.imm = ops.imm(1, 12)?;
            f.rs1 = ops.reg(2)?;
        }
        Format::I => {
            ops.expect(3)?;
            f.rd = ops.reg(0)?;
            f.rs1 = ops.reg(1)?;
            f.imm = ops.imm(2, 12)?;
        }
        Format::S => {
            // sw rs2, imm(rs1)
            ops.expect(3)?;
            f.rs2 = ops.reg(0)?;
            f.imm = ops.imm(1, 12)?;
            f.rs1 = ops.reg(2)?;
        }
        Format::B => {
            ops.expect(3)?;
            f.rs1 = ops.reg(0)?;
            f.rs2 = ops.reg(1)?;
            f.imm = ops.imm(2, codec::B_INTER_WIDTH)?;
        }
        Format::U | Format::J => {
            ops.expect(2)?;
            f.rd = ops.reg(0)?;
            let width = if desc.format == Format::U { 32 } else { codec::J_INTER_WIDTH };
            f.imm = ops.imm(1, width)?;
        }
    }
    let word = codec::pack(desc.format, &f)?;
    if matches!(desc.format, Format::B | Format::J) && !codec::offset_survives(desc.format, f.imm) {
        warn!(
            addr = ops.addr,
            offset = f.imm,
            "{} offset does not survive encoding; decodes to {}",
            desc.mnemonic,
            codec::unpack(desc.format, word).imm
        );
    }
    Ok(word)
}
