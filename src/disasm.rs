use std::fmt;

use crate::decoder::{Decoded, Decoder, Format, Op};
use crate::instructions::mnemonic;
use crate::regs::reg_name;

/// Mnemonic plus rendered operands, in assembler operand order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disassembly {
    pub mnemonic: &'static str,
    pub operands: Vec<String>,
}

impl fmt::Display for Disassembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operands.is_empty() {
            f.write_str(self.mnemonic)
        } else {
            write!(f, "{} {}", self.mnemonic, self.operands.join(", "))
        }
    }
}

/// Render `d`. With `regs`, every register operand is annotated with its
/// current value, e.g. `a0(x10: 5)`.
pub fn disassemble(d: &Decoded, regs: Option<&[u32; 32]>) -> Disassembly {
    let unsigned = matches!(d.op, Op::Sltu | Op::Bltu | Op::Bgeu);
    let r = |idx: u8| reg(idx, regs, unsigned);
    let operands = match (d.op, d.format) {
        (Op::Rst | Op::Halt, _) => Vec::new(),
        (Op::Rvrs, _) => vec![r(d.rd), r(d.rs1)],
        (Op::Sll | Op::Srl, _) => vec![r(d.rd), r(d.rs1), reg(d.rs2, regs, true)],
        (Op::Lw, _) => vec![r(d.rd), format!("{}({})", d.imm, r(d.rs1))],
        (_, Format::R) => vec![r(d.rd), r(d.rs1), r(d.rs2)],
        (_, Format::I) => vec![r(d.rd), r(d.rs1), d.imm.to_string()],
        (_, Format::S) => vec![r(d.rs2), format!("{}({})", d.imm, r(d.rs1))],
        (_, Format::B) => vec![r(d.rs1), r(d.rs2), d.imm.to_string()],
        (_, Format::U) | (_, Format::J) => vec![r(d.rd), d.imm.to_string()],
    };
    Disassembly { mnemonic: mnemonic(d.op), operands }
}

fn reg(idx: u8, regs: Option<&[u32; 32]>, unsigned: bool) -> String {
    let name = reg_name(idx);
    match regs {
        None => name.to_string(),
        Some(regs) => {
            let v = regs[idx as usize];
            if unsigned {
                format!("{name}(x{idx}: {v})")
            } else {
                format!("{name}(x{idx}: {})", v as i32)
            }
        }
    }
}

pub fn fmt_decoded(d: &Decoded) -> String {
    disassemble(d, None).to_string()
}

/// Disassemble a raw word, falling back to `.word` for undecodable input.
pub fn fmt_word<D: Decoder>(dec: &D, raw: u32) -> String {
    match dec.decode(raw) {
        Some(d) => fmt_decoded(&d),
        None => format!(".word {raw:#010x}"),
    }
}
