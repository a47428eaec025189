use crate::decoder::{Format, Op};

pub const OPC_OP: u8 = 0b011_0011;
pub const OPC_LOAD: u8 = 0b000_0011;
pub const OPC_OP_IMM: u8 = 0b001_0011;
pub const OPC_JALR: u8 = 0b110_0111;
pub const OPC_STORE: u8 = 0b010_0011;
pub const OPC_BRANCH: u8 = 0b110_0011;
pub const OPC_LUI: u8 = 0b011_0111;
pub const OPC_AUIPC: u8 = 0b001_0111;
pub const OPC_JAL: u8 = 0b110_1111;
/// Bit-reversal extension; shares the R layout.
pub const OPC_RVRS: u8 = 0b000_0001;

pub const FUNCT7_BASE: u8 = 0b000_0000;
pub const FUNCT7_ALT: u8 = 0b010_0000;

/// `rst`: reset the register file.
pub const RESET_WORD: u32 = 0x0000_007F;
/// `halt`: stop the simulator immediately.
pub const HALT_WORD: u32 = 0xFFFF_FFFF;
/// `beq zero, zero, 0`, the canonical end-of-program marker.
pub const VIRTUAL_HALT_WORD: u32 = 0x0000_0063;

#[derive(Debug, Clone, Copy)]
pub struct InstrDesc {
    pub op: Op,
    pub mnemonic: &'static str,
    pub format: Format,
    pub funct3: u8,
    pub funct7: u8,
    pub opcode: u8,
}

const fn desc(
    op: Op,
    mnemonic: &'static str,
    format: Format,
    funct3: u8,
    funct7: u8,
    opcode: u8,
) -> InstrDesc {
    InstrDesc { op, mnemonic, format, funct3, funct7, opcode }
}

pub const TABLE: &[InstrDesc] = &[
    desc(Op::Add, "add", Format::R, 0b000, FUNCT7_BASE, OPC_OP),
    desc(Op::Sub, "sub", Format::R, 0b000, FUNCT7_ALT, OPC_OP),
    desc(Op::Sll, "sll", Format::R, 0b001, FUNCT7_BASE, OPC_OP),
    desc(Op::Slt, "slt", Format::R, 0b010, FUNCT7_BASE, OPC_OP),
    desc(Op::Sltu, "sltu", Format::R, 0b011, FUNCT7_BASE, OPC_OP),
    desc(Op::Xor, "xor", Format::R, 0b100, FUNCT7_BASE, OPC_OP),
    desc(Op::Srl, "srl", Format::R, 0b101, FUNCT7_BASE, OPC_OP),
    desc(Op::Or, "or", Format::R, 0b110, FUNCT7_BASE, OPC_OP),
    desc(Op::And, "and", Format::R, 0b111, FUNCT7_BASE, OPC_OP),
    desc(Op::Mul, "mul", Format::R, 0b111, FUNCT7_ALT, OPC_OP),
    desc(Op::Lw, "lw", Format::I, 0b010, 0, OPC_LOAD),
    desc(Op::Addi, "addi", Format::I, 0b000, 0, OPC_OP_IMM),
    desc(Op::Sltiu, "sltiu", Format::I, 0b011, 0, OPC_OP_IMM),
    desc(Op::Jalr, "jalr", Format::I, 0b000, 0, OPC_JALR),
    desc(Op::Sw, "sw", Format::S, 0b010, 0, OPC_STORE),
    desc(Op::Beq, "beq", Format::B, 0b000, 0, OPC_BRANCH),
    desc(Op::Bne, "bne", Format::B, 0b001, 0, OPC_BRANCH),
    desc(Op::Blt, "blt", Format::B, 0b100, 0, OPC_BRANCH),
    desc(Op::Bge, "bge", Format::B, 0b101, 0, OPC_BRANCH),
    desc(Op::Bltu, "bltu", Format::B, 0b110, 0, OPC_BRANCH),
    desc(Op::Bgeu, "bgeu", Format::B, 0b111, 0, OPC_BRANCH),
    desc(Op::Lui, "lui", Format::U, 0, 0, OPC_LUI),
    desc(Op::Auipc, "auipc", Format::U, 0, 0, OPC_AUIPC),
    desc(Op::Jal, "jal", Format::J, 0, 0, OPC_JAL),
];

pub fn by_mnemonic(mnemonic: &str) -> Option<&'static InstrDesc> {
    TABLE.iter().find(|d| d.mnemonic == mnemonic)
}

pub fn by_op(op: Op) -> Option<&'static InstrDesc> {
    TABLE.iter().find(|d| d.op == op)
}

/// Find the table entry selected by the primary and secondary opcode fields.
/// U and J entries ignore funct3, only R entries consult funct7.
pub fn by_encoding(opcode: u8, funct3: u8, funct7: u8) -> Option<&'static InstrDesc> {
    TABLE.iter().find(|d| {
        d.opcode == opcode
            && match d.format {
                Format::R => d.funct3 == funct3 && d.funct7 == funct7,
                Format::I | Format::S | Format::B => d.funct3 == funct3,
                Format::U | Format::J => true,
            }
    })
}

/// Mnemonic text for any op, including the extensions.
pub fn mnemonic(op: Op) -> &'static str {
    match op {
        Op::Rst => "rst",
        Op::Halt => "halt",
        Op::Rvrs => "rvrs",
        _ => by_op(op).map(|d| d.mnemonic).unwrap_or("?"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_entry_is_reachable_by_its_encoding() {
        for d in TABLE {
            let found = by_encoding(d.opcode, d.funct3, d.funct7).unwrap();
            assert_eq!(found.op, d.op, "{}", d.mnemonic);
        }
    }

    #[test]
    fn and_and_mul_share_funct3() {
        assert_eq!(by_encoding(OPC_OP, 0b111, FUNCT7_BASE).unwrap().op, Op::And);
        assert_eq!(by_encoding(OPC_OP, 0b111, FUNCT7_ALT).unwrap().op, Op::Mul);
        assert!(by_encoding(OPC_OP, 0b111, 0b000_0001).is_none());
    }

    #[test]
    fn branch_without_predicate_is_unknown() {
        assert!(by_encoding(OPC_BRANCH, 0b010, 0).is_none());
        assert!(by_encoding(OPC_BRANCH, 0b011, 0).is_none());
    }

    #[test]
    fn extension_mnemonics() {
        assert_eq!(mnemonic(Op::Rvrs), "rvrs");
        assert_eq!(mnemonic(Op::Jal), "jal");
        assert!(by_mnemonic("rst").is_none());
    }
}
