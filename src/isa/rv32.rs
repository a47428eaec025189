use crate::codec::unpack;
use crate::decoder::{Decoded, Decoder, Format, Op};
use crate::instructions::{by_encoding, HALT_WORD, OPC_RVRS, RESET_WORD};

/// Decoder for the reduced RV32 subset plus the `rst`/`halt`/`rvrs`
/// extensions. Field slicing is shared with the assembler through
/// [`crate::codec`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Rv32Decoder;

impl Rv32Decoder {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for Rv32Decoder {
    fn decode(&self, raw32: u32) -> Option<Decoded> {
        // Fixed extension words are matched before the opcode field
        let fixed = match raw32 {
            RESET_WORD => Some(Op::Rst),
            HALT_WORD => Some(Op::Halt),
            _ => None,
        };
        if let Some(op) = fixed {
            return Some(Decoded { op, format: Format::R, raw: raw32, rd: 0, rs1: 0, rs2: 0, imm: 0 });
        }

        let opcode = (raw32 & 0x7F) as u8;
        if opcode == OPC_RVRS {
            let f = unpack(Format::R, raw32);
            return Some(Decoded { op: Op::Rvrs, format: Format::R, raw: raw32, rd: f.rd, rs1: f.rs1, rs2: 0, imm: 0 });
        }

        // funct3/funct7 sit at fixed positions in every format that has them
        let probe = unpack(Format::R, raw32);
        let desc = by_encoding(opcode, probe.funct3, probe.funct7)?;
        let f = unpack(desc.format, raw32);
        Some(Decoded {
            op: desc.op,
            format: desc.format,
            raw: raw32,
            rd: f.rd,
            rs1: f.rs1,
            rs2: f.rs2,
            imm: f.imm as i32,
        })
    }
}
