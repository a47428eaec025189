use serde::{Deserialize, Serialize};

/// Bit-layout class of an instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Format {
    R,
    I,
    S,
    B,
    U,
    J,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Op {
    // R
    Add,
    Sub,
    Sll,
    Slt,
    Sltu,
    Xor,
    Srl,
    Or,
    And,
    Mul,
    // I
    Lw,
    Addi,
    Sltiu,
    Jalr,
    // S
    Sw,
    // B
    Beq,
    Bne,
    Blt,
    Bge,
    Bltu,
    Bgeu,
    // U
    Lui,
    Auipc,
    // J
    Jal,
    // Extensions outside the format table
    Rst,
    Halt,
    Rvrs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoded {
    pub op: Op,
    pub format: Format,
    pub raw: u32,
    pub rd: u8,
    pub rs1: u8,
    pub rs2: u8,
    /// Sign-extended immediate; for U-type already shifted into bits 31:12.
    pub imm: i32,
}

pub trait Decoder {
    fn decode(&self, raw32: u32) -> Option<Decoded>;
}
