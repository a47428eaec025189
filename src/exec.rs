use crate::cpu::{Cpu, Trap};
use crate::decoder::{Decoded, Op};
use crate::memory::Bus;

pub trait Executor {
    /// Apply `d`, fetched from address `at`. On entry `cpu.pc` already holds
    /// `at + 4`.
    fn exec<B: Bus>(&self, cpu: &mut Cpu, bus: &mut B, d: Decoded, at: u32) -> Result<(), Trap>;
}

pub struct IntExecutor;
impl Executor for IntExecutor {
    fn exec<B: Bus>(&self, cpu: &mut Cpu, bus: &mut B, d: Decoded, at: u32) -> Result<(), Trap> {
        let rs1 = cpu.reg(d.rs1);
        let rs2 = cpu.reg(d.rs2);
        let imm = d.imm as u32;
        match d.op {
            Op::Add => cpu.set_reg(d.rd, rs1.wrapping_add(rs2)),
            Op::Sub => cpu.set_reg(d.rd, rs1.wrapping_sub(rs2)),
            Op::Sll => cpu.set_reg(d.rd, rs1 << (rs2 & 0x1F)),
            Op::Slt => cpu.set_reg(d.rd, ((rs1 as i32) < (rs2 as i32)) as u32),
            Op::Sltu => cpu.set_reg(d.rd, (rs1 < rs2) as u32),
            Op::Xor => cpu.set_reg(d.rd, rs1 ^ rs2),
            Op::Srl => cpu.set_reg(d.rd, rs1 >> (rs2 & 0x1F)),
            Op::Or => cpu.set_reg(d.rd, rs1 | rs2),
            Op::And => cpu.set_reg(d.rd, rs1 & rs2),
            Op::Mul => cpu.set_reg(d.rd, rs1.wrapping_mul(rs2)),
            Op::Lw => {
                let addr = rs1.wrapping_add(imm);
                let val = bus
                    .read_u32(addr)
                    .map_err(|source| Trap::MemoryOutOfRange { addr, source })?;
                cpu.set_reg(d.rd, val);
            }
            Op::Addi => cpu.set_reg(d.rd, rs1.wrapping_add(imm)),
            Op::Sltiu => {
                // the raw 12-bit field, zero-extended
                cpu.set_reg(d.rd, (rs1 < (imm & 0xFFF)) as u32);
            }
            Op::Jalr => {
                cpu.set_reg(d.rd, at.wrapping_add(4));
                cpu.pc = rs1.wrapping_add(imm);
            }
            Op::Sw => {
                let addr = rs1.wrapping_add(imm);
                bus.write_u32(addr, rs2)
                    .map_err(|source| Trap::MemoryOutOfRange { addr, source })?;
            }
            Op::Beq | Op::Bne | Op::Blt | Op::Bge | Op::Bltu | Op::Bgeu => {
                let taken = match d.op {
                    Op::Beq => rs1 == rs2,
                    Op::Bne => rs1 != rs2,
                    Op::Blt => (rs1 as i32) < (rs2 as i32),
                    Op::Bge => (rs1 as i32) >= (rs2 as i32),
                    Op::Bltu => rs1 < rs2,
                    _ => rs1 >= rs2,
                };
                if taken {
                    cpu.pc = at.wrapping_add(imm);
                }
            }
            Op::Lui => cpu.set_reg(d.rd, imm),
            Op::Auipc => cpu.set_reg(d.rd, at.wrapping_add(imm)),
            Op::Jal => {
                cpu.set_reg(d.rd, at.wrapping_add(4));
                cpu.pc = at.wrapping_add(imm);
            }
            Op::Rst => cpu.reset_registers(),
            Op::Rvrs => cpu.set_reg(d.rd, rs1.reverse_bits()),
            // Cpu::step stops before dispatching a halt
            Op::Halt => cpu.pc = at,
        }
        Ok(())
    }
}
