use crate::decoder::{Decoded, Decoder, Op};
use crate::exec::Executor;
use crate::instructions::VIRTUAL_HALT_WORD;
use crate::memory::{Bus, MemError, Program};
use crate::regs::{SP, ZERO};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuConfig {
    pub stack_top: u32, // initial sp, also restored by `rst`
    pub data_base: u32,
    pub data_words: usize,
}

impl Default for CpuConfig {
    fn default() -> Self {
        Self {
            stack_top: 256,
            data_base: 0x0001_0000,
            data_words: 32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cpu {
    pub pc: u32,        // Program Counter (byte address)
    pub gpr: [u32; 32], // x0..x31
    pub cfg: CpuConfig,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Trap {
    #[error("program counter {pc:#010x} addresses no instruction")]
    ProgramCounterOutOfRange { pc: u32 },
    #[error("unrecognized instruction {raw:#010x} at {pc:#010x}")]
    UnrecognizedOpcode { pc: u32, raw: u32 },
    #[error("memory access out of range at {addr:#010x}: {source}")]
    MemoryOutOfRange { addr: u32, #[source] source: MemError },
    #[error("step limit of {limit} instructions reached")]
    StepLimit { limit: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Halt {
    /// The literal `halt` word.
    Explicit,
    /// `beq zero, zero, 0`.
    Virtual,
}

/// Outcome of one fetch-decode-execute step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Retired(Decoded),
    Halted(Halt),
}

impl Cpu {
    pub fn new(cfg: CpuConfig) -> Self {
        let mut cpu = Self {
            pc: 0,
            gpr: [0; 32],
            cfg,
        };
        cpu.reset_registers();
        cpu
    }

    /// Zero every register and reload the stack pointer.
    pub fn reset_registers(&mut self) {
        self.gpr = [0; 32];
        self.gpr[SP as usize] = self.cfg.stack_top;
    }

    pub fn reg(&self, idx: u8) -> u32 {
        self.gpr[(idx & 0x1F) as usize]
    }

    pub fn set_reg(&mut self, idx: u8, val: u32) {
        self.gpr[(idx & 0x1F) as usize] = val;
    }

    pub fn step<B: Bus, D: Decoder, X: Executor>(
        &mut self,
        prog: &Program,
        bus: &mut B,
        dec: &D,
        exec: &X,
    ) -> Result<Step, Trap> {
        let pc = self.pc;
        let raw32 = prog
            .fetch(pc)
            .ok_or(Trap::ProgramCounterOutOfRange { pc })?;
        if raw32 == VIRTUAL_HALT_WORD {
            return Ok(Step::Halted(Halt::Virtual));
        }
        let d = dec
            .decode(raw32)
            .ok_or(Trap::UnrecognizedOpcode { pc, raw: raw32 })?;
        if d.op == Op::Halt {
            return Ok(Step::Halted(Halt::Explicit));
        }
        // Fall-through target; control flow ops overwrite it
        self.pc = pc.wrapping_add(4);
        if let Err(trap) = exec.exec(self, bus, d, pc) {
            self.pc = pc;
            return Err(trap);
        }
        self.gpr[ZERO as usize] = 0;
        Ok(Step::Retired(d))
    }
}
