pub mod asm;
pub mod codec;
pub mod cpu;
pub mod decoder;
pub mod disasm;
pub mod exec;
pub mod instructions;
pub mod machine;
pub mod memory;
pub mod regs;
pub mod trace;

pub mod isa {
    pub mod rv32; // RV32I subset + rst/halt/rvrs
}

pub use cpu::{Cpu, CpuConfig, Halt, Step, Trap};
pub use machine::Machine;
pub use memory::{Bus, DataMemory, MemError, Program};
