use tracing::{debug, info, Level};

use crate::cpu::{Cpu, CpuConfig, Halt, Step, Trap};
use crate::disasm::disassemble;
use crate::exec::IntExecutor;
use crate::isa::rv32::Rv32Decoder;
use crate::memory::{DataMemory, Program};

/// Simulation context: the CPU, its program and its data memory, owned
/// together and advanced one instruction per [`Machine::step`].
pub struct Machine {
    pub cpu: Cpu,
    pub program: Program,
    pub data: DataMemory,
    dec: Rv32Decoder,
    exec: IntExecutor,
    max_steps: Option<u64>,
    steps: u64,
}

impl Machine {
    pub fn new(program: Program, cfg: CpuConfig) -> Self {
        Self {
            cpu: Cpu::new(cfg),
            data: DataMemory::new(cfg.data_base, cfg.data_words),
            program,
            dec: Rv32Decoder::new(),
            exec: IntExecutor,
            max_steps: None,
            steps: 0,
        }
    }

    /// Abort with [`Trap::StepLimit`] instead of executing more than `limit`
    /// steps.
    pub fn with_max_steps(mut self, limit: u64) -> Self {
        self.max_steps = Some(limit);
        self
    }

    /// Steps taken so far, halting steps included.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn step(&mut self) -> Result<Step, Trap> {
        if let Some(limit) = self.max_steps {
            if self.steps >= limit {
                return Err(Trap::StepLimit { limit });
            }
        }
        let pc = self.cpu.pc;
        let before = tracing::enabled!(Level::DEBUG).then_some(self.cpu.gpr);
        let step = self
            .cpu
            .step(&self.program, &mut self.data, &self.dec, &self.exec)?;
        self.steps += 1;
        match step {
            Step::Retired(d) => {
                if let Some(regs) = before {
                    debug!(step = self.steps, "{pc:#06x}: {}", disassemble(&d, Some(&regs)));
                }
            }
            Step::Halted(kind) => info!(pc, steps = self.steps, ?kind, "halted"),
        }
        Ok(step)
    }

    /// Step until a halt, calling `on_step` with the state after every step
    /// (the halting step included).
    pub fn run<F: FnMut(&Cpu, &Step)>(&mut self, mut on_step: F) -> Result<Halt, Trap> {
        loop {
            let step = self.step()?;
            on_step(&self.cpu, &step);
            if let Step::Halted(kind) = step {
                return Ok(kind);
            }
        }
    }
}
