use std::fmt::Write as _;

use crate::cpu::Cpu;
use crate::memory::DataMemory;

/// `0b<pc> 0b<x0> ... 0b<x31>`, every value as 32 binary digits.
pub fn state_line(cpu: &Cpu) -> String {
    let mut line = String::with_capacity(33 * 35);
    let _ = write!(line, "0b{:032b}", cpu.pc);
    for r in &cpu.gpr {
        let _ = write!(line, " 0b{r:032b}");
    }
    line
}

/// One `0x<addr>:0b<value>` line per data word, each newline-terminated.
pub fn memory_dump(mem: &DataMemory) -> String {
    let mut out = String::new();
    for (addr, val) in mem.iter() {
        let _ = writeln!(out, "0x{addr:08x}:0b{val:032b}");
    }
    out
}

/// Full simulator output: the state lines followed by the memory dump.
pub fn render(lines: &[String], mem: &DataMemory) -> String {
    let mut out = String::new();
    for l in lines {
        out.push_str(l);
        out.push('\n');
    }
    out.push_str(&memory_dump(mem));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CpuConfig;

    #[test]
    fn initial_state_line() {
        let cpu = Cpu::new(CpuConfig::default());
        let line = state_line(&cpu);
        let fields: Vec<&str> = line.split(' ').collect();
        assert_eq!(fields.len(), 33);
        assert_eq!(fields[0], format!("0b{}", "0".repeat(32)));
        assert_eq!(fields[3], "0b00000000000000000000000100000000");
        assert!(fields.iter().all(|f| f.len() == 34));
    }

    #[test]
    fn dump_covers_the_window() {
        let mut mem = DataMemory::new(0x1_0000, 32);
        mem.words[1] = 5;
        let dump = memory_dump(&mem);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 32);
        assert_eq!(lines[0], "0x00010000:0b00000000000000000000000000000000");
        assert_eq!(lines[1], "0x00010004:0b00000000000000000000000000000101");
        assert_eq!(lines[31], "0x0001007c:0b00000000000000000000000000000000");
    }
}
