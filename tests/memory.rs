use rvlite::asm::assemble;
use rvlite::memory::MemError;
use rvlite::{CpuConfig, Machine, Program, Trap};

fn machine(src: &str) -> Machine {
    let words = assemble(src).unwrap().words;
    Machine::new(Program::new(words), CpuConfig::default())
}

#[test]
fn store_then_load() {
    let mut m = machine(
        "lui s0, 0x10000\n\
         addi t0, zero, -123\n\
         sw t0, 8(s0)\n\
         lw a0, 8(s0)\n\
         sw t0, 124(s0)\n\
         beq zero, zero, 0",
    );
    m.run(|_, _| {}).unwrap();
    assert_eq!(m.cpu.gpr[10] as i32, -123);
    assert_eq!(m.data.words[2] as i32, -123);
    assert_eq!(m.data.words[31] as i32, -123);
}

#[test]
fn load_outside_window_traps() {
    let mut m = machine("lw a0, 0(sp)\nbeq zero, zero, 0");
    let err = m.run(|_, _| {}).unwrap_err();
    assert_eq!(
        err,
        Trap::MemoryOutOfRange {
            addr: 256,
            source: MemError::Unmapped { addr: 256, base: 0x1_0000, end: 0x1_0080 },
        }
    );
    // the faulting instruction does not retire
    assert_eq!(m.cpu.pc, 0);
}

#[test]
fn store_past_window_end_traps() {
    let mut m = machine("lui s0, 0x10000\nsw zero, 128(s0)\nbeq zero, zero, 0");
    assert!(matches!(
        m.run(|_, _| {}),
        Err(Trap::MemoryOutOfRange { addr: 0x1_0080, .. })
    ));
    assert!(m.data.words.iter().all(|&w| w == 0));
}

#[test]
fn unaligned_access_traps() {
    let mut m = machine("lui s0, 0x10000\nlw a0, 2(s0)\nbeq zero, zero, 0");
    assert!(matches!(
        m.run(|_, _| {}),
        Err(Trap::MemoryOutOfRange { source: MemError::Unaligned { .. }, .. })
    ));
}

#[test]
fn configured_window() {
    let cfg = CpuConfig { data_base: 0x100, data_words: 4, ..CpuConfig::default() };
    let words = assemble("addi t0, zero, 9\nsw t0, 0(sp)\nsw t0, 12(sp)\nbeq zero, zero, 0")
        .unwrap()
        .words;
    let mut m = Machine::new(Program::new(words), cfg);
    m.run(|_, _| {}).unwrap();
    assert_eq!(m.data.words, vec![9, 0, 0, 9]);
}
