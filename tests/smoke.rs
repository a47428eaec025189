use pretty_assertions::assert_eq;
use rvlite::asm::assemble;
use rvlite::exec::IntExecutor;
use rvlite::isa::rv32::Rv32Decoder;
use rvlite::{trace, Cpu, CpuConfig, DataMemory, Machine, Program, Step};

fn zeros() -> String {
    format!("0b{}", "0".repeat(32))
}

fn trace_of(src: &str) -> String {
    let program = Program::from_text(&assemble(src).unwrap().to_text()).unwrap();
    let mut m = Machine::new(program, CpuConfig::default());
    let mut lines = Vec::new();
    m.run(|cpu, _| lines.push(trace::state_line(cpu))).unwrap();
    trace::render(&lines, &m.data)
}

#[test]
fn virtual_halt_only_program() {
    let out = trace_of("beq zero, zero, 0");
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 1 + 32);

    let mut expected = vec![zeros(); 33];
    expected[3] = format!("0b{:032b}", 256);
    assert_eq!(lines[0], expected.join(" "));

    assert_eq!(lines[1], "0x00010000:0b00000000000000000000000000000000");
    assert_eq!(lines[32], "0x0001007c:0b00000000000000000000000000000000");
    assert!(out.ends_with('\n'));
}

#[test]
fn one_line_per_step_including_the_halt() {
    let out = trace_of("addi a0, zero, 5\naddi a0, a0, 3\nbeq zero, zero, 0");
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 3 + 32);
    let pcs: Vec<&str> = lines[..3].iter().map(|l| l.split(' ').next().unwrap()).collect();
    assert_eq!(
        pcs,
        vec![
            "0b00000000000000000000000000000100",
            "0b00000000000000000000000000001000",
            "0b00000000000000000000000000001000",
        ]
    );
    let a0: Vec<&str> = lines[..3].iter().map(|l| l.split(' ').nth(11).unwrap()).collect();
    assert_eq!(a0[0], format!("0b{:032b}", 5));
    assert_eq!(a0[2], format!("0b{:032b}", 8));
}

#[test]
fn stored_words_show_in_the_dump() {
    let out = trace_of("lui s0, 0x10000\naddi t0, zero, -1\nsw t0, 4(s0)\nbeq zero, zero, 0");
    assert!(out.contains("0x00010004:0b11111111111111111111111111111111\n"));
}

#[test]
fn step_with_explicit_parts() {
    let program = Program::new(assemble("addi a0, zero, 7\nbeq zero, zero, 0").unwrap().words);
    let mut cpu = Cpu::new(CpuConfig::default());
    assert_eq!(cpu.pc, 0);
    let mut mem = DataMemory::new(0x1_0000, 32);
    let dec = Rv32Decoder::new();
    let exec = IntExecutor;
    assert!(matches!(cpu.step(&program, &mut mem, &dec, &exec), Ok(Step::Retired(_))));
    assert_eq!(cpu.gpr[10], 7);
    assert!(matches!(cpu.step(&program, &mut mem, &dec, &exec), Ok(Step::Halted(_))));
    assert_eq!(cpu.pc, 4);
}
