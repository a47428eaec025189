use rvlite::asm::assemble;
use rvlite::{CpuConfig, Machine, Program};

fn run(src: &str) -> Machine {
    let words = assemble(src).unwrap().words;
    let mut m = Machine::new(Program::new(words), CpuConfig::default()).with_max_steps(10_000);
    m.run(|_, _| {}).unwrap();
    m
}

/// Run `b<cond> t0, t1, skip` with the given operands; a0 ends up 1 when the
/// branch was taken.
fn taken(cond: &str, a: i32, b: i32) -> bool {
    let src = format!(
        "addi t0, zero, {a}\n\
         addi t1, zero, {b}\n\
         {cond} t0, t1, skip\n\
         beq zero, zero, 0\n\
         skip: addi a0, zero, 1\n\
         beq zero, zero, 0"
    );
    run(&src).cpu.gpr[10] == 1
}

#[test]
fn signed_and_unsigned_conditions() {
    assert!(taken("beq", 3, 3));
    assert!(!taken("beq", 3, 4));
    assert!(taken("bne", 3, 4));
    assert!(taken("blt", -1, 0));
    assert!(!taken("bltu", -1, 0));
    assert!(taken("bge", 0, -1));
    assert!(!taken("bgeu", 0, -1));
    assert!(taken("bgeu", -1, 0));
    assert!(taken("bge", 5, 5));
}

#[test]
fn backward_branch_loop() {
    let m = run(
        "addi a0, zero, 0\n\
         addi t0, zero, 5\n\
         loop: addi a0, a0, 2\n\
         addi t0, t0, -1\n\
         bne t0, zero, loop\n\
         beq zero, zero, 0",
    );
    assert_eq!(m.cpu.gpr[10], 10);
    assert_eq!(m.cpu.gpr[5], 0);
}

#[test]
fn unsigned_branch_takes_a_backward_offset() {
    let m = run(
        "addi t0, zero, 2\n\
         top: addi t0, t0, -1\n\
         bltu zero, t0, top\n\
         beq zero, zero, 0",
    );
    assert_eq!(m.cpu.gpr[5], 0);
    assert_eq!(m.cpu.pc, 12);
}

#[test]
fn call_and_return() {
    let m = run(
        "addi a0, zero, 20\n\
         jal ra, double\n\
         addi a1, a0, 1\n\
         beq zero, zero, 0\n\
         double: add a0, a0, a0\n\
         jalr zero, ra, 0",
    );
    assert_eq!(m.cpu.gpr[10], 40);
    assert_eq!(m.cpu.gpr[11], 41);
    assert_eq!(m.cpu.gpr[1], 8);
}

#[test]
fn jalr_links_before_jumping() {
    // rd and rs1 are the same register
    let m = run(
        "addi t0, zero, 12\n\
         jalr t0, t0, 0\n\
         addi a0, zero, 1\n\
         beq zero, zero, 0",
    );
    assert_eq!(m.cpu.gpr[5], 8);
    assert_eq!(m.cpu.gpr[10], 0);
}
