/// ABI names indexed by register number.
pub const ABI_NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", // x0..x7
    "s0", "s1", "a0", "a1", "a2", "a3", "a4", "a5", // x8..x15
    "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", // x16..x23
    "s8", "s9", "s10", "s11", "t3", "t4", "t5", "t6", // x24..x31
];

pub const ZERO: u8 = 0;
pub const RA: u8 = 1;
pub const SP: u8 = 2;

/// Resolve an ABI register name to its 5-bit index.
pub fn reg_index(name: &str) -> Option<u8> {
    if name == "fp" {
        return Some(8);
    }
    ABI_NAMES.iter().position(|n| *n == name).map(|i| i as u8)
}

pub fn reg_name(idx: u8) -> &'static str {
    ABI_NAMES[(idx & 0x1F) as usize]
}
