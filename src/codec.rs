//! Two's-complement field conversion and per-format word packing.
//!
//! B and J immediates go through oversized intermediates (16 and 21 bits)
//! whose bits are addressed MSB-first: index 0 is the most significant bit of
//! the intermediate. Packing and unpacking use the same index ranges so the
//! assembler and the simulator agree on every slot.

use crate::decoder::Format;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    #[error("immediate {value} does not fit in {width} bits")]
    ImmediateOutOfRange { value: i64, width: u32 },
}

pub const B_INTER_WIDTH: u32 = 16;
pub const J_INTER_WIDTH: u32 = 21;

fn mask(width: u32) -> u32 {
    ((1u64 << width) - 1) as u32
}

/// Encode `value` as a `width`-bit two's-complement pattern.
pub fn encode_signed(value: i64, width: u32) -> Result<u32, CodecError> {
    debug_assert!((1..=32).contains(&width));
    let min = -(1i64 << (width - 1));
    let max = (1i64 << (width - 1)) - 1;
    if value < min || value > max {
        return Err(CodecError::ImmediateOutOfRange { value, width });
    }
    Ok((value as u32) & mask(width))
}

/// Interpret the low `width` bits of `bits` as a signed integer.
pub fn decode_signed(bits: u32, width: u32) -> i32 {
    debug_assert!((1..=32).contains(&width));
    let shift = 32 - width;
    ((bits << shift) as i32) >> shift
}

/// Bits at MSB-first indices `from..to` of a `width`-bit intermediate.
fn take(inter: u32, width: u32, from: u32, to: u32) -> u32 {
    (inter >> (width - to)) & mask(to - from)
}

fn put(inter: &mut u32, width: u32, from: u32, to: u32, value: u32) {
    *inter |= (value & mask(to - from)) << (width - to);
}

#[inline]
fn bits(word: u32, hi: u32, lo: u32) -> u32 {
    (word >> lo) & mask(hi - lo + 1)
}

/// Field values of one instruction word. Fields a format does not carry are
/// ignored when packing and left zero when unpacking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fields {
    pub opcode: u8,
    pub rd: u8,
    pub rs1: u8,
    pub rs2: u8,
    pub funct3: u8,
    pub funct7: u8,
    pub imm: i64,
}

pub fn pack(format: Format, f: &Fields) -> Result<u32, CodecError> {
    let opcode = u32::from(f.opcode) & 0x7F;
    let rd = u32::from(f.rd) & 0x1F;
    let rs1 = u32::from(f.rs1) & 0x1F;
    let rs2 = u32::from(f.rs2) & 0x1F;
    let funct3 = u32::from(f.funct3) & 0x7;
    let funct7 = u32::from(f.funct7) & 0x7F;

    let word = match format {
        Format::R => {
            (funct7 << 25) | (rs2 << 20) | (rs1 << 15) | (funct3 << 12) | (rd << 7) | opcode
        }
        Format::I => {
            let imm = encode_signed(f.imm, 12)?;
            (imm << 20) | (rs1 << 15) | (funct3 << 12) | (rd << 7) | opcode
        }
        Format::S => {
            let imm = encode_signed(f.imm, 12)?;
            ((imm >> 5) << 25)
                | (rs2 << 20)
                | (rs1 << 15)
                | (funct3 << 12)
                | ((imm & 0x1F) << 7)
                | opcode
        }
        Format::B => {
            let w = B_INTER_WIDTH;
            let inter = encode_signed(f.imm, w)?;
            (take(inter, w, 3, 4) << 31)
                | (take(inter, w, 5, 11) << 25)
                | (rs2 << 20)
                | (rs1 << 15)
                | (funct3 << 12)
                | (take(inter, w, 11, 15) << 8)
                | (take(inter, w, 4, 5) << 7)
                | opcode
        }
        Format::U => {
            let imm = encode_signed(f.imm, 32)?;
            (imm & 0xFFFF_F000) | (rd << 7) | opcode
        }
        Format::J => {
            let w = J_INTER_WIDTH;
            let inter = encode_signed(f.imm, w)?;
            // The bit-11 slot carries index 10, not index 9.
            (take(inter, w, 0, 1) << 31)
                | (take(inter, w, 10, 20) << 21)
                | (take(inter, w, 10, 11) << 20)
                | (take(inter, w, 1, 9) << 12)
                | (rd << 7)
                | opcode
        }
    };
    Ok(word)
}

pub fn unpack(format: Format, word: u32) -> Fields {
    let mut f = Fields {
        opcode: bits(word, 6, 0) as u8,
        ..Fields::default()
    };
    match format {
        Format::R => {
            f.rd = bits(word, 11, 7) as u8;
            f.funct3 = bits(word, 14, 12) as u8;
            f.rs1 = bits(word, 19, 15) as u8;
            f.rs2 = bits(word, 24, 20) as u8;
            f.funct7 = bits(word, 31, 25) as u8;
        }
        Format::I => {
            f.rd = bits(word, 11, 7) as u8;
            f.funct3 = bits(word, 14, 12) as u8;
            f.rs1 = bits(word, 19, 15) as u8;
            f.imm = decode_signed(bits(word, 31, 20), 12).into();
        }
        Format::S => {
            f.funct3 = bits(word, 14, 12) as u8;
            f.rs1 = bits(word, 19, 15) as u8;
            f.rs2 = bits(word, 24, 20) as u8;
            let imm = (bits(word, 31, 25) << 5) | bits(word, 11, 7);
            f.imm = decode_signed(imm, 12).into();
        }
        Format::B => {
            f.funct3 = bits(word, 14, 12) as u8;
            f.rs1 = bits(word, 19, 15) as u8;
            f.rs2 = bits(word, 24, 20) as u8;
            let w = B_INTER_WIDTH;
            let mut inter = 0;
            put(&mut inter, w, 3, 4, bits(word, 31, 31));
            put(&mut inter, w, 5, 11, bits(word, 30, 25));
            put(&mut inter, w, 11, 15, bits(word, 11, 8));
            put(&mut inter, w, 4, 5, bits(word, 7, 7));
            // Indices 0..3 are not stored; they repeat the sign at index 3.
            if take(inter, w, 3, 4) == 1 {
                put(&mut inter, w, 0, 3, 0b111);
            }
            f.imm = decode_signed(inter, w).into();
        }
        Format::U => {
            f.rd = bits(word, 11, 7) as u8;
            f.imm = ((word & 0xFFFF_F000) as i32).into();
        }
        Format::J => {
            f.rd = bits(word, 11, 7) as u8;
            let w = J_INTER_WIDTH;
            let mut inter = 0;
            put(&mut inter, w, 0, 1, bits(word, 31, 31));
            put(&mut inter, w, 10, 20, bits(word, 30, 21));
            put(&mut inter, w, 9, 10, bits(word, 20, 20));
            put(&mut inter, w, 1, 9, bits(word, 19, 12));
            f.imm = decode_signed(inter, w).into();
        }
    }
    f
}

/// True when `offset` comes back unchanged from a B or J word.
pub fn offset_survives(format: Format, offset: i64) -> bool {
    let probe = Fields { imm: offset, ..Fields::default() };
    match pack(format, &probe) {
        Ok(word) => unpack(format, word).imm == offset,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_bounds() {
        assert_eq!(encode_signed(2047, 12), Ok(0x7FF));
        assert_eq!(encode_signed(-2048, 12), Ok(0x800));
        assert_eq!(encode_signed(-1, 12), Ok(0xFFF));
        assert!(encode_signed(2048, 12).is_err());
        assert!(encode_signed(-2049, 12).is_err());
        assert_eq!(encode_signed(i32::MIN as i64, 32), Ok(0x8000_0000));
        assert!(encode_signed(1i64 << 31, 32).is_err());
    }

    #[test]
    fn decode_uses_msb_as_sign() {
        assert_eq!(decode_signed(0x800, 12), -2048);
        assert_eq!(decode_signed(0x7FF, 12), 2047);
        assert_eq!(decode_signed(0b1, 1), -1);
        assert_eq!(decode_signed(0xFFFF_FFFF, 32), -1);
    }

    #[test]
    fn msb_first_slices() {
        // 16-bit 0b1000_0000_0000_0001: index 0 is bit 15, index 15 is bit 0
        let v = 0x8001;
        assert_eq!(take(v, 16, 0, 1), 1);
        assert_eq!(take(v, 16, 15, 16), 1);
        assert_eq!(take(v, 16, 1, 15), 0);
        let mut r = 0;
        put(&mut r, 16, 0, 1, 1);
        put(&mut r, 16, 15, 16, 1);
        assert_eq!(r, v);
    }

    #[test]
    fn j_offsets_with_differing_bits_10_and_11_do_not_survive() {
        assert!(offset_survives(Format::J, -1024));
        assert!(offset_survives(Format::J, 3072));
        assert!(!offset_survives(Format::J, 1024));
        assert!(!offset_survives(Format::J, 2048));
    }

    #[test]
    fn b_offsets_beyond_thirteen_bits_do_not_survive() {
        assert!(offset_survives(Format::B, 4094));
        assert!(offset_survives(Format::B, -4096));
        assert!(!offset_survives(Format::B, 4096));
        assert!(!offset_survives(Format::B, 7));
    }

    #[test]
    fn signed_round_trip_sweep() {
        for width in [5u32, 12, 16, 21, 32] {
            let min = -(1i64 << (width - 1));
            let max = (1i64 << (width - 1)) - 1;
            let step = if width <= 16 { 1 } else { 4099 };
            let mut v = min;
            while v <= max {
                let bits = encode_signed(v, width).unwrap();
                assert!(u64::from(bits) < 1u64 << width, "{v} in {width} bits");
                assert_eq!(i64::from(decode_signed(bits, width)), v, "width {width}");
                v += step;
            }
            for v in [min, min + 1, -1, 0, 1, max - 1, max] {
                assert_eq!(i64::from(decode_signed(encode_signed(v, width).unwrap(), width)), v);
            }
            assert_eq!(
                encode_signed(min - 1, width),
                Err(CodecError::ImmediateOutOfRange { value: min - 1, width })
            );
            assert_eq!(
                encode_signed(max + 1, width),
                Err(CodecError::ImmediateOutOfRange { value: max + 1, width })
            );
        }
    }

    const REGS: [u8; 5] = [0, 1, 10, 17, 31];

    #[test]
    fn r_i_s_pack_unpack_grid() {
        for &a in &REGS {
            for &b in &REGS {
                for funct3 in 0..8u8 {
                    for funct7 in [0u8, 0b010_0000, 0x7F] {
                        let r = Fields { opcode: 0x33, rd: a, rs1: b, rs2: a ^ b, funct3, funct7, imm: 0 };
                        assert_eq!(unpack(Format::R, pack(Format::R, &r).unwrap()), r);
                    }
                    for imm in [-2048i64, -1000, -1, 0, 1, 31, 32, 2047] {
                        let i = Fields { opcode: 0x13, rd: a, rs1: b, funct3, imm, ..Fields::default() };
                        assert_eq!(unpack(Format::I, pack(Format::I, &i).unwrap()), i);
                        let st = Fields { opcode: 0x23, rs1: a, rs2: b, funct3, imm, ..Fields::default() };
                        assert_eq!(unpack(Format::S, pack(Format::S, &st).unwrap()), st);
                    }
                }
            }
        }
    }

    #[test]
    fn u_pack_unpack_over_upper_values() {
        for &rd in &REGS {
            let mut upper = i64::from(i32::MIN);
            while upper <= i64::from(i32::MAX) {
                let f = Fields { opcode: 0x37, rd, imm: upper, ..Fields::default() };
                assert_eq!(unpack(Format::U, pack(Format::U, &f).unwrap()), f);
                upper += 4096 * 997;
            }
        }
    }

    #[test]
    fn b_pack_unpack_every_even_offset() {
        for imm in (-4096i64..=4094).step_by(2) {
            for (rs1, rs2) in [(0u8, 0u8), (10, 11), (31, 1)] {
                let f = Fields { opcode: 0x63, rs1, rs2, funct3: 0b101, imm, ..Fields::default() };
                assert_eq!(unpack(Format::B, pack(Format::B, &f).unwrap()), f);
            }
            assert!(offset_survives(Format::B, imm));
        }
    }

    #[test]
    fn j_pack_unpack_every_surviving_offset() {
        let mut checked = 0;
        for imm in ((-(1i64 << 20))..(1i64 << 20)).step_by(2) {
            let survives = (imm >> 10) & 1 == (imm >> 11) & 1;
            assert_eq!(offset_survives(Format::J, imm), survives, "{imm}");
            if survives {
                let f = Fields { opcode: 0x6F, rd: 1, imm, ..Fields::default() };
                assert_eq!(unpack(Format::J, pack(Format::J, &f).unwrap()), f);
                checked += 1;
            }
        }
        assert_eq!(checked, 1 << 19);
    }
}
