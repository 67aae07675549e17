//! Integer conversions between host values and the RM3100 wire format.
//!
//! The RM3100 is big endian: cycle counts are sent most significant byte
//! first and measurement results are 24 bit two's complement, MSB first.

/// Cycle count to gain ratio, LSB/µT per cycle count (datasheet table 3-1).
const GAIN_PER_CYCLE_COUNT: f64 = 150.0 / 400.0;

const U24_MASK: u32 = 0x00ff_ffff;
const I24_SIGN: u32 = 0x0080_0000;

/// Reverses the byte order of a 16 bit value.
pub const fn swap16(value: u16) -> u16 {
    value.swap_bytes()
}

/// Reverses the byte order of a 32 bit value.
pub const fn swap32(value: u32) -> u32 {
    value.swap_bytes()
}

/// Decodes a big endian 24 bit two's complement value.
///
/// The result is always within `-2^23 ..= 2^23 - 1`.
pub fn decode_signed24(bytes: [u8; 3]) -> i32 {
    let raw = u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]) & U24_MASK;
    if raw & I24_SIGN != 0 {
        raw as i32 - (1 << 24)
    } else {
        raw as i32
    }
}

/// Converts a cycle count to its scale factor in µT per LSB.
///
/// Gain is linear in the cycle count: 200 cycles give 75 LSB/µT. Returns
/// `None` for a zero cycle count, which has no finite scale.
pub fn cycle_count_to_scale(ccr: u16) -> Option<f64> {
    if ccr == 0 {
        return None;
    }
    let gain = GAIN_PER_CYCLE_COUNT * f64::from(ccr);
    Some(1.0 / gain)
}
