//! CRC-8 used by the SBC frame header.
//!
//! The checksum covers header bytes 1 and 2 (the syncword and the CRC field
//! itself are excluded), followed by the joint-stereo flags and the scale
//! factors. That region is not always a whole number of bytes, so the
//! calculator accepts a trailing partial byte.

/// CRC polynomial and initial value.
pub struct Algorithm<T> {
    poly: T,
    init: T,
}

/// x^8 + x^4 + x^3 + x^2 + 1, initial value 0x0F.
pub const CRC_SBC_HEADER_ALG: Algorithm<u8> = Algorithm {
    poly: 0x1d,
    init: 0x0f,
};

/// Shifts `len` bits out of `value`, folding in the polynomial on each carry.
#[inline(always)]
pub const fn crc8(poly: u8, mut value: u8, len: usize) -> u8 {
    let mut i = 0;
    while i < len {
        value = (value << 1) ^ (((value >> 7) & 1) * poly);
        i += 1;
    }

    value
}

#[inline(always)]
const fn crc8_table(poly: u8) -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < table.len() {
        table[i] = crc8(poly, i as u8, 8);
        i += 1;
    }

    table
}

#[derive(Debug)]
pub struct Crc8 {
    pub poly: u8,
    pub init: u8,
    table: [u8; 256],
}

impl Crc8 {
    pub const fn new(algorithm: &Algorithm<u8>) -> Self {
        Self {
            poly: algorithm.poly,
            init: algorithm.init,
            table: crc8_table(algorithm.poly),
        }
    }

    #[inline(always)]
    pub const fn update(&self, mut crc: u8, bytes: &[u8]) -> u8 {
        let mut i = 0;

        while i < bytes.len() {
            crc = self.table[(crc ^ bytes[i]) as usize];
            i += 1;
        }

        crc
    }

    /// Feeds the `len` most significant bits of `byte` (`len` < 8).
    #[inline(always)]
    pub const fn update_bits(&self, crc: u8, byte: u8, len: usize) -> u8 {
        if len == 0 {
            return crc;
        }

        let mask = !(0xffu8 >> len);
        crc8(self.poly, crc ^ (byte & mask), len)
    }

    /// Checksum over `bytes` followed by the leading `extra_bits` of `tail`.
    pub const fn checksum(&self, bytes: &[u8], tail: u8, extra_bits: usize) -> u8 {
        let crc = self.update(self.init, bytes);
        self.update_bits(crc, tail, extra_bits)
    }
}

pub static SBC_CRC: Crc8 = Crc8::new(&CRC_SBC_HEADER_ALG);

/// Computes the header CRC of a packed frame.
///
/// `protected_bits` is the length of the region that starts at byte 4
/// (joint flags and scale factors). The caller guarantees `frame` holds
/// at least `4 + protected_bits.div_ceil(8)` bytes.
pub fn frame_crc(frame: &[u8], protected_bits: usize) -> u8 {
    let full = protected_bits / 8;
    let rest = protected_bits % 8;

    let crc = SBC_CRC.update(SBC_CRC.init, &frame[1..3]);
    let crc = SBC_CRC.update(crc, &frame[4..4 + full]);
    if rest > 0 {
        SBC_CRC.update_bits(crc, frame[4 + full], rest)
    } else {
        crc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bitwise(init: u8, bits: &[bool]) -> u8 {
        let mut crc = init;
        for &bit in bits {
            let feedback = ((crc >> 7) & 1 == 1) ^ bit;
            crc <<= 1;
            if feedback {
                crc ^= 0x1d;
            }
        }
        crc
    }

    fn to_bits(bytes: &[u8], len: usize) -> Vec<bool> {
        (0..len)
            .map(|i| (bytes[i / 8] >> (7 - i % 8)) & 1 == 1)
            .collect()
    }

    #[test]
    fn table_matches_bitwise_register() {
        let data = [0x31, 0x23, 0xa5, 0x00, 0xff, 0x5c];
        let expected = bitwise(0x0f, &to_bits(&data, 48));
        assert_eq!(SBC_CRC.update(SBC_CRC.init, &data), expected);
    }

    #[test]
    fn partial_byte_matches_bitwise_register() {
        let data = [0xbd, 0x35, 0xc8];
        for extra in 1..8 {
            let expected = bitwise(0x0f, &to_bits(&data, 16 + extra));
            assert_eq!(SBC_CRC.checksum(&data[..2], data[2], extra), expected);
        }
    }

    #[test]
    fn frame_crc_skips_syncword_and_crc_field() {
        let mut frame = [0x9c, 0x31, 0x23, 0x00, 0x12, 0x34, 0x56];
        let a = frame_crc(&frame, 20);
        frame[0] = 0x00;
        frame[3] = 0xee;
        frame[6] = 0x5f; // outside the 20 protected bits
        assert_eq!(frame_crc(&frame, 20), a);
        frame[6] = 0x46; // inside
        assert_ne!(frame_crc(&frame, 20), a);
    }
}
