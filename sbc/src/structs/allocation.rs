//! Bit allocation.
//!
//! Distributes the bitpool over sub-bands from the scale factors alone, so the
//! encoder and decoder reach the same allocation without transmitting it.
//! Mono and dual-channel frames allocate each channel on its own; stereo and
//! joint-stereo frames slice one bitpool across both channels.

use crate::structs::frame::{
    AllocationMethod, ChannelMode, FrameDescriptor, MAX_CHANNELS, MAX_SUBBANDS,
};

pub type ScaleFactors = [[u8; MAX_SUBBANDS]; MAX_CHANNELS];
pub type Allocation = [[u8; MAX_SUBBANDS]; MAX_CHANNELS];

const MAX_BITS: i32 = 16;

/// Below this slice no bitneed can contribute any more bits.
const BITSLICE_FLOOR: i32 = -21;

#[rustfmt::skip]
const LOUDNESS_OFFSET_4: [[i32; 4]; 4] = [
    [-1, 0, 0, 0],
    [-2, 0, 0, 1],
    [-2, 0, 0, 1],
    [-2, 0, 0, 1],
];

#[rustfmt::skip]
const LOUDNESS_OFFSET_8: [[i32; 8]; 4] = [
    [-2, 0, 0, 0, 0, 0, 0, 1],
    [-3, 0, 0, 0, 0, 0, 1, 2],
    [-4, 0, 0, 0, 0, 0, 1, 2],
    [-4, 0, 0, 0, 0, 0, 1, 2],
];

fn bitneed(desc: &FrameDescriptor, scale_factors: &[u8; MAX_SUBBANDS]) -> [i32; MAX_SUBBANDS] {
    let nsb = desc.subbands as usize;
    let freq = desc.frequency.code() as usize;
    let mut need = [0i32; MAX_SUBBANDS];

    for sb in 0..nsb {
        let sf = scale_factors[sb] as i32;
        need[sb] = match desc.allocation {
            AllocationMethod::Snr => sf,
            AllocationMethod::Loudness if sf == 0 => -5,
            AllocationMethod::Loudness => {
                let offset = if nsb == 4 {
                    LOUDNESS_OFFSET_4[freq][sb]
                } else {
                    LOUDNESS_OFFSET_8[freq][sb]
                };
                let loudness = sf - offset;
                if loudness > 0 { loudness / 2 } else { loudness }
            }
        };
    }

    need
}

/// Slices `bitpool` across the channels in `needs`, visiting sub-bands in
/// (sub-band, channel) order.
fn distribute(
    needs: &[[i32; MAX_SUBBANDS]],
    nsb: usize,
    bitpool: i32,
    bits: &mut [[u8; MAX_SUBBANDS]],
) {
    let nch = needs.len();
    let order = || (0..nsb).flat_map(move |sb| (0..nch).map(move |ch| (ch, sb)));

    let max_bitneed = order().map(|(ch, sb)| needs[ch][sb]).max().unwrap_or(0);

    let mut bitcount = 0;
    let mut slicecount = 0;
    let mut bitslice = max_bitneed + 1;

    loop {
        bitslice -= 1;
        bitcount += slicecount;
        slicecount = 0;

        for (ch, sb) in order() {
            let need = needs[ch][sb];
            if need > bitslice + 1 && need < bitslice + MAX_BITS {
                slicecount += 1;
            } else if need == bitslice + 1 {
                slicecount += 2;
            }
        }

        if bitcount + slicecount >= bitpool || bitslice < BITSLICE_FLOOR {
            break;
        }
    }

    if bitcount + slicecount == bitpool {
        bitcount += slicecount;
        bitslice -= 1;
    }

    let mut alloc = [[0i32; MAX_SUBBANDS]; MAX_CHANNELS];
    for (ch, sb) in order() {
        let need = needs[ch][sb];
        alloc[ch][sb] = if need < bitslice + 2 {
            0
        } else {
            (need - bitslice).min(MAX_BITS)
        };
    }

    for (ch, sb) in order() {
        if bitcount >= bitpool {
            break;
        }
        if alloc[ch][sb] >= 2 && alloc[ch][sb] < MAX_BITS {
            alloc[ch][sb] += 1;
            bitcount += 1;
        } else if needs[ch][sb] == bitslice + 1 && bitpool > bitcount + 1 {
            alloc[ch][sb] = 2;
            bitcount += 2;
        }
    }

    for (ch, sb) in order() {
        if bitcount >= bitpool {
            break;
        }
        if alloc[ch][sb] < MAX_BITS {
            alloc[ch][sb] += 1;
            bitcount += 1;
        }
    }

    for (ch, sb) in order() {
        bits[ch][sb] = alloc[ch][sb] as u8;
    }
}

/// Computes the number of bits of every (channel, sub-band) sample.
pub fn allocate_bits(desc: &FrameDescriptor, scale_factors: &ScaleFactors) -> Allocation {
    let nsb = desc.subbands as usize;
    let bitpool = desc.bitpool as i32;
    let mut bits = [[0u8; MAX_SUBBANDS]; MAX_CHANNELS];

    match desc.mode {
        ChannelMode::Mono => {
            let needs = [bitneed(desc, &scale_factors[0])];
            distribute(&needs, nsb, bitpool, &mut bits[..1]);
        }
        ChannelMode::DualChannel => {
            for ch in 0..2 {
                let needs = [bitneed(desc, &scale_factors[ch])];
                distribute(&needs, nsb, bitpool, &mut bits[ch..ch + 1]);
            }
        }
        ChannelMode::Stereo | ChannelMode::JointStereo => {
            let needs = [
                bitneed(desc, &scale_factors[0]),
                bitneed(desc, &scale_factors[1]),
            ];
            distribute(&needs, nsb, bitpool, &mut bits);
        }
    }

    bits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::frame::SamplingFrequency;

    fn total(bits: &Allocation) -> u32 {
        bits.iter().flatten().map(|&b| b as u32).sum()
    }

    #[test]
    fn spends_exact_bitpool_when_possible() {
        let desc = FrameDescriptor {
            mode: ChannelMode::Stereo,
            bitpool: 35,
            ..Default::default()
        };
        let sf = [[9, 8, 7, 6, 5, 4, 3, 2], [8, 8, 6, 6, 4, 4, 2, 2]];
        let bits = allocate_bits(&desc, &sf);
        assert_eq!(total(&bits), 35);
        assert!(bits.iter().flatten().all(|&b| b <= 16));
    }

    #[test]
    fn dual_channel_splits_bitpool_per_channel() {
        let desc = FrameDescriptor {
            mode: ChannelMode::DualChannel,
            allocation: AllocationMethod::Snr,
            subbands: 4,
            bitpool: 20,
            ..Default::default()
        };
        let sf = [[10, 9, 8, 7, 0, 0, 0, 0], [3, 3, 3, 3, 0, 0, 0, 0]];
        let bits = allocate_bits(&desc, &sf);
        let left: u32 = bits[0].iter().map(|&b| b as u32).sum();
        let right: u32 = bits[1].iter().map(|&b| b as u32).sum();
        assert_eq!(left, 20);
        assert_eq!(right, 20);
    }

    #[test]
    fn louder_subbands_get_more_bits() {
        let desc = FrameDescriptor {
            mode: ChannelMode::Mono,
            frequency: SamplingFrequency::Freq44k1,
            bitpool: 30,
            ..Default::default()
        };
        let sf = [[12, 2, 2, 2, 2, 2, 2, 2], [0; 8]];
        let bits = allocate_bits(&desc, &sf);
        assert!(bits[0][0] > bits[0][1]);
        assert!(total(&bits) <= 30);
        assert_eq!(bits[1], [0; 8]);
    }

    #[test]
    fn silent_frame_terminates() {
        for mode in [ChannelMode::Mono, ChannelMode::JointStereo] {
            let desc = FrameDescriptor {
                mode,
                bitpool: if mode == ChannelMode::Mono { 128 } else { 255 },
                ..Default::default()
            };
            let bits = allocate_bits(&desc, &[[0; 8]; 2]);
            let nch = mode.channels();
            assert!(bits[..nch].iter().flatten().all(|&b| b <= 16));
        }
    }
}
