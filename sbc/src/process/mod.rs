/// Sub-band analysis and synthesis.
///
/// Provides the per-channel [`Analysis`](filterbank::Analysis) and
/// [`Synthesis`](filterbank::Synthesis) filter states shared by the encoder
/// and decoder.
pub mod filterbank;

/// Frame decoding to PCM samples.
///
/// Provides the [`Decoder`](decode::Decoder) for converting complete frames
/// into interleaved 16-bit PCM.
pub mod decode;

/// PCM encoding to frames.
///
/// Provides the [`Encoder`](encode::Encoder) for packing interleaved 16-bit
/// PCM into frames described by a
/// [`FrameDescriptor`](crate::structs::frame::FrameDescriptor).
pub mod encode;
