#[macro_export]
macro_rules! log_or_err {
    ($state:expr, $level:expr, $err:expr $(,)?) => {{
        if $level <= $state.fail_level {
            return Err($err);
        } else {
            match $level {
                ::log::Level::Error => ::log::error!("{}", $err),
                ::log::Level::Warn => ::log::warn!("{}", $err),
                ::log::Level::Info => ::log::info!("{}", $err),
                ::log::Level::Debug => ::log::debug!("{}", $err),
                ::log::Level::Trace => ::log::trace!("{}", $err),
            }
        }
    }};
}

#[derive(thiserror::Error, Debug)]
pub enum FrameError {
    #[error("Header prefix too short: {0} bytes")]
    ShortHeader(usize),

    #[error("Invalid syncword {0:#04X}")]
    InvalidSyncword(u8),

    #[error("mSBC reserved header bytes must be zero. Read {0:#04X} {1:#04X}")]
    MsbcReservedNonZero(u8, u8),

    #[error("bitpool must be <= {max} for {subbands} subbands in this mode. Read {bitpool}")]
    BitpoolOutOfRange { bitpool: u8, max: u8, subbands: u8 },

    #[error("Unsupported number of subbands: {0}")]
    InvalidSubbands(u8),

    #[error("Unsupported number of blocks: {0}")]
    InvalidBlocks(u8),

    #[error("Unsupported sampling frequency: {0} Hz")]
    InvalidFrequency(u32),

    #[error("mSBC frames are 16 kHz mono with 15 blocks of 8 subbands and bitpool 26")]
    InvalidMsbcParameters,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("Frame too short: expected {expected} bytes, got {actual}")]
    ShortFrame { expected: usize, actual: usize },

    #[error("Frame CRC mismatch. Calculated {calculated:#04X}, Read {read:#04X}")]
    CrcMismatch { calculated: u8, read: u8 },

    #[error("PCM buffer too small: need {needed} samples, got {actual}")]
    PcmBufferTooSmall { needed: usize, actual: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum EncodeError {
    #[error("Invalid frame parameters: {0}")]
    InvalidFrame(#[from] FrameError),

    #[error("Output buffer too small: need {needed} bytes, got {actual}")]
    OutputTooSmall { needed: usize, actual: usize },

    #[error("PCM input too short: need {needed} samples, got {actual}")]
    PcmTooShort { needed: usize, actual: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
