use std::path::PathBuf;

use clap::{Args, Parser as ClapParser, ValueEnum};
use sbc::{AllocationMethod, ChannelMode, FrameDescriptor};

use crate::container::EncodeConfig;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (sbc ",
    env!("SBC_VERSION"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ")"
);

#[derive(Debug, ClapParser)]
#[command(
    name         = "dsbc",
    version      = env!("CARGO_PKG_VERSION"),
    long_version = LONG_VERSION,
    about        = "Decode an SBC bitstream into a WAVE file",
    long_about   = None,
)]
pub struct DecodeCli {
    /// Input SBC bitstream (omit or use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Output WAVE file (omit or use "-" for stdout).
    #[arg(value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Treat CRC mismatches as fatal errors.
    #[arg(long)]
    pub strict: bool,

    /// Write a YAML summary of the run.
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    #[command(flatten)]
    pub log: LogArgs,
}

#[derive(Debug, ClapParser)]
#[command(
    name         = "esbc",
    version      = env!("CARGO_PKG_VERSION"),
    long_version = LONG_VERSION,
    about        = "Encode a WAVE file into an SBC bitstream",
    long_about   = None,
)]
pub struct EncodeCli {
    /// Input WAVE file (omit or use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Output SBC bitstream (omit or use "-" for stdout).
    #[arg(value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Force dual-channel mode.
    #[arg(short = 'd', conflicts_with = "joint_stereo")]
    pub dual_channel: bool,

    /// Force joint-stereo mode.
    #[arg(short = 'j')]
    pub joint_stereo: bool,

    /// Bitpool value.
    #[arg(short = 'b', value_name = "N", default_value_t = FrameDescriptor::default().bitpool)]
    pub bitpool: u8,

    /// Number of sub-bands (4 or 8).
    #[arg(short = 's', value_name = "N", default_value_t = FrameDescriptor::default().subbands)]
    pub subbands: u8,

    /// Number of blocks (4, 8, 12 or 16).
    #[arg(short = 'B', value_name = "N", default_value_t = FrameDescriptor::default().blocks)]
    pub blocks: u8,

    /// Use SNR bit allocation instead of loudness.
    #[arg(short = 'S')]
    pub snr: bool,

    /// Emit mSBC frames (16 kHz mono input only); other frame options are ignored.
    #[arg(long)]
    pub msbc: bool,

    /// Write a YAML summary of the run.
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    #[command(flatten)]
    pub log: LogArgs,
}

impl EncodeCli {
    pub fn config(&self) -> EncodeConfig {
        let mode = if self.dual_channel {
            ChannelMode::DualChannel
        } else if self.joint_stereo {
            ChannelMode::JointStereo
        } else {
            ChannelMode::Stereo
        };

        EncodeConfig {
            mode,
            allocation: if self.snr {
                AllocationMethod::Snr
            } else {
                AllocationMethod::Loudness
            },
            subbands: self.subbands,
            blocks: self.blocks,
            bitpool: self.bitpool,
            msbc: self.msbc,
        }
    }
}

#[derive(Debug, Args)]
pub struct LogArgs {
    /// Set the log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show a progress bar.
    #[arg(long)]
    pub progress: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    /// Convert LogLevel to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}
