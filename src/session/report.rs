use std::fs;
use std::path::Path;

use anyhow::Result;
use sbc::FrameDescriptor;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Decode,
    Encode,
}

#[derive(Debug, Clone, Serialize)]
pub struct StreamInfo {
    pub msbc: bool,
    pub mode: String,
    pub sample_rate: u32,
    pub channels: usize,
    pub allocation: String,
    pub subbands: u8,
    pub blocks: u8,
    pub bitpool: u8,
    pub frame_size: usize,
    pub bitrate: u32,
}

impl From<&FrameDescriptor> for StreamInfo {
    fn from(desc: &FrameDescriptor) -> Self {
        Self {
            msbc: desc.msbc,
            mode: desc.mode.to_string(),
            sample_rate: desc.sampling_frequency_hz(),
            channels: desc.channels(),
            allocation: desc.allocation.to_string(),
            subbands: desc.subbands,
            blocks: desc.blocks,
            bitpool: desc.bitpool,
            frame_size: desc.frame_size(),
            bitrate: desc.bitrate(),
        }
    }
}

/// Summary of one transcoding run.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub direction: Direction,
    pub input: String,
    pub output: String,
    pub stream: Option<StreamInfo>,
    pub frames: u64,
    pub samples_per_channel: u64,
    pub duration: String,
    /// A trailing partial frame or PCM batch was dropped.
    pub truncated: bool,
    /// The WAVE size fields hold the real byte counts.
    pub header_patched: bool,
}

impl SessionReport {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            input: "-".to_string(),
            output: "-".to_string(),
            stream: None,
            frames: 0,
            samples_per_channel: 0,
            duration: time_str(0.0),
            truncated: false,
            header_patched: false,
        }
    }

    /// Records `frames` frames shaped like `desc`.
    pub(crate) fn set_totals(&mut self, desc: &FrameDescriptor, frames: u64, samples: u64) {
        self.stream.get_or_insert_with(|| StreamInfo::from(desc));
        self.frames = frames;
        self.samples_per_channel = samples;
        self.duration = time_str(samples as f64 / desc.sampling_frequency_hz() as f64);
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_yaml()?)?;
        Ok(())
    }
}

/// Formats seconds as `HH:MM:SS.mmm`.
pub fn time_str(sec: f64) -> String {
    let ms = sec * 1000f64;
    let hours = (ms / 3600000f64) as u64;
    let minutes = ((ms % 3600000f64) / 60000f64) as u64;
    let seconds = ((ms % 60000f64) / 1000f64) as u64;
    let milliseconds = (ms % 1000f64) as u64;

    format!(
        "{hours:0width$}:{minutes:02}:{seconds:02}.{milliseconds:03}",
        width = if hours >= 100 { 0 } else { 2 }
    )
}
