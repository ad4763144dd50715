//! The one PCM wave format every voice is opened against.

use crate::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveFormat {
    pub channel_count: u16,
    pub bit_depth: u16,
    pub sample_rate: u32,
}

impl WaveFormat {
    pub fn validate(self) -> Result<Self, EngineError> {
        if !matches!(self.channel_count, 1 | 2) {
            return Err(EngineError::Configuration(format!(
                "unsupported channel count {}",
                self.channel_count
            )));
        }
        if !matches!(self.bit_depth, 8 | 16) {
            return Err(EngineError::Configuration(format!("unsupported bit depth {}", self.bit_depth)));
        }
        if self.sample_rate == 0 {
            return Err(EngineError::Configuration("sample rate must be > 0".into()));
        }
        Ok(self)
    }

    pub fn block_align(&self) -> usize {
        self.channel_count as usize * (self.bit_depth as usize / 8)
    }

    pub fn silence_byte(&self) -> u8 {
        if self.bit_depth == 8 {
            0x80
        } else {
            0x00
        }
    }
}
