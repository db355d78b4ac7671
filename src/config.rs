use alloc::format;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::error_with_location;

/// Compile-time bound on the output channel count (one full 16x16 panel).
/// The actual channel count is runtime configuration.
pub const MAX_CHANNELS: usize = 256;

pub const CONFIG_VERSION: u32 = 1;

/// Coarse selector for which renderer consumes the finished brightness
/// frame. Shared with the button/UI contexts through a single-slot signal;
/// the analysis loop only tags its output with it.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DisplayMode {
    #[default]
    Bars,
    Stripes,
    Pulse,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AnalyzerConfig {
    pub config_version: u32,
    /// Number of brightness channels driven by this device.
    pub channels: usize,
    /// Display frame rate; one sample frame is analyzed per display frame.
    pub frame_rate_hz: u32,
    pub use_hann_window: bool,
    /// Flat-response equalization against the EQ calibration table.
    pub eq_correction: bool,
    /// Perceptual loudness weighting per bin.
    pub a_weighting: bool,
    /// Nonlinear low-frequency-biased rebinning of the spectrum.
    pub perceptual_binning: bool,
}

impl AnalyzerConfig {
    /// Configuration errors are fatal at startup; callers must not try to
    /// limp along with an invalid channel count or frame rate.
    pub fn validate(&self) -> Result<()> {
        if self.channels == 0 || self.channels > MAX_CHANNELS {
            return Err(error_with_location!(
                "channel count {} outside 1..={}",
                self.channels,
                MAX_CHANNELS
            ));
        }
        if self.frame_rate_hz == 0 {
            return Err(error_with_location!("frame rate must be nonzero"));
        }
        Ok(())
    }

    /// Serialize config to binary data using postcard
    pub fn to_slice<'a>(&self, buf: &'a mut [u8]) -> postcard::Result<&'a mut [u8]> {
        postcard::to_slice(self, buf)
    }

    /// Deserialize config from binary data using postcard
    pub fn from_bytes(data: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(data)
    }
}
