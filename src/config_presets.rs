use crate::config::*;

impl AnalyzerConfig {
    /// 16 channels, one per column of a 16x16 matrix.
    pub fn matrix16() -> Self {
        Self {
            config_version: CONFIG_VERSION,
            channels: 16,
            frame_rate_hz: 60,
            use_hann_window: true,
            eq_correction: true,
            a_weighting: true,
            perceptual_binning: true,
        }
    }

    /// 64-pixel strip, every pixel its own channel.
    pub fn strip64() -> Self {
        Self {
            config_version: CONFIG_VERSION,
            channels: 64,
            frame_rate_hz: 60,
            use_hann_window: true,
            eq_correction: true,
            a_weighting: false,
            perceptual_binning: false,
        }
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self::matrix16()
    }
}
