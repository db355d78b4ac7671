use anyhow::Result;

use crate::calibration::CalibrationTables;
use crate::config::AnalyzerConfig;
use crate::fft::{FFT_BINS, FFT_SIZE, hann_window, magnitude_spectrum};
use crate::intensity::IntensityMapper;
use crate::resample::Resampler;
use crate::spectrum::SpectrumPostProcessor;
use crate::volume::{VolumeState, VolumeTracker};

// Capture delivers signed 24-bit samples in 32-bit containers.
const SAMPLE_MAX: f32 = (1 << 23) as f32;

/// Owns the whole per-frame sequence and every buffer it touches: ingest →
/// volume → FFT → post-process → resample → intensity. One instance per
/// device; nothing here is shared or static, so independent pipelines can
/// coexist (and be tested) without interfering.
pub struct AudioPipeline {
    use_hann_window: bool,
    frame_rate_hz: u32,
    tracker: VolumeTracker,
    post: SpectrumPostProcessor,
    resampler: Resampler,
    mapper: IntensityMapper,
    volume: VolumeState,
    fft_input: [f32; FFT_SIZE],
    spectrum: [f32; FFT_BINS],
}

impl AudioPipeline {
    /// Fails fast on invalid configuration or calibration data; there is no
    /// per-frame recovery from either.
    pub fn new(config: &AnalyzerConfig, tables: CalibrationTables) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            use_hann_window: config.use_hann_window,
            frame_rate_hz: config.frame_rate_hz,
            tracker: VolumeTracker::new(config.frame_rate_hz),
            post: SpectrumPostProcessor::new(tables, config)?,
            resampler: Resampler::new(config.channels)?,
            mapper: IntensityMapper::new(config.channels, config.frame_rate_hz),
            volume: VolumeState::default(),
            fft_input: [0.0; FFT_SIZE],
            spectrum: [0.0; FFT_BINS],
        })
    }

    /// Run one frame through the full sequence and return the refreshed
    /// per-channel brightness. Never fails: frames of unexpected length are
    /// processed as delivered and numeric degeneracies are clamped away
    /// downstream.
    pub fn process_frame(&mut self, samples: &[i32]) -> &[u8] {
        let (start, count) = self.ingest(samples);

        // loudness comes from the un-windowed samples
        self.volume = self.tracker.update(&self.fft_input[start..start + count]);

        if self.use_hann_window {
            hann_window(&mut self.fft_input[start..start + count]);
        }
        magnitude_spectrum(&mut self.fft_input, &mut self.spectrum);

        let cleaned = self.post.process(&self.spectrum, &self.volume);
        let resampled = self.resampler.resample(cleaned);
        self.mapper.map(resampled, &self.volume)
    }

    /// Normalize into the FFT buffer. Short frames are centered between
    /// zeros, oversized frames keep their newest samples.
    fn ingest(&mut self, samples: &[i32]) -> (usize, usize) {
        if samples.len() != FFT_SIZE {
            log::debug!(
                "frame of {} samples instead of {}, processing as delivered",
                samples.len(),
                FFT_SIZE
            );
        }
        let samples = if samples.len() > FFT_SIZE {
            &samples[samples.len() - FFT_SIZE..]
        } else {
            samples
        };

        self.fft_input = [0.0; FFT_SIZE];
        let count = samples.len();
        let start = (FFT_SIZE - count) / 2;
        for (slot, &sample) in self.fft_input[start..start + count]
            .iter_mut()
            .zip(samples.iter())
        {
            *slot = sample as f32 / SAMPLE_MAX;
        }
        (start, count)
    }

    /// Swap in a new configuration between frames. Invalid updates are
    /// rejected without touching the running state; a channel-count change
    /// restarts the affected stages dark.
    pub fn apply_config(&mut self, config: &AnalyzerConfig) -> Result<()> {
        config.validate()?;

        self.use_hann_window = config.use_hann_window;
        self.post.set_flags(config);

        if config.frame_rate_hz != self.frame_rate_hz {
            self.frame_rate_hz = config.frame_rate_hz;
            self.tracker.set_frame_rate(config.frame_rate_hz);
            self.mapper.set_frame_rate(config.frame_rate_hz);
        }
        if config.channels != self.resampler.target() {
            self.resampler = Resampler::new(config.channels)?;
            self.mapper.resize(config.channels);
        }
        Ok(())
    }

    /// Latest brightness frame, unchanged until the next `process_frame`.
    pub fn intensity(&self) -> &[u8] {
        self.mapper.frame()
    }

    /// Loudness statistics of the latest frame, for volume-gated renderers.
    pub fn volume(&self) -> VolumeState {
        self.volume
    }

    pub fn frame_rate_hz(&self) -> u32 {
        self.frame_rate_hz
    }
}
