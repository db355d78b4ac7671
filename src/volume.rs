// Reconciles time-domain RMS with the 8-bit spectral magnitude scale: a
// full-scale sine (RMS 1/sqrt(2)) reads as volume 255.
const RMS_CALIBRATION: f32 = 360.0;

// EMA coefficient per second of wall time; divided by the frame rate so the
// effective averaging window does not depend on FPS.
const EMA_RATE_PER_SECOND: f32 = 6.0;

// The peak average only follows loudness bursts that clear the running
// average by this factor.
const PEAK_TRIGGER_RATIO: f32 = 1.5;

// Automatic gain control: spectral energy is divided by average volume
// times this gain to land in roughly [0, 1] at any ambient loudness.
const AGC_GAIN: f32 = 2.0;

const DIVISOR_FLOOR: f32 = 1.0;

/// Loudness statistics for one frame, published read-only alongside the
/// brightness array so renderers can gate on volume.
#[derive(Clone, Copy, Debug, Default)]
pub struct VolumeState {
    /// Instantaneous RMS-derived loudness of the latest frame.
    pub current: f32,
    /// Exponential moving average of `current`.
    pub average: f32,
    /// Exponential moving average of loudness bursts.
    pub peak: f32,
    /// Normalization divisor for spectral energy, never below 1.0.
    pub divisor: f32,
}

pub struct VolumeTracker {
    alpha: f32,
    seeded: bool,
    state: VolumeState,
}

impl VolumeTracker {
    pub fn new(frame_rate_hz: u32) -> Self {
        Self {
            alpha: ema_alpha(frame_rate_hz),
            seeded: false,
            state: VolumeState::default(),
        }
    }

    pub fn set_frame_rate(&mut self, frame_rate_hz: u32) {
        self.alpha = ema_alpha(frame_rate_hz);
    }

    /// Fold one frame of normalized samples into the running statistics.
    /// Always succeeds; an empty frame counts as silence.
    pub fn update(&mut self, samples: &[f32]) -> VolumeState {
        let current = rms(samples) * RMS_CALIBRATION;

        if !self.seeded {
            // no history yet: seed the averages instead of smoothing
            // toward zero
            self.state.average = current;
            self.state.peak = current;
            self.seeded = true;
        } else {
            self.state.average += (current - self.state.average) * self.alpha;
            if current > self.state.average * PEAK_TRIGGER_RATIO {
                self.state.peak += (current - self.state.peak) * self.alpha;
            }
        }

        self.state.current = current;
        self.state.divisor = (self.state.average * AGC_GAIN).max(DIVISOR_FLOOR);
        self.state
    }

    pub fn state(&self) -> VolumeState {
        self.state
    }
}

fn ema_alpha(frame_rate_hz: u32) -> f32 {
    (EMA_RATE_PER_SECOND / frame_rate_hz.max(1) as f32).min(1.0)
}

fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let mean_sq = samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32;
    libm::sqrtf(mean_sq)
}
