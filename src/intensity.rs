use heapless::Vec;

use crate::config::MAX_CHANNELS;
use crate::volume::VolumeState;

pub const BRIGHT_LEVELS: u8 = 255;

// Exponent > 1 compresses low-level spectral noise and expands the
// high-energy response.
const SENSITIVITY_EXPONENT: f32 = 2.0;

// Brightness levels shed per second of wall time; divided by the frame rate
// so the visual decay speed does not depend on FPS.
const FADE_PER_SECOND: f32 = 160.0;

// Below this instantaneous volume the spectrum is mostly noise, so new
// candidates are not trusted.
const MIN_VOLUME_FOR_UPDATE: f32 = 10.0;

// Candidates at or below this level never replace the faded value.
const MIN_BRIGHT_UPDATE: f32 = 40.0;

// Anything dimmer than this after fade/update flickers on a real panel;
// floor it to fully off.
const MIN_BRIGHT_FADE: f32 = 12.0;

// Accepted candidates are blended with the previous frame's level instead
// of overwriting it.
const RISE_SMOOTHING: f32 = 0.6;

/// Converts resampled spectral energy into per-channel brightness with
/// power-law shaping, volume gating and temporal smoothing. Each channel
/// either decays or rises every frame; the choice is recomputed from
/// current values, only the magnitudes persist.
pub struct IntensityMapper {
    levels: Vec<f32, MAX_CHANNELS>,
    frame: Vec<u8, MAX_CHANNELS>,
    fade_per_frame: f32,
}

impl IntensityMapper {
    pub fn new(channels: usize, frame_rate_hz: u32) -> Self {
        let mut levels = Vec::new();
        let _ = levels.resize(channels, 0.0);
        let mut frame = Vec::new();
        let _ = frame.resize(channels, 0);
        Self {
            levels,
            frame,
            fade_per_frame: fade_per_frame(frame_rate_hz),
        }
    }

    pub fn set_frame_rate(&mut self, frame_rate_hz: u32) {
        self.fade_per_frame = fade_per_frame(frame_rate_hz);
    }

    /// Drops all channel history and starts dark with the new channel count.
    pub fn resize(&mut self, channels: usize) {
        self.levels.clear();
        let _ = self.levels.resize(channels, 0.0);
        self.frame.clear();
        let _ = self.frame.resize(channels, 0);
    }

    pub fn frame(&self) -> &[u8] {
        &self.frame
    }

    pub fn map(&mut self, resampled: &[f32], volume: &VolumeState) -> &[u8] {
        for ((level, out), &energy) in self
            .levels
            .iter_mut()
            .zip(self.frame.iter_mut())
            .zip(resampled.iter())
        {
            let prior = *level;

            let x = energy.clamp(0.0, 1.0);
            let candidate =
                (libm::powf(x, SENSITIVITY_EXPONENT) * volume.divisor).min(BRIGHT_LEVELS as f32);

            // fade first: without a qualifying update the channel decays
            // monotonically
            let faded = (prior - self.fade_per_frame).max(0.0);
            let mut next = faded;

            if candidate >= faded
                && volume.current >= MIN_VOLUME_FOR_UPDATE
                && candidate > MIN_BRIGHT_UPDATE
            {
                next = prior + (candidate - prior) * RISE_SMOOTHING;
            }

            if next < MIN_BRIGHT_FADE {
                next = 0.0;
            }

            *level = next;
            *out = next as u8;
        }
        &self.frame
    }
}

fn fade_per_frame(frame_rate_hz: u32) -> f32 {
    FADE_PER_SECOND / frame_rate_hz.max(1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loud_volume() -> VolumeState {
        VolumeState {
            current: 120.0,
            average: 100.0,
            peak: 150.0,
            divisor: 200.0,
        }
    }

    fn quiet_volume() -> VolumeState {
        VolumeState {
            current: 1.0,
            average: 1.0,
            peak: 1.0,
            divisor: 1.0,
        }
    }

    fn charged_mapper(channels: usize) -> IntensityMapper {
        let mut mapper = IntensityMapper::new(channels, 60);
        let energy = [1.0f32; MAX_CHANNELS];
        for _ in 0..8 {
            mapper.map(&energy[..channels], &loud_volume());
        }
        mapper
    }

    #[test]
    fn strong_energy_lights_the_channel() {
        let mut mapper = IntensityMapper::new(4, 60);
        let frame = mapper.map(&[1.0, 0.0, 0.0, 0.0], &loud_volume());
        assert!(frame[0] > 100);
        assert_eq!(frame[1], 0);
    }

    #[test]
    fn fade_is_monotonic_and_reaches_zero() {
        let mut mapper = charged_mapper(1);
        let mut previous = mapper.frame()[0];
        assert!(previous > 0);

        // no qualifying updates: volume below the trust threshold
        let mut frames_until_dark = 0;
        for _ in 0..200 {
            let value = mapper.map(&[1.0], &quiet_volume())[0];
            assert!(value <= previous, "intensity rose during fade");
            previous = value;
            frames_until_dark += 1;
            if value == 0 {
                break;
            }
        }
        assert_eq!(previous, 0);
        // 255 levels at 160 levels/s and 60 FPS is well under 100 frames
        assert!(frames_until_dark < 100);
    }

    #[test]
    fn dim_candidates_never_replace_the_faded_value() {
        let mut mapper = IntensityMapper::new(1, 60);
        // energy chosen so the candidate lands under MIN_BRIGHT_UPDATE
        // even with volume and ordering in its favor
        let volume = VolumeState {
            current: 120.0,
            average: 100.0,
            peak: 150.0,
            divisor: 100.0,
        };
        for _ in 0..20 {
            let value = mapper.map(&[0.5], &volume)[0];
            // candidate = 0.5^2 * 100 = 25 < 40: gate stays closed
            assert_eq!(value, 0);
        }
    }

    #[test]
    fn quiet_frames_never_update_even_with_bright_candidates() {
        let mut mapper = IntensityMapper::new(1, 60);
        let value = mapper.map(&[1.0], &quiet_volume())[0];
        assert_eq!(value, 0);
    }

    #[test]
    fn accepted_candidates_blend_instead_of_jumping() {
        let mut mapper = IntensityMapper::new(1, 60);
        let first = mapper.map(&[1.0], &loud_volume())[0];
        // candidate is 200; one blended step from zero lands at 120
        assert!(first < 200);
        assert!(first > 100);
        let second = mapper.map(&[1.0], &loud_volume())[0];
        assert!(second > first);
    }

    #[test]
    fn flicker_floor_snaps_dim_levels_to_zero() {
        let mut mapper = charged_mapper(1);
        let mut last = mapper.frame()[0];
        for _ in 0..200 {
            let value = mapper.map(&[0.0], &quiet_volume())[0];
            if value == 0 {
                // the step before going dark was still a visible level
                assert!(last as f32 >= MIN_BRIGHT_FADE);
                return;
            }
            last = value;
        }
        panic!("channel never went dark");
    }

    #[test]
    fn negative_energy_is_treated_as_silence() {
        let mut mapper = IntensityMapper::new(1, 60);
        let value = mapper.map(&[-5.0], &loud_volume())[0];
        assert_eq!(value, 0);
    }
}
