use alloc::format;

use anyhow::{Result, anyhow};

use crate::error_with_location;
use crate::fft::{FFT_BINS, FFT_SIZE};

/// Static per-bin correction data, measured per device family and injected
/// at startup. The analysis code never computes these.
#[derive(Clone, Debug)]
pub struct CalibrationTables {
    /// Magnitude to subtract from every raw bin before anything else.
    pub noise_floor: [f32; FFT_BINS],
    /// Flat-response basis: bins are multiplied by `255 / eq_gain[bin]`.
    /// Entries must be positive; calibrated against white noise.
    pub eq_gain: [f32; FFT_BINS],
    /// Perceptual weighting: bins are multiplied by `loudness_weight[bin] / 255`.
    pub loudness_weight: [f32; FFT_BINS],
    /// Destination bin per source bin for perceptual rebinning. Spreads the
    /// low end out and squeezes the top octaves together.
    pub remap: [u16; FFT_BINS],
}

impl CalibrationTables {
    /// Table lengths are enforced by the array types; this checks the
    /// value-level invariants. A failure here is a build/calibration defect,
    /// so callers treat it as fatal.
    pub fn validate(&self) -> Result<()> {
        for (bin, &gain) in self.eq_gain.iter().enumerate() {
            if gain <= 0.0 {
                return Err(error_with_location!(
                    "eq_gain[{}] = {} must be positive",
                    bin,
                    gain
                ));
            }
        }
        for (bin, &dst) in self.remap.iter().enumerate() {
            if dst as usize >= FFT_BINS {
                return Err(error_with_location!(
                    "remap[{}] = {} outside 0..{}",
                    bin,
                    dst,
                    FFT_BINS
                ));
            }
        }
        Ok(())
    }

    /// Device-independent defaults for hardware without empirical tables:
    /// flat EQ, a noise floor biased against mains hum in the lowest bins,
    /// the analytic A-weighting curve, and a logarithmic remap.
    pub fn generic(sample_rate_hz: f32) -> Self {
        let mut noise_floor = [0.5f32; FFT_BINS];
        for v in noise_floor.iter_mut().take(4) {
            *v = 2.0;
        }

        let eq_gain = [255.0f32; FFT_BINS];

        let bin_width = sample_rate_hz / FFT_SIZE as f32;
        let mut response = [0.0f32; FFT_BINS];
        let mut max_response = 0.0f32;
        for (i, r) in response.iter_mut().enumerate() {
            *r = a_weighting(i as f32 * bin_width);
            max_response = max_response.max(*r);
        }
        let mut loudness_weight = [0.0f32; FFT_BINS];
        if max_response > 0.0 {
            for (w, r) in loudness_weight.iter_mut().zip(response.iter()) {
                *w = r / max_response * 255.0;
            }
        }

        let mut remap = [0u16; FFT_BINS];
        let span = libm::logf(FFT_BINS as f32);
        for (i, dst) in remap.iter_mut().enumerate() {
            let t = libm::logf(1.0 + i as f32) / span;
            *dst = (t * (FFT_BINS - 1) as f32 + 0.5) as u16;
        }

        Self {
            noise_floor,
            eq_gain,
            loudness_weight,
            remap,
        }
    }
}

/// Linear-scale A-weighting response at frequency `f`.
fn a_weighting(f: f32) -> f32 {
    if f <= 0.0 {
        return 0.0;
    }
    let f2 = f * f;
    let c12194 = 12194.0f32 * 12194.0;
    let c20 = 20.6f32 * 20.6;
    let c107 = 107.7f32 * 107.7;
    let c737 = 737.9f32 * 737.9;
    (c12194 * f2 * f2)
        / ((f2 + c20) * libm::sqrtf((f2 + c107) * (f2 + c737)) * (f2 + c12194))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_tables_pass_validation() {
        CalibrationTables::generic(48_000.0).validate().unwrap();
    }

    #[test]
    fn generic_remap_is_monotonic_and_spans_the_range() {
        let tables = CalibrationTables::generic(48_000.0);
        assert_eq!(tables.remap[0], 0);
        assert_eq!(tables.remap[FFT_BINS - 1] as usize, FFT_BINS - 1);
        for pair in tables.remap.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
        // the low end spreads out: the first handful of source bins already
        // reach far into the destination range
        assert!(tables.remap[4] > 16);
    }

    #[test]
    fn a_weighting_peaks_in_the_presence_region() {
        let tables = CalibrationTables::generic(48_000.0);
        let khz = |f: f32| (f / (48_000.0 / FFT_SIZE as f32)) as usize;
        assert!(tables.loudness_weight[khz(2_500.0)] > tables.loudness_weight[khz(200.0)]);
        assert!(tables.loudness_weight[khz(2_500.0)] > tables.loudness_weight[khz(15_000.0)]);
        assert_eq!(tables.loudness_weight[0], 0.0);
    }

    #[test]
    fn validation_rejects_non_positive_eq_entries() {
        let mut tables = CalibrationTables::generic(48_000.0);
        tables.eq_gain[17] = 0.0;
        assert!(tables.validate().is_err());
    }

    #[test]
    fn validation_rejects_out_of_range_remap() {
        let mut tables = CalibrationTables::generic(48_000.0);
        tables.remap[10] = FFT_BINS as u16;
        assert!(tables.validate().is_err());
    }
}
