use alloc::format;

use anyhow::{Result, anyhow};
use heapless::Vec;

use crate::config::MAX_CHANNELS;
use crate::error_with_location;
use crate::fft::FFT_BINS;

// The downsample path never needs more than target * ceil(source/target)
// scratch slots, which stays below source + target.
const SCRATCH_CAP: usize = 2 * FFT_BINS;

/// Resizes the fixed-resolution cleaned spectrum onto the device's channel
/// count. Expansion is piecewise-linear interpolation; reduction first
/// interpolates onto an integer multiple of the target and then box-filter
/// averages, which avoids the aliasing of naive subsampling while keeping a
/// single interpolation code path.
pub struct Resampler {
    target: usize,
    scratch: Vec<f32, SCRATCH_CAP>,
    out: Vec<f32, MAX_CHANNELS>,
}

impl Resampler {
    /// A zero or over-capacity target is a configuration error and is
    /// rejected here, before the first frame.
    pub fn new(target: usize) -> Result<Self> {
        if target == 0 || target > MAX_CHANNELS {
            return Err(error_with_location!(
                "resample target {} outside 1..={}",
                target,
                MAX_CHANNELS
            ));
        }
        let mut out = Vec::new();
        let _ = out.resize(target, 0.0);
        Ok(Self {
            target,
            scratch: Vec::new(),
            out,
        })
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn resample(&mut self, src: &[f32]) -> &[f32] {
        if self.target == src.len() {
            self.out.copy_from_slice(src);
        } else if self.target > src.len() {
            lerp_resize(src, &mut self.out);
        } else {
            // m >= 1 by construction, so the averaging below cannot divide
            // by a zero-length run
            let m = src.len().div_ceil(self.target);
            self.scratch.clear();
            let _ = self.scratch.resize(self.target * m, 0.0);
            lerp_resize(src, &mut self.scratch);
            for (out, run) in self.out.iter_mut().zip(self.scratch.chunks_exact(m)) {
                *out = run.iter().sum::<f32>() / m as f32;
            }
        }
        &self.out
    }
}

/// Linear interpolation of `src` onto `dst`, endpoints preserved. The
/// lookup one past the current position clamps at the last bin instead of
/// reading beyond the array.
fn lerp_resize(src: &[f32], dst: &mut [f32]) {
    let src_span = (src.len() - 1) as f32;
    let dst_span = (dst.len() - 1).max(1) as f32;
    for (i, out) in dst.iter_mut().enumerate() {
        let pos = i as f32 * src_span / dst_span;
        let lo = pos as usize;
        let hi = (lo + 1).min(src.len() - 1);
        let frac = pos - lo as f32;
        *out = src[lo] + (src[hi] - src[lo]) * frac;
    }
}
