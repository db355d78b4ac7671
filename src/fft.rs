use microfft::real::rfft_256;

/// Samples per analysis frame, as delivered by the capture subsystem.
pub const FFT_SIZE: usize = 256;
/// Nyquist-limited magnitude bins per frame.
pub const FFT_BINS: usize = FFT_SIZE / 2;

// Magnitudes are scaled onto the 8-bit range the calibration tables are
// expressed in: a full-scale Hann-windowed sine (peak magnitude N/4) lands
// at 255.
const MAGNITUDE_SCALE: f32 = 255.0 / (FFT_SIZE as f32 / 4.0);

pub fn hann_window(buffer: &mut [f32]) {
    let n = buffer.len();
    if n == 0 {
        return;
    }
    let denom = (n - 1) as f32;
    for (i, v) in buffer.iter_mut().enumerate() {
        // Hann window: w[n] = 0.5 * (1 - cos(2π n / (N-1)))
        let phase = (i as f32) / denom;
        let w = 0.5 * (1.0 - libm::cosf(2.0 * core::f32::consts::PI * phase));
        *v *= w;
    }
}

/// Run the real FFT over one (already windowed) frame and write the
/// magnitude of the lower half-spectrum. The input buffer is consumed as
/// the transform's workspace.
pub fn magnitude_spectrum(input: &mut [f32; FFT_SIZE], out: &mut [f32; FFT_BINS]) {
    let spectrum = rfft_256(input);

    // the real FFT packs the Nyquist term into the imaginary part of bin 0
    spectrum[0].im = 0.0;

    for (mag, c) in out.iter_mut().zip(spectrum.iter()) {
        *mag = libm::sqrtf(c.norm_sqr()) * MAGNITUDE_SCALE;
    }
}
