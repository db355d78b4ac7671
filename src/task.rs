use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Receiver;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker};
use heapless::Vec;

use crate::config::{AnalyzerConfig, DisplayMode, MAX_CHANNELS};
use crate::fft::FFT_SIZE;
use crate::pipeline::AudioPipeline;
use crate::volume::VolumeState;

/// One tick's worth of raw capture samples.
pub type SampleFrame = Vec<i32, FFT_SIZE>;

pub const FRAME_QUEUE_DEPTH: usize = 4;

pub type FrameReceiver =
    Receiver<'static, CriticalSectionRawMutex, SampleFrame, FRAME_QUEUE_DEPTH>;

/// Finished analysis of one frame, published for whichever renderer the
/// current mode routes it to.
#[derive(Clone, Debug)]
pub struct AnalyzerFrame {
    pub mode: DisplayMode,
    pub levels: Vec<u8, MAX_CHANNELS>,
    pub volume: VolumeState,
}

/// Fixed-rate analysis loop; spawn this from a firmware task and feed it
/// capture frames. The mode and config signals are single-slot and
/// overwrite-on-full: they are polled without blocking at the top of every
/// iteration, and a missed intermediate value is intentionally lost. The
/// only other suspension point is waiting for the next capture frame.
pub async fn run(
    mut pipeline: AudioPipeline,
    frames: FrameReceiver,
    mode_signal: &'static Signal<CriticalSectionRawMutex, DisplayMode>,
    config_signal: &'static Signal<CriticalSectionRawMutex, AnalyzerConfig>,
    output_signal: &'static Signal<CriticalSectionRawMutex, AnalyzerFrame>,
) -> ! {
    let mut frame_rate_hz = pipeline.frame_rate_hz();
    let mut ticker = Ticker::every(frame_period(frame_rate_hz));
    let mut mode = DisplayMode::default();

    log::info!("audio analysis loop started at {frame_rate_hz} FPS");

    loop {
        ticker.next().await;

        if let Some(new_mode) = mode_signal.try_take() {
            mode = new_mode;
        }
        if let Some(new_config) = config_signal.try_take() {
            match pipeline.apply_config(&new_config) {
                Ok(()) => {
                    if new_config.frame_rate_hz != frame_rate_hz {
                        frame_rate_hz = new_config.frame_rate_hz;
                        ticker = Ticker::every(frame_period(frame_rate_hz));
                    }
                    log::info!("applied config update");
                }
                // a bad runtime update must not stall the display; keep
                // running on the previous configuration
                Err(e) => log::error!("rejected config update: {e:?}"),
            }
        }

        let samples = frames.receive().await;
        let levels = pipeline.process_frame(&samples);
        output_signal.signal(AnalyzerFrame {
            mode,
            levels: Vec::from_slice(levels).unwrap_or_default(),
            volume: pipeline.volume(),
        });
    }
}

fn frame_period(frame_rate_hz: u32) -> Duration {
    Duration::from_millis((1000 / frame_rate_hz.max(1)).max(1) as u64)
}
