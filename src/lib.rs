#![cfg_attr(not(test), no_std)]

//! Audio analysis core for a sound-reactive light device: takes one frame of
//! raw microphone samples per display tick and turns it into a per-channel
//! brightness array, with automatic gain control and flicker suppression.
//!
//! Everything hardware-facing (sample capture, LED driving, configuration
//! transport) lives in the firmware; this crate only consumes sample frames
//! and publishes brightness frames.

extern crate alloc;

pub mod calibration;
pub mod config;
mod config_presets;
pub mod fft;
pub mod intensity;
pub mod pipeline;
pub mod resample;
pub mod spectrum;
pub mod task;
pub mod util;
pub mod volume;

pub use calibration::CalibrationTables;
pub use config::{AnalyzerConfig, DisplayMode, MAX_CHANNELS};
pub use fft::{FFT_BINS, FFT_SIZE};
pub use pipeline::AudioPipeline;
pub use task::{AnalyzerFrame, SampleFrame};
pub use volume::VolumeState;
