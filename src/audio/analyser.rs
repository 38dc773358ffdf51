//! Byte spectrum and waveform analysis over the most recent samples.

use std::collections::VecDeque;
use std::f32::consts::PI;
use std::sync::{Arc, Mutex};

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::error::ConfigError;
use crate::params::AnalyserConfig;

/// Most recent mono samples written by the output callback
#[derive(Debug)]
pub struct SampleTap {
    samples: VecDeque<f32>,
    capacity: usize,
}

/// Tap shared between the audio callback and the render thread
pub type SharedTap = Arc<Mutex<SampleTap>>;

impl SampleTap {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn shared(capacity: usize) -> SharedTap {
        Arc::new(Mutex::new(Self::new(capacity)))
    }

    pub fn push(&mut self, sample: f32) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(if sample.is_finite() { sample } else { 0.0 });
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Copy the newest samples into `out`, zero-padding at the front while filling
    pub fn copy_latest(&self, out: &mut [f32]) {
        let available = self.samples.len().min(out.len());
        let pad = out.len() - available;
        out[..pad].fill(0.0);
        let skip = self.samples.len() - available;
        for (slot, &sample) in out[pad..].iter_mut().zip(self.samples.iter().skip(skip)) {
            *slot = sample;
        }
    }
}

/// Blackman window coefficient
pub fn blackman_window(index: usize, size: usize) -> f32 {
    let x = index as f32 / size as f32;
    0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
}

/// Spectrum analyser producing byte magnitudes like a browser analyser node
pub struct Analyser {
    config: AnalyserConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
}

impl Analyser {
    pub fn new(config: AnalyserConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let size = config.fft_size;

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let scratch_len = fft.get_inplace_scratch_len();

        Ok(Self {
            window: (0..size).map(|i| blackman_window(i, size)).collect(),
            buffer: vec![Complex::new(0.0, 0.0); size],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
            smoothed: vec![0.0; config.frequency_bin_count()],
            fft,
            config,
        })
    }

    pub fn fft_size(&self) -> usize {
        self.config.fft_size
    }

    pub fn frequency_bin_count(&self) -> usize {
        self.config.frequency_bin_count()
    }

    /// Smoothed byte magnitudes of `samples` (the newest `fft_size` samples)
    ///
    /// `out` is resized to `frequency_bin_count`.
    pub fn byte_frequency_data(&mut self, samples: &[f32], out: &mut Vec<u8>) {
        let size = self.config.fft_size;
        let bins = self.frequency_bin_count();
        out.resize(bins, 0);

        // Align newest sample with the end of the window
        let pad = size.saturating_sub(samples.len());
        let tail = &samples[samples.len().saturating_sub(size)..];
        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = if i < pad { 0.0 } else { tail[i - pad] };
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.buffer, &mut self.scratch);

        let tau = self.config.smoothing_time_constant;
        let min_db = self.config.min_decibels;
        let range_db = self.config.max_decibels - min_db;
        let norm = 1.0 / size as f32;

        for (k, byte) in out.iter_mut().enumerate() {
            let magnitude = self.buffer[k].norm() * norm;
            let smoothed = tau * self.smoothed[k] + (1.0 - tau) * magnitude;
            self.smoothed[k] = if smoothed.is_finite() { smoothed } else { 0.0 };

            let db = 20.0 * self.smoothed[k].log10();
            let scaled = 255.0 / range_db * (db - min_db);
            *byte = scaled.clamp(0.0, 255.0) as u8;
        }
    }

    /// Byte waveform: 128 is silence, ±1.0 maps to 0 / 255
    ///
    /// `out` is resized to `fft_size`.
    pub fn byte_time_domain_data(&self, samples: &[f32], out: &mut Vec<u8>) {
        let size = self.config.fft_size;
        out.resize(size, 128);

        let pad = size.saturating_sub(samples.len());
        let tail = &samples[samples.len().saturating_sub(size)..];
        for (i, byte) in out.iter_mut().enumerate() {
            let sample = if i < pad { 0.0 } else { tail[i - pad] };
            *byte = (128.0 * (1.0 + sample)).clamp(0.0, 255.0) as u8;
        }
    }
}
