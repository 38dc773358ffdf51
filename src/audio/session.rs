//! Live audio session: cpal output stream, playback feed and analysis tap.

use std::fs::File;
use std::io::BufWriter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use tracing::{debug, info, warn};

use super::analyser::{Analyser, SampleTap, SharedTap};
use super::decode::{decode_file, PacketDecoder};
use super::source::AudioSource;
use super::SignalSource;
use crate::error::AcquireError;
use crate::params::{audio_constants, AnalyserConfig};

/// WAV writer shared with the output callback (recording mode)
pub type SharedCapture = Arc<Mutex<hound::WavWriter<BufWriter<File>>>>;

/// Create a stereo float WAV capture at `sample_rate`
pub fn create_capture(path: &str, sample_rate: u32) -> Result<SharedCapture, hound::Error> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let writer = hound::WavWriter::create(path, spec)?;
    Ok(Arc::new(Mutex::new(writer)))
}

/// Default output device sample rate
pub fn default_output_rate() -> Result<u32, AcquireError> {
    let device = cpal::default_host()
        .default_output_device()
        .ok_or_else(|| AcquireError::Playback("no audio output device found".to_string()))?;
    let config = device
        .default_output_config()
        .map_err(|e| AcquireError::Playback(e.to_string()))?;
    Ok(config.sample_rate().0)
}

/// Result of pulling one source frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pull {
    Frame,
    /// Streaming decoder has not caught up; play silence
    Underrun,
    Finished,
}

/// Where played samples come from
enum Feed {
    Buffered {
        samples: Vec<f32>,
        cursor: usize,
    },
    Streamed {
        consumer: HeapCons<f32>,
        decoded_all: Arc<AtomicBool>,
    },
}

impl Feed {
    /// Write one interleaved frame of `out.len()` channels
    fn pull(&mut self, out: &mut [f32]) -> Pull {
        match self {
            Feed::Buffered { samples, cursor } => {
                let end = *cursor + out.len();
                if end > samples.len() {
                    return Pull::Finished;
                }
                out.copy_from_slice(&samples[*cursor..end]);
                *cursor = end;
                Pull::Frame
            }
            Feed::Streamed {
                consumer,
                decoded_all,
            } => {
                if consumer.occupied_len() >= out.len() {
                    consumer.pop_slice(out);
                    Pull::Frame
                } else if decoded_all.load(Ordering::Acquire) {
                    Pull::Finished
                } else {
                    Pull::Underrun
                }
            }
        }
    }
}

/// Linear-interpolating rate converter from source to device rate
struct Playhead {
    feed: Feed,
    prev: Vec<f32>,
    next: Vec<f32>,
    /// Position between `prev` and `next` (0-1)
    phase: f64,
    /// Source frames per device frame
    step: f64,
    finished: bool,
}

impl Playhead {
    fn new(feed: Feed, channels: usize, source_rate: u32, device_rate: u32) -> Self {
        Self {
            feed,
            prev: vec![0.0; channels],
            next: vec![0.0; channels],
            phase: 1.0,
            step: source_rate as f64 / device_rate.max(1) as f64,
            finished: false,
        }
    }

    /// Produce the next device-rate frame into `out` (source channel layout)
    fn render(&mut self, out: &mut [f32]) {
        while self.phase >= 1.0 {
            std::mem::swap(&mut self.prev, &mut self.next);
            match self.feed.pull(&mut self.next) {
                Pull::Frame => {}
                Pull::Underrun => self.next.fill(0.0),
                Pull::Finished => {
                    self.finished = true;
                    self.next.fill(0.0);
                }
            }
            self.phase -= 1.0;
        }

        let t = self.phase as f32;
        for ((slot, a), b) in out.iter_mut().zip(&self.prev).zip(&self.next) {
            *slot = a + (b - a) * t;
        }
        self.phase += self.step;
    }
}

/// Background thread filling the stream ring from a packet decoder
struct DecodeWorker {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl DecodeWorker {
    fn spawn(
        mut decoder: PacketDecoder,
        mut producer: HeapProd<f32>,
        decoded_all: Arc<AtomicBool>,
    ) -> Result<Self, AcquireError> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let backoff = Duration::from_millis(audio_constants::STREAM_BACKOFF_MS);

        let handle = thread::Builder::new()
            .name("beatcanvas-decode".to_string())
            .spawn(move || {
                let mut chunk = Vec::new();
                'decode: loop {
                    chunk.clear();
                    match decoder.next_chunk(&mut chunk) {
                        Ok(true) => {}
                        Ok(false) => break,
                        Err(e) => {
                            warn!("Stream decode stopped: {}", e);
                            break;
                        }
                    }

                    let mut written = 0;
                    while written < chunk.len() {
                        if stop_flag.load(Ordering::Relaxed) {
                            break 'decode;
                        }
                        written += producer.push_slice(&chunk[written..]);
                        if written < chunk.len() {
                            thread::sleep(backoff);
                        }
                    }
                }
                decoded_all.store(true, Ordering::Release);
                debug!("Decode worker finished");
            })
            .map_err(|e| AcquireError::Playback(format!("failed to spawn decoder: {}", e)))?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }
}

impl Drop for DecodeWorker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Decode worker panicked");
            }
        }
    }
}

/// One playing (or paused) track with its analysis tap
///
/// Dropping the session stops the stream before the decode worker is joined.
pub struct AudioSession {
    label: String,
    stream: cpal::Stream,
    tap: SharedTap,
    analyser: Analyser,
    window: Vec<f32>,
    finished: Arc<AtomicBool>,
    _worker: Option<DecodeWorker>,
}

impl AudioSession {
    /// Decode or probe `source` and build a paused output stream for it
    pub fn open(
        source: &AudioSource,
        analyser_config: &AnalyserConfig,
        capture: Option<SharedCapture>,
    ) -> Result<Self, AcquireError> {
        let analyser = Analyser::new(analyser_config.clone())
            .map_err(|e| AcquireError::Playback(e.to_string()))?;

        // Decode first: a bad file must fail before touching the device
        let decoded_all = Arc::new(AtomicBool::new(false));
        let (feed, channels, source_rate, worker) = match source {
            AudioSource::Decoded(path) => {
                let audio = decode_file(path)?;
                let feed = Feed::Buffered {
                    samples: audio.samples,
                    cursor: 0,
                };
                (feed, audio.channels, audio.sample_rate, None)
            }
            AudioSource::Streamed(path) => {
                let decoder = PacketDecoder::open(path)?;
                let (channels, rate) = (decoder.channels(), decoder.sample_rate());
                let ring = HeapRb::<f32>::new(audio_constants::STREAM_BUFFER_SAMPLES);
                let (producer, consumer) = ring.split();
                let worker = DecodeWorker::spawn(decoder, producer, Arc::clone(&decoded_all))?;
                let feed = Feed::Streamed {
                    consumer,
                    decoded_all: Arc::clone(&decoded_all),
                };
                (feed, channels, rate, Some(worker))
            }
        };

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| AcquireError::Playback("no audio output device found".to_string()))?;
        let supported = device
            .default_output_config()
            .map_err(|e| AcquireError::Playback(format!("failed to get audio config: {}", e)))?;

        info!(
            "Audio: {} @ {}Hz for '{}' ({} Hz, {} ch)",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            supported.sample_rate().0,
            source.label(),
            source_rate,
            channels
        );

        let tap = SampleTap::shared(analyser_config.fft_size);
        let finished = Arc::new(AtomicBool::new(false));
        let playhead = Playhead::new(
            feed,
            channels.max(1) as usize,
            source_rate,
            supported.sample_rate().0,
        );
        let sink = CallbackSink {
            playhead,
            tap: Arc::clone(&tap),
            finished: Arc::clone(&finished),
            capture,
            frame: vec![0.0; channels.max(1) as usize],
        };

        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();
        let stream = match sample_format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, sink),
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, sink),
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, sink),
            other => Err(AcquireError::Playback(format!(
                "unsupported output sample format {:?}",
                other
            ))),
        }?;

        // Some backends start on creation; stay silent until `start`
        if let Err(e) = stream.pause() {
            debug!("Stream pause after build not supported: {}", e);
        }

        Ok(Self {
            label: source.label(),
            stream,
            tap,
            window: vec![0.0; analyser.fft_size()],
            analyser,
            finished,
            _worker: worker,
        })
    }
}

impl SignalSource for AudioSession {
    fn start(&mut self) -> Result<(), AcquireError> {
        self.stream
            .play()
            .map_err(|e| AcquireError::Playback(format!("failed to start audio stream: {}", e)))
    }

    fn pause(&mut self) -> Result<(), AcquireError> {
        self.stream
            .pause()
            .map_err(|e| AcquireError::Playback(format!("failed to pause audio stream: {}", e)))
    }

    fn read(&mut self, spectrum: &mut Vec<u8>, waveform: &mut Vec<u8>) {
        match self.tap.lock() {
            Ok(tap) => tap.copy_latest(&mut self.window),
            Err(_) => self.window.fill(0.0),
        }
        self.analyser.byte_frequency_data(&self.window, spectrum);
        self.analyser.byte_time_domain_data(&self.window, waveform);
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    fn label(&self) -> &str {
        &self.label
    }
}

impl Drop for AudioSession {
    fn drop(&mut self) {
        debug!("Releasing audio session '{}'", self.label);
    }
}

/// State moved into the output callback
struct CallbackSink {
    playhead: Playhead,
    tap: SharedTap,
    finished: Arc<AtomicBool>,
    capture: Option<SharedCapture>,
    frame: Vec<f32>,
}

impl CallbackSink {
    fn fill<T>(&mut self, data: &mut [T], out_channels: usize)
    where
        T: SizedSample + FromSample<f32>,
    {
        let src_channels = self.frame.len();
        let mut tap = self.tap.lock().ok();
        let mut capture = self.capture.as_ref().and_then(|c| c.lock().ok());
        let mut capture_failed = false;

        for out in data.chunks_mut(out_channels) {
            self.playhead.render(&mut self.frame);

            let mono = self.frame.iter().sum::<f32>() / src_channels as f32;
            for (c, sample) in out.iter_mut().enumerate() {
                // Mono duplicates to every channel; extra source channels are dropped
                let value = self.frame[c.min(src_channels - 1)].clamp(-1.0, 1.0);
                *sample = T::from_sample(value);
            }

            if let Some(tap) = tap.as_mut() {
                tap.push(mono);
            }
            if let Some(writer) = capture.as_mut() {
                let left = self.frame[0];
                let right = self.frame[1.min(src_channels - 1)];
                if let Err(e) = writer
                    .write_sample(left)
                    .and_then(|()| writer.write_sample(right))
                {
                    warn!("Audio capture stopped: {}", e);
                    capture_failed = true;
                    capture = None;
                }
            }
        }

        drop(capture);
        if capture_failed {
            self.capture = None;
        }

        if self.playhead.finished {
            self.finished.store(true, Ordering::Release);
        }
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut sink: CallbackSink,
) -> Result<cpal::Stream, AcquireError>
where
    T: SizedSample + FromSample<f32>,
{
    let out_channels = config.channels.max(1) as usize;
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| sink.fill(data, out_channels),
            |err| warn!("Audio stream error: {}", err),
            None,
        )
        .map_err(|e| AcquireError::Playback(format!("failed to build audio stream: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffered(samples: Vec<f32>) -> Feed {
        Feed::Buffered { samples, cursor: 0 }
    }

    fn render_all(playhead: &mut Playhead, frames: usize, channels: usize) -> Vec<f32> {
        let mut out = Vec::new();
        let mut frame = vec![0.0; channels];
        for _ in 0..frames {
            playhead.render(&mut frame);
            out.extend_from_slice(&frame);
        }
        out
    }

    #[test]
    fn test_same_rate_passes_samples_through() {
        let mut playhead = Playhead::new(buffered(vec![0.1, 0.2, 0.3, 0.4]), 1, 48000, 48000);
        let out = render_all(&mut playhead, 4, 1);

        // One frame of latency from the interpolation window
        assert_eq!(out, vec![0.0, 0.1, 0.2, 0.3]);
        assert!(!playhead.finished);

        // Last sample goes out as the source runs dry
        assert_eq!(render_all(&mut playhead, 1, 1), vec![0.4]);
        assert!(playhead.finished);
    }

    #[test]
    fn test_upsampling_interpolates() {
        let mut playhead = Playhead::new(buffered(vec![0.0, 1.0, 1.0]), 1, 24000, 48000);
        let out = render_all(&mut playhead, 6, 1);

        assert_eq!(out[2], 0.0);
        assert!((out[3] - 0.5).abs() < 1e-6);
        assert_eq!(out[4], 1.0);
    }

    #[test]
    fn test_downsampling_skips_frames() {
        let samples: Vec<f32> = (0..8).map(|i| i as f32).collect();
        let mut playhead = Playhead::new(buffered(samples), 1, 48000, 24000);
        let out = render_all(&mut playhead, 4, 1);
        assert_eq!(out, vec![0.0, 1.0, 3.0, 5.0]);
    }

    #[test]
    fn test_stereo_frames_stay_aligned() {
        let mut playhead = Playhead::new(buffered(vec![0.1, -0.1, 0.2, -0.2]), 2, 44100, 44100);
        let out = render_all(&mut playhead, 3, 2);
        assert_eq!(out, vec![0.0, 0.0, 0.1, -0.1, 0.2, -0.2]);
    }

    #[test]
    fn test_streamed_feed_underrun_then_finish() {
        let ring = HeapRb::<f32>::new(16);
        let (mut producer, consumer) = ring.split();
        let decoded_all = Arc::new(AtomicBool::new(false));
        let mut feed = Feed::Streamed {
            consumer,
            decoded_all: Arc::clone(&decoded_all),
        };

        let mut frame = [0.0; 2];
        assert_eq!(feed.pull(&mut frame), Pull::Underrun);

        producer.push_slice(&[0.5, 0.25, 0.75]);
        assert_eq!(feed.pull(&mut frame), Pull::Frame);
        assert_eq!(frame, [0.5, 0.25]);

        // Half a frame left over while the decoder is still running
        assert_eq!(feed.pull(&mut frame), Pull::Underrun);

        decoded_all.store(true, Ordering::Release);
        assert_eq!(feed.pull(&mut frame), Pull::Finished);
    }

    #[test]
    fn test_sink_feeds_tap_with_mono_mix() {
        let tap = SampleTap::shared(8);
        let finished = Arc::new(AtomicBool::new(false));
        let mut sink = CallbackSink {
            playhead: Playhead::new(buffered(vec![0.2, 0.4, 0.6, 0.8]), 2, 100, 100),
            tap: Arc::clone(&tap),
            finished: Arc::clone(&finished),
            capture: None,
            frame: vec![0.0; 2],
        };

        let mut data = [0.0f32; 8];
        sink.fill(&mut data, 2);

        assert_eq!(&data[..6], &[0.0, 0.0, 0.2, 0.4, 0.6, 0.8]);
        assert!(finished.load(Ordering::Acquire));

        let mut latest = [0.0; 4];
        tap.lock().unwrap().copy_latest(&mut latest);
        assert!((latest[1] - 0.3).abs() < 1e-6);
        assert!((latest[2] - 0.7).abs() < 1e-6);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_capture_write_failure_stops_capture() {
        // Every flush to /dev/full fails with ENOSPC
        let capture = create_capture("/dev/full", 100).unwrap();
        let mut sink = CallbackSink {
            playhead: Playhead::new(buffered(vec![0.1; 8192]), 2, 100, 100),
            tap: SampleTap::shared(8),
            finished: Arc::new(AtomicBool::new(false)),
            capture: Some(Arc::clone(&capture)),
            frame: vec![0.0; 2],
        };

        let mut data = vec![0.0f32; 8192];
        sink.fill(&mut data, 2);
        assert!(sink.capture.is_none());

        // Playback carries on without the capture
        sink.fill(&mut data, 2);
        assert!(data.iter().all(|&s| s == 0.1 || s == 0.0));
    }
}
