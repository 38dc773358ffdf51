//! Audio decoding with symphonia.

use std::fs::File;
use std::path::{Path, PathBuf};

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::error::AcquireError;

/// Fully decoded track
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Interleaved samples
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl DecodedAudio {
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration_s(&self) -> f64 {
        self.frames() as f64 / self.sample_rate.max(1) as f64
    }
}

/// Packet-by-packet decoder over one audio track
pub struct PacketDecoder {
    path: PathBuf,
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: u32,
    channels: u16,
    /// Samples decoded while probing, returned by the first `next_chunk`
    pending: Vec<f32>,
    buffer: Option<SampleBuffer<f32>>,
}

impl PacketDecoder {
    /// Open and probe `path`, decoding up to the first audio to learn its format
    pub fn open(path: &Path) -> Result<Self, AcquireError> {
        let file = File::open(path).map_err(|source| AcquireError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|ext| ext.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| AcquireError::Unsupported {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| AcquireError::Unsupported {
                path: path.to_path_buf(),
                reason: "no audio track".to_string(),
            })?;
        let track_id = track.id;

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| AcquireError::Unsupported {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let mut this = Self {
            path: path.to_path_buf(),
            format,
            decoder,
            track_id,
            sample_rate: 0,
            channels: 0,
            pending: Vec::new(),
            buffer: None,
        };

        let mut first = Vec::new();
        if !this.decode_next(&mut first)? {
            return Err(AcquireError::Decode {
                path: path.to_path_buf(),
                reason: "no audio frames".to_string(),
            });
        }
        this.pending = first;

        debug!(
            "Opened {}: {} Hz, {} channel(s)",
            path.display(),
            this.sample_rate,
            this.channels
        );
        Ok(this)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Append the next chunk of interleaved samples; `Ok(false)` at end of stream
    pub fn next_chunk(&mut self, out: &mut Vec<f32>) -> Result<bool, AcquireError> {
        if !self.pending.is_empty() {
            out.append(&mut self.pending);
            return Ok(true);
        }
        self.decode_next(out)
    }

    fn decode_next(&mut self, out: &mut Vec<f32>) -> Result<bool, AcquireError> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(false);
                }
                Err(SymphoniaError::ResetRequired) => return Ok(false),
                Err(e) => {
                    return Err(AcquireError::Decode {
                        path: self.path.clone(),
                        reason: e.to_string(),
                    })
                }
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                // Corrupt packet: skip it and keep going
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("Skipping bad packet in {}: {}", self.path.display(), e);
                    continue;
                }
                Err(e) => {
                    return Err(AcquireError::Decode {
                        path: self.path.clone(),
                        reason: e.to_string(),
                    })
                }
            };

            if decoded.frames() == 0 {
                continue;
            }

            let spec = *decoded.spec();
            self.sample_rate = spec.rate;
            self.channels = spec.channels.count() as u16;

            let needed = decoded.capacity() * spec.channels.count();
            let too_small = self
                .buffer
                .as_ref()
                .map_or(true, |buffer| buffer.capacity() < needed);
            if too_small {
                self.buffer = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
            }
            if let Some(buffer) = self.buffer.as_mut() {
                buffer.copy_interleaved_ref(decoded);
                out.extend_from_slice(buffer.samples());
            }
            return Ok(true);
        }
    }
}

/// Decode an entire file into memory
pub fn decode_file(path: &Path) -> Result<DecodedAudio, AcquireError> {
    let mut decoder = PacketDecoder::open(path)?;
    let mut samples = Vec::new();
    while decoder.next_chunk(&mut samples)? {}

    let audio = DecodedAudio {
        samples,
        sample_rate: decoder.sample_rate(),
        channels: decoder.channels(),
    };
    debug!(
        "Decoded {}: {:.1}s, {} frames",
        path.display(),
        audio.duration_s(),
        audio.frames()
    );
    Ok(audio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_wav(path: &Path, channels: u16, sample_rate: u32, frames: usize) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..frames {
            let value = ((i as f32 * 0.05).sin() * 12000.0) as i16;
            for _ in 0..channels {
                writer.write_sample(value).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_decode_wav_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_wav(&path, 2, 22050, 4410);

        let audio = decode_file(&path).unwrap();
        assert_eq!(audio.sample_rate, 22050);
        assert_eq!(audio.channels, 2);
        assert_eq!(audio.frames(), 4410);
        assert!((audio.duration_s() - 0.2).abs() < 1e-6);
        assert!(audio.samples.iter().all(|s| s.abs() <= 1.0));
        assert!(audio.samples.iter().any(|s| s.abs() > 0.1));
    }

    #[test]
    fn test_incremental_matches_full_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        write_wav(&path, 1, 8000, 20_000);

        let full = decode_file(&path).unwrap();

        let mut decoder = PacketDecoder::open(&path).unwrap();
        assert_eq!(decoder.channels(), 1);
        let mut streamed = Vec::new();
        let mut chunks = 0;
        while decoder.next_chunk(&mut streamed).unwrap() {
            chunks += 1;
        }

        assert!(chunks >= 1);
        assert_eq!(streamed, full.samples);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = decode_file(Path::new("/nonexistent/track.wav")).unwrap_err();
        assert!(matches!(err, AcquireError::Io { .. }));
    }

    #[test]
    fn test_garbage_is_unsupported() {
        let mut file = tempfile::Builder::new().suffix(".mp3").tempfile().unwrap();
        file.write_all(&[0x42; 64]).unwrap();

        let err = decode_file(file.path()).unwrap_err();
        assert!(matches!(
            err,
            AcquireError::Unsupported { .. } | AcquireError::Decode { .. }
        ));
    }
}
