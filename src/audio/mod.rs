//! Audio acquisition, playback and analysis.
//!
//! Decodes user-selected tracks with symphonia, plays them through cpal,
//! and exposes byte spectrum / waveform buffers of what is currently
//! audible.

mod analyser;
mod decode;
mod session;
mod source;

// Re-export public types
pub use analyser::{blackman_window, Analyser, SampleTap, SharedTap};
pub use decode::{decode_file, DecodedAudio, PacketDecoder};
pub use session::{create_capture, default_output_rate, AudioSession, SharedCapture};
pub use source::{is_audio_path, AudioSource, Playlist, AUDIO_EXTENSIONS};

use crate::error::AcquireError;

/// A live signal the renderer can read each frame
///
/// Implemented by [`AudioSession`]; tests use scripted sources.
pub trait SignalSource {
    /// Begin (or resume) audible playback
    fn start(&mut self) -> Result<(), AcquireError>;

    fn pause(&mut self) -> Result<(), AcquireError>;

    /// Fill this frame's byte spectrum and byte waveform
    fn read(&mut self, spectrum: &mut Vec<u8>, waveform: &mut Vec<u8>);

    /// Track has played to the end
    fn is_finished(&self) -> bool;

    /// Display name
    fn label(&self) -> &str;
}
