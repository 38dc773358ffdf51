//! What the user asked to play.

use std::fmt;
use std::path::{Path, PathBuf};

/// Extensions accepted by the file picker and drag-and-drop
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "ogg", "oga", "m4a", "aac", "mp4"];

/// Audio input and how to decode it
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AudioSource {
    /// Decode the whole file into memory before playback (picked or dropped files)
    Decoded(PathBuf),
    /// Decode incrementally while playing (preset playlist tracks)
    Streamed(PathBuf),
}

impl AudioSource {
    pub fn path(&self) -> &Path {
        match self {
            AudioSource::Decoded(path) | AudioSource::Streamed(path) => path,
        }
    }

    /// Short human-readable name (file name)
    pub fn label(&self) -> String {
        self.path()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path().display().to_string())
    }
}

impl fmt::Display for AudioSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Whether a path looks like an audio file we can try to decode
pub fn is_audio_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            AUDIO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Preset tracks, streamed in order and wrapping at either end
#[derive(Clone, Debug, Default)]
pub struct Playlist {
    tracks: Vec<PathBuf>,
    current: usize,
}

impl Playlist {
    pub fn new(tracks: Vec<PathBuf>) -> Self {
        Self { tracks, current: 0 }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn current(&self) -> Option<AudioSource> {
        self.tracks
            .get(self.current)
            .map(|path| AudioSource::Streamed(path.clone()))
    }

    pub fn advance(&mut self) -> Option<AudioSource> {
        if self.tracks.is_empty() {
            return None;
        }
        self.current = (self.current + 1) % self.tracks.len();
        self.current()
    }

    pub fn back(&mut self) -> Option<AudioSource> {
        if self.tracks.is_empty() {
            return None;
        }
        self.current = (self.current + self.tracks.len() - 1) % self.tracks.len();
        self.current()
    }
}
