//! Loudness metrics derived from a byte frequency buffer.

use std::ops::Range;

/// Per-frame loudness summary (byte magnitude units, 0-255)
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Loudness {
    /// Mean over the whole spectrum
    pub average: f32,
    /// Mean over the bass sub-band
    pub bass: f32,
}

impl Loudness {
    /// Measure a frequency buffer; `bass_bins` is clamped to the buffer length
    pub fn measure(spectrum: &[u8], bass_bins: usize) -> Self {
        Self {
            average: spectrum_average(spectrum),
            bass: band_average(spectrum, 0..bass_bins),
        }
    }

    /// Average normalised to 0-1
    pub fn average_unit(&self) -> f32 {
        self.average / 255.0
    }

    /// Bass normalised to 0-1
    pub fn bass_unit(&self) -> f32 {
        self.bass / 255.0
    }
}

/// Mean of all bins (0 for an empty buffer)
pub fn spectrum_average(bins: &[u8]) -> f32 {
    band_average(bins, 0..bins.len())
}

/// Mean of `bins[band]`, with the band clamped to the buffer (0 if empty)
pub fn band_average(bins: &[u8], band: Range<usize>) -> f32 {
    let end = band.end.min(bins.len());
    let start = band.start.min(end);
    let slice = &bins[start..end];
    if slice.is_empty() {
        return 0.0;
    }
    // u32 accumulator cannot overflow below 16M bins
    let sum: u32 = slice.iter().map(|&b| b as u32).sum();
    sum as f32 / slice.len() as f32
}
