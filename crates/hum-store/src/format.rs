//! Feature file structures
//!
//! A feature file holds one track's extracted features plus the metadata
//! needed to report it in a ranking. Two encodings share the same structure:
//! pretty JSON (`.json`) and a binary form (`.bin`) laid out as
//! `MAGIC | version (u16 LE) | payload length (u64 LE) | bincode payload`.

use hum_core::FeatureBundle;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Magic bytes for binary feature files: "HUMF"
pub const MAGIC: [u8; 4] = [0x48, 0x55, 0x4D, 0x46];

/// Current format version
pub const VERSION: u16 = 1;

/// Extractor defaults the features were computed with
pub const DEFAULT_SAMPLE_RATE: u32 = 16000;
pub const DEFAULT_HOP_LENGTH: u32 = 512;

/// On-disk encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Binary,
}

impl FileFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(FileFormat::Json),
            Some("bin") => Some(FileFormat::Binary),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Json => "json",
            FileFormat::Binary => "bin",
        }
    }
}

/// Metadata about the source recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureFileMetadata {
    /// Catalog identifier
    pub song_id: String,
    pub title: Option<String>,
    pub artist: Option<String>,
    /// Path of the audio the features were extracted from
    pub source_path: String,
    pub sample_rate: u32,
    /// Frame hop in samples
    pub hop_length: u32,
    pub created_at: String,
}

/// Complete feature file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureFile {
    pub version: u16,
    pub metadata: FeatureFileMetadata,
    pub features: FeatureBundle,
}

impl FeatureFile {
    /// Create a new feature file stamped with the current time
    pub fn new(
        song_id: impl Into<String>,
        source_path: impl Into<String>,
        features: FeatureBundle,
    ) -> Self {
        Self {
            version: VERSION,
            metadata: FeatureFileMetadata {
                song_id: song_id.into(),
                title: None,
                artist: None,
                source_path: source_path.into(),
                sample_rate: DEFAULT_SAMPLE_RATE,
                hop_length: DEFAULT_HOP_LENGTH,
                created_at: chrono::Utc::now().to_rfc3339(),
            },
            features,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>, artist: impl Into<String>) -> Self {
        self.metadata.title = Some(title.into());
        self.metadata.artist = Some(artist.into());
        self
    }

    /// "Title by Artist", falling back to the song id
    pub fn display_name(&self) -> String {
        match (&self.metadata.title, &self.metadata.artist) {
            (Some(title), Some(artist)) => format!("{} by {}", title, artist),
            (Some(title), None) => title.clone(),
            _ => self.metadata.song_id.clone(),
        }
    }

    /// Duration covered by the pitch contour, in seconds
    pub fn duration_s(&self) -> f64 {
        if self.metadata.sample_rate == 0 {
            return 0.0;
        }
        self.features.pitch_contour.len() as f64 * self.metadata.hop_length as f64
            / self.metadata.sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(FileFormat::from_path(Path::new("a/song.json")), Some(FileFormat::Json));
        assert_eq!(FileFormat::from_path(Path::new("song.bin")), Some(FileFormat::Binary));
        assert_eq!(FileFormat::from_path(Path::new("song.npy")), None);
    }

    #[test]
    fn test_display_name_and_duration() {
        let features = FeatureBundle::from_pitch(vec![0.0; 125]);
        let file = FeatureFile::new("hope", "audio/hope.wav", features);
        assert_eq!(file.display_name(), "hope");
        assert!((file.duration_s() - 4.0).abs() < 1e-9);

        let titled = file.with_title("Hope", "Someone");
        assert_eq!(titled.display_name(), "Hope by Someone");
    }
}
