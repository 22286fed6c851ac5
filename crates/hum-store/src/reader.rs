//! Feature file reader

use crate::format::{FeatureFile, FileFormat, MAGIC, VERSION};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Magic, version and payload length
const HEADER_LEN: u64 = 4 + 2 + 8;

pub struct FeatureReader;

impl FeatureReader {
    /// Read a feature file, choosing the decoder from the extension
    pub fn read(path: &Path) -> Result<FeatureFile> {
        match FileFormat::from_path(path) {
            Some(FileFormat::Json) => Self::read_json(path),
            Some(FileFormat::Binary) => Self::read_binary(path),
            None => anyhow::bail!(
                "Unsupported feature file extension: {} (expected .json or .bin)",
                path.display()
            ),
        }
    }

    pub fn read_json(path: &Path) -> Result<FeatureFile> {
        let json_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read feature file: {}", path.display()))?;
        let file: FeatureFile = serde_json::from_str(&json_str)
            .with_context(|| format!("Invalid JSON feature file: {}", path.display()))?;
        Ok(file)
    }

    pub fn read_binary(path: &Path) -> Result<FeatureFile> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open feature file: {}", path.display()))?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != MAGIC {
            anyhow::bail!("Invalid feature file: magic bytes mismatch");
        }

        let version = Self::read_u16(&mut reader)?;
        if version > VERSION {
            anyhow::bail!("Unsupported feature file version {} (max {})", version, VERSION);
        }

        let payload_len = Self::read_u64(&mut reader)?;
        let available = file_len.saturating_sub(HEADER_LEN);
        if payload_len > available {
            anyhow::bail!(
                "Feature file payload length {} exceeds the {} bytes on disk",
                payload_len,
                available
            );
        }
        let mut payload = vec![0u8; payload_len as usize];
        reader
            .read_exact(&mut payload)
            .context("Feature file payload is truncated")?;

        let feature_file: FeatureFile =
            bincode::deserialize(&payload).context("Failed to decode feature file payload")?;
        Ok(feature_file)
    }

    fn read_u16(reader: &mut impl Read) -> Result<u16> {
        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    fn read_u64(reader: &mut impl Read) -> Result<u64> {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::FeatureWriter;
    use hum_core::{FeatureBundle, FeatureMatrix};

    fn sample() -> FeatureFile {
        let features = FeatureBundle::new(
            vec![0.0, 220.0, 247.0, 0.0, 262.0],
            FeatureMatrix::new(vec![vec![1.0, 2.0], vec![3.0, 4.0]]),
            FeatureMatrix::new(vec![vec![0.5, 0.25]; 12]),
        );
        FeatureFile::new("senorita", "audio/senorita.mp3", features)
            .with_title("Senorita", "Unknown")
    }

    #[test]
    fn test_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("senorita.json");
        let original = sample();
        FeatureWriter::write(&path, &original).unwrap();
        let loaded = FeatureReader::read(&path).unwrap();
        assert_eq!(loaded, original);
        assert_eq!(loaded.metadata.title.as_deref(), Some("Senorita"));
    }

    #[test]
    fn test_binary_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("senorita.bin");
        let original = sample();
        FeatureWriter::write(&path, &original).unwrap();
        assert_eq!(FeatureReader::read(&path).unwrap(), original);
    }

    #[test]
    fn test_bad_magic_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.bin");
        std::fs::write(&path, b"NOPE\x01\x00").unwrap();
        let err = FeatureReader::read(&path).unwrap_err();
        assert!(err.to_string().contains("magic"));
    }

    #[test]
    fn test_oversized_payload_length_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oversized.bin");
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&VERSION.to_le_bytes());
        bytes.extend_from_slice(&u64::MAX.to_le_bytes());
        bytes.extend_from_slice(b"tail");
        std::fs::write(&path, bytes).unwrap();

        let err = FeatureReader::read(&path).unwrap_err();
        assert!(err.to_string().contains("exceeds"));
    }

    #[test]
    fn test_truncated_payload_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("truncated.bin");
        FeatureWriter::write(&path, &sample()).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();

        assert!(FeatureReader::read(&path).is_err());
    }

    #[test]
    fn test_unknown_extension_rejected() {
        assert!(FeatureReader::read(Path::new("features.npy")).is_err());
    }
}
