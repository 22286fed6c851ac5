//! Feature file writer

use crate::format::{FeatureFile, FileFormat, MAGIC, VERSION};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub struct FeatureWriter;

impl FeatureWriter {
    /// Write a feature file, choosing the encoding from the extension
    pub fn write(path: &Path, file: &FeatureFile) -> Result<()> {
        match FileFormat::from_path(path) {
            Some(FileFormat::Json) => Self::write_json(path, file),
            Some(FileFormat::Binary) => Self::write_binary(path, file),
            None => anyhow::bail!(
                "Unsupported feature file extension: {} (expected .json or .bin)",
                path.display()
            ),
        }
    }

    pub fn write_json(path: &Path, file: &FeatureFile) -> Result<()> {
        let json_str = serde_json::to_string_pretty(file)?;
        std::fs::write(path, json_str)
            .with_context(|| format!("Failed to write feature file: {}", path.display()))?;
        Ok(())
    }

    pub fn write_binary(path: &Path, file: &FeatureFile) -> Result<()> {
        let payload = bincode::serialize(file).context("Failed to encode feature file")?;

        let out = File::create(path)
            .with_context(|| format!("Failed to create feature file: {}", path.display()))?;
        let mut writer = BufWriter::new(out);

        writer.write_all(&MAGIC)?;
        writer.write_all(&VERSION.to_le_bytes())?;
        writer.write_all(&(payload.len() as u64).to_le_bytes())?;
        writer.write_all(&payload)?;
        writer.flush()?;

        Ok(())
    }
}
