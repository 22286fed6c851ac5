//! Hum feature file format and catalog loading

pub mod catalog;
pub mod format;
pub mod reader;
pub mod stats;
pub mod writer;

pub use catalog::{Catalog, CatalogEntry};
pub use format::{FeatureFile, FeatureFileMetadata, FileFormat, MAGIC, VERSION};
pub use reader::FeatureReader;
pub use stats::{ArrayStats, FeatureStats};
pub use writer::FeatureWriter;
