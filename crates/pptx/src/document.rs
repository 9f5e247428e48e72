//! The rendered presentation artifact.

use crate::error::Result;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// MIME type of a PPTX package.
pub const PPTX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

/// File extension of a PPTX package, without the dot.
pub const PPTX_EXTENSION: &str = "pptx";

/// A rendered `.pptx` package.
///
/// Carries no name or storage key; the delivery channel assigns those.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    bytes: Vec<u8>,
    slide_count: usize,
}

impl RenderedDocument {
    pub(crate) fn new(bytes: Vec<u8>, slide_count: usize) -> Self {
        Self { bytes, slide_count }
    }

    /// The package bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Take ownership of the package bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Size of the package in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Number of slides in the package.
    pub fn slide_count(&self) -> usize {
        self.slide_count
    }

    /// Write the package to a caller-supplied path.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(&self.bytes)?;
        file.flush()?;
        Ok(())
    }

    /// Write the package to a scratch file in the system temp directory.
    ///
    /// The file is removed when the returned handle is dropped.
    pub fn write_to_scratch(&self) -> Result<NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix("presentation_")
            .suffix(".pptx")
            .tempfile()?;
        file.write_all(&self.bytes)?;
        file.flush()?;
        Ok(file)
    }
}
