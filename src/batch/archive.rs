//! In-memory zip archive for batch output.

use std::io::{Cursor, Write};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::{AdForgeError, Result};

fn zip_err(e: zip::result::ZipError) -> AdForgeError {
    AdForgeError::Encode(format!("zip: {}", e))
}

/// Accumulates entries; nothing touches disk.
pub struct ArchiveBuilder {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    entries: Vec<String>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            entries: Vec::new(),
        }
    }

    pub fn add(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        self.zip.start_file(name, options).map_err(zip_err)?;
        self.zip.write_all(bytes)?;
        self.entries.push(name.to_string());
        Ok(())
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Finish the central directory and return the archive bytes and entry names.
    pub fn finish(self) -> Result<(Vec<u8>, Vec<String>)> {
        let cursor = self.zip.finish().map_err(zip_err)?;
        Ok((cursor.into_inner(), self.entries))
    }
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_keep_insertion_order() {
        let mut archive = ArchiveBuilder::new();
        archive.add("b.png", b"bbb").unwrap();
        archive.add("a.png", b"aaa").unwrap();
        let (bytes, names) = archive.finish().unwrap();
        assert_eq!(names, vec!["b.png", "a.png"]);

        let mut read = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read.by_index(0).unwrap().name(), "b.png");
    }
}
