//! In-memory PPTX (ZIP) package.

use pptx_translate_core::{Error, Result, XmlDocument};
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// ZIP local file header magic.
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Part every presentation package carries.
pub const PRESENTATION_PART: &str = "ppt/presentation.xml";

#[derive(Debug, Clone)]
struct PackageEntry {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
    is_dir: bool,
}

/// All entries of a PPTX archive, kept in their original order.
#[derive(Debug, Clone)]
pub struct PptxPackage {
    entries: Vec<PackageEntry>,
}

impl PptxPackage {
    /// Open a PPTX file from disk.
    pub fn open(path: &Path) -> Result<Self> {
        let mut bytes = Vec::new();
        File::open(path)?.read_to_end(&mut bytes)?;
        Self::from_bytes(bytes)
    }

    /// Read a package from raw bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if !bytes.starts_with(&ZIP_MAGIC) {
            return Err(Error::UnsupportedFormat(
                "not a PPTX file (missing ZIP signature)".to_string(),
            ));
        }
        Self::from_reader(Cursor::new(bytes))
    }

    /// Read a package from any seekable reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut file = archive
                .by_index(index)
                .map_err(|e| Error::ZipError(format!("Failed to read entry {}: {}", index, e)))?;

            let mut data = Vec::new();
            file.read_to_end(&mut data)
                .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", file.name(), e)))?;

            entries.push(PackageEntry {
                name: file.name().to_string(),
                data,
                compression: file.compression(),
                is_dir: file.is_dir(),
            });
        }

        let package = Self { entries };
        if !package.contains(PRESENTATION_PART) {
            return Err(Error::CorruptedFile(format!(
                "package has no {}",
                PRESENTATION_PART
            )));
        }

        log::debug!("Opened package with {} entries", package.entries.len());
        Ok(package)
    }

    /// Whether the package has an entry with this name.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Position of an entry in the archive.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }

    /// Entry names in archive order.
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Read an entry as UTF-8 text.
    pub fn read_string(&self, name: &str) -> Result<String> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| Error::ZipError(format!("File not found in archive '{}'", name)))?;

        let text = std::str::from_utf8(&entry.data)
            .map_err(|e| Error::CorruptedFile(format!("'{}' is not UTF-8: {}", name, e)))?;
        Ok(text.trim_start_matches('\u{FEFF}').to_string())
    }

    /// Read and parse an XML part.
    pub fn read_xml(&self, name: &str) -> Result<XmlDocument> {
        let content = self.read_string(name)?;
        XmlDocument::parse(&content).map_err(|e| match e {
            Error::XmlError(msg) => Error::XmlError(format!("{}: {}", name, msg)),
            other => other,
        })
    }

    /// Replace the content of an existing part with a serialized document.
    pub fn write_xml(&mut self, name: &str, document: &XmlDocument) -> Result<()> {
        let xml = document.to_xml_string()?;
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.name == name)
            .ok_or_else(|| Error::ZipError(format!("File not found in archive '{}'", name)))?;
        entry.data = xml.into_bytes();
        Ok(())
    }

    /// Write the package as a ZIP archive, keeping entry order and compression.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W> {
        let mut zip = ZipWriter::new(writer);

        for entry in &self.entries {
            let method = match entry.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let options = FileOptions::default().compression_method(method);

            if entry.is_dir {
                zip.add_directory(entry.name.as_str(), options)
                    .map_err(|e| Error::ZipError(format!("Failed to add '{}': {}", entry.name, e)))?;
                continue;
            }

            zip.start_file(entry.name.as_str(), options)
                .map_err(|e| Error::ZipError(format!("Failed to add '{}': {}", entry.name, e)))?;
            zip.write_all(&entry.data)?;
        }

        zip.finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish archive: {}", e)))
    }

    /// Serialize the package into memory.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.write_to(Cursor::new(Vec::new()))?.into_inner())
    }

    /// Save the package to disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        File::create(path)?.write_all(&bytes)?;
        log::info!("Saved {}", path.display());
        Ok(())
    }
}
