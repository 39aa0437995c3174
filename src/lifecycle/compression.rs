//! Compression of rotated log files
//!
//! Output is written next to the input with `.gz` or `.zip` appended to the
//! full file name. The original is removed only after the archive is complete.

use crate::core::error::{LoggerError, Result};
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionFormat {
    #[serde(alias = "gz")]
    Gzip,
    Zip,
}

impl CompressionFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            CompressionFormat::Gzip => "gz",
            CompressionFormat::Zip => "zip",
        }
    }
}

impl fmt::Display for CompressionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl FromStr for CompressionFormat {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gz" | "gzip" => Ok(CompressionFormat::Gzip),
            "zip" => Ok(CompressionFormat::Zip),
            other => Err(LoggerError::config(
                "compression",
                format!("unsupported compression format '{}', expected gz or zip", other),
            )),
        }
    }
}

/// Compression settings of a file handler
///
/// # Example
///
/// ```
/// use sinklog::lifecycle::{Compression, CompressionFormat};
///
/// let compression = Compression::new(CompressionFormat::Zip)
///     .with_level(6)
///     .unwrap()
///     .with_keep_original(true);
/// assert_eq!(compression.level(), 6);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compression {
    format: CompressionFormat,
    level: u32,
    keep_original: bool,
}

impl Compression {
    pub const DEFAULT_LEVEL: u32 = 9;

    pub fn new(format: CompressionFormat) -> Self {
        Self {
            format,
            level: Self::DEFAULT_LEVEL,
            keep_original: false,
        }
    }

    pub fn gzip() -> Self {
        Self::new(CompressionFormat::Gzip)
    }

    pub fn zip() -> Self {
        Self::new(CompressionFormat::Zip)
    }

    /// Set the compression level (1-9)
    pub fn with_level(mut self, level: u32) -> Result<Self> {
        if !(1..=9).contains(&level) {
            return Err(LoggerError::config(
                "compression",
                format!("level must be 1-9, got {}", level),
            ));
        }
        self.level = level;
        Ok(self)
    }

    #[must_use]
    pub fn with_keep_original(mut self, keep: bool) -> Self {
        self.keep_original = keep;
        self
    }

    pub fn format(&self) -> CompressionFormat {
        self.format
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn keep_original(&self) -> bool {
        self.keep_original
    }

    /// Where `path` is archived to
    pub fn target_path(&self, path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(".");
        name.push(self.format.extension());
        PathBuf::from(name)
    }

    /// Compress `path`, reporting failures on stderr
    ///
    /// Returns the archive path, or `None` when compression failed; the
    /// original is left untouched in that case.
    pub fn compress(&self, path: &Path) -> Option<PathBuf> {
        match self.try_compress(path) {
            Ok(target) => Some(target),
            Err(e) => {
                eprintln!("[LOGGER ERROR] {}", e);
                None
            }
        }
    }

    pub fn try_compress(&self, path: &Path) -> Result<PathBuf> {
        let target = self.target_path(path);
        let temp = {
            let mut name = target.as_os_str().to_owned();
            name.push(".tmp");
            PathBuf::from(name)
        };

        let written = match self.format {
            CompressionFormat::Gzip => self.write_gzip(path, &temp),
            CompressionFormat::Zip => self.write_zip(path, &temp),
        };
        if let Err(e) = written {
            let _ = fs::remove_file(&temp);
            return Err(LoggerError::compression(path.display().to_string(), e.to_string()));
        }

        // Only replace the final archive once the temp file is complete
        fs::rename(&temp, &target).map_err(|e| {
            let _ = fs::remove_file(&temp);
            LoggerError::compression(
                path.display().to_string(),
                format!("failed to move archive into place: {}", e),
            )
        })?;

        if !self.keep_original {
            if let Err(e) = fs::remove_file(path) {
                eprintln!(
                    "[LOGGER WARNING] Compressed {} but failed to remove the original: {}. \
                     Both versions exist.",
                    path.display(),
                    e
                );
            }
        }

        Ok(target)
    }

    fn write_gzip(&self, source: &Path, temp: &Path) -> Result<()> {
        let mut reader = BufReader::with_capacity(CHUNK_SIZE, File::open(source)?);
        let output = BufWriter::with_capacity(CHUNK_SIZE, File::create(temp)?);
        let mut encoder = GzEncoder::new(output, flate2::Compression::new(self.level));

        stream(&mut reader, &mut encoder)?;
        encoder.finish()?.flush()?;
        Ok(())
    }

    fn write_zip(&self, source: &Path, temp: &Path) -> Result<()> {
        let entry_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| LoggerError::other("cannot archive a path without a file name"))?;

        let mut reader = BufReader::with_capacity(CHUNK_SIZE, File::open(source)?);
        let output = BufWriter::with_capacity(CHUNK_SIZE, File::create(temp)?);
        let mut archive = zip::ZipWriter::new(output);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .compression_level(Some(i64::from(self.level)));

        archive.start_file(entry_name, options)?;
        stream(&mut reader, &mut archive)?;
        archive.finish()?.flush()?;
        Ok(())
    }
}

impl Default for Compression {
    fn default() -> Self {
        Self::gzip()
    }
}

impl FromStr for Compression {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        s.parse::<CompressionFormat>().map(Compression::new)
    }
}

/// Copy in fixed-size chunks so large files never sit in memory
fn stream<R: Read, W: Write>(reader: &mut R, writer: &mut W) -> io::Result<()> {
    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            return Ok(());
        }
        writer.write_all(&buffer[..bytes_read])?;
    }
}
