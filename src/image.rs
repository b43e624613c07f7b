//! Binary image format.
//!
//! An image is a raw run of 16-bit words: no header, no length prefix, no
//! magic number. Words are stored two bytes each in a fixed byte order and
//! are placed in memory in file order.

use log::{info, warn};
use serde::{Serialize, Deserialize};
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Byte order of the words in an image file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ByteOrder {
    /// Low byte first. This is what a little-endian host writes when it dumps
    /// a `u16` array straight to disk.
    #[default]
    Little,
    /// High byte first.
    Big,
}

impl ByteOrder {
    fn word(self, pair: [u8; 2]) -> u16 {
        match self {
            ByteOrder::Little => u16::from_le_bytes(pair),
            ByteOrder::Big => u16::from_be_bytes(pair),
        }
    }
}

impl FromStr for ByteOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "little" | "le" => Ok(ByteOrder::Little),
            "big" | "be" => Ok(ByteOrder::Big),
            other => Err(format!("unknown byte order '{}' (expected 'little' or 'big')", other)),
        }
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteOrder::Little => write!(f, "little"),
            ByteOrder::Big => write!(f, "big"),
        }
    }
}

/// A decoded image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Image {
    /// The words, in file order.
    pub words: Vec<u16>,
}

impl Image {
    /// Pair up `bytes` into words. A trailing odd byte is dropped.
    pub fn from_bytes(bytes: &[u8], order: ByteOrder) -> Self {
        let chunks = bytes.chunks_exact(2);
        if !chunks.remainder().is_empty() {
            warn!("image has an odd number of bytes; ignoring the trailing byte");
        }
        let words = chunks.map(|pair| order.word([pair[0], pair[1]])).collect();
        Self { words }
    }

    /// Get the number of words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Read an image file from disk.
pub fn load_image<P: AsRef<Path>>(path: P, order: ByteOrder) -> Result<Image, ImageError> {
    let path = path.as_ref();
    let mut file = std::fs::File::open(path).map_err(|source| ImageError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|source| ImageError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let image = Image::from_bytes(&bytes, order);
    info!("read {} words from {} ({} endian)", image.len(), path.display(), order);
    Ok(image)
}

/// Errors that can occur while reading an image.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("cannot open file {}: {source}", path.display())]
    Open { path: PathBuf, source: std::io::Error },

    #[error("cannot read file {}: {source}", path.display())]
    Read { path: PathBuf, source: std::io::Error },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes_little_endian() {
        let image = Image::from_bytes(&[0x26, 0xF0, 0x25, 0xF0], ByteOrder::Little);
        assert_eq!(image.words, vec![0xF026, 0xF025]);
    }

    #[test]
    fn test_from_bytes_big_endian() {
        let image = Image::from_bytes(&[0xF0, 0x26, 0xF0, 0x25], ByteOrder::Big);
        assert_eq!(image.words, vec![0xF026, 0xF025]);
    }

    #[test]
    fn test_from_bytes_drops_odd_byte() {
        let image = Image::from_bytes(&[0x25, 0xF0, 0x99], ByteOrder::Little);
        assert_eq!(image.words, vec![0xF025]);
        assert!(Image::from_bytes(&[], ByteOrder::Little).is_empty());
    }

    #[test]
    fn test_byte_order_parse() {
        assert_eq!("little".parse::<ByteOrder>().unwrap(), ByteOrder::Little);
        assert_eq!("BE".parse::<ByteOrder>().unwrap(), ByteOrder::Big);
        assert!("middle".parse::<ByteOrder>().is_err());
        assert_eq!(ByteOrder::default(), ByteOrder::Little);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_image("/nonexistent/image.obj", ByteOrder::Little).unwrap_err();
        assert!(matches!(err, ImageError::Open { .. }));
        assert!(err.to_string().contains("/nonexistent/image.obj"));
    }

    #[test]
    fn test_load_from_disk() {
        let path = std::env::temp_dir().join(format!("lc3-image-{}.obj", std::process::id()));
        std::fs::write(&path, [0x25u8, 0xF0]).unwrap();

        let image = load_image(&path, ByteOrder::Little).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(image.words, vec![0xF025]);
    }
}
