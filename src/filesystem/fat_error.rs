//! Error types for FAT32 image traversal.
//!
//! This module defines the errors raised while parsing the boot sector, following
//! cluster chains in the File Allocation Table and matching directory entries.

use std::io;
use thiserror::Error;

/// Errors that can occur while reading a FAT32 image.
#[derive(Error, Debug)]
pub enum FATError {
    /// The boot sector could not be read or holds unusable geometry.
    #[error("Malformed image: {0}")]
    MalformedImage(String),

    /// The first three bytes of a FAT volume must contain a valid x86 jump instruction.
    #[error("Invalid jump instruction `{0}`")]
    InvalidJmp(String),

    /// Bytes per sector must be 512, 1024, 2048 or 4096.
    #[error("Invalid count of bytes per sector: `{0}`. Legal values: 512, 1024, 2048 or 4096")]
    InvalidBytesPerSec(u16),

    /// Sectors per cluster must be a power of 2: 1, 2, 4, 8, 16, 32, 64, or 128.
    #[error(
        "Invalid number of sector per cluster: `{0}`. Legal values: 1, 2, 4, 8, 16, 32, 64, 128"
    )]
    InvalidSecPerClus(u8),

    /// Total cluster size (bytes per sector × sectors per cluster) must not exceed 32 KiB.
    #[error("Invalid cluster size: `{0}`. Any value greater than 32K is invalid.")]
    InvalidClusSz(u32),

    /// The count of reserved sectors must be greater than 0.
    #[error("Invalid count of reserved sectors: `{0}`. Any value greater than 0 is valid.")]
    InvalidRsvdSecCnt(u16),

    #[error("Invalid number of FATs on this volume: `{0}`.")]
    InvalidNumFat(u8),

    /// The root directory of a FAT32 volume lives in the data region, so this count must be 0.
    #[error(
        "Invalid count of directory entries in the root directory: `{0}`. It should be 0 for a FAT32 volume."
    )]
    InvalidRootEntCnt(u16),

    #[error("Invalid FAT size: `{0}`")]
    InvalidFatSz(String),

    /// Clusters 0 and 1 are reserved, and the data area starts at cluster 2.
    #[error(
        "Invalid cluster number of the first cluster of the root directory: `{0}`. This value should be at least 2."
    )]
    InvalidRootClus(u32),

    #[error("Invalid boot sector signature: `{0}`. Expected signature: 0x55AA")]
    InvalidSignature(String),

    /// A reserved cluster number (0 or 1) was used as a data cluster.
    #[error("Cluster `{0}` is not an addressable data cluster")]
    InvalidCluster(u32),

    /// The cluster chain ended, looped or could not be read before the declared size was reached.
    #[error("Corrupt cluster chain at cluster {cluster}: {written} bytes recovered before the chain broke")]
    CorruptChain { cluster: u32, written: u64 },

    /// An 8.3 name field overflowed (8 bytes of base name, 3 bytes of extension).
    #[error("Name too long: `{0}`. A short name holds max 8 characters and max 3 for the extension.")]
    NameTooLong(String),

    /// No visible directory entry matches the queried name.
    #[error("File not found: `{0}`")]
    NotFound(String),

    /// Underlying I/O errors that occur while reading the image.
    #[error("IO Error: `{0}`")]
    IOError(io::Error),

    /// Parsing error occured during structure initialization
    #[error("BinRead Error: `{0}`")]
    BinReadError(binread::Error),
}

/// Converts standard I/O errors into FATError.
impl From<io::Error> for FATError {
    fn from(err: io::Error) -> Self {
        FATError::IOError(err)
    }
}

/// Converts BinRead errors into FATError.
impl From<binread::Error> for FATError {
    fn from(err: binread::Error) -> Self {
        FATError::BinReadError(err)
    }
}
