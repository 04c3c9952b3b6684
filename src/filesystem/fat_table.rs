//! File Allocation Table lookups.
//!
//! Each FAT32 entry is a 32-bit little-endian value whose top 4 bits are reserved.
//! After masking, a value links to the next cluster of the chain or is one of the
//! markers below.

use log::debug;
use std::io::{Read, Seek};

use super::fat_error::FATError;
use super::geometry::{BootSectorInfo, FAT_ENTRY_SIZE, FIRST_DATA_CLUSTER};
use crate::utils::{read_at, u32_at};

/// Mask clearing the 4 reserved high bits of a FAT32 entry.
pub const FAT32_ENTRY_MASK: u32 = 0x0FFF_FFFF;
/// Smallest masked value marking the end of a chain.
pub const END_OF_CHAIN: u32 = 0x0FFF_FFF8;
/// Masked value marking a bad cluster.
pub const BAD_CLUSTER: u32 = 0x0FFF_FFF7;

/// Decoded value of a FAT entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatEntry {
    /// The cluster is not allocated.
    Free,
    /// The chain continues at this cluster.
    Next(u32),
    /// Last cluster of the chain.
    EndOfChain,
    /// The cluster is marked as unusable.
    Bad,
    /// A reserved value that cannot appear inside a chain.
    Reserved(u32),
}

impl FatEntry {
    /// Decodes a raw FAT32 entry, ignoring its 4 reserved high bits.
    pub fn from_raw(raw: u32) -> Self {
        match raw & FAT32_ENTRY_MASK {
            0 => FatEntry::Free,
            1 => FatEntry::Reserved(1),
            BAD_CLUSTER => FatEntry::Bad,
            value if value >= END_OF_CHAIN => FatEntry::EndOfChain,
            value if value >= 0x0FFF_FFF0 => FatEntry::Reserved(value),
            value => FatEntry::Next(value),
        }
    }
}

/// Walks cluster chains through the first FAT of a volume.
#[derive(Debug, Clone, Copy)]
pub struct FatTable {
    geometry: BootSectorInfo,
}

impl FatTable {
    pub fn new(geometry: BootSectorInfo) -> Self {
        Self { geometry }
    }

    /// Reads the FAT entry of `cluster`.
    ///
    /// # Errors
    /// - `FATError::InvalidCluster` for clusters 0 and 1
    /// - `FATError::CorruptChain` if the cluster lies beyond the FAT or the entry
    ///   cannot be read in full (truncated image)
    pub fn next_cluster<R: Read + Seek>(
        &self,
        reader: &mut R,
        cluster: u32,
    ) -> Result<FatEntry, FATError> {
        if cluster < FIRST_DATA_CLUSTER {
            return Err(FATError::InvalidCluster(cluster));
        }
        if cluster as u64 >= self.geometry.fat_entry_count() {
            return Err(FATError::CorruptChain {
                cluster,
                written: 0,
            });
        }

        let mut buf = [0u8; FAT_ENTRY_SIZE as usize];
        read_at(reader, self.geometry.fat_entry_address(cluster), &mut buf).map_err(|err| {
            debug!("FAT entry of cluster {cluster} unreadable: {err}");
            FATError::CorruptChain {
                cluster,
                written: 0,
            }
        })?;

        let entry = FatEntry::from_raw(u32_at(&buf, 0));
        debug!("FAT[{cluster}] = {entry:?}");
        Ok(entry)
    }

    /// Lists every cluster of the chain starting at `first_cluster`, in chain order.
    ///
    /// # Errors
    /// Returns `FATError::CorruptChain` if the chain links to a free, bad, reserved or
    /// out-of-range cluster, or is longer than the FAT itself (a loop).
    pub fn chain<R: Read + Seek>(
        &self,
        reader: &mut R,
        first_cluster: u32,
    ) -> Result<Vec<u32>, FATError> {
        if first_cluster < FIRST_DATA_CLUSTER {
            return Err(FATError::InvalidCluster(first_cluster));
        }

        let max_len = self.geometry.fat_entry_count();
        let mut clusters = vec![];
        let mut cluster = first_cluster;

        loop {
            clusters.push(cluster);
            if clusters.len() as u64 > max_len {
                return Err(FATError::CorruptChain {
                    cluster,
                    written: 0,
                });
            }

            match self.next_cluster(reader, cluster)? {
                FatEntry::EndOfChain => return Ok(clusters),
                FatEntry::Next(next) if next >= FIRST_DATA_CLUSTER => cluster = next,
                _ => {
                    return Err(FATError::CorruptChain {
                        cluster,
                        written: 0,
                    });
                }
            }
        }
    }
}
