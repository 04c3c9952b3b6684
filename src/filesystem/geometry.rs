//! Volume geometry and address arithmetic.
//!
//! [`BootSectorInfo`] keeps the handful of boot sector parameters needed to translate
//! cluster numbers into byte offsets inside the image:
//!
//! ```text
//! | reserved (rsvd_sec_cnt) | FAT #0 .. FAT #n-1 (fat_sz each) | data: cluster 2, 3, ... |
//! ```

use getset::CopyGetters;
use std::fmt;

use super::fat_error::FATError;

/// Size in bytes of one FAT32 allocation table entry.
pub const FAT_ENTRY_SIZE: u64 = 4;

/// First cluster number of the data region.
pub const FIRST_DATA_CLUSTER: u32 = 2;

/// Geometry parameters parsed from the boot sector.
///
/// Immutable once the image is open. `bytes_per_sec` and `sec_per_clus` are never zero:
/// [`BootSector::from`](super::boot_sector::BootSector::from) rejects such images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct BootSectorInfo {
    bytes_per_sec: u16,
    sec_per_clus: u8,
    rsvd_sec_cnt: u16,
    num_fat: u8,
    /// Sectors per FAT.
    fat_sz: u32,
    /// First cluster of the root directory.
    root_clus: u32,
}

impl BootSectorInfo {
    pub fn new(
        bytes_per_sec: u16,
        sec_per_clus: u8,
        rsvd_sec_cnt: u16,
        num_fat: u8,
        fat_sz: u32,
        root_clus: u32,
    ) -> Self {
        Self {
            bytes_per_sec,
            sec_per_clus,
            rsvd_sec_cnt,
            num_fat,
            fat_sz,
            root_clus,
        }
    }

    /// Size in bytes of one cluster.
    pub fn cluster_size(&self) -> u64 {
        self.bytes_per_sec as u64 * self.sec_per_clus as u64
    }

    /// Byte offset of the first FAT.
    pub fn fat_start(&self) -> u64 {
        self.bytes_per_sec as u64 * self.rsvd_sec_cnt as u64
    }

    /// Byte offset of the data region, i.e. of cluster 2.
    pub fn data_start(&self) -> u64 {
        self.fat_start() + self.num_fat as u64 * self.fat_sz as u64 * self.bytes_per_sec as u64
    }

    /// Number of entries a single FAT can hold.
    pub fn fat_entry_count(&self) -> u64 {
        self.fat_sz as u64 * self.bytes_per_sec as u64 / FAT_ENTRY_SIZE
    }

    /// Converts a data cluster number to the absolute byte offset of its first byte.
    ///
    /// # Errors
    /// Returns `FATError::InvalidCluster` for the reserved clusters 0 and 1.
    pub fn cluster_to_offset(&self, cluster: u32) -> Result<u64, FATError> {
        if cluster < FIRST_DATA_CLUSTER {
            return Err(FATError::InvalidCluster(cluster));
        }

        Ok((cluster - FIRST_DATA_CLUSTER) as u64 * self.cluster_size() + self.data_start())
    }

    /// Returns the absolute byte offset of a cluster's entry in the first FAT.
    pub fn fat_entry_address(&self, cluster: u32) -> u64 {
        self.fat_start() + cluster as u64 * FAT_ENTRY_SIZE
    }
}

impl fmt::Display for BootSectorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  {:<20} {}", "bytes_per_sec", self.bytes_per_sec)?;
        writeln!(f, "  {:<20} {}", "sec_per_clus", self.sec_per_clus)?;
        writeln!(f, "  {:<20} {}", "rsvd_sec_cnt", self.rsvd_sec_cnt)?;
        writeln!(f, "  {:<20} {}", "num_fat", self.num_fat)?;
        writeln!(f, "  {:<20} {}", "fat_sz", self.fat_sz)
    }
}
