//! In-memory FAT32 images for tests.

use crate::filesystem::dir_entry::{ATTR_ARCHIVE, ATTR_DIRECTORY};
use crate::filesystem::geometry::BootSectorInfo;

/// Builds a small FAT32 image: 512-byte sectors, 32 reserved sectors, 2 FATs and
/// the root directory in cluster 2.
pub struct ImageBuilder {
    sec_per_clus: u8,
    image: Vec<u8>,
}

impl ImageBuilder {
    pub const BYTES_PER_SEC: u16 = 512;
    pub const RSVD_SEC_CNT: u16 = 32;
    pub const NUM_FAT: u8 = 2;
    pub const FAT_SZ: u32 = 8;
    pub const DATA_CLUSTERS: u32 = 64;

    pub fn new(sec_per_clus: u8) -> Self {
        let tot_sec = Self::RSVD_SEC_CNT as u32
            + Self::NUM_FAT as u32 * Self::FAT_SZ
            + Self::DATA_CLUSTERS * sec_per_clus as u32;
        let mut image = vec![0u8; tot_sec as usize * Self::BYTES_PER_SEC as usize];

        image[0..3].copy_from_slice(&[0xEB, 0x58, 0x90]);
        image[3..11].copy_from_slice(b"MSWIN4.1");
        image[11..13].copy_from_slice(&Self::BYTES_PER_SEC.to_le_bytes());
        image[13] = sec_per_clus;
        image[14..16].copy_from_slice(&Self::RSVD_SEC_CNT.to_le_bytes());
        image[16] = Self::NUM_FAT;
        image[21] = 0xF8;
        image[32..36].copy_from_slice(&tot_sec.to_le_bytes());
        image[36..40].copy_from_slice(&Self::FAT_SZ.to_le_bytes());
        image[44..48].copy_from_slice(&2u32.to_le_bytes());
        image[66] = 0x29;
        image[71..82].copy_from_slice(b"NAVTEST    ");
        image[82..90].copy_from_slice(b"FAT32   ");
        image[510] = 0x55;
        image[511] = 0xAA;

        let mut builder = Self {
            sec_per_clus,
            image,
        };
        builder.fat(0, 0x0FFF_FFF8).fat(1, 0x0FFF_FFFF).fat(2, 0x0FFF_FFFF);
        builder
    }

    pub fn geometry(&self) -> BootSectorInfo {
        BootSectorInfo::new(
            Self::BYTES_PER_SEC,
            self.sec_per_clus,
            Self::RSVD_SEC_CNT,
            Self::NUM_FAT,
            Self::FAT_SZ,
            2,
        )
    }

    /// Sets the raw value of a cluster's entry in every FAT.
    pub fn fat(&mut self, cluster: u32, value: u32) -> &mut Self {
        let geo = self.geometry();
        for i in 0..Self::NUM_FAT as u64 {
            let off = (geo.fat_entry_address(cluster)
                + i * Self::FAT_SZ as u64 * Self::BYTES_PER_SEC as u64) as usize;
            self.image[off..off + 4].copy_from_slice(&value.to_le_bytes());
        }
        self
    }

    /// Links `clusters` into one chain terminated by an end-of-chain marker.
    pub fn link(&mut self, clusters: &[u32]) -> &mut Self {
        for pair in clusters.windows(2) {
            self.fat(pair[0], pair[1]);
        }
        if let Some(last) = clusters.last() {
            self.fat(*last, 0x0FFF_FFFF);
        }
        self
    }

    /// Copies `bytes` into the data region, starting `offset` bytes into `cluster`.
    pub fn data(&mut self, cluster: u32, offset: usize, bytes: &[u8]) -> &mut Self {
        let start = self.geometry().cluster_to_offset(cluster).unwrap() as usize + offset;
        self.image[start..start + bytes.len()].copy_from_slice(bytes);
        self
    }

    /// Writes a raw 32-byte directory record in slot `slot` of directory cluster `dir_cluster`.
    pub fn entry(
        &mut self,
        dir_cluster: u32,
        slot: usize,
        name: &[u8; 11],
        attr: u8,
        first_cluster: u32,
        size: u32,
    ) -> &mut Self {
        let mut record = [0u8; 32];
        record[0..11].copy_from_slice(name);
        record[11] = attr;
        record[20..22].copy_from_slice(&((first_cluster >> 16) as u16).to_le_bytes());
        record[26..28].copy_from_slice(&(first_cluster as u16).to_le_bytes());
        record[28..32].copy_from_slice(&size.to_le_bytes());
        self.data(dir_cluster, slot * 32, &record)
    }

    /// Stores a regular file: spreads `content` over `clusters`, chains them and adds
    /// an archive entry in `dir_cluster`.
    pub fn file(
        &mut self,
        dir_cluster: u32,
        slot: usize,
        name: &[u8; 11],
        clusters: &[u32],
        content: &[u8],
    ) -> &mut Self {
        let cluster_size = self.geometry().cluster_size() as usize;
        for (chunk, cluster) in content.chunks(cluster_size).zip(clusters) {
            self.data(*cluster, 0, chunk);
        }
        self.link(clusters);
        let first = clusters.first().copied().unwrap_or(0);
        self.entry(dir_cluster, slot, name, ATTR_ARCHIVE, first, content.len() as u32)
    }

    /// Adds a subdirectory entry and the `.` and `..` records of the new directory.
    pub fn dir(&mut self, parent: u32, slot: usize, name: &[u8; 11], cluster: u32) -> &mut Self {
        let parent_ref = if parent == 2 { 0 } else { parent };
        self.link(&[cluster])
            .entry(parent, slot, name, ATTR_DIRECTORY, cluster, 0)
            .entry(cluster, 0, b".          ", ATTR_DIRECTORY, cluster, 0)
            .entry(cluster, 1, b"..         ", ATTR_DIRECTORY, parent_ref, 0)
    }

    pub fn build(&self) -> Vec<u8> {
        self.image.clone()
    }
}

/// Deterministic non-repeating content of `len` bytes.
pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 + i / 251) as u8).collect()
}
