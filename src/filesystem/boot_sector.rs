//! FAT32 boot sector record.
//!
//! The boot sector is parsed in full so that `bpb` can show every field, but the
//! navigator itself only needs the handful projected by [`BootSector::info`].

use binread::{BinRead, BinReaderExt};
use std::fmt;
use std::io;

use super::fat_error::FATError;
use super::geometry::BootSectorInfo;
use crate::utils;

/// Size in bytes of the boot sector record, independently of the sector size.
pub const BOOT_SECTOR_SIZE: usize = 512;

const SIGNATURE: [u8; 2] = [0x55, 0xAA];
const MAX_CLUSTER_SIZE: u64 = 32 * 1024;

/// Raw FAT32 boot sector, in on-disk order.
#[derive(BinRead, Debug)]
#[br(little)]
pub struct BootSector {
    jmp: [u8; 3],
    oem_name: [u8; 8],

    // 0x0B: BIOS parameter block shared with FAT12/16
    bytes_per_sec: u16,
    sec_per_clus: u8,
    rsvd_sec_cnt: u16,
    num_fat: u8,
    root_ent_cnt: u16,
    tot_sec_16: u16,
    media: u8,
    fat_sz_16: u16,
    sec_per_trk: u16,
    num_heads: u16,
    hidd_sec: u32,
    tot_sec_32: u32,

    // 0x24: FAT32 extension
    fat_sz_32: u32,
    ext_flags: u16,
    fs_ver: u16,
    root_clus: u32,
    fs_info: u16,
    bk_boot_sec: u16,
    reserved: [u8; 12],
    drv_num: u8,
    reserved_1: u8,
    boot_sig: u8,
    vol_id: u32,
    vol_lab: [u8; 11],
    fil_sys_type: [u8; 8],

    #[br(count = 420)]
    boot_code: Vec<u8>,
    sig: [u8; 2],
}

impl BootSector {
    /// Reads the boot sector at the start of `reader`, running the FAT32 checks when
    /// `validate` is set.
    ///
    /// # Errors
    /// - `FATError::MalformedImage` if the image is shorter than a boot sector, or if
    ///   bytes per sector or sectors per cluster is zero (checked even without `validate`)
    /// - The `Invalid*` variants when `validate` is set and a check fails
    pub fn from<T: io::Read + io::Seek>(reader: &mut T, validate: bool) -> Result<Self, FATError> {
        let mut buf = vec![0; BOOT_SECTOR_SIZE];
        utils::read_at(reader, 0, &mut buf).map_err(|err| {
            FATError::MalformedImage(format!("boot sector unreadable: {err}"))
        })?;
        let boot_sector: BootSector = io::Cursor::new(buf).read_le()?;

        let zero_field = if boot_sector.bytes_per_sec == 0 {
            Some("bytes per sector")
        } else if boot_sector.sec_per_clus == 0 {
            Some("sectors per cluster")
        } else {
            None
        };
        if let Some(field) = zero_field {
            return Err(FATError::MalformedImage(format!("{field} is zero")));
        }

        if validate {
            boot_sector.validate()?;
        }
        Ok(boot_sector)
    }

    /// Returns the geometry parameters the navigator computes addresses from.
    pub fn info(&self) -> BootSectorInfo {
        BootSectorInfo::new(
            self.bytes_per_sec,
            self.sec_per_clus,
            self.rsvd_sec_cnt,
            self.num_fat,
            self.fat_sz_32,
            self.root_clus,
        )
    }

    /// Returns the volume label with its space padding removed.
    pub fn volume_label(&self) -> String {
        String::from_utf8_lossy(&self.vol_lab).trim_end().to_string()
    }

    /// Checks the fields a FAT32 volume must agree on, first failure wins.
    fn validate(&self) -> Result<(), FATError> {
        if !matches!(self.jmp, [0xEB, _, 0x90] | [0xE9, _, _]) {
            return Err(FATError::InvalidJmp(format!("{:02X?}", self.jmp)));
        }
        if !(self.bytes_per_sec.is_power_of_two() && (512..=4096).contains(&self.bytes_per_sec)) {
            return Err(FATError::InvalidBytesPerSec(self.bytes_per_sec));
        }
        // Every power of two a u8 can hold is a legal value.
        if !self.sec_per_clus.is_power_of_two() {
            return Err(FATError::InvalidSecPerClus(self.sec_per_clus));
        }
        let cluster_size = self.info().cluster_size();
        if cluster_size > MAX_CLUSTER_SIZE {
            return Err(FATError::InvalidClusSz(cluster_size as u32));
        }
        if self.sig != SIGNATURE {
            return Err(FATError::InvalidSignature(format!("{:02X?}", self.sig)));
        }

        match self {
            BootSector { rsvd_sec_cnt: 0, .. } => Err(FATError::InvalidRsvdSecCnt(0)),
            BootSector { num_fat: 0, .. } => Err(FATError::InvalidNumFat(0)),
            BootSector { root_ent_cnt, .. } if *root_ent_cnt != 0 => {
                Err(FATError::InvalidRootEntCnt(*root_ent_cnt))
            }
            BootSector { fat_sz_16, .. } if *fat_sz_16 != 0 => Err(FATError::InvalidFatSz(
                format!("16-bit FAT size is {fat_sz_16}, expected 0 on FAT32"),
            )),
            BootSector { fat_sz_32: 0, .. } => Err(FATError::InvalidFatSz(String::from(
                "32-bit FAT size is 0",
            ))),
            BootSector { root_clus, .. } if *root_clus < 2 => {
                Err(FATError::InvalidRootClus(*root_clus))
            }
            _ => Ok(()),
        }
    }

    /// `(offset, name, value)` for every field, in on-disk order.
    fn rows(&self) -> Vec<(usize, &'static str, String)> {
        let text = |bytes: &[u8]| String::from_utf8_lossy(bytes).into_owned();
        vec![
            (0x00, "jmp", format!("{:02X?}", self.jmp)),
            (0x03, "oem_name", text(&self.oem_name)),
            (0x0B, "bytes_per_sec", self.bytes_per_sec.to_string()),
            (0x0D, "sec_per_clus", self.sec_per_clus.to_string()),
            (0x0E, "rsvd_sec_cnt", self.rsvd_sec_cnt.to_string()),
            (0x10, "num_fat", self.num_fat.to_string()),
            (0x11, "root_ent_cnt", self.root_ent_cnt.to_string()),
            (0x13, "tot_sec_16", self.tot_sec_16.to_string()),
            (0x15, "media", format!("{:#04X}", self.media)),
            (0x16, "fat_sz_16", self.fat_sz_16.to_string()),
            (0x18, "sec_per_trk", self.sec_per_trk.to_string()),
            (0x1A, "num_heads", self.num_heads.to_string()),
            (0x1C, "hidd_sec", self.hidd_sec.to_string()),
            (0x20, "tot_sec_32", self.tot_sec_32.to_string()),
            (0x24, "fat_sz_32", self.fat_sz_32.to_string()),
            (0x28, "ext_flags", format!("{:#06X}", self.ext_flags)),
            (0x2A, "fs_ver", format!("{}.{}", self.fs_ver >> 8, self.fs_ver & 0xFF)),
            (0x2C, "root_clus", self.root_clus.to_string()),
            (0x30, "fs_info", self.fs_info.to_string()),
            (0x32, "bk_boot_sec", self.bk_boot_sec.to_string()),
            (0x34, "reserved", format!("{:02X?}", self.reserved)),
            (0x40, "drv_num", format!("{:#04X}", self.drv_num)),
            (0x41, "reserved_1", self.reserved_1.to_string()),
            (0x42, "boot_sig", format!("{:#04X}", self.boot_sig)),
            (0x43, "vol_id", format!("{:08X}", self.vol_id)),
            (0x47, "vol_lab", text(&self.vol_lab)),
            (0x52, "fil_sys_type", text(&self.fil_sys_type)),
            (0x5A, "boot_code", format!("{} bytes", self.boot_code.len())),
            (0x1FE, "sig", format!("{:02X?}", self.sig)),
        ]
    }
}

impl fmt::Display for BootSector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Boot sector:")?;
        for (offset, name, value) in self.rows() {
            writeln!(f, "  {offset:#06X}  {name:<14} {value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_image::ImageBuilder;
    use std::io::Cursor;

    #[test]
    fn parses_geometry_fields_at_fixed_offsets() {
        let image = ImageBuilder::new(1).build();
        let bs = BootSector::from(&mut Cursor::new(image), true).unwrap();
        let info = bs.info();

        assert_eq!(info.bytes_per_sec(), 512);
        assert_eq!(info.sec_per_clus(), 1);
        assert_eq!(info.rsvd_sec_cnt(), 32);
        assert_eq!(info.num_fat(), 2);
        assert_eq!(info.fat_sz(), ImageBuilder::FAT_SZ);
        assert_eq!(info.root_clus(), 2);
        assert_eq!(bs.volume_label(), "NAVTEST");
    }

    #[test]
    fn zero_bytes_per_sector_is_malformed_even_unvalidated() {
        let mut image = ImageBuilder::new(1).build();
        image[11] = 0;
        image[12] = 0;

        let err = BootSector::from(&mut Cursor::new(image), false).unwrap_err();
        assert!(matches!(err, FATError::MalformedImage(_)));
    }

    #[test]
    fn zero_sectors_per_cluster_is_malformed() {
        let mut image = ImageBuilder::new(1).build();
        image[13] = 0;

        let err = BootSector::from(&mut Cursor::new(image), false).unwrap_err();
        assert!(matches!(err, FATError::MalformedImage(_)));
    }

    #[test]
    fn truncated_image_is_malformed() {
        let image = ImageBuilder::new(1).build();
        let err = BootSector::from(&mut Cursor::new(image[..100].to_vec()), false).unwrap_err();
        assert!(matches!(err, FATError::MalformedImage(_)));
    }

    #[test]
    fn bad_signature_only_rejected_when_validating() {
        let mut image = ImageBuilder::new(1).build();
        image[510] = 0;

        let err = BootSector::from(&mut Cursor::new(image.clone()), true).unwrap_err();
        assert!(matches!(err, FATError::InvalidSignature(_)));
        assert!(BootSector::from(&mut Cursor::new(image), false).is_ok());
    }

    #[test]
    fn odd_sectors_per_cluster_rejected_when_validating() {
        let mut image = ImageBuilder::new(1).build();
        image[13] = 3;

        let err = BootSector::from(&mut Cursor::new(image), true).unwrap_err();
        assert!(matches!(err, FATError::InvalidSecPerClus(3)));
    }

    #[test]
    fn dump_lists_fields_with_offsets() {
        let image = ImageBuilder::new(1).build();
        let bs = BootSector::from(&mut Cursor::new(image), true).unwrap();
        let dump = bs.to_string();

        assert_eq!(dump.lines().count(), 30);
        assert!(dump.contains("  0x000B  bytes_per_sec  512\n"));
        assert!(dump.contains("  0x0024  fat_sz_32      8\n"));
        assert!(dump.contains("  0x01FE  sig            [55, AA]\n"));
    }
}
