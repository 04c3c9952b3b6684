//! FAT32 on-disk structures and the traversal engine built on them.
//!
//! - [`boot_sector`] and [`geometry`]: boot sector parsing and address arithmetic
//! - [`fat_table`]: following cluster chains through the FAT
//! - [`dir_entry`]: 32-byte directory records and 8.3 name matching
//! - [`directory`]: the currently loaded directory
//! - [`extract`]: reading file content across cluster boundaries

pub mod boot_sector;
pub mod dir_entry;
pub mod directory;
pub mod extract;
pub mod fat_error;
pub mod fat_table;
pub mod geometry;
