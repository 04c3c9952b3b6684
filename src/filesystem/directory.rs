//! The currently loaded directory.
//!
//! A [`DirectoryView`] holds the entries of one directory (the root or a
//! subdirectory) and implements the navigation commands on top of them: listing,
//! changing directory and the session-local soft delete / undelete. The image itself
//! is never written.

use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::io::{Read, Seek};

use super::dir_entry::{ATTR_READ_ONLY, DIR_ENTRY_SIZE, DirEntry, NameQuery};
use super::fat_error::FATError;
use super::fat_table::FatTable;
use super::geometry::{BootSectorInfo, FIRST_DATA_CLUSTER};
use crate::utils::read_at;

/// Number of records read from a directory in [`DirReadMode::Compat16`].
pub const COMPAT_ENTRY_COUNT: usize = 16;

/// First name byte given to soft-deleted entries. DEL is not a legal short name byte.
pub const SOFT_DELETE_MARK: u8 = 0x7F;

/// How much of a directory is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirReadMode {
    /// The first 16 records of the directory's first cluster.
    #[default]
    Compat16,
    /// Every record of the directory's cluster chain, up to the end-of-directory marker.
    ClusterChain,
}

/// Which entry `cd` follows when several entries carry the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CdMatch {
    #[default]
    First,
    Last,
}

/// Entries of the directory currently open in a session.
///
/// Not thread-safe: `cd`, `del` and `undel` mutate the view in place.
#[derive(Debug)]
pub struct DirectoryView {
    /// First cluster of the directory, 0 for the root.
    cluster: u32,
    entries: Vec<DirEntry>,
    /// Slot index to the first name byte it had before being soft deleted.
    deleted: BTreeMap<usize, u8>,
}

impl DirectoryView {
    /// Loads the directory starting at `cluster`; cluster 0 designates the root directory.
    pub fn load<R: Read + Seek>(
        reader: &mut R,
        geometry: &BootSectorInfo,
        cluster: u32,
        mode: DirReadMode,
    ) -> Result<Self, FATError> {
        let entries = match mode {
            DirReadMode::Compat16 => {
                let first = if cluster == 0 {
                    FIRST_DATA_CLUSTER
                } else {
                    cluster
                };
                let mut buf = vec![0u8; COMPAT_ENTRY_COUNT * DIR_ENTRY_SIZE];
                read_at(reader, geometry.cluster_to_offset(first)?, &mut buf)?;

                buf.chunks(DIR_ENTRY_SIZE)
                    .map(DirEntry::from_slice)
                    .collect::<Result<Vec<_>, _>>()?
            }
            DirReadMode::ClusterChain => {
                let first = if cluster == 0 {
                    geometry.root_clus()
                } else {
                    cluster
                };
                Self::read_chain(reader, geometry, first)?
            }
        };

        info!(
            "Loaded directory at cluster {cluster} ({} slots)",
            entries.len()
        );

        Ok(Self {
            cluster,
            entries,
            deleted: BTreeMap::new(),
        })
    }

    fn read_chain<R: Read + Seek>(
        reader: &mut R,
        geometry: &BootSectorInfo,
        first_cluster: u32,
    ) -> Result<Vec<DirEntry>, FATError> {
        let clusters = FatTable::new(*geometry).chain(reader, first_cluster)?;
        let mut buf = vec![0u8; geometry.cluster_size() as usize];
        let mut entries = vec![];

        for cluster in clusters {
            read_at(reader, geometry.cluster_to_offset(cluster)?, &mut buf)?;

            for record in buf.chunks(DIR_ENTRY_SIZE) {
                let entry = DirEntry::from_slice(record)?;
                if entry.is_end_of_dir() {
                    return Ok(entries);
                }
                entries.push(entry);
            }
        }

        Ok(entries)
    }

    /// First cluster of the loaded directory, 0 for the root.
    pub fn cluster(&self) -> u32 {
        self.cluster
    }

    /// Visible entries, in storage order.
    pub fn list(&self) -> impl Iterator<Item = &DirEntry> {
        self.entries.iter().filter(|entry| entry.is_visible())
    }

    /// Every loaded slot, deleted and free ones included.
    pub fn stat(&self) -> impl Iterator<Item = &DirEntry> {
        self.entries.iter()
    }

    /// Returns the first visible entry matching `query`.
    pub fn find(&self, query: &NameQuery) -> Option<&DirEntry> {
        self.list().find(|entry| query.matches(entry.name()))
    }

    fn matching_slots(&self, query: &NameQuery) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_visible() && query.matches(entry.name()))
            .map(|(slot, _)| slot)
            .collect()
    }

    /// Replaces the view with the directory named by `query`.
    ///
    /// Returns `Ok(false)` and leaves the view untouched when nothing matches. An entry
    /// with cluster 0 (the `..` of a first-level directory) loads the root directory.
    pub fn change_directory<R: Read + Seek>(
        &mut self,
        reader: &mut R,
        geometry: &BootSectorInfo,
        query: &NameQuery,
        mode: DirReadMode,
        cd_match: CdMatch,
    ) -> Result<bool, FATError> {
        let slots = self.matching_slots(query);
        let slot = match cd_match {
            CdMatch::First => slots.first(),
            CdMatch::Last => slots.last(),
        };
        let Some(&slot) = slot else {
            return Ok(false);
        };

        if slots.len() > 1 {
            warn!(
                "{} entries match {:?}, following slot {slot}",
                slots.len(),
                self.entries[slot].display_name()
            );
        }

        let target = self.entries[slot].cluster_number();
        *self = Self::load(reader, geometry, target, mode)?;
        Ok(true)
    }

    /// Hides every visible entry matching `query` until [`undelete`](Self::undelete).
    ///
    /// The first name byte of each entry is replaced with [`SOFT_DELETE_MARK`] and its
    /// attribute cleared. Each slot remembers its own original byte, so several deleted
    /// entries can be restored independently.
    ///
    /// # Errors
    /// `FATError::NotFound` if no visible entry matches.
    pub fn soft_delete(&mut self, query: &NameQuery) -> Result<usize, FATError> {
        let slots = self.matching_slots(query);
        if slots.is_empty() {
            return Err(FATError::NotFound(format!("{query}")));
        }

        for &slot in &slots {
            let entry = &mut self.entries[slot];
            self.deleted.insert(slot, entry.name()[0]);
            entry.set_first_byte(SOFT_DELETE_MARK);
            entry.set_attr(0);
            debug!("Soft deleted slot {slot}");
        }

        Ok(slots.len())
    }

    /// Restores soft-deleted entries whose original name matches `query`.
    ///
    /// Restored entries get their original first byte back and the read-only attribute.
    ///
    /// # Errors
    /// `FATError::NotFound` if no soft-deleted entry matches.
    pub fn undelete(&mut self, query: &NameQuery) -> Result<usize, FATError> {
        let slots: Vec<usize> = self
            .deleted
            .iter()
            .filter(|&(&slot, &first)| {
                let mut name = *self.entries[slot].name();
                name[0] = first;
                query.matches(&name)
            })
            .map(|(&slot, _)| slot)
            .collect();

        if slots.is_empty() {
            return Err(FATError::NotFound(format!("{query}")));
        }

        for &slot in &slots {
            if let Some(first) = self.deleted.remove(&slot) {
                let entry = &mut self.entries[slot];
                entry.set_first_byte(first);
                entry.set_attr(ATTR_READ_ONLY);
                debug!("Restored slot {slot}");
            }
        }

        Ok(slots.len())
    }
}
