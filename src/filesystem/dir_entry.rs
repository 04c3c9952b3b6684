//! FAT directory entry structure and 8.3 short name matching.
//!
//! Each directory entry is 32 bytes and describes one file or directory. Names are
//! stored in the legacy 8.3 form: 11 bytes, uppercase, space padded, with no dot
//! between the base name and the extension.

use binread::{BinRead, BinReaderExt};
use getset::{CopyGetters, Getters};
use std::fmt;
use std::io;

use super::fat_error::FATError;

/// Size in bytes of an on-disk directory record.
pub const DIR_ENTRY_SIZE: usize = 32;
/// Length of a short name: 8 bytes of base name followed by 3 bytes of extension.
pub const SHORT_NAME_LEN: usize = 11;
const BASE_LEN: usize = 8;
const EXT_LEN: usize = 3;

/// First name byte of an entry deleted by a FAT driver.
pub const DELETED_MARKER: u8 = 0xE5;
/// First name byte of a free slot ending the directory.
pub const END_OF_DIR_MARKER: u8 = 0x00;

pub const ATTR_READ_ONLY: u8 = 0x01;
pub const ATTR_VOLUME_ID: u8 = 0x08;
pub const ATTR_DIRECTORY: u8 = 0x10;
pub const ATTR_ARCHIVE: u8 = 0x20;

/// FAT directory entry.
///
/// Timestamp fields are kept for layout only.
#[derive(BinRead, Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
#[br(little)]
pub struct DirEntry {
    /// Filename in 8.3 format (8 characters name + 3 characters extension)
    #[getset(get = "pub")]
    name: [u8; SHORT_NAME_LEN],
    /// File attributes byte
    #[getset(get_copy = "pub")]
    attr: u8,
    _n_t_res: u8,
    _crt_time_tenth: u8,
    _crt_time: u16,
    _crt_date: u16,
    _lst_acc_date: u16,
    /// High 16 bits of first cluster number
    fst_clus_hi: u16,
    _wrt_time: u16,
    _wrt_date: u16,
    /// Low 16 bits of first cluster number
    fst_clus_lo: u16,
    /// File size in bytes (0 for directories)
    #[getset(get_copy = "pub")]
    file_size: u32,
}

impl DirEntry {
    /// Decodes one directory entry from the first 32 bytes of `buf`.
    pub fn from_slice(buf: &[u8]) -> Result<Self, FATError> {
        let mut reader = io::Cursor::new(buf);
        reader.read_le().map_err(FATError::from)
    }

    /// Returns the complete first cluster number, `(fst_clus_hi << 16) | fst_clus_lo`.
    pub fn cluster_number(&self) -> u32 {
        ((self.fst_clus_hi as u32) << 16) | self.fst_clus_lo as u32
    }

    pub fn is_dir(&self) -> bool {
        self.attr & ATTR_DIRECTORY != 0
    }

    /// Whether `ls` shows the entry: not deleted, and flagged exactly read-only,
    /// directory or archive. Volume labels, hidden or system entries and free slots
    /// are skipped.
    pub fn is_visible(&self) -> bool {
        self.name[0] != DELETED_MARKER
            && matches!(self.attr, ATTR_READ_ONLY | ATTR_DIRECTORY | ATTR_ARCHIVE)
    }

    pub fn is_end_of_dir(&self) -> bool {
        self.name[0] == END_OF_DIR_MARKER
    }

    pub(super) fn set_first_byte(&mut self, byte: u8) {
        self.name[0] = byte;
    }

    pub(super) fn set_attr(&mut self, attr: u8) {
        self.attr = attr;
    }

    /// The stored 11 bytes, as they are on disk.
    pub fn raw_name(&self) -> String {
        String::from_utf8_lossy(&self.name).into_owned()
    }

    /// The name with its padding removed and a dot before a non-empty extension.
    pub fn display_name(&self) -> String {
        let base = String::from_utf8_lossy(&self.name[..BASE_LEN]);
        let ext = String::from_utf8_lossy(&self.name[BASE_LEN..]);
        let (base, ext) = (base.trim_end(), ext.trim_end());

        if ext.is_empty() {
            base.to_string()
        } else {
            format!("{base}.{ext}")
        }
    }
}

impl fmt::Display for DirEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" {}B", self.display_name(), self.file_size)
    }
}

/// How a query longer than an 8.3 field is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamePolicy {
    /// Reject the query with `FATError::NameTooLong`.
    #[default]
    Strict,
    /// Silently keep the first 8 (or 3) bytes of the field.
    Truncate,
}

/// A user supplied name, normalized for comparison against stored short names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameQuery {
    /// `..`: matches any entry whose stored name starts with two dots.
    Parent,
    /// Any other name, expanded to its 11-byte stored form.
    Short([u8; SHORT_NAME_LEN]),
}

impl NameQuery {
    pub fn parse(query: &str, policy: NamePolicy) -> Result<Self, FATError> {
        if query == ".." {
            return Ok(NameQuery::Parent);
        }
        expand_and_normalize(query, policy).map(NameQuery::Short)
    }

    /// Compares a stored name against the query.
    pub fn matches(&self, stored: &[u8; SHORT_NAME_LEN]) -> bool {
        match self {
            NameQuery::Parent => stored.starts_with(b".."),
            NameQuery::Short(expanded) => expanded == stored,
        }
    }
}

impl fmt::Display for NameQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameQuery::Parent => write!(f, ".."),
            NameQuery::Short(expanded) => {
                write!(f, "{}", String::from_utf8_lossy(expanded).trim_end())
            }
        }
    }
}

/// Expands a name such as `foo.txt` into its stored form `FOO     TXT`.
///
/// The query is split on its first dot, so later dots stay in the extension and a
/// leading dot leaves the base name empty. The base name is left-justified into bytes
/// 0-7, the extension into bytes 8-10, and every byte is uppercased. `.` expands to
/// the dot entry of a directory.
///
/// # Errors
/// `FATError::NameTooLong` if a field overflows and `policy` is [`NamePolicy::Strict`].
pub fn expand_and_normalize(
    query: &str,
    policy: NamePolicy,
) -> Result<[u8; SHORT_NAME_LEN], FATError> {
    let mut expanded = [b' '; SHORT_NAME_LEN];
    if query == "." || query == ".." {
        expanded[..query.len()].copy_from_slice(query.as_bytes());
        return Ok(expanded);
    }

    let (base, ext) = match query.split_once('.') {
        Some((base, ext)) => (base.as_bytes(), ext.as_bytes()),
        None => (query.as_bytes(), &[][..]),
    };

    if policy == NamePolicy::Strict && (base.len() > BASE_LEN || ext.len() > EXT_LEN) {
        return Err(FATError::NameTooLong(query.to_string()));
    }

    let base = &base[..base.len().min(BASE_LEN)];
    let ext = &ext[..ext.len().min(EXT_LEN)];
    expanded[..base.len()].copy_from_slice(base);
    expanded[BASE_LEN..BASE_LEN + ext.len()].copy_from_slice(ext);
    expanded.make_ascii_uppercase();

    Ok(expanded)
}
