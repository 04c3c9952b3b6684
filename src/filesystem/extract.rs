//! Reading file content out of the image.
//!
//! Both operations follow the file's cluster chain one cluster at a time. The size
//! declared in the directory entry is authoritative: reading stops once it is
//! reached, and a chain that ends earlier is reported as corrupt rather than read past.

use log::{debug, info, warn};
use std::io::{Read, Seek, Write};

use super::dir_entry::DirEntry;
use super::fat_error::FATError;
use super::fat_table::{FatEntry, FatTable};
use super::geometry::{BootSectorInfo, FIRST_DATA_CLUSTER};
use crate::utils::read_at;

/// Summary of an [`extract`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtractReport {
    /// Bytes written to the sink.
    pub bytes_written: u64,
    /// FAT lookups performed, one after each full cluster.
    pub chain_steps: u64,
    /// Clusters that were only partly copied (0 or 1).
    pub partial_blocks: u64,
}

/// Returns the cluster following `cluster`, treating anything but a data cluster link
/// as a broken chain.
fn follow<R: Read + Seek>(
    fat: &FatTable,
    reader: &mut R,
    cluster: u32,
    written: u64,
) -> Result<u32, FATError> {
    match fat.next_cluster(reader, cluster) {
        Ok(FatEntry::Next(next)) if next >= FIRST_DATA_CLUSTER => Ok(next),
        Ok(entry) => {
            warn!("Chain broken after cluster {cluster}: FAT holds {entry:?}");
            Err(FATError::CorruptChain { cluster, written })
        }
        Err(FATError::CorruptChain { cluster, .. }) => {
            Err(FATError::CorruptChain { cluster, written })
        }
        Err(err) => Err(err),
    }
}

/// Reads `buf.len()` bytes of cluster data, reporting a short read as a broken chain.
fn read_cluster_data<R: Read + Seek>(
    reader: &mut R,
    geometry: &BootSectorInfo,
    cluster: u32,
    skip: u64,
    buf: &mut [u8],
    written: u64,
) -> Result<(), FATError> {
    let corrupt = || FATError::CorruptChain { cluster, written };
    let offset = geometry.cluster_to_offset(cluster).map_err(|_| corrupt())?;

    read_at(reader, offset + skip, buf).map_err(|err| {
        warn!("Data of cluster {cluster} unreadable: {err}");
        corrupt()
    })
}

/// Copies the content of `entry` to `sink`, one cluster at a time.
///
/// After each full cluster the next one is looked up in the FAT; the final partial
/// cluster, if any, is copied without a lookup. A file whose size is an exact multiple
/// of the cluster size therefore costs exactly `size / cluster_size` lookups.
///
/// # Errors
/// `FATError::CorruptChain` if the chain ends, loops into an unusable cluster or
/// points outside the image before the declared size is reached. Everything read up
/// to that point has already been written to `sink`.
pub fn extract<R: Read + Seek, W: Write>(
    reader: &mut R,
    geometry: &BootSectorInfo,
    entry: &DirEntry,
    sink: &mut W,
) -> Result<ExtractReport, FATError> {
    let stride = geometry.cluster_size();
    let fat = FatTable::new(*geometry);
    let mut report = ExtractReport::default();
    let mut remaining = entry.file_size() as u64;
    let mut cluster = entry.cluster_number();
    let mut buf = vec![0u8; stride as usize];

    while remaining > 0 {
        let chunk = remaining.min(stride);
        let block = &mut buf[..chunk as usize];
        read_cluster_data(reader, geometry, cluster, 0, block, report.bytes_written)?;
        sink.write_all(block)?;
        report.bytes_written += chunk;
        remaining -= chunk;

        if chunk < stride {
            report.partial_blocks += 1;
            break;
        }

        report.chain_steps += 1;
        if remaining == 0 {
            match fat.next_cluster(reader, cluster) {
                Ok(FatEntry::EndOfChain) => {}
                other => debug!("Last cluster {cluster} of the file is followed by {other:?}"),
            }
            break;
        }
        cluster = follow(&fat, reader, cluster, report.bytes_written)?;
    }

    info!(
        "Extracted {} ({} bytes, {} clusters followed)",
        entry.display_name(),
        report.bytes_written,
        report.chain_steps
    );
    Ok(report)
}

/// Reads `len` bytes of `entry` starting at byte `start` of the file.
///
/// The range may span several clusters; it is clamped to the declared file size, so a
/// range starting at or past the end of the file yields no bytes.
///
/// # Errors
/// `FATError::CorruptChain` if the chain breaks before the end of the range.
pub fn read_range<R: Read + Seek>(
    reader: &mut R,
    geometry: &BootSectorInfo,
    entry: &DirEntry,
    start: u64,
    len: u64,
) -> Result<Vec<u8>, FATError> {
    let size = entry.file_size() as u64;
    let end = start.saturating_add(len).min(size);
    if start >= end {
        return Ok(vec![]);
    }

    let stride = geometry.cluster_size();
    let fat = FatTable::new(*geometry);
    let mut cluster = entry.cluster_number();
    for _ in 0..start / stride {
        cluster = follow(&fat, reader, cluster, 0)?;
    }

    let mut out = vec![0u8; (end - start) as usize];
    let mut pos = start;
    while pos < end {
        let in_cluster = pos % stride;
        let take = (stride - in_cluster).min(end - pos);
        let from = (pos - start) as usize;
        let block = &mut out[from..from + take as usize];
        read_cluster_data(reader, geometry, cluster, in_cluster, block, pos - start)?;
        pos += take;

        if pos < end {
            cluster = follow(&fat, reader, cluster, pos - start)?;
        }
    }

    Ok(out)
}
