use std::io::{self, Read, Seek, SeekFrom};

/// Reads exactly `buffer.len()` bytes from a reader starting at an absolute byte offset.
///
/// # Arguments
///
/// - `reader`: The image to read from.
/// - `offset`: The absolute byte offset to seek to.
/// - `buffer`: The destination buffer, filled completely on success.
///
/// # Errors
///
/// Returns an `io::Error` of kind `UnexpectedEof` if the image ends before the buffer is full.
pub fn read_at<R: Read + Seek>(reader: &mut R, offset: u64, buffer: &mut [u8]) -> io::Result<()> {
    reader.seek(SeekFrom::Start(offset))?;

    reader.read_exact(buffer).map_err(|err| {
        io::Error::new(
            err.kind(),
            format!(
                "Failed to read {} bytes at offset {offset:#X}: {err}",
                buffer.len()
            ),
        )
    })
}

/// Extracts a 32-bit unsigned integer from a buffer at a given offset.
///
/// # Panics
///
/// Panics if the slice does not contain enough bytes starting from the offset.
pub fn u32_at(buffer: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(
        buffer[offset..offset + 4]
            .try_into()
            .expect("invalid slice"),
    )
}
