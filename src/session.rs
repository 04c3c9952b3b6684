//! An open FAT32 image.
//!
//! A [`Session`] owns the image reader, the geometry parsed from its boot sector and
//! the directory currently loaded. Every navigation operation goes through it; there
//! is no process-wide state.
//!
//! A session is not thread-safe: `cd`, `del` and `undel` mutate the loaded directory
//! and all operations move the reader's position.

pub mod session_error;

use getset::{CopyGetters, Getters};
use log::info;
use std::fs::File;
use std::io::{BufWriter, Read, Seek, Write};
use std::path::Path;

use crate::filesystem::boot_sector::BootSector;
use crate::filesystem::dir_entry::{DirEntry, NamePolicy, NameQuery};
use crate::filesystem::directory::{CdMatch, DirReadMode, DirectoryView};
use crate::filesystem::extract::{self, ExtractReport};
use crate::filesystem::fat_error::FATError;
use crate::filesystem::geometry::BootSectorInfo;
use session_error::SessionError;

/// Behaviour switches of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Run the FAT32 boot sector checks when opening.
    pub strict_boot_sector: bool,
    pub dir_read: DirReadMode,
    pub cd_match: CdMatch,
    pub name_policy: NamePolicy,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            strict_boot_sector: true,
            dir_read: DirReadMode::default(),
            cd_match: CdMatch::default(),
            name_policy: NamePolicy::default(),
        }
    }
}

/// An open image and the directory being browsed.
#[derive(Getters, CopyGetters)]
pub struct Session<R: Read + Seek> {
    reader: R,
    #[get = "pub"]
    boot_sector: BootSector,
    /// Geometry parsed from the boot sector.
    #[get_copy = "pub"]
    info: BootSectorInfo,
    #[get = "pub"]
    directory: DirectoryView,
    #[get_copy = "pub"]
    options: SessionOptions,
}

impl Session<File> {
    /// Opens an image file read-only and loads its root directory.
    ///
    /// # Errors
    /// - `SessionError::ImageNotFound` if the file cannot be opened
    /// - `SessionError::Fat` if the boot sector or the root directory cannot be read
    pub fn open(path: &Path, options: SessionOptions) -> Result<Self, SessionError> {
        let file = File::open(path).map_err(|source| SessionError::ImageNotFound {
            path: path.display().to_string(),
            source,
        })?;

        let session = Self::from_reader(file, options)?;
        info!(
            "Opened {} (volume {:?})",
            path.display(),
            session.boot_sector.volume_label()
        );
        Ok(session)
    }
}

impl<R: Read + Seek> Session<R> {
    /// Parses the boot sector of `reader` and loads the root directory.
    pub fn from_reader(mut reader: R, options: SessionOptions) -> Result<Self, FATError> {
        let boot_sector = BootSector::from(&mut reader, options.strict_boot_sector)?;
        let info = boot_sector.info();
        let directory = DirectoryView::load(&mut reader, &info, 0, options.dir_read)?;

        Ok(Self {
            reader,
            boot_sector,
            info,
            directory,
            options,
        })
    }

    /// Replaces the options. A new directory read mode applies from the next `cd`.
    pub fn set_options(&mut self, options: SessionOptions) {
        self.options = options;
    }

    fn query(&self, name: &str) -> Result<NameQuery, FATError> {
        NameQuery::parse(name, self.options.name_policy)
    }

    /// Returns the first visible entry named `name` in the current directory.
    pub fn entry(&self, name: &str) -> Result<DirEntry, FATError> {
        let query = self.query(name)?;
        self.directory
            .find(&query)
            .cloned()
            .ok_or_else(|| FATError::NotFound(name.to_string()))
    }

    /// Visible entries of the current directory.
    pub fn list(&self) -> impl Iterator<Item = &DirEntry> {
        self.directory.list()
    }

    /// Every slot of the current directory.
    pub fn stat(&self) -> impl Iterator<Item = &DirEntry> {
        self.directory.stat()
    }

    /// Moves into the directory `name`. Returns `Ok(false)` if nothing matches.
    pub fn change_directory(&mut self, name: &str) -> Result<bool, FATError> {
        let query = self.query(name)?;
        self.directory.change_directory(
            &mut self.reader,
            &self.info,
            &query,
            self.options.dir_read,
            self.options.cd_match,
        )
    }

    /// Hides the entries named `name` for the rest of the session.
    pub fn soft_delete(&mut self, name: &str) -> Result<usize, FATError> {
        let query = self.query(name)?;
        self.directory.soft_delete(&query)
    }

    /// Restores the soft-deleted entries named `name`.
    pub fn undelete(&mut self, name: &str) -> Result<usize, FATError> {
        let query = self.query(name)?;
        self.directory.undelete(&query)
    }

    /// Streams the content of file `name` into `sink`.
    pub fn extract<W: Write>(
        &mut self,
        name: &str,
        sink: &mut W,
    ) -> Result<ExtractReport, FATError> {
        let entry = self.entry(name)?;
        extract::extract(&mut self.reader, &self.info, &entry, sink)
    }

    /// Copies file `name` to `dest` on the host.
    ///
    /// On a broken cluster chain the bytes recovered so far are kept in `dest` and the
    /// `CorruptChain` error is returned.
    pub fn extract_to_file(
        &mut self,
        name: &str,
        dest: &Path,
    ) -> Result<ExtractReport, SessionError> {
        let entry = self.entry(name)?;
        let mut out = BufWriter::new(File::create(dest)?);

        let result = extract::extract(&mut self.reader, &self.info, &entry, &mut out);
        out.flush()?;
        Ok(result?)
    }

    /// Reads `length` bytes of file `name` starting at `offset`.
    pub fn read_bytes(
        &mut self,
        name: &str,
        offset: u64,
        length: u64,
    ) -> Result<Vec<u8>, FATError> {
        let entry = self.entry(name)?;
        extract::read_range(&mut self.reader, &self.info, &entry, offset, length)
    }

    /// Ends the session and hands the reader back. Soft deletes are discarded.
    pub fn close(self) -> R {
        self.reader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::dir_entry::{ATTR_ARCHIVE, ATTR_VOLUME_ID};
    use crate::test_image::{ImageBuilder, pattern};
    use std::io::Cursor;

    fn sample() -> ImageBuilder {
        let mut builder = ImageBuilder::new(1);
        builder
            .entry(2, 0, b"NAVTEST    ", ATTR_VOLUME_ID, 0, 0)
            .file(2, 1, b"README  TXT", &[3, 4], &pattern(700))
            .dir(2, 2, b"SUB        ", 6)
            .file(6, 2, b"INNER   BIN", &[7], &pattern(40));
        builder
    }

    fn session(builder: &ImageBuilder, options: SessionOptions) -> Session<Cursor<Vec<u8>>> {
        Session::from_reader(Cursor::new(builder.build()), options).unwrap()
    }

    #[test]
    fn opening_parses_geometry_and_root() {
        let session = session(&sample(), SessionOptions::default());

        assert_eq!(session.info(), sample().geometry());
        assert_eq!(session.directory().cluster(), 0);
        let names: Vec<_> = session.list().map(|e| e.display_name()).collect();
        assert_eq!(names, vec!["README.TXT", "SUB"]);
    }

    #[test]
    fn malformed_boot_sector_is_rejected() {
        let mut image = sample().build();
        image[13] = 0;

        let err = Session::from_reader(Cursor::new(image), SessionOptions::default()).err();
        assert!(matches!(err, Some(FATError::MalformedImage(_))));
    }

    #[test]
    fn navigates_and_reads_nested_files() {
        let mut session = session(&sample(), SessionOptions::default());

        assert!(session.change_directory("sub").unwrap());
        assert_eq!(session.read_bytes("inner.bin", 0, 40).unwrap(), pattern(40));

        let mut out = vec![];
        session.extract("inner.bin", &mut out).unwrap();
        assert_eq!(out, pattern(40));

        assert!(session.change_directory("..").unwrap());
        assert_eq!(
            session.read_bytes("readme.txt", 510, 4).unwrap(),
            pattern(700)[510..514]
        );
    }

    #[test]
    fn unknown_names_are_reported() {
        let mut session = session(&sample(), SessionOptions::default());

        assert!(matches!(session.entry("missing"), Err(FATError::NotFound(_))));
        assert!(matches!(
            session.read_bytes("missing", 0, 1),
            Err(FATError::NotFound(_))
        ));
        assert!(!session.change_directory("missing").unwrap());
    }

    #[test]
    fn name_policy_controls_overlong_queries() {
        let mut builder = sample();
        builder.file(2, 3, b"LONGNAMETXT", &[9], &pattern(5));

        let strict = session(&builder, SessionOptions::default());
        assert!(matches!(
            strict.entry("longnameX.txt"),
            Err(FATError::NameTooLong(_))
        ));

        let lenient = session(
            &builder,
            SessionOptions {
                name_policy: NamePolicy::Truncate,
                ..SessionOptions::default()
            },
        );
        assert_eq!(lenient.entry("longnameX.txt").unwrap().file_size(), 5);
    }

    #[test]
    fn soft_delete_hides_then_restores() {
        let mut session = session(&sample(), SessionOptions::default());

        session.soft_delete("readme.txt").unwrap();
        assert!(session.entry("readme.txt").is_err());
        assert_eq!(session.stat().count(), 16);

        session.undelete("readme.txt").unwrap();
        assert_eq!(session.entry("readme.txt").unwrap().file_size(), 700);
    }

    #[test]
    fn soft_delete_never_touches_the_image() {
        let builder = sample();
        let mut session = session(&builder, SessionOptions::default());

        session.soft_delete("readme.txt").unwrap();
        let image = session.close().into_inner();
        assert_eq!(image, builder.build());
    }

    #[test]
    fn directory_read_mode_applies_from_next_cd() {
        let mut builder = sample();
        for slot in 3..16 {
            builder.entry(6, slot, b"FILLER  DAT", ATTR_ARCHIVE, 0, 0);
        }
        builder.link(&[6, 8]);
        builder.entry(8, 0, b"DEEP    DAT", ATTR_ARCHIVE, 0, 0);

        let mut session = session(&builder, SessionOptions::default());
        session.change_directory("sub").unwrap();
        assert!(session.entry("deep.dat").is_err());

        session.set_options(SessionOptions {
            dir_read: DirReadMode::ClusterChain,
            ..session.options()
        });
        session.change_directory(".").unwrap();
        assert!(session.entry("deep.dat").is_ok());
    }
}
