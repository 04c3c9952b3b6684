//!
//! fat_navigator: A library and CLI for browsing FAT32 file system images.
//!
//! This crate provides tools for:
//! - Parsing and validating the FAT32 boot sector
//! - Following cluster chains through the file allocation table
//! - Listing and navigating directories, with session-local soft delete
//! - Copying files and byte ranges out of the image
//!
//! The image is only ever read. The library can be used on its own through
//! [`Session`], or driven interactively through [`Shell`].
//!
//! # Re-exports
//! - [`Session`]: an open image and its current directory
//! - [`SessionOptions`]: behaviour switches of a session
//! - [`Shell`]: command dispatch for the interactive navigator

pub mod commands;
pub mod filesystem;
pub mod session;
pub mod shell;
pub mod utils;

#[cfg(test)]
mod test_image;

/// An open image and its current directory (see [`session::Session`]).
pub use crate::session::Session;
/// Behaviour switches of a session (see [`session::SessionOptions`]).
pub use crate::session::SessionOptions;
/// Command dispatch for the interactive navigator (see [`shell::Shell`]).
pub use crate::shell::Shell;
