//! Command dispatch for the interactive navigator.
//!
//! [`Shell`] holds at most one open [`Session`] and runs parsed [`Command`]s against
//! it, writing results to any `io::Write` sink.

use log::{info, warn};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::commands::Command;
use crate::session::session_error::SessionError;
use crate::session::{Session, SessionOptions};

/// Whether the command loop should keep reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// The navigator state between two commands.
#[derive(Default)]
pub struct Shell {
    session: Option<Session<File>>,
    options: SessionOptions,
}

impl Shell {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            session: None,
            options,
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    fn session(&mut self) -> Result<&mut Session<File>, SessionError> {
        self.session.as_mut().ok_or(SessionError::NotOpen)
    }

    fn set_options(&mut self, options: SessionOptions) {
        self.options = options;
        if let Some(session) = self.session.as_mut() {
            session.set_options(options);
        }
    }

    /// Runs one command, writing its output to `out`.
    ///
    /// # Errors
    /// Every error is meant to be reported to the user; the shell stays usable.
    pub fn execute<W: Write>(&mut self, cmd: Command, out: &mut W) -> Result<Flow, SessionError> {
        match cmd {
            Command::Quit => return Ok(Flow::Quit),
            Command::Empty => {}
            Command::Unknown(word) => return Err(SessionError::UnknownCommand(word)),
            Command::Invalid(err) => return Err(err),
            Command::Open(path) => {
                if self.session.is_some() {
                    return Err(SessionError::AlreadyOpen);
                }
                self.session = Some(Session::open(Path::new(&path), self.options)?);
                // `skip` only covers one open.
                self.options.strict_boot_sector = true;
            }
            Command::Close => {
                self.session.take().ok_or(SessionError::NotOpen)?;
                info!("Image closed");
            }
            Command::Skip => {
                self.set_options(SessionOptions {
                    strict_boot_sector: false,
                    ..self.options
                });
                writeln!(out, "Boot sector validation disabled for the next open")?;
            }
            Command::Mode(dir_read) => self.set_options(SessionOptions {
                dir_read,
                ..self.options
            }),
            Command::CdMatch(cd_match) => self.set_options(SessionOptions {
                cd_match,
                ..self.options
            }),
            Command::Names(name_policy) => self.set_options(SessionOptions {
                name_policy,
                ..self.options
            }),
            Command::Info => {
                write!(out, "{}", self.session()?.info())?;
            }
            Command::Bpb => {
                write!(out, "{}", self.session()?.boot_sector())?;
            }
            Command::Stat => {
                let session = self.session()?;
                writeln!(
                    out,
                    "{:>4} {:<11} {:>10} {:>10} {:>5}",
                    "Slot", "Name", "Cluster", "Size", "Attr"
                )?;
                for (slot, entry) in session.stat().enumerate() {
                    writeln!(
                        out,
                        "{:>4} {:<11} {:>10} {:>10}  0x{:02X}",
                        slot,
                        entry.raw_name(),
                        entry.cluster_number(),
                        entry.file_size(),
                        entry.attr()
                    )?;
                }
            }
            Command::Ls => {
                let session = self.session()?;
                for entry in session.list() {
                    if entry.is_dir() {
                        writeln!(out, "{:<12} {:>10}", entry.display_name(), "<DIR>")?;
                    } else {
                        writeln!(out, "{:<12} {:>10}", entry.display_name(), entry.file_size())?;
                    }
                }
            }
            Command::Cd(name) => {
                if !self.session()?.change_directory(&name)? {
                    warn!("No directory named {name:?}");
                }
            }
            Command::Get { name, dest } => {
                let dest = dest.unwrap_or_else(|| name.clone());
                let report = self.session()?.extract_to_file(&name, Path::new(&dest))?;
                writeln!(out, "Wrote {} bytes to {dest}", report.bytes_written)?;
            }
            Command::Read {
                name,
                offset,
                length,
            } => {
                let bytes = self.session()?.read_bytes(&name, offset, length)?;
                let text: Vec<String> = bytes.iter().map(|b| b.to_string()).collect();
                writeln!(out, "{}", text.join(" "))?;
            }
            Command::Del(name) => {
                let count = self.session()?.soft_delete(&name)?;
                info!("Deleted {count} entries named {name:?}");
            }
            Command::Undel(name) => {
                let count = self.session()?.undelete(&name)?;
                info!("Restored {count} entries named {name:?}");
            }
        }

        Ok(Flow::Continue)
    }
}
