//! This module defines the `Command` enum and its associated methods for parsing
//! user input in the FAT32 navigator shell.
//!
//! A command line is split on whitespace; the first token selects the command and
//! the following ones are its arguments.

use crate::filesystem::dir_entry::NamePolicy;
use crate::filesystem::directory::{CdMatch, DirReadMode};
use crate::session::session_error::SessionError;

/// Represents a user command in the FAT32 navigator shell.
#[derive(Debug)]
pub enum Command {
    /// `quit` or `exit`.
    Quit,
    /// Open a disk image, encapsulating the file path.
    Open(String),
    Close,
    /// Print the geometry parameters of the open image.
    Info,
    /// Dump every boot sector field.
    Bpb,
    /// List all slots of the current directory.
    Stat,
    /// List the visible entries of the current directory.
    Ls,
    Cd(String),
    /// Copy a file out of the image, to `dest` or to the file's own name.
    Get { name: String, dest: Option<String> },
    /// Print `length` bytes of a file starting at `offset`.
    Read {
        name: String,
        offset: u64,
        length: u64,
    },
    Del(String),
    Undel(String),
    /// Skip the boot sector validation on the next `open`.
    Skip,
    /// Select how directories are read.
    Mode(DirReadMode),
    /// Select which duplicate `cd` follows.
    CdMatch(CdMatch),
    /// Select how overlong names are handled.
    Names(NamePolicy),
    /// Command for an unknown input, encapsulating the command word.
    Unknown(String),
    /// Command for invalid input, encapsulating the reason.
    Invalid(SessionError),
    /// Command for an empty input.
    Empty,
}

fn missing(msg: &str) -> Command {
    Command::Invalid(SessionError::MissingArgument(msg.to_string()))
}

fn invalid(msg: &str) -> Command {
    Command::Invalid(SessionError::InvalidArgument(msg.to_string()))
}

impl Command {
    /// Parses a line of user input into a `Command`.
    ///
    /// A command missing a required argument yields `Command::Invalid` with a
    /// `SessionError::MissingArgument`; an argument that does not parse yields a
    /// `SessionError::InvalidArgument`.
    pub fn from_string(s: &str) -> Self {
        let mut parts = s.split_whitespace();
        let Some(word) = parts.next() else {
            return Command::Empty;
        };

        match word {
            "quit" | "exit" => Command::Quit,
            "open" => match parts.next() {
                Some(path) => Command::Open(path.to_string()),
                None => missing("'open' expects the path to a FAT32 image."),
            },
            "close" => Command::Close,
            "info" => Command::Info,
            "bpb" => Command::Bpb,
            "stat" => Command::Stat,
            "ls" => Command::Ls,
            "cd" => match parts.next() {
                Some(name) => Command::Cd(name.to_string()),
                None => missing("'cd' expects a directory name."),
            },
            "get" => match parts.next() {
                Some(name) => Command::Get {
                    name: name.to_string(),
                    dest: parts.next().map(str::to_string),
                },
                None => missing("'get' expects a file name."),
            },
            "read" => Self::parse_read(parts.next(), parts.next(), parts.next()),
            "del" => match parts.next() {
                Some(name) => Command::Del(name.to_string()),
                None => missing("'del' expects a file name."),
            },
            "undel" => match parts.next() {
                Some(name) => Command::Undel(name.to_string()),
                None => missing("'undel' expects a file name."),
            },
            "skip" => Command::Skip,
            "mode" => match parts.next() {
                Some("compat") => Command::Mode(DirReadMode::Compat16),
                Some("chain") => Command::Mode(DirReadMode::ClusterChain),
                Some(_) => invalid("'mode' expects 'compat' or 'chain'."),
                None => missing("'mode' expects 'compat' or 'chain'."),
            },
            "cdmatch" => match parts.next() {
                Some("first") => Command::CdMatch(CdMatch::First),
                Some("last") => Command::CdMatch(CdMatch::Last),
                Some(_) => invalid("'cdmatch' expects 'first' or 'last'."),
                None => missing("'cdmatch' expects 'first' or 'last'."),
            },
            "names" => match parts.next() {
                Some("strict") => Command::Names(NamePolicy::Strict),
                Some("truncate") => Command::Names(NamePolicy::Truncate),
                Some(_) => invalid("'names' expects 'strict' or 'truncate'."),
                None => missing("'names' expects 'strict' or 'truncate'."),
            },
            other => Command::Unknown(other.to_string()),
        }
    }

    fn parse_read(name: Option<&str>, offset: Option<&str>, length: Option<&str>) -> Self {
        let (Some(name), Some(offset), Some(length)) = (name, offset, length) else {
            return missing("'read' expects a file name, an offset and a length.");
        };

        match (offset.parse::<u64>(), length.parse::<u64>()) {
            (Ok(offset), Ok(length)) => Command::Read {
                name: name.to_string(),
                offset,
                length,
            },
            _ => invalid("'read' expects unsigned integers for the offset and the length."),
        }
    }
}
