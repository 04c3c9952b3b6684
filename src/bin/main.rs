//! This is the main entry point for the FAT32 navigator.
//!
//! The program provides an interactive command-line interface for browsing FAT32 disk
//! images. Each `-v` raises the log level, `-q` silences everything but the prompt and
//! command output.

use clap::{ArgAction, Parser};
use fat_navigator::commands::Command;
use fat_navigator::shell::Flow;
use fat_navigator::{SessionOptions, Shell};
use log::error;
use std::io::{self, Write};

/// Interactive navigator for FAT32 disk images.
#[derive(Parser)]
struct NavigatorCli {
    /// Raise the log level (warnings are shown by default)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Silence all log output
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let NavigatorCli { verbose, quiet } = NavigatorCli::parse();
    if let Err(err) = stderrlog::new()
        .module(module_path!())
        .module("fat_navigator")
        .quiet(quiet)
        .verbosity(1 + verbose as usize)
        .init()
    {
        eprintln!("Logger initialization failed: {err}");
    }

    let mut shell = Shell::new(SessionOptions::default());
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        if let Err(err) = stdout.flush() {
            error!("{err}");
            break;
        }

        let mut s = String::new();
        match io::stdin().read_line(&mut s) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                error!("Failed to read command: {err}");
                break;
            }
        }

        match shell.execute(Command::from_string(&s), &mut stdout) {
            Ok(Flow::Quit) => break,
            Ok(Flow::Continue) => {}
            Err(err) => error!("{err}"),
        }
    }
}
