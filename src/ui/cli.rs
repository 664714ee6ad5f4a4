use super::{MenuError, Note, NoteError, Result};

use crate::ui::io::IO;
use colored::Colorize;
use log::trace;
use std::io::{self, Write};
use tabled::{settings::Style, Table};

/// Terminal implementation of `IO` on stdin/stdout
pub struct Cli;

impl IO for Cli {
    /// Reads a single line of text and returns it trimmed.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to stdout or reading from stdin fails,
    /// and `MenuError::EndOfInput` once stdin is closed.
    fn get_input(&self) -> Result<String> {
        let mut input = String::new();
        print!("> ");
        io::stdout()
            .flush()
            .map_err(|e| NoteError::Menu(MenuError::StdoutWriteError(e)))?;
        trace!("Flushed stdout");

        let read = io::stdin()
            .read_line(&mut input)
            .map_err(|e| NoteError::Menu(MenuError::StdinReadError(e)))?;
        if read == 0 {
            println!();
            return Err(NoteError::Menu(MenuError::EndOfInput));
        }

        input = input.trim().to_string();
        trace!("Got input: {input}");
        Ok(input)
    }

    /// Displays a numbered menu prompt with the given options.
    fn show_menu(&self, options: &[impl std::fmt::Display]) {
        self.show_title("What do you want to do?");
        for o in options {
            println!("{o}");
        }
        println!();
    }

    /// Renders notes as a `psql` style table.
    fn show_notes_list(&self, notes: &[Note]) {
        let mut table = Table::new(notes);
        table.with(Style::psql());
        println!("{table}");
    }

    fn show_title(&self, title: &str) {
        println!("\n{}\n", title.bold());
    }

    fn show_text(&self, msg: &str) {
        println!("{msg}");
    }
}
