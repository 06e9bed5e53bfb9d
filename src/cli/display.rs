//! Terminal output for both binaries
//!
//! Rows are written with crossterm so results get color on a terminal; the
//! same calls work against any `Write`, which is how the tests read them.

use crate::llm::Decoded;
use crossterm::{
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use std::io::{self, stdout, Write};

/// Width of the word column in the decode table
const WORD_COLUMN: usize = 15;

/// Terminal display manager
pub struct Display<W: Write> {
    out: W,
}

impl Display<io::Stdout> {
    /// Display on stdout
    pub fn simple() -> Self {
        Display::new(stdout())
    }
}

impl<W: Write> Display<W> {
    pub fn new(out: W) -> Self {
        Display { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Colored banner line followed by a rule
    pub fn header(&mut self, title: &str) -> io::Result<()> {
        queue!(
            self.out,
            SetForegroundColor(Color::Cyan),
            Print(title),
            Print("\n"),
            SetForegroundColor(Color::Blue),
            Print("─".repeat(40)),
            Print("\n"),
            ResetColor
        )?;
        self.out.flush()
    }

    /// `WORD | /IPA/` row; unterminated decodes are shown in yellow.
    pub fn decoded_row(&mut self, word: &str, decoded: &Decoded) -> io::Result<()> {
        let word_cell = format!("{:<width$}", word, width = WORD_COLUMN);
        queue!(
            self.out,
            SetForegroundColor(Color::White),
            Print(word_cell),
            ResetColor,
            Print(" | "),
        )?;

        if decoded.terminated {
            queue!(
                self.out,
                SetForegroundColor(Color::Green),
                Print(format!("/{}/", decoded.text)),
                ResetColor,
            )?;
        } else {
            queue!(
                self.out,
                SetForegroundColor(Color::Yellow),
                Print(format!("/{}/", decoded.text)),
                Print("  (no stop token)"),
                ResetColor,
            )?;
        }

        queue!(self.out, Print("\n"))?;
        self.out.flush()
    }

    /// Failed decode for one word; the run continues with the next.
    pub fn failed_row(&mut self, word: &str, error: &dyn std::fmt::Display) -> io::Result<()> {
        let word_cell = format!("{:<width$}", word, width = WORD_COLUMN);
        queue!(
            self.out,
            Print(word_cell),
            Print(" | "),
            SetForegroundColor(Color::Red),
            Print(format!("error: {}", error)),
            ResetColor,
            Print("\n"),
        )?;
        self.out.flush()
    }

    /// Numbered list of generated strings
    pub fn generated(&mut self, index: usize, text: &str) -> io::Result<()> {
        queue!(
            self.out,
            SetForegroundColor(Color::DarkGrey),
            Print(format!("{:>3}. ", index + 1)),
            ResetColor,
            Print(text),
            Print("\n"),
        )?;
        self.out.flush()
    }

    pub fn notice(&mut self, message: &str) -> io::Result<()> {
        queue!(
            self.out,
            SetForegroundColor(Color::Magenta),
            Print(message),
            ResetColor,
            Print("\n"),
        )?;
        self.out.flush()
    }
}
