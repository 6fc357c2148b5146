//! Operator-facing output for command handlers.
//!
//! Handlers never print directly; they write through [`Output`], which
//! prefixes status lines the way the console always has (`[*]`, `[+]`, `[-]`)
//! and swallows write failures so a broken terminal cannot abort a handler.

use std::io::Write;

const STATUS_PREFIX: &str = "[*] ";
const GOOD_PREFIX: &str = "[+] ";
const ERROR_PREFIX: &str = "[-] ";

/// Line-oriented writer handed to every handler invocation.
pub struct Output<'a> {
    writer: &'a mut dyn Write,
}

impl<'a> Output<'a> {
    /// Wraps the given stream.
    pub fn new(writer: &'a mut dyn Write) -> Self {
        Self { writer }
    }

    /// Writes an informational status line.
    pub fn status(&mut self, message: impl AsRef<str>) {
        self.prefixed(STATUS_PREFIX, message.as_ref());
    }

    /// Writes a success line.
    pub fn good(&mut self, message: impl AsRef<str>) {
        self.prefixed(GOOD_PREFIX, message.as_ref());
    }

    /// Writes an error line.
    pub fn error(&mut self, message: impl AsRef<str>) {
        self.prefixed(ERROR_PREFIX, message.as_ref());
    }

    /// Writes a plain line.
    pub fn line(&mut self, message: impl AsRef<str>) {
        let _ = writeln!(self.writer, "{}", message.as_ref());
    }

    /// Writes a pre-formatted block verbatim.
    pub fn block(&mut self, text: impl AsRef<str>) {
        let _ = self.writer.write_all(text.as_ref().as_bytes());
    }

    /// Flushes the underlying stream.
    pub fn flush(&mut self) {
        let _ = self.writer.flush();
    }

    fn prefixed(&mut self, prefix: &str, message: &str) {
        let _ = writeln!(self.writer, "{prefix}{message}");
    }
}
