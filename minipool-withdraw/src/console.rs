use log::*;
use regex::Regex;
use std::io::{self, Stdout, Write};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};

use crate::error::{Error, Result};

/// Operator terminal: line based input with validated prompts, and an output sink.
///
/// Input is read asynchronously so a pending prompt can be cancelled.
pub struct Console<R, W> {
    input: R,
    output: W,
}

/// Console attached to the process terminal
pub type StdConsole = Console<BufReader<Stdin>, Stdout>;

impl StdConsole {
    pub fn stdio() -> Self {
        Console::new(BufReader::new(tokio::io::stdin()), io::stdout())
    }
}

impl<R: AsyncBufRead + Unpin, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Console { input, output }
    }

    pub fn println(&mut self, line: &str) -> Result<()> {
        writeln!(self.output, "{}", line)?;
        Ok(())
    }

    /// Prints `text` and reads lines until one fully matches `pattern`.
    /// Every rejected line is answered with `retry`.
    pub async fn prompt(&mut self, text: &str, pattern: &Regex, retry: &str) -> Result<String> {
        self.println(text)?;
        loop {
            self.output.flush()?;
            let mut line = String::new();
            if self.input.read_line(&mut line).await? == 0 {
                return Err(Error::InputClosed);
            }
            let answer = line.trim();
            if pattern.is_match(answer) {
                return Ok(answer.to_owned());
            }
            debug!("{}", Error::InvalidSelection(answer.to_owned()));
            self.println(retry)?;
        }
    }

    pub fn flush(&mut self) -> Result<()> {
        self.output.flush()?;
        Ok(())
    }

    pub fn output(&self) -> &W {
        &self.output
    }
}
