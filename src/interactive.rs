//! Interactive console front end.

use std::io::{BufRead, Write};

use crate::engine::PolicyEngine;
use crate::error::Result;
use crate::parser::split_command;

/// Prompt printed before each command.
pub const PROMPT: &str = "Enter a command: ";

/// Read commands from `input` until `Q` or end of input, writing each
/// response to `output`.
///
/// `Q` is handled here and never reaches the engine, so it does not show up
/// in the request log.
pub fn run<R, W>(engine: &PolicyEngine, input: R, mut output: W) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    let mut lines = input.lines();
    loop {
        write!(output, "{}", PROMPT)?;
        output.flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => break,
        };

        if let (Some('Q'), _) = split_command(&line) {
            break;
        }

        writeln!(output, "{}", engine.dispatch(&line))?;
    }

    writeln!(output)?;
    log::info!("Interactive session ended");
    Ok(())
}
