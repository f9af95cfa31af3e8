//! # Interactive Mode Prompt

use crate::mode::VideoMode;
use crate::table::RankedModes;
use core::fmt::Write;

/// Size of the line buffer handed to [`Console::read_line`].
pub const PROMPT_LINE_CAPACITY: usize = 16;

/// Synchronous line-oriented console.
pub trait Console: Write {
    /// Block until the operator submits a line and store it in `buf`.
    ///
    /// Returns the number of bytes stored, never more than `buf.len()`.
    /// The line terminator is not stored.
    fn read_line(&mut self, buf: &mut [u8]) -> usize;
}

/// Ask the operator to pick one entry of `table`.
///
/// A blank line accepts the default. Invalid input is rejected and the
/// question repeated; there is no timeout.
pub fn prompt_video_mode<C, const N: usize>(console: &mut C, table: &RankedModes<N>) -> VideoMode
where
    C: Console + ?Sized,
{
    let Some(last) = table.len().checked_sub(1) else {
        return table.default_mode();
    };

    let mut buf = [0u8; PROMPT_LINE_CAPACITY];
    loop {
        let _ = write!(console, "Select a video mode [0 - {last}]: ");

        let len = console.read_line(&mut buf).min(buf.len());
        if len == 0 {
            let _ = writeln!(console, "<default>");
            return table.default_mode();
        }

        match parse_index(&buf[..len]).and_then(|index| table.get(index)) {
            Some(mode) => return mode,
            None => {
                let _ = writeln!(console, "Invalid selection.");
            }
        }
    }
}

fn parse_index(line: &[u8]) -> Option<usize> {
    core::str::from_utf8(line).ok()?.trim().parse().ok()
}
