//! # Firmware Text Console

use boot_video::Console;
use core::fmt;
use uefi::proto::console::text::Key;
use uefi::{boot, system};

const CARRIAGE_RETURN: u16 = 0x0d;
const LINE_FEED: u16 = 0x0a;
const BACKSPACE: u16 = 0x08;

/// Line I/O over `ConOut` / `ConIn`. Only valid before `ExitBootServices`.
pub struct UefiConsole;

impl fmt::Write for UefiConsole {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        system::with_stdout(|out| out.write_str(s))
    }
}

impl UefiConsole {
    /// Block until a key is pressed.
    fn read_key() -> Option<Key> {
        loop {
            match system::with_stdin(|stdin| stdin.read_key()) {
                Ok(Some(key)) => return Some(key),
                Ok(None) => {}
                Err(_) => return None,
            }

            let event = system::with_stdin(|stdin| stdin.wait_for_key_event())?;
            boot::wait_for_event(&mut [event]).ok()?;
        }
    }

    fn echo(&mut self, c: char) {
        let _ = fmt::Write::write_char(self, c);
    }
}

impl Console for UefiConsole {
    fn read_line(&mut self, buf: &mut [u8]) -> usize {
        let mut len = 0;
        while let Some(key) = Self::read_key() {
            let Key::Printable(c) = key else {
                continue;
            };

            match u16::from(c) {
                CARRIAGE_RETURN | LINE_FEED => {
                    self.echo('\n');
                    break;
                }
                BACKSPACE => {
                    if len > 0 {
                        len -= 1;
                        self.echo('\u{8}');
                    }
                }
                _ => {
                    let c = char::from(c);
                    // Keep reading to the end of the line even when full.
                    if let Ok(byte) = u8::try_from(c)
                        && c.is_ascii_graphic()
                        && len < buf.len()
                    {
                        buf[len] = byte;
                        len += 1;
                        self.echo(c);
                    }
                }
            }
        }
        len
    }
}
