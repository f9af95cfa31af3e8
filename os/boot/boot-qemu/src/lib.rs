//! # QEMU Debug Console
//!
//! Byte output to QEMU's ISA debug console, for tracing the boot stage before
//! and after the firmware console goes away.
//!
//! ```text
//! qemu_trace! / QemuLogger
//!     ↓
//! QemuSink (fmt::Write)
//!     ↓
//! out 0x402, al
//!     ↓
//! qemu-system-x86_64 -debugcon file:debug.log
//! ```
//!
//! Port writes are only compiled in with the `enabled` feature on x86-64 UEFI
//! targets. Everywhere else, including host tests, the sink discards its input.
//!
//! ```rust
//! use boot_qemu::{QemuSink, qemu_trace};
//! use core::fmt::Write;
//!
//! qemu_trace!("mode {}x{}\n", 1024, 768);
//! let _ = writeln!(QemuSink::DEBUG_CONSOLE, "done");
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

mod logger;

pub use logger::QemuLogger;
pub use sink::QemuSink;

mod sink {
    use core::fmt;

    /// `core::fmt::Write` over a single output port.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct QemuSink {
        port: u16,
    }

    impl QemuSink {
        /// QEMU's default `-debugcon` port.
        pub const DEBUG_CONSOLE: Self = Self::new(0x402);

        #[must_use]
        pub const fn new(port: u16) -> Self {
            Self { port }
        }

        #[must_use]
        pub const fn port(&self) -> u16 {
            self.port
        }

        #[inline]
        pub fn write_bytes(&mut self, bytes: &[u8]) {
            for &b in bytes {
                self.put(b);
            }
        }

        #[cfg(all(feature = "enabled", target_arch = "x86_64", target_os = "uefi"))]
        #[inline]
        #[allow(unsafe_code)]
        fn put(&self, byte: u8) {
            // SAFETY: Writing the debug port has no side effects on guest memory.
            unsafe {
                core::arch::asm!(
                    "out dx, al",
                    in("dx") self.port,
                    in("al") byte,
                    options(nomem, nostack, preserves_flags)
                );
            }
        }

        #[cfg(not(all(feature = "enabled", target_arch = "x86_64", target_os = "uefi")))]
        #[inline]
        #[allow(clippy::unused_self)]
        const fn put(&self, _byte: u8) {}
    }

    impl fmt::Write for QemuSink {
        #[inline]
        fn write_str(&mut self, s: &str) -> fmt::Result {
            self.write_bytes(s.as_bytes());
            Ok(())
        }
    }

    /// Best-effort formatted write to the debug console.
    #[doc(hidden)]
    #[inline]
    pub fn qemu_write(args: fmt::Arguments<'_>) {
        let mut sink = QemuSink::DEBUG_CONSOLE;
        let _ = fmt::write(&mut sink, args);
    }
}

#[doc(hidden)]
pub use sink::qemu_write;

/// `print!` to the QEMU debug console.
#[macro_export]
macro_rules! qemu_trace {
    ($($arg:tt)*) => {{
        $crate::qemu_write(core::format_args!($($arg)*));
    }};
}
