use crate::config::LOG_LEVEL;
use boot_qemu::QemuLogger;
use core::sync::atomic::{AtomicBool, Ordering};
use log::{Log, Metadata, Record, SetLoggerError};

static LOGGER: UefiLogger = UefiLogger::new();

/// Logs to the QEMU debug console and, while boot services exist, to the
/// firmware console.
pub struct UefiLogger {
    qemu: QemuLogger,
    console: AtomicBool,
}

impl UefiLogger {
    const fn new() -> Self {
        Self {
            qemu: QemuLogger::new(LOG_LEVEL),
            console: AtomicBool::new(true),
        }
    }

    /// Install the logger. Call once, first thing.
    ///
    /// # Errors
    /// Fails if a logger is already installed.
    pub fn init() -> Result<&'static Self, SetLoggerError> {
        log::set_logger(&LOGGER)?;
        log::set_max_level(LOG_LEVEL);
        Ok(&LOGGER)
    }

    /// Stop writing to the firmware console.
    pub fn exit_boot_services(&self) {
        self.console.store(false, Ordering::Release);
    }
}

impl Log for UefiLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.qemu.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        self.qemu.log(record);

        if self.console.load(Ordering::Acquire) {
            uefi::println!(
                "[{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}
