use crate::qemu_trace;
use log::{LevelFilter, Log, Metadata, Record};

/// Writes `[LEVEL] target: message` lines to the QEMU debug console.
///
/// Meant to be embedded in the loader's own logger, which adds the firmware console.
#[derive(Debug)]
pub struct QemuLogger {
    max_level: LevelFilter,
}

impl QemuLogger {
    #[must_use]
    pub const fn new(max_level: LevelFilter) -> Self {
        Self { max_level }
    }

    #[must_use]
    pub const fn max_level(&self) -> LevelFilter {
        self.max_level
    }
}

impl Log for QemuLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        qemu_trace!(
            "[{}] {}: {}\n",
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    fn metadata(level: Level) -> Metadata<'static> {
        Metadata::builder().level(level).target("boot").build()
    }

    #[test]
    fn filters_by_level() {
        let logger = QemuLogger::new(LevelFilter::Info);
        let info = metadata(Level::Info);
        let debug = metadata(Level::Debug);
        assert!(logger.enabled(&info));
        assert!(!logger.enabled(&debug));

        logger.log(
            &Record::builder()
                .metadata(info)
                .args(format_args!("hello"))
                .build(),
        );
    }
}
