//! Injected logging handle.
//!
//! Entities never reach for a global logger on their own. A [`Logger`] is
//! handed to them at construction and forwards records to one of:
//!
//! - nothing (the default),
//! - the process-wide [`log`] logger installed by the driver,
//! - a caller-supplied [`log::Log`] sink.
//!
//! ```
//! use microbenthos::support::logging::Logger;
//!
//! let logger = Logger::global().with_target("microbenthos::model");
//! logger.info(format_args!("created domain with {} cells", 110));
//! ```

use std::{fmt, sync::Arc};

use log::{Level, Log, Metadata, Record};

const DEFAULT_TARGET: &str = "microbenthos";

#[derive(Clone, Default)]
enum Sink {
    #[default]
    Noop,
    Global,
    Custom(Arc<dyn Log>),
}

/// A cheaply cloneable logging handle.
#[derive(Clone)]
pub struct Logger {
    sink: Sink,
    target: String,
}

impl Default for Logger {
    fn default() -> Self {
        Self::noop()
    }
}

impl Logger {
    /// A logger that discards every record.
    #[must_use]
    pub fn noop() -> Self {
        Self {
            sink: Sink::Noop,
            target: DEFAULT_TARGET.to_owned(),
        }
    }

    /// A logger forwarding to the process-wide [`log::logger`].
    #[must_use]
    pub fn global() -> Self {
        Self {
            sink: Sink::Global,
            target: DEFAULT_TARGET.to_owned(),
        }
    }

    /// A logger forwarding to the given sink.
    #[must_use]
    pub fn new(sink: Arc<dyn Log>) -> Self {
        Self {
            sink: Sink::Custom(sink),
            target: DEFAULT_TARGET.to_owned(),
        }
    }

    /// Returns a copy of this logger that tags records with `target`.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns `true` if a record at `level` would reach the sink.
    ///
    /// The global sink also honours [`log::max_level`].
    #[must_use]
    pub fn enabled(&self, level: Level) -> bool {
        let metadata = Metadata::builder().level(level).target(&self.target).build();
        match &self.sink {
            Sink::Noop => false,
            Sink::Global => level <= log::max_level() && log::logger().enabled(&metadata),
            Sink::Custom(sink) => sink.enabled(&metadata),
        }
    }

    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        if !self.enabled(level) {
            return;
        }
        let record = Record::builder()
            .level(level)
            .target(&self.target)
            .args(args)
            .build();

        match &self.sink {
            Sink::Noop => {}
            Sink::Global => log::logger().log(&record),
            Sink::Custom(sink) => sink.log(&record),
        }
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args);
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sink = match self.sink {
            Sink::Noop => "noop",
            Sink::Global => "global",
            Sink::Custom(_) => "custom",
        };
        f.debug_struct("Logger")
            .field("sink", &sink)
            .field("target", &self.target)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex};

    use log::{Level, Log, Metadata, Record};

    use super::Logger;

    /// Collects records so tests can assert on emitted warnings.
    #[derive(Default)]
    pub(crate) struct CaptureLog {
        records: Mutex<Vec<(Level, String)>>,
    }

    impl CaptureLog {
        pub(crate) const fn new() -> Self {
            Self {
                records: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn logger() -> (Logger, Arc<CaptureLog>) {
            let capture = Arc::new(CaptureLog::default());
            (Logger::new(capture.clone()), capture)
        }

        pub(crate) fn messages(&self, level: Level) -> Vec<String> {
            self.records
                .lock()
                .unwrap()
                .iter()
                .filter(|(l, _)| *l == level)
                .map(|(_, m)| m.clone())
                .collect()
        }
    }

    impl Log for CaptureLog {
        fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
            true
        }

        fn log(&self, record: &Record<'_>) {
            self.records
                .lock()
                .unwrap()
                .push((record.level(), record.args().to_string()));
        }

        fn flush(&self) {}
    }
}
