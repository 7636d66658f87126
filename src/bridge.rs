//! Adapter for the `log` crate facade.
//!
//! Installing [`ConsoleLogger`] funnels diagnostics of the host application and its
//! libraries (asset loaders, windowing, the console's own `log::debug!` calls) into the
//! same [`LogPipeline`] the commands write to.

use crate::logging::{LogPipeline, Severity};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

pub struct ConsoleLogger {
    pipeline: LogPipeline,
    level: LevelFilter,
}

impl ConsoleLogger {
    pub fn new(pipeline: LogPipeline, level: LevelFilter) -> Self {
        Self { pipeline, level }
    }
}

/// `log` has no fatal level and an extra trace level below debug.
pub fn severity_for(level: Level) -> Severity {
    match level {
        Level::Error => Severity::Error,
        Level::Warn => Severity::Warning,
        Level::Info => Severity::Info,
        Level::Debug | Level::Trace => Severity::Debug,
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        self.pipeline.log(severity_for(record.level()), record.args());
    }

    fn flush(&self) {}
}

/// Register a [`ConsoleLogger`] as the process-wide `log` backend.
///
/// The pipeline's sink must be attached before the first record arrives.
pub fn install(pipeline: LogPipeline, level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(ConsoleLogger::new(pipeline, level)))?;
    log::set_max_level(level);
    Ok(())
}
