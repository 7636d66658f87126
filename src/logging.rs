//! Severity-leveled log pipeline that every command writes its output through.
//!
//! A [`LogPipeline`] turns a message and a [`Severity`] into a timestamped [`LogEntry`]
//! and hands it to a [`LogSink`]. The sink is whatever retains entries for display:
//! a bounded [`LogBuffer`], a [`TerminalSink`] that also echoes to a terminal, or a
//! host-provided implementation backing a GUI panel.

use crate::error::ConsoleError;
use chrono::{Local, NaiveDateTime, Timelike};
use std::collections::VecDeque;
use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// `strftime`-style layout of the timestamp that starts every rendered entry.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const TRUNCATION_MARKER: &str = "...";

/// Importance of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    /// Map a raw host trace level onto a severity.
    ///
    /// Codes follow the host framework numbering: 2 = debug, 3 = info, 4 = warning,
    /// 5 = error, 6 = fatal. Everything else has no severity and renders as `Unknown`.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            2 => Some(Severity::Debug),
            3 => Some(Severity::Info),
            4 => Some(Severity::Warning),
            5 => Some(Severity::Error),
            6 => Some(Severity::Fatal),
            _ => None,
        }
    }

    /// Bracketed label used in rendered entries, e.g. `(Warning)`.
    pub fn label(self) -> &'static str {
        match self {
            Severity::Debug => "(Debug)",
            Severity::Info => "(Info)",
            Severity::Warning => "(Warning)",
            Severity::Error => "(Error)",
            Severity::Fatal => "(Fatal)",
        }
    }
}

/// One line of console output.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// Wall-clock time of creation, second precision.
    pub timestamp: NaiveDateTime,
    /// `None` when the entry came from a host with an unrecognized level.
    pub severity: Option<Severity>,
    /// The message, already bounded.
    pub text: String,
}

impl LogEntry {
    pub fn label(&self) -> &'static str {
        self.severity.map_or("Unknown", Severity::label)
    }

    /// Full display form: `YYYY-MM-DD HH:MM:SS (Label) text`.
    pub fn rendered(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.label(),
            self.text
        )
    }
}

/// Append-only store that keeps rendered entries around for display.
pub trait LogSink {
    fn append(&mut self, entry: LogEntry);

    /// Drop every retained entry.
    fn clear(&mut self);
}

/// How sinks are shared between the pipeline and whoever displays them.
///
/// The mutex is the only synchronization point of the console.
pub type SharedSink = Arc<Mutex<dyn LogSink + Send>>;

/// Bounded scrollback. Once full, appending evicts the oldest entry.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries from oldest to newest.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.back()
    }
}

impl LogSink for LogBuffer {
    fn append(&mut self, entry: LogEntry) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Scrollback that also writes every entry to a terminal stream as it arrives.
pub struct TerminalSink {
    buffer: LogBuffer,
    out: Box<dyn Write + Send>,
}

impl TerminalSink {
    pub fn new(capacity: usize, out: Box<dyn Write + Send>) -> Self {
        Self {
            buffer: LogBuffer::new(capacity),
            out,
        }
    }

    /// Terminal sink printing to the process standard output.
    pub fn stdout(capacity: usize) -> Self {
        Self::new(capacity, Box::new(std::io::stdout()))
    }

    pub fn buffer(&self) -> &LogBuffer {
        &self.buffer
    }
}

impl LogSink for TerminalSink {
    fn append(&mut self, entry: LogEntry) {
        // A broken terminal has nowhere to report to; the entry is still retained.
        let _ = writeln!(self.out, "{entry}");
        let _ = self.out.flush();
        self.buffer.append(entry);
    }

    fn clear(&mut self) {
        self.buffer.clear();
        // ANSI: erase display, cursor home.
        let _ = write!(self.out, "\x1B[2J\x1B[H");
        let _ = self.out.flush();
    }
}

/// Wall-clock source used to timestamp entries.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// The local time zone clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Formats, classifies and forwards messages to the attached [`LogSink`].
///
/// Cloning is cheap and every clone shares the same sink slot, so a pipeline can be
/// handed to the host's diagnostic hooks before the sink exists and attached later.
/// Logging through a pipeline whose sink was never attached is an initialization
/// order bug and panics, see [`LogPipeline::log`].
#[derive(Clone)]
pub struct LogPipeline {
    sink: Arc<OnceLock<SharedSink>>,
    clock: Arc<dyn Clock>,
    max_message_len: usize,
}

impl LogPipeline {
    /// Unattached pipeline stamping entries with the local clock.
    pub fn new(max_message_len: usize) -> Self {
        Self::with_clock(max_message_len, Arc::new(LocalClock))
    }

    pub fn with_clock(max_message_len: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            sink: Arc::new(OnceLock::new()),
            clock,
            max_message_len,
        }
    }

    /// Pipeline with its sink already attached.
    pub fn attached(max_message_len: usize, sink: SharedSink) -> Self {
        let pipeline = Self::new(max_message_len);
        pipeline.attach(sink);
        pipeline
    }

    /// Attach the sink. Only the first call wins; returns `false` if a sink was
    /// already attached.
    pub fn attach(&self, sink: SharedSink) -> bool {
        self.sink.set(sink).is_ok()
    }

    pub fn is_attached(&self) -> bool {
        self.sink.get().is_some()
    }

    pub fn max_message_len(&self) -> usize {
        self.max_message_len
    }

    /// Build the entry a message would produce, without forwarding it.
    pub fn entry(&self, severity: Option<Severity>, message: impl fmt::Display) -> LogEntry {
        let now = self.clock.now();
        LogEntry {
            timestamp: now.with_nanosecond(0).unwrap_or(now),
            severity,
            text: bounded(message.to_string(), self.max_message_len),
        }
    }

    /// Forward a message, reporting a missing sink instead of panicking.
    pub fn try_log(
        &self,
        severity: Option<Severity>,
        message: impl fmt::Display,
    ) -> Result<(), ConsoleError> {
        let sink = self.sink()?;
        let entry = self.entry(severity, message);
        sink.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .append(entry);
        Ok(())
    }

    /// Forward a message to the sink.
    ///
    /// # Panics
    ///
    /// Panics with [`ConsoleError::SinkUninitialized`] if no sink was attached yet.
    pub fn log(&self, severity: Severity, message: impl fmt::Display) {
        self.log_or_panic(Some(severity), message);
    }

    /// Entry point for host framework trace callbacks that carry a raw level code.
    ///
    /// Unrecognized codes still produce an entry, labelled `Unknown`.
    pub fn log_callback(&self, code: i32, args: fmt::Arguments<'_>) {
        self.log_or_panic(Severity::from_code(code), args);
    }

    pub fn debug(&self, message: impl fmt::Display) {
        self.log(Severity::Debug, message);
    }

    pub fn info(&self, message: impl fmt::Display) {
        self.log(Severity::Info, message);
    }

    pub fn warning(&self, message: impl fmt::Display) {
        self.log(Severity::Warning, message);
    }

    pub fn error(&self, message: impl fmt::Display) {
        self.log(Severity::Error, message);
    }

    pub fn fatal(&self, message: impl fmt::Display) {
        self.log(Severity::Fatal, message);
    }

    /// Clear the sink's retained entries.
    ///
    /// # Panics
    ///
    /// Panics with [`ConsoleError::SinkUninitialized`] if no sink was attached yet.
    pub fn clear(&self) {
        match self.sink() {
            Ok(sink) => sink.lock().unwrap_or_else(PoisonError::into_inner).clear(),
            Err(err) => panic!("{err}"),
        }
    }

    fn log_or_panic(&self, severity: Option<Severity>, message: impl fmt::Display) {
        if let Err(err) = self.try_log(severity, message) {
            panic!("{err}");
        }
    }

    fn sink(&self) -> Result<&SharedSink, ConsoleError> {
        self.sink.get().ok_or(ConsoleError::SinkUninitialized)
    }
}

/// Cut `text` to at most `max_len` bytes on a char boundary, marking the cut.
fn bounded(mut text: String, max_len: usize) -> String {
    if text.len() <= max_len {
        return text;
    }
    let marker = if max_len >= TRUNCATION_MARKER.len() {
        TRUNCATION_MARKER
    } else {
        ""
    };
    let mut cut = max_len - marker.len();
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
    text.push_str(marker);
    text
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;

    pub(crate) struct FixedClock(pub NaiveDateTime);

    impl Clock for FixedClock {
        fn now(&self) -> NaiveDateTime {
            self.0
        }
    }

    pub(crate) fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_milli_opt(12, 30, 5, 750)
            .unwrap()
    }

    /// Attached pipeline with a fixed clock and a buffer the test can inspect.
    pub(crate) fn pipeline_with_buffer(
        capacity: usize,
        max_message_len: usize,
    ) -> (LogPipeline, Arc<Mutex<LogBuffer>>) {
        let buffer = Arc::new(Mutex::new(LogBuffer::new(capacity)));
        let pipeline = LogPipeline::with_clock(max_message_len, Arc::new(FixedClock(noon())));
        assert!(pipeline.attach(buffer.clone()));
        (pipeline, buffer)
    }

    #[test]
    fn test_rendered_entry_starts_with_timestamp_and_label() {
        let (log, buffer) = pipeline_with_buffer(8, 1024);
        log.warning("disk almost full");

        let buffer = buffer.lock().unwrap();
        let rendered = buffer.last().unwrap().rendered();
        assert_eq!(rendered, "2024-03-09 12:30:05 (Warning) disk almost full");

        let parsed = NaiveDateTime::parse_from_str(&rendered[..19], TIMESTAMP_FORMAT).unwrap();
        assert_eq!(parsed, noon().with_nanosecond(0).unwrap());
    }

    #[test]
    fn test_every_severity_has_its_label() {
        let (log, buffer) = pipeline_with_buffer(8, 1024);
        log.debug("a");
        log.info("b");
        log.warning("c");
        log.error("d");
        log.fatal("e");

        let buffer = buffer.lock().unwrap();
        let labels: Vec<&str> = buffer.entries().map(LogEntry::label).collect();
        assert_eq!(
            labels,
            vec!["(Debug)", "(Info)", "(Warning)", "(Error)", "(Fatal)"]
        );
    }

    #[test]
    fn test_unknown_host_code_renders_unknown() {
        let (log, buffer) = pipeline_with_buffer(8, 1024);
        log.log_callback(42, format_args!("font {} missing", "mono"));
        log.log_callback(4, format_args!("texture fallback"));

        let buffer = buffer.lock().unwrap();
        let entries: Vec<&LogEntry> = buffer.entries().collect();
        assert_eq!(entries[0].severity, None);
        assert_eq!(
            entries[0].rendered(),
            "2024-03-09 12:30:05 Unknown font mono missing"
        );
        assert_eq!(entries[1].severity, Some(Severity::Warning));
    }

    #[test]
    fn test_long_messages_are_truncated_on_char_boundary() {
        let (log, buffer) = pipeline_with_buffer(8, 10);
        log.info("ééééééééé"); // 18 bytes
        log.info("short");

        let buffer = buffer.lock().unwrap();
        let entries: Vec<&LogEntry> = buffer.entries().collect();
        assert_eq!(entries[0].text, "ééé...");
        assert!(entries[0].text.len() <= 10);
        assert_eq!(entries[1].text, "short");
    }

    #[test]
    fn test_truncation_below_marker_length() {
        assert_eq!(bounded("abcdef".to_string(), 2), "ab");
        assert_eq!(bounded("abc".to_string(), 3), "abc");
    }

    #[test]
    fn test_buffer_evicts_oldest() {
        let (log, buffer) = pipeline_with_buffer(2, 1024);
        log.info("one");
        log.info("two");
        log.info("three");

        let buffer = buffer.lock().unwrap();
        let texts: Vec<&str> = buffer.entries().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["two", "three"]);
    }

    #[test]
    fn test_clear_empties_sink() {
        let (log, buffer) = pipeline_with_buffer(4, 1024);
        log.info("one");
        log.clear();
        assert!(buffer.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unattached_pipeline_reports_sink_uninitialized() {
        let log = LogPipeline::new(1024);
        assert!(!log.is_attached());
        assert!(matches!(
            log.try_log(Some(Severity::Info), "early"),
            Err(ConsoleError::SinkUninitialized)
        ));
    }

    #[test]
    #[should_panic(expected = "log sink used before it was initialized")]
    fn test_unattached_pipeline_panics_on_log() {
        LogPipeline::new(1024).info("too early");
    }

    #[test]
    fn test_attach_only_once_and_clones_share_sink() {
        let (log, buffer) = pipeline_with_buffer(4, 1024);
        assert!(!log.attach(Arc::new(Mutex::new(LogBuffer::new(1)))));

        let clone = log.clone();
        clone.info("from clone");
        assert_eq!(buffer.lock().unwrap().last().unwrap().text, "from clone");
    }

    #[test]
    fn test_terminal_sink_writes_and_retains() {
        #[derive(Clone, Default)]
        struct Shared(Arc<Mutex<Vec<u8>>>);

        impl Write for Shared {
            fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(data);
                Ok(data.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let out = Shared::default();
        let mut sink = TerminalSink::new(4, Box::new(out.clone()));
        sink.append(LogEntry {
            timestamp: noon().with_nanosecond(0).unwrap(),
            severity: Some(Severity::Info),
            text: "hello".to_string(),
        });

        let written = String::from_utf8(out.0.lock().unwrap().clone()).unwrap();
        assert_eq!(written, "2024-03-09 12:30:05 (Info) hello\n");
        assert_eq!(sink.buffer().len(), 1);

        sink.clear();
        assert!(sink.buffer().is_empty());
    }
}
