//! Rolling Logger
//!
//! Daily rolling log files plus an in-memory ring of the most recent lines,
//! installed as the global `tracing` subscriber. `log` records are bridged
//! into the same output.
//!
//! ```text
//! tracing / log ──> fmt layer ──> LineWriter ──┬──> <dir>/<app>.<YYYY-MM-DD>.log
//!                                              └──> ring buffer (recent_lines)
//!               └─> fmt layer ──> stderr
//! ```

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use chrono::{Local, NaiveDate};
use thiserror::Error;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Lines kept in memory for `recent_lines`
pub const RING_CAPACITY: usize = 500;

/// Daily files kept on disk, including today's
pub const MAX_LOG_FILES: usize = 7;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("failed to prepare log directory {path}: {source}")]
    Directory { path: PathBuf, source: io::Error },

    #[error("failed to write log file: {0}")]
    Io(#[from] io::Error),

    #[error("a global logger is already installed")]
    AlreadyInitialized,

    #[error("logger is not initialized")]
    NotInitialized,
}

/// Fixed-capacity buffer of recent lines; the oldest line is evicted first.
#[derive(Debug)]
pub struct RingBuffer {
    lines: VecDeque<String>,
    capacity: usize,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, line: String) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// Up to `n` most recent lines, oldest first
    pub fn last(&self, n: usize) -> Vec<String> {
        let skip = self.lines.len().saturating_sub(n);
        self.lines.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Appends to `<dir>/<prefix>.<date>.log`, switching files when the date
/// changes and pruning the oldest files beyond `max_files`.
#[derive(Debug)]
pub struct RollingFile {
    dir: PathBuf,
    prefix: String,
    max_files: usize,
    current: Option<(NaiveDate, File)>,
}

impl RollingFile {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>, max_files: usize) -> Result<Self, LoggerError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| LoggerError::Directory {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir,
            prefix: prefix.into(),
            max_files: max_files.max(1),
            current: None,
        })
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}.{}.log", self.prefix, date.format("%Y-%m-%d")))
    }

    /// Write `buf` into the file for `date`
    pub fn write_on(&mut self, date: NaiveDate, buf: &[u8]) -> io::Result<()> {
        let stale = self.current.as_ref().map_or(true, |(open, _)| *open != date);
        if stale {
            let file = OpenOptions::new().create(true).append(true).open(self.path_for(date))?;
            self.current = Some((date, file));
            self.prune()?;
        }
        match self.current.as_mut() {
            Some((_, file)) => file.write_all(buf),
            None => Ok(()),
        }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        match self.current.as_mut() {
            Some((_, file)) => file.flush(),
            None => Ok(()),
        }
    }

    /// Log files of this prefix, oldest first (the date sorts as text)
    pub fn files(&self) -> io::Result<Vec<PathBuf>> {
        let lead = format!("{}.", self.prefix);
        let mut files: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(&lead) && name.ends_with(".log"))
            })
            .collect();
        files.sort();
        Ok(files)
    }

    fn prune(&self) -> io::Result<()> {
        let files = self.files()?;
        let excess = files.len().saturating_sub(self.max_files);
        for path in files.into_iter().take(excess) {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

struct Shared {
    file: Mutex<RollingFile>,
    ring: Mutex<RingBuffer>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic mid-write leaves the data usable; keep logging.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Shared {
    fn record(&self, buf: &[u8]) -> io::Result<()> {
        lock(&self.file).write_on(Local::now().date_naive(), buf)?;
        let text = String::from_utf8_lossy(buf);
        let mut ring = lock(&self.ring);
        for line in text.lines().filter(|l| !l.is_empty()) {
            ring.push(line.to_string());
        }
        Ok(())
    }
}

/// `MakeWriter` handing out writers onto the shared file and ring
#[derive(Clone)]
pub struct LineWriter {
    shared: Arc<Shared>,
}

impl LineWriter {
    pub fn new(file: RollingFile, ring_capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                file: Mutex::new(file),
                ring: Mutex::new(RingBuffer::new(ring_capacity)),
            }),
        }
    }

    pub fn recent(&self, n: usize) -> Vec<String> {
        lock(&self.shared.ring).last(n)
    }
}

impl Write for LineWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.shared.record(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        lock(&self.shared.file).flush()
    }
}

impl<'a> MakeWriter<'a> for LineWriter {
    type Writer = LineWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

static LOGGER: OnceLock<LineWriter> = OnceLock::new();

/// Install the global subscriber writing to `log_dir`. `RUST_LOG` overrides
/// the default `info` filter.
pub fn init_logger(log_dir: impl AsRef<Path>, app_name: &str) -> Result<(), LoggerError> {
    let file = RollingFile::new(log_dir.as_ref(), app_name, MAX_LOG_FILES)?;
    let writer = LineWriter::new(file, RING_CAPACITY);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer.clone()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init()
        .map_err(|_| LoggerError::AlreadyInitialized)?;

    #[cfg(target_os = "android")]
    android_logger::init_once(android_logger::Config::default().with_tag(app_name));

    LOGGER.set(writer).map_err(|_| LoggerError::AlreadyInitialized)?;
    tracing::info!(dir = %log_dir.as_ref().display(), "{} logger started", app_name);
    Ok(())
}

pub fn info(message: &str) -> Result<(), LoggerError> {
    LOGGER.get().ok_or(LoggerError::NotInitialized)?;
    log::info!("{}", message);
    Ok(())
}

pub fn error(message: &str) -> Result<(), LoggerError> {
    LOGGER.get().ok_or(LoggerError::NotInitialized)?;
    log::error!("{}", message);
    Ok(())
}

/// Up to `n` most recent formatted lines, oldest first
pub fn recent_lines(n: usize) -> Vec<String> {
    LOGGER.get().map(|writer| writer.recent(n)).unwrap_or_default()
}
