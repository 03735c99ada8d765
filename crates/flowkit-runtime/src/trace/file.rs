//! JSON-array trace files, one per session.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use flowkit_protocols::{is_path_safe_id, sort_entries, TraceEntry, TraceError, TraceLogger};

/// Open files kept by a [`FileTraceLogger`] unless configured otherwise.
pub const DEFAULT_MAX_OPEN_TRACES: usize = 64;

struct OpenTrace {
    file: File,
    has_entries: bool,
    last_used: u64,
}

impl OpenTrace {
    async fn finish(mut self) -> std::io::Result<()> {
        self.file.write_all(b"\n]\n").await?;
        self.file.flush().await
    }
}

#[derive(Default)]
struct OpenTraces {
    files: HashMap<String, OpenTrace>,
    tick: u64,
}

/// Writes `<dir>/<session_id>.trace.json`.
///
/// A file holds one JSON array. The opening bracket is written with the
/// first entry and the closing bracket on [`TraceLogger::close`]; until then
/// the file is unterminated and [`TraceLogger::get_trace`] completes it when
/// reading. Logging to a closed session reopens the file and continues the
/// same array.
///
/// At most `max_open` files stay open. Opening one more closes the least
/// recently written file first.
pub struct FileTraceLogger {
    directory: PathBuf,
    max_open: usize,
    open: Mutex<OpenTraces>,
}

impl FileTraceLogger {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            max_open: DEFAULT_MAX_OPEN_TRACES,
            open: Mutex::new(OpenTraces::default()),
        }
    }

    pub fn with_max_open(mut self, max_open: usize) -> Self {
        self.max_open = max_open.max(1);
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn trace_path(&self, session_id: &str) -> PathBuf {
        self.directory.join(format!("{}.trace.json", session_id))
    }

    /// Number of trace files currently held open.
    pub async fn open_handles(&self) -> usize {
        self.open.lock().await.files.len()
    }

    fn check_session_id(session_id: &str) -> Result<(), TraceError> {
        if session_id.is_empty() {
            return Err(TraceError::MissingSessionId);
        }
        if !is_path_safe_id(session_id) {
            return Err(TraceError::InvalidSessionId(session_id.to_string()));
        }
        Ok(())
    }

    /// Close least recently used files until one more fits.
    async fn make_room(&self, files: &mut HashMap<String, OpenTrace>) {
        while files.len() >= self.max_open {
            let Some(oldest) = files
                .iter()
                .min_by_key(|(_, trace)| trace.last_used)
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            let Some(trace) = files.remove(&oldest) else {
                break;
            };
            match trace.finish().await {
                Ok(()) => debug!(session_id = %oldest, "Closed idle trace file"),
                Err(e) => warn!(session_id = %oldest, error = %e, "Failed to close trace file"),
            }
        }
    }

    async fn open_trace(&self, session_id: &str) -> Result<OpenTrace, TraceError> {
        tokio::fs::create_dir_all(&self.directory).await?;
        let path = self.trace_path(session_id);

        let existing = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        // Keep everything before the closing bracket, if any.
        let body = existing.trim_end();
        let body = body.strip_suffix(']').unwrap_or(body).trim_end();
        let has_entries = !body.strip_prefix('[').unwrap_or(body).trim().is_empty();
        let keep = body.len() as u64;

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .await?;
        file.set_len(keep).await?;
        file.seek(SeekFrom::End(0)).await?;
        if keep == 0 {
            file.write_all(b"[\n").await?;
        }

        debug!(session_id = %session_id, path = ?path, resumed = keep > 0, "Opened trace file");
        Ok(OpenTrace {
            file,
            has_entries,
            last_used: 0,
        })
    }
}

#[async_trait]
impl TraceLogger for FileTraceLogger {
    async fn log(&self, entry: TraceEntry) -> Result<(), TraceError> {
        Self::check_session_id(&entry.session_id)?;
        let json = serde_json::to_string(&entry)?;

        let mut open = self.open.lock().await;
        open.tick += 1;
        let tick = open.tick;
        if !open.files.contains_key(&entry.session_id) {
            self.make_room(&mut open.files).await;
        }
        let trace = match open.files.entry(entry.session_id.clone()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => e.insert(self.open_trace(&entry.session_id).await?),
        };
        trace.last_used = tick;

        if trace.has_entries {
            trace.file.write_all(b",\n").await?;
        }
        trace.file.write_all(json.as_bytes()).await?;
        trace.file.flush().await?;
        trace.has_entries = true;
        Ok(())
    }

    async fn get_trace(&self, session_id: &str) -> Result<Vec<TraceEntry>, TraceError> {
        Self::check_session_id(session_id)?;
        // Hold the lock so a concurrent write cannot be read half-done.
        let _open = self.open.lock().await;

        let content = match tokio::fs::read_to_string(self.trace_path(session_id)).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let body = content.trim_end();
        if body.is_empty() {
            return Ok(Vec::new());
        }
        let mut entries: Vec<TraceEntry> = if body.ends_with(']') {
            serde_json::from_str(body)?
        } else {
            serde_json::from_str(&format!("{body}\n]"))?
        };
        sort_entries(&mut entries);
        Ok(entries)
    }

    async fn close(&self) -> Result<(), TraceError> {
        let mut open = self.open.lock().await;
        let mut first_error = None;
        for (session_id, trace) in open.files.drain() {
            if let Err(e) = trace.finish().await {
                warn!(session_id = %session_id, error = %e, "Failed to close trace file");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
