//! Daily chat log tailer.
//!
//! Driven by repeated calls to [`LogTailer::poll`]. Each call re-resolves the
//! log folder when needed, (re)opens today's file, and returns the complete
//! lines appended since the previous call.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use chrono::{Local, NaiveDate};

/// Interval between tailer polls.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Idle time without log growth after which a keep-alive is due.
pub const KEEP_ALIVE_IDLE: Duration = Duration::from_secs(5);

/// Interval between folder re-resolutions while a file is open.
pub const FOLDER_CHECK_INTERVAL: Duration = Duration::from_secs(30);

const LINE_TERMINATOR: &[u8] = b"\r\n";

/// Name of the log file the game writes on `date`: `Chat-YY-MM-DD.log`.
pub fn log_file_name(date: NaiveDate) -> String {
    date.format("Chat-%y-%m-%d.log").to_string()
}

/// Folders the game is known to write its chat log to, in priority order.
pub fn default_candidate_folders() -> Vec<PathBuf> {
    let mut folders = Vec::new();

    #[cfg(target_os = "windows")]
    {
        if let Ok(local) = std::env::var("LOCALAPPDATA") {
            folders.push(PathBuf::from(&local).join("ProjectGorgon").join("screenshots"));
            if let Some(app_data) = Path::new(&local).parent() {
                folders.push(
                    app_data
                        .join("LocalLow")
                        .join("Elder Game")
                        .join("Project Gorgon")
                        .join("ChatLogs"),
                );
            }
        }
    }

    #[cfg(not(target_os = "windows"))]
    {
        if let Ok(home) = std::env::var("HOME") {
            let home = PathBuf::from(home);
            folders.push(home.join(".local/share/ProjectGorgon/screenshots"));
            folders.push(home.join(".config/unity3d/Elder Game/Project Gorgon/ChatLogs"));
        }
    }

    folders
}

/// Lines read by one poll.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TailOutput {
    /// Complete lines in file order, terminators removed.
    pub lines: Vec<String>,
    /// The log has been idle long enough that the caller should signal liveness.
    pub keep_alive_due: bool,
}

/// An open log file.
struct OpenLog {
    file: File,
    folder: PathBuf,
    position: u64,
}

/// Follows today's chat log.
pub struct LogTailer {
    candidates: Vec<PathBuf>,
    custom_folder: Option<PathBuf>,
    open: Option<OpenLog>,
    /// Close the current file on the next poll.
    reconnect_required: bool,
    /// Skip existing content on the next open.
    seek_to_end: bool,
    current_date: Option<NaiveDate>,
    last_folder_check: Option<Instant>,
    last_growth: Instant,
    /// Bytes read past the last line terminator.
    pending: Vec<u8>,
}

impl LogTailer {
    /// Creates a tailer over the given candidate folders.
    ///
    /// A non-empty `custom_folder` overrides the candidates.
    pub fn new(candidates: Vec<PathBuf>, custom_folder: Option<PathBuf>) -> Self {
        Self {
            candidates,
            custom_folder: custom_folder.filter(|f| !f.as_os_str().is_empty()),
            open: None,
            reconnect_required: false,
            seek_to_end: true,
            current_date: None,
            last_folder_check: None,
            last_growth: Instant::now(),
            pending: Vec::new(),
        }
    }

    /// Changes the folder override. Forces a reconnect if it differs.
    pub fn set_custom_folder(&mut self, folder: Option<PathBuf>) {
        let folder = folder.filter(|f| !f.as_os_str().is_empty());
        if folder != self.custom_folder {
            tracing::info!(folder = ?folder, "custom log folder changed");
            self.custom_folder = folder;
            self.reconnect_required = true;
            self.seek_to_end = true;
        }
    }

    /// Folder of the currently open file, if any.
    pub fn current_folder(&self) -> Option<&Path> {
        self.open.as_ref().map(|log| log.folder.as_path())
    }

    /// Polls using the current local date and clock.
    pub fn poll(&mut self) -> TailOutput {
        self.poll_at(Local::now().date_naive(), Instant::now())
    }

    /// Polls as if the local date were `today` and the clock read `now`.
    pub fn poll_at(&mut self, today: NaiveDate, now: Instant) -> TailOutput {
        let mut rolled_over = false;
        match self.current_date {
            Some(date) if date != today => {
                tracing::info!(%today, "chat log date changed");
                // The new file is read from its start so nothing after midnight is lost.
                rolled_over = self.open.is_some();
                self.reconnect_required = true;
                self.current_date = Some(today);
            }
            None => self.current_date = Some(today),
            _ => {}
        }

        self.check_folder(today, now);

        if self.reconnect_required {
            self.close();
            self.reconnect_required = false;
            if rolled_over {
                self.seek_to_end = false;
            }
        }

        if self.open.is_none() {
            self.try_open(today, now);
        }

        let mut output = TailOutput::default();
        if let Some(log) = self.open.as_mut() {
            match read_appended(log, &mut self.pending) {
                Ok(0) => {}
                Ok(_) => {
                    self.last_growth = now;
                    output.lines = drain_lines(&mut self.pending);
                }
                Err(e) => {
                    tracing::debug!(error = %e, "error reading chat log, reconnecting");
                    self.reconnect_required = true;
                }
            }

            if now.saturating_duration_since(self.last_growth) >= KEEP_ALIVE_IDLE {
                self.last_growth = now;
                output.keep_alive_due = true;
            }
        }

        output
    }

    /// Releases the open file, if any.
    ///
    /// The next open skips whatever the file already holds.
    pub fn close(&mut self) {
        if let Some(log) = self.open.take() {
            tracing::debug!(folder = %log.folder.display(), "closed chat log");
        }
        self.pending.clear();
        self.last_folder_check = None;
        self.seek_to_end = true;
    }

    /// Re-resolves the folder periodically while a file is open.
    fn check_folder(&mut self, today: NaiveDate, now: Instant) {
        let Some(current) = self.open.as_ref().map(|log| log.folder.clone()) else {
            return;
        };
        let due = self
            .last_folder_check
            .is_none_or(|at| now.saturating_duration_since(at) >= FOLDER_CHECK_INTERVAL);
        if !due {
            return;
        }

        self.last_folder_check = Some(now);
        let resolved = self.resolve_folder(today);
        if resolved.as_deref() != Some(current.as_path()) {
            tracing::info!(
                from = %current.display(),
                to = ?resolved,
                "chat log folder changed"
            );
            self.reconnect_required = true;
            self.seek_to_end = true;
        }
    }

    fn try_open(&mut self, today: NaiveDate, now: Instant) {
        let Some(folder) = self.resolve_folder(today) else {
            return;
        };
        let path = folder.join(log_file_name(today));

        // std opens with read/write/delete sharing, so the game keeps writing.
        let mut file = match File::open(&path) {
            Ok(f) => f,
            Err(e) => {
                tracing::trace!(path = %path.display(), error = %e, "chat log not available");
                return;
            }
        };

        let position = if self.seek_to_end {
            match file.seek(SeekFrom::End(0)) {
                Ok(pos) => pos,
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "failed to seek chat log");
                    return;
                }
            }
        } else {
            0
        };

        tracing::info!(path = %path.display(), position, "opened chat log");
        self.seek_to_end = false;
        self.last_folder_check = Some(now);
        self.last_growth = now;
        self.open = Some(OpenLog {
            file,
            folder,
            position,
        });
    }

    /// Picks the folder whose copy of today's log was written most recently.
    ///
    /// Ties go to the earlier candidate. When no candidate has today's file,
    /// the first candidate is used.
    fn resolve_folder(&self, today: NaiveDate) -> Option<PathBuf> {
        if let Some(custom) = &self.custom_folder {
            return Some(custom.clone());
        }

        let name = log_file_name(today);
        let mut best: Option<(&PathBuf, SystemTime)> = None;
        for folder in &self.candidates {
            let modified = std::fs::metadata(folder.join(&name))
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            if best.is_none_or(|(_, t)| modified > t) {
                best = Some((folder, modified));
            }
        }
        best.map(|(folder, _)| folder.clone())
    }
}

/// Appends everything written since the last read to `pending`.
fn read_appended(log: &mut OpenLog, pending: &mut Vec<u8>) -> std::io::Result<usize> {
    let len = log.file.metadata()?.len();
    if len < log.position {
        tracing::debug!(folder = %log.folder.display(), "chat log truncated, rereading");
        log.position = 0;
        pending.clear();
    }
    log.file.seek(SeekFrom::Start(log.position))?;
    let read = log.file.read_to_end(pending)?;
    log.position += read as u64;
    Ok(read)
}

/// Removes and decodes every `\r\n`-terminated line from `pending`.
fn drain_lines(pending: &mut Vec<u8>) -> Vec<String> {
    let mut lines = Vec::new();
    let mut start = 0;
    while let Some(offset) = pending[start..]
        .windows(LINE_TERMINATOR.len())
        .position(|w| w == LINE_TERMINATOR)
    {
        let end = start + offset;
        let text = String::from_utf8_lossy(&pending[start..end]);
        let text = text.trim_end_matches(['\r', '\n']);
        if !text.is_empty() {
            lines.push(text.to_string());
        }
        start = end + LINE_TERMINATOR.len();
    }
    pending.drain(..start);
    lines
}
