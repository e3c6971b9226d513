//! Rotation-aware follower for the Vault audit log
//!
//! Tails a single append-only file starting from its end at open time:
//! - Only complete (`\n`-terminated) lines are delivered
//! - Rotation by rename/recreate is detected by comparing file identity
//! - Truncation in place is detected by the file shrinking below the read offset
//! - A missing or unreadable path is retried at the poll interval, never fatal

use crate::utils::AppError;
use std::fs::{File, Metadata};
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default poll interval when no new data is available
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Longest unterminated line kept in memory before it is dropped
pub const DEFAULT_MAX_LINE_BYTES: usize = 4 * 1024 * 1024;

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Identity of the file behind a path (device + inode)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileIdentity {
    device: u64,
    inode: u64,
}

impl FileIdentity {
    #[cfg(unix)]
    fn of(meta: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            device: meta.dev(),
            inode: meta.ino(),
        })
    }

    // Without inode numbers only truncation can be detected.
    #[cfg(not(unix))]
    fn of(_meta: &Metadata) -> Option<Self> {
        None
    }
}

/// Open handle plus read position
#[derive(Debug)]
struct FollowerCursor {
    file: File,
    identity: Option<FileIdentity>,
    offset: u64,
}

impl FollowerCursor {
    fn open_at_end(path: &Path) -> std::io::Result<Self> {
        let mut file = File::open(path)?;
        let identity = FileIdentity::of(&file.metadata()?);
        let offset = file.seek(SeekFrom::End(0))?;
        Ok(Self {
            file,
            identity,
            offset,
        })
    }

    fn open_at_start(path: &Path) -> std::io::Result<Self> {
        let file = File::open(path)?;
        let identity = FileIdentity::of(&file.metadata()?);
        Ok(Self {
            file,
            identity,
            offset: 0,
        })
    }
}

/// Lazy, never-ending line source over a rotating file
#[derive(Debug)]
pub struct LogFollower {
    path: PathBuf,
    poll_interval: Duration,
    cursor: FollowerCursor,
    /// Bytes read but not yet terminated by `\n`
    pending: Vec<u8>,
    /// Set while the path is missing or unreadable, to avoid repeating the warning
    outage: bool,
    /// Consecutive failed reads on the current handle
    read_failures: u32,
    max_line_bytes: usize,
    /// Dropping bytes up to the next `\n` after an oversized line
    discarding: bool,
}

impl LogFollower {
    /// Open `path` and position at its current end.
    ///
    /// This is the only fallible step: once open, the follower never gives up.
    pub fn open(path: impl Into<PathBuf>, poll_interval: Duration) -> Result<Self, AppError> {
        let path = path.into();
        let cursor = FollowerCursor::open_at_end(&path).map_err(|source| {
            AppError::AuditLogUnavailable {
                path: path.clone(),
                source,
            }
        })?;

        info!(
            path = %path.display(),
            offset = cursor.offset,
            poll_interval_ms = poll_interval.as_millis() as u64,
            "LogFollower started at end of file"
        );

        Ok(Self {
            path,
            poll_interval,
            cursor,
            pending: Vec::new(),
            outage: false,
            read_failures: 0,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            discarding: false,
        })
    }

    /// Limit for a line still waiting for its terminator
    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes.max(1);
        self
    }

    /// Wait for the next complete line.
    ///
    /// Never signals end of stream. Cancel-safe: the only await point is the poll
    /// sleep and all progress is kept in `self`.
    ///
    /// Rotation is only checked once the current handle reaches EOF, so lines in a
    /// replacement file wait while a writer keeps appending to the renamed one.
    pub async fn next_line(&mut self) -> String {
        loop {
            if let Some(line) = self.take_line() {
                return line;
            }

            if self.fill() {
                continue;
            }

            if self.check_rotation() {
                continue;
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Release the file handle
    pub fn close(self) {
        debug!(path = %self.path.display(), "LogFollower closed");
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte offset read so far in the current file
    pub fn offset(&self) -> u64 {
        self.cursor.offset
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    fn take_line(&mut self) -> Option<String> {
        let end = self.pending.iter().position(|b| *b == b'\n')?;
        let mut line: Vec<u8> = self.pending.drain(..=end).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Read one chunk from the current handle. Returns true if any bytes arrived.
    fn fill(&mut self) -> bool {
        let mut buf = [0u8; READ_CHUNK_SIZE];
        loop {
            match self.cursor.file.read(&mut buf) {
                Ok(0) => {
                    self.read_recovered();
                    return false;
                }
                Ok(n) => {
                    self.read_recovered();
                    self.cursor.offset += n as u64;
                    self.accept(&buf[..n]);
                    return true;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.read_failures += 1;
                    if self.read_failures == 1 {
                        warn!(error = %e, path = %self.path.display(), "Failed to read audit log, will keep polling");
                    } else {
                        debug!(error = %e, failures = self.read_failures, "Audit log read still failing");
                    }
                    return false;
                }
            }
        }
    }

    fn read_recovered(&mut self) {
        if self.read_failures > 0 {
            info!(failures = self.read_failures, path = %self.path.display(), "Audit log readable again");
            self.read_failures = 0;
        }
    }

    /// Append freshly read bytes, dropping any line that outgrows the limit
    fn accept(&mut self, mut chunk: &[u8]) {
        if self.discarding {
            match chunk.iter().position(|b| *b == b'\n') {
                Some(end) => {
                    self.discarding = false;
                    chunk = &chunk[end + 1..];
                }
                None => return,
            }
        }

        self.pending.extend_from_slice(chunk);

        if self.pending.len() > self.max_line_bytes && !self.pending.contains(&b'\n') {
            warn!(
                bytes = self.pending.len(),
                limit = self.max_line_bytes,
                path = %self.path.display(),
                "Discarding oversized audit line"
            );
            self.pending.clear();
            self.discarding = true;
        }
    }

    /// At EOF: look at what the path points to now. Returns true if the cursor moved.
    fn check_rotation(&mut self) -> bool {
        let meta = match std::fs::metadata(&self.path) {
            Ok(meta) => meta,
            Err(e) => {
                // Keep the old handle: a writer may still be appending to the renamed file.
                if !self.outage {
                    warn!(error = %e, path = %self.path.display(), "Audit log not accessible, will keep polling");
                    self.outage = true;
                } else {
                    debug!(path = %self.path.display(), "Audit log still not accessible");
                }
                return false;
            }
        };

        let identity = FileIdentity::of(&meta);
        let replaced = identity.is_some() && identity != self.cursor.identity;

        if replaced {
            return self.reopen();
        }

        if meta.len() < self.cursor.offset {
            info!(
                path = %self.path.display(),
                previous_offset = self.cursor.offset,
                current_len = meta.len(),
                "Audit log truncated, restarting from beginning"
            );
            return match self.cursor.file.seek(SeekFrom::Start(0)) {
                Ok(_) => {
                    self.flush_fragment();
                    self.cursor.offset = 0;
                    self.outage = false;
                    self.discarding = false;
                    true
                }
                Err(e) => {
                    warn!(error = %e, "Failed to rewind truncated audit log");
                    false
                }
            };
        }

        if self.outage {
            info!(path = %self.path.display(), "Audit log accessible again");
            self.outage = false;
        }
        false
    }

    /// Switch to the file now at `path`, after draining the old handle
    fn reopen(&mut self) -> bool {
        while self.fill() {}

        let cursor = match FollowerCursor::open_at_start(&self.path) {
            Ok(cursor) => cursor,
            Err(e) => {
                if !self.outage {
                    warn!(error = %e, path = %self.path.display(), "Failed to open rotated audit log, will retry");
                    self.outage = true;
                }
                return false;
            }
        };

        info!(
            path = %self.path.display(),
            previous_offset = self.cursor.offset,
            "Audit log rotated, following new file from start"
        );

        self.flush_fragment();
        self.cursor = cursor;
        self.outage = false;
        self.read_failures = 0;
        self.discarding = false;
        true
    }

    /// Terminate a trailing partial line from a file that will not grow any more
    fn flush_fragment(&mut self) {
        if !self.pending.is_empty() && self.pending.last() != Some(&b'\n') {
            debug!(bytes = self.pending.len(), "Delivering unterminated fragment from rotated file");
            self.pending.push(b'\n');
        }
    }
}
