//! Log file tailing.
//!
//! Follows the listener's append-only log and yields complete lines as they
//! are written. A trailing line without its newline is left for the next
//! read so a record is never split in two.
//!
//! Rotation in place (copytruncate) is detected when the file shrinks below
//! the saved offset, or when the byte just before the offset is no longer the
//! newline that was consumed there. Either way reading restarts at 0.

use crate::error::{FeedError, FeedResult};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Incremental reader over a growing log file.
pub struct LogTailer {
    file: File,
    /// Read offset. Just past a newline when `at_line_start` is set.
    position: u64,
    /// False while the offset sits inside a record that began before opening.
    at_line_start: bool,
    path: PathBuf,
}

impl LogTailer {
    /// Open a log file.
    ///
    /// With `read_from_start` the existing content is replayed, otherwise
    /// only lines appended after opening are returned.
    pub fn open(path: impl AsRef<Path>, read_from_start: bool) -> FeedResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path).map_err(|source| FeedError::Open {
            path: path.clone(),
            source,
        })?;

        let (position, at_line_start) = if read_from_start {
            (0, true)
        } else {
            let len = file.metadata()?.len();
            let at_line_start = len == 0 || byte_at(&mut file, len - 1)? == b'\n';
            (len, at_line_start)
        };

        Ok(Self {
            file,
            position,
            at_line_start,
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    /// Read every complete line appended since the last call.
    pub fn read_new_lines(&mut self) -> FeedResult<Vec<String>> {
        let len = self.file.metadata()?.len();

        if self.rotated(len)? {
            warn!(
                path = %self.path.display(),
                previous = self.position,
                current = len,
                "Log file truncated or rotated in place, rewinding to start"
            );
            self.position = 0;
            self.at_line_start = true;
        }

        if len == self.position {
            return Ok(Vec::new());
        }

        self.file.seek(SeekFrom::Start(self.position))?;
        let mut buf = Vec::with_capacity((len - self.position) as usize);
        (&mut self.file)
            .take(len - self.position)
            .read_to_end(&mut buf)?;

        let Some(last_newline) = buf.iter().rposition(|&b| b == b'\n') else {
            // Only a partial line so far
            return Ok(Vec::new());
        };

        let complete = &buf[..=last_newline];
        self.position += complete.len() as u64;

        let mut body = &complete[..complete.len() - 1];
        if !self.at_line_start {
            // Tail of a record whose head was written before opening
            body = match body.iter().position(|&b| b == b'\n') {
                Some(first_newline) => &body[first_newline + 1..],
                None => &[],
            };
            self.at_line_start = true;
        }

        let lines = body
            .split(|&b| b == b'\n')
            .map(|raw| {
                String::from_utf8_lossy(raw)
                    .trim_end_matches('\r')
                    .to_string()
            })
            .filter(|line| !line.is_empty())
            .collect();

        Ok(lines)
    }

    /// Whether the content behind the saved offset was replaced.
    fn rotated(&mut self, len: u64) -> FeedResult<bool> {
        if len < self.position {
            return Ok(true);
        }
        if self.position == 0 || !self.at_line_start {
            return Ok(false);
        }
        Ok(byte_at(&mut self.file, self.position - 1)? != b'\n')
    }
}

fn byte_at(file: &mut File, offset: u64) -> FeedResult<u8> {
    let mut byte = [0u8; 1];
    file.seek(SeekFrom::Start(offset))?;
    file.read_exact(&mut byte)?;
    Ok(byte[0])
}

/// Poll `tailer` every `poll_interval` and forward lines to `tx`.
///
/// Reads run on the blocking pool. Read errors are logged and polling
/// continues. The task ends when `token` is cancelled or the receiver is
/// dropped; the file handle is released then.
pub fn spawn_tail_task(
    mut tailer: LogTailer,
    poll_interval: Duration,
    tx: mpsc::Sender<String>,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let path = tailer.path().to_path_buf();
        info!(
            path = %path.display(),
            position = tailer.position(),
            "Log tailer started"
        );

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    info!(path = %path.display(), "Log tailer stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let read = tokio::task::spawn_blocking(move || {
                        let result = tailer.read_new_lines();
                        (tailer, result)
                    })
                    .await;

                    let result = match read {
                        Ok((returned, result)) => {
                            tailer = returned;
                            result
                        }
                        Err(e) => {
                            warn!(error = %e, path = %path.display(), "Log read task failed, stopping tailer");
                            return;
                        }
                    };

                    let lines = match result {
                        Ok(lines) => lines,
                        Err(e) => {
                            warn!(error = %e, path = %path.display(), "Failed to read log");
                            continue;
                        }
                    };

                    for line in lines {
                        if tx.send(line).await.is_err() {
                            debug!("Line receiver dropped, stopping tailer");
                            return;
                        }
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn append(file: &mut NamedTempFile, text: &str) {
        file.write_all(text.as_bytes()).unwrap();
        file.flush().unwrap();
    }

    #[test]
    fn test_open_missing_file_fails() {
        let result = LogTailer::open("/nonexistent/dir/listener.log", false);
        assert!(matches!(result, Err(FeedError::Open { .. })));
    }

    #[test]
    fn test_read_from_start_replays_existing() {
        let mut file = NamedTempFile::new().unwrap();
        append(&mut file, "first\r\nsecond\n");

        let mut tailer = LogTailer::open(file.path(), true).unwrap();
        assert_eq!(tailer.read_new_lines().unwrap(), vec!["first", "second"]);
        assert!(tailer.read_new_lines().unwrap().is_empty());
    }

    #[test]
    fn test_open_at_end_skips_existing() {
        let mut file = NamedTempFile::new().unwrap();
        append(&mut file, "old line\n");

        let mut tailer = LogTailer::open(file.path(), false).unwrap();
        assert!(tailer.read_new_lines().unwrap().is_empty());

        append(&mut file, "new line\n");
        assert_eq!(tailer.read_new_lines().unwrap(), vec!["new line"]);
    }

    #[test]
    fn test_partial_line_waits_for_newline() {
        let mut file = NamedTempFile::new().unwrap();
        let mut tailer = LogTailer::open(file.path(), true).unwrap();

        append(&mut file, "complete\n{\"service\":");
        assert_eq!(tailer.read_new_lines().unwrap(), vec!["complete"]);

        append(&mut file, "\"vault-listener\"}\n");
        assert_eq!(
            tailer.read_new_lines().unwrap(),
            vec!["{\"service\":\"vault-listener\"}"]
        );
    }

    #[test]
    fn test_truncation_rewinds() {
        let mut file = NamedTempFile::new().unwrap();
        append(&mut file, "line one\nline two\n");

        let mut tailer = LogTailer::open(file.path(), true).unwrap();
        assert_eq!(tailer.read_new_lines().unwrap().len(), 2);

        file.as_file().set_len(0).unwrap();
        file.as_file_mut().seek(SeekFrom::Start(0)).unwrap();
        append(&mut file, "after\n");

        assert_eq!(tailer.read_new_lines().unwrap(), vec!["after"]);
        assert_eq!(tailer.position(), 6);
    }

    #[test]
    fn test_truncation_then_regrowth_past_offset_rewinds() {
        let mut file = NamedTempFile::new().unwrap();
        append(&mut file, "aaaa\n");

        let mut tailer = LogTailer::open(file.path(), true).unwrap();
        assert_eq!(tailer.read_new_lines().unwrap(), vec!["aaaa"]);
        assert_eq!(tailer.position(), 5);

        // Rotated and refilled beyond the old offset between two polls
        file.as_file().set_len(0).unwrap();
        file.as_file_mut().seek(SeekFrom::Start(0)).unwrap();
        append(&mut file, "first-after-rotate\nsecond\n");

        assert_eq!(
            tailer.read_new_lines().unwrap(),
            vec!["first-after-rotate", "second"]
        );
        assert!(tailer.read_new_lines().unwrap().is_empty());
    }

    #[test]
    fn test_open_mid_record_skips_its_tail() {
        let mut file = NamedTempFile::new().unwrap();
        append(&mut file, "old\npart");

        let mut tailer = LogTailer::open(file.path(), false).unwrap();
        append(&mut file, "ial\nnext\n");

        assert_eq!(tailer.read_new_lines().unwrap(), vec!["next"]);
        append(&mut file, "later\n");
        assert_eq!(tailer.read_new_lines().unwrap(), vec!["later"]);
    }

    #[tokio::test]
    async fn test_tail_task_forwards_and_stops() {
        let mut file = NamedTempFile::new().unwrap();
        let tailer = LogTailer::open(file.path(), false).unwrap();

        let (tx, mut rx) = mpsc::channel(16);
        let token = CancellationToken::new();
        let handle = spawn_tail_task(tailer, Duration::from_millis(10), tx, token.clone());

        append(&mut file, "hello\n");
        let line = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("line within timeout");
        assert_eq!(line.as_deref(), Some("hello"));

        token.cancel();
        let joined = tokio_test::assert_ok!(
            tokio::time::timeout(Duration::from_secs(2), handle).await
        );
        tokio_test::assert_ok!(joined);
    }
}
