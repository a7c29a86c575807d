//! Translation backend that runs an external command per request.
//!
//! The command gets the request as JSON on stdin and answers with
//! `{"segments": [{"id": .., "text": ..}]}` on stdout.

use pptx_translate_core::{BackendError, TranslatedSegment, TranslationBackend, TranslationRequest};
use serde::Deserialize;
use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// How long output readers get to finish after the command is killed.
const READER_GRACE: Duration = Duration::from_millis(500);

type OutputReader = thread::JoinHandle<std::io::Result<Vec<u8>>>;

#[derive(Debug, Deserialize)]
struct CommandResponse {
    segments: Vec<TranslatedSegment>,
}

/// Runs a shell command for every translation request.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    command: String,
    timeout: Option<Duration>,
}

impl CommandBackend {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            timeout: None,
        }
    }

    /// Kill the command when it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn spawn(&self) -> Result<Child, BackendError> {
        let mut command = if cfg!(windows) {
            let mut command = Command::new("cmd");
            command.arg("/C").arg(&self.command);
            command
        } else {
            let mut command = Command::new("sh");
            command.arg("-c").arg(&self.command);
            command
        };

        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| BackendError::Failure(format!("failed to run '{}': {}", self.command, e)))
    }
}

impl TranslationBackend for CommandBackend {
    fn translate(&self, request: &TranslationRequest) -> Result<Vec<TranslatedSegment>, BackendError> {
        let payload = serde_json::to_vec(request)
            .map_err(|e| BackendError::Failure(format!("failed to encode request: {}", e)))?;

        log::debug!(
            "Running backend for {} segment(s) ({:?})",
            request.segments.len(),
            request.strategy
        );

        let mut child = self.spawn()?;
        let started = Instant::now();

        if let Some(mut stdin) = child.stdin.take() {
            thread::spawn(move || {
                if let Err(e) = stdin.write_all(&payload) {
                    log::debug!("Backend did not read its input: {}", e);
                }
            });
        }
        let stdout = child.stdout.take().map(read_all);
        let stderr = child.stderr.take().map(read_all);

        let status = loop {
            let polled = child
                .try_wait()
                .map_err(|e| BackendError::Failure(format!("failed to wait for backend: {}", e)))?;
            if let Some(status) = polled {
                break status;
            }
            if let Some(timeout) = self.timeout {
                if started.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    reap_readers([stdout, stderr]);
                    log::warn!("Backend timed out after {:?}", timeout);
                    return Err(BackendError::Timeout(timeout));
                }
            }
            thread::sleep(POLL_INTERVAL);
        };

        let stdout = join_output(stdout)?;
        let stderr = join_output(stderr)?;

        if !status.success() {
            let message = String::from_utf8_lossy(&stderr);
            return Err(BackendError::Failure(format!(
                "backend exited with {}: {}",
                status,
                message.trim()
            )));
        }

        let response: CommandResponse = serde_json::from_slice(&stdout)
            .map_err(|e| BackendError::Failure(format!("invalid backend response: {}", e)))?;
        Ok(response.segments)
    }
}

fn read_all<R: Read + Send + 'static>(mut pipe: R) -> OutputReader {
    thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn join_output(handle: Option<OutputReader>) -> Result<Vec<u8>, BackendError> {
    match handle {
        Some(handle) => handle
            .join()
            .map_err(|_| BackendError::Failure("backend output reader panicked".to_string()))?
            .map_err(|e| BackendError::Failure(format!("failed to read backend output: {}", e))),
        None => Ok(Vec::new()),
    }
}

/// Join the readers of a killed command.
///
/// A reader whose pipe is still held open by a grandchild process is
/// released once the grace period runs out; it ends when that process exits.
/// Returns the number of readers that were joined.
fn reap_readers<const N: usize>(readers: [Option<OutputReader>; N]) -> usize {
    let deadline = Instant::now() + READER_GRACE;
    let mut joined = 0;
    for reader in readers.into_iter().flatten() {
        while !reader.is_finished() && Instant::now() < deadline {
            thread::sleep(POLL_INTERVAL);
        }
        if reader.is_finished() {
            let _ = reader.join();
            joined += 1;
        } else {
            log::debug!("Backend output is still open after kill; releasing its reader");
            drop(reader);
        }
    }
    joined
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use pptx_translate_core::{SegmentRequest, Strategy};

    fn request() -> TranslationRequest {
        TranslationRequest {
            target_language: "fr".to_string(),
            strategy: Strategy::Batch,
            segments: vec![
                SegmentRequest {
                    id: 0,
                    text: "Hello".to_string(),
                    context_hint: None,
                },
                SegmentRequest {
                    id: 1,
                    text: "World".to_string(),
                    context_hint: Some("Hello".to_string()),
                },
            ],
        }
    }

    #[test]
    fn test_echo_command() {
        let backend = CommandBackend::new("cat");
        let segments = backend.translate(&request()).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].id, 1);
        assert_eq!(segments[1].text, "World");
    }

    #[test]
    fn test_fixed_response() {
        let backend = CommandBackend::new(
            r#"cat > /dev/null; printf '{"segments":[{"id":1,"text":"Monde"},{"id":0,"text":"Bonjour"}]}'"#,
        );
        let segments = backend.translate(&request()).unwrap();
        assert_eq!(segments[0].text, "Monde");
        assert_eq!(segments[1].text, "Bonjour");
    }

    #[test]
    fn test_non_zero_exit() {
        let backend = CommandBackend::new("echo 'quota exceeded' >&2; exit 3");
        let err = backend.translate(&request()).unwrap_err();
        match err {
            BackendError::Failure(message) => assert!(message.contains("quota exceeded")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unparsable_output() {
        let backend = CommandBackend::new("echo not-json");
        assert!(matches!(
            backend.translate(&request()),
            Err(BackendError::Failure(_))
        ));
    }

    #[test]
    fn test_timeout() {
        let timeout = Duration::from_millis(100);
        let backend = CommandBackend::new("sleep 5").with_timeout(Some(timeout));
        let started = Instant::now();
        assert_eq!(backend.translate(&request()), Err(BackendError::Timeout(timeout)));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_killed_command_readers_are_joined() {
        let mut child = CommandBackend::new("exec sleep 5").spawn().unwrap();
        let stdout = child.stdout.take().map(read_all);
        let stderr = child.stderr.take().map(read_all);

        child.kill().unwrap();
        child.wait().unwrap();
        assert_eq!(reap_readers([stdout, stderr]), 2);
    }

    #[test]
    fn test_timed_out_backend_can_run_again() {
        let backend = CommandBackend::new("exec sleep 5").with_timeout(Some(Duration::from_millis(100)));
        assert!(matches!(
            backend.translate(&request()),
            Err(BackendError::Timeout(_))
        ));

        let backend = CommandBackend::new("cat").with_timeout(Some(Duration::from_secs(5)));
        assert_eq!(backend.translate(&request()).unwrap().len(), 2);
    }
}
