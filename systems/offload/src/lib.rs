#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Subprocess-backed wave offload client.
//!
//! [`OffloadClient`] implements the engine's [`WaveOffload`] seam by holding
//! a long-lived child process and exchanging one request line for one
//! response line per wave over its standard pipes. The child is spawned
//! lazily on first use and respawned if it exits between waves; any
//! transport or codec failure surfaces as an [`OffloadError`] and leaves the
//! client ready to be discarded by the engine.

mod codec;

use std::io::{ErrorKind, Read, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread;
use std::time::Duration;

use riverguard_core::{OffloadError, WaveOffload, WavePayload, WaveReport};

/// Pause between retries when a pipe reports it would block.
const RETRY_PAUSE: Duration = Duration::from_millis(1);

/// Read granularity for the response stream.
const READ_CHUNK: usize = 4096;

/// Wave offload over a newline-delimited pipe protocol.
#[derive(Debug)]
pub struct OffloadClient {
    binary: PathBuf,
    process: Option<WaveProcess>,
}

impl OffloadClient {
    /// Creates a client for the executable at `binary`.
    ///
    /// Nothing is spawned until the first wave is delegated.
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            process: None,
        }
    }

    fn ensure_process(&mut self) -> Result<&mut WaveProcess, OffloadError> {
        if !self.binary.is_file() {
            return Err(OffloadError::MissingBinary(self.binary.clone()));
        }
        let respawn = match self.process.as_mut() {
            None => true,
            Some(process) => process.child.try_wait()?.is_some(),
        };
        if respawn {
            if self.process.take().is_some() {
                log::debug!("offload process exited, respawning {}", self.binary.display());
            }
            self.process = Some(WaveProcess::spawn(&self.binary)?);
        }
        // Populated just above.
        self.process.as_mut().ok_or(OffloadError::StreamClosed)
    }
}

impl WaveOffload for OffloadClient {
    fn simulate_wave(&mut self, payload: &WavePayload) -> Result<WaveReport, OffloadError> {
        let request = codec::encode_payload(payload);
        let process = self.ensure_process()?;
        let response = match process.exchange(&request) {
            Ok(line) => line,
            Err(err) => {
                // Drop the wedged child so a later client starts clean.
                self.process = None;
                return Err(err);
            }
        };
        codec::parse_report(&response)
    }
}

/// A live child process with its pipes and read carry-over buffer.
#[derive(Debug)]
struct WaveProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: ChildStdout,
    pending: Vec<u8>,
}

impl WaveProcess {
    fn spawn(binary: &std::path::Path) -> Result<Self, OffloadError> {
        let mut child = Command::new(binary)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;
        let stdin = child.stdin.take().ok_or(OffloadError::StreamClosed)?;
        let stdout = child.stdout.take().ok_or(OffloadError::StreamClosed)?;
        Ok(Self {
            child,
            stdin,
            stdout,
            pending: Vec::new(),
        })
    }

    /// Writes one request line and blocks until one response line arrives.
    fn exchange(&mut self, request: &str) -> Result<String, OffloadError> {
        write_all_retry(&mut self.stdin, request.as_bytes())?;
        self.stdin.flush()?;
        self.read_line()
    }

    fn read_line(&mut self) -> Result<String, OffloadError> {
        loop {
            if let Some(newline) = self.pending.iter().position(|&byte| byte == b'\n') {
                let line: Vec<u8> = self.pending.drain(..=newline).collect();
                return Ok(String::from_utf8_lossy(&line).trim_end().to_owned());
            }
            let mut chunk = [0u8; READ_CHUNK];
            match self.stdout.read(&mut chunk) {
                Ok(0) => return Err(OffloadError::StreamClosed),
                Ok(count) => self.pending.extend_from_slice(&chunk[..count]),
                Err(err) if retryable(&err) => thread::sleep(RETRY_PAUSE),
                Err(err) => return Err(err.into()),
            }
        }
    }
}

impl Drop for WaveProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn retryable(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted)
}

fn write_all_retry(writer: &mut impl Write, mut bytes: &[u8]) -> Result<(), OffloadError> {
    while !bytes.is_empty() {
        match writer.write(bytes) {
            Ok(0) => return Err(OffloadError::StreamClosed),
            Ok(written) => bytes = &bytes[written..],
            Err(err) if retryable(&err) => thread::sleep(RETRY_PAUSE),
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}
