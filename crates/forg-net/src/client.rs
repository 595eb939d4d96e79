//! Gopher wire transport.
//!
//! One request per connection: connect, write the request bytes, then
//! read until the server closes. Gopher+ requests are answered with a
//! single length header line (`+N`, `+-1` or `+-2`) before the body.
//!
//! The declared length is advisory. Many servers misreport it, so the
//! whole stream is always returned; the length only sizes the read
//! chunks and the progress reports.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::{Duration, Instant};

use forg_types::ForgConfig;
use forg_types::error::{ForgError, Result};

use crate::hosts::HostCache;
use crate::stop::StopFlag;

/// Read block size when the length is unknown or small.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Transfers larger than this are read in [`PROGRESS_STEPS`] chunks.
const LARGE_TRANSFER: usize = 100 * 1024;

/// Upper bound on progress reports for a transfer of known length.
const PROGRESS_STEPS: usize = 100;

/// How long a single blocking read may wait before the stop flag is
/// polled again.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Never preallocate more than this, whatever the server claims.
const MAX_PREALLOC: usize = 8 * 1024 * 1024;

/// Largest read block, whatever length the server announces.
pub const MAX_CHUNK_SIZE: usize = 1024 * 1024;

/// Body length announced by a Gopher+ header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredLength {
    /// `+N`: exactly N bytes follow.
    Bytes(usize),
    /// `+-1`: data ends with the `.` terminator line.
    Terminated,
    /// `+-2`: data runs until the connection closes and may itself
    /// contain the terminator sequence.
    UntilClose,
}

impl DeclaredLength {
    /// Numeric form used on the wire and in resource metadata.
    pub fn as_i64(self) -> i64 {
        match self {
            DeclaredLength::Bytes(n) => n as i64,
            DeclaredLength::Terminated => -1,
            DeclaredLength::UntilClose => -2,
        }
    }

    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            -1 => Some(DeclaredLength::Terminated),
            -2 => Some(DeclaredLength::UntilClose),
            n if n >= 0 => Some(DeclaredLength::Bytes(n as usize)),
            _ => None,
        }
    }

    /// Expected byte count, when the server gave one.
    pub fn expected(self) -> Option<usize> {
        match self {
            DeclaredLength::Bytes(n) => Some(n),
            _ => None,
        }
    }
}

/// Parse a Gopher+ length header line such as `+1024\r\n`.
///
/// Returns `None` for anything that is not `+` followed by an integer
/// of `-2` or above.
pub fn parse_length_header(line: &str) -> Option<DeclaredLength> {
    let rest = line.trim().strip_prefix('+')?;
    rest.trim().parse::<i64>().ok().and_then(DeclaredLength::from_i64)
}

/// Read block size for a transfer of the given expected length,
/// between [`DEFAULT_CHUNK_SIZE`] and [`MAX_CHUNK_SIZE`].
pub fn chunk_size_for(expected: Option<usize>) -> usize {
    match expected {
        Some(n) if n > LARGE_TRANSFER => {
            (n / PROGRESS_STEPS).clamp(DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE)
        },
        _ => DEFAULT_CHUNK_SIZE,
    }
}

/// Cumulative transfer progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub bytes_read: usize,
    pub expected: Option<usize>,
}

impl Progress {
    /// Percentage complete, capped at 100 for servers that send more
    /// than they announced.
    pub fn percent(&self) -> Option<f32> {
        let total = self.expected.filter(|&n| n > 0)?;
        Some((self.bytes_read as f32 / total as f32 * 100.0).min(100.0))
    }
}

/// One request to send.
#[derive(Debug, Clone, Copy)]
pub struct FetchRequest<'a> {
    pub host: &'a str,
    pub port: u16,
    /// Complete request bytes, line terminator included.
    pub payload: &'a [u8],
    /// Expect a Gopher+ length header line before the body.
    pub length_header: bool,
}

/// Raw result of a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub body: Vec<u8>,
    /// The length header, when one was requested and well formed.
    pub declared: Option<DeclaredLength>,
    pub bytes_sent: usize,
}

/// Timeouts applied to every connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    pub connect_timeout: Duration,
    /// Maximum silence from the server before the transfer fails.
    pub read_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    pub fn from_config(config: &ForgConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(config.connect_timeout_secs.max(1)),
            read_timeout: Duration::from_secs(config.read_timeout_secs.max(1)),
        }
    }
}

/// Blocking TCP transport for Gopher requests.
pub struct Transport {
    hosts: Arc<HostCache>,
    stop: StopFlag,
    config: TransportConfig,
}

impl Transport {
    pub fn new(hosts: Arc<HostCache>, stop: StopFlag, config: TransportConfig) -> Self {
        Self {
            hosts,
            stop,
            config,
        }
    }

    /// The flag this transport polls while reading.
    pub fn stop_flag(&self) -> &StopFlag {
        &self.stop
    }

    pub fn config(&self) -> TransportConfig {
        self.config
    }

    /// Send `request` and read the response to completion.
    ///
    /// Fails with [`ForgError::Connection`] on lookup, connect or socket
    /// errors, and when the stop flag is cleared mid-transfer.
    pub fn fetch(
        &self,
        request: &FetchRequest<'_>,
        progress: Option<&mut dyn FnMut(Progress)>,
    ) -> Result<Fetched> {
        let context = format!("{}:{}", request.host, request.port);
        check_stop(&self.stop, &context)?;

        let addr = self.hosts.resolve(request.host, request.port)?;
        check_stop(&self.stop, &context)?;

        log::debug!("Connecting to {addr} for {context}");
        let mut stream = TcpStream::connect_timeout(&addr, self.config.connect_timeout)
            .map_err(|e| ForgError::Connection(format!("Cannot connect to {context}: {e}")))?;

        stream
            .set_read_timeout(Some(POLL_INTERVAL.min(self.config.read_timeout)))
            .map_err(|e| ForgError::Connection(format!("socket setup for {context}: {e}")))?;
        stream
            .set_write_timeout(Some(self.config.read_timeout))
            .map_err(|e| ForgError::Connection(format!("socket setup for {context}: {e}")))?;

        check_stop(&self.stop, &context)?;
        stream
            .write_all(request.payload)
            .and_then(|()| stream.flush())
            .map_err(|e| ForgError::Connection(format!("Cannot send request to {context}: {e}")))?;
        check_stop(&self.stop, &context)?;
        log::debug!("Sent {} bytes to {context}", request.payload.len());

        let mut reader = BufReader::new(stream);
        let mut declared = None;
        let mut prefix = Vec::new();

        if request.length_header {
            let line = read_header_line(&mut reader, &self.stop, self.config.read_timeout, &context)?;
            let text = String::from_utf8_lossy(&line);
            match parse_length_header(&text) {
                Some(length) => {
                    log::debug!("{context} declared length {}", length.as_i64());
                    declared = Some(length);
                },
                None => {
                    log::warn!(
                        "Malformed length header from {context}: {:?}; reading until close",
                        text.trim_end()
                    );
                    // A server that skipped the header sent body data instead.
                    prefix = line;
                },
            }
        }

        let mut body = read_body(
            &mut reader,
            declared.and_then(DeclaredLength::expected),
            &self.stop,
            self.config.read_timeout,
            &context,
            progress,
        )?;

        if !prefix.is_empty() {
            prefix.append(&mut body);
            body = prefix;
        }

        log::debug!("Read {} bytes from {context}", body.len());
        Ok(Fetched {
            body,
            declared,
            bytes_sent: request.payload.len(),
        })
    }
}

/// Read everything `reader` yields until end of stream.
///
/// `expected` sizes the chunks and paces `progress` so a transfer of
/// known length reports roughly [`PROGRESS_STEPS`] times. Without a
/// length, or once past it, a report is due each time the byte count
/// doubles. Bytes beyond `expected` are kept. `stop` is checked before
/// and after each read.
pub fn read_body<R: Read>(
    reader: &mut R,
    expected: Option<usize>,
    stop: &StopFlag,
    read_timeout: Duration,
    context: &str,
    mut progress: Option<&mut dyn FnMut(Progress)>,
) -> Result<Vec<u8>> {
    let chunk_size = chunk_size_for(expected);
    let step = match expected {
        Some(n) if n > 0 => (n / PROGRESS_STEPS).max(chunk_size),
        _ => chunk_size,
    };

    let mut data = Vec::with_capacity(expected.unwrap_or(chunk_size).min(MAX_PREALLOC));
    let mut chunk = vec![0u8; chunk_size];
    let mut next_report = step;
    let mut reported = 0usize;
    let mut last_data = Instant::now();

    loop {
        check_stop(stop, context)?;
        let result = reader.read(&mut chunk);
        check_stop(stop, context)?;

        match result {
            Ok(0) => break,
            Ok(n) => {
                data.extend_from_slice(&chunk[..n]);
                last_data = Instant::now();
                if data.len() >= next_report {
                    if let Some(cb) = progress.as_mut() {
                        cb(Progress {
                            bytes_read: data.len(),
                            expected,
                        });
                    }
                    reported = data.len();
                    next_report = match expected {
                        Some(total) if data.len() < total => {
                            (data.len() / step + 1).saturating_mul(step)
                        },
                        _ => data.len().saturating_mul(2),
                    };
                }
            },
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {},
            Err(e) if is_timeout(&e) => {
                if let Some(n) = expected
                    && data.len() >= n
                {
                    log::debug!("{context} sent its declared {n} bytes and went quiet");
                    break;
                }
                if last_data.elapsed() >= read_timeout {
                    return Err(ForgError::Connection(format!(
                        "Timed out reading from {context} after {} bytes",
                        data.len()
                    )));
                }
            },
            Err(e) => {
                return Err(ForgError::Connection(format!(
                    "Error reading from {context}: {e}"
                )));
            },
        }
    }

    if reported != data.len()
        && let Some(cb) = progress.as_mut()
    {
        cb(Progress {
            bytes_read: data.len(),
            expected,
        });
    }

    if let Some(n) = expected
        && n != data.len()
    {
        log::debug!("{context} declared {n} bytes but sent {}", data.len());
    }

    Ok(data)
}

/// Read the single header line, polling `stop` while the server is quiet.
fn read_header_line<R: BufRead>(
    reader: &mut R,
    stop: &StopFlag,
    read_timeout: Duration,
    context: &str,
) -> Result<Vec<u8>> {
    let mut line = Vec::new();
    let started = Instant::now();
    loop {
        check_stop(stop, context)?;
        match reader.read_until(b'\n', &mut line) {
            Ok(_) => return Ok(line),
            Err(e) if is_timeout(&e) => {
                if started.elapsed() >= read_timeout {
                    return Err(ForgError::Connection(format!(
                        "Timed out waiting for {context} to answer"
                    )));
                }
            },
            Err(e) => {
                return Err(ForgError::Connection(format!(
                    "Error reading from {context}: {e}"
                )));
            },
        }
    }
}

fn check_stop(stop: &StopFlag, context: &str) -> Result<()> {
    if stop.may_continue() {
        Ok(())
    } else {
        Err(ForgError::Connection(format!("Transfer from {context} stopped")))
    }
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}
