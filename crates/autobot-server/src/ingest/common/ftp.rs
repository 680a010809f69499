//! Shared FTP utilities for export providers
//!
//! Wraps the blocking `suppaftp` client so it can be driven from async code:
//! every command runs on the blocking pool under a timeout, connection setup
//! is retried with a linear backoff, and file transfers are streamed through
//! a bounded pipe instead of being buffered.
//!
//! # Examples
//!
//! ```rust,ignore
//! use autobot_server::ingest::common::ftp::{FtpConfig, FtpSession};
//!
//! let config = FtpConfig {
//!     host: "ftp.example.com".to_string(),
//!     ..FtpConfig::default()
//! };
//!
//! let mut session = FtpSession::open(&config).await?;
//! let files = session.list_files("/exports").await?;
//! ```

use autobot_common::{AutobotError, Result};
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;
use suppaftp::{FtpError, FtpStream};
use tracing::{debug, info, warn};

use super::stream::{spawn_producer, ChannelReader, DEFAULT_PIPE_CAPACITY};

/// Maximum number of connection attempts
pub const MAX_RETRIES: u32 = 3;

/// Base delay between connection attempts (in seconds)
/// Actual delay is this value multiplied by the attempt number
pub const RETRY_DELAY_SECS: u64 = 5;

/// Configuration for FTP connection
#[derive(Debug, Clone)]
pub struct FtpConfig {
    /// FTP server hostname
    pub host: String,

    /// FTP server port (usually 21)
    pub port: u16,

    pub username: String,
    pub password: String,

    /// Bound on connecting and on every single command
    pub timeout: Duration,

    /// Base delay of the linear connection backoff
    pub retry_delay: Duration,
}

impl Default for FtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 21,
            username: "anonymous".to_string(),
            password: "anonymous".to_string(),
            timeout: Duration::from_secs(60),
            retry_delay: Duration::from_secs(RETRY_DELAY_SECS),
        }
    }
}

impl FtpConfig {
    fn address(&self) -> Result<SocketAddr> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| {
                AutobotError::Connection(format!("cannot resolve {}:{}: {}", self.host, self.port, e))
            })?
            .next()
            .ok_or_else(|| {
                AutobotError::Connection(format!("no address for {}:{}", self.host, self.port))
            })
    }
}

/// An authenticated FTP control connection
///
/// The connection is moved onto the blocking pool for each command and put
/// back afterwards. A command that times out loses the connection; later
/// commands then fail with a connection error.
pub struct FtpSession {
    stream: Option<FtpStream>,
    timeout: Duration,
}

impl FtpSession {
    /// Connect and log in, retrying with linear backoff
    pub async fn open(config: &FtpConfig) -> Result<Self> {
        let mut last_error = None;

        for attempt in 1..=MAX_RETRIES {
            debug!("Connect attempt {}/{} to {}:{}", attempt, MAX_RETRIES, config.host, config.port);

            let task = tokio::task::spawn_blocking({
                let config = config.clone();
                move || Self::connect_sync(&config)
            });

            let error = match tokio::time::timeout(config.timeout, task).await {
                Ok(Ok(Ok(stream))) => {
                    info!("Connected to FTP server {}:{}", config.host, config.port);
                    return Ok(Self {
                        stream: Some(stream),
                        timeout: config.timeout,
                    });
                },
                Ok(Ok(Err(e))) => e,
                Ok(Err(e)) => AutobotError::Connection(format!("FTP connect task failed: {}", e)),
                Err(_) => AutobotError::Connection(format!(
                    "connecting to {}:{} timed out after {:?}",
                    config.host, config.port, config.timeout
                )),
            };

            if attempt < MAX_RETRIES {
                let delay = config.retry_delay * attempt;
                warn!(
                    "Connect attempt {}/{} failed: {}. Retrying in {:?}...",
                    attempt, MAX_RETRIES, error, delay
                );
                tokio::time::sleep(delay).await;
            }
            last_error = Some(error);
        }

        Err(last_error.unwrap_or_else(|| {
            AutobotError::Connection(format!("could not connect to {}", config.host))
        }))
    }

    fn connect_sync(config: &FtpConfig) -> Result<FtpStream> {
        let addr = config.address()?;
        let mut stream = FtpStream::connect_timeout(addr, config.timeout)
            .map_err(|e| AutobotError::Connection(format!("failed to connect to {}: {}", addr, e)))?;

        // Extended passive mode copes better with NAT
        stream.set_mode(suppaftp::Mode::ExtendedPassive);

        debug!("Logging in as: {}", config.username);
        stream
            .login(&config.username, &config.password)
            .map_err(|e| AutobotError::Connection(format!("FTP login failed: {}", e)))?;
        stream
            .transfer_type(suppaftp::types::FileType::Binary)
            .map_err(|e| AutobotError::Connection(format!("failed to set binary mode: {}", e)))?;

        Ok(stream)
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Run one blocking command against the connection
    async fn run<T, F>(&mut self, what: &str, op: F) -> Result<T>
    where
        F: FnOnce(&mut FtpStream) -> std::result::Result<T, FtpError> + Send + 'static,
        T: Send + 'static,
    {
        let mut stream = self
            .stream
            .take()
            .ok_or_else(|| AutobotError::Connection("FTP session is not open".to_string()))?;

        let task = tokio::task::spawn_blocking(move || {
            let result = op(&mut stream);
            (stream, result)
        });

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok((stream, result))) => {
                self.stream = Some(stream);
                result.map_err(|e| classify(what, e))
            },
            Ok(Err(e)) => Err(AutobotError::Connection(format!("FTP {} task failed: {}", what, e))),
            Err(_) => Err(AutobotError::Connection(format!(
                "FTP {} timed out after {:?}",
                what, self.timeout
            ))),
        }
    }

    /// Names of the regular files in `dir`
    pub async fn list_files(&mut self, dir: &str) -> Result<Vec<String>> {
        let path = dir.to_string();
        let lines = self
            .run("LIST", move |s| s.list(Some(&path).filter(|p| !p.is_empty()).map(|p| p.as_str())))
            .await?;

        let files: Vec<String> = lines
            .iter()
            .filter_map(|line| FtpEntry::parse(line))
            .filter(|e| !e.is_directory)
            .map(|e| e.name)
            .collect();
        debug!("Listed {} ({} files)", dir, files.len());
        Ok(files)
    }

    /// Size of `path`; a missing file is `NotFound`
    pub async fn size(&mut self, path: &str) -> Result<usize> {
        let target = path.to_string();
        self.run("SIZE", move |s| s.size(&target))
            .await
            .map_err(|e| match e {
                AutobotError::Connection(_) => e,
                _ => AutobotError::NotFound(format!("no such file {}", path)),
            })
    }

    /// Start downloading `path`, consuming the session
    ///
    /// The transfer runs on its own thread and feeds the returned reader. The
    /// connection is closed when the transfer ends or the reader is dropped.
    pub fn retrieve(mut self, path: &str) -> Result<ChannelReader> {
        let mut stream = self
            .stream
            .take()
            .ok_or_else(|| AutobotError::Connection("FTP session is not open".to_string()))?;
        let path = path.to_string();

        let reader = spawn_producer("ftp-transfer", DEFAULT_PIPE_CAPACITY, move |writer| {
            let mut data = stream.retr_as_stream(&path).map_err(io::Error::other)?;
            let copied = io::copy(&mut data, writer);
            let finalized = stream.finalize_retr_stream(data).map_err(io::Error::other);
            if let Err(e) = stream.quit() {
                debug!("Failed to quit FTP session gracefully: {}", e);
            }
            let bytes = copied?;
            finalized?;
            info!("Transferred {} ({} bytes)", path, bytes);
            Ok(())
        })?;

        Ok(reader)
    }

    /// Log out; a session that is already closed is left alone
    pub async fn quit(&mut self) -> Result<()> {
        if self.stream.is_none() {
            return Ok(());
        }
        let result = self.run("QUIT", |s| s.quit()).await;
        self.stream = None;
        if let Err(ref e) = result {
            warn!("Failed to quit FTP session gracefully: {}", e);
        }
        Ok(())
    }
}

fn classify(what: &str, err: FtpError) -> AutobotError {
    match err {
        FtpError::ConnectionError(e) => {
            AutobotError::Connection(format!("FTP {} failed: {}", what, e))
        },
        other => AutobotError::Io(io::Error::other(format!("FTP {} failed: {}", what, other))),
    }
}

/// Join a remote directory and file name
pub fn remote_path(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Parsed FTP directory entry
#[derive(Debug, Clone)]
pub struct FtpEntry {
    /// Entry name (filename or directory name)
    pub name: String,

    pub is_directory: bool,

    /// File size in bytes (if available)
    pub size: Option<u64>,
}

impl FtpEntry {
    /// Parse an FTP LIST line into an entry
    ///
    /// Unix-style listings look like
    /// `-rw-r--r--   1 ftp ftp  1234 Jan 15 12:00 ESStatistikListeModtag-20240115-120000.zip`.
    /// A bare name (NLST style) is accepted as a file.
    pub fn parse(line: &str) -> Option<Self> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.len() {
            0 => None,
            1..=3 => Some(Self {
                name: parts.last()?.to_string(),
                is_directory: false,
                size: None,
            }),
            _ => Some(Self {
                name: parts.last()?.to_string(),
                is_directory: parts[0].starts_with('d'),
                size: parts.get(4).and_then(|s| s.parse().ok()),
            }),
        }
    }
}
